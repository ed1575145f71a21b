//! # daybook-core
//!
//! Core types, traits, and abstractions for the daybook library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other daybook crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod temporal;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use defaults::ScanPolicy;
pub use error::{Error, Result};
pub use models::*;
pub use temporal::{local_date, parse_timezone, reference_timezone, user_timezone};
pub use traits::*;
pub use uuid_utils::{extract_timestamp, is_v7, new_v7};
