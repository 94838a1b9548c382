//! # RestoreKit Domain
//!
//! Data model shared by the restore core and the HTTP adapters.
//!
//! This crate contains:
//! - Archive tree, selection, size-job and restore-job types
//! - `RestoreKitError` and the crate-wide `Result` alias
//! - `RestoreKitConfig` and its sections
//! - Domain constants
//!
//! ## Architecture
//! - Depends only on `restorekit-common` (foundation tier)
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
