//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: timeouts and eventual-consistency assertions for
//!   code that runs on background tasks

pub mod async_utils;

pub use async_utils::{poll_until, timeout_ok};
