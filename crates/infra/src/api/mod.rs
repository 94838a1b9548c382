//! Storage service API adapter
//!
//! Implements the `restorekit-core` archive ports over the storage
//! service's JSON API. Every response body is wrapped in a `data` envelope
//! and every request carries a bearer token.

pub mod auth;
pub mod errors;
pub mod storage;

pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use errors::{ApiError, ApiErrorCategory};
pub use storage::StorageApiClient;
