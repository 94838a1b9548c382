//! # RestoreKit Core
//!
//! Restore orchestration with no transport code.
//!
//! This crate contains:
//! - Port interfaces (traits) for the storage service
//! - Path resolution, size calculation and restore job handling
//! - The `ArchiveAccessor` composition root
//!
//! ## Architecture Principles
//! - Depends only on `restorekit-domain`
//! - No HTTP or platform code
//! - All external calls go through the traits in [`archive::ports`]

pub mod archive;

pub use archive::ports::{ByteStream, DeviceConnectivity, RemoteTreeClient, RestoreSessionProvider};
pub use archive::{
    build_file_selections, ArchiveAccessor, ArchiveAccessorFactory, FileSizePoller, PathResolver,
    RestoreJobManager,
};
