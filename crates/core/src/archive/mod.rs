//! Archive restore orchestration
//!
//! Resolves logical paths against a device archive, optionally computes
//! their sizes, then submits and follows a restore job until its result can
//! be streamed (or pushed to another device).

pub mod accessor;
pub mod path_resolver;
pub mod ports;
pub mod restore_job;
pub mod selection;
pub mod size_poller;

pub use accessor::{ArchiveAccessor, ArchiveAccessorFactory};
pub use path_resolver::PathResolver;
pub use ports::{ByteStream, DeviceConnectivity, RemoteTreeClient, RestoreSessionProvider};
pub use restore_job::RestoreJobManager;
pub use selection::build_file_selections;
pub use size_poller::FileSizePoller;
