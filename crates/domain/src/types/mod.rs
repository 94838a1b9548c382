//! Domain types and models
//!
//! - [`tree`]: archive tree nodes and path helpers
//! - [`selection`]: restore selections and size multiplicities
//! - [`size`]: file-size calculation jobs
//! - [`restore`]: restore jobs, requests and push-restore targets
//! - [`session`]: restore sessions and decryption credentials

pub mod restore;
pub mod selection;
pub mod session;
pub mod size;
pub mod tree;

pub use restore::{
    ExistingFiles, FilePermissions, PushRestoreAck, PushRestoreJobRequest, PushRestoreOptions,
    PushRestoreTarget, RestoreJob, RestoreJobRequest, RestoreJobState, RestoreJobStatus,
};
pub use selection::{FileSelection, SelectionDescriptor, SizeCounts};
pub use session::{DecryptionCredentials, RestoreSession, SessionSecret};
pub use size::{FileSizeReport, SizeJob, SizeJobStatus};
pub use tree::{join_path, normalize_path, NodeType, TreeNode};
