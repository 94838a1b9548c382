//! Port interfaces for archive restore
//!
//! These traits define the boundary between the restore orchestration and
//! the storage service's HTTP API.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use restorekit_domain::{
    PushRestoreJobRequest, RestoreJobRequest, RestoreJobStatus, RestoreSession, Result,
    SessionSecret, SizeJob, SizeJobStatus, TreeNode,
};

/// Body of a finished restore, read by the caller chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Remote archive tree and restore job operations
#[async_trait]
pub trait RemoteTreeClient: Send + Sync {
    /// List the direct children of `node_id`, or the root level when `None`.
    async fn list_children(
        &self,
        session: &RestoreSession,
        node_id: Option<&str>,
        show_deleted: Option<bool>,
    ) -> Result<Vec<TreeNode>>;

    /// Start a size calculation for one node
    async fn create_size_job(&self, device_guid: &str, file_id: &str) -> Result<SizeJob>;

    async fn get_size_job(&self, job_id: &str, device_guid: &str) -> Result<SizeJobStatus>;

    /// Submit a web restore and return its job id
    async fn submit_restore(&self, request: &RestoreJobRequest) -> Result<String>;

    async fn get_restore_status(&self, job_id: &str) -> Result<RestoreJobStatus>;

    /// Open the result of a finished restore as a byte stream
    async fn stream_restore_result(&self, job_id: &str) -> Result<ByteStream>;

    /// Submit a push restore and return its job id
    async fn submit_push_restore(&self, request: &PushRestoreJobRequest) -> Result<String>;

    async fn cancel_restore(&self, job_id: &str) -> Result<()>;
}

/// Connectivity lookups for push-restore targets
#[async_trait]
pub trait DeviceConnectivity: Send + Sync {
    /// URL of the server the device is connected to, `None` when offline.
    async fn connected_server_url(&self, device_guid: &str) -> Result<Option<String>>;
}

/// Opens restore sessions against a device archive
#[async_trait]
pub trait RestoreSessionProvider: Send + Sync {
    async fn data_key_token(&self, device_guid: &str) -> Result<String>;

    /// Open a session and return its id
    async fn create_restore_session(
        &self,
        device_guid: &str,
        secret: &SessionSecret,
    ) -> Result<String>;
}
