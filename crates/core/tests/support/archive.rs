//! In-memory storage service used by the archive tests.
//!
//! Serves a fixed tree, scripted size-job and restore-job statuses, and
//! records every remote call so tests can assert on call counts and order.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use restorekit_core::archive::ports::{
    ByteStream, DeviceConnectivity, RemoteTreeClient, RestoreSessionProvider,
};
use restorekit_domain::{
    NodeType, PushRestoreJobRequest, RestoreJobRequest, RestoreJobStatus, RestoreKitError,
    RestoreSession, Result, SessionSecret, SizeJob, SizeJobStatus, TreeNode,
};

pub const DEVICE_GUID: &str = "4200";
pub const NODE_GUID: &str = "node-1";
pub const SESSION_ID: &str = "sess-1";
pub const RESTORED_BYTES: &[u8] = b"restored-bytes";

/// One recorded remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListChildren(Option<String>),
    CreateSizeJob(String),
    GetSizeJob(String),
    SubmitRestore,
    GetRestoreStatus(String),
    StreamResult(String),
    SubmitPushRestore,
    CancelRestore(String),
    ConnectedServerUrl(String),
    DataKeyToken(String),
    CreateSession(&'static str),
}

/// Scripted responses; the last entry repeats once the script runs out.
#[derive(Debug, Default)]
struct Script<T> {
    queue: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    fn new(items: Vec<T>) -> Self {
        Self { queue: items.into() }
    }

    fn next(&mut self) -> Option<T> {
        if self.queue.len() > 1 {
            self.queue.pop_front()
        } else {
            self.queue.front().cloned()
        }
    }
}

#[derive(Default)]
pub struct FakeArchive {
    tree: HashMap<Option<String>, Vec<TreeNode>>,
    calls: Mutex<Vec<Call>>,
    restore_statuses: Mutex<Script<RestoreJobStatus>>,
    size_statuses: Mutex<HashMap<String, Script<SizeJobStatus>>>,
    submitted: Mutex<Vec<RestoreJobRequest>>,
    pushed: Mutex<Vec<PushRestoreJobRequest>>,
    connected: HashMap<String, String>,
    submit_error: Mutex<Option<RestoreKitError>>,
    status_error: Mutex<Option<RestoreKitError>>,
    size_error: Mutex<Option<RestoreKitError>>,
}

impl FakeArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree with a POSIX and a Windows volume:
    ///
    /// ```text
    /// /                          (root)
    /// └── Users                  (users)
    ///     └── qa                 (qa)
    ///         └── Downloads      (downloads)
    ///             ├── report.pdf (report)
    ///             └── notes.txt  (notes)
    /// C:/                        (c)
    /// └── Users/qa/Downloads/File.txt   (c-users, c-qa, c-downloads, c-file)
    /// ```
    pub fn sample() -> Self {
        Self::new()
            .with_node(None, "root", "/", NodeType::Directory)
            .with_node(None, "c", "C:/", NodeType::Directory)
            .with_node(Some("root"), "users", "/Users", NodeType::Directory)
            .with_node(Some("users"), "qa", "/Users/qa", NodeType::Directory)
            .with_node(Some("qa"), "downloads", "/Users/qa/Downloads", NodeType::Directory)
            .with_node(Some("downloads"), "report", "/Users/qa/Downloads/report.pdf", NodeType::File)
            .with_node(Some("downloads"), "notes", "/Users/qa/Downloads/notes.txt", NodeType::File)
            .with_node(Some("c"), "c-users", "C:/Users", NodeType::Directory)
            .with_node(Some("c-users"), "c-qa", "C:/Users/qa", NodeType::Directory)
            .with_node(Some("c-qa"), "c-downloads", "C:/Users/qa/Downloads", NodeType::Directory)
            .with_node(
                Some("c-downloads"),
                "c-file",
                "C:/Users/qa/Downloads/File.txt",
                NodeType::File,
            )
    }

    pub fn with_node(mut self, parent: Option<&str>, id: &str, path: &str, node_type: NodeType) -> Self {
        self.tree
            .entry(parent.map(str::to_string))
            .or_default()
            .push(TreeNode::new(Some(id.to_string()), path, node_type));
        self
    }

    pub fn with_restore_statuses(self, statuses: Vec<RestoreJobStatus>) -> Self {
        *self.restore_statuses.lock() = Script::new(statuses);
        self
    }

    pub fn with_size_statuses(self, file_id: &str, statuses: Vec<SizeJobStatus>) -> Self {
        self.size_statuses.lock().insert(file_id.to_string(), Script::new(statuses));
        self
    }

    pub fn with_connected_device(mut self, device_guid: &str, server_url: &str) -> Self {
        self.connected.insert(device_guid.to_string(), server_url.to_string());
        self
    }

    pub fn fail_submit(self, err: RestoreKitError) -> Self {
        *self.submit_error.lock() = Some(err);
        self
    }

    pub fn fail_status(self, err: RestoreKitError) -> Self {
        *self.status_error.lock() = Some(err);
        self
    }

    pub fn fail_size_jobs(self, err: RestoreKitError) -> Self {
        *self.size_error.lock() = Some(err);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn submitted(&self) -> Vec<RestoreJobRequest> {
        self.submitted.lock().clone()
    }

    pub fn pushed(&self) -> Vec<PushRestoreJobRequest> {
        self.pushed.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

pub fn session() -> RestoreSession {
    RestoreSession {
        session_id: SESSION_ID.to_string(),
        device_guid: DEVICE_GUID.to_string(),
        node_guid: NODE_GUID.to_string(),
    }
}

pub fn status(done: bool, status: Option<&str>) -> RestoreJobStatus {
    RestoreJobStatus { done, status: status.map(str::to_string), percent_complete: if done { 100 } else { 50 } }
}

pub fn size_status(status: &str, num_files: u64, num_dirs: u64, num_bytes: u64) -> SizeJobStatus {
    SizeJobStatus { status: Some(status.to_string()), num_files, num_dirs, num_bytes }
}

pub async fn collect(stream: ByteStream) -> Vec<u8> {
    stream
        .fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk.expect("fake stream never fails"));
            acc
        })
        .await
}

#[async_trait]
impl RemoteTreeClient for FakeArchive {
    async fn list_children(
        &self,
        _session: &RestoreSession,
        node_id: Option<&str>,
        _show_deleted: Option<bool>,
    ) -> Result<Vec<TreeNode>> {
        self.record(Call::ListChildren(node_id.map(str::to_string)));
        Ok(self.tree.get(&node_id.map(str::to_string)).cloned().unwrap_or_default())
    }

    async fn create_size_job(&self, _device_guid: &str, file_id: &str) -> Result<SizeJob> {
        self.record(Call::CreateSizeJob(file_id.to_string()));
        if let Some(err) = self.size_error.lock().clone() {
            return Err(err);
        }
        Ok(SizeJob { job_id: format!("size-{file_id}"), file_id: file_id.to_string() })
    }

    async fn get_size_job(&self, job_id: &str, _device_guid: &str) -> Result<SizeJobStatus> {
        self.record(Call::GetSizeJob(job_id.to_string()));
        let file_id = job_id.trim_start_matches("size-");
        let scripted = self.size_statuses.lock().get_mut(file_id).and_then(Script::next);
        Ok(scripted.unwrap_or_else(|| size_status("DONE", 1, 0, 100)))
    }

    async fn submit_restore(&self, request: &RestoreJobRequest) -> Result<String> {
        self.record(Call::SubmitRestore);
        if let Some(err) = self.submit_error.lock().clone() {
            return Err(err);
        }
        let mut submitted = self.submitted.lock();
        submitted.push(request.clone());
        Ok(format!("restore-{}", submitted.len()))
    }

    async fn get_restore_status(&self, job_id: &str) -> Result<RestoreJobStatus> {
        self.record(Call::GetRestoreStatus(job_id.to_string()));
        if let Some(err) = self.status_error.lock().clone() {
            return Err(err);
        }
        Ok(self.restore_statuses.lock().next().unwrap_or_else(|| status(true, Some("DONE"))))
    }

    async fn stream_restore_result(&self, job_id: &str) -> Result<ByteStream> {
        self.record(Call::StreamResult(job_id.to_string()));
        let (head, tail) = RESTORED_BYTES.split_at(9);
        Ok(stream::iter(vec![Ok(Bytes::from_static(head)), Ok(Bytes::from_static(tail))]).boxed())
    }

    async fn submit_push_restore(&self, request: &PushRestoreJobRequest) -> Result<String> {
        self.record(Call::SubmitPushRestore);
        if let Some(err) = self.submit_error.lock().clone() {
            return Err(err);
        }
        let mut pushed = self.pushed.lock();
        pushed.push(request.clone());
        Ok(format!("push-{}", pushed.len()))
    }

    async fn cancel_restore(&self, job_id: &str) -> Result<()> {
        self.record(Call::CancelRestore(job_id.to_string()));
        Ok(())
    }
}

#[async_trait]
impl DeviceConnectivity for FakeArchive {
    async fn connected_server_url(&self, device_guid: &str) -> Result<Option<String>> {
        self.record(Call::ConnectedServerUrl(device_guid.to_string()));
        Ok(self.connected.get(device_guid).cloned())
    }
}

#[async_trait]
impl RestoreSessionProvider for FakeArchive {
    async fn data_key_token(&self, device_guid: &str) -> Result<String> {
        self.record(Call::DataKeyToken(device_guid.to_string()));
        Ok(format!("dkt-{device_guid}"))
    }

    async fn create_restore_session(
        &self,
        _device_guid: &str,
        secret: &SessionSecret,
    ) -> Result<String> {
        self.record(Call::CreateSession(secret.field_name()));
        Ok(SESSION_ID.to_string())
    }
}
