//! Entry point for restoring files out of one device archive
//!
//! `ArchiveAccessor` binds a restore session to the resolver, the size
//! poller and the job manager. Sessions are opened once by
//! [`ArchiveAccessorFactory`] and never change afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use restorekit_domain::{
    normalize_path, DecryptionCredentials, FileSelection, FileSizeReport, PushRestoreAck,
    PushRestoreTarget, RestoreConfig, RestoreKitError, RestoreSession, Result, SessionSecret,
    SizeCounts, TreeNode,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::path_resolver::PathResolver;
use super::ports::{ByteStream, DeviceConnectivity, RemoteTreeClient, RestoreSessionProvider};
use super::restore_job::RestoreJobManager;
use super::selection::build_file_selections;
use super::size_poller::FileSizePoller;

/// Restore operations against one device archive
pub struct ArchiveAccessor {
    session: Arc<RestoreSession>,
    resolver: PathResolver,
    size_poller: FileSizePoller,
    jobs: RestoreJobManager,
}

impl ArchiveAccessor {
    pub fn new(
        session: RestoreSession,
        client: Arc<dyn RemoteTreeClient>,
        connectivity: Arc<dyn DeviceConnectivity>,
        config: &RestoreConfig,
    ) -> Self {
        let session = Arc::new(session);
        Self {
            resolver: PathResolver::new(client.clone(), session.clone()),
            size_poller: FileSizePoller::new(
                client.clone(),
                session.device_guid.clone(),
                config.file_size_poll_interval,
            ),
            jobs: RestoreJobManager::new(client, connectivity, session.clone(), config),
            session,
        }
    }

    /// Let `token` interrupt restore polling
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.jobs = self.jobs.with_cancellation(token);
        self
    }

    pub fn session(&self) -> &RestoreSession {
        &self.session
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.jobs.cancellation_token()
    }

    /// Restore `paths` and return the result as a byte stream.
    ///
    /// Paths are resolved strictly in order and the first failure aborts the
    /// call before any job is submitted. With `file_size_calc_timeout` set,
    /// real sizes are computed first; if that times out or fails the restore
    /// proceeds with placeholder sizes.
    ///
    /// # Errors
    /// `ArchiveFileNotFound` for the first unresolvable path, or any error
    /// from job submission, polling and streaming.
    #[instrument(skip(self, paths), fields(device_guid = %self.session.device_guid, paths = paths.len()))]
    pub async fn stream_from_backup<P: AsRef<str>>(
        &self,
        paths: &[P],
        file_size_calc_timeout: Option<Duration>,
        show_deleted: Option<bool>,
    ) -> Result<ByteStream> {
        let selections = self.prepare(paths, file_size_calc_timeout, show_deleted).await?;
        self.jobs.get_stream(&selections, show_deleted).await
    }

    /// Restore `paths` directly onto another connected device.
    ///
    /// # Errors
    /// As [`stream_from_backup`](Self::stream_from_backup), plus
    /// `DeviceNotConnected` when the accepting device is offline.
    #[instrument(skip(self, paths, target), fields(device_guid = %self.session.device_guid, paths = paths.len()))]
    pub async fn stream_to_device<P: AsRef<str>>(
        &self,
        paths: &[P],
        target: &PushRestoreTarget,
        file_size_calc_timeout: Option<Duration>,
        show_deleted: Option<bool>,
    ) -> Result<PushRestoreAck> {
        let selections = self.prepare(paths, file_size_calc_timeout, show_deleted).await?;
        self.jobs.send_stream(&selections, target, show_deleted).await
    }

    /// Sizes for archive node ids, in completion order.
    ///
    /// `Ok(None)` means the sizes are unknown, either because no timeout was
    /// given or because it ran out.
    ///
    /// # Errors
    /// Remote failures propagate.
    pub async fn get_file_sizes(
        &self,
        file_ids: &[String],
        timeout: Option<Duration>,
    ) -> Result<Option<Vec<FileSizeReport>>> {
        self.size_poller.get_file_sizes(file_ids, timeout).await
    }

    /// Cancel a previously submitted restore job on the server.
    ///
    /// # Errors
    /// Remote failures propagate.
    pub async fn cancel_restore(&self, job_id: &str) -> Result<()> {
        self.jobs.cancel(job_id).await
    }

    async fn prepare<P: AsRef<str>>(
        &self,
        paths: &[P],
        file_size_calc_timeout: Option<Duration>,
        show_deleted: Option<bool>,
    ) -> Result<Vec<FileSelection>> {
        if paths.is_empty() {
            return Err(RestoreKitError::InvalidInput("no archive paths given".into()));
        }

        let paths: Vec<String> = paths.iter().map(|p| normalize_path(p.as_ref())).collect();
        let mut nodes = Vec::with_capacity(paths.len());
        for path in &paths {
            nodes.push(self.resolver.resolve(path, show_deleted).await?);
        }

        let sizes = self.sizes_for(&nodes, file_size_calc_timeout).await;
        build_file_selections(&paths, &nodes, sizes.as_deref())
    }

    /// Sizes aligned with `nodes`, or `None` when they are unknown.
    async fn sizes_for(
        &self,
        nodes: &[TreeNode],
        timeout: Option<Duration>,
    ) -> Option<Vec<SizeCounts>> {
        if timeout.is_none() {
            return None;
        }
        let file_ids: Vec<String> = nodes.iter().filter_map(|n| n.id.clone()).collect();

        let reports = match self.size_poller.get_file_sizes(&file_ids, timeout).await {
            Ok(Some(reports)) => reports,
            Ok(None) => {
                debug!("File sizes unavailable; using placeholder counts");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "File size calculation failed; using placeholder counts");
                return None;
            }
        };

        let by_id: HashMap<&str, SizeCounts> =
            reports.iter().map(|r| (r.file_id.as_str(), r.counts())).collect();
        Some(
            nodes
                .iter()
                .map(|node| {
                    node.id
                        .as_deref()
                        .and_then(|id| by_id.get(id).copied())
                        .unwrap_or(SizeCounts::PLACEHOLDER)
                })
                .collect(),
        )
    }
}

/// Opens restore sessions and builds accessors on top of them
pub struct ArchiveAccessorFactory {
    client: Arc<dyn RemoteTreeClient>,
    connectivity: Arc<dyn DeviceConnectivity>,
    sessions: Arc<dyn RestoreSessionProvider>,
    config: RestoreConfig,
}

impl ArchiveAccessorFactory {
    pub fn new(
        client: Arc<dyn RemoteTreeClient>,
        connectivity: Arc<dyn DeviceConnectivity>,
        sessions: Arc<dyn RestoreSessionProvider>,
        config: RestoreConfig,
    ) -> Self {
        Self { client, connectivity, sessions, config }
    }

    /// Open a restore session for `device_guid` on storage node `node_guid`.
    ///
    /// Private passwords and custom keys are presented directly; server
    /// managed archives fetch a data-key token first.
    ///
    /// # Errors
    /// Remote failures while fetching the token or opening the session.
    #[instrument(skip(self, credentials))]
    pub async fn create(
        &self,
        device_guid: &str,
        node_guid: &str,
        credentials: DecryptionCredentials,
    ) -> Result<ArchiveAccessor> {
        let secret = match credentials {
            DecryptionCredentials::ServerManaged => {
                SessionSecret::DataKeyToken(self.sessions.data_key_token(device_guid).await?)
            }
            DecryptionCredentials::PrivatePassword(password) => {
                SessionSecret::PrivatePassword(password)
            }
            DecryptionCredentials::EncryptionKey(key) => SessionSecret::EncryptionKey(key),
        };

        let session_id = self.sessions.create_restore_session(device_guid, &secret).await?;
        info!(session_id = %session_id, secret = secret.field_name(), "Restore session opened");

        let session = RestoreSession {
            session_id,
            device_guid: device_guid.to_string(),
            node_guid: node_guid.to_string(),
        };
        Ok(ArchiveAccessor::new(
            session,
            self.client.clone(),
            self.connectivity.clone(),
            &self.config,
        ))
    }
}
