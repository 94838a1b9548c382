//! Restore job submission, polling and result hand-off
//!
//! A web restore goes `Submitted -> Polling* -> Done -> Streaming ->
//! Complete`. The manager never reads the result stream; it hands it to the
//! caller as soon as the server has it ready.
//!
//! Polling is unbounded unless a `job_timeout` is configured, and can always
//! be interrupted through the manager's `CancellationToken`. Transient HTTP
//! failures while polling are not retried here; retries belong to the
//! transport.

use std::sync::Arc;
use std::time::Duration;

use restorekit_domain::{
    FileSelection, PushRestoreAck, PushRestoreJobRequest, PushRestoreTarget, RestoreConfig,
    RestoreJob, RestoreJobRequest, RestoreKitError, RestoreSession, Result, SelectionDescriptor,
    SizeCounts,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::ports::{ByteStream, DeviceConnectivity, RemoteTreeClient};

/// Drives restore jobs for one restore session
pub struct RestoreJobManager {
    client: Arc<dyn RemoteTreeClient>,
    connectivity: Arc<dyn DeviceConnectivity>,
    session: Arc<RestoreSession>,
    polling_interval: Duration,
    job_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl RestoreJobManager {
    pub fn new(
        client: Arc<dyn RemoteTreeClient>,
        connectivity: Arc<dyn DeviceConnectivity>,
        session: Arc<RestoreSession>,
        config: &RestoreConfig,
    ) -> Self {
        Self {
            client,
            connectivity,
            session,
            polling_interval: config.job_polling_interval,
            job_timeout: config.job_timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the token watched by the polling loop
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Submit a web restore for `selections`.
    ///
    /// Multiplicities are summed across the batch. The result is zipped when
    /// more than one entry is selected or the only entry is a directory.
    ///
    /// # Errors
    /// `InvalidInput` for an empty selection list; otherwise whatever the
    /// client reports, including `BadRestoreRequest`.
    #[instrument(skip(self, selections), fields(device_guid = %self.session.device_guid, selections = selections.len()))]
    pub async fn submit(
        &self,
        selections: &[FileSelection],
        show_deleted: Option<bool>,
    ) -> Result<RestoreJob> {
        let totals = totals(selections)?;
        let request = RestoreJobRequest {
            device_guid: self.session.device_guid.clone(),
            session_id: self.session.session_id.clone(),
            restore_groups: descriptors(selections),
            num_files: totals.num_files,
            num_dirs: totals.num_dirs,
            num_bytes: totals.num_bytes,
            show_deleted,
            zip_result: zip_result(selections),
        };

        let job_id = self.client.submit_restore(&request).await?;
        info!(
            job_id = %job_id,
            num_files = totals.num_files,
            num_dirs = totals.num_dirs,
            num_bytes = totals.num_bytes,
            zip = request.zip_result.unwrap_or(false),
            "Restore job submitted"
        );
        Ok(RestoreJob::submitted(job_id))
    }

    /// Read the job's status once and fold it into `job`.
    ///
    /// # Errors
    /// Remote failures propagate; polling a finished job is `Internal`.
    pub async fn poll(&self, job: &mut RestoreJob) -> Result<()> {
        if job.done {
            return Err(RestoreKitError::Internal(format!(
                "restore job {} is already done",
                job.job_id
            )));
        }

        let status = self.client.get_restore_status(&job.job_id).await?;
        job.apply_status(status)?;
        debug!(
            job_id = %job.job_id,
            status = job.status.as_deref().unwrap_or("<none>"),
            percent_complete = job.percent_complete,
            done = job.done,
            "Polled restore job"
        );
        Ok(())
    }

    /// Poll until the job is done.
    ///
    /// # Errors
    /// `Cancelled` when the token fires, `Timeout` when the configured job
    /// timeout elapses, or the first remote failure.
    pub async fn wait_until_done(&self, job: &mut RestoreJob) -> Result<()> {
        let job_id = job.job_id.clone();
        let polling = async {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    Err(RestoreKitError::Cancelled(format!("restore job {job_id} polling cancelled")))
                }
                result = self.poll_until_done(job) => result,
            }
        };

        match self.job_timeout {
            Some(limit) => tokio::time::timeout(limit, polling).await.map_err(|_| {
                RestoreKitError::Timeout(format!(
                    "restore job {job_id} not done after {}ms",
                    limit.as_millis()
                ))
            })?,
            None => polling.await,
        }
    }

    async fn poll_until_done(&self, job: &mut RestoreJob) -> Result<()> {
        loop {
            self.poll(job).await?;
            if job.done {
                return Ok(());
            }
            tokio::time::sleep(self.polling_interval).await;
        }
    }

    /// Submit, wait for completion and return the result stream.
    ///
    /// The caller owns the stream and decides when to drop it.
    ///
    /// # Errors
    /// See [`submit`](Self::submit) and [`wait_until_done`](Self::wait_until_done).
    #[instrument(skip(self, selections), fields(device_guid = %self.session.device_guid))]
    pub async fn get_stream(
        &self,
        selections: &[FileSelection],
        show_deleted: Option<bool>,
    ) -> Result<ByteStream> {
        let mut job = self.submit(selections, show_deleted).await?;
        self.wait_until_done(&mut job).await?;

        job.begin_streaming()?;
        let stream = self.client.stream_restore_result(&job.job_id).await?;
        job.complete()?;

        info!(
            job_id = %job.job_id,
            elapsed_ms = (chrono::Utc::now() - job.submitted_at).num_milliseconds(),
            "Restore result ready"
        );
        Ok(stream)
    }

    /// Push the restore to another, currently connected device.
    ///
    /// # Errors
    /// `DeviceNotConnected` when the accepting device is offline, checked
    /// before anything is submitted.
    #[instrument(skip(self, selections, target), fields(device_guid = %self.session.device_guid, accepting = %target.accepting_device_guid))]
    pub async fn send_stream(
        &self,
        selections: &[FileSelection],
        target: &PushRestoreTarget,
        show_deleted: Option<bool>,
    ) -> Result<PushRestoreAck> {
        let totals = totals(selections)?;

        let server = self.connectivity.connected_server_url(&target.accepting_device_guid).await?;
        if server.is_none() {
            return Err(RestoreKitError::DeviceNotConnected(target.accepting_device_guid.clone()));
        }

        let request = PushRestoreJobRequest {
            device_guid: self.session.device_guid.clone(),
            accepting_device_guid: target.accepting_device_guid.clone(),
            session_id: self.session.session_id.clone(),
            target_node_guid: self.session.node_guid.clone(),
            restore_path: target.restore_path.clone(),
            restore_groups: descriptors(selections),
            num_files: totals.num_files,
            num_bytes: totals.num_bytes,
            show_deleted,
            options: target.options.clone(),
        };

        let job_id = self.client.submit_push_restore(&request).await?;
        info!(job_id = %job_id, restore_path = %target.restore_path, "Push restore submitted");
        Ok(PushRestoreAck { job_id })
    }

    /// Ask the server to cancel a restore job
    ///
    /// # Errors
    /// Remote failures propagate.
    #[instrument(skip(self))]
    pub async fn cancel(&self, job_id: &str) -> Result<()> {
        self.client.cancel_restore(job_id).await?;
        info!(job_id, "Restore job cancelled");
        Ok(())
    }
}

fn totals(selections: &[FileSelection]) -> Result<SizeCounts> {
    if selections.is_empty() {
        return Err(RestoreKitError::InvalidInput("restore needs at least one selection".into()));
    }
    Ok(selections.iter().map(FileSelection::counts).sum())
}

fn descriptors(selections: &[FileSelection]) -> Vec<SelectionDescriptor> {
    selections.iter().map(|s| s.descriptor.clone()).collect()
}

/// `Some(true)` for multi-entry or single-directory restores; `None` leaves
/// the flag off the wire.
pub(crate) fn zip_result(selections: &[FileSelection]) -> Option<bool> {
    match selections {
        [only] if !only.is_directory() => None,
        [] => None,
        _ => Some(true),
    }
}

#[cfg(test)]
mod tests {
    use restorekit_domain::NodeType;

    use super::*;

    #[test]
    fn single_file_is_not_zipped() {
        assert_eq!(zip_result(&[FileSelection::new(NodeType::File, "/a.txt")]), None);
    }

    #[test]
    fn directories_and_batches_are_zipped() {
        assert_eq!(zip_result(&[FileSelection::new(NodeType::Directory, "/docs")]), Some(true));
        assert_eq!(
            zip_result(&[
                FileSelection::new(NodeType::File, "/a.txt"),
                FileSelection::new(NodeType::File, "/b.txt"),
            ]),
            Some(true)
        );
    }

    #[test]
    fn totals_reject_empty_batches() {
        assert!(matches!(totals(&[]), Err(RestoreKitError::InvalidInput(_))));
    }
}
