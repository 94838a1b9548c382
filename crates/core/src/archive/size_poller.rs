//! Best-effort file size calculation
//!
//! Sizes are only used to show accurate totals before a large restore, so
//! the whole batch is bounded by a caller-supplied timeout. Running out of
//! time yields `Ok(None)` ("sizes unknown") rather than an error or a partial
//! list.

use std::sync::Arc;
use std::time::Duration;

use restorekit_domain::{FileSizeReport, Result, SizeJob};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::ports::RemoteTreeClient;

/// Submits size jobs for a set of nodes and polls them round-robin
pub struct FileSizePoller {
    client: Arc<dyn RemoteTreeClient>,
    device_guid: String,
    poll_interval: Duration,
}

impl FileSizePoller {
    pub fn new(
        client: Arc<dyn RemoteTreeClient>,
        device_guid: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self { client, device_guid: device_guid.into(), poll_interval }
    }

    /// Compute sizes for `file_ids`.
    ///
    /// A `None` or zero timeout skips the calculation without any remote
    /// call. Otherwise one size job is created per id and every outstanding
    /// job is polled once per pass until all report `done`.
    ///
    /// Reports come back in **completion order**, not input order. Each one
    /// carries its `file_id`; callers that need input alignment must match on
    /// it.
    ///
    /// # Errors
    /// Remote failures propagate. A timeout is `Ok(None)`.
    #[instrument(skip(self, file_ids), fields(device_guid = %self.device_guid, files = file_ids.len()))]
    pub async fn get_file_sizes(
        &self,
        file_ids: &[String],
        timeout: Option<Duration>,
    ) -> Result<Option<Vec<FileSizeReport>>> {
        let Some(timeout) = timeout.filter(|t| !t.is_zero()) else {
            debug!("Size calculation skipped");
            return Ok(None);
        };

        let started = Instant::now();
        let mut outstanding: Vec<SizeJob> = Vec::with_capacity(file_ids.len());
        for file_id in file_ids {
            outstanding.push(self.client.create_size_job(&self.device_guid, file_id).await?);
        }

        let mut reports = Vec::with_capacity(outstanding.len());
        let mut passes = 0_u32;
        loop {
            passes += 1;
            let mut pending = Vec::with_capacity(outstanding.len());
            for job in outstanding {
                let status = self.client.get_size_job(&job.job_id, &self.device_guid).await?;
                if status.is_done() {
                    debug!(job_id = %job.job_id, file_id = %job.file_id, "Size job finished");
                    reports.push(FileSizeReport::from_status(&job, &status));
                } else {
                    pending.push(job);
                }
            }
            outstanding = pending;

            if outstanding.is_empty() {
                debug!(passes, "All size jobs finished");
                return Ok(Some(reports));
            }

            if started.elapsed() > timeout {
                warn!(
                    passes,
                    outstanding = outstanding.len(),
                    ?timeout,
                    "Size calculation timed out; discarding partial results"
                );
                return Ok(None);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
