//! Restore jobs, their requests and the local projection of remote state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::selection::SelectionDescriptor;
use crate::constants::MAX_PERCENT_COMPLETE;
use crate::errors::{RestoreKitError, Result};
use crate::impl_domain_status_conversions;

/* -------------------------------------------------------------------------- */
/* Job lifecycle */
/* -------------------------------------------------------------------------- */

/// Lifecycle of a web restore as seen by the client.
///
/// `NotSubmitted -> Submitted -> Polling* -> Done -> Streaming -> Complete`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreJobState {
    NotSubmitted,
    Submitted,
    Polling,
    Done,
    Streaming,
    Complete,
}

impl_domain_status_conversions!(RestoreJobState {
    NotSubmitted => "not_submitted",
    Submitted => "submitted",
    Polling => "polling",
    Done => "done",
    Streaming => "streaming",
    Complete => "complete",
});

/// Status payload of a restore job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreJobStatus {
    pub done: bool,
    /// Optional on some payload variants; absence is not a failure.
    #[serde(default)]
    pub status: Option<String>,
    /// Servers report fractions and, occasionally, values past 100.
    #[serde(default, deserialize_with = "lenient_percent")]
    pub percent_complete: u8,
}

/// Accepts any JSON number (or null) and rounds it into `0..=100`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_percent<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if raw.is_nan() {
        return Ok(0);
    }
    let clamped = raw.clamp(0.0, f64::from(MAX_PERCENT_COMPLETE)).round();
    Ok(clamped as u8)
}

/// Read-through projection of a remote restore job.
///
/// Only status reads from the server move it forward. Once `done` is set the
/// job rejects further status updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreJob {
    pub job_id: String,
    pub status: Option<String>,
    pub done: bool,
    pub percent_complete: u8,
    pub state: RestoreJobState,
    pub submitted_at: DateTime<Utc>,
}

impl RestoreJob {
    pub fn submitted(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: None,
            done: false,
            percent_complete: 0,
            state: RestoreJobState::Submitted,
            submitted_at: Utc::now(),
        }
    }

    /// Fold one status read into the projection.
    ///
    /// # Errors
    /// Returns `RestoreKitError::Internal` if the job was already done.
    pub fn apply_status(&mut self, status: RestoreJobStatus) -> Result<()> {
        if self.done {
            return Err(RestoreKitError::Internal(format!(
                "restore job {} already finished; status updates are not accepted",
                self.job_id
            )));
        }

        if status.status.is_some() {
            self.status = status.status;
        }
        self.percent_complete = status.percent_complete.min(MAX_PERCENT_COMPLETE);
        self.done = status.done;
        self.state = if status.done { RestoreJobState::Done } else { RestoreJobState::Polling };
        if self.done {
            self.percent_complete = MAX_PERCENT_COMPLETE;
        }
        Ok(())
    }

    /// # Errors
    /// Returns `RestoreKitError::Internal` unless the job is `Done`.
    pub fn begin_streaming(&mut self) -> Result<()> {
        self.transition(RestoreJobState::Done, RestoreJobState::Streaming)
    }

    /// # Errors
    /// Returns `RestoreKitError::Internal` unless the job is `Streaming`.
    pub fn complete(&mut self) -> Result<()> {
        self.transition(RestoreJobState::Streaming, RestoreJobState::Complete)
    }

    fn transition(&mut self, from: RestoreJobState, to: RestoreJobState) -> Result<()> {
        if self.state != from {
            return Err(RestoreKitError::Internal(format!(
                "restore job {} cannot move from {} to {to}",
                self.job_id, self.state
            )));
        }
        self.state = to;
        Ok(())
    }
}

/* -------------------------------------------------------------------------- */
/* Requests */
/* -------------------------------------------------------------------------- */

/// Body of a web restore submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreJobRequest {
    #[serde(rename = "sourceGuid")]
    pub device_guid: String,
    #[serde(rename = "webRestoreSessionId")]
    pub session_id: String,
    pub restore_groups: Vec<SelectionDescriptor>,
    pub num_files: u64,
    pub num_dirs: u64,
    pub num_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_result: Option<bool>,
}

/// What to do with files that already exist at the push destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExistingFiles {
    #[default]
    Overwrite,
    RenameOriginal,
}

/// Permissions applied to files written by a push restore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilePermissions {
    #[default]
    Current,
    Original,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRestoreOptions {
    pub restore_full_path: bool,
    pub existing_files: ExistingFiles,
    pub file_permissions: FilePermissions,
    pub permit_restore_to_different_os_version: bool,
}

/// Where a push restore delivers its files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRestoreTarget {
    pub accepting_device_guid: String,
    pub restore_path: String,
    pub options: PushRestoreOptions,
}

impl PushRestoreTarget {
    pub fn new(accepting_device_guid: impl Into<String>, restore_path: impl Into<String>) -> Self {
        Self {
            accepting_device_guid: accepting_device_guid.into(),
            restore_path: restore_path.into(),
            options: PushRestoreOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PushRestoreOptions) -> Self {
        self.options = options;
        self
    }
}

/// Body of a push restore submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRestoreJobRequest {
    #[serde(rename = "sourceGuid")]
    pub device_guid: String,
    #[serde(rename = "acceptingGuid")]
    pub accepting_device_guid: String,
    #[serde(rename = "webRestoreSessionId")]
    pub session_id: String,
    pub target_node_guid: String,
    pub restore_path: String,
    pub restore_groups: Vec<SelectionDescriptor>,
    pub num_files: u64,
    pub num_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_deleted: Option<bool>,
    #[serde(flatten)]
    pub options: PushRestoreOptions,
}

/// Acknowledgement that a push restore was accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRestoreAck {
    pub job_id: String,
}
