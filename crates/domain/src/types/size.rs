//! File-size calculation jobs

use serde::{Deserialize, Serialize};

use super::selection::SizeCounts;
use crate::constants::SIZE_JOB_DONE_STATUS;

/// A submitted size-calculation job for one archive node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeJob {
    pub job_id: String,
    pub file_id: String,
}

/// Status of a size job as reported by the storage server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeJobStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub num_files: u64,
    #[serde(default)]
    pub num_dirs: u64,
    #[serde(default, alias = "size")]
    pub num_bytes: u64,
}

impl SizeJobStatus {
    pub fn is_done(&self) -> bool {
        self.status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(SIZE_JOB_DONE_STATUS))
    }
}

/// Final sizes of one node, tagged with the job and node it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSizeReport {
    pub job_id: String,
    pub file_id: String,
    pub status: String,
    pub num_files: u64,
    pub num_dirs: u64,
    pub num_bytes: u64,
}

impl FileSizeReport {
    pub fn from_status(job: &SizeJob, status: &SizeJobStatus) -> Self {
        Self {
            job_id: job.job_id.clone(),
            file_id: job.file_id.clone(),
            status: status.status.clone().unwrap_or_default(),
            num_files: status.num_files,
            num_dirs: status.num_dirs,
            num_bytes: status.num_bytes,
        }
    }

    pub fn counts(&self) -> SizeCounts {
        SizeCounts::new(self.num_files, self.num_dirs, self.num_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_status_is_case_insensitive() {
        let status = SizeJobStatus { status: Some("DONE".into()), ..Default::default() };
        assert!(status.is_done());
        let status = SizeJobStatus { status: Some("InProgress".into()), ..Default::default() };
        assert!(!status.is_done());
        assert!(!SizeJobStatus::default().is_done());
    }

    #[test]
    fn size_field_is_accepted_as_byte_count() {
        let status: SizeJobStatus =
            serde_json::from_str(r#"{"status":"done","numFiles":3,"numDirs":1,"size":4096}"#)
                .unwrap();
        assert_eq!(status.num_bytes, 4096);

        let job = SizeJob { job_id: "sj-1".into(), file_id: "f-9".into() };
        let report = FileSizeReport::from_status(&job, &status);
        assert_eq!(report.file_id, "f-9");
        assert_eq!(report.counts(), SizeCounts::new(3, 1, 4096));
    }
}
