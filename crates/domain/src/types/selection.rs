//! Restore selections and their multiplicities

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use super::tree::NodeType;

/// File, directory and byte counts attached to a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeCounts {
    pub num_files: u64,
    pub num_dirs: u64,
    pub num_bytes: u64,
}

impl SizeCounts {
    /// `1/1/1`, used when real sizes are unknown. Only meaningful as a
    /// progress-display stand-in, never as a quota figure.
    pub const PLACEHOLDER: Self = Self { num_files: 1, num_dirs: 1, num_bytes: 1 };

    pub const fn new(num_files: u64, num_dirs: u64, num_bytes: u64) -> Self {
        Self { num_files, num_dirs, num_bytes }
    }
}

impl Add for SizeCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            num_files: self.num_files.saturating_add(rhs.num_files),
            num_dirs: self.num_dirs.saturating_add(rhs.num_dirs),
            num_bytes: self.num_bytes.saturating_add(rhs.num_bytes),
        }
    }
}

impl AddAssign for SizeCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for SizeCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// The part of a selection that goes into the restore manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionDescriptor {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub path: String,
    pub selected: bool,
}

/// One entry of a restore request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSelection {
    pub descriptor: SelectionDescriptor,
    pub num_files: u64,
    pub num_dirs: u64,
    pub num_bytes: u64,
}

impl FileSelection {
    /// Selected entry carrying the placeholder multiplicities.
    pub fn new(node_type: NodeType, path: impl Into<String>) -> Self {
        Self::with_counts(node_type, path, SizeCounts::PLACEHOLDER)
    }

    pub fn with_counts(node_type: NodeType, path: impl Into<String>, counts: SizeCounts) -> Self {
        Self {
            descriptor: SelectionDescriptor { node_type, path: path.into(), selected: true },
            num_files: counts.num_files,
            num_dirs: counts.num_dirs,
            num_bytes: counts.num_bytes,
        }
    }

    pub fn counts(&self) -> SizeCounts {
        SizeCounts::new(self.num_files, self.num_dirs, self.num_bytes)
    }

    pub fn is_placeholder(&self) -> bool {
        self.counts() == SizeCounts::PLACEHOLDER
    }

    pub fn is_directory(&self) -> bool {
        self.descriptor.node_type == NodeType::Directory
    }
}
