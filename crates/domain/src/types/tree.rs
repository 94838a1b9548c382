//! Archive file tree nodes

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Kind of entry in the archive tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "FILE", alias = "file")]
    File,
    #[serde(rename = "DIRECTORY", alias = "directory")]
    Directory,
}

impl_domain_status_conversions!(NodeType {
    File => "file",
    Directory => "directory",
});

/// One file-or-directory entry of a device archive.
///
/// The root level has no parent node; listing it is done with `id = None`.
/// Paths keep the case stored by the backup service but are compared
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: Option<String>,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
}

impl TreeNode {
    pub fn new(id: Option<String>, path: impl Into<String>, node_type: NodeType) -> Self {
        Self { id, path: path.into(), node_type }
    }

    pub fn is_directory(&self) -> bool {
        self.node_type == NodeType::Directory
    }

    /// Case-insensitive comparison against a candidate path
    pub fn matches_path(&self, candidate: &str) -> bool {
        self.path.to_lowercase() == candidate.to_lowercase()
    }

    /// Path of a direct child named `segment`
    pub fn child_path(&self, segment: &str) -> String {
        join_path(&self.path, segment)
    }
}

/// Join an archive path and a single segment with exactly one `/`.
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{segment}")
    } else {
        format!("{parent}/{segment}")
    }
}

/// Convert Windows-style separators to the forward slashes the archive uses.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_respects_trailing_separator() {
        assert_eq!(join_path("C:/", "Users"), "C:/Users");
        assert_eq!(join_path("/", "Users"), "/Users");
        assert_eq!(join_path("/Users/qa", "Downloads"), "/Users/qa/Downloads");
    }

    #[test]
    fn normalizes_backslashes() {
        assert_eq!(normalize_path(r"C:\Users\qa\file.txt"), "C:/Users/qa/file.txt");
        assert_eq!(normalize_path("/already/fine"), "/already/fine");
    }

    #[test]
    fn matches_path_ignores_case() {
        let node = TreeNode::new(Some("9".into()), "C:/Users/qa/Downloads/File.txt", NodeType::File);
        assert!(node.matches_path("C:/users/QA/downloads/File.TXT"));
        assert!(!node.matches_path("C:/users/QA/downloads/File.TXT.bak"));
    }

    #[test]
    fn node_type_accepts_either_case_on_the_wire() {
        let node: TreeNode =
            serde_json::from_str(r#"{"id":"1","path":"/Users","type":"directory"}"#).unwrap();
        assert!(node.is_directory());
        let node: TreeNode =
            serde_json::from_str(r#"{"id":null,"path":"/","type":"DIRECTORY"}"#).unwrap();
        assert_eq!(node.id, None);
        assert_eq!(serde_json::to_value(node.node_type).unwrap(), "DIRECTORY");
    }
}
