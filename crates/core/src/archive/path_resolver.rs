//! Logical path to archive node resolution
//!
//! The archive only exposes "list the children of node X", so a path such as
//! `C:/Users/qa/report.pdf` is resolved by walking down from the root level
//! one listing at a time. Matching is case-insensitive and exact; there is no
//! fuzzy or prefix matching and nothing is cached between calls.

use std::sync::Arc;

use restorekit_domain::{normalize_path, RestoreKitError, RestoreSession, Result, TreeNode};
use tracing::{debug, instrument};

use super::ports::RemoteTreeClient;

/// Walks the remote tree of one restore session
pub struct PathResolver {
    client: Arc<dyn RemoteTreeClient>,
    session: Arc<RestoreSession>,
}

impl PathResolver {
    pub fn new(client: Arc<dyn RemoteTreeClient>, session: Arc<RestoreSession>) -> Self {
        Self { client, session }
    }

    /// Resolve `path` to its tree node.
    ///
    /// Issues one `list_children` call per level walked, `depth + 1` in
    /// total. A trailing `/` stops the walk at the directory before it.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty path, before any remote call
    /// - `ArchiveFileNotFound` carrying the sub-path that had no match and
    ///   the listing it was looked up in. A missing root reports the full
    ///   requested path.
    /// - Any error from the tree client, unchanged
    #[instrument(skip(self), fields(device_guid = %self.session.device_guid))]
    pub async fn resolve(&self, path: &str, show_deleted: Option<bool>) -> Result<TreeNode> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(RestoreKitError::InvalidInput("archive path must not be empty".into()));
        }

        let mut segments = path.split('/');
        let root_key = format!("{}/", segments.next().unwrap_or_default());

        let root_level = self.list(None, show_deleted).await?;
        let mut current = match find_match(&root_level, &root_key) {
            Some(node) => node,
            None => return Err(self.not_found(&path, root_level)),
        };

        for segment in segments {
            if segment.is_empty() {
                break;
            }

            let target = current.child_path(segment);
            let children = self.list(current.id.as_deref(), show_deleted).await?;
            current = match find_match(&children, &target) {
                Some(node) => node,
                None => return Err(self.not_found(&target, children)),
            };
        }

        debug!(resolved = %current.path, node_type = %current.node_type, "Resolved archive path");
        Ok(current)
    }

    async fn list(&self, node_id: Option<&str>, show_deleted: Option<bool>) -> Result<Vec<TreeNode>> {
        debug!(node_id = node_id.unwrap_or("<root>"), "Listing archive tree level");
        self.client.list_children(&self.session, node_id, show_deleted).await
    }

    fn not_found(&self, path: &str, listing: Vec<TreeNode>) -> RestoreKitError {
        RestoreKitError::ArchiveFileNotFound {
            device_guid: self.session.device_guid.clone(),
            path: path.to_string(),
            listing,
        }
    }
}

fn find_match(listing: &[TreeNode], target: &str) -> Option<TreeNode> {
    listing.iter().find(|node| node.matches_path(target)).cloned()
}
