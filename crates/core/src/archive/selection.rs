//! Restore selection building

use restorekit_domain::{FileSelection, RestoreKitError, Result, SizeCounts, TreeNode};

/// Turn resolved paths into restore selections, index-aligned with `paths`.
///
/// Without `sizes` every selection carries the `1/1/1` placeholder. Order is
/// preserved because it becomes the manifest order of the restore job.
///
/// # Errors
/// Returns `InvalidInput` when the slices differ in length.
pub fn build_file_selections(
    paths: &[String],
    nodes: &[TreeNode],
    sizes: Option<&[SizeCounts]>,
) -> Result<Vec<FileSelection>> {
    if paths.len() != nodes.len() || sizes.is_some_and(|s| s.len() != paths.len()) {
        return Err(RestoreKitError::InvalidInput(format!(
            "selection inputs are not aligned: {} paths, {} nodes, {} sizes",
            paths.len(),
            nodes.len(),
            sizes.map_or(0, <[SizeCounts]>::len)
        )));
    }

    Ok(paths
        .iter()
        .zip(nodes)
        .enumerate()
        .map(|(index, (path, node))| {
            let counts = sizes.map_or(SizeCounts::PLACEHOLDER, |sizes| sizes[index]);
            FileSelection::with_counts(node.node_type, path.clone(), counts)
        })
        .collect())
}
