//! Capability interface of the descriptor resolution service

use crate::source_tree::DiskMapping;
use dset_diagnostics::Diagnostics;
use dset_ir::{DescriptorGraph, LogicalName, NodeId};
use std::path::{Path, PathBuf};

/// Looks up parsed descriptors by logical name and maps disk paths.
///
/// Implementations own every node they hand out; callers hold [`NodeId`]s
/// and read nodes back through [`DescriptorGraph`]. Resolution reports its
/// own parse and validation failures to `diagnostics`.
pub trait DescriptorResolver: DescriptorGraph {
    /// Resolve a logical name, parsing it and its imports on first use
    fn resolve(&mut self, name: &LogicalName, diagnostics: &mut Diagnostics) -> Option<NodeId>;

    /// Map a disk path to the logical name it would be resolved under
    fn map_disk_path(&self, path: &Path) -> DiskMapping;

    /// Find the disk file behind a logical name
    fn virtual_to_disk(&self, name: &LogicalName) -> Option<PathBuf>;
}
