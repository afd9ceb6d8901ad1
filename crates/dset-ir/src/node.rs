//! Descriptor nodes and the graph view over a pool of them

use crate::descriptor::{FileDescriptor, MessageDescriptor};
use crate::metadata::SourceCodeInfo;
use crate::name::LogicalName;
use std::fmt;

/// Index of a node inside the pool that created it.
///
/// Ids are only minted by a pool and are meaningless outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Wrap a raw arena index
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The raw arena index
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One parsed schema file.
///
/// The node does not own its dependencies; it refers to them by [`NodeId`]
/// within the same pool. Nodes are immutable once built.
#[derive(Debug, Clone)]
pub struct DescriptorNode {
    name: LogicalName,
    dependencies: Vec<NodeId>,
    descriptor: FileDescriptor,
    source_code_info: SourceCodeInfo,
}

impl DescriptorNode {
    /// Build a node.
    ///
    /// `descriptor` carries the full content including JSON names; its own
    /// `source_code_info` slot is ignored in favour of `source_code_info`.
    #[must_use]
    pub fn new(
        name: LogicalName,
        dependencies: Vec<NodeId>,
        mut descriptor: FileDescriptor,
        source_code_info: SourceCodeInfo,
    ) -> Self {
        descriptor.source_code_info = None;
        Self {
            name,
            dependencies,
            descriptor,
            source_code_info,
        }
    }

    #[must_use]
    pub fn name(&self) -> &LogicalName {
        &self.name
    }

    /// Dependencies in declaration order
    #[must_use]
    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    /// The full descriptor, JSON names included
    #[must_use]
    pub fn descriptor(&self) -> &FileDescriptor {
        &self.descriptor
    }

    /// Copy the descriptive content without JSON names or source info
    #[must_use]
    pub fn copy_to(&self) -> FileDescriptor {
        let mut copy = self.descriptor.clone();
        copy.clear_json_names();
        copy
    }

    /// Fill in JSON names on a copy produced by [`copy_to`](Self::copy_to)
    pub fn copy_json_names_to(&self, target: &mut FileDescriptor) {
        copy_message_json_names(&self.descriptor.messages, &mut target.messages);
    }

    /// Attach this file's source-location annotations to a copy
    pub fn copy_source_code_info_to(&self, target: &mut FileDescriptor) {
        target.source_code_info = Some(self.source_code_info.clone());
    }
}

fn copy_message_json_names(source: &[MessageDescriptor], target: &mut [MessageDescriptor]) {
    for (from, to) in source.iter().zip(target.iter_mut()) {
        for (from_field, to_field) in from.fields.iter().zip(to.fields.iter_mut()) {
            to_field.json_name.clone_from(&from_field.json_name);
        }
        copy_message_json_names(&from.messages, &mut to.messages);
    }
}

/// Read-only access to the nodes of a pool
pub trait DescriptorGraph {
    /// Look up a node by id.
    ///
    /// Ids come from the same graph, so lookups cannot miss.
    fn node(&self, id: NodeId) -> &DescriptorNode;
}

impl DescriptorGraph for [DescriptorNode] {
    fn node(&self, id: NodeId) -> &DescriptorNode {
        &self[id.index()]
    }
}

impl DescriptorGraph for Vec<DescriptorNode> {
    fn node(&self, id: NodeId) -> &DescriptorNode {
        &self[id.index()]
    }
}
