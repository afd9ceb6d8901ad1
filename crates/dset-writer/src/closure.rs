//! Transitive closure collection
//!
//! Walks the dependency graph depth-first from each requested node and
//! emits every reachable file once, after all of its dependencies.

use dset_ir::{DescriptorGraph, FileDescriptor, NodeId};
use std::collections::HashSet;
use tracing::{trace, warn};

/// Which annotations to carry into the collected copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClosureOptions {
    /// Keep each field's JSON name
    pub include_json_names: bool,
    /// Keep documentation locations
    pub include_source_info: bool,
}

impl ClosureOptions {
    /// Carry every annotation
    pub fn all() -> Self {
        Self {
            include_json_names: true,
            include_source_info: true,
        }
    }
}

/// Collect the files reachable from `roots`, dependencies first.
///
/// One visited set is shared across all roots, so a file reachable from
/// several of them appears once, at its first position. Dependencies are
/// walked in declaration order. A node is marked visited before its
/// dependencies are walked; an edge back into the walk is skipped.
pub fn collect_transitive<G: DescriptorGraph + ?Sized>(
    graph: &G,
    roots: &[NodeId],
    options: ClosureOptions,
) -> Vec<FileDescriptor> {
    let mut walk = Walk {
        graph,
        options,
        visited: HashSet::new(),
        on_stack: HashSet::new(),
        files: Vec::new(),
    };
    for root in roots {
        walk.visit(*root);
    }
    walk.files
}

struct Walk<'g, G: ?Sized> {
    graph: &'g G,
    options: ClosureOptions,
    visited: HashSet<NodeId>,
    on_stack: HashSet<NodeId>,
    files: Vec<FileDescriptor>,
}

impl<G: DescriptorGraph + ?Sized> Walk<'_, G> {
    fn visit(&mut self, id: NodeId) {
        if !self.visited.insert(id) {
            if self.on_stack.contains(&id) {
                warn!(
                    "Dependency cycle through {}; emitting it before all of its dependencies",
                    self.graph.node(id).name()
                );
            }
            return;
        }
        self.on_stack.insert(id);

        let node = self.graph.node(id);
        for dependency in node.dependencies() {
            self.visit(*dependency);
        }
        self.on_stack.remove(&id);

        let mut file = node.copy_to();
        if self.options.include_json_names {
            node.copy_json_names_to(&mut file);
        }
        if self.options.include_source_info {
            node.copy_source_code_info_to(&mut file);
        }
        trace!("Closure entry {}: {}", self.files.len(), node.name());
        self.files.push(file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dset_ir::metadata::FILE_MESSAGE;
    use dset_ir::{
        DescriptorNode, FieldDescriptor, FieldLabel, Location, LogicalName, MessageDescriptor,
        SourceCodeInfo,
    };

    fn node(name: &str, deps: &[usize]) -> DescriptorNode {
        let mut descriptor = FileDescriptor::new(name);
        descriptor.messages.push(MessageDescriptor {
            name: "M".to_string(),
            fields: vec![FieldDescriptor {
                name: "some_field".to_string(),
                number: 1,
                type_name: "string".to_string(),
                label: FieldLabel::Optional,
                json_name: Some("someField".to_string()),
            }],
            ..MessageDescriptor::default()
        });
        let info = SourceCodeInfo {
            locations: vec![Location::with_leading(vec![FILE_MESSAGE, 0], "Doc.")],
        };
        DescriptorNode::new(
            LogicalName::new(name).unwrap(),
            deps.iter().copied().map(NodeId::new).collect(),
            descriptor,
            info,
        )
    }

    fn names(files: &[FileDescriptor]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    /// d <- b, d <- c, b <- a, c <- a; e stands alone
    fn diamond() -> Vec<DescriptorNode> {
        vec![
            node("d.yaml", &[]),
            node("b.yaml", &[0]),
            node("c.yaml", &[0]),
            node("a.yaml", &[1, 2]),
            node("e.yaml", &[]),
        ]
    }

    #[test]
    fn test_dependencies_come_first() {
        let graph = diamond();
        let files = collect_transitive(&graph, &[NodeId::new(3)], ClosureOptions::all());
        assert_eq!(names(&files), vec!["d.yaml", "b.yaml", "c.yaml", "a.yaml"]);
    }

    #[test]
    fn test_shared_nodes_appear_once_across_roots() {
        let graph = diamond();
        let roots = [NodeId::new(1), NodeId::new(3), NodeId::new(4), NodeId::new(1)];
        let files = collect_transitive(&graph, &roots, ClosureOptions::all());
        assert_eq!(names(&files), vec!["d.yaml", "b.yaml", "c.yaml", "a.yaml", "e.yaml"]);
    }

    #[test]
    fn test_unreachable_nodes_are_left_out() {
        let graph = diamond();
        let files = collect_transitive(&graph, &[NodeId::new(2)], ClosureOptions::all());
        assert_eq!(names(&files), vec!["d.yaml", "c.yaml"]);
        assert!(collect_transitive(&graph, &[], ClosureOptions::all()).is_empty());
    }

    #[test]
    fn test_annotations_follow_options() {
        let graph = diamond();
        let bare = collect_transitive(&graph, &[NodeId::new(0)], ClosureOptions::default());
        assert_eq!(bare[0].messages[0].fields[0].json_name, None);
        assert_eq!(bare[0].source_code_info, None);

        let full = collect_transitive(&graph, &[NodeId::new(0)], ClosureOptions::all());
        assert_eq!(full[0].messages[0].fields[0].json_name.as_deref(), Some("someField"));
        assert_eq!(full[0].source_code_info.as_ref().map(|i| i.locations.len()), Some(1));
    }

    #[test]
    fn test_cycle_is_not_descended_twice() {
        let graph = vec![node("x.yaml", &[1]), node("y.yaml", &[0])];
        let files = collect_transitive(&graph, &[NodeId::new(0)], ClosureOptions::all());
        assert_eq!(names(&files), vec!["y.yaml", "x.yaml"]);
    }
}
