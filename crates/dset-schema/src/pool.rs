//! Lazily populated pool of parsed schema files

use crate::loader::SchemaLoader;
use crate::resolver::DescriptorResolver;
use crate::source_tree::{DiskMapping, SourceTree};
use dset_diagnostics::Diagnostics;
use dset_ir::{DescriptorGraph, DescriptorNode, LogicalName, NodeId};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Arena of descriptor nodes keyed by logical name.
///
/// Files are loaded from the source tree on first request. Imports are
/// resolved before the importing file is inserted, so a node's
/// dependencies always have lower ids than the node itself. Both successes
/// and failures are remembered for the lifetime of the pool.
pub struct DescriptorPool {
    tree: SourceTree,
    loader: SchemaLoader,
    nodes: Vec<DescriptorNode>,
    by_name: HashMap<LogicalName, NodeId>,
    failed: HashSet<LogicalName>,
    /// Files currently being loaded, outermost first
    loading: Vec<LogicalName>,
}

impl DescriptorPool {
    /// Create an empty pool over a source tree
    pub fn new(tree: SourceTree) -> Self {
        Self {
            tree,
            loader: SchemaLoader::new(),
            nodes: Vec::new(),
            by_name: HashMap::new(),
            failed: HashSet::new(),
            loading: Vec::new(),
        }
    }

    pub fn tree(&self) -> &SourceTree {
        &self.tree
    }

    /// Number of successfully loaded files
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up an already loaded file without loading anything
    pub fn find(&self, name: &LogicalName) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Every loaded node, in load order
    pub fn nodes(&self) -> &[DescriptorNode] {
        &self.nodes
    }

    fn load(&mut self, name: &LogicalName, diagnostics: &mut Diagnostics) -> Option<NodeId> {
        let (path, text) = match self.tree.read(name) {
            Ok(found) => found,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                diagnostics.add_error(name.as_str(), None, "File not found.");
                return None;
            }
            Err(e) => {
                diagnostics.add_error(name.as_str(), None, format!("Could not read file: {e}"));
                return None;
            }
        };

        let loaded = self
            .loader
            .load_file(name, &path, &text, diagnostics)
            .map_err(|e| debug!("Failed to load {}: {}", name, e))
            .ok()?;

        self.loading.push(name.clone());
        let mut dependencies = Vec::with_capacity(loaded.imports.len());
        let mut import_failed = false;
        for import in &loaded.imports {
            match self.resolve(import, diagnostics) {
                Some(id) => dependencies.push(id),
                None => {
                    diagnostics.add_element_error(
                        name.as_str(),
                        import.as_str(),
                        format!("Import \"{import}\" was not found or had errors."),
                    );
                    import_failed = true;
                }
            }
        }
        self.loading.pop();

        if import_failed {
            return None;
        }

        let id = NodeId::new(self.nodes.len());
        self.nodes.push(DescriptorNode::new(
            name.clone(),
            dependencies,
            loaded.descriptor,
            loaded.source_code_info,
        ));
        self.by_name.insert(name.clone(), id);
        info!("Loaded {} from {:?} as {}", name, path, id);
        Some(id)
    }

    fn report_cycle(&self, name: &LogicalName, diagnostics: &mut Diagnostics) {
        let Some(start) = self.loading.iter().position(|n| n == name) else {
            return;
        };
        let chain: Vec<&str> = self.loading[start..]
            .iter()
            .chain(std::iter::once(name))
            .map(LogicalName::as_str)
            .collect();
        let importer = self.loading.last().unwrap_or(name);

        warn!("Import cycle through {}", name);
        diagnostics.add_element_error(
            importer.as_str(),
            name.as_str(),
            format!("File recursively imports itself: {}", chain.join(" -> ")),
        );
    }
}

impl DescriptorGraph for DescriptorPool {
    fn node(&self, id: NodeId) -> &DescriptorNode {
        &self.nodes[id.index()]
    }
}

impl DescriptorResolver for DescriptorPool {
    fn resolve(&mut self, name: &LogicalName, diagnostics: &mut Diagnostics) -> Option<NodeId> {
        if let Some(id) = self.find(name) {
            debug!("Cache hit for schema: {}", name);
            return Some(id);
        }
        if self.failed.contains(name) {
            debug!("Schema {} already failed to load", name);
            return None;
        }
        if self.loading.contains(name) {
            self.report_cycle(name, diagnostics);
            return None;
        }

        let id = self.load(name, diagnostics);
        if id.is_none() {
            self.failed.insert(name.clone());
        }
        id
    }

    fn map_disk_path(&self, path: &Path) -> DiskMapping {
        self.tree.map_disk_path(path)
    }

    fn virtual_to_disk(&self, name: &LogicalName) -> Option<PathBuf> {
        self.tree.virtual_to_disk(name)
    }
}
