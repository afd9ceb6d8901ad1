//! Search roots and the mapping between disk paths and logical names

use crate::Error;
use dset_ir::LogicalName;
use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, trace};

/// A directory consulted when mapping schema files, optionally mounted
/// under a virtual prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot {
    virtual_prefix: String,
    disk_path: PathBuf,
}

impl SearchRoot {
    /// Mount a directory at the root of the logical namespace
    pub fn new(disk_path: impl AsRef<Path>) -> Self {
        Self::mapped("", disk_path)
    }

    /// Mount a directory under a virtual prefix (`VIRTUAL=DISK`)
    pub fn mapped(virtual_prefix: &str, disk_path: impl AsRef<Path>) -> Self {
        Self {
            virtual_prefix: virtual_prefix.trim_matches('/').to_string(),
            disk_path: normalize(disk_path.as_ref()),
        }
    }

    pub fn virtual_prefix(&self) -> &str {
        &self.virtual_prefix
    }

    pub fn disk_path(&self) -> &Path {
        &self.disk_path
    }

    /// Map a disk path under this root to its logical name
    pub fn disk_to_virtual(&self, disk_file: &Path) -> Option<LogicalName> {
        let disk_file = normalize(disk_file);
        let relative = if self.disk_path.as_os_str().is_empty() {
            disk_file.as_path()
        } else {
            disk_file.strip_prefix(&self.disk_path).ok()?
        };
        LogicalName::from_relative_path(&self.virtual_prefix, relative)
    }

    /// Map a logical name to where this root would hold it on disk.
    ///
    /// Does not touch the filesystem.
    pub fn virtual_to_disk(&self, name: &LogicalName) -> Option<PathBuf> {
        let relative = name.strip_prefix(&self.virtual_prefix)?;
        Some(self.disk_path.join(relative))
    }
}

impl FromStr for SearchRoot {
    type Err = Error;

    /// Parse `DISK` or `VIRTUAL=DISK`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let root = match s.split_once('=') {
            Some((prefix, disk)) => {
                if disk.is_empty() || prefix.split('/').any(|seg| seg == "..") {
                    return Err(Error::InvalidSearchRoot(s.to_string()));
                }
                Self::mapped(prefix, disk)
            }
            None => Self::new(s),
        };
        Ok(root)
    }
}

/// Outcome of mapping a disk path to a logical name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskMapping {
    /// The path maps to this logical name
    Mapped(LogicalName),
    /// A higher-priority root holds a different file under the same name
    Shadowed {
        name: LogicalName,
        shadowing: PathBuf,
    },
    /// The path maps, but the file cannot be opened
    CannotOpen { name: LogicalName, reason: String },
    /// No root contains the path
    NoMapping,
}

/// Ordered set of search roots; earlier roots take priority
#[derive(Debug, Clone, Default)]
pub struct SourceTree {
    roots: Vec<SearchRoot>,
}

impl SourceTree {
    pub fn new(roots: Vec<SearchRoot>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[SearchRoot] {
        &self.roots
    }

    /// Map a disk path to its logical name.
    ///
    /// The first root containing the path decides the name. The mapping is
    /// shadowed when any earlier root also holds a file under that name.
    pub fn map_disk_path(&self, disk_file: &Path) -> DiskMapping {
        let Some((index, name)) = self
            .roots
            .iter()
            .enumerate()
            .find_map(|(i, root)| root.disk_to_virtual(disk_file).map(|name| (i, name)))
        else {
            trace!("No search root contains {:?}", disk_file);
            return DiskMapping::NoMapping;
        };

        for higher in &self.roots[..index] {
            if let Some(candidate) = higher.virtual_to_disk(&name) {
                if candidate.exists() {
                    debug!("{} at {:?} is shadowed by {:?}", name, disk_file, candidate);
                    return DiskMapping::Shadowed {
                        name,
                        shadowing: candidate,
                    };
                }
            }
        }

        if let Err(e) = File::open(disk_file) {
            return DiskMapping::CannotOpen {
                name,
                reason: e.to_string(),
            };
        }

        trace!("Mapped {:?} to {}", disk_file, name);
        DiskMapping::Mapped(name)
    }

    /// Find the disk file a logical name refers to, in root priority order
    pub fn virtual_to_disk(&self, name: &LogicalName) -> Option<PathBuf> {
        self.roots
            .iter()
            .filter_map(|root| root.virtual_to_disk(name))
            .find(|candidate| candidate.is_file())
    }

    /// Read the file a logical name refers to.
    ///
    /// Roots where the file is missing are skipped; any other failure is
    /// remembered and returned if no later root has the file.
    pub fn read(&self, name: &LogicalName) -> io::Result<(PathBuf, String)> {
        let mut last_error = None;
        for candidate in self.roots.iter().filter_map(|root| root.virtual_to_disk(name)) {
            match std::fs::read_to_string(&candidate) {
                Ok(text) => {
                    trace!("Read {} from {:?}", name, candidate);
                    return Ok((candidate, text));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound)))
    }
}

/// Drop `.` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
