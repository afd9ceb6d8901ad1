//! Writing and reading descriptor set files

use anyhow::{Context, Result};
use dset_ir::DescriptorSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info};

/// Write `bytes` to `path` unless the file already holds exactly them.
///
/// Leaving an unchanged file alone keeps its modification time, so build
/// tools watching it do not rebuild. Returns whether the file was written.
pub fn write_if_changed(path: &Path, bytes: &[u8], force: bool) -> Result<bool> {
    if !force {
        match fs::read(path) {
            Ok(existing) if existing == bytes => {
                debug!("{} is up to date", path.display());
                return Ok(false);
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(true)
}

/// Load a descriptor set file
pub fn read_descriptor_set(path: &Path) -> Result<DescriptorSet> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    DescriptorSet::decode(&bytes)
        .with_context(|| format!("{} is not a descriptor set", path.display()))
}

/// List each file of a set with its package, contents and imports
pub fn print_summary(set: &DescriptorSet, out: &mut impl Write) -> io::Result<()> {
    for file in &set.files {
        writeln!(
            out,
            "{} (package: {}, messages: {}, enums: {}, services: {})",
            file.name,
            file.package.as_deref().unwrap_or("-"),
            file.messages.len(),
            file.enums.len(),
            file.services.len()
        )?;
        for dependency in &file.dependencies {
            writeln!(out, "  import {dependency}")?;
        }
    }
    writeln!(out, "{} file(s)", set.files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dset_ir::FileDescriptor;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_unchanged_file_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/set.bin");

        assert!(write_if_changed(&path, b"abc", false).unwrap());
        let first = fs::metadata(&path).unwrap().modified().unwrap();
        std::thread::sleep(Duration::from_millis(20));

        assert!(!write_if_changed(&path, b"abc", false).unwrap());
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), first);

        assert!(write_if_changed(&path, b"abc", true).unwrap());
        assert!(write_if_changed(&path, b"abcd", false).unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"abcd");
    }

    #[test]
    fn test_print_summary() {
        let mut base = FileDescriptor::new("base.yaml");
        base.package = Some("base".to_string());
        let mut top = FileDescriptor::new("top.yaml");
        top.dependencies = vec!["base.yaml".to_string()];
        let set = DescriptorSet::new(vec![base, top]);

        let mut out = Vec::new();
        print_summary(&set, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "base.yaml (package: base, messages: 0, enums: 0, services: 0)\n\
             top.yaml (package: -, messages: 0, enums: 0, services: 0)\n  import base.yaml\n\
             2 file(s)\n"
        );
    }

    #[test]
    fn test_read_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.bin");
        fs::write(&path, [0xFF, 0xFF, 0xFF]).unwrap();
        assert!(read_descriptor_set(&path).is_err());
    }
}
