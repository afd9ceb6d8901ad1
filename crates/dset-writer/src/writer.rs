//! Descriptor set writer

use crate::buffer::{BufferBridge, ByteCounter, OutputBuffer};
use crate::closure::{ClosureOptions, collect_transitive};
use crate::{Error, Result};
use dset_diagnostics::Diagnostics;
use dset_ir::{DescriptorSet, LogicalName};
use dset_schema::DescriptorResolver;
use postcard::ser_flavors::Slice;
use serde::Serialize;
use tracing::{debug, info};

/// Writes the closure of a list of schema files as one descriptor set
pub struct DescriptorSetWriter<'r, R: ?Sized> {
    resolver: &'r mut R,
    options: ClosureOptions,
}

impl<'r, R: DescriptorResolver + ?Sized> DescriptorSetWriter<'r, R> {
    /// Create a writer that keeps JSON names and documentation
    pub fn new(resolver: &'r mut R) -> Self {
        Self {
            resolver,
            options: ClosureOptions::all(),
        }
    }

    /// Choose which annotations end up in the output
    #[must_use]
    pub fn with_options(mut self, options: ClosureOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve `names`, collect their closure and serialize it into `output`.
    ///
    /// Nothing is written unless every name resolves. Returns the number of
    /// bytes committed; `output` is resized to exactly that length.
    ///
    /// # Errors
    ///
    /// [`Error::Unresolved`] for the first name that fails to resolve (the
    /// resolver has reported why), or any buffer or serialization error.
    pub fn write<B: OutputBuffer + ?Sized>(
        &mut self,
        names: &[LogicalName],
        output: &mut B,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize> {
        let mut roots = Vec::with_capacity(names.len());
        for name in names {
            let id = self
                .resolver
                .resolve(name, diagnostics)
                .ok_or_else(|| Error::unresolved(name.as_str()))?;
            roots.push(id);
        }

        let files = collect_transitive(&*self.resolver, &roots, self.options);
        debug!(
            "Collected {} file(s) from {} requested input(s)",
            files.len(),
            roots.len()
        );

        let set = DescriptorSet::new(files);
        let length = encode_into(&set, output)?;
        info!("Wrote descriptor set of {} file(s), {} bytes", set.files.len(), length);
        Ok(length)
    }
}

/// Serialize `value` with postcard directly into `output`.
///
/// The encoded size is measured first, then the buffer is grown region by
/// region until it covers that size, postcard writes into the granted
/// memory, and the unused tail is given back. Returns the committed length;
/// `output` holds exactly the encoded bytes.
///
/// # Errors
///
/// The buffer error that stopped the write, or [`Error::Serialize`] for
/// any postcard failure.
pub fn encode_into<T, B>(value: &T, output: &mut B) -> Result<usize>
where
    T: Serialize + ?Sized,
    B: OutputBuffer + ?Sized,
{
    let size = postcard::serialize_with_flavor::<T, _, usize>(value, ByteCounter::default())
        .map_err(|e| Error::Serialize(e.to_string()))?;

    let mut bridge = BufferBridge::new(output);
    let granted = bridge.reserve(size)?;
    postcard::serialize_with_flavor::<T, _, _>(value, Slice::new(&mut granted[..size]))
        .map_err(|e| Error::Serialize(e.to_string()))?;

    let spare = bridge.byte_count() - size;
    if spare > 0 {
        bridge.back_up(spare)?;
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dset_schema::{DescriptorPool, SearchRoot, SourceTree};
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.yaml"), "package: base\n").unwrap();
        fs::write(
            dir.path().join("top.yaml"),
            "package: top\nimports: [base.yaml]\nmessages:\n  - name: Top\n    doc: Top level.\n    fields:\n      - { name: base_ref, number: 1, type: base.Base }\n",
        )
        .unwrap();
        dir
    }

    fn pool(dir: &TempDir) -> DescriptorPool {
        DescriptorPool::new(SourceTree::new(vec![SearchRoot::new(dir.path())]))
    }

    #[test]
    fn test_write_closure() {
        let dir = setup();
        let mut pool = pool(&dir);
        let mut diags = Diagnostics::new();
        let mut output = Vec::new();

        let names = [LogicalName::new("top.yaml").unwrap()];
        let length = DescriptorSetWriter::new(&mut pool)
            .write(&names, &mut output, &mut diags)
            .unwrap();
        assert_eq!(length, output.len());

        let set = DescriptorSet::decode(&output).unwrap();
        assert_eq!(set.file_names(), vec!["base.yaml", "top.yaml"]);
        let top = set.file("top.yaml").unwrap();
        assert_eq!(top.messages[0].fields[0].json_name.as_deref(), Some("baseRef"));
        assert!(top.source_code_info.as_ref().is_some_and(|i| !i.is_empty()));
    }

    #[test]
    fn test_options_strip_annotations() {
        let dir = setup();
        let mut pool = pool(&dir);
        let mut diags = Diagnostics::new();
        let mut output = Vec::new();

        let names = [LogicalName::new("top.yaml").unwrap()];
        DescriptorSetWriter::new(&mut pool)
            .with_options(ClosureOptions::default())
            .write(&names, &mut output, &mut diags)
            .unwrap();

        let set = DescriptorSet::decode(&output).unwrap();
        let top = set.file("top.yaml").unwrap();
        assert_eq!(top.messages[0].fields[0].json_name, None);
        assert_eq!(top.source_code_info, None);
    }

    #[test]
    fn test_unresolved_name_writes_nothing() {
        let dir = setup();
        let mut pool = pool(&dir);
        let mut diags = Diagnostics::new();
        let mut output = Vec::new();

        let names = [
            LogicalName::new("top.yaml").unwrap(),
            LogicalName::new("nope.yaml").unwrap(),
        ];
        let err = DescriptorSetWriter::new(&mut pool)
            .write(&names, &mut output, &mut diags)
            .unwrap_err();
        assert!(matches!(err, Error::Unresolved { ref name } if name == "nope.yaml"));
        assert!(output.is_empty());
        assert_eq!(diags.records()[0].to_string(), "nope.yaml: File not found.");
    }

    #[test]
    fn test_encode_into_matches_postcard() {
        let set = DescriptorSet::new(vec![dset_ir::FileDescriptor::new("a.yaml")]);
        let mut output = Vec::new();
        let length = encode_into(&set, &mut output).unwrap();
        assert_eq!(output, postcard::to_stdvec(&set).unwrap());
        assert_eq!(length, output.len());
    }
}
