//! Mapping requested input paths to logical names

use crate::resolver::DescriptorResolver;
use crate::source_tree::DiskMapping;
use crate::{Error, Result};
use dset_diagnostics::Diagnostics;
use dset_ir::LogicalName;
use std::path::Path;
use tracing::{debug, info};

/// Turns the paths a caller asked for into logical names.
///
/// Stops at the first input that cannot be mapped; everything reported up
/// to that point is in the diagnostics.
pub struct PathResolver<'r, R: ?Sized> {
    resolver: &'r R,
}

impl<'r, R: DescriptorResolver + ?Sized> PathResolver<'r, R> {
    pub fn new(resolver: &'r R) -> Self {
        Self { resolver }
    }

    /// Resolve every input in order
    ///
    /// # Errors
    ///
    /// Returns the mapping error of the first input that fails.
    pub fn resolve_inputs<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<LogicalName>> {
        let mut names = Vec::with_capacity(inputs.len());
        for input in inputs {
            names.push(self.resolve_input(input.as_ref(), diagnostics)?);
        }
        info!("Resolved {} input(s) to logical names", names.len());
        Ok(names)
    }

    /// Resolve one input path
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shadowed`], [`Error::CannotOpen`] or
    /// [`Error::NotInSearchPath`] after reporting it.
    pub fn resolve_input(&self, input: &Path, diagnostics: &mut Diagnostics) -> Result<LogicalName> {
        let display = input.display().to_string();

        match self.resolver.map_disk_path(input) {
            DiskMapping::Mapped(name) => Ok(name),
            DiskMapping::Shadowed { shadowing, .. } => {
                let shadowing = shadowing.display().to_string();
                diagnostics.add_error(
                    &display,
                    None,
                    format!(
                        "Input is shadowed by a search root in \"{shadowing}\". Either use the \
                         latter file as your input or reorder the search roots so that the \
                         former file's location comes first."
                    ),
                );
                Err(Error::Shadowed {
                    input: display,
                    shadowing,
                })
            }
            DiskMapping::CannotOpen { reason, .. } => match self.interpret_literally(input) {
                Some(name) => Ok(name),
                None => {
                    diagnostics.add_error(
                        &display,
                        None,
                        format!("Could not map to virtual file: {reason}"),
                    );
                    Err(Error::CannotOpen {
                        input: display,
                        reason,
                    })
                }
            },
            DiskMapping::NoMapping => match self.interpret_literally(input) {
                Some(name) => Ok(name),
                None => {
                    diagnostics.add_error(
                        &display,
                        None,
                        "File does not reside within any search path.",
                    );
                    Err(Error::NotInSearchPath { input: display })
                }
            },
        }
    }

    /// Treat the input as an already-logical name if some root holds it
    fn interpret_literally(&self, input: &Path) -> Option<LogicalName> {
        let name = LogicalName::new(input.to_str()?).ok()?;
        let disk = self.resolver.virtual_to_disk(&name)?;
        debug!("Interpreting {} as a logical name found at {:?}", name, disk);
        Some(name)
    }
}
