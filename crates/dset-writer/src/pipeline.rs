//! One-shot compilation of schema files into a descriptor set
//!
//! [`compile`] builds the source tree, pool, path resolver and writer for a
//! single request and drops them when it returns. Everything that went
//! wrong is in the diagnostics; the returned [`Status`] only says whether
//! the output is usable.

use crate::buffer::OutputBuffer;
use crate::writer::DescriptorSetWriter;
use dset_diagnostics::Diagnostics;
use dset_schema::{DescriptorPool, PathResolver, SearchRoot, SourceTree};
use std::path::PathBuf;
use tracing::{error, info};

/// What to compile
#[derive(Debug, Clone, Default)]
pub struct CompileRequest {
    /// Search roots, highest priority first
    pub search_roots: Vec<SearchRoot>,
    /// Input files as given by the caller
    pub inputs: Vec<PathBuf>,
}

impl CompileRequest {
    pub fn new(search_roots: Vec<SearchRoot>, inputs: Vec<PathBuf>) -> Self {
        Self {
            search_roots,
            inputs,
        }
    }
}

/// Outcome of [`compile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    /// Process exit code: 0 on success, 1 on failure
    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

/// Compile the closure of `request.inputs` into `output`.
///
/// On failure `output` has not been written to unless the failure came
/// from the buffer itself, in which case its contents are unspecified.
pub fn compile<B: OutputBuffer + ?Sized>(
    request: &CompileRequest,
    output: &mut B,
    diagnostics: &mut Diagnostics,
) -> Status {
    info!(
        "Compiling {} input(s) against {} search root(s)",
        request.inputs.len(),
        request.search_roots.len()
    );

    let mut pool = DescriptorPool::new(SourceTree::new(request.search_roots.clone()));

    let names = match PathResolver::new(&pool).resolve_inputs(&request.inputs, diagnostics) {
        Ok(names) => names,
        Err(e) => {
            info!("Input mapping failed: {}", e);
            return Status::Failure;
        }
    };

    match DescriptorSetWriter::new(&mut pool).write(&names, output, diagnostics) {
        Ok(_) => Status::Success,
        Err(e) => {
            error!("Failed to write descriptor set: {}", e);
            Status::Failure
        }
    }
}
