#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # dset-schema
//!
//! Search-root mapping, schema document loading and descriptor pooling.
//!
//! Schema files live under an ordered list of search roots. The
//! [`SourceTree`] maps disk paths to logical names and back, the
//! [`PathResolver`] turns requested input paths into logical names, and the
//! [`DescriptorPool`] lazily loads each logical name into a
//! [`dset_ir::DescriptorNode`] through the [`SchemaLoader`].

pub mod loader;
pub mod path_resolver;
pub mod pool;
pub mod resolver;
pub mod source_tree;

pub use loader::{LoadedSchema, SchemaFormat, SchemaLoader};
pub use path_resolver::PathResolver;
pub use pool::DescriptorPool;
pub use resolver::DescriptorResolver;
pub use source_tree::{DiskMapping, SearchRoot, SourceTree};

use thiserror::Error;

/// Errors that can occur when mapping, loading or resolving schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("{input}: input is shadowed by \"{shadowing}\"")]
    Shadowed { input: String, shadowing: String },

    #[error("Could not map to virtual file: {input}: {reason}")]
    CannotOpen { input: String, reason: String },

    #[error("{input}: file does not reside within any search path")]
    NotInSearchPath { input: String },

    #[error("Invalid schema format in {file}: {message}")]
    InvalidFormat { file: String, message: String },

    #[error("Schema {file} failed validation with {errors} error(s)")]
    Validation { file: String, errors: usize },

    #[error("Invalid search root '{0}'")]
    InvalidSearchRoot(String),
}

impl Error {
    /// Build an invalid-format error with the offending file
    pub fn invalid_format(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            file: file.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
