#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # dset-writer
//!
//! Turns requested schema files into one serialized descriptor set.
//!
//! The [`DescriptorSetWriter`] resolves the requested names, gathers their
//! transitive closure in dependency order with [`collect_transitive`], and
//! encodes the result with postcard straight into caller-owned memory
//! through a [`BufferBridge`]. [`compile`] wires the whole batch together
//! for one invocation.

pub mod buffer;
pub mod closure;
pub mod pipeline;
pub mod writer;

pub use buffer::{BufferBridge, OutputBuffer};
pub use closure::{ClosureOptions, collect_transitive};
pub use pipeline::{CompileRequest, Status, compile};
pub use writer::{DescriptorSetWriter, encode_into};

use thiserror::Error;

/// Errors that can occur while writing a descriptor set
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to resolve {name}")]
    Unresolved { name: String },

    #[error("Output buffer refused to resize to {requested} bytes")]
    Resize { requested: usize },

    #[error("Output buffer granted {granted} bytes, {requested} requested")]
    ShortRegion { requested: usize, granted: usize },

    #[error("Cannot back up {count} bytes, only {length} granted")]
    BackUp { count: usize, length: usize },

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl Error {
    /// Build an unresolved-name error
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::Unresolved { name: name.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
