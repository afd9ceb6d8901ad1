#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # dset-ir
//!
//! Descriptor model shared by every stage of the descriptor-set compiler.
//!
//! A schema file is identified by its [`LogicalName`], parsed into a
//! [`DescriptorNode`] owned by a pool, and flattened into [`FileDescriptor`]
//! content records that are serialized together as a [`DescriptorSet`].

/// File descriptor content records and the serialized set container.
pub mod descriptor;
/// Source-location annotations attached to descriptors.
pub mod metadata;
/// Canonical, search-root independent schema file names.
pub mod name;
/// Pool-owned descriptor nodes and the read-only graph view over them.
pub mod node;

pub use descriptor::{
    DescriptorSet, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, FieldLabel,
    FileDescriptor, MessageDescriptor, MethodDescriptor, ServiceDescriptor,
};
pub use metadata::{Location, SourceCodeInfo};
pub use name::LogicalName;
pub use node::{DescriptorGraph, DescriptorNode, NodeId};

use thiserror::Error;

/// Errors that can occur when working with the descriptor model
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid logical name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Descriptor set decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Build an invalid-name error with the rejected input and reason.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for descriptor model operations.
pub type Result<T> = std::result::Result<T, Error>;
