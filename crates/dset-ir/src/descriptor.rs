//! Descriptor content records and the descriptor set container

use crate::metadata::SourceCodeInfo;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive content of one schema file.
///
/// This is the record that ends up in a [`DescriptorSet`]. Field order and
/// the use of `BTreeMap` for options are part of the encoding: the same
/// content always serializes to the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Logical name of the file
    pub name: String,
    /// Dotted package name
    pub package: Option<String>,
    /// Logical names of imported files, in declaration order
    pub dependencies: Vec<String>,
    pub messages: Vec<MessageDescriptor>,
    pub enums: Vec<EnumDescriptor>,
    pub services: Vec<ServiceDescriptor>,
    /// File-level options, ordered by key
    pub options: BTreeMap<String, String>,
    /// Documentation annotations, when requested
    pub source_code_info: Option<SourceCodeInfo>,
}

/// A message type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub messages: Vec<MessageDescriptor>,
    pub enums: Vec<EnumDescriptor>,
}

/// A message field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    /// Scalar type name or (possibly qualified) message/enum name
    pub type_name: String,
    pub label: FieldLabel,
    /// JSON field name, when requested
    pub json_name: Option<String>,
}

/// Cardinality of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLabel {
    #[default]
    Optional,
    Required,
    Repeated,
}

/// An enum type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub values: Vec<EnumValueDescriptor>,
}

/// One enum value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

/// A service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

/// A service method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
}

impl FileDescriptor {
    /// Create an empty descriptor for the given logical name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Remove every field's JSON name, recursively
    pub fn clear_json_names(&mut self) {
        for message in &mut self.messages {
            message.clear_json_names();
        }
    }
}

impl MessageDescriptor {
    fn clear_json_names(&mut self) {
        for field in &mut self.fields {
            field.json_name = None;
        }
        for nested in &mut self.messages {
            nested.clear_json_names();
        }
    }
}

/// Default JSON name of a field: underscores are dropped and the letter
/// following each one is upper-cased (`order_id` becomes `orderId`).
pub fn to_json_name(field_name: &str) -> String {
    let mut out = String::with_capacity(field_name.len());
    let mut capitalize_next = false;
    for c in field_name.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// The serialized artifact: every file of a closure, dependencies first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSet {
    pub files: Vec<FileDescriptor>,
}

impl DescriptorSet {
    /// Create a set from an ordered list of files
    pub fn new(files: Vec<FileDescriptor>) -> Self {
        Self { files }
    }

    /// Decode a set produced by the descriptor set writer
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the bytes are not a well-formed set.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Logical names of the contained files, in order
    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }

    /// Find a file by logical name
    pub fn file(&self, name: &str) -> Option<&FileDescriptor> {
        self.files.iter().find(|f| f.name == name)
    }
}
