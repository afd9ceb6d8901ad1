//! Source-location annotations for descriptors
//!
//! Locations are addressed by a path of descriptor field numbers and element
//! indices, using the same numbering as `google.protobuf.FileDescriptorProto`
//! so that downstream tooling can reuse its path conventions.
#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};

/// `FileDescriptor.messages`
pub const FILE_MESSAGE: i32 = 4;
/// `FileDescriptor.enums`
pub const FILE_ENUM: i32 = 5;
/// `FileDescriptor.services`
pub const FILE_SERVICE: i32 = 6;
/// `MessageDescriptor.fields`
pub const MESSAGE_FIELD: i32 = 2;
/// `MessageDescriptor.messages`
pub const MESSAGE_NESTED: i32 = 3;
/// `MessageDescriptor.enums`
pub const MESSAGE_ENUM: i32 = 4;
/// `EnumDescriptor.values`
pub const ENUM_VALUE: i32 = 2;
/// `ServiceDescriptor.methods`
pub const SERVICE_METHOD: i32 = 2;

/// Source information for every documented element of a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCodeInfo {
    /// Locations in declaration order
    pub locations: Vec<Location>,
}

/// One annotated element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Field-number/index path from the file root to the element
    pub path: Vec<i32>,

    /// Comment attached before the element
    pub leading_comments: Option<String>,

    /// Comment attached after the element
    pub trailing_comments: Option<String>,
}

impl SourceCodeInfo {
    /// Create an empty annotation set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no element carries annotations
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Find the location recorded for an exact path
    pub fn find(&self, path: &[i32]) -> Option<&Location> {
        self.locations.iter().find(|l| l.path == path)
    }
}

impl Location {
    /// Create a location with a leading comment
    pub fn with_leading(path: Vec<i32>, comment: impl Into<String>) -> Self {
        Self {
            path,
            leading_comments: Some(comment.into()),
            trailing_comments: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_location_by_path() {
        let info = SourceCodeInfo {
            locations: vec![
                Location::with_leading(vec![FILE_MESSAGE, 0], "An order."),
                Location::with_leading(vec![FILE_MESSAGE, 0, MESSAGE_FIELD, 1], "The id."),
            ],
        };

        assert!(!info.is_empty());
        let field = info.find(&[FILE_MESSAGE, 0, MESSAGE_FIELD, 1]).unwrap();
        assert_eq!(field.leading_comments.as_deref(), Some("The id."));
        assert!(info.find(&[FILE_ENUM, 0]).is_none());
    }
}
