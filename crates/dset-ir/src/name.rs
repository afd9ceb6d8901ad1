//! Logical names for schema files

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Canonical name of a schema file, independent of the search root it was
/// found under.
///
/// A logical name is a `/`-separated relative path with no empty, `.` or
/// `..` segments. Two disk files that map to the same logical name are the
/// same schema file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalName(String);

impl LogicalName {
    /// Parse and validate a logical name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] when the name is empty, absolute, uses
    /// backslashes, or contains empty, `.` or `..` segments.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_name(name, "name is empty"));
        }
        if name.starts_with('/') {
            return Err(Error::invalid_name(name, "name must be relative"));
        }
        if name.contains('\\') {
            return Err(Error::invalid_name(name, "name must use '/' separators"));
        }
        if let Some(bad) = name
            .split('/')
            .find(|segment| segment.is_empty() || *segment == "." || *segment == "..")
        {
            let reason = format!("invalid segment '{bad}'");
            return Err(Error::invalid_name(name, reason));
        }
        Ok(Self(name))
    }

    /// Build a logical name from a relative path, joined under an optional
    /// virtual prefix.
    ///
    /// Returns `None` when the path is absolute, escapes upwards, is empty,
    /// or is not valid UTF-8.
    pub fn from_relative_path(prefix: &str, path: &Path) -> Option<Self> {
        let mut segments: Vec<&str> = Vec::new();
        if !prefix.is_empty() {
            segments.push(prefix);
        }
        let mut saw_file = false;
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    segments.push(part.to_str()?);
                    saw_file = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if !saw_file {
            return None;
        }
        Self::new(segments.join("/")).ok()
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strip a virtual prefix, returning the remainder relative to it.
    ///
    /// An empty prefix matches every name.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix.is_empty() {
            return Some(&self.0);
        }
        self.0
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
    }
}

impl fmt::Display for LogicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LogicalName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LogicalName {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<LogicalName> for String {
    fn from(name: LogicalName) -> Self {
        name.0
    }
}
