//! All error types for the transcat crate.
//!
//! Load failures are [`Error::Read`], save failures are [`Error::Write`] or
//! [`Error::BrokenMarkup`]. Validation problems are never errors; they are
//! returned as [`crate::validation::ValidationResults`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("error loading file “{file}”: {reason}")]
    Read { file: String, reason: String },

    #[error("couldn’t save file “{file}”: {reason}")]
    Write { file: String, reason: String },

    #[error("broken markup in translation of item {item}: {reason}")]
    BrokenMarkup { item: u32, reason: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("{format} catalogs do not support {operation}")]
    Unsupported {
        format: String,
        operation: &'static str,
    },

    #[error("invalid plural forms: {0}")]
    InvalidPluralForms(String),

    #[error("external tool error: {0}")]
    ExternalTool(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("remote service error: {0}")]
    Remote(String),
}

impl Error {
    /// Creates a read error for the given file.
    pub fn read(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Read {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Creates a write error for the given file.
    pub fn write(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Write {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// True for failures of an open/parse operation.
    pub fn is_read_error(&self) -> bool {
        matches!(self, Error::Read { .. })
    }

    /// True for failures of a save operation.
    pub fn is_write_error(&self) -> bool {
        matches!(self, Error::Write { .. } | Error::BrokenMarkup { .. })
    }

    /// Wraps any error raised while loading `file` into [`Error::Read`].
    pub(crate) fn into_read(self, file: &str) -> Self {
        match self {
            Error::Read { .. } => self,
            other => Error::read(file, other.to_string()),
        }
    }

    /// Wraps I/O-ish errors raised while saving `file` into [`Error::Write`].
    pub(crate) fn into_write(self, file: &str) -> Self {
        match self {
            Error::Write { .. } | Error::BrokenMarkup { .. } => self,
            other => Error::write(file, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_read_error_display() {
        let error = Error::read("de.po", "unsupported XLIFF version (3.0)");
        assert_eq!(
            error.to_string(),
            "error loading file “de.po”: unsupported XLIFF version (3.0)"
        );
        assert!(error.is_read_error());
        assert!(!error.is_write_error());
    }

    #[test]
    fn test_write_error_classification() {
        assert!(Error::write("x.xlf", "read-only").is_write_error());
        let broken = Error::BrokenMarkup {
            item: 3,
            reason: "unclosed <g>".to_string(),
        };
        assert!(broken.is_write_error());
        assert!(broken.to_string().contains("item 3"));
    }

    #[test]
    fn test_into_read_wraps_io() {
        let error = Error::Io(io::Error::new(io::ErrorKind::NotFound, "No such file"));
        let wrapped = error.into_read("missing.po");
        assert!(wrapped.is_read_error());
        assert!(wrapped.to_string().contains("missing.po"));
        assert!(wrapped.to_string().contains("No such file"));
    }

    #[test]
    fn test_into_write_keeps_broken_markup() {
        let broken = Error::BrokenMarkup {
            item: 1,
            reason: "x".to_string(),
        };
        assert!(matches!(
            broken.into_write("a.xlf"),
            Error::BrokenMarkup { item: 1, .. }
        ));
    }

    #[test]
    fn test_unsupported_display() {
        let error = Error::Unsupported {
            format: "XLIFF 2.0".to_string(),
            operation: "adding items",
        };
        assert_eq!(
            error.to_string(),
            "XLIFF 2.0 catalogs do not support adding items"
        );
    }
}
