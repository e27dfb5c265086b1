//! Options for opening and saving catalogs, and the persisted settings they
//! are usually derived from.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{error::Error, language::Language};

/// Load behavior for [`crate::Catalog::open_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Language used when the file does not declare one.
    pub language_hint: Option<Language>,
    /// Clean up header values left over from templates.
    pub fix_common_issues: bool,
    /// Drop existing translations (used when starting from a template).
    pub ignore_translations: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            language_hint: None,
            fix_common_issues: true,
            ignore_translations: false,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language_hint(mut self, language_hint: Option<Language>) -> Self {
        self.language_hint = language_hint;
        self
    }

    pub fn with_fix_common_issues(mut self, fix: bool) -> Self {
        self.fix_common_issues = fix;
        self
    }

    pub fn with_ignore_translations(mut self, ignore: bool) -> Self {
        self.ignore_translations = ignore;
        self
    }
}

/// Line terminators used when saving text formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndings {
    /// Whatever the file used when it was read.
    #[default]
    Keep,
    Unix,
    Windows,
}

/// Line wrapping of regenerated PO entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wrapping {
    /// The width detected when the file was read.
    #[default]
    Keep,
    NoWrap,
    Width(usize),
}

/// Save behavior for [`crate::Catalog::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    pub line_endings: LineEndings,
    pub wrapping: Wrapping,
    /// Compile a `.mo` file next to a saved PO file.
    pub compile_binary: bool,
    /// Refresh `PO-Revision-Date` when the catalog has unsaved changes.
    pub update_revision_date: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            line_endings: LineEndings::Keep,
            wrapping: Wrapping::Keep,
            compile_binary: false,
            update_revision_date: true,
        }
    }
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_endings(mut self, line_endings: LineEndings) -> Self {
        self.line_endings = line_endings;
        self
    }

    pub fn with_wrapping(mut self, wrapping: Wrapping) -> Self {
        self.wrapping = wrapping;
        self
    }

    pub fn with_compile_binary(mut self, compile: bool) -> Self {
        self.compile_binary = compile;
        self
    }

    pub fn with_update_revision_date(mut self, update: bool) -> Self {
        self.update_revision_date = update;
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_wrap_width() -> usize {
    79
}

/// User preferences, typically stored as JSON.
///
/// ```rust
/// use transcat::options::{LineEndings, Settings, Wrapping};
///
/// let settings = Settings::from_json(r#"{ "keep_crlf": false, "crlf_format": true }"#).unwrap();
/// let save = settings.save_options();
/// assert_eq!(save.line_endings, LineEndings::Windows);
/// assert_eq!(save.wrapping, Wrapping::Width(79));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Keep the line endings of each file as found.
    #[serde(default = "default_true")]
    pub keep_crlf: bool,
    /// When not keeping line endings, write CRLF instead of LF.
    #[serde(default)]
    pub crlf_format: bool,
    #[serde(default = "default_true")]
    pub wrap_po_files: bool,
    #[serde(default = "default_wrap_width")]
    pub wrap_po_files_width: usize,
    #[serde(default = "default_true")]
    pub compile_mo: bool,
    #[serde(default = "default_true")]
    pub show_warnings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            keep_crlf: true,
            crlf_format: false,
            wrap_po_files: true,
            wrap_po_files_width: default_wrap_width(),
            compile_mo: true,
            show_warnings: true,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_options(&self) -> SaveOptions {
        let line_endings = match (self.keep_crlf, self.crlf_format) {
            (true, _) => LineEndings::Keep,
            (false, true) => LineEndings::Windows,
            (false, false) => LineEndings::Unix,
        };
        let wrapping = if self.wrap_po_files {
            Wrapping::Width(self.wrap_po_files_width)
        } else {
            Wrapping::NoWrap
        };
        SaveOptions {
            line_endings,
            wrapping,
            compile_binary: self.compile_mo,
            update_revision_date: true,
        }
    }
}
