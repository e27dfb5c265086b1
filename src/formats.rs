//! Supported catalog formats.
//!
//! Each format is read and written by its own [`crate::traits::Backend`]
//! implementation. The format is picked from the file extension when a file
//! is opened; XLIFF files are further dispatched on their declared version.

pub mod po;
pub mod xliff;

use std::{
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

use crate::Error;

/// Represents all supported catalog formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// Gettext `.po` translation file.
    Po,
    /// Gettext `.pot` template.
    Pot,
    /// XLIFF 1.x; `subversion` is the minor version (0, 1 or 2).
    Xliff1 { subversion: u8 },
    /// XLIFF 2.0.
    Xliff2,
}

/// Implements [`std::fmt::Display`] for [`FormatType`].
///
/// # Example
/// ```rust
/// use transcat::formats::FormatType;
/// assert_eq!(FormatType::Po.to_string(), "po");
/// assert_eq!(FormatType::Xliff1 { subversion: 2 }.to_string(), "xliff-1.2");
/// assert_eq!(FormatType::Xliff2.to_string(), "xliff-2.0");
/// ```
impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::Po => write!(f, "po"),
            FormatType::Pot => write!(f, "pot"),
            FormatType::Xliff1 { subversion } => write!(f, "xliff-1.{subversion}"),
            FormatType::Xliff2 => write!(f, "xliff-2.0"),
        }
    }
}

/// Implements [`std::str::FromStr`] for [`FormatType`].
///
/// Accepts (case-insensitively) `po`, `pot`, `xliff-1.0`, `xliff-1.1`,
/// `xliff-1.2` (also `xliff1`), and `xliff-2.0` (also `xliff2`).
///
/// # Example
/// ```rust
/// use transcat::formats::FormatType;
/// use std::str::FromStr;
/// assert_eq!(FormatType::from_str("PO").unwrap(), FormatType::Po);
/// assert_eq!(FormatType::from_str("xliff1").unwrap(), FormatType::Xliff1 { subversion: 2 });
/// assert!(FormatType::from_str("strings").is_err());
/// ```
impl FromStr for FormatType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "po" => Ok(FormatType::Po),
            "pot" => Ok(FormatType::Pot),
            "xliff-1.0" | "xliff1.0" => Ok(FormatType::Xliff1 { subversion: 0 }),
            "xliff-1.1" | "xliff1.1" => Ok(FormatType::Xliff1 { subversion: 1 }),
            "xliff-1.2" | "xliff1.2" | "xliff1" => Ok(FormatType::Xliff1 { subversion: 2 }),
            "xliff-2.0" | "xliff2.0" | "xliff2" => Ok(FormatType::Xliff2),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl FormatType {
    /// Returns the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Po => "po",
            FormatType::Pot => "pot",
            FormatType::Xliff1 { .. } | FormatType::Xliff2 => "xliff",
        }
    }

    pub fn is_xliff(&self) -> bool {
        matches!(self, FormatType::Xliff1 { .. } | FormatType::Xliff2)
    }
}

/// Optional features a format may or may not be able to store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The file carries translations (false for templates).
    Translations,
    /// The target language can be changed and saved.
    LanguageSetting,
    /// Free-form translator comments.
    UserComments,
    /// Per-item "needs review" flag.
    FuzzyTranslations,
    /// Obsolete entries are kept and can be listed or purged.
    DeletedItemsTracking,
    /// Items can be added and removed.
    ItemEditing,
    /// A compiled binary (`.mo`) can be produced on save.
    CompiledBinary,
    /// Plural translations with language dependent form counts.
    PluralForms,
}

/// Format family chosen from a file name before its content is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileFamily {
    Po,
    Pot,
    Xliff,
}

pub(crate) fn detect_family<P: AsRef<Path>>(path: P) -> Option<FileFamily> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "po" => Some(FileFamily::Po),
        "pot" => Some(FileFamily::Pot),
        "xlf" | "xliff" => Some(FileFamily::Xliff),
        _ => None,
    }
}

/// Cheap pre-check: true if some format handles files with this extension.
///
/// # Example
/// ```rust
/// use transcat::formats::can_load_file;
/// assert!(can_load_file("locale/de.po"));
/// assert!(can_load_file("Localizable.XLIFF"));
/// assert!(!can_load_file("strings.xml"));
/// ```
pub fn can_load_file<P: AsRef<Path>>(path: P) -> bool {
    detect_family(path).is_some()
}
