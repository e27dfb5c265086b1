#![forbid(unsafe_code)]
//! Translation catalog engine for Rust.
//!
//! Reads, validates, edits and writes gettext PO/POT files and XLIFF 1.x/2.0
//! documents. Saving an unedited catalog reproduces the original file; edits
//! touch only the entries that changed.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use transcat::{Catalog, ItemId, SaveOptions};
//!
//! let mut catalog = Catalog::open("locale/de.po")?;
//! if let Some(item) = catalog.item_mut(ItemId(1)) {
//!     item.set_translation("Hallo Welt");
//! }
//! for diagnostic in catalog.validate(false).iter() {
//!     eprintln!("{diagnostic}");
//! }
//! catalog.save("locale/de.po", &SaveOptions::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Supported Formats
//!
//! - **Gettext `.po` / `.pot`**: entries, plurals, contexts, comments, flags
//!   and obsolete entries; compiled to `.mo` on request
//! - **XLIFF 1.0 / 1.1 / 1.2**: `trans-unit` based documents, including Xcode
//!   exports
//! - **XLIFF 2.0**: `unit` / `segment` based documents
//!
//! Inline XLIFF markup is shown to translators as placeholders and restored
//! verbatim on save.

pub mod catalog;
pub mod error;
pub mod formats;
pub mod item;
pub mod language;
pub mod mo;
pub mod options;
pub mod placeholder;
pub mod plural_forms;
pub mod remote;
pub mod tools;
pub mod traits;
pub mod validation;

// Re-export most used types for easy consumption
pub use crate::{
    catalog::{Catalog, SaveOutcome, SortOrder, Statistics},
    error::Error,
    formats::{Capability, FormatType, can_load_file},
    item::{CatalogItem, DeletedItem, EntryStatus, ItemId},
    language::Language,
    mo::CompilationStatus,
    options::{LineEndings, OpenOptions, SaveOptions, Settings, Wrapping},
    validation::{Diagnostic, DiagnosticKind, Severity, ValidationResults},
};
