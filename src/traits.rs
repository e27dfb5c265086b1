use std::fmt::Debug;

use crate::{
    error::Error,
    formats::{Capability, FormatType, po::header::PoHeader},
    item::{CatalogItem, DeletedItem},
    language::Language,
    options::SaveOptions,
};

/// Format-specific half of a [`crate::Catalog`].
///
/// A backend owns the parsed document. The catalog owns the items and hands
/// them back on every write; items point into the document through their
/// [`crate::item::ItemHandle`].
pub trait Backend: Debug + Send {
    fn format(&self) -> FormatType;

    fn has_capability(&self, capability: Capability) -> bool;

    /// Translation language, if known.
    fn language(&self) -> Option<Language>;

    /// Language of the source strings, if declared by the file.
    fn source_language(&self) -> Option<Language>;

    fn set_language(&mut self, language: &Language);

    /// The gettext header, for formats that have one.
    fn header(&self) -> Option<&PoHeader> {
        None
    }

    /// Forgets every tracked obsolete entry.
    fn remove_deleted_items(&mut self) {}

    /// Writes every modified item into the document and serializes it.
    ///
    /// All fallible work happens before the document is touched: on error
    /// the backend and the items are left exactly as they were.
    /// `modified` tells whether the catalog has unsaved changes.
    fn write(
        &mut self,
        items: &mut [CatalogItem],
        options: &SaveOptions,
        modified: bool,
    ) -> Result<Vec<u8>, Error>;
}

/// Everything a format reader produces from one file.
#[derive(Debug)]
pub(crate) struct Loaded {
    pub backend: Box<dyn Backend>,
    pub items: Vec<CatalogItem>,
    pub deleted: Vec<DeletedItem>,
    /// Non-fatal problems found while reading.
    pub warnings: Vec<String>,
}
