//! The in-memory translation unit.

use std::{collections::BTreeMap, fmt::Display};

use crate::formats::xliff::{NodeId, markup::XliffStringMetadata};

/// Item identifier, unique within one loaded catalog (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u32);

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference from an item into the document its catalog owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemHandle {
    /// Index of the entry block in a PO document.
    Po(usize),
    /// `trans-unit` (XLIFF 1.x) or `segment` (XLIFF 2.0) element.
    Xml(NodeId),
    /// Created by an editing action and not yet written anywhere.
    Detached,
}

/// Translation status of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Untranslated,
    /// Translated but marked as needing review.
    Fuzzy,
    Translated,
}

/// One translatable unit.
///
/// Every setter marks the item as modified; the backend regenerates only
/// modified items on save.
#[derive(Debug)]
pub struct CatalogItem {
    id: ItemId,
    context: Option<String>,
    source: String,
    plural_source: Option<String>,
    translations: Vec<String>,
    fuzzy: bool,
    flags: Vec<String>,
    comment: String,
    extracted_comments: Vec<String>,
    references: Vec<String>,
    previous_source: Vec<String>,
    metadata: BTreeMap<String, String>,
    line: Option<usize>,
    modified: bool,
    handle: ItemHandle,
    xliff: Option<XliffStringMetadata>,
}

impl CatalogItem {
    /// Creates a singular item.
    pub fn new(source: impl Into<String>) -> Self {
        CatalogItem {
            id: ItemId(0),
            context: None,
            source: source.into(),
            plural_source: None,
            translations: vec![String::new()],
            fuzzy: false,
            flags: Vec::new(),
            comment: String::new(),
            extracted_comments: Vec::new(),
            references: Vec::new(),
            previous_source: Vec::new(),
            metadata: BTreeMap::new(),
            line: None,
            modified: false,
            handle: ItemHandle::Detached,
            xliff: None,
        }
    }

    /// Creates an item with a plural source string.
    pub fn new_plural(source: impl Into<String>, plural: impl Into<String>) -> Self {
        let mut item = Self::new(source);
        item.plural_source = Some(plural.into());
        item.translations = vec![String::new(), String::new()];
        item
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn plural_source(&self) -> Option<&str> {
        self.plural_source.as_deref()
    }

    pub fn has_plural(&self) -> bool {
        self.plural_source.is_some()
    }

    /// First (or only) translation.
    pub fn translation(&self) -> &str {
        self.translations.first().map_or("", String::as_str)
    }

    pub fn translations(&self) -> &[String] {
        &self.translations
    }

    /// Number of non-empty translation forms.
    pub fn filled_forms(&self) -> usize {
        self.translations.iter().filter(|t| !t.is_empty()).count()
    }

    /// True when at least one translation form is non-empty.
    pub fn is_translated(&self) -> bool {
        self.filled_forms() > 0
    }

    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    pub fn status(&self) -> EntryStatus {
        if !self.is_translated() {
            EntryStatus::Untranslated
        } else if self.fuzzy {
            EntryStatus::Fuzzy
        } else {
            EntryStatus::Translated
        }
    }

    /// Flags other than `fuzzy`, e.g. `c-format`, `no-wrap`.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        (flag == "fuzzy" && self.fuzzy) || self.flags.iter().any(|f| f == flag)
    }

    /// Translator's comment; may span several lines.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Comments for translators coming from the source code or tool.
    pub fn extracted_comments(&self) -> &[String] {
        &self.extracted_comments
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Previous source text (`#|` lines), kept as raw lines.
    pub fn previous_source(&self) -> &[String] {
        &self.previous_source
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Line in the file where the entry starts, if loaded from disk.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn handle(&self) -> ItemHandle {
        self.handle
    }

    pub fn xliff_metadata(&self) -> Option<&XliffStringMetadata> {
        self.xliff.as_ref()
    }

    pub fn set_translation(&mut self, text: impl Into<String>) {
        self.set_translation_form(0, text);
    }

    /// Sets the translation of plural form `index`, growing the form list
    /// as needed. Items without a plural only have form 0; other indices
    /// are ignored.
    pub fn set_translation_form(&mut self, index: usize, text: impl Into<String>) {
        if index > 0 && !self.has_plural() {
            return;
        }
        if self.translations.len() <= index {
            self.translations.resize(index + 1, String::new());
        }
        self.translations[index] = text.into();
        self.modified = true;
    }

    pub fn set_translations(&mut self, translations: Vec<String>) {
        self.translations = translations;
        self.modified = true;
    }

    /// Removes every translation form, keeping the form count.
    pub fn clear_translation(&mut self) {
        for t in &mut self.translations {
            t.clear();
        }
        self.fuzzy = false;
        self.modified = true;
    }

    pub fn set_fuzzy(&mut self, fuzzy: bool) {
        if self.fuzzy != fuzzy {
            self.fuzzy = fuzzy;
            self.modified = true;
        }
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
        self.modified = true;
    }

    pub fn add_flag(&mut self, flag: impl Into<String>) {
        let flag = flag.into();
        if flag == "fuzzy" {
            self.set_fuzzy(true);
        } else if !self.flags.contains(&flag) {
            self.flags.push(flag);
            self.modified = true;
        }
    }

    pub fn remove_flag(&mut self, flag: &str) {
        if flag == "fuzzy" {
            self.set_fuzzy(false);
        } else if let Some(pos) = self.flags.iter().position(|f| f == flag) {
            self.flags.remove(pos);
            self.modified = true;
        }
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub(crate) fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    pub(crate) fn set_handle(&mut self, handle: ItemHandle) {
        self.handle = handle;
    }

    pub(crate) fn set_line(&mut self, line: Option<usize>) {
        self.line = line;
    }

    pub(crate) fn set_xliff_metadata(&mut self, metadata: XliffStringMetadata) {
        self.xliff = Some(metadata);
    }

    pub(crate) fn clear_modified(&mut self) {
        self.modified = false;
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Fills the parsed fields without touching the modification flag.
    pub(crate) fn load(&mut self) -> ItemLoader<'_> {
        ItemLoader { item: self }
    }
}

/// Write access to an item's parsed fields for format readers.
pub(crate) struct ItemLoader<'a> {
    item: &'a mut CatalogItem,
}

impl ItemLoader<'_> {
    pub fn context(self, context: Option<String>) -> Self {
        self.item.context = context;
        self
    }

    pub fn translations(self, translations: Vec<String>) -> Self {
        self.item.translations = translations;
        self
    }

    pub fn fuzzy(self, fuzzy: bool) -> Self {
        self.item.fuzzy = fuzzy;
        self
    }

    pub fn flags(self, flags: Vec<String>) -> Self {
        self.item.flags = flags;
        self
    }

    pub fn comment(self, comment: String) -> Self {
        self.item.comment = comment;
        self
    }

    pub fn extracted_comments(self, comments: Vec<String>) -> Self {
        self.item.extracted_comments = comments;
        self
    }

    pub fn references(self, references: Vec<String>) -> Self {
        self.item.references = references;
        self
    }

    pub fn previous_source(self, lines: Vec<String>) -> Self {
        self.item.previous_source = lines;
        self
    }
}

/// An obsolete (`#~`) entry kept by formats that track deleted items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedItem {
    /// The obsolete lines with the `#~` marker, without line terminators.
    pub lines: Vec<String>,
    pub comment: String,
    pub flags: Vec<String>,
    pub references: Vec<String>,
    pub extracted_comments: Vec<String>,
    pub line: usize,
}
