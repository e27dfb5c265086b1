//! GNU MO compilation.
//!
//! Produces the little-endian binary catalog read by gettext's runtime,
//! without the optional hash table.

use crate::{formats::po::header::PoHeader, item::CatalogItem};

const MO_MAGIC_LE: u32 = 0x9504_12de;
const HEADER_SIZE: u32 = 28;

/// Outcome of the optional compilation step of a save, reported apart from
/// the save itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompilationStatus {
    #[default]
    NotDone,
    Success,
    Error(String),
}

impl CompilationStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, CompilationStatus::Error(_))
    }
}

fn message_key(item: &CatalogItem) -> String {
    let mut key = String::new();
    if let Some(context) = item.context() {
        key.push_str(context);
        key.push('\u{4}');
    }
    key.push_str(item.source());
    if let Some(plural) = item.plural_source() {
        key.push('\0');
        key.push_str(plural);
    }
    key
}

/// Compiles the translated, non-fuzzy items. Strings are stored as UTF-8 and
/// the header's charset is rewritten to match.
pub fn compile_mo(header: Option<&PoHeader>, items: &[CatalogItem]) -> Vec<u8> {
    let mut messages: Vec<(String, String)> = items
        .iter()
        .filter(|item| item.is_translated() && !item.is_fuzzy())
        .map(|item| (message_key(item), item.translations().join("\0")))
        .collect();
    if let Some(header) = header.filter(|h| !h.fields().is_empty()) {
        let mut header = header.clone();
        header.set_charset("UTF-8");
        messages.push((String::new(), header.to_msgstr()));
    }
    messages.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    messages.dedup_by(|a, b| a.0 == b.0);

    let count = messages.len() as u32;
    let orig_tab_offset = HEADER_SIZE;
    let trans_tab_offset = orig_tab_offset + count * 8;
    let strings_offset = trans_tab_offset + count * 8;

    let mut orig_descriptors = Vec::with_capacity(messages.len());
    let mut trans_descriptors = Vec::with_capacity(messages.len());
    let mut string_data: Vec<u8> = Vec::new();

    for (msgid, _) in &messages {
        orig_descriptors.push((msgid.len() as u32, strings_offset + string_data.len() as u32));
        string_data.extend_from_slice(msgid.as_bytes());
        string_data.push(0);
    }
    for (_, msgstr) in &messages {
        trans_descriptors.push((msgstr.len() as u32, strings_offset + string_data.len() as u32));
        string_data.extend_from_slice(msgstr.as_bytes());
        string_data.push(0);
    }

    let mut out = Vec::with_capacity(strings_offset as usize + string_data.len());
    for word in [
        MO_MAGIC_LE,
        0, // revision
        count,
        orig_tab_offset,
        trans_tab_offset,
        0, // hash table size
        strings_offset,
    ] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    for (len, offset) in orig_descriptors.iter().chain(&trans_descriptors) {
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
    }
    out.extend_from_slice(&string_data);
    out
}
