//! Gettext PO and POT catalogs.
//!
//! The document is kept as the raw text of every entry block. Unedited
//! entries are written back from that text, edited and new ones are
//! regenerated in gettext layout, so saving an untouched file reproduces it
//! byte for byte.

pub mod header;
mod parser;
mod writer;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::{
    error::Error,
    formats::{Capability, FormatType},
    item::{CatalogItem, DeletedItem, ItemHandle},
    language::Language,
    options::{LineEndings, OpenOptions, SaveOptions, Wrapping},
    plural_forms::default_plural_forms,
    traits::{Backend, Loaded},
};

use self::{
    header::PoHeader,
    parser::{DEFAULT_WRAP_WIDTH, ParsedEntry},
    writer::Layout,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

lazy_static! {
    static ref CHARSET_DECL: Regex =
        Regex::new(r#"Content-Type:[^"\n]*charset=([^\s"\\;]+)"#).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PoKind {
    Po,
    Pot,
}

/// Raw text of one entry: blank lines and loose comments before it, then
/// the entry itself.
#[derive(Debug, Clone, Default)]
struct Block {
    leading: String,
    body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtraKind {
    Header,
    Obsolete,
    /// A second `msgid ""` entry; kept as text, never interpreted.
    DuplicateHeader,
}

/// A block that is not an item, written after the item block it followed
/// in the file (`None`: before the first item).
#[derive(Debug, Clone)]
struct Extra {
    after: Option<usize>,
    kind: ExtraKind,
    block: Block,
}

#[derive(Debug)]
pub(crate) struct PoBackend {
    kind: PoKind,
    bom: bool,
    encoding: &'static Encoding,
    crlf: bool,
    wrap: Option<usize>,
    header: PoHeader,
    /// Comment lines of the header entry, reused when it is regenerated.
    header_comments: Vec<String>,
    header_dirty: bool,
    /// Item blocks, addressed by [`ItemHandle::Po`].
    blocks: Vec<Block>,
    extras: Vec<Extra>,
    trailer: String,
    language: Option<Language>,
}

/// Current time in the format of `PO-Revision-Date`.
pub(crate) fn revision_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M%z").to_string()
}

fn detect_encoding(body: &[u8], bom: bool, warnings: &mut Vec<String>) -> &'static Encoding {
    if bom {
        return UTF_8;
    }
    // Every charset gettext supports is ASCII compatible, so the header can
    // be located in a single-byte decoding.
    let (latin, _) = WINDOWS_1252.decode_without_bom_handling(body);
    let Some(caps) = CHARSET_DECL.captures(&latin) else {
        return UTF_8;
    };
    let label = &caps[1];
    if label == "CHARSET" {
        return WINDOWS_1252;
    }
    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) => encoding,
        None => {
            let message = format!("unknown charset “{label}”, reading the file as UTF-8");
            warn!(charset = label, "unknown charset declared in PO header");
            warnings.push(message);
            UTF_8
        }
    }
}

fn header_comment_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(|l| l.trim_end_matches('\r'))
        .take_while(|l| l.trim_start().starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn item_from_entry(entry: ParsedEntry, index: usize, ignore_translations: bool) -> CatalogItem {
    let mut item = match entry.msgid_plural {
        Some(plural) => CatalogItem::new_plural(entry.msgid, plural),
        None => CatalogItem::new(entry.msgid),
    };
    let fuzzy = entry.flags.iter().any(|f| f == "fuzzy");
    let flags = entry.flags.into_iter().filter(|f| f != "fuzzy").collect();
    // Items whose translations were dropped are regenerated on save
    let dropped = ignore_translations && (fuzzy || entry.msgstr.iter().any(|s| !s.is_empty()));
    let translations = if ignore_translations {
        vec![String::new(); entry.msgstr.len().max(1)]
    } else {
        entry.msgstr
    };

    item.load()
        .context(entry.msgctxt)
        .translations(translations)
        .fuzzy(fuzzy && !ignore_translations)
        .flags(flags)
        .comment(entry.comment.join("\n"))
        .extracted_comments(entry.extracted)
        .references(entry.references)
        .previous_source(entry.previous);
    item.set_line(Some(entry.line));
    item.set_handle(ItemHandle::Po(index));
    if dropped {
        item.mark_modified();
    }
    item
}

/// Reads a PO or POT file.
pub(crate) fn load(
    bytes: &[u8],
    file_name: &str,
    kind: PoKind,
    options: &OpenOptions,
) -> Result<Loaded, Error> {
    let (bom, body) = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => (true, rest),
        None => (false, bytes),
    };

    let mut warnings = Vec::new();
    let encoding = detect_encoding(body, bom, &mut warnings);
    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        warn!(file = file_name, charset = encoding.name(), "undecodable bytes in PO file");
        warnings.push(format!(
            "the file is not valid {}; undecodable characters were replaced",
            encoding.name()
        ));
    }

    let parsed = parser::parse(&text).map_err(|reason| Error::read(file_name, reason))?;
    if parsed.entries.is_empty() {
        return Err(Error::read(file_name, "the file contains no entries"));
    }
    debug!(
        file = file_name,
        charset = encoding.name(),
        wrap = ?parsed.wrap_width,
        crlf = parsed.crlf,
        "parsed PO file"
    );

    let mut backend = PoBackend {
        kind,
        bom,
        encoding,
        crlf: parsed.crlf,
        wrap: parsed.wrap_width,
        header: PoHeader::default(),
        header_comments: Vec::new(),
        header_dirty: false,
        blocks: Vec::new(),
        extras: Vec::new(),
        trailer: parsed.trailer,
        language: None,
    };
    let mut items = Vec::new();
    let mut deleted = Vec::new();
    let mut seen_header = false;

    for entry in parsed.entries {
        let after = backend.blocks.len().checked_sub(1);
        let block = Block {
            leading: entry.leading.clone(),
            body: entry.body.clone(),
        };

        if entry.obsolete {
            deleted.push(DeletedItem {
                lines: entry.lines,
                comment: entry.comment.join("\n"),
                flags: entry.flags,
                references: entry.references,
                extracted_comments: entry.extracted,
                line: entry.line,
            });
            backend.extras.push(Extra {
                after,
                kind: ExtraKind::Obsolete,
                block,
            });
            continue;
        }

        if entry.is_header() {
            let kind = if seen_header {
                debug!(file = file_name, line = entry.line, "ignoring duplicate header");
                ExtraKind::DuplicateHeader
            } else {
                seen_header = true;
                backend.header = PoHeader::parse(entry.msgstr.first().map_or("", String::as_str));
                backend.header_comments = header_comment_lines(&entry.body);
                ExtraKind::Header
            };
            backend.extras.push(Extra { after, kind, block });
            continue;
        }

        let index = backend.blocks.len();
        backend.blocks.push(block);
        items.push(item_from_entry(entry, index, options.ignore_translations));
    }

    if !seen_header {
        backend.extras.insert(
            0,
            Extra {
                after: None,
                kind: ExtraKind::Header,
                block: Block::default(),
            },
        );
    }

    backend.language = match kind {
        PoKind::Pot => None,
        PoKind::Po => backend
            .header
            .language()
            .or_else(|| options.language_hint.clone())
            .or_else(|| Language::try_guess_from_filename(file_name)),
    };

    if options.fix_common_issues && kind == PoKind::Po {
        let has_plurals = items.iter().any(CatalogItem::has_plural);
        if backend
            .header
            .fix_common_issues(backend.language.as_ref(), has_plurals)
        {
            debug!(file = file_name, "fixed common header issues");
            backend.header_dirty = true;
        }
    }

    Ok(Loaded {
        backend: Box::new(backend),
        items,
        deleted,
        warnings,
    })
}

/// An empty catalog with a standard header.
pub(crate) fn new_catalog(language: Option<&Language>) -> PoBackend {
    PoBackend {
        kind: PoKind::Po,
        bom: false,
        encoding: UTF_8,
        crlf: false,
        wrap: Some(DEFAULT_WRAP_WIDTH),
        header: PoHeader::standard(language, &revision_timestamp()),
        header_comments: Vec::new(),
        header_dirty: true,
        blocks: Vec::new(),
        extras: vec![Extra {
            after: None,
            kind: ExtraKind::Header,
            block: Block::default(),
        }],
        trailer: String::new(),
        language: language.cloned(),
    }
}

fn encode(text: &str, encoding: &'static Encoding) -> Option<Vec<u8>> {
    if encoding == UTF_8 {
        return Some(text.as_bytes().to_vec());
    }
    let (bytes, _, unmappable) = encoding.encode(text);
    (!unmappable).then(|| bytes.into_owned())
}

fn convert_eol(text: &str, eol: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    if eol == "\n" {
        unix
    } else {
        unix.replace('\n', eol)
    }
}

fn ends_with_blank_line(text: &str) -> bool {
    text.ends_with("\n\n") || text.ends_with("\n\r\n")
}

/// Output of one serialization pass, kept so that the backend can adopt it
/// once the bytes are known to be writable.
struct Rendered {
    text: String,
    /// Regenerated body per item, `None` for items written from raw text.
    bodies: Vec<Option<String>>,
    header_body: Option<String>,
}

struct Renderer<'a> {
    backend: &'a PoBackend,
    header: &'a PoHeader,
    header_dirty: bool,
    layout: Layout,
    out: String,
    emitted: Vec<bool>,
    header_body: Option<String>,
}

impl Renderer<'_> {
    /// Ensures the next block starts on a fresh line.
    fn break_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push_str(self.layout.eol);
        }
    }

    fn push_block(&mut self, leading: &str, body: &str) {
        self.break_line();
        self.out.push_str(leading);
        self.out.push_str(body);
    }

    fn emit_extras_after(&mut self, after: Option<usize>) {
        for index in 0..self.backend.extras.len() {
            if !self.emitted[index] && self.backend.extras[index].after == after {
                self.emit_extra(index);
            }
        }
    }

    fn emit_extra(&mut self, index: usize) {
        self.emitted[index] = true;
        let backend = self.backend;
        let extra = &backend.extras[index];
        let regenerate = extra.kind == ExtraKind::Header
            && (self.header_dirty || extra.block.body.is_empty());
        if !regenerate {
            self.push_block(&extra.block.leading, &extra.block.body);
            return;
        }
        if self.header.fields().is_empty() {
            self.push_block(&extra.block.leading, &extra.block.body);
            return;
        }

        let mut body = writer::format_header(
            &backend.header_comments,
            &self.header.to_msgstr(),
            self.layout,
        );
        if extra.block.body.is_empty() {
            body.push_str(self.layout.eol);
        }
        self.push_block(&extra.block.leading, &body);
        self.header_body = Some(body);
    }

    fn render(mut self, items: &[CatalogItem]) -> Rendered {
        let backend = self.backend;
        let mut bodies = Vec::with_capacity(items.len());
        self.emit_extras_after(None);

        for item in items {
            match item.handle() {
                ItemHandle::Po(index) => {
                    let block = &backend.blocks[index];
                    if item.is_modified() {
                        let body = writer::format_item(item, self.layout);
                        self.push_block(&block.leading, &body);
                        bodies.push(Some(body));
                    } else {
                        self.push_block(&block.leading, &block.body);
                        bodies.push(None);
                    }
                    self.emit_extras_after(Some(index));
                }
                ItemHandle::Detached | ItemHandle::Xml(_) => {
                    self.break_line();
                    if !self.out.is_empty() && !ends_with_blank_line(&self.out) {
                        self.out.push_str(self.layout.eol);
                    }
                    let body = writer::format_item(item, self.layout);
                    self.out.push_str(&body);
                    bodies.push(Some(body));
                }
            }
        }

        // Obsolete entries that followed a removed item
        for index in 0..self.backend.extras.len() {
            if !self.emitted[index] {
                self.emit_extra(index);
            }
        }
        if !self.backend.trailer.is_empty() {
            self.break_line();
            self.out.push_str(&self.backend.trailer);
        }

        let mut text = self.out;
        if self.layout.eol != self.backend.eol() {
            text = convert_eol(&text, self.layout.eol);
        }
        Rendered {
            text,
            bodies,
            header_body: self.header_body,
        }
    }
}

impl PoBackend {
    fn eol(&self) -> &'static str {
        if self.crlf { "\r\n" } else { "\n" }
    }

    fn layout(&self, options: &SaveOptions) -> Layout {
        let eol = match options.line_endings {
            LineEndings::Keep => self.eol(),
            LineEndings::Unix => "\n",
            LineEndings::Windows => "\r\n",
        };
        let wrap = match options.wrapping {
            Wrapping::Keep => self.wrap,
            Wrapping::NoWrap | Wrapping::Width(0) => None,
            Wrapping::Width(width) => Some(width),
        };
        Layout { wrap, eol }
    }

    fn render(
        &self,
        items: &[CatalogItem],
        header: &PoHeader,
        header_dirty: bool,
        layout: Layout,
    ) -> Rendered {
        Renderer {
            backend: self,
            header,
            header_dirty,
            layout,
            out: String::new(),
            emitted: vec![false; self.extras.len()],
            header_body: None,
        }
        .render(items)
    }

    /// Adopts a successful serialization as the new raw state.
    fn commit(
        &mut self,
        items: &mut [CatalogItem],
        rendered: Rendered,
        header: PoHeader,
        encoding: &'static Encoding,
        layout: Layout,
    ) {
        for (item, body) in items.iter_mut().zip(rendered.bodies) {
            let Some(body) = body else { continue };
            match item.handle() {
                ItemHandle::Po(index) => self.blocks[index].body = body,
                ItemHandle::Detached | ItemHandle::Xml(_) => {
                    item.set_handle(ItemHandle::Po(self.blocks.len()));
                    self.blocks.push(Block {
                        leading: layout.eol.to_string(),
                        body,
                    });
                }
            }
        }
        if let Some(body) = rendered.header_body {
            if let Some(extra) = self.extras.iter_mut().find(|e| e.kind == ExtraKind::Header) {
                extra.block.body = body;
            }
        }

        if layout.eol != self.eol() {
            let eol = layout.eol;
            let blocks = self
                .blocks
                .iter_mut()
                .chain(self.extras.iter_mut().map(|e| &mut e.block));
            for block in blocks {
                block.leading = convert_eol(&block.leading, eol);
                block.body = convert_eol(&block.body, eol);
            }
            self.trailer = convert_eol(&self.trailer, eol);
            self.crlf = eol == "\r\n";
        }

        self.header = header;
        self.header_dirty = false;
        self.encoding = encoding;
        self.wrap = layout.wrap;
    }
}

impl Backend for PoBackend {
    fn format(&self) -> FormatType {
        match self.kind {
            PoKind::Po => FormatType::Po,
            PoKind::Pot => FormatType::Pot,
        }
    }

    fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Translations
            | Capability::LanguageSetting
            | Capability::FuzzyTranslations
            | Capability::CompiledBinary => self.kind == PoKind::Po,
            Capability::UserComments
            | Capability::DeletedItemsTracking
            | Capability::ItemEditing
            | Capability::PluralForms => true,
        }
    }

    fn language(&self) -> Option<Language> {
        self.language.clone()
    }

    fn source_language(&self) -> Option<Language> {
        self.header
            .source_language()
            .or_else(|| Some(Language::english()))
    }

    fn set_language(&mut self, language: &Language) {
        self.header.set("Language", &language.code());
        if self.header.plural_forms().is_none() {
            if let Some(pf) = default_plural_forms(language) {
                self.header.set("Plural-Forms", pf);
            }
        }
        self.language = Some(language.clone());
        self.header_dirty = true;
    }

    fn header(&self) -> Option<&PoHeader> {
        Some(&self.header)
    }

    fn remove_deleted_items(&mut self) {
        self.extras.retain(|e| e.kind != ExtraKind::Obsolete);
    }

    fn write(
        &mut self,
        items: &mut [CatalogItem],
        options: &SaveOptions,
        modified: bool,
    ) -> Result<Vec<u8>, Error> {
        let layout = self.layout(options);
        let mut header = self.header.clone();
        let mut header_dirty = self.header_dirty;
        if options.update_revision_date && modified && header.get("PO-Revision-Date").is_some() {
            header.set("PO-Revision-Date", &revision_timestamp());
            header_dirty = true;
        }

        let mut rendered = self.render(items, &header, header_dirty, layout);
        let mut encoding = self.encoding;
        let bytes = match encode(&rendered.text, encoding) {
            Some(bytes) => bytes,
            None => {
                warn!(
                    charset = encoding.name(),
                    "translations can't be represented in the declared charset, saving as UTF-8"
                );
                header.set_charset("UTF-8");
                encoding = UTF_8;
                rendered = self.render(items, &header, true, layout);
                rendered.text.clone().into_bytes()
            }
        };

        let mut output = Vec::with_capacity(bytes.len() + UTF8_BOM.len());
        if self.bom {
            output.extend_from_slice(UTF8_BOM);
        }
        output.extend_from_slice(&bytes);

        self.commit(items, rendered, header, encoding, layout);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const SAMPLE: &str = indoc! {r#"
        # German translation.
        msgid ""
        msgstr ""
        "Project-Id-Version: demo 1.0\n"
        "Language: de\n"
        "MIME-Version: 1.0\n"
        "Content-Type: text/plain; charset=UTF-8\n"
        "Plural-Forms: nplurals=2; plural=(n != 1);\n"

        #: src/main.c:10
        msgid "Open"
        msgstr "Öffnen"

        #, c-format
        msgid "%d file"
        msgid_plural "%d files"
        msgstr[0] "%d Datei"
        msgstr[1] "%d Dateien"

        #~ msgid "Old"
        #~ msgstr "Alt"
    "#};

    fn load_str(text: &str) -> Loaded {
        load(text.as_bytes(), "de.po", PoKind::Po, &OpenOptions::default()).unwrap()
    }

    fn keep() -> SaveOptions {
        SaveOptions::default().with_update_revision_date(false)
    }

    #[test]
    fn test_load_items() {
        let loaded = load_str(SAMPLE);
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[0].translation(), "Öffnen");
        assert_eq!(loaded.items[0].references(), ["src/main.c:10"]);
        assert_eq!(loaded.items[1].translations().len(), 2);
        assert!(loaded.items[1].has_flag("c-format"));
        assert_eq!(loaded.deleted.len(), 1);
        assert_eq!(loaded.deleted[0].lines[0], "#~ msgid \"Old\"");
        assert_eq!(loaded.backend.language().unwrap().code(), "de");
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_unmodified_round_trip() {
        let mut loaded = load_str(SAMPLE);
        let bytes = loaded
            .backend
            .write(&mut loaded.items, &keep(), false)
            .unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), SAMPLE);
    }

    #[test]
    fn test_edit_regenerates_only_that_entry() {
        let mut loaded = load_str(SAMPLE);
        loaded.items[0].set_translation("Aufmachen");
        let bytes = loaded
            .backend
            .write(&mut loaded.items, &keep(), true)
            .unwrap();
        let expected = SAMPLE.replace("\"Öffnen\"", "\"Aufmachen\"");
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }

    #[test]
    fn test_ignored_translations_stay_dropped_on_save() {
        let options = OpenOptions::new().with_ignore_translations(true);
        let mut loaded = load(SAMPLE.as_bytes(), "de.po", PoKind::Po, &options).unwrap();
        assert_eq!(loaded.items[0].translation(), "");
        assert!(loaded.items.iter().all(CatalogItem::is_modified));

        let bytes = loaded
            .backend
            .write(&mut loaded.items, &keep(), true)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("msgid \"Open\"\nmsgstr \"\"\n"), "{text}");
        assert!(text.contains("msgstr[0] \"\"\nmsgstr[1] \"\"\n"), "{text}");
        assert!(!text.contains("Öffnen"));
        assert!(!text.contains("Datei"));
        // header and obsolete entries are not translations of items
        assert!(text.contains("\"Language: de\\n\""));
        assert!(text.contains("#~ msgstr \"Alt\""));
    }

    #[test]
    fn test_untranslated_entries_stay_raw_when_ignoring_translations() {
        let text = "msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n\nmsgid \"Yes\"\nmsgstr \"\"\n";
        let options = OpenOptions::new()
            .with_ignore_translations(true)
            .with_fix_common_issues(false);
        let loaded = load(text.as_bytes(), "de.po", PoKind::Po, &options).unwrap();
        assert!(!loaded.items[0].is_modified());
    }

    #[test]
    fn test_revision_date_updated_when_modified() {
        let text = SAMPLE.replace(
            "\"MIME-Version: 1.0\\n\"",
            "\"PO-Revision-Date: 2020-01-01 00:00+0000\\n\"\n\"MIME-Version: 1.0\\n\"",
        );
        let mut loaded = load_str(&text);
        let options = SaveOptions::default();

        let unchanged = loaded.backend.write(&mut loaded.items, &options, false).unwrap();
        assert_eq!(String::from_utf8(unchanged).unwrap(), text);

        loaded.items[0].set_translation("Auf");
        let changed = loaded.backend.write(&mut loaded.items, &options, true).unwrap();
        let changed = String::from_utf8(changed).unwrap();
        assert!(!changed.contains("2020-01-01"));
        assert!(changed.contains("PO-Revision-Date: "));
    }

    #[test]
    fn test_removed_deleted_items_are_not_written() {
        let mut loaded = load_str(SAMPLE);
        loaded.backend.remove_deleted_items();
        let bytes = loaded.backend.write(&mut loaded.items, &keep(), false).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("#~"));
    }

    #[test]
    fn test_crlf_is_preserved_and_converted() {
        let crlf = SAMPLE.replace('\n', "\r\n");
        let mut loaded = load_str(&crlf);
        loaded.items[0].set_translation("Auf");
        let bytes = loaded.backend.write(&mut loaded.items, &keep(), true).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("msgstr \"Auf\"\r\n"));
        assert!(!text.replace("\r\n", "").contains('\n'));

        let unix = keep().with_line_endings(LineEndings::Unix);
        let bytes = loaded.backend.write(&mut loaded.items, &unix, true).unwrap();
        assert!(!String::from_utf8(bytes).unwrap().contains('\r'));
    }

    #[test]
    fn test_latin1_round_trip_and_utf8_fallback() {
        let text = "msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n\nmsgid \"Yes\"\nmsgstr \"Jä\"\n";
        let (bytes, _, _) = WINDOWS_1252.encode(text);
        let mut loaded = load(&bytes, "de.po", PoKind::Po, &OpenOptions::default()).unwrap();
        assert_eq!(loaded.items[0].translation(), "Jä");

        let saved = loaded.backend.write(&mut loaded.items, &keep(), false).unwrap();
        assert_eq!(saved, bytes.into_owned());

        loaded.items[0].set_translation("Да");
        let saved = loaded.backend.write(&mut loaded.items, &keep(), true).unwrap();
        let saved = String::from_utf8(saved).unwrap();
        assert!(saved.contains("charset=UTF-8"));
        assert!(saved.contains("msgstr \"Да\""));
    }

    #[test]
    fn test_invalid_utf8_is_a_warning() {
        let bytes = b"msgid \"a\"\nmsgstr \"\xff\"\n";
        let loaded = load(bytes, "x.po", PoKind::Po, &OpenOptions::default()).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.items[0].translation(), "\u{FFFD}");
    }

    #[test]
    fn test_bom_is_kept() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(SAMPLE.as_bytes());
        let mut loaded = load(&bytes, "de.po", PoKind::Po, &OpenOptions::default()).unwrap();
        let saved = loaded.backend.write(&mut loaded.items, &keep(), false).unwrap();
        assert_eq!(saved, bytes);
    }

    #[test]
    fn test_empty_file_is_read_error() {
        let err = load(b"", "x.po", PoKind::Po, &OpenOptions::default()).unwrap_err();
        assert!(err.is_read_error());
        let err = load(b"msgid \"a\"\nbogus\n", "x.po", PoKind::Po, &OpenOptions::default()).unwrap_err();
        assert!(err.is_read_error());
    }

    #[test]
    fn test_new_catalog_with_item() {
        let fr = Language::try_parse("fr").unwrap();
        let mut backend = new_catalog(Some(&fr));
        let mut items = vec![CatalogItem::new("Hello")];
        items[0].set_translation("Bonjour");
        let text = String::from_utf8(backend.write(&mut items, &keep(), true).unwrap()).unwrap();
        assert!(text.starts_with("msgid \"\"\nmsgstr \"\"\n"));
        assert!(text.contains("\"Language: fr\\n\"\n"));
        assert!(text.ends_with("\n\nmsgid \"Hello\"\nmsgstr \"Bonjour\"\n"));
        assert_eq!(items[0].handle(), ItemHandle::Po(0));
    }

    #[test]
    fn test_pot_capabilities() {
        let loaded = load(SAMPLE.as_bytes(), "x.pot", PoKind::Pot, &OpenOptions::default()).unwrap();
        assert_eq!(loaded.backend.format(), FormatType::Pot);
        assert!(!loaded.backend.has_capability(Capability::Translations));
        assert!(loaded.backend.has_capability(Capability::DeletedItemsTracking));
        assert!(loaded.backend.language().is_none());
    }

    #[test]
    fn test_language_from_file_name() {
        let text = "msgid \"a\"\nmsgstr \"b\"\n";
        let loaded = load(text.as_bytes(), "po/pt_BR.po", PoKind::Po, &OpenOptions::default()).unwrap();
        assert_eq!(loaded.backend.language().unwrap().code(), "pt_BR");
    }

    #[test]
    fn test_set_language_rewrites_header() {
        let mut loaded = load_str(SAMPLE);
        loaded.backend.set_language(&Language::try_parse("fr").unwrap());
        let text = String::from_utf8(loaded.backend.write(&mut loaded.items, &keep(), true).unwrap()).unwrap();
        assert!(text.contains("\"Language: fr\\n\""));
        assert!(text.starts_with("# German translation.\nmsgid \"\"\n"));
    }
}
