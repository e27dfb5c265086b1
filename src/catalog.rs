//! This module provides the [`Catalog`] struct, the in-memory form of one
//! translation file.
//!
//! A catalog owns its items and the format backend that read them. Items
//! are edited in place; saving hands them back to the backend, which writes
//! only what changed.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{
    error::Error,
    formats::{
        Capability, FileFamily, FormatType, detect_family,
        po::{self, PoKind, header::PoHeader},
        xliff,
    },
    item::{CatalogItem, DeletedItem, EntryStatus, ItemHandle, ItemId},
    language::Language,
    mo::{CompilationStatus, compile_mo},
    options::{OpenOptions, SaveOptions, Settings},
    tools::{ToolReport, ToolRunner, execute_gettext, quote_arg},
    traits::{Backend, Loaded},
    validation::{Diagnostic, DiagnosticKind, Severity, ValidationResults, Validator},
};

#[cfg(windows)]
const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
const NULL_DEVICE: &str = "/dev/null";

/// Result of a successful [`Catalog::save`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaveOutcome {
    /// Status of the optional `.mo` compilation, independent of the save.
    pub compilation: CompilationStatus,
}

/// Item counts by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    pub all: usize,
    pub translated: usize,
    pub fuzzy: usize,
    pub untranslated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// The order items were read in, followed by added items.
    #[default]
    FileOrder,
    Source,
    Translation,
}

/// A translation catalog loaded from a PO or XLIFF file.
#[derive(Debug)]
pub struct Catalog {
    path: Option<PathBuf>,
    backend: Box<dyn Backend>,
    items: Vec<CatalogItem>,
    deleted: Vec<DeletedItem>,
    load_warnings: Vec<String>,
    /// Catalog-level changes; item edits are tracked by the items.
    modified: bool,
    next_id: u32,
}

fn load_family(
    bytes: &[u8],
    file_name: &str,
    family: FileFamily,
    options: &OpenOptions,
) -> Result<Loaded, Error> {
    let loaded = match family {
        FileFamily::Po => po::load(bytes, file_name, PoKind::Po, options),
        FileFamily::Pot => po::load(bytes, file_name, PoKind::Pot, options),
        FileFamily::Xliff => xliff::load(bytes, file_name, options),
    };
    loaded.map_err(|e| e.into_read(file_name))
}

/// Writes `bytes` to a temporary file next to `path` and moves it over.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(file.path(), metadata.permissions())?;
    }
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn msgfmt_command(path: &Path) -> String {
    format!(
        "msgfmt -c -o {NULL_DEVICE} {}",
        quote_arg(&path.to_string_lossy())
    )
}

impl Catalog {
    /// Opens a catalog, choosing the format from the file extension.
    ///
    /// # Parameters
    /// - `path`: A `.po`, `.pot`, `.xlf` or `.xliff` file.
    ///
    /// # Returns
    ///
    /// The loaded catalog, or [`Error::Read`] if the file is missing, of an
    /// unsupported type, malformed, or of an unsupported XLIFF version.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::open_with(path, &OpenOptions::default())
    }

    /// Same as [`Catalog::open`] with explicit [`OpenOptions`].
    pub fn open_with<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self, Error> {
        let path = path.as_ref();
        let file_name = path.display().to_string();
        let family = detect_family(path)
            .ok_or_else(|| Error::read(&file_name, "unsupported file type"))?;
        let bytes = fs::read(path).map_err(|e| Error::from(e).into_read(&file_name))?;

        let loaded = load_family(&bytes, &file_name, family, options)?;
        let mut catalog = Self::from_loaded(loaded);
        catalog.path = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Parses a catalog from memory. `file_name` picks the format and may
    /// supply the language; nothing is read from disk.
    pub fn from_bytes(bytes: &[u8], file_name: &str) -> Result<Self, Error> {
        Self::from_bytes_with(bytes, file_name, &OpenOptions::default())
    }

    pub fn from_bytes_with(
        bytes: &[u8],
        file_name: &str,
        options: &OpenOptions,
    ) -> Result<Self, Error> {
        let family = detect_family(file_name)
            .ok_or_else(|| Error::read(file_name, "unsupported file type"))?;
        let loaded = load_family(bytes, file_name, family, options)?;
        Ok(Self::from_loaded(loaded))
    }

    /// An empty PO catalog with a standard header.
    pub fn new_po(language: Option<&Language>) -> Self {
        Self::from_loaded(Loaded {
            backend: Box::new(po::new_catalog(language)),
            items: Vec::new(),
            deleted: Vec::new(),
            warnings: Vec::new(),
        })
    }

    fn from_loaded(loaded: Loaded) -> Self {
        let Loaded {
            backend,
            mut items,
            deleted,
            warnings,
        } = loaded;
        for (item, id) in items.iter_mut().zip(1..) {
            item.set_id(ItemId(id));
        }
        debug!(
            format = %backend.format(),
            items = items.len(),
            deleted = deleted.len(),
            warnings = warnings.len(),
            "loaded catalog"
        );
        let next_id = items.len() as u32 + 1;
        Catalog {
            path: None,
            backend,
            items,
            deleted,
            load_warnings: warnings,
            modified: false,
            next_id,
        }
    }

    /// File the catalog was loaded from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn format(&self) -> FormatType {
        self.backend.format()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.backend.has_capability(capability)
    }

    pub fn language(&self) -> Option<Language> {
        self.backend.language()
    }

    /// Changes the translation language. Fails for formats that can't
    /// store one (templates).
    pub fn set_language(&mut self, language: &Language) -> Result<(), Error> {
        self.require(Capability::LanguageSetting, "setting the language")?;
        self.backend.set_language(language);
        self.modified = true;
        Ok(())
    }

    pub fn source_language(&self) -> Option<Language> {
        self.backend.source_language()
    }

    /// The gettext header, for PO catalogs.
    pub fn header(&self) -> Option<&PoHeader> {
        self.backend.header()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [CatalogItem] {
        &mut self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut CatalogItem> {
        self.items.iter_mut().find(|i| i.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn require(&self, capability: Capability, operation: &'static str) -> Result<(), Error> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            Err(Error::Unsupported {
                format: self.format().to_string(),
                operation,
            })
        }
    }

    /// Appends a new item and returns its id.
    pub fn add_item(&mut self, mut item: CatalogItem) -> Result<ItemId, Error> {
        self.require(Capability::ItemEditing, "adding items")?;
        let id = ItemId(self.next_id);
        self.next_id += 1;
        item.set_id(id);
        item.set_handle(ItemHandle::Detached);
        item.mark_modified();
        self.items.push(item);
        self.modified = true;
        Ok(id)
    }

    /// Removes an item. Returns `Ok(None)` if no item has that id.
    pub fn remove_item(&mut self, id: ItemId) -> Result<Option<CatalogItem>, Error> {
        self.require(Capability::ItemEditing, "removing items")?;
        let Some(index) = self.items.iter().position(|i| i.id() == id) else {
            return Ok(None);
        };
        self.modified = true;
        Ok(Some(self.items.remove(index)))
    }

    /// Obsolete entries, for formats that keep them.
    pub fn deleted_items(&self) -> &[DeletedItem] {
        &self.deleted
    }

    /// Purges obsolete entries. A no-op for formats without
    /// [`Capability::DeletedItemsTracking`].
    pub fn remove_deleted_items(&mut self) {
        if !self.has_capability(Capability::DeletedItemsTracking) || self.deleted.is_empty() {
            return;
        }
        self.backend.remove_deleted_items();
        self.deleted.clear();
        self.modified = true;
    }

    /// True if anything changed since the catalog was loaded or saved.
    pub fn is_modified(&self) -> bool {
        self.modified || self.items.iter().any(CatalogItem::is_modified)
    }

    /// Problems found while reading the file, such as undecodable bytes.
    pub fn load_warnings(&self) -> &[String] {
        &self.load_warnings
    }

    /// Saves the catalog to `path` and remembers it as the catalog's file.
    ///
    /// # Parameters
    /// - `path`: Destination file, replaced atomically.
    /// - `options`: Layout of the written file and whether to compile a
    ///   `.mo` file next to it.
    ///
    /// # Returns
    ///
    /// The compilation status on success. On error nothing was written and
    /// the catalog's items are unchanged.
    pub fn save<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &SaveOptions,
    ) -> Result<SaveOutcome, Error> {
        let path = path.as_ref();
        let file_name = path.display().to_string();
        let read_only = fs::metadata(path)
            .map(|m| m.permissions().readonly())
            .unwrap_or(false);
        if read_only {
            return Err(Error::write(&file_name, "the file is read-only"));
        }

        let modified = self.is_modified();
        let bytes = self
            .backend
            .write(&mut self.items, options, modified)
            .map_err(|e| e.into_write(&file_name))?;
        write_atomically(path, &bytes).map_err(|e| e.into_write(&file_name))?;
        debug!(file = %file_name, bytes = bytes.len(), modified, "saved catalog");

        for item in &mut self.items {
            item.clear_modified();
        }
        self.modified = false;
        self.path = Some(path.to_path_buf());

        let compilation = if options.compile_binary && self.has_capability(Capability::CompiledBinary) {
            self.compile_binary(&path.with_extension("mo"))
        } else {
            CompilationStatus::NotDone
        };
        Ok(SaveOutcome { compilation })
    }

    fn compile_binary(&self, mo_path: &Path) -> CompilationStatus {
        let data = compile_mo(self.header(), &self.items);
        match write_atomically(mo_path, &data) {
            Ok(()) => CompilationStatus::Success,
            Err(e) => {
                warn!(file = %mo_path.display(), error = %e, "couldn’t compile MO file");
                CompilationStatus::Error(e.to_string())
            }
        }
    }

    /// Serializes the catalog in its native format without touching the
    /// disk. The catalog stays marked as modified.
    pub fn save_to_buffer(&mut self, options: &SaveOptions) -> Result<Vec<u8>, Error> {
        let file_name = self
            .path
            .as_ref()
            .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string());
        let modified = self.is_modified();
        self.backend
            .write(&mut self.items, options, modified)
            .map_err(|e| e.into_write(&file_name))
    }

    /// Runs the built-in checks. See [`Validator`].
    pub fn validate(&self, just_loaded: bool) -> ValidationResults {
        Validator::new(just_loaded).validate(self)
    }

    /// Like [`Catalog::validate`], dropping warnings when the settings say
    /// so.
    pub fn validate_with_settings(&self, just_loaded: bool, settings: &Settings) -> ValidationResults {
        let mut results = self.validate(just_loaded);
        if !settings.show_warnings {
            results.retain_errors();
        }
        results
    }

    /// Runs the built-in checks plus `msgfmt -c` for PO catalogs.
    ///
    /// The tool checks the file on disk when the catalog was just loaded
    /// and is unmodified, otherwise a temporary serialization. Failing to
    /// run the tool is reported as a warning.
    pub fn validate_with_tool(
        &mut self,
        runner: &dyn ToolRunner,
        just_loaded: bool,
    ) -> ValidationResults {
        let mut results = self.validate(just_loaded);
        if self.format() != FormatType::Po {
            return results;
        }
        match self.check_with_msgfmt(runner, just_loaded) {
            Ok(diagnostics) => results.extend(diagnostics),
            Err(e) => {
                warn!(error = %e, "couldn’t check catalog with msgfmt");
                results.push(Diagnostic::catalog(
                    Severity::Warning,
                    DiagnosticKind::ExternalTool,
                    e.to_string(),
                ));
            }
        }
        results
    }

    fn check_with_msgfmt(
        &mut self,
        runner: &dyn ToolRunner,
        just_loaded: bool,
    ) -> Result<Vec<Diagnostic>, Error> {
        let on_disk = self.path.clone().filter(|_| just_loaded && !self.is_modified());
        let (report, lines): (ToolReport, Vec<Option<usize>>) = match &on_disk {
            Some(path) => {
                let report = execute_gettext(runner, &msgfmt_command(path))?;
                (report, self.items.iter().map(CatalogItem::line).collect())
            }
            None => {
                let options = SaveOptions::default().with_update_revision_date(false);
                let bytes = self.save_to_buffer(&options)?;
                let mut temp = tempfile::Builder::new()
                    .prefix("transcat")
                    .suffix(".po")
                    .tempfile()?;
                temp.write_all(&bytes)?;
                temp.flush()?;
                let report = execute_gettext(runner, &msgfmt_command(temp.path()))?;
                (report, self.serialized_lines(&bytes))
            }
        };

        let mut diagnostics = Vec::new();
        for error in &report.errors {
            // The entry spanning a line is the last one starting at or
            // before it.
            let index = lines
                .iter()
                .enumerate()
                .filter_map(|(i, line)| line.map(|l| (i, l)))
                .filter(|&(_, line)| line <= error.line)
                .max_by_key(|&(_, line)| line)
                .map(|(i, _)| i);
            let item = index.map(|i| &self.items[i]);
            let line = match (&on_disk, item) {
                (Some(_), _) => Some(error.line),
                (None, Some(item)) => item.line(),
                (None, None) => None,
            };
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                kind: DiagnosticKind::ExternalTool,
                item: item.map(CatalogItem::id),
                line,
                message: error.message.clone(),
            });
        }

        if !report.success() && report.errors.is_empty() {
            let message = if report.unrecognized.is_empty() {
                format!("msgfmt failed with exit code {}", report.exit_code)
            } else {
                report.unrecognized.join("\n")
            };
            diagnostics.push(Diagnostic::catalog(
                Severity::Error,
                DiagnosticKind::ExternalTool,
                message,
            ));
        }
        Ok(diagnostics)
    }

    /// Start line of every item in a serialization of this catalog.
    fn serialized_lines(&self, bytes: &[u8]) -> Vec<Option<usize>> {
        let options = OpenOptions::new().with_fix_common_issues(false);
        match po::load(bytes, "check.po", PoKind::Po, &options) {
            Ok(loaded) if loaded.items.len() == self.items.len() => {
                loaded.items.iter().map(CatalogItem::line).collect()
            }
            _ => vec![None; self.items.len()],
        }
    }

    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics {
            all: self.items.len(),
            ..Statistics::default()
        };
        for item in &self.items {
            match item.status() {
                EntryStatus::Translated => stats.translated += 1,
                EntryStatus::Fuzzy => stats.fuzzy += 1,
                EntryStatus::Untranslated => stats.untranslated += 1,
            }
        }
        stats
    }

    /// Reorders the items (stable). PO catalogs are saved in this order.
    pub fn sort_items(&mut self, order: SortOrder) {
        let before: Vec<ItemId> = self.items.iter().map(CatalogItem::id).collect();
        match order {
            SortOrder::FileOrder => self.items.sort_by_key(CatalogItem::id),
            SortOrder::Source => self
                .items
                .sort_by(|a, b| (a.source(), a.context()).cmp(&(b.source(), b.context()))),
            SortOrder::Translation => self.items.sort_by(|a, b| a.translation().cmp(b.translation())),
        }
        let reordered = self.items.iter().map(CatalogItem::id).ne(before);
        if reordered && self.has_capability(Capability::ItemEditing) {
            self.modified = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolOutput;
    use indoc::indoc;
    use std::cell::RefCell;
    use tempfile::tempdir;

    const GERMAN: &str = indoc! {r#"
        msgid ""
        msgstr ""
        "Language: de\n"
        "Content-Type: text/plain; charset=UTF-8\n"

        msgid "One"
        msgstr "Eins"

        msgid "Two"
        msgstr "Zwei"

        msgid "Three"
        msgstr ""
    "#};

    fn write_po(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_open_assigns_sequential_ids() {
        let dir = tempdir().unwrap();
        let catalog = Catalog::open(write_po(dir.path(), "de.po", GERMAN)).unwrap();
        let ids: Vec<_> = catalog.items().iter().map(|i| i.id().0).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(catalog.format(), FormatType::Po);
        assert_eq!(catalog.language().unwrap().code(), "de");
        assert!(!catalog.is_modified());
    }

    #[test]
    fn test_open_errors_are_read_errors() {
        let dir = tempdir().unwrap();
        assert!(Catalog::open(dir.path().join("missing.po")).unwrap_err().is_read_error());
        let strings = write_po(dir.path(), "Localizable.strings", "\"a\" = \"b\";");
        assert!(Catalog::open(strings).unwrap_err().is_read_error());
        let broken = write_po(dir.path(), "broken.xlf", "<xliff version=\"1.2\"><file>");
        assert!(Catalog::open(broken).unwrap_err().is_read_error());
    }

    #[test]
    fn test_statistics_and_sorting() {
        let mut catalog = Catalog::from_bytes(GERMAN.as_bytes(), "de.po").unwrap();
        catalog.item_mut(ItemId(2)).unwrap().set_fuzzy(true);
        assert_eq!(
            catalog.statistics(),
            Statistics {
                all: 3,
                translated: 1,
                fuzzy: 1,
                untranslated: 1,
            }
        );

        catalog.sort_items(SortOrder::Source);
        let sources: Vec<_> = catalog.items().iter().map(CatalogItem::source).collect();
        assert_eq!(sources, ["One", "Three", "Two"]);
        catalog.sort_items(SortOrder::FileOrder);
        let sources: Vec<_> = catalog.items().iter().map(CatalogItem::source).collect();
        assert_eq!(sources, ["One", "Two", "Three"]);
    }

    #[test]
    fn test_add_and_remove_items() {
        let mut catalog = Catalog::new_po(Language::try_parse("fr").as_ref());
        let id = catalog.add_item(CatalogItem::new("Hello")).unwrap();
        assert_eq!(id, ItemId(1));
        catalog.item_mut(id).unwrap().set_translation("Bonjour");
        let second = catalog.add_item(CatalogItem::new("Bye")).unwrap();
        assert!(catalog.remove_item(second).unwrap().is_some());
        assert!(catalog.remove_item(second).unwrap().is_none());

        let text = String::from_utf8(catalog.save_to_buffer(&SaveOptions::default()).unwrap()).unwrap();
        assert!(text.contains("\"Language: fr\\n\""));
        assert!(text.ends_with("msgid \"Hello\"\nmsgstr \"Bonjour\"\n"));
        assert!(!text.contains("Bye"));
    }

    #[test]
    fn test_xliff_refuses_item_editing() {
        let xliff = r#"<xliff version="2.0" srcLang="en" trgLang="de"><file id="f"/></xliff>"#;
        let mut catalog = Catalog::from_bytes(xliff.as_bytes(), "de.xliff").unwrap();
        assert!(catalog.is_empty());
        let err = catalog.add_item(CatalogItem::new("x")).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
        assert!(!catalog.has_capability(Capability::DeletedItemsTracking));
        catalog.remove_deleted_items();
        assert!(!catalog.is_modified());
    }

    #[test]
    fn test_template_language_is_unsupported() {
        let mut catalog = Catalog::from_bytes(b"msgid \"a\"\nmsgstr \"\"\n", "app.pot").unwrap();
        let de = Language::try_parse("de").unwrap();
        assert!(catalog.set_language(&de).is_err());
    }

    #[test]
    fn test_save_compiles_mo_and_clears_modified() {
        let dir = tempdir().unwrap();
        let path = write_po(dir.path(), "de.po", GERMAN);
        let mut catalog = Catalog::open(&path).unwrap();
        catalog.item_mut(ItemId(3)).unwrap().set_translation("Drei");
        assert!(catalog.is_modified());

        let options = SaveOptions::default()
            .with_compile_binary(true)
            .with_update_revision_date(false);
        let outcome = catalog.save(&path, &options).unwrap();
        assert_eq!(outcome.compilation, CompilationStatus::Success);
        assert!(!catalog.is_modified());
        assert!(dir.path().join("de.mo").exists());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            GERMAN.replace("msgid \"Three\"\nmsgstr \"\"", "msgid \"Three\"\nmsgstr \"Drei\"")
        );
    }

    #[test]
    fn test_save_refuses_read_only_target() {
        let dir = tempdir().unwrap();
        let path = write_po(dir.path(), "de.po", GERMAN);
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions).unwrap();

        let mut catalog = Catalog::open(&path).unwrap();
        let err = catalog.save(&path, &SaveOptions::default()).unwrap_err();
        assert!(err.is_write_error());
    }

    struct RecordingRunner {
        stderr: &'static str,
        commands: RefCell<Vec<String>>,
    }

    impl ToolRunner for RecordingRunner {
        fn run(&self, command_line: &str) -> Result<ToolOutput, Error> {
            self.commands.borrow_mut().push(command_line.to_string());
            Ok(ToolOutput {
                exit_code: 1,
                stderr: self.stderr.to_string(),
            })
        }
    }

    #[test]
    fn test_tool_errors_attach_to_items() {
        let dir = tempdir().unwrap();
        let path = write_po(dir.path(), "de.po", GERMAN);
        let mut catalog = Catalog::open(&path).unwrap();
        let runner = RecordingRunner {
            stderr: "de.po:10: end-of-line within string\nde.po:3: header problem\n",
            commands: RefCell::new(Vec::new()),
        };

        let results = catalog.validate_with_tool(&runner, true);
        let tool: Vec<_> = results.of_kind(DiagnosticKind::ExternalTool).collect();
        assert_eq!(tool.len(), 2);
        assert_eq!(tool[0].item, Some(ItemId(2)));
        assert_eq!(tool[0].line, Some(10));
        assert_eq!(tool[1].item, None);

        let commands = runner.commands.borrow();
        assert!(commands[0].starts_with("msgfmt -c -o "));
        assert!(commands[0].ends_with(&quote_arg(&path.to_string_lossy())));
    }

    #[test]
    fn test_tool_checks_temporary_file_after_edit() {
        let mut catalog = Catalog::from_bytes(GERMAN.as_bytes(), "de.po").unwrap();
        catalog.item_mut(ItemId(3)).unwrap().set_translation("Drei");
        let runner = RecordingRunner {
            stderr: "/tmp/transcat1.po:13: bad\n",
            commands: RefCell::new(Vec::new()),
        };
        let results = catalog.validate_with_tool(&runner, false);
        let tool: Vec<_> = results.of_kind(DiagnosticKind::ExternalTool).collect();
        assert_eq!(tool[0].item, Some(ItemId(3)));
        assert_eq!(tool[0].line, Some(12));
        assert!(catalog.is_modified());
        assert!(runner.commands.borrow()[0].contains(".po\""));
    }
}
