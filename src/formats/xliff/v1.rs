//! XLIFF 1.0, 1.1 and 1.2 (`file` / `trans-unit` / `target@state`).

use tracing::debug;

use super::{
    NodeId, XmlDocument, ensure_target, language_attr,
    markup::{self, MarkupDialect, XliffStringMetadata},
    prepare_updates, serialize, write_content,
};
use crate::{
    error::Error,
    formats::{Capability, FormatType},
    item::{CatalogItem, ItemHandle},
    language::Language,
    options::{OpenOptions, SaveOptions},
    traits::{Backend, Loaded},
};

/// Placeholder note Xcode writes for strings without a developer comment.
const XCODE_NO_COMMENT: &str = "No comment provided by engineer.";

#[derive(Debug)]
pub(crate) struct Xliff1Backend {
    doc: XmlDocument,
    root: NodeId,
    bom: bool,
    subversion: u8,
    source_language: Option<Language>,
    language: Option<Language>,
}

pub(super) fn load(
    doc: XmlDocument,
    root: NodeId,
    bom: bool,
    subversion: u8,
    options: &OpenOptions,
) -> Result<Loaded, Error> {
    let files = doc.child_elements(root, "file");

    // Embedded files may declare different languages; only the first one
    // is used.
    let (source_language, language) = match files.first() {
        Some(&file) => (
            language_attr(&doc, file, "source-language"),
            language_attr(&doc, file, "target-language"),
        ),
        None => (None, None),
    };

    let mut items = Vec::new();
    for &file in &files {
        for unit in doc.descendants(file, "trans-unit") {
            if doc.attr(unit, "translate").as_deref() == Some("no") {
                continue;
            }
            items.push(read_unit(&doc, unit)?);
        }
    }
    debug!(subversion, units = items.len(), "parsed XLIFF 1.x units");

    let backend = Xliff1Backend {
        doc,
        root,
        bom,
        subversion,
        source_language,
        language: language.or_else(|| options.language_hint.clone()),
    };
    Ok(Loaded {
        backend: Box::new(backend),
        items,
        deleted: Vec::new(),
        warnings: Vec::new(),
    })
}

fn read_unit(doc: &XmlDocument, unit: NodeId) -> Result<CatalogItem, Error> {
    let (text, metadata) = match doc.child_element(unit, "source") {
        Some(source) => markup::extract(doc, source, MarkupDialect::Xliff1)?,
        None => (String::new(), XliffStringMetadata::plain()),
    };

    let mut extracted = Vec::new();
    let id = doc.attr_or_empty(unit, "id");
    // Xcode uses the source text as id
    if !id.is_empty() && id != text {
        extracted.push(format!("ID: {id}"));
    }

    let (translation, fuzzy) = match doc.child_element(unit, "target") {
        Some(target) => {
            let translation = metadata.display_text(doc, target, MarkupDialect::Xliff1)?;
            let translated = !translation.is_empty();
            let state = doc.attr_or_empty(target, "state");
            let fuzzy = matches!(state.as_str(), "needs-adaptation" | "needs-l10n")
                || (translated && matches!(state.as_str(), "new" | "needs-translation"));
            (translation, fuzzy)
        }
        None => (String::new(), false),
    };

    for note in doc.child_elements(unit, "note") {
        let note = doc.text(note)?;
        if note == XCODE_NO_COMMENT {
            continue;
        }
        if !extracted.is_empty() {
            extracted.push(String::new());
        }
        extracted.push(note);
    }

    let references = read_references(doc, unit)?;

    let mut item = CatalogItem::new(text);
    item.load()
        .translations(vec![translation])
        .fuzzy(fuzzy)
        .extracted_comments(extracted)
        .references(references);
    if !id.is_empty() {
        item.set_metadata("id", id);
    }
    item.set_handle(ItemHandle::Xml(unit));
    item.set_xliff_metadata(metadata);
    Ok(item)
}

/// `file:line` references from `context-group[@purpose='location']`.
fn read_references(doc: &XmlDocument, unit: NodeId) -> Result<Vec<String>, Error> {
    let mut refs = Vec::new();
    for group in doc.descendants(unit, "context-group") {
        if doc.attr(group, "purpose").as_deref() != Some("location") {
            continue;
        }
        let mut file = String::new();
        let mut line = String::new();
        for context in doc.child_elements(group, "context") {
            match doc.attr_or_empty(context, "context-type").as_str() {
                "sourcefile" => file = doc.text(context)?,
                "linenumber" => line = format!(":{}", doc.text(context)?),
                _ => {}
            }
        }
        if !file.is_empty() {
            refs.push(file + &line);
        }
    }
    Ok(refs)
}

impl Xliff1Backend {
    fn update_state(&mut self, target: NodeId, translated: bool, fuzzy: bool) {
        if self.subversion == 0 {
            if translated && !fuzzy {
                self.doc.remove_attr(target, "state");
            } else {
                self.doc.set_attr(target, "state", "needs-translation");
            }
            return;
        }

        self.doc.remove_attr(target, "state-qualifier");
        let state = match (translated, fuzzy) {
            (true, false) => "translated",
            (true, true) => "needs-l10n",
            (false, _) => "needs-translation",
        };
        self.doc.set_attr(target, "state", state);
    }
}

impl Backend for Xliff1Backend {
    fn format(&self) -> FormatType {
        FormatType::Xliff1 {
            subversion: self.subversion,
        }
    }

    fn has_capability(&self, capability: Capability) -> bool {
        matches!(
            capability,
            Capability::Translations | Capability::LanguageSetting | Capability::FuzzyTranslations
        )
    }

    fn language(&self) -> Option<Language> {
        self.language.clone()
    }

    fn source_language(&self) -> Option<Language> {
        self.source_language.clone()
    }

    fn set_language(&mut self, language: &Language) {
        let tag = language.tag();
        for file in self.doc.child_elements(self.root, "file") {
            self.doc.set_attr(file, "target-language", &tag);
        }
        self.language = Some(language.clone());
    }

    fn write(
        &mut self,
        items: &mut [CatalogItem],
        _options: &SaveOptions,
        _modified: bool,
    ) -> Result<Vec<u8>, Error> {
        let updates = prepare_updates(items)?;
        for update in &updates {
            let target = ensure_target(&mut self.doc, update.container);
            write_content(&mut self.doc, target, &update.content);
            self.update_state(target, update.content.is_some(), update.fuzzy);
        }
        Ok(serialize(&self.doc, self.bom))
    }
}
