//! XLIFF 2.0 (`unit` / `segment@state`).

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

const FUZZY_SUBSTATE: &str = "transcat:fuzzy";

#[derive(Debug)]
pub(crate) struct Xliff2Backend {
    doc: XmlDocument,
    root: NodeId,
    bom: bool,
    source_language: Option<Language>,
    language: Option<Language>,
}

pub(super) fn load(
    doc: XmlDocument,
    root: NodeId,
    bom: bool,
    options: &OpenOptions,
) -> Result<Loaded, Error> {
    let source_language = language_attr(&doc, root, "srcLang");
    let language = language_attr(&doc, root, "trgLang").or_else(|| options.language_hint.clone());

    let mut items = Vec::new();
    for segment in doc.descendants(root, "segment") {
        let Some(unit) = doc.parent(segment) else {
            continue;
        };
        if doc.attr(unit, "translate").as_deref() == Some("no") {
            continue;
        }
        items.push(read_segment(&doc, unit, segment)?);
    }
    debug!(segments = items.len(), "parsed XLIFF 2.0 segments");

    let backend = Xliff2Backend {
        doc,
        root,
        bom,
        source_language,
        language,
    };
    Ok(Loaded {
        backend: Box::new(backend),
        items,
        deleted: Vec::new(),
        warnings: Vec::new(),
    })
}

fn read_segment(doc: &XmlDocument, unit: NodeId, segment: NodeId) -> Result<CatalogItem, Error> {
    let (text, metadata) = match doc.child_element(segment, "source") {
        Some(source) => markup::extract(doc, source, MarkupDialect::Xliff2)?,
        None => (String::new(), XliffStringMetadata::plain()),
    };

    let mut extracted = Vec::new();
    let id = doc.attr_or_empty(unit, "id");
    if !id.is_empty() && id != text {
        extracted.push(format!("ID: {id}"));
    }

    let translation = match doc.child_element(segment, "target") {
        Some(target) => metadata.display_text(doc, target, MarkupDialect::Xliff2)?,
        None => String::new(),
    };
    let state = doc.attr_or_empty(segment, "state");
    let fuzzy = (!translation.is_empty() && state == "initial")
        || doc.attr(segment, "subState").as_deref() == Some(FUZZY_SUBSTATE);

    let mut references = Vec::new();
    for note in doc.descendants(unit, "note") {
        let text = doc.text(note)?;
        if doc.attr(note, "category").as_deref() == Some("location") {
            references.push(text);
            continue;
        }
        if !extracted.is_empty() {
            extracted.push(String::new());
        }
        extracted.push(text);
    }

    let mut item = CatalogItem::new(text);
    item.load()
        .translations(vec![translation])
        .fuzzy(fuzzy)
        .extracted_comments(extracted)
        .references(references);
    if !id.is_empty() {
        item.set_metadata("id", id);
    }
    item.set_handle(ItemHandle::Xml(segment));
    item.set_xliff_metadata(metadata);
    Ok(item)
}

impl Backend for Xliff2Backend {
    fn format(&self) -> FormatType {
        FormatType::Xliff2
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
        self.doc.set_attr(self.root, "trgLang", &language.tag());
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
            let segment = update.container;
            let target = ensure_target(&mut self.doc, segment);
            write_content(&mut self.doc, target, &update.content);
            if update.content.is_some() {
                self.doc.set_attr(segment, "state", "translated");
                if update.fuzzy {
                    self.doc.set_attr(segment, "subState", FUZZY_SUBSTATE);
                } else {
                    self.doc.remove_attr(segment, "subState");
                }
            } else {
                self.doc.remove_attr(segment, "state");
                self.doc.remove_attr(segment, "subState");
            }
        }
        Ok(serialize(&self.doc, self.bom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const XLIFF20: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <xliff xmlns="urn:oasis:names:tc:xliff:document:2.0" version="2.0" srcLang="en" trgLang="de">
          <file id="f1">
            <unit id="u1">
              <notes>
                <note category="location">src/app.c:7</note>
                <note>Greeting</note>
              </notes>
              <segment state="initial">
                <source>Hello <ph id="1" disp="name"/>!</source>
                <target>Hallo <ph id="1" disp="name"/>!</target>
              </segment>
            </unit>
            <unit id="u2" translate="no">
              <segment><source>Skip</source></segment>
            </unit>
            <unit id="Bye">
              <segment>
                <source>Bye</source>
              </segment>
            </unit>
          </file>
        </xliff>
    "#};

    fn load_str(text: &str) -> Loaded {
        super::super::load(text.as_bytes(), "de.xliff", &OpenOptions::default()).unwrap()
    }

    fn save(loaded: &mut Loaded) -> String {
        let bytes = loaded
            .backend
            .write(&mut loaded.items, &SaveOptions::default(), true)
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_read_segments() {
        let loaded = load_str(XLIFF20);
        assert_eq!(loaded.items.len(), 2);
        let first = &loaded.items[0];
        assert_eq!(first.source(), "Hello {name}!");
        assert_eq!(first.translation(), "Hallo {name}!");
        assert!(first.is_fuzzy());
        assert_eq!(first.references(), ["src/app.c:7"]);
        assert_eq!(first.extracted_comments(), ["ID: u1", "", "Greeting"]);
        assert_eq!(loaded.backend.language().unwrap().code(), "de");
    }

    #[test]
    fn test_unmodified_round_trip() {
        let mut loaded = load_str(XLIFF20);
        assert_eq!(save(&mut loaded), XLIFF20);
    }

    #[test]
    fn test_translate_and_mark_fuzzy() {
        let mut loaded = load_str(XLIFF20);
        loaded.items[1].set_translation("Tschüss");
        loaded.items[1].set_fuzzy(true);
        let text = save(&mut loaded);
        assert!(text.contains(
            "<segment state=\"translated\" subState=\"transcat:fuzzy\">\n        <source>Bye</source>\n        <target>Tschüss</target>\n"
        ));
    }

    #[test]
    fn test_clear_removes_state() {
        let mut loaded = load_str(XLIFF20);
        loaded.items[0].clear_translation();
        let text = save(&mut loaded);
        assert!(text.contains("<segment>\n        <source>Hello"));
        assert!(text.contains("<target></target>"));
    }

    #[test]
    fn test_broken_markup_leaves_document_untouched() {
        let mut loaded = load_str(XLIFF20);
        loaded.items[1].set_translation("ok");
        loaded.items[0].set_translation("Hallo <ph id=\"1\" disp=\"name\">!");
        let err = loaded
            .backend
            .write(&mut loaded.items, &SaveOptions::default(), true)
            .unwrap_err();
        assert!(matches!(err, Error::BrokenMarkup { .. }));

        loaded.items[0].clear_modified();
        loaded.items[1].clear_modified();
        assert_eq!(save(&mut loaded), XLIFF20);
    }

    #[test]
    fn test_set_language() {
        let mut loaded = load_str(XLIFF20);
        loaded.backend.set_language(&Language::try_parse("fr").unwrap());
        let text = save(&mut loaded);
        assert_eq!(text, XLIFF20.replace("trgLang=\"de\"", "trgLang=\"fr\""));
    }
}
