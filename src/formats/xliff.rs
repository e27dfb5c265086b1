//! XLIFF 1.x and 2.0 documents.
//!
//! The parsed [`XmlDocument`] is owned by the backend and edited in place on
//! save: only the `target` elements (and their state attributes) of modified
//! items are rewritten, every other byte of the file is kept.

pub mod dom;
pub mod markup;
mod v1;
mod v2;

use std::io::Read;

use encoding_rs_io::DecodeReaderBytesBuilder;
use tracing::debug;

pub use dom::{NodeId, XmlDocument};

use crate::{
    error::Error,
    item::{CatalogItem, ItemHandle},
    language::Language,
    options::OpenOptions,
    traits::Loaded,
};

use self::markup::TargetContent;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const NAMESPACE_PREFIX: &str = "urn:oasis:names:tc:xliff:document:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    V1 { subversion: u8 },
    V2,
}

/// Decodes the file into text. UTF-16 files (with a BOM) are transcoded;
/// everything else must be UTF-8.
fn decode(bytes: &[u8]) -> Result<(bool, String), Error> {
    let bom = bytes.starts_with(UTF8_BOM);
    let mut text = String::with_capacity(bytes.len());
    DecodeReaderBytesBuilder::new()
        .strip_bom(true)
        .build(bytes)
        .read_to_string(&mut text)?;
    if let Some(rest) = text.strip_prefix('\u{FEFF}') {
        text = rest.to_string();
    }
    Ok((bom, text))
}

/// Version from the `version` attribute, else from the namespace URI.
fn detect_version(doc: &XmlDocument, root: NodeId) -> Result<Version, String> {
    let version = doc.attr(root, "version").or_else(|| {
        let xmlns = match doc.name(root)?.split_once(':') {
            Some((prefix, _)) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        doc.attr(root, &xmlns)?
            .strip_prefix(NAMESPACE_PREFIX)
            .map(str::to_string)
    });

    match version.as_deref().map(str::trim) {
        Some("1.0") => Ok(Version::V1 { subversion: 0 }),
        Some("1.1") => Ok(Version::V1 { subversion: 1 }),
        Some("1.2") => Ok(Version::V1 { subversion: 2 }),
        Some("2.0") => Ok(Version::V2),
        Some(other) => Err(format!("unsupported XLIFF version ({other})")),
        None => Err("missing XLIFF version".to_string()),
    }
}

/// Reads an XLIFF file of any supported version.
pub(crate) fn load(bytes: &[u8], file_name: &str, options: &OpenOptions) -> Result<Loaded, Error> {
    let (bom, text) = decode(bytes)?;
    let doc = XmlDocument::parse(&text)?;
    let root = doc
        .root_element()
        .filter(|&root| doc.local_name(root) == Some("xliff"))
        .ok_or_else(|| Error::read(file_name, "not an XLIFF file"))?;
    let version = detect_version(&doc, root).map_err(|reason| Error::read(file_name, reason))?;
    debug!(file = file_name, ?version, "loading XLIFF document");

    let mut loaded = match version {
        Version::V1 { subversion } => v1::load(doc, root, bom, subversion, options)?,
        Version::V2 => v2::load(doc, root, bom, options)?,
    };
    if options.ignore_translations {
        for item in loaded.items.iter_mut() {
            if item.is_translated() || item.is_fuzzy() {
                item.clear_translation();
            }
        }
    }
    Ok(loaded)
}

fn language_attr(doc: &XmlDocument, node: NodeId, name: &str) -> Option<Language> {
    doc.attr(node, name).as_deref().and_then(Language::try_parse)
}

/// A modified item's new target, computed before the document is touched.
struct TargetUpdate {
    /// `trans-unit` or `segment`.
    container: NodeId,
    content: Option<TargetContent>,
    fuzzy: bool,
}

/// Restores the markup of every modified item. Fails on the first
/// translation whose markup is not well-formed.
fn prepare_updates(items: &[CatalogItem]) -> Result<Vec<TargetUpdate>, Error> {
    let mut updates = Vec::new();
    for item in items.iter().filter(|i| i.is_modified()) {
        let ItemHandle::Xml(container) = item.handle() else {
            continue;
        };
        let text = item.translation();
        let content = if text.is_empty() {
            None
        } else {
            let content = match item.xliff_metadata() {
                Some(metadata) => {
                    metadata
                        .prepare_target(text)
                        .map_err(|reason| Error::BrokenMarkup {
                            item: item.id().0,
                            reason,
                        })?
                }
                None => TargetContent::Plain(text.to_string()),
            };
            Some(content)
        };
        updates.push(TargetUpdate {
            container,
            content,
            fuzzy: item.is_fuzzy(),
        });
    }
    Ok(updates)
}

/// Returns the `target` of `container`, creating it right after `source`
/// with the same indentation the container's first child uses.
fn ensure_target(doc: &mut XmlDocument, container: NodeId) -> NodeId {
    if let Some(target) = doc.child_element(container, "target") {
        return target;
    }

    let source = doc.child_element(container, "source");
    let name = source
        .and_then(|s| doc.name(s))
        .and_then(|n| n.split_once(':'))
        .map_or_else(|| "target".to_string(), |(prefix, _)| format!("{prefix}:target"));
    let indent = doc
        .children(container)
        .first()
        .copied()
        .and_then(|c| doc.raw_text(c))
        .filter(|raw| raw.trim().is_empty())
        .map(str::to_string);

    let target = doc.insert_element_after(container, source.unwrap_or(container), &name);
    if let (Some(source), Some(indent)) = (source, indent) {
        doc.insert_raw_text_after(container, source, &indent);
    }
    target
}

fn write_content(doc: &mut XmlDocument, target: NodeId, content: &Option<TargetContent>) {
    match content {
        None => doc.remove_children(target),
        Some(TargetContent::Plain(text)) => doc.set_text(target, text),
        Some(TargetContent::Markup(fragment)) => {
            doc.remove_children(target);
            doc.append_fragment(target, fragment);
        }
    }
}

fn serialize(doc: &XmlDocument, bom: bool) -> Vec<u8> {
    let text = doc.serialize();
    let mut out = Vec::with_capacity(text.len() + UTF8_BOM.len());
    if bom {
        out.extend_from_slice(UTF8_BOM);
    }
    out.extend_from_slice(text.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(text: &str) -> Result<Loaded, Error> {
        load(text.as_bytes(), "test.xlf", &OpenOptions::default())
    }

    #[test]
    fn test_version_from_namespace() {
        let text = r#"<xliff xmlns="urn:oasis:names:tc:xliff:document:1.2"><file source-language="en" target-language="de"/></xliff>"#;
        let loaded = load_str(text).unwrap();
        assert_eq!(loaded.backend.format(), crate::FormatType::Xliff1 { subversion: 2 });
    }

    #[test]
    fn test_unsupported_version() {
        let err = load_str(r#"<xliff version="2.1" srcLang="en"/>"#).unwrap_err();
        match err {
            Error::Read { reason, .. } => assert_eq!(reason, "unsupported XLIFF version (2.1)"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_xliff() {
        let err = load_str("<resources/>").unwrap_err();
        assert!(err.is_read_error());
    }

    #[test]
    fn test_utf16_is_decoded() {
        let text = r#"<xliff version="2.0" srcLang="en" trgLang="cs"><file id="f"/></xliff>"#;
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let loaded = load(&bytes, "x.xliff", &OpenOptions::default()).unwrap();
        assert_eq!(loaded.backend.language().unwrap().code(), "cs");
    }

    #[test]
    fn test_ensure_target_copies_indentation() {
        let mut doc = XmlDocument::parse(
            "<trans-unit id=\"a\">\n  <source>Hi</source>\n</trans-unit>",
        )
        .unwrap();
        let unit = doc.root_element().unwrap();
        let target = ensure_target(&mut doc, unit);
        doc.set_text(target, "Ahoj");
        assert_eq!(
            doc.serialize(),
            "<trans-unit id=\"a\">\n  <source>Hi</source>\n  <target>Ahoj</target>\n</trans-unit>"
        );
        assert_eq!(ensure_target(&mut doc, unit), target);
    }
}
