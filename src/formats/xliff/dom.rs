//! A lossless XML tree for in-place editing.
//!
//! Nodes live in an arena owned by [`XmlDocument`] and are addressed by
//! [`NodeId`]. Every node keeps the exact text it was parsed from (start tag
//! content, raw escaped text, comments), so serializing an untouched tree
//! reproduces the input byte for byte. Attribute edits are spliced into the
//! original start tag text.

use std::ops::Range;

use quick_xml::{
    Reader,
    errors::IllFormedError,
    escape::{escape, partial_escape, unescape},
    events::{BytesStart, Event},
};

use crate::error::Error;

/// Index of a node inside its [`XmlDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    Decl(String),
    PI(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Element {
    /// Tag content between `<` and `>` (or `/>`).
    start: String,
    /// Closing tag content; `None` for self-closing elements.
    end: Option<String>,
}

impl Element {
    fn name(&self) -> &str {
        let end = self
            .start
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(self.start.len());
        &self.start[..end]
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Location of one attribute inside a start tag.
struct RawAttr {
    whole: Range<usize>,
    name: Range<usize>,
    value: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
}

impl XmlDocument {
    pub const ROOT: NodeId = NodeId(0);

    fn empty() -> Self {
        XmlDocument {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parses a complete document.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::parse_impl(text, false)
    }

    /// Parses a markup fragment (text mixed with elements, no single root),
    /// additionally rejecting malformed character references in text.
    pub fn parse_fragment(text: &str) -> Result<Self, Error> {
        Self::parse_impl(text, true)
    }

    fn parse_impl(text: &str, check_text: bool) -> Result<Self, Error> {
        let mut reader = Reader::from_str(text);
        let config = reader.config_mut();
        config.trim_text(false);
        config.expand_empty_elements = false;
        config.check_end_names = false;
        config.trim_markup_names_in_closing_tags = false;

        let mut doc = XmlDocument::empty();
        let mut stack = vec![Self::ROOT];

        loop {
            let parent = stack.last().copied().unwrap_or(Self::ROOT);
            match reader.read_event()? {
                Event::Start(e) => {
                    check_attributes(&e)?;
                    let id = doc.push(
                        parent,
                        NodeKind::Element(Element {
                            start: lossy(&e),
                            end: Some(String::new()),
                        }),
                    );
                    stack.push(id);
                }
                Event::End(e) => {
                    if stack.len() == 1 {
                        return Err(quick_xml::Error::IllFormed(IllFormedError::UnmatchedEndTag(
                            lossy(&e),
                        ))
                        .into());
                    }
                    let id = stack.pop().unwrap_or(Self::ROOT);
                    let found = lossy(&e);
                    if let NodeKind::Element(el) = &mut doc.nodes[id.0].kind {
                        // closing names may carry trailing whitespace (`</unit >`)
                        if el.name() != found.trim_end() {
                            return Err(quick_xml::Error::IllFormed(
                                IllFormedError::MismatchedEndTag {
                                    expected: el.name().to_string(),
                                    found,
                                },
                            )
                            .into());
                        }
                        el.end = Some(found);
                    }
                }
                Event::Empty(e) => {
                    check_attributes(&e)?;
                    doc.push(
                        parent,
                        NodeKind::Element(Element {
                            start: lossy(&e),
                            end: None,
                        }),
                    );
                }
                Event::Text(e) => {
                    let raw = lossy(&e);
                    if check_text {
                        unescape(&raw).map_err(quick_xml::Error::from)?;
                    }
                    doc.push(parent, NodeKind::Text(raw));
                }
                Event::CData(e) => {
                    doc.push(parent, NodeKind::CData(lossy(&e)));
                }
                Event::Comment(e) => {
                    doc.push(parent, NodeKind::Comment(lossy(&e)));
                }
                Event::Decl(e) => {
                    doc.push(parent, NodeKind::Decl(lossy(&e)));
                }
                Event::PI(e) => {
                    doc.push(parent, NodeKind::PI(lossy(&e)));
                }
                Event::DocType(e) => {
                    doc.push(parent, NodeKind::DocType(lossy(&e)));
                }
                Event::Eof => break,
            }
        }

        if stack.len() > 1 {
            let open = stack.last().copied().unwrap_or(Self::ROOT);
            let name = doc.name(open).unwrap_or_default().to_string();
            return Err(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(name)).into());
        }

        Ok(doc)
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn alloc(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        id
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Text(_))
    }

    /// Qualified element name, e.g. `xliff` or `xml:space`.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el.name()),
            _ => None,
        }
    }

    /// Element name without namespace prefix.
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id)
            .map(|n| n.rsplit_once(':').map_or(n, |(_, local)| local))
    }

    fn is_named(&self, id: NodeId, local: &str) -> bool {
        self.local_name(id) == Some(local)
    }

    /// The document element.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(Self::ROOT)
            .iter()
            .copied()
            .find(|&c| self.is_element(c))
    }

    pub fn child_element(&self, id: NodeId, local: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.is_named(c, local))
    }

    pub fn child_elements(&self, id: NodeId, local: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_named(c, local))
            .collect()
    }

    /// All descendant elements named `local`, in document order.
    pub fn descendants(&self, id: NodeId, local: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.is_named(node, local) {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn has_child_elements(&self, id: NodeId) -> bool {
        self.children(id).iter().any(|&c| self.is_element(c))
    }

    fn raw_attrs(start: &str) -> Vec<RawAttr> {
        let bytes = start.as_bytes();
        let mut attrs = Vec::new();
        let mut i = bytes
            .iter()
            .position(|b| b.is_ascii_whitespace())
            .unwrap_or(bytes.len());

        loop {
            let ws_start = i;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let name_start = i;
            while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if name_start == i {
                break;
            }
            let name = name_start..i;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if bytes.get(i) != Some(&b'=') {
                break;
            }
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let Some(&quote) = bytes.get(i).filter(|&&q| q == b'"' || q == b'\'') else {
                break;
            };
            let value_start = i + 1;
            let Some(len) = bytes[value_start..].iter().position(|&b| b == quote) else {
                break;
            };
            i = value_start + len + 1;
            attrs.push(RawAttr {
                whole: ws_start..i,
                name,
                value: value_start..value_start + len,
            });
        }
        attrs
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Attribute value (unescaped) by qualified name.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        let el = self.element(id)?;
        Self::raw_attrs(&el.start)
            .into_iter()
            .find(|a| &el.start[a.name.clone()] == name)
            .map(|a| {
                let raw = &el.start[a.value];
                unescape(raw).map_or_else(|_| raw.to_string(), |v| v.into_owned())
            })
    }

    /// Attribute value, empty if absent.
    pub fn attr_or_empty(&self, id: NodeId, name: &str) -> String {
        self.attr(id, name).unwrap_or_default()
    }

    /// Sets an attribute, replacing only its value text when it exists and
    /// appending it after the last attribute otherwise.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let escaped = escape(value);
        let Some(el) = self.element_mut(id) else {
            return;
        };
        let attrs = Self::raw_attrs(&el.start);
        if let Some(a) = attrs.iter().find(|a| &el.start[a.name.clone()] == name) {
            if el.start[a.value.clone()] != *escaped {
                el.start.replace_range(a.value.clone(), &escaped);
            }
            return;
        }
        let at = attrs
            .last()
            .map_or_else(|| el.name().len(), |a| a.whole.end);
        el.start.insert_str(at, &format!(" {name}=\"{escaped}\""));
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        if let Some(a) = Self::raw_attrs(&el.start)
            .into_iter()
            .find(|a| &el.start[a.name.clone()] == name)
        {
            el.start.replace_range(a.whole, "");
        }
    }

    /// Concatenated, unescaped text of the direct text children.
    pub fn text(&self, id: NodeId) -> Result<String, Error> {
        let mut out = String::new();
        for &c in self.children(id) {
            match &self.nodes[c.0].kind {
                NodeKind::Text(raw) => {
                    out.push_str(&unescape(raw).map_err(quick_xml::Error::from)?);
                }
                NodeKind::CData(raw) => out.push_str(raw),
                _ => {}
            }
        }
        Ok(out)
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.remove_children(id);
        if !text.is_empty() {
            self.push(id, NodeKind::Text(partial_escape(text).into_owned()));
        }
    }

    pub fn remove_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for c in children {
            self.nodes[c.0].parent = None;
        }
    }

    /// Raw text of a text node, as it appears in the file.
    pub fn raw_text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(raw) => Some(raw),
            _ => None,
        }
    }

    fn insert_node_after(&mut self, parent: NodeId, after: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind, Some(parent));
        let children = &mut self.nodes[parent.0].children;
        let pos = children
            .iter()
            .position(|&c| c == after)
            .map_or(children.len(), |p| p + 1);
        children.insert(pos, id);
        id
    }

    /// Inserts an empty `<name></name>` element after a sibling.
    pub fn insert_element_after(&mut self, parent: NodeId, after: NodeId, name: &str) -> NodeId {
        self.insert_node_after(
            parent,
            after,
            NodeKind::Element(Element {
                start: name.to_string(),
                end: Some(name.to_string()),
            }),
        )
    }

    /// Inserts a raw (already escaped) text node after a sibling.
    pub fn insert_raw_text_after(&mut self, parent: NodeId, after: NodeId, raw: &str) -> NodeId {
        self.insert_node_after(parent, after, NodeKind::Text(raw.to_string()))
    }

    /// Copies the top-level nodes of `fragment` to the end of `parent`.
    pub fn append_fragment(&mut self, parent: NodeId, fragment: &XmlDocument) {
        for &c in fragment.children(Self::ROOT) {
            self.copy_from(parent, fragment, c);
        }
    }

    fn copy_from(&mut self, parent: NodeId, other: &XmlDocument, node: NodeId) {
        let id = self.push(parent, other.nodes[node.0].kind.clone());
        for &c in other.children(node) {
            self.copy_from(id, other, c);
        }
    }

    /// Serialized markup of a single node.
    pub fn markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialized markup of a node's children.
    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &c in self.children(id) {
            self.write_node(c, &mut out);
        }
        out
    }

    /// Opening tag text exactly as it will be written, e.g. `<g id="1">`.
    pub fn start_tag(&self, id: NodeId) -> String {
        match self.element(id) {
            Some(el) if el.end.is_none() && self.children(id).is_empty() => {
                format!("<{}/>", el.start)
            }
            Some(el) => format!("<{}>", el.start),
            None => String::new(),
        }
    }

    /// Closing tag text, empty for self-closing elements.
    pub fn end_tag(&self, id: NodeId) -> String {
        match self.element(id) {
            Some(el) => match &el.end {
                Some(end) => format!("</{end}>"),
                None if self.children(id).is_empty() => String::new(),
                None => format!("</{}>", el.name()),
            },
            None => String::new(),
        }
    }

    pub fn serialize(&self) -> String {
        self.inner_markup(Self::ROOT)
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Document => {
                for &c in self.children(id) {
                    self.write_node(c, out);
                }
            }
            NodeKind::Element(_) => {
                out.push_str(&self.start_tag(id));
                for &c in self.children(id) {
                    self.write_node(c, out);
                }
                out.push_str(&self.end_tag(id));
            }
            NodeKind::Text(raw) => out.push_str(raw),
            NodeKind::CData(raw) => {
                out.push_str("<![CDATA[");
                out.push_str(raw);
                out.push_str("]]>");
            }
            NodeKind::Comment(raw) => {
                out.push_str("<!--");
                out.push_str(raw);
                out.push_str("-->");
            }
            NodeKind::Decl(raw) | NodeKind::PI(raw) => {
                out.push_str("<?");
                out.push_str(raw);
                out.push_str("?>");
            }
            NodeKind::DocType(raw) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(raw);
                out.push('>');
            }
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn check_attributes(e: &BytesStart<'_>) -> Result<(), Error> {
    for attr in e.attributes() {
        attr.map_err(quick_xml::Error::from)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const SAMPLE: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <!-- generated -->
        <xliff   version="2.0" xmlns="urn:oasis:names:tc:xliff:document:2.0" srcLang='en' trgLang="de">
          <file id="f1">
            <unit id="u1"><segment>
              <source>Hello &amp; <ph id="1"  disp="{name}"/>!</source>
              <target><![CDATA[Hallo]]></target>
            </segment></unit >
          </file>
        </xliff>
    "#};

    #[test]
    fn test_untouched_roundtrip_is_exact() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.serialize(), SAMPLE);
    }

    #[test]
    fn test_navigation_and_attributes() {
        let doc = XmlDocument::parse(SAMPLE).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.name(root), Some("xliff"));
        assert_eq!(doc.attr(root, "srcLang").as_deref(), Some("en"));
        assert_eq!(doc.attr(root, "trgLang").as_deref(), Some("de"));
        assert_eq!(doc.attr(root, "missing"), None);

        let segments = doc.descendants(root, "segment");
        assert_eq!(segments.len(), 1);
        let source = doc.child_element(segments[0], "source").unwrap();
        assert!(doc.has_child_elements(source));
        assert_eq!(doc.text(source).unwrap(), "Hello & !");

        let target = doc.child_element(segments[0], "target").unwrap();
        assert_eq!(doc.text(target).unwrap(), "Hallo");
    }

    #[test]
    fn test_set_attr_splices_into_original_tag() {
        let mut doc = XmlDocument::parse(SAMPLE).unwrap();
        let root = doc.root_element().unwrap();
        doc.set_attr(root, "trgLang", "fr");
        let out = doc.serialize();
        assert!(out.contains(
            r#"<xliff   version="2.0" xmlns="urn:oasis:names:tc:xliff:document:2.0" srcLang='en' trgLang="fr">"#
        ));
        assert_eq!(out.replace("trgLang=\"fr\"", "trgLang=\"de\""), SAMPLE);
    }

    #[test]
    fn test_add_and_remove_attr() {
        let mut doc = XmlDocument::parse(r#"<a x="1"><b/></a>"#).unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.child_element(a, "b").unwrap();
        doc.set_attr(b, "state", "a<b");
        doc.set_attr(a, "y", "2");
        doc.remove_attr(a, "x");
        assert_eq!(doc.serialize(), r#"<a y="2"><b state="a&lt;b"/></a>"#);
    }

    #[test]
    fn test_empty_element_gains_children() {
        let mut doc = XmlDocument::parse("<unit><target/></unit>").unwrap();
        let unit = doc.root_element().unwrap();
        let target = doc.child_element(unit, "target").unwrap();
        doc.set_text(target, "a & b");
        assert_eq!(doc.serialize(), "<unit><target>a &amp; b</target></unit>");
    }

    #[test]
    fn test_insert_after_and_fragment() {
        let mut doc = XmlDocument::parse("<u>\n  <source>x</source>\n</u>").unwrap();
        let unit = doc.root_element().unwrap();
        let source = doc.child_element(unit, "source").unwrap();
        let target = doc.insert_element_after(unit, source, "target");
        doc.insert_raw_text_after(unit, source, "\n  ");
        let fragment = XmlDocument::parse_fragment(r#"y <g id="1">z</g>"#).unwrap();
        doc.append_fragment(target, &fragment);
        assert_eq!(
            doc.serialize(),
            "<u>\n  <source>x</source>\n  <target>y <g id=\"1\">z</g></target>\n</u>"
        );
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
        assert!(XmlDocument::parse("<a>").is_err());
        assert!(XmlDocument::parse("<a></a></b>").is_err());
        assert!(XmlDocument::parse(r#"<a x="1" x="2"/>"#).is_err());
        assert!(XmlDocument::parse_fragment("a & b").is_err());
        assert!(XmlDocument::parse_fragment("a &amp; b").is_ok());
    }

    #[test]
    fn test_start_and_end_tags() {
        let doc = XmlDocument::parse(r#"<g id="1" >x</g ><x id="2" />"#).unwrap();
        let g = doc.children(XmlDocument::ROOT)[0];
        let x = doc.children(XmlDocument::ROOT)[1];
        assert_eq!(doc.start_tag(g), r#"<g id="1" >"#);
        assert_eq!(doc.end_tag(g), "</g >");
        assert_eq!(doc.start_tag(x), r#"<x id="2" />"#);
        assert_eq!(doc.end_tag(x), "");
    }
}
