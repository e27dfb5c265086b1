//! Inline markup placeholders.
//!
//! Source text containing inline elements (`<x>`/`<g>` in XLIFF 1.x,
//! `<ph>`/`<pc>` in XLIFF 2.0) is shown to translators with each element
//! replaced by a short token such as `{name}` or `<g>`. The token/markup pairs
//! are kept in [`XliffStringMetadata`] and used to put the markup back when a
//! translation is written.

use std::collections::{HashMap, HashSet};

use crate::{
    error::Error,
    formats::xliff::dom::{NodeId, XmlDocument},
};

/// Which XLIFF inline element vocabulary to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupDialect {
    Xliff1,
    Xliff2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Single,
    Group,
}

impl MarkupDialect {
    fn classify(self, doc: &XmlDocument, node: NodeId) -> Option<Kind> {
        let kind = match (self, doc.local_name(node)?) {
            (MarkupDialect::Xliff1, "x") | (MarkupDialect::Xliff2, "ph") => Kind::Single,
            (MarkupDialect::Xliff1, "g") | (MarkupDialect::Xliff2, "pc") => Kind::Group,
            _ => return None,
        };
        // `<g id="1"/>` carries no content to wrap
        if kind == Kind::Group && doc.children(node).is_empty() {
            return Some(Kind::Single);
        }
        Some(kind)
    }

    fn display(self, doc: &XmlDocument, node: NodeId) -> String {
        match self {
            MarkupDialect::Xliff1 => doc.attr_or_empty(node, "equiv-text"),
            MarkupDialect::Xliff2 => doc
                .attr(node, "disp")
                .unwrap_or_else(|| doc.attr_or_empty(node, "equiv")),
        }
    }
}

/// One placeholder token and the markup it stands for.
#[derive(Debug, PartialEq, Eq)]
pub struct Substitution {
    pub placeholder: String,
    pub markup: String,
}

/// Markup extraction result for one item, owned by that item (not `Clone`).
#[derive(Debug, PartialEq, Eq)]
pub struct XliffStringMetadata {
    plain_text: bool,
    substitutions: Vec<Substitution>,
}

/// Translation content ready to be put into a `target` element.
#[derive(Debug)]
pub(crate) enum TargetContent {
    Plain(String),
    Markup(XmlDocument),
}

impl XliffStringMetadata {
    pub fn plain() -> Self {
        XliffStringMetadata {
            plain_text: true,
            substitutions: Vec::new(),
        }
    }

    pub fn is_plain_text(&self) -> bool {
        self.plain_text
    }

    /// Token/markup pairs in the order the tokens first appear in the text.
    pub fn substitutions(&self) -> &[Substitution] {
        &self.substitutions
    }

    /// Replaces tokens by their markup, scanning left to right and preferring
    /// the longest token at each position.
    pub fn restore(&self, text: &str) -> String {
        restore_with(&self.substitutions, text)
    }

    /// Editable text of an element (typically `target`) under this metadata.
    pub(crate) fn display_text(
        &self,
        doc: &XmlDocument,
        node: NodeId,
        dialect: MarkupDialect,
    ) -> Result<String, Error> {
        if self.plain_text {
            return doc.text(node);
        }

        let lookup = |markup: &str| {
            self.substitutions
                .iter()
                .find(|s| s.markup == markup)
                .map(|s| s.placeholder.clone())
        };

        let mut tokens = HashMap::new();
        for el in all_elements(doc, node) {
            match dialect.classify(doc, el) {
                Some(Kind::Single) => {
                    if let Some(token) = lookup(&doc.markup(el)) {
                        tokens.insert(el, Token::Single(token));
                    }
                }
                Some(Kind::Group) => {
                    let open = lookup(&doc.start_tag(el));
                    let close = lookup(&doc.end_tag(el));
                    if open.is_some() || close.is_some() {
                        tokens.insert(el, Token::Group(open, close));
                    }
                }
                None => {}
            }
        }

        let mut out = String::new();
        render(doc, node, &tokens, &mut out);
        Ok(out)
    }

    /// Converts edited text back into target content without touching any
    /// document. Fails when restored markup is not well-formed.
    pub(crate) fn prepare_target(&self, text: &str) -> Result<TargetContent, String> {
        if self.plain_text {
            return Ok(TargetContent::Plain(text.to_string()));
        }
        let markup = self.restore(text);
        XmlDocument::parse_fragment(&markup)
            .map(TargetContent::Markup)
            .map_err(|e| e.to_string())
    }
}

fn restore_with(substitutions: &[Substitution], text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        let best = substitutions
            .iter()
            .filter(|s| !s.placeholder.is_empty() && rest.starts_with(&s.placeholder))
            .max_by_key(|s| s.placeholder.len());
        match best {
            Some(s) => {
                out.push_str(&s.markup);
                rest = &rest[s.placeholder.len()..];
            }
            None => {
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    out
}

/// Replacement text per placeholder element.
enum Token {
    Single(String),
    Group(Option<String>, Option<String>),
}

type TokenMap = HashMap<NodeId, Token>;

fn render(doc: &XmlDocument, node: NodeId, tokens: &TokenMap, out: &mut String) {
    for &c in doc.children(node) {
        if !doc.is_element(c) {
            out.push_str(&doc.markup(c));
            continue;
        }
        match tokens.get(&c) {
            Some(Token::Single(token)) => out.push_str(token),
            Some(Token::Group(open, close)) => {
                match open {
                    Some(token) => out.push_str(token),
                    None => out.push_str(&doc.start_tag(c)),
                }
                render(doc, c, tokens, out);
                match close {
                    Some(token) => out.push_str(token),
                    None => out.push_str(&doc.end_tag(c)),
                }
            }
            None => {
                out.push_str(&doc.start_tag(c));
                render(doc, c, tokens, out);
                out.push_str(&doc.end_tag(c));
            }
        }
    }
}

fn all_elements(doc: &XmlDocument, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = doc.children(node).iter().rev().copied().collect();
    while let Some(n) = stack.pop() {
        if doc.is_element(n) {
            out.push(n);
            stack.extend(doc.children(n).iter().rev().copied());
        }
    }
    out
}

/// Wraps a display string as `{name}` unless it already looks like a token.
fn prettify(s: &str) -> String {
    let (Some(f), Some(b)) = (s.chars().next(), s.chars().last()) else {
        return "{}".to_string();
    };
    if (f == '{' && b == '}') || (f == '%' && b == '%') || (f == '<' && b == '>') {
        s.to_string()
    } else {
        format!("{{{s}}}")
    }
}

struct Candidate {
    kind: Kind,
    id: String,
    display: String,
    id_based: bool,
    open_markup: String,
    close_markup: String,
    stem: String,
    open: String,
    close: String,
}

impl Candidate {
    fn tokens(&self) -> Token {
        match self.kind {
            Kind::Single => Token::Single(self.open.clone()),
            Kind::Group => Token::Group(Some(self.open.clone()), Some(self.close.clone())),
        }
    }

    /// Same shape as [`Candidate::tokens`] with every token set to `text`.
    fn tokens_or(&self, text: String) -> Token {
        match self.kind {
            Kind::Single => Token::Single(text),
            Kind::Group => Token::Group(Some(text.clone()), Some(text)),
        }
    }

    fn assign_tokens(&mut self) {
        match self.kind {
            Kind::Single => {
                self.open = if self.id_based {
                    prettify(&self.id)
                } else {
                    self.display.clone()
                };
            }
            Kind::Group => self.assign_group_tokens(),
        }
    }

    fn assign_group_tokens(&mut self) {
        self.open = if self.id_based {
            format!("<{} id=\"{}\">", self.stem, self.id)
        } else {
            format!("<{}>", self.stem)
        };
        self.close = format!("</{}>", self.stem);
    }

    /// Makes the token longer until it no longer occurs in `text`.
    fn escalate_against(&mut self, text: &str) {
        match self.kind {
            Kind::Single => {
                while text.contains(&self.open) {
                    self.escalate();
                }
            }
            Kind::Group => {
                while text.contains(&self.open) || text.contains(&self.close) {
                    self.escalate();
                }
            }
        }
    }

    fn escalate(&mut self) {
        match self.kind {
            Kind::Single => {
                let f = self.open.chars().next().unwrap_or('{');
                let b = self.open.chars().last().unwrap_or('}');
                self.open = format!("{f}{}{b}", self.open);
            }
            Kind::Group => {
                let first = self.stem.chars().next().unwrap_or('g');
                self.stem.insert(0, first);
                self.assign_group_tokens();
            }
        }
    }
}

/// Extracts the editable text of `node` (typically `source`) together with
/// the placeholder metadata needed to restore it.
pub(crate) fn extract(
    doc: &XmlDocument,
    node: NodeId,
    dialect: MarkupDialect,
) -> Result<(String, XliffStringMetadata), Error> {
    if !doc.has_child_elements(node) {
        return Ok((doc.text(node)?, XliffStringMetadata::plain()));
    }

    let original = doc.inner_markup(node);
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut owner: HashMap<NodeId, usize> = HashMap::new();
    let mut by_markup: HashMap<String, usize> = HashMap::new();
    let mut by_display: HashMap<String, usize> = HashMap::new();
    let mut collided: HashSet<String> = HashSet::new();

    for el in all_elements(doc, node) {
        let Some(kind) = dialect.classify(doc, el) else {
            continue;
        };
        let id = doc.attr_or_empty(el, "id");
        if id.is_empty() {
            continue;
        }

        let whole = doc.markup(el);
        if let Some(&existing) = by_markup.get(&whole) {
            owner.insert(el, existing);
            continue;
        }

        let (display, open_markup, close_markup) = match kind {
            Kind::Single => {
                let mut display = dialect.display(doc, el);
                if display.trim().is_empty() {
                    display = id.clone();
                }
                (prettify(&display), whole.clone(), String::new())
            }
            Kind::Group => ("<g>".to_string(), doc.start_tag(el), doc.end_tag(el)),
        };

        let index = candidates.len();
        let mut id_based = collided.contains(&display);
        if let Some(&previous) = by_display.get(&display) {
            candidates[previous].id_based = true;
            collided.insert(display.clone());
            id_based = true;
        }
        by_display.entry(display.clone()).or_insert(index);
        by_markup.insert(whole, index);
        owner.insert(el, index);

        candidates.push(Candidate {
            kind,
            id,
            display,
            id_based,
            open_markup,
            close_markup,
            stem: "g".to_string(),
            open: String::new(),
            close: String::new(),
        });
    }

    if candidates.is_empty() {
        // only foreign elements: still edited as raw markup
        return Ok((
            original,
            XliffStringMetadata {
                plain_text: false,
                substitutions: Vec::new(),
            },
        ));
    }

    for c in &mut candidates {
        c.assign_tokens();
    }

    let text_only = {
        let empty: TokenMap = owner
            .iter()
            .map(|(&el, &i)| (el, candidates[i].tokens_or(String::new())))
            .collect();
        let mut out = String::new();
        render(doc, node, &empty, &mut out);
        out
    };

    for c in &mut candidates {
        c.escalate_against(&text_only);
    }

    let mut attempt = 0;
    loop {
        let tokens: TokenMap = owner
            .iter()
            .map(|(&el, &i)| (el, candidates[i].tokens()))
            .collect();
        let mut display = String::new();
        render(doc, node, &tokens, &mut display);

        let substitutions = build_substitutions(&candidates, &display);
        if restore_with(&substitutions, &display) == original || attempt >= 8 {
            return Ok((
                display,
                XliffStringMetadata {
                    plain_text: false,
                    substitutions,
                },
            ));
        }

        // Tokens are ambiguous; number them and try again.
        attempt += 1;
        for (n, c) in candidates.iter_mut().enumerate() {
            if attempt == 1 {
                match c.kind {
                    Kind::Single => c.open = format!("{{{}}}", n + 1),
                    Kind::Group => {
                        c.stem = format!("g{}", n + 1);
                        c.id_based = false;
                        c.assign_group_tokens();
                    }
                }
                c.escalate_against(&text_only);
            } else {
                c.escalate();
            }
        }
    }
}

/// Substitution pairs ordered by first token occurrence in `display`, with
/// identical pairs merged.
fn build_substitutions(candidates: &[Candidate], display: &str) -> Vec<Substitution> {
    let mut pairs: Vec<(usize, Substitution)> = Vec::new();
    let mut push = |placeholder: &str, markup: &str| {
        if pairs
            .iter()
            .any(|(_, s)| s.placeholder == placeholder && s.markup == markup)
        {
            return;
        }
        let pos = display.find(placeholder).unwrap_or(usize::MAX);
        pairs.push((
            pos,
            Substitution {
                placeholder: placeholder.to_string(),
                markup: markup.to_string(),
            },
        ));
    };

    for c in candidates {
        push(&c.open, &c.open_markup);
        if c.kind == Kind::Group {
            push(&c.close, &c.close_markup);
        }
    }

    pairs.sort_by_key(|(pos, _)| *pos);
    pairs.into_iter().map(|(_, s)| s).collect()
}
