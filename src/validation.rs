//! Consistency checks over a loaded catalog.
//!
//! Validation never mutates the catalog and never fails: every problem is a
//! [`Diagnostic`] in the returned [`ValidationResults`], and callers decide
//! what to surface based on [`Severity`].

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
};

use tracing::debug;

use crate::{
    catalog::Catalog,
    formats::Capability,
    item::{CatalogItem, ItemId},
    placeholder::{self, FormatGrammar},
    plural_forms::{PluralForms, default_nplurals},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// What a [`Diagnostic`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// printf directives of a translation don't match its source.
    PlaceholderMismatch,
    /// A translation's markup placeholders can't be restored.
    BrokenMarkup,
    /// Wrong number of plural translations.
    PluralCount,
    MissingLanguage,
    /// `Plural-Forms` missing, malformed or out of bounds.
    PluralForms,
    MissingCharset,
    /// Two entries with the same context and source.
    DuplicateItem,
    /// A recoverable problem found while reading the file.
    LoadWarning,
    UnsavedChanges,
    /// Translation edited but still marked as needing review.
    FuzzyAfterEdit,
    /// Reported by an external gettext tool.
    ExternalTool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Item the diagnostic is about; `None` for catalog-level problems.
    pub item: Option<ItemId>,
    /// Line in the file, when known.
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn catalog(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            kind,
            item: None,
            line: None,
            message: message.into(),
        }
    }

    pub(crate) fn item(
        severity: Severity,
        kind: DiagnosticKind,
        item: &CatalogItem,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity,
            kind,
            item: Some(item.id()),
            line: item.line(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.line {
            Some(line) => write!(f, "line {line}: {severity}: {}", self.message),
            None => write!(f, "{severity}: {}", self.message),
        }
    }
}

/// Diagnostics in the order the checks produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResults {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn errors(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warnings(&self) -> usize {
        self.len() - self.errors()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics attached to one item.
    pub fn for_item(&self, id: ItemId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.item == Some(id))
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Drops warning-level diagnostics.
    pub fn retain_errors(&mut self) {
        self.diagnostics.retain(Diagnostic::is_error);
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl Extend<Diagnostic> for ValidationResults {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.diagnostics.extend(iter);
    }
}

impl IntoIterator for ValidationResults {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

/// Grammar used to check `item`, or `None` when its strings use a format
/// language other than printf.
fn grammar_for(item: &CatalogItem) -> Option<FormatGrammar> {
    if item.has_flag("c-format") || item.has_flag("objc-format") {
        return Some(FormatGrammar::Full);
    }
    if item.flags().iter().any(|f| f.ends_with("-format")) {
        return None;
    }
    Some(FormatGrammar::Common)
}

/// Runs the catalog checks.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    just_loaded: bool,
}

impl Validator {
    /// `just_loaded` suppresses the checks that only make sense after the
    /// catalog was edited and reports problems found while reading instead.
    pub fn new(just_loaded: bool) -> Self {
        Validator { just_loaded }
    }

    pub fn validate(&self, catalog: &Catalog) -> ValidationResults {
        let mut results = ValidationResults::new();
        if !catalog.has_capability(Capability::Translations) {
            return results;
        }

        self.check_placeholders(catalog, &mut results);
        self.check_plural_counts(catalog, &mut results);
        self.check_completeness(catalog, &mut results);
        if self.just_loaded {
            for warning in catalog.load_warnings() {
                results.push(Diagnostic::catalog(
                    Severity::Warning,
                    DiagnosticKind::LoadWarning,
                    warning.as_str(),
                ));
            }
        } else {
            self.check_edits(catalog, &mut results);
        }

        debug!(
            errors = results.errors(),
            warnings = results.warnings(),
            just_loaded = self.just_loaded,
            "validated catalog"
        );
        results
    }

    fn check_placeholders(&self, catalog: &Catalog, results: &mut ValidationResults) {
        for item in catalog.items().iter().filter(|i| i.is_translated()) {
            if let Some(grammar) = grammar_for(item) {
                for (form, translation) in item.translations().iter().enumerate() {
                    if translation.is_empty() {
                        continue;
                    }
                    let (source, allow_omitted) = match item.plural_source() {
                        Some(plural) if form > 0 => (plural, true),
                        Some(_) => (item.source(), true),
                        None => (item.source(), false),
                    };
                    let Some(problem) = placeholder::compare(source, translation, grammar, allow_omitted) else {
                        continue;
                    };
                    let message = if item.has_plural() {
                        format!("plural form {form}: {problem}")
                    } else {
                        problem
                    };
                    results.push(Diagnostic::item(
                        Severity::Error,
                        DiagnosticKind::PlaceholderMismatch,
                        item,
                        message,
                    ));
                    break;
                }
            }

            if let Some(metadata) = item.xliff_metadata() {
                if let Err(reason) = metadata.prepare_target(item.translation()) {
                    results.push(Diagnostic::item(
                        Severity::Error,
                        DiagnosticKind::BrokenMarkup,
                        item,
                        reason,
                    ));
                }
            }
        }
    }

    fn check_plural_counts(&self, catalog: &Catalog, results: &mut ValidationResults) {
        let nplurals = catalog
            .header()
            .and_then(|h| h.plural_forms())
            .and_then(|pf| PluralForms::parse(pf).ok())
            .map(|pf| pf.nplurals)
            .or_else(|| catalog.language().as_ref().and_then(default_nplurals));
        let Some(nplurals) = nplurals else {
            return;
        };

        for item in catalog.items() {
            if !item.has_plural() || !item.is_translated() {
                continue;
            }
            let count = item.translations().len();
            if count != nplurals {
                results.push(Diagnostic::item(
                    Severity::Error,
                    DiagnosticKind::PluralCount,
                    item,
                    format!("expected {nplurals} plural forms, found {count}"),
                ));
            }
        }
    }

    fn check_completeness(&self, catalog: &Catalog, results: &mut ValidationResults) {
        if catalog.language().is_none() {
            results.push(Diagnostic::catalog(
                Severity::Warning,
                DiagnosticKind::MissingLanguage,
                "the catalog’s language is not set",
            ));
        }

        if let Some(header) = catalog.header() {
            match header.plural_forms() {
                None if catalog.items().iter().any(CatalogItem::has_plural) => {
                    results.push(Diagnostic::catalog(
                        Severity::Warning,
                        DiagnosticKind::PluralForms,
                        "the catalog has plural entries but no Plural-Forms header",
                    ));
                }
                None => {}
                Some(value) => {
                    let checked = PluralForms::parse(value)
                        .map_err(|e| e.to_string())
                        .and_then(|pf| pf.check_bounds());
                    if let Err(reason) = checked {
                        results.push(Diagnostic::catalog(
                            Severity::Error,
                            DiagnosticKind::PluralForms,
                            format!("invalid Plural-Forms header: {reason}"),
                        ));
                    }
                }
            }

            let placeholder_charset = header
                .get("Content-Type")
                .is_some_and(|ct| ct.contains("charset=CHARSET"));
            if header.charset().is_none() || placeholder_charset {
                results.push(Diagnostic::catalog(
                    Severity::Warning,
                    DiagnosticKind::MissingCharset,
                    "the catalog doesn’t declare its charset",
                ));
            }
        }

        let mut seen: HashMap<(Option<&str>, &str), ItemId> = HashMap::new();
        for item in catalog.items() {
            let key = (item.context(), item.source());
            match seen.get(&key) {
                Some(first) => results.push(Diagnostic::item(
                    Severity::Error,
                    DiagnosticKind::DuplicateItem,
                    item,
                    format!("duplicate of item {first}"),
                )),
                None => {
                    seen.insert(key, item.id());
                }
            }
        }
    }

    fn check_edits(&self, catalog: &Catalog, results: &mut ValidationResults) {
        if catalog.is_modified() {
            results.push(Diagnostic::catalog(
                Severity::Warning,
                DiagnosticKind::UnsavedChanges,
                "the catalog has unsaved changes",
            ));
        }
        for item in catalog.items() {
            if item.is_modified() && item.is_fuzzy() && item.is_translated() {
                results.push(Diagnostic::item(
                    Severity::Warning,
                    DiagnosticKind::FuzzyAfterEdit,
                    item,
                    "the translation was edited but is still marked as needing work",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn load_po(text: &str) -> Catalog {
        Catalog::from_bytes(text.as_bytes(), "cs.po").unwrap()
    }

    const CZECH: &str = indoc! {r#"
        msgid ""
        msgstr ""
        "Language: cs\n"
        "Content-Type: text/plain; charset=UTF-8\n"
        "Plural-Forms: nplurals=3; plural=(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2;\n"

        #: main.c:3
        #, c-format
        msgid "%d of %s"
        msgstr "%d z %d"

        msgid "%d file"
        msgid_plural "%d files"
        msgstr[0] "%d soubor"
        msgstr[1] "%d soubory"

        msgid "50% off"
        msgstr "sleva 50 %"

        #, python-format
        msgid "%(name)s"
        msgstr "%s"
    "#};

    #[test]
    fn test_placeholder_and_plural_diagnostics() {
        let catalog = load_po(CZECH);
        let results = catalog.validate(true);

        let mismatches: Vec<_> = results.of_kind(DiagnosticKind::PlaceholderMismatch).collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].item, Some(ItemId(1)));
        assert_eq!(mismatches[0].line, Some(7));
        assert!(mismatches[0].message.contains("argument 1"));

        let plurals: Vec<_> = results.of_kind(DiagnosticKind::PluralCount).collect();
        assert_eq!(plurals.len(), 1);
        assert_eq!(plurals[0].item, Some(ItemId(2)));
        assert_eq!(plurals[0].message, "expected 3 plural forms, found 2");

        assert_eq!(results.errors(), 2);
        assert_eq!(results.warnings(), 0);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let catalog = load_po(CZECH);
        assert_eq!(catalog.validate(true), catalog.validate(true));
    }

    #[test]
    fn test_header_completeness() {
        let catalog = Catalog::from_bytes_with(
            indoc! {br#"
                msgid ""
                msgstr ""
                "Plural-Forms: nplurals=2; plural=n>5 ? 2 : 0;\n"

                msgid "a"
                msgstr "b"

                msgctxt "menu"
                msgid "a"
                msgstr "c"

                msgid "a"
                msgstr "d"
            "#},
            "messages.po",
            &crate::options::OpenOptions::new().with_fix_common_issues(false),
        )
        .unwrap();
        let results = catalog.validate(true);
        let kinds: Vec<_> = results.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                DiagnosticKind::MissingLanguage,
                DiagnosticKind::PluralForms,
                DiagnosticKind::MissingCharset,
                DiagnosticKind::DuplicateItem,
            ]
        );
        let duplicate = results.of_kind(DiagnosticKind::DuplicateItem).next().unwrap();
        assert_eq!(duplicate.item, Some(ItemId(3)));
        assert_eq!(duplicate.message, "duplicate of item 1");
    }

    #[test]
    fn test_edit_checks_only_after_load() {
        let mut catalog = load_po(CZECH);
        let item = catalog.item_mut(ItemId(3)).unwrap();
        item.set_translation("sleva 50 % dnes");
        item.set_fuzzy(true);

        assert!(catalog.validate(true).of_kind(DiagnosticKind::UnsavedChanges).next().is_none());
        let results = catalog.validate(false);
        assert_eq!(results.of_kind(DiagnosticKind::UnsavedChanges).count(), 1);
        let fuzzy: Vec<_> = results.for_item(ItemId(3)).collect();
        assert_eq!(fuzzy.len(), 1);
        assert_eq!(fuzzy[0].kind, DiagnosticKind::FuzzyAfterEdit);
    }

    #[test]
    fn test_load_warnings_only_when_just_loaded() {
        let mut bytes = b"msgid \"\"\nmsgstr \"Language: de\\nContent-Type: text/plain; charset=UTF-8\\n\"\n\nmsgid \"a\"\nmsgstr \"".to_vec();
        bytes.extend_from_slice(b"\xff\"\n");
        let catalog = Catalog::from_bytes(&bytes, "de.po").unwrap();
        assert_eq!(catalog.validate(true).of_kind(DiagnosticKind::LoadWarning).count(), 1);
        assert_eq!(catalog.validate(false).of_kind(DiagnosticKind::LoadWarning).count(), 0);
    }

    #[test]
    fn test_template_has_no_diagnostics() {
        let catalog = Catalog::from_bytes(b"msgid \"%s\"\nmsgstr \"\"\n\nmsgid \"%s\"\nmsgstr \"\"\n", "app.pot").unwrap();
        assert!(catalog.validate(true).is_empty());
    }

    #[test]
    fn test_retain_errors() {
        let mut results = ValidationResults::new();
        results.push(Diagnostic::catalog(Severity::Warning, DiagnosticKind::MissingLanguage, "w"));
        results.push(Diagnostic::catalog(Severity::Error, DiagnosticKind::PluralForms, "e"));
        results.retain_errors();
        assert_eq!(results.len(), 1);
        assert_eq!(results.as_slice()[0].to_string(), "error: e");
    }
}
