//! The gettext header entry (`msgid ""`).

use lazy_static::lazy_static;
use regex::Regex;

use crate::{language::Language, plural_forms::default_plural_forms};

lazy_static! {
    static ref CHARSET_REGEX: Regex = Regex::new(r"charset=([^\s;]+)").unwrap();
}

pub(crate) const TEMPLATE_PROJECT: &str = "PACKAGE VERSION";
pub(crate) const TEMPLATE_TEAM: &str = "LANGUAGE <LL@li.org>";
pub(crate) const TEMPLATE_TRANSLATOR: &str = "FULL NAME <EMAIL@ADDRESS>";
pub(crate) const TEMPLATE_PLURAL_FORMS: &str = "nplurals=INTEGER; plural=EXPRESSION;";

/// Ordered `Key: value` pairs of a PO header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoHeader {
    fields: Vec<(String, String)>,
}

impl PoHeader {
    /// Parses the header's msgstr.
    pub fn parse(msgstr: &str) -> Self {
        let fields = msgstr
            .split('\n')
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
            })
            .collect();
        PoHeader { fields }
    }

    /// Header of a freshly created catalog.
    pub fn standard(language: Option<&Language>, now: &str) -> Self {
        let mut header = PoHeader::default();
        header.set("Project-Id-Version", "");
        header.set("POT-Creation-Date", now);
        header.set("PO-Revision-Date", now);
        header.set("Last-Translator", "");
        header.set("Language-Team", "");
        header.set("Language", &language.map(Language::code).unwrap_or_default());
        header.set("MIME-Version", "1.0");
        header.set("Content-Type", "text/plain; charset=UTF-8");
        header.set("Content-Transfer-Encoding", "8bit");
        if let Some(pf) = language.and_then(default_plural_forms) {
            header.set("Plural-Forms", pf);
        }
        header
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets a field, keeping its position when it already exists.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.fields.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.fields.retain(|(k, _)| k != key);
    }

    /// Serializes back into a msgstr value.
    pub fn to_msgstr(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}: {v}\n"))
            .collect()
    }

    /// Declared charset; `CHARSET` (template placeholder) reads as ISO-8859-1.
    pub fn charset(&self) -> Option<String> {
        let content_type = self.get("Content-Type")?;
        let charset = CHARSET_REGEX.captures(content_type)?[1].to_string();
        if charset == "CHARSET" {
            Some("ISO-8859-1".to_string())
        } else {
            Some(charset)
        }
    }

    pub fn set_charset(&mut self, charset: &str) {
        let content_type = match self.get("Content-Type") {
            Some(ct) if CHARSET_REGEX.is_match(ct) => CHARSET_REGEX
                .replace(ct, format!("charset={charset}").as_str())
                .into_owned(),
            _ => format!("text/plain; charset={charset}"),
        };
        self.set("Content-Type", &content_type);
    }

    pub fn language(&self) -> Option<Language> {
        self.get("Language").and_then(Language::try_parse)
    }

    /// Language of the msgids, from `X-Source-Language` or
    /// `X-Loco-Source-Locale`.
    pub fn source_language(&self) -> Option<Language> {
        self.get("X-Source-Language")
            .filter(|s| !s.is_empty())
            .or_else(|| self.get("X-Loco-Source-Locale"))
            .and_then(Language::try_parse)
    }

    pub fn plural_forms(&self) -> Option<&str> {
        self.get("Plural-Forms").filter(|s| !s.trim().is_empty())
    }

    /// Cleans up values left over from `xgettext` templates. Returns true if
    /// anything changed.
    pub fn fix_common_issues(&mut self, language: Option<&Language>, has_plurals: bool) -> bool {
        let before = self.clone();

        if self.get("Project-Id-Version") == Some(TEMPLATE_PROJECT) {
            self.set("Project-Id-Version", "");
        }
        if self.get("Language-Team") == Some(TEMPLATE_TEAM) {
            self.remove("Language-Team");
        }
        if self.get("Last-Translator") == Some(TEMPLATE_TRANSLATOR) {
            self.remove("Last-Translator");
        }

        let mut plural_forms = self.get("Plural-Forms").unwrap_or_default().to_string();
        if plural_forms == TEMPLATE_PLURAL_FORMS {
            self.remove("Plural-Forms");
            plural_forms.clear();
        }

        if !plural_forms.is_empty() {
            if !plural_forms.trim_end().ends_with(';') {
                self.set("Plural-Forms", &format!("{};", plural_forms.trim_end()));
            }
        } else if has_plurals {
            if let Some(pf) = language.and_then(default_plural_forms) {
                self.set("Plural-Forms", pf);
            }
        }

        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Project-Id-Version: PACKAGE VERSION\n\
        Language-Team: LANGUAGE <LL@li.org>\n\
        Last-Translator: FULL NAME <EMAIL@ADDRESS>\n\
        Language: cs\n\
        Content-Type: text/plain; charset=CHARSET\n\
        Plural-Forms: nplurals=INTEGER; plural=EXPRESSION;\n";

    #[test]
    fn test_parse_and_serialize() {
        let header = PoHeader::parse("Language: de\nX-Generator: Poedit 3.4\n");
        assert_eq!(header.get("Language"), Some("de"));
        assert_eq!(header.get("X-Generator"), Some("Poedit 3.4"));
        assert_eq!(
            header.to_msgstr(),
            "Language: de\nX-Generator: Poedit 3.4\n"
        );
    }

    #[test]
    fn test_charset() {
        let mut header = PoHeader::parse(HEADER);
        assert_eq!(header.charset().as_deref(), Some("ISO-8859-1"));
        header.set_charset("UTF-8");
        assert_eq!(header.get("Content-Type"), Some("text/plain; charset=UTF-8"));
        assert_eq!(PoHeader::default().charset(), None);
    }

    #[test]
    fn test_fix_common_issues() {
        let mut header = PoHeader::parse(HEADER);
        let cs = Language::try_parse("cs").unwrap();
        assert!(header.fix_common_issues(Some(&cs), true));
        assert_eq!(header.get("Project-Id-Version"), Some(""));
        assert_eq!(header.get("Language-Team"), None);
        assert_eq!(header.get("Last-Translator"), None);
        assert_eq!(
            header.plural_forms(),
            Some("nplurals=3; plural=(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2;")
        );
        assert!(!header.fix_common_issues(Some(&cs), true));
    }

    #[test]
    fn test_fix_missing_semicolon() {
        let mut header = PoHeader::parse("Plural-Forms: nplurals=2; plural=(n != 1)\n");
        assert!(header.fix_common_issues(None, false));
        assert_eq!(header.plural_forms(), Some("nplurals=2; plural=(n != 1);"));
    }

    #[test]
    fn test_clean_header_is_unchanged() {
        let mut header = PoHeader::parse(
            "Project-Id-Version: app 1.0\nLanguage: de\nPlural-Forms: nplurals=2; plural=(n != 1);\n",
        );
        let de = header.language();
        assert!(!header.fix_common_issues(de.as_ref(), true));
    }

    #[test]
    fn test_standard_header() {
        let fr = Language::try_parse("fr").unwrap();
        let header = PoHeader::standard(Some(&fr), "2024-01-01 00:00+0000");
        assert_eq!(header.get("Language"), Some("fr"));
        assert_eq!(header.charset().as_deref(), Some("UTF-8"));
        assert_eq!(header.plural_forms(), Some("nplurals=2; plural=(n > 1);"));
    }

    #[test]
    fn test_source_language() {
        let header = PoHeader::parse("X-Loco-Source-Locale: de_DE\n");
        assert_eq!(header.source_language().unwrap().code(), "de_DE");
    }
}
