//! Language identifiers as used by translation catalogs.
//!
//! Gettext files spell languages as POSIX-ish codes (`pt_BR`, `sr@latin`),
//! XLIFF uses BCP-47 tags (`pt-BR`). [`Language`] accepts both and can render
//! either form.

use std::{fmt::Display, path::Path};

use unic_langid::LanguageIdentifier;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    id: LanguageIdentifier,
    modifier: Option<String>,
}

impl Language {
    /// Parses a language code or tag, returning `None` for anything that is
    /// not a usable language (empty, `und`, malformed).
    pub fn try_parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let (base, modifier) = match s.split_once('@') {
            Some((base, modifier)) if !modifier.is_empty() => (base, Some(modifier.to_string())),
            Some((base, _)) => (base, None),
            None => (s, None),
        };

        // Drop encoding suffixes such as `de_DE.UTF-8`
        let base = base.split('.').next().unwrap_or(base);
        let normalized = base.replace('_', "-");
        let id: LanguageIdentifier = normalized.parse().ok()?;

        let lang = id.language.as_str();
        if id.language.is_empty() || lang == "und" || lang.len() > 3 {
            return None;
        }

        Some(Language { id, modifier })
    }

    /// Guesses the language from a file name such as `de.po`, `pt_BR.po` or
    /// `messages-fr.xlf`.
    pub fn try_guess_from_filename<P: AsRef<Path>>(path: P) -> Option<Self> {
        let stem = path.as_ref().file_stem()?.to_str()?;
        if let Some(lang) = Self::try_parse(stem) {
            return Some(lang);
        }
        stem.rsplit(['.', '-'])
            .next()
            .and_then(Self::try_parse)
            .or_else(|| {
                // messages_pt_BR
                let mut parts = stem.rsplitn(3, '_');
                let last = parts.next()?;
                let prev = parts.next()?;
                Self::try_parse(&format!("{prev}_{last}")).or_else(|| Self::try_parse(last))
            })
    }

    /// English, the language gettext assumes for msgids.
    pub fn english() -> Self {
        Self::try_parse("en").unwrap_or_else(|| Language {
            id: LanguageIdentifier::default(),
            modifier: None,
        })
    }

    /// The bare language subtag, e.g. `pt` for `pt_BR`.
    pub fn lang(&self) -> &str {
        self.id.language.as_str()
    }

    pub fn region(&self) -> Option<&str> {
        self.id.region.as_ref().map(|r| r.as_str())
    }

    pub fn identifier(&self) -> &LanguageIdentifier {
        &self.id
    }

    /// Gettext-style code: `pt_BR`, `zh_Hant`, `sr@latin`.
    pub fn code(&self) -> String {
        let mut code = self.lang().to_string();
        if let Some(script) = &self.id.script {
            code.push('_');
            code.push_str(script.as_str());
        }
        if let Some(region) = &self.id.region {
            code.push('_');
            code.push_str(region.as_str());
        }
        if let Some(modifier) = &self.modifier {
            code.push('@');
            code.push_str(modifier);
        }
        code
    }

    /// BCP-47 tag: `pt-BR`, `zh-Hant`, `sr-Latn` for `sr@latin`.
    pub fn tag(&self) -> String {
        let mut id = self.id.clone();
        if self.modifier.as_deref() == Some("latin") && id.script.is_none() {
            id.script = "Latn".parse().ok();
        }
        id.to_string()
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_posix_and_bcp47() {
        let a = Language::try_parse("pt_BR").unwrap();
        let b = Language::try_parse("pt-BR").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.code(), "pt_BR");
        assert_eq!(a.tag(), "pt-BR");
        assert_eq!(a.lang(), "pt");
        assert_eq!(a.region(), Some("BR"));
    }

    #[test]
    fn test_parse_modifier_and_encoding() {
        let sr = Language::try_parse("sr@latin").unwrap();
        assert_eq!(sr.code(), "sr@latin");
        assert_eq!(sr.tag(), "sr-Latn");

        let de = Language::try_parse("de_DE.UTF-8").unwrap();
        assert_eq!(de.code(), "de_DE");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Language::try_parse("").is_none());
        assert!(Language::try_parse("und").is_none());
        assert!(Language::try_parse("not a language").is_none());
        assert!(Language::try_parse("messages").is_none());
    }

    #[test]
    fn test_guess_from_filename() {
        assert_eq!(
            Language::try_guess_from_filename("po/de.po").unwrap().code(),
            "de"
        );
        assert_eq!(
            Language::try_guess_from_filename("locale/pt_BR.po")
                .unwrap()
                .code(),
            "pt_BR"
        );
        assert_eq!(
            Language::try_guess_from_filename("messages-fr.xlf")
                .unwrap()
                .code(),
            "fr"
        );
        assert_eq!(
            Language::try_guess_from_filename("app_pt_BR.po")
                .unwrap()
                .code(),
            "pt_BR"
        );
        assert!(Language::try_guess_from_filename("messages.po").is_none());
    }

    #[test]
    fn test_script_code() {
        let zh = Language::try_parse("zh-Hant").unwrap();
        assert_eq!(zh.code(), "zh_Hant");
        assert_eq!(zh.tag(), "zh-Hant");
    }
}
