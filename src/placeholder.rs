//! Printf-family format specifier parsing and comparison.
//!
//! Only the printf family is checked (C, Objective-C `%@`, POSIX positional
//! `%1$s`). Strings flagged with another `*-format` flag are not inspected.
//!
//! Two grammars are used:
//! - the full C grammar (flags, width, precision, length modifiers) for
//!   strings explicitly flagged `c-format` or `objc-format`;
//! - a conservative grammar for unflagged strings, which only accepts the
//!   common `%s %d %i %u %f %@` forms with optional position, precision and
//!   `l`/`ll`, so that prose such as "50% off" is not mistaken for a directive.

use std::collections::BTreeMap;

/// Which printf grammar to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatGrammar {
    Full,
    Common,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub index: Option<usize>,
    pub kind: char, // canonical kind: s, d, f, etc.
}

impl PlaceholderToken {
    pub fn to_signature(&self) -> String {
        match self.index {
            Some(i) => format!("{}${}", i, self.kind),
            None => format!("{}", self.kind),
        }
    }
}

const FULL_FLAGS: &[u8] = b"-+ #0'";
const FULL_CONVERSIONS: &[u8] = b"diouxXeEfFgGaAcspn@";
const COMMON_CONVERSIONS: &[u8] = b"diusf@";

/// Extracts placeholder tokens from a string and returns them in occurrence order.
/// Ignores the escaped percent `%%`.
pub fn extract_placeholders(input: &str, grammar: FormatGrammar) -> Vec<PlaceholderToken> {
    let bytes = input.as_bytes();
    let mut i = 0;
    let mut out = Vec::new();

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        if i + 1 < bytes.len() && bytes[i + 1] == b'%' {
            i += 2;
            continue;
        }

        match parse_directive(bytes, i + 1, grammar) {
            Some((token, next)) => {
                out.push(token);
                i = next;
            }
            None => i += 1,
        }
    }

    out
}

/// Parses one directive starting right after `%`; returns the token and the
/// position following it.
fn parse_directive(
    bytes: &[u8],
    start: usize,
    grammar: FormatGrammar,
) -> Option<(PlaceholderToken, usize)> {
    let mut j = start;

    // Optional positional index: digits followed by '$'
    let mut index = None;
    let digits_end = skip_digits(bytes, j);
    if digits_end > j && bytes.get(digits_end) == Some(&b'$') {
        index = std::str::from_utf8(&bytes[j..digits_end])
            .ok()
            .and_then(|s| s.parse::<usize>().ok());
        j = digits_end + 1;
    }

    if grammar == FormatGrammar::Full {
        while j < bytes.len() && FULL_FLAGS.contains(&bytes[j]) {
            j += 1;
        }
        if bytes.get(j) == Some(&b'*') {
            j += 1;
        } else {
            j = skip_digits(bytes, j);
        }
    }

    if bytes.get(j) == Some(&b'.') {
        j += 1;
        if grammar == FormatGrammar::Full && bytes.get(j) == Some(&b'*') {
            j += 1;
        } else {
            j = skip_digits(bytes, j);
        }
    }

    j = skip_length_modifier(bytes, j, grammar);

    let ch = *bytes.get(j)?;
    let allowed = match grammar {
        FormatGrammar::Full => FULL_CONVERSIONS,
        FormatGrammar::Common => COMMON_CONVERSIONS,
    };
    if !allowed.contains(&ch) {
        return None;
    }

    Some((
        PlaceholderToken {
            index,
            kind: canonical_kind_char(ch as char),
        },
        j + 1,
    ))
}

fn skip_digits(bytes: &[u8], mut j: usize) -> usize {
    while j < bytes.len() && bytes[j].is_ascii_digit() {
        j += 1;
    }
    j
}

fn skip_length_modifier(bytes: &[u8], j: usize, grammar: FormatGrammar) -> usize {
    let rest = &bytes[j.min(bytes.len())..];
    let modifiers: &[&[u8]] = match grammar {
        FormatGrammar::Full => &[b"hh", b"ll", b"h", b"l", b"L", b"q", b"j", b"z", b"t"],
        FormatGrammar::Common => &[b"ll", b"l"],
    };
    modifiers
        .iter()
        .find(|m| rest.starts_with(m))
        .map_or(j, |m| j + m.len())
}

/// Build a normalized signature (sequence of tokens) for comparison.
pub fn signature(input: &str, grammar: FormatGrammar) -> Vec<String> {
    extract_placeholders(input, grammar)
        .into_iter()
        .map(|t| t.to_signature())
        .collect()
}

/// Maps argument positions to their conversion kind. Non-positional
/// directives are numbered in order of appearance.
fn argument_map(input: &str, grammar: FormatGrammar) -> BTreeMap<usize, char> {
    let mut next = 1;
    let mut map = BTreeMap::new();
    for token in extract_placeholders(input, grammar) {
        let index = token.index.unwrap_or_else(|| {
            let i = next;
            next += 1;
            i
        });
        map.insert(index, token.kind);
    }
    map
}

/// Compares the directives of a translation against its source.
///
/// Returns a human readable description of the first mismatch. With
/// `allow_omitted` (plural translations), directives missing from the
/// translation are tolerated but extra or retyped ones are not.
pub fn compare(
    source: &str,
    translation: &str,
    grammar: FormatGrammar,
    allow_omitted: bool,
) -> Option<String> {
    let expected = argument_map(source, grammar);
    let actual = argument_map(translation, grammar);

    for (index, kind) in &actual {
        match expected.get(index) {
            None => {
                return Some(format!(
                    "format specification for argument {index} doesn’t exist in the source"
                ));
            }
            Some(want) if want != kind => {
                return Some(format!(
                    "format specifications for argument {index} are not the same (`%{want}` vs `%{kind}`)"
                ));
            }
            Some(_) => {}
        }
    }

    if !allow_omitted {
        if let Some(index) = expected.keys().find(|i| !actual.contains_key(i)) {
            return Some(format!(
                "format specification for argument {index} is missing in the translation"
            ));
        }
    }

    None
}

fn canonical_kind_char(ch: char) -> char {
    match ch {
        '@' => 's',
        'i' => 'd',
        'X' => 'x',
        'e' | 'E' | 'F' | 'g' | 'G' | 'a' | 'A' => 'f',
        c => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_positional_and_objc() {
        let sig = signature("%1$@ moved %2$d files to %s", FormatGrammar::Full);
        assert_eq!(sig, ["1$s", "2$d", "s"]);
    }

    #[test]
    fn test_long_modifiers_and_flags() {
        let s = "Value: %-10s and number %ld, ratio %5.2f, hex %#08X";
        assert_eq!(signature(s, FormatGrammar::Full), vec!["s", "d", "f", "x"]);
    }

    #[test]
    fn test_escaped_percent_is_literal() {
        assert_eq!(signature("%d%% complete", FormatGrammar::Full), ["d"]);
    }

    #[test]
    fn test_common_grammar_ignores_prose() {
        assert!(signature("50% off, 100% sure", FormatGrammar::Common).is_empty());
        // the full grammar reads "% o" and "% s" as directives
        assert_eq!(
            signature("50% off, 100% sure", FormatGrammar::Full),
            vec!["o", "s"]
        );
        assert_eq!(
            signature("%.1f%% of %lu files", FormatGrammar::Common),
            vec!["f", "u"]
        );
    }

    #[test]
    fn test_compare_matching() {
        assert_eq!(
            compare("%s has %d files", "%s hat %d Dateien", FormatGrammar::Full, false),
            None
        );
        assert_eq!(
            compare(
                "%s has %d files",
                "%2$d Dateien hat %1$s",
                FormatGrammar::Full,
                false
            ),
            None
        );
        assert_eq!(compare("%i", "%d", FormatGrammar::Full, false), None);
    }

    #[test]
    fn test_compare_mismatches() {
        let wrong_type = compare("%s items", "%d Elemente", FormatGrammar::Full, false).unwrap();
        assert!(wrong_type.contains("argument 1"));

        let missing = compare("%s and %s", "%s", FormatGrammar::Full, false).unwrap();
        assert!(missing.contains("missing"));

        let extra = compare("hello", "hallo %s", FormatGrammar::Full, false).unwrap();
        assert!(extra.contains("doesn’t exist"));
    }

    #[test]
    fn test_compare_allows_omitted_in_plurals() {
        assert_eq!(
            compare("%d files", "Eine Datei", FormatGrammar::Full, true),
            None
        );
        assert!(compare("%d files", "%s Dateien", FormatGrammar::Full, true).is_some());
    }
}
