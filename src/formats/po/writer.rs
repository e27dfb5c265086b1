//! PO entry formatting in gettext layout.

use crate::item::CatalogItem;

/// Formatting parameters for regenerated entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    /// Maximum line width, `None` to only break at embedded newlines.
    pub wrap: Option<usize>,
    pub eol: &'static str,
}

pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\u{0B}' => out.push_str("\\v"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Splits an escaped string after every `\n` escape.
fn split_lines(escaped: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let bytes = escaped.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\\' {
            if bytes[i + 1] == b'n' {
                pieces.push(&escaped[start..i + 2]);
                start = i + 2;
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    if start < escaped.len() {
        pieces.push(&escaped[start..]);
    }
    pieces
}

/// Breaks an escaped piece after spaces so that each quoted line fits.
fn wrap_piece(piece: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in piece.split_inclusive(' ') {
        if !current.is_empty() && char_len(&current) + char_len(word) + 2 > width {
            lines.push(std::mem::take(&mut current));
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Appends `keyword "value"`, splitting into continuation lines the way
/// `msgcat` does.
pub(crate) fn write_string(out: &mut String, keyword: &str, value: &str, layout: Layout) {
    let escaped = escape(value);
    let pieces = split_lines(&escaped);
    let single = format!("{keyword} \"{escaped}\"");
    let fits = layout.wrap.is_none_or(|w| char_len(&single) <= w);

    if pieces.len() <= 1 && fits {
        out.push_str(&single);
        out.push_str(layout.eol);
        return;
    }

    out.push_str(keyword);
    out.push_str(" \"\"");
    out.push_str(layout.eol);
    for piece in pieces {
        let lines = match layout.wrap {
            Some(width) => wrap_piece(piece, width),
            None => vec![piece.to_string()],
        };
        for line in lines {
            out.push('"');
            out.push_str(&line);
            out.push('"');
            out.push_str(layout.eol);
        }
    }
}

/// Appends a comment line list such as `#: a.c:1 b.c:2`, wrapping items.
fn write_wrapped_comment(out: &mut String, prefix: &str, items: &[String], layout: Layout) {
    let mut line = String::new();
    for item in items {
        let candidate_len = char_len(prefix) + char_len(&line) + 1 + char_len(item);
        if !line.is_empty() && layout.wrap.is_some_and(|w| candidate_len > w) {
            out.push_str(prefix);
            out.push_str(&line);
            out.push_str(layout.eol);
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(item);
    }
    if !line.is_empty() {
        out.push_str(prefix);
        out.push_str(&line);
        out.push_str(layout.eol);
    }
}

/// Formats an item as an entry body (comments and keywords, no leading
/// blank line).
pub(crate) fn format_item(item: &CatalogItem, layout: Layout) -> String {
    let layout = if item.has_flag("no-wrap") {
        Layout {
            wrap: None,
            ..layout
        }
    } else {
        layout
    };
    let mut out = String::new();

    if !item.comment().is_empty() {
        for line in item.comment().split('\n') {
            if line.is_empty() {
                out.push('#');
            } else {
                out.push_str("# ");
                out.push_str(line);
            }
            out.push_str(layout.eol);
        }
    }
    for line in item.extracted_comments() {
        out.push_str("#.");
        if !line.is_empty() {
            out.push(' ');
            out.push_str(line);
        }
        out.push_str(layout.eol);
    }
    write_wrapped_comment(&mut out, "#: ", item.references(), layout);

    let mut flags: Vec<&str> = Vec::new();
    if item.is_fuzzy() {
        flags.push("fuzzy");
    }
    flags.extend(item.flags().iter().map(String::as_str));
    if !flags.is_empty() {
        out.push_str("#, ");
        out.push_str(&flags.join(", "));
        out.push_str(layout.eol);
    }

    for line in item.previous_source() {
        out.push_str(line);
        out.push_str(layout.eol);
    }

    if let Some(context) = item.context() {
        write_string(&mut out, "msgctxt", context, layout);
    }
    write_string(&mut out, "msgid", item.source(), layout);
    match item.plural_source() {
        Some(plural) => {
            write_string(&mut out, "msgid_plural", plural, layout);
            let forms = item.translations();
            if forms.is_empty() {
                write_string(&mut out, "msgstr[0]", "", layout);
            }
            for (i, form) in forms.iter().enumerate() {
                write_string(&mut out, &format!("msgstr[{i}]"), form, layout);
            }
        }
        None => write_string(&mut out, "msgstr", item.translation(), layout),
    }

    out
}

/// Formats the header entry. `comments` are the header's original comment
/// lines (without terminators).
pub(crate) fn format_header(comments: &[String], msgstr: &str, layout: Layout) -> String {
    let mut out = String::new();
    for line in comments {
        out.push_str(line);
        out.push_str(layout.eol);
    }
    let unwrapped = Layout {
        wrap: None,
        ..layout
    };
    write_string(&mut out, "msgid", "", unwrapped);
    out.push_str("msgstr \"\"");
    out.push_str(layout.eol);
    for piece in split_lines(&escape(msgstr)) {
        out.push('"');
        out.push_str(piece);
        out.push('"');
        out.push_str(layout.eol);
    }
    out
}
