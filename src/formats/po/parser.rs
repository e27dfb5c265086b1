//! Line-oriented PO reader.
//!
//! The file is split into entries. Each entry keeps the exact text it was
//! read from (`leading` blank lines and detached comments plus its own
//! `body`), so entries that are not edited can be written back verbatim.

/// Default gettext page width.
pub(crate) const DEFAULT_WRAP_WIDTH: usize = 79;

/// Upper bound for `msgstr[N]` indices.
pub(crate) const MAX_PLURAL_FORMS: usize = 32;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ParsedEntry {
    pub leading: String,
    pub body: String,
    /// 1-based line of the first body line.
    pub line: usize,
    pub comment: Vec<String>,
    pub extracted: Vec<String>,
    pub references: Vec<String>,
    pub flags: Vec<String>,
    pub previous: Vec<String>,
    pub msgctxt: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub msgstr: Vec<String>,
    pub obsolete: bool,
    /// Body lines without terminators, for obsolete entries.
    pub lines: Vec<String>,
}

impl ParsedEntry {
    pub fn is_header(&self) -> bool {
        !self.obsolete && self.msgid.is_empty() && self.msgctxt.is_none()
    }
}

#[derive(Debug, Default)]
pub(crate) struct ParsedFile {
    pub entries: Vec<ParsedEntry>,
    pub trailer: String,
    /// Detected wrapping width; `None` when strings are not soft-wrapped.
    pub wrap_width: Option<usize>,
    pub crlf: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Debug, Default)]
struct EntryBuilder {
    entry: ParsedEntry,
    has_keyword: bool,
    has_msgstr: bool,
    plain_msgstr: bool,
    indexed_msgstr: bool,
    field: Option<Field>,
}

/// Splits `text` into lines, keeping terminators.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive('\n')
}

fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Parses decoded PO text. Errors carry the offending line number.
pub(crate) fn parse(text: &str) -> Result<ParsedFile, String> {
    let mut file = ParsedFile {
        crlf: text
            .find('\n')
            .is_some_and(|pos| text[..pos].ends_with('\r')),
        ..Default::default()
    };

    let mut leading = String::new();
    let mut current: Option<EntryBuilder> = None;
    let mut wrap = WrapDetector::default();

    for (index, raw) in lines(text).enumerate() {
        let line_no = index + 1;
        let content = strip_terminator(raw);
        let trimmed = content.trim();

        if trimmed.is_empty() {
            match current.take() {
                Some(builder) if builder.has_keyword => file.entries.push(builder.finish()?),
                Some(builder) => builder.detach_into(&mut leading),
                None => {}
            }
            leading.push_str(raw);
            continue;
        }

        let (obsolete, content) = match trimmed.strip_prefix("#~") {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let starts_entry = is_entry_start(content);

        if let Some(builder) = &current {
            let switches_kind = builder.has_keyword && builder.entry.obsolete != obsolete;
            if (builder.has_msgstr && starts_entry) || switches_kind {
                if let Some(done) = current.take() {
                    file.entries.push(done.finish()?);
                }
            }
        }

        let builder = current.get_or_insert_with(|| {
            let mut b = EntryBuilder::default();
            b.entry.leading = std::mem::take(&mut leading);
            b.entry.line = line_no;
            b
        });
        builder.entry.body.push_str(raw);
        if obsolete {
            builder.entry.obsolete = true;
        }
        builder
            .feed(content, trimmed, obsolete, &mut wrap)
            .map_err(|e| format!("line {line_no}: {e}"))?;
    }

    match current.take() {
        Some(builder) if builder.has_keyword => file.entries.push(builder.finish()?),
        Some(builder) => builder.detach_into(&mut leading),
        None => {}
    }
    file.trailer = leading;
    file.wrap_width = wrap.width();

    Ok(file)
}

/// Comments and `msgctxt`/`msgid` lines begin a new entry once the previous
/// one has seen its msgstr.
fn is_entry_start(content: &str) -> bool {
    if content.starts_with('#') || content.starts_with('|') {
        return true;
    }
    matches!(keyword_of(content), Some("msgctxt" | "msgid"))
}

fn keyword_of(content: &str) -> Option<&str> {
    let word = content.split_whitespace().next()?;
    word.starts_with("msg").then_some(word)
}

impl EntryBuilder {
    fn feed(
        &mut self,
        content: &str,
        full: &str,
        obsolete: bool,
        wrap: &mut WrapDetector,
    ) -> Result<(), String> {
        if obsolete {
            self.entry.lines.push(full.to_string());
        }

        if !obsolete && content.starts_with('#') {
            self.field = None;
            self.comment_line(content);
            return Ok(());
        }
        if obsolete && (content.starts_with('#') || content.starts_with('|')) {
            // `#~|` previous strings and `#~ #, fuzzy`
            return Ok(());
        }

        if content.starts_with('"') {
            let field = self
                .field
                .ok_or_else(|| "string continuation without a keyword".to_string())?;
            let value = unescape_quoted(content)?;
            wrap.continuation(content);
            self.append(field, &value);
            return Ok(());
        }

        let (keyword, rest) = content
            .split_once(|c: char| c.is_ascii_whitespace())
            .ok_or_else(|| format!("unexpected line `{content}`"))?;
        let rest = rest.trim_start();
        let value = unescape_quoted(rest)?;
        wrap.keyword();

        let field = match keyword {
            "msgctxt" => Field::Context,
            "msgid" => Field::Id,
            "msgid_plural" => {
                if self.plain_msgstr && !obsolete {
                    return Err("msgid_plural after msgstr".to_string());
                }
                Field::IdPlural
            }
            "msgstr" => {
                if self.entry.msgid_plural.is_some() && !obsolete {
                    return Err("msgstr used together with msgid_plural, expected msgstr[N]".to_string());
                }
                self.has_msgstr = true;
                self.plain_msgstr = true;
                Field::Str(0)
            }
            kw if kw.starts_with("msgstr[") && kw.ends_with(']') => {
                let index: usize = kw["msgstr[".len()..kw.len() - 1]
                    .parse()
                    .map_err(|_| format!("invalid plural index in `{kw}`"))?;
                if index >= MAX_PLURAL_FORMS {
                    return Err(format!("plural index in `{kw}` is out of range"));
                }
                if self.entry.msgid_plural.is_none() && !obsolete {
                    return Err(format!("`{kw}` used without msgid_plural"));
                }
                self.has_msgstr = true;
                self.indexed_msgstr = true;
                Field::Str(index)
            }
            other => return Err(format!("unknown keyword `{other}`")),
        };

        match field {
            Field::Context => self.entry.msgctxt = Some(String::new()),
            Field::IdPlural => self.entry.msgid_plural = Some(String::new()),
            Field::Str(index) => {
                if self.entry.msgstr.len() <= index {
                    self.entry.msgstr.resize(index + 1, String::new());
                }
            }
            Field::Id => {}
        }
        self.has_keyword = true;
        self.field = Some(field);
        self.append(field, &value);
        Ok(())
    }

    fn append(&mut self, field: Field, value: &str) {
        let target = match field {
            Field::Context => self.entry.msgctxt.get_or_insert_with(String::new),
            Field::Id => &mut self.entry.msgid,
            Field::IdPlural => self.entry.msgid_plural.get_or_insert_with(String::new),
            Field::Str(index) => &mut self.entry.msgstr[index],
        };
        target.push_str(value);
    }

    fn comment_line(&mut self, content: &str) {
        let mut chars = content.chars();
        chars.next();
        let marker = chars.next();
        let text = |skip: usize| content[skip..].strip_prefix(' ').unwrap_or(&content[skip..]);

        match marker {
            Some('.') => {
                let text = text(2);
                // msgcat conflict markers
                if !text.starts_with("#-#-#-#-#") {
                    self.entry.extracted.push(text.to_string());
                }
            }
            Some(':') => self
                .entry
                .references
                .extend(text(2).split_whitespace().map(str::to_string)),
            Some(',') => {
                for flag in text(2).split(',').map(str::trim).filter(|f| !f.is_empty()) {
                    if !self.entry.flags.iter().any(|f| f == flag) {
                        self.entry.flags.push(flag.to_string());
                    }
                }
            }
            Some('|') => self.entry.previous.push(content.to_string()),
            _ => self.entry.comment.push(text(1).to_string()),
        }
    }

    /// Comment-only paragraphs are not entries; their text goes back to the
    /// leading text of whatever follows.
    fn detach_into(self, leading: &mut String) {
        leading.push_str(&self.entry.leading);
        leading.push_str(&self.entry.body);
    }

    fn finish(self) -> Result<ParsedEntry, String> {
        let entry = self.entry;
        if !entry.obsolete {
            if !self.has_msgstr {
                return Err(format!(
                    "line {}: missing msgstr for entry starting here",
                    entry.line
                ));
            }
            if self.plain_msgstr && self.indexed_msgstr {
                return Err(format!(
                    "line {}: mixed msgstr and msgstr[N]",
                    entry.line
                ));
            }
        }
        Ok(entry)
    }
}

/// Tracks soft-wrapped string lines to guess the width a file was wrapped at.
#[derive(Debug, Default)]
struct WrapDetector {
    /// The previous string line of a multi-line value did not end in `\n`.
    pending_soft: bool,
    soft_wraps: bool,
    max_len: usize,
}

impl WrapDetector {
    fn keyword(&mut self) {
        self.pending_soft = false;
    }

    fn continuation(&mut self, quoted: &str) {
        if self.pending_soft {
            self.soft_wraps = true;
        }
        self.max_len = self.max_len.max(quoted.chars().count());
        self.pending_soft = !quoted.ends_with(r#"\n""#);
    }

    fn width(&self) -> Option<usize> {
        self.soft_wraps
            .then(|| self.max_len.max(DEFAULT_WRAP_WIDTH))
    }
}

/// Parses a C-style quoted string, returning its unescaped value.
pub(crate) fn unescape_quoted(s: &str) -> Result<String, String> {
    let s = s.trim_end();
    let inner = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .filter(|_| s.len() >= 2)
        .ok_or_else(|| format!("expected quoted string, found `{s}`"))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| "unterminated escape sequence".to_string())?;
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'a' => out.push('\u{07}'),
                    'b' => out.push('\u{08}'),
                    'f' => out.push('\u{0C}'),
                    'v' => out.push('\u{0B}'),
                    '0'..='7' => {
                        let mut value = escaped.to_digit(8).unwrap_or(0);
                        for _ in 0..2 {
                            match chars.peek().and_then(|c| c.to_digit(8)) {
                                Some(d) => {
                                    value = value * 8 + d;
                                    chars.next();
                                }
                                None => break,
                            }
                        }
                        out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
                    }
                    'x' => {
                        // at most two hex digits, as in gettext
                        let mut value = 0;
                        for _ in 0..2 {
                            match chars.peek().and_then(|c| c.to_digit(16)) {
                                Some(d) => {
                                    value = value * 16 + d;
                                    chars.next();
                                }
                                None => break,
                            }
                        }
                        out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
                    }
                    other => out.push(other),
                }
            }
            '"' => return Err("unescaped quote inside string".to_string()),
            c => out.push(c),
        }
    }
    Ok(out)
}
