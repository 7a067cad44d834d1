//! HTML tokenizer over a `&str` cursor.
//!
//! Every delimiter the tokenizer looks for is ASCII, so slicing at the
//! positions it finds always lands on a char boundary.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Doctype(String),
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
    RawText(String),
    Comment(String),
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("larr", '\u{2190}'),
    ("rarr", '\u{2192}'),
    ("hellip", '\u{2026}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
    ("copy", '\u{a9}'),
];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub(crate) fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.peek()?;
        self.pos += next.len_utf8();
        Some(next)
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(|ch| ch.is_ascii_whitespace());
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|ch: char| !keep(ch)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Consumes up to and including `needle`; without a match, consumes everything.
    fn take_until(&mut self, needle: &str) -> (&'a str, bool) {
        let rest = self.rest();
        match rest.find(needle) {
            Some(idx) => {
                self.pos += idx + needle.len();
                (&rest[..idx], true)
            }
            None => {
                self.pos = self.src.len();
                (rest, false)
            }
        }
    }
}

pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    while !cursor.at_end() {
        if cursor.peek() == Some('<') && markup(&mut cursor, &mut tokens) {
            continue;
        }
        let text = text_run(&mut cursor);
        tokens.push(Token::Text(decode_entities(text)));
    }

    tokens
}

/// Reads one comment, declaration or tag. Leaves the cursor untouched when
/// the `<` does not open valid markup.
fn markup(cursor: &mut Cursor<'_>, tokens: &mut Vec<Token>) -> bool {
    let mark = cursor.pos;

    if cursor.eat("<!--") {
        let (body, _) = cursor.take_until("-->");
        tokens.push(Token::Comment(body.to_owned()));
        return true;
    }

    if cursor.eat("<!") {
        let (declaration, _) = cursor.take_until(">");
        if let Some(name) = doctype_name(declaration) {
            tokens.push(Token::Doctype(name));
        }
        return true;
    }

    if cursor.eat("</") {
        if let Some(name) = end_tag(cursor) {
            tokens.push(Token::End { name });
            return true;
        }
        cursor.pos = mark;
        return false;
    }

    cursor.bump();
    let Some(token) = start_tag(cursor) else {
        cursor.pos = mark;
        return false;
    };

    let raw_text_tag = match &token {
        Token::Start {
            name,
            self_closing: false,
            ..
        } if is_raw_text_tag(name) => Some(name.clone()),
        _ => None,
    };
    tokens.push(token);

    if let Some(name) = raw_text_tag {
        let body = raw_text(cursor, &name);
        if !body.is_empty() {
            tokens.push(Token::RawText(body.to_owned()));
        }
        tokens.push(Token::End { name });
    }
    true
}

/// Text up to the next `<`. Always consumes at least one char.
fn text_run<'a>(cursor: &mut Cursor<'a>) -> &'a str {
    let src = cursor.src;
    let start = cursor.pos;
    cursor.bump();
    cursor.take_while(|ch| ch != '<');
    &src[start..cursor.pos]
}

fn end_tag(cursor: &mut Cursor<'_>) -> Option<String> {
    cursor.skip_whitespace();
    let name = cursor.take_while(is_name_char);
    if name.is_empty() {
        return None;
    }
    let (_, closed) = cursor.take_until(">");
    closed.then(|| name.to_ascii_lowercase())
}

/// Parses a start tag after its `<`.
fn start_tag(cursor: &mut Cursor<'_>) -> Option<Token> {
    let name = cursor.take_while(is_name_char);
    if !name.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
        return None;
    }

    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        cursor.skip_whitespace();
        match cursor.peek()? {
            '>' => {
                cursor.bump();
                break;
            }
            '/' => {
                cursor.bump();
                self_closing = true;
                cursor.skip_whitespace();
                if cursor.eat(">") {
                    break;
                }
                continue;
            }
            _ => {}
        }

        let attr_name = cursor.take_while(is_attr_name_char);
        if attr_name.is_empty() {
            cursor.bump();
            continue;
        }
        cursor.skip_whitespace();

        let value = if cursor.eat("=") {
            cursor.skip_whitespace();
            attribute_value(cursor)
        } else {
            ""
        };

        let attr_name = attr_name.to_ascii_lowercase();
        if !attrs.iter().any(|(existing, _)| *existing == attr_name) {
            attrs.push((attr_name, decode_entities(value)));
        }
    }

    Some(Token::Start {
        name: name.to_ascii_lowercase(),
        attrs,
        self_closing,
    })
}

fn attribute_value<'a>(cursor: &mut Cursor<'a>) -> &'a str {
    let closing = match cursor.peek() {
        Some('"') => "\"",
        Some('\'') => "'",
        _ => return cursor.take_while(|ch| !ch.is_ascii_whitespace() && ch != '>'),
    };
    cursor.bump();
    cursor.take_until(closing).0
}

/// Body of a `script`/`style` element, consuming its end tag when present.
fn raw_text<'a>(cursor: &mut Cursor<'a>, tag: &str) -> &'a str {
    let rest = cursor.rest();
    for (idx, _) in rest.match_indices("</") {
        let after = &rest[idx + 2..];
        let Some(candidate) = after.get(..tag.len()) else {
            continue;
        };
        if !candidate.eq_ignore_ascii_case(tag) {
            continue;
        }
        let tail = &after[tag.len()..];
        let trimmed = tail.trim_start_matches(|ch: char| ch.is_ascii_whitespace());
        if trimmed.starts_with('>') {
            let consumed = rest.len() - trimmed.len() + 1;
            cursor.pos += consumed;
            return &rest[..idx];
        }
    }
    cursor.pos = cursor.src.len();
    rest
}

fn doctype_name(declaration: &str) -> Option<String> {
    let keyword = declaration.get(..7)?;
    if !keyword.eq_ignore_ascii_case("doctype") {
        return None;
    }
    let name = declaration[7..].trim();
    let name = if name.is_empty() { "html" } else { name };
    Some(name.to_owned())
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':')
}

fn is_attr_name_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '>' | '/' | '=' | '"' | '\'')
}

/// Decodes the named entities in [`NAMED_ENTITIES`] plus decimal and hex
/// references. Unknown references are kept as written.
pub(crate) fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .and_then(|semi| decode_entity(&after[..semi]).map(|ch| (semi, ch)));
        match decoded {
            Some((semi, ch)) => {
                out.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let value = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(value);
    }
    NAMED_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, ch)| *ch)
}
