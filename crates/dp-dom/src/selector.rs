//! Minimal CSS selector engine used for `query_selector_all`.
//!
//! Supported: type selectors, `*`, `#id`, `.class`, attribute conditions
//! (`[a]`, `[a="v"]`, `[a^="v"]`, `[a$="v"]`, `[a*="v"]`, `[a~="v"]`), the
//! `:checked` pseudo-class, descendant and child combinators, and
//! comma-separated selector lists.

use dp_core::DpError;
use dp_core::DpResult;

use crate::Document;
use crate::NodeId;

/// Parsed selector list (`a, b`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

/// One complex selector, stored right-to-left: `segments[0]` is the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selector {
    segments: Vec<SelectorSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorSegment {
    compound: Compound,
    combinator_to_next: Option<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeCondition>,
    checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeCondition {
    name: String,
    op: AttributeOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeOp {
    Exists,
    Equals(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
    Includes(String),
}

impl SelectorList {
    pub fn parse(input: &str) -> DpResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DpError::new("dom.selector.empty", "selector is empty"));
        }

        let mut selectors = Vec::new();
        for part in split_top_level_commas(trimmed) {
            selectors.push(parse_complex(part.trim(), input)?);
        }

        Ok(Self { selectors })
    }

    /// True when `node` is an element matched by any selector in the list.
    pub fn matches(&self, document: &Document, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|selector| matches_complex(selector, document, node))
    }
}

fn split_top_level_commas(input: &str) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0_usize;
    let mut bracket_depth = 0_u32;
    let mut quote: Option<u8> = None;

    for (idx, byte) in bytes.iter().copied().enumerate() {
        if let Some(open) = quote {
            if byte == open {
                quote = None;
            }
            continue;
        }

        match byte {
            b'"' | b'\'' => quote = Some(byte),
            b'[' => bracket_depth = bracket_depth.saturating_add(1),
            b']' => bracket_depth = bracket_depth.saturating_sub(1),
            b',' if bracket_depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx.saturating_add(1);
            }
            _ => {}
        }
    }

    parts.push(&input[start..]);
    parts
}

fn parse_complex(input: &str, full: &str) -> DpResult<Selector> {
    if input.is_empty() {
        return Err(DpError::new(
            "dom.selector.invalid",
            format!("empty selector in list `{full}`"),
        ));
    }

    let mut compounds: Vec<String> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut current = String::new();
    let mut pending_descendant = false;
    let mut bracket_depth = 0_u32;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        if let Some(open) = quote {
            current.push(ch);
            if ch == open {
                quote = None;
            }
            continue;
        }

        if bracket_depth > 0 {
            current.push(ch);
            match ch {
                '"' | '\'' => quote = Some(ch),
                ']' => bracket_depth = bracket_depth.saturating_sub(1),
                _ => {}
            }
            continue;
        }

        match ch {
            '[' => {
                if pending_descendant {
                    combinators.push(Combinator::Descendant);
                    pending_descendant = false;
                }
                bracket_depth = bracket_depth.saturating_add(1);
                current.push('[');
            }
            '>' => {
                if !current.is_empty() {
                    compounds.push(std::mem::take(&mut current));
                } else if compounds.is_empty() || !pending_descendant {
                    return Err(dangling_combinator(full));
                }
                pending_descendant = false;
                combinators.push(Combinator::Child);
            }
            '+' | '~' => {
                return Err(DpError::new(
                    "dom.selector.unsupported",
                    format!("sibling combinators are not supported in `{full}`"),
                ));
            }
            _ if ch.is_ascii_whitespace() => {
                if !current.is_empty() {
                    compounds.push(std::mem::take(&mut current));
                    pending_descendant = true;
                }
            }
            _ => {
                if pending_descendant {
                    combinators.push(Combinator::Descendant);
                    pending_descendant = false;
                }
                current.push(ch);
            }
        }
    }

    if quote.is_some() || bracket_depth > 0 {
        return Err(DpError::new(
            "dom.selector.invalid",
            format!("unterminated attribute selector in `{full}`"),
        ));
    }

    if !current.is_empty() {
        compounds.push(current);
    }

    if compounds.is_empty() || combinators.len() + 1 != compounds.len() {
        return Err(dangling_combinator(full));
    }

    let mut parsed = Vec::with_capacity(compounds.len());
    for raw in &compounds {
        parsed.push(parse_compound(raw, full)?);
    }

    let mut segments = Vec::with_capacity(parsed.len());
    for index in (0..parsed.len()).rev() {
        let combinator_to_next = if index == 0 {
            None
        } else {
            combinators.get(index - 1).copied()
        };
        segments.push(SelectorSegment {
            compound: parsed[index].clone(),
            combinator_to_next,
        });
    }

    Ok(Selector { segments })
}

fn dangling_combinator(full: &str) -> DpError {
    DpError::new(
        "dom.selector.invalid",
        format!("dangling combinator in `{full}`"),
    )
}

fn parse_compound(input: &str, full: &str) -> DpResult<Compound> {
    let bytes = input.as_bytes();
    let mut compound = Compound::default();
    let mut idx = 0_usize;

    if bytes.first().copied() == Some(b'*') {
        idx = 1;
    } else if bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        let start = idx;
        while idx < bytes.len() && is_ident_char(bytes[idx]) {
            idx = idx.saturating_add(1);
        }
        compound.tag = Some(input[start..idx].to_ascii_lowercase());
    }

    while idx < bytes.len() {
        match bytes[idx] {
            b'#' | b'.' => {
                let marker = bytes[idx];
                idx = idx.saturating_add(1);
                let start = idx;
                while idx < bytes.len() && is_ident_char(bytes[idx]) {
                    idx = idx.saturating_add(1);
                }
                if start == idx {
                    return Err(DpError::new(
                        "dom.selector.invalid",
                        format!("expected identifier after `{}` in `{full}`", marker as char),
                    ));
                }
                let value = input[start..idx].to_owned();
                if marker == b'#' {
                    compound.id = Some(value);
                } else {
                    compound.classes.push(value);
                }
            }
            b'[' => {
                let close = find_attribute_close(bytes, idx).ok_or_else(|| {
                    DpError::new(
                        "dom.selector.invalid",
                        format!("unterminated attribute selector in `{full}`"),
                    )
                })?;
                compound
                    .attributes
                    .push(parse_attribute(&input[idx + 1..close], full)?);
                idx = close.saturating_add(1);
            }
            b':' => {
                let start = idx.saturating_add(1);
                idx = start;
                while idx < bytes.len() && is_ident_char(bytes[idx]) {
                    idx = idx.saturating_add(1);
                }
                let pseudo = input[start..idx].to_ascii_lowercase();
                if pseudo != "checked" {
                    return Err(DpError::new(
                        "dom.selector.unsupported",
                        format!("pseudo-class `:{pseudo}` is not supported in `{full}`"),
                    ));
                }
                compound.checked = true;
            }
            _ => {
                let other = input[idx..].chars().next().unwrap_or_default();
                return Err(DpError::new(
                    "dom.selector.invalid",
                    format!("unexpected `{other}` in `{full}`"),
                ));
            }
        }
    }

    Ok(compound)
}

fn find_attribute_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut idx = open.saturating_add(1);
    while idx < bytes.len() {
        let byte = bytes[idx];
        match quote {
            Some(open_quote) if byte == open_quote => quote = None,
            Some(_) => {}
            None if byte == b'"' || byte == b'\'' => quote = Some(byte),
            None if byte == b']' => return Some(idx),
            None => {}
        }
        idx = idx.saturating_add(1);
    }
    None
}

fn parse_attribute(inner: &str, full: &str) -> DpResult<AttributeCondition> {
    let inner = inner.trim();
    let Some(eq) = inner.find('=') else {
        if inner.is_empty() || !inner.bytes().all(is_ident_char) {
            return Err(DpError::new(
                "dom.selector.invalid",
                format!("invalid attribute name `{inner}` in `{full}`"),
            ));
        }
        return Ok(AttributeCondition {
            name: inner.to_ascii_lowercase(),
            op: AttributeOp::Exists,
        });
    };

    let (name_part, modifier) = match inner[..eq].chars().last() {
        Some(ch @ ('^' | '$' | '*' | '~')) => (&inner[..eq - 1], Some(ch)),
        Some('|') => {
            return Err(DpError::new(
                "dom.selector.unsupported",
                format!("`|=` attribute operator is not supported in `{full}`"),
            ));
        }
        _ => (&inner[..eq], None),
    };

    let name = name_part.trim().to_ascii_lowercase();
    if name.is_empty() || !name.bytes().all(is_ident_char) {
        return Err(DpError::new(
            "dom.selector.invalid",
            format!("invalid attribute name `{name}` in `{full}`"),
        ));
    }

    let raw_value = inner[eq + 1..].trim();
    let value = strip_quotes(raw_value).to_owned();
    let op = match modifier {
        None => AttributeOp::Equals(value),
        Some('^') => AttributeOp::Prefix(value),
        Some('$') => AttributeOp::Suffix(value),
        Some('*') => AttributeOp::Substring(value),
        Some(_) => AttributeOp::Includes(value),
    };

    Ok(AttributeCondition { name, op })
}

fn strip_quotes(input: &str) -> &str {
    let bytes = input.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        return &input[1..input.len() - 1];
    }
    input
}

/// Non-ASCII bytes count as identifier bytes, so identifiers never split a code point.
fn is_ident_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || !byte.is_ascii()
}

fn matches_complex(selector: &Selector, document: &Document, node: NodeId) -> bool {
    let Some(first) = selector.segments.first() else {
        return false;
    };
    if !matches_compound(&first.compound, document, node) {
        return false;
    }

    let mut cursor = node;
    for index in 0..selector.segments.len().saturating_sub(1) {
        let combinator = selector.segments[index]
            .combinator_to_next
            .unwrap_or(Combinator::Descendant);
        let next = &selector.segments[index + 1].compound;

        match combinator {
            Combinator::Child => {
                let Some(parent) = document.parent_element(cursor) else {
                    return false;
                };
                if !matches_compound(next, document, parent) {
                    return false;
                }
                cursor = parent;
            }
            Combinator::Descendant => {
                let mut search = document.parent_element(cursor);
                loop {
                    let Some(candidate) = search else {
                        return false;
                    };
                    if matches_compound(next, document, candidate) {
                        cursor = candidate;
                        break;
                    }
                    search = document.parent_element(candidate);
                }
            }
        }
    }

    true
}

fn matches_compound(compound: &Compound, document: &Document, node: NodeId) -> bool {
    let Some(element) = document.element(node) else {
        return false;
    };

    if let Some(tag) = &compound.tag {
        if element.tag != *tag {
            return false;
        }
    }

    if let Some(id) = &compound.id {
        if element.attr("id") != Some(id.as_str()) {
            return false;
        }
    }

    if !compound
        .classes
        .iter()
        .all(|class_name| element.has_class(class_name))
    {
        return false;
    }

    if compound.checked && !(element.tag == "input" && element.attr("checked").is_some()) {
        return false;
    }

    compound.attributes.iter().all(|condition| {
        let Some(value) = element.attr(&condition.name) else {
            return false;
        };
        match &condition.op {
            AttributeOp::Exists => true,
            AttributeOp::Equals(expected) => value == expected,
            AttributeOp::Prefix(expected) => !expected.is_empty() && value.starts_with(expected),
            AttributeOp::Suffix(expected) => !expected.is_empty() && value.ends_with(expected),
            AttributeOp::Substring(expected) => !expected.is_empty() && value.contains(expected),
            AttributeOp::Includes(expected) => value
                .split_ascii_whitespace()
                .any(|candidate| candidate == expected),
        }
    })
}
