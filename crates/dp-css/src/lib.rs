//! Inline style (`style=""`) declaration model.

use core::fmt;

/// One `name: value` pair from a declaration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

/// Ordered declaration block, as found in an element's `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<Declaration>,
}

impl InlineStyle {
    pub fn parse(input: &str) -> Self {
        let mut style = Self::default();
        for raw in split_top_level(input, ';') {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some(colon_idx) = find_top_level_colon(trimmed) else {
                continue;
            };

            let name = normalize_ws(trimmed[..colon_idx].trim()).to_ascii_lowercase();
            let mut value = normalize_value(trimmed[colon_idx + 1..].trim());
            let important = strip_important(&mut value);
            if name.is_empty() || value.is_empty() {
                continue;
            }

            style.upsert(Declaration {
                name,
                value,
                important,
            });
        }
        style
    }

    /// Builds a block from literal pairs; later duplicates win.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut style = Self::default();
        for (name, value) in pairs {
            style.set(name, value);
        }
        style
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.trim().to_ascii_lowercase();
        self.declarations
            .iter()
            .find(|declaration| declaration.name == name)
            .map(|declaration| declaration.value.as_str())
    }

    /// Sets a property. An empty value removes it, mirroring `style.x = ""`.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.trim().to_ascii_lowercase();
        let mut value = normalize_value(value);
        if name.is_empty() {
            return;
        }
        if value.is_empty() {
            self.remove(&name);
            return;
        }

        let important = strip_important(&mut value);
        self.upsert(Declaration {
            name,
            value,
            important,
        });
    }

    pub fn remove(&mut self, name: &str) {
        let name = name.trim().to_ascii_lowercase();
        self.declarations
            .retain(|declaration| declaration.name != name);
    }

    /// Copies every declaration of `other` into `self`.
    pub fn merge(&mut self, other: &InlineStyle) {
        for declaration in &other.declarations {
            self.upsert(declaration.clone());
        }
    }

    fn upsert(&mut self, declaration: Declaration) {
        match self
            .declarations
            .iter_mut()
            .find(|existing| existing.name == declaration.name)
        {
            Some(existing) => *existing = declaration,
            None => self.declarations.push(declaration),
        }
    }

    pub fn to_css_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, declaration) in self.declarations.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}: {}", declaration.name, declaration.value)?;
            if declaration.important {
                f.write_str(" !important")?;
            }
            f.write_str(";")?;
        }
        Ok(())
    }
}

/// Parses a pixel length such as `640px`, `640` or `12.5px`.
pub fn parse_px_length(value: &str) -> Option<f32> {
    let trimmed = value.trim();
    let number = trimmed
        .strip_suffix("px")
        .or_else(|| trimmed.strip_suffix("PX"))
        .unwrap_or(trimmed)
        .trim();
    let parsed = number.parse::<f32>().ok()?;
    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}

/// Parses a percentage such as `90%`, returning the fraction (`0.9`).
pub fn parse_percentage(value: &str) -> Option<f32> {
    let number = value.trim().strip_suffix('%')?.trim();
    let parsed = number.parse::<f32>().ok()?;
    parsed.is_finite().then_some(parsed / 100.0)
}

fn strip_important(value: &mut String) -> bool {
    let lower = value.to_ascii_lowercase();
    let Some(bang) = lower.rfind('!') else {
        return false;
    };
    if lower[bang + 1..].trim() != "important" {
        return false;
    }
    value.truncate(bang);
    let trimmed_len = value.trim_end().len();
    value.truncate(trimmed_len);
    true
}

fn normalize_ws(input: &str) -> String {
    input
        .split_whitespace()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_top_level(input: &str, delimiter: char) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0_usize;
    let mut idx = 0_usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;
    let mut paren_depth = 0_u32;

    while idx < bytes.len() {
        let byte = bytes[idx];

        if in_single || in_double {
            let quote = if in_single { b'\'' } else { b'"' };
            if !escape && byte == b'\\' {
                escape = true;
            } else if !escape && byte == quote {
                in_single = false;
                in_double = false;
            } else {
                escape = false;
            }
            idx = idx.saturating_add(1);
            continue;
        }

        match byte {
            b'\'' => in_single = true,
            b'"' => in_double = true,
            b'(' => paren_depth = paren_depth.saturating_add(1),
            b')' => paren_depth = paren_depth.saturating_sub(1),
            _ => {
                if byte == delimiter as u8 && paren_depth == 0 {
                    parts.push(&input[start..idx]);
                    start = idx.saturating_add(1);
                }
            }
        }

        idx = idx.saturating_add(1);
    }

    if start <= input.len() {
        parts.push(&input[start..]);
    }

    parts
}

fn find_top_level_colon(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut paren_depth = 0_u32;

    for (idx, byte) in bytes.iter().copied().enumerate() {
        match byte {
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            _ if in_single || in_double => {}
            b'(' => paren_depth = paren_depth.saturating_add(1),
            b')' => paren_depth = paren_depth.saturating_sub(1),
            b':' if paren_depth == 0 => return Some(idx),
            _ => {}
        }
    }

    None
}

fn normalize_value(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    let mut last_was_space = false;
    let mut escape = false;

    for ch in input.trim().chars() {
        if let Some(open) = quote {
            out.push(ch);
            if !escape && ch == '\\' {
                escape = true;
            } else if !escape && ch == open {
                quote = None;
            } else {
                escape = false;
            }
            continue;
        }

        if ch == '\'' || ch == '"' {
            quote = Some(ch);
            last_was_space = false;
            out.push(ch);
            continue;
        }

        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }

        last_was_space = false;
        out.push(ch);
    }

    out.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::InlineStyle;
    use super::parse_percentage;
    use super::parse_px_length;

    #[test]
    fn parses_multiline_style_blocks() {
        let style = InlineStyle::parse(
            "\n        position: absolute;\n        top: 0.5rem;\n        color: var(--md-default-fg-color--light);\n      ",
        );
        assert_eq!(style.len(), 3);
        assert_eq!(style.get("position"), Some("absolute"));
        assert_eq!(style.get("COLOR"), Some("var(--md-default-fg-color--light)"));
        assert_eq!(
            style.to_css_text(),
            "position: absolute; top: 0.5rem; color: var(--md-default-fg-color--light);"
        );
    }

    #[test]
    fn keeps_semicolons_inside_urls_and_strings() {
        let style = InlineStyle::parse(
            r#"background-image: url("data:image/svg+xml;utf8,<svg></svg>"); content: 'a;b'"#,
        );
        assert_eq!(style.len(), 2);
        assert_eq!(
            style.get("background-image"),
            Some(r#"url("data:image/svg+xml;utf8,<svg></svg>")"#)
        );
        assert_eq!(style.get("content"), Some("'a;b'"));
    }

    #[test]
    fn set_replaces_in_place_and_empty_value_removes() {
        let mut style = InlineStyle::parse("position: fixed; width: 10%; height: 3px");
        style.set("width", "42.5%");
        assert_eq!(
            style.to_css_text(),
            "position: fixed; width: 42.5%; height: 3px;"
        );

        style.set("height", "");
        assert_eq!(style.get("height"), None);
        assert_eq!(style.len(), 2);
    }

    #[test]
    fn tracks_important_flag() {
        let style = InlineStyle::parse("cursor: pointer !important; color: red");
        assert_eq!(style.get("cursor"), Some("pointer"));
        assert!(style.declarations()[0].important);
        assert_eq!(style.to_css_text(), "cursor: pointer !important; color: red;");
    }

    #[test]
    fn skips_malformed_declarations() {
        let style = InlineStyle::parse("color; : red; width: ; margin: 0 auto");
        assert_eq!(style.len(), 1);
        assert_eq!(style.get("margin"), Some("0 auto"));
    }

    #[test]
    fn parses_lengths_and_percentages() {
        assert_eq!(parse_px_length("640px"), Some(640.0));
        assert_eq!(parse_px_length(" 12.5 "), Some(12.5));
        assert_eq!(parse_px_length("90%"), None);
        assert_eq!(parse_px_length("-4px"), None);
        assert_eq!(parse_percentage("90%"), Some(0.9));
        assert_eq!(parse_percentage("90px"), None);
    }
}
