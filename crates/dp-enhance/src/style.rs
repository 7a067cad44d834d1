//! `element.style` access on top of the `style` attribute.

use dp_css::InlineStyle;
use dp_dom::Document;
use dp_dom::NodeId;

/// Theme variables inserted elements refer to; they come from the site theme.
pub(crate) mod theme {
    pub const FG_LIGHT: &str = "var(--md-default-fg-color--light)";
    pub const FG_LIGHTER: &str = "var(--md-default-fg-color--lighter)";
    pub const FG_LIGHTEST: &str = "var(--md-default-fg-color--lightest)";
    pub const PRIMARY: &str = "var(--md-primary-fg-color)";
}

pub(crate) fn inline_style(document: &Document, node: NodeId) -> InlineStyle {
    document
        .attr(node, "style")
        .map(InlineStyle::parse)
        .unwrap_or_default()
}

/// `node.style[name] = value`.
pub(crate) fn set_style_property(document: &mut Document, node: NodeId, name: &str, value: &str) {
    let mut style = inline_style(document, node);
    style.set(name, value);
    write_style(document, node, &style);
}

/// `node.style.cssText = ...` from literal pairs.
pub(crate) fn set_css_text(document: &mut Document, node: NodeId, pairs: &[(&str, &str)]) {
    write_style(document, node, &InlineStyle::from_pairs(pairs));
}

fn write_style(document: &mut Document, node: NodeId, style: &InlineStyle) {
    if style.is_empty() {
        document.remove_attr(node, "style");
    } else {
        document.set_attr(node, "style", style.to_css_text());
    }
}

/// Creates a detached element with an optional class and inline style.
pub(crate) fn create_styled(
    document: &mut Document,
    tag: &str,
    class_name: Option<&str>,
    pairs: &[(&str, &str)],
) -> NodeId {
    let node = document.create_element(tag);
    if let Some(class_name) = class_name {
        document.set_attr(node, "class", class_name);
    }
    if !pairs.is_empty() {
        set_css_text(document, node, pairs);
    }
    node
}

/// Formats a percentage for a CSS `width`, trimming trailing zeros (`42.5%`).
pub(crate) fn format_percent(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}%")
}

#[cfg(test)]
mod tests {
    use super::format_percent;
    use super::inline_style;
    use super::set_style_property;
    use dp_dom::Document;

    #[test]
    fn merges_into_existing_style_attribute() {
        let mut doc = Document::new();
        let block = doc.create_element("div");
        doc.set_attr(block, "style", "margin: 0");
        set_style_property(&mut doc, block, "position", "relative");
        assert_eq!(doc.attr(block, "style"), Some("margin: 0; position: relative;"));
        assert_eq!(inline_style(&doc, block).get("position"), Some("relative"));
    }

    #[test]
    fn formats_percentages_compactly() {
        assert_eq!(format_percent(25.0), "25%");
        assert_eq!(format_percent(42.857_142), "42.86%");
        assert_eq!(format_percent(12.5), "12.5%");
        assert_eq!(format_percent(0.0), "0%");
        assert_eq!(format_percent(100.0), "100%");
    }
}
