//! Layout metrics: viewport, scroll position and rendered element widths.
//!
//! There is no real box tree here. [`LayoutEngine`] estimates the handful of
//! metrics the enhancer reads (`offsetWidth`, total document height) from the
//! DOM, inline styles and text lengths.

use dp_css::InlineStyle;
use dp_css::parse_px_length;
use dp_dom::Document;
use dp_dom::NodeId;
use dp_dom::NodeKind;

/// Visible area of the browsing context, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    /// Parses `WIDTHxHEIGHT`, e.g. `1280x800`.
    pub fn parse(input: &str) -> Option<Self> {
        let (width, height) = input.trim().split_once(['x', 'X'])?;
        let width = width.trim().parse::<f32>().ok()?;
        let height = height.trim().parse::<f32>().ok()?;
        (width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
            .then_some(Self { width, height })
    }
}

/// Document scroll state (`scrollTop`, `scrollHeight`, `clientHeight`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f32,
    pub scroll_height: f32,
    pub client_height: f32,
}

impl ScrollMetrics {
    /// Distance the page can scroll; zero or negative for pages that fit.
    pub fn scrollable_distance(&self) -> f32 {
        self.scroll_height - self.client_height
    }
}

/// Rendered-size queries the enhancer depends on.
pub trait LayoutMetrics {
    /// `offsetWidth` of an element, `None` for non-elements.
    fn offset_width(&self, document: &Document, node: NodeId) -> Option<f32>;

    /// Total scrollable height of the document.
    fn document_height(&self, document: &Document) -> f32;
}

/// Heuristic layout tuned for documentation pages.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEngine {
    pub viewport: Viewport,
    pub char_width: f32,
    pub line_height: f32,
    pub cell_padding: f32,
    pub block_spacing: f32,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl LayoutEngine {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            char_width: 8.0,
            line_height: 24.0,
            cell_padding: 24.0,
            block_spacing: 16.0,
        }
    }

    pub fn scroll_metrics(&self, document: &Document, scroll_top: f32) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top,
            scroll_height: self.document_height(document).max(self.viewport.height),
            client_height: self.viewport.height,
        }
    }

    fn explicit_width(&self, document: &Document, node: NodeId) -> Option<f32> {
        let from_style = document
            .attr(node, "style")
            .map(InlineStyle::parse)
            .and_then(|style| style.get("width").and_then(parse_px_length));
        from_style.or_else(|| document.attr(node, "width").and_then(parse_px_length))
    }

    fn containing_width(&self, document: &Document, node: NodeId) -> f32 {
        match document.parent_element(node) {
            Some(parent) => self
                .offset_width(document, parent)
                .unwrap_or(self.viewport.width),
            None => self.viewport.width,
        }
    }

    fn table_width(&self, document: &Document, table: NodeId, available: f32) -> f32 {
        let mut min_content = 0.0_f32;
        let mut max_content = 0.0_f32;

        for row in document.descendants(table) {
            if document.tag_name(row) != Some("tr") {
                continue;
            }
            let (row_min, row_max) = document
                .children(row)
                .iter()
                .filter(|cell| matches!(document.tag_name(**cell), Some("td" | "th")))
                .map(|cell| self.cell_widths(document, *cell))
                .fold((0.0_f32, 0.0_f32), |(min_acc, max_acc), (min, max)| {
                    (min_acc + min, max_acc + max)
                });
            min_content = min_content.max(row_min);
            max_content = max_content.max(row_max);
        }

        if min_content > available {
            min_content
        } else {
            max_content.min(available)
        }
    }

    /// (min-content, max-content) width of a cell: longest word vs whole text.
    fn cell_widths(&self, document: &Document, cell: NodeId) -> (f32, f32) {
        if let Some(explicit) = self.explicit_width(document, cell) {
            return (explicit, explicit);
        }

        let text = document.text_content(cell);
        let longest_word = text
            .split_whitespace()
            .map(|word| word.chars().count())
            .max()
            .unwrap_or(0);
        let whole = text.split_whitespace().collect::<Vec<_>>().join(" ");

        let min = longest_word as f32 * self.char_width + self.cell_padding;
        let max = whole.chars().count() as f32 * self.char_width + self.cell_padding;
        (min, max)
    }
}

impl LayoutMetrics for LayoutEngine {
    fn offset_width(&self, document: &Document, node: NodeId) -> Option<f32> {
        let tag = document.tag_name(node)?;
        let available = self.containing_width(document, node);

        if let Some(explicit) = self.explicit_width(document, node) {
            return Some(explicit);
        }

        Some(match tag {
            "table" => self.table_width(document, node, available),
            _ => available,
        })
    }

    fn document_height(&self, document: &Document) -> f32 {
        let chars_per_line = (self.viewport.width / self.char_width).max(1.0);
        let mut height = 0.0_f32;

        for node in document.descendants(document.root()) {
            match document.kind(node) {
                Some(NodeKind::Text(text)) => {
                    let raw = document
                        .tag_name(document.parent(node).unwrap_or(document.root()))
                        .is_some_and(|tag| matches!(tag, "script" | "style" | "title"));
                    if raw {
                        continue;
                    }
                    let chars = text.split_whitespace().map(str::len).sum::<usize>() as f32;
                    if chars > 0.0 {
                        height += (chars / chars_per_line).ceil() * self.line_height;
                    }
                }
                Some(NodeKind::Element(element)) => {
                    if matches!(
                        element.tag.as_str(),
                        "p" | "pre" | "table" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "div"
                    ) {
                        height += self.block_spacing;
                    }
                    if element.tag == "img" {
                        height += element
                            .attr("height")
                            .and_then(parse_px_length)
                            .unwrap_or(self.line_height * 4.0);
                    }
                }
                _ => {}
            }
        }

        height
    }
}

#[cfg(test)]
mod tests {
    use super::LayoutEngine;
    use super::LayoutMetrics;
    use super::Viewport;
    use dp_dom::Document;
    use dp_dom::NodeId;

    fn table_with_row(doc: &mut Document, parent: NodeId, cells: &[&str]) -> NodeId {
        let table = doc.create_element("table");
        let row = doc.create_element("tr");
        assert!(doc.append_child(parent, table).is_ok());
        assert!(doc.append_child(table, row).is_ok());
        for text in cells {
            let cell = doc.create_element("td");
            let content = doc.create_text(*text);
            assert!(doc.append_child(row, cell).is_ok());
            assert!(doc.append_child(cell, content).is_ok());
        }
        table
    }

    #[test]
    fn parses_viewport_strings() {
        assert_eq!(
            Viewport::parse("1024x768"),
            Some(Viewport {
                width: 1024.0,
                height: 768.0
            })
        );
        assert_eq!(Viewport::parse("0x768"), None);
        assert_eq!(Viewport::parse("wide"), None);
    }

    #[test]
    fn blocks_inherit_parent_width() {
        let mut doc = Document::new();
        let wrapper = doc.create_element("div");
        doc.set_attr(wrapper, "style", "width: 400px");
        let inner = doc.create_element("p");
        assert!(doc.append_child(doc.root(), wrapper).is_ok());
        assert!(doc.append_child(wrapper, inner).is_ok());

        let engine = LayoutEngine::new(Viewport::default());
        assert_eq!(engine.offset_width(&doc, wrapper), Some(400.0));
        assert_eq!(engine.offset_width(&doc, inner), Some(400.0));
        let text = doc.create_text("x");
        assert_eq!(engine.offset_width(&doc, text), None);
    }

    #[test]
    fn narrow_tables_fit_their_wrapper() {
        let mut doc = Document::new();
        let wrapper = doc.create_element("div");
        doc.set_attr(wrapper, "style", "width: 600px");
        assert!(doc.append_child(doc.root(), wrapper).is_ok());
        let table = table_with_row(&mut doc, wrapper, &["a", "b"]);

        let engine = LayoutEngine::default();
        let Some(width) = engine.offset_width(&doc, table) else {
            panic!("table should have a width");
        };
        assert!(width <= 600.0);
    }

    #[test]
    fn long_unbreakable_cells_overflow() {
        let mut doc = Document::new();
        let wrapper = doc.create_element("div");
        doc.set_attr(wrapper, "style", "width: 300px");
        assert!(doc.append_child(doc.root(), wrapper).is_ok());
        let long = "arn:aws:iam::123456789012:role/service-role/very-long-role-name";
        let table = table_with_row(&mut doc, wrapper, &[long, long]);

        let engine = LayoutEngine::default();
        let Some(width) = engine.offset_width(&doc, table) else {
            panic!("table should have a width");
        };
        assert!(width > 300.0);
    }

    #[test]
    fn document_height_grows_with_text() {
        let engine = LayoutEngine::default();
        let mut short = Document::new();
        let p = short.create_element("p");
        let text = short.create_text("hello");
        assert!(short.append_child(short.root(), p).is_ok());
        assert!(short.append_child(p, text).is_ok());

        let mut long = Document::new();
        let p = long.create_element("p");
        let text = long.create_text("word ".repeat(5_000));
        assert!(long.append_child(long.root(), p).is_ok());
        assert!(long.append_child(p, text).is_ok());

        assert!(engine.document_height(&long) > engine.document_height(&short));
        let metrics = engine.scroll_metrics(&short, 0.0);
        assert_eq!(metrics.scroll_height, metrics.client_height);
        assert_eq!(metrics.scrollable_distance(), 0.0);
    }
}
