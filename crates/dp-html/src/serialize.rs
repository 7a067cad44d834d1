//! DOM to HTML text.

use dp_dom::Document;
use dp_dom::NodeId;
use dp_dom::NodeKind;

use crate::is_raw_text_parent;
use crate::tokenizer::is_void;

/// Serializes every child of the document root.
pub fn serialize_document(document: &Document) -> String {
    let mut out = String::new();
    for child in document.children(document.root()) {
        write_node(document, *child, &mut out);
    }
    out
}

/// Serializes `node` and its subtree (`outerHTML`).
pub fn serialize_node(document: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(document, node, &mut out);
    out
}

fn write_node(document: &Document, node: NodeId, out: &mut String) {
    let Some(kind) = document.kind(node) else {
        return;
    };

    match kind {
        NodeKind::Document => {
            for child in document.children(node) {
                write_node(document, *child, out);
            }
        }
        NodeKind::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Text(text) => {
            let raw = document
                .parent(node)
                .is_some_and(|parent| is_raw_text_parent(document, parent));
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    escape_attribute(value, out);
                    out.push('"');
                }
            }
            out.push('>');

            if is_void(&element.tag) {
                return;
            }

            for child in document.children(node) {
                write_node(document, *child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn escape_text(input: &str, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(input: &str, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::serialize_document;
    use super::serialize_node;
    use crate::HtmlParser;

    #[test]
    fn round_trips_generated_markup() {
        let source = "<!DOCTYPE html><html><head><title>Docs</title></head>\
                      <body><!-- nav --><p class=\"lead\">A &amp; B</p><img src=\"x.png\" alt=\"\"></body></html>";
        let doc = HtmlParser.parse(source);
        assert_eq!(
            serialize_document(&doc),
            "<!DOCTYPE html><html><head><title>Docs</title></head>\
             <body><!-- nav --><p class=\"lead\">A &amp; B</p><img src=\"x.png\" alt></body></html>"
        );
    }

    #[test]
    fn escapes_inserted_text_and_attributes() {
        let mut doc = HtmlParser.parse("<div></div>");
        let Some(div) = doc.first_element_by_tag("div") else {
            panic!("div should exist");
        };
        doc.set_attr(div, "style", "font-family: \"Fira Code\"");
        doc.set_text_content(div, "\u{2190} a<b \u{2192}");
        assert_eq!(
            serialize_node(&doc, div),
            "<div style=\"font-family: &quot;Fira Code&quot;\">\u{2190} a&lt;b \u{2192}</div>"
        );
    }

    #[test]
    fn leaves_script_bodies_unescaped() {
        let doc = HtmlParser.parse("<script>a && b < c</script>");
        assert_eq!(serialize_document(&doc), "<script>a && b < c</script>");
    }
}
