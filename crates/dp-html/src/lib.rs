//! HTML parsing into, and serialization out of, the `dp-dom` tree.

mod charset;
mod serialize;
mod tokenizer;

use dp_dom::Document;
use dp_dom::NodeId;
use dp_dom::NodeKind;
use tokenizer::Token;

pub use charset::decode_html_bytes;
pub use serialize::serialize_document;
pub use serialize::serialize_node;

/// Parses raw HTML into a DOM document.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse(&self, input: &str) -> Document {
        build_tree(tokenizer::tokenize(input))
    }
}

/// Collapsed text of the first `<title>`, if any.
pub fn document_title(document: &Document) -> Option<String> {
    let title = document.first_element_by_tag("title")?;
    let collapsed = collapse_whitespace(&document.text_content(title));
    (!collapsed.is_empty()).then_some(collapsed)
}

fn build_tree(tokens: Vec<Token>) -> Document {
    let mut document = Document::new();
    let mut stack: Vec<NodeId> = vec![document.root()];

    for token in tokens {
        let current = stack.last().copied().unwrap_or(document.root());
        match token {
            Token::Doctype(name) => {
                let node = document.create_doctype(name);
                attach(&mut document, current, node);
            }
            Token::Comment(text) => {
                let node = document.create_comment(text);
                attach(&mut document, current, node);
            }
            Token::Text(text) | Token::RawText(text) => {
                let node = document.create_text(text);
                attach(&mut document, current, node);
            }
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                close_implied(&document, &mut stack, &name);
                let parent = stack.last().copied().unwrap_or(document.root());

                let element = document.create_element(&name);
                for (key, value) in attrs {
                    document.set_attr(element, &key, value);
                }
                attach(&mut document, parent, element);

                if !(self_closing || tokenizer::is_void(&name)) {
                    stack.push(element);
                }
            }
            Token::End { name } => {
                // Unmatched end tags are dropped instead of closing everything.
                let open = stack
                    .iter()
                    .rposition(|node| document.tag_name(*node) == Some(name.as_str()));
                if let Some(position) = open {
                    if position > 0 {
                        stack.truncate(position);
                    }
                }
            }
        }
    }

    document
}

fn attach(document: &mut Document, parent: NodeId, child: NodeId) {
    // Parents on the stack are always elements or the root, and `child` is fresh.
    let _ = document.append_child(parent, child);
}

/// Pops elements whose end tag HTML lets authors omit, such as `</li>` and `</p>`.
fn close_implied(document: &Document, stack: &mut Vec<NodeId>, incoming: &str) {
    let Some(top) = stack.last().copied() else {
        return;
    };
    let Some(open) = document.tag_name(top) else {
        return;
    };

    let closes = match open {
        "p" => is_block(incoming),
        "li" => incoming == "li",
        "dt" | "dd" => matches!(incoming, "dt" | "dd"),
        "tr" => incoming == "tr",
        "td" | "th" => matches!(incoming, "td" | "th" | "tr"),
        "option" => incoming == "option",
        _ => false,
    };

    if closes {
        stack.pop();
        if matches!(open, "td" | "th") && incoming == "tr" {
            close_implied(document, stack, incoming);
        }
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "details"
            | "div"
            | "dl"
            | "fieldset"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

fn collapse_whitespace(input: &str) -> String {
    input
        .split_whitespace()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// True for the node kinds the serializer writes verbatim without escaping.
pub(crate) fn is_raw_text_parent(document: &Document, node: NodeId) -> bool {
    matches!(
        document.kind(node),
        Some(NodeKind::Element(element)) if tokenizer::is_raw_text_tag(&element.tag)
    )
}
