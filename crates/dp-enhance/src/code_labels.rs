//! Language badges in the top-right corner of highlighted code blocks.

use std::sync::OnceLock;

use dp_dom::Document;
use dp_dom::NodeId;
use regex::Regex;
use tracing::debug;

use crate::config::Selectors;
use crate::style::create_styled;
use crate::style::set_style_property;
use crate::style::theme;

pub const LABEL_CLASS: &str = "code-language-label";

/// Extracts `<name>` from the first `language-<name>` in a class attribute.
pub fn language_from_class(class_attr: &str) -> Option<&str> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RE
        .get_or_init(|| Regex::new(r"language-([A-Za-z0-9_]+)").ok())
        .as_ref()?;
    re.captures(class_attr)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Labels each code block carrying a language class; returns how many were labelled.
pub fn label_code_blocks(document: &mut Document, selectors: &Selectors) -> usize {
    let blocks = document.query_selector_all(document.root(), &selectors.code_block);

    let mut labelled = 0_usize;
    for block in blocks {
        let Some(language) = document
            .attr(block, "class")
            .and_then(language_from_class)
            .map(str::to_uppercase)
        else {
            continue;
        };
        if has_label(document, block) {
            continue;
        }

        let label = create_styled(
            document,
            "div",
            Some(LABEL_CLASS),
            &[
                ("position", "absolute"),
                ("top", "0.5rem"),
                ("right", "0.5rem"),
                ("font-size", "0.7rem"),
                ("color", theme::FG_LIGHT),
                ("text-transform", "uppercase"),
                ("letter-spacing", "0.05em"),
            ],
        );
        document.set_text_content(label, language.as_str());

        set_style_property(document, block, "position", "relative");
        let first = document.first_child(block);
        if let Err(error) = document.insert_before(block, label, first) {
            debug!(%error, "failed to insert code label");
            continue;
        }
        labelled = labelled.saturating_add(1);
    }

    labelled
}

fn has_label(document: &Document, block: NodeId) -> bool {
    document
        .children(block)
        .iter()
        .find(|child| document.is_element(**child))
        .is_some_and(|child| document.has_class(*child, LABEL_CLASS))
}

#[cfg(test)]
mod tests {
    use super::LABEL_CLASS;
    use super::label_code_blocks;
    use super::language_from_class;
    use crate::config::EnhancerConfig;
    use crate::config::Selectors;
    use dp_dom::Document;
    use dp_dom::NodeId;

    fn selectors() -> Selectors {
        match EnhancerConfig::default().compile() {
            Ok(selectors) => selectors,
            Err(error) => panic!("{error}"),
        }
    }

    fn code_block(doc: &mut Document, class_attr: &str) -> NodeId {
        let block = doc.create_element("div");
        doc.set_attr(block, "class", class_attr);
        let pre = doc.create_element("pre");
        assert!(doc.append_child(doc.root(), block).is_ok());
        assert!(doc.append_child(block, pre).is_ok());
        block
    }

    #[test]
    fn extracts_language_names() {
        assert_eq!(language_from_class("language-python highlight"), Some("python"));
        assert_eq!(language_from_class("highlight language-c_cpp"), Some("c_cpp"));
        assert_eq!(language_from_class("language-yaml+jinja"), Some("yaml"));
        assert_eq!(language_from_class("highlight"), None);
        assert_eq!(language_from_class("language-"), None);
    }

    #[test]
    fn inserts_uppercase_label_as_first_child() {
        let mut doc = Document::new();
        let block = code_block(&mut doc, "language-bash highlight");

        assert_eq!(label_code_blocks(&mut doc, &selectors()), 1);
        let Some(label) = doc.first_child(block) else {
            panic!("label should be inserted");
        };
        assert!(doc.has_class(label, LABEL_CLASS));
        assert_eq!(doc.text_content(label), "BASH");
        assert_eq!(doc.attr(block, "style"), Some("position: relative;"));
        assert!(doc.attr(label, "style").is_some_and(|style| style.contains("position: absolute;")));
    }

    #[test]
    fn skips_blocks_without_language() {
        let mut doc = Document::new();
        let block = code_block(&mut doc, "highlight");

        assert_eq!(label_code_blocks(&mut doc, &selectors()), 0);
        assert_eq!(doc.children(block).len(), 1);
        assert_eq!(doc.attr(block, "style"), None);
    }

    #[test]
    fn does_not_label_twice() {
        let mut doc = Document::new();
        let block = code_block(&mut doc, "language-rust highlight");
        let selectors = selectors();

        assert_eq!(label_code_blocks(&mut doc, &selectors), 1);
        assert_eq!(label_code_blocks(&mut doc, &selectors), 0);
        assert_eq!(doc.children(block).len(), 2);
    }
}
