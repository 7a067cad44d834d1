//! External links open in a new browsing context without opener or referrer.

use dp_dom::Document;
use dp_dom::NodeId;
use tracing::warn;
use url::Url;

use crate::config::HostMatch;
use crate::config::Selectors;

pub const EXTERNAL_TARGET: &str = "_blank";
pub const EXTERNAL_REL: &str = "noopener noreferrer";

/// Marks every external `http*` link in the content area; returns how many changed.
pub fn mark_external_links(
    document: &mut Document,
    selectors: &Selectors,
    page_hostname: &str,
    host_match: HostMatch,
) -> usize {
    let candidates: Vec<NodeId> = document
        .query_selector_all(document.root(), &selectors.external_link)
        .into_iter()
        .filter(|link| within(document, *link, selectors))
        .collect();

    let mut marked = 0_usize;
    for link in candidates {
        let Some(href) = document.attr(link, "href") else {
            continue;
        };
        let Some(link_host) = link_hostname(href) else {
            warn!(href, "skipping link with unparsable href");
            continue;
        };
        if host_match.is_internal(&link_host, page_hostname) {
            continue;
        }

        let already = document.attr(link, "target") == Some(EXTERNAL_TARGET)
            && document.attr(link, "rel") == Some(EXTERNAL_REL);
        if already {
            continue;
        }

        document.set_attr(link, "target", EXTERNAL_TARGET);
        document.set_attr(link, "rel", EXTERNAL_REL);
        marked = marked.saturating_add(1);
    }

    marked
}

/// True when some ancestor of `node` matches the content-area selector.
pub(crate) fn within(document: &Document, node: NodeId, selectors: &Selectors) -> bool {
    let mut cursor = document.parent_element(node);
    while let Some(ancestor) = cursor {
        if selectors.content.matches(document, ancestor) {
            return true;
        }
        cursor = document.parent_element(ancestor);
    }
    false
}

fn link_hostname(href: &str) -> Option<String> {
    let parsed = Url::parse(href.trim()).ok()?;
    Some(parsed.host_str().unwrap_or_default().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::EXTERNAL_REL;
    use super::mark_external_links;
    use crate::config::EnhancerConfig;
    use crate::config::HostMatch;
    use crate::config::Selectors;
    use dp_dom::Document;
    use dp_dom::NodeId;

    fn selectors() -> Selectors {
        match EnhancerConfig::default().compile() {
            Ok(selectors) => selectors,
            Err(error) => panic!("{error}"),
        }
    }

    fn page_with_links(hrefs: &[&str]) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let content = doc.create_element("div");
        doc.set_attr(content, "class", "md-content");
        assert!(doc.append_child(doc.root(), content).is_ok());
        let links = hrefs
            .iter()
            .map(|href| {
                let link = doc.create_element("a");
                doc.set_attr(link, "href", *href);
                assert!(doc.append_child(content, link).is_ok());
                link
            })
            .collect();
        (doc, content, links)
    }

    #[test]
    fn marks_only_foreign_hosts() {
        let (mut doc, _, links) = page_with_links(&[
            "https://github.com/org/repo",
            "https://docs.example.com/guide/",
            "/relative/",
        ]);

        let marked = mark_external_links(&mut doc, &selectors(), "docs.example.com", HostMatch::Contains);
        assert_eq!(marked, 1);
        assert_eq!(doc.attr(links[0], "target"), Some("_blank"));
        assert_eq!(doc.attr(links[0], "rel"), Some(EXTERNAL_REL));
        assert_eq!(doc.attr(links[1], "target"), None);
        assert_eq!(doc.attr(links[2], "rel"), None);
    }

    #[test]
    fn substring_matching_treats_lookalike_hosts_as_internal() {
        let (mut doc, _, links) = page_with_links(&["https://docs.example.com.evil.net/"]);

        mark_external_links(&mut doc, &selectors(), "docs.example.com", HostMatch::Contains);
        assert_eq!(doc.attr(links[0], "target"), None);

        mark_external_links(&mut doc, &selectors(), "docs.example.com", HostMatch::Exact);
        assert_eq!(doc.attr(links[0], "target"), Some("_blank"));
    }

    #[test]
    fn ignores_links_outside_content_area() {
        let (mut doc, _, _) = page_with_links(&[]);
        let nav = doc.create_element("a");
        doc.set_attr(nav, "href", "https://github.com/");
        assert!(doc.append_child(doc.root(), nav).is_ok());

        let marked = mark_external_links(&mut doc, &selectors(), "docs.example.com", HostMatch::Contains);
        assert_eq!(marked, 0);
        assert_eq!(doc.attr(nav, "target"), None);
    }

    #[test]
    fn second_run_changes_nothing() {
        let (mut doc, _, _) = page_with_links(&["http://example.org", "https://[bad"]);
        let selectors = selectors();
        assert_eq!(mark_external_links(&mut doc, &selectors, "docs.test", HostMatch::Contains), 1);
        assert_eq!(mark_external_links(&mut doc, &selectors, "docs.test", HostMatch::Contains), 0);
    }
}
