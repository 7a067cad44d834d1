//! Browsing-context capabilities the enhancer is given.

use dp_core::DpError;
use dp_core::DpResult;
use dp_dom::Document;
use dp_dom::NodeId;
use dp_layout::LayoutEngine;
use dp_layout::LayoutMetrics;
use dp_layout::ScrollMetrics;
use dp_layout::Viewport;
use url::Url;

/// The page the enhancer runs against: its DOM plus the window-level facts
/// (location, layout, viewport) a browser would provide.
pub trait PageHost {
    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    /// `window.location.hostname`.
    fn page_hostname(&self) -> &str;

    /// Rendered width of an element (`offsetWidth`).
    fn offset_width(&self, node: NodeId) -> Option<f32>;

    /// Scroll state when the document is scrolled to `scroll_top`.
    fn scroll_metrics(&self, scroll_top: f32) -> ScrollMetrics;

    fn viewport(&self) -> Viewport;
}

/// A parsed page measured by the estimated [`LayoutEngine`].
#[derive(Debug, Clone)]
pub struct StaticPage {
    document: Document,
    hostname: String,
    layout: LayoutEngine,
}

impl StaticPage {
    pub fn new(document: Document, page_url: &str, viewport: Viewport) -> DpResult<Self> {
        let page_url = Url::parse(page_url).map_err(|error| {
            DpError::new(
                "enhance.page_url.invalid",
                format!("failed to parse page URL `{page_url}`: {error}"),
            )
        })?;
        let hostname = page_url.host_str().unwrap_or_default().to_ascii_lowercase();

        Ok(Self {
            document,
            hostname,
            layout: LayoutEngine::new(viewport),
        })
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

impl PageHost for StaticPage {
    fn document(&self) -> &Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn page_hostname(&self) -> &str {
        &self.hostname
    }

    fn offset_width(&self, node: NodeId) -> Option<f32> {
        self.layout.offset_width(&self.document, node)
    }

    fn scroll_metrics(&self, scroll_top: f32) -> ScrollMetrics {
        self.layout.scroll_metrics(&self.document, scroll_top)
    }

    fn viewport(&self) -> Viewport {
        self.layout.viewport
    }
}


#[cfg(test)]
mod tests {
    use super::PageHost;
    use super::StaticPage;
    use dp_dom::Document;
    use dp_layout::Viewport;

    #[test]
    fn derives_lowercase_hostname_from_page_url() {
        let page = match StaticPage::new(
            Document::new(),
            "https://Docs.Example.com:8443/guide/#setup",
            Viewport::default(),
        ) {
            Ok(page) => page,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(page.page_hostname(), "docs.example.com");
    }

    #[test]
    fn file_urls_have_an_empty_hostname() {
        let page = match StaticPage::new(Document::new(), "file:///site/index.html", Viewport::default())
        {
            Ok(page) => page,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(page.page_hostname(), "");
    }

    #[test]
    fn rejects_relative_page_urls() {
        let result = StaticPage::new(Document::new(), "/guide/", Viewport::default());
        assert!(result.is_err_and(|error| error.code == "enhance.page_url.invalid"));
    }
}
