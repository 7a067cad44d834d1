//! Enhancer configuration and its compiled selector set.

use std::time::Duration;

use dp_core::DpError;
use dp_core::DpResult;
use dp_dom::SelectorList;
use serde::Deserialize;

/// How a link hostname is compared against the page hostname.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostMatch {
    /// Internal when the link hostname contains the page hostname anywhere,
    /// so `docs.example.com.evil.net` counts as internal on `docs.example.com`.
    #[default]
    Contains,
    /// Internal only on a case-insensitive exact hostname match.
    Exact,
}

impl HostMatch {
    pub fn is_internal(self, link_host: &str, page_host: &str) -> bool {
        match self {
            Self::Contains => link_host.contains(page_host),
            Self::Exact => link_host.eq_ignore_ascii_case(page_host),
        }
    }
}

/// Switches for the individual enhancement passes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PassToggles {
    pub external_links: bool,
    pub code_labels: bool,
    pub checklist_progress: bool,
    pub table_hints: bool,
    pub lightbox: bool,
    pub reading_progress: bool,
}

impl Default for PassToggles {
    fn default() -> Self {
        Self {
            external_links: true,
            code_labels: true,
            checklist_progress: true,
            table_hints: true,
            lightbox: true,
            reading_progress: true,
        }
    }
}

/// Enhancer knobs. Defaults target MkDocs Material output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnhancerConfig {
    /// Subtree holding authored content; links and images outside it are left alone.
    pub content_selector: String,
    pub code_block_selector: String,
    pub checklist_selector: String,
    pub checklist_item_selector: String,
    pub checked_box_selector: String,
    pub table_selector: String,
    pub host_match: HostMatch,
    pub table_hint_text: String,
    /// Optional prefix for the checklist readout, rendered as `"{label}: K/N (P%)"`.
    pub checklist_label: Option<String>,
    /// Minimum gap between applied reading-progress updates; zero disables throttling.
    pub scroll_min_interval_ms: u64,
    /// Fraction of the viewport the lightbox image may occupy.
    pub lightbox_viewport_fraction: f32,
    pub passes: PassToggles,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            content_selector: ".md-content".to_owned(),
            code_block_selector: ".highlight".to_owned(),
            checklist_selector: ".task-list".to_owned(),
            checklist_item_selector: ".task-list-item".to_owned(),
            checked_box_selector: "input[type=\"checkbox\"]:checked".to_owned(),
            table_selector: "table".to_owned(),
            host_match: HostMatch::default(),
            table_hint_text: "\u{2190} scroll horizontally \u{2192}".to_owned(),
            checklist_label: None,
            scroll_min_interval_ms: 0,
            lightbox_viewport_fraction: 0.9,
            passes: PassToggles::default(),
        }
    }
}

impl EnhancerConfig {
    pub fn scroll_min_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_min_interval_ms)
    }

    pub fn validate(&self) -> DpResult<()> {
        self.compile().map(|_| ())
    }

    /// Parses every selector and checks the numeric knobs.
    pub fn compile(&self) -> DpResult<Selectors> {
        if !(self.lightbox_viewport_fraction > 0.0 && self.lightbox_viewport_fraction <= 1.0) {
            return Err(DpError::new(
                "enhance.config.invalid_fraction",
                format!(
                    "lightbox_viewport_fraction must be in (0, 1], got {}",
                    self.lightbox_viewport_fraction
                ),
            ));
        }

        if self.table_hint_text.trim().is_empty() {
            return Err(DpError::new(
                "enhance.config.empty_hint",
                "table_hint_text must not be empty",
            ));
        }

        Ok(Selectors {
            content: compile_selector("content_selector", &self.content_selector)?,
            external_link: compile_selector("external_link", "a[href^=\"http\"]")?,
            image: compile_selector("image", "img")?,
            code_block: compile_selector("code_block_selector", &self.code_block_selector)?,
            checklist: compile_selector("checklist_selector", &self.checklist_selector)?,
            checklist_item: compile_selector(
                "checklist_item_selector",
                &self.checklist_item_selector,
            )?,
            checked_box: compile_selector("checked_box_selector", &self.checked_box_selector)?,
            table: compile_selector("table_selector", &self.table_selector)?,
        })
    }
}

fn compile_selector(field: &str, source: &str) -> DpResult<SelectorList> {
    SelectorList::parse(source).map_err(|error| {
        DpError::new(
            "enhance.config.invalid_selector",
            format!("{field} `{source}` is not a supported selector: {error}"),
        )
    })
}

/// Selectors parsed once per session.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub content: SelectorList,
    pub external_link: SelectorList,
    pub image: SelectorList,
    pub code_block: SelectorList,
    pub checklist: SelectorList,
    pub checklist_item: SelectorList,
    pub checked_box: SelectorList,
    pub table: SelectorList,
}
