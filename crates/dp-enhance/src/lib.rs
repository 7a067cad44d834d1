//! Page enhancement session: load-time passes, scroll feedback and click handling.

pub mod checklist;
pub mod code_labels;
pub mod config;
pub mod events;
pub mod host;
pub mod lightbox;
pub mod links;
pub mod progress;
pub mod tables;

mod style;

use std::time::Instant;

use dp_core::DpResult;
use dp_dom::NodeId;
use serde::Serialize;
use tracing::debug;
use tracing::info;

pub use config::EnhancerConfig;
pub use config::HostMatch;
pub use config::PassToggles;
pub use config::Selectors;
pub use events::Listener;
pub use events::ListenerRegistry;
pub use host::PageHost;
pub use host::StaticPage;
pub use progress::ScrollThrottle;

/// Entry points a browsing context delivers to the enhancer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageEvent {
    /// The DOM has been fully parsed.
    ContentReady,
    Scroll { scroll_top: f32, at: Instant },
    Click { target: NodeId },
}

/// Per-pass counts from one content-ready run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnhancementReport {
    pub links_marked: usize,
    pub code_blocks_labelled: usize,
    pub checklists_rendered: usize,
    pub tables_hinted: usize,
    pub images_enabled: usize,
}

/// What a dispatched event did.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Enhanced(EnhancementReport),
    ProgressUpdated { percent: f64 },
    /// Scroll arrived inside the throttle interval, or the pass is disabled.
    ScrollSkipped,
    Clicked {
        opened: Vec<NodeId>,
        closed: Vec<NodeId>,
    },
}

/// One page load: owns the host, the compiled config and listener state.
pub struct PageSession<H: PageHost> {
    host: H,
    config: EnhancerConfig,
    selectors: Selectors,
    listeners: ListenerRegistry,
    throttle: ScrollThrottle,
    indicator: Option<NodeId>,
}

impl<H: PageHost> PageSession<H> {
    pub fn new(host: H, config: EnhancerConfig) -> DpResult<Self> {
        let selectors = config.compile()?;
        let throttle = ScrollThrottle::new(config.scroll_min_interval());
        Ok(Self {
            host,
            config,
            selectors,
            listeners: ListenerRegistry::new(),
            throttle,
            indicator: None,
        })
    }

    pub fn dispatch(&mut self, event: PageEvent) -> EventOutcome {
        match event {
            PageEvent::ContentReady => EventOutcome::Enhanced(self.content_ready()),
            PageEvent::Scroll { scroll_top, at } => match self.scroll(scroll_top, at) {
                Some(percent) => EventOutcome::ProgressUpdated { percent },
                None => EventOutcome::ScrollSkipped,
            },
            PageEvent::Click { target } => {
                let (opened, closed) = self.click(target);
                EventOutcome::Clicked { opened, closed }
            }
        }
    }

    /// Runs every enabled load-time pass. Safe to call again; nothing is duplicated.
    pub fn content_ready(&mut self) -> EnhancementReport {
        let passes = self.config.passes.clone();
        let mut report = EnhancementReport::default();

        if passes.external_links {
            let hostname = self.host.page_hostname().to_owned();
            report.links_marked = links::mark_external_links(
                self.host.document_mut(),
                &self.selectors,
                &hostname,
                self.config.host_match,
            );
            debug!(count = report.links_marked, "marked external links");
        }

        if passes.code_labels {
            report.code_blocks_labelled =
                code_labels::label_code_blocks(self.host.document_mut(), &self.selectors);
            debug!(count = report.code_blocks_labelled, "labelled code blocks");
        }

        if passes.checklist_progress {
            report.checklists_rendered = checklist::render_checklist_progress(
                self.host.document_mut(),
                &self.selectors,
                self.config.checklist_label.as_deref(),
            );
            debug!(count = report.checklists_rendered, "rendered checklist progress");
        }

        if passes.table_hints {
            report.tables_hinted = tables::hint_overflowing_tables(
                &mut self.host,
                &self.selectors,
                &self.config.table_hint_text,
            );
            debug!(count = report.tables_hinted, "hinted overflowing tables");
        }

        if passes.lightbox {
            report.images_enabled = lightbox::enable_lightbox(
                self.host.document_mut(),
                &self.selectors,
                &mut self.listeners,
            );
            debug!(count = report.images_enabled, "enabled image lightbox");
        }

        info!(
            links = report.links_marked,
            code_blocks = report.code_blocks_labelled,
            checklists = report.checklists_rendered,
            tables = report.tables_hinted,
            images = report.images_enabled,
            "page enhanced"
        );
        report
    }

    /// Updates the reading-progress bar; `None` when the update was skipped.
    pub fn scroll(&mut self, scroll_top: f32, at: Instant) -> Option<f64> {
        if !self.config.passes.reading_progress {
            return None;
        }
        if !self.throttle.admit(at) {
            debug!(scroll_top, "scroll update throttled");
            return None;
        }

        let percent = progress::scroll_percent(self.host.scroll_metrics(scroll_top));
        self.indicator = progress::update_reading_progress(self.host.document_mut(), percent);
        Some(percent)
    }

    /// Runs the listeners a click on `target` reaches. Returns opened and closed overlays.
    pub fn click(&mut self, target: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
        let mut opened = Vec::new();
        let mut closed = Vec::new();

        let path = self.listeners.bubble_path(self.host.document(), target);
        for (node, listener) in path {
            match listener {
                Listener::OpenLightbox => {
                    let viewport = self.host.viewport();
                    if let Some(overlay) = lightbox::open_lightbox(
                        self.host.document_mut(),
                        node,
                        viewport,
                        self.config.lightbox_viewport_fraction,
                        &mut self.listeners,
                    ) {
                        opened.push(overlay);
                    }
                }
                Listener::CloseOverlay => {
                    lightbox::close_lightbox(self.host.document_mut(), node, &mut self.listeners);
                    closed.push(node);
                }
            }
        }

        (opened, closed)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// The reading-progress element, once the first scroll created it.
    pub fn indicator(&self) -> Option<NodeId> {
        self.indicator
    }
}
