//! Completion readout and bar above task lists.

use dp_dom::Document;
use dp_dom::NodeId;
use tracing::debug;

use crate::config::Selectors;
use crate::style::create_styled;
use crate::style::format_percent;
use crate::style::theme;

pub const PROGRESS_CLASS: &str = "checklist-progress";
pub const PROGRESS_TEXT_CLASS: &str = "checklist-progress-text";
pub const PROGRESS_TRACK_CLASS: &str = "checklist-progress-track";
pub const PROGRESS_FILL_CLASS: &str = "checklist-progress-fill";

/// Counts for one checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistProgress {
    pub checked: usize,
    pub total: usize,
}

impl ChecklistProgress {
    /// Whole percentage, halves rounded up; `None` for an empty list.
    pub fn percent(&self) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        let ratio = self.checked as f64 / self.total as f64;
        Some((ratio * 100.0).round() as u32)
    }

    /// `K/N (P%)`.
    pub fn readout(&self) -> Option<String> {
        let percent = self.percent()?;
        Some(format!("{}/{} ({percent}%)", self.checked, self.total))
    }
}

pub fn measure(document: &Document, list: NodeId, selectors: &Selectors) -> ChecklistProgress {
    ChecklistProgress {
        checked: document
            .query_selector_all(list, &selectors.checked_box)
            .len(),
        total: document
            .query_selector_all(list, &selectors.checklist_item)
            .len(),
    }
}

/// Inserts a progress element before every non-empty checklist; returns how many.
pub fn render_checklist_progress(
    document: &mut Document,
    selectors: &Selectors,
    label: Option<&str>,
) -> usize {
    let lists = document.query_selector_all(document.root(), &selectors.checklist);

    let mut rendered = 0_usize;
    for list in lists {
        let progress = measure(document, list, selectors);
        let (Some(percent), Some(readout)) = (progress.percent(), progress.readout()) else {
            continue;
        };
        let Some(parent) = document.parent(list) else {
            continue;
        };
        if document
            .previous_element_sibling(list)
            .is_some_and(|previous| document.has_class(previous, PROGRESS_CLASS))
        {
            continue;
        }

        let text = match label {
            Some(label) => format!("{label}: {readout}"),
            None => readout,
        };
        let element = build_progress_element(document, &text, percent);
        if let Err(error) = document.insert_before(parent, element, Some(list)) {
            debug!(%error, "failed to insert checklist progress");
            continue;
        }
        rendered = rendered.saturating_add(1);
    }

    rendered
}

fn build_progress_element(document: &mut Document, text: &str, percent: u32) -> NodeId {
    let container = create_styled(document, "div", Some(PROGRESS_CLASS), &[]);

    let readout = create_styled(
        document,
        "div",
        Some(PROGRESS_TEXT_CLASS),
        &[
            ("margin-bottom", "0.5rem"),
            ("font-size", "0.8rem"),
            ("color", theme::FG_LIGHT),
        ],
    );
    document.set_text_content(readout, text);

    let track = create_styled(
        document,
        "div",
        Some(PROGRESS_TRACK_CLASS),
        &[
            ("height", "4px"),
            ("background", theme::FG_LIGHTEST),
            ("border-radius", "2px"),
            ("overflow", "hidden"),
        ],
    );

    let width = format_percent(f64::from(percent));
    let fill = create_styled(
        document,
        "div",
        Some(PROGRESS_FILL_CLASS),
        &[
            ("width", width.as_str()),
            ("height", "100%"),
            ("background", theme::PRIMARY),
            ("transition", "width 0.3s"),
        ],
    );

    // Fresh nodes under a fresh container cannot fail to attach.
    let _ = document.append_child(track, fill);
    let _ = document.append_child(container, readout);
    let _ = document.append_child(container, track);
    container
}
