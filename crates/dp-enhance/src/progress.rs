//! Reading-progress bar fixed to the top of the viewport.

use std::time::Duration;
use std::time::Instant;

use dp_dom::Document;
use dp_dom::NodeId;
use dp_layout::ScrollMetrics;
use tracing::debug;

use crate::style::create_styled;
use crate::style::format_percent;
use crate::style::set_style_property;
use crate::style::theme;

pub const INDICATOR_ID: &str = "reading-progress";

/// Scrolled share of the page in `[0, 100]`. Pages that cannot scroll read 0.
pub fn scroll_percent(metrics: ScrollMetrics) -> f64 {
    let distance = f64::from(metrics.scrollable_distance());
    if !(distance > 0.0) || !distance.is_finite() {
        return 0.0;
    }
    let percent = f64::from(metrics.scroll_top) / distance * 100.0;
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Sets the indicator width, creating the indicator on first use.
pub fn update_reading_progress(document: &mut Document, percent: f64) -> Option<NodeId> {
    let width = format_percent(percent);

    if let Some(existing) = document.element_by_id(INDICATOR_ID) {
        set_style_property(document, existing, "width", &width);
        return Some(existing);
    }

    let parent = document
        .body()
        .or_else(|| document.document_element())
        .unwrap_or_else(|| document.root());
    let indicator = create_styled(
        document,
        "div",
        None,
        &[
            ("position", "fixed"),
            ("top", "0"),
            ("left", "0"),
            ("width", width.as_str()),
            ("height", "3px"),
            ("background", theme::PRIMARY),
            ("z-index", "9999"),
            ("transition", "width 0.1s"),
        ],
    );
    document.set_attr(indicator, "id", INDICATOR_ID);
    if let Err(error) = document.append_child(parent, indicator) {
        debug!(%error, "failed to attach reading progress");
        return None;
    }
    debug!(%width, "created reading progress");
    Some(indicator)
}

/// Drops scroll updates that arrive within `min_interval` of the last applied one.
#[derive(Debug, Clone)]
pub struct ScrollThrottle {
    min_interval: Duration,
    last_applied: Option<Instant>,
}

impl ScrollThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_applied: None,
        }
    }

    /// Returns whether an update at `at` should be applied, recording it if so.
    pub fn admit(&mut self, at: Instant) -> bool {
        if self.min_interval.is_zero() {
            self.last_applied = Some(at);
            return true;
        }
        let due = self
            .last_applied
            .is_none_or(|last| at.saturating_duration_since(last) >= self.min_interval);
        if due {
            self.last_applied = Some(at);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use std::time::Instant;

    use super::INDICATOR_ID;
    use super::ScrollThrottle;
    use super::scroll_percent;
    use super::update_reading_progress;
    use crate::style::inline_style;
    use dp_dom::Document;
    use dp_layout::ScrollMetrics;

    fn metrics(scroll_top: f32, scroll_height: f32, client_height: f32) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    #[test]
    fn percent_of_scrollable_distance() {
        assert_eq!(scroll_percent(metrics(0.0, 2000.0, 1000.0)), 0.0);
        assert_eq!(scroll_percent(metrics(250.0, 2000.0, 1000.0)), 25.0);
        assert_eq!(scroll_percent(metrics(1000.0, 2000.0, 1000.0)), 100.0);
    }

    #[test]
    fn non_scrollable_pages_read_zero() {
        assert_eq!(scroll_percent(metrics(0.0, 800.0, 800.0)), 0.0);
        assert_eq!(scroll_percent(metrics(50.0, 600.0, 800.0)), 0.0);
        assert_eq!(scroll_percent(metrics(f32::NAN, 2000.0, 800.0)), 0.0);
    }

    #[test]
    fn overscroll_is_clamped() {
        assert_eq!(scroll_percent(metrics(1500.0, 2000.0, 1000.0)), 100.0);
        assert_eq!(scroll_percent(metrics(-40.0, 2000.0, 1000.0)), 0.0);
    }

    #[test]
    fn indicator_is_created_once_and_reused() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        assert!(doc.append_child(doc.root(), body).is_ok());

        let first = update_reading_progress(&mut doc, 10.0);
        let second = update_reading_progress(&mut doc, 42.5);
        assert!(first.is_some());
        assert_eq!(first, second);

        let Some(indicator) = first else {
            panic!("indicator should exist");
        };
        assert_eq!(doc.parent(indicator), Some(body));
        assert_eq!(doc.attr(indicator, "id"), Some(INDICATOR_ID));
        assert_eq!(inline_style(&doc, indicator).get("width"), Some("42.5%"));
        assert_eq!(inline_style(&doc, indicator).get("height"), Some("3px"));

        let indicators = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|node| doc.attr(*node, "id") == Some(INDICATOR_ID))
            .count();
        assert_eq!(indicators, 1);
    }

    #[test]
    fn zero_interval_admits_everything() {
        let mut throttle = ScrollThrottle::new(Duration::ZERO);
        let now = Instant::now();
        assert!(throttle.admit(now));
        assert!(throttle.admit(now));
    }

    #[test]
    fn throttle_drops_updates_inside_the_interval() {
        let mut throttle = ScrollThrottle::new(Duration::from_millis(100));
        let start = Instant::now();

        assert!(throttle.admit(start));
        assert!(!throttle.admit(start + Duration::from_millis(40)));
        assert!(!throttle.admit(start + Duration::from_millis(99)));
        assert!(throttle.admit(start + Duration::from_millis(100)));
        assert!(!throttle.admit(start + Duration::from_millis(150)));
    }
}
