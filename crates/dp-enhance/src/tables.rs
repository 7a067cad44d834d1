//! Scroll hints under tables wider than their wrapper.

use dp_dom::NodeId;
use tracing::debug;

use crate::config::Selectors;
use crate::host::PageHost;
use crate::style::create_styled;
use crate::style::set_style_property;
use crate::style::theme;

pub const HINT_CLASS: &str = "table-scroll-hint";
/// Set on a table once its hint has been appended.
pub const HINTED_ATTR: &str = "data-scroll-hint";

/// Appends a hint to the wrapper of every overflowing table; returns how many.
pub fn hint_overflowing_tables<H: PageHost>(
    host: &mut H,
    selectors: &Selectors,
    hint_text: &str,
) -> usize {
    // Layout is read for every table before the first write.
    let overflowing: Vec<(NodeId, NodeId)> = {
        let document = host.document();
        document
            .query_selector_all(document.root(), &selectors.table)
            .into_iter()
            .filter(|table| document.attr(*table, HINTED_ATTR).is_none())
            .filter_map(|table| {
                let wrapper = document.parent_element(table)?;
                let table_width = host.offset_width(table)?;
                let wrapper_width = host.offset_width(wrapper)?;
                (table_width > wrapper_width).then_some((table, wrapper))
            })
            .collect()
    };

    let document = host.document_mut();
    let mut hinted = 0_usize;
    for (table, wrapper) in overflowing {
        set_style_property(document, wrapper, "position", "relative");
        let hint = create_styled(
            document,
            "div",
            Some(HINT_CLASS),
            &[
                ("text-align", "center"),
                ("font-size", "0.7rem"),
                ("color", theme::FG_LIGHTER),
                ("padding", "0.25rem"),
                ("margin-top", "0.25rem"),
            ],
        );
        document.set_text_content(hint, hint_text);
        if let Err(error) = document.append_child(wrapper, hint) {
            debug!(%error, "failed to append table hint");
            continue;
        }
        document.set_attr(table, HINTED_ATTR, "");
        hinted = hinted.saturating_add(1);
    }

    hinted
}
