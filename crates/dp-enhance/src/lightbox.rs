//! Click-to-enlarge for content images.

use dp_css::parse_px_length;
use dp_dom::Document;
use dp_dom::NodeId;
use dp_layout::Viewport;
use tracing::debug;

use crate::config::Selectors;
use crate::events::Listener;
use crate::events::ListenerRegistry;
use crate::links::within;
use crate::style::create_styled;
use crate::style::set_style_property;

pub const OVERLAY_CLASS: &str = "lightbox-overlay";
pub const IMAGE_CLASS: &str = "lightbox-image";

/// Makes content images clickable; returns how many gained a listener.
pub fn enable_lightbox(
    document: &mut Document,
    selectors: &Selectors,
    listeners: &mut ListenerRegistry,
) -> usize {
    let images: Vec<NodeId> = document
        .query_selector_all(document.root(), &selectors.image)
        .into_iter()
        .filter(|image| within(document, *image, selectors))
        .collect();

    let mut enabled = 0_usize;
    for image in images {
        if !listeners.add(image, Listener::OpenLightbox) {
            continue;
        }
        set_style_property(document, image, "cursor", "pointer");
        enabled = enabled.saturating_add(1);
    }
    enabled
}

/// Scales `(width, height)` down to fit `(max_width, max_height)`, keeping the aspect ratio.
/// Images that already fit keep their size.
pub fn fit_within(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
        return (0.0, 0.0);
    }
    let scale = (max_width / width).min(max_height / height).min(1.0);
    if !scale.is_finite() || scale <= 0.0 {
        return (0.0, 0.0);
    }
    (width * scale, height * scale)
}

/// Builds an overlay showing a copy of `image` and appends it to `<body>`.
pub fn open_lightbox(
    document: &mut Document,
    image: NodeId,
    viewport: Viewport,
    viewport_fraction: f32,
    listeners: &mut ListenerRegistry,
) -> Option<NodeId> {
    let src = document.attr(image, "src").unwrap_or_default().to_owned();
    let alt = document.attr(image, "alt").map(str::to_owned);
    let intrinsic = document
        .attr(image, "width")
        .and_then(parse_px_length)
        .zip(document.attr(image, "height").and_then(parse_px_length));

    let parent = document
        .body()
        .or_else(|| document.document_element())
        .unwrap_or_else(|| document.root());

    let overlay = create_styled(
        document,
        "div",
        Some(OVERLAY_CLASS),
        &[
            ("position", "fixed"),
            ("top", "0"),
            ("left", "0"),
            ("width", "100%"),
            ("height", "100%"),
            ("background", "rgba(0, 0, 0, 0.9)"),
            ("display", "flex"),
            ("align-items", "center"),
            ("justify-content", "center"),
            ("z-index", "9999"),
            ("cursor", "zoom-out"),
        ],
    );

    let enlarged = create_styled(
        document,
        "img",
        Some(IMAGE_CLASS),
        &[
            ("max-width", "90%"),
            ("max-height", "90%"),
            ("object-fit", "contain"),
        ],
    );
    document.set_attr(enlarged, "src", src.as_str());
    if let Some(alt) = alt {
        document.set_attr(enlarged, "alt", alt);
    }
    if let Some((width, height)) = intrinsic {
        let (width, height) = fit_within(
            width,
            height,
            viewport.width * viewport_fraction,
            viewport.height * viewport_fraction,
        );
        if width > 0.0 && height > 0.0 {
            set_style_property(document, enlarged, "width", &format!("{}px", width.round()));
            set_style_property(document, enlarged, "height", &format!("{}px", height.round()));
        }
    }

    if let Err(error) = document
        .append_child(overlay, enlarged)
        .and_then(|()| document.append_child(parent, overlay))
    {
        debug!(%error, "failed to attach lightbox overlay");
        return None;
    }

    listeners.add(overlay, Listener::CloseOverlay);
    debug!(%src, "opened lightbox");
    Some(overlay)
}

/// Removes an overlay and every listener inside it.
pub fn close_lightbox(document: &mut Document, overlay: NodeId, listeners: &mut ListenerRegistry) {
    listeners.remove_subtree(document, overlay);
    document.detach(overlay);
    debug!(overlay = overlay.index(), "closed lightbox");
}

#[cfg(test)]
mod tests {
    use super::IMAGE_CLASS;
    use super::OVERLAY_CLASS;
    use super::close_lightbox;
    use super::enable_lightbox;
    use super::fit_within;
    use super::open_lightbox;
    use crate::config::EnhancerConfig;
    use crate::config::Selectors;
    use crate::events::Listener;
    use crate::events::ListenerRegistry;
    use crate::style::inline_style;
    use dp_dom::Document;
    use dp_dom::NodeId;
    use dp_layout::Viewport;

    fn selectors() -> Selectors {
        match EnhancerConfig::default().compile() {
            Ok(selectors) => selectors,
            Err(error) => panic!("{error}"),
        }
    }

    fn page_with_image() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let content = doc.create_element("article");
        doc.set_attr(content, "class", "md-content");
        let image = doc.create_element("img");
        doc.set_attr(image, "src", "/assets/diagram.png");
        doc.set_attr(image, "alt", "Diagram");
        assert!(doc.append_child(doc.root(), body).is_ok());
        assert!(doc.append_child(body, content).is_ok());
        assert!(doc.append_child(content, image).is_ok());
        (doc, body, image)
    }

    #[test]
    fn fits_large_images_and_keeps_small_ones() {
        assert_eq!(fit_within(2000.0, 1000.0, 1000.0, 1000.0), (1000.0, 500.0));
        assert_eq!(fit_within(1000.0, 2000.0, 1000.0, 500.0), (250.0, 500.0));
        assert_eq!(fit_within(200.0, 100.0, 1000.0, 1000.0), (200.0, 100.0));
        assert_eq!(fit_within(0.0, 100.0, 1000.0, 1000.0), (0.0, 0.0));
    }

    #[test]
    fn enables_only_content_images() {
        let (mut doc, body, image) = page_with_image();
        let logo = doc.create_element("img");
        doc.set_attr(logo, "src", "/logo.svg");
        assert!(doc.append_child(body, logo).is_ok());

        let mut listeners = ListenerRegistry::new();
        assert_eq!(enable_lightbox(&mut doc, &selectors(), &mut listeners), 1);
        assert_eq!(listeners.listeners(image), &[Listener::OpenLightbox]);
        assert_eq!(inline_style(&doc, image).get("cursor"), Some("pointer"));
        assert_eq!(doc.attr(logo, "style"), None);

        assert_eq!(enable_lightbox(&mut doc, &selectors(), &mut listeners), 0);
    }

    #[test]
    fn overlay_holds_a_copy_of_the_image() {
        let (mut doc, body, image) = page_with_image();
        let mut listeners = ListenerRegistry::new();

        let Some(overlay) = open_lightbox(&mut doc, image, Viewport::default(), 0.9, &mut listeners)
        else {
            panic!("overlay should open");
        };
        assert_eq!(doc.parent(overlay), Some(body));
        assert!(doc.has_class(overlay, OVERLAY_CLASS));
        assert_eq!(inline_style(&doc, overlay).get("z-index"), Some("9999"));

        let Some(copy) = doc.first_child(overlay) else {
            panic!("overlay should hold the image");
        };
        assert!(doc.has_class(copy, IMAGE_CLASS));
        assert_eq!(doc.attr(copy, "src"), Some("/assets/diagram.png"));
        assert_eq!(doc.attr(copy, "alt"), Some("Diagram"));
        assert_eq!(listeners.listeners(overlay), &[Listener::CloseOverlay]);
    }

    #[test]
    fn declared_dimensions_are_fitted_to_the_viewport() {
        let (mut doc, _, image) = page_with_image();
        doc.set_attr(image, "width", "3200");
        doc.set_attr(image, "height", "1600");
        let mut listeners = ListenerRegistry::new();
        let viewport = Viewport {
            width: 1000.0,
            height: 1000.0,
        };

        let Some(overlay) = open_lightbox(&mut doc, image, viewport, 0.9, &mut listeners) else {
            panic!("overlay should open");
        };
        let Some(copy) = doc.first_child(overlay) else {
            panic!("overlay should hold the image");
        };
        let style = inline_style(&doc, copy);
        assert_eq!(style.get("width"), Some("900px"));
        assert_eq!(style.get("height"), Some("450px"));
    }

    #[test]
    fn closing_detaches_overlay_and_listeners() {
        let (mut doc, body, image) = page_with_image();
        let mut listeners = ListenerRegistry::new();
        let children_before = doc.children(body).to_vec();

        let Some(overlay) = open_lightbox(&mut doc, image, Viewport::default(), 0.9, &mut listeners)
        else {
            panic!("overlay should open");
        };
        close_lightbox(&mut doc, overlay, &mut listeners);

        assert!(!doc.is_connected(overlay));
        assert_eq!(doc.children(body), children_before.as_slice());
        assert!(listeners.is_empty());
    }

    #[test]
    fn images_without_src_open_an_empty_overlay() {
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let image = doc.create_element("img");
        assert!(doc.append_child(doc.root(), body).is_ok());
        assert!(doc.append_child(body, image).is_ok());
        let mut listeners = ListenerRegistry::new();

        let Some(overlay) = open_lightbox(&mut doc, image, Viewport::default(), 0.9, &mut listeners)
        else {
            panic!("overlay should open");
        };
        let Some(copy) = doc.first_child(overlay) else {
            panic!("overlay should hold the image");
        };
        assert_eq!(doc.attr(copy, "src"), Some(""));
        assert_eq!(doc.parent(overlay), Some(body));
        assert_eq!(listeners.listeners(overlay), &[Listener::CloseOverlay]);
    }
}
