use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Window};

use crate::bounds::{Layout, Viewport};
use crate::error::{MotionError, Result};
use crate::frame::LayoutSource;

pub fn viewport(window: &Window) -> Viewport {
    let width = window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(0.0);
    Viewport::new(width, height)
}

pub fn scroll_offset(window: &Window) -> f64 {
    window.scroll_y().unwrap_or(0.0)
}

/// Largest reachable scroll offset.
pub fn scroll_limit(window: &Window, document: &Document) -> f64 {
    let height = document.document_element().map(|root| root.scroll_height() as f64).unwrap_or(0.0);
    (height - viewport(window).height).max(0.0)
}

pub fn query(document: &Document, selector: &str) -> Result<HtmlElement> {
    document
        .query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or_else(|| MotionError::missing(selector))
}

pub fn query_all(document: &Document, selector: &str) -> Vec<HtmlElement> {
    match document.query_selector_all(selector) {
        Ok(list) => html_elements(&list),
        Err(_) => {
            tracing::warn!(selector, "invalid selector");
            Vec::new()
        }
    }
}

pub fn query_within(root: &Element, selector: &str) -> Vec<HtmlElement> {
    match root.query_selector_all(selector) {
        Ok(list) => html_elements(&list),
        Err(_) => {
            tracing::warn!(selector, "invalid selector");
            Vec::new()
        }
    }
}

fn html_elements(list: &web_sys::NodeList) -> Vec<HtmlElement> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect()
}

/// Document position of `element`, ignoring transforms so a pinned or
/// translated trigger keeps measuring where it sits in the flow.
pub fn layout_of(element: &HtmlElement) -> Layout {
    let mut top = 0.0;
    let mut current = Some(element.clone());
    while let Some(el) = current {
        top += el.offset_top() as f64;
        current = el.offset_parent().and_then(|parent| parent.dyn_into::<HtmlElement>().ok());
    }
    Layout::new(top, element.offset_height() as f64)
}

pub fn data_number(element: &Element, attribute: &str) -> Option<f64> {
    element.get_attribute(attribute)?.trim().parse().ok()
}

/// Measures triggers by selector at the moment they are asked for. `"body"`
/// measures the whole document.
pub struct DomLayouts {
    document: Document,
}

impl DomLayouts {
    pub fn new(document: &Document) -> Self {
        Self { document: document.clone() }
    }

    pub fn require(&self, selector: &str) -> Result<Layout> {
        self.layout(selector).ok_or_else(|| MotionError::missing(selector))
    }
}

impl LayoutSource for DomLayouts {
    fn layout(&self, key: &str) -> Option<Layout> {
        if key == "body" {
            let height = self.document.document_element()?.scroll_height() as f64;
            return Some(Layout::new(0.0, height));
        }
        query(&self.document, key).ok().map(|el| layout_of(&el))
    }
}
