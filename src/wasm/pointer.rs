use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, MouseEvent, MouseEventInit, Window};

use super::dom;
use crate::capability::DeviceCapabilities;
use crate::config::CursorConfig;
use crate::cursor::{CursorEvent, CursorSurface, ProjectHit};
use crate::error::{MotionError, Result};
use crate::reveal::{tokenize, HoverSignal, HoverState, PanelReveal, RevealConfig};

/// Hit testing and event delivery against the live document.
pub struct DomCursorSurface {
    window: Window,
    document: Document,
    dot: HtmlElement,
    config: CursorConfig,
}

impl DomCursorSurface {
    pub fn new(window: &Window, document: &Document, dot: &HtmlElement, config: &CursorConfig) -> Self {
        Self { window: window.clone(), document: document.clone(), dot: dot.clone(), config: config.clone() }
    }

    fn link_selector(&self) -> String {
        format!("[{}]", self.config.link_attribute)
    }

    fn synthesize(target: &Element, kind: &str) {
        let init = MouseEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        match MouseEvent::new_with_mouse_event_init_dict(kind, &init) {
            Ok(event) => {
                if target.dispatch_event(&event).is_err() {
                    tracing::debug!(kind, "synthesized event rejected");
                }
            }
            Err(err) => tracing::debug!(kind, ?err, "could not build event"),
        }
    }

    fn set_root_class(&self, on: bool) {
        let Some(root) = self.document.document_element() else { return };
        if root.class_list().toggle_with_force(&self.config.hide_class, on).is_err() {
            tracing::debug!("could not toggle native cursor class");
        }
    }
}

impl CursorSurface for DomCursorSurface {
    fn project_at(&self, x: f64, y: f64) -> Option<ProjectHit> {
        let selector = self.link_selector();
        let hit = self.document.element_from_point(x as f32, y as f32)?;
        let project = hit.closest(&selector).ok().flatten()?;
        let link = project.get_attribute(&self.config.link_attribute).unwrap_or_default();
        let node: &web_sys::Node = &project;
        let panel = dom::query_all(&self.document, &selector)
            .iter()
            .position(|candidate| candidate.is_same_node(Some(node)))
            .unwrap_or(0);
        Some(ProjectHit { panel, link })
    }

    fn dispatch(&mut self, event: CursorEvent) {
        match event {
            CursorEvent::Enter { panel, .. } => {
                if self.dot.class_list().add_1(&self.config.visit_class).is_err() {
                    tracing::debug!("could not mark cursor as visiting");
                }
                let projects = dom::query_all(&self.document, &self.link_selector());
                if let Some(project) = projects.get(panel) {
                    if let Some(container) = dom::query_within(project, &self.config.video_container).first() {
                        Self::synthesize(container, "mouseenter");
                    }
                }
            }
            CursorEvent::Leave => {
                if self.dot.class_list().remove_1(&self.config.visit_class).is_err() {
                    tracing::debug!("could not clear cursor visit mark");
                }
                for container in dom::query_all(&self.document, &self.config.video_container) {
                    Self::synthesize(&container, "mouseleave");
                }
            }
            CursorEvent::Open(link) => {
                if let Err(err) = self.window.open_with_url_and_target(&link, "_blank") {
                    tracing::warn!(link, ?err, "could not open project link");
                }
            }
            CursorEvent::HideNative => self.set_root_class(true),
            CursorEvent::ShowNative => self.set_root_class(false),
        }
    }
}

impl Drop for DomCursorSurface {
    fn drop(&mut self) {
        self.set_root_class(false);
    }
}

/// Replaces the text of `element` with one inline-block span per word and
/// returns the spans.
fn split_words(document: &Document, element: &Element) -> Result<Vec<HtmlElement>> {
    let text = element.text_content().unwrap_or_default();
    element.set_text_content(None);
    let mut words = Vec::new();
    for token in tokenize(&text) {
        let mask = document.create_element("span")?;
        mask.set_class_name("word-mask");
        let word = document.create_element("span")?.dyn_into::<HtmlElement>().map_err(|_| MotionError::Js("could not create word span".into()))?;
        word.set_class_name("word");
        word.set_text_content(Some(&token.word));
        mask.append_child(&word)?;
        element.append_child(&mask)?;
        if !token.trailing.is_empty() {
            element.append_child(&document.create_text_node(&token.trailing))?;
        }
        words.push(word);
    }
    Ok(words)
}

/// Builds the word reveal for `panel`, together with the hover signal its
/// enter and leave listeners feed.
pub fn panel_reveal(
    document: &Document,
    panel: &HtmlElement,
    index: usize,
    cursor: &CursorConfig,
    config: RevealConfig,
    caps: DeviceCapabilities,
) -> Result<Option<(PanelReveal<HtmlElement>, HoverSignal)>> {
    if !caps.supports_hover() {
        return Ok(None);
    }
    let mut title = Vec::new();
    for element in dom::query_within(panel, &cursor.reveal_title) {
        title.extend(split_words(document, &element)?);
    }
    let mut subtitle = Vec::new();
    for element in dom::query_within(panel, &cursor.reveal_subtitle) {
        subtitle.extend(split_words(document, &element)?);
    }
    Ok(PanelReveal::new(format!("reveal-{index}"), config, title, subtitle, caps).map(|reveal| {
        let signal = reveal.signal();
        (reveal, signal)
    }))
}

pub fn hover_callback(signal: HoverSignal, state: HoverState) -> impl FnMut(web_sys::Event) + 'static {
    move |_event| signal.request(state)
}
