//! Wires the choreography to the live page.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement, MouseEvent, WheelEvent, Window};

use super::dom::{self, DomLayouts};
use super::listeners::Listener;
use super::pointer::{self, DomCursorSurface};
use super::render::{self, FrameLoop};
use super::video::LazyVideo;
use crate::bounds::Viewport;
use crate::capability::DeviceCapabilities;
use crate::config::{SiteConfig, CONFIG_ELEMENT_ID};
use crate::cursor::CustomCursor;
use crate::error::{MotionError, Result};
use crate::frame::{Animator, Choreographer, PointerInput};
use crate::gallery::HorizontalGallery;
use crate::hero::{BlurLink, HeroPan, ModelRotation};
use crate::logging;
use crate::reveal::HoverState;
use crate::section::{SectionAnimator, SectionConfig};
use crate::smooth::SmoothScroll;
use crate::strips::CounterStrips;
use crate::style::css_number;
use crate::visibility::visibility_flag;

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
}

/// Everything kept alive while the page is animated. Fields drop in order:
/// the frame loop stops before listeners and media are released.
struct Session {
    _frames: FrameLoop,
    _listeners: Vec<Listener>,
    _videos: Vec<LazyVideo>,
    stage: Rc<RefCell<Stage>>,
}

struct Stage {
    window: Window,
    document: Document,
    choreographer: Choreographer,
}

impl Stage {
    fn frame(&mut self, now_ms: f64) {
        let frame = self.choreographer.frame(now_ms);
        // The smoothed offset is authoritative; move the page to it.
        if (frame.offset - dom::scroll_offset(&self.window)).abs() >= 1.0 {
            self.window.scroll_to_with_x_and_y(0.0, frame.offset);
        }
    }

    fn resize(&mut self) {
        let viewport = dom::viewport(&self.window);
        let limit = dom::scroll_limit(&self.window, &self.document);
        self.choreographer.resize(viewport, &DomLayouts::new(&self.document), limit);
    }

    fn native_scroll(&mut self) {
        if !self.choreographer.scroll().is_scrolling() {
            self.choreographer.scroll_mut().sync(dom::scroll_offset(&self.window));
        }
    }
}

/// Runs `f` on the stage unless it is already in use further up the stack
/// (events synthesized during a frame bubble back into page listeners).
fn with_stage(stage: &Weak<RefCell<Stage>>, f: impl FnOnce(&mut Stage)) {
    let Some(stage) = stage.upgrade() else { return };
    let Ok(mut stage) = stage.try_borrow_mut() else {
        tracing::trace!("stage busy, event dropped");
        return;
    };
    f(&mut stage);
}

fn load_config(document: &Document) -> Result<SiteConfig> {
    match document.get_element_by_id(CONFIG_ELEMENT_ID) {
        Some(element) => SiteConfig::from_json(&element.text_content().unwrap_or_default()),
        None => Ok(SiteConfig::default()),
    }
}

fn register<A: Animator + 'static>(choreographer: &mut Choreographer, component: &str, built: Result<A>) {
    match built {
        Ok(animator) => choreographer.register(Box::new(animator)),
        Err(err) => tracing::warn!(component, %err, "component skipped"),
    }
}

fn section(document: &Document, config: &SectionConfig, viewport: &Viewport, caps: DeviceCapabilities) -> Result<SectionAnimator<HtmlElement>> {
    let trigger = dom::query(document, &config.trigger)?;
    let config = config.clone().with_lead_duration(dom::data_number(&trigger, "data-duration"));
    let parts: Vec<Vec<HtmlElement>> = config
        .parts
        .iter()
        .map(|part| {
            if part.global {
                dom::query_all(document, &part.selector)
            } else {
                dom::query_within(&trigger, &part.selector)
            }
        })
        .collect();
    SectionAnimator::new(&config, trigger.clone(), parts, dom::layout_of(&trigger), viewport, caps)
}

pub fn start() -> Result<()> {
    let window = web_sys::window().ok_or_else(|| MotionError::Js("no window".into()))?;
    let document = window.document().ok_or_else(|| MotionError::Js("no document".into()))?;

    let loaded = load_config(&document);
    logging::init(loaded.as_ref().map(|c| c.log_level.as_str()).unwrap_or("info"))?;
    let config = loaded.unwrap_or_else(|err| {
        tracing::warn!(%err, "page configuration ignored, using defaults");
        SiteConfig::default()
    });

    let caps = DeviceCapabilities::detect(&window);
    let viewport = dom::viewport(&window);
    let layouts = DomLayouts::new(&document);
    let scroll = SmoothScroll::new(config.smooth, dom::scroll_limit(&window, &document));
    let mut choreographer = Choreographer::new(scroll, viewport);
    choreographer.scroll_mut().sync(dom::scroll_offset(&window));

    // Hero.
    let hero = &config.hero;
    let blur_targets: Vec<HtmlElement> = hero.blur_targets.iter().flat_map(|selector| dom::query_all(&document, selector)).collect();
    register(
        &mut choreographer,
        "hero blur",
        layouts.require(&hero.blur_trigger).and_then(|layout| BlurLink::new(hero, blur_targets, layout, &viewport, caps)),
    );
    register(&mut choreographer, "hero pan", dom::query(&document, &hero.pan_target).map(|el| HeroPan::new(hero, el, viewport)));
    for model in &hero.models {
        register(
            &mut choreographer,
            "hero model",
            dom::query(&document, &model.selector).map(|el| ModelRotation::new(model, el, viewport)),
        );
    }

    // Sections, then the gallery behind the section that reveals it.
    for section_config in &config.sections {
        register(&mut choreographer, &section_config.name, section(&document, section_config, &viewport, caps));
    }
    let gallery = &config.gallery;
    let (writer, reader) = visibility_flag();
    match section(&document, &gallery.reveal, &viewport, caps) {
        Ok(reveal) => {
            choreographer.register(Box::new(reveal.publish_visibility(writer)));
            let built = dom::query(&document, &gallery.spacer).and_then(|spacer| {
                spacer.style().set_property("height", &format!("{}vh", css_number(gallery.spacer_height_vh)))?;
                let track = dom::query(&document, &gallery.track)?;
                let panels = dom::query_all(&document, &gallery.panels);
                HorizontalGallery::new(gallery, reader, track, panels, dom::layout_of(&spacer), &viewport, caps)
            });
            register(&mut choreographer, "gallery", built);
        }
        Err(err) => tracing::warn!(%err, "gallery skipped"),
    }

    let strips = &config.strips;
    let built = dom::query(&document, &strips.first).and_then(|first| {
        let second = dom::query(&document, &strips.second)?;
        let layout = layouts.require(&strips.trigger)?;
        CounterStrips::new(strips, first, second, layout, &viewport, caps)
    });
    register(&mut choreographer, "strips", built);

    let mut listeners = Vec::new();

    // Pointer-only layers.
    if caps.supports_hover() {
        for (index, panel) in dom::query_all(&document, &config.cursor.reveal_panel).into_iter().enumerate() {
            match pointer::panel_reveal(&document, &panel, index, &config.cursor, config.reveal, caps) {
                Ok(Some((reveal, signal))) => {
                    choreographer.register(Box::new(reveal));
                    listeners.push(Listener::new(&panel, "mouseenter", pointer::hover_callback(signal.clone(), HoverState::Hovered))?);
                    listeners.push(Listener::new(&panel, "mouseleave", pointer::hover_callback(signal, HoverState::Idle))?);
                }
                Ok(None) => {}
                Err(err) => tracing::warn!(index, %err, "word reveal skipped"),
            }
        }
        match dom::query(&document, &config.cursor.dot) {
            Ok(dot) => {
                let surface = DomCursorSurface::new(&window, &document, &dot, &config.cursor);
                if let Some(cursor) = CustomCursor::new(surface, dot, caps) {
                    choreographer.register(Box::new(cursor));
                }
            }
            Err(err) => tracing::warn!(%err, "custom cursor skipped"),
        }
    }

    let mut videos = Vec::new();
    for container in dom::query_all(&document, &config.media.selector) {
        match LazyVideo::attach(container, &config.media.defaults, caps) {
            Ok(video) => videos.push(video),
            Err(err) => tracing::warn!(%err, "lazy video skipped"),
        }
    }

    tracing::info!(animators = choreographer.animator_count(), videos = videos.len(), "choreography ready");

    let stage = Rc::new(RefCell::new(Stage { window: window.clone(), document: document.clone(), choreographer }));
    // Layout may have shifted while components were attached (spacer height, word spans).
    stage.borrow_mut().resize();

    listeners.extend(page_listeners(&window, &document, &stage, &config, caps)?);

    let weak = Rc::downgrade(&stage);
    let frames = render::start(move |now| with_stage(&weak, |stage| stage.frame(now)))?;

    let session = Session { _frames: frames, _listeners: listeners, _videos: videos, stage };
    if let Some(previous) = SESSION.with(|slot| slot.borrow_mut().replace(session)) {
        stop_session(previous);
    }
    Ok(())
}

fn page_listeners(window: &Window, document: &Document, stage: &Rc<RefCell<Stage>>, config: &SiteConfig, caps: DeviceCapabilities) -> Result<Vec<Listener>> {
    let mut listeners = Vec::new();

    if config.smooth.smooth_wheel && !caps.touch && !caps.reduced_motion {
        let weak = Rc::downgrade(stage);
        listeners.push(Listener::active(window, "wheel", move |event: Event| {
            let Some(wheel) = event.dyn_ref::<WheelEvent>() else { return };
            event.prevent_default();
            let delta_y = wheel.delta_y();
            let mode = wheel.delta_mode();
            with_stage(&weak, |stage| {
                let delta = match mode {
                    WheelEvent::DOM_DELTA_LINE => delta_y * 16.0,
                    WheelEvent::DOM_DELTA_PAGE => delta_y * stage.choreographer.viewport().height,
                    _ => delta_y,
                };
                stage.choreographer.scroll_mut().on_wheel(delta);
            });
        })?);

        // In-page links glide to their section instead of jumping.
        let weak = Rc::downgrade(stage);
        let doc = document.clone();
        listeners.push(Listener::active(document, "click", move |event: Event| {
            let Some(id) = anchor_fragment(&event) else { return };
            let Some(section) = doc.get_element_by_id(&id).and_then(|el| el.dyn_into::<HtmlElement>().ok()) else {
                tracing::debug!(%id, "anchor target not found");
                return;
            };
            event.prevent_default();
            let top = dom::layout_of(&section).top;
            with_stage(&weak, |stage| stage.choreographer.scroll_mut().scroll_to(top, false));
        })?);
    }

    let weak = Rc::downgrade(stage);
    listeners.push(Listener::new(window, "scroll", move |_| with_stage(&weak, Stage::native_scroll))?);
    let weak = Rc::downgrade(stage);
    listeners.push(Listener::new(window, "resize", move |_| with_stage(&weak, Stage::resize))?);

    let forward = |kind: &'static str, to_input: fn(&MouseEvent) -> PointerInput| -> Result<Listener> {
        let weak = Rc::downgrade(stage);
        Listener::new(window, kind, move |event: Event| {
            let Some(mouse) = event.dyn_ref::<MouseEvent>() else { return };
            let input = to_input(mouse);
            with_stage(&weak, |stage| stage.choreographer.input(input));
        })
    };
    listeners.push(forward("pointermove", |e| PointerInput::Move { x: e.client_x() as f64, y: e.client_y() as f64 })?);
    listeners.push(forward("pointerdown", |e| PointerInput::Down { x: e.client_x() as f64, y: e.client_y() as f64 })?);
    listeners.push(forward("pointerup", |_| PointerInput::Up)?);
    listeners.push(forward("click", |e| PointerInput::Click { x: e.client_x() as f64, y: e.client_y() as f64 })?);

    if let Some(root) = document.document_element() {
        let weak = Rc::downgrade(stage);
        listeners.push(Listener::new(&root, "mouseleave", move |event: Event| {
            if event.is_trusted() {
                with_stage(&weak, |stage| stage.choreographer.input(PointerInput::Leave));
            }
        })?);
    }
    Ok(listeners)
}

/// Fragment id of the in-page link an event was dispatched from.
fn anchor_fragment(event: &Event) -> Option<String> {
    let origin = event.target()?.dyn_into::<Element>().ok()?;
    let link = origin.closest("a[href^='#']").ok()??;
    let href = link.get_attribute("href")?;
    let id = href.strip_prefix('#').filter(|id| !id.is_empty())?;
    Some(id.to_string())
}

fn stop_session(session: Session) {
    tracing::info!("choreography stopped");
    session.stage.borrow_mut().choreographer.teardown();
}

/// Stops the frame loop and releases every listener, observer and timer.
pub fn stop() {
    if let Some(session) = SESSION.with(|slot| slot.borrow_mut().take()) {
        stop_session(session);
    }
}
