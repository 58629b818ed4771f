use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{HtmlElement, HtmlVideoElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use super::dom;
use super::listeners::{Listener, Timer};
use crate::capability::DeviceCapabilities;
use crate::error::{MotionError, Result};
use crate::media::{LazyMedia, MediaCommand, MediaProps};

struct Slot {
    media: LazyMedia,
    container: HtmlElement,
    video: HtmlVideoElement,
    observer: Option<IntersectionObserver>,
    timer: Option<Timer>,
    unlock: Vec<Listener>,
    /// Unlock listeners that fired and detached themselves; released on the
    /// next arm or on teardown.
    retired: Vec<Listener>,
    play_signal: u32,
}

/// A lazily loaded background video bound to its container element.
pub struct LazyVideo {
    slot: Rc<RefCell<Slot>>,
    _listeners: Vec<Listener>,
    _observer_callback: Option<Closure<dyn FnMut(js_sys::Array)>>,
}

fn now_ms() -> f64 {
    web_sys::window().and_then(|w| w.performance()).map(|p| p.now()).unwrap_or(0.0)
}

impl LazyVideo {
    pub fn attach(container: HtmlElement, defaults: &MediaProps, caps: DeviceCapabilities) -> Result<Self> {
        let props = defaults.with_attributes(|name| container.get_attribute(name));
        if props.src.is_empty() {
            return Err(MotionError::missing("[data-src]"));
        }
        let video = match dom::query_within(&container, "video").into_iter().next() {
            Some(video) => video.dyn_into::<HtmlVideoElement>().map_err(|_| MotionError::Js("not a video element".into()))?,
            None => {
                let document = container.owner_document().ok_or_else(|| MotionError::Js("detached container".into()))?;
                let video = document
                    .create_element("video")?
                    .dyn_into::<HtmlVideoElement>()
                    .map_err(|_| MotionError::Js("could not create video element".into()))?;
                container.append_child(&video)?;
                video
            }
        };
        video.set_muted(props.muted);
        video.set_loop(props.looping);
        video.set_attribute("playsinline", "")?;
        if let Some(poster) = &props.poster {
            video.set_poster(poster);
        }
        video.style().set_property("object-fit", props.fit.as_css())?;

        let needs_observer = props.needs_observer();
        let threshold = props.threshold;
        let slot = Rc::new(RefCell::new(Slot {
            media: LazyMedia::new(props, caps),
            container: container.clone(),
            video: video.clone(),
            observer: None,
            timer: None,
            unlock: Vec::new(),
            retired: Vec::new(),
            play_signal: 0,
        }));

        let weak = Rc::downgrade(&slot);
        slot.borrow_mut().timer = Some(Timer::new(move || {
            with_slot(&weak, |slot| slot.media.tick(now_ms()));
            if let Some(slot) = weak.upgrade() {
                schedule_debounce(&slot);
            }
        }));

        let listeners = vec![
            Listener::new(&video, "loadeddata", handler(&slot, |slot| slot.media.loaded()))?,
            Listener::new(&video, "error", handler(&slot, |slot| slot.media.failed()))?,
            Listener::new(&video, "ended", handler(&slot, |slot| {
                slot.media.ended();
                Vec::new()
            }))?,
            Listener::new(&container, "click", handler(&slot, |slot| slot.media.tap()))?,
            Listener::new(&container, "mouseenter", handler(&slot, |slot| {
                slot.play_signal = slot.play_signal.wrapping_add(1);
                let signal = slot.play_signal;
                slot.media.set_play_signal(signal)
            }))?,
        ];

        let observer_callback = if needs_observer {
            let weak = Rc::downgrade(&slot);
            let callback = Closure::wrap(Box::new(move |entries: js_sys::Array| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else { continue };
                    let ratio = if entry.is_intersecting() { entry.intersection_ratio() } else { 0.0 };
                    with_slot(&weak, |slot| slot.media.intersection(ratio, now_ms()));
                }
                if let Some(slot) = weak.upgrade() {
                    schedule_debounce(&slot);
                }
            }) as Box<dyn FnMut(js_sys::Array)>);
            let init = IntersectionObserverInit::new();
            let thresholds = js_sys::Array::of2(&JsValue::from_f64(0.0), &JsValue::from_f64(threshold));
            init.set_threshold(&thresholds);
            let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
            observer.observe(&container);
            slot.borrow_mut().observer = Some(observer);
            Some(callback)
        } else {
            None
        };

        let commands = slot.borrow_mut().media.start();
        apply(&slot, commands);

        Ok(Self { slot, _listeners: listeners, _observer_callback: observer_callback })
    }
}

impl Drop for LazyVideo {
    fn drop(&mut self) {
        if let Some(observer) = self.slot.borrow_mut().observer.take() {
            observer.disconnect();
        }
        let commands = self.slot.borrow_mut().media.teardown();
        apply(&self.slot, commands);
        let mut slot = self.slot.borrow_mut();
        slot.timer.take();
        slot.unlock.clear();
        slot.retired.clear();
    }
}

fn handler(slot: &Rc<RefCell<Slot>>, mut input: impl FnMut(&mut Slot) -> Vec<MediaCommand> + 'static) -> impl FnMut(web_sys::Event) + 'static {
    let weak = Rc::downgrade(slot);
    move |_event| with_slot(&weak, &mut input)
}

fn with_slot(weak: &Weak<RefCell<Slot>>, input: impl FnOnce(&mut Slot) -> Vec<MediaCommand>) {
    let Some(slot) = weak.upgrade() else { return };
    let commands = input(&mut slot.borrow_mut());
    apply(&slot, commands);
}

fn schedule_debounce(slot: &Rc<RefCell<Slot>>) {
    let slot = slot.borrow();
    let (Some(due), Some(timer)) = (slot.media.next_due(), slot.timer.as_ref()) else { return };
    if let Err(err) = timer.schedule(due - now_ms()) {
        tracing::warn!(%err, "could not schedule visibility debounce");
    }
}

fn apply(slot: &Rc<RefCell<Slot>>, commands: Vec<MediaCommand>) {
    for command in commands {
        if let Err(err) = execute(slot, command) {
            tracing::warn!(%err, "media command failed");
        }
    }
}

fn set_class(element: &HtmlElement, class: &str, on: bool) -> Result<()> {
    element.class_list().toggle_with_force(class, on)?;
    Ok(())
}

fn execute(rc: &Rc<RefCell<Slot>>, command: MediaCommand) -> Result<()> {
    let mut slot = rc.borrow_mut();
    match command {
        MediaCommand::ShowPoster => set_class(&slot.container, "is-poster", true)?,
        MediaCommand::ShowLoader => set_class(&slot.container, "is-loading", true)?,
        MediaCommand::AssignSource { src, preload } => {
            set_class(&slot.container, "is-poster", false)?;
            slot.video.set_preload(preload.as_attr());
            slot.video.set_src(&src);
        }
        MediaCommand::Play => {
            let promise = slot.video.play()?;
            let weak = Rc::downgrade(rc);
            spawn_local(async move {
                if JsFuture::from(promise).await.is_err() {
                    with_slot(&weak, |slot| slot.media.play_rejected());
                }
            });
        }
        MediaCommand::Pause => slot.video.pause()?,
        MediaCommand::ArmGestureUnlock => {
            // Fires ahead of the container's own click; the controller drops
            // the second play request that click would make.
            slot.retired.clear();
            let unlock = Listener::new(&slot.container, "pointerup", handler(rc, |slot| slot.media.tap()))?;
            slot.unlock = vec![unlock];
        }
        MediaCommand::DisarmGestureUnlock => {
            let unlock = std::mem::take(&mut slot.unlock);
            unlock.iter().for_each(Listener::detach);
            slot.retired.extend(unlock);
        }
        MediaCommand::Reveal => {
            set_class(&slot.container, "is-loading", false)?;
            set_class(&slot.container, "is-ready", true)?;
        }
        MediaCommand::ShowFallback => {
            set_class(&slot.container, "is-loading", false)?;
            set_class(&slot.container, "is-error", true)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;
    use web_sys::Event;

    fn container() -> HtmlElement {
        let document = web_sys::window().unwrap().document().unwrap();
        let container = document.create_element("div").unwrap().dyn_into::<HtmlElement>().unwrap();
        container.set_attribute("data-src", "clip.mp4").unwrap();
        container
    }

    fn video_in(container: &HtmlElement) -> HtmlVideoElement {
        container.query_selector("video").unwrap().unwrap().dyn_into::<HtmlVideoElement>().unwrap()
    }

    fn interact(container: &HtmlElement) {
        container.dispatch_event(&Event::new("mouseenter").unwrap()).unwrap();
        container.click();
    }

    #[wasm_bindgen_test]
    fn click_on_live_video_assigns_source() {
        let container = container();
        let _video = LazyVideo::attach(container.clone(), &MediaProps::default(), DeviceCapabilities::DESKTOP).unwrap();
        let video = video_in(&container);
        assert_eq!(video.get_attribute("src"), None);

        interact(&container);
        assert_eq!(video.get_attribute("src").as_deref(), Some("clip.mp4"));
        assert!(container.class_list().contains("is-loading"));
    }

    #[wasm_bindgen_test]
    fn dropped_video_ignores_interaction() {
        let container = container();
        let lazy = LazyVideo::attach(container.clone(), &MediaProps::default(), DeviceCapabilities::TOUCH).unwrap();
        assert!(container.class_list().contains("is-poster"));
        drop(lazy);

        interact(&container);
        assert_eq!(video_in(&container).get_attribute("src"), None);
        assert!(!container.class_list().contains("is-loading"));
    }

    #[wasm_bindgen_test]
    fn container_without_source_is_rejected() {
        let container = container();
        container.remove_attribute("data-src").unwrap();
        assert!(LazyVideo::attach(container, &MediaProps::default(), DeviceCapabilities::DESKTOP).is_err());
    }
}
