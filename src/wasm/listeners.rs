use std::cell::Cell;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

use crate::error::{MotionError, Result};

/// An attached event listener. Dropping it detaches the callback.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new(target: &EventTarget, event: &'static str, callback: impl FnMut(Event) + 'static) -> Result<Self> {
        Self::with_options(target, event, true, callback)
    }

    /// A listener that may call `prevent_default`.
    pub fn active(target: &EventTarget, event: &'static str, callback: impl FnMut(Event) + 'static) -> Result<Self> {
        Self::with_options(target, event, false, callback)
    }

    fn with_options(target: &EventTarget, event: &'static str, passive: bool, callback: impl FnMut(Event) + 'static) -> Result<Self> {
        let callback = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self { target: target.clone(), event, callback })
    }
}

impl Listener {
    /// Stops delivery without releasing the callback, for listeners that
    /// retire themselves from inside their own callback.
    pub fn detach(&self) {
        if self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
            .is_err()
        {
            tracing::debug!(event = self.event, "listener already detached");
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.detach();
    }
}

/// A reusable `setTimeout` slot. The callback lives as long as the timer, so it
/// may reschedule itself.
pub struct Timer {
    callback: Closure<dyn FnMut()>,
    id: Cell<Option<i32>>,
}

impl Timer {
    pub fn new(callback: impl FnMut() + 'static) -> Self {
        Self { callback: Closure::wrap(Box::new(callback) as Box<dyn FnMut()>), id: Cell::new(None) }
    }

    /// Replaces any pending run with one `delay_ms` from now.
    pub fn schedule(&self, delay_ms: f64) -> Result<()> {
        self.cancel();
        let window = web_sys::window().ok_or_else(|| MotionError::Js("no window".into()))?;
        let id = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            self.callback.as_ref().unchecked_ref(),
            delay_ms.max(0.0).ceil() as i32,
        )?;
        self.id.set(Some(id));
        Ok(())
    }

    pub fn cancel(&self) {
        if let (Some(id), Some(window)) = (self.id.take(), web_sys::window()) {
            window.clear_timeout_with_handle(id);
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
