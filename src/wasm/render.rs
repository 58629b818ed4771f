use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::window;

use crate::error::{MotionError, Result};

/// Handle to a running `requestAnimationFrame` loop. Dropping it cancels the
/// pending frame and releases the callback.
pub struct FrameLoop {
    callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
    pending: Rc<Cell<Option<i32>>>,
}

/// Calls `on_frame` with the frame timestamp (ms) once per display frame.
pub fn start(mut on_frame: impl FnMut(f64) + 'static) -> Result<FrameLoop> {
    // `f` holds the frame closure so it can keep requesting itself. The
    // `Option` lets the closure be created first and referenced from within.
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let pending = Rc::new(Cell::new(None));

    let g = Rc::downgrade(&f);
    let next = pending.clone();
    *f.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
        next.set(None);
        on_frame(now);

        // Schedule the next frame unless the loop was dropped meanwhile.
        let Some(f) = g.upgrade() else { return };
        let Some(window) = window() else { return };
        if let Some(callback) = f.borrow().as_ref() {
            match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                Ok(id) => next.set(Some(id)),
                Err(err) => tracing::warn!(?err, "requestAnimationFrame failed, frame loop stopped"),
            }
        }
    }) as Box<dyn FnMut(f64)>));

    let window = window().ok_or_else(|| MotionError::Js("no window".into()))?;
    let id = window.request_animation_frame(
        f.borrow()
            .as_ref()
            .ok_or_else(|| MotionError::Js("frame callback missing".into()))?
            .as_ref()
            .unchecked_ref(),
    )?;
    pending.set(Some(id));
    Ok(FrameLoop { callback: f, pending })
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let (Some(id), Some(window)) = (self.pending.take(), window()) {
            if window.cancel_animation_frame(id).is_err() {
                tracing::debug!("frame already delivered");
            }
        }
        self.callback.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    async fn sleep(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            window().unwrap().set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms).unwrap();
        });
        JsFuture::from(promise).await.unwrap();
    }

    #[wasm_bindgen_test(async)]
    async fn dropped_loop_stops_calling_back() {
        let frames = Rc::new(Cell::new(0u32));
        let counter = frames.clone();
        let running = start(move |_| counter.set(counter.get() + 1)).unwrap();

        sleep(200).await;
        assert!(frames.get() > 0);

        drop(running);
        let seen = frames.get();
        sleep(200).await;
        assert_eq!(frames.get(), seen);
    }
}
