#![cfg_attr(target_arch = "wasm32", allow(dead_code))]
//! Scroll-driven motion for the portfolio page: smoothed scrolling, pinned and
//! scrubbed section timelines, a horizontal project gallery and the pointer
//! layers (hero parallax, word reveals, custom cursor, lazy video).
//!
//! Everything outside `wasm` is plain state and arithmetic and runs on the
//! host, so `cargo test` covers it without a browser.

pub mod bounds;
pub mod capability;
pub mod config;
pub mod cursor;
pub mod easing;
pub mod error;
pub mod frame;
pub mod gallery;
pub mod hero;
pub mod logging;
pub mod media;
pub mod pose;
pub mod progress;
pub mod reveal;
pub mod scrub;
pub mod section;
pub mod smooth;
pub mod strips;
pub mod style;
pub mod visibility;
pub mod zone;

pub use error::{MotionError, Result};

// Only compile DOM bindings when targeting wasm32.
#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    #[cfg(test)]
    wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

    mod dom;
    mod listeners;
    mod page;
    mod pointer;
    mod render;
    mod video;

    // The test harness drives components itself.
    #[cfg_attr(not(test), wasm_bindgen(start))]
    pub fn main() -> Result<(), JsValue> {
        page::start().map_err(|err| JsValue::from_str(&err.to_string()))
    }

    /// Detaches every listener and stops the frame loop. Safe to call twice.
    #[wasm_bindgen]
    pub fn teardown() {
        page::stop();
    }
}

// When compiling for non-wasm targets (e.g., `cargo test` on host),
// provide an empty stub so the crate still builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn main() {}
