/// What the visitor's device can do, detected once at start-up and handed to
/// every controller by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceCapabilities {
    /// Coarse pointer or touch points present. Hover effects, the custom cursor
    /// and media autoplay are all switched off when this is set.
    pub touch: bool,
    /// `prefers-reduced-motion: reduce`. Scrubbed animations follow scroll
    /// without lag and timed transitions jump to their end state.
    pub reduced_motion: bool,
}

impl DeviceCapabilities {
    pub const DESKTOP: Self = Self { touch: false, reduced_motion: false };
    pub const TOUCH: Self = Self { touch: true, reduced_motion: false };

    pub fn supports_hover(&self) -> bool {
        !self.touch
    }
}

#[cfg(target_arch = "wasm32")]
impl DeviceCapabilities {
    pub fn detect(window: &web_sys::Window) -> Self {
        let matches = |query: &str| {
            window
                .match_media(query)
                .ok()
                .flatten()
                .map(|list| list.matches())
                .unwrap_or(false)
        };
        let touch_points = window.navigator().max_touch_points() > 0;
        let touch_events = js_sys::Reflect::has(window, &"ontouchstart".into()).unwrap_or(false);
        let caps = Self {
            touch: matches("(pointer: coarse)") || touch_points || touch_events,
            reduced_motion: matches("(prefers-reduced-motion: reduce)"),
        };
        tracing::info!(touch = caps.touch, reduced_motion = caps.reduced_motion, "device capabilities");
        caps
    }
}
