//! Per-frame scheduling.
//!
//! Each frame runs three passes in a fixed order: the smoothed scroll offset is
//! advanced, every animator recomputes its state from that offset, and only
//! then does any animator write to the page. Animators that depend on another
//! animator's published state (a gallery reading its section's visibility flag)
//! must be registered after it.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::bounds::{Layout, Viewport};
use crate::smooth::SmoothScroll;
use crate::zone::{ScrollZone, ZoneRegistry};

/// Inputs shared by every animator for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub offset: f64,
    pub dt_secs: f64,
    pub now_secs: f64,
    pub viewport: Viewport,
}

/// Pointer input forwarded to animators, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Move { x: f64, y: f64 },
    Down { x: f64, y: f64 },
    Up,
    Click { x: f64, y: f64 },
    Leave,
}

/// Measures trigger elements. Keys are the selectors animators were built with.
pub trait LayoutSource {
    fn layout(&self, key: &str) -> Option<Layout>;
}

impl LayoutSource for HashMap<String, Layout> {
    fn layout(&self, key: &str) -> Option<Layout> {
        self.get(key).copied()
    }
}

pub trait Animator {
    fn name(&self) -> &str;

    fn zones(&self) -> Vec<&ScrollZone> {
        Vec::new()
    }

    /// Re-resolves cached boundaries after the viewport or layout changed.
    fn refresh(&mut self, _layouts: &dyn LayoutSource, _viewport: &Viewport) {}

    fn input(&mut self, _event: &PointerInput) {}

    fn recompute(&mut self, frame: &Frame);

    fn write(&mut self);
}

/// Owns the scroll provider and every scroll-driven animator of a page.
pub struct Choreographer {
    scroll: SmoothScroll,
    animators: Vec<Box<dyn Animator>>,
    registry: ZoneRegistry,
    viewport: Viewport,
    last_now: Option<f64>,
    last_frame: Option<Frame>,
}

impl Choreographer {
    pub fn new(scroll: SmoothScroll, viewport: Viewport) -> Self {
        Self {
            scroll,
            animators: Vec::new(),
            registry: ZoneRegistry::default(),
            viewport,
            last_now: None,
            last_frame: None,
        }
    }

    pub fn register(&mut self, animator: Box<dyn Animator>) {
        debug!(animator = animator.name(), "animator registered");
        self.animators.push(animator);
        self.registry.rebuild(self.animators.iter().flat_map(|a| a.zones()));
    }

    pub fn scroll(&self) -> &SmoothScroll {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut SmoothScroll {
        &mut self.scroll
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn animator_count(&self) -> usize {
        self.animators.len()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.last_frame
    }

    /// Zone id of the pinned section currently holding the viewport.
    pub fn active_pin(&self) -> Option<&str> {
        self.last_frame.and_then(|frame| self.registry.active_pin(frame.offset))
    }

    pub fn input(&mut self, event: PointerInput) {
        for animator in &mut self.animators {
            animator.input(&event);
        }
    }

    /// Runs one frame. `now_ms` comes from the frame clock.
    pub fn frame(&mut self, now_ms: f64) -> Frame {
        let now_secs = now_ms / 1000.0;
        let dt_secs = self
            .last_now
            .map(|last| (now_secs - last).clamp(0.0, 0.1))
            .unwrap_or(0.0);
        self.last_now = Some(now_secs);

        let offset = self.scroll.tick(dt_secs);
        let frame = Frame { offset, dt_secs, now_secs, viewport: self.viewport };

        for animator in &mut self.animators {
            animator.recompute(&frame);
        }
        for animator in &mut self.animators {
            animator.write();
        }
        self.last_frame = Some(frame);
        frame
    }

    /// Viewport resize: every boundary is recomputed before the next frame.
    pub fn resize(&mut self, viewport: Viewport, layouts: &dyn LayoutSource, scroll_limit: f64) {
        info!(width = viewport.width, height = viewport.height, "viewport refresh");
        self.viewport = viewport;
        self.scroll.set_limit(scroll_limit);
        for animator in &mut self.animators {
            animator.refresh(layouts, &viewport);
        }
        self.registry.rebuild(self.animators.iter().flat_map(|a| a.zones()));
    }

    /// Drops every animator. Listener and timer guards held by the browser
    /// binding are released alongside.
    pub fn teardown(&mut self) {
        debug!(count = self.animators.len(), "choreographer teardown");
        self.animators.clear();
        self.last_now = None;
        self.last_frame = None;
    }
}
