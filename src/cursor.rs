//! Custom cursor dot and project-link hover detection.
//!
//! The dot is positioned under the pointer. Whatever sits beneath it is
//! re-checked every frame at the last known position, so content moving under
//! a still pointer (scrolling, pinned sections, the gallery) still enters and
//! leaves project links.

use tracing::debug;

use crate::capability::DeviceCapabilities;
use crate::frame::{Animator, Frame, PointerInput};
use crate::style::{css_number, StyleTarget, Styled};

/// A project link found under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectHit {
    /// Index of the project element among all link-carrying elements.
    pub panel: usize,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorEvent {
    /// Synthesized enter for the interactive video inside `panel`.
    Enter { panel: usize, link: String },
    /// Synthesized leave for every interactive video.
    Leave,
    /// Open `link` in a new tab.
    Open(String),
    HideNative,
    ShowNative,
}

/// The page as seen by the cursor: hit testing and event delivery.
pub trait CursorSurface {
    fn project_at(&self, x: f64, y: f64) -> Option<ProjectHit>;

    fn dispatch(&mut self, event: CursorEvent);
}

/// Dot position before the pointer has been seen.
const OFFSCREEN: (f64, f64) = (-9999.0, -9999.0);

pub struct CustomCursor<S, T> {
    surface: S,
    dot: Styled<T>,
    position: Option<(f64, f64)>,
    hovered: Option<ProjectHit>,
    native_hidden: bool,
}

impl<S: CursorSurface, T: StyleTarget> CustomCursor<S, T> {
    /// `None` on touch devices, where the native cursor is left alone.
    pub fn new(mut surface: S, dot: T, caps: DeviceCapabilities) -> Option<Self> {
        if !caps.supports_hover() {
            debug!("custom cursor disabled on touch device");
            return None;
        }
        surface.dispatch(CursorEvent::HideNative);
        Some(Self { surface, dot: Styled::new(dot), position: None, hovered: None, native_hidden: true })
    }

    pub fn hovered(&self) -> Option<&ProjectHit> {
        self.hovered.as_ref()
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        self.position
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Re-runs the hit test at the last known pointer position.
    pub fn recheck(&mut self) {
        let Some((x, y)) = self.position else { return };
        let hit = self.surface.project_at(x, y);
        match (&self.hovered, hit) {
            (None, Some(hit)) => {
                debug!(panel = hit.panel, link = %hit.link, "cursor entered project");
                self.surface.dispatch(CursorEvent::Enter { panel: hit.panel, link: hit.link.clone() });
                self.hovered = Some(hit);
            }
            (Some(_), None) => {
                self.surface.dispatch(CursorEvent::Leave);
                self.hovered = None;
            }
            // Moving straight from one project onto another keeps the first
            // hover until the pointer crosses empty space.
            _ => {}
        }
    }

    fn click(&mut self) {
        if let Some(hit) = &self.hovered {
            if !hit.link.is_empty() {
                self.surface.dispatch(CursorEvent::Open(hit.link.clone()));
            }
        }
    }
}

impl<S: CursorSurface, T: StyleTarget> Animator for CustomCursor<S, T> {
    fn name(&self) -> &str {
        "cursor"
    }

    fn input(&mut self, event: &PointerInput) {
        match *event {
            PointerInput::Move { x, y } | PointerInput::Down { x, y } => {
                self.position = Some((x, y));
                if !self.native_hidden {
                    self.surface.dispatch(CursorEvent::HideNative);
                    self.native_hidden = true;
                }
                self.recheck();
            }
            PointerInput::Click { .. } => self.click(),
            PointerInput::Leave => {
                self.surface.dispatch(CursorEvent::ShowNative);
                self.native_hidden = false;
            }
            PointerInput::Up => {}
        }
    }

    fn recompute(&mut self, _frame: &Frame) {
        self.recheck();
    }

    fn write(&mut self) {
        let (x, y) = self.position.unwrap_or(OFFSCREEN);
        self.dot.write("transform", &format!("translate3d({}px, {}px, 0)", css_number(x), css_number(y)));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::bounds::Viewport;
    use crate::style::RecordingTarget;

    /// One project box per entry: `(left, right, link)` across the full height.
    #[derive(Clone, Default)]
    struct FakeSurface {
        boxes: Rc<RefCell<Vec<(f64, f64, String)>>>,
        events: Rc<RefCell<Vec<CursorEvent>>>,
    }

    impl CursorSurface for FakeSurface {
        fn project_at(&self, x: f64, _y: f64) -> Option<ProjectHit> {
            self.boxes
                .borrow()
                .iter()
                .enumerate()
                .find(|(_, (left, right, _))| x >= *left && x < *right)
                .map(|(panel, (_, _, link))| ProjectHit { panel, link: link.clone() })
        }

        fn dispatch(&mut self, event: CursorEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    fn frame() -> Frame {
        Frame { offset: 0.0, dt_secs: 0.016, now_secs: 0.0, viewport: Viewport::default() }
    }

    fn surface() -> FakeSurface {
        let surface = FakeSurface::default();
        surface.boxes.borrow_mut().push((100.0, 300.0, "https://example.com/a".to_string()));
        surface.boxes.borrow_mut().push((500.0, 700.0, "https://example.com/b".to_string()));
        surface
    }

    #[test]
    fn disabled_on_touch() {
        let surface = surface();
        assert!(CustomCursor::new(surface.clone(), RecordingTarget::new(), DeviceCapabilities::TOUCH).is_none());
        assert!(surface.events.borrow().is_empty());
    }

    #[test]
    fn dot_follows_pointer() {
        let dot = RecordingTarget::new();
        let mut cursor = CustomCursor::new(surface(), dot.clone(), DeviceCapabilities::DESKTOP).unwrap();
        cursor.write();
        assert_eq!(dot.last("transform").unwrap(), "translate3d(-9999px, -9999px, 0)");
        cursor.input(&PointerInput::Move { x: 12.5, y: 40.0 });
        cursor.write();
        assert_eq!(dot.last("transform").unwrap(), "translate3d(12.5px, 40px, 0)");
    }

    #[test]
    fn enter_leave_and_open() {
        let surface = surface();
        let mut cursor = CustomCursor::new(surface.clone(), RecordingTarget::new(), DeviceCapabilities::DESKTOP).unwrap();
        cursor.input(&PointerInput::Move { x: 50.0, y: 10.0 });
        cursor.input(&PointerInput::Click { x: 50.0, y: 10.0 });
        cursor.input(&PointerInput::Move { x: 550.0, y: 10.0 });
        cursor.input(&PointerInput::Click { x: 550.0, y: 10.0 });
        cursor.input(&PointerInput::Move { x: 400.0, y: 10.0 });

        let events = surface.events.borrow().clone();
        assert_eq!(
            events,
            vec![
                CursorEvent::HideNative,
                CursorEvent::Enter { panel: 1, link: "https://example.com/b".to_string() },
                CursorEvent::Open("https://example.com/b".to_string()),
                CursorEvent::Leave,
            ]
        );
    }

    #[test]
    fn content_moving_under_still_pointer_is_detected() {
        let surface = surface();
        let mut cursor = CustomCursor::new(surface.clone(), RecordingTarget::new(), DeviceCapabilities::DESKTOP).unwrap();
        cursor.input(&PointerInput::Move { x: 400.0, y: 10.0 });
        assert!(cursor.hovered().is_none());

        surface.boxes.borrow_mut()[0] = (350.0, 450.0, "https://example.com/a".to_string());
        cursor.recompute(&frame());
        assert_eq!(cursor.hovered().map(|hit| hit.panel), Some(0));
        cursor.recompute(&frame());
        let enters = surface.events.borrow().iter().filter(|e| matches!(e, CursorEvent::Enter { .. })).count();
        assert_eq!(enters, 1);
    }

    #[test]
    fn leaving_window_restores_native_cursor() {
        let surface = surface();
        let mut cursor = CustomCursor::new(surface.clone(), RecordingTarget::new(), DeviceCapabilities::DESKTOP).unwrap();
        cursor.input(&PointerInput::Leave);
        cursor.input(&PointerInput::Move { x: 1.0, y: 1.0 });
        let events = surface.events.borrow().clone();
        assert_eq!(events, vec![CursorEvent::HideNative, CursorEvent::ShowNative, CursorEvent::HideNative]);
    }
}
