//! Hero layer: scroll-linked blur, pointer parallax pan and model rotation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bounds::{Layout, Viewport};
use crate::capability::DeviceCapabilities;
use crate::easing::Ease;
use crate::error::Result;
use crate::frame::{Animator, Frame, LayoutSource, PointerInput};
use crate::progress::lerp;
use crate::scrub::{Scrub, ScrubState};
use crate::style::{css_number, StyleTarget, Styled};
use crate::zone::{ScrollZone, ZoneConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeroConfig {
    pub blur_trigger: String,
    pub blur_zone: ZoneConfig,
    pub blur_max_px: f64,
    /// Elements that receive the blur filter.
    pub blur_targets: Vec<String>,
    /// Oversized layer moved opposite to the pointer.
    pub pan_target: String,
    pub pan_lerp: f64,
    pub pan_epsilon_px: f64,
    pub models: Vec<ModelConfig>,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            blur_trigger: "body".to_string(),
            blur_zone: ZoneConfig {
                scrub: Scrub::Smooth(1.0),
                ease: Ease::Linear,
                ..ZoneConfig::new("top top", "+=200vh")
            },
            blur_max_px: 100.0,
            blur_targets: vec!["[data-hero-video]".to_string(), "[data-model]".to_string()],
            pan_target: "[data-hero-pan]".to_string(),
            pan_lerp: 0.12,
            pan_epsilon_px: 0.1,
            models: vec![
                ModelConfig { selector: "[data-model='logo']".to_string(), max_rotation: 0.22, initial_rotation: [0.0; 3] },
                ModelConfig {
                    selector: "[data-model='corner']".to_string(),
                    max_rotation: 0.1,
                    initial_rotation: [0.0, 2.0, 0.0],
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelConfig {
    pub selector: String,
    /// Radians reached at the viewport edge.
    pub max_rotation: f64,
    pub initial_rotation: [f64; 3],
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { selector: String::new(), max_rotation: 0.3, initial_rotation: [0.0; 3] }
    }
}

pub fn blur_px(progress: f64, max_px: f64) -> f64 {
    progress.clamp(0.0, 1.0) * max_px
}

/// Blurs the hero media as the page scrolls away from it.
pub struct BlurLink<T> {
    trigger: String,
    max_px: f64,
    zone: ScrollZone,
    scrub: ScrubState,
    targets: Vec<Styled<T>>,
    blur: f64,
}

impl<T: StyleTarget> BlurLink<T> {
    pub fn new(config: &HeroConfig, targets: Vec<T>, layout: Layout, viewport: &Viewport, caps: DeviceCapabilities) -> Result<Self> {
        let mut zone_config = config.blur_zone.clone();
        if caps.reduced_motion {
            zone_config.scrub = Scrub::Instant;
        }
        let zone = ScrollZone::new("hero-blur", &zone_config, layout, viewport)?;
        Ok(Self {
            trigger: config.blur_trigger.clone(),
            max_px: config.blur_max_px,
            scrub: ScrubState::new(zone.scrub()),
            zone,
            targets: targets.into_iter().map(Styled::new).collect(),
            blur: 0.0,
        })
    }

    pub fn blur(&self) -> f64 {
        self.blur
    }
}

impl<T: StyleTarget> Animator for BlurLink<T> {
    fn name(&self) -> &str {
        "hero-blur"
    }

    fn zones(&self) -> Vec<&ScrollZone> {
        vec![&self.zone]
    }

    fn refresh(&mut self, layouts: &dyn LayoutSource, viewport: &Viewport) {
        match layouts.layout(&self.trigger) {
            Some(layout) => self.zone.refresh(layout, viewport),
            None => warn!(trigger = %self.trigger, "blur trigger not measurable"),
        }
    }

    fn recompute(&mut self, frame: &Frame) {
        let progress = self.scrub.advance(self.zone.progress(frame.offset).sub, frame.dt_secs);
        self.blur = blur_px(progress, self.max_px);
    }

    fn write(&mut self) {
        let filter = format!("blur({}px)", css_number(self.blur));
        for target in &mut self.targets {
            target.write("filter", &filter);
        }
    }
}

/// Pointer parallax of the hero backdrop. The layer is one viewport wider and
/// half a viewport taller than the screen; the pointer position selects which
/// part of it shows.
pub struct HeroPan<T> {
    target: Styled<T>,
    lerp: f64,
    epsilon: f64,
    viewport: Viewport,
    goal: (f64, f64),
    current: (f64, f64),
    moved: bool,
}

impl<T: StyleTarget> HeroPan<T> {
    pub fn new(config: &HeroConfig, target: T, viewport: Viewport) -> Self {
        let centre = Self::centre(&viewport);
        Self {
            target: Styled::new(target),
            lerp: config.pan_lerp,
            epsilon: config.pan_epsilon_px,
            viewport,
            goal: centre,
            current: centre,
            moved: true,
        }
    }

    fn centre(viewport: &Viewport) -> (f64, f64) {
        (-viewport.width / 2.0, -0.25 * viewport.height)
    }

    /// Backdrop offset that frames pointer position `(x, y)`.
    pub fn goal_for(viewport: &Viewport, x: f64, y: f64) -> (f64, f64) {
        let mx = x.clamp(0.0, viewport.width);
        let my = y.clamp(0.0, viewport.height);
        let gx = if viewport.width > 0.0 { -viewport.width * (mx / viewport.width) } else { 0.0 };
        let gy = if viewport.height > 0.0 { -0.5 * viewport.height * (my / viewport.height) } else { 0.0 };
        (gx, gy)
    }

    pub fn current(&self) -> (f64, f64) {
        self.current
    }

    pub fn goal(&self) -> (f64, f64) {
        self.goal
    }
}

impl<T: StyleTarget> Animator for HeroPan<T> {
    fn name(&self) -> &str {
        "hero-pan"
    }

    fn refresh(&mut self, _layouts: &dyn LayoutSource, viewport: &Viewport) {
        self.viewport = *viewport;
        self.goal = Self::centre(viewport);
    }

    fn input(&mut self, event: &PointerInput) {
        if let PointerInput::Move { x, y } = *event {
            self.goal = Self::goal_for(&self.viewport, x, y);
        }
    }

    fn recompute(&mut self, _frame: &Frame) {
        let next_x = lerp(self.current.0, self.goal.0, self.lerp);
        let next_y = lerp(self.current.1, self.goal.1, self.lerp);
        // Each axis only moves once the step is large enough to see.
        if (next_x - self.current.0).abs() > self.epsilon {
            self.current.0 = next_x;
            self.moved = true;
        }
        if (next_y - self.current.1).abs() > self.epsilon {
            self.current.1 = next_y;
            self.moved = true;
        }
    }

    fn write(&mut self) {
        if !self.moved {
            return;
        }
        self.moved = false;
        let (x, y) = self.current;
        self.target.write("transform", &format!("translate3d({}px, {}px, 0)", css_number(x), css_number(y)));
    }
}

/// Pointer-driven rotation of one hero model, exposed as CSS custom
/// properties for whichever renderer draws the model.
pub struct ModelRotation<T> {
    selector: String,
    max_rotation: f64,
    z: f64,
    target: Styled<T>,
    viewport: Viewport,
    goal: (f64, f64),
    current: (f64, f64),
    drag_from: Option<(f64, f64)>,
}

const ROTATION_LERP: f64 = 0.08;

impl<T: StyleTarget> ModelRotation<T> {
    pub fn new(config: &ModelConfig, target: T, viewport: Viewport) -> Self {
        let [x, y, z] = config.initial_rotation;
        Self {
            selector: config.selector.clone(),
            max_rotation: config.max_rotation,
            z,
            target: Styled::new(target),
            viewport,
            goal: (x, y),
            current: (x, y),
            drag_from: None,
        }
    }

    /// Current `(x, y)` rotation in radians.
    pub fn rotation(&self) -> (f64, f64) {
        self.current
    }

    pub fn goal(&self) -> (f64, f64) {
        self.goal
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    fn hover(&mut self, x: f64, y: f64) {
        let Viewport { width, height } = self.viewport;
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let nx = (x / width - 0.5) * 2.0;
        let ny = (y / height - 0.5) * 2.0;
        self.goal = (-ny * self.max_rotation, nx * self.max_rotation);
    }

    fn drag(&mut self, x: f64, y: f64) {
        let Some((px, py)) = self.drag_from else { return };
        let Viewport { width, height } = self.viewport;
        if width > 0.0 && height > 0.0 {
            let dx = (x - px) / width;
            let dy = (y - py) / height;
            self.goal.0 += -dy * self.max_rotation * 2.0;
            self.goal.1 += dx * self.max_rotation * 2.0;
        }
        self.drag_from = Some((x, y));
    }
}

impl<T: StyleTarget> Animator for ModelRotation<T> {
    fn name(&self) -> &str {
        &self.selector
    }

    fn refresh(&mut self, _layouts: &dyn LayoutSource, viewport: &Viewport) {
        self.viewport = *viewport;
    }

    fn input(&mut self, event: &PointerInput) {
        match *event {
            PointerInput::Down { x, y } => {
                debug!(model = %self.selector, "model drag start");
                self.drag_from = Some((x, y));
            }
            PointerInput::Move { x, y } if self.drag_from.is_some() => self.drag(x, y),
            PointerInput::Move { x, y } => self.hover(x, y),
            PointerInput::Up | PointerInput::Leave => self.drag_from = None,
            PointerInput::Click { .. } => {}
        }
    }

    fn recompute(&mut self, _frame: &Frame) {
        self.current.0 = lerp(self.current.0, self.goal.0, ROTATION_LERP);
        self.current.1 = lerp(self.current.1, self.goal.1, ROTATION_LERP);
    }

    fn write(&mut self) {
        self.target.write("--model-rot-x", &css_number(self.current.0));
        self.target.write("--model-rot-y", &css_number(self.current.1));
        self.target.write("--model-rot-z", &css_number(self.z));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::style::RecordingTarget;

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 800.0)
    }

    fn frame(offset: f64) -> Frame {
        Frame { offset, dt_secs: 1.0 / 60.0, now_secs: 0.0, viewport: viewport() }
    }

    #[test]
    fn blur_follows_scroll_over_two_viewports() {
        let config = HeroConfig { blur_zone: ZoneConfig { scrub: Scrub::Instant, ..HeroConfig::default().blur_zone }, ..HeroConfig::default() };
        let video = RecordingTarget::new();
        let model = RecordingTarget::new();
        let mut blur = BlurLink::new(&config, vec![video.clone(), model.clone()], Layout::new(0.0, 6000.0), &viewport(), DeviceCapabilities::DESKTOP).unwrap();

        blur.recompute(&frame(800.0));
        blur.write();
        assert_eq!(blur.blur(), 50.0);
        assert_eq!(video.last("filter").unwrap(), "blur(50px)");
        assert_eq!(model.last("filter").unwrap(), "blur(50px)");

        blur.recompute(&frame(5000.0));
        blur.write();
        assert_eq!(video.last("filter").unwrap(), "blur(100px)");

        blur.recompute(&frame(0.0));
        blur.write();
        assert_eq!(video.last("filter").unwrap(), "blur(0px)");
    }

    #[test]
    fn pan_goal_tracks_pointer_and_recentres_on_resize() {
        let target = RecordingTarget::new();
        let mut pan = HeroPan::new(&HeroConfig::default(), target.clone(), viewport());
        assert_eq!(pan.current(), (-500.0, -200.0));

        pan.input(&PointerInput::Move { x: 1000.0, y: 800.0 });
        assert_eq!(pan.goal(), (-1000.0, -400.0));
        pan.input(&PointerInput::Move { x: -20.0, y: 2000.0 });
        assert_eq!(pan.goal(), (0.0, -400.0));

        pan.refresh(&HashMap::<String, Layout>::new(), &Viewport::new(1600.0, 900.0));
        assert_eq!(pan.goal(), (-800.0, -225.0));
    }

    #[test]
    fn pan_eases_and_stops_writing_once_settled() {
        let target = RecordingTarget::new();
        let mut pan = HeroPan::new(&HeroConfig::default(), target.clone(), viewport());
        pan.input(&PointerInput::Move { x: 0.0, y: 0.0 });
        pan.recompute(&frame(0.0));
        let (x, y) = pan.current();
        assert!((x - (-500.0 * 0.88)).abs() < 1e-9);
        assert!((y - (-200.0 * 0.88)).abs() < 1e-9);

        for _ in 0..400 {
            pan.recompute(&frame(0.0));
            pan.write();
        }
        let writes = target.count("transform");
        pan.recompute(&frame(0.0));
        pan.write();
        assert_eq!(target.count("transform"), writes);
        assert!(pan.current().0.abs() < 1.0);
    }

    #[test]
    fn model_hover_sets_goal_and_is_ignored_while_dragging() {
        let config = ModelConfig { selector: "logo".into(), max_rotation: 0.2, initial_rotation: [0.0; 3] };
        let mut model = ModelRotation::new(&config, RecordingTarget::new(), viewport());
        model.input(&PointerInput::Move { x: 1000.0, y: 0.0 });
        let (gx, gy) = model.goal();
        assert!((gx - 0.2).abs() < 1e-12);
        assert!((gy - 0.2).abs() < 1e-12);

        model.input(&PointerInput::Down { x: 500.0, y: 400.0 });
        assert!(model.is_dragging());
        model.input(&PointerInput::Move { x: 600.0, y: 400.0 });
        let (gx, gy) = model.goal();
        assert!((gx - 0.2).abs() < 1e-12);
        assert!((gy - (0.2 + 0.1 * 0.2 * 2.0)).abs() < 1e-12);

        model.input(&PointerInput::Up);
        model.input(&PointerInput::Move { x: 500.0, y: 400.0 });
        assert_eq!(model.goal(), (-0.0, 0.0));
    }

    #[test]
    fn model_rotation_eases_and_exports_css_variables() {
        let config = ModelConfig { selector: "corner".into(), max_rotation: 0.1, initial_rotation: [0.0, 2.0, 0.0] };
        let target = RecordingTarget::new();
        let mut model = ModelRotation::new(&config, target.clone(), viewport());
        model.write();
        assert_eq!(target.last("--model-rot-y").unwrap(), "2");

        model.input(&PointerInput::Move { x: 500.0, y: 400.0 });
        model.recompute(&frame(0.0));
        model.write();
        assert!((model.rotation().1 - 2.0 * 0.92).abs() < 1e-12);
        assert_eq!(target.last("--model-rot-y").unwrap(), "1.84");
        assert_eq!(target.last("--model-rot-x").unwrap(), "0");
    }
}
