//! Momentum-smoothed scroll offset.
//!
//! Wheel deltas move a target; the offset every trigger sees eases toward
//! that target once per frame. Touch scrolling stays native and is adopted
//! through [`SmoothScroll::sync`]. This pass runs before any trigger is
//! recomputed.

use serde::{Deserialize, Serialize};

use crate::easing::Ease;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmoothScrollConfig {
    /// Seconds taken by programmatic `scroll_to` animations.
    pub duration: f64,
    /// Fraction of the remaining distance covered per 60 Hz frame.
    pub lerp: f64,
    pub wheel_multiplier: f64,
    pub smooth_wheel: bool,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            duration: 1.2,
            lerp: 0.06,
            wheel_multiplier: 1.3,
            smooth_wheel: true,
        }
    }
}

const SETTLE_PX: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
struct ScrollTween {
    from: f64,
    to: f64,
    elapsed: f64,
}

#[derive(Debug, Clone)]
pub struct SmoothScroll {
    config: SmoothScrollConfig,
    target: f64,
    animated: f64,
    limit: f64,
    tween: Option<ScrollTween>,
}

impl SmoothScroll {
    pub fn new(config: SmoothScrollConfig, limit: f64) -> Self {
        Self { config, target: 0.0, animated: 0.0, limit: limit.max(0.0), tween: None }
    }

    pub fn offset(&self) -> f64 {
        self.animated
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn is_scrolling(&self) -> bool {
        self.tween.is_some() || self.animated != self.target
    }

    pub fn set_limit(&mut self, limit: f64) {
        self.limit = limit.max(0.0);
        self.target = self.target.clamp(0.0, self.limit);
        self.animated = self.animated.clamp(0.0, self.limit);
    }

    pub fn on_wheel(&mut self, delta_y: f64) {
        self.push(delta_y * self.config.wheel_multiplier);
        if !self.config.smooth_wheel {
            self.animated = self.target;
        }
    }

    /// The page was scrolled by something other than this provider (keyboard,
    /// scrollbar drag, anchor jump): adopt the new position without easing.
    pub fn sync(&mut self, offset: f64) {
        let offset = offset.clamp(0.0, self.limit);
        self.tween = None;
        self.target = offset;
        self.animated = offset;
    }

    /// Moves to `offset`, either at once or as an expo-out tween lasting
    /// `duration` seconds (used for in-page anchor links).
    pub fn scroll_to(&mut self, offset: f64, immediate: bool) {
        let offset = offset.clamp(0.0, self.limit);
        if immediate {
            self.sync(offset);
        } else {
            self.tween = Some(ScrollTween { from: self.animated, to: offset, elapsed: 0.0 });
            self.target = offset;
        }
    }

    /// Advances the animated offset by one frame and returns it.
    pub fn tick(&mut self, dt_secs: f64) -> f64 {
        if let Some(mut tween) = self.tween.take() {
            tween.elapsed += dt_secs;
            let t = if self.config.duration > 0.0 { tween.elapsed / self.config.duration } else { 1.0 };
            self.animated = tween.from + (tween.to - tween.from) * Ease::ExpoOut.apply(t);
            if t >= 1.0 {
                self.animated = tween.to;
            } else {
                self.tween = Some(tween);
            }
            return self.animated;
        }

        // Frame-rate independent form of "cover `lerp` of the gap per 60 Hz frame".
        let blend = 1.0 - (1.0 - self.config.lerp.clamp(0.0, 1.0)).powf(dt_secs * 60.0);
        self.animated += (self.target - self.animated) * blend;
        if (self.target - self.animated).abs() < SETTLE_PX {
            self.animated = self.target;
        }
        self.animated
    }

    fn push(&mut self, delta: f64) {
        self.tween = None;
        self.target = (self.target + delta).clamp(0.0, self.limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 60.0;

    #[test]
    fn wheel_delta_is_scaled_and_clamped() {
        let mut scroll = SmoothScroll::new(SmoothScrollConfig::default(), 1000.0);
        scroll.on_wheel(100.0);
        assert!((scroll.target() - 130.0).abs() < 1e-9);
        scroll.on_wheel(-1000.0);
        assert_eq!(scroll.target(), 0.0);
        scroll.on_wheel(5000.0);
        assert_eq!(scroll.target(), 1000.0);
    }

    #[test]
    fn offset_eases_toward_target() {
        let mut scroll = SmoothScroll::new(SmoothScrollConfig::default(), 5000.0);
        scroll.on_wheel(1000.0);
        let first = scroll.tick(FRAME);
        assert!((first - 1300.0 * 0.06).abs() < 1e-6);
        let mut last = first;
        for _ in 0..400 {
            let next = scroll.tick(FRAME);
            assert!(next >= last);
            last = next;
        }
        assert_eq!(last, 1300.0);
        assert!(!scroll.is_scrolling());
    }

    #[test]
    fn scroll_to_runs_over_duration() {
        let mut scroll = SmoothScroll::new(SmoothScrollConfig::default(), 5000.0);
        scroll.scroll_to(2000.0, false);
        let midway = (0..36).map(|_| scroll.tick(FRAME)).last().unwrap();
        assert!(midway > 1000.0 && midway < 2000.0);
        for _ in 0..60 {
            scroll.tick(FRAME);
        }
        assert_eq!(scroll.offset(), 2000.0);
    }

    #[test]
    fn wheel_interrupts_scroll_to() {
        let mut scroll = SmoothScroll::new(SmoothScrollConfig::default(), 5000.0);
        scroll.scroll_to(2000.0, false);
        scroll.tick(FRAME);
        let reached = scroll.offset();
        scroll.on_wheel(-100.0);
        assert_eq!(scroll.target(), 1870.0);
        assert!(scroll.tick(FRAME) > reached);
        for _ in 0..400 {
            scroll.tick(FRAME);
        }
        assert_eq!(scroll.offset(), 1870.0);
    }

    #[test]
    fn shrinking_limit_clamps_offset() {
        let mut scroll = SmoothScroll::new(SmoothScrollConfig::default(), 5000.0);
        scroll.scroll_to(4000.0, true);
        scroll.set_limit(3000.0);
        assert_eq!(scroll.offset(), 3000.0);
        assert_eq!(scroll.target(), 3000.0);
    }
}
