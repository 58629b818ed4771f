use crate::easing::Ease;

/// Output of the progress mapper for one zone at one scroll offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapped {
    /// Linear position of the offset inside `[start, end]`, clamped to `[0, 1]`.
    pub raw: f64,
    /// `raw` renormalised above the threshold, clamped to `[0, 1]`.
    pub sub: f64,
    /// `sub` passed through the zone's ease.
    pub eased: f64,
    /// Set when `raw` has not yet reached the threshold.
    pub below_threshold: bool,
}

impl Mapped {
    pub const START: Self = Self { raw: 0.0, sub: 0.0, eased: 0.0, below_threshold: true };

    pub fn is_complete(&self) -> bool {
        self.eased >= 1.0
    }
}

/// Linear progress of `offset` between `start` and `end`.
///
/// A degenerate zone (`end <= start`) counts as fully triggered.
pub fn raw_progress(offset: f64, start: f64, end: f64) -> f64 {
    if end <= start {
        return 1.0;
    }
    ((offset - start) / (end - start)).clamp(0.0, 1.0)
}

/// Maps a scroll offset to the normalised progress of a zone.
///
/// Pure and stateless: the same inputs always produce the same output, which is
/// what lets scrubbed animations run backwards as well as forwards.
pub fn map_progress(offset: f64, start: f64, end: f64, threshold: f64, ease: Ease) -> Mapped {
    let raw = raw_progress(offset, start, end);
    let threshold = threshold.clamp(0.0, 1.0);
    if raw < threshold {
        return Mapped { raw, sub: 0.0, eased: 0.0, below_threshold: true };
    }
    let sub = if threshold >= 1.0 { 1.0 } else { ((raw - threshold) / (1.0 - threshold)).clamp(0.0, 1.0) };
    Mapped { raw, sub, eased: ease.apply(sub), below_threshold: false }
}

/// Re-normalises a progress value for an element that starts `delay` later and
/// runs over the remainder of the range. Used for staggered children.
pub fn delayed(progress: f64, delay: f64) -> f64 {
    let delay = delay.clamp(0.0, 1.0);
    if delay >= 1.0 {
        return if progress >= 1.0 { 1.0 } else { 0.0 };
    }
    ((progress - delay) / (1.0 - delay)).clamp(0.0, 1.0)
}

/// Linear interpolation that lands exactly on `from` at 0 and `to` at 1.
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from * (1.0 - t) + to * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_outside_the_zone() {
        for offset in [-500.0, -1.0, 0.0] {
            assert_eq!(map_progress(offset, 0.0, 100.0, 0.0, Ease::Power2Out).eased, 0.0);
        }
        for offset in [100.0, 101.0, 10_000.0] {
            assert_eq!(map_progress(offset, 0.0, 100.0, 0.0, Ease::Power2Out).eased, 1.0);
        }
    }

    #[test]
    fn degenerate_zone_is_fully_triggered() {
        let mapped = map_progress(-50.0, 200.0, 200.0, 0.0, Ease::Linear);
        assert_eq!(mapped.raw, 1.0);
        assert_eq!(mapped.eased, 1.0);
        assert_eq!(raw_progress(0.0, 10.0, 5.0), 1.0);
    }

    #[test]
    fn threshold_scenario() {
        let mapped = map_progress(40.0, 0.0, 100.0, 0.3, Ease::Power2Out);
        assert!((mapped.raw - 0.4).abs() < 1e-12);
        assert!((mapped.sub - 0.1 / 0.7).abs() < 1e-12);
        assert!(!mapped.below_threshold);
        assert!(mapped.eased > 0.0 && mapped.eased < 1.0);
        assert_eq!(mapped.eased, Ease::Power2Out.apply(mapped.sub));
    }

    #[test]
    fn below_threshold_branch() {
        let mapped = map_progress(29.0, 0.0, 100.0, 0.3, Ease::Power2Out);
        assert!(mapped.below_threshold);
        assert_eq!(mapped.sub, 0.0);
        assert_eq!(mapped.eased, 0.0);
    }

    #[test]
    fn mapping_is_idempotent() {
        for step in 0..=40 {
            let offset = step as f64 * 3.7 - 10.0;
            let first = map_progress(offset, 0.0, 120.0, 0.3, Ease::Power3Out);
            let second = map_progress(offset, 0.0, 120.0, 0.3, Ease::Power3Out);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn delayed_progress_cascades() {
        assert_eq!(delayed(0.05, 0.1), 0.0);
        assert_eq!(delayed(1.0, 0.5), 1.0);
        assert!((delayed(0.55, 0.1) - 0.5).abs() < 1e-12);
        assert_eq!(delayed(0.99, 1.0), 0.0);
    }
}
