//! Scroll zones: a range of scroll distance bound to a trigger element.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bounds::{Boundary, Layout, Viewport};
use crate::easing::Ease;
use crate::error::Result;
use crate::progress::{map_progress, Mapped};
use crate::scrub::Scrub;

/// Caller-supplied options for a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoneConfig {
    pub start: String,
    pub end: String,
    pub scrub: Scrub,
    pub pin: bool,
    /// Reserve the pinned distance after the trigger so following content is
    /// pushed down instead of scrolling underneath.
    pub pin_spacing: bool,
    /// Drop cached styles and scrub lag when the zone is refreshed.
    pub invalidate_on_refresh: bool,
    /// Log resolved boundaries on every refresh.
    pub markers: bool,
    pub threshold: f64,
    pub ease: Ease,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            start: "top bottom".to_string(),
            end: "bottom top".to_string(),
            scrub: Scrub::default(),
            pin: false,
            pin_spacing: false,
            invalidate_on_refresh: true,
            markers: false,
            threshold: 0.0,
            ease: Ease::default(),
        }
    }
}

impl ZoneConfig {
    pub fn new(start: &str, end: &str) -> Self {
        Self { start: start.to_string(), end: end.to_string(), ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        self.start.parse::<Boundary>()?;
        self.end.parse::<Boundary>()?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScrollZone {
    id: String,
    start_expr: Boundary,
    end_expr: Boundary,
    config: ZoneConfig,
    start: f64,
    end: f64,
}

impl ScrollZone {
    pub fn new(id: impl Into<String>, config: &ZoneConfig, layout: Layout, viewport: &Viewport) -> Result<Self> {
        let mut zone = Self {
            id: id.into(),
            start_expr: config.start.parse()?,
            end_expr: config.end.parse()?,
            config: config.clone(),
            start: 0.0,
            end: 0.0,
        };
        zone.refresh(layout, viewport);
        Ok(zone)
    }

    /// Recomputes the boundaries after a layout or viewport change.
    pub fn refresh(&mut self, layout: Layout, viewport: &Viewport) {
        self.start = self.start_expr.resolve(&layout, viewport, None);
        self.end = self.end_expr.resolve(&layout, viewport, Some(self.start));
        if self.config.markers {
            debug!(zone = %self.id, start = self.start, end = self.end, "zone markers");
        }
        if self.end <= self.start {
            warn!(zone = %self.id, start = self.start, end = self.end, "zone has no scroll distance");
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    pub fn scrub(&self) -> Scrub {
        self.config.scrub
    }

    pub fn ease(&self) -> Ease {
        self.config.ease
    }

    pub fn is_pinned(&self) -> bool {
        self.config.pin
    }

    pub fn progress(&self, offset: f64) -> Mapped {
        map_progress(offset, self.start, self.end, self.config.threshold, self.config.ease)
    }

    pub fn contains(&self, offset: f64) -> bool {
        offset >= self.start && offset <= self.end
    }

    /// Scroll distance the zone consumes.
    pub fn distance(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Translation that keeps a pinned trigger fixed in the viewport while the
    /// zone is being scrolled through. `None` for unpinned zones.
    pub fn pin_offset(&self, offset: f64) -> Option<f64> {
        self.config.pin.then(|| (offset - self.start).clamp(0.0, self.distance()))
    }
}

/// Every zone of the page, rebuilt after each refresh.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    pins: Vec<(String, f64, f64)>,
}

impl ZoneRegistry {
    pub fn rebuild<'a>(&mut self, zones: impl IntoIterator<Item = &'a ScrollZone>) {
        self.pins = zones
            .into_iter()
            .filter(|zone| zone.is_pinned())
            .map(|zone| (zone.id().to_string(), zone.start(), zone.end()))
            .collect();
        self.pins.sort_by(|a, b| a.1.total_cmp(&b.1));
        for (first, second) in self.overlapping_pins() {
            warn!(first = %first, second = %second, "pinned zones overlap; only one may hold the viewport");
        }
    }

    /// The pinned zone holding the viewport at `offset`, if any.
    pub fn active_pin(&self, offset: f64) -> Option<&str> {
        self.pins
            .iter()
            .find(|(_, start, end)| offset >= *start && offset < *end)
            .map(|(id, _, _)| id.as_str())
    }

    pub fn overlapping_pins(&self) -> Vec<(String, String)> {
        self.pins
            .windows(2)
            .filter(|pair| pair[1].1 < pair[0].2)
            .map(|pair| (pair[0].0.clone(), pair[1].0.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 800.0)
    }

    #[test]
    fn pinned_zone_spans_relative_end() {
        let config = ZoneConfig { pin: true, ..ZoneConfig::new("top top", "+=150vh") };
        let zone = ScrollZone::new("showcase", &config, Layout::new(2000.0, 800.0), &viewport()).unwrap();
        assert_eq!(zone.start(), 2000.0);
        assert_eq!(zone.end(), 3200.0);
        assert_eq!(zone.pin_offset(1500.0), Some(0.0));
        assert_eq!(zone.pin_offset(2600.0), Some(600.0));
        assert_eq!(zone.pin_offset(9000.0), Some(1200.0));
    }

    #[test]
    fn unpinned_zone_has_no_pin_offset() {
        let zone = ScrollZone::new("about", &ZoneConfig::default(), Layout::new(0.0, 10.0), &viewport()).unwrap();
        assert_eq!(zone.pin_offset(5.0), None);
    }

    #[test]
    fn refresh_recomputes_viewport_units() {
        let config = ZoneConfig::new("top top", "+=100vh");
        let mut zone = ScrollZone::new("z", &config, Layout::new(0.0, 500.0), &viewport()).unwrap();
        assert_eq!(zone.end(), 800.0);
        zone.refresh(Layout::new(0.0, 500.0), &Viewport::new(400.0, 600.0));
        assert_eq!(zone.end(), 600.0);
        assert_eq!(zone.progress(300.0).raw, 0.5);
    }

    #[test]
    fn invalid_expression_fails_construction() {
        let config = ZoneConfig::new("top sideways", "bottom top");
        assert!(ScrollZone::new("z", &config, Layout::default(), &viewport()).is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn registry_tracks_single_active_pin() {
        let pinned = ZoneConfig { pin: true, ..ZoneConfig::new("top top", "+=100vh") };
        let first = ScrollZone::new("a", &pinned, Layout::new(0.0, 800.0), &viewport()).unwrap();
        let second = ScrollZone::new("b", &pinned, Layout::new(1600.0, 800.0), &viewport()).unwrap();
        let mut registry = ZoneRegistry::default();
        registry.rebuild([&first, &second]);
        assert_eq!(registry.active_pin(100.0), Some("a"));
        assert_eq!(registry.active_pin(1000.0), None);
        assert_eq!(registry.active_pin(1700.0), Some("b"));
        assert!(registry.overlapping_pins().is_empty());

        let overlapping = ScrollZone::new("c", &pinned, Layout::new(400.0, 800.0), &viewport()).unwrap();
        registry.rebuild([&first, &overlapping]);
        assert_eq!(registry.overlapping_pins(), vec![("a".to_string(), "c".to_string())]);
    }
}
