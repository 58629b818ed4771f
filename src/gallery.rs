//! Horizontal gallery: turns the scroll distance of a spacer element into a
//! horizontal translation across a row of full-width panels.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bounds::{Layout, Viewport};
use crate::capability::DeviceCapabilities;
use crate::easing::Ease;
use crate::error::Result;
use crate::frame::{Animator, Frame, LayoutSource};
use crate::pose::{Pose, PoseTrack, Unit};
use crate::progress::delayed;
use crate::scrub::{Scrub, ScrubState};
use crate::section::{PartConfig, SectionConfig};
use crate::style::{css_number, StyleTarget, Styled};
use crate::visibility::VisibilityReader;
use crate::zone::{ScrollZone, ZoneConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GalleryConfig {
    /// Vertical reveal of the gallery; owns the visibility flag.
    pub reveal: SectionConfig,
    /// Element whose scroll distance drives the horizontal motion.
    pub spacer: String,
    pub spacer_zone: ZoneConfig,
    /// Height given to the spacer. Sets how much vertical scroll the full
    /// horizontal run takes.
    pub spacer_height_vh: f64,
    /// Row element that is translated horizontally.
    pub track: String,
    pub panels: String,
    pub panel_width_vw: f64,
    /// Progress fraction each panel lags the previous one during the reveal.
    pub stagger: f64,
    /// Distance panels rise from while they cascade in.
    pub panel_rise_vh: f64,
    pub panel_ease: Ease,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            reveal: reveal_section(),
            spacer: "#horizontal-scroll-trigger".to_string(),
            spacer_zone: ZoneConfig { ease: Ease::Linear, ..ZoneConfig::new("top bottom", "bottom top") },
            spacer_height_vh: 600.0,
            track: "[data-gallery-track]".to_string(),
            panels: "[data-panel]".to_string(),
            panel_width_vw: 120.0,
            stagger: 0.1,
            panel_rise_vh: 6.0,
            panel_ease: Ease::Power2Out,
        }
    }
}

/// The gallery rises into view over the pinned showcase, starting 30% of the
/// way through it. It counts as revealed only once fully in place.
pub fn reveal_section() -> SectionConfig {
    SectionConfig {
        name: "gallery-reveal".to_string(),
        trigger: "[data-section='showcase']".to_string(),
        zone: ZoneConfig {
            scrub: Scrub::Smooth(1.0),
            threshold: 0.3,
            ease: Ease::Linear,
            ..ZoneConfig::new("top top", "+=150vh")
        },
        parts: vec![PartConfig {
            selector: "[data-gallery]".to_string(),
            global: true,
            track: PoseTrack {
                from: Pose { y: 100.0, ..Pose::REST },
                to: Pose::REST,
                y_unit: Unit::Vh,
                ..PoseTrack::default()
            },
            duration: 0.0,
            ..PartConfig::default()
        }],
    }
}

/// Horizontal offset, in `vw`, for a given progress across `panel_count` panels.
pub fn translate_x(progress: f64, panel_width_vw: f64, panel_count: usize) -> f64 {
    let travel = panel_width_vw * panel_count.saturating_sub(1) as f64;
    progress.clamp(0.0, 1.0) * -travel
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryPhase {
    /// Not yet (or no longer) vertically revealed; horizontal requests are ignored.
    Dormant,
    Active,
}

/// Derived per-frame state of one panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    pub index: usize,
    pub offset_vh: f64,
    pub opacity: f64,
    pub delay: f64,
}

pub struct HorizontalGallery<T> {
    config: GalleryConfig,
    zone: ScrollZone,
    visibility: VisibilityReader,
    phase: GalleryPhase,
    scrub: ScrubState,
    track: Styled<T>,
    panels: Vec<Styled<T>>,
    translate_vw: f64,
    pending: bool,
}

impl<T: StyleTarget> HorizontalGallery<T> {
    pub fn new(
        config: &GalleryConfig,
        visibility: VisibilityReader,
        track: T,
        panels: Vec<T>,
        spacer_layout: Layout,
        viewport: &Viewport,
        caps: DeviceCapabilities,
    ) -> Result<Self> {
        let mut zone_config = config.spacer_zone.clone();
        if caps.reduced_motion {
            zone_config.scrub = Scrub::Instant;
        }
        let zone = ScrollZone::new("gallery-spacer", &zone_config, spacer_layout, viewport)?;
        if panels.is_empty() {
            warn!("gallery has no panels");
        }
        Ok(Self {
            config: config.clone(),
            scrub: ScrubState::new(zone.scrub()),
            zone,
            visibility,
            phase: GalleryPhase::Dormant,
            track: Styled::new(track),
            panels: panels.into_iter().map(Styled::new).collect(),
            translate_vw: 0.0,
            pending: false,
        })
    }

    pub fn phase(&self) -> GalleryPhase {
        self.phase
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Last translation applied, in `vw`.
    pub fn translate_vw(&self) -> f64 {
        self.translate_vw
    }

    /// Panel states for the current reveal progress.
    pub fn panel_states(&self) -> Vec<PanelState> {
        let progress = self.visibility.progress();
        (0..self.panels.len())
            .map(|index| {
                let delay = self.config.stagger * index as f64;
                let t = self.config.panel_ease.apply(delayed(progress, delay));
                PanelState {
                    index,
                    offset_vh: self.config.panel_rise_vh * (1.0 - t),
                    opacity: t,
                    delay,
                }
            })
            .collect()
    }

    /// Feeds a horizontal progress value. Ignored entirely while the gallery is
    /// dormant; returns whether a new translation is pending for the write pass.
    pub fn drive(&mut self, progress: f64, dt_secs: f64) -> bool {
        let visible = self.visibility.is_visible();
        match (self.phase, visible) {
            (GalleryPhase::Dormant, true) => {
                debug!("gallery active");
                self.phase = GalleryPhase::Active;
            }
            (GalleryPhase::Active, false) => {
                debug!("gallery dormant");
                self.phase = GalleryPhase::Dormant;
            }
            _ => {}
        }
        if self.phase == GalleryPhase::Dormant {
            self.pending = false;
            return false;
        }

        let shown = self.scrub.advance(progress, dt_secs);
        let next = translate_x(shown, self.config.panel_width_vw, self.panels.len());
        self.pending = next != self.translate_vw || self.track.last("transform").is_none();
        self.translate_vw = next;
        self.pending
    }
}

impl<T: StyleTarget> Animator for HorizontalGallery<T> {
    fn name(&self) -> &str {
        "gallery"
    }

    fn zones(&self) -> Vec<&ScrollZone> {
        vec![&self.zone]
    }

    fn refresh(&mut self, layouts: &dyn LayoutSource, viewport: &Viewport) {
        match layouts.layout(&self.config.spacer) {
            Some(layout) => self.zone.refresh(layout, viewport),
            None => warn!(spacer = %self.config.spacer, "gallery spacer not measurable"),
        }
        if self.zone.config().invalidate_on_refresh {
            self.track.invalidate();
            self.panels.iter_mut().for_each(Styled::invalidate);
        }
    }

    fn recompute(&mut self, frame: &Frame) {
        let progress = self.zone.progress(frame.offset).eased;
        self.drive(progress, frame.dt_secs);
    }

    fn write(&mut self) {
        for state in self.panel_states() {
            let pose = Pose { y: state.offset_vh, opacity: state.opacity, ..Pose::REST };
            pose.apply(Unit::Px, Unit::Vh, &mut self.panels[state.index]);
        }
        if self.pending {
            let transform = format!("translate3d({}vw, 0, 0)", css_number(self.translate_vw));
            self.track.write("transform", &transform);
            self.pending = false;
        }
    }
}
