//! Counter-scrolling strips and the project box spread.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bounds::{Layout, Viewport};
use crate::capability::DeviceCapabilities;
use crate::easing::Ease;
use crate::error::Result;
use crate::frame::{Animator, Frame, LayoutSource};
use crate::pose::{Pose, PoseTrack};
use crate::scrub::{Scrub, ScrubState};
use crate::section::{PartConfig, SectionConfig};
use crate::style::{css_number, StyleTarget, Styled};
use crate::zone::{ScrollZone, ZoneConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StripsConfig {
    pub trigger: String,
    pub zone: ZoneConfig,
    /// Strip moving left as the page scrolls down.
    pub first: String,
    /// Strip moving right.
    pub second: String,
    /// Travel of each strip, in percent of its own width, over the zone.
    pub range_percent: f64,
}

impl Default for StripsConfig {
    fn default() -> Self {
        Self {
            trigger: "[data-strips]".to_string(),
            zone: ZoneConfig { scrub: Scrub::Smooth(1.0), ease: Ease::Linear, ..ZoneConfig::new("top 10%", "bottom 0%") },
            first: "[data-strip='first']".to_string(),
            second: "[data-strip='second']".to_string(),
            range_percent: 100.0,
        }
    }
}

/// `(first, second)` strip offsets in percent.
pub fn strip_offsets(progress: f64, range_percent: f64) -> (f64, f64) {
    let travel = progress.clamp(0.0, 1.0) * range_percent;
    (-travel, travel)
}

pub struct CounterStrips<T> {
    trigger: String,
    range: f64,
    zone: ScrollZone,
    scrub: ScrubState,
    first: Styled<T>,
    second: Styled<T>,
    progress: f64,
}

impl<T: StyleTarget> CounterStrips<T> {
    pub fn new(config: &StripsConfig, first: T, second: T, layout: Layout, viewport: &Viewport, caps: DeviceCapabilities) -> Result<Self> {
        let mut zone_config = config.zone.clone();
        if caps.reduced_motion {
            zone_config.scrub = Scrub::Instant;
        }
        let zone = ScrollZone::new("strips", &zone_config, layout, viewport)?;
        Ok(Self {
            trigger: config.trigger.clone(),
            range: config.range_percent,
            scrub: ScrubState::new(zone.scrub()),
            zone,
            first: Styled::new(first),
            second: Styled::new(second),
            progress: 0.0,
        })
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }
}

impl<T: StyleTarget> Animator for CounterStrips<T> {
    fn name(&self) -> &str {
        "strips"
    }

    fn zones(&self) -> Vec<&ScrollZone> {
        vec![&self.zone]
    }

    fn refresh(&mut self, layouts: &dyn LayoutSource, viewport: &Viewport) {
        let Some(layout) = layouts.layout(&self.trigger) else {
            warn!(trigger = %self.trigger, "strip container not measurable");
            return;
        };
        self.zone.refresh(layout, viewport);
        if self.zone.config().invalidate_on_refresh {
            self.first.invalidate();
            self.second.invalidate();
        }
    }

    fn recompute(&mut self, frame: &Frame) {
        let target = self.zone.progress(frame.offset).sub;
        self.progress = self.scrub.advance(target, frame.dt_secs);
    }

    fn write(&mut self) {
        let (first, second) = strip_offsets(self.progress, self.range);
        self.first.write("transform", &format!("translate3d({}%, 0, 0)", css_number(first)));
        self.second.write("transform", &format!("translate3d({}%, 0, 0)", css_number(second)));
    }
}

/// Resting x positions of the project boxes once fanned out.
pub const BOX_SPREAD_PX: [f64; 5] = [-700.0, -350.0, 0.0, 350.0, 700.0];

/// The project section: pinned for one viewport height while its stacked
/// boxes fan out to [`BOX_SPREAD_PX`].
pub fn box_spread_section() -> SectionConfig {
    let parts = BOX_SPREAD_PX
        .iter()
        .enumerate()
        .map(|(index, &x)| PartConfig {
            selector: format!("[data-box='{}']", index + 1),
            track: PoseTrack { to: Pose { x, ..Pose::REST }, ease: Ease::Power2Out, ..PoseTrack::default() },
            ..PartConfig::default()
        })
        .collect();
    SectionConfig {
        name: "projects".to_string(),
        trigger: "[data-section='projects']".to_string(),
        zone: ZoneConfig {
            pin: true,
            pin_spacing: true,
            scrub: Scrub::Smooth(1.0),
            ease: Ease::Linear,
            ..ZoneConfig::new("bottom bottom", "+=100vh")
        },
        parts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionAnimator;
    use crate::style::RecordingTarget;

    fn frame(offset: f64) -> Frame {
        Frame { offset, dt_secs: 1.0 / 60.0, now_secs: 0.0, viewport: Viewport::new(1000.0, 800.0) }
    }

    #[test]
    fn strips_move_in_opposite_directions() {
        assert_eq!(strip_offsets(0.25, 100.0), (-25.0, 25.0));
        assert_eq!(strip_offsets(3.0, 100.0), (-100.0, 100.0));

        let config = StripsConfig { zone: ZoneConfig { scrub: Scrub::Instant, ..StripsConfig::default().zone }, ..StripsConfig::default() };
        let first = RecordingTarget::new();
        let second = RecordingTarget::new();
        // top 10% = 2000 - 80; bottom 0% = 3000.
        let mut strips = CounterStrips::new(&config, first.clone(), second.clone(), Layout::new(2000.0, 1000.0), &Viewport::new(1000.0, 800.0), DeviceCapabilities::DESKTOP).unwrap();
        strips.recompute(&frame(2460.0));
        strips.write();
        assert_eq!(first.last("transform").unwrap(), "translate3d(-50%, 0, 0)");
        assert_eq!(second.last("transform").unwrap(), "translate3d(50%, 0, 0)");
    }

    #[test]
    fn boxes_fan_out_while_pinned() {
        let mut config = box_spread_section();
        config.zone.scrub = Scrub::Instant;
        let boxes: Vec<RecordingTarget> = (0..5).map(|_| RecordingTarget::new()).collect();
        let viewport = Viewport::new(1000.0, 800.0);
        // bottom bottom: 1000 + 800 - 800 = 1000; ends one viewport later.
        let mut section = SectionAnimator::new(
            &config,
            RecordingTarget::new(),
            boxes.iter().map(|b| vec![b.clone()]).collect(),
            Layout::new(1000.0, 800.0),
            &viewport,
            DeviceCapabilities::DESKTOP,
        )
        .unwrap();
        assert_eq!(section.zone().start(), 1000.0);
        assert_eq!(section.zone().end(), 1800.0);

        section.recompute(&frame(1800.0));
        section.write();
        let xs: Vec<String> = boxes.iter().map(|b| b.last("transform").unwrap()).collect();
        assert_eq!(xs[0], "translate3d(-700px, 0px, 0) scale(1)");
        assert_eq!(xs[2], "translate3d(0px, 0px, 0) scale(1)");
        assert_eq!(xs[4], "translate3d(700px, 0px, 0) scale(1)");
    }
}
