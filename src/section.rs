//! Section animator: a section's visual state as a function of its zone.
//!
//! Scrub mode makes every pose a pure function of the zone's eased progress,
//! so scrolling back restores the exact initial pose. Toggle mode plays a
//! timed timeline forward while the zone is in range and reverses it when it
//! is left, from either direction.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bounds::{Layout, Viewport};
use crate::capability::DeviceCapabilities;
use crate::error::Result;
use crate::frame::{Animator, Frame, LayoutSource};
use crate::pose::{Pose, PoseTrack, Unit};
use crate::scrub::{Scrub, ScrubState};
use crate::style::{css_number, StyleTarget, Styled};
use crate::visibility::VisibilityWriter;
use crate::zone::{ScrollZone, ZoneConfig};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionConfig {
    pub name: String,
    /// Selector of the trigger element. The zone is measured against it and,
    /// when pinned, it is the element held in place.
    pub trigger: String,
    pub zone: ZoneConfig,
    pub parts: Vec<PartConfig>,
}

impl SectionConfig {
    /// Replaces the duration of the first part group, as set per page with a
    /// `data-duration` attribute on the trigger. Non-finite or negative values
    /// are ignored.
    pub fn with_lead_duration(mut self, seconds: Option<f64>) -> Self {
        if let (Some(seconds), Some(lead)) = (seconds, self.parts.first_mut()) {
            if seconds.is_finite() && seconds >= 0.0 {
                lead.duration = seconds;
            }
        }
        self
    }
}

/// A group of elements driven by one pose track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartConfig {
    /// Resolved inside the trigger element unless `global` is set.
    pub selector: String,
    pub global: bool,
    #[serde(flatten)]
    pub track: PoseTrack,
    /// Seconds, toggle mode only.
    pub duration: f64,
    /// Offset between consecutive matched elements: seconds in toggle mode,
    /// a progress fraction in scrub mode.
    pub stagger: f64,
}

impl Default for PartConfig {
    fn default() -> Self {
        Self {
            selector: String::new(),
            global: false,
            track: PoseTrack::default(),
            duration: 0.5,
            stagger: 0.0,
        }
    }
}

struct PartGroup<T> {
    track: PoseTrack,
    duration: f64,
    stagger: f64,
    /// Timeline position, toggle mode only.
    start: f64,
    targets: Vec<Styled<T>>,
}

impl<T> PartGroup<T> {
    fn span(&self) -> f64 {
        let count = self.targets.len().max(1) as f64;
        self.track.delay + self.duration + self.stagger * (count - 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timeline {
    time: f64,
    total: f64,
    forward: bool,
}

impl Timeline {
    fn advance(&mut self, dt_secs: f64) {
        let step = if self.forward { dt_secs } else { -dt_secs };
        self.time = (self.time + step).clamp(0.0, self.total);
    }
}

enum Drive {
    Scrub(ScrubState),
    Toggle(Timeline),
}

pub struct SectionAnimator<T> {
    config: SectionConfig,
    zone: ScrollZone,
    container: Styled<T>,
    groups: Vec<PartGroup<T>>,
    drive: Drive,
    visibility: Option<VisibilityWriter>,
    caps: DeviceCapabilities,
    offset: f64,
    /// Displayed linear progress (scrub mode).
    progress: f64,
    pin: Option<f64>,
}

impl<T: StyleTarget> SectionAnimator<T> {
    /// Builds the animator. `parts[i]` holds the elements matched by
    /// `config.parts[i]`; a group with no elements is kept but never written.
    pub fn new(
        config: &SectionConfig,
        container: T,
        parts: Vec<Vec<T>>,
        layout: Layout,
        viewport: &Viewport,
        caps: DeviceCapabilities,
    ) -> Result<Self> {
        let mut zone_config = config.zone.clone();
        if caps.reduced_motion && matches!(zone_config.scrub, Scrub::Smooth(_)) {
            zone_config.scrub = Scrub::Instant;
        }
        let zone = ScrollZone::new(config.name.clone(), &zone_config, layout, viewport)?;

        let mut parts = parts.into_iter();
        let mut cursor = 0.0;
        let mut groups = Vec::with_capacity(config.parts.len());
        for part in &config.parts {
            let targets: Vec<Styled<T>> = parts.next().unwrap_or_default().into_iter().map(Styled::new).collect();
            if targets.is_empty() {
                debug!(section = %config.name, selector = %part.selector, "part matched no elements");
            }
            let group = PartGroup {
                track: part.track,
                duration: part.duration.max(0.0),
                stagger: part.stagger.max(0.0),
                start: cursor,
                targets,
            };
            cursor += group.span();
            groups.push(group);
        }

        let drive = if zone.scrub().is_scroll_linked() {
            Drive::Scrub(ScrubState::new(zone.scrub()))
        } else {
            Drive::Toggle(Timeline { time: 0.0, total: cursor, forward: false })
        };

        let mut animator = Self {
            config: config.clone(),
            zone,
            container: Styled::new(container),
            groups,
            drive,
            visibility: None,
            caps,
            offset: 0.0,
            progress: 0.0,
            pin: None,
        };
        animator.reserve_pin_distance();
        Ok(animator)
    }

    /// Hands this section the write side of a visibility flag.
    pub fn publish_visibility(mut self, writer: VisibilityWriter) -> Self {
        self.visibility = Some(writer);
        self
    }

    pub fn zone(&self) -> &ScrollZone {
        &self.zone
    }

    /// Displayed progress: linear zone progress in scrub mode, timeline
    /// position over total duration in toggle mode.
    pub fn progress(&self) -> f64 {
        match &self.drive {
            Drive::Scrub(_) => self.progress,
            Drive::Toggle(timeline) if timeline.total > 0.0 => timeline.time / timeline.total,
            Drive::Toggle(timeline) => {
                if timeline.forward { 1.0 } else { 0.0 }
            }
        }
    }

    pub fn eased_progress(&self) -> f64 {
        self.zone.ease().apply(self.progress)
    }

    pub fn is_toggle(&self) -> bool {
        matches!(self.drive, Drive::Toggle(_))
    }

    /// Current pose of element `index` in part group `group`.
    pub fn pose(&self, group: usize, index: usize) -> Option<Pose> {
        let part = self.groups.get(group)?;
        (index < part.targets.len().max(1)).then(|| self.sample(part, index))
    }

    fn sample(&self, part: &PartGroup<T>, index: usize) -> Pose {
        match &self.drive {
            Drive::Scrub(_) => {
                let delay = part.track.delay + part.stagger * index as f64;
                part.track.sample_with_delay(self.eased_progress(), delay)
            }
            Drive::Toggle(timeline) => {
                let begin = part.start + part.track.delay + part.stagger * index as f64;
                let local = if part.duration > 0.0 {
                    ((timeline.time - begin) / part.duration).clamp(0.0, 1.0)
                } else if timeline.time > begin || (timeline.time >= begin && timeline.forward) {
                    // Zero-length parts snap once the playhead reaches them.
                    1.0
                } else {
                    0.0
                };
                part.track.sample_with_delay(local, 0.0)
            }
        }
    }

    fn reserve_pin_distance(&mut self) {
        if self.zone.is_pinned() && self.zone.config().pin_spacing {
            let distance = format!("{}px", css_number(self.zone.distance()));
            self.container.write("margin-bottom", &distance);
        }
    }
}

impl<T: StyleTarget> Animator for SectionAnimator<T> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn zones(&self) -> Vec<&ScrollZone> {
        vec![&self.zone]
    }

    fn refresh(&mut self, layouts: &dyn LayoutSource, viewport: &Viewport) {
        let Some(layout) = layouts.layout(&self.config.trigger) else {
            warn!(section = %self.config.name, trigger = %self.config.trigger, "trigger not measurable, keeping previous bounds");
            return;
        };
        self.zone.refresh(layout, viewport);
        self.reserve_pin_distance();
        if self.zone.config().invalidate_on_refresh {
            let target = self.zone.progress(self.offset).sub;
            if let Drive::Scrub(state) = &mut self.drive {
                state.snap(target);
                self.progress = target;
            }
            self.container.invalidate();
            for group in &mut self.groups {
                group.targets.iter_mut().for_each(Styled::invalidate);
            }
        }
    }

    fn recompute(&mut self, frame: &Frame) {
        self.offset = frame.offset;
        let mapped = self.zone.progress(frame.offset);
        self.pin = self.zone.pin_offset(frame.offset);
        match &mut self.drive {
            Drive::Scrub(state) => {
                self.progress = state.advance(mapped.sub, frame.dt_secs);
            }
            Drive::Toggle(timeline) => {
                timeline.forward = self.zone.contains(frame.offset);
                if self.caps.reduced_motion {
                    timeline.time = if timeline.forward { timeline.total } else { 0.0 };
                } else {
                    timeline.advance(frame.dt_secs);
                }
            }
        }
        if let Some(writer) = &self.visibility {
            let progress = self.progress();
            writer.publish(progress, self.zone.ease().apply(progress));
        }
    }

    fn write(&mut self) {
        if let Some(pin) = self.pin {
            let transform = format!("translate3d(0, {}px, 0)", css_number(pin));
            self.container.write("transform", &transform);
        }
        for index in 0..self.groups.len() {
            let poses: Vec<Pose> = (0..self.groups[index].targets.len())
                .map(|i| self.sample(&self.groups[index], i))
                .collect();
            let group = &mut self.groups[index];
            let (x_unit, y_unit): (Unit, Unit) = (group.track.x_unit, group.track.y_unit);
            for (target, pose) in group.targets.iter_mut().zip(poses) {
                pose.apply(x_unit, y_unit, target);
            }
        }
    }
}
