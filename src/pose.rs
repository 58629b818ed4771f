use serde::{Deserialize, Serialize};

use crate::easing::Ease;
use crate::progress::{delayed, lerp};
use crate::style::{css_number, StyleTarget, Styled};

/// CSS unit for a translation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Px,
    Vh,
    Vw,
    Percent,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Vh => "vh",
            Self::Vw => "vw",
            Self::Percent => "%",
        }
    }
}

/// The visual state of one element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub opacity: f64,
}

impl Default for Pose {
    fn default() -> Self {
        Self::REST
    }
}

impl Pose {
    pub const REST: Self = Self { x: 0.0, y: 0.0, scale: 1.0, opacity: 1.0 };

    pub fn lerp(&self, to: &Pose, t: f64) -> Pose {
        Pose {
            x: lerp(self.x, to.x, t),
            y: lerp(self.y, to.y, t),
            scale: lerp(self.scale, to.scale, t),
            opacity: lerp(self.opacity, to.opacity, t),
        }
    }

    pub fn transform(&self, x_unit: Unit, y_unit: Unit) -> String {
        format!(
            "translate3d({}{}, {}{}, 0) scale({})",
            css_number(self.x),
            x_unit.suffix(),
            css_number(self.y),
            y_unit.suffix(),
            css_number(self.scale)
        )
    }

    pub fn apply<T: StyleTarget>(&self, x_unit: Unit, y_unit: Unit, target: &mut Styled<T>) -> bool {
        let moved = target.write("transform", &self.transform(x_unit, y_unit));
        let faded = target.write("opacity", &css_number(self.opacity));
        moved || faded
    }
}

/// Interpolation between a hidden and a visible pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoseTrack {
    pub from: Pose,
    pub to: Pose,
    pub x_unit: Unit,
    pub y_unit: Unit,
    pub ease: Ease,
    /// Fraction of the parent's progress to wait before this track starts moving.
    pub delay: f64,
}

impl Default for PoseTrack {
    fn default() -> Self {
        Self {
            from: Pose::REST,
            to: Pose::REST,
            x_unit: Unit::Px,
            y_unit: Unit::Px,
            ease: Ease::Linear,
            delay: 0.0,
        }
    }
}

impl PoseTrack {
    pub fn sample(&self, progress: f64) -> Pose {
        self.sample_with_delay(progress, self.delay)
    }

    pub fn sample_with_delay(&self, progress: f64, delay: f64) -> Pose {
        self.from.lerp(&self.to, self.ease.apply(delayed(progress, delay)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden_track() -> PoseTrack {
        PoseTrack {
            from: Pose { x: 0.0, y: 20.0, scale: 0.8, opacity: 0.0 },
            to: Pose::REST,
            ease: Ease::Power3Out,
            ..PoseTrack::default()
        }
    }

    #[test]
    fn endpoints_match_poses() {
        let track = hidden_track();
        assert_eq!(track.sample(0.0), track.from);
        assert_eq!(track.sample(1.0), track.to);
    }

    #[test]
    fn delay_holds_the_initial_pose() {
        let track = PoseTrack { delay: 0.4, ..hidden_track() };
        assert_eq!(track.sample(0.3), track.from);
        assert!(track.sample(0.7).opacity > 0.0);
    }

    #[test]
    fn transform_uses_units() {
        let pose = Pose { x: -250.0, y: 100.0, scale: 1.0, opacity: 1.0 };
        assert_eq!(
            pose.transform(Unit::Vw, Unit::Vh),
            "translate3d(-250vw, 100vh, 0) scale(1)"
        );
    }

    #[test]
    fn deserializes_partial_poses() {
        let track: PoseTrack =
            serde_json::from_str(r#"{"from":{"y":100},"yUnit":"vh","ease":"power2.out"}"#).unwrap();
        assert_eq!(track.from, Pose { y: 100.0, ..Pose::REST });
        assert_eq!(track.y_unit, Unit::Vh);
        assert_eq!(track.ease, Ease::Power2Out);
    }
}
