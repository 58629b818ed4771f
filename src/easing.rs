use serde::{Deserialize, Serialize};

/// Shaping curves applied to a normalised progress value.
///
/// Every curve maps `0 -> 0` and `1 -> 1` and is monotonically increasing, so
/// an eased value can always be fed back into a pose interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    Linear,
    Power1Out,
    #[default]
    Power2Out,
    Power3Out,
    Power4Out,
    Power2In,
    /// The momentum curve used by the smoothed scroll provider.
    ExpoOut,
    Smoothstep,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Power1Out => out_pow(t, 2),
            Self::Power2Out => out_pow(t, 3),
            Self::Power3Out => out_pow(t, 4),
            Self::Power4Out => out_pow(t, 5),
            Self::Power2In => t * t * t,
            Self::ExpoOut => {
                if t <= 0.0 {
                    0.0
                } else {
                    (1.001 - 2f64.powf(-10.0 * t)).min(1.0)
                }
            }
            Self::Smoothstep => t * t * (3.0 - 2.0 * t),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "none",
            Self::Power1Out => "power1.out",
            Self::Power2Out => "power2.out",
            Self::Power3Out => "power3.out",
            Self::Power4Out => "power4.out",
            Self::Power2In => "power2.in",
            Self::ExpoOut => "expo.out",
            Self::Smoothstep => "smoothstep",
        }
    }
}

fn out_pow(t: f64, n: i32) -> f64 {
    1.0 - (1.0 - t).powi(n)
}

impl TryFrom<String> for Ease {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let ease = match value.trim().to_ascii_lowercase().as_str() {
            "none" | "linear" => Self::Linear,
            "power1.out" | "quad.out" => Self::Power1Out,
            "power2.out" | "cubic.out" => Self::Power2Out,
            "power3.out" | "quart.out" => Self::Power3Out,
            "power4.out" | "quint.out" => Self::Power4Out,
            "power2.in" | "cubic.in" => Self::Power2In,
            "expo.out" => Self::ExpoOut,
            "smoothstep" => Self::Smoothstep,
            other => return Err(format!("unknown ease '{other}'")),
        };
        Ok(ease)
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.as_str().to_string()
    }
}
