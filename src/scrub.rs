use serde::{Deserialize, Serialize};

/// How an animation follows its zone's progress.
///
/// Configuration accepts `false`, `true` or a number of seconds, matching the
/// boolean-or-factor form trigger authors already write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScrubSetting", into = "ScrubSetting")]
pub enum Scrub {
    /// Not scroll-linked; the section plays a timed transition instead.
    Off,
    /// Displayed progress equals scroll progress every frame.
    Instant,
    /// Displayed progress catches up with scroll progress over roughly this many seconds.
    Smooth(f64),
}

impl Default for Scrub {
    fn default() -> Self {
        Self::Smooth(1.0)
    }
}

impl Scrub {
    pub fn is_scroll_linked(self) -> bool {
        !matches!(self, Self::Off)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScrubSetting {
    Flag(bool),
    Seconds(f64),
}

impl From<ScrubSetting> for Scrub {
    fn from(setting: ScrubSetting) -> Self {
        match setting {
            ScrubSetting::Flag(false) => Self::Off,
            ScrubSetting::Flag(true) => Self::Instant,
            ScrubSetting::Seconds(seconds) if seconds > 0.0 => Self::Smooth(seconds),
            ScrubSetting::Seconds(_) => Self::Instant,
        }
    }
}

impl From<Scrub> for ScrubSetting {
    fn from(scrub: Scrub) -> Self {
        match scrub {
            Scrub::Off => Self::Flag(false),
            Scrub::Instant => Self::Flag(true),
            Scrub::Smooth(seconds) => Self::Seconds(seconds),
        }
    }
}

const SNAP: f64 = 1e-4;

/// The progress value an animation currently displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubState {
    mode: Scrub,
    current: f64,
}

impl ScrubState {
    pub fn new(mode: Scrub) -> Self {
        Self { mode, current: 0.0 }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Moves the displayed progress toward `target`.
    ///
    /// Lands exactly on `target` once within a small distance, so a full
    /// round trip returns to the initial value bit for bit.
    pub fn advance(&mut self, target: f64, dt_secs: f64) -> f64 {
        self.current = match self.mode {
            Scrub::Off | Scrub::Instant => target,
            Scrub::Smooth(seconds) => {
                let blend = 1.0 - (-dt_secs.max(0.0) / seconds).exp();
                let next = self.current + (target - self.current) * blend;
                if (target - next).abs() < SNAP { target } else { next }
            }
        };
        self.current
    }

    pub fn is_settled(&self, target: f64) -> bool {
        self.current == target
    }

    /// Jumps straight to `target`, used after a viewport refresh.
    pub fn snap(&mut self, target: f64) {
        self.current = target;
    }
}
