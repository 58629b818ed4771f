//! Lazy media controller.
//!
//! Decides when a background video gets its source, when it plays, pauses or
//! shows a fallback. The controller is a pure state machine: every input
//! returns the [`MediaCommand`]s the browser binding must carry out, so the
//! policy can be exercised without a browser.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::capability::DeviceCapabilities;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    #[default]
    Cover,
    Contain,
}

impl Fit {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    Auto,
    #[default]
    Metadata,
    None,
}

impl Preload {
    pub fn as_attr(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Metadata => "metadata",
            Self::None => "none",
        }
    }
}

/// What a touch device does with a lazy video by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPolicy {
    /// Show the poster with a tap-to-play affordance; nothing loads before a tap.
    #[default]
    Poster,
    /// Behave as on desktop.
    Autoplay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaProps {
    pub src: String,
    pub poster: Option<String>,
    pub fit: Fit,
    pub preload: Preload,
    pub autoplay: bool,
    /// Intersection ratio at which the container counts as in view.
    pub threshold: f64,
    /// Mount immediately, bypassing the intersection observer.
    pub force_mount: bool,
    /// Changing this value requests a (re)play attempt.
    pub play_signal: u32,
    pub debounce_ms: f64,
    pub touch_policy: TouchPolicy,
    pub muted: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for MediaProps {
    fn default() -> Self {
        Self {
            src: String::new(),
            poster: None,
            fit: Fit::Cover,
            preload: Preload::Metadata,
            autoplay: true,
            threshold: 0.1,
            force_mount: false,
            play_signal: 0,
            debounce_ms: 150.0,
            touch_policy: TouchPolicy::Poster,
            muted: true,
            looping: true,
        }
    }
}

impl MediaProps {
    /// Per-element overrides read from `data-*` attributes. Unparseable values
    /// keep the default.
    pub fn with_attributes(&self, attribute: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str, default: bool| match attribute(name).as_deref() {
            Some("" | "true") => true,
            Some("false") => false,
            _ => default,
        };
        let mut props = self.clone();
        if let Some(src) = attribute("data-src") {
            props.src = src;
        }
        if let Some(poster) = attribute("data-poster").filter(|p| !p.is_empty()) {
            props.poster = Some(poster);
        }
        props.fit = match attribute("data-fit").as_deref() {
            Some("contain") => Fit::Contain,
            Some("cover") => Fit::Cover,
            _ => props.fit,
        };
        props.preload = match attribute("data-preload").as_deref() {
            Some("auto") => Preload::Auto,
            Some("metadata") => Preload::Metadata,
            Some("none") => Preload::None,
            _ => props.preload,
        };
        props.touch_policy = match attribute("data-touch").as_deref() {
            Some("autoplay") => TouchPolicy::Autoplay,
            Some("poster") => TouchPolicy::Poster,
            _ => props.touch_policy,
        };
        if let Some(threshold) = attribute("data-threshold").and_then(|t| t.parse::<f64>().ok()) {
            props.threshold = threshold.clamp(0.0, 1.0);
        }
        props.autoplay = flag("data-autoplay", props.autoplay);
        props.force_mount = flag("data-force-mount", props.force_mount);
        props.muted = flag("data-muted", props.muted);
        props.looping = flag("data-loop", props.looping);
        props
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaLoadState {
    Unobserved,
    ObservedNotLoaded,
    Loading,
    Ready,
    Error,
}

/// Side effects requested from the browser binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCommand {
    ShowPoster,
    ShowLoader,
    AssignSource { src: String, preload: Preload },
    Play,
    Pause,
    /// Listen for the first tap or click on the container and retry playback.
    ArmGestureUnlock,
    DisarmGestureUnlock,
    Reveal,
    ShowFallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingVisibility {
    visible: bool,
    due_ms: f64,
}

#[derive(Debug, Clone)]
pub struct LazyMedia {
    props: MediaProps,
    caps: DeviceCapabilities,
    state: MediaLoadState,
    mounted: bool,
    in_view: bool,
    user_armed: bool,
    unlock_armed: bool,
    wants_play: bool,
    /// A `play()` has been issued and neither settled as rejected nor paused.
    play_requested: bool,
    play_signal: u32,
    pending: Option<PendingVisibility>,
}

impl LazyMedia {
    pub fn new(props: MediaProps, caps: DeviceCapabilities) -> Self {
        let play_signal = props.play_signal;
        Self {
            props,
            caps,
            state: MediaLoadState::Unobserved,
            mounted: false,
            in_view: false,
            user_armed: false,
            unlock_armed: false,
            wants_play: false,
            play_requested: false,
            play_signal,
            pending: None,
        }
    }

    pub fn state(&self) -> MediaLoadState {
        self.state
    }

    pub fn props(&self) -> &MediaProps {
        &self.props
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_unlock_armed(&self) -> bool {
        self.unlock_armed
    }

    /// Whether an intersection observer is needed at all.
    pub fn needs_observer(&self) -> bool {
        !self.props.force_mount
    }

    fn poster_gated(&self) -> bool {
        self.caps.touch && self.props.touch_policy == TouchPolicy::Poster && !self.user_armed
    }

    fn may_autoplay(&self) -> bool {
        self.props.autoplay && !self.poster_gated()
    }

    /// Initial commands, issued once when the controller is attached.
    pub fn start(&mut self) -> Vec<MediaCommand> {
        let mut commands = Vec::new();
        if self.poster_gated() {
            commands.push(MediaCommand::ShowPoster);
        }
        if self.props.force_mount {
            debug!(src = %self.props.src, "media force-mounted");
            commands.extend(self.set_in_view(true));
        }
        commands
    }

    /// Intersection observer callback. With a debounce the change is only
    /// applied by a later [`tick`](Self::tick).
    pub fn intersection(&mut self, ratio: f64, now_ms: f64) -> Vec<MediaCommand> {
        let visible = ratio >= self.props.threshold && ratio > 0.0;
        if self.props.debounce_ms <= 0.0 {
            return self.set_in_view(visible);
        }
        self.pending = Some(PendingVisibility { visible, due_ms: now_ms + self.props.debounce_ms });
        Vec::new()
    }

    /// Time of the next pending debounce deadline, if any.
    pub fn next_due(&self) -> Option<f64> {
        self.pending.map(|pending| pending.due_ms)
    }

    pub fn tick(&mut self, now_ms: f64) -> Vec<MediaCommand> {
        match self.pending {
            Some(pending) if now_ms >= pending.due_ms => {
                self.pending = None;
                self.set_in_view(pending.visible)
            }
            _ => Vec::new(),
        }
    }

    fn set_in_view(&mut self, visible: bool) -> Vec<MediaCommand> {
        if visible == self.in_view {
            return Vec::new();
        }
        self.in_view = visible;
        let mut commands = Vec::new();
        if visible {
            if self.state == MediaLoadState::Unobserved {
                self.state = MediaLoadState::ObservedNotLoaded;
            }
            if self.may_autoplay() {
                self.wants_play = true;
            }
            commands.extend(self.advance());
        } else if self.mounted && self.state != MediaLoadState::Error {
            self.play_requested = false;
            commands.push(MediaCommand::Pause);
        }
        commands
    }

    /// Mounts if permitted and plays if wanted.
    fn advance(&mut self) -> Vec<MediaCommand> {
        let mut commands = Vec::new();
        if self.state == MediaLoadState::Error {
            return commands;
        }
        if !self.mounted {
            if self.state == MediaLoadState::Unobserved || self.poster_gated() {
                return commands;
            }
            self.mounted = true;
            self.state = MediaLoadState::Loading;
            info!(src = %self.props.src, "mounting lazy video");
            commands.push(MediaCommand::ShowLoader);
            commands.push(MediaCommand::AssignSource { src: self.props.src.clone(), preload: self.props.preload });
        }
        if self.wants_play && !self.play_requested && self.in_view_or_forced() {
            self.play_requested = true;
            commands.push(MediaCommand::Play);
        }
        commands
    }

    fn in_view_or_forced(&self) -> bool {
        self.in_view || self.props.force_mount || self.user_armed
    }

    /// A tap or click on the container.
    pub fn tap(&mut self) -> Vec<MediaCommand> {
        if self.state == MediaLoadState::Error {
            return Vec::new();
        }
        let mut commands = Vec::new();
        if self.unlock_armed {
            self.unlock_armed = false;
            commands.push(MediaCommand::DisarmGestureUnlock);
        }
        self.user_armed = true;
        self.wants_play = true;
        if self.state == MediaLoadState::Unobserved {
            self.state = MediaLoadState::ObservedNotLoaded;
        }
        commands.extend(self.advance());
        commands
    }

    /// External play request. Only a changed value counts.
    pub fn set_play_signal(&mut self, signal: u32) -> Vec<MediaCommand> {
        if signal == self.play_signal {
            return Vec::new();
        }
        self.play_signal = signal;
        debug!(signal, "play signal");
        self.tap()
    }

    /// `play()` was rejected by the platform's autoplay policy.
    pub fn play_rejected(&mut self) -> Vec<MediaCommand> {
        self.play_requested = false;
        if self.unlock_armed || self.state == MediaLoadState::Error {
            return Vec::new();
        }
        debug!(src = %self.props.src, "autoplay rejected, waiting for a gesture");
        self.unlock_armed = true;
        vec![MediaCommand::ArmGestureUnlock]
    }

    /// First frame decoded.
    pub fn loaded(&mut self) -> Vec<MediaCommand> {
        if self.state != MediaLoadState::Loading {
            return Vec::new();
        }
        self.state = MediaLoadState::Ready;
        vec![MediaCommand::Reveal]
    }

    /// Playback reached the end of a non-looping video.
    pub fn ended(&mut self) {
        self.play_requested = false;
    }

    /// Decode or network failure. Final: nothing is retried.
    pub fn failed(&mut self) -> Vec<MediaCommand> {
        if self.state == MediaLoadState::Error {
            return Vec::new();
        }
        warn!(src = %self.props.src, "video failed to load");
        self.state = MediaLoadState::Error;
        self.play_requested = false;
        let mut commands = Vec::new();
        if self.unlock_armed {
            self.unlock_armed = false;
            commands.push(MediaCommand::DisarmGestureUnlock);
        }
        commands.push(MediaCommand::ShowFallback);
        commands
    }

    /// Cancels pending work before the element goes away.
    pub fn teardown(&mut self) -> Vec<MediaCommand> {
        self.pending = None;
        let mut commands = Vec::new();
        if self.unlock_armed {
            self.unlock_armed = false;
            commands.push(MediaCommand::DisarmGestureUnlock);
        }
        if self.mounted && self.state != MediaLoadState::Error {
            self.play_requested = false;
            commands.push(MediaCommand::Pause);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> MediaProps {
        MediaProps { src: "clip.mp4".into(), debounce_ms: 0.0, ..MediaProps::default() }
    }

    fn count_mounts(commands: &[MediaCommand]) -> usize {
        commands.iter().filter(|c| matches!(c, MediaCommand::AssignSource { .. })).count()
    }

    fn count_plays(commands: &[MediaCommand]) -> usize {
        commands.iter().filter(|c| **c == MediaCommand::Play).count()
    }

    #[test]
    fn attributes_override_defaults() {
        let attrs = [("data-src", "reel.mp4"), ("data-fit", "contain"), ("data-autoplay", "false"), ("data-force-mount", ""), ("data-threshold", "oops")];
        let props = MediaProps::default().with_attributes(|name| {
            attrs.iter().find(|(key, _)| *key == name).map(|(_, value)| value.to_string())
        });
        assert_eq!(props.src, "reel.mp4");
        assert_eq!(props.fit, Fit::Contain);
        assert!(!props.autoplay);
        assert!(props.force_mount);
        assert_eq!(props.threshold, 0.1);
        assert_eq!(props.preload, Preload::Metadata);
        assert!(props.poster.is_none());
    }

    #[test]
    fn below_threshold_never_mounts() {
        let mut media = LazyMedia::new(props(), DeviceCapabilities::DESKTOP);
        let mut all = media.start();
        for ratio in [0.0, 0.02, 0.05, 0.0999] {
            all.extend(media.intersection(ratio, 0.0));
        }
        assert_eq!(count_mounts(&all), 0);
        assert_eq!(media.state(), MediaLoadState::Unobserved);
    }

    #[test]
    fn crossing_threshold_mounts_once() {
        let mut media = LazyMedia::new(props(), DeviceCapabilities::DESKTOP);
        let mut all = media.start();
        for ratio in [0.05, 0.1, 0.4, 0.9, 0.0, 0.3, 1.0] {
            all.extend(media.intersection(ratio, 0.0));
        }
        assert_eq!(count_mounts(&all), 1);
        assert_eq!(media.state(), MediaLoadState::Loading);
        assert!(all.contains(&MediaCommand::Pause));
    }

    #[test]
    fn pauses_out_of_view_without_unmounting() {
        let mut media = LazyMedia::new(props(), DeviceCapabilities::DESKTOP);
        media.intersection(0.5, 0.0);
        media.loaded();
        assert_eq!(media.intersection(0.0, 0.0), vec![MediaCommand::Pause]);
        assert_eq!(media.intersection(0.6, 0.0), vec![MediaCommand::Play]);
        assert!(media.is_mounted());
        assert_eq!(media.state(), MediaLoadState::Ready);
    }

    #[test]
    fn debounce_applies_latest_visibility() {
        let mut media = LazyMedia::new(MediaProps { debounce_ms: 150.0, ..props() }, DeviceCapabilities::DESKTOP);
        assert!(media.intersection(0.5, 0.0).is_empty());
        assert!(media.intersection(0.0, 50.0).is_empty());
        assert!(media.intersection(0.5, 100.0).is_empty());
        assert!(media.tick(200.0).is_empty());
        assert_eq!(media.next_due(), Some(250.0));
        let commands = media.tick(250.0);
        assert_eq!(count_mounts(&commands), 1);
        assert_eq!(media.next_due(), None);
    }

    #[test]
    fn rejected_autoplay_arms_gesture_unlock_once() {
        let mut media = LazyMedia::new(props(), DeviceCapabilities::DESKTOP);
        media.intersection(1.0, 0.0);
        assert_eq!(media.play_rejected(), vec![MediaCommand::ArmGestureUnlock]);
        assert!(media.play_rejected().is_empty());
        let retry = media.tap();
        assert_eq!(retry, vec![MediaCommand::DisarmGestureUnlock, MediaCommand::Play]);
        assert!(!media.is_unlock_armed());
    }

    #[test]
    fn touch_device_waits_for_tap() {
        let mut media = LazyMedia::new(props(), DeviceCapabilities::TOUCH);
        let start = media.start();
        assert_eq!(start, vec![MediaCommand::ShowPoster]);
        let in_view = media.intersection(1.0, 0.0);
        assert_eq!(count_mounts(&in_view), 0);
        assert_eq!(media.state(), MediaLoadState::ObservedNotLoaded);

        let tapped = media.tap();
        assert_eq!(count_mounts(&tapped), 1);
        assert_eq!(count_plays(&tapped), 1);
    }

    #[test]
    fn touch_policy_is_overridable() {
        let mut media = LazyMedia::new(
            MediaProps { touch_policy: TouchPolicy::Autoplay, ..props() },
            DeviceCapabilities::TOUCH,
        );
        assert!(media.start().is_empty());
        let commands = media.intersection(1.0, 0.0);
        assert_eq!(count_mounts(&commands), 1);
        assert_eq!(count_plays(&commands), 1);
    }

    #[test]
    fn force_mount_bypasses_observer() {
        let mut media = LazyMedia::new(MediaProps { force_mount: true, ..props() }, DeviceCapabilities::DESKTOP);
        assert!(!media.needs_observer());
        let commands = media.start();
        assert_eq!(count_mounts(&commands), 1);
        assert_eq!(count_plays(&commands), 1);
    }

    #[test]
    fn play_signal_changes_trigger_playback() {
        let mut media = LazyMedia::new(MediaProps { autoplay: false, ..props() }, DeviceCapabilities::DESKTOP);
        let commands = media.intersection(1.0, 0.0);
        assert_eq!(count_mounts(&commands), 1);
        assert_eq!(count_plays(&commands), 0);
        assert!(media.set_play_signal(0).is_empty());
        assert_eq!(media.set_play_signal(1), vec![MediaCommand::Play]);
        assert!(media.set_play_signal(1).is_empty());
        // Already playing: a new signal does not issue a second play().
        assert!(media.set_play_signal(2).is_empty());
        media.ended();
        assert_eq!(media.set_play_signal(3), vec![MediaCommand::Play]);
    }

    #[test]
    fn hover_then_click_on_touch_plays_once() {
        let mut media = LazyMedia::new(props(), DeviceCapabilities::TOUCH);
        let mut all = media.start();
        all.extend(media.intersection(1.0, 0.0));
        // A tap on a touch screen delivers a compatibility mouseenter, then a click.
        all.extend(media.set_play_signal(1));
        all.extend(media.tap());
        assert_eq!(count_mounts(&all), 1);
        assert_eq!(count_plays(&all), 1);
    }

    #[test]
    fn rejected_play_is_retried_by_the_unlocking_tap_only_once() {
        let mut media = LazyMedia::new(props(), DeviceCapabilities::DESKTOP);
        let first = media.intersection(1.0, 0.0);
        assert_eq!(count_plays(&first), 1);
        media.play_rejected();
        assert!(media.is_unlock_armed());

        // The one-shot unlock and the permanent click handler see the same tap.
        let mut retry = media.tap();
        retry.extend(media.tap());
        assert_eq!(count_plays(&retry), 1);
        assert_eq!(retry.iter().filter(|c| **c == MediaCommand::DisarmGestureUnlock).count(), 1);
    }

    #[test]
    fn pause_allows_the_next_play() {
        let mut media = LazyMedia::new(props(), DeviceCapabilities::DESKTOP);
        assert_eq!(count_plays(&media.intersection(1.0, 0.0)), 1);
        assert!(media.tap().is_empty());
        assert_eq!(media.intersection(0.0, 0.0), vec![MediaCommand::Pause]);
        assert_eq!(media.intersection(1.0, 0.0), vec![MediaCommand::Play]);
    }

    #[test]
    fn failure_is_final() {
        let mut media = LazyMedia::new(props(), DeviceCapabilities::DESKTOP);
        media.intersection(1.0, 0.0);
        assert_eq!(media.failed(), vec![MediaCommand::ShowFallback]);
        assert_eq!(media.state(), MediaLoadState::Error);
        assert!(media.intersection(0.0, 0.0).is_empty());
        assert!(media.intersection(1.0, 0.0).is_empty());
        assert!(media.tap().is_empty());
        assert!(media.loaded().is_empty());
    }

    #[test]
    fn teardown_cancels_pending_work() {
        let mut media = LazyMedia::new(MediaProps { debounce_ms: 150.0, ..props() }, DeviceCapabilities::DESKTOP);
        media.intersection(1.0, 0.0);
        media.teardown();
        assert!(media.tick(1_000.0).is_empty());
        assert!(!media.is_mounted());
    }
}
