//! Hover word reveal for gallery panels (pointer devices only).
//!
//! Title and subtitle are split into words. Entering the panel raises the
//! title words one after another and the subtitle a beat later; leaving drops
//! both groups back out with a quicker, tighter timing.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::capability::DeviceCapabilities;
use crate::easing::Ease;
use crate::frame::{Animator, Frame};
use crate::progress::lerp;
use crate::style::{css_number, StyleTarget, Styled};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevealConfig {
    pub enter_duration: f64,
    pub enter_stagger: f64,
    pub enter_ease: Ease,
    /// Seconds the subtitle waits after the title starts.
    pub subtitle_delay: f64,
    pub exit_duration: f64,
    pub exit_stagger: f64,
    pub exit_ease: Ease,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            enter_duration: 0.6,
            enter_stagger: 0.06,
            enter_ease: Ease::Power3Out,
            subtitle_delay: 0.4,
            exit_duration: 0.3,
            exit_stagger: 0.03,
            exit_ease: Ease::Power2In,
        }
    }
}

/// One word and the whitespace that followed it in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordToken {
    pub word: String,
    pub trailing: String,
}

/// Splits `text` into words, keeping inter-word spacing with the preceding word.
/// Leading whitespace is dropped.
pub fn tokenize(text: &str) -> Vec<WordToken> {
    let mut tokens: Vec<WordToken> = Vec::new();
    let mut word = String::new();
    let mut trailing = String::new();
    for ch in text.trim_start().chars() {
        if ch.is_whitespace() {
            trailing.push(ch);
        } else {
            if !trailing.is_empty() {
                tokens.push(WordToken { word: std::mem::take(&mut word), trailing: std::mem::take(&mut trailing) });
            }
            word.push(ch);
        }
    }
    if !word.is_empty() {
        tokens.push(WordToken { word, trailing });
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverState {
    Idle,
    Hovered,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct WordTween {
    from: f64,
    to: f64,
    start: f64,
    duration: f64,
    ease: Ease,
}

impl WordTween {
    fn at_rest(value: f64) -> Self {
        Self { from: value, to: value, start: 0.0, duration: 0.0, ease: Ease::Linear }
    }

    fn sample(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return if now >= self.start { self.to } else { self.from };
        }
        let t = ((now - self.start) / self.duration).clamp(0.0, 1.0);
        lerp(self.from, self.to, self.ease.apply(t))
    }

    fn is_done(&self, now: f64) -> bool {
        now >= self.start + self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordGroup {
    Title,
    Subtitle,
}

/// Reveal state of one panel. Each word's value is `0` (hidden: pushed down a
/// full line and transparent) to `1` (resting).
#[derive(Debug, Clone)]
pub struct WordReveal {
    config: RevealConfig,
    state: HoverState,
    title: Vec<WordTween>,
    subtitle: Vec<WordTween>,
}

impl WordReveal {
    /// `None` on touch devices: no hover concept, so nothing is tokenized and
    /// no listeners should be attached.
    pub fn new(config: RevealConfig, title_words: usize, subtitle_words: usize, caps: DeviceCapabilities) -> Option<Self> {
        caps.supports_hover().then(|| Self {
            config,
            state: HoverState::Idle,
            title: vec![WordTween::at_rest(0.0); title_words],
            subtitle: vec![WordTween::at_rest(0.0); subtitle_words],
        })
    }

    pub fn state(&self) -> HoverState {
        self.state
    }

    pub fn enter(&mut self, now: f64) {
        if self.state == HoverState::Hovered {
            return;
        }
        self.state = HoverState::Hovered;
        let RevealConfig { enter_duration, enter_stagger, enter_ease, subtitle_delay, .. } = self.config;
        retarget(&mut self.title, now, 1.0, now, enter_duration, enter_stagger, enter_ease);
        retarget(&mut self.subtitle, now, 1.0, now + subtitle_delay, enter_duration, enter_stagger, enter_ease);
    }

    pub fn leave(&mut self, now: f64) {
        if self.state == HoverState::Idle {
            return;
        }
        self.state = HoverState::Idle;
        let RevealConfig { exit_duration, exit_stagger, exit_ease, .. } = self.config;
        retarget(&mut self.title, now, 0.0, now, exit_duration, exit_stagger, exit_ease);
        retarget(&mut self.subtitle, now, 0.0, now, exit_duration, exit_stagger, exit_ease);
    }

    pub fn value(&self, group: WordGroup, index: usize, now: f64) -> Option<f64> {
        let words = match group {
            WordGroup::Title => &self.title,
            WordGroup::Subtitle => &self.subtitle,
        };
        words.get(index).map(|tween| tween.sample(now))
    }

    pub fn is_animating(&self, now: f64) -> bool {
        self.title.iter().chain(&self.subtitle).any(|tween| !tween.is_done(now))
    }

    /// Writes every word's pose.
    pub fn apply<T: StyleTarget>(&self, now: f64, title: &mut [Styled<T>], subtitle: &mut [Styled<T>]) {
        for (tween, target) in self.title.iter().zip(title).chain(self.subtitle.iter().zip(subtitle)) {
            let value = tween.sample(now);
            target.write("transform", &format!("translate3d(0, {}%, 0)", css_number((1.0 - value) * 100.0)));
            target.write("opacity", &css_number(value));
        }
    }
}

/// Latest hover change reported by the page's enter/leave listeners, picked
/// up on the next frame.
#[derive(Debug, Clone, Default)]
pub struct HoverSignal(Rc<Cell<Option<HoverState>>>);

impl HoverSignal {
    pub fn request(&self, state: HoverState) {
        self.0.set(Some(state));
    }

    fn take(&self) -> Option<HoverState> {
        self.0.take()
    }
}

/// Word reveal of one panel, driven from the frame loop.
pub struct PanelReveal<T> {
    name: String,
    reveal: WordReveal,
    signal: HoverSignal,
    title: Vec<Styled<T>>,
    subtitle: Vec<Styled<T>>,
    now: f64,
}

impl<T: StyleTarget> PanelReveal<T> {
    /// `title` and `subtitle` hold one element per word.
    pub fn new(name: impl Into<String>, config: RevealConfig, title: Vec<T>, subtitle: Vec<T>, caps: DeviceCapabilities) -> Option<Self> {
        let reveal = WordReveal::new(config, title.len(), subtitle.len(), caps)?;
        Some(Self {
            name: name.into(),
            reveal,
            signal: HoverSignal::default(),
            title: title.into_iter().map(Styled::new).collect(),
            subtitle: subtitle.into_iter().map(Styled::new).collect(),
            now: 0.0,
        })
    }

    pub fn signal(&self) -> HoverSignal {
        self.signal.clone()
    }

    pub fn state(&self) -> HoverState {
        self.reveal.state()
    }
}

impl<T: StyleTarget> Animator for PanelReveal<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn recompute(&mut self, frame: &Frame) {
        self.now = frame.now_secs;
        match self.signal.take() {
            Some(HoverState::Hovered) => self.reveal.enter(self.now),
            Some(HoverState::Idle) => self.reveal.leave(self.now),
            None => {}
        }
    }

    fn write(&mut self) {
        self.reveal.apply(self.now, &mut self.title, &mut self.subtitle);
    }
}

fn retarget(words: &mut [WordTween], now: f64, to: f64, start: f64, duration: f64, stagger: f64, ease: Ease) {
    for (index, tween) in words.iter_mut().enumerate() {
        *tween = WordTween {
            from: tween.sample(now),
            to,
            start: start + stagger * index as f64,
            duration,
            ease,
        };
    }
}
