//! Page-level configuration.
//!
//! Everything has a default matching the portfolio layout; a page may override
//! any part of it with a JSON block:
//!
//! ```html
//! <script type="application/json" id="folio-config">{ "logLevel": "debug" }</script>
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::easing::Ease;
use crate::error::{MotionError, Result};
use crate::gallery::GalleryConfig;
use crate::hero::HeroConfig;
use crate::media::MediaProps;
use crate::pose::{Pose, PoseTrack, Unit};
use crate::reveal::RevealConfig;
use crate::scrub::Scrub;
use crate::section::{PartConfig, SectionConfig};
use crate::smooth::SmoothScrollConfig;
use crate::strips::{box_spread_section, StripsConfig};
use crate::zone::ZoneConfig;

pub const CONFIG_ELEMENT_ID: &str = "folio-config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"folio_motion::media=debug"`.
    pub log_level: String,
    pub smooth: SmoothScrollConfig,
    pub hero: HeroConfig,
    /// Scroll-driven sections, registered in order.
    pub sections: Vec<SectionConfig>,
    pub gallery: GalleryConfig,
    pub strips: StripsConfig,
    pub reveal: RevealConfig,
    pub media: MediaConfig,
    pub cursor: CursorConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            smooth: SmoothScrollConfig::default(),
            hero: HeroConfig::default(),
            sections: vec![about_section(), showcase_section(), box_spread_section()],
            gallery: GalleryConfig::default(),
            strips: StripsConfig::default(),
            reveal: RevealConfig::default(),
            media: MediaConfig::default(),
            cursor: CursorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaConfig {
    /// Containers of lazily loaded videos; per-element `data-*` attributes
    /// override [`MediaConfig::defaults`].
    pub selector: String,
    pub defaults: MediaProps,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self { selector: "[data-lazy-video]".to_string(), defaults: MediaProps::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CursorConfig {
    pub dot: String,
    /// Attribute holding a project's URL.
    pub link_attribute: String,
    pub video_container: String,
    /// Class on the root element that hides the native cursor.
    pub hide_class: String,
    /// Class on the dot while it is over a project.
    pub visit_class: String,
    /// Panels carrying a hover word reveal.
    pub reveal_panel: String,
    pub reveal_title: String,
    pub reveal_subtitle: String,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            dot: "[data-cursor-dot]".to_string(),
            link_attribute: "data-project-link".to_string(),
            video_container: "[data-interactive-video='true']".to_string(),
            hide_class: "hide-native-cursor".to_string(),
            visit_class: "custom-cursor-visit".to_string(),
            reveal_panel: "[data-reveal]".to_string(),
            reveal_title: "[data-reveal-title]".to_string(),
            reveal_subtitle: "[data-reveal-subtitle]".to_string(),
        }
    }
}

/// The about section plays forward as it enters and reverses when it leaves.
pub fn about_section() -> SectionConfig {
    SectionConfig {
        name: "about".to_string(),
        trigger: "[data-section='about']".to_string(),
        zone: ZoneConfig { scrub: Scrub::Off, ..ZoneConfig::new("top 70%", "bottom top") },
        parts: vec![
            PartConfig {
                selector: ".content".to_string(),
                track: PoseTrack { from: Pose { y: 20.0, scale: 0.8, ..Pose::REST }, ease: Ease::Power3Out, ..PoseTrack::default() },
                duration: 0.8,
                ..PartConfig::default()
            },
            PartConfig {
                selector: ".image".to_string(),
                track: PoseTrack { from: Pose { x: -150.0, opacity: 0.0, ..Pose::REST }, ease: Ease::Power3Out, ..PoseTrack::default() },
                duration: 0.7,
                ..PartConfig::default()
            },
            PartConfig {
                selector: ".te > *".to_string(),
                track: PoseTrack { from: Pose { y: 20.0, opacity: 0.0, ..Pose::REST }, ease: Ease::Power3Out, ..PoseTrack::default() },
                duration: 0.6,
                stagger: 0.12,
                ..PartConfig::default()
            },
        ],
    }
}

/// The showcase title is pinned while it shrinks and fades behind the
/// incoming gallery.
pub fn showcase_section() -> SectionConfig {
    SectionConfig {
        name: "showcase".to_string(),
        trigger: "[data-section='showcase']".to_string(),
        zone: ZoneConfig {
            pin: true,
            scrub: Scrub::Smooth(1.0),
            ease: Ease::Power2Out,
            ..ZoneConfig::new("top top", "+=150vh")
        },
        parts: vec![PartConfig {
            selector: "[data-showcase-title]".to_string(),
            track: PoseTrack {
                to: Pose { x: 0.0, y: -100.0, scale: 0.8, opacity: 0.2 },
                y_unit: Unit::Px,
                ..PoseTrack::default()
            },
            ..PartConfig::default()
        }],
    }
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything that would otherwise only fail once the page is
    /// wired: boundary expressions, thresholds and the log filter.
    pub fn validate(&self) -> Result<()> {
        EnvFilter::try_new(&self.log_level)
            .map_err(|err| MotionError::InvalidConfig(format!("log level '{}': {err}", self.log_level)))?;

        let zones = self
            .sections
            .iter()
            .map(|s| (s.name.as_str(), &s.zone))
            .chain([
                ("gallery-reveal", &self.gallery.reveal.zone),
                ("gallery-spacer", &self.gallery.spacer_zone),
                ("hero-blur", &self.hero.blur_zone),
                ("strips", &self.strips.zone),
            ]);
        for (name, zone) in zones {
            zone.validate()?;
            if !(0.0..1.0).contains(&zone.threshold) {
                return Err(MotionError::InvalidConfig(format!("zone '{name}': threshold {} outside [0, 1)", zone.threshold)));
            }
        }

        if self.gallery.panel_width_vw <= 0.0 {
            return Err(MotionError::InvalidConfig("gallery panel width must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.smooth.lerp) {
            return Err(MotionError::InvalidConfig(format!("smooth scroll lerp {} outside [0, 1]", self.smooth.lerp)));
        }
        let threshold = self.media.defaults.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MotionError::InvalidConfig(format!("media threshold {threshold} outside [0, 1]")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SiteConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sections.len(), 3);
        assert_eq!(config.gallery.reveal.zone.threshold, 0.3);
        assert_eq!(config.smooth.lerp, 0.06);
        assert_eq!(config.media.defaults.debounce_ms, 150.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SiteConfig::from_json(
            r#"{
                "logLevel": "debug",
                "smooth": { "lerp": 0.1 },
                "gallery": { "panelWidthVw": 100, "spacerZone": { "scrub": true } },
                "media": { "defaults": { "preload": "auto", "loop": false } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.smooth.lerp, 0.1);
        assert_eq!(config.smooth.wheel_multiplier, 1.3);
        assert_eq!(config.gallery.panel_width_vw, 100.0);
        assert_eq!(config.gallery.spacer_zone.scrub, Scrub::Instant);
        assert_eq!(config.gallery.spacer_zone.start, "top bottom");
        assert!(!config.media.defaults.looping);
        assert_eq!(config.sections, SiteConfig::default().sections);
    }

    #[test]
    fn sections_are_replaced_wholesale() {
        let config = SiteConfig::from_json(
            r#"{ "sections": [ {
                "name": "intro",
                "trigger": "[data-section='intro']",
                "zone": { "start": "top center", "end": "+=50%", "scrub": 0.5, "ease": "expo.out" },
                "parts": [ { "selector": "h1", "from": { "opacity": 0 }, "yUnit": "vh", "stagger": 0.1 } ]
            } ] }"#,
        )
        .unwrap();
        assert_eq!(config.sections.len(), 1);
        let intro = &config.sections[0];
        assert_eq!(intro.zone.scrub, Scrub::Smooth(0.5));
        assert_eq!(intro.zone.ease, Ease::ExpoOut);
        assert_eq!(intro.parts[0].track.from.opacity, 0.0);
        assert_eq!(intro.parts[0].track.from.scale, 1.0);
        assert_eq!(intro.parts[0].track.y_unit, Unit::Vh);
        assert_eq!(intro.parts[0].stagger, 0.1);
    }

    #[rstest]
    #[case::bad_boundary(r#"{ "strips": { "zone": { "start": "middle nowhere" } } }"#)]
    #[case::threshold(r#"{ "gallery": { "reveal": { "zone": { "threshold": 1.0 } } } }"#)]
    #[case::panel_width(r#"{ "gallery": { "panelWidthVw": 0 } }"#)]
    #[case::log_level(r#"{ "logLevel": "folio=loud" }"#)]
    #[case::malformed(r#"{ "smooth": "#)]
    #[case::unknown_ease(r#"{ "hero": { "blurZone": { "ease": "bounce" } } }"#)]
    fn rejects(#[case] json: &str) {
        assert!(SiteConfig::from_json(json).is_err());
    }
}
