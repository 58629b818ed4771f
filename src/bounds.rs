//! Scroll boundary expressions such as `"top 80%"` or `"+=150vh"`.
//!
//! A boundary names a point on the trigger element and a point on the viewport;
//! the zone starts (or ends) at the scroll offset where those two points meet.
//! Everything is resolved against the current [`Viewport`], so boundaries must
//! be re-resolved whenever the viewport changes size.

use std::str::FromStr;

use crate::error::MotionError;

/// Visible area of the page, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn vw(&self, amount: f64) -> f64 {
        self.width * amount / 100.0
    }

    pub fn vh(&self, amount: f64) -> f64 {
        self.height * amount / 100.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Position of a trigger element in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layout {
    pub top: f64,
    pub height: f64,
}

impl Layout {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }
}

/// A point along an element or along the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    Percent(f64),
    Px(f64),
}

impl Edge {
    fn along(self, extent: f64) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => extent / 2.0,
            Self::Bottom => extent,
            Self::Percent(p) => extent * p / 100.0,
            Self::Px(px) => px,
        }
    }
}

impl FromStr for Edge {
    type Err = MotionError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            _ => {
                if let Some(number) = token.strip_suffix('%') {
                    parse_number(number, token).map(Self::Percent)
                } else if let Some(number) = token.strip_suffix("px") {
                    parse_number(number, token).map(Self::Px)
                } else {
                    parse_number(token, token).map(Self::Px)
                }
            }
        }
    }
}

/// A distance, used by relative `+=` boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Vh(f64),
    Vw(f64),
    /// Percentage of the viewport height.
    Percent(f64),
}

impl Length {
    pub fn to_px(self, viewport: &Viewport) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Vh(amount) | Self::Percent(amount) => viewport.vh(amount),
            Self::Vw(amount) => viewport.vw(amount),
        }
    }
}

impl FromStr for Length {
    type Err = MotionError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        if let Some(number) = token.strip_suffix("vh") {
            parse_number(number, token).map(Self::Vh)
        } else if let Some(number) = token.strip_suffix("vw") {
            parse_number(number, token).map(Self::Vw)
        } else if let Some(number) = token.strip_suffix('%') {
            parse_number(number, token).map(Self::Percent)
        } else if let Some(number) = token.strip_suffix("px") {
            parse_number(number, token).map(Self::Px)
        } else {
            parse_number(token, token).map(Self::Px)
        }
    }
}

/// A parsed boundary expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// `"<element edge> <viewport edge>"`.
    Meet { element: Edge, viewport: Edge },
    /// `"+=<length>"`, measured from the zone start.
    Relative(Length),
}

impl Boundary {
    /// Resolves the boundary into an absolute scroll offset.
    ///
    /// `start` is the already-resolved start of the zone; relative boundaries
    /// are measured from it, or from the element top when there is none.
    pub fn resolve(&self, layout: &Layout, viewport: &Viewport, start: Option<f64>) -> f64 {
        match self {
            Self::Meet { element, viewport: edge } => {
                layout.top + element.along(layout.height) - edge.along(viewport.height)
            }
            Self::Relative(length) => start.unwrap_or(layout.top) + length.to_px(viewport),
        }
    }
}

impl FromStr for Boundary {
    type Err = MotionError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let expression = expression.trim();
        if let Some(rest) = expression.strip_prefix("+=") {
            return rest.parse().map(Self::Relative);
        }

        let mut tokens = expression.split_whitespace();
        let (Some(first), second, None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(MotionError::InvalidBoundary(expression.to_string()));
        };
        let element: Edge = first.parse()?;
        let viewport = match second {
            Some(token) => token.parse()?,
            None => element,
        };
        Ok(Self::Meet { element, viewport })
    }
}

fn parse_number(number: &str, token: &str) -> Result<f64, MotionError> {
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| MotionError::InvalidBoundary(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const VIEWPORT: Viewport = Viewport { width: 1000.0, height: 800.0 };

    #[rstest]
    #[case("top top", 500.0)]
    #[case("top 80%", 500.0 - 640.0)]
    #[case("top 70%", 500.0 - 560.0)]
    #[case("top bottom", 500.0 - 800.0)]
    #[case("bottom top", 500.0 + 300.0)]
    #[case("bottom bottom", 500.0 + 300.0 - 800.0)]
    #[case("center", 500.0 + 150.0 - 400.0)]
    #[case("top 10%", 500.0 - 80.0)]
    #[case("bottom 0%", 800.0)]
    fn meet_boundaries(#[case] expression: &str, #[case] expected: f64) {
        let boundary: Boundary = expression.parse().unwrap();
        let layout = Layout::new(500.0, 300.0);
        assert_eq!(boundary.resolve(&layout, &VIEWPORT, None), expected);
    }

    #[rstest]
    #[case("+=150vh", 1200.0)]
    #[case("+=200vh", 1600.0)]
    #[case("+=300px", 300.0)]
    #[case("+=50%", 400.0)]
    #[case("+=10vw", 100.0)]
    fn relative_boundaries(#[case] expression: &str, #[case] distance: f64) {
        let boundary: Boundary = expression.parse().unwrap();
        let layout = Layout::new(500.0, 300.0);
        assert_eq!(boundary.resolve(&layout, &VIEWPORT, Some(40.0)), 40.0 + distance);
    }

    #[test]
    fn viewport_change_moves_boundaries() {
        let boundary: Boundary = "+=150vh".parse().unwrap();
        let layout = Layout::default();
        let small = boundary.resolve(&layout, &Viewport::new(400.0, 600.0), Some(0.0));
        let large = boundary.resolve(&layout, &Viewport::new(400.0, 1000.0), Some(0.0));
        assert_eq!(small, 900.0);
        assert_eq!(large, 1500.0);
    }

    #[rstest]
    #[case("")]
    #[case("top top top")]
    #[case("middle top")]
    #[case("+=fast")]
    #[case("top NaN%")]
    fn rejects_malformed(#[case] expression: &str) {
        assert!(matches!(
            expression.parse::<Boundary>(),
            Err(MotionError::InvalidBoundary(_))
        ));
    }
}
