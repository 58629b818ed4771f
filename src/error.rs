/// Errors raised while wiring the choreography to a page.
///
/// Nothing here is ever surfaced to a visitor. Setup failures are logged and the
/// affected component is skipped; media failures are handled by
/// [`crate::media::LazyMedia`] through its own fallback state.
#[derive(thiserror::Error, Debug)]
pub enum MotionError {
    #[error("required element '{selector}' is not present")]
    MissingAnchor { selector: String },

    #[error("invalid scroll boundary: {0}")]
    InvalidBoundary(String),

    #[error("malformed configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("browser call failed: {0}")]
    Js(String),
}

impl MotionError {
    pub fn missing(selector: impl Into<String>) -> Self {
        Self::MissingAnchor { selector: selector.into() }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for MotionError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

pub type Result<T> = std::result::Result<T, MotionError>;
