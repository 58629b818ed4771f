//! The single place animation state reaches the page.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Something that accepts inline style writes. Implemented for DOM elements in
/// the browser and by [`RecordingTarget`] for headless runs.
pub trait StyleTarget {
    fn set_style(&mut self, property: &str, value: &str);
}

/// A target that remembers what it last wrote and skips identical writes.
#[derive(Debug)]
pub struct Styled<T> {
    target: T,
    written: HashMap<String, String>,
}

impl<T: StyleTarget> Styled<T> {
    pub fn new(target: T) -> Self {
        Self { target, written: HashMap::new() }
    }

    /// Writes `value` unless it is already in place. Returns whether a write happened.
    pub fn write(&mut self, property: &str, value: &str) -> bool {
        if self.written.get(property).is_some_and(|last| last == value) {
            return false;
        }
        self.target.set_style(property, value);
        self.written.insert(property.to_string(), value.to_string());
        true
    }

    /// Forgets cached values so the next write always reaches the target.
    pub fn invalidate(&mut self) {
        self.written.clear();
    }

    pub fn last(&self, property: &str) -> Option<&str> {
        self.written.get(property).map(String::as_str)
    }
}

/// Formats a CSS number with four decimals of precision and no trailing noise.
pub fn css_number(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

/// Style sink that logs every write. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTarget {
    log: Rc<RefCell<Vec<(String, String)>>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.log.borrow().clone()
    }

    pub fn count(&self, property: &str) -> usize {
        self.log.borrow().iter().filter(|(p, _)| p == property).count()
    }

    pub fn last(&self, property: &str) -> Option<String> {
        self.log
            .borrow()
            .iter()
            .rev()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.clone())
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl StyleTarget for RecordingTarget {
    fn set_style(&mut self, property: &str, value: &str) {
        self.log.borrow_mut().push((property.to_string(), value.to_string()));
    }
}

#[cfg(target_arch = "wasm32")]
impl StyleTarget for web_sys::HtmlElement {
    fn set_style(&mut self, property: &str, value: &str) {
        if let Err(err) = self.style().set_property(property, value) {
            tracing::debug!(property, value, ?err, "style write rejected");
        }
    }
}
