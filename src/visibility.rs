use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Shared {
    visible: Cell<bool>,
    progress: Cell<f64>,
}

/// Creates a visibility flag with one writer and any number of readers.
///
/// The section animator that reveals a gallery owns the writer; the gallery
/// controller only ever reads.
pub fn visibility_flag() -> (VisibilityWriter, VisibilityReader) {
    let shared = Rc::new(Shared::default());
    (VisibilityWriter { shared: shared.clone() }, VisibilityReader { shared })
}

#[derive(Debug)]
pub struct VisibilityWriter {
    shared: Rc<Shared>,
}

impl VisibilityWriter {
    /// Publishes the owning section's reveal progress. The flag is raised only
    /// while the eased progress is complete and drops as soon as it is not.
    pub fn publish(&self, linear: f64, eased: f64) {
        self.shared.progress.set(linear);
        self.shared.visible.set(eased >= 1.0);
    }
}

#[derive(Debug, Clone)]
pub struct VisibilityReader {
    shared: Rc<Shared>,
}

impl VisibilityReader {
    pub fn is_visible(&self) -> bool {
        self.shared.visible.get()
    }

    /// Linear reveal progress of the owning section.
    pub fn progress(&self) -> f64 {
        self.shared.progress.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_follows_completion_both_ways() {
        let (writer, reader) = visibility_flag();
        assert!(!reader.is_visible());
        writer.publish(0.9, 0.99);
        assert!(!reader.is_visible());
        writer.publish(1.0, 1.0);
        assert!(reader.is_visible());
        writer.publish(0.95, 0.999);
        assert!(!reader.is_visible());
        assert_eq!(reader.progress(), 0.95);
    }
}
