//! Scroll-direction-aware header.

use crate::FrameTask;
use pg_dom::Document;
use pg_dom::NodeId;
use pg_host::FrameHandle;
use pg_host::FrameScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDirection {
    /// Neither marker class is present.
    Neutral,
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct HeaderTracker {
    header: NodeId,
    up_class: String,
    down_class: String,
    last_scroll: f32,
    pending: Option<FrameHandle>,
}

impl HeaderTracker {
    pub fn new(header: NodeId, up_class: &str, down_class: &str) -> Self {
        Self {
            header,
            up_class: up_class.to_owned(),
            down_class: down_class.to_owned(),
            last_scroll: 0.0,
            pending: None,
        }
    }

    pub fn header(&self) -> NodeId {
        self.header
    }

    pub fn last_scroll(&self) -> f32 {
        self.last_scroll
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Scroll listener: replaces any pending evaluation with one on the next frame.
    pub fn schedule(&mut self, frames: &mut FrameScheduler<FrameTask>) {
        if let Some(handle) = self.pending.take() {
            frames.cancel(handle);
        }
        self.pending = Some(frames.request(FrameTask::HeaderDirection));
    }

    /// Frame callback. Ignores stale handles.
    pub fn run_frame(&mut self, handle: FrameHandle, document: &mut Document, scroll_y: f32) -> bool {
        if self.pending != Some(handle) {
            return false;
        }
        self.pending = None;
        self.evaluate(document, scroll_y);
        true
    }

    pub fn evaluate(&mut self, document: &mut Document, current: f32) {
        let scrolling_down = document.has_class(self.header, &self.down_class);

        if current <= 0.0 {
            // `scroll-down` is intentionally left as-is at the very top.
            document.remove_class(self.header, &self.up_class);
        } else if current > self.last_scroll && !scrolling_down {
            document.remove_class(self.header, &self.up_class);
            document.add_class(self.header, &self.down_class);
            tracing::debug!(current, "header scrolling down");
        } else if current < self.last_scroll && scrolling_down {
            document.remove_class(self.header, &self.down_class);
            document.add_class(self.header, &self.up_class);
            tracing::debug!(current, "header scrolling up");
        }

        self.last_scroll = current;
    }

    pub fn direction(&self, document: &Document) -> HeaderDirection {
        if document.has_class(self.header, &self.down_class) {
            HeaderDirection::Down
        } else if document.has_class(self.header, &self.up_class) {
            HeaderDirection::Up
        } else {
            HeaderDirection::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HeaderDirection;
    use super::HeaderTracker;
    use crate::FrameTask;
    use pg_dom::Document;
    use pg_host::FrameScheduler;

    fn fixture() -> (Document, HeaderTracker) {
        let mut doc = Document::empty();
        let header = doc.create_element("header");
        doc.set_attribute(header, "class", "header");
        let root = doc.root();
        doc.append_child(root, header);
        (doc, HeaderTracker::new(header, "scroll-up", "scroll-down"))
    }

    fn exclusive(doc: &Document, tracker: &HeaderTracker) -> bool {
        !(doc.has_class(tracker.header(), "scroll-up") && doc.has_class(tracker.header(), "scroll-down"))
    }

    #[test]
    fn direction_follows_scroll_sequence() {
        let (mut doc, mut tracker) = fixture();
        let steps = [
            (120.0, HeaderDirection::Down),
            (300.0, HeaderDirection::Down),
            (250.0, HeaderDirection::Up),
            (200.0, HeaderDirection::Up),
            (260.0, HeaderDirection::Down),
        ];
        for (offset, expected) in steps {
            tracker.evaluate(&mut doc, offset);
            assert_eq!(tracker.direction(&doc), expected, "at {offset}");
            assert!(exclusive(&doc, &tracker));
            assert_eq!(tracker.last_scroll(), offset);
        }
    }

    #[test]
    fn reaching_the_top_clears_up_only() {
        let (mut doc, mut tracker) = fixture();
        tracker.evaluate(&mut doc, 200.0);
        tracker.evaluate(&mut doc, 100.0);
        assert_eq!(tracker.direction(&doc), HeaderDirection::Up);
        tracker.evaluate(&mut doc, 0.0);
        assert_eq!(tracker.direction(&doc), HeaderDirection::Neutral);
        assert_eq!(tracker.last_scroll(), 0.0);

        // Straight to the top while scrolling down keeps the down marker.
        tracker.evaluate(&mut doc, 400.0);
        tracker.evaluate(&mut doc, 0.0);
        assert_eq!(tracker.direction(&doc), HeaderDirection::Down);
        assert!(exclusive(&doc, &tracker));
    }

    #[test]
    fn rescheduling_keeps_a_single_pending_evaluation() {
        let (mut doc, mut tracker) = fixture();
        let mut frames = FrameScheduler::new();
        for _ in 0..10 {
            tracker.schedule(&mut frames);
        }
        assert_eq!(frames.pending_count(), 1);

        let due = frames.take_due();
        assert_eq!(due.len(), 1);
        let ran = due
            .into_iter()
            .filter(|(handle, task)| {
                *task == FrameTask::HeaderDirection && tracker.run_frame(*handle, &mut doc, 90.0)
            })
            .count();
        assert_eq!(ran, 1);
        assert_eq!(tracker.pending(), None);
        assert_eq!(tracker.direction(&doc), HeaderDirection::Down);
    }
}
