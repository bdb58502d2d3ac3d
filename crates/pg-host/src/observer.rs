//! Visibility observer (`IntersectionObserver`) over the vertical viewport.

use crate::viewport::Viewport;
use pg_dom::Document;
use pg_dom::LayoutBox;
use pg_dom::NodeId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the target's height that must be visible.
    pub threshold: f32,
    /// Pixels added above and below the viewport.
    pub root_margin: f32,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub is_intersecting: bool,
    pub ratio: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observation {
    target: NodeId,
    last: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionObserver {
    options: ObserverOptions,
    observations: Vec<Observation>,
}

impl IntersectionObserver {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            observations: Vec::new(),
        }
    }

    pub fn options(&self) -> ObserverOptions {
        self.options
    }

    /// Starts watching `target`. The next check always reports it once.
    pub fn observe(&mut self, target: NodeId) {
        if self.is_observing(target) {
            return;
        }
        self.observations.push(Observation { target, last: None });
    }

    pub fn unobserve(&mut self, target: NodeId) -> bool {
        let before = self.observations.len();
        self.observations
            .retain(|observation| observation.target != target);
        before != self.observations.len()
    }

    pub fn is_observing(&self, target: NodeId) -> bool {
        self.observations
            .iter()
            .any(|observation| observation.target == target)
    }

    pub fn observed_count(&self) -> usize {
        self.observations.len()
    }

    /// Computes the entries whose intersecting state changed since the last check.
    pub fn take_records(&mut self, document: &Document, viewport: &Viewport) -> Vec<IntersectionEntry> {
        let root_top = viewport.top() - self.options.root_margin;
        let root_bottom = viewport.bottom() + self.options.root_margin;
        let threshold = self.options.threshold;

        let mut records = Vec::new();
        for observation in &mut self.observations {
            let layout = document.layout_box(observation.target);
            let rendered = document.is_rendered(observation.target);
            let ratio = if rendered {
                intersection_ratio(layout, root_top, root_bottom)
            } else {
                0.0
            };
            let is_intersecting = if !rendered {
                false
            } else if threshold > 0.0 {
                ratio >= threshold
            } else {
                touches(layout, root_top, root_bottom)
            };

            if observation.last == Some(is_intersecting) {
                continue;
            }
            observation.last = Some(is_intersecting);
            records.push(IntersectionEntry {
                target: observation.target,
                is_intersecting,
                ratio,
            });
        }
        records
    }
}

fn touches(layout: LayoutBox, root_top: f32, root_bottom: f32) -> bool {
    layout.top <= root_bottom && layout.bottom() >= root_top
}

/// Visible fraction of `layout` between `root_top` and `root_bottom`.
pub fn intersection_ratio(layout: LayoutBox, root_top: f32, root_bottom: f32) -> f32 {
    if layout.height <= 0.0 {
        return if touches(layout, root_top, root_bottom) { 1.0 } else { 0.0 };
    }

    let visible = layout.bottom().min(root_bottom) - layout.top.max(root_top);
    (visible.max(0.0) / layout.height).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::IntersectionObserver;
    use super::ObserverOptions;
    use super::intersection_ratio;
    use crate::viewport::Viewport;
    use pg_dom::Document;
    use pg_dom::LayoutBox;

    fn page_with_box(top: f32, height: f32) -> (Document, pg_dom::NodeId, Viewport) {
        let mut doc = Document::empty();
        let node = doc.create_element("div");
        let root = doc.root();
        doc.append_child(root, node);
        doc.set_layout_box(node, LayoutBox { top, height });
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.set_document_height(3000.0);
        (doc, node, viewport)
    }

    #[test]
    fn ratio_is_the_visible_fraction() {
        let layout = LayoutBox {
            top: 500.0,
            height: 200.0,
        };
        assert_eq!(intersection_ratio(layout, 0.0, 600.0), 0.5);
        assert_eq!(intersection_ratio(layout, 0.0, 400.0), 0.0);
        assert_eq!(intersection_ratio(layout, 400.0, 1000.0), 1.0);
    }

    #[test]
    fn first_check_always_reports_then_only_changes() {
        let (doc, node, mut viewport) = page_with_box(1000.0, 200.0);
        let mut observer = IntersectionObserver::new(ObserverOptions::default());
        observer.observe(node);
        observer.observe(node);
        assert_eq!(observer.observed_count(), 1);

        let first = observer.take_records(&doc, &viewport);
        assert_eq!(first.len(), 1);
        assert!(!first[0].is_intersecting);
        assert!(observer.take_records(&doc, &viewport).is_empty());

        viewport.user_scroll_to(500.0);
        let entered = observer.take_records(&doc, &viewport);
        assert_eq!(entered.len(), 1);
        assert!(entered[0].is_intersecting);
    }

    #[test]
    fn threshold_requires_half_of_the_target() {
        let (doc, node, mut viewport) = page_with_box(700.0, 200.0);
        let mut observer = IntersectionObserver::new(ObserverOptions {
            threshold: 0.5,
            root_margin: 0.0,
        });
        observer.observe(node);

        viewport.user_scroll_to(150.0);
        let records = observer.take_records(&doc, &viewport);
        assert!(records.iter().all(|entry| !entry.is_intersecting));

        viewport.user_scroll_to(200.0);
        let records = observer.take_records(&doc, &viewport);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_intersecting);
        assert_eq!(records[0].ratio, 0.5);
    }

    #[test]
    fn unrendered_targets_never_intersect() {
        let (mut doc, node, viewport) = page_with_box(0.0, 100.0);
        doc.set_unrendered(node, 0.0);
        let mut observer = IntersectionObserver::new(ObserverOptions::default());
        observer.observe(node);

        let records = observer.take_records(&doc, &viewport);
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_intersecting);
        assert_eq!(records[0].ratio, 0.0);
    }

    #[test]
    fn unobserved_targets_stop_reporting() {
        let (doc, node, viewport) = page_with_box(0.0, 100.0);
        let mut observer = IntersectionObserver::new(ObserverOptions::default());
        observer.observe(node);
        assert!(observer.unobserve(node));
        assert!(!observer.unobserve(node));
        assert!(observer.take_records(&doc, &viewport).is_empty());
    }
}
