//! Scroll-spy: highlights the navigation link of the section under the viewport top.

use crate::FrameTask;
use pg_dom::Document;
use pg_dom::NodeId;
use pg_host::FrameHandle;
use pg_host::FrameScheduler;

#[derive(Debug, Clone)]
pub struct ScrollSpy {
    sections: Vec<NodeId>,
    links: Vec<NodeId>,
    pre_roll: f32,
    active_class: String,
    pending: Option<FrameHandle>,
}

impl ScrollSpy {
    pub fn new(sections: Vec<NodeId>, links: Vec<NodeId>, pre_roll: f32, active_class: &str) -> Self {
        Self {
            sections,
            links,
            pre_roll,
            active_class: active_class.to_owned(),
            pending: None,
        }
    }

    pub fn sections(&self) -> &[NodeId] {
        &self.sections
    }

    pub fn links(&self) -> &[NodeId] {
        &self.links
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn schedule(&mut self, frames: &mut FrameScheduler<FrameTask>) {
        if let Some(handle) = self.pending.take() {
            frames.cancel(handle);
        }
        self.pending = Some(frames.request(FrameTask::ScrollSpy));
    }

    pub fn run_frame(&mut self, handle: FrameHandle, document: &mut Document, scroll_y: f32) -> bool {
        if self.pending != Some(handle) {
            return false;
        }
        self.pending = None;
        self.evaluate(document, scroll_y);
        true
    }

    /// Sections whose pre-rolled span `(top - pre_roll, top - pre_roll + height]` holds `scroll_y`.
    pub fn current_sections(&self, document: &Document, scroll_y: f32) -> Vec<NodeId> {
        self.sections
            .iter()
            .copied()
            .filter(|section| {
                let start = document.offset_top(*section) - self.pre_roll;
                let end = start + document.offset_height(*section);
                scroll_y > start && scroll_y <= end
            })
            .collect()
    }

    pub fn evaluate(&self, document: &mut Document, scroll_y: f32) {
        for section in self.current_sections(document, scroll_y) {
            let Some(id) = document.element_id(section).map(|id| format!("#{id}")) else {
                continue;
            };
            for link in &self.links {
                if document.attribute(*link, "href") == Some(id.as_str()) {
                    document.add_class(*link, &self.active_class);
                } else {
                    document.remove_class(*link, &self.active_class);
                }
            }
            tracing::debug!(section = %id, scroll_y, "scroll-spy section current");
        }
    }

    pub fn active_links(&self, document: &Document) -> Vec<NodeId> {
        self.links
            .iter()
            .copied()
            .filter(|link| document.has_class(*link, &self.active_class))
            .collect()
    }
}
