//! Event loop driving one page: input in, behavior handlers and frame callbacks out.

use crate::BehaviorConfig;
use crate::FrameTask;
use crate::Handler;
use crate::HostContext;
use crate::PageBehaviors;
use pg_core::PageResult;
use pg_dom::NodeId;
use pg_host::Event;
use pg_host::EventKind;
use pg_host::EventRegistry;
use pg_host::EventTarget;
use pg_host::FrameScheduler;
use pg_host::Page;
use pg_host::PageOptions;
use std::time::Duration;

/// What one call to [`PageSession::run_frame`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Smooth scrolling moved the viewport this frame.
    pub scrolled: bool,
    pub callbacks_run: usize,
    pub images_loaded: usize,
    pub reveals: usize,
}

#[derive(Debug, Clone)]
pub struct PageSession {
    page: Page,
    behaviors: PageBehaviors,
    events: EventRegistry<Handler>,
    frames: FrameScheduler<FrameTask>,
    loaded: bool,
}

impl PageSession {
    pub fn new(page: Page, config: BehaviorConfig) -> Self {
        let behaviors = PageBehaviors::new(config);
        let mut events = EventRegistry::new();
        behaviors.attach(&mut events);
        Self {
            page,
            behaviors,
            events,
            frames: FrameScheduler::new(),
            loaded: false,
        }
    }

    pub fn load(markup: &str, options: PageOptions, config: BehaviorConfig) -> PageResult<Self> {
        Ok(Self::new(Page::load(markup, options)?, config))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn behaviors(&self) -> &PageBehaviors {
        &self.behaviors
    }

    pub fn frames(&self) -> &FrameScheduler<FrameTask> {
        &self.frames
    }

    pub fn events(&self) -> &EventRegistry<Handler> {
        &self.events
    }

    /// Fires structural-ready. Only the first call dispatches.
    pub fn dom_content_loaded(&mut self) -> PageResult<bool> {
        if self.loaded {
            return Ok(false);
        }
        self.loaded = true;
        self.dispatch(Event::new(EventKind::DomContentLoaded, EventTarget::Document))?;
        self.page.relayout_if_dirty();
        Ok(true)
    }

    /// Dispatches a bubbling click on `node`. Returns whether the default action was prevented.
    pub fn click(&mut self, node: NodeId) -> PageResult<bool> {
        self.page.relayout_if_dirty();
        let event = self.dispatch(Event::new(EventKind::Click, EventTarget::Node(node)))?;
        self.page.relayout_if_dirty();
        Ok(event.default_prevented())
    }

    /// User scroll to `y`. Dispatches a scroll event when the offset changed.
    pub fn scroll_to(&mut self, y: f32) -> PageResult<bool> {
        self.page.relayout_if_dirty();
        if !self.page.viewport.user_scroll_to(y) {
            return Ok(false);
        }
        self.dispatch_scroll()?;
        Ok(true)
    }

    pub fn scroll_by(&mut self, dy: f32) -> PageResult<bool> {
        let target = self.page.viewport.scroll_y() + dy;
        self.scroll_to(target)
    }

    /// Renders one frame: smooth scroll step, due callbacks, then visibility records.
    pub fn run_frame(&mut self, dt: Duration) -> PageResult<FrameReport> {
        let mut report = FrameReport::default();
        self.page.relayout_if_dirty();

        if self.page.viewport.tick(dt) {
            report.scrolled = true;
            self.dispatch_scroll()?;
        }

        for (handle, task) in self.frames.take_due() {
            if self.behaviors.run_frame_task(&mut self.page, handle, task) {
                report.callbacks_run += 1;
            }
        }
        self.page.relayout_if_dirty();

        let (images_loaded, reveals) = self.behaviors.deliver_intersections(&mut self.page);
        report.images_loaded = images_loaded;
        report.reveals = reveals;
        self.page.relayout_if_dirty();

        Ok(report)
    }

    /// Re-lays out for a new viewport. A clamped offset dispatches a scroll event.
    pub fn resize(&mut self, width: f32, height: f32) -> PageResult<bool> {
        if !self.page.resize(width, height) {
            return Ok(false);
        }
        tracing::debug!(scroll_y = self.page.viewport.scroll_y(), "resize clamped the scroll offset");
        self.dispatch_scroll()?;
        Ok(true)
    }

    fn dispatch_scroll(&mut self) -> PageResult<Event> {
        self.dispatch(Event::new(EventKind::Scroll, EventTarget::Window))
    }

    fn dispatch(&mut self, mut event: Event) -> PageResult<Event> {
        let handlers = self.events.handlers_for(&self.page.document, &event);
        tracing::trace!(kind = event.kind().as_str(), handlers = handlers.len(), "dispatch");
        for handler in handlers {
            let mut ctx = HostContext {
                page: &mut self.page,
                events: &mut self.events,
                frames: &mut self.frames,
            };
            self.behaviors.handle_event(&mut ctx, handler, &mut event)?;
        }
        Ok(event)
    }
}
