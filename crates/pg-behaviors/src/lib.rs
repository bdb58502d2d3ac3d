//! Page behaviors for a single-page portfolio site.
//!
//! [`PageBehaviors`] owns the state of six independent behaviors: lazy images,
//! the mobile navigation toggle, smooth-scroll anchors, the scroll-direction
//! header, scroll-spy highlighting and the timeline reveal. Listeners are
//! registered as [`Handler`] tokens and frame callbacks as [`FrameTask`] tokens;
//! [`PageSession`] turns host input into those tokens and runs them.

pub mod config;
pub mod header;
pub mod lazy_images;
pub mod mobile_nav;
pub mod scroll_spy;
pub mod session;
pub mod smooth_scroll;
pub mod timeline;

pub use config::BehaviorConfig;
pub use header::HeaderDirection;
pub use header::HeaderTracker;
pub use lazy_images::LazyImageLoader;
pub use mobile_nav::MobileNav;
pub use mobile_nav::NavState;
pub use scroll_spy::ScrollSpy;
pub use session::FrameReport;
pub use session::PageSession;
pub use smooth_scroll::AnchorOutcome;
pub use smooth_scroll::SmoothScrollRouter;
pub use timeline::TimelineReveal;

use pg_core::PageResult;
use pg_css::SelectorList;
use pg_dom::NodeId;
use pg_host::Event;
use pg_host::EventKind;
use pg_host::EventRegistry;
use pg_host::EventTarget;
use pg_host::FrameHandle;
use pg_host::FrameScheduler;
use pg_host::Page;

/// Listener tokens stored in the event registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Structural-ready: installs every behavior.
    Init,
    ToggleClick,
    OutsideClick,
    AnchorClick(NodeId),
    HeaderScroll,
    SpyScroll,
}

/// Animation-frame callback tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTask {
    HeaderDirection,
    ScrollSpy,
}

/// Host services a handler may touch while it runs.
pub struct HostContext<'a> {
    pub page: &'a mut Page,
    pub events: &'a mut EventRegistry<Handler>,
    pub frames: &'a mut FrameScheduler<FrameTask>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BehaviorStats {
    pub images_loaded: usize,
    pub nav_toggles: usize,
    pub anchor_scrolls: usize,
    pub unresolved_anchors: usize,
    pub header_evaluations: usize,
    pub spy_evaluations: usize,
    pub reveals: usize,
}

#[derive(Debug, Clone)]
pub struct PageBehaviors {
    config: BehaviorConfig,
    installed: bool,
    lazy_images: Option<LazyImageLoader>,
    nav: Option<MobileNav>,
    router: Option<SmoothScrollRouter>,
    header: Option<HeaderTracker>,
    spy: Option<ScrollSpy>,
    timeline: Option<TimelineReveal>,
    stats: BehaviorStats,
}

impl PageBehaviors {
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            config,
            installed: false,
            lazy_images: None,
            nav: None,
            router: None,
            header: None,
            spy: None,
            timeline: None,
            stats: BehaviorStats::default(),
        }
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn stats(&self) -> BehaviorStats {
        self.stats
    }

    /// Subscribes installation to the structural-ready event.
    pub fn attach(&self, events: &mut EventRegistry<Handler>) {
        events.add_listener(EventTarget::Document, EventKind::DomContentLoaded, Handler::Init);
    }

    /// Wires every behavior into the page. A second call does nothing.
    pub fn install(&mut self, ctx: &mut HostContext<'_>) -> PageResult<()> {
        if self.installed {
            return Ok(());
        }
        let selectors = &self.config.selectors;
        let lazy_images = SelectorList::parse(&selectors.lazy_images)?;
        let header = SelectorList::parse(&selectors.header)?;
        let navbar = SelectorList::parse(&selectors.navbar)?;
        let anchors = SelectorList::parse(&selectors.anchors)?;
        let sections = SelectorList::parse(&selectors.sections)?;
        let nav_links = SelectorList::parse(&selectors.nav_links)?;
        let containers = SelectorList::parse(&selectors.containers)?;

        let (loader, assigned) = LazyImageLoader::install(ctx.page, &lazy_images);
        self.stats.images_loaded += assigned;
        self.lazy_images = Some(loader);

        let header = header.select_first(&ctx.page.document);
        let navbar = navbar.select_first(&ctx.page.document);
        match (header, navbar) {
            (Some(header), Some(navbar)) => {
                let nav = MobileNav::install(
                    &mut ctx.page.document,
                    header,
                    navbar,
                    &self.config.toggle,
                    &self.config.classes,
                );
                ctx.events.add_listener(
                    EventTarget::Node(nav.toggle_control()),
                    EventKind::Click,
                    Handler::ToggleClick,
                );
                ctx.events
                    .add_listener(EventTarget::Document, EventKind::Click, Handler::OutsideClick);
                self.nav = Some(nav);
            }
            (None, _) => {
                tracing::warn!(selector = %self.config.selectors.header, "header not found; mobile navigation skipped");
            }
            (_, None) => {
                tracing::warn!(selector = %self.config.selectors.navbar, "navbar not found; mobile navigation skipped");
            }
        }

        let router = SmoothScrollRouter::install(ctx.page, &anchors);
        for anchor in router.anchors() {
            ctx.events.add_listener(
                EventTarget::Node(*anchor),
                EventKind::Click,
                Handler::AnchorClick(*anchor),
            );
        }
        self.router = Some(router);

        if let Some(header) = header {
            self.header = Some(HeaderTracker::new(
                header,
                &self.config.classes.scroll_up,
                &self.config.classes.scroll_down,
            ));
            ctx.events
                .add_listener(EventTarget::Window, EventKind::Scroll, Handler::HeaderScroll);
        } else {
            tracing::warn!("scroll-direction header skipped");
        }

        self.spy = Some(ScrollSpy::new(
            sections.select_all(&ctx.page.document),
            nav_links.select_all(&ctx.page.document),
            self.config.scroll_spy.pre_roll,
            &self.config.classes.active_link,
        ));
        ctx.events
            .add_listener(EventTarget::Window, EventKind::Scroll, Handler::SpyScroll);

        self.timeline = Some(TimelineReveal::install(
            containers.select_all(&ctx.page.document),
            &self.config.reveal,
            &self.config.classes.revealed,
        ));

        self.installed = true;
        tracing::info!(
            listeners = ctx.events.listener_count(),
            images = self.lazy_images.as_ref().map_or(0, |loader| loader.images().len()),
            anchors = self.router.as_ref().map_or(0, |router| router.anchors().len()),
            "page behaviors installed"
        );
        Ok(())
    }

    /// Runs one listener for `event`.
    pub fn handle_event(
        &mut self,
        ctx: &mut HostContext<'_>,
        handler: Handler,
        event: &mut Event,
    ) -> PageResult<()> {
        match handler {
            Handler::Init => self.install(ctx)?,
            Handler::ToggleClick => {
                if let Some(nav) = &self.nav {
                    nav.toggle(&mut ctx.page.document);
                    self.stats.nav_toggles += 1;
                }
            }
            Handler::OutsideClick => {
                if let Some(nav) = &self.nav {
                    nav.handle_outside_click(&mut ctx.page.document, event.target_node());
                }
            }
            Handler::AnchorClick(anchor) => {
                if let Some(router) = &self.router {
                    match router.handle_click(ctx.page, anchor, event) {
                        AnchorOutcome::Scrolled { .. } => self.stats.anchor_scrolls += 1,
                        AnchorOutcome::Unresolved => self.stats.unresolved_anchors += 1,
                    }
                }
                if let Some(nav) = &self.nav {
                    nav.close(&mut ctx.page.document);
                }
            }
            Handler::HeaderScroll => {
                if let Some(header) = self.header.as_mut() {
                    header.schedule(ctx.frames);
                }
            }
            Handler::SpyScroll => {
                if let Some(spy) = self.spy.as_mut() {
                    spy.schedule(ctx.frames);
                }
            }
        }
        Ok(())
    }

    /// Runs a due frame callback against the current scroll offset.
    pub fn run_frame_task(&mut self, page: &mut Page, handle: FrameHandle, task: FrameTask) -> bool {
        let scroll_y = page.viewport.scroll_y();
        match task {
            FrameTask::HeaderDirection => {
                let ran = self
                    .header
                    .as_mut()
                    .is_some_and(|header| header.run_frame(handle, &mut page.document, scroll_y));
                if ran {
                    self.stats.header_evaluations += 1;
                }
                ran
            }
            FrameTask::ScrollSpy => {
                let ran = self
                    .spy
                    .as_mut()
                    .is_some_and(|spy| spy.run_frame(handle, &mut page.document, scroll_y));
                if ran {
                    self.stats.spy_evaluations += 1;
                }
                ran
            }
        }
    }

    /// Delivers pending visibility records. Returns `(images_loaded, containers_revealed)`.
    pub fn deliver_intersections(&mut self, page: &mut Page) -> (usize, usize) {
        let images = self
            .lazy_images
            .as_mut()
            .map_or(0, |loader| loader.deliver_intersections(page));
        let reveals = self
            .timeline
            .as_mut()
            .map_or(0, |timeline| timeline.deliver_intersections(page));
        self.stats.images_loaded += images;
        self.stats.reveals += reveals;
        (images, reveals)
    }

    pub fn lazy_images(&self) -> Option<&LazyImageLoader> {
        self.lazy_images.as_ref()
    }

    pub fn mobile_nav(&self) -> Option<&MobileNav> {
        self.nav.as_ref()
    }

    pub fn header(&self) -> Option<&HeaderTracker> {
        self.header.as_ref()
    }

    pub fn scroll_spy(&self) -> Option<&ScrollSpy> {
        self.spy.as_ref()
    }

    pub fn timeline(&self) -> Option<&TimelineReveal> {
        self.timeline.as_ref()
    }

    pub fn nav_state(&self, page: &Page) -> Option<NavState> {
        self.nav.as_ref().map(|nav| nav.state(&page.document))
    }

    pub fn header_direction(&self, page: &Page) -> Option<HeaderDirection> {
        self.header
            .as_ref()
            .map(|header| header.direction(&page.document))
    }

    pub fn active_links(&self, page: &Page) -> Vec<NodeId> {
        self.spy
            .as_ref()
            .map(|spy| spy.active_links(&page.document))
            .unwrap_or_default()
    }

    pub fn revealed(&self, page: &Page) -> Vec<NodeId> {
        self.timeline
            .as_ref()
            .map(|timeline| timeline.revealed(page))
            .unwrap_or_default()
    }
}
