//! Host environment the page behaviors run against.
//!
//! Stands in for the browser services a page script relies on: event dispatch,
//! animation frames, visibility observers, the scrolling viewport and history.

pub mod events;
pub mod frames;
pub mod history;
pub mod observer;
pub mod page;
pub mod viewport;

pub use events::Event;
pub use events::EventKind;
pub use events::EventRegistry;
pub use events::EventTarget;
pub use frames::FrameHandle;
pub use frames::FrameScheduler;
pub use history::History;
pub use observer::IntersectionEntry;
pub use observer::IntersectionObserver;
pub use observer::ObserverOptions;
pub use page::Capabilities;
pub use page::Page;
pub use page::PageOptions;
pub use viewport::ScrollBehavior;
pub use viewport::ScrollRequest;
pub use viewport::Viewport;
