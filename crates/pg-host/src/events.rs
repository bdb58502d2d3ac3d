//! Event targets, listener registration and the bubbling dispatch path.

use pg_dom::Document;
use pg_dom::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Document,
    Node(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DomContentLoaded,
    Click,
    Scroll,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::Click => "click",
            Self::Scroll => "scroll",
        }
    }
}

/// Event being dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
    target: EventTarget,
    default_prevented: bool,
}

impl Event {
    pub fn new(kind: EventKind, target: EventTarget) -> Self {
        Self {
            kind,
            target,
            default_prevented: false,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn target(&self) -> EventTarget {
        self.target
    }

    pub fn target_node(&self) -> Option<NodeId> {
        match self.target {
            EventTarget::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone)]
struct Listener<H> {
    target: EventTarget,
    kind: EventKind,
    handler: H,
}

/// Listener table keyed by target and event kind.
///
/// Handlers are opaque tokens; the owner of the registry decides what running one means.
#[derive(Debug, Clone)]
pub struct EventRegistry<H> {
    listeners: Vec<Listener<H>>,
}

impl<H> Default for EventRegistry<H> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<H: Clone> EventRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, target: EventTarget, kind: EventKind, handler: H) {
        self.listeners.push(Listener {
            target,
            kind,
            handler,
        });
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Handlers to run for `event`, in dispatch order.
    ///
    /// The list is fixed when dispatch starts: listeners added by a running handler
    /// only see later events.
    pub fn handlers_for(&self, document: &Document, event: &Event) -> Vec<H> {
        dispatch_path(document, event.target())
            .into_iter()
            .flat_map(|current| {
                self.listeners
                    .iter()
                    .filter(move |listener| listener.target == current && listener.kind == event.kind())
                    .map(|listener| listener.handler.clone())
            })
            .collect()
    }
}

/// Target first, then ancestors, the document and the window.
pub fn dispatch_path(document: &Document, target: EventTarget) -> Vec<EventTarget> {
    match target {
        EventTarget::Window => vec![EventTarget::Window],
        EventTarget::Document => vec![EventTarget::Document, EventTarget::Window],
        EventTarget::Node(node) => {
            let root = document.root();
            let mut path = vec![EventTarget::Node(node)];
            for ancestor in document.ancestors(node) {
                if ancestor != root {
                    path.push(EventTarget::Node(ancestor));
                }
            }
            if document.contains(root, node) {
                path.push(EventTarget::Document);
                path.push(EventTarget::Window);
            }
            path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Event;
    use super::EventKind;
    use super::EventRegistry;
    use super::EventTarget;
    use super::dispatch_path;
    use pg_dom::Document;

    #[test]
    fn click_bubbles_from_target_to_window() {
        let mut doc = Document::empty();
        let header = doc.create_element("header");
        let button = doc.create_element("div");
        let root = doc.root();
        doc.append_child(root, header);
        doc.append_child(header, button);

        let mut registry = EventRegistry::new();
        registry.add_listener(EventTarget::Window, EventKind::Click, "window");
        registry.add_listener(EventTarget::Document, EventKind::Click, "document");
        registry.add_listener(EventTarget::Node(button), EventKind::Click, "button");
        registry.add_listener(EventTarget::Node(header), EventKind::Scroll, "header-scroll");
        registry.add_listener(EventTarget::Node(button), EventKind::Click, "button-2");

        let event = Event::new(EventKind::Click, EventTarget::Node(button));
        assert_eq!(
            registry.handlers_for(&doc, &event),
            vec!["button", "button-2", "document", "window"]
        );
        assert_eq!(registry.listener_count(), 5);
    }

    #[test]
    fn detached_nodes_do_not_reach_the_document() {
        let mut doc = Document::empty();
        let orphan = doc.create_element("div");
        assert_eq!(
            dispatch_path(&doc, EventTarget::Node(orphan)),
            vec![EventTarget::Node(orphan)]
        );
    }

    #[test]
    fn prevent_default_is_sticky() {
        let mut event = Event::new(EventKind::Click, EventTarget::Document);
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
        assert_eq!(event.target_node(), None);
        assert_eq!(event.kind().as_str(), "click");
    }
}
