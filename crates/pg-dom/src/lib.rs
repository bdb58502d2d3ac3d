//! DOM tree data structures.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by [`NodeId`].
//! Nodes are never removed from the arena; detaching only rewires parent links.

/// ID used to address nodes in the DOM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Document-relative box written by layout.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutBox {
    pub top: f32,
    pub height: f32,
}

impl LayoutBox {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag_name: String,
    attributes: Vec<(String, String)>,
    layout: LayoutBox,
    rendered: bool,
}

impl Element {
    fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: Vec::new(),
            layout: LayoutBox::default(),
            rendered: true,
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|candidate| candidate == class)
    }

    fn set_attribute(&mut self, name: &str, value: String) {
        if let Some(slot) = self
            .attributes
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            slot.1 = value;
            return;
        }

        self.attributes.push((name.to_ascii_lowercase(), value));
    }

    fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        before != self.attributes.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Arena-backed document model.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
    title: String,
    style_sources: Vec<String>,
    revision: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl Document {
    pub fn empty() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            title: String::new(),
            style_sources: Vec::new(),
            revision: 0,
        }
    }

    /// Bumped by every tree or attribute mutation; layout writes do not count.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn has_root(&self) -> bool {
        !self.nodes[0].children.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Bodies of `<style>` elements in document order.
    pub fn style_sources(&self) -> &[String] {
        &self.style_sources
    }

    pub fn push_style_source(&mut self, source: impl Into<String>) {
        self.style_sources.push(source.into());
    }

    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push_node(NodeKind::Element(Element::new(tag_name)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Text(text.into()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        self.revision = self.revision.wrapping_add(1);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.contains(child, parent) {
            return;
        }

        self.detach(child);
        self.revision = self.revision.wrapping_add(1);
        if let Some(node) = self.nodes.get_mut(child.0) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(child);
        }
    }

    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        self.revision = self.revision.wrapping_add(1);
        if let Some(parent_node) = self.nodes.get_mut(parent.0) {
            parent_node.children.retain(|candidate| *candidate != node);
        }
        if let Some(child_node) = self.nodes.get_mut(node.0) {
            child_node.parent = None;
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|node| node.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|node| &node.kind)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match self.kind(node) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(node.0).map(|node| &mut node.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::tag_name)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|element| element.attribute(name))
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.element_mut(node) {
            element.set_attribute(name, value.into());
            self.revision = self.revision.wrapping_add(1);
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> bool {
        let removed = self
            .element_mut(node)
            .is_some_and(|element| element.remove_attribute(name));
        if removed {
            self.revision = self.revision.wrapping_add(1);
        }
        removed
    }

    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id")
    }

    /// Reads a `data-*` attribute by its camel-cased dataset key (`src` → `data-src`).
    pub fn dataset(&self, node: NodeId, key: &str) -> Option<&str> {
        self.attribute(node, &dataset_attribute_name(key))
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|element| element.has_class(class))
    }

    /// Adds `class` to the element's class list. Returns true if it was absent.
    pub fn add_class(&mut self, node: NodeId, class: &str) -> bool {
        if class.is_empty() || !self.is_element(node) || self.has_class(node, class) {
            return false;
        }

        let mut tokens = self.class_tokens(node);
        tokens.push(class.to_owned());
        self.set_attribute(node, "class", tokens.join(" "));
        true
    }

    /// Removes `class` from the element's class list. Returns true if it was present.
    pub fn remove_class(&mut self, node: NodeId, class: &str) -> bool {
        if !self.has_class(node, class) {
            return false;
        }

        let tokens = self
            .class_tokens(node)
            .into_iter()
            .filter(|token| token != class)
            .collect::<Vec<_>>();
        self.set_attribute(node, "class", tokens.join(" "));
        true
    }

    /// Flips `class` and returns whether it is present afterwards.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class)
        }
    }

    fn class_tokens(&self, node: NodeId) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        if let Some(element) = self.element(node) {
            for class in element.classes() {
                if !tokens.iter().any(|token| token == class) {
                    tokens.push(class.to_owned());
                }
            }
        }
        tokens
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.kind(node) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(_) => {
                for child in self.children(node) {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// Replaces all children of `node` with a single text node.
    ///
    /// A lone existing text child is rewritten in place instead of replaced.
    pub fn set_text_content(&mut self, node: NodeId, text: impl Into<String>) {
        if !self.is_element(node) {
            return;
        }

        let text = text.into();
        if let [only] = *self.children(node) {
            if self.is_text(only) {
                self.set_text(only, text);
                return;
            }
        }

        for child in self.children(node).to_vec() {
            self.detach(child);
        }
        let text_node = self.create_text(text);
        self.append_child(node, text_node);
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(NodeKind::Text(_)))
    }

    /// Rewrites the data of a text node. Returns false for any other node.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> bool {
        let Some(NodeKind::Text(existing)) = self.nodes.get_mut(node.0).map(|node| &mut node.kind)
        else {
            return false;
        };
        let text = text.into();
        if *existing != text {
            *existing = text;
            self.revision = self.revision.wrapping_add(1);
        }
        true
    }

    /// Inclusive containment: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Ancestors of `node`, nearest first, excluding `node` itself.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |current| self.parent(*current))
    }

    /// Descendants of `node` in tree order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.children(node).iter().rev().copied().collect::<Vec<_>>();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// All connected elements in tree order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|node| self.is_element(*node))
            .collect()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }

        self.elements()
            .into_iter()
            .find(|node| self.element_id(*node) == Some(id))
    }

    pub fn first_element_by_tag(&self, tag_name: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|node| self.tag_name(*node) == Some(tag_name))
    }

    pub fn layout_box(&self, node: NodeId) -> LayoutBox {
        self.element(node)
            .map(|element| element.layout)
            .unwrap_or_default()
    }

    pub fn set_layout_box(&mut self, node: NodeId, layout: LayoutBox) {
        if let Some(element) = self.element_mut(node) {
            element.layout = layout;
            element.rendered = true;
        }
    }

    /// Marks `node` as generating no box; it keeps a zero-height placeholder at `top`.
    pub fn set_unrendered(&mut self, node: NodeId, top: f32) {
        if let Some(element) = self.element_mut(node) {
            element.layout = LayoutBox { top, height: 0.0 };
            element.rendered = false;
        }
    }

    pub fn is_rendered(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|element| element.rendered)
    }

    pub fn offset_top(&self, node: NodeId) -> f32 {
        self.layout_box(node).top
    }

    pub fn offset_height(&self, node: NodeId) -> f32 {
        self.layout_box(node).height
    }
}

fn dataset_attribute_name(key: &str) -> String {
    let mut out = String::from("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
