//! Element arena and handles.

use std::fmt::{self, Write as _};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Tags serialized without a closing tag.
const VOID_TAGS: &[&str] = &["input", "br", "hr", "img", "meta", "link"];

type NodeId = usize;

#[derive(Debug)]
struct Node {
    tag: String,
    dom_id: Option<String>,
    class_name: String,
    text: String,
    value: String,
    disabled: bool,
    scroll_top: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Live [`Element`] handles pointing at this node.
    handles: usize,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            dom_id: None,
            class_name: String::new(),
            text: String::new(),
            value: String::new(),
            disabled: false,
            scroll_top: 0,
            parent: None,
            children: Vec::new(),
            handles: 0,
        }
    }
}

#[derive(Debug)]
struct DocumentInner {
    nodes: Vec<Node>,
    body: NodeId,
    active: Option<NodeId>,
    /// Slots of collected nodes, reused by `create_element`.
    free: Vec<NodeId>,
}

impl DocumentInner {
    fn is_connected(&self, mut id: NodeId) -> bool {
        loop {
            if id == self.body {
                return true;
            }
            match self.nodes[id].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn contains(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.nodes[id].parent {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    fn root(&self, mut id: NodeId) -> NodeId {
        while let Some(parent) = self.nodes[id].parent {
            id = parent;
        }
        id
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().copied());
        }
        out
    }

    /// Free the detached tree holding `id` once no handle can reach it.
    fn collect(&mut self, id: NodeId) {
        let root = self.root(id);
        if root == self.body {
            return;
        }
        let tree = self.subtree(root);
        if tree.iter().any(|node| self.nodes[*node].handles > 0) {
            return;
        }
        for node in tree {
            self.nodes[node] = Node::new("");
            self.free.push(node);
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|child| *child != id);
        }
        if self.active.is_some_and(|active| self.contains(id, active)) {
            self.active = None;
        }
    }

    /// Rows occupied by a node's subtree; every node takes at least one.
    fn rows(&self, id: NodeId) -> usize {
        let node = &self.nodes[id];
        let own = node.text.lines().count().max(1);
        if node.children.is_empty() {
            own
        } else {
            node.children.iter().map(|child| self.rows(*child)).sum()
        }
    }

    fn find_by_id(&self, from: NodeId, dom_id: &str) -> Option<NodeId> {
        let node = &self.nodes[from];
        if node.dom_id.as_deref() == Some(dom_id) {
            return Some(from);
        }
        node.children
            .iter()
            .find_map(|child| self.find_by_id(*child, dom_id))
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        let _ = write!(out, "<{}", node.tag);
        if let Some(dom_id) = &node.dom_id {
            let _ = write!(out, " id=\"{}\"", escape_html(dom_id));
        }
        if !node.class_name.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_html(&node.class_name));
        }
        if !node.value.is_empty() {
            let _ = write!(out, " value=\"{}\"", escape_html(&node.value));
        }
        if node.disabled {
            out.push_str(" disabled");
        }
        out.push('>');
        if VOID_TAGS.contains(&node.tag.as_str()) {
            return;
        }
        out.push_str(&escape_html(&node.text));
        for child in &node.children {
            self.write_html(*child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }
}

/// Escape text for inclusion in HTML content or a quoted attribute.
#[must_use]
pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A headless document.
///
/// Cloning is cheap and yields another handle to the same tree.
#[derive(Clone)]
pub struct Document {
    inner: Arc<RwLock<DocumentInner>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.read();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.len())
            .field("active", &inner.active)
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with a `<body>` root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(DocumentInner {
                nodes: vec![Node::new("body")],
                body: 0,
                active: None,
                free: Vec::new(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, DocumentInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DocumentInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, node: NodeId) -> Element {
        self.write().nodes[node].handles += 1;
        Element {
            doc: self.clone(),
            node,
        }
    }

    /// The root `<body>` element.
    #[must_use]
    pub fn body(&self) -> Element {
        let body = self.read().body;
        self.handle(body)
    }

    /// Create a detached element.
    #[must_use]
    pub fn create_element(&self, tag: &str) -> Element {
        let mut inner = self.write();
        let mut node = Node::new(tag);
        node.handles = 1;
        let id = if let Some(id) = inner.free.pop() {
            inner.nodes[id] = node;
            id
        } else {
            inner.nodes.push(node);
            inner.nodes.len() - 1
        };
        drop(inner);
        Element {
            doc: self.clone(),
            node: id,
        }
    }

    /// Find a connected element by its `id` attribute.
    #[must_use]
    pub fn get_element_by_id(&self, dom_id: &str) -> Option<Element> {
        let inner = self.read();
        let found = inner.find_by_id(inner.body, dom_id);
        drop(inner);
        found.map(|node| self.handle(node))
    }

    /// The element that currently has keyboard focus.
    #[must_use]
    pub fn active_element(&self) -> Option<Element> {
        let active = self.read().active;
        active.map(|node| self.handle(node))
    }

    /// Number of live nodes, `<body>` included.
    ///
    /// A detached subtree is collected once the last handle into it drops.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let inner = self.read();
        inner.nodes.len() - inner.free.len()
    }

    /// Serialize the connected tree, starting at `<body>`.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.body().outer_html()
    }
}

/// Handle to a single element of a [`Document`].
///
/// Handles must not be dropped while a guard on the document is held.
pub struct Element {
    doc: Document,
    node: NodeId,
}

impl Clone for Element {
    fn clone(&self) -> Self {
        self.doc.handle(self.node)
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        let mut inner = self.doc.write();
        let node = &mut inner.nodes[self.node];
        node.handles = node.handles.saturating_sub(1);
        if node.handles == 0 {
            inner.collect(self.node);
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.doc.read();
        let node = &inner.nodes[self.node];
        f.debug_struct("Element")
            .field("tag", &node.tag)
            .field("id", &node.dom_id)
            .field("class", &node.class_name)
            .finish()
    }
}

impl Element {
    /// Whether both handles point at the same node of the same document.
    #[must_use]
    pub fn same_node(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.doc.inner, &other.doc.inner) && self.node == other.node
    }

    /// The document that owns this element.
    #[must_use]
    pub fn document(&self) -> Document {
        self.doc.clone()
    }

    #[must_use]
    pub fn tag_name(&self) -> String {
        self.doc.read().nodes[self.node].tag.clone()
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.doc.read().nodes[self.node].dom_id.clone()
    }

    pub fn set_id(&self, dom_id: impl Into<String>) {
        self.doc.write().nodes[self.node].dom_id = Some(dom_id.into());
    }

    #[must_use]
    pub fn class_name(&self) -> String {
        self.doc.read().nodes[self.node].class_name.clone()
    }

    pub fn set_class_name(&self, class_name: impl Into<String>) {
        self.doc.write().nodes[self.node].class_name = class_name.into();
    }

    /// Whether the space-separated class list contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.doc.read().nodes[self.node]
            .class_name
            .split_whitespace()
            .any(|c| c == class)
    }

    /// Own text content, excluding children.
    #[must_use]
    pub fn text(&self) -> String {
        self.doc.read().nodes[self.node].text.clone()
    }

    /// Replace the element's text. The string is stored verbatim and never
    /// parsed as markup.
    pub fn set_text(&self, text: impl Into<String>) {
        self.doc.write().nodes[self.node].text = text.into();
    }

    /// Current value of a form control.
    #[must_use]
    pub fn value(&self) -> String {
        self.doc.read().nodes[self.node].value.clone()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        self.doc.write().nodes[self.node].value = value.into();
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.doc.read().nodes[self.node].disabled
    }

    /// Toggle the disabled flag. Disabling the focused element blurs it.
    pub fn set_disabled(&self, disabled: bool) {
        let mut inner = self.doc.write();
        inner.nodes[self.node].disabled = disabled;
        if disabled && inner.active == Some(self.node) {
            inner.active = None;
        }
    }

    /// Move keyboard focus here. Disabled or detached elements cannot take
    /// focus; the call is then a no-op, as in a browser.
    pub fn focus(&self) {
        let mut inner = self.doc.write();
        if !inner.nodes[self.node].disabled && inner.is_connected(self.node) {
            inner.active = Some(self.node);
        }
    }

    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.doc.read().active == Some(self.node)
    }

    /// Whether the element is attached to the document's `<body>`.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.doc.read().is_connected(self.node)
    }

    /// Append `child` as the last child, detaching it from any former parent.
    pub fn append_child(&self, child: &Element) {
        let mut inner = self.doc.write();
        if inner.contains(child.node, self.node) {
            return;
        }
        let old_parent = inner.nodes[child.node].parent;
        inner.detach(child.node);
        inner.nodes[child.node].parent = Some(self.node);
        inner.nodes[self.node].children.push(child.node);
        if let Some(old_parent) = old_parent {
            inner.collect(old_parent);
        }
    }

    /// Detach this element from its parent. Removing a detached element is
    /// a no-op.
    pub fn remove(&self) {
        self.doc.write().detach(self.node);
    }

    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        let children = self.doc.read().nodes[self.node].children.clone();
        children
            .into_iter()
            .map(|node| self.doc.handle(node))
            .collect()
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.doc.read().nodes[self.node].children.len()
    }

    /// Total content height in rows.
    #[must_use]
    pub fn scroll_height(&self) -> usize {
        self.doc.read().rows(self.node)
    }

    #[must_use]
    pub fn scroll_top(&self) -> usize {
        self.doc.read().nodes[self.node].scroll_top
    }

    /// Set the scroll offset, clamped to the content height.
    pub fn set_scroll_top(&self, top: usize) {
        let mut inner = self.doc.write();
        let max = inner.rows(self.node);
        inner.nodes[self.node].scroll_top = top.min(max);
    }

    /// Serialize this element and its subtree.
    #[must_use]
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.doc.read().write_html(self.node, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (Document, Element, Element) {
        let doc = Document::new();
        let list = doc.create_element("div");
        list.set_id("list");
        let input = doc.create_element("input");
        input.set_id("input");
        doc.body().append_child(&list);
        doc.body().append_child(&input);
        (doc, list, input)
    }

    #[test]
    fn test_lookup_only_finds_connected_elements() {
        let (doc, list, _) = page();
        assert!(doc.get_element_by_id("list").is_some());

        list.remove();
        assert!(doc.get_element_by_id("list").is_none());
        assert!(!list.is_connected());
    }

    #[test]
    fn test_text_is_escaped_in_html() {
        let (doc, list, _) = page();
        let bubble = doc.create_element("div");
        bubble.set_text("<script>alert('x')</script> & co");
        list.append_child(&bubble);

        let html = doc.to_html();
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co"));
        assert!(!html.contains("<script>"));
        assert_eq!(bubble.text(), "<script>alert('x')</script> & co");
    }

    #[test]
    fn test_disabling_focused_element_blurs_it() {
        let (doc, _, input) = page();
        input.focus();
        assert!(input.is_focused());

        input.set_disabled(true);
        assert!(doc.active_element().is_none());

        input.focus();
        assert!(!input.is_focused());

        input.set_disabled(false);
        input.focus();
        assert!(doc.active_element().unwrap().same_node(&input));
    }

    #[test]
    fn test_scroll_top_is_clamped_to_content() {
        let (doc, list, _) = page();
        for text in ["one", "two\nlines"] {
            let bubble = doc.create_element("div");
            bubble.set_text(text);
            list.append_child(&bubble);
        }
        assert_eq!(list.scroll_height(), 3);

        list.set_scroll_top(usize::MAX);
        assert_eq!(list.scroll_top(), 3);
    }

    #[test]
    fn test_append_moves_between_parents() {
        let (doc, list, _) = page();
        let other = doc.create_element("div");
        doc.body().append_child(&other);
        let child = doc.create_element("span");

        list.append_child(&child);
        other.append_child(&child);

        assert_eq!(list.child_count(), 0);
        assert_eq!(other.child_count(), 1);
    }

    #[test]
    fn test_removed_subtree_slots_are_reused() {
        let (doc, list, _) = page();
        let baseline = doc.node_count();

        let marker = doc.create_element("div");
        for _ in 0..3 {
            marker.append_child(&doc.create_element("span"));
        }
        list.append_child(&marker);
        assert_eq!(doc.node_count(), baseline + 4);

        marker.remove();
        assert_eq!(doc.node_count(), baseline + 4);
        drop(marker);
        assert_eq!(doc.node_count(), baseline);

        let reused = doc.create_element("p");
        assert_eq!(reused.tag_name(), "p");
        assert_eq!(reused.child_count(), 0);
        assert_eq!(doc.node_count(), baseline + 1);
    }

    #[test]
    fn test_connected_nodes_survive_their_handles() {
        let (doc, list, _) = page();
        let bubble = doc.create_element("div");
        bubble.set_text("kept");
        list.append_child(&bubble);
        drop(bubble);

        assert_eq!(list.children()[0].text(), "kept");

        let child = list.children().remove(0);
        let held = child.clone();
        drop(child);
        held.remove();
        assert_eq!(held.text(), "kept");
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let (_, _, input) = page();
        input.set_value("draft");
        input.set_disabled(true);
        assert_eq!(
            input.outer_html(),
            r#"<input id="input" value="draft" disabled>"#
        );
    }
}
