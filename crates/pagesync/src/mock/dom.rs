//! In-memory DOM tree for [`MockDriver`](super::MockDriver).

use std::collections::BTreeMap;

use crate::driver::BoundingBox;

/// Geometry given to displayed nodes that do not set their own
const DEFAULT_BOUNDS: BoundingBox = BoundingBox::new(10.0, 10.0, 120.0, 24.0);

/// Declarative node used to build a mock page
#[derive(Debug, Clone, PartialEq)]
pub struct MockNode {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    displayed: bool,
    bounds: BoundingBox,
    children: Vec<MockNode>,
}

impl MockNode {
    /// Create a displayed, enabled node
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            text: String::new(),
            displayed: true,
            bounds: DEFAULT_BOUNDS,
            children: Vec::new(),
        }
    }

    /// `<input type="...">`
    #[must_use]
    pub fn input(kind: &str) -> Self {
        Self::new("input").attr("type", kind)
    }

    /// Radio button in group `name`
    #[must_use]
    pub fn radio(name: &str, value: &str) -> Self {
        Self::input("radio").attr("name", name).attr("value", value)
    }

    /// `<option>` whose text is also its value
    #[must_use]
    pub fn option(text: &str) -> Self {
        Self::new("option").attr("value", text).text(text)
    }

    /// `<tr>` of `<td>` cells
    #[must_use]
    pub fn row(cells: &[&str]) -> Self {
        Self::new("tr").children(cells.iter().map(|c| Self::new("td").text(c)))
    }

    /// `<tr>` of `<th>` cells
    #[must_use]
    pub fn header_row(cells: &[&str]) -> Self {
        Self::new("tr").children(cells.iter().map(|c| Self::new("th").text(c)))
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Add a class
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        let classes = self.attrs.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self
    }

    /// Own text content
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Not rendered (`display: none`)
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Carries the `disabled` attribute
    #[must_use]
    pub fn disabled(self) -> Self {
        self.attr("disabled", "true")
    }

    /// Checked radio or checkbox
    #[must_use]
    pub fn checked(self) -> Self {
        self.attr("checked", "true")
    }

    /// Selected option
    #[must_use]
    pub fn selected(self) -> Self {
        self.attr("selected", "true")
    }

    /// Explicit geometry
    #[must_use]
    pub const fn bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = bounds;
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Live node id inside a [`MockDom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) tag: String,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) text: String,
    pub(crate) displayed: bool,
    pub(crate) bounds: BoundingBox,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

/// Mutable page state.
///
/// Removed nodes leave a tombstone so handles issued for them report
/// staleness instead of pointing at a different element.
#[derive(Debug, Clone)]
pub struct MockDom {
    nodes: Vec<Option<NodeData>>,
    ready_state: String,
}

impl MockDom {
    pub(crate) fn from_root(root: MockNode) -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            ready_state: "complete".to_string(),
        };
        dom.insert(root, None);
        dom
    }

    fn insert(&mut self, node: MockNode, parent: Option<usize>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Some(NodeData {
            tag: node.tag,
            attrs: node.attrs,
            text: node.text,
            displayed: node.displayed,
            bounds: node.bounds,
            parent,
            children: Vec::new(),
        }));
        for child in node.children {
            let child_idx = self.insert(child, Some(idx));
            if let Some(data) = self.get_mut(idx) {
                data.children.push(child_idx);
            }
        }
        idx
    }

    /// Root node, if it has not been removed
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.get(0).map(|_| NodeId(0))
    }

    /// First live node, in document order, with the given `id` attribute
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|&idx| self.attr_idx(idx, "id") == Some(id))
            .map(NodeId)
    }

    /// Append a subtree under `parent`; `None` if `parent` was removed
    pub fn append(&mut self, parent: NodeId, node: MockNode) -> Option<NodeId> {
        self.get(parent.0)?;
        let idx = self.insert(node, Some(parent.0));
        if let Some(data) = self.get_mut(parent.0) {
            data.children.push(idx);
        }
        Some(NodeId(idx))
    }

    /// Detach and tombstone a subtree
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.get(node.0).map(|n| n.parent) else {
            return;
        };
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|&c| c != node.0);
        }
        let mut doomed = vec![node.0];
        doomed.extend(self.descendants(node.0));
        for idx in doomed {
            if let Some(slot) = self.nodes.get_mut(idx) {
                *slot = None;
            }
        }
    }

    /// Toggle rendering
    pub fn set_displayed(&mut self, node: NodeId, displayed: bool) {
        if let Some(data) = self.get_mut(node.0) {
            data.displayed = displayed;
        }
    }

    /// Toggle the `disabled` attribute
    pub fn set_enabled(&mut self, node: NodeId, enabled: bool) {
        if enabled {
            self.remove_attr(node, "disabled");
        } else {
            self.set_attr(node, "disabled", "true");
        }
    }

    /// Set an attribute
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(data) = self.get_mut(node.0) {
            data.attrs.insert(name.to_string(), value.to_string());
        }
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(data) = self.get_mut(node.0) {
            data.attrs.remove(name);
        }
    }

    /// Replace own text content
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(data) = self.get_mut(node.0) {
            data.text = text.to_string();
        }
    }

    /// Read an attribute
    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attr_idx(node.0, name)
    }

    /// `document.readyState`
    #[must_use]
    pub fn ready_state(&self) -> &str {
        &self.ready_state
    }

    /// Change `document.readyState`
    pub fn set_ready_state(&mut self, state: &str) {
        self.ready_state = state.to_string();
    }

    // =========================================================================
    // Crate-internal traversal
    // =========================================================================

    pub(crate) fn get(&self, idx: usize) -> Option<&NodeData> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, idx: usize) -> Option<&mut NodeData> {
        self.nodes.get_mut(idx).and_then(Option::as_mut)
    }

    pub(crate) fn attr_idx(&self, idx: usize, name: &str) -> Option<&str> {
        self.get(idx)
            .and_then(|n| n.attrs.get(name))
            .map(String::as_str)
    }

    pub(crate) fn tag(&self, idx: usize) -> Option<&str> {
        self.get(idx).map(|n| n.tag.as_str())
    }

    pub(crate) fn children_of(&self, idx: usize) -> Vec<usize> {
        self.get(idx).map(|n| n.children.clone()).unwrap_or_default()
    }

    pub(crate) fn parent_of(&self, idx: usize) -> Option<usize> {
        self.get(idx).and_then(|n| n.parent)
    }

    pub(crate) fn ancestors(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut current = self.parent_of(idx);
        while let Some(p) = current {
            out.push(p);
            current = self.parent_of(p);
        }
        out
    }

    fn preorder(&self, idx: usize, out: &mut Vec<usize>) {
        if let Some(node) = self.get(idx) {
            out.push(idx);
            for &child in &node.children {
                self.preorder(child, out);
            }
        }
    }

    /// Every live node reachable from the root, in document order
    pub(crate) fn document_order(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.preorder(0, &mut out);
        out
    }

    /// Descendants of `idx` in document order, excluding `idx`
    pub(crate) fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.preorder(idx, &mut out);
        if !out.is_empty() {
            out.remove(0);
        }
        out
    }

    pub(crate) fn is_displayed(&self, idx: usize) -> bool {
        self.get(idx).is_some_and(|n| n.displayed)
            && self
                .ancestors(idx)
                .iter()
                .all(|&a| self.get(a).is_some_and(|n| n.displayed))
    }

    pub(crate) fn is_enabled(&self, idx: usize) -> bool {
        self.attr_idx(idx, "disabled").is_none()
    }

    pub(crate) fn bounds_of(&self, idx: usize) -> Option<BoundingBox> {
        let node = self.get(idx)?;
        if self.is_displayed(idx) {
            Some(node.bounds)
        } else {
            Some(BoundingBox::collapsed())
        }
    }

    /// Own text followed by descendant text, space separated
    pub(crate) fn text_of(&self, idx: usize) -> String {
        let Some(node) = self.get(idx) else {
            return String::new();
        };
        let mut parts = Vec::new();
        if !node.text.is_empty() {
            parts.push(node.text.clone());
        }
        for &child in &node.children {
            let text = self.text_of(child);
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }

    fn input_type(&self, idx: usize) -> Option<String> {
        if self.tag(idx)? != "input" {
            return None;
        }
        self.attr_idx(idx, "type").map(str::to_ascii_lowercase)
    }

    fn radio_peers(&self, idx: usize) -> Vec<usize> {
        let is_radio = |i: usize| self.input_type(i).as_deref() == Some("radio");
        match self.attr_idx(idx, "name") {
            Some(name) => self
                .document_order()
                .into_iter()
                .filter(|&i| is_radio(i) && self.attr_idx(i, "name") == Some(name))
                .collect(),
            None => self
                .parent_of(idx)
                .map(|p| self.children_of(p))
                .unwrap_or_default()
                .into_iter()
                .filter(|&i| is_radio(i))
                .collect(),
        }
    }

    fn set_flag(&mut self, idx: usize, name: &str, on: bool) {
        if let Some(data) = self.get_mut(idx) {
            if on {
                data.attrs.insert(name.to_string(), "true".to_string());
            } else {
                data.attrs.remove(name);
            }
        }
    }

    /// What a click does to form state
    pub(crate) fn activate(&mut self, idx: usize) {
        match self.tag(idx) {
            Some("input") => match self.input_type(idx).as_deref() {
                Some("radio") => {
                    for peer in self.radio_peers(idx) {
                        self.set_flag(peer, "checked", false);
                    }
                    self.set_flag(idx, "checked", true);
                }
                Some("checkbox") => {
                    let checked = self.attr_idx(idx, "checked").is_some();
                    self.set_flag(idx, "checked", !checked);
                }
                _ => {}
            },
            Some("option") => {
                let select = self
                    .ancestors(idx)
                    .into_iter()
                    .find(|&a| self.tag(a) == Some("select"));
                match select {
                    Some(sel) if self.attr_idx(sel, "multiple").is_some() => {
                        let selected = self.attr_idx(idx, "selected").is_some();
                        self.set_flag(idx, "selected", !selected);
                    }
                    Some(sel) => {
                        for option in self.descendants(sel) {
                            if self.tag(option) == Some("option") {
                                self.set_flag(option, "selected", false);
                            }
                        }
                        self.set_flag(idx, "selected", true);
                    }
                    None => self.set_flag(idx, "selected", true),
                }
            }
            Some("label") => {
                let target = self
                    .attr_idx(idx, "for")
                    .map(str::to_string)
                    .and_then(|id| self.by_id(&id));
                if let Some(target) = target {
                    if target.0 != idx {
                        self.activate(target.0);
                    }
                }
            }
            _ => {}
        }
    }

    pub(crate) fn set_value(&mut self, idx: usize, value: &str) {
        if let Some(data) = self.get_mut(idx) {
            data.attrs.insert("value".to_string(), value.to_string());
        }
    }

    pub(crate) fn set_attr_idx(&mut self, idx: usize, name: &str, value: &str) {
        self.set_attr(NodeId(idx), name, value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn form() -> MockDom {
        MockDom::from_root(
            MockNode::new("body").child(
                MockNode::new("form")
                    .id("f")
                    .child(MockNode::radio("color", "red").id("red").checked())
                    .child(MockNode::radio("color", "blue").id("blue"))
                    .child(MockNode::input("checkbox").id("agree"))
                    .child(
                        MockNode::new("select")
                            .id("single")
                            .child(MockNode::option("A").selected())
                            .child(MockNode::option("B")),
                    ),
            ),
        )
    }

    mod tree_tests {
        use super::*;

        #[test]
        fn test_document_order_is_preorder() {
            let dom = form();
            let tags: Vec<_> = dom
                .document_order()
                .into_iter()
                .map(|i| dom.tag(i).unwrap().to_string())
                .collect();
            assert_eq!(
                tags,
                ["body", "form", "input", "input", "input", "select", "option", "option"]
            );
        }

        #[test]
        fn test_remove_tombstones_subtree() {
            let mut dom = form();
            let form_id = dom.by_id("f").unwrap();
            let red = dom.by_id("red").unwrap();
            dom.remove(form_id);
            assert!(dom.get(red.0).is_none());
            assert!(dom.by_id("red").is_none());
            assert_eq!(dom.document_order().len(), 1);
        }

        #[test]
        fn test_append_to_removed_parent_is_none() {
            let mut dom = form();
            let form_id = dom.by_id("f").unwrap();
            dom.remove(form_id);
            assert!(dom.append(form_id, MockNode::new("p")).is_none());
        }

        #[test]
        fn test_hidden_ancestor_hides_descendants() {
            let mut dom = form();
            let form_id = dom.by_id("f").unwrap();
            let red = dom.by_id("red").unwrap();
            dom.set_displayed(form_id, false);
            assert!(!dom.is_displayed(red.0));
            assert_eq!(dom.bounds_of(red.0), Some(BoundingBox::collapsed()));
        }

        #[test]
        fn test_text_is_recursive() {
            let dom = MockDom::from_root(MockNode::row(&["a", "b"]));
            assert_eq!(dom.text_of(0), "a b");
        }
    }

    mod activate_tests {
        use super::*;

        #[test]
        fn test_radio_click_moves_checked() {
            let mut dom = form();
            let red = dom.by_id("red").unwrap();
            let blue = dom.by_id("blue").unwrap();
            dom.activate(blue.0);
            assert_eq!(dom.attr(blue, "checked"), Some("true"));
            assert_eq!(dom.attr(red, "checked"), None);
        }

        #[test]
        fn test_checkbox_toggles() {
            let mut dom = form();
            let agree = dom.by_id("agree").unwrap();
            dom.activate(agree.0);
            assert_eq!(dom.attr(agree, "checked"), Some("true"));
            dom.activate(agree.0);
            assert_eq!(dom.attr(agree, "checked"), None);
        }

        #[test]
        fn test_single_select_option_is_exclusive() {
            let mut dom = form();
            let options: Vec<_> = dom
                .document_order()
                .into_iter()
                .filter(|&i| dom.tag(i) == Some("option"))
                .collect();
            dom.activate(options[1]);
            assert!(dom.attr_idx(options[0], "selected").is_none());
            assert_eq!(dom.attr_idx(options[1], "selected"), Some("true"));
        }

        #[test]
        fn test_label_for_clicks_target() {
            let mut dom = MockDom::from_root(
                MockNode::new("body")
                    .child(MockNode::input("checkbox").id("cb"))
                    .child(MockNode::new("label").attr("for", "cb").text("Agree")),
            );
            let label = dom.document_order()[2];
            dom.activate(label);
            assert_eq!(dom.attr(dom.by_id("cb").unwrap(), "checked"), Some("true"));
        }
    }
}
