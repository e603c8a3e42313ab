//! In-memory document backend.
//!
//! [`MemoryDocument`] implements [`Document`] and [`EventSource`] over an arena
//! of nodes, so sessions and queries run natively: in tests, and against
//! static page snapshots on the host side. Handles are cheap to clone and share
//! the same tree.
//!
//! Inline styles are kept per element and are not reflected into the `style`
//! attribute.

mod css;
mod html;
mod xpath;

#[cfg(test)]
mod tests;

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::dom::{Document, EventSource, XPathHit};
use crate::error::DomError;

/// Identifier of a node inside one [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
	Document,
	Element(ElementData),
	Text(String),
}

#[derive(Debug, Clone, Default)]
struct ElementData {
	tag: String,
	attrs: Vec<(String, String)>,
	style: Vec<(String, String)>,
}

impl ElementData {
	fn attr(&self, name: &str) -> Option<&str> {
		self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
	}
}

#[derive(Debug, Clone)]
struct NodeData {
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	kind: NodeKind,
	stale: bool,
}

/// Listener bookkeeping exposed for assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerState {
	pub attached: bool,
	pub attach_calls: usize,
	pub detach_calls: usize,
	pub ready_requests: usize,
}

#[derive(Debug)]
struct Tree {
	nodes: Vec<NodeData>,
	listeners: ListenerState,
	refuse_listeners: bool,
	refused_style: Option<String>,
}

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Tree {
	fn new() -> Self {
		Self {
			nodes: vec![NodeData {
				parent: None,
				children: Vec::new(),
				kind: NodeKind::Document,
				stale: false,
			}],
			listeners: ListenerState::default(),
			refuse_listeners: false,
			refused_style: None,
		}
	}

	fn root(&self) -> NodeId {
		NodeId(0)
	}

	fn node(&self, id: NodeId) -> &NodeData {
		&self.nodes[id.0]
	}

	fn push(&mut self, kind: NodeKind) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(NodeData {
			parent: None,
			children: Vec::new(),
			kind,
			stale: false,
		});
		id
	}

	fn new_element(&mut self, tag: &str) -> NodeId {
		self.push(NodeKind::Element(ElementData {
			tag: tag.to_ascii_lowercase(),
			..ElementData::default()
		}))
	}

	fn new_text(&mut self, text: &str) -> NodeId {
		self.push(NodeKind::Text(text.to_string()))
	}

	fn element(&self, id: NodeId) -> Option<&ElementData> {
		match &self.node(id).kind {
			NodeKind::Element(data) => Some(data),
			_ => None,
		}
	}

	fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
		let node = &mut self.nodes[id.0];
		if node.stale {
			return Err(DomError::Stale);
		}
		match &mut node.kind {
			NodeKind::Element(data) => Ok(data),
			_ => Err(DomError::Unsupported("node is not an element".to_string())),
		}
	}

	fn tag(&self, id: NodeId) -> Option<&str> {
		self.element(id).map(|e| e.tag.as_str())
	}

	fn text(&self, id: NodeId) -> Option<&str> {
		match &self.node(id).kind {
			NodeKind::Text(text) => Some(text),
			_ => None,
		}
	}

	fn is_element(&self, id: NodeId) -> bool {
		self.element(id).is_some()
	}

	fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).parent
	}

	fn parent_element(&self, id: NodeId) -> Option<NodeId> {
		self.parent(id).filter(|&p| self.is_element(p))
	}

	fn children(&self, id: NodeId) -> &[NodeId] {
		&self.node(id).children
	}

	fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
		let parent = self.parent(id)?;
		let siblings = self.children(parent);
		let index = siblings.iter().position(|&s| s == id)?;
		siblings[..index].iter().rev().copied().find(|&s| self.is_element(s))
	}

	/// 1-based position among element siblings sharing the tag.
	fn type_index(&self, id: NodeId) -> usize {
		let Some(tag) = self.tag(id) else {
			return 0;
		};
		let mut index = 1;
		let mut sibling = self.previous_element_sibling(id);
		while let Some(current) = sibling {
			if self.tag(current) == Some(tag) {
				index += 1;
			}
			sibling = self.previous_element_sibling(current);
		}
		index
	}

	fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut cursor = Some(node);
		while let Some(current) = cursor {
			if current == ancestor {
				return true;
			}
			cursor = self.parent(current);
		}
		false
	}

	fn document_element(&self) -> Option<NodeId> {
		self.children(self.root()).iter().copied().find(|&c| self.is_element(c))
	}

	fn body(&self) -> Option<NodeId> {
		let html = self.document_element()?;
		self.children(html)
			.iter()
			.copied()
			.find(|&c| self.tag(c) == Some("body"))
	}

	/// `from` and its descendants in document order.
	fn preorder(&self, from: NodeId) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack = vec![from];
		while let Some(node) = stack.pop() {
			out.push(node);
			stack.extend(self.children(node).iter().rev());
		}
		out
	}

	/// Connected elements in document order.
	fn elements(&self) -> Vec<NodeId> {
		self.preorder(self.root())
			.into_iter()
			.filter(|&n| self.is_element(n))
			.collect()
	}

	fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
		if self.node(parent).stale || self.node(child).stale {
			return Err(DomError::Stale);
		}
		if matches!(self.node(parent).kind, NodeKind::Text(_)) {
			return Err(DomError::Unsupported("text nodes cannot have children".to_string()));
		}
		// a childless node can only be its own ancestor
		let cycle = child == parent || (!self.children(child).is_empty() && self.contains(child, parent));
		if child == self.root() || cycle {
			return Err(DomError::Unsupported("insertion would create a cycle".to_string()));
		}
		self.detach(child);
		self.adopt(parent, child);
		Ok(())
	}

	/// Links a freshly created, parentless node under `parent`.
	fn adopt(&mut self, parent: NodeId, child: NodeId) {
		self.nodes[child.0].parent = Some(parent);
		self.nodes[parent.0].children.push(child);
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes[node.0].parent.take() {
			self.nodes[parent.0].children.retain(|&c| c != node);
		}
	}

	fn text_content(&self, id: NodeId) -> String {
		match &self.node(id).kind {
			NodeKind::Text(text) => text.clone(),
			NodeKind::Document | NodeKind::Element(_) => {
				let mut out = String::new();
				for node in self.preorder(id) {
					if let Some(text) = self.text(node) {
						out.push_str(text);
					}
				}
				out
			}
		}
	}

	fn outer_html(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.write_markup(id, &mut out);
		out
	}

	fn write_markup(&self, id: NodeId, out: &mut String) {
		enum Visit {
			Open(NodeId),
			Close(NodeId),
		}

		let mut stack = vec![Visit::Open(id)];
		while let Some(visit) = stack.pop() {
			let node = match visit {
				Visit::Open(node) => node,
				Visit::Close(node) => {
					if let Some(tag) = self.tag(node) {
						out.push_str("</");
						out.push_str(tag);
						out.push('>');
					}
					continue;
				}
			};
			match &self.node(node).kind {
				NodeKind::Document => {
					stack.extend(self.children(node).iter().rev().map(|&child| Visit::Open(child)));
				}
				NodeKind::Text(text) => {
					let raw = self
						.parent(node)
						.and_then(|p| self.tag(p))
						.is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
					if raw {
						out.push_str(text);
					} else {
						escape_into(text, false, out);
					}
				}
				NodeKind::Element(data) => {
					out.push('<');
					out.push_str(&data.tag);
					for (name, value) in &data.attrs {
						out.push(' ');
						out.push_str(name);
						out.push_str("=\"");
						escape_into(value, true, out);
						out.push('"');
					}
					out.push('>');
					if VOID_ELEMENTS.contains(&data.tag.as_str()) {
						continue;
					}
					stack.push(Visit::Close(node));
					stack.extend(self.children(node).iter().rev().map(|&child| Visit::Open(child)));
				}
			}
		}
	}
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'\u{a0}' => out.push_str("&nbsp;"),
			'"' if attribute => out.push_str("&quot;"),
			'<' if !attribute => out.push_str("&lt;"),
			'>' if !attribute => out.push_str("&gt;"),
			other => out.push(other),
		}
	}
}

/// Shared handle to an in-memory document.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
	tree: Rc<RefCell<Tree>>,
}

impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDocument {
	/// An empty document: no `<html>`, no body.
	pub fn new() -> Self {
		Self {
			tree: Rc::new(RefCell::new(Tree::new())),
		}
	}

	/// Parses markup into a document.
	///
	/// Fragments without an `<html>` root are wrapped in `<html><body>`.
	pub fn parse(markup: &str) -> Result<Self, DomError> {
		let doc = Self::new();
		{
			let mut tree = doc.tree_mut();
			let root = tree.root();
			html::parse_into(&mut tree, root, markup)?;

			let has_html_root = tree
				.children(root)
				.iter()
				.any(|&c| tree.tag(c) == Some("html"));
			if !has_html_root {
				let fragment: Vec<NodeId> = tree.children(root).to_vec();
				let html = tree.new_element("html");
				let body = tree.new_element("body");
				tree.append_child(html, body)?;
				for node in fragment {
					tree.append_child(body, node)?;
				}
				tree.append_child(root, html)?;
			}
		}
		Ok(doc)
	}

	/// `<html><head></head></html>`: a document whose body has not been
	/// created yet.
	pub fn without_body() -> Self {
		let doc = Self::new();
		{
			let mut tree = doc.tree_mut();
			let root = tree.root();
			let html = tree.new_element("html");
			let head = tree.new_element("head");
			tree.adopt(html, head);
			tree.adopt(root, html);
		}
		doc
	}

	fn tree(&self) -> Ref<'_, Tree> {
		self.tree.borrow()
	}

	fn tree_mut(&self) -> RefMut<'_, Tree> {
		self.tree.borrow_mut()
	}

	/// The document node itself.
	pub fn root(&self) -> NodeId {
		self.tree().root()
	}

	pub fn document_element(&self) -> Option<NodeId> {
		self.tree().document_element()
	}

	/// Creates the body if it does not exist yet and returns it.
	pub fn attach_body(&self) -> Result<NodeId, DomError> {
		let mut tree = self.tree_mut();
		if let Some(body) = tree.body() {
			return Ok(body);
		}
		let html = match tree.document_element() {
			Some(html) => html,
			None => {
				let html = tree.new_element("html");
				let root = tree.root();
				tree.append_child(root, html)?;
				html
			}
		};
		let body = tree.new_element("body");
		tree.append_child(html, body)?;
		Ok(body)
	}

	pub fn create_text(&self, text: &str) -> NodeId {
		self.tree_mut().new_text(text)
	}

	/// Moves `child` (and its subtree) under `parent`.
	pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
		self.tree_mut().append_child(parent, child)
	}

	/// Parses markup and appends the resulting nodes to `parent`.
	pub fn append_html(&self, parent: NodeId, markup: &str) -> Result<(), DomError> {
		let mut tree = self.tree_mut();
		if tree.node(parent).stale {
			return Err(DomError::Stale);
		}
		html::parse_into(&mut tree, parent, markup)
	}

	/// Detaches `node` and invalidates it and its subtree.
	pub fn remove(&self, node: NodeId) {
		let mut tree = self.tree_mut();
		tree.detach(node);
		for id in tree.preorder(node) {
			tree.nodes[id.0].stale = true;
		}
	}

	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.tree().children(node).to_vec()
	}

	/// First connected element whose `id` attribute equals `id`.
	pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
		let tree = self.tree();
		tree.elements()
			.into_iter()
			.find(|&n| tree.element(n).and_then(|e| e.attr("id")) == Some(id))
	}

	pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		self.tree().element(node)?.attr(name).map(str::to_string)
	}

	/// Current inline value of a style property.
	pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
		let tree = self.tree();
		let element = tree.element(node)?;
		element
			.style
			.iter()
			.find(|(p, _)| p == property)
			.map(|(_, v)| v.clone())
	}

	/// True when the element carries no inline style at all.
	pub fn has_no_style(&self, node: NodeId) -> bool {
		self.tree().element(node).is_none_or(|e| e.style.is_empty())
	}

	/// Markup of the whole document.
	pub fn to_html(&self) -> String {
		let tree = self.tree();
		tree.outer_html(tree.root())
	}

	pub fn listener_state(&self) -> ListenerState {
		self.tree().listeners
	}

	/// Makes subsequent listener registration fail, as a hostile page might.
	pub fn refuse_listeners(&self, refuse: bool) {
		self.tree_mut().refuse_listeners = refuse;
	}

	/// Makes `set_style` fail whenever `property` is given a non-empty value.
	pub fn refuse_style(&self, property: Option<&str>) {
		self.tree_mut().refused_style = property.map(str::to_string);
	}
}

impl Document for MemoryDocument {
	type Node = NodeId;

	fn is_element(&self, node: &NodeId) -> bool {
		self.tree().is_element(*node)
	}

	fn tag_name(&self, node: &NodeId) -> String {
		self.tree().tag(*node).unwrap_or_default().to_string()
	}

	fn id(&self, node: &NodeId) -> Option<String> {
		self.attribute(*node, "id").filter(|id| !id.is_empty())
	}

	fn class_name(&self, node: &NodeId) -> Option<String> {
		self.attribute(*node, "class").filter(|c| !c.is_empty())
	}

	fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
		self.tree()
			.element(*node)
			.map(|e| e.attrs.clone())
			.unwrap_or_default()
	}

	fn text_content(&self, node: &NodeId) -> String {
		self.tree().text_content(*node)
	}

	fn outer_html(&self, node: &NodeId) -> String {
		let tree = self.tree();
		if tree.is_element(*node) {
			tree.outer_html(*node)
		} else {
			tree.text_content(*node)
		}
	}

	fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
		self.tree().parent_element(*node)
	}

	fn previous_element_sibling(&self, node: &NodeId) -> Option<NodeId> {
		self.tree().previous_element_sibling(*node)
	}

	fn body(&self) -> Option<NodeId> {
		self.tree().body()
	}

	fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
		self.tree().contains(*ancestor, *node)
	}

	fn set_style(&self, node: &NodeId, property: &str, value: &str) -> Result<(), DomError> {
		let mut tree = self.tree_mut();
		if !value.is_empty() && tree.refused_style.as_deref() == Some(property) {
			return Err(DomError::Unsupported(format!("style property '{property}' refused")));
		}
		let element = tree.element_mut(*node)?;
		let existing = element.style.iter().position(|(p, _)| p == property);
		match (existing, value.is_empty()) {
			(Some(index), true) => {
				element.style.remove(index);
			}
			(Some(index), false) => element.style[index].1 = value.to_string(),
			(None, false) => element.style.push((property.to_string(), value.to_string())),
			(None, true) => {}
		}
		Ok(())
	}

	fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
		if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
			return Err(DomError::Unsupported(format!("invalid tag name '{tag}'")));
		}
		Ok(self.tree_mut().new_element(tag))
	}

	fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
		let mut tree = self.tree_mut();
		let element = tree.element_mut(*node)?;
		let name = name.to_ascii_lowercase();
		match element.attrs.iter_mut().find(|(n, _)| *n == name) {
			Some(attr) => attr.1 = value.to_string(),
			None => element.attrs.push((name, value.to_string())),
		}
		Ok(())
	}

	fn append_to_body(&self, node: &NodeId) -> Result<(), DomError> {
		let mut tree = self.tree_mut();
		let body = tree
			.body()
			.ok_or_else(|| DomError::Unsupported("document has no body".to_string()))?;
		tree.append_child(body, *node)
	}

	fn query_css(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
		css::query(&self.tree(), selector)
	}

	fn query_xpath(&self, expression: &str) -> Result<Vec<XPathHit<NodeId>>, DomError> {
		xpath::query(&self.tree(), expression)
	}
}

impl EventSource for MemoryDocument {
	fn attach_listeners(&self) -> Result<(), DomError> {
		let mut tree = self.tree_mut();
		if tree.refuse_listeners {
			return Err(DomError::Js("listener registration refused".to_string()));
		}
		tree.listeners.attached = true;
		tree.listeners.attach_calls += 1;
		Ok(())
	}

	fn detach_listeners(&self) {
		let mut tree = self.tree_mut();
		tree.listeners.attached = false;
		tree.listeners.detach_calls += 1;
	}

	fn defer_until_ready(&self) {
		self.tree_mut().listeners.ready_requests += 1;
	}
}
