//! Capability surface the inspector needs from its rendering environment.
//!
//! The core never touches a concrete DOM. A browser binding implements these
//! traits over live nodes; [`MemoryDocument`](crate::memory::MemoryDocument)
//! implements them over an in-memory tree.

use std::cell::Cell;
use std::fmt;

use crate::error::DomError;

/// Read, navigation, style mutation and query access to a document.
///
/// Accessors take any node; element-only accessors return empty values for
/// non-element nodes.
pub trait Document {
	/// Handle to a node. Equality means "same node".
	type Node: Clone + PartialEq + fmt::Debug;

	fn is_element(&self, node: &Self::Node) -> bool;

	/// Lowercase tag name, empty for non-elements.
	fn tag_name(&self, node: &Self::Node) -> String;

	/// Element id, [`None`] when missing or empty.
	fn id(&self, node: &Self::Node) -> Option<String>;

	/// Raw `class` attribute, [`None`] when missing or empty.
	fn class_name(&self, node: &Self::Node) -> Option<String>;

	/// Attributes in DOM order.
	fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;

	fn text_content(&self, node: &Self::Node) -> String;

	/// Serialized markup of an element, text content for anything else.
	fn outer_html(&self, node: &Self::Node) -> String;

	fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

	fn previous_element_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	fn body(&self) -> Option<Self::Node>;

	/// True when `node` is `ancestor` or one of its descendants.
	fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

	/// Sets an inline style property; an empty value removes it.
	fn set_style(&self, node: &Self::Node, property: &str, value: &str) -> Result<(), DomError>;

	/// Creates a detached element.
	fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;

	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

	fn append_to_body(&self, node: &Self::Node) -> Result<(), DomError>;

	/// All elements matching a CSS selector, in document order.
	fn query_css(&self, selector: &str) -> Result<Vec<Self::Node>, DomError>;

	/// Ordered snapshot of the nodes an XPath expression selects, evaluated
	/// with the document as context.
	fn query_xpath(&self, expression: &str) -> Result<Vec<XPathHit<Self::Node>>, DomError>;
}

/// One node of an XPath snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XPathHit<N> {
	Element(N),
	/// A text node, carried as its text.
	Text(String),
}

/// Listener wiring owned by the environment.
///
/// The environment routes the listeners it attaches to the session's
/// `handle_pointer_enter`, `handle_pointer_leave` and `handle_click`, and
/// calls `document_ready` after [`defer_until_ready`](Self::defer_until_ready).
pub trait EventSource {
	/// Attaches capture-phase pointer-enter, pointer-leave and click listeners.
	fn attach_listeners(&self) -> Result<(), DomError>;

	fn detach_listeners(&self);

	/// Requests one `document_ready` notification once the body exists.
	fn defer_until_ready(&self);
}

/// A dispatched pointer or click event.
pub trait DomEvent<N> {
	fn target(&self) -> Option<N>;

	/// Node the pointer moved to (leave) or came from (enter).
	fn related_target(&self) -> Option<N>;

	fn prevent_default(&self);

	fn stop_propagation(&self);
}

/// Plain event value for environments without native event objects.
#[derive(Debug, Clone)]
pub struct SyntheticEvent<N> {
	pub target: Option<N>,
	pub related_target: Option<N>,
	default_prevented: Cell<bool>,
	propagation_stopped: Cell<bool>,
}

impl<N> SyntheticEvent<N> {
	pub fn new(target: Option<N>, related_target: Option<N>) -> Self {
		Self {
			target,
			related_target,
			default_prevented: Cell::new(false),
			propagation_stopped: Cell::new(false),
		}
	}

	pub fn on(target: N) -> Self {
		Self::new(Some(target), None)
	}

	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	pub fn propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}
}

impl<N: Clone> DomEvent<N> for SyntheticEvent<N> {
	fn target(&self) -> Option<N> {
		self.target.clone()
	}

	fn related_target(&self) -> Option<N> {
		self.related_target.clone()
	}

	fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}
}
