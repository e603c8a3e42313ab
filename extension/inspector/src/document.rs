//! [`Document`] over the live browser DOM.

use std::cell::RefCell;

use js_sys::{Array, Function, Reflect};
use pw_inspector::dom::{Document, EventSource, XPathHit};
use pw_inspector::DomError;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Element, Node, XPathResult};

use crate::events::{self, Listeners};

/// Browser document handle plus the listeners the session attached to it.
pub struct WebDocument {
	document: web_sys::Document,
	listeners: RefCell<Option<Listeners>>,
}

impl WebDocument {
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			listeners: RefCell::new(None),
		}
	}

	/// The document of the current window, if there is one.
	pub fn current() -> Option<Self> {
		web_sys::window()?.document().map(Self::new)
	}

	pub fn raw(&self) -> &web_sys::Document {
		&self.document
	}
}

pub(crate) fn js_error(err: JsValue) -> DomError {
	DomError::Js(describe_js_error(&err))
}

pub(crate) fn describe_js_error(err: &JsValue) -> String {
	if let Some(error) = err.dyn_ref::<js_sys::Error>() {
		return String::from(error.message());
	}
	err.as_string()
		.or_else(|| js_sys::JSON::stringify(err).ok()?.as_string())
		.unwrap_or_else(|| format!("{err:?}"))
}

fn as_element(node: &Node) -> Option<&Element> {
	node.dyn_ref::<Element>()
}

/// Inline style of any element, HTML or not.
fn style_of(element: &Element) -> Result<CssStyleDeclaration, DomError> {
	let style = Reflect::get(element, &JsValue::from_str("style")).map_err(js_error)?;
	style
		.dyn_into::<CssStyleDeclaration>()
		.map_err(|_| DomError::Unsupported("element has no inline style".to_string()))
}

impl Document for WebDocument {
	type Node = Node;

	fn is_element(&self, node: &Node) -> bool {
		node.node_type() == Node::ELEMENT_NODE
	}

	fn tag_name(&self, node: &Node) -> String {
		as_element(node)
			.map(|element| element.tag_name().to_lowercase())
			.unwrap_or_default()
	}

	fn id(&self, node: &Node) -> Option<String> {
		as_element(node).map(Element::id).filter(|id| !id.is_empty())
	}

	fn class_name(&self, node: &Node) -> Option<String> {
		as_element(node)
			.and_then(|element| element.get_attribute("class"))
			.filter(|class| !class.is_empty())
	}

	fn attributes(&self, node: &Node) -> Vec<(String, String)> {
		let Some(element) = as_element(node) else {
			return Vec::new();
		};
		element
			.get_attribute_names()
			.iter()
			.filter_map(|name| name.as_string())
			.map(|name| {
				let value = element.get_attribute(&name).unwrap_or_default();
				(name, value)
			})
			.collect()
	}

	fn text_content(&self, node: &Node) -> String {
		node.text_content().unwrap_or_default()
	}

	fn outer_html(&self, node: &Node) -> String {
		match as_element(node) {
			Some(element) => element.outer_html(),
			None => self.text_content(node),
		}
	}

	fn parent_element(&self, node: &Node) -> Option<Node> {
		node.parent_element().map(Into::into)
	}

	fn previous_element_sibling(&self, node: &Node) -> Option<Node> {
		as_element(node)?.previous_element_sibling().map(Into::into)
	}

	fn body(&self) -> Option<Node> {
		self.document.body().map(Into::into)
	}

	fn contains(&self, ancestor: &Node, node: &Node) -> bool {
		ancestor.contains(Some(node))
	}

	fn set_style(&self, node: &Node, property: &str, value: &str) -> Result<(), DomError> {
		let element = as_element(node).ok_or_else(|| DomError::Unsupported("node is not an element".to_string()))?;
		let style = style_of(element)?;
		if value.is_empty() {
			style.remove_property(property).map_err(js_error)?;
		} else {
			style.set_property(property, value).map_err(js_error)?;
		}
		Ok(())
	}

	fn create_element(&self, tag: &str) -> Result<Node, DomError> {
		self.document.create_element(tag).map(Into::into).map_err(js_error)
	}

	fn set_attribute(&self, node: &Node, name: &str, value: &str) -> Result<(), DomError> {
		as_element(node)
			.ok_or_else(|| DomError::Unsupported("node is not an element".to_string()))?
			.set_attribute(name, value)
			.map_err(js_error)
	}

	fn append_to_body(&self, node: &Node) -> Result<(), DomError> {
		let body = self
			.document
			.body()
			.ok_or_else(|| DomError::Unsupported("document has no body".to_string()))?;
		body.append_child(node).map_err(js_error)?;
		Ok(())
	}

	fn query_css(&self, selector: &str) -> Result<Vec<Node>, DomError> {
		let list = self
			.document
			.query_selector_all(selector)
			.map_err(|err| DomError::InvalidSelector {
				selector: selector.to_string(),
				reason: describe_js_error(&err),
			})?;
		Ok((0..list.length()).filter_map(|index| list.item(index)).collect())
	}

	fn query_xpath(&self, expression: &str) -> Result<Vec<XPathHit<Node>>, DomError> {
		let invalid = |err: JsValue| DomError::InvalidXPath {
			expression: expression.to_string(),
			reason: describe_js_error(&err),
		};
		// document.evaluate(expression, document, null, ORDERED_NODE_SNAPSHOT_TYPE, null)
		let evaluate: Function = Reflect::get(&self.document, &JsValue::from_str("evaluate"))
			.map_err(js_error)?
			.dyn_into()
			.map_err(js_error)?;
		let args = Array::of5(
			&JsValue::from_str(expression),
			&self.document,
			&JsValue::NULL,
			&JsValue::from(XPathResult::ORDERED_NODE_SNAPSHOT_TYPE),
			&JsValue::NULL,
		);
		let snapshot: XPathResult = Reflect::apply(&evaluate, &self.document, &args)
			.map_err(invalid)?
			.dyn_into()
			.map_err(js_error)?;
		let length = snapshot.snapshot_length().map_err(js_error)?;

		let mut hits = Vec::with_capacity(length as usize);
		for index in 0..length {
			let Some(node) = snapshot.snapshot_item(index).map_err(js_error)? else {
				continue;
			};
			if node.node_type() == Node::ELEMENT_NODE {
				hits.push(XPathHit::Element(node));
			} else {
				hits.push(XPathHit::Text(node.text_content().unwrap_or_default()));
			}
		}
		Ok(hits)
	}
}

impl EventSource for WebDocument {
	fn attach_listeners(&self) -> Result<(), DomError> {
		let mut slot = self.listeners.borrow_mut();
		if slot.is_none() {
			*slot = Some(Listeners::attach(&self.document).map_err(js_error)?);
		}
		Ok(())
	}

	fn detach_listeners(&self) {
		if let Some(listeners) = self.listeners.borrow_mut().take() {
			listeners.detach(&self.document);
		}
	}

	fn defer_until_ready(&self) {
		let loading = Reflect::get(&self.document, &JsValue::from_str("readyState"))
			.ok()
			.and_then(|state| state.as_string())
			.is_some_and(|state| state == "loading");
		let scheduled = if loading {
			events::on_content_loaded(&self.document)
		} else {
			// already parsed: notify once the current call has returned
			events::after_current_task()
		};
		if let Err(err) = scheduled {
			tracing::warn!(error = %describe_js_error(&err), "Failed to schedule overlay creation");
		}
	}
}
