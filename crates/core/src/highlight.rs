//! Hover highlight tracking.
//!
//! At most one element carries the highlight marker. Moving to a new target
//! always clears the previous one first.

use crate::config::{HIGHLIGHT_PROPERTIES, HighlightStyle};
use crate::dom::Document;
use crate::error::DomError;

/// Tracks the highlighted element and owns its marker styling.
#[derive(Debug)]
pub struct HighlightTracker<N> {
	current: Option<N>,
	style: HighlightStyle,
	overlay_id: String,
}

impl<N: Clone + PartialEq> HighlightTracker<N> {
	pub fn new(style: HighlightStyle, overlay_id: impl Into<String>) -> Self {
		Self {
			current: None,
			style,
			overlay_id: overlay_id.into(),
		}
	}

	pub fn current(&self) -> Option<&N> {
		self.current.as_ref()
	}

	/// Whether `node` is the dimming overlay, which is never highlighted or picked.
	pub fn is_overlay<D: Document<Node = N>>(&self, doc: &D, node: &N) -> bool {
		doc.id(node).is_some_and(|id| id == self.overlay_id)
	}

	/// Pointer entered `target`.
	///
	/// Returns whether the highlight moved.
	pub fn enter<D: Document<Node = N>>(&mut self, doc: &D, target: &N) -> bool {
		if !doc.is_element(target) || self.is_overlay(doc, target) || self.current.as_ref() == Some(target) {
			return false;
		}
		self.clear(doc);
		if let Err(err) = apply(doc, target, &self.style) {
			tracing::warn!(error = %err, "Failed to highlight element");
			if let Err(err) = reset(doc, target) {
				tracing::warn!(error = %err, "Ignoring highlight reset failure");
			}
			return false;
		}
		self.current = Some(target.clone());
		true
	}

	/// Pointer left the highlighted element towards `related`.
	///
	/// Moving into the highlighted element or one of its descendants keeps the
	/// highlight.
	pub fn leave<D: Document<Node = N>>(&mut self, doc: &D, related: Option<&N>) {
		let Some(current) = &self.current else {
			return;
		};
		if related.is_some_and(|related| doc.contains(current, related)) {
			return;
		}
		self.clear(doc);
	}

	/// Removes the marker from the tracked element, if any.
	///
	/// An element that has since left the document is dropped silently.
	pub fn clear<D: Document<Node = N>>(&mut self, doc: &D) {
		let Some(previous) = self.current.take() else {
			return;
		};
		if let Err(err) = reset(doc, &previous) {
			tracing::warn!(error = %err, "Ignoring highlight reset failure");
		}
	}
}

fn apply<D: Document>(doc: &D, node: &D::Node, style: &HighlightStyle) -> Result<(), DomError> {
	for (property, value) in style.properties() {
		doc.set_style(node, property, value)?;
	}
	Ok(())
}

fn reset<D: Document>(doc: &D, node: &D::Node) -> Result<(), DomError> {
	for property in HIGHLIGHT_PROPERTIES {
		doc.set_style(node, property, "")?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::{MemoryDocument, NodeId};

	fn setup(markup: &str) -> (MemoryDocument, HighlightTracker<NodeId>) {
		let doc = MemoryDocument::parse(markup).unwrap();
		(doc, HighlightTracker::new(HighlightStyle::default(), "__overlay"))
	}

	#[test]
	fn moving_between_elements_leaves_one_marker() {
		let (doc, mut tracker) = setup("<p>a</p><p>b</p>");
		let ps = doc.query_css("p").unwrap();
		assert!(tracker.enter(&doc, &ps[0]));
		assert_eq!(doc.style(ps[0], "outline").as_deref(), Some("2px dashed red"));

		assert!(tracker.enter(&doc, &ps[1]));
		assert!(doc.has_no_style(ps[0]));
		assert_eq!(doc.style(ps[1], "z-index").as_deref(), Some("99999999"));
		assert_eq!(tracker.current(), Some(&ps[1]));
	}

	#[test]
	fn re_entering_current_is_a_no_op() {
		let (doc, mut tracker) = setup("<p>a</p>");
		let p = doc.query_css("p").unwrap()[0];
		assert!(tracker.enter(&doc, &p));
		assert!(!tracker.enter(&doc, &p));
		assert_eq!(tracker.current(), Some(&p));
	}

	#[test]
	fn overlay_and_text_nodes_are_skipped() {
		let (doc, mut tracker) = setup(r#"<div id="__overlay"></div><p>t</p>"#);
		let overlay = doc.element_by_id("__overlay").unwrap();
		let p = doc.query_css("p").unwrap()[0];
		let text = doc.children(p)[0];
		assert!(!tracker.enter(&doc, &overlay));
		assert!(!tracker.enter(&doc, &text));
		assert!(tracker.current().is_none());
		assert!(doc.has_no_style(overlay));
	}

	#[test]
	fn leaving_into_descendant_keeps_highlight() {
		let (doc, mut tracker) = setup("<div><span>x</span></div><p>y</p>");
		let div = doc.query_css("div").unwrap()[0];
		let span = doc.query_css("span").unwrap()[0];
		let p = doc.query_css("p").unwrap()[0];
		tracker.enter(&doc, &div);

		tracker.leave(&doc, Some(&span));
		assert_eq!(tracker.current(), Some(&div));
		tracker.leave(&doc, Some(&div));
		assert_eq!(tracker.current(), Some(&div));

		tracker.leave(&doc, Some(&p));
		assert!(tracker.current().is_none());
		assert!(doc.has_no_style(div));
	}

	#[test]
	fn leaving_the_window_clears() {
		let (doc, mut tracker) = setup("<p>a</p>");
		let p = doc.query_css("p").unwrap()[0];
		tracker.enter(&doc, &p);
		tracker.leave(&doc, None);
		assert!(tracker.current().is_none());
	}

	#[test]
	fn clearing_a_removed_element_is_tolerated() {
		let (doc, mut tracker) = setup("<p>a</p><p>b</p>");
		let ps = doc.query_css("p").unwrap();
		tracker.enter(&doc, &ps[0]);
		doc.remove(ps[0]);
		assert!(tracker.enter(&doc, &ps[1]));
		assert_eq!(tracker.current(), Some(&ps[1]));
		tracker.clear(&doc);
		assert!(tracker.current().is_none());
	}

	#[test]
	fn failed_highlight_leaves_no_partial_marker() {
		let (doc, mut tracker) = setup("<p>a</p><p>b</p>");
		let ps = doc.query_css("p").unwrap();
		assert!(tracker.enter(&doc, &ps[0]));

		doc.refuse_style(Some("z-index"));
		assert!(!tracker.enter(&doc, &ps[1]));
		assert!(tracker.current().is_none());
		assert!(doc.has_no_style(ps[0]));
		assert!(doc.has_no_style(ps[1]));
	}
}
