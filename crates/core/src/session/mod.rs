//! Inspection session.
//!
//! A [`Session`] owns everything an inspector needs for one document: the
//! document handle, the optional host bridge, configuration, highlight state
//! and the dimming overlay. Its methods are the only mutators.
//!
//! ```text
//!            start                       stop
//! Inactive ────────► Active ───────────────────► Inactive
//!   ▲  │ (no-op if     │  pointer enter/leave: highlight
//!   │  │  already      │  click: describe, emit, clear highlight
//!   └──┘  inactive)    └── start again: no-op
//! ```
//!
//! Faults inside event handling are contained and logged; they never change
//! the session state.


use indexmap::IndexMap;
use pw_inspector_protocol::descriptor::text_preview;
use pw_inspector_protocol::{ElementDescriptor, LiveQueryResult, bridge_methods};

use crate::bridge::HostBridge;
use crate::config::InspectorConfig;
use crate::dom::{Document, DomEvent, EventSource};
use crate::error::{BridgeError, DomError, Fault, InspectorError, Result};
use crate::highlight::HighlightTracker;
use crate::live_query;
use crate::selector::synthesize_selector_with;

/// Whether events are being intercepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
	#[default]
	Inactive,
	Active,
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
	/// Session inactive; the event was left alone.
	Inactive,
	/// Event had no target.
	NoTarget,
	/// Click landed on the overlay and was swallowed.
	Overlay,
	/// Element described and handed to the host.
	Picked(ElementDescriptor),
	/// Building or emitting the descriptor failed; the session is unchanged.
	Contained(Fault),
}

/// One inspector bound to one document.
pub struct Session<D: Document, B> {
	doc: D,
	bridge: Option<B>,
	config: InspectorConfig,
	state: SessionState,
	tracker: HighlightTracker<D::Node>,
	overlay: Option<D::Node>,
	overlay_pending: bool,
}

impl<D, B> Session<D, B>
where
	D: Document + EventSource,
	B: HostBridge,
{
	pub fn new(doc: D, bridge: Option<B>, config: InspectorConfig) -> Self {
		let tracker = HighlightTracker::new(config.highlight.clone(), config.overlay_id.clone());
		Self {
			doc,
			bridge,
			config,
			state: SessionState::Inactive,
			tracker,
			overlay: None,
			overlay_pending: false,
		}
	}

	pub fn document(&self) -> &D {
		&self.doc
	}

	pub fn bridge(&self) -> Option<&B> {
		self.bridge.as_ref()
	}

	/// Swaps the host bridge, returning the previous one.
	pub fn replace_bridge(&mut self, bridge: Option<B>) -> Option<B> {
		std::mem::replace(&mut self.bridge, bridge)
	}

	pub fn config(&self) -> &InspectorConfig {
		&self.config
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn is_active(&self) -> bool {
		self.state == SessionState::Active
	}

	/// Element currently carrying the highlight marker.
	pub fn highlighted(&self) -> Option<&D::Node> {
		self.tracker.current()
	}

	pub fn overlay(&self) -> Option<&D::Node> {
		self.overlay.as_ref()
	}

	/// Replaces the configuration.
	///
	/// Only allowed before the overlay has been created and while inactive,
	/// since both carry styling derived from the configuration.
	pub fn configure(&mut self, config: InspectorConfig) -> Result<()> {
		if self.is_active() || self.overlay.is_some() || self.overlay_pending {
			return Err(InspectorError::ConfigLocked);
		}
		self.tracker = HighlightTracker::new(config.highlight.clone(), config.overlay_id.clone());
		self.config = config;
		tracing::debug!("Inspector configuration updated");
		Ok(())
	}

	/// Begins intercepting pointer and click events. No-op when already active.
	///
	/// Fails only when the listeners cannot be attached, in which case the
	/// session stays inactive.
	pub fn start(&mut self) -> Result<()> {
		if self.is_active() {
			tracing::debug!("Inspector already active");
			return Ok(());
		}
		self.doc.attach_listeners()?;
		self.state = SessionState::Active;
		tracing::debug!("Inspector started");

		if let Some(overlay) = self.overlay.clone() {
			self.set_overlay_visible(&overlay, true);
		} else if self.doc.body().is_some() {
			self.install_overlay();
		} else if !self.overlay_pending {
			tracing::debug!("Document body not ready, deferring overlay");
			self.overlay_pending = true;
			self.doc.defer_until_ready();
		}
		Ok(())
	}

	/// Stops intercepting events, drops the highlight and hides the overlay.
	/// No-op when already inactive.
	pub fn stop(&mut self) {
		if !self.is_active() {
			tracing::debug!("Inspector already inactive");
			return;
		}
		self.doc.detach_listeners();
		self.tracker.clear(&self.doc);
		if let Some(overlay) = self.overlay.clone() {
			self.set_overlay_visible(&overlay, false);
		}
		self.state = SessionState::Inactive;
		tracing::debug!("Inspector stopped");
	}

	/// The document body became available after a deferred start.
	pub fn document_ready(&mut self) {
		self.overlay_pending = false;
		if self.overlay.is_some() || self.doc.body().is_none() {
			return;
		}
		self.install_overlay();
	}

	pub fn handle_pointer_enter<E: DomEvent<D::Node>>(&mut self, event: &E) {
		if !self.is_active() {
			return;
		}
		if let Some(target) = event.target() {
			self.tracker.enter(&self.doc, &target);
		}
	}

	pub fn handle_pointer_leave<E: DomEvent<D::Node>>(&mut self, event: &E) {
		if !self.is_active() {
			return;
		}
		self.tracker.leave(&self.doc, event.related_target().as_ref());
	}

	/// Picks the clicked element and reports it to the host.
	///
	/// While active the click never reaches the page: default action and
	/// propagation are suppressed even when reporting fails.
	pub fn handle_click<E: DomEvent<D::Node>>(&mut self, event: &E) -> ClickOutcome {
		if !self.is_active() {
			return ClickOutcome::Inactive;
		}
		event.prevent_default();
		event.stop_propagation();

		let Some(target) = event.target() else {
			return ClickOutcome::NoTarget;
		};
		if self.tracker.is_overlay(&self.doc, &target) {
			return ClickOutcome::Overlay;
		}

		match self.report(&target) {
			Ok(descriptor) => {
				tracing::debug!(selector = %descriptor.css_selector, "Element picked");
				self.tracker.clear(&self.doc);
				ClickOutcome::Picked(descriptor)
			}
			Err(err) => {
				let fault = err.fault();
				if fault == Fault::MissingBridge {
					tracing::warn!(error = %err, "Dropping picked element");
					self.tracker.clear(&self.doc);
				} else {
					tracing::error!(error = %err, "Failed to report picked element");
				}
				ClickOutcome::Contained(fault)
			}
		}
	}

	/// Builds the descriptor for `node`.
	pub fn describe(&self, node: &D::Node) -> Result<ElementDescriptor> {
		let doc = &self.doc;
		let css_selector =
			synthesize_selector_with(doc, node, self.config.combinator).ok_or(InspectorError::NotAnElement)?;
		let attributes: IndexMap<String, String> = doc.attributes(node).into_iter().collect();
		Ok(ElementDescriptor {
			tag: doc.tag_name(node),
			id: doc.id(node),
			classes: doc.class_name(node),
			attributes,
			text: text_preview(&doc.text_content(node), self.config.text_preview_limit, &self.config.ellipsis),
			css_selector,
		})
	}

	/// Runs a live query and reports it, regardless of session state.
	pub fn test_query(&self, selector: &str, kind: &str, request_id: &str) -> LiveQueryResult {
		live_query::run(&self.doc, self.bridge.as_ref(), &self.config, selector, kind, request_id)
	}

	fn report(&self, target: &D::Node) -> Result<ElementDescriptor> {
		let descriptor = self.describe(target)?;
		let payload = descriptor.to_json()?;
		let bridge = self.bridge.as_ref().ok_or(BridgeError::Missing {
			method: bridge_methods::ELEMENT_CLICKED,
		})?;
		bridge.element_clicked(&payload)?;
		Ok(descriptor)
	}

	fn install_overlay(&mut self) {
		match self.create_overlay() {
			Ok(overlay) => {
				if self.is_active() {
					self.set_overlay_visible(&overlay, true);
				}
				self.overlay = Some(overlay);
			}
			Err(err) => tracing::warn!(error = %err, "Failed to create inspector overlay"),
		}
	}

	fn create_overlay(&self) -> std::result::Result<D::Node, DomError> {
		let overlay = self.doc.create_element("div")?;
		self.doc.set_attribute(&overlay, "id", &self.config.overlay_id)?;
		for (property, value) in self.config.overlay.properties() {
			self.doc.set_style(&overlay, property, value)?;
		}
		self.doc.append_to_body(&overlay)?;
		Ok(overlay)
	}

	fn set_overlay_visible(&self, overlay: &D::Node, visible: bool) {
		let display = if visible { "block" } else { "none" };
		if let Err(err) = self.doc.set_style(overlay, "display", display) {
			tracing::warn!(error = %err, "Failed to update overlay visibility");
		}
	}
}
