//! DOM event wiring.
//!
//! Listeners are registered in the capture phase so the inspector sees
//! events before page handlers can stop them. Each closure forwards into the
//! session through [`crate::with_session`]; events that arrive while the
//! session is busy are dropped.

use js_sys::Function;
use pw_inspector::dom::DomEvent;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, MouseEvent, Node};

const POINTER_ENTER: &str = "mouseover";
const POINTER_LEAVE: &str = "mouseout";
const CLICK: &str = "click";

/// A browser event seen through the inspector's event surface.
pub struct WebEvent(pub Event);

impl DomEvent<Node> for WebEvent {
	fn target(&self) -> Option<Node> {
		self.0.target()?.dyn_into::<Node>().ok()
	}

	fn related_target(&self) -> Option<Node> {
		self.0
			.dyn_ref::<MouseEvent>()?
			.related_target()?
			.dyn_into::<Node>()
			.ok()
	}

	fn prevent_default(&self) {
		self.0.prevent_default();
	}

	fn stop_propagation(&self) {
		self.0.stop_propagation();
	}
}

type Handler = Closure<dyn FnMut(Event)>;

/// The three capture listeners; dropping them without
/// [`detach`](Self::detach) leaves dangling registrations.
pub struct Listeners {
	enter: Handler,
	leave: Handler,
	click: Handler,
}

impl Listeners {
	pub fn attach(document: &web_sys::Document) -> Result<Self, JsValue> {
		let listeners = Self {
			enter: Closure::new(|event: Event| {
				let event = WebEvent(event);
				crate::with_session(|session| session.handle_pointer_enter(&event));
			}),
			leave: Closure::new(|event: Event| {
				let event = WebEvent(event);
				crate::with_session(|session| session.handle_pointer_leave(&event));
			}),
			click: Closure::new(|event: Event| {
				let event = WebEvent(event);
				crate::with_session(|session| session.handle_click(&event));
			}),
		};
		for (kind, handler) in listeners.entries() {
			document.add_event_listener_with_callback_and_bool(kind, handler, true)?;
		}
		Ok(listeners)
	}

	pub fn detach(self, document: &web_sys::Document) {
		for (kind, handler) in self.entries() {
			if let Err(err) = document.remove_event_listener_with_callback_and_bool(kind, handler, true) {
				tracing::warn!(event = kind, error = ?err, "Failed to remove listener");
			}
		}
	}

	fn entries(&self) -> [(&'static str, &Function); 3] {
		[
			(POINTER_ENTER, self.enter.as_ref().unchecked_ref()),
			(POINTER_LEAVE, self.leave.as_ref().unchecked_ref()),
			(CLICK, self.click.as_ref().unchecked_ref()),
		]
	}
}

/// Tells the session the body exists.
pub fn notify_ready() {
	crate::run_or_defer(|session| session.document_ready());
}

/// Calls [`notify_ready`] once on `DOMContentLoaded`.
pub fn on_content_loaded(document: &web_sys::Document) -> Result<(), JsValue> {
	let callback = Closure::once_into_js(notify_ready);
	document.add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref())
}

/// Calls [`notify_ready`] from a microtask.
pub fn after_current_task() -> Result<(), JsValue> {
	let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
	let callback = Closure::once_into_js(notify_ready);
	window.queue_microtask(callback.unchecked_ref());
	Ok(())
}
