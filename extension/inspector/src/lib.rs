//! pw-ext-inspector: the element inspector compiled to wasm for injection
//! into a page.
//!
//! On load the module creates one [`Session`] for the window's document and
//! publishes its entry points twice: as wasm exports and as methods of a
//! window global (`window.pwInspector` by default), which is what host-side
//! [`InspectorCall`](pw_inspector_protocol::InspectorCall) scripts target.
//! The host is reached through `window.inspectorBridge`.

mod bridge;
mod document;
mod events;
mod logging;

use std::cell::RefCell;

use js_sys::{Object, Reflect};
use pw_inspector::{InspectorConfig, Session};
use pw_inspector_protocol::entry_points;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

pub use bridge::JsBridge;
pub use document::WebDocument;
pub use events::WebEvent;
pub use logging::{ConsoleMakeWriter, init_logging};

type InspectorSession = Session<WebDocument, JsBridge>;

thread_local! {
	static SESSION: RefCell<Option<InspectorSession>> = const { RefCell::new(None) };
}

/// Runs `f` against the installed session.
///
/// Returns [`None`] when no session exists or when called re-entrantly, e.g.
/// by a bridge receiver that calls back into the inspector synchronously.
pub(crate) fn with_session<R>(f: impl FnOnce(&mut InspectorSession) -> R) -> Option<R> {
	SESSION.with(|slot| match slot.try_borrow_mut() {
		Ok(mut session) => session.as_mut().map(f),
		Err(_) => {
			tracing::warn!("Inspector busy, dropping re-entrant call");
			None
		}
	})
}

/// Runs an entry point against the session, or from a microtask when the
/// session is busy with the call that triggered it.
pub(crate) fn run_or_defer(entry: impl FnOnce(&mut InspectorSession) + 'static) {
	let deferred = SESSION.with(|slot| match slot.try_borrow_mut() {
		Ok(mut session) => {
			if let Some(session) = session.as_mut() {
				entry(session);
			}
			None
		}
		Err(_) => Some(entry),
	});
	if let Some(entry) = deferred {
		defer(entry);
	}
}

fn defer(entry: impl FnOnce(&mut InspectorSession) + 'static) {
	let Some(window) = web_sys::window() else {
		tracing::warn!("No window to defer re-entrant call to, dropping it");
		return;
	};
	tracing::debug!("Inspector busy, deferring re-entrant call");
	let callback = Closure::once_into_js(move || run_or_defer(entry));
	window.queue_microtask(callback.unchecked_ref());
}

/// Installs a fresh session for `document` and publishes the entry points.
pub fn install(document: WebDocument, config: InspectorConfig) {
	let bridge = JsBridge::new(config.bridge_object.clone());
	let global = config.global_name.clone();
	let previous = SESSION.with(|slot| slot.borrow_mut().replace(Session::new(document, Some(bridge), config)));
	if let Some(mut previous) = previous {
		previous.stop();
	}

	if let Err(err) = publish_global(&global) {
		tracing::error!(global = %global, error = ?err, "Failed to publish inspector entry points");
	}
	tracing::debug!(global = %global, "Inspector installed");
}

/// Whether the installed session is intercepting events.
pub fn is_active() -> bool {
	SESSION.with(|slot| slot.try_borrow().is_ok_and(|session| session.as_ref().is_some_and(Session::is_active)))
}

#[wasm_bindgen(start)]
pub fn boot() {
	console_error_panic_hook::set_once();
	init_logging();

	let Some(document) = WebDocument::current() else {
		tracing::error!("No document available, inspector not installed");
		return;
	};
	install(document, InspectorConfig::default());
}

/// Begins an inspection session. Idempotent.
#[wasm_bindgen(js_name = start)]
pub fn start_inspection() {
	run_or_defer(|session| {
		if let Err(err) = session.start() {
			tracing::error!(error = %err, "Failed to start inspector");
		}
	});
}

/// Ends the inspection session. Idempotent.
#[wasm_bindgen(js_name = stop)]
pub fn stop_inspection() {
	run_or_defer(|session| session.stop());
}

/// Runs a live query and reports it through the bridge.
///
/// `request_id` may be a string or a number.
#[wasm_bindgen(js_name = testQuery)]
pub fn test_query(selector: String, kind: String, request_id: JsValue) {
	let request_id = request_id_string(&request_id);
	run_or_defer(move |session| {
		session.test_query(&selector, &kind, &request_id);
	});
}

/// Request ids arrive as strings or numbers; numbers use their shortest
/// decimal form.
pub fn request_id_string(value: &JsValue) -> String {
	value
		.as_string()
		.or_else(|| value.as_f64().map(|n| n.to_string()))
		.unwrap_or_default()
}

/// Replaces the configuration before the first start.
///
/// Returns whether the configuration was applied; invalid objects are logged
/// and the current configuration is kept.
#[wasm_bindgen]
pub fn configure(config: JsValue) -> bool {
	let config: InspectorConfig = match serde_wasm_bindgen::from_value(config) {
		Ok(config) => config,
		Err(err) => {
			tracing::warn!(error = %err, "Ignoring invalid inspector configuration");
			return false;
		}
	};
	let global = config.global_name.clone();
	let applied = with_session(|session| {
		let bridge = JsBridge::new(config.bridge_object.clone());
		session.configure(config)?;
		session.replace_bridge(Some(bridge));
		Ok::<_, pw_inspector::InspectorError>(())
	});
	match applied {
		Some(Ok(())) => {
			if let Err(err) = publish_global(&global) {
				tracing::warn!(global = %global, error = ?err, "Failed to publish inspector entry points");
			}
			true
		}
		Some(Err(err)) => {
			tracing::warn!(error = %err, "Inspector configuration rejected");
			false
		}
		None => false,
	}
}

/// Exposes the entry points as `window[global]`.
fn publish_global(global: &str) -> Result<(), JsValue> {
	let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
	let api = Object::new();

	let start = Closure::<dyn Fn()>::new(start_inspection).into_js_value();
	let stop = Closure::<dyn Fn()>::new(stop_inspection).into_js_value();
	let test_query = Closure::<dyn Fn(String, String, JsValue)>::new(test_query).into_js_value();
	let configure = Closure::<dyn Fn(JsValue) -> bool>::new(configure).into_js_value();

	Reflect::set(&api, &JsValue::from_str(entry_points::START), &start)?;
	Reflect::set(&api, &JsValue::from_str(entry_points::STOP), &stop)?;
	Reflect::set(&api, &JsValue::from_str(entry_points::TEST_QUERY), &test_query)?;
	Reflect::set(&api, &JsValue::from_str("configure"), &configure)?;
	Reflect::set(&window, &JsValue::from_str(global), &api)?;
	Ok(())
}
