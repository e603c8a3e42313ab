//! Host bridge reached through a window property.

use js_sys::{Function, Reflect};
use pw_inspector::{BridgeError, HostBridge};
use pw_inspector_protocol::bridge_methods;
use wasm_bindgen::{JsCast, JsValue};

use crate::document::describe_js_error;

/// Calls methods on `window[object]`, resolved afresh on every call so a host
/// that installs its receiver late is still reached.
#[derive(Debug, Clone)]
pub struct JsBridge {
	object: String,
}

impl JsBridge {
	pub fn new(object: impl Into<String>) -> Self {
		Self { object: object.into() }
	}

	fn resolve(&self, method: &'static str) -> Result<(JsValue, Function), BridgeError> {
		let missing = || BridgeError::Missing { method };
		let window = web_sys::window().ok_or_else(missing)?;
		let receiver = Reflect::get(&window, &JsValue::from_str(&self.object)).map_err(|_| missing())?;
		if receiver.is_undefined() || receiver.is_null() {
			return Err(missing());
		}
		let function = Reflect::get(&receiver, &JsValue::from_str(method))
			.map_err(|_| missing())?
			.dyn_into::<Function>()
			.map_err(|_| missing())?;
		Ok((receiver, function))
	}
}

fn rejected(method: &'static str) -> impl FnOnce(JsValue) -> BridgeError {
	move |err| BridgeError::Rejected {
		method,
		reason: describe_js_error(&err),
	}
}

impl HostBridge for JsBridge {
	fn element_clicked(&self, payload: &str) -> Result<(), BridgeError> {
		let method = bridge_methods::ELEMENT_CLICKED;
		let (receiver, function) = self.resolve(method)?;
		function
			.call1(&receiver, &JsValue::from_str(payload))
			.map_err(rejected(method))?;
		Ok(())
	}

	fn live_selector_results(&self, request_id: &str, results_json: &str, error_message: &str) -> Result<(), BridgeError> {
		let method = bridge_methods::LIVE_SELECTOR_RESULTS;
		let (receiver, function) = self.resolve(method)?;
		function
			.call3(
				&receiver,
				&JsValue::from_str(request_id),
				&JsValue::from_str(results_json),
				&JsValue::from_str(error_message),
			)
			.map_err(rejected(method))?;
		Ok(())
	}
}
