//! Outbound channel to the host process.

use std::cell::RefCell;
use std::rc::Rc;

use pw_inspector_protocol::{ElementDescriptor, bridge_methods};

use crate::error::BridgeError;

/// Receiver the host exposes to the inspector.
///
/// Calls are fire-and-forget: nothing the host returns is consumed. A bridge
/// whose receiver disappears reports [`BridgeError::Missing`] per call.
pub trait HostBridge {
	fn element_clicked(&self, payload: &str) -> Result<(), BridgeError>;

	fn live_selector_results(&self, request_id: &str, results_json: &str, error_message: &str) -> Result<(), BridgeError>;
}

impl<T: HostBridge + ?Sized> HostBridge for &T {
	fn element_clicked(&self, payload: &str) -> Result<(), BridgeError> {
		(**self).element_clicked(payload)
	}

	fn live_selector_results(&self, request_id: &str, results_json: &str, error_message: &str) -> Result<(), BridgeError> {
		(**self).live_selector_results(request_id, results_json, error_message)
	}
}

impl<T: HostBridge + ?Sized> HostBridge for Box<T> {
	fn element_clicked(&self, payload: &str) -> Result<(), BridgeError> {
		(**self).element_clicked(payload)
	}

	fn live_selector_results(&self, request_id: &str, results_json: &str, error_message: &str) -> Result<(), BridgeError> {
		(**self).live_selector_results(request_id, results_json, error_message)
	}
}

/// A call received by a [`RecordingBridge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
	ElementClicked(String),
	LiveSelectorResults {
		request_id: String,
		results_json: String,
		error_message: String,
	},
}

/// In-process bridge that records every call.
///
/// Clones share the same log, so one handle can be given to a session while
/// another is kept for inspection. An [`unavailable`](Self::unavailable)
/// bridge behaves like a host whose receiver is missing.
#[derive(Debug, Clone, Default)]
pub struct RecordingBridge {
	calls: Rc<RefCell<Vec<BridgeCall>>>,
	unavailable: bool,
}

impl RecordingBridge {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn unavailable() -> Self {
		Self {
			calls: Rc::default(),
			unavailable: true,
		}
	}

	pub fn calls(&self) -> Vec<BridgeCall> {
		self.calls.borrow().clone()
	}

	pub fn is_empty(&self) -> bool {
		self.calls.borrow().is_empty()
	}

	/// Decoded `elementClicked` payloads, oldest first.
	pub fn descriptors(&self) -> Vec<ElementDescriptor> {
		self.calls
			.borrow()
			.iter()
			.filter_map(|call| match call {
				BridgeCall::ElementClicked(payload) => ElementDescriptor::from_json(payload).ok(),
				BridgeCall::LiveSelectorResults { .. } => None,
			})
			.collect()
	}

	fn record(&self, method: &'static str, call: BridgeCall) -> Result<(), BridgeError> {
		if self.unavailable {
			return Err(BridgeError::Missing { method });
		}
		self.calls.borrow_mut().push(call);
		Ok(())
	}
}

impl HostBridge for RecordingBridge {
	fn element_clicked(&self, payload: &str) -> Result<(), BridgeError> {
		self.record(bridge_methods::ELEMENT_CLICKED, BridgeCall::ElementClicked(payload.to_string()))
	}

	fn live_selector_results(&self, request_id: &str, results_json: &str, error_message: &str) -> Result<(), BridgeError> {
		self.record(
			bridge_methods::LIVE_SELECTOR_RESULTS,
			BridgeCall::LiveSelectorResults {
				request_id: request_id.to_string(),
				results_json: results_json.to_string(),
				error_message: error_message.to_string(),
			},
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clones_share_the_log() {
		let bridge = RecordingBridge::new();
		let handle = bridge.clone();
		bridge.live_selector_results("1", "[]", "").unwrap();
		assert_eq!(
			handle.calls(),
			vec![BridgeCall::LiveSelectorResults {
				request_id: "1".into(),
				results_json: "[]".into(),
				error_message: String::new(),
			}]
		);
	}

	#[test]
	fn unavailable_bridge_reports_missing_method() {
		let bridge = RecordingBridge::unavailable();
		assert_eq!(
			bridge.element_clicked("{}"),
			Err(BridgeError::Missing { method: "elementClicked" })
		);
		assert!(bridge.is_empty());
	}
}
