use pw_inspector_protocol::ProtocolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InspectorError>;

/// Failures reported by the rendering environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
	/// The node was removed or otherwise invalidated.
	#[error("node is no longer part of the document")]
	Stale,

	#[error("'{selector}' is not a valid selector: {reason}")]
	InvalidSelector { selector: String, reason: String },

	#[error("'{expression}' is not a valid XPath expression: {reason}")]
	InvalidXPath { expression: String, reason: String },

	#[error("malformed markup: {0}")]
	Markup(String),

	#[error("unsupported: {0}")]
	Unsupported(String),

	/// Exception raised by the host script engine.
	#[error("{0}")]
	Js(String),
}

/// Failures reaching the host through the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
	#[error("host bridge method '{method}' is not available")]
	Missing { method: &'static str },

	#[error("host bridge method '{method}' failed: {reason}")]
	Rejected { method: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum InspectorError {
	#[error(transparent)]
	Dom(#[from] DomError),

	#[error(transparent)]
	Bridge(#[from] BridgeError),

	#[error("Invalid selector type '{0}' specified (must be 'css' or 'xpath').")]
	UnsupportedQueryType(String),

	#[error("target is not an element")]
	NotAnElement,

	/// Configuration is fixed once the overlay exists or a session is running.
	#[error("inspector configuration can only change before the first start")]
	ConfigLocked,

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl From<ProtocolError> for InspectorError {
	fn from(err: ProtocolError) -> Self {
		match err {
			ProtocolError::QueryKind(kind) => InspectorError::UnsupportedQueryType(kind),
			ProtocolError::Descriptor(source) | ProtocolError::Results { source, .. } => {
				InspectorError::Json(source)
			}
		}
	}
}

/// How a fault is handled at the inspector boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
	/// Bad selector, expression or query type; reported through the error channel.
	MalformedInput,
	/// A node vanished underneath us; ignored locally.
	StaleReference,
	/// The host receiver is absent; logged and the payload dropped.
	MissingBridge,
	/// Anything else; logged and suppressed.
	Unexpected,
}

impl InspectorError {
	pub fn fault(&self) -> Fault {
		match self {
			InspectorError::Dom(DomError::InvalidSelector { .. } | DomError::InvalidXPath { .. })
			| InspectorError::UnsupportedQueryType(_) => Fault::MalformedInput,
			InspectorError::Dom(DomError::Stale) => Fault::StaleReference,
			InspectorError::Bridge(BridgeError::Missing { .. }) => Fault::MissingBridge,
			_ => Fault::Unexpected,
		}
	}
}
