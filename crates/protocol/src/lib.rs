//! Wire types for the in-page element inspector.
//!
//! This crate contains the serde-serializable types that cross the bridge
//! between the inspector running inside a document and the host process that
//! drives it. Both sides depend on it so the JSON shapes stay in one place.
//!
//! # Main Types
//!
//! - [`ElementDescriptor`] - snapshot of a picked element, sent on click
//! - [`LiveQueryResult`] - previews produced by an ad-hoc CSS/XPath query
//! - [`QueryKind`] - the two supported query languages
//! - [`InspectorCall`] - host-side builder for page script invocations
//! - [`LiveQueryTracker`] - host-side correlation of query requests and replies

pub mod calls;
pub mod descriptor;
mod error;
pub mod live_query;
pub mod preview;
pub mod tracker;

pub use calls::{InspectorCall, escape_js_string};
pub use descriptor::ElementDescriptor;
pub use error::{ProtocolError, Result};
pub use live_query::{LiveQueryResult, QueryKind};
pub use preview::{ELLIPSIS, QUERY_PREVIEW_LIMIT, TEXT_PREVIEW_LIMIT, truncate_preview};
pub use tracker::{LiveQueryReport, LiveQueryTracker, REPORT_PREVIEW_LIMIT};

/// Names of the outbound methods the host exposes on its bridge object.
pub mod bridge_methods {
	/// Receives one serialized [`ElementDescriptor`](crate::ElementDescriptor) per pick.
	pub const ELEMENT_CLICKED: &str = "elementClicked";
	/// Receives `(request_id, results_json, error_message)` per live query.
	pub const LIVE_SELECTOR_RESULTS: &str = "liveSelectorResults";
}

/// Names of the inbound entry points the inspector exposes to page script.
pub mod entry_points {
	pub const START: &str = "start";
	pub const STOP: &str = "stop";
	pub const TEST_QUERY: &str = "testQuery";
}
