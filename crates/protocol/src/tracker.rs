//! Host-side correlation of live query requests and replies.
//!
//! The bridge delivers `liveSelectorResults` asynchronously and without any
//! notion of which query it answers beyond the request id. The tracker hands
//! out ids, remembers what each id asked for, and turns replies into
//! [`LiveQueryReport`]s. Replies for ids it never issued (or already resolved)
//! are dropped.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::calls::InspectorCall;
use crate::live_query::{LiveQueryResult, QueryKind};

/// Previews shown by a report before it is marked truncated.
pub const REPORT_PREVIEW_LIMIT: usize = 20;

#[derive(Debug, Clone)]
struct PendingQuery {
	kind: QueryKind,
	selector: String,
}

/// Issues request ids and matches replies back to their queries.
#[derive(Debug, Default)]
pub struct LiveQueryTracker {
	last_id: u64,
	pending: HashMap<String, PendingQuery>,
}

impl LiveQueryTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a query and returns the call that runs it in the page.
	pub fn issue(&mut self, selector: impl Into<String>, kind: QueryKind) -> InspectorCall {
		self.last_id += 1;
		let request_id = self.last_id.to_string();
		let selector = selector.into();
		debug!(request_id = %request_id, kind = %kind, selector = %selector, "issue live query");
		self.pending.insert(
			request_id.clone(),
			PendingQuery {
				kind,
				selector: selector.clone(),
			},
		);
		InspectorCall::TestQuery {
			selector,
			kind,
			request_id,
		}
	}

	/// Number of queries still waiting for a reply.
	pub fn pending_count(&self) -> usize {
		self.pending.len()
	}

	/// Resolves a `liveSelectorResults` reply.
	///
	/// Returns [`None`] for unknown request ids. Undecodable result JSON is
	/// reported as an error on the returned report.
	pub fn resolve(&mut self, request_id: &str, results_json: &str, error_message: &str) -> Option<LiveQueryReport> {
		let Some(pending) = self.pending.remove(request_id) else {
			warn!(request_id = %request_id, "live query reply for unknown request");
			return None;
		};

		let outcome = match LiveQueryResult::from_bridge(request_id, results_json, error_message) {
			Ok(LiveQueryResult { error: Some(error), .. }) => Err(error),
			Ok(result) => Ok(result.results),
			Err(err) => {
				warn!(request_id = %request_id, error = %err, "undecodable live query reply");
				Err("Failed to parse results from browser.".to_string())
			}
		};

		Some(LiveQueryReport {
			request_id: request_id.to_string(),
			kind: pending.kind,
			selector: pending.selector,
			outcome,
		})
	}
}

/// A resolved live query, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveQueryReport {
	pub request_id: String,
	pub kind: QueryKind,
	pub selector: String,
	/// Previews on success, error text otherwise.
	pub outcome: Result<Vec<String>, String>,
}

impl LiveQueryReport {
	pub fn match_count(&self) -> usize {
		self.outcome.as_ref().map_or(0, Vec::len)
	}
}

impl fmt::Display for LiveQueryReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(
			f,
			"--- Live {} Results ({}) ---",
			self.kind.as_str().to_uppercase(),
			self.selector
		)?;
		match &self.outcome {
			Err(error) => write!(f, "Error: {error}"),
			Ok(previews) => {
				write!(f, "Found {} element(s):", previews.len())?;
				for preview in previews.iter().take(REPORT_PREVIEW_LIMIT) {
					write!(f, "\n{preview}")?;
				}
				if previews.len() > REPORT_PREVIEW_LIMIT {
					write!(f, "\n... (results truncated)")?;
				}
				Ok(())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_increase_and_are_tracked() {
		let mut tracker = LiveQueryTracker::new();
		let first = tracker.issue("p", QueryKind::Css);
		let second = tracker.issue("//p", QueryKind::Xpath);

		let InspectorCall::TestQuery { request_id: a, .. } = first else {
			panic!("expected a query call");
		};
		let InspectorCall::TestQuery { request_id: b, .. } = second else {
			panic!("expected a query call");
		};
		assert_eq!((a.as_str(), b.as_str()), ("1", "2"));
		assert_eq!(tracker.pending_count(), 2);
	}

	#[test]
	fn reply_resolves_once() {
		let mut tracker = LiveQueryTracker::new();
		tracker.issue(".item", QueryKind::Css);

		let report = tracker.resolve("1", "[\"<li class=\\\"item\\\">a</li>\"]", "").unwrap();
		assert_eq!(report.kind, QueryKind::Css);
		assert_eq!(report.match_count(), 1);
		assert_eq!(tracker.pending_count(), 0);

		assert!(tracker.resolve("1", "[]", "").is_none());
	}

	#[test]
	fn unknown_reply_is_dropped() {
		let mut tracker = LiveQueryTracker::new();
		assert!(tracker.resolve("42", "[]", "").is_none());
	}

	#[test]
	fn error_reply_renders_error() {
		let mut tracker = LiveQueryTracker::new();
		tracker.issue("//p[", QueryKind::Xpath);
		let report = tracker.resolve("1", "[]", "SyntaxError: bad").unwrap();
		assert_eq!(report.to_string(), "--- Live XPATH Results (//p[) ---\nError: SyntaxError: bad");
	}

	#[test]
	fn bad_json_becomes_report_error() {
		let mut tracker = LiveQueryTracker::new();
		tracker.issue("p", QueryKind::Css);
		let report = tracker.resolve("1", "{", "").unwrap();
		assert_eq!(report.outcome, Err("Failed to parse results from browser.".to_string()));
	}

	#[test]
	fn long_reports_are_truncated() {
		let mut tracker = LiveQueryTracker::new();
		tracker.issue("li", QueryKind::Css);
		let previews: Vec<String> = (0..25).map(|i| format!("<li>{i}</li>")).collect();
		let json = serde_json::to_string(&previews).unwrap();

		let rendered = tracker.resolve("1", &json, "").unwrap().to_string();
		assert!(rendered.contains("Found 25 element(s):"));
		assert!(rendered.contains("<li>19</li>"));
		assert!(!rendered.contains("<li>20</li>"));
		assert!(rendered.ends_with("... (results truncated)"));
	}
}
