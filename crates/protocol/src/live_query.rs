//! Live query types shared by the evaluator and the host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Query language of a live selector test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
	Css,
	Xpath,
}

impl QueryKind {
	pub fn as_str(self) -> &'static str {
		match self {
			QueryKind::Css => "css",
			QueryKind::Xpath => "xpath",
		}
	}
}

impl fmt::Display for QueryKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for QueryKind {
	type Err = ProtocolError;

	/// Accepts exactly `css` or `xpath`; anything else is a fault, never an
	/// empty result.
	fn from_str(s: &str) -> Result<Self> {
		match s {
			"css" => Ok(QueryKind::Css),
			"xpath" => Ok(QueryKind::Xpath),
			other => Err(ProtocolError::QueryKind(other.to_string())),
		}
	}
}

/// Outcome of one live query, correlated by the caller's request id.
///
/// When `error` is set, `results` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveQueryResult {
	pub request_id: String,
	pub results: Vec<String>,
	pub error: Option<String>,
}

impl LiveQueryResult {
	pub fn success(request_id: impl Into<String>, results: Vec<String>) -> Self {
		Self {
			request_id: request_id.into(),
			results,
			error: None,
		}
	}

	pub fn failure(request_id: impl Into<String>, error: impl Into<String>) -> Self {
		Self {
			request_id: request_id.into(),
			results: Vec::new(),
			error: Some(error.into()),
		}
	}

	/// JSON array of previews, `[]` when nothing matched or the query failed.
	pub fn results_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(&self.results)
	}

	/// Error text as sent over the bridge; empty on success.
	pub fn error_message(&self) -> &str {
		self.error.as_deref().unwrap_or("")
	}

	pub fn is_error(&self) -> bool {
		self.error.is_some()
	}

	/// Rebuilds a result from the `liveSelectorResults` triple.
	pub fn from_bridge(request_id: &str, results_json: &str, error_message: &str) -> Result<Self> {
		if !error_message.is_empty() {
			return Ok(Self::failure(request_id, error_message));
		}
		let results = serde_json::from_str(results_json).map_err(|source| ProtocolError::Results {
			request_id: request_id.to_string(),
			source,
		})?;
		Ok(Self::success(request_id, results))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn query_kind_parses_known_values_only() {
		assert_eq!("css".parse::<QueryKind>().unwrap(), QueryKind::Css);
		assert_eq!("xpath".parse::<QueryKind>().unwrap(), QueryKind::Xpath);

		let err = "XPATH".parse::<QueryKind>().unwrap_err();
		assert_eq!(err.to_string(), "invalid query type 'XPATH' (must be 'css' or 'xpath')");
	}

	#[test]
	fn empty_results_still_serialize() {
		let result = LiveQueryResult::success("req-1", Vec::new());
		assert_eq!(result.results_json().unwrap(), "[]");
		assert_eq!(result.error_message(), "");
	}

	#[test]
	fn failure_has_no_results() {
		let result = LiveQueryResult::failure("req-2", "bad expression");
		assert!(result.is_error());
		assert_eq!(result.results_json().unwrap(), "[]");
		assert_eq!(result.error_message(), "bad expression");
	}

	#[test]
	fn from_bridge_prefers_error_message() {
		let result = LiveQueryResult::from_bridge("7", "[\"ignored\"]", "boom").unwrap();
		assert!(result.results.is_empty());
		assert_eq!(result.error.as_deref(), Some("boom"));

		let result = LiveQueryResult::from_bridge("8", "[\"<p>a</p>\"]", "").unwrap();
		assert_eq!(result.results, vec!["<p>a</p>".to_string()]);
	}

	#[test]
	fn from_bridge_rejects_bad_json() {
		let err = LiveQueryResult::from_bridge("9", "not json", "").unwrap_err();
		assert!(matches!(err, ProtocolError::Results { ref request_id, .. } if request_id == "9"));
	}
}
