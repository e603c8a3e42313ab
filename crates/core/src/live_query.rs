//! Live query evaluation.
//!
//! Runs an ad-hoc CSS selector or XPath expression against the document and
//! reports bounded previews of the matches back to the host. Queries do not
//! depend on the session being active.

use pw_inspector_protocol::{LiveQueryResult, QueryKind, bridge_methods, truncate_preview};

use crate::bridge::HostBridge;
use crate::config::InspectorConfig;
use crate::dom::{Document, XPathHit};
use crate::error::{DomError, InspectorError};

/// Evaluates `selector` and returns one preview per match, in document order.
///
/// CSS matches and XPath element hits preview their outer markup; XPath text
/// hits preview their text.
pub fn evaluate<D: Document>(
	doc: &D,
	selector: &str,
	kind: QueryKind,
	limit: usize,
	ellipsis: &str,
) -> Result<Vec<String>, DomError> {
	let previews = match kind {
		QueryKind::Css => doc
			.query_css(selector)?
			.iter()
			.map(|node| truncate_preview(&doc.outer_html(node), limit, ellipsis))
			.collect(),
		QueryKind::Xpath => doc
			.query_xpath(selector)?
			.into_iter()
			.map(|hit| match hit {
				XPathHit::Element(node) => truncate_preview(&doc.outer_html(&node), limit, ellipsis),
				XPathHit::Text(text) => truncate_preview(&text, limit, ellipsis),
			})
			.collect(),
	};
	Ok(previews)
}

/// Handles a `testQuery` call: evaluates, then reports to the host.
///
/// Malformed input never escapes; it becomes the result's error message. The
/// result is returned as well as emitted.
pub fn run<D: Document, B: HostBridge>(
	doc: &D,
	bridge: Option<&B>,
	config: &InspectorConfig,
	selector: &str,
	kind: &str,
	request_id: &str,
) -> LiveQueryResult {
	let outcome = kind.parse::<QueryKind>().map_err(InspectorError::from).and_then(|kind| {
		evaluate(doc, selector, kind, config.query_preview_limit, &config.ellipsis).map_err(InspectorError::from)
	});

	let result = match outcome {
		Ok(previews) => {
			tracing::debug!(request_id, kind, matches = previews.len(), "Live query evaluated");
			LiveQueryResult::success(request_id, previews)
		}
		Err(err) => {
			tracing::debug!(request_id, kind, error = %err, "Live query failed");
			LiveQueryResult::failure(request_id, err.to_string())
		}
	};

	emit(bridge, &result);
	result
}

fn emit<B: HostBridge>(bridge: Option<&B>, result: &LiveQueryResult) {
	let Some(bridge) = bridge else {
		tracing::warn!(
			request_id = %result.request_id,
			method = bridge_methods::LIVE_SELECTOR_RESULTS,
			"Host bridge unavailable, dropping live query results"
		);
		return;
	};
	let results_json = match result.results_json() {
		Ok(json) => json,
		Err(err) => {
			tracing::error!(error = %err, "Failed to encode live query results");
			"[]".to_string()
		}
	};
	if let Err(err) = bridge.live_selector_results(&result.request_id, &results_json, result.error_message()) {
		tracing::warn!(request_id = %result.request_id, error = %err, "Live query results not delivered");
	}
}
