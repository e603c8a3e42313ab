//! Host-side builders for calling the inspector from page script.
//!
//! A host drives the inspector by evaluating small JavaScript expressions in
//! the page (for example through Playwright's `page.evaluate`). The inspector
//! publishes its entry points on a window-level object, `window.pwInspector`
//! by default; [`InspectorCall::to_script`] renders a guarded call that
//! evaluates to `true` when the entry point was found and invoked.

use crate::entry_points;
use crate::live_query::QueryKind;

/// Default window property holding the inspector's entry points.
pub const DEFAULT_GLOBAL: &str = "pwInspector";

/// One inbound call into the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectorCall {
	Start,
	Stop,
	TestQuery {
		selector: String,
		kind: QueryKind,
		request_id: String,
	},
}

impl InspectorCall {
	pub fn entry_point(&self) -> &'static str {
		match self {
			InspectorCall::Start => entry_points::START,
			InspectorCall::Stop => entry_points::STOP,
			InspectorCall::TestQuery { .. } => entry_points::TEST_QUERY,
		}
	}

	fn arguments(&self) -> String {
		match self {
			InspectorCall::Start | InspectorCall::Stop => String::new(),
			InspectorCall::TestQuery {
				selector,
				kind,
				request_id,
			} => format!(
				"'{}', '{}', '{}'",
				escape_js_string(selector),
				kind.as_str(),
				escape_js_string(request_id)
			),
		}
	}

	/// Renders the call as a self-contained expression against `window[global]`.
	pub fn to_script(&self, global: &str) -> String {
		let global = escape_js_string(global);
		let method = self.entry_point();
		format!(
			"(() => {{ const api = window['{global}']; \
			 if (api && typeof api.{method} === 'function') {{ api.{method}({}); return true; }} \
			 return false; }})()",
			self.arguments()
		)
	}
}

/// Escapes a value for a single- or double-quoted JavaScript string literal.
///
/// Carriage returns are dropped rather than escaped.
pub fn escape_js_string(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'\\' => out.push_str("\\\\"),
			'\'' => out.push_str("\\'"),
			'"' => out.push_str("\\\""),
			'\n' => out.push_str("\\n"),
			'\r' => {}
			other => out.push(other),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escapes_quotes_and_newlines() {
		assert_eq!(escape_js_string(r#"a'b"c\d"#), r#"a\'b\"c\\d"#);
		assert_eq!(escape_js_string("line1\r\nline2"), "line1\\nline2");
	}

	#[test]
	fn start_script_is_guarded() {
		let script = InspectorCall::Start.to_script(DEFAULT_GLOBAL);
		assert!(script.contains("window['pwInspector']"));
		assert!(script.contains("typeof api.start === 'function'"));
		assert!(script.contains("api.start();"));
	}

	#[test]
	fn test_query_script_passes_escaped_arguments() {
		let call = InspectorCall::TestQuery {
			selector: "//a[@title='x']".to_string(),
			kind: QueryKind::Xpath,
			request_id: "4".to_string(),
		};
		let script = call.to_script(DEFAULT_GLOBAL);
		assert!(script.contains(r"api.testQuery('//a[@title=\'x\']', 'xpath', '4');"));
	}
}
