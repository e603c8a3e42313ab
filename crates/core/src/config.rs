//! Inspector configuration.
//!
//! Every field has a default, so hosts only send what they want to change.
//! Keys are camelCase to match what page script passes in.

use pw_inspector_protocol::{ELLIPSIS, QUERY_PREVIEW_LIMIT, TEXT_PREVIEW_LIMIT};
use serde::{Deserialize, Serialize};

/// Style properties a highlight sets; clearing resets each of them to empty.
pub const HIGHLIGHT_PROPERTIES: [&str; 4] = ["outline", "outline-offset", "box-shadow", "z-index"];

/// Fully owned inspector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InspectorConfig {
	/// Id given to the dimming overlay; targets carrying it are never picked.
	pub overlay_id: String,
	/// Dimming overlay appearance.
	pub overlay: OverlayStyle,
	/// Marker applied to the hovered element.
	pub highlight: HighlightStyle,
	/// Characters of element text kept in a descriptor.
	pub text_preview_limit: usize,
	/// Characters kept per live query match.
	pub query_preview_limit: usize,
	/// Marker appended to truncated previews.
	pub ellipsis: String,
	/// Separator between synthesized selector segments.
	pub combinator: Combinator,
	/// Window property holding the host bridge.
	pub bridge_object: String,
	/// Window property under which the entry points are published.
	pub global_name: String,
}

impl Default for InspectorConfig {
	fn default() -> Self {
		Self {
			overlay_id: "__pwInspectorOverlay".to_string(),
			overlay: OverlayStyle::default(),
			highlight: HighlightStyle::default(),
			text_preview_limit: TEXT_PREVIEW_LIMIT,
			query_preview_limit: QUERY_PREVIEW_LIMIT,
			ellipsis: ELLIPSIS.to_string(),
			combinator: Combinator::default(),
			bridge_object: "inspectorBridge".to_string(),
			global_name: "pwInspector".to_string(),
		}
	}
}

/// Visual marker for the highlighted element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HighlightStyle {
	pub outline: String,
	pub outline_offset: String,
	/// Glow around the element.
	pub box_shadow: String,
	/// Elevated stacking so the marker stays visible.
	pub z_index: String,
}

impl Default for HighlightStyle {
	fn default() -> Self {
		Self {
			outline: "2px dashed red".to_string(),
			outline_offset: "-2px".to_string(),
			box_shadow: "0 0 5px 2px rgba(255, 0, 0, 0.5)".to_string(),
			z_index: "99999999".to_string(),
		}
	}
}

impl HighlightStyle {
	/// CSS properties and values applied when highlighting, in
	/// [`HIGHLIGHT_PROPERTIES`] order.
	pub fn properties(&self) -> [(&'static str, &str); 4] {
		[
			(HIGHLIGHT_PROPERTIES[0], self.outline.as_str()),
			(HIGHLIGHT_PROPERTIES[1], self.outline_offset.as_str()),
			(HIGHLIGHT_PROPERTIES[2], self.box_shadow.as_str()),
			(HIGHLIGHT_PROPERTIES[3], self.z_index.as_str()),
		]
	}
}

/// Full-viewport tint shown while inspecting.
///
/// The overlay never intercepts pointer events; it only dims the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayStyle {
	pub background_color: String,
	/// Sits just below the highlight's z-index.
	pub z_index: String,
}

impl Default for OverlayStyle {
	fn default() -> Self {
		Self {
			background_color: "rgba(0, 100, 200, 0.1)".to_string(),
			z_index: "99999998".to_string(),
		}
	}
}

impl OverlayStyle {
	/// Properties set once when the overlay is created. It starts hidden.
	pub fn properties(&self) -> Vec<(&'static str, &str)> {
		vec![
			("position", "fixed"),
			("top", "0"),
			("left", "0"),
			("width", "100%"),
			("height", "100%"),
			("background-color", self.background_color.as_str()),
			("z-index", self.z_index.as_str()),
			("pointer-events", "none"),
			("display", "none"),
		]
	}
}

/// How synthesized selector segments are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
	/// `a b`: any descendant.
	#[default]
	Descendant,
	/// `a > b`: direct child only.
	Child,
}

impl Combinator {
	pub fn separator(self) -> &'static str {
		match self {
			Combinator::Descendant => " ",
			Combinator::Child => " > ",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_config_keeps_defaults() {
		let cfg: InspectorConfig =
			serde_json::from_str(r#"{"overlayId": "x", "highlight": {"outline": "1px solid blue"}, "combinator": "child"}"#)
				.unwrap();
		assert_eq!(cfg.overlay_id, "x");
		assert_eq!(cfg.highlight.outline, "1px solid blue");
		assert_eq!(cfg.highlight.z_index, "99999999");
		assert_eq!(cfg.combinator, Combinator::Child);
		assert_eq!(cfg.text_preview_limit, 200);
		assert_eq!(cfg.query_preview_limit, 150);
	}

	#[test]
	fn overlay_starts_hidden_and_passes_pointer_events() {
		let style = OverlayStyle::default();
		let props = style.properties();
		assert!(props.contains(&("display", "none")));
		assert!(props.contains(&("pointer-events", "none")));
	}

	#[test]
	fn highlight_sits_above_overlay() {
		let cfg = InspectorConfig::default();
		let highlight: u64 = cfg.highlight.z_index.parse().unwrap();
		let overlay: u64 = cfg.overlay.z_index.parse().unwrap();
		assert!(highlight > overlay);
	}

	#[test]
	fn separators() {
		assert_eq!(Combinator::Descendant.separator(), " ");
		assert_eq!(Combinator::Child.separator(), " > ");
	}
}
