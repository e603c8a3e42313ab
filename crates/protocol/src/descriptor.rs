//! Element descriptor sent to the host when an element is picked.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};
use crate::preview::truncate_preview;

/// Immutable snapshot of a picked element.
///
/// Serialized once per click and handed to the host's `elementClicked`
/// receiver. Absent `id` and `classes` serialize as `null` rather than being
/// omitted, so hosts can rely on every key being present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
	/// Lowercase tag name.
	pub tag: String,
	/// Element id, [`None`] when missing or empty.
	pub id: Option<String>,
	/// Raw `class` attribute string, [`None`] when missing or empty.
	pub classes: Option<String>,
	/// Attributes in DOM order.
	#[serde(default)]
	pub attributes: IndexMap<String, String>,
	/// Trimmed, bounded text content.
	#[serde(default)]
	pub text: String,
	/// Synthesized selector that re-locates the element.
	pub css_selector: String,
}

impl ElementDescriptor {
	/// Decodes a payload received through `elementClicked`.
	pub fn from_json(payload: &str) -> Result<Self> {
		serde_json::from_str(payload).map_err(ProtocolError::Descriptor)
	}

	/// Encodes the descriptor as the `elementClicked` payload.
	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}

	/// Scrapy extraction snippets built from the synthesized selector.
	///
	/// Ordered from the most general (`get`) to attribute extraction.
	pub fn scrapy_snippets(&self) -> Vec<String> {
		let base = format!("response.css('{}')", self.css_selector.replace('\'', "\\'"));
		vec![
			format!("{base}.get()"),
			format!("{base}.getall()"),
			format!("{base}::text.get()"),
			format!("{base}::attr(href).get()"),
		]
	}
}

/// Prepares element text for a descriptor: surrounding whitespace is trimmed
/// before the length bound is applied.
pub fn text_preview(raw: &str, limit: usize, ellipsis: &str) -> String {
	truncate_preview(raw.trim(), limit, ellipsis)
}

impl fmt::Display for ElementDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Tag: {}", self.tag)?;
		writeln!(f, "ID: {}", self.id.as_deref().unwrap_or("None"))?;
		writeln!(f, "Classes: {}", self.classes.as_deref().unwrap_or("None"))?;
		if self.attributes.is_empty() {
			writeln!(f, "Attributes: (none)")?;
		} else {
			writeln!(f, "Attributes:")?;
			for (name, value) in &self.attributes {
				writeln!(f, "  {name}={value:?}")?;
			}
		}
		writeln!(f, "Text (preview): {}", self.text)?;
		write!(f, "Selector: {}", self.css_selector)
	}
}
