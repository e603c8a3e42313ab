//! Bounded text previews.

/// Maximum characters of an element's text kept in an [`ElementDescriptor`](crate::ElementDescriptor).
pub const TEXT_PREVIEW_LIMIT: usize = 200;

/// Maximum characters of markup or text kept per live query match.
pub const QUERY_PREVIEW_LIMIT: usize = 150;

/// Marker appended to a preview that was cut short.
pub const ELLIPSIS: &str = "...";

/// Cuts `text` to at most `limit` characters, appending `ellipsis` when
/// anything was dropped.
///
/// Counts Unicode scalar values, so multi-byte text is never split inside a
/// character.
pub fn truncate_preview(text: &str, limit: usize, ellipsis: &str) -> String {
	match text.char_indices().nth(limit) {
		Some((cut, _)) => {
			let mut out = String::with_capacity(cut + ellipsis.len());
			out.push_str(&text[..cut]);
			out.push_str(ellipsis);
			out
		}
		None => text.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn short_text_is_untouched() {
		assert_eq!(truncate_preview("hello", 5, ELLIPSIS), "hello");
		assert_eq!(truncate_preview("", 5, ELLIPSIS), "");
	}

	#[test]
	fn long_text_is_cut_and_marked() {
		assert_eq!(truncate_preview("abcdef", 3, ELLIPSIS), "abc...");
	}

	#[test]
	fn limit_counts_characters_not_bytes() {
		let text = "ééééé";
		assert_eq!(truncate_preview(text, 5, ELLIPSIS), text);
		assert_eq!(truncate_preview(text, 2, ELLIPSIS), "éé...");
	}

	#[test]
	fn query_limit_matches_inspector_default() {
		let markup = "x".repeat(QUERY_PREVIEW_LIMIT + 1);
		let preview = truncate_preview(&markup, QUERY_PREVIEW_LIMIT, ELLIPSIS);
		assert_eq!(preview.len(), QUERY_PREVIEW_LIMIT + ELLIPSIS.len());
		assert!(preview.ends_with(ELLIPSIS));
	}
}
