//! Selector synthesis.
//!
//! Builds a hierarchical CSS selector for an element by walking from the
//! element towards the document body:
//!
//! * each step contributes the lowercase tag name;
//! * an element with an id contributes `tag#id` and ends the walk, since an id
//!   anchors the path on its own;
//! * otherwise, any element that is not the first of its tag among its
//!   preceding siblings gets `:nth-of-type(n)`;
//! * the walk stops below `<body>` (which is never included) or when the
//!   parent chain runs out.
//!
//! The result re-locates the element in the common case but is not guaranteed
//! to be globally unique.

use std::fmt::Write;

use crate::config::Combinator;
use crate::dom::Document;

/// Characters that are backslash-escaped inside an id segment.
const CSS_SPECIAL: &[char] = &[
	'!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '.', '/', ':', ';', '<', '=', '>', '?', '@', '[', '\\',
	']', '^', '`', '{', '|', '}', '~',
];

/// Backslash-escapes CSS punctuation in an identifier.
pub fn escape_css_ident(ident: &str) -> String {
	let mut out = String::with_capacity(ident.len());
	for c in ident.chars() {
		if CSS_SPECIAL.contains(&c) {
			out.push('\\');
		}
		out.push(c);
	}
	out
}

/// Synthesizes a selector using the descendant combinator.
///
/// Returns [`None`] when `node` is not an element.
pub fn synthesize_selector<D: Document>(doc: &D, node: &D::Node) -> Option<String> {
	synthesize_selector_with(doc, node, Combinator::Descendant)
}

/// Synthesizes a selector, joining segments with `combinator`.
pub fn synthesize_selector_with<D: Document>(doc: &D, node: &D::Node, combinator: Combinator) -> Option<String> {
	if !doc.is_element(node) {
		return None;
	}

	let body = doc.body();
	let mut path = Vec::new();
	let mut current = node.clone();

	loop {
		let tag = doc.tag_name(&current);
		let mut segment = tag.clone();

		if let Some(id) = doc.id(&current) {
			segment.push('#');
			segment.push_str(&escape_css_ident(&id));
			path.push(segment);
			break;
		}

		let nth = 1 + preceding_siblings_of_type(doc, &current, &tag);
		if nth != 1 {
			let _ = write!(segment, ":nth-of-type({nth})");
		}
		path.push(segment);

		match doc.parent_element(&current) {
			Some(parent) if body.as_ref() != Some(&parent) => current = parent,
			_ => break,
		}
	}

	path.reverse();
	Some(path.join(combinator.separator()))
}

/// Counts earlier siblings sharing `tag`; later siblings are never examined.
fn preceding_siblings_of_type<D: Document>(doc: &D, node: &D::Node, tag: &str) -> usize {
	let mut count = 0;
	let mut sibling = doc.previous_element_sibling(node);
	while let Some(current) = sibling {
		if doc.tag_name(&current) == tag {
			count += 1;
		}
		sibling = doc.previous_element_sibling(&current);
	}
	count
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryDocument;

	fn doc(html: &str) -> MemoryDocument {
		MemoryDocument::parse(html).unwrap()
	}

	#[test]
	fn id_anchors_without_ancestors() {
		let doc = doc(r#"<section id="outer"><div><span id="inner">x</span></div></section>"#);
		let span = doc.element_by_id("inner").unwrap();
		assert_eq!(synthesize_selector(&doc, &span).as_deref(), Some("span#inner"));
	}

	#[test]
	fn id_special_characters_are_escaped() {
		let doc = doc(r#"<div id="a.b:c[0]">x</div>"#);
		let div = doc.element_by_id("a.b:c[0]").unwrap();
		assert_eq!(synthesize_selector(&doc, &div).as_deref(), Some(r"div#a\.b\:c\[0\]"));
	}

	#[test]
	fn escape_covers_full_punctuation_set() {
		let all = r##"!"#$%&'()*+,./:;<=>?@[\]^`{|}~"##;
		let escaped = escape_css_ident(all);
		assert_eq!(escaped.len(), all.len() * 2);
		assert_eq!(escape_css_ident("plain-id_1"), "plain-id_1");
	}

	#[test]
	fn nested_ids_stop_at_the_first_ancestor_id() {
		let doc = doc(r#"<div id="app"><p>Hello</p><p>World</p></div>"#);
		let second = doc.query_css("p").unwrap()[1];
		assert_eq!(synthesize_selector(&doc, &second).as_deref(), Some("div#app p:nth-of-type(2)"));
	}

	#[test]
	fn body_children_have_no_body_segment() {
		let doc = doc("<p>Hello</p><p>World</p>");
		let paragraphs = doc.query_css("p").unwrap();
		assert_eq!(synthesize_selector(&doc, &paragraphs[0]).as_deref(), Some("p"));
		assert_eq!(synthesize_selector(&doc, &paragraphs[1]).as_deref(), Some("p:nth-of-type(2)"));
	}

	#[test]
	fn nth_of_type_only_counts_same_tag_preceding_siblings() {
		let doc = doc("<ul><li>a</li><span>s</span><li>b</li><li>c</li></ul>");
		let items = doc.query_css("li").unwrap();
		let selectors: Vec<String> = items
			.iter()
			.map(|li| synthesize_selector(&doc, li).unwrap())
			.collect();
		assert_eq!(selectors, ["ul li", "ul li:nth-of-type(2)", "ul li:nth-of-type(3)"]);

		let span = doc.query_css("span").unwrap()[0];
		assert_eq!(synthesize_selector(&doc, &span).as_deref(), Some("ul span"));
	}

	#[test]
	fn kth_sibling_carries_its_position() {
		let doc = doc("<div><b>1</b><b>2</b><b>3</b><b>4</b><b>5</b></div>");
		for (k, node) in doc.query_css("b").unwrap().iter().enumerate() {
			let selector = synthesize_selector(&doc, node).unwrap();
			let own = selector.rsplit(' ').next().unwrap();
			let qualifier = format!(":nth-of-type({})", k + 1);
			assert_eq!(own.contains(&qualifier), k != 0, "{selector}");
		}
	}

	#[test]
	fn attributes_do_not_affect_sibling_counting() {
		let doc = doc(r#"<div><a class="x">1</a><a class="y">2</a></div>"#);
		let second = doc.query_css("a.y").unwrap()[0];
		assert_eq!(synthesize_selector(&doc, &second).as_deref(), Some("div a:nth-of-type(2)"));
	}

	#[test]
	fn synthesis_is_deterministic_and_relocates() {
		let doc = doc(
			"<main><article><h2>t</h2><p>one</p><p>two</p></article><article><p>three</p><p>four</p></article></main>",
		);
		for node in doc.query_css("main *").unwrap() {
			let first = synthesize_selector(&doc, &node).unwrap();
			let second = synthesize_selector(&doc, &node).unwrap();
			assert_eq!(first, second);
			assert!(doc.query_css(&first).unwrap().contains(&node), "{first} lost its element");
		}
	}

	#[test]
	fn child_combinator_joins_with_angle_bracket() {
		let doc = doc("<div><span>a</span><span>b</span></div>");
		let span = doc.query_css("span").unwrap()[1];
		let selector = synthesize_selector_with(&doc, &span, Combinator::Child).unwrap();
		assert_eq!(selector, "div > span:nth-of-type(2)");
		assert_eq!(doc.query_css(&selector).unwrap(), vec![span]);
	}

	#[test]
	fn detached_element_stops_at_its_root() {
		let doc = MemoryDocument::new();
		let wrapper = doc.create_element("section").unwrap();
		let inner = doc.create_element("em").unwrap();
		doc.append_child(wrapper, inner).unwrap();
		assert_eq!(synthesize_selector(&doc, &inner).as_deref(), Some("section em"));
	}

	#[test]
	fn document_without_body_walks_to_root() {
		let doc = MemoryDocument::without_body();
		let head = doc.query_css("head").unwrap()[0];
		let title = doc.create_element("title").unwrap();
		doc.append_child(head, title).unwrap();
		assert_eq!(synthesize_selector(&doc, &title).as_deref(), Some("html head title"));
	}

	#[test]
	fn non_element_yields_none() {
		let doc = doc("<p>text</p>");
		let p = doc.query_css("p").unwrap()[0];
		let text = doc.children(p)[0];
		assert_eq!(synthesize_selector(&doc, &text), None);
	}
}
