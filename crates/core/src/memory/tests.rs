use super::*;

fn doc(markup: &str) -> MemoryDocument {
	MemoryDocument::parse(markup).unwrap()
}

fn tags(doc: &MemoryDocument, nodes: &[NodeId]) -> Vec<String> {
	nodes.iter().map(|n| doc.tag_name(n)).collect()
}

fn xpath_texts(doc: &MemoryDocument, expression: &str) -> Vec<String> {
	doc.query_xpath(expression)
		.unwrap()
		.into_iter()
		.map(|hit| match hit {
			XPathHit::Element(node) => doc.outer_html(&node),
			XPathHit::Text(text) => text,
		})
		.collect()
}

#[test]
fn fragments_are_wrapped_in_html_and_body() {
	let doc = doc("<p>hi</p>");
	assert_eq!(doc.to_html(), "<html><body><p>hi</p></body></html>");
	assert!(doc.body().is_some());
}

#[test]
fn full_documents_keep_their_structure() {
	let doc = doc("<!DOCTYPE html><html><head><title>t</title></head><body><p>x</p></body></html>");
	assert_eq!(
		doc.to_html(),
		"<html><head><title>t</title></head><body><p>x</p></body></html>"
	);
}

#[test]
fn parser_handles_attributes_void_and_raw_text() {
	let doc = doc(
		r#"<div id=main class='a b' hidden data-x="1 &amp; 2"><img src="x.png"><br/><script>if (a < b) {}</script><!-- gone --></div>"#,
	);
	let div = doc.element_by_id("main").unwrap();
	assert_eq!(
		doc.attributes(&div),
		vec![
			("id".to_string(), "main".to_string()),
			("class".to_string(), "a b".to_string()),
			("hidden".to_string(), String::new()),
			("data-x".to_string(), "1 & 2".to_string()),
		]
	);
	assert_eq!(tags(&doc, &doc.children(div)), ["img", "br", "script"]);
	let script = doc.query_css("script").unwrap()[0];
	assert_eq!(doc.text_content(&script), "if (a < b) {}");
}

#[test]
fn end_tags_close_the_nearest_open_element() {
	let doc = doc("<ul><li>a<li>b</ul><p>after</p></span>");
	let items = doc.query_css("ul > li").unwrap();
	assert_eq!(items.len(), 1);
	assert_eq!(doc.text_content(&items[0]), "ab");
	let nested = doc.query_css("li li").unwrap();
	assert_eq!(doc.text_content(&nested[0]), "b");
	assert_eq!(doc.query_css("body > p").unwrap().len(), 1);
}

#[test]
fn unterminated_markup_is_rejected() {
	assert!(matches!(MemoryDocument::parse("<div class=\"x"), Err(DomError::Markup(_))));
	assert!(matches!(MemoryDocument::parse("<!-- open"), Err(DomError::Markup(_))));
	assert!(matches!(MemoryDocument::parse("<script>never closed"), Err(DomError::Markup(_))));
}

#[test]
fn serialization_escapes_text_and_attributes() {
	let doc = doc(r#"<p title="say &quot;hi&quot;">1 &lt; 2 &amp; 3</p>"#);
	let p = doc.query_css("p").unwrap()[0];
	assert_eq!(doc.outer_html(&p), r#"<p title="say &quot;hi&quot;">1 &lt; 2 &amp; 3</p>"#);
	assert_eq!(doc.text_content(&p), "1 < 2 & 3");
}

#[test]
fn css_matches_compounds_in_document_order() {
	let doc = doc(
		r#"<div class="card x"><span>1</span></div><div class="card"><span data-k="v">2</span><span>3</span></div>"#,
	);
	assert_eq!(doc.query_css("div.card").unwrap().len(), 2);
	assert_eq!(doc.query_css(".card.x span").unwrap().len(), 1);
	let keyed = doc.query_css("span[data-k='v']").unwrap();
	assert_eq!(doc.text_content(&keyed[0]), "2");
	let second = doc.query_css("div span:nth-of-type(2)").unwrap();
	assert_eq!(doc.text_content(&second[0]), "3");
	let firsts: Vec<String> = doc
		.query_css("span:first-of-type")
		.unwrap()
		.iter()
		.map(|n| doc.text_content(n))
		.collect();
	assert_eq!(firsts, ["1", "2"]);
}

#[test]
fn css_lists_deduplicate() {
	let doc = doc("<p class='a'>x</p><p>y</p>");
	assert_eq!(doc.query_css("p, .a, p.a").unwrap().len(), 2);
}

#[test]
fn css_child_combinator_requires_direct_parent() {
	let doc = doc("<div><section><b>deep</b></section><b>shallow</b></div>");
	let direct = doc.query_css("div > b").unwrap();
	assert_eq!(direct.len(), 1);
	assert_eq!(doc.text_content(&direct[0]), "shallow");
	assert_eq!(doc.query_css("div b").unwrap().len(), 2);
}

#[test]
fn css_no_match_is_empty_and_bad_syntax_errors() {
	let doc = doc("<p>x</p>");
	assert!(doc.query_css(".missing").unwrap().is_empty());
	let err = doc.query_css("p[").unwrap_err();
	assert!(matches!(err, DomError::InvalidSelector { ref selector, .. } if selector == "p["));
}

#[test]
fn xpath_selects_elements_and_text() {
	let doc = doc("<ul><li>a</li><li class='x'>b</li><li>c</li></ul>");
	assert_eq!(xpath_texts(&doc, "//li[2]"), ["<li class=\"x\">b</li>"]);
	assert_eq!(xpath_texts(&doc, "//li[last()]/text()"), ["c"]);
	assert_eq!(xpath_texts(&doc, "//li[@class='x']/text()"), ["b"]);
	assert_eq!(xpath_texts(&doc, "//li[not(@class)]/text()"), ["a", "c"]);
	assert_eq!(xpath_texts(&doc, "//li[text()='c'] | //li[1]").len(), 2);
	assert_eq!(xpath_texts(&doc, "/html/body/ul/li[contains(., 'b')]/text()"), ["b"]);
}

#[test]
fn xpath_positions_are_relative_to_each_parent() {
	let doc = doc("<div><p>1</p><p>2</p></div><div><p>3</p></div>");
	assert_eq!(xpath_texts(&doc, "//p[1]/text()"), ["1", "3"]);
	assert_eq!(xpath_texts(&doc, "//div[p='3']/p/text()"), ["3"]);
	assert_eq!(xpath_texts(&doc, "//p[position() = 2 or starts-with(., '3')]/text()"), ["2", "3"]);
}

#[test]
fn xpath_parent_and_root_steps() {
	let doc = doc("<div id='d'><span>s</span></div>");
	let hits = doc.query_xpath("//span/..").unwrap();
	assert_eq!(hits, vec![XPathHit::Element(doc.element_by_id("d").unwrap())]);
	assert_eq!(xpath_texts(&doc, "/"), ["s"]);
}

#[test]
fn xpath_invalid_expression_errors() {
	let doc = doc("<p>x</p>");
	let err = doc.query_xpath("//nonexistent[").unwrap_err();
	assert!(matches!(err, DomError::InvalidXPath { ref expression, .. } if expression == "//nonexistent["));
	assert!(doc.query_xpath("//nonexistent").unwrap().is_empty());
}

#[test]
fn styles_set_and_clear() {
	let doc = doc("<p>x</p>");
	let p = doc.query_css("p").unwrap()[0];
	doc.set_style(&p, "outline", "1px solid red").unwrap();
	assert_eq!(doc.style(p, "outline").as_deref(), Some("1px solid red"));
	doc.set_style(&p, "outline", "").unwrap();
	assert!(doc.has_no_style(p));
}

#[test]
fn removed_nodes_are_stale() {
	let doc = doc("<div><p>x</p></div>");
	let div = doc.query_css("div").unwrap()[0];
	let p = doc.query_css("p").unwrap()[0];
	doc.remove(div);
	assert_eq!(doc.set_style(&p, "outline", "x"), Err(DomError::Stale));
	assert_eq!(doc.append_child(div, p), Err(DomError::Stale));
	assert!(doc.query_css("p").unwrap().is_empty());
}

#[test]
fn append_child_rejects_cycles() {
	let doc = doc("<div><p>x</p></div>");
	let div = doc.query_css("div").unwrap()[0];
	let p = doc.query_css("p").unwrap()[0];
	assert!(matches!(doc.append_child(p, div), Err(DomError::Unsupported(_))));
}

#[test]
fn append_child_rejects_self_and_root() {
	let doc = doc("<div></div>");
	let div = doc.query_css("div").unwrap()[0];
	assert!(matches!(doc.append_child(div, div), Err(DomError::Unsupported(_))));
	assert!(matches!(doc.append_child(div, doc.root()), Err(DomError::Unsupported(_))));
}

#[test]
fn deep_nesting_parses_serializes_and_matches() {
	let depth = 50_000;
	let markup = format!("{}<b>x</b>{}", "<div>".repeat(depth), "</div>".repeat(depth));
	let doc = doc(&markup);

	let html = doc.to_html();
	assert!(html.ends_with(&format!("<b>x</b>{}</body></html>", "</div>".repeat(depth))));

	assert_eq!(tags(&doc, &doc.query_css("body div div b").unwrap()), ["b"]);
	assert_eq!(doc.query_css("div").unwrap().len(), depth);
	assert_eq!(xpath_texts(&doc, "//b/text()"), ["x"]);
}

#[test]
fn append_to_body_needs_a_body() {
	let doc = MemoryDocument::without_body();
	let overlay = doc.create_element("div").unwrap();
	assert!(doc.append_to_body(&overlay).is_err());
	let body = doc.attach_body().unwrap();
	doc.append_to_body(&overlay).unwrap();
	assert_eq!(doc.children(body), vec![overlay]);
	assert_eq!(doc.attach_body().unwrap(), body);
}

#[test]
fn create_element_validates_tag() {
	let doc = MemoryDocument::new();
	assert!(doc.create_element("div").is_ok());
	assert!(doc.create_element("").is_err());
	assert!(doc.create_element("a b").is_err());
}

#[test]
fn listener_bookkeeping() {
	let doc = MemoryDocument::new();
	doc.attach_listeners().unwrap();
	doc.detach_listeners();
	doc.defer_until_ready();
	assert_eq!(
		doc.listener_state(),
		ListenerState {
			attached: false,
			attach_calls: 1,
			detach_calls: 1,
			ready_requests: 1,
		}
	);
	doc.refuse_listeners(true);
	assert!(matches!(doc.attach_listeners(), Err(DomError::Js(_))));
}
