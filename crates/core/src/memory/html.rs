//! Small HTML fragment parser feeding the in-memory tree.
//!
//! Handles what snapshot markup and tests need: nested elements, quoted,
//! unquoted and bare attributes, void and self-closing elements, raw text in
//! `<script>`/`<style>`, comments, doctypes and the common entities. End tags
//! close the nearest open element with the same name; stray end tags are
//! ignored.

use super::{NodeId, NodeKind, RAW_TEXT_ELEMENTS, Tree, VOID_ELEMENTS};
use crate::error::DomError;

struct Cursor<'a> {
	src: &'a str,
	pos: usize,
}

impl<'a> Cursor<'a> {
	fn rest(&self) -> &'a str {
		&self.src[self.pos..]
	}

	fn eof(&self) -> bool {
		self.pos >= self.src.len()
	}

	fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn peek_second(&self) -> Option<char> {
		self.rest().chars().nth(1)
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += c.len_utf8();
		Some(c)
	}

	fn starts_with(&self, prefix: &str) -> bool {
		self.rest().starts_with(prefix)
	}

	fn skip_ws(&mut self) {
		while self.peek().is_some_and(char::is_whitespace) {
			self.bump();
		}
	}

	/// Consumes up to and including `terminator`.
	fn skip_past(&mut self, terminator: &str, what: &str) -> Result<(), DomError> {
		match self.rest().find(terminator) {
			Some(offset) => {
				self.pos += offset + terminator.len();
				Ok(())
			}
			None => Err(DomError::Markup(format!("unterminated {what}"))),
		}
	}

	fn name(&mut self) -> String {
		let start = self.pos;
		while self
			.peek()
			.is_some_and(|c| !c.is_whitespace() && !matches!(c, '>' | '/' | '=' | '"' | '\'' | '<'))
		{
			self.bump();
		}
		self.src[start..self.pos].to_ascii_lowercase()
	}

	fn expect(&mut self, expected: char) -> Result<(), DomError> {
		match self.bump() {
			Some(c) if c == expected => Ok(()),
			Some(c) => Err(DomError::Markup(format!("expected '{expected}', found '{c}'"))),
			None => Err(DomError::Markup(format!("expected '{expected}', found end of input"))),
		}
	}
}

/// Parses `markup` and appends the resulting nodes to `parent`.
pub(super) fn parse_into(tree: &mut Tree, parent: NodeId, markup: &str) -> Result<(), DomError> {
	let mut cursor = Cursor { src: markup, pos: 0 };
	let mut open = vec![parent];

	while !cursor.eof() {
		let current = *open.last().unwrap_or(&parent);

		if cursor.starts_with("<!--") {
			cursor.skip_past("-->", "comment")?;
		} else if cursor.starts_with("<!") || cursor.starts_with("<?") {
			cursor.skip_past(">", "declaration")?;
		} else if cursor.starts_with("</") {
			cursor.pos += 2;
			let name = cursor.name();
			cursor.skip_ws();
			cursor.expect('>')?;
			if let Some(index) = open.iter().skip(1).rposition(|&n| tree.tag(n) == Some(name.as_str())) {
				open.truncate(index + 1);
			}
		} else if cursor.peek() == Some('<') && cursor.peek_second().is_some_and(|c| c.is_ascii_alphabetic()) {
			cursor.bump();
			let (element, self_closing) = start_tag(&mut cursor, tree)?;
			tree.append_child(current, element)?;
			let tag = tree.tag(element).unwrap_or_default().to_string();
			if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
				continue;
			}
			if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
				raw_text(&mut cursor, tree, element, &tag)?;
				continue;
			}
			open.push(element);
		} else {
			let start = cursor.pos;
			cursor.bump();
			while let Some(c) = cursor.peek() {
				if c == '<'
					&& cursor
						.peek_second()
						.is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?'))
				{
					break;
				}
				cursor.bump();
			}
			let text = decode_entities(&markup[start..cursor.pos]);
			let node = tree.new_text(&text);
			tree.append_child(current, node)?;
		}
	}
	Ok(())
}

/// Parses a start tag after its `<`. Returns the element and whether it
/// closed itself with `/>`.
fn start_tag(cursor: &mut Cursor<'_>, tree: &mut Tree) -> Result<(NodeId, bool), DomError> {
	let tag = cursor.name();
	let element = tree.new_element(&tag);
	let mut attrs: Vec<(String, String)> = Vec::new();

	loop {
		cursor.skip_ws();
		match cursor.peek() {
			None => return Err(DomError::Markup(format!("unterminated <{tag}> tag"))),
			Some('>') => {
				cursor.bump();
				break;
			}
			Some('/') if cursor.peek_second() == Some('>') => {
				cursor.pos += 2;
				set_attrs(tree, element, attrs);
				return Ok((element, true));
			}
			Some(_) => {
				let name = cursor.name();
				if name.is_empty() {
					let c = cursor.peek().unwrap_or_default();
					return Err(DomError::Markup(format!("unexpected '{c}' in <{tag}> tag")));
				}
				cursor.skip_ws();
				let value = if cursor.peek() == Some('=') {
					cursor.bump();
					cursor.skip_ws();
					attribute_value(cursor, &tag)?
				} else {
					String::new()
				};
				if !attrs.iter().any(|(n, _)| *n == name) {
					attrs.push((name, value));
				}
			}
		}
	}

	set_attrs(tree, element, attrs);
	Ok((element, false))
}

fn set_attrs(tree: &mut Tree, element: NodeId, attrs: Vec<(String, String)>) {
	if let NodeKind::Element(data) = &mut tree.nodes[element.0].kind {
		data.attrs = attrs;
	}
}

fn attribute_value(cursor: &mut Cursor<'_>, tag: &str) -> Result<String, DomError> {
	match cursor.peek() {
		Some(quote @ ('"' | '\'')) => {
			cursor.bump();
			let start = cursor.pos;
			let Some(offset) = cursor.rest().find(quote) else {
				return Err(DomError::Markup(format!("unterminated attribute value in <{tag}> tag")));
			};
			cursor.pos += offset + 1;
			Ok(decode_entities(&cursor.src[start..start + offset]))
		}
		_ => {
			let start = cursor.pos;
			while cursor.peek().is_some_and(|c| !c.is_whitespace() && c != '>') {
				cursor.bump();
			}
			Ok(decode_entities(&cursor.src[start..cursor.pos]))
		}
	}
}

fn raw_text(cursor: &mut Cursor<'_>, tree: &mut Tree, element: NodeId, tag: &str) -> Result<(), DomError> {
	let closing = format!("</{tag}");
	let rest = cursor.rest();
	let Some(offset) = rest.to_ascii_lowercase().find(&closing) else {
		return Err(DomError::Markup(format!("unterminated <{tag}> element")));
	};
	if offset > 0 {
		let text = tree.new_text(&rest[..offset]);
		tree.append_child(element, text)?;
	}
	cursor.pos += offset + closing.len();
	cursor.skip_past(">", "end tag")
}

/// Decodes named entities used in practice plus numeric references. Unknown
/// entities are kept verbatim.
pub(super) fn decode_entities(text: &str) -> String {
	if !text.contains('&') {
		return text.to_string();
	}
	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(amp) = rest.find('&') {
		out.push_str(&rest[..amp]);
		rest = &rest[amp..];
		let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
			let entity = &rest[1..end];
			let c = match entity {
				"amp" => Some('&'),
				"lt" => Some('<'),
				"gt" => Some('>'),
				"quot" => Some('"'),
				"apos" | "#39" => Some('\''),
				"nbsp" => Some('\u{a0}'),
				_ => entity
					.strip_prefix("#x")
					.or_else(|| entity.strip_prefix("#X"))
					.map(|hex| u32::from_str_radix(hex, 16))
					.or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
					.and_then(Result::ok)
					.and_then(char::from_u32),
			};
			c.map(|c| (c, end))
		});
		match decoded {
			Some((c, end)) => {
				out.push(c);
				rest = &rest[end + 1..];
			}
			None => {
				out.push('&');
				rest = &rest[1..];
			}
		}
	}
	out.push_str(rest);
	out
}

#[cfg(test)]
mod tests {
	use super::decode_entities;

	#[test]
	fn entities() {
		assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
		assert_eq!(decode_entities("&#65;&#x42;&#39;"), "AB'");
		assert_eq!(decode_entities("fish &chips; & more"), "fish &chips; & more");
	}
}
