//! CSS selector engine for the in-memory document.
//!
//! Supports selector lists, type and universal selectors, `#id`, `.class`,
//! `[attr]`, `[attr=value]`, `:nth-of-type(n)`, `:first-of-type`, and the
//! descendant and child combinators. Identifiers accept backslash escapes, so
//! synthesized selectors with escaped ids parse back. Anything else is
//! rejected as invalid rather than silently ignored.

use super::{NodeId, Tree};
use crate::error::DomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
	Descendant,
	Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
	Exists(String),
	Equals(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pseudo {
	NthOfType(usize),
	FirstOfType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
	tag: Option<String>,
	ids: Vec<String>,
	classes: Vec<String>,
	attrs: Vec<AttrTest>,
	pseudos: Vec<Pseudo>,
}

/// `compounds[i]` relates to `compounds[i + 1]` through `relations[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
	compounds: Vec<Compound>,
	relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SelectorList(Vec<Complex>);

pub(super) fn query(tree: &Tree, selector: &str) -> Result<Vec<NodeId>, DomError> {
	let list = parse(selector).map_err(|reason| DomError::InvalidSelector {
		selector: selector.to_string(),
		reason,
	})?;
	Ok(tree
		.elements()
		.into_iter()
		.filter(|&node| list.matches(tree, node))
		.collect())
}

pub(super) fn parse(selector: &str) -> Result<SelectorList, String> {
	let mut parser = Parser {
		chars: selector.chars().collect(),
		pos: 0,
	};
	let mut list = Vec::new();
	loop {
		parser.skip_ws();
		list.push(parser.complex()?);
		match parser.peek() {
			None => break,
			Some(',') => {
				parser.pos += 1;
			}
			Some(c) => return Err(format!("unexpected '{c}'")),
		}
	}
	Ok(SelectorList(list))
}

impl SelectorList {
	fn matches(&self, tree: &Tree, node: NodeId) -> bool {
		self.0.iter().any(|complex| complex.matches(tree, node))
	}
}

impl Complex {
	/// Right-to-left match with an explicit backtracking stack.
	fn matches(&self, tree: &Tree, node: NodeId) -> bool {
		let mut pending = vec![(node, self.compounds.len() - 1)];
		while let Some((node, index)) = pending.pop() {
			if !self.compounds[index].matches(tree, node) {
				continue;
			}
			if index == 0 {
				return true;
			}
			match self.relations[index - 1] {
				Relation::Child => pending.extend(tree.parent_element(node).map(|parent| (parent, index - 1))),
				Relation::Descendant => {
					let mut ancestors = Vec::new();
					let mut ancestor = tree.parent_element(node);
					while let Some(current) = ancestor {
						ancestors.push((current, index - 1));
						ancestor = tree.parent_element(current);
					}
					// nearest ancestor is tried first
					pending.extend(ancestors.into_iter().rev());
				}
			}
		}
		false
	}
}

impl Compound {
	fn matches(&self, tree: &Tree, node: NodeId) -> bool {
		let Some(element) = tree.element(node) else {
			return false;
		};
		if self.tag.as_ref().is_some_and(|tag| *tag != element.tag) {
			return false;
		}
		if self.ids.iter().any(|id| element.attr("id") != Some(id.as_str())) {
			return false;
		}
		if !self.classes.is_empty() {
			let classes: Vec<&str> = element.attr("class").unwrap_or_default().split_ascii_whitespace().collect();
			if self.classes.iter().any(|class| !classes.contains(&class.as_str())) {
				return false;
			}
		}
		let attrs_match = self.attrs.iter().all(|test| match test {
			AttrTest::Exists(name) => element.attr(name).is_some(),
			AttrTest::Equals(name, value) => element.attr(name) == Some(value.as_str()),
		});
		if !attrs_match {
			return false;
		}
		self.pseudos.iter().all(|pseudo| match pseudo {
			Pseudo::NthOfType(n) => tree.type_index(node) == *n,
			Pseudo::FirstOfType => tree.type_index(node) == 1,
		})
	}
}

struct Parser {
	chars: Vec<char>,
	pos: usize,
}

fn is_ident_char(c: char) -> bool {
	c.is_alphanumeric() || matches!(c, '-' | '_') || !c.is_ascii()
}

impl Parser {
	fn peek(&self) -> Option<char> {
		self.chars.get(self.pos).copied()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += 1;
		Some(c)
	}

	/// Returns whether any whitespace was skipped.
	fn skip_ws(&mut self) -> bool {
		let start = self.pos;
		while self.peek().is_some_and(char::is_whitespace) {
			self.pos += 1;
		}
		self.pos > start
	}

	fn expect(&mut self, expected: char) -> Result<(), String> {
		match self.bump() {
			Some(c) if c == expected => Ok(()),
			Some(c) => Err(format!("expected '{expected}', found '{c}'")),
			None => Err(format!("expected '{expected}', found end of input")),
		}
	}

	fn complex(&mut self) -> Result<Complex, String> {
		let mut compounds = vec![self.compound()?];
		let mut relations = Vec::new();
		loop {
			let spaced = self.skip_ws();
			match self.peek() {
				None | Some(',') => break,
				Some('>') => {
					self.pos += 1;
					self.skip_ws();
					relations.push(Relation::Child);
				}
				Some(c @ ('+' | '~')) => return Err(format!("unsupported combinator '{c}'")),
				Some(_) if spaced => relations.push(Relation::Descendant),
				Some(c) => return Err(format!("unexpected '{c}'")),
			}
			compounds.push(self.compound()?);
		}
		Ok(Complex { compounds, relations })
	}

	fn compound(&mut self) -> Result<Compound, String> {
		let mut compound = Compound::default();
		let mut matched = false;

		match self.peek() {
			Some('*') => {
				self.pos += 1;
				matched = true;
			}
			Some(c) if is_ident_char(c) || c == '\\' => {
				compound.tag = Some(self.ident()?.to_ascii_lowercase());
				matched = true;
			}
			_ => {}
		}

		loop {
			match self.peek() {
				Some('#') => {
					self.pos += 1;
					compound.ids.push(self.ident()?);
				}
				Some('.') => {
					self.pos += 1;
					compound.classes.push(self.ident()?);
				}
				Some('[') => {
					self.pos += 1;
					compound.attrs.push(self.attribute()?);
				}
				Some(':') => {
					self.pos += 1;
					compound.pseudos.push(self.pseudo()?);
				}
				_ => break,
			}
			matched = true;
		}

		if matched {
			Ok(compound)
		} else {
			match self.peek() {
				None => Err("expected a selector".to_string()),
				Some(c) => Err(format!("unexpected '{c}'")),
			}
		}
	}

	fn ident(&mut self) -> Result<String, String> {
		let mut out = String::new();
		while let Some(c) = self.peek() {
			if c == '\\' {
				self.pos += 1;
				out.push(self.escape()?);
			} else if is_ident_char(c) {
				self.pos += 1;
				out.push(c);
			} else {
				break;
			}
		}
		if out.is_empty() {
			return Err(match self.peek() {
				Some(c) => format!("expected an identifier, found '{c}'"),
				None => "expected an identifier, found end of input".to_string(),
			});
		}
		Ok(out)
	}

	/// Decodes an escape after its backslash: up to six hex digits plus one
	/// optional space, or any single character taken literally.
	fn escape(&mut self) -> Result<char, String> {
		let Some(first) = self.peek() else {
			return Err("dangling escape".to_string());
		};
		if !first.is_ascii_hexdigit() {
			self.pos += 1;
			return Ok(first);
		}
		let mut code = 0u32;
		let mut digits = 0;
		while digits < 6 {
			match self.peek().and_then(|c| c.to_digit(16)) {
				Some(d) => {
					code = code * 16 + d;
					digits += 1;
					self.pos += 1;
				}
				None => break,
			}
		}
		if self.peek().is_some_and(char::is_whitespace) {
			self.pos += 1;
		}
		Ok(char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{fffd}'))
	}

	fn attribute(&mut self) -> Result<AttrTest, String> {
		self.skip_ws();
		let name = self.ident()?.to_ascii_lowercase();
		self.skip_ws();
		match self.bump() {
			Some(']') => Ok(AttrTest::Exists(name)),
			Some('=') => {
				self.skip_ws();
				let value = match self.peek() {
					Some(quote @ ('"' | '\'')) => {
						self.pos += 1;
						self.string(quote)?
					}
					_ => self.ident()?,
				};
				self.skip_ws();
				self.expect(']')?;
				Ok(AttrTest::Equals(name, value))
			}
			Some(c) => Err(format!("unsupported attribute operator '{c}'")),
			None => Err("unterminated attribute selector".to_string()),
		}
	}

	fn string(&mut self, quote: char) -> Result<String, String> {
		let mut out = String::new();
		loop {
			match self.bump() {
				None => return Err("unterminated string".to_string()),
				Some(c) if c == quote => return Ok(out),
				Some('\\') => out.push(self.escape()?),
				Some(c) => out.push(c),
			}
		}
	}

	fn pseudo(&mut self) -> Result<Pseudo, String> {
		let name = self.ident()?.to_ascii_lowercase();
		match name.as_str() {
			"first-of-type" => Ok(Pseudo::FirstOfType),
			"nth-of-type" => {
				self.expect('(')?;
				self.skip_ws();
				let start = self.pos;
				while self.peek().is_some_and(|c| c.is_ascii_digit()) {
					self.pos += 1;
				}
				let digits: String = self.chars[start..self.pos].iter().collect();
				self.skip_ws();
				if digits.is_empty() || self.peek() != Some(')') {
					return Err("unsupported :nth-of-type() argument".to_string());
				}
				self.pos += 1;
				match digits.parse::<usize>() {
					Ok(0) | Err(_) => Err(":nth-of-type() index must be a positive integer".to_string()),
					Ok(n) => Ok(Pseudo::NthOfType(n)),
				}
			}
			other => Err(format!("unsupported pseudo-class ':{other}'")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_lists_and_combinators() {
		let list = parse("div > p.note, ul li:nth-of-type(2)").unwrap();
		assert_eq!(list.0.len(), 2);
		assert_eq!(list.0[0].relations, vec![Relation::Child]);
		assert_eq!(list.0[1].relations, vec![Relation::Descendant]);
		assert_eq!(list.0[1].compounds[1].pseudos, vec![Pseudo::NthOfType(2)]);
	}

	#[test]
	fn escaped_ids_decode() {
		let list = parse(r"div#a\.b\:c").unwrap();
		assert_eq!(list.0[0].compounds[0].ids, vec!["a.b:c".to_string()]);

		let list = parse(r"#\31 23").unwrap();
		assert_eq!(list.0[0].compounds[0].ids, vec!["123".to_string()]);
	}

	#[test]
	fn attribute_forms() {
		let list = parse(r#"a[href][data-x="1 2"][rel=next]"#).unwrap();
		assert_eq!(
			list.0[0].compounds[0].attrs,
			vec![
				AttrTest::Exists("href".into()),
				AttrTest::Equals("data-x".into(), "1 2".into()),
				AttrTest::Equals("rel".into(), "next".into()),
			]
		);
	}

	#[test]
	fn rejects_malformed_input() {
		for bad in ["", "div >", "a[", "p:hover", "li:nth-of-type(0)", "li:nth-of-type(2n+1)", "a + b", "div,", "#"] {
			assert!(parse(bad).is_err(), "{bad:?} should be rejected");
		}
	}
}
