//! XPath subset for the in-memory document.
//!
//! Location paths over the child axis (`/`, `//`, `.`, `..`), element name and
//! `*` tests, `text()` and `node()`, unions with `|`, and predicates built
//! from positions, `last()`, `position() = n`, attribute, text and child
//! comparisons, `contains()`, `starts-with()`, `not()`, `and` and `or`.
//! Expressions are evaluated with the document node as context; results come
//! back deduplicated in document order.

use std::collections::HashMap;

use super::{NodeId, NodeKind, Tree};
use crate::dom::XPathHit;
use crate::error::DomError;

pub(super) fn query(tree: &Tree, expression: &str) -> Result<Vec<XPathHit<NodeId>>, DomError> {
	let union = parse(expression).map_err(|reason| DomError::InvalidXPath {
		expression: expression.to_string(),
		reason,
	})?;
	let order = DocumentOrder::new(tree);

	let mut nodes = Vec::new();
	for path in &union {
		nodes.extend(path.evaluate(tree, &order));
	}
	order.sort(&mut nodes);

	Ok(nodes
		.into_iter()
		.map(|node| match &tree.node(node).kind {
			NodeKind::Element(_) => XPathHit::Element(node),
			NodeKind::Text(text) => XPathHit::Text(text.clone()),
			NodeKind::Document => XPathHit::Text(tree.text_content(node)),
		})
		.collect())
}

struct DocumentOrder(HashMap<NodeId, usize>);

impl DocumentOrder {
	fn new(tree: &Tree) -> Self {
		Self(
			tree.preorder(tree.root())
				.into_iter()
				.enumerate()
				.map(|(index, node)| (node, index))
				.collect(),
		)
	}

	fn sort(&self, nodes: &mut Vec<NodeId>) {
		nodes.sort_by_key(|node| self.0.get(node).copied().unwrap_or(usize::MAX));
		nodes.dedup();
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
	Child,
	/// Reached through `//`: descendant-or-self of the context, then the step.
	Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
	Name(String),
	AnyElement,
	Text,
	AnyNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
	Current,
	Parent,
	Test { test: NodeTest, predicates: Vec<Predicate> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Path {
	steps: Vec<(Axis, Step)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
	Attribute(String),
	Text,
	Current,
	Child(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
	Position(usize),
	Last,
	Not(Box<Predicate>),
	And(Box<Predicate>, Box<Predicate>),
	Or(Box<Predicate>, Box<Predicate>),
	Exists(Operand),
	Equals { operand: Operand, value: String, negated: bool },
	Contains(Operand, String),
	StartsWith(Operand, String),
}

impl Path {
	fn evaluate(&self, tree: &Tree, order: &DocumentOrder) -> Vec<NodeId> {
		let mut context = vec![tree.root()];
		for (axis, step) in &self.steps {
			let mut bases = match axis {
				Axis::Child => context,
				Axis::Descendant => context.iter().flat_map(|&node| tree.preorder(node)).collect(),
			};
			order.sort(&mut bases);

			let mut next = Vec::new();
			for base in bases {
				next.extend(step.apply(tree, base));
			}
			order.sort(&mut next);
			context = next;
		}
		context
	}
}

impl Step {
	fn apply(&self, tree: &Tree, base: NodeId) -> Vec<NodeId> {
		match self {
			Step::Current => vec![base],
			Step::Parent => tree.parent(base).into_iter().collect(),
			Step::Test { test, predicates } => {
				let mut candidates: Vec<NodeId> = tree
					.children(base)
					.iter()
					.copied()
					.filter(|&child| test.matches(tree, child))
					.collect();
				for predicate in predicates {
					let size = candidates.len();
					candidates = candidates
						.into_iter()
						.enumerate()
						.filter(|&(index, node)| predicate.holds(tree, node, index + 1, size))
						.map(|(_, node)| node)
						.collect();
				}
				candidates
			}
		}
	}
}

impl NodeTest {
	fn matches(&self, tree: &Tree, node: NodeId) -> bool {
		match self {
			NodeTest::Name(name) => tree.tag(node) == Some(name.as_str()),
			NodeTest::AnyElement => tree.is_element(node),
			NodeTest::Text => tree.text(node).is_some(),
			NodeTest::AnyNode => true,
		}
	}
}

impl Operand {
	/// String values of the nodes the operand selects.
	fn values(&self, tree: &Tree, node: NodeId) -> Vec<String> {
		match self {
			Operand::Attribute(name) => tree
				.element(node)
				.and_then(|element| element.attr(name))
				.map(str::to_string)
				.into_iter()
				.collect(),
			Operand::Text => tree
				.children(node)
				.iter()
				.filter_map(|&child| tree.text(child).map(str::to_string))
				.collect(),
			Operand::Current => vec![tree.text_content(node)],
			Operand::Child(name) => tree
				.children(node)
				.iter()
				.filter(|&&child| tree.tag(child) == Some(name.as_str()))
				.map(|&child| tree.text_content(child))
				.collect(),
		}
	}

	/// String value of the first selected node, empty when nothing is selected.
	fn string_value(&self, tree: &Tree, node: NodeId) -> String {
		self.values(tree, node).into_iter().next().unwrap_or_default()
	}
}

impl Predicate {
	fn holds(&self, tree: &Tree, node: NodeId, position: usize, size: usize) -> bool {
		match self {
			Predicate::Position(n) => position == *n,
			Predicate::Last => position == size,
			Predicate::Not(inner) => !inner.holds(tree, node, position, size),
			Predicate::And(left, right) => {
				left.holds(tree, node, position, size) && right.holds(tree, node, position, size)
			}
			Predicate::Or(left, right) => {
				left.holds(tree, node, position, size) || right.holds(tree, node, position, size)
			}
			Predicate::Exists(operand) => !operand.values(tree, node).is_empty(),
			Predicate::Equals { operand, value, negated } => operand
				.values(tree, node)
				.iter()
				.any(|candidate| (candidate == value) != *negated),
			Predicate::Contains(operand, needle) => operand.string_value(tree, node).contains(needle.as_str()),
			Predicate::StartsWith(operand, prefix) => operand.string_value(tree, node).starts_with(prefix.as_str()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	Slash,
	DoubleSlash,
	Pipe,
	Dot,
	DotDot,
	Star,
	At,
	LBracket,
	RBracket,
	LParen,
	RParen,
	Comma,
	Equals,
	NotEquals,
	DoubleColon,
	Name(String),
	Literal(String),
	Number(usize),
}

fn tokenize(expression: &str) -> Result<Vec<Token>, String> {
	let chars: Vec<char> = expression.chars().collect();
	let mut tokens = Vec::new();
	let mut i = 0;
	while i < chars.len() {
		let c = chars[i];
		let next = chars.get(i + 1).copied();
		let (token, width) = match c {
			_ if c.is_whitespace() => {
				i += 1;
				continue;
			}
			'/' if next == Some('/') => (Token::DoubleSlash, 2),
			'/' => (Token::Slash, 1),
			'|' => (Token::Pipe, 1),
			'.' if next == Some('.') => (Token::DotDot, 2),
			'.' => (Token::Dot, 1),
			'*' => (Token::Star, 1),
			'@' => (Token::At, 1),
			'[' => (Token::LBracket, 1),
			']' => (Token::RBracket, 1),
			'(' => (Token::LParen, 1),
			')' => (Token::RParen, 1),
			',' => (Token::Comma, 1),
			'=' => (Token::Equals, 1),
			'!' if next == Some('=') => (Token::NotEquals, 2),
			':' if next == Some(':') => (Token::DoubleColon, 2),
			'"' | '\'' => {
				let Some(len) = chars[i + 1..].iter().position(|&q| q == c) else {
					return Err("unterminated string literal".to_string());
				};
				let literal: String = chars[i + 1..i + 1 + len].iter().collect();
				(Token::Literal(literal), len + 2)
			}
			_ if c.is_ascii_digit() => {
				let len = chars[i..].iter().take_while(|d| d.is_ascii_digit()).count();
				let digits: String = chars[i..i + len].iter().collect();
				let number = digits.parse().map_err(|_| format!("number '{digits}' is out of range"))?;
				(Token::Number(number), len)
			}
			_ if c.is_alphabetic() || c == '_' => {
				let len = chars[i..]
					.iter()
					.take_while(|&&n| n.is_alphanumeric() || matches!(n, '-' | '_'))
					.count();
				(Token::Name(chars[i..i + len].iter().collect()), len)
			}
			other => return Err(format!("unexpected character '{other}'")),
		};
		tokens.push(token);
		i += width;
	}
	Ok(tokens)
}

/// Deepest allowed nesting of parenthesized and `not()` predicates.
const MAX_PREDICATE_NESTING: usize = 64;

fn parse(expression: &str) -> Result<Vec<Path>, String> {
	let mut parser = Parser {
		tokens: tokenize(expression)?,
		pos: 0,
		depth: 0,
	};
	if parser.tokens.is_empty() {
		return Err("empty expression".to_string());
	}
	let mut union = vec![parser.path()?];
	while parser.eat(&Token::Pipe) {
		union.push(parser.path()?);
	}
	match parser.peek() {
		None => Ok(union),
		Some(token) => Err(format!("unexpected {}", describe(Some(token)))),
	}
}

fn describe(token: Option<&Token>) -> String {
	match token {
		None => "end of expression".to_string(),
		Some(Token::Name(name)) => format!("'{name}'"),
		Some(Token::Literal(literal)) => format!("string '{literal}'"),
		Some(Token::Number(n)) => format!("number {n}"),
		Some(other) => format!("{other:?}"),
	}
}

struct Parser {
	tokens: Vec<Token>,
	pos: usize,
	depth: usize,
}

impl Parser {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	fn peek_at(&self, offset: usize) -> Option<&Token> {
		self.tokens.get(self.pos + offset)
	}

	fn bump(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.pos).cloned()?;
		self.pos += 1;
		Some(token)
	}

	fn eat(&mut self, expected: &Token) -> bool {
		if self.peek() == Some(expected) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn expect(&mut self, expected: Token) -> Result<(), String> {
		if self.eat(&expected) {
			Ok(())
		} else {
			Err(format!("expected {expected:?}, found {}", describe(self.peek())))
		}
	}

	fn eat_keyword(&mut self, keyword: &str) -> bool {
		if matches!(self.peek(), Some(Token::Name(name)) if name == keyword) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn path(&mut self) -> Result<Path, String> {
		let mut steps = Vec::new();
		let mut axis = match self.peek() {
			Some(Token::DoubleSlash) => {
				self.pos += 1;
				Axis::Descendant
			}
			Some(Token::Slash) => {
				self.pos += 1;
				if matches!(self.peek(), None | Some(Token::Pipe)) {
					return Ok(Path { steps });
				}
				Axis::Child
			}
			_ => Axis::Child,
		};
		loop {
			steps.push((axis, self.step()?));
			axis = match self.peek() {
				Some(Token::Slash) => Axis::Child,
				Some(Token::DoubleSlash) => Axis::Descendant,
				_ => break,
			};
			self.pos += 1;
		}
		Ok(Path { steps })
	}

	fn step(&mut self) -> Result<Step, String> {
		let test = match self.bump() {
			Some(Token::Dot) => return Ok(Step::Current),
			Some(Token::DotDot) => return Ok(Step::Parent),
			Some(Token::Star) => NodeTest::AnyElement,
			Some(Token::At) => return Err("attribute steps are not supported".to_string()),
			Some(Token::Name(name)) => {
				if self.peek() == Some(&Token::DoubleColon) {
					return Err(format!("axis '{name}::' is not supported"));
				}
				if self.eat(&Token::LParen) {
					self.expect(Token::RParen)?;
					match name.as_str() {
						"text" => NodeTest::Text,
						"node" => NodeTest::AnyNode,
						other => return Err(format!("function '{other}()' cannot be used as a step")),
					}
				} else {
					NodeTest::Name(name.to_ascii_lowercase())
				}
			}
			other => return Err(format!("expected a location step, found {}", describe(other.as_ref()))),
		};

		let mut predicates = Vec::new();
		while self.eat(&Token::LBracket) {
			predicates.push(self.or_expr()?);
			self.expect(Token::RBracket)?;
		}
		Ok(Step::Test { test, predicates })
	}

	fn or_expr(&mut self) -> Result<Predicate, String> {
		if self.depth >= MAX_PREDICATE_NESTING {
			return Err(format!("predicates nested deeper than {MAX_PREDICATE_NESTING} levels"));
		}
		self.depth += 1;
		let predicate = self.disjunction();
		self.depth -= 1;
		predicate
	}

	fn disjunction(&mut self) -> Result<Predicate, String> {
		let mut left = self.and_expr()?;
		while self.eat_keyword("or") {
			left = Predicate::Or(Box::new(left), Box::new(self.and_expr()?));
		}
		Ok(left)
	}

	fn and_expr(&mut self) -> Result<Predicate, String> {
		let mut left = self.primary()?;
		while self.eat_keyword("and") {
			left = Predicate::And(Box::new(left), Box::new(self.primary()?));
		}
		Ok(left)
	}

	fn primary(&mut self) -> Result<Predicate, String> {
		match self.peek().cloned() {
			Some(Token::Number(n)) => {
				self.pos += 1;
				Ok(Predicate::Position(n))
			}
			Some(Token::LParen) => {
				self.pos += 1;
				let inner = self.or_expr()?;
				self.expect(Token::RParen)?;
				Ok(inner)
			}
			Some(Token::Name(name)) if self.peek_at(1) == Some(&Token::LParen) && name != "text" => {
				self.pos += 2;
				self.function(&name)
			}
			_ => {
				let operand = self.operand()?;
				self.comparison(operand)
			}
		}
	}

	/// Parses a function call after its opening parenthesis.
	fn function(&mut self, name: &str) -> Result<Predicate, String> {
		let predicate = match name {
			"last" => Predicate::Last,
			"position" => {
				self.expect(Token::RParen)?;
				self.expect(Token::Equals)?;
				return match self.bump() {
					Some(Token::Number(n)) => Ok(Predicate::Position(n)),
					other => Err(format!("expected a number after position() =, found {}", describe(other.as_ref()))),
				};
			}
			"not" => Predicate::Not(Box::new(self.or_expr()?)),
			"contains" | "starts-with" => {
				let operand = self.operand()?;
				self.expect(Token::Comma)?;
				let value = self.literal()?;
				if name == "contains" {
					Predicate::Contains(operand, value)
				} else {
					Predicate::StartsWith(operand, value)
				}
			}
			other => return Err(format!("unsupported function '{other}()'")),
		};
		self.expect(Token::RParen)?;
		Ok(predicate)
	}

	fn operand(&mut self) -> Result<Operand, String> {
		match self.bump() {
			Some(Token::At) => match self.bump() {
				Some(Token::Name(name)) => Ok(Operand::Attribute(name.to_ascii_lowercase())),
				other => Err(format!("expected an attribute name, found {}", describe(other.as_ref()))),
			},
			Some(Token::Dot) => Ok(Operand::Current),
			Some(Token::Name(name)) if name == "text" => {
				self.expect(Token::LParen)?;
				self.expect(Token::RParen)?;
				Ok(Operand::Text)
			}
			Some(Token::Name(name)) => Ok(Operand::Child(name.to_ascii_lowercase())),
			other => Err(format!("expected a predicate, found {}", describe(other.as_ref()))),
		}
	}

	fn comparison(&mut self, operand: Operand) -> Result<Predicate, String> {
		let negated = match self.peek() {
			Some(Token::Equals) => false,
			Some(Token::NotEquals) => true,
			_ => return Ok(Predicate::Exists(operand)),
		};
		self.pos += 1;
		let value = match self.bump() {
			Some(Token::Literal(value)) => value,
			Some(Token::Number(n)) => n.to_string(),
			other => return Err(format!("expected a value to compare with, found {}", describe(other.as_ref()))),
		};
		Ok(Predicate::Equals { operand, value, negated })
	}

	fn literal(&mut self) -> Result<String, String> {
		match self.bump() {
			Some(Token::Literal(value)) => Ok(value),
			other => Err(format!("expected a string literal, found {}", describe(other.as_ref()))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tokenizes_operators_and_literals() {
		assert_eq!(
			tokenize("//a[@href!='x']").unwrap(),
			vec![
				Token::DoubleSlash,
				Token::Name("a".into()),
				Token::LBracket,
				Token::At,
				Token::Name("href".into()),
				Token::NotEquals,
				Token::Literal("x".into()),
				Token::RBracket,
			]
		);
	}

	#[test]
	fn parses_unions_and_descendant_steps() {
		let union = parse("//ul/li[2] | /html/body").unwrap();
		assert_eq!(union.len(), 2);
		assert_eq!(union[0].steps[0].0, Axis::Descendant);
		assert_eq!(
			union[0].steps[1],
			(
				Axis::Child,
				Step::Test {
					test: NodeTest::Name("li".into()),
					predicates: vec![Predicate::Position(2)],
				}
			)
		);
	}

	#[test]
	fn bare_root_path_has_no_steps() {
		assert_eq!(parse("/").unwrap(), vec![Path { steps: Vec::new() }]);
	}

	#[test]
	fn rejects_malformed_expressions() {
		for bad in [
			"",
			"//nonexistent[",
			"//a[@]",
			"//@href",
			"//div/",
			"ancestor::div",
			"//a[foo()]",
			"//a['x",
			"//p]",
			"//p[contains(., 1)]",
		] {
			assert!(parse(bad).is_err(), "{bad:?} should be rejected");
		}
	}

	#[test]
	fn caps_predicate_nesting() {
		let nested = |depth: usize| format!("//p[{}1{}]", "(".repeat(depth), ")".repeat(depth));
		assert!(parse(&nested(MAX_PREDICATE_NESTING - 1)).is_ok());

		let err = parse(&nested(MAX_PREDICATE_NESTING)).unwrap_err();
		assert!(err.contains("nested deeper"), "{err}");

		let unbalanced = format!("//p[{}", "(".repeat(200_000));
		assert!(parse(&unbalanced).is_err());

		let negations = format!("//p[{}.{}]", "not(".repeat(500), ")".repeat(500));
		assert!(parse(&negations).is_err());
	}
}
