//! Micro selector engine.
//!
//! Supports exactly the selector forms the detector configuration and the
//! built-in site rules use: `tag`, `.class`, `#id`, `[attr*="value"]`,
//! compounds of those, descendant chains, and comma groups. Anything else
//! fails to parse and is skipped by candidate scans.

use super::{Document, NodeId};

/// A parsed comma group of selectors.
#[derive(Debug, Clone)]
pub(crate) struct SelectorList {
	selectors: Vec<DescendantChain>,
}

/// Whitespace-separated descendant chain, innermost last.
#[derive(Debug, Clone)]
struct DescendantChain {
	parts: Vec<Compound>,
}

#[derive(Debug, Clone, Default)]
struct Compound {
	tag: Option<String>,
	id: Option<String>,
	classes: Vec<String>,
	attr_contains: Vec<(String, String)>,
}

impl SelectorList {
	pub(crate) fn parse(input: &str) -> Option<Self> {
		let mut selectors = Vec::new();
		for group in input.split(',') {
			let group = group.trim();
			if group.is_empty() {
				return None;
			}
			let mut parts = Vec::new();
			for token in group.split_whitespace() {
				parts.push(Compound::parse(token)?);
			}
			if parts.is_empty() {
				return None;
			}
			selectors.push(DescendantChain { parts });
		}
		if selectors.is_empty() { None } else { Some(Self { selectors }) }
	}

	pub(crate) fn matches(&self, doc: &Document, id: NodeId, scope: NodeId) -> bool {
		self.selectors.iter().any(|chain| chain.matches(doc, id, scope))
	}
}

impl DescendantChain {
	fn matches(&self, doc: &Document, id: NodeId, scope: NodeId) -> bool {
		let (last, ancestors_required) = self.parts.split_last().expect("chains are non-empty");
		if !last.matches(doc, id) {
			return false;
		}

		// Walk up matching the remaining compounds innermost-first.
		let mut remaining = ancestors_required.len();
		let mut current = id;
		while remaining > 0 {
			let Some(parent) = doc.nodes[current.0].parent else {
				return false;
			};
			if ancestors_required[remaining - 1].matches(doc, parent) {
				remaining -= 1;
			}
			if parent == scope {
				return remaining == 0;
			}
			current = parent;
		}
		true
	}
}

impl Compound {
	fn parse(token: &str) -> Option<Self> {
		let mut compound = Compound::default();
		let mut rest = token;

		while !rest.is_empty() {
			if let Some(after) = rest.strip_prefix('.') {
				let (name, tail) = split_name(after)?;
				compound.classes.push(name.to_string());
				rest = tail;
			} else if let Some(after) = rest.strip_prefix('#') {
				let (name, tail) = split_name(after)?;
				compound.id = Some(name.to_string());
				rest = tail;
			} else if let Some(after) = rest.strip_prefix('[') {
				let end = after.find(']')?;
				let body = &after[..end];
				let (attr, value) = body.split_once("*=")?;
				let value = value.trim_matches(|c| c == '"' || c == '\'');
				if attr.is_empty() || value.is_empty() {
					return None;
				}
				compound.attr_contains.push((attr.to_ascii_lowercase(), value.to_string()));
				rest = &after[end + 1..];
			} else {
				if compound.tag.is_some() {
					return None;
				}
				let (name, tail) = split_name(rest)?;
				compound.tag = Some(name.to_ascii_lowercase());
				rest = tail;
			}
		}

		if compound.tag.is_none() && compound.id.is_none() && compound.classes.is_empty() && compound.attr_contains.is_empty() {
			return None;
		}
		Some(compound)
	}

	fn matches(&self, doc: &Document, id: NodeId) -> bool {
		let Some(tag) = doc.tag(id) else {
			return false;
		};
		if tag.starts_with('#') {
			return false;
		}
		if let Some(wanted) = &self.tag {
			if !tag.eq_ignore_ascii_case(wanted) {
				return false;
			}
		}
		if let Some(wanted) = &self.id {
			if doc.attr(id, "id") != Some(wanted.as_str()) {
				return false;
			}
		}
		if !self.classes.is_empty() {
			let have: Vec<&str> = doc.class_name(id).split_whitespace().collect();
			for wanted in &self.classes {
				if !have.iter().any(|c| *c == wanted.as_str()) {
					return false;
				}
			}
		}
		for (attr, needle) in &self.attr_contains {
			match doc.attr(id, attr) {
				Some(value) if value.contains(needle.as_str()) => {}
				_ => return false,
			}
		}
		true
	}
}

/// Splits a leading identifier (`[a-zA-Z0-9_-]+`) from a token.
fn split_name(input: &str) -> Option<(&str, &str)> {
	let end = input
		.char_indices()
		.find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
		.map_or(input.len(), |(i, _)| i);
	if end == 0 { None } else { Some((&input[..end], &input[end..])) }
}
