//! Arena-backed document model for detection.
//!
//! Detection scores element subtrees (descendant counts, markup density,
//! class names), so the page snapshot is parsed into a real tree rather than
//! handled as a flat string. The parser is deliberately forgiving: tag soup,
//! mis-nesting, and unknown markup all degrade to "more text nodes", never
//! to an error.
//!
//! Layout geometry is optional. A host embedding the engine next to a real
//! page can attach per-element rects and a viewport height; a bare parsed
//! snapshot has neither, and position-based scoring contributes nothing.

mod parser;
mod selector;

use crate::error::{ReadaloudError, Result};

pub(crate) use selector::SelectorList;

/// Index of a node within its [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Vertical extent of an element as laid out by the host page, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
	pub top: f64,
	pub height: f64,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
	Element {
		tag: String,
		attrs: Vec<(String, String)>,
		rect: Option<Rect>,
	},
	Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
	pub(crate) parent: Option<NodeId>,
	pub(crate) children: Vec<NodeId>,
	pub(crate) data: NodeData,
}

/// A parsed page snapshot.
#[derive(Debug, Clone)]
pub struct Document {
	pub(crate) nodes: Vec<Node>,
	root: NodeId,
	url: Option<String>,
	viewport_height: Option<f64>,
}

impl Document {
	/// Parses an HTML snapshot. Never fails; malformed markup is tolerated.
	pub fn parse(html: &str) -> Self {
		parser::parse(html)
	}

	pub(crate) fn new_empty() -> Self {
		let root = Node {
			parent: None,
			children: Vec::new(),
			data: NodeData::Element {
				tag: "#root".to_string(),
				attrs: Vec::new(),
				rect: None,
			},
		};
		Self {
			nodes: vec![root],
			root: NodeId(0),
			url: None,
			viewport_height: None,
		}
	}

	pub fn root(&self) -> NodeId {
		self.root
	}

	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());
		self
	}

	pub fn url(&self) -> Option<&str> {
		self.url.as_deref()
	}

	/// Hostname portion of the document URL, if any.
	pub fn domain(&self) -> Option<&str> {
		let url = self.url.as_deref()?;
		let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
		let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
		let host = host.rsplit_once('@').map_or(host, |(_, h)| h);
		let host = host.split(':').next().unwrap_or(host);
		if host.is_empty() { None } else { Some(host) }
	}

	pub fn set_viewport_height(&mut self, height: f64) {
		self.viewport_height = Some(height);
	}

	pub fn viewport_height(&self) -> Option<f64> {
		self.viewport_height
	}

	pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(node);
		id
	}

	pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
		self.nodes[child.0].parent = Some(parent);
		self.nodes[parent.0].children.push(child);
	}

	pub fn tag(&self, id: NodeId) -> Option<&str> {
		match &self.nodes[id.0].data {
			NodeData::Element { tag, .. } => Some(tag),
			NodeData::Text(_) => None,
		}
	}

	pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
		match &self.nodes[id.0].data {
			NodeData::Element { attrs, .. } => attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str()),
			NodeData::Text(_) => None,
		}
	}

	/// The element's `class` attribute, or `""` when absent.
	pub fn class_name(&self, id: NodeId) -> &str {
		self.attr(id, "class").unwrap_or("")
	}

	pub fn set_rect(&mut self, id: NodeId, rect: Rect) {
		if let NodeData::Element { rect: slot, .. } = &mut self.nodes[id.0].data {
			*slot = Some(rect);
		}
	}

	pub fn rect(&self, id: NodeId) -> Option<Rect> {
		match &self.nodes[id.0].data {
			NodeData::Element { rect, .. } => *rect,
			NodeData::Text(_) => None,
		}
	}

	pub fn children(&self, id: NodeId) -> &[NodeId] {
		&self.nodes[id.0].children
	}

	/// Concatenated text of the subtree rooted at `id`.
	pub fn text_content(&self, id: NodeId) -> String {
		let mut out = String::new();
		self.collect_text(id, &mut out);
		out
	}

	fn collect_text(&self, id: NodeId, out: &mut String) {
		match &self.nodes[id.0].data {
			NodeData::Text(text) => out.push_str(text),
			NodeData::Element { .. } => {
				for &child in &self.nodes[id.0].children {
					self.collect_text(child, out);
				}
			}
		}
	}

	/// Serialized markup of the subtree below `id` (the element's children).
	pub fn inner_html(&self, id: NodeId) -> String {
		let mut out = String::new();
		for &child in &self.nodes[id.0].children {
			self.serialize(child, &mut out);
		}
		out
	}

	fn serialize(&self, id: NodeId, out: &mut String) {
		match &self.nodes[id.0].data {
			NodeData::Text(text) => out.push_str(text),
			NodeData::Element { tag, attrs, .. } => {
				out.push('<');
				out.push_str(tag);
				for (name, value) in attrs {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					out.push_str(value);
					out.push('"');
				}
				out.push('>');
				for &child in &self.nodes[id.0].children {
					self.serialize(child, out);
				}
				out.push_str("</");
				out.push_str(tag);
				out.push('>');
			}
		}
	}

	/// Element descendants of `id` in document order, excluding `id` itself.
	pub fn element_descendants(&self, id: NodeId) -> Vec<NodeId> {
		let mut out = Vec::new();
		self.walk_elements(id, &mut out);
		out
	}

	fn walk_elements(&self, id: NodeId, out: &mut Vec<NodeId>) {
		for &child in &self.nodes[id.0].children {
			if matches!(self.nodes[child.0].data, NodeData::Element { .. }) {
				out.push(child);
				self.walk_elements(child, out);
			}
		}
	}

	/// Number of descendant elements with the given tag.
	pub fn count_descendants(&self, id: NodeId, tag: &str) -> usize {
		self.element_descendants(id)
			.iter()
			.filter(|&&d| self.tag(d).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
			.count()
	}

	/// All elements matching `selector`, in document order.
	///
	/// Returns `Err(ReadaloudError::Selector)` for selectors the engine
	/// cannot parse; callers running candidate scans skip those.
	pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
		self.query_all_within(self.root, selector)
	}

	/// Like [`query_all`](Self::query_all), scoped to the subtree of `scope`.
	pub fn query_all_within(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
		let list = SelectorList::parse(selector).ok_or_else(|| ReadaloudError::Selector(selector.to_string()))?;
		Ok(self
			.element_descendants(scope)
			.into_iter()
			.filter(|&id| list.matches(self, id, scope))
			.collect())
	}

	/// First element matching `selector`, in document order.
	pub fn query_first(&self, selector: &str) -> Result<Option<NodeId>> {
		Ok(self.query_all(selector)?.into_iter().next())
	}

	/// Deep-copies the subtree rooted at `id` into a standalone document.
	/// Detection works on such clones so the source snapshot is never touched.
	pub fn clone_subtree(&self, id: NodeId) -> Document {
		let mut doc = Document::new_empty();
		let root = doc.root();
		self.copy_into(id, &mut doc, root);
		doc
	}

	fn copy_into(&self, id: NodeId, target: &mut Document, parent: NodeId) {
		let data = self.nodes[id.0].data.clone();
		let new_id = target.push_node(Node {
			parent: None,
			children: Vec::new(),
			data,
		});
		target.append_child(parent, new_id);
		for &child in &self.nodes[id.0].children {
			self.copy_into(child, target, new_id);
		}
	}

	/// Detaches `id` from its parent. The node stays in the arena but is no
	/// longer reachable from the root.
	pub fn remove(&mut self, id: NodeId) {
		if let Some(parent) = self.nodes[id.0].parent {
			self.nodes[parent.0].children.retain(|&c| c != id);
			self.nodes[id.0].parent = None;
		}
	}
}

/// Decode the small set of HTML entities that matter for text extraction.
pub(crate) fn decode_html_entities(s: &str) -> String {
	if !s.contains('&') {
		return s.to_string();
	}
	s.replace("&amp;", "&")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&apos;", "'")
		.replace("&#x27;", "'")
		.replace("&nbsp;", " ")
}
