//! Forgiving tag-soup HTML parser.
//!
//! Builds the node arena for [`Document`]. Unclosed tags are closed at end
//! of input, stray close tags are ignored, comments and doctypes are
//! skipped, and `<script>`/`<style>` bodies are treated as opaque text so
//! embedded `<` never derails the scan.

use super::{Document, Node, NodeData, NodeId, decode_html_entities};

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(super) fn parse(html: &str) -> Document {
	let mut doc = Document::new_empty();
	let root = doc.root();
	let mut stack: Vec<(String, NodeId)> = Vec::new();
	let bytes = html.as_bytes();
	let mut pos = 0;

	while pos < bytes.len() {
		if bytes[pos] == b'<' {
			if html[pos..].starts_with("<!--") {
				pos = match html[pos..].find("-->") {
					Some(end) => pos + end + 3,
					None => bytes.len(),
				};
				continue;
			}
			if html[pos..].starts_with("<!") || html[pos..].starts_with("<?") {
				pos = match html[pos..].find('>') {
					Some(end) => pos + end + 1,
					None => bytes.len(),
				};
				continue;
			}
			if html[pos..].starts_with("</") {
				let end = match html[pos..].find('>') {
					Some(end) => pos + end,
					None => bytes.len(),
				};
				let name = html[pos + 2..end.min(html.len())].trim().to_ascii_lowercase();
				close_tag(&mut stack, &name);
				pos = (end + 1).min(bytes.len());
				continue;
			}
			if let Some((tag, attrs, self_closing, after)) = scan_open_tag(html, pos) {
				let parent = stack.last().map_or(root, |(_, id)| *id);
				let id = doc.push_node(Node {
					parent: None,
					children: Vec::new(),
					data: NodeData::Element {
						tag: tag.clone(),
						attrs,
						rect: None,
					},
				});
				doc.append_child(parent, id);
				pos = after;

				if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
					continue;
				}
				if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
					// Swallow the body verbatim up to the matching close tag.
					let close = format!("</{tag}");
					let lower = html[pos..].to_ascii_lowercase();
					match lower.find(&close) {
						Some(rel) => {
							let raw = &html[pos..pos + rel];
							if !raw.is_empty() {
								let text = doc.push_node(Node {
									parent: None,
									children: Vec::new(),
									data: NodeData::Text(raw.to_string()),
								});
								doc.append_child(id, text);
							}
							let rest = pos + rel;
							pos = match html[rest..].find('>') {
								Some(end) => rest + end + 1,
								None => bytes.len(),
							};
						}
						None => pos = bytes.len(),
					}
					continue;
				}
				stack.push((tag, id));
				continue;
			}
			// A bare `<` that does not open a tag: treat as text.
			let parent = stack.last().map_or(root, |(_, id)| *id);
			push_text(&mut doc, parent, "<");
			pos += 1;
		} else {
			let end = html[pos..].find('<').map_or(bytes.len(), |rel| pos + rel);
			let raw = &html[pos..end];
			if !raw.is_empty() {
				let parent = stack.last().map_or(root, |(_, id)| *id);
				push_text(&mut doc, parent, &decode_html_entities(raw));
			}
			pos = end;
		}
	}

	doc
}

fn push_text(doc: &mut Document, parent: NodeId, text: &str) {
	let id = doc.push_node(Node {
		parent: None,
		children: Vec::new(),
		data: NodeData::Text(text.to_string()),
	});
	doc.append_child(parent, id);
}

fn close_tag(stack: &mut Vec<(String, NodeId)>, name: &str) {
	if let Some(depth) = stack.iter().rposition(|(tag, _)| tag == name) {
		stack.truncate(depth);
	}
}

/// Parses `<tag attr="v" ...>` starting at `pos` (which points at `<`).
/// Returns the lowercased tag, attributes, the self-closing flag, and the
/// offset just past `>`.
fn scan_open_tag(html: &str, pos: usize) -> Option<(String, Vec<(String, String)>, bool, usize)> {
	let rest = &html[pos + 1..];
	let mut chars = rest.char_indices().peekable();

	let mut tag = String::new();
	for (_, ch) in chars.by_ref() {
		if ch.is_ascii_alphanumeric() || ch == '-' {
			tag.push(ch.to_ascii_lowercase());
		} else if tag.is_empty() {
			return None;
		} else {
			// Re-scan from the byte where the name ended.
			break;
		}
	}
	if tag.is_empty() {
		return None;
	}

	let name_end = pos + 1 + tag.len();
	let tail = &html[name_end..];
	let close = tail.find('>')?;
	let inside = &tail[..close];
	let self_closing = inside.trim_end().ends_with('/');
	let attrs = parse_attrs(inside.trim_end().trim_end_matches('/'));

	Some((tag, attrs, self_closing, name_end + close + 1))
}

fn parse_attrs(input: &str) -> Vec<(String, String)> {
	let mut attrs = Vec::new();
	let bytes = input.as_bytes();
	let mut pos = 0;

	while pos < bytes.len() {
		while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
			pos += 1;
		}
		let name_start = pos;
		while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'=' {
			pos += 1;
		}
		if pos == name_start {
			break;
		}
		let name = input[name_start..pos].to_ascii_lowercase();

		while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
			pos += 1;
		}
		if pos >= bytes.len() || bytes[pos] != b'=' {
			attrs.push((name, String::new()));
			continue;
		}
		pos += 1;
		while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
			pos += 1;
		}
		if pos < bytes.len() && (bytes[pos] == b'"' || bytes[pos] == b'\'') {
			let quote = bytes[pos];
			pos += 1;
			let value_start = pos;
			while pos < bytes.len() && bytes[pos] != quote {
				pos += 1;
			}
			attrs.push((name, decode_html_entities(&input[value_start..pos])));
			pos = (pos + 1).min(bytes.len());
		} else {
			let value_start = pos;
			while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
				pos += 1;
			}
			attrs.push((name, input[value_start..pos].to_string()));
		}
	}

	attrs
}
