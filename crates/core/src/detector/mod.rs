//! Heuristic novel-content detection.
//!
//! Two strategies run in order: a per-domain rule lookup (exact selectors,
//! high confidence) and a generic candidate scan that scores likely-content
//! containers and admits the one with the best independent confidence
//! estimate. Detection never mutates the page snapshot - candidate text is
//! extracted from subtree clones - and never fails: a page without
//! qualifying content yields `DetectionResult { is_novel: false, .. }`.

mod config;
mod rules;

use std::collections::HashSet;

use readaloud_protocol::SiteRule;
use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::textproc;

pub use config::{ConfidenceWeights, DetectorConfig, DetectorWeights, ScoreWeights, default_config};
pub use rules::built_in_rules;

/// Outcome of one detection pass. Built fresh on every call, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
	pub is_novel: bool,
	pub content: String,
	pub title: Option<String>,
	/// Heuristic score in [0, 1], not a probability. Rule-based hits are
	/// always exactly 0.9; generic hits fall in [0.5, 1.0].
	pub confidence: f64,
}

impl DetectionResult {
	fn none() -> Self {
		Self {
			is_novel: false,
			content: String::new(),
			title: None,
			confidence: 0.0,
		}
	}
}

/// Confidence reported whenever a site rule fires successfully.
const RULE_CONFIDENCE: f64 = 0.9;

pub struct ContentDetector {
	rules: Vec<SiteRule>,
	config: DetectorConfig,
}

impl Default for ContentDetector {
	fn default() -> Self {
		Self::new()
	}
}

impl ContentDetector {
	pub fn new() -> Self {
		Self::with_config(DetectorConfig::default())
	}

	/// Builds a detector with custom selector lists / weights.
	pub fn with_config(config: DetectorConfig) -> Self {
		Self {
			rules: built_in_rules(),
			config,
		}
	}

	/// Replaces the effective rule set with built-ins followed by `rules`.
	/// Duplicate domains are kept; the first match in order still wins.
	pub fn update_site_rules(&mut self, rules: Vec<SiteRule>) {
		let mut effective = built_in_rules();
		effective.extend(rules);
		self.rules = effective;
	}

	/// Runs detection against a page snapshot.
	pub fn detect(&self, doc: &Document) -> DetectionResult {
		if let Some(domain) = doc.domain() {
			let rule = self.rules.iter().find(|r| r.enabled && domain.contains(r.domain.as_str()));
			if let Some(rule) = rule {
				if let Some(result) = self.detect_with_rule(doc, rule) {
					return result;
				}
				debug!(
					target = "ra.detector",
					domain = %rule.domain,
					"site rule did not yield content; falling back to generic scan"
				);
			}
		}
		self.detect_generic(doc)
	}

	fn detect_with_rule(&self, doc: &Document, rule: &SiteRule) -> Option<DetectionResult> {
		let content_el = match doc.query_first(&rule.content_selector) {
			Ok(Some(el)) => el,
			Ok(None) => return None,
			Err(err) => {
				debug!(target = "ra.detector", error = %err, "skipping unusable rule selector");
				return None;
			}
		};

		let content = self.extract_text(doc, content_el);
		if !textproc::is_novel_content(&content) {
			return None;
		}

		let title = doc
			.query_first(&rule.title_selector)
			.ok()
			.flatten()
			.map(|el| doc.text_content(el).trim().to_string())
			.filter(|t| !t.is_empty());

		Some(DetectionResult {
			is_novel: true,
			content: textproc::clean_text(&content),
			title,
			confidence: RULE_CONFIDENCE,
		})
	}

	fn detect_generic(&self, doc: &Document) -> DetectionResult {
		let mut seen = HashSet::new();
		let mut candidates: Vec<(NodeId, f64)> = Vec::new();

		for selector in &self.config.content_selectors {
			let elements = match doc.query_all(selector) {
				Ok(elements) => elements,
				Err(err) => {
					debug!(target = "ra.detector", error = %err, "skipping candidate selector");
					continue;
				}
			};
			for el in elements {
				if !seen.insert(el) {
					continue;
				}
				let score = self.score_element(doc, el);
				if score > 0.0 {
					candidates.push((el, score));
				}
			}
		}

		candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

		let mut best: Option<(String, f64)> = None;
		for (el, _) in candidates {
			let content = self.extract_text(doc, el);
			if !textproc::is_novel_content(&content) {
				continue;
			}
			let confidence = self.confidence(doc, el, &content);
			if best.as_ref().is_none_or(|(_, c)| confidence > *c) {
				best = Some((content, confidence));
			}
		}

		match best {
			Some((content, confidence)) => DetectionResult {
				is_novel: true,
				content: textproc::clean_text(&content),
				title: self.find_chapter_title(doc),
				confidence,
			},
			None => DetectionResult::none(),
		}
	}

	/// Candidate worth: text volume, density, and structure minus clutter,
	/// plus proximity to the viewport center when geometry is available.
	fn score_element(&self, doc: &Document, el: NodeId) -> f64 {
		let w = &self.config.weights.score;
		let text_len = doc.text_content(el).chars().count();
		let markup_len = doc.inner_html(el).chars().count();

		let mut score = (text_len as f64 / w.text_chars_per_point).min(w.text_cap);
		score += textproc::text_density(text_len, markup_len) * w.density_weight;
		score += (doc.count_descendants(el, "p") as f64).min(w.paragraph_cap);
		score -= w.image_penalty * doc.count_descendants(el, "img") as f64;
		score -= w.link_penalty * doc.count_descendants(el, "a") as f64;
		score += self.position_score(doc, el);

		score.max(0.0)
	}

	/// Up to `position_cap` points for sitting near the viewport center;
	/// elements without geometry, or entirely outside the proximity window,
	/// contribute 0 here - never a negative amount.
	fn position_score(&self, doc: &Document, el: NodeId) -> f64 {
		let w = &self.config.weights.score;
		let (Some(rect), Some(viewport)) = (doc.rect(el), doc.viewport_height()) else {
			return 0.0;
		};
		if viewport <= 0.0 {
			return 0.0;
		}
		let element_center = rect.top + rect.height / 2.0;
		let distance = (element_center - viewport / 2.0).abs();
		(w.position_cap - distance / viewport * w.position_cap).max(0.0)
	}

	/// Independent confidence estimate deciding which admitted candidate
	/// wins. Weighted sum capped at 1.0.
	fn confidence(&self, doc: &Document, el: NodeId, content: &str) -> f64 {
		let w = &self.config.weights.confidence;
		let mut confidence = w.base;

		let length = content.chars().count();
		for &threshold in &w.length_thresholds {
			if length > threshold {
				confidence += w.length_bonus;
			}
		}

		confidence += textproc::cjk_ratio(content) * w.cjk_weight;

		if doc.count_descendants(el, "p") > w.paragraph_min {
			confidence += w.paragraph_bonus;
		}

		let class = doc.class_name(el).to_ascii_lowercase();
		if w.class_markers.iter().any(|marker| class.contains(marker.as_str())) {
			confidence += w.class_bonus;
		}

		confidence.min(1.0)
	}

	/// Extracts readable text from a candidate: clones the subtree, strips
	/// clutter subtrees from the clone, returns what remains. The source
	/// snapshot is never modified.
	fn extract_text(&self, doc: &Document, el: NodeId) -> String {
		let mut clone = doc.clone_subtree(el);
		let cloned_el = clone.children(clone.root())[0];

		for selector in &self.config.strip_selectors {
			let hits = match clone.query_all_within(cloned_el, selector) {
				Ok(hits) => hits,
				Err(_) => continue,
			};
			for hit in hits {
				clone.remove(hit);
			}
		}

		clone.text_content(cloned_el)
	}

	/// First heading-like element whose text looks like a chapter heading.
	/// Selectors are tried in configured order, elements in document order.
	fn find_chapter_title(&self, doc: &Document) -> Option<String> {
		for selector in &self.config.title_selectors {
			let elements = match doc.query_all(selector) {
				Ok(elements) => elements,
				Err(_) => continue,
			};
			for el in elements {
				let text = doc.text_content(el).trim().to_string();
				if !text.is_empty() && textproc::extract_chapter_title(&text).is_some() {
					return Some(text);
				}
			}
		}
		None
	}
}
