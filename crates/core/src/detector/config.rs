//! Detection configuration loaded from `patterns.json`.
//!
//! Selector lists and every scoring constant live in the embedded JSON so
//! the heuristics can be tuned and tested independently of the algorithm.

use std::sync::LazyLock;

use serde::Deserialize;

static PATTERNS: LazyLock<DetectorConfig> = LazyLock::new(|| {
	let json = include_str!("patterns.json");
	serde_json::from_str(json).expect("Failed to parse patterns.json")
});

/// The built-in configuration shipped with the crate.
pub fn default_config() -> &'static DetectorConfig {
	&PATTERNS
}

/// Selector lists and heuristic weights driving detection.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
	/// Likely-content containers probed by the generic strategy, in order.
	pub content_selectors: Vec<String>,
	/// Subtrees removed from candidate clones before text extraction.
	pub strip_selectors: Vec<String>,
	/// Heading-like elements scanned for a chapter title, in order.
	pub title_selectors: Vec<String>,
	pub weights: DetectorWeights,
}

impl Default for DetectorConfig {
	fn default() -> Self {
		default_config().clone()
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorWeights {
	pub score: ScoreWeights,
	pub confidence: ConfidenceWeights,
}

/// Weights for raw candidate scoring (which elements are worth extracting).
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreWeights {
	/// One point per this many characters of text, up to `text_cap`.
	pub text_chars_per_point: f64,
	pub text_cap: f64,
	/// Multiplier on text density (text length over markup length).
	pub density_weight: f64,
	/// Paragraph count contributes one point each, up to this cap.
	pub paragraph_cap: f64,
	pub image_penalty: f64,
	pub link_penalty: f64,
	/// Maximum points for proximity to the viewport center.
	pub position_cap: f64,
}

/// Weights for the independent confidence estimate used to pick the winner.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfidenceWeights {
	pub base: f64,
	/// Each threshold the content length exceeds adds `length_bonus`.
	pub length_thresholds: Vec<usize>,
	pub length_bonus: f64,
	/// Multiplier on the CJK-ideograph ratio of the extracted text.
	pub cjk_weight: f64,
	/// More than this many `<p>` descendants adds `paragraph_bonus`.
	pub paragraph_min: usize,
	pub paragraph_bonus: f64,
	/// Class-name substrings that mark a content container.
	pub class_markers: Vec<String>,
	pub class_bonus: f64,
}
