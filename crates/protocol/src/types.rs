//! Shared data records: site rules, reading progress, voices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-domain detection override. Built-in rules ship with the engine;
/// user-added rules are appended after them and matched in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRule {
	pub domain: String,
	pub title_selector: String,
	pub content_selector: String,
	pub enabled: bool,
}

/// Persisted reading position for one URL. Last write wins; no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
	pub url: String,
	pub position: usize,
	pub timestamp: DateTime<Utc>,
	pub title: String,
}

/// A voice advertised by the platform speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
	pub name: String,
	pub lang: String,
	#[serde(default, rename = "default")]
	pub is_default: bool,
}

/// Effective utterance parameters for one playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechSettings {
	/// Exact voice name to request, empty for engine preference.
	pub voice_name: String,
	pub rate: f32,
	pub volume: f32,
}

impl Default for SpeechSettings {
	fn default() -> Self {
		Self {
			voice_name: String::new(),
			rate: 1.0,
			volume: 0.8,
		}
	}
}

/// Sentence-level progress snapshot reported to UI surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
	pub current: usize,
	pub total: usize,
	/// Rounded percentage in [0, 100]; 0 when the session is empty.
	pub percentage: u32,
}

impl ProgressSnapshot {
	pub fn new(current: usize, total: usize) -> Self {
		let percentage = if total == 0 {
			0
		} else {
			((current as f64 / total as f64) * 100.0).round() as u32
		};
		Self { current, total, percentage }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn progress_snapshot_handles_empty_session() {
		let snapshot = ProgressSnapshot::new(0, 0);
		assert_eq!(snapshot.percentage, 0);
	}

	#[test]
	fn progress_snapshot_rounds_percentage() {
		let snapshot = ProgressSnapshot::new(1, 3);
		assert_eq!(snapshot.percentage, 33);
		let snapshot = ProgressSnapshot::new(2, 3);
		assert_eq!(snapshot.percentage, 67);
	}

	#[test]
	fn site_rule_round_trips_camel_case() {
		let json = r#"{"domain":"qidian.com","titleSelector":".j_chapterName","contentSelector":".j_readContent","enabled":true}"#;
		let rule: SiteRule = serde_json::from_str(json).unwrap();
		assert_eq!(rule.domain, "qidian.com");
		assert_eq!(serde_json::to_string(&rule).unwrap(), json);
	}
}
