//! User settings record and the partial-update shape.

use serde::{Deserialize, Serialize};

use crate::SpeechSettings;

/// Settings persisted under the `userSettings` key.
///
/// Range constraints (rate in [0.5, 2.0], volume in [0, 1]) are enforced by
/// the settings repository before every save; this type itself is plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
	pub voice_type: String,
	pub speech_rate: f32,
	pub volume: f32,
	pub auto_detect: bool,
	pub favorite_voices: Vec<String>,
}

impl Default for UserSettings {
	fn default() -> Self {
		Self {
			voice_type: String::new(),
			speech_rate: 1.0,
			volume: 0.8,
			auto_detect: true,
			favorite_voices: Vec::new(),
		}
	}
}

impl UserSettings {
	/// Utterance parameters derived from these settings.
	pub fn speech(&self) -> SpeechSettings {
		SpeechSettings {
			voice_name: self.voice_type.clone(),
			rate: self.speech_rate,
			volume: self.volume,
		}
	}
}

/// Partial settings update carried by `UPDATE_SETTINGS`. Absent fields keep
/// their current values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettingsPatch {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub voice_type: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub speech_rate: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub volume: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub auto_detect: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub favorite_voices: Option<Vec<String>>,
}

impl UserSettingsPatch {
	/// Returns `base` with the patched fields replaced.
	pub fn apply(&self, base: &UserSettings) -> UserSettings {
		UserSettings {
			voice_type: self.voice_type.clone().unwrap_or_else(|| base.voice_type.clone()),
			speech_rate: self.speech_rate.unwrap_or(base.speech_rate),
			volume: self.volume.unwrap_or(base.volume),
			auto_detect: self.auto_detect.unwrap_or(base.auto_detect),
			favorite_voices: self.favorite_voices.clone().unwrap_or_else(|| base.favorite_voices.clone()),
		}
	}
}
