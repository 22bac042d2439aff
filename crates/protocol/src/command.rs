//! Request/response messages exchanged with UI surfaces.
//!
//! Messages follow the extension's `{type, data?}` shape; responses are
//! `{success, data?, error?}`.

use serde::{Deserialize, Serialize};

use crate::settings::UserSettingsPatch;
use crate::types::ProgressSnapshot;

/// Inbound command relayed from a UI surface to the page orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
	DetectContent,
	StartReading {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		position: Option<usize>,
	},
	PauseReading,
	ResumeReading,
	StopReading,
	GetReadingState,
	GetStatus,
	UpdateSettings(UserSettingsPatch),
}

/// Outcome of a relayed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<ResponseData>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl CommandResponse {
	pub fn ok() -> Self {
		Self {
			success: true,
			data: None,
			error: None,
		}
	}

	pub fn with_data(data: ResponseData) -> Self {
		Self {
			success: true,
			data: Some(data),
			error: None,
		}
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self {
			success: false,
			data: None,
			error: Some(message.into()),
		}
	}
}

/// Structured payloads carried by successful responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
	Detection(DetectionSummary),
	Status(ReadingStatus),
}

/// Reply to `DETECT_CONTENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
	pub detected: bool,
	pub content_length: usize,
	pub sentences: usize,
}

/// Reply to `GET_STATUS` / `GET_READING_STATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStatus {
	pub is_reading: bool,
	pub is_paused: bool,
	pub has_content: bool,
	pub progress: ProgressSnapshot,
}
