//! Error taxonomy shared across the engine.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReadaloudError>;

/// Failures surfaced by engine operations.
///
/// Detection failure is deliberately absent: a page without qualifying
/// content is reported through `DetectionResult { is_novel: false, .. }`,
/// never as an error.
#[derive(Debug, Error)]
pub enum ReadaloudError {
	/// `start` was called with text that segments to zero sentences.
	#[error("no valid sentences found in text")]
	EmptyContent,

	/// There is no detected content block to read from.
	#[error("no novel content detected on this page")]
	NoContent,

	/// A settings record failed validation; nothing was persisted.
	#[error("invalid settings: {0}")]
	InvalidSettings(String),

	/// A selector could not be parsed. Detection skips these; they are only
	/// returned when a caller queries the document directly.
	#[error("invalid selector `{0}`")]
	Selector(String),

	/// The backing key-value store rejected an operation.
	#[error("storage operation failed: {0}")]
	Store(String),

	/// A relayed request received no response within the bounded wait.
	#[error("no response from {0}")]
	Communication(String),

	#[error(transparent)]
	Serde(#[from] serde_json::Error),
}
