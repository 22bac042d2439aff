//! Seam to the platform text-to-speech engine.

use async_trait::async_trait;
use readaloud_protocol::VoiceDescriptor;
use thiserror::Error;

/// One utterance handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceRequest {
	pub text: String,
	/// Exact voice name, `None` for the engine default.
	pub voice: Option<String>,
	pub rate: f32,
	pub volume: f32,
	pub pitch: f32,
}

/// Failure reported for a single utterance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
	/// Transient device-busy condition; the session retries the same
	/// sentence exactly once.
	#[error("speech device busy")]
	Busy,
	/// The utterance was cancelled by `cancel()`. Control flow, not a
	/// playback failure.
	#[error("utterance cancelled")]
	Cancelled,
	/// Any other synthesis failure; the sentence is skipped.
	#[error("synthesis failed: {0}")]
	Synthesis(String),
}

/// The external speech capability the session drives.
///
/// Implementations bridge the platform's callback hooks into futures:
/// `speak` resolves when the engine reports the utterance finished or
/// errored, and an in-flight `speak` must resolve with
/// [`EngineError::Cancelled`] after `cancel()`.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
	/// The currently available voices. May wait for the platform's voice
	/// list to populate; the session bounds this wait with a timeout.
	async fn voices(&self) -> Vec<VoiceDescriptor>;

	/// Speaks one utterance, resolving at its end.
	async fn speak(&self, request: UtteranceRequest) -> Result<(), EngineError>;

	/// Cancels the in-flight utterance, if any. Idempotent.
	fn cancel(&self);

	/// Freezes the in-flight utterance in place.
	fn pause(&self);

	/// Attempts to resume a paused utterance in place. Returns `false` when
	/// the engine's pause state has been lost and the caller must re-speak
	/// the current sentence from its beginning.
	fn resume(&self) -> bool;
}
