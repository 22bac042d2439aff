//! In-process speech engine double for tests.
//!
//! `FakeEngine` records every utterance request and lets a test script the
//! outcome of each `speak` call. In auto mode each utterance resolves
//! immediately with the next scripted outcome (default: finished). In manual
//! mode `speak` stays pending until the test calls `finish_utterance` or the
//! session cancels it, which is how pause/stop races are exercised.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use readaloud_protocol::VoiceDescriptor;
use tokio::sync::oneshot;

use super::engine::{EngineError, SpeechEngine, UtteranceRequest};

pub struct FakeEngineBuilder {
	voices: Vec<VoiceDescriptor>,
	script: VecDeque<Result<(), EngineError>>,
	manual: bool,
}

impl FakeEngineBuilder {
	pub fn new() -> Self {
		Self {
			voices: vec![VoiceDescriptor {
				name: "Ting-Ting".to_string(),
				lang: "zh-CN".to_string(),
				is_default: true,
			}],
			script: VecDeque::new(),
			manual: false,
		}
	}

	pub fn voices(mut self, voices: Vec<VoiceDescriptor>) -> Self {
		self.voices = voices;
		self
	}

	/// Queues the outcome of the next unscripted `speak` call. Outcomes are
	/// consumed in order; once the script runs out, utterances finish
	/// normally (or stay pending in manual mode).
	pub fn outcome(mut self, outcome: Result<(), EngineError>) -> Self {
		self.script.push_back(outcome);
		self
	}

	/// Utterances stay pending until `finish_utterance` or `cancel`.
	pub fn manual(mut self) -> Self {
		self.manual = true;
		self
	}

	pub fn build(self) -> Arc<FakeEngine> {
		Arc::new(FakeEngine {
			state: Mutex::new(FakeState {
				voices: self.voices,
				script: self.script,
				manual: self.manual,
				requests: Vec::new(),
				pending: None,
				paused: false,
				pause_lost: false,
				cancel_count: 0,
			}),
		})
	}
}

impl Default for FakeEngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}

pub struct FakeEngine {
	state: Mutex<FakeState>,
}

struct FakeState {
	voices: Vec<VoiceDescriptor>,
	script: VecDeque<Result<(), EngineError>>,
	manual: bool,
	requests: Vec<UtteranceRequest>,
	pending: Option<oneshot::Sender<Result<(), EngineError>>>,
	paused: bool,
	pause_lost: bool,
	cancel_count: usize,
}

impl FakeEngine {
	/// Every request seen so far, in call order.
	pub fn requests(&self) -> Vec<UtteranceRequest> {
		self.state.lock().requests.clone()
	}

	pub fn cancel_count(&self) -> usize {
		self.state.lock().cancel_count
	}

	pub fn is_paused(&self) -> bool {
		self.state.lock().paused
	}

	/// True while a manual-mode utterance is awaiting completion.
	pub fn has_pending(&self) -> bool {
		self.state.lock().pending.is_some()
	}

	/// Completes the pending manual-mode utterance as finished.
	pub fn finish_utterance(&self) {
		if let Some(tx) = self.state.lock().pending.take() {
			let _ = tx.send(Ok(()));
		}
	}

	/// Completes the pending manual-mode utterance with an error.
	pub fn fail_utterance(&self, error: EngineError) {
		if let Some(tx) = self.state.lock().pending.take() {
			let _ = tx.send(Err(error));
		}
	}

	/// Makes the next `resume` report that pause state was lost.
	pub fn set_pause_lost(&self, lost: bool) {
		self.state.lock().pause_lost = lost;
	}

	/// Appends an outcome to the script after construction.
	pub fn push_outcome(&self, outcome: Result<(), EngineError>) {
		self.state.lock().script.push_back(outcome);
	}
}

#[async_trait]
impl SpeechEngine for FakeEngine {
	async fn voices(&self) -> Vec<VoiceDescriptor> {
		self.state.lock().voices.clone()
	}

	async fn speak(&self, request: UtteranceRequest) -> Result<(), EngineError> {
		let rx = {
			let mut state = self.state.lock();
			state.requests.push(request);
			if let Some(outcome) = state.script.pop_front() {
				return outcome;
			}
			if !state.manual {
				return Ok(());
			}
			let (tx, rx) = oneshot::channel();
			state.pending = Some(tx);
			rx
		};
		// A dropped sender counts as a cancellation.
		rx.await.unwrap_or(Err(EngineError::Cancelled))
	}

	fn cancel(&self) {
		let mut state = self.state.lock();
		state.cancel_count += 1;
		state.paused = false;
		if let Some(tx) = state.pending.take() {
			let _ = tx.send(Err(EngineError::Cancelled));
		}
	}

	fn pause(&self) {
		self.state.lock().paused = true;
	}

	fn resume(&self) -> bool {
		let mut state = self.state.lock();
		state.paused = false;
		!state.pause_lost
	}
}
