//! Sentence-by-sentence read-aloud playback.
//!
//! [`SpeechSession`] splits detected text into sentences and drives a
//! [`SpeechEngine`] through them one utterance at a time from a spawned
//! playback task. Control calls (pause, resume, stop, seek) take effect
//! between utterances or by cancelling the in-flight one; every transition
//! surfaces as a [`SessionEvent`].

pub mod engine;
pub mod events;
pub mod fake_engine;
mod voice;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use readaloud_protocol::{ProgressSnapshot, SpeechSettings, VoiceDescriptor};
use tracing::warn;

use crate::error::{ReadaloudError, Result};
use crate::textproc;

pub use engine::{EngineError, SpeechEngine, UtteranceRequest};
pub use events::{EventKind, ListenerId, SessionEvent};
pub use fake_engine::{FakeEngine, FakeEngineBuilder};

use events::ListenerRegistry;
use voice::select_voice;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
	/// No playback since construction, or the last run ended normally.
	Idle,
	Playing,
	Paused,
	/// Explicitly stopped; position reset to the first sentence.
	Stopped,
	/// The last run attempted every sentence and spoke none.
	Failed,
}

impl PlaybackState {
	pub fn is_active(self) -> bool {
		matches!(self, PlaybackState::Playing | PlaybackState::Paused)
	}
}

/// Pacing knobs. Tests zero the delays; production uses the defaults.
#[derive(Debug, Clone)]
pub struct SessionConfig {
	/// Gap between one sentence finishing and the next dispatch.
	pub inter_sentence_delay: Duration,
	/// Wait before the single retry of a busy engine.
	pub retry_backoff: Duration,
	/// Upper bound on waiting for the engine's voice list at start.
	pub voice_wait_timeout: Duration,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			inter_sentence_delay: Duration::from_millis(100),
			retry_backoff: Duration::from_millis(250),
			voice_wait_timeout: Duration::from_secs(3),
		}
	}
}

struct Inner {
	state: PlaybackState,
	sentences: Arc<Vec<String>>,
	index: usize,
	settings: SpeechSettings,
	voices: Vec<VoiceDescriptor>,
	/// Bumped whenever the in-flight utterance's result must be discarded
	/// (stop, seek, settings change, restart).
	epoch: u64,
	/// Identifies the playback task allowed to drive this session; a stale
	/// task exits as soon as it observes a newer id.
	run_id: u64,
	/// True while an utterance is pending inside the engine.
	in_flight: bool,
	spoken: usize,
	errored: usize,
}

/// A read-aloud run over one piece of content.
///
/// All methods are callable from any task; internal state lives behind a
/// mutex shared with the playback task.
pub struct SpeechSession {
	engine: Arc<dyn SpeechEngine>,
	inner: Arc<Mutex<Inner>>,
	listeners: Arc<ListenerRegistry>,
	config: SessionConfig,
}

impl SpeechSession {
	pub fn new(engine: Arc<dyn SpeechEngine>, settings: SpeechSettings) -> Self {
		Self::with_config(engine, settings, SessionConfig::default())
	}

	pub fn with_config(
		engine: Arc<dyn SpeechEngine>,
		settings: SpeechSettings,
		config: SessionConfig,
	) -> Self {
		Self {
			engine,
			inner: Arc::new(Mutex::new(Inner {
				state: PlaybackState::Idle,
				sentences: Arc::new(Vec::new()),
				index: 0,
				settings,
				voices: Vec::new(),
				epoch: 0,
				run_id: 0,
				in_flight: false,
				spoken: 0,
				errored: 0,
			})),
			listeners: Arc::new(ListenerRegistry::new()),
			config,
		}
	}

	/// Subscribes to one event kind. The callback runs synchronously on the
	/// emitting task.
	pub fn add_listener(
		&self,
		kind: EventKind,
		listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
	) -> ListenerId {
		self.listeners.add(kind, listener)
	}

	pub fn remove_listener(&self, id: ListenerId) -> bool {
		self.listeners.remove(id)
	}

	pub fn clear_listeners(&self) {
		self.listeners.clear();
	}

	/// Begins playback of `text` from `position` (sentence index, defaults
	/// to the first). An active run is stopped first. Errors when the text
	/// yields no sentences.
	pub async fn start(&self, text: &str, position: Option<usize>) -> Result<()> {
		let sentences = textproc::split_into_sentences(text);
		if sentences.is_empty() {
			return Err(ReadaloudError::EmptyContent);
		}
		if self.state().is_active() {
			self.stop();
		}

		let voices = match tokio::time::timeout(
			self.config.voice_wait_timeout,
			self.engine.voices(),
		)
		.await
		{
			Ok(voices) => voices,
			Err(_) => {
				warn!(target = "ra.session", "voice list unavailable, falling back to engine default");
				Vec::new()
			}
		};

		{
			let mut guard = self.inner.lock();
			guard.sentences = Arc::new(sentences);
			guard.voices = voices;
			guard.index = position.unwrap_or(0);
			guard.state = PlaybackState::Playing;
			guard.epoch += 1;
			guard.spoken = 0;
			guard.errored = 0;
		}
		self.listeners.emit(&SessionEvent::Start);
		self.spawn_playback();
		Ok(())
	}

	/// Freezes playback at the current sentence. No effect unless playing.
	pub fn pause(&self) {
		let position = {
			let mut guard = self.inner.lock();
			if guard.state != PlaybackState::Playing {
				return;
			}
			guard.state = PlaybackState::Paused;
			guard.index
		};
		self.engine.pause();
		self.listeners.emit(&SessionEvent::Pause { position });
	}

	/// Continues a paused run. When the engine has lost its pause state the
	/// current sentence is re-spoken from its beginning.
	pub fn resume(&self) {
		let (position, respawn) = {
			let mut guard = self.inner.lock();
			if guard.state != PlaybackState::Paused {
				return;
			}
			guard.state = PlaybackState::Playing;
			let position = guard.index;
			if guard.in_flight {
				// The frozen utterance is still pending inside the engine.
				if self.engine.resume() {
					(position, false)
				} else {
					guard.epoch += 1;
					self.engine.cancel();
					(position, false)
				}
			} else {
				self.engine.resume();
				(position, true)
			}
		};
		self.listeners.emit(&SessionEvent::Resume { position });
		if respawn {
			self.spawn_playback();
		}
	}

	/// Cancels playback and resets the position to the first sentence. Safe
	/// to call in any state, repeatedly.
	pub fn stop(&self) {
		{
			let mut guard = self.inner.lock();
			guard.state = PlaybackState::Stopped;
			guard.index = 0;
			guard.epoch += 1;
		}
		self.engine.cancel();
		self.listeners.emit(&SessionEvent::Stop);
	}

	/// Jumps to the given sentence index. Out-of-range indices are ignored.
	/// While playing, the current utterance is cancelled and playback
	/// continues from the new index; otherwise only the position moves.
	pub fn seek_to(&self, index: usize) {
		{
			let mut guard = self.inner.lock();
			if index >= guard.sentences.len() {
				return;
			}
			guard.index = index;
			guard.epoch += 1;
		}
		self.engine.cancel();
	}

	/// Advances one sentence, clamped to the last.
	pub fn next_sentence(&self) {
		let target = {
			let guard = self.inner.lock();
			match guard.index.checked_add(1) {
				Some(next) if next < guard.sentences.len() => next,
				_ => return,
			}
		};
		self.seek_to(target);
	}

	/// Steps back one sentence, clamped to the first.
	pub fn previous_sentence(&self) {
		let target = {
			let guard = self.inner.lock();
			match guard.index.checked_sub(1) {
				Some(prev) => prev,
				None => return,
			}
		};
		self.seek_to(target);
	}

	/// Replaces the speech settings. While playing, the current sentence is
	/// re-spoken so the new voice, rate and volume apply immediately.
	pub fn update_settings(&self, settings: SpeechSettings) {
		let cancel = {
			let mut guard = self.inner.lock();
			guard.settings = settings;
			if guard.state == PlaybackState::Playing && guard.in_flight {
				guard.epoch += 1;
				true
			} else {
				false
			}
		};
		if cancel {
			self.engine.cancel();
		}
	}

	pub fn settings(&self) -> SpeechSettings {
		self.inner.lock().settings.clone()
	}

	pub fn state(&self) -> PlaybackState {
		self.inner.lock().state
	}

	pub fn progress(&self) -> ProgressSnapshot {
		let guard = self.inner.lock();
		ProgressSnapshot::new(guard.index, guard.sentences.len())
	}

	pub fn current_index(&self) -> usize {
		self.inner.lock().index
	}

	pub fn sentence_count(&self) -> usize {
		self.inner.lock().sentences.len()
	}

	pub fn current_sentence(&self) -> Option<String> {
		let guard = self.inner.lock();
		guard.sentences.get(guard.index).cloned()
	}

	fn spawn_playback(&self) {
		let run_id = {
			let mut guard = self.inner.lock();
			guard.run_id += 1;
			guard.run_id
		};
		tokio::spawn(run_playback(
			Arc::clone(&self.engine),
			Arc::clone(&self.inner),
			Arc::clone(&self.listeners),
			self.config.clone(),
			run_id,
		));
	}
}

impl Drop for SpeechSession {
	/// Tears down silently: any running playback task is orphaned from the
	/// state it checks and exits, the engine stops speaking and listeners
	/// are released. No events are emitted for teardown.
	fn drop(&mut self) {
		{
			let mut guard = self.inner.lock();
			guard.state = PlaybackState::Stopped;
			guard.epoch += 1;
			guard.run_id += 1;
		}
		self.engine.cancel();
		self.listeners.clear();
	}
}

enum Step {
	/// A sentence completed; report it and pace before the next.
	Progress { index: usize, text: String },
	/// Busy engine; wait and re-dispatch the same sentence.
	Retry,
	/// State changed under us; re-read it at the top of the loop.
	Reread,
}

async fn run_playback(
	engine: Arc<dyn SpeechEngine>,
	inner: Arc<Mutex<Inner>>,
	listeners: Arc<ListenerRegistry>,
	config: SessionConfig,
	run_id: u64,
) {
	let mut retried_index: Option<usize> = None;
	loop {
		let (index, epoch, request) = {
			let mut guard = inner.lock();
			if guard.run_id != run_id || guard.state != PlaybackState::Playing {
				return;
			}
			if guard.index >= guard.sentences.len() {
				let errored = guard.errored;
				let failed = guard.spoken == 0 && errored > 0;
				guard.state = if failed { PlaybackState::Failed } else { PlaybackState::Idle };
				drop(guard);
				if failed {
					warn!(target = "ra.session", errored, "no sentence could be spoken");
					listeners.emit(&SessionEvent::Failed { errored });
				} else {
					listeners.emit(&SessionEvent::End);
				}
				return;
			}
			let index = guard.index;
			let text = guard.sentences[index].clone();
			let voice = select_voice(&guard.voices, &guard.settings.voice_name, &text);
			guard.in_flight = true;
			(
				index,
				guard.epoch,
				UtteranceRequest {
					text,
					voice,
					rate: guard.settings.rate,
					volume: guard.settings.volume,
					pitch: 1.0,
				},
			)
		};

		let text = request.text.clone();
		let outcome = engine.speak(request).await;

		let step = {
			let mut guard = inner.lock();
			guard.in_flight = false;
			if guard.run_id != run_id {
				return;
			}
			if guard.epoch != epoch {
				// Stop, seek, settings change or restart raced this
				// utterance; its outcome no longer matters.
				Step::Reread
			} else {
				match outcome {
					Ok(()) => {
						guard.index = index + 1;
						guard.spoken += 1;
						Step::Progress { index, text }
					}
					Err(EngineError::Cancelled) => Step::Reread,
					Err(EngineError::Busy) if retried_index != Some(index) => {
						retried_index = Some(index);
						Step::Retry
					}
					Err(err) => {
						guard.index = index + 1;
						guard.errored += 1;
						warn!(target = "ra.session", index, error = %err, "sentence skipped");
						Step::Reread
					}
				}
			}
		};

		match step {
			Step::Progress { index, text } => {
				listeners.emit(&SessionEvent::Progress { position: index, text });
				if !config.inter_sentence_delay.is_zero() {
					tokio::time::sleep(config.inter_sentence_delay).await;
				}
			}
			Step::Retry => {
				if !config.retry_backoff.is_zero() {
					tokio::time::sleep(config.retry_backoff).await;
				}
			}
			Step::Reread => {}
		}
	}
}

#[cfg(test)]
mod tests {
	use tokio::sync::mpsc;

	use super::*;

	fn test_config() -> SessionConfig {
		SessionConfig {
			inter_sentence_delay: Duration::ZERO,
			retry_backoff: Duration::ZERO,
			voice_wait_timeout: Duration::from_millis(50),
		}
	}

	fn session_with(engine: Arc<FakeEngine>) -> SpeechSession {
		SpeechSession::with_config(engine, SpeechSettings::default(), test_config())
	}

	fn collect_events(session: &SpeechSession) -> mpsc::UnboundedReceiver<SessionEvent> {
		let (tx, rx) = mpsc::unbounded_channel();
		for kind in [
			EventKind::Start,
			EventKind::Pause,
			EventKind::Resume,
			EventKind::Stop,
			EventKind::Progress,
			EventKind::End,
			EventKind::Failed,
		] {
			let tx = tx.clone();
			session.add_listener(kind, move |event| {
				let _ = tx.send(event.clone());
			});
		}
		rx
	}

	async fn wait_for_pending(engine: &FakeEngine) {
		for _ in 0..1000 {
			if engine.has_pending() {
				return;
			}
			tokio::task::yield_now().await;
		}
		panic!("engine never received an utterance");
	}

	#[tokio::test]
	async fn speaks_every_sentence_then_ends() {
		let engine = FakeEngineBuilder::new().build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("第一句。第二句！第三句？", None).await.unwrap();

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		for expected in 0..3 {
			match events.recv().await.unwrap() {
				SessionEvent::Progress { position, .. } => assert_eq!(position, expected),
				other => panic!("expected progress, got {other:?}"),
			}
		}
		assert_eq!(events.recv().await.unwrap(), SessionEvent::End);
		assert_eq!(session.state(), PlaybackState::Idle);
		assert_eq!(session.progress().percentage, 100);
		assert_eq!(engine.requests().len(), 3);
	}

	#[tokio::test]
	async fn empty_text_is_rejected() {
		let engine = FakeEngineBuilder::new().build();
		let session = session_with(engine);
		let result = session.start("   \n  ", None).await;
		assert!(matches!(result, Err(ReadaloudError::EmptyContent)));
		assert_eq!(session.state(), PlaybackState::Idle);
	}

	#[tokio::test]
	async fn start_position_skips_earlier_sentences() {
		let engine = FakeEngineBuilder::new().build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("第一句。第二句。第三句。", Some(2)).await.unwrap();

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		match events.recv().await.unwrap() {
			SessionEvent::Progress { position, .. } => assert_eq!(position, 2),
			other => panic!("expected progress, got {other:?}"),
		}
		assert_eq!(events.recv().await.unwrap(), SessionEvent::End);
		assert_eq!(engine.requests().len(), 1);
	}

	#[tokio::test]
	async fn busy_engine_gets_exactly_one_retry() {
		let engine = FakeEngineBuilder::new().outcome(Err(EngineError::Busy)).build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("只有一句。", None).await.unwrap();

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		match events.recv().await.unwrap() {
			SessionEvent::Progress { position, .. } => assert_eq!(position, 0),
			other => panic!("expected progress, got {other:?}"),
		}
		assert_eq!(events.recv().await.unwrap(), SessionEvent::End);
		let requests = engine.requests();
		assert_eq!(requests.len(), 2);
		assert_eq!(requests[0].text, requests[1].text);
	}

	#[tokio::test]
	async fn persistent_busy_skips_the_sentence() {
		let engine = FakeEngineBuilder::new()
			.outcome(Err(EngineError::Busy))
			.outcome(Err(EngineError::Busy))
			.build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("第一句。第二句。", None).await.unwrap();

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		// The first sentence never completes; the only progress is for the
		// second.
		match events.recv().await.unwrap() {
			SessionEvent::Progress { position, .. } => assert_eq!(position, 1),
			other => panic!("expected progress, got {other:?}"),
		}
		assert_eq!(events.recv().await.unwrap(), SessionEvent::End);
	}

	#[tokio::test]
	async fn all_sentences_failing_ends_in_failed_state() {
		let engine = FakeEngineBuilder::new()
			.outcome(Err(EngineError::Synthesis("no device".to_string())))
			.outcome(Err(EngineError::Synthesis("no device".to_string())))
			.build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("第一句。第二句。", None).await.unwrap();

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		assert_eq!(events.recv().await.unwrap(), SessionEvent::Failed { errored: 2 });
		assert_eq!(session.state(), PlaybackState::Failed);
	}

	#[tokio::test]
	async fn failed_sentence_is_skipped_when_others_speak() {
		let engine = FakeEngineBuilder::new()
			.outcome(Err(EngineError::Synthesis("glitch".to_string())))
			.build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("第一句。第二句。", None).await.unwrap();

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		match events.recv().await.unwrap() {
			SessionEvent::Progress { position, .. } => assert_eq!(position, 1),
			other => panic!("expected progress, got {other:?}"),
		}
		assert_eq!(events.recv().await.unwrap(), SessionEvent::End);
		assert_eq!(session.state(), PlaybackState::Idle);
	}

	#[tokio::test]
	async fn pause_and_resume_in_place() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("第一句。第二句。", None).await.unwrap();
		wait_for_pending(&engine).await;

		session.pause();
		assert_eq!(session.state(), PlaybackState::Paused);
		assert!(engine.is_paused());

		session.resume();
		assert_eq!(session.state(), PlaybackState::Playing);

		engine.finish_utterance();
		wait_for_pending(&engine).await;
		engine.finish_utterance();

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		assert_eq!(events.recv().await.unwrap(), SessionEvent::Pause { position: 0 });
		assert_eq!(events.recv().await.unwrap(), SessionEvent::Resume { position: 0 });
		match events.recv().await.unwrap() {
			SessionEvent::Progress { position, .. } => assert_eq!(position, 0),
			other => panic!("expected progress, got {other:?}"),
		}
		match events.recv().await.unwrap() {
			SessionEvent::Progress { position, .. } => assert_eq!(position, 1),
			other => panic!("expected progress, got {other:?}"),
		}
		assert_eq!(events.recv().await.unwrap(), SessionEvent::End);
	}

	#[tokio::test]
	async fn lost_pause_state_respeaks_the_sentence() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));

		session.start("只有一句。", None).await.unwrap();
		wait_for_pending(&engine).await;

		session.pause();
		engine.set_pause_lost(true);
		session.resume();

		// The frozen utterance was cancelled and the sentence dispatched
		// again from its beginning.
		wait_for_pending(&engine).await;
		let requests = engine.requests();
		assert_eq!(requests.len(), 2);
		assert_eq!(requests[0].text, requests[1].text);
		engine.finish_utterance();
	}

	#[tokio::test]
	async fn pause_when_not_playing_is_ignored() {
		let engine = FakeEngineBuilder::new().build();
		let session = session_with(engine);
		session.pause();
		assert_eq!(session.state(), PlaybackState::Idle);
		session.resume();
		assert_eq!(session.state(), PlaybackState::Idle);
	}

	#[tokio::test]
	async fn stop_is_safe_to_repeat() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("第一句。第二句。", None).await.unwrap();
		wait_for_pending(&engine).await;

		session.stop();
		session.stop();
		assert_eq!(session.state(), PlaybackState::Stopped);
		assert_eq!(session.current_index(), 0);

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		assert_eq!(events.recv().await.unwrap(), SessionEvent::Stop);
		assert_eq!(events.recv().await.unwrap(), SessionEvent::Stop);
	}

	#[tokio::test]
	async fn seek_while_playing_jumps_to_the_new_sentence() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("第一句。第二句。第三句。", None).await.unwrap();
		wait_for_pending(&engine).await;

		session.seek_to(2);
		wait_for_pending(&engine).await;
		engine.finish_utterance();

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		match events.recv().await.unwrap() {
			SessionEvent::Progress { position, .. } => assert_eq!(position, 2),
			other => panic!("expected progress, got {other:?}"),
		}
		assert_eq!(events.recv().await.unwrap(), SessionEvent::End);
	}

	#[tokio::test]
	async fn out_of_range_seek_is_a_no_op() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));

		session.start("第一句。第二句。", None).await.unwrap();
		wait_for_pending(&engine).await;

		session.seek_to(5);
		assert_eq!(session.current_index(), 0);
		assert_eq!(session.state(), PlaybackState::Playing);
		session.stop();
	}

	#[tokio::test]
	async fn seek_while_stopped_only_moves_the_position() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));

		session.start("第一句。第二句。第三句。", None).await.unwrap();
		wait_for_pending(&engine).await;
		session.stop();

		session.seek_to(1);
		assert_eq!(session.current_index(), 1);
		assert_eq!(session.state(), PlaybackState::Stopped);
	}

	#[tokio::test]
	async fn sentence_stepping_clamps_at_both_ends() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));

		session.start("第一句。第二句。", None).await.unwrap();
		wait_for_pending(&engine).await;
		session.stop();

		session.previous_sentence();
		assert_eq!(session.current_index(), 0);
		session.next_sentence();
		assert_eq!(session.current_index(), 1);
		session.next_sentence();
		assert_eq!(session.current_index(), 1);
	}

	#[tokio::test]
	async fn settings_change_respeaks_the_current_sentence() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));

		session.start("只有一句。", None).await.unwrap();
		wait_for_pending(&engine).await;

		session.update_settings(SpeechSettings {
			voice_name: String::new(),
			rate: 1.5,
			volume: 0.5,
		});
		wait_for_pending(&engine).await;

		let requests = engine.requests();
		assert_eq!(requests.len(), 2);
		assert_eq!(requests[0].rate, 1.0);
		assert_eq!(requests[1].rate, 1.5);
		assert_eq!(requests[1].volume, 0.5);
		engine.finish_utterance();
	}

	#[tokio::test]
	async fn restart_replaces_the_previous_run() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("旧的内容一句。", None).await.unwrap();
		wait_for_pending(&engine).await;

		session.start("新的内容一句。", None).await.unwrap();
		wait_for_pending(&engine).await;
		engine.finish_utterance();

		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		assert_eq!(events.recv().await.unwrap(), SessionEvent::Stop);
		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);
		match events.recv().await.unwrap() {
			SessionEvent::Progress { text, .. } => assert_eq!(text, "新的内容一句"),
			other => panic!("expected progress, got {other:?}"),
		}
		assert_eq!(events.recv().await.unwrap(), SessionEvent::End);
	}

	#[tokio::test]
	async fn dropping_the_session_cancels_silently() {
		let engine = FakeEngineBuilder::new().manual().build();
		let session = session_with(Arc::clone(&engine));
		let mut events = collect_events(&session);

		session.start("第一句。第二句。", None).await.unwrap();
		wait_for_pending(&engine).await;
		assert_eq!(events.recv().await.unwrap(), SessionEvent::Start);

		let cancels_before = engine.cancel_count();
		drop(session);
		assert!(engine.cancel_count() > cancels_before);
		assert!(!engine.has_pending());
		assert!(events.try_recv().is_err(), "teardown emits no events");
	}
}
