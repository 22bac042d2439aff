//! Per-page wiring of detector, session and stores.
//!
//! One [`PageOrchestrator`] lives for the lifetime of a page. It owns the
//! detection state and at most one speech session, relays UI commands,
//! persists reading progress as playback advances and re-runs detection
//! (debounced) when the host reports large content mutations.

mod debounce;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use readaloud_protocol::{
	Command, CommandResponse, DetectionSummary, ProgressSnapshot, ReadingStatus, ResponseData,
	UserSettings, UserSettingsPatch,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::detector::{ContentDetector, DetectionResult};
use crate::dom::Document;
use crate::error::Result;
use crate::session::{
	EventKind, PlaybackState, SessionConfig, SessionEvent, SpeechEngine, SpeechSession,
};
use crate::store::{KvStore, ProgressRepository, SettingsRepository};
use crate::textproc;

use debounce::Debouncer;

/// Thresholds for mutation handling and progress persistence.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
	/// Quiet period after the last qualifying mutation before re-detection.
	pub mutation_debounce: Duration,
	/// Mutations adding at most this many characters are ignored.
	pub mutation_min_chars: usize,
	/// Persist progress after every Nth finished sentence.
	pub persist_every: usize,
	pub session: SessionConfig,
}

impl Default for OrchestratorConfig {
	fn default() -> Self {
		Self {
			mutation_debounce: Duration::from_secs(1),
			mutation_min_chars: 100,
			persist_every: 10,
			session: SessionConfig::default(),
		}
	}
}

#[derive(Default)]
struct PageMeta {
	url: String,
	title: String,
}

impl PageMeta {
	/// Title recorded with saved progress. Pages without a detected
	/// chapter title fall back to their URL.
	fn persist_title(&self) -> String {
		if self.title.is_empty() { self.url.clone() } else { self.title.clone() }
	}
}

type PersistRequest = (String, usize, String);

struct OrchestratorInner {
	engine: Arc<dyn SpeechEngine>,
	detector: Mutex<ContentDetector>,
	settings_repo: SettingsRepository,
	progress_repo: Arc<ProgressRepository>,
	settings: Mutex<UserSettings>,
	document: Mutex<Option<Document>>,
	detection: Mutex<Option<DetectionResult>>,
	session: Mutex<Option<Arc<SpeechSession>>>,
	meta: Arc<Mutex<PageMeta>>,
	debouncer: Debouncer,
	config: OrchestratorConfig,
}

/// Command surface for one page. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct PageOrchestrator {
	inner: Arc<OrchestratorInner>,
}

impl PageOrchestrator {
	pub fn new(engine: Arc<dyn SpeechEngine>, store: Arc<dyn KvStore>) -> Self {
		Self::with_config(engine, store, OrchestratorConfig::default())
	}

	pub fn with_config(
		engine: Arc<dyn SpeechEngine>,
		store: Arc<dyn KvStore>,
		config: OrchestratorConfig,
	) -> Self {
		Self {
			inner: Arc::new(OrchestratorInner {
				engine,
				detector: Mutex::new(ContentDetector::new()),
				settings_repo: SettingsRepository::new(Arc::clone(&store)),
				progress_repo: Arc::new(ProgressRepository::new(store)),
				settings: Mutex::new(UserSettings::default()),
				document: Mutex::new(None),
				detection: Mutex::new(None),
				session: Mutex::new(None),
				meta: Arc::new(Mutex::new(PageMeta::default())),
				debouncer: Debouncer::new(config.mutation_debounce),
				config,
			}),
		}
	}

	/// Loads persisted settings and site rules. Call once before use.
	pub async fn initialize(&self) -> Result<()> {
		let settings = self.inner.settings_repo.load().await?;
		let rules = self.inner.settings_repo.site_rules().await?;
		self.inner.detector.lock().update_site_rules(rules);
		*self.inner.settings.lock() = settings;
		info!(target = "ra.orchestrator", "initialized");
		Ok(())
	}

	/// Installs a fresh page snapshot, dropping any previous detection
	/// result. Runs detection immediately when auto-detect is on.
	pub fn set_document(&self, doc: Document) {
		self.inner.meta.lock().url = doc.url().unwrap_or_default().to_string();
		*self.inner.document.lock() = Some(doc);
		*self.inner.detection.lock() = None;
		if self.inner.settings.lock().auto_detect {
			self.detect_now();
		}
	}

	/// Replaces the snapshot after a DOM mutation. Re-detection is scheduled
	/// only for mutations that add more than the configured character count,
	/// and only while auto-detect is on; bursts collapse into one pass.
	pub fn notify_mutation(&self, doc: Document, added_text_length: usize) {
		*self.inner.document.lock() = Some(doc);
		if added_text_length <= self.inner.config.mutation_min_chars {
			return;
		}
		if !self.inner.settings.lock().auto_detect {
			return;
		}
		let this = self.clone();
		self.inner.debouncer.schedule(move || {
			this.detect_now();
		});
	}

	/// The cached detection result, if a pass has run for this snapshot.
	pub fn detection(&self) -> Option<DetectionResult> {
		self.inner.detection.lock().clone()
	}

	pub fn settings(&self) -> UserSettings {
		self.inner.settings.lock().clone()
	}

	/// The speech session, once one has been created by `START_READING`.
	pub fn session(&self) -> Option<Arc<SpeechSession>> {
		self.inner.session.lock().clone()
	}

	/// Dispatches one UI command. Failures are reported in the response,
	/// never as a panic or an `Err`.
	pub async fn handle_command(&self, command: Command) -> CommandResponse {
		debug!(target = "ra.orchestrator", ?command, "command");
		match command {
			Command::DetectContent => match self.detect_now() {
				Some(result) => {
					let sentences = if result.is_novel {
						textproc::split_into_sentences(&result.content).len()
					} else {
						0
					};
					CommandResponse::with_data(ResponseData::Detection(DetectionSummary {
						detected: result.is_novel,
						content_length: result.content.chars().count(),
						sentences,
					}))
				}
				None => CommandResponse::failure("no document snapshot"),
			},
			Command::StartReading { position } => self.start_reading(position).await,
			Command::PauseReading => match self.session() {
				Some(session) => {
					session.pause();
					CommandResponse::ok()
				}
				None => CommandResponse::failure("no active reading session"),
			},
			Command::ResumeReading => match self.session() {
				Some(session) => {
					session.resume();
					CommandResponse::ok()
				}
				None => CommandResponse::failure("no active reading session"),
			},
			Command::StopReading => match self.session() {
				Some(session) => {
					session.stop();
					CommandResponse::ok()
				}
				None => CommandResponse::failure("no active reading session"),
			},
			Command::GetReadingState | Command::GetStatus => self.status(),
			Command::UpdateSettings(patch) => self.update_settings(patch).await,
		}
	}

	fn detect_now(&self) -> Option<DetectionResult> {
		let result = {
			let doc = self.inner.document.lock();
			let doc = doc.as_ref()?;
			self.inner.detector.lock().detect(doc)
		};
		info!(
			target = "ra.orchestrator",
			detected = result.is_novel,
			confidence = result.confidence,
			"detection pass"
		);
		self.inner.meta.lock().title = result.title.clone().unwrap_or_default();
		*self.inner.detection.lock() = Some(result.clone());
		Some(result)
	}

	async fn start_reading(&self, position: Option<usize>) -> CommandResponse {
		let cached = self.inner.detection.lock().clone();
		let detection = match cached {
			Some(result) => Some(result),
			None => self.detect_now(),
		};
		let Some(detection) = detection.filter(|d| d.is_novel) else {
			return CommandResponse::failure("no readable content detected");
		};

		let sentence_count = textproc::split_into_sentences(&detection.content).len();
		let position = match position {
			Some(explicit) => Some(explicit),
			None => self.restored_position(sentence_count).await,
		};

		let session = self.ensure_session();
		session.update_settings(self.inner.settings.lock().speech());
		match session.start(&detection.content, position).await {
			Ok(()) => CommandResponse::ok(),
			Err(err) => CommandResponse::failure(err.to_string()),
		}
	}

	/// Saved position for the current URL, if one exists and still points
	/// inside the content.
	async fn restored_position(&self, sentence_count: usize) -> Option<usize> {
		let url = self.inner.meta.lock().url.clone();
		if url.is_empty() {
			return None;
		}
		match self.inner.progress_repo.load(&url).await {
			Ok(Some(saved)) if saved.position > 0 && saved.position < sentence_count => {
				info!(
					target = "ra.orchestrator",
					position = saved.position,
					"restoring saved reading position"
				);
				Some(saved.position)
			}
			Ok(_) => None,
			Err(err) => {
				warn!(target = "ra.orchestrator", error = %err, "progress lookup failed");
				None
			}
		}
	}

	fn status(&self) -> CommandResponse {
		let session = self.session();
		let (state, progress) = match &session {
			Some(session) => (session.state(), session.progress()),
			None => (PlaybackState::Idle, ProgressSnapshot::new(0, 0)),
		};
		let has_content = self
			.inner
			.detection
			.lock()
			.as_ref()
			.is_some_and(|d| d.is_novel);
		CommandResponse::with_data(ResponseData::Status(ReadingStatus {
			is_reading: state == PlaybackState::Playing,
			is_paused: state == PlaybackState::Paused,
			has_content,
			progress,
		}))
	}

	async fn update_settings(&self, patch: UserSettingsPatch) -> CommandResponse {
		match self.inner.settings_repo.update(&patch).await {
			Ok(merged) => {
				let speech = merged.speech();
				let auto_detect = merged.auto_detect;
				*self.inner.settings.lock() = merged;
				if !auto_detect {
					self.inner.debouncer.cancel();
				}
				if let Some(session) = self.session() {
					session.update_settings(speech);
				}
				CommandResponse::ok()
			}
			Err(err) => CommandResponse::failure(err.to_string()),
		}
	}

	/// Returns the page's single session, creating it and wiring progress
	/// persistence on first use.
	fn ensure_session(&self) -> Arc<SpeechSession> {
		let mut slot = self.inner.session.lock();
		if let Some(session) = slot.as_ref() {
			return Arc::clone(session);
		}

		let session = Arc::new(SpeechSession::with_config(
			Arc::clone(&self.inner.engine),
			self.inner.settings.lock().speech(),
			self.inner.config.session.clone(),
		));

		// Writes go through a channel so the sync listeners never touch the
		// async store directly.
		let (tx, mut rx) = mpsc::unbounded_channel::<PersistRequest>();
		let progress_repo = Arc::clone(&self.inner.progress_repo);
		tokio::spawn(async move {
			while let Some((url, position, title)) = rx.recv().await {
				if let Err(err) = progress_repo.save_position(&url, position, &title).await {
					warn!(target = "ra.orchestrator", error = %err, "failed to persist progress");
				}
			}
		});

		// Pause keeps the current sentence so resume lands where it left off.
		{
			let tx = tx.clone();
			let meta = Arc::clone(&self.inner.meta);
			session.add_listener(EventKind::Pause, move |event| {
				if let SessionEvent::Pause { position } = event {
					let meta = meta.lock();
					let _ = tx.send((meta.url.clone(), *position, meta.persist_title()));
				}
			});
		}
		// Stop and a completed run both reset the saved position.
		for kind in [EventKind::Stop, EventKind::End] {
			let tx = tx.clone();
			let meta = Arc::clone(&self.inner.meta);
			session.add_listener(kind, move |_| {
				let meta = meta.lock();
				let _ = tx.send((meta.url.clone(), 0, meta.persist_title()));
			});
		}
		// Periodic checkpoint: after every Nth finished sentence, save the
		// next unread index.
		{
			let persist_every = self.inner.config.persist_every.max(1);
			let meta = Arc::clone(&self.inner.meta);
			session.add_listener(EventKind::Progress, move |event| {
				if let SessionEvent::Progress { position, .. } = event {
					let next = position + 1;
					if next % persist_every == 0 {
						let meta = meta.lock();
						let _ = tx.send((meta.url.clone(), next, meta.persist_title()));
					}
				}
			});
		}

		*slot = Some(Arc::clone(&session));
		session
	}
}
