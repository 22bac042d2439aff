//! Detection and read-aloud engine for long-form narrative pages.
//!
//! The crate is organized leaf to root:
//!
//! * [`textproc`] - stateless text utilities (cleaning, sentence
//!   segmentation, chapter-title matching, admission gating).
//! * [`dom`] - a small arena document model with a forgiving HTML parser,
//!   used so detection can score and clone element subtrees without ever
//!   touching a live page.
//! * [`detector`] - the heuristic content detector: per-domain rule lookup
//!   first, generic candidate scoring second.
//! * [`session`] - the sentence-sequenced speech playback state machine over
//!   an external [`session::SpeechEngine`].
//! * [`store`] - async key-value seam plus typed settings/progress
//!   repositories.
//! * [`orchestrator`] - per-page wiring: command dispatch, progress
//!   persistence, debounced re-detection.

pub mod detector;
pub mod dom;
pub mod error;
pub mod orchestrator;
pub mod session;
pub mod store;
pub mod textproc;

pub use detector::{ContentDetector, DetectionResult};
pub use error::{ReadaloudError, Result};
pub use orchestrator::PageOrchestrator;
pub use session::{PlaybackState, SessionEvent, SpeechEngine, SpeechSession};
pub use store::{KvStore, MemoryStore, ProgressRepository, SettingsRepository};
