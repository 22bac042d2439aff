//! Session lifecycle events and the listener registry.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

/// What the session just did. Every state transition and every finished
/// sentence surfaces as exactly one event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
	/// Playback began from the configured start position.
	Start,
	/// Playback froze at the given sentence index.
	Pause { position: usize },
	/// Playback continued at the given sentence index.
	Resume { position: usize },
	/// Playback was stopped and the position reset.
	Stop,
	/// A sentence finished speaking. `position` is the index of the sentence
	/// that just completed, counted from zero.
	Progress { position: usize, text: String },
	/// The last sentence finished and the session returned to idle.
	End,
	/// Every attempted sentence errored; nothing was spoken.
	Failed { errored: usize },
}

impl SessionEvent {
	pub fn kind(&self) -> EventKind {
		match self {
			SessionEvent::Start => EventKind::Start,
			SessionEvent::Pause { .. } => EventKind::Pause,
			SessionEvent::Resume { .. } => EventKind::Resume,
			SessionEvent::Stop => EventKind::Stop,
			SessionEvent::Progress { .. } => EventKind::Progress,
			SessionEvent::End => EventKind::End,
			SessionEvent::Failed { .. } => EventKind::Failed,
		}
	}
}

/// Event discriminant used when subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	Start,
	Pause,
	Resume,
	Stop,
	Progress,
	End,
	Failed,
}

/// Handle returned by `add_listener`, used to unsubscribe.
pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Listener table shared between the session handle and its playback task.
///
/// Listeners are invoked synchronously in subscription order with the
/// registry lock released, so a listener may re-enter the session or the
/// registry. A panicking listener is logged and does not disturb the others.
pub(crate) struct ListenerRegistry {
	entries: Mutex<RegistryState>,
}

struct RegistryState {
	next_id: ListenerId,
	listeners: Vec<(ListenerId, EventKind, Listener)>,
}

impl ListenerRegistry {
	pub(crate) fn new() -> Self {
		Self {
			entries: Mutex::new(RegistryState { next_id: 0, listeners: Vec::new() }),
		}
	}

	pub(crate) fn add(
		&self,
		kind: EventKind,
		listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
	) -> ListenerId {
		let mut state = self.entries.lock();
		let id = state.next_id;
		state.next_id += 1;
		state.listeners.push((id, kind, Arc::new(listener)));
		id
	}

	/// Removes a listener. Unknown ids are ignored.
	pub(crate) fn remove(&self, id: ListenerId) -> bool {
		let mut state = self.entries.lock();
		let before = state.listeners.len();
		state.listeners.retain(|(entry_id, _, _)| *entry_id != id);
		state.listeners.len() != before
	}

	pub(crate) fn clear(&self) {
		self.entries.lock().listeners.clear();
	}

	pub(crate) fn emit(&self, event: &SessionEvent) {
		let kind = event.kind();
		let matching: Vec<Listener> = {
			let state = self.entries.lock();
			state
				.listeners
				.iter()
				.filter(|(_, entry_kind, _)| *entry_kind == kind)
				.map(|(_, _, listener)| Arc::clone(listener))
				.collect()
		};
		for listener in matching {
			if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
				warn!(target = "ra.session", ?kind, "event listener panicked");
			}
		}
	}
}
