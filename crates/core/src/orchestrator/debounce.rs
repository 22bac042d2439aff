//! Single-slot debouncer for mutation-triggered re-detection.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Holds at most one scheduled job; scheduling again aborts the previous
/// one, so a burst of triggers runs the work once, after the last trigger.
pub(crate) struct Debouncer {
	delay: Duration,
	pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
	pub(crate) fn new(delay: Duration) -> Self {
		Self { delay, pending: Mutex::new(None) }
	}

	pub(crate) fn schedule(&self, work: impl FnOnce() + Send + 'static) {
		let mut pending = self.pending.lock();
		if let Some(handle) = pending.take() {
			handle.abort();
		}
		let delay = self.delay;
		*pending = Some(tokio::spawn(async move {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}
			work();
		}));
	}

	pub(crate) fn cancel(&self) {
		if let Some(handle) = self.pending.lock().take() {
			handle.abort();
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[tokio::test]
	async fn rescheduling_replaces_the_pending_job() {
		let debouncer = Debouncer::new(Duration::from_millis(20));
		let runs = Arc::new(AtomicUsize::new(0));
		for _ in 0..5 {
			let runs = Arc::clone(&runs);
			debouncer.schedule(move || {
				runs.fetch_add(1, Ordering::SeqCst);
			});
		}
		tokio::time::sleep(Duration::from_millis(60)).await;
		assert_eq!(runs.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn cancel_drops_the_pending_job() {
		let debouncer = Debouncer::new(Duration::from_millis(20));
		let runs = Arc::new(AtomicUsize::new(0));
		{
			let runs = Arc::clone(&runs);
			debouncer.schedule(move || {
				runs.fetch_add(1, Ordering::SeqCst);
			});
		}
		debouncer.cancel();
		tokio::time::sleep(Duration::from_millis(60)).await;
		assert_eq!(runs.load(Ordering::SeqCst), 0);
	}
}
