//! Key-value persistence seam.
//!
//! The host supplies whatever durable storage it has (extension storage, a
//! file, a database) behind [`KvStore`]; the repositories in this module put
//! typed settings and progress records on top of it. [`MemoryStore`] backs
//! tests and ephemeral hosts.

mod repository;

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Result;

pub use repository::{ProgressRepository, SettingsRepository};

/// Flat JSON key-value storage.
#[async_trait]
pub trait KvStore: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<Value>>;
	async fn set(&self, key: &str, value: Value) -> Result<()>;
	async fn remove(&self, key: &str) -> Result<()>;
	async fn clear(&self) -> Result<()>;
}

/// In-memory [`KvStore`]. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
	entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

#[async_trait]
impl KvStore for MemoryStore {
	async fn get(&self, key: &str) -> Result<Option<Value>> {
		Ok(self.entries.lock().get(key).cloned())
	}

	async fn set(&self, key: &str, value: Value) -> Result<()> {
		self.entries.lock().insert(key.to_string(), value);
		Ok(())
	}

	async fn remove(&self, key: &str) -> Result<()> {
		self.entries.lock().remove(key);
		Ok(())
	}

	async fn clear(&self) -> Result<()> {
		self.entries.lock().clear();
		Ok(())
	}
}
