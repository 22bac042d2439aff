//! Typed repositories over the raw key-value store.

use std::sync::Arc;

use chrono::Utc;
use readaloud_protocol::{ReadingProgress, SiteRule, UserSettings, UserSettingsPatch};
use tracing::warn;

use crate::error::{ReadaloudError, Result};

use super::KvStore;

const USER_SETTINGS_KEY: &str = "userSettings";
const SITE_RULES_KEY: &str = "siteRules";

/// User settings and per-site rules.
pub struct SettingsRepository {
	store: Arc<dyn KvStore>,
}

impl SettingsRepository {
	pub fn new(store: Arc<dyn KvStore>) -> Self {
		Self { store }
	}

	/// Loads settings, falling back to the defaults when nothing is stored
	/// or the stored value is unreadable.
	pub async fn load(&self) -> Result<UserSettings> {
		let Some(value) = self.store.get(USER_SETTINGS_KEY).await? else {
			return Ok(UserSettings::default());
		};
		match serde_json::from_value(value) {
			Ok(settings) => Ok(settings),
			Err(err) => {
				warn!(target = "ra.store", error = %err, "stored settings unreadable, using defaults");
				Ok(UserSettings::default())
			}
		}
	}

	/// Validates and persists the full settings record. Out-of-range values
	/// are rejected, never clamped.
	pub async fn save(&self, settings: &UserSettings) -> Result<()> {
		validate(settings)?;
		self.store
			.set(USER_SETTINGS_KEY, serde_json::to_value(settings)?)
			.await
	}

	/// Applies a partial update on top of the stored settings and persists
	/// the merge. Returns the merged record.
	pub async fn update(&self, patch: &UserSettingsPatch) -> Result<UserSettings> {
		let merged = patch.apply(&self.load().await?);
		self.save(&merged).await?;
		Ok(merged)
	}

	/// Restores the defaults.
	pub async fn reset(&self) -> Result<UserSettings> {
		let defaults = UserSettings::default();
		self.save(&defaults).await?;
		Ok(defaults)
	}

	/// User-added site rules, in stored order. Missing or unreadable data
	/// yields an empty list.
	pub async fn site_rules(&self) -> Result<Vec<SiteRule>> {
		let Some(value) = self.store.get(SITE_RULES_KEY).await? else {
			return Ok(Vec::new());
		};
		match serde_json::from_value(value) {
			Ok(rules) => Ok(rules),
			Err(err) => {
				warn!(target = "ra.store", error = %err, "stored site rules unreadable, ignoring");
				Ok(Vec::new())
			}
		}
	}

	pub async fn save_site_rules(&self, rules: &[SiteRule]) -> Result<()> {
		self.store
			.set(SITE_RULES_KEY, serde_json::to_value(rules)?)
			.await
	}
}

fn validate(settings: &UserSettings) -> Result<()> {
	if !(0.5..=2.0).contains(&settings.speech_rate) {
		return Err(ReadaloudError::InvalidSettings(format!(
			"speech rate {} outside 0.5..=2.0",
			settings.speech_rate
		)));
	}
	if !(0.0..=1.0).contains(&settings.volume) {
		return Err(ReadaloudError::InvalidSettings(format!(
			"volume {} outside 0.0..=1.0",
			settings.volume
		)));
	}
	Ok(())
}

/// Per-page reading positions, keyed by URL.
pub struct ProgressRepository {
	store: Arc<dyn KvStore>,
}

impl ProgressRepository {
	pub fn new(store: Arc<dyn KvStore>) -> Self {
		Self { store }
	}

	fn key(url: &str) -> String {
		format!("progress_{url}")
	}

	pub async fn load(&self, url: &str) -> Result<Option<ReadingProgress>> {
		let Some(value) = self.store.get(&Self::key(url)).await? else {
			return Ok(None);
		};
		match serde_json::from_value(value) {
			Ok(progress) => Ok(Some(progress)),
			Err(err) => {
				warn!(target = "ra.store", url, error = %err, "stored progress unreadable, ignoring");
				Ok(None)
			}
		}
	}

	pub async fn save(&self, progress: &ReadingProgress) -> Result<()> {
		self.store
			.set(&Self::key(&progress.url), serde_json::to_value(progress)?)
			.await
	}

	/// Records the given sentence position for a URL, stamped with the
	/// current time.
	pub async fn save_position(&self, url: &str, position: usize, title: &str) -> Result<()> {
		self.save(&ReadingProgress {
			url: url.to_string(),
			position,
			timestamp: Utc::now(),
			title: title.to_string(),
		})
		.await
	}

	pub async fn clear(&self, url: &str) -> Result<()> {
		self.store.remove(&Self::key(url)).await
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use crate::store::MemoryStore;

	use super::*;

	fn repos() -> (Arc<MemoryStore>, SettingsRepository, ProgressRepository) {
		let store = Arc::new(MemoryStore::new());
		let settings = SettingsRepository::new(Arc::clone(&store) as Arc<dyn KvStore>);
		let progress = ProgressRepository::new(Arc::clone(&store) as Arc<dyn KvStore>);
		(store, settings, progress)
	}

	#[tokio::test]
	async fn load_returns_defaults_when_empty() {
		let (_, settings, _) = repos();
		let loaded = settings.load().await.unwrap();
		assert_eq!(loaded, UserSettings::default());
	}

	#[tokio::test]
	async fn save_then_load_round_trips() {
		let (_, settings, _) = repos();
		let mut record = UserSettings::default();
		record.speech_rate = 1.5;
		record.auto_detect = false;
		settings.save(&record).await.unwrap();
		assert_eq!(settings.load().await.unwrap(), record);
	}

	#[tokio::test]
	async fn out_of_range_rate_is_rejected_and_store_untouched() {
		let (_, settings, _) = repos();
		let saved = UserSettings::default();
		settings.save(&saved).await.unwrap();

		let mut bad = saved.clone();
		bad.speech_rate = 3.0;
		let err = settings.save(&bad).await.unwrap_err();
		assert!(matches!(err, ReadaloudError::InvalidSettings(_)));
		assert_eq!(settings.load().await.unwrap(), saved);
	}

	#[tokio::test]
	async fn out_of_range_volume_is_rejected() {
		let (_, settings, _) = repos();
		let mut bad = UserSettings::default();
		bad.volume = 1.2;
		assert!(settings.save(&bad).await.is_err());
	}

	#[tokio::test]
	async fn update_merges_partial_fields() {
		let (_, settings, _) = repos();
		let patch = UserSettingsPatch {
			speech_rate: Some(0.8),
			..UserSettingsPatch::default()
		};
		let merged = settings.update(&patch).await.unwrap();
		assert_eq!(merged.speech_rate, 0.8);
		assert_eq!(merged.volume, UserSettings::default().volume);
		assert_eq!(settings.load().await.unwrap(), merged);
	}

	#[tokio::test]
	async fn reset_restores_defaults() {
		let (_, settings, _) = repos();
		let patch = UserSettingsPatch {
			volume: Some(0.1),
			..UserSettingsPatch::default()
		};
		settings.update(&patch).await.unwrap();
		let restored = settings.reset().await.unwrap();
		assert_eq!(restored, UserSettings::default());
		assert_eq!(settings.load().await.unwrap(), UserSettings::default());
	}

	#[tokio::test]
	async fn corrupt_settings_fall_back_to_defaults() {
		let (store, settings, _) = repos();
		store.set("userSettings", json!("not an object")).await.unwrap();
		assert_eq!(settings.load().await.unwrap(), UserSettings::default());
	}

	#[tokio::test]
	async fn site_rules_default_to_empty() {
		let (_, settings, _) = repos();
		assert!(settings.site_rules().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn site_rules_round_trip() {
		let (_, settings, _) = repos();
		let rules = vec![SiteRule {
			domain: "example.com".to_string(),
			title_selector: "h1".to_string(),
			content_selector: ".chapter".to_string(),
			enabled: true,
		}];
		settings.save_site_rules(&rules).await.unwrap();
		assert_eq!(settings.site_rules().await.unwrap(), rules);
	}

	#[tokio::test]
	async fn progress_is_keyed_by_url() {
		let (_, _, progress) = repos();
		progress.save_position("https://a.example/1", 7, "第一章").await.unwrap();
		progress.save_position("https://a.example/2", 3, "").await.unwrap();

		let first = progress.load("https://a.example/1").await.unwrap().unwrap();
		assert_eq!(first.position, 7);
		assert_eq!(first.title, "第一章");
		assert_eq!(
			progress.load("https://a.example/2").await.unwrap().unwrap().position,
			3
		);
		assert!(progress.load("https://a.example/3").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn clear_removes_the_record() {
		let (_, _, progress) = repos();
		progress.save_position("https://a.example/1", 2, "").await.unwrap();
		progress.clear("https://a.example/1").await.unwrap();
		assert!(progress.load("https://a.example/1").await.unwrap().is_none());
	}
}
