//! Voice selection against the engine's reported voice list.

use readaloud_protocol::VoiceDescriptor;

use crate::textproc;

/// Picks the voice for a sentence.
///
/// An exact match on the user's preferred name wins. Otherwise the content
/// language decides: mostly-CJK text prefers a Chinese voice, anything else
/// an English one. `None` leaves the choice to the engine default.
pub(crate) fn select_voice(
	voices: &[VoiceDescriptor],
	preferred: &str,
	sample: &str,
) -> Option<String> {
	if !preferred.is_empty() {
		if let Some(voice) = voices.iter().find(|v| v.name == preferred) {
			return Some(voice.name.clone());
		}
	}

	let wants_chinese = textproc::cjk_ratio(sample) > 0.5;
	let prefix = if wants_chinese { "zh" } else { "en" };
	voices
		.iter()
		.find(|v| {
			v.lang.starts_with(prefix) || (wants_chinese && v.name.contains("中文"))
		})
		.map(|v| v.name.clone())
}
