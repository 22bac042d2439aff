//! Stateless text utilities shared by detection and playback.
//!
//! Everything here is a pure function over `&str`; the detector and the
//! speech session layer their heuristics on top of these.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Chapter-heading patterns, tried in order; the first full match wins.
static CHAPTER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	[
		r"第[一二三四五六七八九十百千万\d]+章\s*[^\n\r。！？]*",
		r"第[一二三四五六七八九十百千万\d]+节\s*[^\n\r。！？]*",
		r"序章\s*[^\n\r。！？]*",
		r"楔子\s*[^\n\r。！？]*",
		r"终章\s*[^\n\r。！？]*",
	]
	.iter()
	.map(|p| Regex::new(p).expect("chapter pattern should compile"))
	.collect()
});

/// Ad/engagement vocabulary that disqualifies a text block.
static IRRELEVANT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
	[
		r"广告|推广|赞助|版权|转载|来源",
		r"点击|下载|注册|登录|充值",
		r"热门推荐|相关阅读|猜你喜欢",
		r"订阅|收藏|分享|评论",
	]
	.iter()
	.map(|p| Regex::new(p).expect("irrelevant pattern should compile"))
	.collect()
});

fn is_cjk(ch: char) -> bool {
	matches!(ch, '\u{4e00}'..='\u{9fa5}')
}

fn is_kept(ch: char) -> bool {
	// Ideographs, CJK punctuation, fullwidth forms and basic Latin. Sentence
	// terminators must survive cleaning or segmentation has nothing to cut on.
	matches!(ch,
		'\u{4e00}'..='\u{9fa5}'
			| '\u{3400}'..='\u{4dbf}'
			| '\u{a700}'..='\u{a71f}'
			| '\u{3000}'..='\u{303f}'
			| '\u{ff00}'..='\u{ffef}'
			| '\u{0020}'..='\u{007f}')
}

/// Normalizes a text block: whitespace runs become single spaces, characters
/// outside the CJK + CJK punctuation + basic Latin set are dropped, ends are
/// trimmed.
///
/// Idempotent: `clean_text(clean_text(s)) == clean_text(s)`.
pub fn clean_text(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	let mut pending_space = false;
	for ch in s.chars() {
		if ch.is_whitespace() {
			pending_space = true;
			continue;
		}
		if !is_kept(ch) {
			continue;
		}
		if pending_space && !out.is_empty() {
			out.push(' ');
		}
		pending_space = false;
		out.push(ch);
	}
	out
}

/// Splits text into trimmed sentences on Chinese and Western sentence-ending
/// punctuation and newlines. Never yields an empty element; source order is
/// preserved.
pub fn split_into_sentences(s: &str) -> Vec<String> {
	s.split(['。', '！', '？', '；', '.', '!', '?', ';', '\n'])
		.map(str::trim)
		.filter(|piece| !piece.is_empty())
		.map(str::to_string)
		.collect()
}

/// Admission gate for narrative content: after cleaning, the block must be
/// longer than 100 chars and more than 60% CJK ideographs.
pub fn is_novel_content(s: &str) -> bool {
	let cleaned = clean_text(s);
	let total = cleaned.chars().count();
	if total <= 100 {
		return false;
	}
	let cjk = cleaned.chars().filter(|&c| is_cjk(c)).count();
	cjk as f64 / total as f64 > 0.6
}

/// Ratio of CJK ideographs to total characters, in [0, 1].
pub fn cjk_ratio(s: &str) -> f64 {
	let total = s.chars().count();
	if total == 0 {
		return 0.0;
	}
	let cjk = s.chars().filter(|&c| is_cjk(c)).count();
	cjk as f64 / total as f64
}

/// Returns the first chapter-heading match in `s`, trimmed, or `None`.
pub fn extract_chapter_title(s: &str) -> Option<String> {
	for pattern in CHAPTER_PATTERNS.iter() {
		if let Some(m) = pattern.find(s) {
			return Some(m.as_str().trim().to_string());
		}
	}
	None
}

/// Text density of a markup block: plain-text length over markup length,
/// in [0, 1]. A layout shell scores near 0, a content container near 1.
pub fn text_density(text_len: usize, markup_len: usize) -> f64 {
	if markup_len == 0 {
		return 0.0;
	}
	text_len as f64 / markup_len as f64
}

/// False when the block matches ad/engagement-bait vocabulary.
pub fn filter_irrelevant_content(s: &str) -> bool {
	!IRRELEVANT_PATTERNS.iter().any(|p| p.is_match(s))
}

/// Drops blank paragraphs, cleans the survivors, joins with blank lines.
pub fn merge_paragraphs(paragraphs: &[String]) -> String {
	paragraphs
		.iter()
		.filter(|p| !p.trim().is_empty())
		.map(|p| clean_text(p))
		.collect::<Vec<_>>()
		.join("\n\n")
}
