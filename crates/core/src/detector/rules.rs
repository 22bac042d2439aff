//! Built-in per-domain detection rules.
//!
//! These cover the major hosted-fiction sites. User-added rules are appended
//! after them; lookup takes the first enabled rule whose domain is a
//! substring of the page's hostname.

use readaloud_protocol::SiteRule;

fn rule(domain: &str, title_selector: &str, content_selector: &str) -> SiteRule {
	SiteRule {
		domain: domain.to_string(),
		title_selector: title_selector.to_string(),
		content_selector: content_selector.to_string(),
		enabled: true,
	}
}

/// The rule table shipped with the engine, in lookup order.
pub fn built_in_rules() -> Vec<SiteRule> {
	vec![
		rule("qidian.com", ".j_chapterName", ".read-content .j_readContent"),
		rule("zongheng.com", ".title_txtbox", ".content"),
		rule("readnovel.com", ".reader-title", ".reader-content"),
		rule("xxsy.net", ".bookname h1", "#content"),
		rule("jjwxc.net", ".noveltitle", ".novelcontent"),
	]
}
