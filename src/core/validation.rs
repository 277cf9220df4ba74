//! Validation rules for user-typed input.
//!
//! Pure predicates plus the parser for the one-message "register module"
//! sentence, shared by the guided and the shorthand item flows.

use regex::Regex;
use std::sync::OnceLock;

use super::models::GroupId;

const MAX_URL_LEN: usize = 512;

const NAME_CLASS: &str = r"[A-Za-z0-9_А-Яа-яЁё ():,.\-\\/&]";
const URL_PATTERN: &str = r"https?://(?:[a-zA-Z0-9]|[[$-_@.&+]&&[^<>]]|[!*(),]|%[0-9a-fA-F]{2})+";

fn password_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{3,16}$").expect("password pattern is valid"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{URL_PATTERN}$")).expect("url pattern is valid"))
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{NAME_CLASS}{{3,128}}$")).expect("name pattern is valid"))
}

fn module_sentence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            "^(?:Я изучаю|Studying) ({NAME_CLASS}{{3,128}}) (?:на|on) Quizlet: ({URL_PATTERN})$"
        ))
        .expect("module sentence pattern is valid")
    })
}

/// 3-16 latin letters, digits or underscores
pub fn is_valid_password(password: &str) -> bool {
    password_regex().is_match(password)
}

pub fn is_valid_url(url: &str) -> bool {
    url.len() <= MAX_URL_LEN && url_regex().is_match(url)
}

/// 3-128 letters (latin or cyrillic), digits, spaces and light punctuation
pub fn is_valid_item_name(name: &str) -> bool {
    name_regex().is_match(name)
}

/// A module described in one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSubmission {
    pub name: String,
    pub url: String,
}

/// Parse `"<verb> <name> <preposition> Quizlet: <url>"`.
///
/// Accepts `Я изучаю ... на Quizlet: ...` and `Studying ... on Quizlet: ...`.
pub fn parse_module_sentence(text: &str) -> Option<ModuleSubmission> {
    let caps = module_sentence_regex().captures(text.trim())?;
    let name = caps.get(1)?.as_str().to_string();
    let url = caps.get(2)?.as_str().to_string();

    if !is_valid_url(&url) {
        return None;
    }

    Some(ModuleSubmission { name, url })
}

/// Parse a typed group id, tolerating whitespace and a leading `√`
pub fn parse_group_id(text: &str) -> Option<GroupId> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('√').unwrap_or(trimmed).trim();
    digits.parse::<GroupId>().ok().filter(|id| *id > 0)
}
