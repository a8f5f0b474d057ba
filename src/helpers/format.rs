use std::sync::LazyLock;

use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime};
use regex::Regex;

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Short publish date, e.g. `8 Jan 21`.
pub const PUBLISHED_AT_FORMAT: &str = "%-d %b %y";
/// Long header date, e.g. `Fri, 8 January`.
pub const TODAY_FORMAT: &str = "%a, %-d %B";

static BLOCK_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p>|</li>|</h[1-6]>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Renders whole seconds as `HH:MM:SS`.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = total_seconds % SECONDS_PER_MINUTE;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parses the API's publish timestamp.
///
/// Accepts RFC 3339 (the offset is dropped and the wall-clock time kept),
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` with optional fraction, and a
/// bare `YYYY-MM-DD`.
pub fn parse_published_at(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn format_published_at(published_at: NaiveDateTime, locale: Locale) -> String {
    published_at
        .and_utc()
        .format_localized(PUBLISHED_AT_FORMAT, locale)
        .to_string()
}

pub fn format_today(now: NaiveDateTime, locale: Locale) -> String {
    now.and_utc().format_localized(TODAY_FORMAT, locale).to_string()
}

/// Resolves a locale name such as `pt_BR`, falling back to `en_US`.
pub fn parse_locale(name: &str) -> Locale {
    match Locale::try_from(name) {
        Ok(locale) => locale,
        Err(_) => {
            log::warn!("Unknown locale '{}', falling back to en_US", name);
            Locale::en_US
        }
    }
}

/// Converts an HTML episode description into plain terminal text.
pub fn description_to_text(html: &str) -> String {
    let with_breaks = BLOCK_BREAK.replace_all(html, "\n");
    let stripped = ANY_TAG.replace_all(&with_breaks, "");
    let decoded = html_escape::decode_html_entities(&stripped);
    let lines: Vec<&str> = decoded.lines().map(str::trim).collect();

    BLANK_RUN
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}
