//! Signal extraction: pure functions from raw session data to categorical
//! signals. No session state is touched here.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

// ── Keyword sets ────────────────────────────────────────────

pub static INFECTION_KEYWORDS: &[&str] = &["fever", "chills", "shivering", "hot"];

pub static HEADACHE_KEYWORDS: &[&str] = &["headache", "head pain", "migraine"];

pub static GI_KEYWORDS: &[&str] = &[
    "uneasy", "stomach", "nausea", "indigestion", "bloating", "gas",
];

pub static VOMIT_KEYWORDS: &[&str] = &["vomit", "throwing up", "puke"];

static WOUND_TAGS: &[&str] = &["open wound", "bleeding"];

static SKIN_TAGS: &[&str] = &["redness", "rash"];

/// A number with a day or hour unit. The leading group keeps "0.5 days"
/// from being read as "5 days".
static NUMERIC_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d.])(\d+(?:\.\d+)?)\s*-?\s*(days?|d|hours?|hrs?|h)\b")
        .expect("Invalid duration regex pattern")
});

/// Spelled-out spans of two days or more: "three days", "a week", "fortnight", "month".
static WORDED_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \b(?:two|three|four|five|six|seven|eight|nine|ten|several|few)\s+days?\b
        | \bweeks?\b | \bfortnight\b | \bmonths?\b
        ",
    )
    .expect("Invalid duration regex pattern")
});

const LONG_DURATION_DAYS: f64 = 2.0;
const LONG_DURATION_HOURS: f64 = 48.0;

/// Signals extracted from the free-text narrative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextSignals {
    pub infection: bool,
    pub headache: bool,
    pub gastrointestinal: bool,
    pub vomiting: bool,
    pub long_duration: bool,
}

impl TextSignals {
    pub fn any(&self) -> bool {
        self.infection || self.headache || self.gastrointestinal || self.vomiting
    }
}

/// Signals derived from image observation tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservationSignals {
    pub wound_like: bool,
    pub skin_like: bool,
}

/// Extract keyword and duration signals. Only the duration qualifier is
/// inspected for the long-duration flag.
pub fn extract_text(symptoms: &str, duration: Option<&str>) -> TextSignals {
    let lower = symptoms.to_lowercase();
    TextSignals {
        infection: contains_any(&lower, INFECTION_KEYWORDS),
        headache: contains_any(&lower, HEADACHE_KEYWORDS),
        gastrointestinal: contains_any(&lower, GI_KEYWORDS),
        vomiting: contains_any(&lower, VOMIT_KEYWORDS),
        long_duration: duration.is_some_and(is_long_duration),
    }
}

pub fn extract_observations(tags: &BTreeSet<String>) -> ObservationSignals {
    let has = |set: &[&str]| set.iter().any(|t| tags.contains(*t));
    ObservationSignals {
        wound_like: has(WOUND_TAGS),
        skin_like: has(SKIN_TAGS),
    }
}

/// Two days or more: "2 days", "2.5 days", "48 hours", "three days", "a week".
pub fn is_long_duration(duration: &str) -> bool {
    let lower = duration.to_lowercase();
    if WORDED_DURATION.is_match(&lower) {
        return true;
    }
    NUMERIC_DURATION.captures_iter(&lower).any(|caps| {
        let Ok(value) = caps[1].parse::<f64>() else {
            return false;
        };
        if caps[2].starts_with('d') {
            value >= LONG_DURATION_DAYS
        } else {
            value >= LONG_DURATION_HOURS
        }
    })
}

/// Keyword must start at a word boundary; suffixes are allowed
/// ("vomiting" matches "vomit", "shot" does not match "hot").
pub fn contains_keyword(text_lower: &str, keyword: &str) -> bool {
    keyword_positions(text_lower, keyword).next().is_some()
}

/// Byte offsets where `keyword` occurs at a word start.
pub fn keyword_positions<'a>(
    text_lower: &'a str,
    keyword: &'a str,
) -> impl Iterator<Item = usize> + 'a {
    text_lower
        .match_indices(keyword)
        .map(|(idx, _)| idx)
        .filter(move |&idx| {
            text_lower[..idx]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric())
        })
}

pub fn contains_any(text_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| contains_keyword(text_lower, kw))
}
