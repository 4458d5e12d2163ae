use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::models::RiskLevel;

/// Application-level constants
pub const APP_NAME: &str = "triage-engine";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Keyword score at or above which self-harm is asserted deterministically.
pub const DEFAULT_SELF_HARM_THRESHOLD: u32 = 20;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_ADVISORY_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_ADVISORY_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_ADVISORY_TIMEOUT_SECS: u64 = 20;
const DEFAULT_VISION_MODEL: &str = "llava";
const DEFAULT_MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "triage_engine=info,tower_http=info"
}

/// Get the application data directory
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Policy knobs for the risk fusion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskPolicy {
    pub self_harm_threshold: u32,
    /// Stand-in for the external opinion when the advisory service is unavailable.
    pub neutral_default: RiskLevel,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            self_harm_threshold: DEFAULT_SELF_HARM_THRESHOLD,
            neutral_default: RiskLevel::Medium,
        }
    }
}

/// Advisory (language-model) service settings.
#[derive(Debug, Clone)]
pub struct AdvisorySettings {
    pub base_url: String,
    pub model: String,
    /// `None` means the service is not configured and every call falls back.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Image-observation service settings. `base_url == None` disables extraction.
#[derive(Debug, Clone)]
pub struct VisionSettings {
    pub base_url: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

/// Process-wide settings, read once at start-up.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub advisory: AdvisorySettings,
    pub vision: VisionSettings,
    pub risk_policy: RiskPolicy,
    pub max_image_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let timeout = Duration::from_secs(DEFAULT_ADVISORY_TIMEOUT_SECS);
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            db_path: app_data_dir().join("triage.db"),
            advisory: AdvisorySettings {
                base_url: DEFAULT_ADVISORY_URL.to_string(),
                model: DEFAULT_ADVISORY_MODEL.to_string(),
                api_key: None,
                timeout,
            },
            vision: VisionSettings {
                base_url: None,
                model: DEFAULT_VISION_MODEL.to_string(),
                timeout,
            },
            risk_policy: RiskPolicy::default(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup (environment in production,
    /// a map in tests). Unparseable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Self::default();

        settings.bind_addr = parsed(
            "TRIAGE_BIND_ADDR",
            get("TRIAGE_BIND_ADDR"),
            settings.bind_addr,
        );
        if let Some(path) = get("TRIAGE_DB_PATH") {
            settings.db_path = PathBuf::from(path);
        }

        if let Some(url) = get("TRIAGE_ADVISORY_URL") {
            settings.advisory.base_url = url;
        }
        if let Some(model) = get("TRIAGE_ADVISORY_MODEL") {
            settings.advisory.model = model;
        }
        settings.advisory.api_key =
            get("TRIAGE_ADVISORY_API_KEY").or_else(|| get("GROQ_API_KEY"));
        let timeout_secs = parsed(
            "TRIAGE_ADVISORY_TIMEOUT_SECS",
            get("TRIAGE_ADVISORY_TIMEOUT_SECS"),
            DEFAULT_ADVISORY_TIMEOUT_SECS,
        );
        settings.advisory.timeout = Duration::from_secs(timeout_secs);
        settings.vision.timeout = settings.advisory.timeout;

        settings.vision.base_url = get("TRIAGE_VISION_URL");
        if let Some(model) = get("TRIAGE_VISION_MODEL") {
            settings.vision.model = model;
        }

        settings.risk_policy.self_harm_threshold = parsed(
            "TRIAGE_SELF_HARM_THRESHOLD",
            get("TRIAGE_SELF_HARM_THRESHOLD"),
            DEFAULT_SELF_HARM_THRESHOLD,
        );
        settings.max_image_bytes = parsed(
            "TRIAGE_MAX_IMAGE_BYTES",
            get("TRIAGE_MAX_IMAGE_BYTES"),
            DEFAULT_MAX_IMAGE_BYTES,
        );

        settings
    }
}

fn parsed<T: FromStr + Copy>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring invalid setting, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let settings = from_map(&[]);
        assert_eq!(settings.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(settings.advisory.model, DEFAULT_ADVISORY_MODEL);
        assert!(settings.advisory.api_key.is_none());
        assert!(settings.vision.base_url.is_none());
        assert_eq!(settings.risk_policy, RiskPolicy::default());
        assert!(settings.db_path.ends_with("triage.db"));
    }

    #[test]
    fn groq_key_is_accepted_as_fallback() {
        let settings = from_map(&[("GROQ_API_KEY", "gsk_test")]);
        assert_eq!(settings.advisory.api_key.as_deref(), Some("gsk_test"));

        let settings = from_map(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("TRIAGE_ADVISORY_API_KEY", "primary"),
        ]);
        assert_eq!(settings.advisory.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn threshold_is_configurable() {
        let settings = from_map(&[("TRIAGE_SELF_HARM_THRESHOLD", "35")]);
        assert_eq!(settings.risk_policy.self_harm_threshold, 35);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let settings = from_map(&[
            ("TRIAGE_SELF_HARM_THRESHOLD", "twenty"),
            ("TRIAGE_BIND_ADDR", "not-an-addr"),
            ("TRIAGE_ADVISORY_TIMEOUT_SECS", "-3"),
        ]);
        assert_eq!(
            settings.risk_policy.self_harm_threshold,
            DEFAULT_SELF_HARM_THRESHOLD
        );
        assert_eq!(settings.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(
            settings.advisory.timeout,
            Duration::from_secs(DEFAULT_ADVISORY_TIMEOUT_SECS)
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        let settings = from_map(&[("TRIAGE_VISION_URL", "   "), ("TRIAGE_DB_PATH", "")]);
        assert!(settings.vision.base_url.is_none());
        assert!(settings.db_path.ends_with("triage.db"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
