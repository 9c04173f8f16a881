use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
const DEFAULT_CACHE_STALE_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub session_file: Option<PathBuf>,
    pub cache_stale_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            session_file: None,
            cache_stale_secs: DEFAULT_CACHE_STALE_SECS,
        }
    }
}

impl Settings {
    pub fn cache_stale_time(&self) -> Duration {
        Duration::from_secs(self.cache_stale_secs)
    }
}

/// Defaults, then `talentree.toml` in the working directory, then env.
pub fn load_settings() -> Settings {
    load_settings_from(
        fs::read_to_string("talentree.toml").ok().as_deref(),
        |name| std::env::var(name).ok(),
    )
}

pub(crate) fn load_settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) {
            if let Some(v) = file_cfg.get("api_url").and_then(toml::Value::as_str) {
                settings.api_url = v.to_string();
            }
            if let Some(v) = file_cfg.get("session_file").and_then(toml::Value::as_str) {
                settings.session_file = Some(PathBuf::from(v));
            }
            if let Some(v) = file_cfg
                .get("cache_stale_secs")
                .and_then(toml::Value::as_integer)
            {
                if let Ok(secs) = u64::try_from(v) {
                    settings.cache_stale_secs = secs;
                }
            }
        }
    }

    if let Some(v) = env("TALENTREE_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("TALENTREE_SESSION_FILE") {
        settings.session_file = Some(PathBuf::from(v));
    }

    if let Some(v) = env("APP__CACHE_STALE_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.cache_stale_secs = parsed;
        }
    }

    settings.api_url = normalize_api_url(&settings.api_url);
    settings
}

pub fn normalize_api_url(raw_api_url: &str) -> String {
    let trimmed = raw_api_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
