use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:8000";
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

/// Login entry point the gateway redirects to when the session is rejected.
pub(crate) const LOGIN_PATH: &str = "/login";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub log_level: String,
}

impl EnvConfig {
    /// Reads `window.ENV` in the browser; natively only the defaults apply.
    pub fn new() -> Self {
        let mut cfg = Self::defaults();

        #[cfg(target_arch = "wasm32")]
        {
            // We support BOTH `window.ENV.API_URL` (documented) and
            // `window.ENV.api_url` (lowercase) for compatibility.
            if let Some(url) = read_window_env(&["API_URL", "api_url"]) {
                cfg.api_url = url;
            }
            if let Some(level) = read_window_env(&["LOG_LEVEL", "log_level"]) {
                cfg.log_level = level;
            }
        }

        cfg.api_url = cfg.api_url.trim_end_matches('/').to_string();
        cfg
    }

    pub fn defaults() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Unknown level names fall back to `info`.
    pub fn max_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.trim()).unwrap_or(tracing::Level::INFO)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
fn read_window_env(keys: &[&str]) -> Option<String> {
    let window = web_sys::window()?;
    let env = window.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }

    keys.iter().find_map(|k| {
        js_sys::Reflect::get(&env, &(*k).into())
            .ok()
            .and_then(|v| v.as_string())
            .filter(|s| !s.trim().is_empty())
    })
}
