use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};
use std::time::Duration;

use url::Url;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8082";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Persistent application settings (`~/.dbb-settings/settings.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Base URL of the local backend, without the `/api` suffix.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Token the backend handed to this frontend, sent as basic auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            language: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppSettings {
    pub fn settings_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dbb-settings")
            .join("settings.json")
    }

    fn normalize(&mut self) {
        let api_url = self.api_url.trim().trim_end_matches('/');
        self.api_url = if api_url.is_empty() {
            default_api_url()
        } else {
            api_url.to_string()
        };

        self.token = self
            .token
            .as_ref()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        self.language = self
            .language
            .as_ref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| crate::cli::i18n::Language::is_supported_code(s));

        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        self.request_timeout_secs = self.request_timeout_secs.min(MAX_REQUEST_TIMEOUT_SECS);
    }

    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    /// Missing or unparsable files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<AppSettings>(&content) {
            Ok(mut settings) => {
                settings.normalize();
                settings
            }
            Err(err) => {
                log::warn!(
                    "failed to parse settings file, using defaults. path: {}, error: {}",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), AppError> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        let mut normalized = self.clone();
        normalized.normalize();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&normalized)
            .map_err(|e| AppError::JsonSerialize { source: e })?;
        fs::write(path, json).map_err(|e| AppError::io(path, e))?;
        Ok(())
    }
}

fn settings_store() -> &'static RwLock<AppSettings> {
    static STORE: OnceLock<RwLock<AppSettings>> = OnceLock::new();
    STORE.get_or_init(|| {
        let settings = if cfg!(test) {
            AppSettings::default()
        } else {
            AppSettings::load()
        };
        RwLock::new(settings)
    })
}

pub fn get_settings() -> AppSettings {
    match settings_store().read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

pub fn update_settings(mut new_settings: AppSettings) -> Result<(), AppError> {
    new_settings.normalize();
    new_settings.save()?;

    let mut guard = settings_store()
        .write()
        .map_err(|_| AppError::Config("settings lock poisoned".to_string()))?;
    *guard = new_settings;
    Ok(())
}

/// Where and how to reach the backend, after flag/env/file precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub base_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Connection {
    /// Flags (which already carry `DBB_API_URL`/`DBB_TOKEN` via clap) win
    /// over the settings file.
    pub fn resolve(
        settings: &AppSettings,
        api_url: Option<&str>,
        token: Option<&str>,
    ) -> Result<Self, AppError> {
        let raw = api_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(settings.api_url.as_str());
        let base_url = parse_base_url(raw)?;

        let token = token
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| settings.token.clone());

        Ok(Self {
            base_url,
            token,
            timeout: Duration::from_secs(settings.request_timeout_secs),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw)
        .map_err(|e| AppError::Config(format!("invalid API URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AppError::Config(format!(
                "invalid API URL '{raw}': unsupported scheme '{other}'"
            )))
        }
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(AppError::Config(format!(
            "invalid API URL '{raw}': missing host"
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let settings = AppSettings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn invalid_json_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").expect("write");
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
    }

    #[test]
    fn load_normalizes_fields() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"apiUrl":"  http://127.0.0.1:9000/ ","token":"   ","language":"EN","requestTimeoutSecs":0}"#,
        )
        .expect("write");

        let settings = AppSettings::load_from(&path);
        assert_eq!(settings.api_url, "http://127.0.0.1:9000");
        assert_eq!(settings.token, None);
        assert_eq!(settings.language.as_deref(), Some("en"));
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn unsupported_language_is_dropped() {
        let mut settings = AppSettings {
            language: Some("xx".to_string()),
            ..AppSettings::default()
        };
        settings.normalize();
        assert_eq!(settings.language, None);
    }

    #[test]
    fn save_then_load_keeps_token() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            token: Some("abc123".to_string()),
            ..AppSettings::default()
        };
        settings.save_to(&path).expect("save");
        assert_eq!(AppSettings::load_from(&path).token.as_deref(), Some("abc123"));
    }

    #[test]
    fn connection_flags_override_file() {
        let settings = AppSettings {
            token: Some("from-file".to_string()),
            ..AppSettings::default()
        };
        let conn = Connection::resolve(&settings, Some("https://10.0.0.2:8443"), Some("flag"))
            .expect("resolve");
        assert_eq!(conn.base_url.as_str(), "https://10.0.0.2:8443/");
        assert_eq!(conn.token.as_deref(), Some("flag"));
        assert_eq!(conn.timeout, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    }

    #[test]
    fn connection_falls_back_to_file() {
        let settings = AppSettings {
            token: Some("from-file".to_string()),
            ..AppSettings::default()
        };
        let conn = Connection::resolve(&settings, Some("  "), None).expect("resolve");
        assert_eq!(conn.base_url.as_str(), "http://localhost:8082/");
        assert_eq!(conn.token.as_deref(), Some("from-file"));
    }

    #[test]
    fn connection_rejects_bad_urls() {
        let settings = AppSettings::default();
        assert!(matches!(
            Connection::resolve(&settings, Some("ftp://host"), None),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            Connection::resolve(&settings, Some("not a url"), None),
            Err(AppError::Config(_))
        ));
    }
}
