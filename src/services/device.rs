use std::collections::BTreeMap;
use std::future::Future;

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;
use crate::settings::Connection;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Payload of `GET devices/{id}/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Reported as `v<semver>`.
    pub version: String,
    /// Whether a micro SD card is inserted.
    #[serde(default)]
    pub sdcard: bool,
    pub lock: bool,
}

impl DeviceInfo {
    pub fn firmware_version(&self) -> Option<String> {
        strip_version_prefix(&self.version)
    }
}

/// Trims surrounding whitespace, then drops one leading `v`; blank versions
/// count as absent.
pub fn strip_version_prefix(version: &str) -> Option<String> {
    let trimmed = version.trim();
    let stripped = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// Source of device info for the settings view.
pub trait DeviceInfoFetcher {
    fn fetch_info(&self, device_id: &str) -> impl Future<Output = Result<DeviceInfo, AppError>>;
}

/// Client for the backend's local HTTP API (`<base>/api/...`).
#[derive(Debug, Clone)]
pub struct DeviceApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl DeviceApi {
    pub fn new(connection: &Connection) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(connection.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Message(format!("Failed to initialize HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: connection.base_url.clone(),
            token: connection.token.clone(),
        })
    }

    pub fn endpoint_url(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::Config(format!("API URL cannot be a base: {}", self.base_url))
            })?;
            path.pop_if_empty().push("api").extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, AppError> {
        let endpoint = segments.join("/");
        let url = self.endpoint_url(segments)?;
        log::debug!("GET {url}");

        let mut request = self.client.get(url);
        if let Some(token) = self.token.as_deref() {
            request = request.header(AUTHORIZATION, format!("Basic {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::http(&endpoint, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http(&endpoint, format!("HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|source| AppError::MalformedResponse { endpoint, source })
    }

    pub async fn device_info(&self, device_id: &str) -> Result<DeviceInfo, AppError> {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Err(AppError::InvalidInput(
                "device ID must not be empty".to_string(),
            ));
        }
        self.get_json(&["devices", device_id, "info"]).await
    }

    /// Device ID → product type of every device the backend knows.
    pub async fn registered_devices(&self) -> Result<BTreeMap<String, String>, AppError> {
        self.get_json(&["devices", "registered"]).await
    }
}

impl DeviceInfoFetcher for DeviceApi {
    async fn fetch_info(&self, device_id: &str) -> Result<DeviceInfo, AppError> {
        self.device_info(device_id).await
    }
}
