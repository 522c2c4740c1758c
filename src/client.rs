//! Authenticated JSON client for the workflow engine's REST API.
//!
//! Connection settings are an explicit [`ApiSettings`] value. They can be
//! persisted between runs with a [`SettingsStore`], and are handed to
//! [`ApiClient::new`]; nothing is read from ambient globals.

use crate::model::{GraphPayload, Toggles};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://localhost:3000/v1";
pub const API_BASE_ENV: &str = "BPMN_API_BASE";
pub const TOKEN_ENV: &str = "BPMN_BEARER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    /// `BPMN_API_BASE` and `BPMN_BEARER` win over stored values when set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(base) = non_empty_env(API_BASE_ENV) {
            self.base_url = base;
        }
        if let Some(token) = non_empty_env(TOKEN_ENV) {
            self.token = Some(token);
        }
        self
    }

    pub fn login(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("no config directory found (set XDG_CONFIG_HOME or HOME)")]
    NoConfigDir,
}

/// JSON file holding the API settings between runs.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_CONFIG_HOME/bpmn-graph/settings.json`, else under `~/.config`.
    pub fn default_location() -> Result<Self, SettingsError> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::new(base.join("bpmn-graph").join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means defaults.
    pub fn load(&self) -> Result<ApiSettings, SettingsError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ApiSettings::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, settings: &ApiSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let json = serde_json::to_string_pretty(settings).map_err(SettingsError::Encode)?;
        std::fs::write(&self.path, json).map_err(|source| self.io_error(source))?;
        tracing::info!(
            path = %self.path.display(),
            authenticated = settings.is_authenticated(),
            "saved api settings"
        );
        Ok(())
    }

    pub fn clear_token(&self) -> Result<ApiSettings, SettingsError> {
        let mut settings = self.load()?;
        settings.logout();
        self.save(&settings)?;
        Ok(settings)
    }

    fn io_error(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// Non-2xx response. The message is the raw response body.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub method: Option<Method>,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl FetchOptions {
    pub fn with_method(method: Method) -> Self {
        Self {
            method: Some(method),
            ..Self::default()
        }
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone().filter(|t| !t.is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: FetchOptions,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let method = options.method.unwrap_or(Method::GET);
        tracing::debug!(%method, %url, "api request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                format!("Request failed: {}", status.as_u16())
            } else {
                body
            };
            tracing::warn!(%method, %url, status = status.as_u16(), "api request failed");
            return Err(ApiError::Status { status, message });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn fetch_graph(&self, process_id: i64, toggles: Toggles) -> Result<GraphPayload, ApiError> {
        let value: serde_json::Value = self
            .fetch_json(&graph_path(process_id, toggles), FetchOptions::default())
            .await?;
        Ok(GraphPayload::from_value(value)?)
    }
}

/// `/processes/{id}/graph` with one `=1` flag per active toggle.
pub fn graph_path(process_id: i64, toggles: Toggles) -> String {
    let query = to_deep_query(
        toggles
            .query_pairs()
            .into_iter()
            .map(|(key, value)| (key, Some(value))),
    );
    format!("/processes/{process_id}/graph{query}")
}

/// Builds `?k=v&…`, dropping absent and empty values. Returns an empty string
/// when nothing is left.
pub fn to_deep_query<K, V, I>(filter: I) -> String
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: AsRef<str>,
    V: ToString,
{
    let params: Vec<String> = filter
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value?.to_string();
            if value.is_empty() {
                return None;
            }
            Some(format!(
                "{}={}",
                encode_component(key.as_ref()),
                encode_component(&value)
            ))
        })
        .collect();
    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}

fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
