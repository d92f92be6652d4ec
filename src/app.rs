use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::Endpoints;
use crate::utils::{derive_ws_url, normalize_url};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("no config directory available")]
    NoConfigDir,
    #[error("reading {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("parsing {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("serializing settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("writing {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

/// Client settings persisted as TOML. Holds the bearer token between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppState {
    pub api_url: String,
    /// Empty means "derive from `api_url`".
    pub ws_url: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub log_level: String,
    pub request_timeout_secs: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: String::new(),
            token: None,
            username: None,
            log_level: "info".to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppState {
    pub fn default_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("chatter.toml"))
    }

    /// Reads `path`; a missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, StateError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(StateError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&text).map_err(|source| StateError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from `path`, or the default location when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self, StateError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(Self::default_path)
            .ok_or(StateError::NoConfigDir)?;
        Self::load_from(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StateError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml).map_err(|source| StateError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: Option<&Path>) -> Result<(), StateError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(Self::default_path)
            .ok_or(StateError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Applies `CHATTER_API_URL` / `CHATTER_WS_URL`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("CHATTER_API_URL").ok(),
            std::env::var("CHATTER_WS_URL").ok(),
        );
    }

    pub fn apply_overrides(&mut self, api_url: Option<String>, ws_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = normalize_url(&url);
        }
        if let Some(url) = ws_url.filter(|u| !u.trim().is_empty()) {
            self.ws_url = url.trim().trim_end_matches('/').to_string();
        }
    }

    pub fn effective_ws_url(&self) -> String {
        if self.ws_url.trim().is_empty() {
            derive_ws_url(&self.api_url)
        } else {
            self.ws_url.clone()
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            api_url: normalize_url(&self.api_url),
            ws_url: self.effective_ws_url(),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }
}
