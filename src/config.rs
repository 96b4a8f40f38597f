// Configuration: a TOML file plus a few environment overrides. The
// credentials used by every API call come from here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, Result};
use crate::logging::{LogFormat, LoggingConfig};

pub const CONFIG_ENV: &str = "INSTAPOST_CONFIG";
pub const ACCESS_TOKEN_ENV: &str = "INSTAPOST_ACCESS_TOKEN";
pub const ACCOUNT_ID_ENV: &str = "INSTAPOST_ACCOUNT_ID";
pub const LOG_LEVEL_ENV: &str = "INSTAPOST_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "INSTAPOST_LOG_FORMAT";

pub const DEFAULT_API_VERSION: &str = "v22.0";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub instagram: InstagramConfig,
    pub compose: ComposeConfig,
    pub logging: LogSettings,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstagramConfig {
    pub access_token: String,
    pub account_id: String,
    pub api_family: ApiFamily,
    pub api_version: String,
    /// Replaces the family's host, e.g. for a local test server.
    pub base_url: Option<String>,
    pub body_encoding: BodyEncoding,
    pub timeout_secs: u64,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            account_id: String::new(),
            api_family: ApiFamily::Instagram,
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: None,
            body_encoding: BodyEncoding::Json,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for InstagramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstagramConfig")
            .field("access_token", &redact(&self.access_token))
            .field("account_id", &self.account_id)
            .field("api_family", &self.api_family)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("body_encoding", &self.body_encoding)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl InstagramConfig {
    /// Root of every endpoint, e.g. `https://graph.instagram.com/v22.0`.
    pub fn api_root(&self) -> String {
        let host = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.api_family.host());
        format!(
            "{}/{}",
            host.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}

/// Which Graph API host family to talk to. Both expose the same
/// content-publishing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFamily {
    Instagram,
    Facebook,
}

impl ApiFamily {
    pub fn host(&self) -> &'static str {
        match self {
            ApiFamily::Instagram => "https://graph.instagram.com",
            ApiFamily::Facebook => "https://graph.facebook.com",
        }
    }
}

impl FromStr for ApiFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instagram" => Ok(ApiFamily::Instagram),
            "facebook" => Ok(ApiFamily::Facebook),
            _ => Err(ConfigError::InvalidValue {
                field: "instagram.api_family".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// How POST parameters are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Json,
    Form,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    pub template_image: Option<PathBuf>,
    pub font: Option<PathBuf>,
    pub font_size: f32,
    pub text_x: i32,
    pub text_y: i32,
    /// `#rrggbb`
    pub text_color: String,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            template_image: None,
            font: None,
            font_size: 50.0,
            text_x: 100,
            text_y: 100,
            text_color: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Token and account every request is made with.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub account_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &redact(&self.access_token))
            .field("account_id", &self.account_id)
            .finish()
    }
}

fn redact(token: &str) -> &'static str {
    if token.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

impl Config {
    /// Load from `explicit`, `$INSTAPOST_CONFIG` or the default location,
    /// then apply environment overrides. A missing file at the default
    /// location yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        };
        let mut config = match path {
            Some(path) => Self::load_from_path(&path)?,
            None => match resolve_config_path() {
                Some(path) if path.exists() => Self::load_from_path(&path)?,
                _ => Config::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(token) = env_non_empty(ACCESS_TOKEN_ENV) {
            self.instagram.access_token = token;
        }
        if let Some(account) = env_non_empty(ACCOUNT_ID_ENV) {
            self.instagram.account_id = account;
        }
        if let Some(level) = env_non_empty(LOG_LEVEL_ENV) {
            self.logging.level = level;
        }
        if let Some(format) = env_non_empty(LOG_FORMAT_ENV) {
            self.logging.format = format;
        }
    }

    /// The credentials every request needs. Fails when either value is
    /// absent.
    pub fn credentials(&self) -> Result<Credentials> {
        let access_token = self.instagram.access_token.trim();
        if access_token.is_empty() {
            return Err(ConfigError::MissingField("instagram.access_token".to_string()).into());
        }
        let account_id = self.instagram.account_id.trim();
        if account_id.is_empty() {
            return Err(ConfigError::MissingField("instagram.account_id".to_string()).into());
        }
        Ok(Credentials {
            access_token: access_token.to_string(),
            account_id: account_id.to_string(),
        })
    }

    pub fn logging_config(&self, verbose: bool) -> Result<LoggingConfig> {
        let format: LogFormat =
            self.logging
                .format
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "logging.format".to_string(),
                    value: self.logging.format.clone(),
                })?;
        Ok(LoggingConfig::new(format, self.logging.level.clone(), verbose))
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `<config dir>/instapost/config.toml`
pub fn resolve_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("instapost").join("config.toml"))
}
