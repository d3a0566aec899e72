//! # Configuration Module
//!
//! Router settings loaded from a YAML file, with a few environment
//! overrides applied on top.
//!
//! ## File Format
//!
//! Every field is optional; missing fields take the defaults shown:
//!
//! ```yaml
//! environment: development     # development | testing | staging | production
//! uri_prefix: api
//! default_format: JSON
//! exception_detail: superuser  # never | superuser | non_production | always
//! stack_size: 0x8000           # coroutine stack size, bytes
//! access_token:
//!   header: X-Access-Token
//!   param: accessToken
//! cors:
//!   allow_origin: "*"
//!   allow_headers: [X-Access-Token, content, origin, content-type]
//!   allow_methods: [GET, PUT, POST, DELETE, OPTIONS]
//!   allow_credentials: true
//!   max_age: 86400
//! log:
//!   dir: logs                  # omit to disable the request log
//!   prefix: api
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `APIROUTER_ENV` | `environment` |
//! | `APIROUTER_DEFAULT_FORMAT` | `default_format` |
//! | `APIROUTER_LOG_DIR` | `log.dir` |
//! | `APIROUTER_STACK_SIZE` | `stack_size` (decimal or `0x` hex) |
//!
//! ```rust
//! use apirouter::config::{Environment, RouterConfig};
//!
//! let config: RouterConfig = serde_yaml::from_str("environment: production").unwrap();
//! assert_eq!(config.environment, Environment::Production);
//! assert!(!config.pretty_print());
//! assert_eq!(config.uri_prefix, "api");
//! ```

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment \"{other}\"")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Staging => "staging",
            Environment::Production => "production",
        })
    }
}

/// Who sees the `exception` block on recoverable error envelopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionDetail {
    Never,
    /// Callers whose identity is a superuser
    #[default]
    Superuser,
    /// Everyone, outside production
    NonProduction,
    Always,
}

impl ExceptionDetail {
    #[must_use]
    pub fn exposes(self, environment: Environment, superuser: bool) -> bool {
        match self {
            ExceptionDetail::Never => false,
            ExceptionDetail::Superuser => superuser,
            ExceptionDetail::NonProduction => !environment.is_production(),
            ExceptionDetail::Always => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessTokenConfig {
    pub header: String,
    pub param: String,
}

impl Default for AccessTokenConfig {
    fn default() -> Self {
        Self {
            header: crate::security::DEFAULT_TOKEN_HEADER.to_string(),
            param: crate::security::DEFAULT_TOKEN_PARAM.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_headers: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_credentials: bool,
    /// Seconds; `None` omits the header
    pub max_age: Option<u32>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_headers: ["X-Access-Token", "content", "origin", "content-type"]
                .map(String::from)
                .to_vec(),
            allow_methods: ["GET", "PUT", "POST", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allow_credentials: true,
            max_age: Some(86400),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFileConfig {
    /// Directory of the per-day request log; `None` disables it
    pub dir: Option<PathBuf>,
    pub prefix: String,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: "api".to_string(),
        }
    }
}

/// Default coroutine stack size (32 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub environment: Environment,
    /// First path segment of every API route
    pub uri_prefix: String,
    pub default_format: String,
    pub exception_detail: ExceptionDetail,
    #[serde(deserialize_with = "de_stack_size")]
    pub stack_size: usize,
    pub access_token: AccessTokenConfig,
    pub cors: CorsConfig,
    pub log: LogFileConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            uri_prefix: "api".to_string(),
            default_format: crate::format::DEFAULT_FORMAT.to_string(),
            exception_detail: ExceptionDetail::default(),
            stack_size: DEFAULT_STACK_SIZE,
            access_token: AccessTokenConfig::default(),
            cors: CorsConfig::default(),
            log: LogFileConfig::default(),
        }
    }
}

fn parse_stack_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

fn de_stack_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(usize),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => parse_stack_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stack size \"{s}\""))),
    }
}

impl RouterConfig {
    /// Read a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: RouterConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), environment = %config.environment, "Router config loaded");
        Ok(config)
    }

    /// Apply `APIROUTER_*` environment overrides.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = var("APIROUTER_ENV") {
            match val.parse() {
                Ok(environment) => self.environment = environment,
                Err(e) => warn!(error = %e, "Ignoring APIROUTER_ENV"),
            }
        }
        if let Some(val) = var("APIROUTER_DEFAULT_FORMAT").filter(|v| !v.is_empty()) {
            self.default_format = val.to_ascii_uppercase();
        }
        if let Some(val) = var("APIROUTER_LOG_DIR").filter(|v| !v.is_empty()) {
            self.log.dir = Some(PathBuf::from(val));
        }
        if let Some(val) = var("APIROUTER_STACK_SIZE") {
            match parse_stack_size(&val) {
                Some(size) => self.stack_size = size,
                None => warn!(value = %val, "Ignoring APIROUTER_STACK_SIZE"),
            }
        }
        self
    }

    /// JSON bodies are pretty-printed outside production.
    #[must_use]
    pub fn pretty_print(&self) -> bool {
        !self.environment.is_production()
    }
}
