/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::errors::ConfigError;
use crate::v1::{API_AUTHORITY, AUTH_AUTHORITY, DuplicateCodePolicy};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
pub const DEFAULT_ACCESS_SCOPE: &str = "public+read_user+write_likes";

/// Application credentials registered with the API
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub access_key: String,
    pub secret_key: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_access_scope")]
    pub access_scope: String,
}

impl AuthConfig {
    pub fn new(access_key: &str, secret_key: &str) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            access_scope: DEFAULT_ACCESS_SCOPE.into(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_key", &"xxx")
            .field("secret_key", &"xxx")
            .field("redirect_uri", &self.redirect_uri)
            .field("access_scope", &self.access_scope)
            .finish()
    }
}

/// Everything needed to wire up the client core
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,

    #[serde(default = "default_api_authority")]
    pub api_authority: String,

    #[serde(default = "default_auth_authority")]
    pub auth_authority: String,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_request_timeout", deserialize_with = "seconds::deserialize")]
    pub request_timeout: Duration,

    #[serde(default)]
    pub duplicate_code_policy: DuplicateCodePolicy,

    /// Where the file token store keeps the bearer token. Defaults to the
    /// platform data directory.
    #[serde(default)]
    pub token_path: Option<PathBuf>,
}

impl Config {
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth,
            api_authority: default_api_authority(),
            auth_authority: default_auth_authority(),
            scheme: default_scheme(),
            request_timeout: default_request_timeout(),
            duplicate_code_policy: DuplicateCodePolicy::default(),
            token_path: None,
        }
    }

    /// Reads the configuration from `IMAGEFEED_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = |name: &str| std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()));
        let optional = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let mut auth = AuthConfig::new(
            &required("IMAGEFEED_ACCESS_KEY")?,
            &required("IMAGEFEED_SECRET_KEY")?,
        );
        if let Some(redirect_uri) = optional("IMAGEFEED_REDIRECT_URI") {
            auth.redirect_uri = redirect_uri;
        }
        if let Some(scope) = optional("IMAGEFEED_SCOPE") {
            auth.access_scope = scope;
        }

        let mut config = Config::new(auth);
        if let Some(authority) = optional("IMAGEFEED_API_AUTHORITY") {
            config.api_authority = authority;
        }
        if let Some(authority) = optional("IMAGEFEED_AUTH_AUTHORITY") {
            config.auth_authority = authority;
        }
        if let Some(policy) = optional("IMAGEFEED_DUPLICATE_CODE_POLICY") {
            config.duplicate_code_policy = policy
                .parse()
                .map_err(|_| ConfigError::InvalidValue("IMAGEFEED_DUPLICATE_CODE_POLICY".into(), policy.clone()))?;
        }
        config.token_path = optional("IMAGEFEED_TOKEN_PATH").map(PathBuf::from);
        Ok(config)
    }

    /// The configured token path, or `<data dir>/imagefeed/token.json`
    pub fn token_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.token_path {
            Some(path) => Ok(path.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("imagefeed").join("token.json"))
                .ok_or(ConfigError::NoDataDir),
        }
    }

    /// Marker whose absence means this is the first launch after install
    pub fn install_marker_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.token_path()?.with_file_name(".installed"))
    }
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

fn default_access_scope() -> String {
    DEFAULT_ACCESS_SCOPE.to_string()
}

fn default_api_authority() -> String {
    API_AUTHORITY.to_string()
}

fn default_auth_authority() -> String {
    AUTH_AUTHORITY.to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

mod seconds {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"auth": {"access_key": "key", "secret_key": "secret"}, "request_timeout": 5}"#,
        )
        .unwrap();
        assert_eq!(config.auth.redirect_uri, DEFAULT_REDIRECT_URI);
        assert_eq!(config.auth.access_scope, DEFAULT_ACCESS_SCOPE);
        assert_eq!(config.api_authority, API_AUTHORITY);
        assert_eq!(config.auth_authority, AUTH_AUTHORITY);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.duplicate_code_policy, DuplicateCodePolicy::CancelAndReject);
    }

    #[test]
    fn debug_hides_secrets() {
        let auth = AuthConfig::new("my-key", "my-secret");
        let printed = format!("{auth:?}");
        assert!(!printed.contains("my-key"));
        assert!(!printed.contains("my-secret"));
    }
}
