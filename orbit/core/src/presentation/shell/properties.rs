// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::orbit_config::ShellConfig;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;

pub trait PasswordAuthenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// Rejects every login.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl PasswordAuthenticator for RejectAll {
    fn authenticate(&self, _username: &str, _password: &str) -> bool {
        false
    }
}

/// Accepts exactly one username/password pair.
#[derive(Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl PasswordAuthenticator for StaticCredentials {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        // evaluate both so timing does not reveal which one failed
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        (user_ok & pass_ok).into()
    }
}

#[derive(Clone)]
pub struct ShellServerProperties {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub authenticator: Arc<dyn PasswordAuthenticator>,
    pub host_key_path: PathBuf,
    pub authorized_keys_path: Option<PathBuf>,
    pub inactivity_timeout: Duration,
    pub status_line: bool,
}

impl ShellServerProperties {
    /// Properties for the configured shell, authenticating against the
    /// configured credentials.
    pub fn from_configuration(config: &ShellConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            authenticator: Arc::new(StaticCredentials::new(&config.username, &config.password)),
            host_key_path: config.host_key_path.clone(),
            authorized_keys_path: config.authorized_keys_path.clone(),
            inactivity_timeout: Duration::from_secs(config.inactivity_timeout_secs),
            status_line: config.status_line,
        }
    }

    /// Same server settings with a different bind address and login.
    pub fn with_endpoint(
        &self,
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let username = username.into();
        let password = password.into();
        Self {
            host: host.into(),
            port,
            authenticator: Arc::new(StaticCredentials::new(&username, &password)),
            username,
            password,
            ..self.clone()
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ShellServerProperties {
    fn default() -> Self {
        let config = ShellConfig::default();
        Self {
            authenticator: Arc::new(RejectAll),
            ..Self::from_configuration(&config)
        }
    }
}

impl fmt::Debug for ShellServerProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellServerProperties")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host_key_path", &self.host_key_path)
            .field("authorized_keys_path", &self.authorized_keys_path)
            .field("inactivity_timeout", &self.inactivity_timeout)
            .field("status_line", &self.status_line)
            .finish()
    }
}
