// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration schema for a ThinkOrbit node, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - SSH operator shell settings (bind address, credentials, keys)
// - Event store selection (PostgreSQL or in-memory)
// - HTTP API and metrics exposition
// - Event bus replay tuning

use crate::domain::repository::{PostgresConfig, StorageBackend};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "thinkorbit/v1";
pub const KIND: &str = "OrbitConfig";

/// Top-level Kubernetes-style configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitConfigManifest {
    /// API version (must be "thinkorbit/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "OrbitConfig")
    pub kind: String,

    /// Node metadata (name, labels)
    pub metadata: ManifestMetadata,

    /// Configuration specification
    #[serde(default)]
    pub spec: OrbitConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable node name
    pub name: String,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrbitConfigSpec {
    /// SSH operator shell
    #[serde(default)]
    pub shell: ShellConfig,

    /// Event store
    #[serde(default)]
    pub database: DatabaseConfig,

    /// HTTP API (server management + actuator endpoints)
    #[serde(default)]
    pub api: ApiConfig,

    /// Prometheus metrics
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Event bus tuning
    #[serde(default)]
    pub event_bus: EventBusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Start the default shell server at boot
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_shell_host")]
    pub host: String,

    #[serde(default = "default_shell_port")]
    pub port: u16,

    #[serde(default = "default_shell_username")]
    pub username: String,

    #[serde(default = "default_shell_password")]
    pub password: String,

    /// Private host key presented to clients
    /// Default: ~/.ssh/think_id_rsa
    #[serde(default = "default_host_key_path")]
    pub host_key_path: PathBuf,

    /// OpenSSH authorized_keys file for public key login.
    /// When unset, public key login is rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_keys_path: Option<PathBuf>,

    /// Idle connections are dropped after this many seconds
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_secs: u64,

    /// Print the status line after every command
    #[serde(default)]
    pub status_line: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_shell_host(),
            port: default_shell_port(),
            username: default_shell_username(),
            password: default_shell_password(),
            host_key_path: default_host_key_path(),
            authorized_keys_path: None,
            inactivity_timeout_secs: default_inactivity_timeout(),
            status_line: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. In-memory storage when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply embedded migrations at startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn storage_backend(&self) -> StorageBackend {
        match &self.url {
            Some(url) => StorageBackend::PostgreSQL(PostgresConfig {
                connection_string: url.clone(),
                max_connections: self.max_connections,
            }),
            None => StorageBackend::InMemory,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics exposition on /actuator/prometheus
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Events fetched per repository page during replay
    #[serde(default = "default_replay_page_size")]
    pub replay_page_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            replay_page_size: default_replay_page_size(),
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_shell_host() -> String {
    "127.0.0.1".to_string()
}

fn default_shell_port() -> u16 {
    2222
}

fn default_shell_username() -> String {
    "admin".to_string()
}

fn default_shell_password() -> String {
    "password".to_string()
}

fn default_host_key_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ssh")
        .join("think_id_rsa")
}

fn default_inactivity_timeout() -> u64 {
    3600
}

fn default_max_connections() -> u32 {
    5
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_replay_page_size() -> usize {
    1000
}

impl Default for OrbitConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "thinkorbit".to_string(),
                labels: None,
            },
            spec: OrbitConfigSpec::default(),
        }
    }
}

impl OrbitConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. THINKORBIT_CONFIG_PATH environment variable
    /// 2. ./thinkorbit-config.yaml (working directory)
    /// 3. ~/.thinkorbit/config.yaml (user home)
    /// 4. /etc/thinkorbit/config.yaml (system, Unix) or C:\ProgramData\ThinkOrbit\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("THINKORBIT_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./thinkorbit-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".thinkorbit").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/thinkorbit/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\ThinkOrbit\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // 1. Explicit CLI path (Fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        // 2. Discovery (Env -> Cwd -> Home -> System)
        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to override config via env vars
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("THINKORBIT_SHELL_ENABLED") {
            match parse_flag(&val) {
                Some(enabled) => {
                    tracing::info!("Environment override: THINKORBIT_SHELL_ENABLED={}", enabled);
                    self.spec.shell.enabled = enabled;
                }
                None => tracing::warn!(
                    "Invalid value for THINKORBIT_SHELL_ENABLED: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("THINKORBIT_SHELL_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: THINKORBIT_SHELL_PORT={}", port);
                    self.spec.shell.port = port;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for THINKORBIT_SHELL_PORT: '{}'. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("THINKORBIT_SHELL_PASSWORD") {
            tracing::info!("Environment override: THINKORBIT_SHELL_PASSWORD=<redacted>");
            self.spec.shell.password = val;
        }

        if let Some(val) = lookup("THINKORBIT_DATABASE_URL") {
            tracing::info!("Environment override: THINKORBIT_DATABASE_URL");
            self.spec.database.url = if val.trim().is_empty() { None } else { Some(val) };
        }

        if let Some(val) = lookup("THINKORBIT_API_ENABLED") {
            match parse_flag(&val) {
                Some(enabled) => {
                    tracing::info!("Environment override: THINKORBIT_API_ENABLED={}", enabled);
                    self.spec.api.enabled = enabled;
                }
                None => tracing::warn!(
                    "Invalid value for THINKORBIT_API_ENABLED: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let shell = &self.spec.shell;
        if shell.port == 0 {
            anyhow::bail!("spec.shell.port cannot be 0");
        }
        if shell.host.is_empty() {
            anyhow::bail!("spec.shell.host cannot be empty");
        }
        if shell.username.is_empty() || shell.password.is_empty() {
            anyhow::bail!("spec.shell credentials cannot be empty");
        }

        if self.spec.api.enabled && self.spec.api.port == 0 {
            anyhow::bail!("spec.api.port cannot be 0 when the API is enabled");
        }

        if let Some(url) = &self.spec.database.url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                anyhow::bail!("spec.database.url must be a postgres:// connection string");
            }
        }

        if self.spec.event_bus.replay_page_size == 0 {
            anyhow::bail!("spec.event_bus.replay_page_size must be greater than 0");
        }

        Ok(())
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_selection() {
        let mut database = DatabaseConfig::default();
        assert!(matches!(database.storage_backend(), StorageBackend::InMemory));

        database.url = Some("postgres://orbit@localhost/orbit".to_string());
        database.max_connections = 9;
        match database.storage_backend() {
            StorageBackend::PostgreSQL(pg) => {
                assert_eq!(pg.connection_string, "postgres://orbit@localhost/orbit");
                assert_eq!(pg.max_connections, 9);
            }
            StorageBackend::InMemory => panic!("expected postgres backend"),
        }
    }

    #[test]
    fn test_default_manifest() {
        let manifest = OrbitConfigManifest::default();
        assert_eq!(manifest.api_version, "thinkorbit/v1");
        assert_eq!(manifest.kind, "OrbitConfig");
        assert!(manifest.spec.shell.enabled);
        assert_eq!(manifest.spec.shell.host, "127.0.0.1");
        assert_eq!(manifest.spec.shell.port, 2222);
        assert_eq!(manifest.spec.shell.username, "admin");
        assert!(manifest.spec.shell.host_key_path.ends_with(".ssh/think_id_rsa"));
        assert!(manifest.spec.database.url.is_none());
        assert_eq!(manifest.spec.event_bus.replay_page_size, 1000);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
apiVersion: thinkorbit/v1
kind: OrbitConfig
metadata:
  name: lab-node
spec:
  shell:
    port: 2300
    status_line: true
  api:
    enabled: true
"#;
        let manifest = OrbitConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.metadata.name, "lab-node");
        assert_eq!(manifest.spec.shell.port, 2300);
        assert!(manifest.spec.shell.status_line);
        assert_eq!(manifest.spec.shell.username, "admin");
        assert!(manifest.spec.api.enabled);
        assert_eq!(manifest.spec.api.port, 8080);
        assert!(manifest.spec.metrics.enabled);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thinkorbit-config.yaml");

        let mut manifest = OrbitConfigManifest::default();
        manifest.spec.database.url = Some("postgres://orbit@localhost/orbit".to_string());
        manifest.to_yaml_file(&path).unwrap();

        let loaded = OrbitConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(
            loaded.spec.database.url.as_deref(),
            Some("postgres://orbit@localhost/orbit")
        );
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let result = OrbitConfigManifest::load_or_default(Some(PathBuf::from("/nonexistent/orbit.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides() {
        let mut manifest = OrbitConfigManifest::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("THINKORBIT_SHELL_ENABLED", "off"),
            ("THINKORBIT_SHELL_PORT", "2400"),
            ("THINKORBIT_DATABASE_URL", "postgres://db/orbit"),
            ("THINKORBIT_API_ENABLED", "maybe"),
        ]);
        manifest.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert!(!manifest.spec.shell.enabled);
        assert_eq!(manifest.spec.shell.port, 2400);
        assert_eq!(manifest.spec.database.url.as_deref(), Some("postgres://db/orbit"));
        // invalid flag is ignored
        assert!(!manifest.spec.api.enabled);
    }

    #[test]
    fn test_validation() {
        let mut manifest = OrbitConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.shell.password = String::new();
        assert!(manifest.validate().is_err());
        manifest.spec.shell.password = "secret".to_string();

        manifest.spec.database.url = Some("mysql://nope".to_string());
        assert!(manifest.validate().is_err());
        manifest.spec.database.url = None;

        manifest.spec.event_bus.replay_page_size = 0;
        assert!(manifest.validate().is_err());
    }
}
