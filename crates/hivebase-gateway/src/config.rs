use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context};
use config::Config;
use serde::{Deserialize, Serialize};

use hivebase_admission::prelude::BucketConfig;
use hivebase_analytics::prelude::RetryPolicy;
use hivebase_auth::prelude::{AdminSecrets, GateConfig};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub admission: AdmissionSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub backend: BackendSettings,
    /// Adds X-Debug-* resolution headers to responses.
    #[serde(default)]
    pub debug: bool,
}

impl GatewayConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_file = env::var("HIVE_GATEWAY_CONFIG_FILE")
            .unwrap_or_else(|_| "config/gateway.local.toml".to_string());

        let mut builder = Config::builder()
            .set_default("server.address", ServerConfig::default_address())?
            .set_default("server.port", ServerConfig::default_port())?;

        if Path::new(&config_file).exists() {
            builder = builder.add_source(config::File::from(Path::new(&config_file)));
        }

        builder =
            builder.add_source(config::Environment::with_prefix("HIVE_GATEWAY").separator("__"));

        let config: GatewayConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        Ok(config)
    }
}

fn resolve_secret_source(
    literal: &Option<String>,
    env_key: &Option<String>,
    file_path: &Option<String>,
    field: &str,
) -> anyhow::Result<Option<String>> {
    if let Some(env_var) = env_key.as_ref() {
        let value = env::var(env_var)
            .with_context(|| format!("environment variable {env_var} for {field} not set"))?;
        return Ok(Some(value));
    }
    if let Some(path) = file_path.as_ref() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read secret file {path} for {field}"))?;
        return Ok(Some(contents.trim().to_string()));
    }
    if let Some(value) = literal.as_ref() {
        if value.is_empty() {
            return Err(anyhow!("{field} literal secret cannot be empty"));
        }
        return Ok(Some(value.clone()));
    }
    Ok(None)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_address")]
    pub address: String,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_address() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        8080
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: Self::default_address(),
            port: Self::default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub admin_secret: Option<String>,
    #[serde(default)]
    pub admin_secret_env: Option<String>,
    #[serde(default)]
    pub admin_secret_file: Option<String>,
    #[serde(default)]
    pub refill_secret: Option<String>,
    #[serde(default)]
    pub refill_secret_env: Option<String>,
    #[serde(default)]
    pub refill_secret_file: Option<String>,
    #[serde(default = "AuthSettings::default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "AuthSettings::default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl AuthSettings {
    fn default_session_cookie() -> String {
        "hive_session".to_string()
    }

    fn default_lookup_timeout_ms() -> u64 {
        5_000
    }

    pub fn admin_secrets(&self) -> anyhow::Result<AdminSecrets> {
        Ok(AdminSecrets {
            admin: resolve_secret_source(
                &self.admin_secret,
                &self.admin_secret_env,
                &self.admin_secret_file,
                "auth.admin_secret",
            )?,
            refill: resolve_secret_source(
                &self.refill_secret,
                &self.refill_secret_env,
                &self.refill_secret_file,
                "auth.refill_secret",
            )?,
        })
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            admin_secret: None,
            admin_secret_env: None,
            admin_secret_file: None,
            refill_secret: None,
            refill_secret_env: None,
            refill_secret_file: None,
            session_cookie: Self::default_session_cookie(),
            lookup_timeout_ms: Self::default_lookup_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdmissionSettings {
    #[serde(default = "AdmissionSettings::default_capacity")]
    pub capacity: f64,
    #[serde(default = "AdmissionSettings::default_refill_interval_ms")]
    pub refill_interval_ms: u64,
    #[serde(default = "AdmissionSettings::default_default_debit")]
    pub default_debit: f64,
    #[serde(default = "AdmissionSettings::default_idle_ttl_ms")]
    pub idle_ttl_ms: u64,
}

impl AdmissionSettings {
    fn default_capacity() -> f64 {
        1.0
    }

    fn default_refill_interval_ms() -> u64 {
        60_000
    }

    fn default_default_debit() -> f64 {
        0.02
    }

    fn default_idle_ttl_ms() -> u64 {
        600_000
    }

    pub fn bucket_config(&self) -> BucketConfig {
        BucketConfig {
            capacity: self.capacity,
            refill_interval: Duration::from_millis(self.refill_interval_ms),
            default_debit: self.default_debit,
            idle_ttl: Duration::from_millis(self.idle_ttl_ms),
        }
    }
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
            refill_interval_ms: Self::default_refill_interval_ms(),
            default_debit: Self::default_default_debit(),
            idle_ttl_ms: Self::default_idle_ttl_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyticsSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "AnalyticsSettings::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "AnalyticsSettings::default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl AnalyticsSettings {
    fn default_timeout_ms() -> u64 {
        10_000
    }

    fn default_queue_capacity() -> usize {
        256
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            timeout_ms: Self::default_timeout_ms(),
            queue_capacity: Self::default_queue_capacity(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendSettings {
    /// Loopback backend that echoes the prompt; the default for local runs.
    Echo,
    Http {
        base_url: String,
        #[serde(default = "BackendSettings::default_timeout_ms")]
        timeout_ms: u64,
    },
}

impl BackendSettings {
    fn default_timeout_ms() -> u64 {
        120_000
    }

    pub fn timeout(&self) -> Duration {
        match self {
            BackendSettings::Echo => Duration::from_secs(30),
            BackendSettings::Http { timeout_ms, .. } => Duration::from_millis(*timeout_ms),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings::Echo
    }
}
