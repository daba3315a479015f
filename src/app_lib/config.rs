//! Client configuration with build-time defaults and runtime overrides. The
//! runtime values are read from the process environment so the same binary can
//! point at different backends. Only the admin password is secret; it is kept in
//! a `SecretString` and never printed.

use secrecy::SecretString;
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_POLL_SECONDS: u64 = 10;
pub const DEFAULT_SECOND_FACTOR_TTL_SECONDS: u64 = 300;

const ENV_API_BASE_URL: &str = "ZEROTRUST_API_BASE_URL";
const ENV_ADMIN_USERNAME: &str = "ZEROTRUST_ADMIN_USERNAME";
const ENV_ADMIN_PASSWORD: &str = "ZEROTRUST_ADMIN_PASSWORD";
const ENV_STORE_DIR: &str = "ZEROTRUST_STORE_DIR";

/// Settings shared by the gateway, the credential store and the session.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub admin_username: String,
    pub admin_password: SecretString,
    pub store_dir: PathBuf,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub second_factor_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            admin_username: String::new(),
            admin_password: SecretString::default(),
            store_dir: default_store_dir(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECONDS),
            second_factor_ttl: Duration::from_secs(DEFAULT_SECOND_FACTOR_TTL_SECONDS),
        }
    }
}

impl ClientConfig {
    /// Config pointing at `api_base_url`, everything else defaulted.
    #[must_use]
    pub fn new(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim().to_string(),
            ..Self::default()
        }
    }

    /// Loads config from build-time environment variables and applies runtime overrides.
    #[must_use]
    pub fn load() -> Self {
        let api_base_url = option_env!("ZEROTRUST_API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL);
        let admin_username = option_env!("ZEROTRUST_ADMIN_USERNAME").unwrap_or("");

        let mut config = Self {
            api_base_url: api_base_url.to_string(),
            admin_username: admin_username.to_string(),
            ..Self::default()
        };

        apply_runtime_overrides(&mut config, runtime_config());

        config
    }

    /// Sets the fixed privileged credential pair used by the admin client.
    #[must_use]
    pub fn with_admin_credentials(mut self, username: &str, password: SecretString) -> Self {
        self.admin_username = username.trim().to_string();
        self.admin_password = password;
        self
    }

    #[must_use]
    pub fn with_store_dir(mut self, store_dir: PathBuf) -> Self {
        self.store_dir = store_dir;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_second_factor_ttl(mut self, ttl: Duration) -> Self {
        self.second_factor_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[derive(Default)]
struct RuntimeConfig {
    api_base_url: Option<String>,
    admin_username: Option<String>,
    admin_password: Option<String>,
    store_dir: Option<String>,
}

fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        api_base_url: read_runtime_value(ENV_API_BASE_URL),
        admin_username: read_runtime_value(ENV_ADMIN_USERNAME),
        admin_password: read_runtime_value(ENV_ADMIN_PASSWORD),
        store_dir: read_runtime_value(ENV_STORE_DIR),
    }
}

fn apply_runtime_overrides(config: &mut ClientConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.api_base_url {
        config.api_base_url = value;
    }
    if let Some(value) = runtime.admin_username {
        config.admin_username = value;
    }
    if let Some(value) = runtime.admin_password {
        config.admin_password = SecretString::from(value);
    }
    if let Some(value) = runtime.store_dir {
        config.store_dir = PathBuf::from(value);
    }
}

fn read_runtime_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|value| normalize_runtime_value(&value))
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `$HOME/.zerotrust`, or a directory under the system temp dir when `HOME` is unset.
fn default_store_dir() -> PathBuf {
    env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map_or_else(env::temp_dir, PathBuf::from)
        .join(".zerotrust")
}
