use crate::app_lib::ClientConfig;
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};

/// Connection settings shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub api_base_url: Option<String>,
    pub store_dir: Option<PathBuf>,
    pub admin_username: Option<String>,
    pub admin_password: Option<SecretString>,
    pub timeout: Option<Duration>,
}

impl GlobalArgs {
    #[must_use]
    pub fn from_matches(matches: &clap::ArgMatches) -> Self {
        Self {
            api_base_url: matches.get_one::<String>("api-url").cloned(),
            store_dir: matches.get_one::<PathBuf>("store-dir").cloned(),
            admin_username: matches.get_one::<String>("admin-username").cloned(),
            admin_password: matches
                .get_one::<String>("admin-password")
                .map(|password| SecretString::from(password.clone())),
            timeout: matches
                .get_one::<u64>("timeout")
                .map(|seconds| Duration::from_secs(*seconds)),
        }
    }

    /// Layers the command-line values over [`ClientConfig::load`].
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        self.apply(ClientConfig::load())
    }

    fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = self.api_base_url.as_deref().map(str::trim) {
            if !url.is_empty() {
                config.api_base_url = url.to_string();
            }
        }
        if let Some(dir) = &self.store_dir {
            config.store_dir.clone_from(dir);
        }
        if let Some(username) = &self.admin_username {
            config.admin_username = username.trim().to_string();
        }
        if let Some(password) = &self.admin_password {
            config.admin_password = password.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = timeout;
        }
        config
    }
}
