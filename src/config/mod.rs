use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};

use crate::config::files::FileValueProvider;

pub(crate) mod files;

/// Plain environment variables understood for compatibility with existing
/// deployments, and the configuration key each one sets.
const LEGACY_ENV: [(&str, &str); 5] = [
    ("ENABLE_DELETE_IMAGES", "delete_enabled"),
    ("DOCKER_REGISTRY_URL", "registry.url"),
    ("PUBLIC_REGISTRY_URL", "registry.public_url"),
    ("BASIC_AUTH_USER", "registry.username"),
    ("BASIC_AUTH_PASSWORD", "registry.password"),
];

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListenConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrometheusConfig {
    pub address: String,
    pub port: u16,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 9080,
        }
    }
}

const fn default_timeout() -> u64 {
    30
}

#[derive(Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    pub url: String,
    /// Hostname shown in pull commands when the registry is reached through a
    /// different address internally.
    pub public_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("url", &self.url)
            .field("public_url", &self.public_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            public_url: None,
            username: None,
            password: None,
            timeout: default_timeout(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Configuration {
    pub delete_enabled: bool,
    /// How many times an operation is retried after re-authenticating.
    pub auth_retries: u32,
    pub listen: ListenConfig,
    pub registry: RegistryConfig,
    pub prometheus: PrometheusConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            delete_enabled: false,
            auth_retries: 1,
            listen: ListenConfig::default(),
            registry: RegistryConfig::default(),
            prometheus: PrometheusConfig::default(),
        }
    }
}

impl Configuration {
    pub fn figment(configs: Vec<PathBuf>) -> Figment {
        let fig = Figment::from(Serialized::defaults(Configuration::default()));

        let fig = match AppDirs::new(Some("registry-browser"), true) {
            Some(app_dirs) => {
                let config_path = app_dirs.config_dir.join("config.yaml");
                match config_path.exists() {
                    true => fig.admerge(FileValueProvider::new(Yaml::file(config_path))),
                    false => fig,
                }
            }
            None => fig,
        };

        let fig = configs.into_iter().fold(fig, |fig, config_path| {
            fig.admerge(FileValueProvider::new(Yaml::file(config_path)))
        });

        let names = LEGACY_ENV.map(|(name, _)| name);

        fig.admerge(FileValueProvider::new(
            Env::prefixed("REGISTRY_BROWSER_").split("__"),
        ))
        .admerge(Env::raw().only(&names).map(|key| {
            LEGACY_ENV
                .iter()
                .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                .map(|(_, path)| (*path).into())
                .unwrap_or_else(|| key.as_str().into())
        }))
    }

    pub fn config(figment: Figment) -> Result<Configuration> {
        let mut config: Configuration =
            figment.extract().context("Failed to load configuration")?;

        if !config.registry.url.starts_with("http://")
            && !config.registry.url.starts_with("https://")
        {
            bail!(
                "registry.url must be an http(s) URL, got '{}'",
                config.registry.url
            );
        }

        config.registry.url = config.registry.url.trim_end_matches('/').to_string();

        if config.registry.password.is_some() && config.registry.username.is_none() {
            bail!("registry.password is set but registry.username is not");
        }

        Ok(config)
    }
}
