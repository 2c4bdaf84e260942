//! Configuration module for episodebot.
//!
//! Loads typed configuration from `~/.episodebot/config.json`, then lets a
//! handful of environment variables override credentials so the bot can run
//! from a container without a config file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub channels: ChannelsConfig,
    pub catalog: CatalogConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from the default path (`~/.episodebot/config.json`),
    /// falling back to defaults when the file does not exist.
    ///
    /// Environment overrides are applied in both cases.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Get the default config directory path.
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".episodebot")
    }

    /// Apply `TELEGRAM_TOKEN`, `SEASONVAR_TOKEN`, `SOAP4ME_TOKEN` and
    /// `SOAP4ME_SESSION` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("TELEGRAM_TOKEN") {
            let telegram = self.channels.telegram.get_or_insert_with(TelegramConfig::default);
            telegram.token = token;
            telegram.enabled = true;
        }
        if let Some(key) = get("SEASONVAR_TOKEN") {
            self.catalog.seasonvar.api_key = key;
        }
        if let Some(token) = get("SOAP4ME_TOKEN") {
            self.catalog.soap4me.token = token;
        }
        if let Some(session) = get("SOAP4ME_SESSION") {
            self.catalog.soap4me.session = session;
        }
    }

    /// Check the configuration and collect every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(telegram) = &self.channels.telegram {
            if telegram.enabled && telegram.token.trim().is_empty() {
                errors.push(
                    "channels.telegram.token is empty (set it or export TELEGRAM_TOKEN)".to_string(),
                );
            }
        }

        match self.catalog.backend {
            CatalogBackend::Seasonvar => {
                if self.catalog.seasonvar.api_key.trim().is_empty() {
                    errors.push(
                        "catalog.seasonvar.apiKey is empty (set it or export SEASONVAR_TOKEN)"
                            .to_string(),
                    );
                }
            }
            CatalogBackend::Soap4me => {
                if self.catalog.soap4me.token.trim().is_empty() {
                    errors.push(
                        "catalog.soap4me.token is empty (set it or export SOAP4ME_TOKEN)".to_string(),
                    );
                }
                if self.catalog.soap4me.session.trim().is_empty() {
                    errors.push(
                        "catalog.soap4me.session is empty (set it or export SOAP4ME_SESSION)"
                            .to_string(),
                    );
                }
            }
        }

        if self.catalog.max_search_results == 0 {
            errors.push("catalog.maxSearchResults must be at least 1".to_string());
        }

        if self.http.timeout_seconds == 0 {
            errors.push("http.timeoutSeconds must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Write the default config template to disk.
    pub fn write_default_template() -> anyhow::Result<PathBuf> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = serde_json::json!({
            "channels": {
                "telegram": {
                    "enabled": true,
                    "token": "123456:YOUR_BOT_TOKEN",
                    "allowFrom": []
                }
            },
            "catalog": {
                "backend": "seasonvar",
                "seasonvar": {
                    "apiKey": "YOUR_SEASONVAR_KEY"
                },
                "myshows": {
                    "enabled": true
                }
            },
            "http": {
                "timeoutSeconds": 30
            }
        });

        std::fs::write(&path, serde_json::to_string_pretty(&template)?)?;
        Ok(path)
    }
}

// ── Channels Configuration ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: String,
    /// Telegram user ids allowed to talk to the bot. Empty means everyone.
    pub allow_from: Vec<String>,
}

// ── Catalog Configuration ───────────────────────────────────────────

/// Which link backend answers searches and season listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    #[default]
    Seasonvar,
    Soap4me,
}

impl CatalogBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seasonvar => "seasonvar",
            Self::Soap4me => "soap4me",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogConfig {
    pub backend: CatalogBackend,
    pub seasonvar: SeasonvarConfig,
    pub soap4me: Soap4meConfig,
    pub myshows: MyShowsConfig,
    /// Upper bound on shows expanded per search (soap4me fetches every
    /// show's episode list to learn its seasons).
    pub max_search_results: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: CatalogBackend::default(),
            seasonvar: SeasonvarConfig::default(),
            soap4me: Soap4meConfig::default(),
            myshows: MyShowsConfig::default(),
            max_search_results: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeasonvarConfig {
    pub api_key: String,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Soap4meConfig {
    pub token: String,
    pub session: String,
    pub api_base: Option<String>,
    pub storage_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MyShowsConfig {
    pub enabled: bool,
    pub api_base: Option<String>,
}

impl Default for MyShowsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: None,
        }
    }
}

// ── HTTP Configuration ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl HttpConfig {
    /// Build the shared HTTP client used by every catalog backend.
    pub fn build_client(&self) -> anyhow::Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .build()?;
        Ok(client)
    }
}
