//! # Client Configuration
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults          http://127.0.0.1:5000, 5 s timeouts, ./invoices   │
//! │  2. TOML file         --config <path>, or the platform config dir:      │
//! │                         ~/.config/pharmabill/config.toml (Linux)        │
//! │  3. Environment       PHARMABILL_API_URL, PHARMABILL_SHOP_NAME, ...     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:5000"
//! request_timeout_secs = 5
//! connect_timeout_secs = 3
//!
//! [shop]
//! name = "Green Cross Pharmacy"
//! address_lines = ["12 MG Road", "Pune 411001"]
//! phone = "020-1234567"
//! licence_no = "MH-PZ-1234"
//!
//! [invoice]
//! output_dir = "/var/lib/pharmabill/invoices"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use pharmabill_core::ShopIdentity;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request deadline, connect included.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout() -> u64 {
    5
}

fn default_connect_timeout() -> u64 {
    3
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("invoices")
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub shop: ShopIdentity,

    #[serde(default)]
    pub invoice: InvoiceSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicit `config_path` must exist; the platform default may be
    /// missing, in which case defaults are used.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::LoadFailed(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                Self::from_file(&path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Reads a TOML file without applying overrides or validating.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading client config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.base_url()?;

        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.api.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.shop.name.trim().is_empty() {
            return Err(ConfigError::Invalid("shop name must not be empty".into()));
        }

        Ok(())
    }

    /// Parsed backend URL; only http and https are accepted.
    pub fn base_url(&self) -> ConfigResult<Url> {
        let url = Url::parse(&self.api.base_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidUrl(format!(
                "backend URL must use http or https, got: {}",
                other
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_secs)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `PHARMABILL_*` overrides from `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("PHARMABILL_API_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.api.base_url = url;
        }

        if let Some(secs) = lookup("PHARMABILL_REQUEST_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.request_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid PHARMABILL_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Some(secs) = lookup("PHARMABILL_CONNECT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.connect_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid PHARMABILL_CONNECT_TIMEOUT_SECS"),
            }
        }

        if let Some(name) = lookup("PHARMABILL_SHOP_NAME") {
            self.shop.name = name;
        }

        if let Some(phone) = lookup("PHARMABILL_SHOP_PHONE") {
            self.shop.phone = Some(phone);
        }

        if let Some(licence) = lookup("PHARMABILL_SHOP_LICENCE") {
            self.shop.licence_no = Some(licence);
        }

        if let Some(dir) = lookup("PHARMABILL_INVOICE_DIR") {
            debug!(dir = %dir, "Overriding invoice directory from environment");
            self.invoice.output_dir = PathBuf::from(dir);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pharmabill", "pharmabill")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
