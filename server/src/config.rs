use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::engine::validation::DEFAULT_PAGE_LIMIT;

/// Top-level server configuration, loaded from inbox.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub data: DataSection,
    pub tickets: TicketsSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub web_address: String,
    /// The single origin allowed by CORS (the moderator frontend).
    pub cors_origin: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            web_address: "0.0.0.0:5001".into(),
            cors_origin: "http://localhost:3000".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// JSON document holding `tickets` and `messages`. Rewritten on every
    /// status change.
    pub file: PathBuf,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            file: PathBuf::from("../data/awesome_tickets.json"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TicketsSection {
    pub default_page_size: usize,
}

impl Default for TicketsSection {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WEB_ADDRESS") {
            self.server.web_address = v;
        }
        if let Ok(v) = std::env::var("CORS_ORIGIN") {
            self.server.cors_origin = v;
        }
        if let Ok(v) = std::env::var("DATA_FILE") {
            self.data.file = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DEFAULT_PAGE_SIZE")
            && let Ok(size) = v.parse()
        {
            self.tickets.default_page_size = size;
        }
    }
}
