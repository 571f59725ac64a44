use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://zorro-project.com/manual/";
pub const DEFAULT_TOC_PATH: &str = "ht_contents.htm";
pub const DEFAULT_OUTPUT_DIR: &str = "zorro_docs";
pub const DEFAULT_DELAY_MS: u64 = 500;

/// Everything a run needs to know, resolved once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub toc_path: String,
    pub output_dir: String,
    pub delay_ms: u64,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: DEFAULT_BASE_URL.to_string(),
            toc_path: DEFAULT_TOC_PATH.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            delay_ms: DEFAULT_DELAY_MS,
            limit: None,
        }
    }
}

impl Settings {
    /// Built-in defaults overlaid with `ZDOC_*` environment variables.
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("toc_path", DEFAULT_TOC_PATH)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("delay_ms", DEFAULT_DELAY_MS as i64)?
            .add_source(Environment::with_prefix("ZDOC").try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("Invalid base url {:?}", self.base_url))
    }

    pub fn toc_url(&self) -> Result<Url> {
        let base = self.base_url()?;
        base.join(&self.toc_path)
            .with_context(|| format!("Invalid TOC path {:?}", self.toc_path))
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
