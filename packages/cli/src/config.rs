use anyhow::Context;
use optclause_evaluator::{
    Evaluator, RenderOptions, TemplateTextProvider, DEFAULT_BEGIN_TEMPLATE,
    DEFAULT_CACHE_CAPACITY, DEFAULT_END_TEMPLATE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "optclause.config.json";

/// Optclause configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Render without markers, brackets or footers
    #[serde(default)]
    pub preview_only: bool,

    /// Schedule tag handed to every rendered leaf
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_num: Option<u32>,

    /// Marker templates for options in their default state
    #[serde(default)]
    pub markers: Markers,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Markers {
    /// Begin marker, `{id}` and `{name}` are substituted
    #[serde(default = "default_begin")]
    pub begin: String,

    /// End marker, rendered as the option's footer
    #[serde(default = "default_end")]
    pub end: String,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_begin() -> String {
    DEFAULT_BEGIN_TEMPLATE.to_string()
}

fn default_end() -> String {
    DEFAULT_END_TEMPLATE.to_string()
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            begin: default_begin(),
            end: default_end(),
        }
    }
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Load an explicitly named config file, which must exist
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn resolve(cwd: &str, explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => Self::load(cwd),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            preview_only: self.preview_only,
            schedule_num: self.schedule_num,
        }
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new()
            .with_provider(TemplateTextProvider::new(
                self.markers.begin.clone(),
                self.markers.end.clone(),
            ))
            .with_cache_capacity(self.cache_capacity)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preview_only: false,
            schedule_num: None,
            markers: Markers::default(),
            cache_capacity: default_cache_capacity(),
        }
    }
}
