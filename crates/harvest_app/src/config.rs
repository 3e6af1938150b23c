//! Run settings: defaults, an optional RON file, then command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use harvest_engine::{Top250Source, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Args;

/// Page size of the chart endpoint when none is configured.
pub const CHART_PAGE_SIZE: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceKind {
    /// Paginated HTML list of the 250 top-rated titles.
    Top250,
    /// JSON chart endpoints filtered by category and score window.
    #[default]
    Chart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub source: SourceKind,
    pub type_id: u32,
    pub interval_id: String,
    /// `None` picks the source's natural page size.
    pub page_size: Option<usize>,
    /// `None` picks a file name after the source.
    pub output: Option<PathBuf>,
    pub chart_dir: PathBuf,
    pub charts: bool,
    pub category_marker: String,
    pub cooldown_ms: u64,
    pub request_timeout_secs: u64,
    pub base_url: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Chart,
            type_id: 10,
            interval_id: "100:90".to_string(),
            page_size: None,
            output: None,
            chart_dir: PathBuf::from("charts"),
            charts: true,
            category_marker: "剧情".to_string(),
            cooldown_ms: 1000,
            request_timeout_secs: 15,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl HarvestConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// File values (or defaults), with every flag given on the command line on top.
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(args);
        if config.page_size == Some(0) {
            return Err(ConfigError::ZeroPageSize);
        }
        Ok(config)
    }

    pub fn apply(&mut self, args: &Args) {
        if let Some(source) = args.source {
            self.source = source.into();
        }
        if let Some(type_id) = args.type_id {
            self.type_id = type_id;
        }
        if let Some(interval_id) = &args.interval_id {
            self.interval_id = interval_id.clone();
        }
        if args.page_size.is_some() {
            self.page_size = args.page_size;
        }
        if let Some(output) = &args.output {
            self.output = Some(output.clone());
        }
        if let Some(dir) = &args.chart_dir {
            self.chart_dir = dir.clone();
        }
        if args.no_charts {
            self.charts = false;
        }
        if let Some(ms) = args.cooldown_ms {
            self.cooldown_ms = ms;
        }
        if let Some(marker) = &args.category_marker {
            self.category_marker = marker.clone();
        }
        if let Some(base) = &args.base_url {
            self.base_url = base.clone();
        }
    }

    pub fn effective_page_size(&self) -> usize {
        self.page_size.unwrap_or(match self.source {
            SourceKind::Top250 => Top250Source::PAGE_SIZE,
            SourceKind::Chart => CHART_PAGE_SIZE,
        })
    }

    pub fn effective_output(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            PathBuf::from(match self.source {
                SourceKind::Top250 => "douban_top250.csv",
                SourceKind::Chart => "douban_chart.csv",
            })
        })
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
