use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::SourceKind;

/// Harvest a ranked movie list into CSV and render summary charts.
#[derive(Debug, Default, Parser)]
#[command(name = "harvest", version, about)]
pub struct Args {
    /// RON file with run settings; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Which list to harvest
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    /// Chart category identifier (chart source only)
    #[arg(long)]
    pub type_id: Option<u32>,

    /// Chart time-window identifier, e.g. "100:90" (chart source only)
    #[arg(long)]
    pub interval_id: Option<String>,

    /// Items requested per page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// CSV output path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for chart images
    #[arg(long)]
    pub chart_dir: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Pause between page requests, in milliseconds
    #[arg(long)]
    pub cooldown_ms: Option<u64>,

    /// Genre substring selecting the titles of the distribution chart
    #[arg(long)]
    pub category_marker: Option<String>,

    /// Site root, e.g. for a mirror or a local test server
    #[arg(long)]
    pub base_url: Option<String>,

    /// Also write the log to ./harvest.log
    #[arg(long)]
    pub log_file: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Top250,
    Chart,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Top250 => SourceKind::Top250,
            SourceArg::Chart => SourceKind::Chart,
        }
    }
}
