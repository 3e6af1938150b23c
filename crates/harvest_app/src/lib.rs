//! Command-line front end: settings resolution, logger setup and the
//! harvest → export → report pipeline.
pub mod cli;
pub mod config;
pub mod logging;
pub mod run;

pub use cli::{Args, SourceArg};
pub use config::{ConfigError, HarvestConfig, SourceKind};
pub use run::{run, RunReport};
