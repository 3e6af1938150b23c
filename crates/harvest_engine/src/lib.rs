//! Harvest engine: fetching, paginating, persisting and reporting ranked lists.
#[cfg(feature = "charts")]
mod chart;
mod decode;
mod export;
mod fetch;
mod filename;
mod paginate;
mod parse;
mod persist;
mod report;
mod source;
mod types;

pub use decode::{decode_payload, DecodeError, DecodedPayload};
pub use export::{export_records, read_records, records_to_csv, ExportError, ExportSummary, UTF8_BOM};
pub use fetch::{FetchRequest, FetchSettings, Fetcher, ReqwestFetcher};
pub use filename::{sanitize_stem, timestamped_fallback};
pub use paginate::{Harvest, LogProgressSink, Paginator, ProgressSink};
pub use parse::{parse_chart_count, parse_chart_page, parse_listing_count, parse_listing_page};
pub use persist::{ensure_output_dir, write_atomic, write_with_fallback, PersistError, WriteOutcome};
pub use report::{ChartArtifact, ChartKind, ReportError, Reporter};
pub use source::{ChartSource, PageSource, Top250Source, DEFAULT_BASE_URL};
pub use types::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, HarvestError, HarvestEvent, ParseError,
};
