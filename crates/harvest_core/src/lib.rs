//! Harvest core: pure record model, normalization and aggregation.
mod aggregate;
mod normalize;
mod record;

pub use aggregate::{
    aggregate, first_year, AggregateOptions, AggregateSummary, CategoryScores, CountryBucket,
    Spread, YearMean, YearScore,
};
pub use normalize::{
    normalize, normalize_chart_entry, normalize_listing, split_info_block, InfoLine,
    NormalizeError, INFO_SEPARATOR, LIST_JOIN,
};
pub use record::{ChartEntry, RawItem, RawListing, Record, SCORE_MAX, SCORE_MIN};
