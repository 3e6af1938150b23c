use serde::{Deserialize, Serialize};

/// Lowest score the ranked lists publish.
pub const SCORE_MIN: f64 = 0.0;
/// Highest score the ranked lists publish.
pub const SCORE_MAX: f64 = 10.0;

/// One normalized item of a ranked list.
///
/// Field order is the export column order. `year`, `country`, `genre` and
/// `info` are empty when the source did not provide them; the remaining
/// optional fields are `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub rank: Option<u32>,
    pub title: String,
    pub score: Option<String>,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub info: String,
    pub vote_count: Option<u64>,
    pub release_date: Option<String>,
    pub actors: Option<String>,
    pub url: Option<String>,
    pub cover_url: Option<String>,
}

impl Record {
    /// Header row of the exported table, in serialization order.
    pub const COLUMNS: [&'static str; 12] = [
        "rank",
        "title",
        "score",
        "year",
        "country",
        "genre",
        "info",
        "vote_count",
        "release_date",
        "actors",
        "url",
        "cover_url",
    ];

    /// Parsed score, `None` when absent, unparseable or out of range.
    pub fn score_value(&self) -> Option<f64> {
        self.score.as_deref().and_then(parse_score)
    }
}

pub(crate) fn parse_score(text: &str) -> Option<f64> {
    let value = text.trim().parse::<f64>().ok()?;
    if value.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(&value) {
        Some(value)
    } else {
        None
    }
}

/// Text scraped from one `li` of an HTML ranked list, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawListing {
    pub rank: Option<String>,
    pub title: Option<String>,
    pub rating: Option<String>,
    /// Multi-line block: display info on the first line, `year / country / genre` on the second.
    pub info_block: Option<String>,
    pub votes: Option<String>,
    pub url: Option<String>,
    pub cover_url: Option<String>,
}

/// One object of the JSON chart endpoint. Every key may be missing or null.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ChartEntry {
    pub rank: Option<u32>,
    pub title: Option<String>,
    /// Usually a string such as `"9.7"`, occasionally a bare number.
    pub score: Option<serde_json::Value>,
    pub vote_count: Option<u64>,
    pub release_date: Option<String>,
    pub regions: Option<Vec<String>>,
    pub types: Option<Vec<String>>,
    /// A list of names, or a single pre-joined string.
    pub actors: Option<serde_json::Value>,
    pub url: Option<String>,
    pub cover_url: Option<String>,
}

/// A parsed but not yet normalized source item.
#[derive(Debug, Clone, PartialEq)]
pub enum RawItem {
    Listing(RawListing),
    Chart(ChartEntry),
}
