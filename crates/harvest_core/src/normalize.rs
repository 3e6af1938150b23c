use serde_json::Value;

use crate::aggregate::first_year;
use crate::record::{parse_score, ChartEntry, RawItem, RawListing, Record};

/// Separator packed between year, country and genre on the info line.
pub const INFO_SEPARATOR: char = '/';
/// Delimiter used to flatten list-typed JSON fields for export.
pub const LIST_JOIN: &str = ",";

const GENRE_JOIN: &str = " / ";
const ACTOR_JOIN: &str = " / ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("item at rank {rank:?} has no title")]
    MissingTitle { rank: Option<u32> },
}

/// The two meaningful lines of an HTML info block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InfoLine {
    pub display: String,
    pub year: String,
    pub country: String,
    pub genre: String,
}

/// Normalize any raw item into a record.
pub fn normalize(item: &RawItem) -> Result<Record, NormalizeError> {
    match item {
        RawItem::Listing(listing) => normalize_listing(listing),
        RawItem::Chart(entry) => normalize_chart_entry(entry),
    }
}

/// Split an HTML info block into display text and the `year / country / genre` parts.
///
/// Blank lines are ignored. Missing lines or parts stay empty.
pub fn split_info_block(block: &str) -> InfoLine {
    let mut lines = block
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let display = lines.next().unwrap_or_default().to_string();
    let Some(packed) = lines.next() else {
        return InfoLine {
            display,
            ..InfoLine::default()
        };
    };

    let parts: Vec<&str> = packed.split(INFO_SEPARATOR).map(str::trim).collect();
    let part = |idx: usize| parts.get(idx).copied().unwrap_or_default().to_string();
    let genre = parts
        .get(2..)
        .map(|rest| rest.join(GENRE_JOIN))
        .unwrap_or_default();

    InfoLine {
        display,
        year: part(0),
        country: part(1),
        genre,
    }
}

pub fn normalize_listing(listing: &RawListing) -> Result<Record, NormalizeError> {
    let rank = listing
        .rank
        .as_deref()
        .and_then(|r| r.trim().parse::<u32>().ok());
    let title = non_empty(listing.title.as_deref()).ok_or(NormalizeError::MissingTitle { rank })?;
    let info = listing
        .info_block
        .as_deref()
        .map(split_info_block)
        .unwrap_or_default();

    Ok(Record {
        rank,
        title,
        score: listing.rating.as_deref().and_then(valid_score_text),
        year: info.year,
        country: info.country,
        genre: info.genre,
        info: info.display,
        vote_count: listing.votes.as_deref().and_then(leading_count),
        release_date: None,
        actors: None,
        url: non_empty(listing.url.as_deref()),
        cover_url: non_empty(listing.cover_url.as_deref()),
    })
}

pub fn normalize_chart_entry(entry: &ChartEntry) -> Result<Record, NormalizeError> {
    let title = non_empty(entry.title.as_deref()).ok_or(NormalizeError::MissingTitle {
        rank: entry.rank,
    })?;
    let release_date = non_empty(entry.release_date.as_deref());
    let year = release_date
        .as_deref()
        .and_then(first_year)
        .unwrap_or_default()
        .to_string();

    Ok(Record {
        rank: entry.rank,
        title,
        score: entry
            .score
            .as_ref()
            .and_then(|v| value_text(v, LIST_JOIN))
            .as_deref()
            .and_then(valid_score_text),
        year,
        country: join_list(entry.regions.as_deref()),
        genre: join_list(entry.types.as_deref()),
        info: String::new(),
        vote_count: entry.vote_count,
        release_date,
        actors: entry.actors.as_ref().and_then(|v| value_text(v, ACTOR_JOIN)),
        url: non_empty(entry.url.as_deref()),
        cover_url: non_empty(entry.cover_url.as_deref()),
    })
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
}

fn valid_score_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    parse_score(trimmed).map(|_| trimmed.to_string())
}

fn join_list(items: Option<&[String]>) -> String {
    items
        .unwrap_or_default()
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(LIST_JOIN)
}

fn value_text(value: &Value, join: &str) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| value_text(item, join))
            .collect::<Vec<_>>()
            .join(join),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

// "2927372人评价" -> 2927372
fn leading_count(text: &str) -> Option<u64> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_count_reads_vote_suffix() {
        assert_eq!(leading_count("2927372人评价"), Some(2_927_372));
        assert_eq!(leading_count("人评价"), None);
    }

    #[test]
    fn value_text_flattens_arrays() {
        let v: Value = serde_json::json!(["a", " b ", 3]);
        assert_eq!(value_text(&v, ","), Some("a,b,3".to_string()));
        assert_eq!(value_text(&Value::Null, ","), None);
        assert_eq!(value_text(&serde_json::json!([]), ","), None);
    }
}
