use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::record::Record;

const YEAR_PATTERN: &str = r"\d{4}";
const COUNTRY_SPLIT_PATTERN: &str = r"[\s/,，、]+";

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(YEAR_PATTERN).expect("year pattern compiles"));
static COUNTRY_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COUNTRY_SPLIT_PATTERN).expect("country pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    pub top_countries: usize,
    pub other_label: String,
    /// Substring matched against the genre field.
    pub category_marker: String,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_countries: 8,
            other_label: "其他".to_string(),
            category_marker: "剧情".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearScore {
    pub year: u16,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearMean {
    pub year: u16,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryBucket {
    pub label: String,
    pub count: usize,
}

/// Five-number summary of a score set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryScores {
    NoData { marker: String },
    Scores { marker: String, scores: Vec<f64> },
}

impl CategoryScores {
    pub fn marker(&self) -> &str {
        match self {
            CategoryScores::NoData { marker } | CategoryScores::Scores { marker, .. } => marker,
        }
    }

    pub fn scores(&self) -> &[f64] {
        match self {
            CategoryScores::NoData { .. } => &[],
            CategoryScores::Scores { scores, .. } => scores,
        }
    }

    /// Quartiles by linear interpolation; `None` for the no-data case.
    pub fn spread(&self) -> Option<Spread> {
        let mut sorted = self.scores().to_vec();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        Some(Spread {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSummary {
    /// Every record with both a year and a score, in record order.
    pub year_points: Vec<YearScore>,
    /// Mean score per year, ascending by year.
    pub year_means: Vec<YearMean>,
    /// Top countries by count, plus an "other" bucket when the tail is non-empty.
    pub countries: Vec<CountryBucket>,
    pub category: CategoryScores,
}

impl AggregateSummary {
    pub fn country_total(&self) -> usize {
        self.countries.iter().map(|b| b.count).sum()
    }
}

/// First run of four ASCII digits anywhere in `text`.
pub fn first_year(text: &str) -> Option<&str> {
    YEAR_RE.find(text).map(|m| m.as_str())
}

pub fn aggregate(records: &[Record], options: &AggregateOptions) -> AggregateSummary {
    let year_points = year_points(records);
    AggregateSummary {
        year_means: year_means(&year_points),
        year_points,
        countries: country_histogram(records, options),
        category: category_scores(records, &options.category_marker),
    }
}

fn year_points(records: &[Record]) -> Vec<YearScore> {
    records
        .iter()
        .filter_map(|record| {
            let year = first_year(&record.year)?.parse::<u16>().ok()?;
            let score = record.score_value()?;
            Some(YearScore { year, score })
        })
        .collect()
}

fn year_means(points: &[YearScore]) -> Vec<YearMean> {
    let mut grouped: BTreeMap<u16, (f64, usize)> = BTreeMap::new();
    for point in points {
        let slot = grouped.entry(point.year).or_insert((0.0, 0));
        slot.0 += point.score;
        slot.1 += 1;
    }
    grouped
        .into_iter()
        .map(|(year, (sum, count))| YearMean {
            year,
            mean: round_one_decimal(sum / count as f64),
            count,
        })
        .collect()
}

fn country_histogram(records: &[Record], options: &AggregateOptions) -> Vec<CountryBucket> {
    let splitter = &*COUNTRY_SPLIT_RE;

    // Insertion order doubles as the first-seen tie breaker.
    let mut counts: Vec<CountryBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let mut seen_here = HashSet::new();
        for token in splitter.split(&record.country).filter(|t| !t.is_empty()) {
            if !seen_here.insert(token) {
                continue;
            }
            match index.get(token) {
                Some(&slot) => counts[slot].count += 1,
                None => {
                    index.insert(token.to_string(), counts.len());
                    counts.push(CountryBucket {
                        label: token.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    if counts.len() > options.top_countries {
        let rest: usize = counts
            .drain(options.top_countries..)
            .map(|b| b.count)
            .sum();
        counts.push(CountryBucket {
            label: options.other_label.clone(),
            count: rest,
        });
    }
    counts
}

fn category_scores(records: &[Record], marker: &str) -> CategoryScores {
    let scores: Vec<f64> = records
        .iter()
        .filter(|r| !marker.is_empty() && r.genre.contains(marker))
        .filter_map(Record::score_value)
        .collect();
    if scores.is_empty() {
        CategoryScores::NoData {
            marker: marker.to_string(),
        }
    } else {
        CategoryScores::Scores {
            marker: marker.to_string(),
            scores,
        }
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
