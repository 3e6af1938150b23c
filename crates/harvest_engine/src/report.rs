use std::path::{Path, PathBuf};

use harvest_core::{AggregateSummary, CategoryScores};
use harvest_logging::{harvest_info, harvest_warn};

use crate::filename::sanitize_stem;
use crate::persist::{write_with_fallback, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("chart rendering unavailable: {0}")]
    Unavailable(&'static str),
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Which chart an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    YearScores,
    CountryShare,
    CategoryScores,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub path: PathBuf,
}

/// Renders aggregate summaries as SVG charts into one directory.
///
/// Construction fails with [`ReportError::Unavailable`] when the crate was
/// built without the `charts` feature; callers skip reporting in that case.
#[derive(Debug, Clone)]
pub struct Reporter {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl Reporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, ReportError> {
        if !Self::is_available() {
            return Err(ReportError::Unavailable(
                "built without the `charts` feature",
            ));
        }
        Ok(Self {
            output_dir: output_dir.into(),
            size: (960, 640),
        })
    }

    pub fn is_available() -> bool {
        cfg!(feature = "charts")
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Best effort: a chart that fails to draw or write is logged and skipped.
    pub fn render(&self, summary: &AggregateSummary) -> Vec<ChartArtifact> {
        let mut artifacts = Vec::new();

        if summary.year_points.is_empty() {
            harvest_info!("no (year, score) pairs; skipping year chart");
        } else {
            self.produce(ChartKind::YearScores, "year_scores.svg", summary, &mut artifacts);
        }

        if summary.countries.is_empty() {
            harvest_info!("no country data; skipping share chart");
        } else {
            self.produce(ChartKind::CountryShare, "country_share.svg", summary, &mut artifacts);
        }

        match &summary.category {
            CategoryScores::NoData { marker } => {
                harvest_info!("no data for category {:?}; skipping distribution chart", marker);
            }
            CategoryScores::Scores { marker, .. } => {
                let name = format!("category_scores_{}.svg", sanitize_stem(marker));
                self.produce(ChartKind::CategoryScores, &name, summary, &mut artifacts);
            }
        }

        artifacts
    }

    fn produce(
        &self,
        kind: ChartKind,
        filename: &str,
        summary: &AggregateSummary,
        artifacts: &mut Vec<ChartArtifact>,
    ) {
        let result = draw(kind, summary, self.size).and_then(|svg| {
            write_with_fallback(&self.output_dir.join(filename), svg.as_bytes())
                .map_err(ReportError::from)
        });
        match result {
            Ok(outcome) => artifacts.push(ChartArtifact {
                kind,
                path: outcome.path,
            }),
            Err(err) => harvest_warn!("chart {:?} not produced: {}", kind, err),
        }
    }
}

#[cfg(feature = "charts")]
fn draw(kind: ChartKind, summary: &AggregateSummary, size: (u32, u32)) -> Result<String, ReportError> {
    match kind {
        ChartKind::YearScores => crate::chart::year_scores(summary, size),
        ChartKind::CountryShare => crate::chart::country_share(summary, size),
        ChartKind::CategoryScores => crate::chart::category_scores(&summary.category, size),
    }
}

#[cfg(not(feature = "charts"))]
fn draw(_kind: ChartKind, _summary: &AggregateSummary, _size: (u32, u32)) -> Result<String, ReportError> {
    Err(ReportError::Unavailable("built without the `charts` feature"))
}
