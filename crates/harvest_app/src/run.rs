use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use harvest_core::{aggregate, AggregateOptions, AggregateSummary, CategoryScores};
use harvest_engine::{
    export_records, ChartArtifact, ChartSource, ExportSummary, FetchSettings, Fetcher,
    LogProgressSink, PageSource, Paginator, ReportError, Reporter, ReqwestFetcher, Top250Source,
};
use harvest_logging::{harvest_info, harvest_warn};

use crate::config::{HarvestConfig, SourceKind};

/// What one run produced, for the closing summary.
#[derive(Debug)]
pub struct RunReport {
    pub source: SourceKind,
    pub total: usize,
    pub harvested: usize,
    pub skipped: usize,
    pub pages: usize,
    /// `None` when nothing was harvested and the export was skipped.
    pub export: Option<ExportSummary>,
    pub summary: Option<AggregateSummary>,
    pub charts: Vec<ChartArtifact>,
    pub chart_dir: PathBuf,
}

/// Harvest, export, aggregate and chart, in that order.
///
/// A transport or parse failure during harvesting aborts before anything is
/// written. Chart problems never fail the run.
pub async fn run(config: &HarvestConfig) -> anyhow::Result<RunReport> {
    let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(FetchSettings {
        request_timeout: config.request_timeout(),
        ..FetchSettings::default()
    }));
    let source: Box<dyn PageSource> = match config.source {
        SourceKind::Top250 => Box::new(Top250Source::new(fetcher, config.base_url.clone())),
        SourceKind::Chart => Box::new(ChartSource::new(
            fetcher,
            config.base_url.clone(),
            config.type_id,
            config.interval_id.clone(),
        )),
    };
    let page_size = config.effective_page_size();
    harvest_info!(
        "harvesting {:?} from {} ({} per page)",
        config.source,
        config.base_url,
        page_size
    );

    let sink = LogProgressSink;
    let harvest = Paginator::new(source.as_ref(), &sink)
        .with_cooldown(config.cooldown())
        .collect(page_size, None)
        .await
        .context("harvest aborted; nothing was exported")?;

    let mut report = RunReport {
        source: config.source,
        total: harvest.total,
        harvested: harvest.records.len(),
        skipped: harvest.skipped,
        pages: harvest.pages_fetched,
        export: None,
        summary: None,
        charts: Vec::new(),
        chart_dir: config.chart_dir.clone(),
    };
    if harvest.records.is_empty() {
        harvest_warn!("no records harvested; skipping export");
        return Ok(report);
    }

    let output = config.effective_output();
    let export = export_records(&harvest.records, &output)
        .with_context(|| format!("failed to export records to {}", output.display()))?;
    report.export = Some(export);

    let options = AggregateOptions {
        category_marker: config.category_marker.clone(),
        ..AggregateOptions::default()
    };
    let summary = aggregate(&harvest.records, &options);

    if config.charts {
        match Reporter::new(config.chart_dir.clone()) {
            Ok(reporter) => report.charts = reporter.render(&summary),
            Err(ReportError::Unavailable(why)) => {
                harvest_warn!("charts skipped: {}", why);
            }
            Err(err) => harvest_warn!("charts skipped: {}", err),
        }
    } else {
        harvest_info!("chart rendering disabled");
    }
    report.summary = Some(summary);
    Ok(report)
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:?}: {} of {} items harvested over {} pages ({} skipped)",
            self.source, self.harvested, self.total, self.pages, self.skipped
        )?;
        match &self.export {
            Some(export) => {
                write!(f, "  csv: {} rows -> {}", export.row_count, export.output_path.display())?;
                if let Some(requested) = &export.substituted_for {
                    write!(f, " ({} was busy)", requested.display())?;
                }
                writeln!(f)?;
            }
            None => writeln!(f, "  csv: nothing to export")?,
        }

        if let Some(summary) = &self.summary {
            if let (Some(first), Some(last)) = (summary.year_means.first(), summary.year_means.last()) {
                writeln!(
                    f,
                    "  years: {}-{} ({} scored titles)",
                    first.year,
                    last.year,
                    summary.year_points.len()
                )?;
            }
            let countries: Vec<String> = summary
                .countries
                .iter()
                .map(|b| format!("{} {}", b.label, b.count))
                .collect();
            if !countries.is_empty() {
                writeln!(f, "  countries: {}", countries.join(", "))?;
            }
            match &summary.category {
                CategoryScores::NoData { marker } => writeln!(f, "  {marker}: no data")?,
                CategoryScores::Scores { marker, scores } => {
                    if let Some(spread) = summary.category.spread() {
                        writeln!(
                            f,
                            "  {marker}: {} titles, median {:.1} (range {:.1}-{:.1})",
                            scores.len(),
                            spread.median,
                            spread.min,
                            spread.max
                        )?;
                    }
                }
            }
        }

        if self.charts.is_empty() {
            write!(f, "  charts: none")
        } else {
            write!(f, "  charts: {} in {}", self.charts.len(), self.chart_dir.display())
        }
    }
}
