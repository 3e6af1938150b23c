//! SVG drawing for the report charts. Compiled only with the `charts` feature.

use harvest_core::{AggregateSummary, CategoryScores, SCORE_MAX, SCORE_MIN};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;

use crate::report::ReportError;

const FONT: &str = "sans-serif";
const PALETTE: [RGBColor; 9] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(188, 189, 34),
    RGBColor(127, 127, 127),
];

fn draw_err<E: std::fmt::Display>(err: E) -> ReportError {
    ReportError::Draw(err.to_string())
}

fn score_range(lo: f64, hi: f64, pad: f64) -> std::ops::Range<f64> {
    let lo = (lo - pad).max(SCORE_MIN);
    let hi = (hi + pad).min(SCORE_MAX);
    if hi > lo {
        lo..hi
    } else {
        lo..lo + 1.0
    }
}

/// Scatter of every (year, score) pair with the per-year mean as a line.
pub(crate) fn year_scores(summary: &AggregateSummary, size: (u32, u32)) -> Result<String, ReportError> {
    let points = &summary.year_points;
    if points.is_empty() {
        return Err(ReportError::Draw("no year data".into()));
    }
    let (min_year, max_year) = points
        .iter()
        .fold((u16::MAX, u16::MIN), |(lo, hi), p| (lo.min(p.year), hi.max(p.year)));
    let (min_score, max_score) = points
        .iter()
        .fold((SCORE_MAX, SCORE_MIN), |(lo, hi), p| (lo.min(p.score), hi.max(p.score)));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Score by release year", (FONT, 24).into_font())
            .margin(16)
            .x_label_area_size(40)
            .y_label_area_size(48)
            .build_cartesian_2d(
                f64::from(min_year) - 1.0..f64::from(max_year) + 1.0,
                score_range(min_score, max_score, 0.3),
            )
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("Score")
            .x_label_formatter(&|x: &f64| format!("{x:.0}"))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(points.iter().map(|p| {
                Circle::new((f64::from(p.year), p.score), 3, PALETTE[0].mix(0.45).filled())
            }))
            .map_err(draw_err)?;
        chart
            .draw_series(LineSeries::new(
                summary
                    .year_means
                    .iter()
                    .map(|m| (f64::from(m.year), m.mean)),
                PALETTE[3].stroke_width(2),
            ))
            .map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

/// Bars of each country's share of all counted tokens, labelled in percent.
pub(crate) fn country_share(summary: &AggregateSummary, size: (u32, u32)) -> Result<String, ReportError> {
    let buckets = &summary.countries;
    let total = summary.country_total();
    if buckets.is_empty() || total == 0 {
        return Err(ReportError::Draw("no country data".into()));
    }
    let shares: Vec<f64> = buckets
        .iter()
        .map(|b| b.count as f64 * 100.0 / total as f64)
        .collect();
    let top = shares.iter().copied().fold(0.0_f64, f64::max);
    let label_style = TextStyle::from((FONT, 14).into_font());

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Share by country", (FONT, 24).into_font())
            .margin(16)
            .x_label_area_size(48)
            .y_label_area_size(48)
            .build_cartesian_2d((0..buckets.len()).into_segmented(), 0.0..(top * 1.15).min(100.0))
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(buckets.len())
            .x_label_formatter(&|v: &SegmentValue<usize>| match v {
                SegmentValue::CenterOf(i) => buckets
                    .get(*i)
                    .map(|b| b.label.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_desc("Share (%)")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(shares.iter().enumerate().map(|(i, share)| {
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *share)],
                    PALETTE[i % PALETTE.len()].filled(),
                );
                bar.set_margin(0, 0, 6, 6);
                bar
            }))
            .map_err(draw_err)?;
        chart
            .draw_series(shares.iter().enumerate().map(|(i, share)| {
                Text::new(
                    format!("{share:.1}%"),
                    (SegmentValue::CenterOf(i), *share),
                    label_style.clone(),
                )
            }))
            .map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

/// Box (quartiles, median, whiskers to min/max) with every score overlaid.
pub(crate) fn category_scores(category: &CategoryScores, size: (u32, u32)) -> Result<String, ReportError> {
    let spread = category
        .spread()
        .ok_or_else(|| ReportError::Draw(format!("no data for category {:?}", category.marker())))?;
    let caption = format!("Scores of {} titles", category.marker());

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, (FONT, 24).into_font())
            .margin(16)
            .x_label_area_size(24)
            .y_label_area_size(48)
            .build_cartesian_2d(0.0..2.0, score_range(spread.min, spread.max, 0.3))
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .y_desc("Score")
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series([
                Rectangle::new([(0.6, spread.q1), (1.4, spread.q3)], PALETTE[0].mix(0.25).filled()),
                Rectangle::new([(0.6, spread.q1), (1.4, spread.q3)], PALETTE[0].stroke_width(2)),
            ])
            .map_err(draw_err)?;
        chart
            .draw_series([
                PathElement::new(vec![(0.6, spread.median), (1.4, spread.median)], PALETTE[3].stroke_width(2)),
                PathElement::new(vec![(1.0, spread.min), (1.0, spread.q1)], BLACK.stroke_width(1)),
                PathElement::new(vec![(1.0, spread.q3), (1.0, spread.max)], BLACK.stroke_width(1)),
                PathElement::new(vec![(0.85, spread.min), (1.15, spread.min)], BLACK.stroke_width(1)),
                PathElement::new(vec![(0.85, spread.max), (1.15, spread.max)], BLACK.stroke_width(1)),
            ])
            .map_err(draw_err)?;
        chart
            .draw_series(category.scores().iter().enumerate().map(|(i, score)| {
                Circle::new((1.0 + jitter(i), *score), 3, BLACK.mix(0.55).filled())
            }))
            .map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

// Deterministic horizontal spread so equal scores stay visible.
fn jitter(i: usize) -> f64 {
    ((i % 9) as f64 - 4.0) * 0.04
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_range_pads_and_clamps() {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        let r = score_range(8.0, 9.0, 0.5);
        assert!(close(r.start, 7.5) && close(r.end, 9.5));
        let r = score_range(9.5, 10.0, 0.5);
        assert!(close(r.start, 9.0) && close(r.end, 10.0));
        let r = score_range(10.0, 10.0, 0.0);
        assert!(close(r.start, 10.0) && close(r.end, 11.0));
    }

    #[test]
    fn jitter_is_bounded() {
        assert!((0..100).map(jitter).all(|j| j.abs() <= 0.16 + 1e-9));
    }
}
