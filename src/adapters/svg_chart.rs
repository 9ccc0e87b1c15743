//! SVG profit chart.
//!
//! Draws the traded-day profit series as a grey line, gain and loss days as
//! red and green markers, and a dotted horizontal line at each series mean.
//! A layer whose series is empty is left out together with its legend
//! entries. The x axis is date-scaled with a tick on every Monday.

use std::fs;
use std::path::Path;

use chrono::{Datelike, Days, NaiveDate};

use crate::domain::aggregator::{Outcome, SeriesView};
use crate::domain::error::DipfillError;
use crate::domain::run_config::ChartConfig;
use crate::ports::report_port::ChartRenderer;

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 90.0;

const TRADED_COLOR: &str = "grey";
const MEAN_COLOR: &str = "#1f77b4";
const GAIN_COLOR: &str = "red";
const LOSS_COLOR: &str = "green";

const MARKER_RADIUS: f64 = 4.0;
const MEAN_DASH: &str = "1,5";
const MAX_Y_TICKS: usize = 20;

pub fn traded_label() -> String {
    "(+-)Profits".to_string()
}

pub fn mean_label(mean: f64) -> String {
    format!("Average Profits : {:.2}", mean)
}

pub fn gain_points_label(count: usize) -> String {
    format!("Gained Profit Points={} days", count)
}

pub fn gain_mean_label(mean: f64) -> String {
    format!("Average Gained Profits : {:.2}", mean)
}

pub fn loss_points_label(count: usize) -> String {
    format!("Loss Profit Points={} days", count)
}

pub fn loss_mean_label(mean: f64) -> String {
    format!("Average Loss Profits : {:.2}", mean)
}

/// Every Monday in `[start, end]`.
pub fn weekly_ticks(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let offset = (7 - start.weekday().num_days_from_monday()) % 7;
    let mut ticks = Vec::new();
    let mut tick = start.checked_add_days(Days::new(u64::from(offset)));
    while let Some(day) = tick {
        if day > end {
            break;
        }
        ticks.push(day);
        tick = day.checked_add_days(Days::new(7));
    }
    ticks
}

/// Smallest step of the form 1, 2 or 5 times a power of ten, never below 1,
/// that keeps `span` within `MAX_Y_TICKS` intervals.
fn y_tick_step(span: f64) -> f64 {
    let raw = span / MAX_Y_TICKS as f64;
    if raw <= 1.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude)
}

/// Gridline values inside `[y_min, y_max]`. Integer steps for the usual
/// profit ranges, coarser steps for wide ones.
pub fn y_ticks(y_min: f64, y_max: f64) -> Vec<f64> {
    let span = y_max - y_min;
    if !span.is_finite() || span <= 0.0 {
        return Vec::new();
    }
    let step = y_tick_step(span);
    let first = (y_min / step).ceil() as i64;
    let last = (y_max / step).floor() as i64;
    (first..=last)
        .take(MAX_Y_TICKS + 1)
        .map(|i| i as f64 * step)
        .collect()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

enum LegendMark {
    Line(&'static str),
    Dotted(&'static str),
    Marker(&'static str),
}

struct LegendEntry {
    mark: LegendMark,
    label: String,
}

/// Pixel geometry of the plot area.
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    y_min: f64,
    y_max: f64,
    start: Option<NaiveDate>,
    span_days: f64,
}

impl Frame {
    fn new(chart: &ChartConfig, traded: &SeriesView) -> Self {
        let start = traded.dates().iter().min().copied();
        let end = traded.dates().iter().max().copied();
        let span_days = match (start, end) {
            (Some(s), Some(e)) => ((e - s).num_days() as f64).max(1.0),
            _ => 1.0,
        };
        Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: (chart.width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
            height: (chart.height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
            y_min: chart.y_min,
            y_max: chart.y_max,
            start,
            span_days,
        }
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn x(&self, date: NaiveDate) -> f64 {
        let days = self.start.map(|s| (date - s).num_days() as f64).unwrap_or(0.0);
        self.left + days / self.span_days * self.width
    }

    fn y(&self, value: f64) -> f64 {
        self.top + (self.y_max - value) / (self.y_max - self.y_min) * self.height
    }
}

pub struct SvgChartRenderer;

impl SvgChartRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, outcome: &Outcome, chart: &ChartConfig) -> String {
        let frame = Frame::new(chart, &outcome.traded);
        let mut legend: Vec<LegendEntry> = Vec::new();
        let mut svg = String::new();

        svg.push_str(&format!(
            "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\" font-family=\"sans-serif\">\n",
            w = chart.width,
            h = chart.height
        ));
        svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"lightgrey\"/>\n");
        svg.push_str(&format!(
            "  <defs><clipPath id=\"plot-area\"><rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\"/></clipPath></defs>\n",
            frame.left, frame.top, frame.width, frame.height
        ));
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"white\" stroke=\"black\" stroke-width=\"1\"/>\n",
            frame.left, frame.top, frame.width, frame.height
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"20\">{}</text>\n",
            chart.width / 2.0,
            MARGIN_TOP / 2.0 + 7.0,
            escape_xml(&chart.title)
        ));

        self.render_y_grid(&mut svg, &frame);
        self.render_x_grid(&mut svg, &frame, &outcome.traded);
        self.render_axis_labels(&mut svg, &frame, chart);

        svg.push_str("  <g clip-path=\"url(#plot-area)\">\n");

        if !outcome.traded.is_empty() {
            let points: Vec<String> = outcome
                .traded
                .iter()
                .map(|(date, value)| format!("{:.1},{:.1}", frame.x(date), frame.y(value)))
                .collect();
            svg.push_str(&format!(
                "    <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
                points.join(" "),
                TRADED_COLOR
            ));
            legend.push(LegendEntry {
                mark: LegendMark::Line(TRADED_COLOR),
                label: traded_label(),
            });
        }
        if let Some(mean) = outcome.overall_mean() {
            self.render_mean_line(&mut svg, &frame, mean, MEAN_COLOR);
            legend.push(LegendEntry {
                mark: LegendMark::Dotted(MEAN_COLOR),
                label: mean_label(mean),
            });
        }

        if !outcome.gains.is_empty() {
            self.render_markers(&mut svg, &frame, &outcome.gains, GAIN_COLOR);
            legend.push(LegendEntry {
                mark: LegendMark::Marker(GAIN_COLOR),
                label: gain_points_label(outcome.gains.len()),
            });
        }
        if let Some(mean) = outcome.gain_mean() {
            self.render_mean_line(&mut svg, &frame, mean, GAIN_COLOR);
            legend.push(LegendEntry {
                mark: LegendMark::Dotted(GAIN_COLOR),
                label: gain_mean_label(mean),
            });
        }

        if !outcome.losses.is_empty() {
            self.render_markers(&mut svg, &frame, &outcome.losses, LOSS_COLOR);
            legend.push(LegendEntry {
                mark: LegendMark::Marker(LOSS_COLOR),
                label: loss_points_label(outcome.losses.len()),
            });
        }
        if let Some(mean) = outcome.loss_mean() {
            self.render_mean_line(&mut svg, &frame, mean, LOSS_COLOR);
            legend.push(LegendEntry {
                mark: LegendMark::Dotted(LOSS_COLOR),
                label: loss_mean_label(mean),
            });
        }

        if let Some(text) = chart.annotation.as_deref() {
            svg.push_str(&format!(
                "    <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"20\" fill=\"black\" fill-opacity=\"0.15\">{}</text>\n",
                frame.left + frame.width * 0.1,
                frame.y(frame.y_min + (frame.y_max - frame.y_min) * 0.2),
                escape_xml(text)
            ));
        }

        svg.push_str("  </g>\n");

        self.render_legend(&mut svg, &frame, &legend);
        svg.push_str("</svg>\n");
        svg
    }

    fn render_y_grid(&self, svg: &mut String, frame: &Frame) {
        for tick in y_ticks(frame.y_min, frame.y_max) {
            let y = frame.y(tick);
            svg.push_str(&format!(
                "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#999\" stroke-width=\"0.5\" stroke-dasharray=\"1,3\"/>\n",
                frame.left,
                y,
                frame.right(),
                y
            ));
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\">{}</text>\n",
                frame.left - 6.0,
                y + 3.5,
                tick
            ));
        }
    }

    fn render_x_grid(&self, svg: &mut String, frame: &Frame, traded: &SeriesView) {
        let (Some(start), Some(end)) = (
            traded.dates().iter().min().copied(),
            traded.dates().iter().max().copied(),
        ) else {
            return;
        };

        for tick in weekly_ticks(start, end) {
            let x = frame.x(tick);
            svg.push_str(&format!(
                "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#999\" stroke-width=\"0.5\" stroke-dasharray=\"1,3\"/>\n",
                x,
                frame.top,
                x,
                frame.bottom()
            ));
            let label_y = frame.bottom() + 14.0;
            svg.push_str(&format!(
                "  <text x=\"{x:.1}\" y=\"{label_y:.1}\" text-anchor=\"end\" font-size=\"10\" transform=\"rotate(-35 {x:.1} {label_y:.1})\">{}</text>\n",
                tick.format("%d %b")
            ));
        }
    }

    fn render_axis_labels(&self, svg: &mut String, frame: &Frame, chart: &ChartConfig) {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"14\">{}</text>\n",
            frame.left + frame.width / 2.0,
            chart.height - 12.0,
            escape_xml(&chart.x_label)
        ));
        let x = 22.0;
        let y = frame.top + frame.height / 2.0;
        svg.push_str(&format!(
            "  <text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"middle\" font-size=\"14\" transform=\"rotate(-90 {x:.1} {y:.1})\">{}</text>\n",
            escape_xml(&chart.y_label)
        ));
    }

    fn render_mean_line(&self, svg: &mut String, frame: &Frame, mean: f64, color: &str) {
        let y = frame.y(mean);
        svg.push_str(&format!(
            "    <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"3\" stroke-dasharray=\"{}\"/>\n",
            frame.left,
            y,
            frame.right(),
            y,
            color,
            MEAN_DASH
        ));
    }

    fn render_markers(&self, svg: &mut String, frame: &Frame, series: &SeriesView, color: &str) {
        for (date, value) in series.iter() {
            svg.push_str(&format!(
                "    <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{}\" fill=\"{}\"/>\n",
                frame.x(date),
                frame.y(value),
                MARKER_RADIUS,
                color
            ));
        }
    }

    fn render_legend(&self, svg: &mut String, frame: &Frame, legend: &[LegendEntry]) {
        if legend.is_empty() {
            return;
        }
        let row_height = 18.0;
        let box_width = 260.0;
        let box_height = legend.len() as f64 * row_height + 10.0;
        let box_x = frame.right() - box_width - 10.0;
        let box_y = frame.top + 10.0;

        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"white\" fill-opacity=\"0.8\" stroke=\"#ccc\"/>\n",
            box_x, box_y, box_width, box_height
        ));
        for (i, entry) in legend.iter().enumerate() {
            let cy = box_y + 5.0 + row_height * (i as f64 + 0.5);
            let mark_x = box_x + 10.0;
            match entry.mark {
                LegendMark::Line(color) => {
                    svg.push_str(&format!(
                        "  <line x1=\"{:.1}\" y1=\"{cy:.1}\" x2=\"{:.1}\" y2=\"{cy:.1}\" stroke=\"{color}\" stroke-width=\"1.5\"/>\n",
                        mark_x,
                        mark_x + 24.0
                    ));
                }
                LegendMark::Dotted(color) => {
                    svg.push_str(&format!(
                        "  <line x1=\"{:.1}\" y1=\"{cy:.1}\" x2=\"{:.1}\" y2=\"{cy:.1}\" stroke=\"{color}\" stroke-width=\"3\" stroke-dasharray=\"{MEAN_DASH}\"/>\n",
                        mark_x,
                        mark_x + 24.0
                    ));
                }
                LegendMark::Marker(color) => {
                    svg.push_str(&format!(
                        "  <circle cx=\"{:.1}\" cy=\"{cy:.1}\" r=\"{MARKER_RADIUS}\" fill=\"{color}\"/>\n",
                        mark_x + 12.0
                    ));
                }
            }
            svg.push_str(&format!(
                "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\">{}</text>\n",
                mark_x + 32.0,
                cy + 4.0,
                escape_xml(&entry.label)
            ));
        }
    }
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn write(
        &self,
        outcome: &Outcome,
        chart: &ChartConfig,
        output_path: &Path,
    ) -> Result<(), DipfillError> {
        let svg = self.render(outcome, chart);

        let render_err = |e: std::io::Error| DipfillError::Render {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        };
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(render_err)?;
        }
        fs::write(output_path, svg).map_err(render_err)?;

        log::info!("chart written to {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::DailyBar;
    use crate::domain::aggregator::aggregate;
    use crate::domain::evaluator::StrategyParams;
    use tempfile::TempDir;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, d).unwrap()
    }

    fn two_day_outcome() -> Outcome {
        let bars = vec![
            DailyBar::new(date(1, 4), 10.0, 10.5, 9.5, 10.2),
            DailyBar::new(date(1, 5), 10.0, 9.9, 9.0, 9.5),
        ];
        aggregate(&StrategyParams::default(), &bars)
    }

    #[test]
    fn legend_labels_use_two_decimals() {
        assert_eq!(mean_label(0.510_204), "Average Profits : 0.51");
        assert_eq!(gain_mean_label(4.081_632), "Average Gained Profits : 4.08");
        assert_eq!(loss_mean_label(-3.061_224), "Average Loss Profits : -3.06");
        assert_eq!(gain_points_label(12), "Gained Profit Points=12 days");
        assert_eq!(loss_points_label(3), "Loss Profit Points=3 days");
    }

    #[test]
    fn weekly_ticks_are_mondays() {
        // 2021-01-04 is a Monday
        let ticks = weekly_ticks(date(1, 1), date(1, 20));
        assert_eq!(ticks, vec![date(1, 4), date(1, 11), date(1, 18)]);
        assert!(ticks.iter().all(|d| d.weekday() == chrono::Weekday::Mon));
    }

    #[test]
    fn weekly_ticks_include_start_monday() {
        assert_eq!(weekly_ticks(date(1, 4), date(1, 4)), vec![date(1, 4)]);
        assert!(weekly_ticks(date(1, 5), date(1, 10)).is_empty());
    }

    #[test]
    fn escape_xml_special_characters() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn render_full_chart() {
        let svg = SvgChartRenderer::new().render(&two_day_outcome(), &ChartConfig::default());

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("Average Profits : 0.51"));
        assert!(svg.contains("Gained Profit Points=1 days"));
        assert!(svg.contains("Average Gained Profits : 4.08"));
        assert!(svg.contains("Loss Profit Points=1 days"));
        assert!(svg.contains("Average Loss Profits : -3.06"));
        assert!(svg.contains("04 Jan"));
        assert!(svg.contains("Trading Simulation"));
        assert_eq!(svg.matches("fill=\"red\"").count(), 2);
        assert_eq!(svg.matches("fill=\"green\"").count(), 2);
    }

    #[test]
    fn empty_loss_layer_is_omitted() {
        let bars = vec![
            DailyBar::new(date(1, 4), 10.0, 10.5, 9.5, 10.2),
            DailyBar::new(date(1, 5), 10.0, 10.5, 9.5, 10.4),
        ];
        let outcome = aggregate(&StrategyParams::default(), &bars);
        let svg = SvgChartRenderer::new().render(&outcome, &ChartConfig::default());

        assert!(svg.contains("Gained Profit Points=2 days"));
        assert!(!svg.contains("Loss Profit Points"));
        assert!(!svg.contains("Average Loss Profits"));
        assert!(!svg.contains("green"));
    }

    #[test]
    fn empty_outcome_renders_frame_only() {
        let svg = SvgChartRenderer::new().render(&Outcome::default(), &ChartConfig::default());
        assert!(svg.contains("<svg"));
        assert!(!svg.contains("<polyline"));
        assert!(!svg.contains("<circle"));
        assert!(!svg.contains("Average"));
    }

    #[test]
    fn y_axis_follows_configured_range() {
        let svg = SvgChartRenderer::new().render(&two_day_outcome(), &ChartConfig::default());
        // integer gridlines from -4 to 5
        assert!(svg.contains(">-4</text>"));
        assert!(svg.contains(">5</text>"));
        assert!(!svg.contains(">6</text>"));
    }

    #[test]
    fn y_ticks_default_range_is_integer() {
        let ticks = y_ticks(-4.0, 5.0);
        assert_eq!(ticks.len(), 10);
        assert_eq!(ticks.first(), Some(&-4.0));
        assert_eq!(ticks.last(), Some(&5.0));
    }

    #[test]
    fn y_ticks_coarsen_for_wide_ranges() {
        let ticks = y_ticks(-1e9, 1e9);
        assert!(ticks.len() <= MAX_Y_TICKS + 1);
        assert!(ticks.contains(&0.0));
        assert!(ticks.iter().all(|t| (-1e9..=1e9).contains(t)));

        let expected: Vec<f64> = (-10..=10).map(|i| f64::from(i) * 5.0).collect();
        assert_eq!(y_ticks(-50.0, 50.0), expected);
    }

    #[test]
    fn y_ticks_empty_for_unusable_range() {
        assert!(y_ticks(5.0, -4.0).is_empty());
        assert!(y_ticks(-f64::MAX, f64::MAX).is_empty());
    }

    #[test]
    fn wide_y_range_renders_bounded_grid() {
        let chart = ChartConfig {
            y_min: -1e9,
            y_max: 1e9,
            ..ChartConfig::default()
        };
        let svg = SvgChartRenderer::new().render(&Outcome::default(), &chart);
        let gridlines = svg.matches("stroke-dasharray=\"1,3\"").count();
        assert!(gridlines <= MAX_Y_TICKS + 1, "{gridlines} gridlines");
        assert!(svg.contains(">1000000000</text>"));
        assert!(svg.len() < 20_000);
    }

    #[test]
    fn annotation_and_title_are_escaped() {
        let chart = ChartConfig {
            title: "Aug/2020 & Jan/2021".into(),
            annotation: Some("20210114 <practice>".into()),
            ..ChartConfig::default()
        };
        let svg = SvgChartRenderer::new().render(&two_day_outcome(), &chart);
        assert!(svg.contains("Aug/2020 &amp; Jan/2021"));
        assert!(svg.contains("20210114 &lt;practice&gt;"));
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("profits.svg");
        SvgChartRenderer::new()
            .write(&two_day_outcome(), &ChartConfig::default(), &path)
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn write_failure_is_render_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("taken");
        fs::write(&blocker, "not a directory").unwrap();
        let err = SvgChartRenderer::new()
            .write(&two_day_outcome(), &ChartConfig::default(), &blocker.join("profits.svg"))
            .unwrap_err();
        assert!(matches!(err, DipfillError::Render { .. }));
        assert_eq!(
            format!("{:?}", std::process::ExitCode::from(&err)),
            format!("{:?}", std::process::ExitCode::from(4))
        );
    }
}
