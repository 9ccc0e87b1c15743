//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvBarSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart::SvgChartRenderer;
use crate::domain::aggregator::{aggregate, Outcome};
use crate::domain::config_validation::{parse_delimiter, validate_run_config};
use crate::domain::error::DipfillError;
use crate::domain::evaluator::{StrategyParams, DEFAULT_LIMIT_DISCOUNT_PCT};
use crate::domain::run_config::{ChartConfig, DataConfig, RunConfig, DEFAULT_OUTPUT_PATH};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::BarSource;
use crate::ports::report_port::ChartRenderer;

#[derive(Parser, Debug)]
#[command(
    name = "dipfill",
    about = "Intraday limit-buy strategy simulator for daily OHLC bars"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the strategy and write the profit chart
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate the strategy and print statistics only
    Summary {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            input,
            output,
        } => run_chart(config.as_deref(), input.as_deref(), output.as_deref()),
        Command::Summary { config, input } => run_summary(config.as_deref(), input.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, DipfillError> {
    FileConfigAdapter::from_file(path).map_err(|e| DipfillError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Loads and validates the config file, or falls back to built-in defaults
/// when no file is given.
fn load_run_config(config_path: Option<&Path>) -> Result<RunConfig, DipfillError> {
    let adapter = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            load_config(path)?
        }
        None => FileConfigAdapter::empty(),
    };
    validate_run_config(&adapter)?;
    build_run_config(&adapter)
}

pub fn build_run_config(adapter: &dyn ConfigPort) -> Result<RunConfig, DipfillError> {
    let delimiter = match adapter.get_string("data", "delimiter") {
        Some(raw) => parse_delimiter(&raw).ok_or_else(|| DipfillError::ConfigInvalid {
            section: "data".into(),
            key: "delimiter".into(),
            reason: "delimiter must be a single ASCII character".into(),
        })?,
        None => b',',
    };
    let defaults = DataConfig::default();
    let data = DataConfig {
        path: adapter.get_string("data", "path").map(PathBuf::from),
        delimiter,
        date_format: adapter
            .get_string("data", "date_format")
            .unwrap_or(defaults.date_format),
        strict_bars: adapter.get_bool("data", "strict_bars", false),
    };

    let params = StrategyParams {
        limit_discount_pct: adapter.get_double(
            "strategy",
            "limit_discount_pct",
            DEFAULT_LIMIT_DISCOUNT_PCT,
        ),
    };

    let chart_defaults = ChartConfig::default();
    let chart = ChartConfig {
        title: adapter
            .get_string("chart", "title")
            .unwrap_or(chart_defaults.title),
        x_label: adapter
            .get_string("chart", "x_label")
            .unwrap_or(chart_defaults.x_label),
        y_label: adapter
            .get_string("chart", "y_label")
            .unwrap_or(chart_defaults.y_label),
        y_min: adapter.get_double("chart", "y_min", chart_defaults.y_min),
        y_max: adapter.get_double("chart", "y_max", chart_defaults.y_max),
        width: adapter.get_double("chart", "width", chart_defaults.width),
        height: adapter.get_double("chart", "height", chart_defaults.height),
        annotation: adapter.get_string("chart", "annotation"),
        output_path: adapter
            .get_string("chart", "output_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
    };

    Ok(RunConfig {
        strategy_name: adapter
            .get_string("strategy", "name")
            .unwrap_or_else(|| RunConfig::default().strategy_name),
        params,
        data,
        chart,
    })
}

/// Command-line input wins over `[data] path`.
pub fn resolve_input(input_override: Option<&Path>, config: &RunConfig) -> Result<PathBuf, DipfillError> {
    input_override
        .map(Path::to_path_buf)
        .or_else(|| config.data.path.clone())
        .ok_or_else(|| DipfillError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })
}

/// Load every bar, then evaluate and aggregate. A load failure aborts before
/// anything is evaluated.
pub fn run_pipeline(
    source: &dyn BarSource,
    params: &StrategyParams,
) -> Result<Outcome, DipfillError> {
    log::info!("loading bars from {}", source.describe());
    let bars = source.load_bars()?;

    log::info!(
        "evaluating {} bars with a limit {:.2}% below the open",
        bars.len(),
        params.limit_discount_pct
    );
    let outcome = aggregate(params, &bars);
    log::debug!(
        "{} filled, {} not filled, {} degenerate",
        outcome.traded.len(),
        outcome.not_filled_days,
        outcome.degenerate_days
    );
    Ok(outcome)
}

fn fmt_optional_pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn format_summary(strategy_name: &str, source: &str, outcome: &Outcome) -> String {
    let mut lines = Vec::new();
    lines.push(format!("=== {} ===", strategy_name));
    lines.push(format!("Source:           {}", source));
    lines.push(format!("Days:             {}", outcome.total_days));
    lines.push(format!("Filled:           {}", outcome.traded.len()));
    lines.push(format!("Not filled:       {}", outcome.not_filled_days));
    if outcome.degenerate_days > 0 {
        lines.push(format!("Degenerate:       {}", outcome.degenerate_days));
    }
    lines.push(format!("Gain days:        {}", outcome.gains.len()));
    lines.push(format!("Loss days:        {}", outcome.losses.len()));
    lines.push(format!("Break-even days:  {}", outcome.breakeven_days()));
    lines.push(format!(
        "Win ratio:        {}",
        fmt_optional_pct(outcome.win_ratio().map(|r| r * 100.0))
    ));
    lines.push(format!(
        "Average profit:   {}",
        fmt_optional_pct(outcome.overall_mean())
    ));
    lines.push(format!(
        "Average gain:     {}",
        fmt_optional_pct(outcome.gain_mean())
    ));
    lines.push(format!(
        "Average loss:     {}",
        fmt_optional_pct(outcome.loss_mean())
    ));
    lines.join("\n")
}

fn evaluate_input(
    config: &RunConfig,
    input_override: Option<&Path>,
) -> Result<Outcome, DipfillError> {
    let input = resolve_input(input_override, config)?;
    let source = CsvBarSource::with_options(input, &config.data);
    let outcome = run_pipeline(&source, &config.params)?;
    eprintln!(
        "\n{}",
        format_summary(&config.strategy_name, &source.describe(), &outcome)
    );
    Ok(outcome)
}

pub fn run_chart(
    config_path: Option<&Path>,
    input_override: Option<&Path>,
    output_override: Option<&Path>,
) -> Result<(), DipfillError> {
    let config = load_run_config(config_path)?;
    let outcome = evaluate_input(&config, input_override)?;

    let output = output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.chart.output_path.clone());
    SvgChartRenderer::new().write(&outcome, &config.chart, &output)?;
    eprintln!("\nChart written to: {}", output.display());
    Ok(())
}

pub fn run_summary(
    config_path: Option<&Path>,
    input_override: Option<&Path>,
) -> Result<(), DipfillError> {
    let config = load_run_config(config_path)?;
    evaluate_input(&config, input_override)?;
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), DipfillError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_run_config(&adapter)?;
    let config = build_run_config(&adapter)?;

    eprintln!("  Strategy:       {}", config.strategy_name);
    eprintln!(
        "  Limit price:    open - {:.2}%",
        config.params.limit_discount_pct
    );
    match &config.data.path {
        Some(path) => eprintln!("  Data:           {}", path.display()),
        None => eprintln!("  Data:           (pass --input)"),
    }
    eprintln!("  Date format:    {}", config.data.date_format);
    eprintln!(
        "  Y range:        [{}, {}]",
        config.chart.y_min, config.chart.y_max
    );
    eprintln!("  Output:         {}", config.chart.output_path.display());
    eprintln!("\nConfig is valid.");
    Ok(())
}
