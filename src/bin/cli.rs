use clap::Parser;
use rangefacet::transport::FileExecutor;
use rangefacet::{Panel, PanelConfig, TimeRange};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Turns saved range-facet responses into zero-filled, aligned chart series
#[derive(Parser, Debug)]
#[command(name = "rangefacet-cli")]
struct Args {
    /// Panel configuration (JSON); environment defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Range start in epoch milliseconds
    #[arg(long)]
    from: Option<i64>,

    /// Range end in epoch milliseconds
    #[arg(long)]
    to: Option<i64>,

    /// Pin the bucket interval (e.g. 5m, 1h) or "auto"
    #[arg(short, long)]
    interval: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long, default_value = "false")]
    pretty: bool,

    /// Backend responses, one file per segment, in segment order
    #[arg(required = true)]
    segments: Vec<PathBuf>,
}

#[derive(Serialize)]
struct Output<'a> {
    interval: String,
    hits: u64,
    series: Vec<rangefacet::plot::PlotSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stacked: Option<Vec<rangefacet::plot::StackedLayer>>,
    error: Option<&'a str>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PanelConfig::from_file(path)?,
        None => PanelConfig::from_env(),
    };
    if let Some(interval) = &args.interval {
        config.set_interval(interval)?;
    }

    let range = match (args.from, args.to) {
        (Some(from), Some(to)) => Some(TimeRange::new(from, to)),
        _ => None,
    };

    let mut panel = Panel::new(config, FileExecutor::new(args.segments.clone()), range);
    if let Err(err) = panel.refresh().await {
        tracing::warn!("Refresh failed: {}", err);
    }

    let output = Output {
        interval: panel.config().interval.clone(),
        hits: panel.hits(),
        series: panel.plot_series(),
        stacked: panel.stacked_series(),
        error: panel.error(),
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", json);

    Ok(())
}
