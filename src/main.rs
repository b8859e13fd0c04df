//! Indicator Trends - World Bank indicator reshaping & chart generation

use anyhow::{Context, Result};
use clap::Parser;
use indicator_trends::cli::Args;
use indicator_trends::config::ReportConfig;
use indicator_trends::report::ReportRunner;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ReportConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReportConfig::default(),
    };
    args.apply(&mut config);

    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let runner = ReportRunner::new(config).context("invalid report configuration")?;
    info!(
        datasets = runner.config().referenced_datasets().len(),
        charts = runner.config().charts.len(),
        "startup"
    );

    let written = runner.run().context("report failed")?;
    info!(charts = written.len(), "done");
    Ok(())
}
