//! Command line options.

use crate::config::ReportConfig;
use clap::Parser;
use std::path::PathBuf;

/// Reshape World Bank indicator files and render trend, bar, scatter and
/// correlation charts.
#[derive(Parser, Debug, Default)]
#[command(name = "indicator_trends", version, about)]
pub struct Args {
    /// JSON report configuration (defaults to the built-in report)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory containing the indicator CSV files
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory the chart images are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Do not open charts in the system viewer
    #[arg(long)]
    pub no_show: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Apply command line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut ReportConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.no_show {
            config.show = false;
        }
    }
}
