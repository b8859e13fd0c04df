//! Report Runner
//! Loads the configured datasets once and renders every chart job in order.

use crate::charts::{ChartLabels, ChartRenderer, RenderError};
use crate::config::{BarJob, ChartJob, ConfigError, HeatmapJob, LineJob, ReportConfig, ScatterJob};
use crate::data::{
    DataProcessor, IndicatorLoader, IndicatorTable, LoaderError, ProcessorError, Year, YearTable,
};
use crate::stats::StatsCalculator;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Dataset '{0}' is not loaded")]
    MissingDataset(String),
}

/// Runs the chart jobs of a [`ReportConfig`].
pub struct ReportRunner {
    config: ReportConfig,
    loader: IndicatorLoader,
    renderer: ChartRenderer,
}

impl ReportRunner {
    /// Validate `config` and prepare a runner for it.
    pub fn new(config: ReportConfig) -> Result<Self, ReportError> {
        config.validate()?;
        Ok(Self {
            loader: IndicatorLoader::new(config.skip_rows),
            renderer: ChartRenderer::new(config.image_size),
            config,
        })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Load every dataset some chart reads, in parallel.
    pub fn load_datasets(&self) -> Result<HashMap<String, IndicatorTable>, ReportError> {
        let sources = self
            .config
            .referenced_datasets()
            .into_iter()
            .map(|name| {
                self.config
                    .dataset_path(&name)
                    .map(|path| (name.clone(), path))
                    .ok_or(ReportError::MissingDataset(name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.loader.load_all(&sources)?)
    }

    /// Load the datasets, then render every chart. Returns the written paths.
    pub fn run(&self) -> Result<Vec<PathBuf>, ReportError> {
        let tables = self.load_datasets()?;
        self.run_with(&tables)
    }

    /// Render every chart from already loaded tables.
    pub fn run_with(
        &self,
        tables: &HashMap<String, IndicatorTable>,
    ) -> Result<Vec<PathBuf>, ReportError> {
        let out_dir = &self.config.output_dir;
        std::fs::create_dir_all(out_dir).map_err(|source| ReportError::OutputDir {
            path: out_dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.config.charts.len());
        for (index, job) in self.config.charts.iter().enumerate() {
            let path = out_dir.join(job.output());
            debug!(index, kind = job.kind(), path = %path.display(), "rendering chart");

            match job {
                ChartJob::Line(job) => self.render_line(job, tables, &path)?,
                ChartJob::Bar(job) => self.render_bar(job, tables, &path)?,
                ChartJob::Heatmap(job) => self.render_heatmap(job, tables, &path)?,
                ChartJob::Scatter(job) => self.render_scatter(job, tables, &path)?,
            }
            info!(kind = job.kind(), path = %path.display(), "wrote chart");

            if self.config.show {
                Self::show(&path);
            }
            written.push(path);
        }
        Ok(written)
    }

    fn render_line(
        &self,
        job: &LineJob,
        tables: &HashMap<String, IndicatorTable>,
        path: &Path,
    ) -> Result<(), ReportError> {
        let table = Self::table(tables, &job.dataset)?;
        let tidy = DataProcessor::refine(
            table,
            &job.countries,
            job.start_year,
            job.end_year,
            self.config.fill,
        )?;

        let labels = ChartLabels::new(&job.title, &job.x_label, &job.y_label);
        self.renderer.draw_line_chart(
            path,
            &tidy.years()?,
            &tidy.value_lists()?,
            tidy.countries(),
            &labels,
        )?;
        Ok(())
    }

    fn render_bar(
        &self,
        job: &BarJob,
        tables: &HashMap<String, IndicatorTable>,
        path: &Path,
    ) -> Result<(), ReportError> {
        let table = Self::table(tables, &job.dataset)?;
        let tidy = DataProcessor::refine(
            table,
            &job.countries,
            job.start_year,
            job.end_year,
            self.config.fill,
        )?;
        let bars = DataProcessor::select_years(&tidy, &job.years)?;
        if bars.height() < job.years.len() {
            warn!(
                dataset = job.dataset.as_str(),
                requested = job.years.len(),
                found = bars.height(),
                "some bar years are outside the data"
            );
        }

        let labels = ChartLabels::new(&job.title, &job.x_label, &job.y_label);
        self.renderer.draw_bar_chart(path, &bars, &labels)?;
        Ok(())
    }

    fn render_heatmap(
        &self,
        job: &HeatmapJob,
        tables: &HashMap<String, IndicatorTable>,
        path: &Path,
    ) -> Result<(), ReportError> {
        let joined = self.join(tables, &job.datasets, &job.country, job.start_year, job.end_year)?;
        let matrix = StatsCalculator::correlation_matrix(&joined)?;
        self.renderer
            .draw_heatmap(path, &matrix, &job.title, job.color_map)?;
        Ok(())
    }

    fn render_scatter(
        &self,
        job: &ScatterJob,
        tables: &HashMap<String, IndicatorTable>,
        path: &Path,
    ) -> Result<(), ReportError> {
        let joined = self.join(tables, &job.datasets, &job.country, job.start_year, job.end_year)?;
        let x = joined.column_values(&job.x)?;
        let y = joined.column_values(&job.y)?;

        let labels = ChartLabels::new(&job.title, &job.x_label, &job.y_label);
        self.renderer
            .draw_scatter_chart(path, &x, &y, &labels, job.legend.as_deref())?;
        Ok(())
    }

    fn join(
        &self,
        tables: &HashMap<String, IndicatorTable>,
        datasets: &[String],
        country: &str,
        start: Year,
        end: Year,
    ) -> Result<YearTable, ReportError> {
        let sources = datasets
            .iter()
            .map(|name| Self::table(tables, name).map(|table| (name.as_str(), table)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DataProcessor::join_country(
            &sources,
            country,
            start,
            end,
            self.config.fill,
        )?)
    }

    fn table<'a>(
        tables: &'a HashMap<String, IndicatorTable>,
        name: &str,
    ) -> Result<&'a IndicatorTable, ReportError> {
        tables
            .get(name)
            .ok_or_else(|| ReportError::MissingDataset(name.to_string()))
    }

    /// Open a written chart in the system viewer.
    fn show(path: &Path) {
        if let Err(err) = open::that(path) {
            warn!(path = %path.display(), error = %err, "could not open chart viewer");
        }
    }
}
