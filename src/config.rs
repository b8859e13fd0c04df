//! Report configuration.
//!
//! A report is a list of datasets (name -> CSV file) and a list of chart jobs
//! that draw from them. The default configuration renders the population,
//! manufacturing, CO2 and correlation charts for the five focus countries.

use crate::charts::{ColorMap, DEFAULT_SIZE};
use crate::data::{FillStrategy, Year, DEFAULT_SKIP_ROWS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Dataset '{0}' is defined more than once")]
    DuplicateDataset(String),
    #[error("Chart {index} references unknown dataset '{dataset}'")]
    UnknownDataset { index: usize, dataset: String },
    #[error("Chart {index} has start year {start} after end year {end}")]
    InvertedWindow { index: usize, start: Year, end: Year },
    #[error("Chart {index} has no output file name")]
    EmptyOutput { index: usize },
    #[error("Charts {first} and {second} both write to {path}")]
    DuplicateOutput {
        first: usize,
        second: usize,
        path: PathBuf,
    },
    #[error("Chart {index}: scatter column '{column}' is not one of its datasets")]
    UnknownScatterColumn { index: usize, column: String },
}

/// A named indicator file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub name: String,
    pub file: PathBuf,
}

impl DatasetSource {
    pub fn new(name: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            file: PathBuf::from(file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineJob {
    pub dataset: String,
    pub countries: Vec<String>,
    pub start_year: Year,
    pub end_year: Year,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarJob {
    pub dataset: String,
    pub countries: Vec<String>,
    pub start_year: Year,
    pub end_year: Year,
    /// Years drawn as bar groups
    pub years: Vec<Year>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapJob {
    pub country: String,
    pub datasets: Vec<String>,
    pub start_year: Year,
    pub end_year: Year,
    pub title: String,
    #[serde(default)]
    pub color_map: ColorMap,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterJob {
    pub country: String,
    pub datasets: Vec<String>,
    pub start_year: Year,
    pub end_year: Year,
    /// Dataset drawn on the x axis
    pub x: String,
    /// Dataset drawn on the y axis
    pub y: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    #[serde(default)]
    pub legend: Option<String>,
    pub output: PathBuf,
}

/// One chart of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartJob {
    Line(LineJob),
    Bar(BarJob),
    Heatmap(HeatmapJob),
    Scatter(ScatterJob),
}

impl ChartJob {
    pub fn kind(&self) -> &'static str {
        match self {
            ChartJob::Line(_) => "line",
            ChartJob::Bar(_) => "bar",
            ChartJob::Heatmap(_) => "heatmap",
            ChartJob::Scatter(_) => "scatter",
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            ChartJob::Line(job) => &job.output,
            ChartJob::Bar(job) => &job.output,
            ChartJob::Heatmap(job) => &job.output,
            ChartJob::Scatter(job) => &job.output,
        }
    }

    pub fn window(&self) -> (Year, Year) {
        match self {
            ChartJob::Line(job) => (job.start_year, job.end_year),
            ChartJob::Bar(job) => (job.start_year, job.end_year),
            ChartJob::Heatmap(job) => (job.start_year, job.end_year),
            ChartJob::Scatter(job) => (job.start_year, job.end_year),
        }
    }

    /// Dataset names this job reads, in order.
    pub fn datasets(&self) -> Vec<&str> {
        match self {
            ChartJob::Line(job) => vec![job.dataset.as_str()],
            ChartJob::Bar(job) => vec![job.dataset.as_str()],
            ChartJob::Heatmap(job) => job.datasets.iter().map(String::as_str).collect(),
            ChartJob::Scatter(job) => job.datasets.iter().map(String::as_str).collect(),
        }
    }
}

/// Everything needed to produce a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory the dataset files are resolved against
    pub data_dir: PathBuf,
    /// Directory chart images are written to
    pub output_dir: PathBuf,
    /// Open each chart in the system viewer after writing it
    pub show: bool,
    pub image_size: (u32, u32),
    /// Preamble lines before the CSV header
    pub skip_rows: usize,
    pub fill: FillStrategy,
    pub datasets: Vec<DatasetSource>,
    pub charts: Vec<ChartJob>,
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

const FOCUS_COUNTRIES: [&str; 5] = ["Indonesia", "Nigeria", "Brazil", "Pakistan", "Philippines"];

const CORRELATED: [&str; 7] = [
    "Agricultural_land",
    "Urban_population",
    "Manufacturing_GDP",
    "CO2_emissions",
    "total_population",
    "Electric_power_consumption",
    "Forest_area",
];

impl Default for ReportConfig {
    fn default() -> Self {
        let heatmap = |country: &str, color_map: ColorMap, output: &str| {
            ChartJob::Heatmap(HeatmapJob {
                country: country.to_string(),
                datasets: strings(&CORRELATED),
                start_year: 1990,
                end_year: 2020,
                title: country.to_string(),
                color_map,
                output: PathBuf::from(output),
            })
        };

        Self {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("charts"),
            show: true,
            image_size: DEFAULT_SIZE,
            skip_rows: DEFAULT_SKIP_ROWS,
            fill: FillStrategy::default(),
            datasets: vec![
                DatasetSource::new("total_population", "total_population.csv"),
                DatasetSource::new("Urban_population", "Urban_population.csv"),
                DatasetSource::new("Manufacturing_GDP", "Manufacturing_value_added_USD.csv"),
                DatasetSource::new("CO2_emissions", "CO2_emissions.csv"),
                DatasetSource::new("Forest_area", "Forest_area.csv"),
                DatasetSource::new(
                    "Electric_power_consumption",
                    "Electric_power_consumption.csv",
                ),
                DatasetSource::new("Agricultural_land", "Agricultural_land.csv"),
            ],
            charts: vec![
                ChartJob::Line(LineJob {
                    dataset: "total_population".to_string(),
                    countries: strings(&FOCUS_COUNTRIES),
                    start_year: 1970,
                    end_year: 2021,
                    title: "Total Population".to_string(),
                    x_label: "Years".to_string(),
                    y_label: "Population".to_string(),
                    output: PathBuf::from("total_population_line.jpg"),
                }),
                ChartJob::Line(LineJob {
                    dataset: "Urban_population".to_string(),
                    countries: strings(&FOCUS_COUNTRIES),
                    start_year: 1970,
                    end_year: 2021,
                    title: "Urban Population".to_string(),
                    x_label: "Years".to_string(),
                    y_label: "Urban Population".to_string(),
                    output: PathBuf::from("urban_population_line.jpg"),
                }),
                ChartJob::Bar(BarJob {
                    dataset: "Manufacturing_GDP".to_string(),
                    countries: strings(&FOCUS_COUNTRIES),
                    start_year: 1970,
                    end_year: 2021,
                    years: vec![1995, 2000, 2005, 2010, 2015, 2020],
                    title: "Manufacturing value added USD".to_string(),
                    x_label: "Years".to_string(),
                    y_label: "Manufacturing value added GDP".to_string(),
                    output: PathBuf::from("manufacturing_bar.jpg"),
                }),
                ChartJob::Bar(BarJob {
                    dataset: "CO2_emissions".to_string(),
                    countries: strings(&FOCUS_COUNTRIES),
                    start_year: 1970,
                    end_year: 2021,
                    years: vec![1995, 2000, 2005, 2010, 2015, 2020],
                    title: "CO2 Emissions (kt)".to_string(),
                    x_label: "Years".to_string(),
                    y_label: "CO2 Emissions".to_string(),
                    output: PathBuf::from("co2_bar.jpg"),
                }),
                heatmap("Nigeria", ColorMap::Dark2, "nigeria_heatmap.jpg"),
                heatmap("Philippines", ColorMap::NipySpectral, "philippines_heatmap.jpg"),
                heatmap("Pakistan", ColorMap::Rainbow, "pakistan_heatmap.jpg"),
                ChartJob::Scatter(ScatterJob {
                    country: "Pakistan".to_string(),
                    datasets: strings(&CORRELATED),
                    start_year: 1990,
                    end_year: 2020,
                    x: "Manufacturing_GDP".to_string(),
                    y: "Urban_population".to_string(),
                    title: "Urban Population vs Manufacturing GDP in Pakistan".to_string(),
                    x_label: "Manufacturing GDP".to_string(),
                    y_label: "Urban Population".to_string(),
                    legend: Some("Scatter Points".to_string()),
                    output: PathBuf::from("pakistan_scatter.jpg"),
                }),
            ],
        }
    }
}

impl ReportConfig {
    /// Read a JSON config file. Missing fields take their default values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Path of a dataset's file, resolved against `data_dir`.
    pub fn dataset_path(&self, name: &str) -> Option<PathBuf> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .map(|d| self.data_dir.join(&d.file))
    }

    /// Datasets read by at least one chart, in first-use order.
    pub fn referenced_datasets(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for name in self.charts.iter().flat_map(|job| job.datasets()) {
            if !seen.iter().any(|s| s == name) {
                seen.push(name.to_string());
            }
        }
        seen
    }

    /// Check cross references between charts and datasets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for dataset in &self.datasets {
            if !names.insert(dataset.name.as_str()) {
                return Err(ConfigError::DuplicateDataset(dataset.name.clone()));
            }
        }

        let mut outputs: Vec<(usize, &Path)> = Vec::new();
        for (index, job) in self.charts.iter().enumerate() {
            for dataset in job.datasets() {
                if !names.contains(dataset) {
                    return Err(ConfigError::UnknownDataset {
                        index,
                        dataset: dataset.to_string(),
                    });
                }
            }

            let (start, end) = job.window();
            if start > end {
                return Err(ConfigError::InvertedWindow { index, start, end });
            }

            let output = job.output();
            if output.as_os_str().is_empty() {
                return Err(ConfigError::EmptyOutput { index });
            }
            if let Some((first, _)) = outputs.iter().find(|(_, p)| *p == output) {
                return Err(ConfigError::DuplicateOutput {
                    first: *first,
                    second: index,
                    path: output.to_path_buf(),
                });
            }
            outputs.push((index, output));

            if let ChartJob::Scatter(scatter) = job {
                for column in [&scatter.x, &scatter.y] {
                    if !scatter.datasets.contains(column) {
                        return Err(ConfigError::UnknownScatterColumn {
                            index,
                            column: column.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
