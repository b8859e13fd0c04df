//! End to end tests: World Bank style CSV files on disk through to chart images.

use indicator_trends::config::{ChartJob, ReportConfig};
use indicator_trends::data::{
    DataProcessor, FillStrategy, IndicatorLoader, ProcessorError, YEARS_COLUMN,
};
use indicator_trends::report::{ReportError, ReportRunner};
use indicator_trends::stats::StatsCalculator;
use std::path::Path;

mod common;

fn focus_countries() -> Vec<String> {
    common::COUNTRIES[..5].iter().map(|s| s.to_string()).collect()
}

fn test_config(data_dir: &Path, output_dir: &Path) -> ReportConfig {
    ReportConfig {
        data_dir: data_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        show: false,
        image_size: (640, 480),
        ..ReportConfig::default()
    }
}

#[test]
fn test_refine_loaded_csv() {
    let dir = tempfile::tempdir().unwrap();
    common::write_default_files(dir.path());

    let table = IndicatorLoader::default()
        .load_csv("total_population", &dir.path().join("total_population.csv"))
        .unwrap();
    assert_eq!(table.countries().len(), common::COUNTRIES.len());

    let tidy = DataProcessor::refine(
        &table,
        &focus_countries(),
        1970,
        2021,
        FillStrategy::ColumnMean,
    )
    .unwrap();

    assert_eq!(tidy.height(), 52);
    assert_eq!(tidy.dataframe().width(), 6);
    for country in tidy.countries() {
        assert_eq!(tidy.dataframe().column(country).unwrap().null_count(), 0);
    }

    // Nigeria's 1974 gap is filled with its window mean
    let nigeria = tidy.column_values("Nigeria").unwrap();
    let years = tidy.years().unwrap();
    let gap = years.iter().position(|&y| y == 1974).unwrap();
    let observed: Vec<f64> = years
        .iter()
        .zip(&nigeria)
        .filter(|(y, _)| *y % 7 != 0)
        .map(|(_, v)| *v)
        .collect();
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    assert!((nigeria[gap] - mean).abs() < 1e-6);

    let bars = DataProcessor::select_years(&tidy, &[1995, 2000, 2005, 2010, 2015, 2020]).unwrap();
    assert_eq!(bars.index(), &[1995, 2000, 2005, 2010, 2015, 2020]);
    assert_eq!(bars.height(), 6);
}

#[test]
fn test_join_and_correlate_loaded_csvs() {
    let dir = tempfile::tempdir().unwrap();
    common::write_default_files(dir.path());
    let config = test_config(dir.path(), &dir.path().join("charts"));
    let runner = ReportRunner::new(config).unwrap();
    let tables = runner.load_datasets().unwrap();
    assert_eq!(tables.len(), 7);

    let names = [
        "Agricultural_land",
        "Urban_population",
        "Manufacturing_GDP",
        "CO2_emissions",
        "total_population",
        "Electric_power_consumption",
        "Forest_area",
    ];
    let sources: Vec<_> = names.iter().map(|n| (*n, &tables[*n])).collect();
    let joined =
        DataProcessor::join_country(&sources, "Nigeria", 1990, 2020, FillStrategy::default())
            .unwrap();

    assert_eq!(joined.column_names().len(), 7);
    assert!(!joined.column_names().iter().any(|c| c == YEARS_COLUMN));
    assert_eq!(joined.height(), 31);

    let matrix = StatsCalculator::correlation_matrix(&joined).unwrap();
    assert_eq!(matrix.len(), 7);
    for i in 0..7 {
        assert!((matrix.get(i, i).unwrap() - 1.0).abs() < 1e-9);
        for j in 0..7 {
            let (a, b) = (matrix.get(i, j).unwrap(), matrix.get(j, i).unwrap());
            assert!((a - b).abs() < 1e-12);
        }
    }
}

#[test]
fn test_default_report_writes_every_chart() {
    let dir = tempfile::tempdir().unwrap();
    common::write_default_files(dir.path());
    let out = dir.path().join("charts");

    let runner = ReportRunner::new(test_config(dir.path(), &out)).unwrap();
    let written = runner.run().unwrap();

    assert_eq!(written.len(), 8);
    for (path, job) in written.iter().zip(&runner.config().charts) {
        assert_eq!(path, &out.join(job.output()));
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (640, 480));
    }
}

#[test]
fn test_png_output_follows_extension() {
    let dir = tempfile::tempdir().unwrap();
    common::write_default_files(dir.path());
    let out = dir.path().join("png");

    let mut config = test_config(dir.path(), &out);
    config.charts.retain(|job| matches!(job, ChartJob::Heatmap(_)));
    for job in config.charts.iter_mut() {
        if let ChartJob::Heatmap(heatmap) = job {
            heatmap.output.set_extension("png");
        }
    }

    let written = ReportRunner::new(config).unwrap().run().unwrap();
    assert_eq!(written.len(), 3);
    for path in &written {
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(
            image::ImageFormat::from_path(path).unwrap(),
            image::ImageFormat::Png
        );
        assert!(image::open(path).is_ok());
    }
}

#[test]
fn test_missing_country_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    common::write_default_files(dir.path());

    let mut config = test_config(dir.path(), &dir.path().join("charts"));
    if let ChartJob::Line(job) = &mut config.charts[0] {
        job.countries.push("Atlantis".to_string());
    }

    let err = ReportRunner::new(config).unwrap().run().unwrap_err();
    assert!(matches!(
        err,
        ReportError::Processor(ProcessorError::MissingCountry { .. })
    ));
}

#[test]
fn test_missing_file_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &dir.path().join("charts"));

    let err = ReportRunner::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, ReportError::Loader(_)));
}
