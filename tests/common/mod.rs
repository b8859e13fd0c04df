use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const COUNTRIES: [&str; 6] = [
    "Indonesia",
    "Nigeria",
    "Brazil",
    "Pakistan",
    "Philippines",
    "World",
];

pub const FILES: [&str; 7] = [
    "total_population.csv",
    "Urban_population.csv",
    "Manufacturing_value_added_USD.csv",
    "CO2_emissions.csv",
    "Forest_area.csv",
    "Electric_power_consumption.csv",
    "Agricultural_land.csv",
];

/// Write a World Bank style export: four preamble lines, quoted fields,
/// years 1960..=2022 and a trailing comma on every line.
pub fn write_indicator_csv(path: &Path, indicator: &str, seed: u64) {
    let mut out = String::new();
    out.push_str("\"Data Source\",\"World Development Indicators\",\n\n");
    out.push_str("\"Last Updated Date\",\"2023-12-18\",\n\n");

    out.push_str("\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",");
    for year in 1960..=2022 {
        write!(out, "\"{year}\",").unwrap();
    }
    out.push('\n');

    for (c, country) in COUNTRIES.iter().enumerate() {
        let code: String = country.chars().take(3).collect::<String>().to_uppercase();
        write!(out, "\"{country}\",\"{code}\",\"{indicator}\",\"X.{seed}\",").unwrap();
        for year in 1960..=2022u64 {
            // gaps before 1965 and every seventh year for one country
            let missing = year < 1965 || (c == 1 && year % 7 == 0) || year == 2022;
            if missing {
                out.push_str("\"\",");
            } else {
                let t = (year - 1960) as f64;
                let value = (seed as f64 + 1.0) * (c as f64 + 1.0) * 1000.0
                    + t * t * (c as f64 + seed as f64 + 1.0)
                    + ((year * (seed + 3) + c as u64 * 11) % 17) as f64 * 50.0;
                write!(out, "\"{value:.1}\",").unwrap();
            }
        }
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

/// Write all seven default indicator files into `dir`.
pub fn write_default_files(dir: &Path) {
    for (seed, file) in FILES.iter().enumerate() {
        write_indicator_csv(&dir.join(file), file.trim_end_matches(".csv"), seed as u64);
    }
}
