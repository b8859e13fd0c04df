//! Named color maps for heatmap cells and color bars.

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::renderer::RenderError;

const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

const DARK2: [(u8, u8, u8); 8] = [
    (27, 158, 119),
    (217, 95, 2),
    (117, 112, 179),
    (231, 41, 138),
    (102, 166, 30),
    (230, 171, 2),
    (166, 118, 29),
    (102, 102, 102),
];

const NIPY_SPECTRAL: [(u8, u8, u8); 11] = [
    (0, 0, 0),
    (134, 0, 152),
    (0, 0, 170),
    (0, 119, 221),
    (0, 160, 170),
    (0, 170, 68),
    (0, 204, 0),
    (153, 255, 0),
    (255, 204, 0),
    (238, 0, 0),
    (204, 204, 204),
];

const RAINBOW: [(u8, u8, u8); 7] = [
    (128, 0, 255),
    (44, 126, 247),
    (42, 221, 221),
    (128, 255, 180),
    (212, 221, 128),
    (255, 126, 65),
    (255, 0, 0),
];

/// Color map used to shade correlation values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ColorMap {
    Viridis,
    /// Qualitative: values fall into one of eight flat bands
    Dark2,
    NipySpectral,
    Rainbow,
}

impl Default for ColorMap {
    fn default() -> Self {
        ColorMap::Viridis
    }
}

impl ColorMap {
    pub const ALL: [Self; 4] = [Self::Viridis, Self::Dark2, Self::NipySpectral, Self::Rainbow];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viridis => "viridis",
            Self::Dark2 => "dark2",
            Self::NipySpectral => "nipy_spectral",
            Self::Rainbow => "rainbow",
        }
    }

    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            Self::Viridis => &VIRIDIS,
            Self::Dark2 => &DARK2,
            Self::NipySpectral => &NIPY_SPECTRAL,
            Self::Rainbow => &RAINBOW,
        }
    }

    /// Color for a position in `[0, 1]`; out of range and NaN are clamped.
    pub fn color_at(self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let stops = self.stops();

        if self == Self::Dark2 {
            let idx = ((t * stops.len() as f64) as usize).min(stops.len() - 1);
            let (r, g, b) = stops[idx];
            return RGBColor(r, g, b);
        }

        let pos = t * (stops.len() - 1) as f64;
        let lower = pos.floor() as usize;
        let upper = (lower + 1).min(stops.len() - 1);
        let frac = pos - lower as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (r0, g0, b0) = stops[lower];
        let (r1, g1, b1) = stops[upper];
        RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMap {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|map| map.as_str() == wanted)
            .ok_or_else(|| RenderError::UnknownColorMap(s.to_string()))
    }
}

impl TryFrom<String> for ColorMap {
    type Error = RenderError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("viridis".parse::<ColorMap>().unwrap(), ColorMap::Viridis);
        assert_eq!("Dark2".parse::<ColorMap>().unwrap(), ColorMap::Dark2);
        assert_eq!("nipy-spectral".parse::<ColorMap>().unwrap(), ColorMap::NipySpectral);
        assert!(matches!(
            "jet".parse::<ColorMap>(),
            Err(RenderError::UnknownColorMap(_))
        ));
        for map in ColorMap::ALL {
            assert_eq!(map.to_string().parse::<ColorMap>().unwrap(), map);
        }
    }

    #[test]
    fn test_endpoints_and_clamping() {
        assert_eq!(ColorMap::Viridis.color_at(0.0), RGBColor(68, 1, 84));
        assert_eq!(ColorMap::Viridis.color_at(1.0), RGBColor(253, 231, 37));
        assert_eq!(ColorMap::Viridis.color_at(-3.0), ColorMap::Viridis.color_at(0.0));
        assert_eq!(ColorMap::Rainbow.color_at(7.0), RGBColor(255, 0, 0));
        assert_eq!(ColorMap::Viridis.color_at(f64::NAN), RGBColor(68, 1, 84));
    }

    #[test]
    fn test_interpolates_between_stops() {
        // halfway between the first two rainbow stops
        assert_eq!(
            ColorMap::Rainbow.color_at(1.0 / 12.0),
            RGBColor(86, 63, 251)
        );
    }

    #[test]
    fn test_dark2_is_banded() {
        assert_eq!(ColorMap::Dark2.color_at(0.01), ColorMap::Dark2.color_at(0.1));
        assert_eq!(ColorMap::Dark2.color_at(1.0), RGBColor(102, 102, 102));
        assert_ne!(ColorMap::Dark2.color_at(0.1), ColorMap::Dark2.color_at(0.9));
    }
}
