//! Units of forecast layers, inferred from the raster path

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit of the values in a forecast raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastUnit {
    /// Flame length in feet
    #[serde(rename = "ft")]
    Feet,
    /// Hours since the cell burned
    #[serde(rename = "hours")]
    Hours,
    /// Rate of spread in feet per minute
    #[serde(rename = "ft/min")]
    FeetPerMinute,
    /// Anything else, labelled in seconds
    #[serde(rename = "s")]
    Seconds,
}

impl ForecastUnit {
    /// Picks the unit from the first layer name found in the path
    pub fn from_path(path: &str) -> Self {
        if path.contains("flame-length") {
            ForecastUnit::Feet
        } else if path.contains("hours-since-burned") {
            ForecastUnit::Hours
        } else if path.contains("spread-rate") {
            ForecastUnit::FeetPerMinute
        } else {
            ForecastUnit::Seconds
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ForecastUnit::Feet => "ft",
            ForecastUnit::Hours => "hours",
            ForecastUnit::FeetPerMinute => "ft/min",
            ForecastUnit::Seconds => "s",
        }
    }

    /// Formats a value the way the map popup shows it, e.g. `12.34 ft`
    pub fn format_value(&self, value: f64) -> String {
        format!("{:.2} {}", value, self.label())
    }
}

impl fmt::Display for ForecastUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
