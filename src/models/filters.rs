use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Size buckets offered by the filter panel, as (label, "min,max")
pub const SIZE_RANGES: &[(&str, &str)] = &[
    ("All Sizes", ""),
    ("Small (<100KB)", "0,102400"),
    ("Medium (100KB-200KB)", "102400,204800"),
    ("Large (200KB-500KB)", "204800,512000"),
    ("Very Large (>500KB)", "512000,999999999"),
];

/// Upload date buckets, as (label, days)
pub const DATE_RANGES: &[(&str, &str)] = &[
    ("All Time", ""),
    ("Last 24 Hours", "1"),
    ("Last 7 Days", "7"),
    ("Last 30 Days", "30"),
    ("Last 90 Days", "90"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: u64,
    pub max: u64,
}

impl SizeRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Resolve a bucket keyword (`small`, `medium`, `large`, `very-large`) or a literal `min,max`
    pub fn from_preset(name: &str) -> Option<Self> {
        let value = match name.trim().to_lowercase().as_str() {
            "small" => SIZE_RANGES[1].1,
            "medium" => SIZE_RANGES[2].1,
            "large" => SIZE_RANGES[3].1,
            "very-large" | "very_large" | "verylarge" => SIZE_RANGES[4].1,
            _ => return name.parse().ok(),
        };
        value.parse().ok()
    }
}

impl fmt::Display for SizeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSizeRangeError(String);

impl fmt::Display for ParseSizeRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid size range '{}', expected 'min,max'", self.0)
    }
}

impl std::error::Error for ParseSizeRangeError {}

impl FromStr for SizeRange {
    type Err = ParseSizeRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSizeRangeError(s.to_string());
        let (min, max) = s.split_once(',').ok_or_else(err)?;
        let min = min.trim().parse::<u64>().map_err(|_| err())?;
        let max = max.trim().parse::<u64>().map_err(|_| err())?;
        if min > max {
            return Err(err());
        }
        Ok(Self { min, max })
    }
}

/// Normalized filter object handed from the filter panel to the file list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search: Option<String>,
    pub file_type: Option<String>,
    pub size_range: Option<SizeRange>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub date_range: Option<u32>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Query parameters for the non-empty fields, in a stable order.
    ///
    /// Empty strings and zero numbers are treated as unset.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(file_type) = self.file_type.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("file_type", file_type.to_string()));
        }
        if let Some(range) = self.size_range {
            pairs.push(("size_range", range.to_string()));
        } else {
            if let Some(min) = self.min_size.filter(|v| *v > 0) {
                pairs.push(("min_size", min.to_string()));
            }
            if let Some(max) = self.max_size.filter(|v| *v > 0) {
                pairs.push(("max_size", max.to_string()));
            }
        }
        if let Some(days) = self.date_range.filter(|v| *v > 0) {
            pairs.push(("date_range", days.to_string()));
        }

        pairs
    }

    /// Percent-encoded query string without the leading `?`
    pub fn query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
