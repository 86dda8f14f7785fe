//! Shared utility functions for EDV crates.

/// Sector naming helpers
pub mod names {
    use std::path::Path;

    /// Format a sector identifier for display as a table column.
    /// Separators (`_`, `-`) become spaces and each word is title-cased,
    /// e.g. `commercial_and_public` -> `Commercial And Public`.
    pub fn display_name(sector: &str) -> String {
        sector
            .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => {
                        let rest: String = chars.as_str().to_lowercase();
                        format!("{}{}", first.to_uppercase(), rest)
                    }
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Derive a sector name from its source file or directory name
    /// (the file stem, untouched otherwise).
    pub fn sector_name_from_path(path: &Path) -> Option<String> {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.trim().to_string())
            .filter(|stem| !stem.is_empty())
    }

    /// Make a scenario name safe to embed in a file name.
    pub fn sanitize_file_stem(value: &str) -> String {
        let filtered: String = value
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        if filtered.is_empty() || filtered == "." || filtered == ".." {
            "scenario".to_string()
        } else {
            filtered
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::path::PathBuf;

        #[test]
        fn test_display_name() {
            assert_eq!(display_name("residential"), "Residential");
            assert_eq!(display_name("commercial_and_public"), "Commercial And Public");
            assert_eq!(display_name("heavy-INDUSTRY"), "Heavy Industry");
            assert_eq!(display_name("Agriculture"), "Agriculture");
        }

        #[test]
        fn test_sector_name_from_path() {
            let path = PathBuf::from("/data/scenario_a/Residential.csv");
            assert_eq!(sector_name_from_path(&path), Some("Residential".to_string()));
            let dir = PathBuf::from("/data/scenario_a/Industrial");
            assert_eq!(sector_name_from_path(&dir), Some("Industrial".to_string()));
        }

        #[test]
        fn test_sanitize_file_stem() {
            assert_eq!(sanitize_file_stem("base/case"), "base_case");
            assert_eq!(sanitize_file_stem(".."), "scenario");
            assert_eq!(sanitize_file_stem("  "), "scenario");
            assert_eq!(sanitize_file_stem("High Growth"), "High Growth");
        }
    }
}

/// Numeric coercion and rounding
pub mod numbers {
    /// Coerce a spreadsheet cell into a finite number.
    ///
    /// Blank cells and the usual "no data" markers are `None`, as is anything
    /// that does not parse. Thousands separators are accepted.
    pub fn coerce_f64(cell: &str) -> Option<f64> {
        let trimmed = cell.trim();
        let lowered = trimmed.to_lowercase();
        match lowered.as_str() {
            "" | "null" | "nan" | "n/a" | "na" | "-" | "---" | "none" => None,
            s => {
                let cleaned = s.replace(',', "");
                cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
    }

    /// Coerce a cell into a year. Fractional years are truncated.
    pub fn coerce_year(cell: &str) -> Option<i32> {
        coerce_f64(cell)
            .map(f64::trunc)
            .filter(|v| *v >= i32::MIN as f64 && *v <= i32::MAX as f64)
            .map(|v| v as i32)
    }

    /// Round half away from zero to `decimals` places.
    pub fn round_to(value: f64, decimals: u32) -> f64 {
        let factor = 10f64.powi(decimals as i32);
        (value * factor).round() / factor
    }

    /// Arithmetic mean, `None` for an empty slice.
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

}

/// Date utility functions
pub mod dates {
    use chrono::{DateTime, SecondsFormat, Utc};

    /// Format a timestamp as RFC 3339 with second precision, e.g. `2025-01-31T12:00:00Z`.
    pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Current UTC time formatted with [`format_timestamp`].
    pub fn now_timestamp() -> String {
        format_timestamp(&Utc::now())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::TimeZone;

        #[test]
        fn test_format_timestamp() {
            let ts = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
            assert_eq!(format_timestamp(&ts), "2025-01-31T12:00:00Z");
        }
    }
}
