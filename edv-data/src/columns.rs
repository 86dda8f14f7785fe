//! Recognizing the year column and the model columns of a results sheet.

use crate::tabular::Table;
use edv_utils::numbers::coerce_f64;
use log::warn;
use std::collections::HashSet;

/// A header pattern that can never name a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionPattern {
    /// Whole header, case-insensitive.
    Exact(String),
    /// Header prefix, case-insensitive (`Unnamed: 0` from spreadsheet exports).
    Prefix(String),
}

impl ExclusionPattern {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            ExclusionPattern::Exact(name) => lowered == name,
            ExclusionPattern::Prefix(prefix) => lowered.starts_with(prefix.as_str()),
        }
    }
}

/// Reserved header names (`year`, `years`, `unnamed*`, `index`, `id`,
/// `date`, `time`, `total`, `sum`).
pub fn default_exclusions() -> Vec<ExclusionPattern> {
    let exact = ["year", "years", "index", "id", "date", "time", "total", "sum"];
    let mut patterns: Vec<ExclusionPattern> = exact
        .iter()
        .map(|name| ExclusionPattern::Exact(name.to_string()))
        .collect();
    patterns.push(ExclusionPattern::Prefix("unnamed".to_string()));
    patterns
}

/// A model column recognized in a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelColumn {
    pub name: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnClassifier {
    exclusions: Vec<ExclusionPattern>,
}

impl Default for ColumnClassifier {
    fn default() -> Self {
        ColumnClassifier::new(default_exclusions())
    }
}

impl ColumnClassifier {
    pub fn new(exclusions: Vec<ExclusionPattern>) -> Self {
        ColumnClassifier {
            exclusions: exclusions
                .into_iter()
                .map(|pattern| match pattern {
                    ExclusionPattern::Exact(name) => ExclusionPattern::Exact(name.to_lowercase()),
                    ExclusionPattern::Prefix(prefix) => {
                        ExclusionPattern::Prefix(prefix.to_lowercase())
                    }
                })
                .collect(),
        }
    }

    /// First header containing "year", case-insensitive.
    pub fn find_year_column(&self, headers: &[String]) -> Option<usize> {
        headers
            .iter()
            .position(|header| header.to_lowercase().contains("year"))
    }

    /// Blank headers and reserved names are never models.
    pub fn is_excluded(&self, header: &str) -> bool {
        let lowered = header.trim().to_lowercase();
        lowered.is_empty() || self.exclusions.iter().any(|pattern| pattern.matches(&lowered))
    }

    /// Model columns among `rows`: every non-excluded column other than the
    /// year column holding at least one numeric cell. A repeated header
    /// keeps its first column.
    pub fn model_columns(&self, table: &Table, year_idx: usize, rows: &[&Vec<String>]) -> Vec<ModelColumn> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for (index, header) in table.headers.iter().enumerate() {
            if index == year_idx || self.is_excluded(header) {
                continue;
            }
            let name = header.trim().to_string();
            let numeric = rows
                .iter()
                .any(|row| row.get(index).and_then(|cell| coerce_f64(cell)).is_some());
            if !numeric {
                continue;
            }
            if !seen.insert(name.clone()) {
                warn!("Ignoring repeated model column '{}' at position {}", name, index);
                continue;
            }
            columns.push(ModelColumn { name, index });
        }
        columns
    }
}
