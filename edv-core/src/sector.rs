use crate::{
    error::{DemandError, Result},
    units::EnergyUnit,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a sector's numbers came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMetadata {
    pub source_path: String,
    /// Sheet actually read, when the source has several.
    pub sheet: Option<String>,
    pub original_unit: EnergyUnit,
    pub unit: EnergyUnit,
    /// Rows kept after year coercion and filtering.
    pub row_count: usize,
}

/// One sector's forecast results: one series per model over ascending years.
///
/// Every series in `data` has exactly `years.len()` values, in the unit
/// recorded in `metadata.unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorData {
    pub name: String,
    pub years: Vec<i32>,
    /// Model names in column order.
    pub models: Vec<String>,
    pub data: BTreeMap<String, Vec<f64>>,
    pub metadata: SectorMetadata,
}

impl SectorData {
    /// Assemble a sector from `(year, values-per-model)` rows.
    ///
    /// Rows are sorted by year (stable, so duplicate years keep file order)
    /// before the series are laid out.
    pub fn from_rows(
        name: impl Into<String>,
        models: Vec<String>,
        mut rows: Vec<(i32, Vec<f64>)>,
        metadata: SectorMetadata,
    ) -> Result<Self> {
        rows.sort_by_key(|(year, _)| *year);
        let mut data: BTreeMap<String, Vec<f64>> = models
            .iter()
            .map(|model| (model.clone(), Vec::with_capacity(rows.len())))
            .collect();
        let mut years = Vec::with_capacity(rows.len());
        for (year, values) in rows {
            if values.len() != models.len() {
                return Err(DemandError::InvalidSeries {
                    model: format!("row {year}"),
                    values: values.len(),
                    years: models.len(),
                });
            }
            years.push(year);
            for (model, value) in models.iter().zip(values) {
                if let Some(series) = data.get_mut(model) {
                    series.push(value);
                }
            }
        }
        SectorData::new(name, years, models, data, metadata)
    }

    /// Build a sector from already laid out series, checking lengths.
    pub fn new(
        name: impl Into<String>,
        years: Vec<i32>,
        models: Vec<String>,
        data: BTreeMap<String, Vec<f64>>,
        metadata: SectorMetadata,
    ) -> Result<Self> {
        for model in &models {
            let len = data.get(model).map_or(0, Vec::len);
            if len != years.len() {
                return Err(DemandError::InvalidSeries {
                    model: model.clone(),
                    values: len,
                    years: years.len(),
                });
            }
        }
        Ok(SectorData {
            name: name.into(),
            years,
            models,
            data,
            metadata,
        })
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.data.contains_key(model)
    }

    pub fn series(&self, model: &str) -> Option<&[f64]> {
        self.data.get(model).map(Vec::as_slice)
    }

    /// Value of `model` in `year`; the first row wins if a year repeats.
    pub fn value_at(&self, model: &str, year: i32) -> Option<f64> {
        let series = self.data.get(model)?;
        let idx = self.years.partition_point(|y| *y < year);
        match self.years.get(idx) {
            Some(found) if *found == year => series.get(idx).copied(),
            _ => None,
        }
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.last().copied()
    }
}
