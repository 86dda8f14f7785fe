use crate::{
    error::{DemandError, Result},
    units::EnergyUnit,
};
use serde::{Deserialize, Serialize};

/// Per-request view options: output unit, inclusive year bounds and
/// optional sector/model allow-lists. Built once, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub unit: EnergyUnit,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub selected_sectors: Option<Vec<String>>,
    pub selected_models: Option<Vec<String>>,
}

impl FilterConfig {
    /// Build a filter, rejecting a start year after the end year.
    pub fn new(
        unit: EnergyUnit,
        start_year: Option<i32>,
        end_year: Option<i32>,
        selected_sectors: Option<Vec<String>>,
        selected_models: Option<Vec<String>>,
    ) -> Result<Self> {
        let filter = FilterConfig {
            unit,
            start_year,
            end_year,
            selected_sectors,
            selected_models,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> Result<()> {
        match (self.start_year, self.end_year) {
            (Some(start), Some(end)) if start > end => {
                Err(DemandError::InvalidYearRange { start, end })
            }
            _ => Ok(()),
        }
    }

    /// Inclusive bounds check; an absent bound does not constrain.
    pub fn contains_year(&self, year: i32) -> bool {
        self.start_year.map_or(true, |start| year >= start)
            && self.end_year.map_or(true, |end| year <= end)
    }

    /// An empty or absent allow-list admits every sector.
    pub fn allows_sector(&self, sector: &str) -> bool {
        allow_list(&self.selected_sectors).map_or(true, |list| list.iter().any(|s| s == sector))
    }

    pub fn allows_model(&self, model: &str) -> bool {
        allow_list(&self.selected_models).map_or(true, |list| list.iter().any(|m| m == model))
    }

    pub fn has_model_filter(&self) -> bool {
        allow_list(&self.selected_models).is_some()
    }
}

fn allow_list(list: &Option<Vec<String>>) -> Option<&Vec<String>> {
    list.as_ref().filter(|names| !names.is_empty())
}
