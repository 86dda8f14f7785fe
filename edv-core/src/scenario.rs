use crate::{sector::SectorData, units::EnergyUnit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive span of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        let span = i64::from(self.end) - i64::from(self.start);
        if span < 0 {
            0
        } else {
            usize::try_from(span + 1).unwrap_or(usize::MAX)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All usable sectors of one scenario under one filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioView {
    pub scenario_name: String,
    pub unit: EnergyUnit,
    pub sector_list: Vec<String>,
    pub year_range: YearRange,
    /// Union of model names across sectors, sorted.
    pub available_models: Vec<String>,
    pub sectors: Vec<SectorData>,
}

impl ScenarioView {
    /// Merge loaded sectors. Returns `None` when there is nothing to merge,
    /// or when no sector has any year.
    pub fn from_sectors(
        scenario_name: impl Into<String>,
        unit: EnergyUnit,
        sectors: Vec<SectorData>,
    ) -> Option<Self> {
        let start = sectors.iter().filter_map(SectorData::first_year).min()?;
        let end = sectors.iter().filter_map(SectorData::last_year).max()?;
        let available_models: BTreeSet<String> = sectors
            .iter()
            .flat_map(|sector| sector.models.iter().cloned())
            .collect();
        Some(ScenarioView {
            scenario_name: scenario_name.into(),
            unit,
            sector_list: sectors.iter().map(|sector| sector.name.clone()).collect(),
            year_range: YearRange { start, end },
            available_models: available_models.into_iter().collect(),
            sectors,
        })
    }

    pub fn sector(&self, name: &str) -> Option<&SectorData> {
        self.sectors.iter().find(|sector| sector.name == name)
    }

    pub fn has_sector(&self, name: &str) -> bool {
        self.sector(name).is_some()
    }
}
