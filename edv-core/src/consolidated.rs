//! Consolidated (model-selected, loss-adjusted) demand table types.
//!
//! A row serializes as a flat object whose keys are the export column
//! names: `Year`, one key per sector display name, `Total_Gross_Demand`,
//! `TD_Losses`, `Total_Net_Demand`, `Loss_Percentage`.

use crate::{
    error::Result, scenario::YearRange, selection::ModelSelection, td_loss::TdLossSchedule,
    units::EnergyUnit,
};
use indexmap::IndexMap;
use serde::{
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::fmt;

pub const YEAR_COLUMN: &str = "Year";
pub const GROSS_COLUMN: &str = "Total_Gross_Demand";
pub const TD_LOSSES_COLUMN: &str = "TD_Losses";
pub const NET_COLUMN: &str = "Total_Net_Demand";
pub const LOSS_PERCENTAGE_COLUMN: &str = "Loss_Percentage";

/// Decimal places for demand figures.
pub const DEMAND_DECIMALS: u32 = 3;
/// Decimal places for loss percentages.
pub const LOSS_DECIMALS: u32 = 2;

/// One year of the consolidated table.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedRow {
    pub year: i32,
    /// Sector display name -> selected model value, in column order.
    pub sectors: IndexMap<String, f64>,
    pub total_gross_demand: f64,
    pub td_losses: f64,
    pub total_net_demand: f64,
    pub loss_percentage: f64,
}

impl ConsolidatedRow {
    /// Cells in export order for the given sector columns. A sector absent
    /// from this row is written as `0`.
    pub fn to_record(&self, sector_columns: &[String]) -> Vec<String> {
        let mut record = Vec::with_capacity(sector_columns.len() + 5);
        record.push(self.year.to_string());
        for column in sector_columns {
            record.push(self.sectors.get(column).copied().unwrap_or(0.0).to_string());
        }
        record.push(self.total_gross_demand.to_string());
        record.push(self.td_losses.to_string());
        record.push(self.total_net_demand.to_string());
        record.push(self.loss_percentage.to_string());
        record
    }
}

/// Rows in strictly ascending year order without gaps.
pub type ConsolidatedTable = Vec<ConsolidatedRow>;

/// Export header: `Year`, sectors, then the four totals.
pub fn csv_header(sector_columns: &[String]) -> Vec<String> {
    let mut header = Vec::with_capacity(sector_columns.len() + 5);
    header.push(YEAR_COLUMN.to_string());
    header.extend(sector_columns.iter().cloned());
    header.extend(
        [GROSS_COLUMN, TD_LOSSES_COLUMN, NET_COLUMN, LOSS_PERCENTAGE_COLUMN]
            .iter()
            .map(|column| column.to_string()),
    );
    header
}

impl Serialize for ConsolidatedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sectors.len() + 5))?;
        map.serialize_entry(YEAR_COLUMN, &self.year)?;
        for (sector, value) in &self.sectors {
            map.serialize_entry(sector, value)?;
        }
        map.serialize_entry(GROSS_COLUMN, &self.total_gross_demand)?;
        map.serialize_entry(TD_LOSSES_COLUMN, &self.td_losses)?;
        map.serialize_entry(NET_COLUMN, &self.total_net_demand)?;
        map.serialize_entry(LOSS_PERCENTAGE_COLUMN, &self.loss_percentage)?;
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = ConsolidatedRow;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a consolidated row object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut year: Option<f64> = None;
        let mut gross = None;
        let mut td_losses = None;
        let mut net = None;
        let mut loss_percentage = None;
        let mut sectors = IndexMap::new();
        while let Some(key) = map.next_key::<String>()? {
            let value: f64 = map.next_value()?;
            match key.as_str() {
                YEAR_COLUMN => year = Some(value),
                GROSS_COLUMN => gross = Some(value),
                TD_LOSSES_COLUMN => td_losses = Some(value),
                NET_COLUMN => net = Some(value),
                LOSS_PERCENTAGE_COLUMN => loss_percentage = Some(value),
                _ => {
                    sectors.insert(key, value);
                }
            }
        }
        Ok(ConsolidatedRow {
            year: year.ok_or_else(|| de::Error::missing_field(YEAR_COLUMN))? as i32,
            sectors,
            total_gross_demand: gross.ok_or_else(|| de::Error::missing_field(GROSS_COLUMN))?,
            td_losses: td_losses.ok_or_else(|| de::Error::missing_field(TD_LOSSES_COLUMN))?,
            total_net_demand: net.ok_or_else(|| de::Error::missing_field(NET_COLUMN))?,
            loss_percentage: loss_percentage
                .ok_or_else(|| de::Error::missing_field(LOSS_PERCENTAGE_COLUMN))?,
        })
    }
}

impl<'de> Deserialize<'de> for ConsolidatedRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

/// min/max/mean and first-to-last growth of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub first: f64,
    pub last: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// `(last - first) / first * 100`, or 0 when `first` is 0.
    pub growth_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedSummary {
    pub gross_demand: SeriesStats,
    pub net_demand: SeriesStats,
    pub td_losses: SeriesStats,
    pub average_loss_percentage: f64,
    pub year_count: usize,
    pub sector_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedMetadata {
    pub unit: EnergyUnit,
    pub year_range: YearRange,
    /// Sector display names in column order.
    pub sector_columns: Vec<String>,
    pub model_selection: ModelSelection,
    pub td_losses: TdLossSchedule,
    pub summary: ConsolidatedSummary,
}

/// Output of a consolidated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedResults {
    pub scenario_name: String,
    pub consolidated_data: ConsolidatedTable,
    pub metadata: ConsolidatedMetadata,
}

/// A persisted [`ConsolidatedResults`] plus the time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedArtifact {
    pub scenario_name: String,
    pub consolidated_data: ConsolidatedTable,
    pub metadata: ConsolidatedMetadata,
    pub saved_at: String,
}

impl ConsolidatedArtifact {
    pub fn new(results: ConsolidatedResults, saved_at: String) -> Self {
        ConsolidatedArtifact {
            scenario_name: results.scenario_name,
            consolidated_data: results.consolidated_data,
            metadata: results.metadata,
            saved_at,
        }
    }
}

/// Keeps at most one consolidated artifact per scenario name; saving
/// replaces whatever was stored before.
pub trait ArtifactStore {
    fn save_consolidated(&self, results: &ConsolidatedResults) -> Result<ConsolidatedArtifact>;
    fn load_consolidated(&self, scenario_name: &str) -> Result<Option<ConsolidatedArtifact>>;
}
