//! Turning one sector's results sheet into [`SectorData`].
//!
//! Loading never fails the caller: a sector that cannot be read, has no
//! year column, has no rows in range or no allowed models is skipped with
//! a warning and `None` is returned.

use crate::{
    columns::ColumnClassifier,
    tabular::{Table, TabularSource, PREFERRED_SHEET},
};
use edv_core::{
    filter::FilterConfig,
    sector::{SectorData, SectorMetadata},
    units::{convert, EnergyUnit, SOURCE_UNIT},
};
use edv_utils::numbers::{coerce_f64, coerce_year};
use log::{debug, warn};

#[derive(Debug, Clone)]
pub struct SectorDataLoader {
    classifier: ColumnClassifier,
    preferred_sheet: Option<String>,
    source_unit: EnergyUnit,
}

impl Default for SectorDataLoader {
    fn default() -> Self {
        SectorDataLoader::new(ColumnClassifier::default(), Some(PREFERRED_SHEET.to_string()))
    }
}

impl SectorDataLoader {
    /// Loader for files authored in [`SOURCE_UNIT`].
    pub fn new(classifier: ColumnClassifier, preferred_sheet: Option<String>) -> Self {
        SectorDataLoader {
            classifier,
            preferred_sheet,
            source_unit: SOURCE_UNIT,
        }
    }

    pub fn source_unit(&self) -> EnergyUnit {
        self.source_unit
    }

    /// Read `source` and load it as `sector_name`.
    pub fn load<S: TabularSource + ?Sized>(
        &self,
        source: &S,
        sector_name: &str,
        filters: &FilterConfig,
    ) -> Option<SectorData> {
        let location = source.location();
        match source.read_table(self.preferred_sheet.as_deref()) {
            Ok(table) => self.load_table(&table, sector_name, &location, filters),
            Err(e) => {
                warn!("Skipping sector {}: failed to read {}: {}", sector_name, location, e);
                None
            }
        }
    }

    /// Load an already read sheet.
    pub fn load_table(
        &self,
        table: &Table,
        sector_name: &str,
        location: &str,
        filters: &FilterConfig,
    ) -> Option<SectorData> {
        let Some(year_idx) = self.classifier.find_year_column(&table.headers) else {
            warn!("Skipping sector {}: no year column in {}", sector_name, location);
            return None;
        };

        let mut dropped = 0usize;
        let rows: Vec<(i32, &Vec<String>)> = table
            .rows
            .iter()
            .filter_map(|row| {
                let year = row.get(year_idx).and_then(|cell| coerce_year(cell));
                if year.is_none() {
                    dropped += 1;
                }
                year.map(|year| (year, row))
            })
            .filter(|(year, _)| filters.contains_year(*year))
            .collect();
        if dropped > 0 {
            debug!("Sector {}: dropped {} rows without a numeric year", sector_name, dropped);
        }
        if rows.is_empty() {
            warn!(
                "Skipping sector {}: no rows between {:?} and {:?} in {}",
                sector_name, filters.start_year, filters.end_year, location
            );
            return None;
        }

        let row_refs: Vec<&Vec<String>> = rows.iter().map(|(_, row)| *row).collect();
        let mut columns = self.classifier.model_columns(table, year_idx, &row_refs);
        if columns.is_empty() {
            warn!("Skipping sector {}: no numeric model columns in {}", sector_name, location);
            return None;
        }
        if filters.has_model_filter() {
            columns.retain(|column| filters.allows_model(&column.name));
            if columns.is_empty() {
                warn!(
                    "Skipping sector {}: none of the selected models {:?} present in {}",
                    sector_name,
                    filters.selected_models.as_deref().unwrap_or_default(),
                    location
                );
                return None;
            }
        }

        let converted: Vec<(i32, Vec<f64>)> = rows
            .iter()
            .map(|(year, row)| {
                let values = columns
                    .iter()
                    .map(|column| {
                        row.get(column.index)
                            .and_then(|cell| coerce_f64(cell))
                            .map(|value| convert(value, self.source_unit, filters.unit))
                            .unwrap_or(0.0)
                    })
                    .collect();
                (*year, values)
            })
            .collect();

        let metadata = SectorMetadata {
            source_path: location.to_string(),
            sheet: table.sheet.clone(),
            original_unit: self.source_unit,
            unit: filters.unit,
            row_count: converted.len(),
        };
        let models = columns.into_iter().map(|column| column.name).collect();
        match SectorData::from_rows(sector_name, models, converted, metadata) {
            Ok(sector) => {
                debug!(
                    "Loaded sector {}: {} years, models {:?}",
                    sector.name,
                    sector.years.len(),
                    sector.models
                );
                Some(sector)
            }
            Err(e) => {
                warn!("Skipping sector {}: {}", sector_name, e);
                None
            }
        }
    }
}
