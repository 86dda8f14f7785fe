//! Persisted consolidated results.

use crate::{
    files::{csv_bytes, read_json, write_atomic, write_atomic_all},
    ConfigKind, ConfigStore,
};
use edv_core::{
    consolidated::{csv_header, ArtifactStore, ConsolidatedArtifact, ConsolidatedResults, ConsolidatedRow},
    error::Result,
};
use edv_utils::dates::now_timestamp;
use log::info;
use std::path::Path;

fn consolidated_csv(rows: &[ConsolidatedRow], sector_columns: &[String]) -> Result<Vec<u8>> {
    csv_bytes(
        &csv_header(sector_columns),
        rows.iter().map(|row| row.to_record(sector_columns)),
    )
}

impl ArtifactStore for ConfigStore {
    /// Write the JSON artifact and its CSV companion, replacing any
    /// earlier run for the scenario.
    fn save_consolidated(&self, results: &ConsolidatedResults) -> Result<ConsolidatedArtifact> {
        let artifact = ConsolidatedArtifact::new(results.clone(), now_timestamp());
        let json_path = self.path_for(&artifact.scenario_name, ConfigKind::ConsolidatedResults);
        let csv_path = self.consolidated_csv_path(&artifact.scenario_name);
        let json = serde_json::to_vec_pretty(&artifact)?;
        let csv = consolidated_csv(&artifact.consolidated_data, &artifact.metadata.sector_columns)?;
        // JSON goes last: it is what loads read back
        let files = [
            (csv_path.as_path(), csv.as_slice()),
            (json_path.as_path(), json.as_slice()),
        ];
        self.with_scenario_lock(&artifact.scenario_name, || write_atomic_all(&files))?;
        info!(
            "Saved {} consolidated rows for {} to {}",
            artifact.consolidated_data.len(),
            artifact.scenario_name,
            json_path.display()
        );
        Ok(artifact)
    }

    fn load_consolidated(&self, scenario_name: &str) -> Result<Option<ConsolidatedArtifact>> {
        read_json(&self.path_for(scenario_name, ConfigKind::ConsolidatedResults))
    }
}

impl ConfigStore {
    /// Write the stored consolidated rows of a scenario as CSV to `dest`.
    /// Returns the number of rows written, or `None` if nothing is stored.
    pub fn export_csv(&self, scenario_name: &str, dest: &Path) -> Result<Option<usize>> {
        let Some(artifact) = self.load_consolidated(scenario_name)? else {
            return Ok(None);
        };
        let csv = consolidated_csv(&artifact.consolidated_data, &artifact.metadata.sector_columns)?;
        write_atomic(dest, &csv)?;
        info!(
            "Exported {} consolidated rows for {} to {}",
            artifact.consolidated_data.len(),
            scenario_name,
            dest.display()
        );
        Ok(Some(artifact.consolidated_data.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edv_core::{
        consolidated::{ConsolidatedMetadata, ConsolidatedSummary, SeriesStats},
        scenario::YearRange,
        selection::ModelSelection,
        td_loss::{TdLossPoint, TdLossSchedule},
        units::EnergyUnit,
    };
    use indexmap::IndexMap;
    use std::{fs, sync::Arc, thread};
    use tempfile::tempdir;

    fn results(scenario: &str, gross: &[f64]) -> ConsolidatedResults {
        let rows: Vec<ConsolidatedRow> = gross
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                let mut sectors = IndexMap::new();
                sectors.insert("Residential".to_string(), *value);
                ConsolidatedRow {
                    year: 2025 + idx as i32,
                    sectors,
                    total_gross_demand: *value,
                    td_losses: 0.0,
                    total_net_demand: *value,
                    loss_percentage: 0.0,
                }
            })
            .collect();
        let stats = SeriesStats {
            first: 0.0,
            last: 0.0,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            growth_percent: 0.0,
        };
        ConsolidatedResults {
            scenario_name: scenario.to_string(),
            metadata: ConsolidatedMetadata {
                unit: EnergyUnit::TWh,
                year_range: YearRange {
                    start: 2025,
                    end: 2024 + rows.len() as i32,
                },
                sector_columns: vec!["Residential".to_string()],
                model_selection: [("Residential", "MLR")].into_iter().collect::<ModelSelection>(),
                td_losses: TdLossSchedule::new(vec![TdLossPoint::new(2025, 0.0)]),
                summary: ConsolidatedSummary {
                    gross_demand: stats,
                    net_demand: stats,
                    td_losses: stats,
                    average_loss_percentage: 0.0,
                    year_count: rows.len(),
                    sector_count: 1,
                },
            },
            consolidated_data: rows,
        }
    }

    #[test]
    fn save_writes_json_and_csv() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let artifact = store.save_consolidated(&results("base", &[1.5, 2.0])).unwrap();
        assert!(artifact.saved_at.ends_with('Z'));

        let csv = fs::read_to_string(dir.path().join("base_consolidated_results.csv")).unwrap();
        assert_eq!(
            csv,
            "Year,Residential,Total_Gross_Demand,TD_Losses,Total_Net_Demand,Loss_Percentage\n\
             2025,1.5,1.5,0,1.5,0\n\
             2026,2,2,0,2,0\n"
        );

        let loaded = store.load_consolidated("base").unwrap().unwrap();
        assert_eq!(loaded, artifact);
    }

    #[test]
    fn save_overwrites_previous_run() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        store.save_consolidated(&results("base", &[1.0, 2.0, 3.0])).unwrap();
        store.save_consolidated(&results("base", &[4.0])).unwrap();
        let loaded = store.load_consolidated("base").unwrap().unwrap();
        assert_eq!(loaded.consolidated_data.len(), 1);
        assert_eq!(loaded.consolidated_data[0].total_gross_demand, 4.0);
        assert!(store.load_consolidated("other").unwrap().is_none());
    }

    #[test]
    fn concurrent_saves_leave_a_complete_file() {
        let dir = tempdir().unwrap();
        let store = Arc::new(ConfigStore::new(dir.path()));
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let gross = vec![n as f64; n + 1];
                    store.save_consolidated(&results("base", &gross)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let loaded = store.load_consolidated("base").unwrap().unwrap();
        let n = loaded.consolidated_data.len() - 1;
        assert!(loaded
            .consolidated_data
            .iter()
            .all(|row| row.total_gross_demand == n as f64));
        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 2, "only the JSON and CSV files should remain");
    }

    #[test]
    fn export_csv_to_caller_path() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config"));
        let dest = dir.path().join("out").join("base.csv");
        assert_eq!(store.export_csv("base", &dest).unwrap(), None);

        store.save_consolidated(&results("base", &[3.25])).unwrap();
        assert_eq!(store.export_csv("base", &dest).unwrap(), Some(1));
        let csv = fs::read_to_string(&dest).unwrap();
        assert!(csv.starts_with("Year,Residential,Total_Gross_Demand"));
        assert!(csv.contains("2025,3.25,3.25,0,3.25,0"));
    }
}
