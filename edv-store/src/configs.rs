//! Model selection and T&D loss schedule files.

use crate::{
    files::{read_json, read_json_value, write_json},
    ConfigKind, ConfigStore,
};
use edv_core::{error::Result, selection::ModelSelection, td_loss::TdLossSchedule};
use log::info;
use std::path::PathBuf;

impl ConfigStore {
    /// Store the sector -> model selection for a scenario, keeping its order.
    pub fn save_model_selection(&self, scenario_name: &str, selection: &ModelSelection) -> Result<PathBuf> {
        let path = self.path_for(scenario_name, ConfigKind::ModelSelection);
        self.with_scenario_lock(scenario_name, || write_json(&path, selection))?;
        info!(
            "Saved model selection for {} ({} sectors) to {}",
            scenario_name,
            selection.len(),
            path.display()
        );
        Ok(path)
    }

    /// `None` when no selection was ever saved for the scenario.
    pub fn load_model_selection(&self, scenario_name: &str) -> Result<Option<ModelSelection>> {
        read_json(&self.path_for(scenario_name, ConfigKind::ModelSelection))
    }

    pub fn save_td_schedule(&self, scenario_name: &str, schedule: &TdLossSchedule) -> Result<PathBuf> {
        let path = self.path_for(scenario_name, ConfigKind::TdLosses);
        self.with_scenario_lock(scenario_name, || write_json(&path, schedule))?;
        info!(
            "Saved {} T&D loss points for {} to {}",
            schedule.len(),
            scenario_name,
            path.display()
        );
        Ok(path)
    }

    /// Load a stored schedule, dropping malformed points the same way a
    /// freshly submitted schedule would.
    pub fn load_td_schedule(&self, scenario_name: &str) -> Result<Option<TdLossSchedule>> {
        read_json_value(&self.path_for(scenario_name, ConfigKind::TdLosses))?
            .map(|value| TdLossSchedule::from_json(&value))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edv_core::{error::DemandError, td_loss::TdLossPoint};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn model_selection_round_trip_keeps_order() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let selection: ModelSelection = [("Transport", "WAM"), ("Agriculture", "MLR")]
            .into_iter()
            .collect();
        let path = store.save_model_selection("base", &selection).unwrap();
        assert!(path.ends_with("base_model_selection.json"));

        let loaded = store.load_model_selection("base").unwrap().unwrap();
        let sectors: Vec<&str> = loaded.iter().map(|(sector, _)| sector).collect();
        assert_eq!(sectors, vec!["Transport", "Agriculture"]);
        assert!(store.load_model_selection("other").unwrap().is_none());
    }

    #[test]
    fn td_schedule_round_trip() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let schedule = TdLossSchedule::new(vec![
            TdLossPoint::new(2030, 8.0),
            TdLossPoint::new(2025, 10.0),
        ]);
        store.save_td_schedule("base", &schedule).unwrap();
        assert_eq!(store.load_td_schedule("base").unwrap(), Some(schedule));
    }

    #[test]
    fn td_schedule_hand_edited_file() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let path = store.path_for("base", ConfigKind::TdLosses);
        fs::write(
            &path,
            r#"[{"year": "2025", "loss_percentage": "9.5"}, {"year": null, "loss_percentage": 3}]"#,
        )
        .unwrap();
        let loaded = store.load_td_schedule("base").unwrap().unwrap();
        assert_eq!(loaded.points, vec![TdLossPoint::new(2025, 9.5)]);

        fs::write(&path, r#"{"2025": 9.5}"#).unwrap();
        assert!(matches!(
            store.load_td_schedule("base"),
            Err(DemandError::InvalidSchedule(_))
        ));
    }
}
