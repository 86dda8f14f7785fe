//! The demand service: the operations a web or CLI front end calls.
//!
//! Every public operation returns either its payload or a [`ServiceError`];
//! failures never escape as panics.

use edv_core::{
    consolidated::{ArtifactStore, ConsolidatedArtifact},
    error::{DemandError, Result},
    filter::FilterConfig,
    scenario::ScenarioView,
    selection::ModelSelection,
    td_loss::TdLossSchedule,
    units::convert_named,
};
use edv_data::{
    aggregate::ScenarioAggregator,
    analysis::{AnalysisReport, AnalysisSummary},
    columns::ColumnClassifier,
    consolidated::ConsolidatedResultsGenerator,
    loader::SectorDataLoader,
    tabular::PREFERRED_SHEET,
};
use edv_store::ConfigStore;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SCENARIOS_DIR: &str = "results/demand_projection";
pub const DEFAULT_CONFIG_DIR: &str = "config";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// One sub-directory per scenario, holding the sector result files.
    pub scenarios_dir: PathBuf,
    /// Where selections, schedules and consolidated results are stored.
    pub config_dir: PathBuf,
    pub preferred_sheet: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            scenarios_dir: PathBuf::from(DEFAULT_SCENARIOS_DIR),
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            preferred_sheet: Some(PREFERRED_SHEET.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request was wrong (4xx).
    ClientError,
    /// Something failed on our side (5xx).
    InternalError,
}

/// Error payload returned across the service boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{error}")]
pub struct ServiceError {
    pub success: bool,
    pub kind: ErrorKind,
    pub error: String,
}

impl ServiceError {
    pub fn is_client_error(&self) -> bool {
        self.kind == ErrorKind::ClientError
    }
}

impl From<DemandError> for ServiceError {
    fn from(err: DemandError) -> Self {
        let kind = if err.is_client_error() {
            warn!("Request failed: {}", err);
            ErrorKind::ClientError
        } else {
            error!("Internal error: {:?}", err);
            ErrorKind::InternalError
        };
        ServiceError {
            success: false,
            kind,
            error: err.to_string(),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

pub struct DemandService {
    config: ServiceConfig,
    aggregator: ScenarioAggregator,
    generator: ConsolidatedResultsGenerator,
    analysis: AnalysisSummary,
    store: ConfigStore,
}

impl DemandService {
    pub fn new(config: ServiceConfig) -> Self {
        let loader = SectorDataLoader::new(ColumnClassifier::default(), config.preferred_sheet.clone());
        DemandService {
            aggregator: ScenarioAggregator::new(loader),
            generator: ConsolidatedResultsGenerator::new(),
            analysis: AnalysisSummary::new(),
            store: ConfigStore::new(config.config_dir.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn scenario_dir(&self, scenario_name: &str) -> Result<PathBuf> {
        let name = scenario_name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(|c: char| c == '/' || c == '\\') {
            return Err(DemandError::ScenarioNotFound(scenario_name.to_string()));
        }
        Ok(self.config.scenarios_dir.join(name))
    }

    fn load_view(&self, scenario_name: &str, filters: &FilterConfig) -> Result<ScenarioView> {
        let dir = self.scenario_dir(scenario_name)?;
        self.aggregator.aggregate_directory(scenario_name, &dir, filters)
    }

    /// All usable sectors of a scenario under `filters`.
    pub fn get_scenario_data(&self, scenario_name: &str, filters: &FilterConfig) -> ServiceResult<ScenarioView> {
        Ok(self.load_view(scenario_name, filters)?)
    }

    /// Consolidate a scenario and store the result, replacing the last run.
    pub fn generate_consolidated_results(
        &self,
        scenario_name: &str,
        selection: &ModelSelection,
        schedule: &TdLossSchedule,
        filters: &FilterConfig,
    ) -> ServiceResult<ConsolidatedArtifact> {
        if selection.is_empty() {
            return Err(DemandError::EmptyModelSelection.into());
        }
        if schedule.is_empty() {
            return Err(DemandError::EmptyTdSchedule.into());
        }
        let view = self.load_view(scenario_name, filters)?;
        Ok(self
            .generator
            .generate_and_persist(&view, selection, schedule, filters, &self.store)?)
    }

    /// Consolidate using the selection and schedule saved for the scenario.
    pub fn generate_with_stored_config(
        &self,
        scenario_name: &str,
        filters: &FilterConfig,
    ) -> ServiceResult<ConsolidatedArtifact> {
        let selection = self.load_model_selection(scenario_name)?.unwrap_or_default();
        let schedule = self.load_td_schedule(scenario_name)?.unwrap_or_default();
        self.generate_consolidated_results(scenario_name, &selection, &schedule, filters)
    }

    pub fn get_analysis_summary(&self, scenario_name: &str, filters: &FilterConfig) -> ServiceResult<AnalysisReport> {
        let view = self.load_view(scenario_name, filters)?;
        Ok(self.analysis.summarize(&view))
    }

    /// Save a selection after checking every sector exists in the scenario.
    pub fn save_model_selection(&self, scenario_name: &str, selection: &ModelSelection) -> ServiceResult<PathBuf> {
        if selection.is_empty() {
            return Err(DemandError::EmptyModelSelection.into());
        }
        let view = self.load_view(scenario_name, &FilterConfig::default())?;
        selection.validate_against(&view)?;
        Ok(self.store.save_model_selection(scenario_name, selection)?)
    }

    /// The stored selection, minus sectors the scenario no longer has.
    pub fn load_model_selection(&self, scenario_name: &str) -> ServiceResult<Option<ModelSelection>> {
        let Some(stored) = self.store.load_model_selection(scenario_name)? else {
            info!("No model selection stored for {}", scenario_name);
            return Ok(None);
        };
        let view = self.load_view(scenario_name, &FilterConfig::default())?;
        Ok(Some(stored.retain_available(&view)))
    }

    pub fn save_td_schedule(&self, scenario_name: &str, schedule: &TdLossSchedule) -> ServiceResult<PathBuf> {
        if schedule.is_empty() {
            return Err(DemandError::EmptyTdSchedule.into());
        }
        Ok(self.store.save_td_schedule(scenario_name, schedule)?)
    }

    pub fn load_td_schedule(&self, scenario_name: &str) -> ServiceResult<Option<TdLossSchedule>> {
        Ok(self.store.load_td_schedule(scenario_name)?)
    }

    /// The last consolidated run stored for the scenario, if any.
    pub fn load_consolidated_results(&self, scenario_name: &str) -> ServiceResult<Option<ConsolidatedArtifact>> {
        Ok(self.store.load_consolidated(scenario_name)?)
    }

    /// Write the stored consolidated rows to `dest` as CSV.
    pub fn export_consolidated_csv(&self, scenario_name: &str, dest: &Path) -> ServiceResult<usize> {
        self.store
            .export_csv(scenario_name, dest)?
            .ok_or_else(|| DemandError::NoStoredResults(scenario_name.to_string()).into())
    }

    pub fn convert_value(&self, value: f64, from_unit: &str, to_unit: &str) -> ServiceResult<f64> {
        Ok(convert_named(value, from_unit, to_unit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edv_core::{td_loss::TdLossPoint, units::EnergyUnit};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn fixture() -> (TempDir, DemandService) {
        let dir = tempdir().unwrap();
        let base = dir.path().join("scenarios").join("base");
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("Residential.csv"), "Year,MLR,WAM\n2027,14,7\n2025,10,5\n2026,12,6\n").unwrap();
        fs::write(base.join("Industrial.csv"), "Year,WAM,Total\n2025,5,5\n2026,5,5\n2027,6,6\n").unwrap();
        fs::write(base.join("Notes.csv"), "Comment\nnothing to see\n").unwrap();
        let service = DemandService::new(ServiceConfig {
            scenarios_dir: dir.path().join("scenarios"),
            config_dir: dir.path().join("config"),
            preferred_sheet: Some(PREFERRED_SHEET.to_string()),
        });
        (dir, service)
    }

    fn selection() -> ModelSelection {
        [("Residential", "MLR"), ("Industrial", "WAM")]
            .into_iter()
            .collect()
    }

    fn schedule() -> TdLossSchedule {
        TdLossSchedule::new(vec![TdLossPoint::new(2025, 10.0), TdLossPoint::new(2027, 10.0)])
    }

    #[test]
    fn test_scenario_data() {
        let (_dir, service) = fixture();
        let view = service.get_scenario_data("base", &FilterConfig::default()).unwrap();
        assert_eq!(view.sector_list, vec!["Industrial", "Residential"]);
        assert_eq!(view.available_models, vec!["MLR", "WAM"]);

        let err = service.get_scenario_data("missing", &FilterConfig::default()).unwrap_err();
        assert!(!err.success);
        assert!(err.is_client_error());
        assert_eq!(err.error, "Scenario not found: missing");

        let err = service.get_scenario_data("../base", &FilterConfig::default()).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_consolidate_end_to_end() {
        let (dir, service) = fixture();
        let artifact = service
            .generate_consolidated_results("base", &selection(), &schedule(), &FilterConfig::default())
            .unwrap();
        let net: Vec<f64> = artifact
            .consolidated_data
            .iter()
            .map(|row| row.total_net_demand)
            .collect();
        let expected = [16.667, 18.889, 22.222];
        for (actual, expected) in net.iter().zip(expected) {
            assert!((actual - expected).abs() < 1e-9);
        }

        let stored = service.load_consolidated_results("base").unwrap().unwrap();
        assert_eq!(stored, artifact);
        let csv = fs::read_to_string(dir.path().join("config").join("base_consolidated_results.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Year,Residential,Industrial,Total_Gross_Demand,TD_Losses,Total_Net_Demand,Loss_Percentage")
        );
        assert_eq!(lines.next(), Some("2025,10,5,15,1.667,16.667,10"));
    }

    #[test]
    fn test_consolidate_in_other_unit() {
        let (_dir, service) = fixture();
        let filters = FilterConfig {
            unit: EnergyUnit::GWh,
            end_year: Some(2025),
            ..Default::default()
        };
        let artifact = service
            .generate_consolidated_results("base", &selection(), &schedule(), &filters)
            .unwrap();
        assert_eq!(artifact.metadata.unit, EnergyUnit::GWh);
        assert_eq!(artifact.consolidated_data.len(), 1);
        assert_eq!(artifact.consolidated_data[0].total_gross_demand, 15_000.0);
    }

    #[test]
    fn test_consolidate_errors_are_client_errors() {
        let (_dir, service) = fixture();
        let filters = FilterConfig::default();
        let err = service
            .generate_consolidated_results("base", &ModelSelection::new(), &schedule(), &filters)
            .unwrap_err();
        assert!(err.is_client_error());

        let unknown: ModelSelection = [("Mining", "MLR")].into_iter().collect();
        let err = service
            .generate_consolidated_results("base", &unknown, &schedule(), &filters)
            .unwrap_err();
        assert_eq!(err.error, "Sectors not found in scenario: Mining");

        let err = service.generate_with_stored_config("base", &filters).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ClientError);
    }

    #[test]
    fn test_stored_configuration() {
        let (_dir, service) = fixture();
        service.save_model_selection("base", &selection()).unwrap();
        service.save_td_schedule("base", &schedule()).unwrap();
        assert_eq!(service.load_model_selection("base").unwrap(), Some(selection()));
        assert_eq!(service.load_td_schedule("base").unwrap(), Some(schedule()));

        let artifact = service
            .generate_with_stored_config("base", &FilterConfig::default())
            .unwrap();
        assert_eq!(artifact.consolidated_data.len(), 3);

        let bad: ModelSelection = [("Mining", "MLR")].into_iter().collect();
        assert!(service.save_model_selection("base", &bad).is_err());
        assert!(service.save_td_schedule("base", &TdLossSchedule::default()).is_err());
    }

    #[test]
    fn test_stale_selection_entries_are_dropped() {
        let (_dir, service) = fixture();
        let stale: ModelSelection = [("Residential", "MLR"), ("Mining", "WAM")]
            .into_iter()
            .collect();
        service.store().save_model_selection("base", &stale).unwrap();
        let loaded = service.load_model_selection("base").unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.model_for("Residential"), Some("MLR"));
    }

    #[test]
    fn test_export_requires_stored_results() {
        let (dir, service) = fixture();
        let dest = dir.path().join("export.csv");
        let err = service.export_consolidated_csv("base", &dest).unwrap_err();
        assert!(err.is_client_error());

        service
            .generate_consolidated_results("base", &selection(), &schedule(), &FilterConfig::default())
            .unwrap();
        assert_eq!(service.export_consolidated_csv("base", &dest).unwrap(), 3);
        assert!(dest.exists());
    }

    #[test]
    fn test_analysis_summary() {
        let (_dir, service) = fixture();
        let report = service
            .get_analysis_summary("base", &FilterConfig::default())
            .unwrap();
        assert_eq!(report.sector_count, 2);
        assert_eq!(report.model_coverage.len(), 2);
    }

    #[test]
    fn test_convert_value() {
        let (_dir, service) = fixture();
        assert_eq!(service.convert_value(1.5, "TWh", "GWh").unwrap(), 1500.0);
        let err = service.convert_value(1.0, "PJ", "TWh").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_payload_shape() {
        let payload = serde_json::to_value(ServiceError::from(DemandError::EmptyTdSchedule)).unwrap();
        assert_eq!(payload["success"], false);
        assert_eq!(payload["kind"], "client_error");
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let payload = serde_json::to_value(ServiceError::from(DemandError::from(io))).unwrap();
        assert_eq!(payload["kind"], "internal_error");
    }
}
