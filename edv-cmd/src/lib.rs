//! Command implementations for the EDV CLI.
//!
//! Each subcommand calls one [`DemandService`] operation and prints the
//! result as pretty JSON. Failures print the error payload instead and are
//! returned so the binary exits non-zero.

use clap::Subcommand;
use edv_core::{error::DemandError, selection::ModelSelection, td_loss::TdLossSchedule};
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::{fs, path::{Path, PathBuf}};

pub mod args;
pub mod service;

use args::{parse_model_assignment, parse_td_point, FilterArgs};
use edv_core::td_loss::TdLossPoint;
pub use service::{DemandService, ServiceConfig, ServiceError, ServiceResult};

#[derive(Subcommand)]
pub enum Command {
    /// Load a scenario's sector forecasts and print the filtered view
    Scenario {
        /// Scenario directory name
        scenario: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Build and store consolidated results for a scenario
    Consolidate {
        scenario: String,

        /// JSON object of sector -> model (defaults to the stored selection)
        #[arg(long)]
        models_file: Option<PathBuf>,

        /// JSON list of {year, loss_percentage} (defaults to the stored schedule)
        #[arg(long)]
        td_losses_file: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Growth and consistency diagnostics per sector and model
    Analyze {
        scenario: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Store the model used for each sector, e.g. `Residential=MLR`
    SetModels {
        scenario: String,

        #[arg(required = true, value_parser = parse_model_assignment)]
        assignments: Vec<(String, String)>,
    },

    /// Store the T&D loss schedule, e.g. `2025:10 2030:8.5`
    SetTdLosses {
        scenario: String,

        #[arg(required = true, value_parser = parse_td_point)]
        points: Vec<TdLossPoint>,
    },

    /// Write the stored consolidated results as CSV
    Export {
        scenario: String,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert an energy value between units
    Convert {
        #[arg(allow_negative_numbers = true)]
        value: f64,
        from: String,
        to: String,
    },
}

pub fn run(command: Command, config: ServiceConfig) -> anyhow::Result<()> {
    let service = DemandService::new(config);
    match execute(&service, command) {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err)?);
            Err(err.into())
        }
    }
}

/// Run one command against `service`, returning its JSON payload.
pub fn execute(service: &DemandService, command: Command) -> ServiceResult<Value> {
    match command {
        Command::Scenario { scenario, filters } => {
            let filters = filters.to_filter()?;
            to_payload(&service.get_scenario_data(&scenario, &filters)?)
        }
        Command::Consolidate {
            scenario,
            models_file,
            td_losses_file,
            filters,
        } => {
            let filters = filters.to_filter()?;
            let selection = match models_file {
                Some(path) => read_model_selection(&path)?,
                None => service.load_model_selection(&scenario)?.unwrap_or_default(),
            };
            let schedule = match td_losses_file {
                Some(path) => read_td_schedule(&path)?,
                None => service.load_td_schedule(&scenario)?.unwrap_or_default(),
            };
            to_payload(&service.generate_consolidated_results(&scenario, &selection, &schedule, &filters)?)
        }
        Command::Analyze { scenario, filters } => {
            let filters = filters.to_filter()?;
            to_payload(&service.get_analysis_summary(&scenario, &filters)?)
        }
        Command::SetModels {
            scenario,
            assignments,
        } => {
            let selection: ModelSelection = assignments.into_iter().collect();
            let path = service.save_model_selection(&scenario, &selection)?;
            Ok(saved_payload(&path))
        }
        Command::SetTdLosses { scenario, points } => {
            let schedule = TdLossSchedule::new(points);
            let path = service.save_td_schedule(&scenario, &schedule)?;
            Ok(saved_payload(&path))
        }
        Command::Export { scenario, output } => {
            let rows = service.export_consolidated_csv(&scenario, &output)?;
            Ok(serde_json::json!({
                "success": true,
                "rows": rows,
                "path": output.display().to_string(),
            }))
        }
        Command::Convert { value, from, to } => {
            let converted = service.convert_value(value, &from, &to)?;
            Ok(serde_json::json!({
                "value": converted,
                "unit": to,
            }))
        }
    }
}

fn to_payload<T: Serialize>(value: &T) -> ServiceResult<Value> {
    serde_json::to_value(value).map_err(|e| DemandError::from(e).into())
}

fn saved_payload(path: &Path) -> Value {
    serde_json::json!({
        "success": true,
        "path": path.display().to_string(),
    })
}

fn read_model_selection(path: &Path) -> ServiceResult<ModelSelection> {
    info!("Reading model selection from {}", path.display());
    let text = fs::read_to_string(path).map_err(DemandError::from)?;
    Ok(serde_json::from_str(&text).map_err(DemandError::from)?)
}

fn read_td_schedule(path: &Path) -> ServiceResult<TdLossSchedule> {
    info!("Reading T&D loss schedule from {}", path.display());
    let text = fs::read_to_string(path).map_err(DemandError::from)?;
    let value: Value = serde_json::from_str(&text).map_err(DemandError::from)?;
    Ok(TdLossSchedule::from_json(&value)?)
}
