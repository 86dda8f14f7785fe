/// Error types for demand scenario processing
use thiserror::Error;

/// Main error type for EDV operations.
///
/// Everything except `Io`, `Csv`, `Json` and `InvalidSeries` is a failure the
/// caller caused (a bad name, a missing configuration) rather than a fault.
#[derive(Error, Debug)]
pub enum DemandError {
    /// Energy unit name not recognized
    #[error("Unsupported unit: {0} (expected one of kWh, MWh, GWh, TWh)")]
    UnsupportedUnit(String),

    /// Scenario directory does not exist
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    /// Every sector was skipped after filtering
    #[error("No usable sector data in scenario '{scenario}' after applying filters")]
    NoUsableSectors { scenario: String },

    /// No sector -> model selection supplied
    #[error("Model selection is empty; choose a model for at least one sector")]
    EmptyModelSelection,

    /// No T&D loss points supplied
    #[error("T&D loss schedule is empty; configure at least one loss point")]
    EmptyTdSchedule,

    /// Selection references sectors the scenario does not have
    #[error("Sectors not found in scenario: {}", .0.join(", "))]
    MissingSectors(Vec<String>),

    /// Start year after end year
    #[error("Invalid year range: start {start} is after end {end}")]
    InvalidYearRange { start: i32, end: i32 },

    /// More years requested than one consolidated table may hold
    #[error("Year range {start}-{end} spans more than {max} years")]
    YearSpanTooLarge { start: i32, end: i32, max: usize },

    /// Nothing has been consolidated for the scenario yet
    #[error("No consolidated results stored for scenario '{0}'")]
    NoStoredResults(String),

    /// T&D loss schedule is not a list of objects
    #[error("Invalid T&D loss schedule: {0}")]
    InvalidSchedule(String),

    /// A model series does not line up with its years
    #[error("Invalid series for model '{model}': {values} values for {years} years")]
    InvalidSeries {
        model: String,
        values: usize,
        years: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DemandError {
    /// True for 4xx-equivalent failures, false for internal faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            DemandError::Io(_)
                | DemandError::Csv(_)
                | DemandError::Json(_)
                | DemandError::InvalidSeries { .. }
        )
    }
}

/// Type alias for Results using DemandError
pub type Result<T> = std::result::Result<T, DemandError>;
