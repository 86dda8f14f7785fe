//! Data processing for sector demand forecasts.
//!
//! Sector results files are read through [`tabular::TabularSource`], turned
//! into [`edv_core::sector::SectorData`] by [`loader::SectorDataLoader`],
//! merged per scenario by [`aggregate::ScenarioAggregator`] and then either
//! consolidated into a loss-adjusted table
//! ([`consolidated::ConsolidatedResultsGenerator`]) or summarized
//! ([`analysis::AnalysisSummary`]).

pub mod aggregate;
pub mod analysis;
pub mod columns;
pub mod consolidated;
pub mod interpolation;
pub mod loader;
pub mod tabular;
