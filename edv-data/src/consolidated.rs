//! Consolidated demand: one selected model per sector, summed per year and
//! grossed up for transmission & distribution losses.

use crate::interpolation::TdLossCurve;
use edv_core::{
    consolidated::{
        ArtifactStore, ConsolidatedArtifact, ConsolidatedMetadata, ConsolidatedResults,
        ConsolidatedRow, ConsolidatedSummary, SeriesStats, DEMAND_DECIMALS, GROSS_COLUMN,
        LOSS_DECIMALS, LOSS_PERCENTAGE_COLUMN, NET_COLUMN, TD_LOSSES_COLUMN, YEAR_COLUMN,
    },
    error::{DemandError, Result},
    filter::FilterConfig,
    scenario::{ScenarioView, YearRange},
    sector::SectorData,
    selection::ModelSelection,
    td_loss::{loss_fraction, TdLossSchedule},
};
use edv_utils::{
    names::display_name,
    numbers::{mean, round_to},
};
use indexmap::IndexMap;
use log::{info, warn};
use std::collections::HashSet;

const GROWTH_DECIMALS: u32 = 2;

/// Longest year span one consolidated table may cover.
pub const MAX_YEAR_SPAN: usize = 1000;

/// One output column: the sector it reads and the model chosen for it.
struct SectorColumn<'a> {
    name: String,
    sector: Option<&'a SectorData>,
    model: &'a str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolidatedResultsGenerator;

impl ConsolidatedResultsGenerator {
    pub fn new() -> Self {
        ConsolidatedResultsGenerator
    }

    /// Build the consolidated table for `view`.
    ///
    /// Years run from the filter bounds, or the scenario's year range where
    /// a bound is absent. A sector with no value for a year contributes 0.
    pub fn generate(
        &self,
        view: &ScenarioView,
        selection: &ModelSelection,
        schedule: &TdLossSchedule,
        filters: &FilterConfig,
    ) -> Result<ConsolidatedResults> {
        if selection.is_empty() {
            return Err(DemandError::EmptyModelSelection);
        }
        if schedule.is_empty() {
            return Err(DemandError::EmptyTdSchedule);
        }
        selection.validate_against(view)?;

        let year_range = YearRange {
            start: filters.start_year.unwrap_or(view.year_range.start),
            end: filters.end_year.unwrap_or(view.year_range.end),
        };
        if year_range.is_empty() {
            return Err(DemandError::InvalidYearRange {
                start: year_range.start,
                end: year_range.end,
            });
        }
        if year_range.len() > MAX_YEAR_SPAN {
            return Err(DemandError::YearSpanTooLarge {
                start: year_range.start,
                end: year_range.end,
                max: MAX_YEAR_SPAN,
            });
        }

        let columns = sector_columns(view, selection);
        let curve = TdLossCurve::from_schedule(schedule);
        let rows: Vec<ConsolidatedRow> = year_range
            .years()
            .map(|year| consolidate_year(year, &columns, &curve))
            .collect();

        let sector_columns: Vec<String> = columns.into_iter().map(|column| column.name).collect();
        let summary = summarize(&rows, sector_columns.len());
        info!(
            "Consolidated {}: {} years ({}-{}), {} sectors, net demand {} -> {} {}",
            view.scenario_name,
            rows.len(),
            year_range.start,
            year_range.end,
            sector_columns.len(),
            summary.net_demand.first,
            summary.net_demand.last,
            view.unit
        );

        Ok(ConsolidatedResults {
            scenario_name: view.scenario_name.clone(),
            consolidated_data: rows,
            metadata: ConsolidatedMetadata {
                unit: view.unit,
                year_range,
                sector_columns,
                model_selection: selection.clone(),
                td_losses: schedule.clone(),
                summary,
            },
        })
    }

    /// [`generate`](Self::generate), then store the result under the
    /// scenario name, replacing any earlier artifact.
    pub fn generate_and_persist(
        &self,
        view: &ScenarioView,
        selection: &ModelSelection,
        schedule: &TdLossSchedule,
        filters: &FilterConfig,
        store: &dyn ArtifactStore,
    ) -> Result<ConsolidatedArtifact> {
        let results = self.generate(view, selection, schedule, filters)?;
        let artifact = store.save_consolidated(&results)?;
        info!(
            "Saved consolidated results for {} at {}",
            artifact.scenario_name, artifact.saved_at
        );
        Ok(artifact)
    }
}

/// Resolve column names in selection order. Display names that collide
/// with a fixed column or an earlier sector fall back to the raw name.
fn sector_columns<'a>(view: &'a ScenarioView, selection: &'a ModelSelection) -> Vec<SectorColumn<'a>> {
    let mut taken: HashSet<String> = [
        YEAR_COLUMN,
        GROSS_COLUMN,
        TD_LOSSES_COLUMN,
        NET_COLUMN,
        LOSS_PERCENTAGE_COLUMN,
    ]
    .iter()
    .map(|column| column.to_string())
    .collect();

    let mut columns = Vec::with_capacity(selection.len());
    for (sector_name, model) in selection.iter() {
        let sector = view.sector(sector_name);
        if !sector.is_some_and(|sector| sector.has_model(model)) {
            warn!(
                "Model {} not found in sector {}, using 0 for every year",
                model, sector_name
            );
        }
        let mut name = display_name(sector_name);
        if taken.contains(&name) {
            warn!(
                "Column '{}' already used, keeping sector name '{}'",
                name, sector_name
            );
            name = sector_name.to_string();
            while taken.contains(&name) {
                name.push('_');
            }
        }
        taken.insert(name.clone());
        columns.push(SectorColumn {
            name,
            sector,
            model,
        });
    }
    columns
}

fn consolidate_year(year: i32, columns: &[SectorColumn<'_>], curve: &TdLossCurve) -> ConsolidatedRow {
    let mut sectors = IndexMap::with_capacity(columns.len());
    let mut gross = 0.0;
    for column in columns {
        let value = column
            .sector
            .and_then(|sector| sector.value_at(column.model, year))
            .unwrap_or(0.0);
        gross += value;
        sectors.insert(column.name.clone(), round_to(value, DEMAND_DECIMALS));
    }

    let loss_percentage = curve.at(year);
    let fraction = loss_fraction(loss_percentage);
    // a loss of 100% or more would divide by zero or flip the sign
    let (net, td_losses) = if fraction < 1.0 {
        let net = gross / (1.0 - fraction);
        (net, net - gross)
    } else {
        (gross, 0.0)
    };

    ConsolidatedRow {
        year,
        sectors,
        total_gross_demand: round_to(gross, DEMAND_DECIMALS),
        td_losses: round_to(td_losses.max(0.0), DEMAND_DECIMALS),
        total_net_demand: round_to(net.max(0.0), DEMAND_DECIMALS),
        loss_percentage: round_to(loss_percentage, LOSS_DECIMALS),
    }
}

fn summarize(rows: &[ConsolidatedRow], sector_count: usize) -> ConsolidatedSummary {
    let column = |pick: fn(&ConsolidatedRow) -> f64| -> Vec<f64> { rows.iter().map(pick).collect() };
    let losses = column(|row| row.loss_percentage);
    ConsolidatedSummary {
        gross_demand: series_stats(&column(|row| row.total_gross_demand)),
        net_demand: series_stats(&column(|row| row.total_net_demand)),
        td_losses: series_stats(&column(|row| row.td_losses)),
        average_loss_percentage: round_to(mean(&losses).unwrap_or(0.0), LOSS_DECIMALS),
        year_count: rows.len(),
        sector_count,
    }
}

/// Stats of one column; all zero for an empty column.
pub fn series_stats(values: &[f64]) -> SeriesStats {
    let first = values.first().copied().unwrap_or(0.0);
    let last = values.last().copied().unwrap_or(0.0);
    let min = values.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = values.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let growth = if first == 0.0 {
        0.0
    } else {
        (last - first) / first * 100.0
    };
    SeriesStats {
        first,
        last,
        min: round_to(min, DEMAND_DECIMALS),
        max: round_to(max, DEMAND_DECIMALS),
        mean: round_to(mean(values).unwrap_or(0.0), DEMAND_DECIMALS),
        growth_percent: round_to(growth, GROWTH_DECIMALS),
    }
}
