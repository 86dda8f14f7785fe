//! Growth and consistency diagnostics per sector and model.

use edv_core::{
    scenario::{ScenarioView, YearRange},
    sector::SectorData,
    units::EnergyUnit,
};
use edv_utils::numbers::{mean, round_to};
use log::{debug, info};
use serde::{Deserialize, Serialize};

const SCORE_DECIMALS: u32 = 2;
const STATS_DECIMALS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDiagnostics {
    pub model: String,
    pub points: usize,
    pub first_value: f64,
    pub last_value: f64,
    /// Compound annual growth in percent; `None` when it cannot be computed.
    pub cagr_percent: Option<f64>,
    /// 0-100, higher means steadier year-on-year growth.
    pub consistency_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorAnalysis {
    pub sector: String,
    pub year_range: Option<YearRange>,
    pub models: Vec<ModelDiagnostics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCoverage {
    pub model: String,
    pub sector_count: usize,
    /// Fraction (0-1) of the scenario's sectors that carry the model.
    pub coverage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub spread: f64,
    pub value_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub scenario_name: String,
    pub unit: EnergyUnit,
    pub sector_count: usize,
    pub year_range: YearRange,
    pub sectors: Vec<SectorAnalysis>,
    pub model_coverage: Vec<ModelCoverage>,
    pub overall: Option<OverallStats>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisSummary;

impl AnalysisSummary {
    pub fn new() -> Self {
        AnalysisSummary
    }

    pub fn summarize(&self, view: &ScenarioView) -> AnalysisReport {
        let sectors: Vec<SectorAnalysis> = view.sectors.iter().map(analyze_sector).collect();

        let sector_count = view.sectors.len();
        let model_coverage = view
            .available_models
            .iter()
            .map(|model| {
                let count = view.sectors.iter().filter(|s| s.has_model(model)).count();
                ModelCoverage {
                    model: model.clone(),
                    sector_count: count,
                    coverage: if sector_count == 0 {
                        0.0
                    } else {
                        round_to(count as f64 / sector_count as f64, STATS_DECIMALS)
                    },
                }
            })
            .collect();

        let values: Vec<f64> = view
            .sectors
            .iter()
            .flat_map(|sector| sector.data.values().flatten().copied())
            .collect();
        let overall = overall_stats(&values);

        info!(
            "Analyzed {}: {} sectors, {} models, {} values",
            view.scenario_name,
            sector_count,
            view.available_models.len(),
            values.len()
        );
        AnalysisReport {
            scenario_name: view.scenario_name.clone(),
            unit: view.unit,
            sector_count,
            year_range: view.year_range,
            sectors,
            model_coverage,
            overall,
        }
    }
}

fn analyze_sector(sector: &SectorData) -> SectorAnalysis {
    let models = sector
        .models
        .iter()
        .filter_map(|model| {
            let values = sector.series(model)?;
            let cagr_percent = cagr(&sector.years, values);
            if cagr_percent.is_none() {
                debug!(
                    "Sector {} model {}: not enough positive values for a growth rate",
                    sector.name, model
                );
            }
            Some(ModelDiagnostics {
                model: model.clone(),
                points: values.len(),
                first_value: values.first().copied().unwrap_or(0.0),
                last_value: values.last().copied().unwrap_or(0.0),
                cagr_percent,
                consistency_score: consistency_score(values),
            })
        })
        .collect();
    let year_range = match (sector.first_year(), sector.last_year()) {
        (Some(start), Some(end)) => Some(YearRange { start, end }),
        _ => None,
    };
    SectorAnalysis {
        sector: sector.name.clone(),
        year_range,
        models,
    }
}

/// Compound annual growth rate in percent between the first and last
/// strictly positive values, spread over the years between them.
pub fn cagr(years: &[i32], values: &[f64]) -> Option<f64> {
    let mut positive = years
        .iter()
        .zip(values)
        .filter(|(_, value)| **value > 0.0);
    let (first_year, first) = positive.next()?;
    let (last_year, last) = positive.last()?;
    let span = f64::from(*last_year) - f64::from(*first_year);
    if span <= 0.0 {
        return None;
    }
    let rate = (last / first).powf(1.0 / span) - 1.0;
    Some(round_to(rate * 100.0, SCORE_DECIMALS))
}

/// `100 / (1 + cv)` of the year-on-year relative changes.
pub fn consistency_score(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return 100.0;
    }
    let changes: Vec<f64> = values
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0].abs())
        .collect();
    let Some(avg) = mean(&changes).filter(|_| changes.len() >= 2) else {
        return 100.0;
    };
    let variance = changes.iter().map(|c| (c - avg).powi(2)).sum::<f64>() / changes.len() as f64;
    let std = variance.sqrt();
    let cv = if avg == 0.0 {
        if std == 0.0 {
            0.0
        } else {
            return 0.0;
        }
    } else {
        std / avg.abs()
    };
    round_to(100.0 / (1.0 + cv), SCORE_DECIMALS)
}

fn overall_stats(values: &[f64]) -> Option<OverallStats> {
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().reduce(f64::max)?;
    Some(OverallStats {
        min: round_to(min, STATS_DECIMALS),
        max: round_to(max, STATS_DECIMALS),
        mean: round_to(mean(values)?, STATS_DECIMALS),
        spread: round_to(max - min, STATS_DECIMALS),
        value_count: values.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate::ScenarioAggregator, tabular::MemorySource};
    use edv_core::filter::FilterConfig;

    #[test]
    fn test_cagr() {
        assert_eq!(cagr(&[2020, 2022], &[100.0, 121.0]), Some(10.0));
        // zeros are skipped, the span follows the positive values
        assert_eq!(cagr(&[2019, 2020, 2021, 2022], &[0.0, 100.0, 0.0, 121.0]), Some(10.0));
        assert_eq!(cagr(&[2020, 2021], &[0.0, 5.0]), None);
        assert_eq!(cagr(&[i32::MIN, i32::MAX], &[1.0, 1.0]), Some(0.0));
        assert_eq!(cagr(&[2020], &[5.0]), None);
        assert_eq!(cagr(&[2020, 2021], &[4.0, 2.0]), Some(-50.0));
    }

    #[test]
    fn test_cagr_none_is_not_zero_growth() {
        assert_eq!(cagr(&[2020, 2021], &[3.0, 3.0]), Some(0.0));
        assert_eq!(cagr(&[2020, 2021], &[-3.0, 3.0]), None);
    }

    #[test]
    fn test_consistency_score() {
        assert_eq!(consistency_score(&[1.0, 2.0]), 100.0);
        // constant growth rate has no variation
        assert_eq!(consistency_score(&[100.0, 110.0, 121.0]), 100.0);
        assert_eq!(consistency_score(&[5.0, 5.0, 5.0, 5.0]), 100.0);
        // changes +1.0 and -0.5: mean 0.25, std 0.75, cv 3
        assert_eq!(consistency_score(&[1.0, 2.0, 1.0]), 25.0);
        // changes +1.0 and -1.0 average to zero with spread
        assert_eq!(consistency_score(&[1.0, 2.0, 0.0]), 0.0);
        // only one usable change after a zero
        assert_eq!(consistency_score(&[0.0, 0.0, 3.0, 4.0]), 100.0);
    }

    #[test]
    fn test_summarize() {
        let sources = vec![
            MemorySource::from_csv_str("Residential", "Year,MLR,WAM\n2025,10,0\n2026,12,0\n2027,14.4,0\n")
                .unwrap(),
            MemorySource::from_csv_str("Industrial", "Year,WAM\n2025,5\n2027,6\n").unwrap(),
        ];
        let view = ScenarioAggregator::default()
            .aggregate("base", sources, &FilterConfig::default())
            .unwrap();
        let report = AnalysisSummary::new().summarize(&view);

        assert_eq!(report.sector_count, 2);
        let residential = &report.sectors[0];
        assert_eq!(residential.sector, "Residential");
        assert_eq!(residential.models[0].cagr_percent, Some(20.0));
        assert_eq!(residential.models[0].consistency_score, 100.0);
        assert_eq!(residential.models[1].cagr_percent, None);

        let coverage: Vec<(&str, usize, f64)> = report
            .model_coverage
            .iter()
            .map(|c| (c.model.as_str(), c.sector_count, c.coverage))
            .collect();
        assert_eq!(coverage, vec![("MLR", 1, 0.5), ("WAM", 2, 1.0)]);

        let overall = report.overall.unwrap();
        assert_eq!(overall.value_count, 8);
        assert_eq!(overall.min, 0.0);
        assert_eq!(overall.max, 14.4);
        assert_eq!(overall.spread, 14.4);
    }
}
