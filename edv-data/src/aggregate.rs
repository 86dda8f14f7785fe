use crate::{
    loader::SectorDataLoader,
    tabular::{discover_sources, TabularSource},
};
use edv_core::{
    error::{DemandError, Result},
    filter::FilterConfig,
    scenario::ScenarioView,
};
use log::{debug, info};
use std::path::Path;

/// Loads every sector of a scenario and merges them into one view.
#[derive(Debug, Clone, Default)]
pub struct ScenarioAggregator {
    loader: SectorDataLoader,
}

impl ScenarioAggregator {
    pub fn new(loader: SectorDataLoader) -> Self {
        ScenarioAggregator { loader }
    }

    /// Load the sectors that pass the filter's sector allow-list.
    ///
    /// Individual sectors may be skipped; only a scenario with no usable
    /// sector at all is an error.
    pub fn aggregate<I, S>(
        &self,
        scenario_name: &str,
        sources: I,
        filters: &FilterConfig,
    ) -> Result<ScenarioView>
    where
        I: IntoIterator<Item = S>,
        S: TabularSource,
    {
        filters.validate()?;
        let mut sectors = Vec::new();
        for source in sources {
            let name = source.sector_name().to_string();
            if !filters.allows_sector(&name) {
                debug!("Sector {} not selected, skipping", name);
                continue;
            }
            if let Some(sector) = self.loader.load(&source, &name, filters) {
                sectors.push(sector);
            }
        }
        let view = ScenarioView::from_sectors(scenario_name, filters.unit, sectors).ok_or_else(
            || DemandError::NoUsableSectors {
                scenario: scenario_name.to_string(),
            },
        )?;
        info!(
            "Scenario {}: {} sectors, years {}-{}, {} models",
            view.scenario_name,
            view.sector_list.len(),
            view.year_range.start,
            view.year_range.end,
            view.available_models.len()
        );
        Ok(view)
    }

    /// [`aggregate`](Self::aggregate) over the sector files of `scenario_dir`.
    pub fn aggregate_directory(
        &self,
        scenario_name: &str,
        scenario_dir: &Path,
        filters: &FilterConfig,
    ) -> Result<ScenarioView> {
        let sources = discover_sources(scenario_dir).map_err(|e| match e {
            DemandError::ScenarioNotFound(_) => DemandError::ScenarioNotFound(scenario_name.to_string()),
            other => other,
        })?;
        self.aggregate(scenario_name, sources, filters)
    }
}
