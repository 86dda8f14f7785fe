use crate::{
    error::{DemandError, Result},
    scenario::ScenarioView,
};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

/// The one model trusted for each sector in a consolidated run, in the
/// order the sectors should appear as table columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSelection(pub IndexMap<String, String>);

impl ModelSelection {
    pub fn new() -> Self {
        ModelSelection(IndexMap::new())
    }

    pub fn insert(&mut self, sector: impl Into<String>, model: impl Into<String>) {
        self.0.insert(sector.into(), model.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn model_for(&self, sector: &str) -> Option<&str> {
        self.0.get(sector).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(sector, model)| (sector.as_str(), model.as_str()))
    }

    /// Sectors named here that the scenario does not have.
    pub fn missing_sectors(&self, view: &ScenarioView) -> Vec<String> {
        self.0
            .keys()
            .filter(|sector| !view.has_sector(sector))
            .cloned()
            .collect()
    }

    /// Fails with [`DemandError::MissingSectors`] naming every unknown sector.
    pub fn validate_against(&self, view: &ScenarioView) -> Result<()> {
        let missing = self.missing_sectors(view);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DemandError::MissingSectors(missing))
        }
    }

    /// Drop entries for sectors the scenario no longer has. Used when
    /// loading a stored selection, which may predate the current files.
    pub fn retain_available(mut self, view: &ScenarioView) -> Self {
        self.0.retain(|sector, model| {
            let keep = view.has_sector(sector);
            if !keep {
                warn!(
                    "Ignoring stored selection {} -> {}: sector not in scenario '{}'",
                    sector, model, view.scenario_name
                );
            }
            keep
        });
        self
    }
}

impl<S: Into<String>, M: Into<String>> FromIterator<(S, M)> for ModelSelection {
    fn from_iter<I: IntoIterator<Item = (S, M)>>(iter: I) -> Self {
        ModelSelection(
            iter.into_iter()
                .map(|(sector, model)| (sector.into(), model.into()))
                .collect(),
        )
    }
}
