use crate::error::DemandError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Unit every sector results file is authored in. All loading converts
/// from this unit, so changing it changes every consolidated figure.
pub const SOURCE_UNIT: EnergyUnit = EnergyUnit::TWh;

/// Supported energy units, each a fixed multiple of kWh.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default, Serialize, Deserialize)]
pub enum EnergyUnit {
    #[serde(rename = "kWh")]
    KWh,
    MWh,
    GWh,
    #[default]
    TWh,
}

impl EnergyUnit {
    pub const ALL: [EnergyUnit; 4] = [
        EnergyUnit::KWh,
        EnergyUnit::MWh,
        EnergyUnit::GWh,
        EnergyUnit::TWh,
    ];

    /// Size of one unit expressed in kWh.
    pub fn factor(self) -> f64 {
        match self {
            EnergyUnit::KWh => 1.0,
            EnergyUnit::MWh => 1e3,
            EnergyUnit::GWh => 1e6,
            EnergyUnit::TWh => 1e9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnergyUnit::KWh => "kWh",
            EnergyUnit::MWh => "MWh",
            EnergyUnit::GWh => "GWh",
            EnergyUnit::TWh => "TWh",
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyUnit {
    type Err = DemandError;

    /// Unit names are matched case-insensitively ("twh" == "TWh").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EnergyUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DemandError::UnsupportedUnit(wanted.to_string()))
    }
}

/// Convert `value` between units: `value * factor(from) / factor(to)`.
pub fn convert(value: f64, from: EnergyUnit, to: EnergyUnit) -> f64 {
    if from == to {
        return value;
    }
    value * from.factor() / to.factor()
}

/// Same as [`convert`] with unit names; unknown names are an
/// [`DemandError::UnsupportedUnit`].
pub fn convert_named(value: f64, from: &str, to: &str) -> crate::error::Result<f64> {
    let from: EnergyUnit = from.parse()?;
    let to: EnergyUnit = to.parse()?;
    Ok(convert(value, from, to))
}
