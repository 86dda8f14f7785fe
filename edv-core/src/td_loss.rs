//! Transmission & distribution loss configuration.
//!
//! Losses are carried as percentages (0-100) throughout; use
//! [`loss_fraction`] where a 0-1 fraction is needed.

use crate::error::{DemandError, Result};
use edv_utils::numbers::coerce_f64;
use log::warn;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Loss percentage configured for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdLossPoint {
    pub year: i32,
    pub loss_percentage: f64,
}

impl TdLossPoint {
    pub fn new(year: i32, loss_percentage: f64) -> Self {
        TdLossPoint {
            year,
            loss_percentage,
        }
    }
}

/// Convert a loss percentage (0-100) to a fraction (0-1).
pub fn loss_fraction(loss_percentage: f64) -> f64 {
    loss_percentage / 100.0
}

/// An unordered list of loss points, as configured by the user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct TdLossSchedule {
    pub points: Vec<TdLossPoint>,
}

impl TdLossSchedule {
    pub fn new(points: Vec<TdLossPoint>) -> Self {
        for point in &points {
            warn_out_of_range(point);
        }
        TdLossSchedule { points }
    }

    /// Parse a schedule from JSON.
    ///
    /// The value must be an array of objects, otherwise the whole schedule is
    /// rejected. Objects whose `year` or `loss_percentage` cannot be coerced
    /// to numbers are dropped with a warning.
    pub fn from_json(value: &Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            DemandError::InvalidSchedule("expected a list of {year, loss_percentage} objects".into())
        })?;
        let mut points = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let fields = item.as_object().ok_or_else(|| {
                DemandError::InvalidSchedule(format!("entry {idx} is not an object"))
            })?;
            let year = fields
                .get("year")
                .and_then(json_number)
                .map(f64::trunc)
                .filter(|year| *year >= 1.0 && *year <= i32::MAX as f64);
            let loss = fields.get("loss_percentage").and_then(json_number);
            match (year, loss) {
                (Some(year), Some(loss_percentage)) => {
                    let point = TdLossPoint::new(year as i32, loss_percentage);
                    warn_out_of_range(&point);
                    points.push(point);
                }
                _ => warn!(
                    "Dropping T&D loss entry {}: year and loss_percentage must be numeric ({})",
                    idx, item
                ),
            }
        }
        Ok(TdLossSchedule { points })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

impl TryFrom<Value> for TdLossSchedule {
    type Error = DemandError;

    fn try_from(value: Value) -> Result<Self> {
        TdLossSchedule::from_json(&value)
    }
}

impl Serialize for TdLossSchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.points.serialize(serializer)
    }
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => coerce_f64(s),
        _ => None,
    }
}

fn warn_out_of_range(point: &TdLossPoint) {
    if !(0.0..=100.0).contains(&point.loss_percentage) {
        warn!(
            "T&D loss for {} is {}%, outside 0-100; keeping it as configured",
            point.year, point.loss_percentage
        );
    }
}
