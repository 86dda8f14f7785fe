//! T&D loss interpolation between configured years.
//!
//! Between two configured years the loss is linear; before the first and
//! after the last configured year it is held constant. No points means no
//! loss; a single point applies to every year.

use edv_core::td_loss::{loss_fraction, TdLossPoint, TdLossSchedule};
use log::warn;
use std::collections::BTreeMap;

/// A schedule sorted by year with at most one point per year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TdLossCurve {
    knots: Vec<TdLossPoint>,
}

impl TdLossCurve {
    /// Sort `points` by year. When a year repeats, the point given last wins.
    pub fn new(points: &[TdLossPoint]) -> Self {
        let mut sorted = points.to_vec();
        sorted.sort_by_key(|point| point.year);
        let mut knots: Vec<TdLossPoint> = Vec::with_capacity(sorted.len());
        for point in sorted {
            match knots.last_mut() {
                Some(last) if last.year == point.year => {
                    warn!(
                        "Duplicate T&D loss year {}: using {}% instead of {}%",
                        point.year, point.loss_percentage, last.loss_percentage
                    );
                    *last = point;
                }
                _ => knots.push(point),
            }
        }
        if knots.is_empty() {
            warn!("No T&D loss points configured, assuming 0% loss");
        }
        TdLossCurve { knots }
    }

    pub fn from_schedule(schedule: &TdLossSchedule) -> Self {
        TdLossCurve::new(&schedule.points)
    }

    pub fn knots(&self) -> &[TdLossPoint] {
        &self.knots
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Loss percentage for `year`.
    pub fn at(&self, year: i32) -> f64 {
        match self.knots.as_slice() {
            [] => 0.0,
            [only] => only.loss_percentage,
            [first, .., last] => {
                if year <= first.year {
                    return first.loss_percentage;
                }
                if year >= last.year {
                    return last.loss_percentage;
                }
                let idx = self.knots.partition_point(|knot| knot.year <= year);
                let (lower, upper) = (&self.knots[idx - 1], &self.knots[idx]);
                if lower.year == year {
                    return lower.loss_percentage;
                }
                let t = (f64::from(year) - f64::from(lower.year))
                    / (f64::from(upper.year) - f64::from(lower.year));
                lower.loss_percentage + (upper.loss_percentage - lower.loss_percentage) * t
            }
        }
    }

    /// Loss as a 0-1 fraction for `year`.
    pub fn fraction_at(&self, year: i32) -> f64 {
        loss_fraction(self.at(year))
    }
}

/// Loss percentage for one year of an unsorted schedule.
pub fn interpolate(schedule: &[TdLossPoint], target_year: i32) -> f64 {
    TdLossCurve::new(schedule).at(target_year)
}

/// Loss percentages for several years of an unsorted schedule.
pub fn interpolate_many(schedule: &[TdLossPoint], target_years: &[i32]) -> BTreeMap<i32, f64> {
    let curve = TdLossCurve::new(schedule);
    target_years
        .iter()
        .map(|year| (*year, curve.at(*year)))
        .collect()
}

/// Loss for one year as a 0-1 fraction.
pub fn interpolated_loss_fraction(schedule: &[TdLossPoint], target_year: i32) -> f64 {
    loss_fraction(interpolate(schedule, target_year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(pairs: &[(i32, f64)]) -> Vec<TdLossPoint> {
        pairs
            .iter()
            .map(|(year, pct)| TdLossPoint::new(*year, *pct))
            .collect()
    }

    #[test]
    fn test_knots_are_exact() {
        let schedule = points(&[(2020, 5.0), (2024, 7.25), (2030, 4.0), (2040, 3.5)]);
        for point in &schedule {
            assert_eq!(interpolate(&schedule, point.year), point.loss_percentage);
        }
    }

    #[test]
    fn test_constant_extrapolation() {
        let schedule = points(&[(2020, 5.0), (2030, 4.0)]);
        assert_eq!(interpolate(&schedule, 2015), 5.0);
        assert_eq!(interpolate(&schedule, 2035), 4.0);
    }

    #[test]
    fn test_linear_between_points() {
        let schedule = points(&[(2020, 5.0), (2030, 4.0)]);
        assert_eq!(interpolate(&schedule, 2025), 4.5);
        assert!((interpolate(&schedule, 2021) - 4.9).abs() < 1e-12);
    }

    #[test]
    fn test_knots_at_i32_limits() {
        let schedule = points(&[(i32::MIN, 0.0), (i32::MAX, 10.0)]);
        let mid = interpolate(&schedule, 0);
        assert!((mid - 5.0).abs() < 1e-6, "got {mid}");
    }

    #[test]
    fn test_single_point_is_constant() {
        let schedule = points(&[(2022, 6.0)]);
        assert_eq!(interpolate(&schedule, 2020), 6.0);
        assert_eq!(interpolate(&schedule, 2025), 6.0);
    }

    #[test]
    fn test_empty_schedule_is_zero() {
        assert_eq!(interpolate(&[], 2025), 0.0);
        let many = interpolate_many(&[], &[2025, 2026]);
        assert_eq!(many.values().copied().collect::<Vec<_>>(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_unsorted_input() {
        let schedule = points(&[(2030, 4.0), (2020, 5.0)]);
        assert_eq!(interpolate(&schedule, 2025), 4.5);
    }

    #[test]
    fn test_duplicate_year_last_wins() {
        let schedule = points(&[(2020, 5.0), (2030, 4.0), (2020, 9.0)]);
        let curve = TdLossCurve::new(&schedule);
        assert_eq!(curve.knots().len(), 2);
        assert_eq!(curve.at(2020), 9.0);
        assert_eq!(curve.at(2010), 9.0);
        assert_eq!(curve.at(2025), 6.5);
    }

    #[test]
    fn test_interpolate_many_and_fraction() {
        let schedule = points(&[(2025, 10.0), (2027, 12.0)]);
        let many = interpolate_many(&schedule, &[2027, 2024, 2026]);
        assert_eq!(many.get(&2024), Some(&10.0));
        assert_eq!(many.get(&2026), Some(&11.0));
        assert_eq!(many.get(&2027), Some(&12.0));
        assert!((interpolated_loss_fraction(&schedule, 2026) - 0.11).abs() < 1e-12);
    }
}
