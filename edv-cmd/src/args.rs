//! Shared argument groups and value parsers.

use clap::Args;
use edv_core::{error::Result, filter::FilterConfig, td_loss::TdLossPoint, units::EnergyUnit};

/// Per-request view options.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct FilterArgs {
    /// Output energy unit (kWh, MWh, GWh, TWh)
    #[arg(short, long, default_value = "TWh")]
    pub unit: String,

    /// First year to include
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year to include
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Only load these sectors (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub sectors: Vec<String>,

    /// Only keep these model columns (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<String>,
}

impl Default for FilterArgs {
    fn default() -> Self {
        FilterArgs {
            unit: EnergyUnit::default().to_string(),
            start_year: None,
            end_year: None,
            sectors: Vec::new(),
            models: Vec::new(),
        }
    }
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<FilterConfig> {
        FilterConfig::new(
            self.unit.parse()?,
            self.start_year,
            self.end_year,
            non_empty(&self.sectors),
            non_empty(&self.models),
        )
    }
}

fn non_empty(names: &[String]) -> Option<Vec<String>> {
    let names: Vec<String> = names
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    (!names.is_empty()).then_some(names)
}

/// Parse `Sector=Model`.
pub fn parse_model_assignment(arg: &str) -> std::result::Result<(String, String), String> {
    let (sector, model) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected SECTOR=MODEL, got '{arg}'"))?;
    let (sector, model) = (sector.trim(), model.trim());
    if sector.is_empty() || model.is_empty() {
        return Err(format!("expected SECTOR=MODEL, got '{arg}'"));
    }
    Ok((sector.to_string(), model.to_string()))
}

/// Parse `YEAR:PERCENT`, e.g. `2030:8.5`.
pub fn parse_td_point(arg: &str) -> std::result::Result<TdLossPoint, String> {
    let (year, pct) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected YEAR:PERCENT, got '{arg}'"))?;
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| format!("invalid year in '{arg}'"))?;
    if year < 1 {
        return Err(format!("year must be positive in '{arg}'"));
    }
    let pct: f64 = pct
        .trim()
        .parse()
        .map_err(|_| format!("invalid loss percentage in '{arg}'"))?;
    if !pct.is_finite() {
        return Err(format!("invalid loss percentage in '{arg}'"));
    }
    Ok(TdLossPoint::new(year, pct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use edv_core::error::DemandError;

    #[test]
    fn test_to_filter() {
        let args = FilterArgs {
            unit: "gwh".into(),
            start_year: Some(2025),
            sectors: vec!["Residential".into(), " ".into()],
            ..Default::default()
        };
        let filter = args.to_filter().unwrap();
        assert_eq!(filter.unit, EnergyUnit::GWh);
        assert_eq!(filter.selected_sectors, Some(vec!["Residential".to_string()]));
        assert_eq!(filter.selected_models, None);
    }

    #[test]
    fn test_to_filter_errors() {
        let args = FilterArgs {
            unit: "PJ".into(),
            ..Default::default()
        };
        assert!(matches!(args.to_filter(), Err(DemandError::UnsupportedUnit(_))));

        let args = FilterArgs {
            start_year: Some(2030),
            end_year: Some(2025),
            ..Default::default()
        };
        assert!(matches!(args.to_filter(), Err(DemandError::InvalidYearRange { .. })));
    }

    #[test]
    fn test_parse_model_assignment() {
        assert_eq!(
            parse_model_assignment("Heavy Industry = WAM").unwrap(),
            ("Heavy Industry".to_string(), "WAM".to_string())
        );
        assert!(parse_model_assignment("Residential").is_err());
        assert!(parse_model_assignment("=MLR").is_err());
    }

    #[test]
    fn test_parse_td_point() {
        assert_eq!(parse_td_point("2030:8.5").unwrap(), TdLossPoint::new(2030, 8.5));
        assert!(parse_td_point("2030").is_err());
        assert!(parse_td_point("soon:8").is_err());
        assert!(parse_td_point("0:8").is_err());
        assert!(parse_td_point("2030:NaN").is_err());
    }
}
