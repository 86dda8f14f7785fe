//! Tabular sources for sector results.
//!
//! A sector is stored either as a single CSV file (`Residential.csv`) or as
//! a directory of CSV sheets (`Residential/Results.csv`, `Residential/Inputs.csv`).

use csv::ReaderBuilder;
use edv_core::error::{DemandError, Result};
use edv_utils::names::sector_name_from_path;
use log::{debug, warn};
use std::{
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
};

/// Sheet read from multi-sheet sources when it exists.
pub const PREFERRED_SHEET: &str = "Results";

/// Raw cells of one sheet. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Sheet name when the source had several.
    pub sheet: Option<String>,
}

impl Table {
    /// Parse CSV with a header row. Short rows are padded with blanks and
    /// long rows truncated.
    pub fn from_reader<R: Read>(reader: R) -> Result<Table> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Table {
            headers,
            rows,
            sheet: None,
        })
    }

    pub fn from_csv_str(csv_data: &str) -> Result<Table> {
        Table::from_reader(csv_data.as_bytes())
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }
}

/// Anything a sector's results can be read from.
pub trait TabularSource {
    /// Sector name, usually derived from the file name.
    fn sector_name(&self) -> &str;

    /// Human readable origin, recorded in sector metadata and log lines.
    fn location(&self) -> String;

    /// Read the preferred sheet, or the first available one.
    fn read_table(&self, preferred_sheet: Option<&str>) -> Result<Table>;
}

impl<T: TabularSource + ?Sized> TabularSource for &T {
    fn sector_name(&self) -> &str {
        (**self).sector_name()
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn read_table(&self, preferred_sheet: Option<&str>) -> Result<Table> {
        (**self).read_table(preferred_sheet)
    }
}

impl<T: TabularSource + ?Sized> TabularSource for Box<T> {
    fn sector_name(&self) -> &str {
        (**self).sector_name()
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn read_table(&self, preferred_sheet: Option<&str>) -> Result<Table> {
        (**self).read_table(preferred_sheet)
    }
}

/// A sector stored on disk as a CSV file or a directory of CSV sheets.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvSource {
    name: String,
    path: PathBuf,
}

impl CsvSource {
    /// Source named after the file stem; `None` if the path has no usable name.
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = sector_name_from_path(&path)?;
        Some(CsvSource { name, path })
    }

    pub fn with_name(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        CsvSource {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_sheet(path: &Path) -> Result<Table> {
        let file = File::open(path)?;
        Table::from_reader(io::BufReader::new(file))
    }
}

impl TabularSource for CsvSource {
    fn sector_name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn read_table(&self, preferred_sheet: Option<&str>) -> Result<Table> {
        if !self.path.is_dir() {
            return CsvSource::read_sheet(&self.path);
        }
        let sheets = csv_entries(&self.path, false)?;
        let preferred = preferred_sheet.and_then(|wanted| {
            sheets.iter().find(|sheet| {
                sector_name_from_path(sheet).is_some_and(|stem| stem.eq_ignore_ascii_case(wanted))
            })
        });
        let chosen = match (preferred, sheets.first()) {
            (Some(sheet), _) => sheet,
            (None, Some(first)) => {
                if let Some(wanted) = preferred_sheet {
                    warn!(
                        "Sheet '{}' not found in {}, falling back to {}",
                        wanted,
                        self.path.display(),
                        first.display()
                    );
                }
                first
            }
            (None, None) => {
                return Err(DemandError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no CSV sheets in {}", self.path.display()),
                )))
            }
        };
        let sheet_name = sector_name_from_path(chosen).unwrap_or_default();
        debug!("Reading sheet {} for sector {}", chosen.display(), self.name);
        Ok(CsvSource::read_sheet(chosen)?.with_sheet(sheet_name))
    }
}

/// A table already held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySource {
    name: String,
    table: Table,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        MemorySource {
            name: name.into(),
            table,
        }
    }

    pub fn from_csv_str(name: impl Into<String>, csv_data: &str) -> Result<Self> {
        Ok(MemorySource::new(name, Table::from_csv_str(csv_data)?))
    }
}

impl TabularSource for MemorySource {
    fn sector_name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn read_table(&self, _preferred_sheet: Option<&str>) -> Result<Table> {
        Ok(self.table.clone())
    }
}

/// List the sector sources of a scenario directory in name order.
///
/// Sector files are `*.csv`; sub-directories are multi-sheet sectors.
/// Hidden entries and other files are ignored.
pub fn discover_sources(scenario_dir: &Path) -> Result<Vec<CsvSource>> {
    if !scenario_dir.is_dir() {
        return Err(DemandError::ScenarioNotFound(
            scenario_dir.display().to_string(),
        ));
    }
    let sources = csv_entries(scenario_dir, true)?
        .into_iter()
        .filter_map(CsvSource::new)
        .collect();
    Ok(sources)
}

fn csv_entries(dir: &Path, include_dirs: bool) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(true, |name| name.starts_with('.'));
        if hidden {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if (include_dirs && path.is_dir()) || (is_csv && path.is_file()) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_table_pads_short_rows() {
        let table = Table::from_csv_str("\u{feff}Year,MLR,WAM\n2025,10\n2026,12,5,extra\n").unwrap();
        assert_eq!(table.headers, vec!["Year", "MLR", "WAM"]);
        assert_eq!(table.rows[0], vec!["2025", "10", ""]);
        assert_eq!(table.rows[1], vec!["2026", "12", "5"]);
    }

    #[test]
    fn test_csv_source_single_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Residential.csv");
        fs::write(&path, "Year,MLR\n2025,10\n").unwrap();
        let source = CsvSource::new(&path).unwrap();
        assert_eq!(source.sector_name(), "Residential");
        let table = source.read_table(Some(PREFERRED_SHEET)).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!(table.sheet.is_none());
    }

    #[test]
    fn test_csv_source_prefers_sheet_then_falls_back() {
        let dir = tempdir().unwrap();
        let sector_dir = dir.path().join("Industrial");
        fs::create_dir(&sector_dir).unwrap();
        fs::write(sector_dir.join("Inputs.csv"), "Year,GDP\n2025,1\n").unwrap();
        fs::write(sector_dir.join("results.csv"), "Year,WAM\n2025,5\n2026,5\n").unwrap();
        let source = CsvSource::new(&sector_dir).unwrap();

        let preferred = source.read_table(Some(PREFERRED_SHEET)).unwrap();
        assert_eq!(preferred.sheet.as_deref(), Some("results"));
        assert_eq!(preferred.headers, vec!["Year", "WAM"]);

        let fallback = source.read_table(Some("Forecast")).unwrap();
        assert_eq!(fallback.sheet.as_deref(), Some("Inputs"));
    }

    #[test]
    fn test_discover_sources() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Residential.csv"), "Year,MLR\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        fs::write(dir.path().join(".hidden.csv"), "Year,MLR\n").unwrap();
        fs::create_dir(dir.path().join("Agriculture")).unwrap();
        let names: Vec<String> = discover_sources(dir.path())
            .unwrap()
            .iter()
            .map(|source| source.sector_name().to_string())
            .collect();
        assert_eq!(names, vec!["Agriculture", "Residential"]);
    }

    #[test]
    fn test_discover_missing_scenario() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover_sources(&missing),
            Err(DemandError::ScenarioNotFound(_))
        ));
    }
}
