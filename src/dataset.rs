//! Venue CSV loading with row-level error collection.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::venue::Venue;

/// Columns without which no row could be deserialized.
const REQUIRED_COLUMNS: &[&str] = &[
    "name", "address", "category", "lat", "lng", "chain", "district",
];

/// One venue together with the CSV line it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub line: u64,
    pub venue: Venue,
}

/// A row that could not be read as a [`Venue`].
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: u64,
    pub message: String,
}

/// Loaded table: readable rows plus the rows that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub rows: Vec<Row>,
    pub row_errors: Vec<RowError>,
}

impl Dataset {
    /// Wraps an in-memory table. Line numbers count from 2, after the header.
    pub fn from_venues(venues: Vec<Venue>) -> Self {
        let rows = venues
            .into_iter()
            .zip(2u64..)
            .map(|(venue, line)| Row { line, venue })
            .collect();
        Self {
            rows,
            row_errors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Loads the venues CSV at `path`.
///
/// # Errors
///
/// Fails only for whole-file problems: the file cannot be opened, the header
/// is unreadable, or a required column is missing. Bad rows are collected in
/// [`Dataset::row_errors`].
pub fn load_venues(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open venues CSV '{}'", path.display()))?;
    let dataset = read_venues(file)?;

    info!(
        path = %path.display(),
        rows = dataset.rows.len(),
        skipped = dataset.row_errors.len(),
        "Venues loaded"
    );
    Ok(dataset)
}

/// Reads venues from any CSV source with a header row.
pub fn read_venues<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().context("failed to read CSV header")?.clone();
    ensure_required_columns(&headers)?;

    let mut dataset = Dataset::default();

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => {
                return Err(e).context("failed to read venues CSV");
            }
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                warn!(line, error = %e, "Skipping unreadable CSV row");
                dataset.row_errors.push(RowError {
                    line,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let line = record.position().map_or(0, |p| p.line());
        match record.deserialize::<Venue>(Some(&headers)) {
            Ok(venue) => dataset.rows.push(Row { line, venue }),
            Err(e) => {
                debug!(line, error = %e, "Skipping malformed venue row");
                dataset.row_errors.push(RowError {
                    line,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(dataset)
}

fn ensure_required_columns(headers: &StringRecord) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();

    if !missing.is_empty() {
        bail!("venues CSV is missing required columns: {}", missing.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "name,address,category,hours,lat,lng,rating,price,avg_bill,middle_avg_bill,middle_coffee_cup,chain,district,seats";

    #[test]
    fn test_read_venues_keeps_line_numbers() {
        let data = format!(
            "{HEADER}\n\
             A,\"Москва, улица 1, 1\",кафе,,55.7,37.6,4.1,,,,,0,ЦАО,\n\
             B,\"Москва, улица 2, 2\",бар,паб,,55.7,37.6,4.2,,,,,0,ЦАО,\n\
             C,\"Москва, улица 3, 3\",кафе,,55.7,37.6,4.3,,,,,1,ЦАО,10\n"
        );

        let dataset = read_venues(data.as_bytes()).unwrap();

        // Row B has an unquoted comma in its category, so it has too many fields.
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0].line, 2);
        assert_eq!(dataset.rows[1].line, 4);
        assert_eq!(dataset.row_errors.len(), 1);
        assert_eq!(dataset.row_errors[0].line, 3);
    }

    #[test]
    fn test_read_venues_skips_non_numeric_coordinates() {
        let data = format!(
            "{HEADER}\n\
             A,\"Москва, улица 1, 1\",кафе,,north,37.6,4.1,,,,,0,ЦАО,\n\
             C,\"Москва, улица 3, 3\",кафе,,55.7,37.6,4.3,,,,,1,ЦАО,10\n"
        );

        let dataset = read_venues(data.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows[0].venue.name, "C");
        assert_eq!(dataset.row_errors[0].line, 2);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let data = "name,address,category\nA,\"x, y\",кафе\n";
        let err = read_venues(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("lat"));
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let path = std::env::temp_dir().join("moscow_venues_does_not_exist.csv");
        assert!(load_venues(&path).is_err());
    }

    #[test]
    fn test_from_venues_numbers_rows_after_header() {
        let dataset = Dataset::from_venues(vec![Venue::default(), Venue::default()]);
        assert_eq!(dataset.rows[0].line, 2);
        assert_eq!(dataset.rows[1].line, 3);
    }
}
