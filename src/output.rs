//! Output formatting and persistence.
//!
//! Writes the enriched table as CSV (optionally gzip-compressed) and reports
//! as JSON.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::enrich::EnrichedVenue;

/// Flat CSV row: base columns followed by derived columns.
#[derive(Debug, Serialize)]
struct EnrichedRow<'a> {
    name: &'a str,
    address: &'a str,
    category: &'a str,
    hours: Option<&'a str>,
    lat: f64,
    lng: f64,
    rating: Option<f64>,
    price: Option<&'a str>,
    avg_bill: Option<&'a str>,
    chain: u8,
    district: &'a str,
    seats: Option<u32>,
    street: Option<&'a str>,
    #[serde(rename = "is_24/7")]
    is_24_7: bool,
    middle_avg_bill: Option<f64>,
    middle_coffee_cup: Option<f64>,
}

impl<'a> From<&'a EnrichedVenue> for EnrichedRow<'a> {
    fn from(v: &'a EnrichedVenue) -> Self {
        Self {
            name: &v.venue.name,
            address: &v.venue.address,
            category: &v.venue.category,
            hours: v.venue.hours.as_deref(),
            lat: v.venue.lat,
            lng: v.venue.lng,
            rating: v.venue.rating,
            price: v.venue.price.as_deref(),
            avg_bill: v.venue.avg_bill.as_deref(),
            chain: v.venue.chain,
            district: &v.venue.district,
            seats: v.venue.seats,
            street: v.street(),
            is_24_7: v.derived.is_24_7,
            middle_avg_bill: v.derived.middle_avg_bill,
            middle_coffee_cup: v.derived.middle_coffee_cup,
        }
    }
}

/// Writes the enriched table as CSV with a header row.
pub fn write_enriched_to<W: Write>(writer: W, venues: &[EnrichedVenue]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for venue in venues {
        writer.serialize(EnrichedRow::from(venue))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the enriched table to `path`, gzip-compressed when `gzip` is set.
///
/// With `gzip`, `.gz` is appended to the path unless already present. Returns
/// the path actually written.
pub fn write_enriched(path: &Path, venues: &[EnrichedVenue], gzip: bool) -> Result<PathBuf> {
    let target = if gzip && path.extension().and_then(|e| e.to_str()) != Some("gz") {
        let mut name = path.as_os_str().to_owned();
        name.push(".gz");
        PathBuf::from(name)
    } else {
        path.to_path_buf()
    };
    debug!(path = %target.display(), gzip, rows = venues.len(), "Writing enriched CSV");

    let file = File::create(&target)
        .with_context(|| format!("failed to create '{}'", target.display()))?;

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_enriched_to(&mut encoder, venues)?;
        encoder.finish()?;
    } else {
        write_enriched_to(file, venues)?;
    }

    info!(path = %target.display(), rows = venues.len(), "Enriched CSV written");
    Ok(target)
}

/// Writes `value` as pretty-printed JSON to `path`.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

/// Prints `value` as pretty-printed JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes JSON to `path` if given, otherwise to stdout.
pub fn emit_json(path: Option<&Path>, value: &impl Serialize) -> Result<()> {
    match path {
        Some(path) => write_json(path, value),
        None => print_json(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DerivedFields;
    use crate::venue::Venue;
    use flate2::read::GzDecoder;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn sample() -> Vec<EnrichedVenue> {
        vec![EnrichedVenue {
            line: 2,
            venue: Venue {
                name: "Кофемания".to_string(),
                address: "Москва, улица Арбат, 10".to_string(),
                category: "кофейня".to_string(),
                lat: 55.75,
                lng: 37.59,
                rating: Some(4.5),
                avg_bill: Some("Цена одной чашки капучино:130–220 ₽".to_string()),
                chain: 1,
                district: "Центральный административный округ".to_string(),
                seats: Some(40),
                ..Default::default()
            },
            derived: DerivedFields {
                street: Some(" улица Арбат".to_string()),
                is_24_7: false,
                middle_avg_bill: None,
                middle_coffee_cup: Some(175.0),
            },
        }]
    }

    #[test]
    fn test_write_enriched_to_has_derived_columns() {
        let mut buffer = Vec::new();
        write_enriched_to(&mut buffer, &sample()).unwrap();

        let content = String::from_utf8(buffer).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,address,category,hours,lat,lng,rating,price,avg_bill,chain,district,seats,street,is_24/7,middle_avg_bill,middle_coffee_cup"
        );
        let row = lines.next().unwrap();
        assert!(row.ends_with(",40, улица Арбат,false,,175.0"));
    }

    #[test]
    fn test_write_enriched_gzip_appends_extension() {
        let path = temp_path("moscow_venues_test_enriched.csv");
        let expected = temp_path("moscow_venues_test_enriched.csv.gz");
        let _ = fs::remove_file(&expected);

        let written = write_enriched(&path, &sample(), true).unwrap();
        assert_eq!(written, expected);

        let mut content = String::new();
        GzDecoder::new(File::open(&written).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&written).unwrap();
    }

    #[test]
    fn test_write_json_creates_file() {
        let path = temp_path("moscow_venues_test_report.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &serde_json::json!({"records": 3})).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"records\": 3"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&serde_json::json!({"ok": true})).unwrap();
    }
}
