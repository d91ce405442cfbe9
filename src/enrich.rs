//! Enrichment pass: runs the Field Extractor over a whole table and keeps a
//! report of every derivation that failed.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, RowError};
use crate::extract::{DerivedFields, ExtractError, PriceField, extract};
use crate::venue::Venue;

pub const DEFAULT_MAX_FAILURE_SAMPLES: usize = 20;

/// A venue with its derived columns attached.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedVenue {
    pub line: u64,
    pub venue: Venue,
    pub derived: DerivedFields,
}

impl EnrichedVenue {
    pub fn street(&self) -> Option<&str> {
        self.derived.street.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MalformedRow,
    UnparsableAddress,
    UnparsableAvgBill,
    UnparsableCoffeeCup,
}

impl From<&ExtractError> for FailureKind {
    fn from(error: &ExtractError) -> Self {
        match error {
            ExtractError::UnparsableAddress(_) => FailureKind::UnparsableAddress,
            ExtractError::UnparsablePrice {
                field: PriceField::AvgBill,
                ..
            } => FailureKind::UnparsableAvgBill,
            ExtractError::UnparsablePrice {
                field: PriceField::CoffeeCup,
                ..
            } => FailureKind::UnparsableCoffeeCup,
        }
    }
}

/// One example failure kept for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureSample {
    pub line: u64,
    pub kind: FailureKind,
    pub message: String,
}

/// Counts of everything the pass could not derive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FailureReport {
    /// Records that were enriched (malformed rows excluded).
    pub records: usize,
    pub malformed_rows: usize,
    pub unparsable_address: usize,
    pub unparsable_avg_bill: usize,
    pub unparsable_coffee_cup: usize,
    /// First failures encountered, capped at the configured sample size.
    pub samples: Vec<FailureSample>,
    #[serde(skip)]
    max_samples: usize,
}

impl FailureReport {
    pub fn new(max_samples: usize) -> Self {
        Self {
            max_samples,
            ..Default::default()
        }
    }

    pub fn total_failures(&self) -> usize {
        self.malformed_rows
            + self.unparsable_address
            + self.unparsable_avg_bill
            + self.unparsable_coffee_cup
    }

    fn record(&mut self, line: u64, kind: FailureKind, message: String) {
        match kind {
            FailureKind::MalformedRow => self.malformed_rows += 1,
            FailureKind::UnparsableAddress => self.unparsable_address += 1,
            FailureKind::UnparsableAvgBill => self.unparsable_avg_bill += 1,
            FailureKind::UnparsableCoffeeCup => self.unparsable_coffee_cup += 1,
        }
        if self.samples.len() < self.max_samples {
            self.samples.push(FailureSample {
                line,
                kind,
                message,
            });
        }
    }

    fn record_row_error(&mut self, error: &RowError) {
        self.record(error.line, FailureKind::MalformedRow, error.message.clone());
    }

    fn record_extract_error(&mut self, line: u64, error: &ExtractError) {
        self.record(line, error.into(), error.to_string());
    }
}

/// Output of [`enrich`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub venues: Vec<EnrichedVenue>,
    pub report: FailureReport,
}

/// Enriches every row of `dataset`.
///
/// Per-record failures never stop the pass; they leave the affected field
/// absent and are counted in [`Enrichment::report`]. Rows the loader already
/// rejected are counted as malformed.
pub fn enrich(dataset: Dataset, max_samples: usize) -> Enrichment {
    let mut report = FailureReport::new(max_samples);

    for error in &dataset.row_errors {
        report.record_row_error(error);
    }

    let venues: Vec<EnrichedVenue> = dataset
        .rows
        .into_iter()
        .map(|row| {
            let extraction = extract(&row.venue);
            for failure in &extraction.failures {
                debug!(line = row.line, error = %failure, "Field derivation failed");
                report.record_extract_error(row.line, failure);
            }
            EnrichedVenue {
                line: row.line,
                venue: row.venue,
                derived: extraction.derived,
            }
        })
        .collect();

    report.records = venues.len();

    if report.total_failures() > 0 {
        warn!(
            records = report.records,
            malformed_rows = report.malformed_rows,
            unparsable_address = report.unparsable_address,
            unparsable_avg_bill = report.unparsable_avg_bill,
            unparsable_coffee_cup = report.unparsable_coffee_cup,
            "Enrichment finished with failures"
        );
    } else {
        info!(records = report.records, "Enrichment finished");
    }

    Enrichment { venues, report }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_malformed_address_among_many() {
        let mut venues: Vec<Venue> = (1..=5)
            .map(|i| venue(&format!("Москва, улица {i}, {i}"), None))
            .collect();
        venues.insert(2, venue("без запятых", None));

        let enrichment = enrich(Dataset::from_venues(venues), DEFAULT_MAX_FAILURE_SAMPLES);

        let streets: Vec<_> = enrichment.venues.iter().map(|v| v.street()).collect();
        assert_eq!(streets.iter().filter(|s| s.is_some()).count(), 5);
        assert_eq!(streets[2], None);
        assert_eq!(streets[3], Some(" улица 3"));
        assert_eq!(enrichment.report.unparsable_address, 1);
        assert_eq!(enrichment.report.total_failures(), 1);
        assert_eq!(enrichment.report.samples[0].line, 4);
        assert_eq!(enrichment.report.samples[0].kind, FailureKind::UnparsableAddress);
    }

    #[test]
    fn test_price_failures_are_counted_per_field() {
        let venues = vec![
            venue("Москва, a, 1", Some("Средний счёт: много")),
            venue("Москва, b, 2", Some("Цена одной чашки капучино: ?")),
            venue("Москва, c, 3", Some("Средний счёт: 500–700 ₽")),
        ];

        let enrichment = enrich(Dataset::from_venues(venues), DEFAULT_MAX_FAILURE_SAMPLES);

        assert_eq!(enrichment.report.records, 3);
        assert_eq!(enrichment.report.unparsable_avg_bill, 1);
        assert_eq!(enrichment.report.unparsable_coffee_cup, 1);
        assert_eq!(enrichment.venues[2].derived.middle_avg_bill, Some(600.0));
    }

    #[test]
    fn test_row_errors_become_malformed_rows() {
        let mut dataset = Dataset::from_venues(vec![venue("Москва, a, 1", None)]);
        dataset.row_errors.push(RowError {
            line: 7,
            message: "bad row".to_string(),
        });

        let enrichment = enrich(dataset, DEFAULT_MAX_FAILURE_SAMPLES);

        assert_eq!(enrichment.report.records, 1);
        assert_eq!(enrichment.report.malformed_rows, 1);
        assert_eq!(enrichment.report.samples[0].line, 7);
    }

    #[test]
    fn test_samples_are_capped() {
        let venues = (0..10).map(|_| venue("нет", None)).collect();

        let enrichment = enrich(Dataset::from_venues(venues), 3);

        assert_eq!(enrichment.report.unparsable_address, 10);
        assert_eq!(enrichment.report.samples.len(), 3);
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let venues = vec![
            venue("Москва, улица Арбат, 1", Some("Средний счёт: 1000–1500 ₽")),
            venue("Москва, Тверская, 2", Some("Цена одной чашки капучино: 130–220 ₽")),
        ];

        let first = enrich(Dataset::from_venues(venues), DEFAULT_MAX_FAILURE_SAMPLES);
        let bases: Vec<Venue> = first.venues.iter().map(|v| v.venue.clone()).collect();
        let second = enrich(Dataset::from_venues(bases), DEFAULT_MAX_FAILURE_SAMPLES);

        assert_eq!(first, second);
    }

    fn venue(address: &str, avg_bill: Option<&str>) -> Venue {
        Venue {
            name: "Кафе".to_string(),
            address: address.to_string(),
            category: "кафе".to_string(),
            avg_bill: avg_bill.map(str::to_string),
            district: "Центральный административный округ".to_string(),
            ..Default::default()
        }
    }
}
