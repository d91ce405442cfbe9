//! Data types produced by the aggregation reports.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Row key → column key → count.
pub type Pivot = BTreeMap<String, BTreeMap<String, usize>>;

/// Venue count and share of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    pub share: f64,
}

/// Venue count and share of one district.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictShare {
    pub district: String,
    pub count: usize,
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChainSplit {
    pub chain: usize,
    pub independent: usize,
}

/// Seat statistics per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatsSummary {
    pub outlier_threshold: u32,
    pub missing_by_category: BTreeMap<String, usize>,
    pub median_by_category: BTreeMap<String, f64>,
}

/// Chain share of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChainShare {
    pub category: String,
    pub chain_count: usize,
    pub total: usize,
    /// Percentage, rounded to two decimals.
    pub chain_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainEntry {
    pub name: String,
    pub count: usize,
}

/// Chain vs independent venues and the most widespread chains.
///
/// The `chain` flag is unreliable for small chains; shares here inherit that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSummary {
    pub chain_share: f64,
    pub by_category: Vec<CategoryChainShare>,
    pub top_chains: Vec<ChainEntry>,
    /// Categories of all venues named like one of `top_chains`.
    pub top_chain_categories: BTreeMap<String, usize>,
    /// District × category for the same venues.
    pub top_chain_district_category: Pivot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetEntry {
    pub street: String,
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
}

/// Streets that host exactly one venue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleVenueStreets {
    pub count: usize,
    pub distinct_streets: usize,
    pub by_category_chain: BTreeMap<String, ChainSplit>,
    pub by_district_category: Pivot,
}

/// Overview of the whole market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOverview {
    pub generated_at: DateTime<Utc>,
    pub total_venues: usize,
    pub categories: Vec<CategoryShare>,
    pub seats: SeatsSummary,
    pub chains: ChainSummary,
    pub district_category: Pivot,
    pub mean_rating_by_category: BTreeMap<String, f64>,
    pub mean_rating_by_district: BTreeMap<String, f64>,
    pub top_streets: Vec<StreetEntry>,
    pub single_venue_streets: SingleVenueStreets,
    pub mean_avg_bill_by_district: BTreeMap<String, f64>,
}

/// One coffee shop's cup price, for the price spread listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CupPrice {
    pub name: String,
    pub district: String,
    pub price: f64,
    pub rating: Option<f64>,
}

/// Coffee shop drill-down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoffeeReport {
    pub generated_at: DateTime<Utc>,
    pub category: String,
    pub total: usize,
    pub by_district: Vec<DistrictShare>,
    pub chain_by_district: BTreeMap<String, ChainSplit>,
    pub round_the_clock: usize,
    pub round_the_clock_share: f64,
    pub cup_prices: Vec<CupPrice>,
    pub median_cup_price_by_district: BTreeMap<String, f64>,
    pub mean_rating_by_district: BTreeMap<String, f64>,
    pub target_district: String,
    /// Streets of `target_district` with exactly one coffee shop, sorted.
    pub single_shop_streets: Vec<String>,
}
