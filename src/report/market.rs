use chrono::Utc;
use std::collections::{BTreeMap, HashSet};

use crate::config::ReportConfig;
use crate::enrich::EnrichedVenue;
use crate::report::types::{
    CategoryChainShare, CategoryShare, ChainEntry, ChainSplit, ChainSummary, MarketOverview,
    SeatsSummary, SingleVenueStreets, StreetEntry,
};
use crate::report::utility::{
    count_keys, mean_by_key, median_by_key, pivot, ranked, round2, share,
};

/// Builds the market overview over all enriched venues.
pub fn market_overview(venues: &[EnrichedVenue], config: &ReportConfig) -> MarketOverview {
    MarketOverview {
        generated_at: Utc::now(),
        total_venues: venues.len(),
        categories: category_shares(venues),
        seats: seats_summary(venues, config.seats_outlier_threshold),
        chains: chain_summary(venues, config.top_chains),
        district_category: pivot(
            venues
                .iter()
                .map(|v| (v.venue.district.as_str(), v.venue.category.as_str())),
        ),
        mean_rating_by_category: mean_by_key(
            venues
                .iter()
                .filter_map(|v| Some((v.venue.category.as_str(), v.venue.rating?))),
        ),
        mean_rating_by_district: mean_by_key(
            venues
                .iter()
                .filter_map(|v| Some((v.venue.district.as_str(), v.venue.rating?))),
        ),
        top_streets: top_streets(venues, config.top_streets),
        single_venue_streets: single_venue_streets(venues),
        mean_avg_bill_by_district: mean_by_key(
            venues
                .iter()
                .filter_map(|v| Some((v.venue.district.as_str(), v.derived.middle_avg_bill?))),
        ),
    }
}

pub fn category_shares(venues: &[EnrichedVenue]) -> Vec<CategoryShare> {
    let counts = count_keys(venues.iter().map(|v| v.venue.category.as_str()));
    ranked(counts)
        .into_iter()
        .map(|(category, count)| CategoryShare {
            category,
            count,
            share: share(count, venues.len()),
        })
        .collect()
}

/// Missing seats are counted per category. Medians only use venues below the
/// outlier threshold.
pub fn seats_summary(venues: &[EnrichedVenue], outlier_threshold: u32) -> SeatsSummary {
    SeatsSummary {
        outlier_threshold,
        missing_by_category: count_keys(
            venues
                .iter()
                .filter(|v| v.venue.seats.is_none())
                .map(|v| v.venue.category.as_str()),
        ),
        median_by_category: median_by_key(venues.iter().filter_map(|v| {
            let seats = v.venue.seats.filter(|&s| s < outlier_threshold)?;
            Some((v.venue.category.as_str(), f64::from(seats)))
        })),
    }
}

pub fn chain_summary(venues: &[EnrichedVenue], top_n: usize) -> ChainSummary {
    let chain_total = venues.iter().filter(|v| v.venue.is_chain()).count();

    let totals = count_keys(venues.iter().map(|v| v.venue.category.as_str()));
    let chains = count_keys(
        venues
            .iter()
            .filter(|v| v.venue.is_chain())
            .map(|v| v.venue.category.as_str()),
    );
    let by_category = totals
        .into_iter()
        .map(|(category, total)| {
            let chain_count = chains.get(&category).copied().unwrap_or(0);
            CategoryChainShare {
                category,
                chain_count,
                total,
                chain_pct: round2(share(chain_count, total) * 100.0),
            }
        })
        .collect();

    let top_chains: Vec<ChainEntry> = ranked(count_keys(
        venues
            .iter()
            .filter(|v| v.venue.is_chain())
            .map(|v| v.venue.name.as_str()),
    ))
    .into_iter()
    .take(top_n)
    .map(|(name, count)| ChainEntry { name, count })
    .collect();

    // Every venue carrying a top chain's name, whatever its own chain flag says.
    let top_names: HashSet<&str> = top_chains.iter().map(|c| c.name.as_str()).collect();
    let top_venues: Vec<&EnrichedVenue> = venues
        .iter()
        .filter(|v| top_names.contains(v.venue.name.as_str()))
        .collect();

    ChainSummary {
        chain_share: share(chain_total, venues.len()),
        by_category,
        top_chain_categories: count_keys(top_venues.iter().map(|v| v.venue.category.as_str())),
        top_chain_district_category: pivot(
            top_venues
                .iter()
                .map(|v| (v.venue.district.as_str(), v.venue.category.as_str())),
        ),
        top_chains,
    }
}

/// Streets with the most venues, each with its category breakdown.
pub fn top_streets(venues: &[EnrichedVenue], top_n: usize) -> Vec<StreetEntry> {
    let counts = count_keys(venues.iter().filter_map(EnrichedVenue::street));
    let mut by_street = pivot(
        venues
            .iter()
            .filter_map(|v| Some((v.street()?, v.venue.category.as_str()))),
    );

    ranked(counts)
        .into_iter()
        .take(top_n)
        .map(|(street, total)| StreetEntry {
            by_category: by_street.remove(&street).unwrap_or_default(),
            street,
            total,
        })
        .collect()
}

pub fn single_venue_streets(venues: &[EnrichedVenue]) -> SingleVenueStreets {
    let counts = count_keys(venues.iter().filter_map(EnrichedVenue::street));
    let distinct_streets = counts.len();

    let lonely: Vec<&EnrichedVenue> = venues
        .iter()
        .filter(|v| v.street().is_some_and(|s| counts.get(s) == Some(&1)))
        .collect();

    let mut by_category_chain: BTreeMap<String, ChainSplit> = BTreeMap::new();
    for v in &lonely {
        let split = by_category_chain
            .entry(v.venue.category.clone())
            .or_default();
        if v.venue.is_chain() {
            split.chain += 1;
        } else {
            split.independent += 1;
        }
    }

    SingleVenueStreets {
        count: lonely.len(),
        distinct_streets,
        by_category_chain,
        by_district_category: pivot(
            lonely
                .iter()
                .map(|v| (v.venue.district.as_str(), v.venue.category.as_str())),
        ),
    }
}
