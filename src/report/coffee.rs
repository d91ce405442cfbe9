use chrono::Utc;
use std::collections::BTreeMap;

use crate::config::ReportConfig;
use crate::enrich::EnrichedVenue;
use crate::report::types::{ChainSplit, CoffeeReport, CupPrice, DistrictShare};
use crate::report::utility::{count_keys, mean_by_key, median_by_key, ranked, share};

/// Venues of the configured coffee category.
pub fn coffee_shops<'a>(venues: &'a [EnrichedVenue], config: &ReportConfig) -> Vec<&'a EnrichedVenue> {
    venues
        .iter()
        .filter(|v| v.venue.category == config.coffee_category)
        .collect()
}

/// Builds the coffee shop drill-down.
pub fn coffee_report(venues: &[EnrichedVenue], config: &ReportConfig) -> CoffeeReport {
    let shops = coffee_shops(venues, config);
    let total = shops.len();

    let by_district = ranked(count_keys(shops.iter().map(|v| v.venue.district.as_str())))
        .into_iter()
        .map(|(district, count)| DistrictShare {
            district,
            count,
            share: share(count, total),
        })
        .collect();

    let mut chain_by_district: BTreeMap<String, ChainSplit> = BTreeMap::new();
    for v in &shops {
        let split = chain_by_district
            .entry(v.venue.district.clone())
            .or_default();
        if v.venue.is_chain() {
            split.chain += 1;
        } else {
            split.independent += 1;
        }
    }

    let round_the_clock = shops.iter().filter(|v| v.derived.is_24_7).count();

    let cup_prices = shops
        .iter()
        .filter_map(|v| {
            let price = v
                .derived
                .middle_coffee_cup
                .filter(|&p| p < config.cup_price_outlier_threshold)?;
            Some(CupPrice {
                name: v.venue.name.clone(),
                district: v.venue.district.clone(),
                price,
                rating: v.venue.rating,
            })
        })
        .collect();

    CoffeeReport {
        generated_at: Utc::now(),
        category: config.coffee_category.clone(),
        total,
        by_district,
        chain_by_district,
        round_the_clock,
        round_the_clock_share: share(round_the_clock, total),
        cup_prices,
        median_cup_price_by_district: median_by_key(
            shops
                .iter()
                .filter_map(|v| Some((v.venue.district.as_str(), v.derived.middle_coffee_cup?))),
        ),
        mean_rating_by_district: mean_by_key(
            shops
                .iter()
                .filter_map(|v| Some((v.venue.district.as_str(), v.venue.rating?))),
        ),
        target_district: config.target_district.clone(),
        single_shop_streets: single_shop_streets(&shops, &config.target_district),
    }
}

/// Streets of `district` that have exactly one coffee shop.
fn single_shop_streets(shops: &[&EnrichedVenue], district: &str) -> Vec<String> {
    count_keys(
        shops
            .iter()
            .filter(|v| v.venue.district == district)
            .filter_map(|v| v.street()),
    )
    .into_iter()
    .filter(|(_, count)| *count == 1)
    .map(|(street, _)| street)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DerivedFields;
    use crate::venue::Venue;

    const SOUTH_WEST: &str = "Юго-Западный административный округ";
    const CENTER: &str = "Центральный административный округ";

    #[test]
    fn test_coffee_report_counts() {
        let mut venues = vec![
            shop("A", CENTER, " Арбат", Some(200.0)),
            shop("B", CENTER, " Арбат", Some(150.0)),
            shop("C", SOUTH_WEST, " Профсоюзная", Some(180.0)),
            shop("D", SOUTH_WEST, " Вавилова", Some(1500.0)),
            shop("E", SOUTH_WEST, " Вавилова", None),
        ];
        venues[0].venue.chain = 1;
        venues[0].derived.is_24_7 = true;
        venues[2].venue.rating = Some(4.4);
        venues[3].venue.rating = Some(4.2);
        let mut bar = shop("F", SOUTH_WEST, " Обручева", Some(300.0));
        bar.venue.category = "бар,паб".to_string();
        venues.push(bar);

        let report = coffee_report(&venues, &ReportConfig::default());

        assert_eq!(report.total, 5);
        assert_eq!(report.by_district[0].district, SOUTH_WEST);
        assert_eq!(report.by_district[0].count, 3);
        assert_eq!(report.by_district[0].share, 0.6);
        assert_eq!(
            report.chain_by_district[CENTER],
            ChainSplit {
                chain: 1,
                independent: 1
            }
        );
        assert_eq!(report.round_the_clock, 1);
        assert_eq!(report.round_the_clock_share, 0.2);
        assert_eq!(report.cup_prices.len(), 3);
        assert_eq!(report.median_cup_price_by_district[CENTER], 175.0);
        assert_eq!(report.median_cup_price_by_district[SOUTH_WEST], 840.0);
        assert!((report.mean_rating_by_district[SOUTH_WEST] - 4.3).abs() < 1e-9);
        assert_eq!(report.single_shop_streets, vec![" Профсоюзная".to_string()]);
    }

    #[test]
    fn test_coffee_report_empty() {
        let report = coffee_report(&[], &ReportConfig::default());

        assert_eq!(report.total, 0);
        assert_eq!(report.round_the_clock_share, 0.0);
        assert!(report.by_district.is_empty());
        assert!(report.single_shop_streets.is_empty());
    }

    fn shop(name: &str, district: &str, street: &str, cup: Option<f64>) -> EnrichedVenue {
        EnrichedVenue {
            line: 0,
            venue: Venue {
                name: name.to_string(),
                category: "кофейня".to_string(),
                district: district.to_string(),
                ..Default::default()
            },
            derived: DerivedFields {
                street: Some(street.to_string()),
                middle_coffee_cup: cup,
                ..Default::default()
            },
        }
    }
}
