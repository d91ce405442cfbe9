use std::collections::BTreeMap;
use std::fmt;

use crate::enrich::EnrichedVenue;
use crate::report::utility::{count_keys, mean_by_key, median_by_key};

/// Per-district value that can be drawn on a choropleth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistrictMetric {
    VenueCount,
    MeanRating,
    MeanAvgBill,
    MedianCoffeeCup,
}

impl DistrictMetric {
    pub fn name(self) -> &'static str {
        match self {
            DistrictMetric::VenueCount => "venue_count",
            DistrictMetric::MeanRating => "mean_rating",
            DistrictMetric::MeanAvgBill => "mean_avg_bill",
            DistrictMetric::MedianCoffeeCup => "median_coffee_cup",
        }
    }

    /// Computes the metric for every district that has data.
    pub fn compute<'a>(
        self,
        venues: impl IntoIterator<Item = &'a EnrichedVenue>,
    ) -> BTreeMap<String, f64> {
        let venues = venues.into_iter();
        match self {
            DistrictMetric::VenueCount => count_keys(venues.map(|v| v.venue.district.as_str()))
                .into_iter()
                .map(|(district, count)| (district, count as f64))
                .collect(),
            DistrictMetric::MeanRating => mean_by_key(
                venues.filter_map(|v| Some((v.venue.district.as_str(), v.venue.rating?))),
            ),
            DistrictMetric::MeanAvgBill => mean_by_key(
                venues.filter_map(|v| Some((v.venue.district.as_str(), v.derived.middle_avg_bill?))),
            ),
            DistrictMetric::MedianCoffeeCup => median_by_key(venues.filter_map(|v| {
                Some((v.venue.district.as_str(), v.derived.middle_coffee_cup?))
            })),
        }
    }
}

impl fmt::Display for DistrictMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
