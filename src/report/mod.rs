//! Aggregation over enriched venues.
//!
//! Groups venues by category, district, street and chain flag, and builds the
//! market overview and the coffee shop drill-down that back the charts and
//! maps of the research.

pub mod coffee;
pub mod district;
pub mod market;
pub mod types;
pub mod utility;

pub use coffee::coffee_report;
pub use district::DistrictMetric;
pub use market::market_overview;
