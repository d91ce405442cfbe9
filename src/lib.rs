pub mod config;
pub mod dataset;
pub mod enrich;
pub mod extract;
pub mod geo;
pub mod output;
pub mod report;
pub mod venue;
