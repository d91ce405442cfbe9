//! CLI entry point for the Moscow venues research tool.
//!
//! Provides subcommands for enriching the venues table, building the market
//! overview and coffee shop reports, joining district metrics to the
//! boundary GeoJSON for choropleth maps, and exporting venue markers.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use moscow_venues::{
    config::{CONFIG_ENV, ReportConfig},
    dataset::load_venues,
    enrich::{Enrichment, enrich},
    geo::{DistrictBoundaries, venue_points},
    output::{emit_json, write_enriched, write_json},
    report::{DistrictMetric, coffee::coffee_shops, coffee_report, market_overview},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "moscow_venues")]
#[command(about = "Market research over Moscow food-service venues", long_about = None)]
struct Cli {
    /// JSON file with report parameters (falls back to $MOSCOW_VENUES_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive street, 24/7 flag and price estimates for every venue
    Enrich {
        /// Venues CSV
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// Enriched CSV to write
        #[arg(short, long, default_value = "venues_enriched.csv")]
        output: PathBuf,

        /// Gzip compress the enriched CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Optional: JSON file for the failure report
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Market overview by category, chain, district and street
    Report {
        /// Venues CSV
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// JSON file to write (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Coffee shop drill-down
    Coffee {
        /// Venues CSV
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// JSON file to write (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Per-district metric joined to district boundaries
    Choropleth {
        /// Venues CSV
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// District boundaries GeoJSON
        #[arg(long)]
        geojson: PathBuf,

        #[arg(short, long, value_enum)]
        metric: MetricArg,

        /// Only use venues of the coffee category
        #[arg(long, default_value_t = false)]
        coffee_only: bool,

        /// JSON file to write (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Venue markers with name, category, address and rating
    Points {
        /// Venues CSV
        #[arg(value_name = "CSV")]
        input: PathBuf,

        /// Only use venues of the coffee category
        #[arg(long, default_value_t = false)]
        coffee_only: bool,

        /// JSON file to write (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    VenueCount,
    MeanRating,
    MeanAvgBill,
    MedianCoffeeCup,
}

impl From<MetricArg> for DistrictMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::VenueCount => DistrictMetric::VenueCount,
            MetricArg::MeanRating => DistrictMetric::MeanRating,
            MetricArg::MeanAvgBill => DistrictMetric::MeanAvgBill,
            MetricArg::MedianCoffeeCup => DistrictMetric::MedianCoffeeCup,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/moscow_venues.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("moscow_venues.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info")?);

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug")?);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config_path = ReportConfig::resolve_path(cli.config, std::env::var_os(CONFIG_ENV));
    let config = ReportConfig::load_or_default(config_path.as_deref())?;

    match cli.command {
        Commands::Enrich {
            input,
            output,
            gzip,
            report,
        } => {
            let enrichment = load_enriched(&input, &config)?;
            write_enriched(&output, &enrichment.venues, gzip)?;
            if let Some(report_path) = report {
                write_json(&report_path, &enrichment.report)?;
            }
        }
        Commands::Report { input, output } => {
            let enrichment = load_enriched(&input, &config)?;
            let overview = market_overview(&enrichment.venues, &config);
            info!(
                venues = overview.total_venues,
                categories = overview.categories.len(),
                "Market overview built"
            );
            emit_json(output.as_deref(), &overview)?;
        }
        Commands::Coffee { input, output } => {
            let enrichment = load_enriched(&input, &config)?;
            let report = coffee_report(&enrichment.venues, &config);
            info!(
                coffee_shops = report.total,
                round_the_clock = report.round_the_clock,
                target_district = %report.target_district,
                single_shop_streets = report.single_shop_streets.len(),
                "Coffee report built"
            );
            emit_json(output.as_deref(), &report)?;
        }
        Commands::Choropleth {
            input,
            geojson,
            metric,
            coffee_only,
            output,
        } => {
            let boundaries = DistrictBoundaries::load(&geojson)?;
            let enrichment = load_enriched(&input, &config)?;
            let metric = DistrictMetric::from(metric);

            let values = if coffee_only {
                metric.compute(coffee_shops(&enrichment.venues, &config))
            } else {
                metric.compute(&enrichment.venues)
            };

            let layer = boundaries.choropleth(metric.name(), &values);
            info!(
                metric = %metric,
                districts = layer.values.len(),
                missing_data = layer.missing_data.len(),
                unknown_districts = layer.unknown_districts.len(),
                "Choropleth layer built"
            );
            emit_json(output.as_deref(), &layer)?;
        }
        Commands::Points {
            input,
            coffee_only,
            output,
        } => {
            let enrichment = load_enriched(&input, &config)?;
            let layer = if coffee_only {
                venue_points(coffee_shops(&enrichment.venues, &config))
            } else {
                venue_points(&enrichment.venues)
            };
            info!(points = layer.count, coffee_only, "Point layer built");
            emit_json(output.as_deref(), &layer)?;
        }
    }

    Ok(())
}

fn env_filter(var: &str, default_directive: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::from_env(var).add_directive(default_directive.parse()?))
}

/// Loads the venues CSV and runs the enrichment pass over it.
#[tracing::instrument(skip(input, config), fields(input = %input.display()))]
fn load_enriched(input: &Path, config: &ReportConfig) -> Result<Enrichment> {
    let dataset = load_venues(input)?;
    let enrichment = enrich(dataset, config.max_failure_samples);

    if enrichment.venues.is_empty() {
        warn!("No readable venues in input");
    }
    Ok(enrichment)
}
