use std::sync::Once;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::DailyRecord;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Span enter/exit noise from the csv reader is not interesting in tests
    let noisy_modules = ["csv"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    // RUST_LOG wins, otherwise everything from this crate
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("covtree=trace"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// A daily record with a three-letter iso code derived from the country.
pub fn record(
    continent: &str,
    country: &str,
    date: &str,
    total_cases: u64,
    total_deaths: u64,
    total_vaccinations: u64,
    population: u64,
) -> DailyRecord {
    DailyRecord {
        iso_code: country.chars().take(3).collect::<String>().to_uppercase(),
        continent: continent.to_string(),
        country: country.to_string(),
        date: date.to_string(),
        total_cases,
        total_deaths,
        total_vaccinations,
        population,
    }
}

/// Five countries on three continents, January to March 2021, grouped by country.
///
/// Testland reports vaccinations sparsely: 0, 500, 0.
pub fn sample_records() -> Vec<DailyRecord> {
    vec![
        record("Asia", "India", "2021-01-31", 10_000, 150, 0, 1_400_000),
        record("Asia", "India", "2021-02-28", 11_000, 160, 2_000, 1_400_000),
        record("Asia", "India", "2021-03-31", 12_500, 170, 9_000, 1_400_000),
        record("Asia", "Japan", "2021-01-31", 3_000, 40, 0, 125_000),
        record("Asia", "Japan", "2021-02-28", 3_500, 45, 100, 125_000),
        record("Asia", "Japan", "2021-03-31", 4_000, 50, 800, 125_000),
        record("Europe", "France", "2021-01-31", 5_000, 120, 300, 68_000),
        record("Europe", "France", "2021-02-28", 5_600, 130, 0, 68_000),
        record("Europe", "France", "2021-03-31", 6_100, 140, 1_500, 68_000),
        record("Europe", "Germany", "2021-02-28", 4_000, 90, 700, 83_000),
        record("Europe", "Germany", "2021-03-31", 4_400, 95, 1_900, 83_000),
        record("Africa", "Testland", "2021-01-15", 100, 1, 0, 1_000),
        record("Africa", "Testland", "2021-02-15", 150, 2, 500, 1_000),
        record("Africa", "Testland", "2021-03-15", 180, 2, 0, 1_000),
    ]
}
