//! End-to-end tests: CSV file → region tree → monthly queries.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::NamedTempFile;

use covtree::application::services::{Dataset, DatasetService};
use covtree::application::ApplicationError;
use covtree::domain::{
    DomainError, Metric, MetricView, MonthKey, RegionNode, RegionQuery, RegionTree,
};
use covtree::infrastructure::traits::CsvRecordSource;
use covtree::util::testing::init_test_setup;

const HEADER: &str =
    "index,iso_code,continent,location,date,total_cases,total_deaths,total_vaccinations,population";

fn sample_csv() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources/covid_sample.csv")
}

fn month(key: &str) -> MonthKey {
    key.parse().unwrap()
}

fn load(path: impl Into<PathBuf>) -> Result<Dataset, ApplicationError> {
    DatasetService::new(Arc::new(CsvRecordSource::new(path))).load()
}

fn csv_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

#[fixture]
fn world() -> RegionTree {
    init_test_setup();
    load(sample_csv()).expect("load sample csv").tree().clone()
}

// ============================================================
// Build
// ============================================================

#[rstest]
fn given_sample_csv_when_build_then_world_continent_country_metrics(world: RegionTree) {
    assert_eq!(world.value(), Some(&RegionNode::World));
    assert_eq!(world.continents(), vec!["Europe", "Africa", "South America"]);
    assert_eq!(world.countries(), vec!["Italy", "Spain", "Kenya", "Brazil"]);
    assert_eq!(world.depth(), 4);

    // Every country has exactly one metrics leaf
    for continent in world.children() {
        for country in continent.children() {
            assert!(matches!(country.value(), Some(RegionNode::Country(_))));
            assert_eq!(country.children().len(), 1);
            assert!(country.children()[0].value().and_then(RegionNode::metrics).is_some());
        }
    }
}

#[rstest]
fn given_several_days_in_month_when_build_then_last_day_wins(world: RegionTree) {
    let cases = world.get_cases(month("January 2021")).unwrap();
    assert_eq!(cases["Italy"], 2_550_000);
}

#[rstest]
#[case::reported_after_gap("Italy", "February 2021", 1_900_000)]
#[case::reported_again("Italy", "March 2021", 9_600_000)]
#[case::trailing_gap("Brazil", "March 2021", 8_000_000)]
#[case::never_reported_before("Kenya", "February 2021", 0)]
fn given_unreported_vaccinations_when_build_then_last_value_carried(
    world: RegionTree,
    #[case] country: &str,
    #[case] key: &str,
    #[case] expected: u64,
) {
    let vaccinations = world.get_vaccinations(month(key)).unwrap();
    assert_eq!(vaccinations[country], expected);
}

#[test]
fn given_interleaved_countries_when_load_then_non_contiguous_error() {
    let file = csv_file(&[
        "0,ITA,Europe,Italy,2021-01-31,1,0,0,100",
        "1,ESP,Europe,Spain,2021-01-31,1,0,0,100",
        "2,ITA,Europe,Italy,2021-02-28,2,0,0,100",
    ]);

    let err = load(file.path()).unwrap_err();

    assert!(
        matches!(
            err,
            ApplicationError::Build {
                line: 4,
                source: DomainError::NonContiguousCountry { .. }
            }
        ),
        "{err:?}"
    );
    assert!(err.is_malformed_input());
}

#[rstest]
#[case::bad_number("1,ITA,Europe,Italy,2021-02-28,many,0,0,100")]
#[case::negative("1,ITA,Europe,Italy,2021-02-28,-5,0,0,100")]
#[case::bad_date("1,ITA,Europe,Italy,28.02.2021,5,0,0,100")]
fn given_malformed_row_when_load_then_error_names_line(#[case] row: &str) {
    let file = csv_file(&["0,ITA,Europe,Italy,2021-01-31,1,0,0,100", row]);

    let err = load(file.path()).unwrap_err();

    assert!(err.is_malformed_input(), "{err:?}");
    assert!(err.to_string().contains("line 3"), "{err}");
}

#[test]
fn given_header_only_when_load_then_world_without_continents() {
    let file = csv_file(&[]);
    let dataset = load(file.path()).unwrap();
    assert!(dataset.tree().children().is_empty());
    assert!(dataset
        .tree()
        .get_cases(month("March 2021"))
        .unwrap()
        .is_empty());
}

// ============================================================
// Queries
// ============================================================

#[rstest]
#[case("January 2021")]
#[case("February 2021")]
#[case("March 2021")]
fn given_world_when_query_then_union_of_continents(world: RegionTree, #[case] key: &str) {
    let m = month(key);
    let all = world.get_deaths(m).unwrap();

    let mut total = 0;
    let mut names = BTreeSet::new();
    for continent in world.continents() {
        let part = world.get_region_tree(continent).unwrap().get_deaths(m).unwrap();
        total += part.len();
        names.extend(part.into_keys());
    }

    // Continents partition the countries
    assert_eq!(total, all.len());
    assert_eq!(names, all.keys().cloned().collect::<BTreeSet<String>>());
}

#[rstest]
#[case::cases(Metric::Cases)]
#[case::deaths(Metric::Deaths)]
#[case::vaccinations(Metric::Vaccinations)]
fn given_metric_when_normalised_then_raw_over_population(world: RegionTree, #[case] metric: Metric) {
    let m = month("March 2021");
    let raw = world.get_view(MetricView::raw(metric), m).unwrap();
    let normalised = world.get_view(MetricView::normalised(metric), m).unwrap();
    let populations = [
        ("Italy", 59_000_000.0),
        ("Spain", 47_000_000.0),
        ("Kenya", 54_000_000.0),
        ("Brazil", 214_000_000.0),
    ];
    for (country, population) in populations {
        assert_eq!(normalised[country], raw[country] / population, "{country}");
    }
}

#[rstest]
fn given_continent_when_query_then_scoped_to_its_countries(world: RegionTree) {
    let europe = world.get_region_tree("Europe").unwrap();
    let cases = europe.get_cases(month("March 2021")).unwrap();
    assert_eq!(cases.keys().map(String::as_str).collect::<Vec<_>>(), vec!["Italy", "Spain"]);
    assert_eq!(cases["Spain"], 3_280_000);

    assert!(world.get_region_tree("south america").is_some());
    assert!(world.get_region_tree("Italy").is_none());
}

#[rstest]
#[case::before_first_report("Kenya", "January 2021")]
#[case::after_last_report("Spain", "April 2021")]
#[case::long_before_data("Brazil", "January 2019")]
fn given_missing_month_when_query_then_zero(
    world: RegionTree,
    #[case] country: &str,
    #[case] key: &str,
) {
    let m = month(key);
    assert_eq!(world.get_cases(m).unwrap()[country], 0);
    assert_eq!(world.get_vaccinations(m).unwrap()[country], 0);
    assert_eq!(world.get_deaths_normalised(m).unwrap()[country], 0.0);
}

#[test]
fn given_dataset_when_snapshot_then_ranked_descending() {
    let dataset = load(sample_csv()).unwrap();

    let report = dataset
        .snapshot("World", MetricView::raw(Metric::Deaths), month("March 2021"), Some(3))
        .unwrap();

    let countries: Vec<&str> = report.rows.iter().map(|r| r.country.as_str()).collect();
    assert_eq!(countries, vec!["Brazil", "Italy", "Spain"]);
}

#[test]
fn given_dataset_when_timeline_then_covers_data_months() {
    let dataset = load(sample_csv()).unwrap();
    let months = dataset.timeline(None, None);
    assert_eq!(
        months,
        vec![month("January 2021"), month("February 2021"), month("March 2021")]
    );
}
