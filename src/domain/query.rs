//! Read-only folds over a built region tree.
//!
//! Every query collapses the subtree it is called on into a mapping from
//! country name to a value for one month. Countries that did not report the
//! month map to 0; values are not carried forward from earlier months.

use std::collections::{BTreeMap, BTreeSet};

use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::metrics::{Metric, MetricView, MetricsRecord, MonthlyMetrics};
use crate::domain::month::MonthKey;
use crate::domain::region::{RegionNode, RegionTree, WORLD};

/// Country name → value for one month.
pub type Snapshot<V> = BTreeMap<String, V>;

/// Queries over a World or continent tree.
pub trait RegionQuery {
    /// Subtree rooted at `region` (case-insensitive).
    ///
    /// Only the World node and continents are candidates: a country name,
    /// or a call on a country or metrics subtree, yields `None`.
    fn get_region_tree(&self, region: &str) -> Option<&RegionTree>;

    /// Fold every reachable country into `read(record)` for `month`.
    fn snapshot<V, F>(&self, month: MonthKey, read: F) -> DomainResult<Snapshot<V>>
    where
        V: Default,
        F: Fn(&MetricsRecord) -> V;

    fn get_cases(&self, month: MonthKey) -> DomainResult<Snapshot<u64>> {
        self.snapshot(month, |r| Metric::Cases.read(r))
    }

    fn get_deaths(&self, month: MonthKey) -> DomainResult<Snapshot<u64>> {
        self.snapshot(month, |r| Metric::Deaths.read(r))
    }

    fn get_vaccinations(&self, month: MonthKey) -> DomainResult<Snapshot<u64>> {
        self.snapshot(month, |r| Metric::Vaccinations.read(r))
    }

    fn get_cases_normalised(&self, month: MonthKey) -> DomainResult<Snapshot<f64>> {
        self.snapshot(month, |r| Metric::Cases.read_normalised(r))
    }

    fn get_deaths_normalised(&self, month: MonthKey) -> DomainResult<Snapshot<f64>> {
        self.snapshot(month, |r| Metric::Deaths.read_normalised(r))
    }

    fn get_vaccinations_normalised(&self, month: MonthKey) -> DomainResult<Snapshot<f64>> {
        self.snapshot(month, |r| Metric::Vaccinations.read_normalised(r))
    }

    /// Any of the six queries, selected by `view`, as floats.
    fn get_view(&self, view: MetricView, month: MonthKey) -> DomainResult<Snapshot<f64>> {
        self.snapshot(month, |r| view.read(r))
    }

    /// One snapshot per month.
    fn series(
        &self,
        view: MetricView,
        months: &[MonthKey],
    ) -> DomainResult<BTreeMap<MonthKey, Snapshot<f64>>> {
        months
            .iter()
            .map(|&month| Ok((month, self.get_view(view, month)?)))
            .collect()
    }

    /// Continent names, in insertion order.
    fn continents(&self) -> Vec<&str>;

    /// Country names, in insertion order.
    fn countries(&self) -> Vec<&str>;

    /// Every month reported by at least one country.
    fn available_months(&self) -> BTreeSet<MonthKey>;

    /// Metrics leaf of `country`, if it is reachable.
    fn country_metrics(&self, country: &str) -> Option<&MonthlyMetrics>;

    /// Population `country` reported for `month`.
    fn population_of(&self, country: &str, month: MonthKey) -> Option<u64> {
        self.country_metrics(country)?
            .get(&month)
            .map(|record| record.population)
    }
}

impl RegionQuery for RegionTree {
    fn get_region_tree(&self, region: &str) -> Option<&RegionTree> {
        match self.value()? {
            RegionNode::World if region.eq_ignore_ascii_case(WORLD) => Some(self),
            RegionNode::World => self
                .children()
                .iter()
                .find_map(|continent| continent.get_region_tree(region)),
            RegionNode::Continent(name) => name.eq_ignore_ascii_case(region).then_some(self),
            RegionNode::Country(_) | RegionNode::Metrics(_) => None,
        }
    }

    #[instrument(level = "debug", skip(self, read), fields(root = ?self.value().and_then(RegionNode::name)))]
    fn snapshot<V, F>(&self, month: MonthKey, read: F) -> DomainResult<Snapshot<V>>
    where
        V: Default,
        F: Fn(&MetricsRecord) -> V,
    {
        if self.is_empty() {
            return Err(DomainError::EmptyTree);
        }
        Ok(fold_countries(self, &month, &read))
    }

    fn continents(&self) -> Vec<&str> {
        self.iter()
            .filter_map(|node| match node.value() {
                Some(RegionNode::Continent(name)) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn countries(&self) -> Vec<&str> {
        self.iter()
            .filter_map(|node| match node.value() {
                Some(RegionNode::Country(name)) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn available_months(&self) -> BTreeSet<MonthKey> {
        self.iter()
            .filter_map(|node| node.value().and_then(RegionNode::metrics))
            .flat_map(|metrics| metrics.keys().copied())
            .collect()
    }

    fn country_metrics(&self, country: &str) -> Option<&MonthlyMetrics> {
        self.iter()
            .find(|node| matches!(node.value(), Some(RegionNode::Country(name)) if name == country))
            .and_then(leaf_metrics)
    }
}

/// Metrics leaf below a country node.
fn leaf_metrics(country: &RegionTree) -> Option<&MonthlyMetrics> {
    country
        .children()
        .iter()
        .find_map(|child| child.value().and_then(RegionNode::metrics))
}

fn fold_countries<V, F>(node: &RegionTree, month: &MonthKey, read: &F) -> Snapshot<V>
where
    V: Default,
    F: Fn(&MetricsRecord) -> V,
{
    match node.value() {
        Some(RegionNode::Country(name)) => {
            let value = leaf_metrics(node)
                .and_then(|metrics| metrics.get(month))
                .map(read)
                .unwrap_or_default();
            Snapshot::from([(name.clone(), value)])
        }
        Some(RegionNode::World | RegionNode::Continent(_)) => node
            .children()
            .iter()
            .map(|child| fold_countries(child, month, read))
            .fold(Snapshot::new(), |mut acc, part| {
                // Country names are disjoint across subtrees
                acc.extend(part);
                acc
            }),
        Some(RegionNode::Metrics(_)) | None => Snapshot::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::build;
    use crate::util::testing::record;

    fn month(key: &str) -> MonthKey {
        key.parse().unwrap()
    }

    fn world() -> RegionTree {
        build(vec![
            record("Asia", "India", "2020-03-31", 100, 5, 0, 1_000),
            record("Asia", "India", "2020-04-30", 200, 8, 0, 1_000),
            record("Asia", "Japan", "2020-04-30", 50, 1, 0, 500),
            record("Europe", "France", "2020-03-31", 300, 30, 0, 600),
            record("Europe", "France", "2021-01-31", 900, 60, 1_200, 600),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_cases_covers_every_country() {
        let tree = world();
        let cases = tree.get_cases(month("March 2020")).unwrap();
        assert_eq!(cases.len(), tree.countries().len());
        assert_eq!(cases["India"], 100);
        assert_eq!(cases["France"], 300);
        // Japan only reported from April on
        assert_eq!(cases["Japan"], 0);
    }

    #[test]
    fn test_absent_month_is_zero_not_carried_forward() {
        let tree = world();
        let deaths = tree.get_deaths(month("May 2020")).unwrap();
        assert!(deaths.values().all(|&v| v == 0));
        let deaths = tree.get_deaths(month("January 2019")).unwrap();
        assert_eq!(deaths.len(), 3);
        assert!(deaths.values().all(|&v| v == 0));
    }

    #[test]
    fn test_normalised_equals_raw_over_population() {
        let tree = world();
        let m = month("April 2020");
        let raw = tree.get_cases(m).unwrap();
        let normalised = tree.get_cases_normalised(m).unwrap();
        assert_eq!(normalised["India"], raw["India"] as f64 / 1_000.0);
        assert_eq!(normalised["Japan"], raw["Japan"] as f64 / 500.0);
        assert_eq!(normalised["France"], 0.0);
    }

    #[test]
    fn test_vaccination_queries() {
        let tree = world();
        let m = month("January 2021");
        assert_eq!(tree.get_vaccinations(m).unwrap()["France"], 1_200);
        assert_eq!(tree.get_vaccinations_normalised(m).unwrap()["France"], 2.0);
        assert_eq!(tree.get_deaths_normalised(m).unwrap()["France"], 0.1);
    }

    #[test]
    fn test_get_view_dispatches() {
        let tree = world();
        let m = month("March 2020");
        let view = MetricView::normalised(Metric::Deaths);
        assert_eq!(
            tree.get_view(view, m).unwrap(),
            tree.get_deaths_normalised(m).unwrap()
        );
    }

    #[test]
    fn test_region_tree_scoping() {
        let tree = world();
        let asia = tree.get_region_tree("asia").unwrap();
        assert_eq!(asia.value(), Some(&RegionNode::Continent("Asia".into())));
        assert_eq!(asia.countries(), vec!["India", "Japan"]);
        assert!(asia.render().starts_with("Asia\n"));

        assert!(std::ptr::eq(tree.get_region_tree("WORLD").unwrap(), &tree));
        assert!(tree.get_region_tree("India").is_none());
        assert!(tree.get_region_tree("Atlantis").is_none());
        // A continent tree does not contain the world
        assert!(asia.get_region_tree("world").is_none());
    }

    #[test]
    fn test_region_tree_with_empty_continent() {
        let mut tree = RegionTree::new(RegionNode::World);
        tree.insert_sequence([RegionNode::Continent("Antarctica".into())])
            .unwrap();
        let antarctica = tree.get_region_tree("Antarctica").unwrap();
        assert!(antarctica.get_cases(month("March 2020")).unwrap().is_empty());
    }

    #[test]
    fn test_query_on_empty_tree_fails() {
        let tree = RegionTree::empty();
        assert_eq!(
            tree.get_cases(month("March 2020")),
            Err(DomainError::EmptyTree)
        );
        assert!(tree.get_region_tree("world").is_none());
    }

    #[test]
    fn test_series_and_available_months() {
        let tree = world();
        let months: Vec<MonthKey> = tree.available_months().into_iter().collect();
        assert_eq!(
            months,
            vec![month("March 2020"), month("April 2020"), month("January 2021")]
        );
        let series = tree.series(MetricView::raw(Metric::Cases), &months).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[&month("April 2020")]["India"], 200.0);
    }

    #[test]
    fn test_country_metrics() {
        let tree = world();
        assert_eq!(tree.country_metrics("France").unwrap().len(), 2);
        assert!(tree.country_metrics("Asia").is_none());
        assert_eq!(tree.population_of("Japan", month("April 2020")), Some(500));
        assert_eq!(tree.population_of("Japan", month("March 2020")), None);
        assert_eq!(tree.continents(), vec!["Asia", "Europe"]);
    }
}
