//! Dataset service
//!
//! Loads records from a source into a region tree and answers the queries
//! the display layer needs: ranked snapshots, series over a timeline and
//! region listings.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    MetricView, MonthKey, RegionNode, RegionQuery, RegionTree, Snapshot, WorldTreeBuilder, WORLD,
};
use crate::infrastructure::traits::{RecordSource, SourcedRecord};

/// Service building region trees from a record source.
pub struct DatasetService {
    source: Arc<dyn RecordSource>,
}

impl DatasetService {
    /// Create a new dataset service.
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    /// Stream all records into a new tree.
    ///
    /// The first malformed record aborts the load; its line is reported.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self) -> ApplicationResult<Dataset> {
        info!(source = %self.source.describe(), "loading records");
        let mut builder = WorldTreeBuilder::new();
        for item in self.source.records()? {
            let SourcedRecord { line, record } = item?;
            builder
                .push(record)
                .map_err(|source| ApplicationError::Build { line, source })?;
        }
        let tree = builder.finish()?;
        Ok(Dataset::new(tree))
    }
}

/// One row of a ranked snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    pub country: String,
    pub value: f64,
}

/// Per-country values of one region for one month, largest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotReport {
    pub region: String,
    pub month: MonthKey,
    pub view: MetricView,
    pub rows: Vec<SnapshotRow>,
}

/// Per-country values of one region over consecutive months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesReport {
    pub region: String,
    pub view: MetricView,
    pub months: BTreeMap<MonthKey, Snapshot<f64>>,
}

/// A continent and the number of countries below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
    pub name: String,
    pub countries: usize,
}

/// A built region tree, immutable from here on.
#[derive(Debug, Clone)]
pub struct Dataset {
    tree: RegionTree,
}

impl Dataset {
    pub fn new(tree: RegionTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &RegionTree {
        &self.tree
    }

    /// The World tree or one continent.
    pub fn scope(&self, region: &str) -> ApplicationResult<&RegionTree> {
        self.tree
            .get_region_tree(region)
            .ok_or_else(|| ApplicationError::UnknownRegion(region.to_string()))
    }

    /// Ranked snapshot of `region`, truncated to `top` rows if given.
    #[instrument(level = "debug", skip(self))]
    pub fn snapshot(
        &self,
        region: &str,
        view: MetricView,
        month: MonthKey,
        top: Option<usize>,
    ) -> ApplicationResult<SnapshotReport> {
        let scope = self.scope(region)?;
        let values = scope.get_view(view, month)?;
        let rows: Vec<SnapshotRow> = values
            .into_iter()
            .sorted_by(|(a_name, a), (b_name, b)| b.total_cmp(a).then_with(|| a_name.cmp(b_name)))
            .take(top.unwrap_or(usize::MAX))
            .map(|(country, value)| SnapshotRow { country, value })
            .collect();
        debug!(rows = rows.len(), "snapshot ready");

        Ok(SnapshotReport {
            region: region_name(scope),
            month,
            view,
            rows,
        })
    }

    /// Values of `region` for every month in `months`, optionally restricted to `countries`.
    #[instrument(level = "debug", skip(self, months))]
    pub fn series(
        &self,
        region: &str,
        view: MetricView,
        months: &[MonthKey],
        countries: &[String],
    ) -> ApplicationResult<SeriesReport> {
        let scope = self.scope(region)?;
        let known: BTreeSet<&str> = scope.countries().into_iter().collect();
        if let Some(unknown) = countries.iter().find(|c| !known.contains(c.as_str())) {
            return Err(ApplicationError::UnknownCountry(unknown.clone()));
        }

        let mut series = scope.series(view, months)?;
        if !countries.is_empty() {
            for snapshot in series.values_mut() {
                snapshot.retain(|country, _| countries.contains(country));
            }
        }

        Ok(SeriesReport {
            region: region_name(scope),
            view,
            months: series,
        })
    }

    /// Months from `from` to `to`, defaulting to the first and last month in the data.
    pub fn timeline(&self, from: Option<MonthKey>, to: Option<MonthKey>) -> Vec<MonthKey> {
        let available = self.tree.available_months();
        let start = from.or_else(|| available.first().copied());
        let end = to.or_else(|| available.last().copied());
        match (start, end) {
            (Some(start), Some(end)) => MonthKey::range(start, end),
            _ => Vec::new(),
        }
    }

    /// Continents with their country counts.
    pub fn regions(&self) -> Vec<RegionSummary> {
        self.tree
            .children()
            .iter()
            .filter_map(|continent| {
                continent.value().and_then(RegionNode::name).map(|name| RegionSummary {
                    name: name.to_string(),
                    countries: continent.countries().len(),
                })
            })
            .collect()
    }
}

fn region_name(scope: &RegionTree) -> String {
    scope
        .value()
        .and_then(RegionNode::name)
        .unwrap_or(WORLD)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{build, Metric};
    use crate::infrastructure::traits::MemoryRecordSource;
    use crate::util::testing::{record, sample_records};

    fn dataset() -> Dataset {
        Dataset::new(build(sample_records()).unwrap())
    }

    fn month(key: &str) -> MonthKey {
        key.parse().unwrap()
    }

    #[test]
    fn test_load_from_memory_source() {
        let service = DatasetService::new(Arc::new(MemoryRecordSource::new(sample_records())));
        let loaded = service.load().unwrap();
        assert_eq!(loaded.tree(), dataset().tree());
    }

    #[test]
    fn test_load_reports_line_of_failing_record() {
        let records = vec![
            record("Asia", "India", "2021-01-01", 1, 0, 0, 100),
            record("Asia", "India", "01-02-2021", 1, 0, 0, 100),
        ];
        let service = DatasetService::new(Arc::new(MemoryRecordSource::new(records)));
        let err = service.load().unwrap_err();
        assert!(matches!(err, ApplicationError::Build { line: 2, .. }));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_snapshot_is_ranked_and_truncated() {
        let report = dataset()
            .snapshot("world", MetricView::raw(Metric::Cases), month("March 2021"), Some(2))
            .unwrap();
        assert_eq!(report.region, "World");
        assert_eq!(report.rows.len(), 2);
        assert!(report.rows[0].value >= report.rows[1].value);
    }

    #[test]
    fn test_snapshot_unknown_region() {
        let result = dataset().snapshot(
            "Atlantis",
            MetricView::default(),
            month("March 2021"),
            None,
        );
        assert!(matches!(result, Err(ApplicationError::UnknownRegion(_))));
    }

    #[test]
    fn test_series_filters_countries() {
        let ds = dataset();
        let months = ds.timeline(None, None);
        let report = ds
            .series("Europe", MetricView::raw(Metric::Deaths), &months, &["France".to_string()])
            .unwrap();
        assert_eq!(report.region, "Europe");
        assert_eq!(report.months.len(), months.len());
        assert!(report.months.values().all(|s| s.keys().map(String::as_str).eq(["France"])));
    }

    #[test]
    fn test_series_rejects_country_outside_region() {
        let ds = dataset();
        let result = ds.series("Europe", MetricView::default(), &[], &["India".to_string()]);
        assert!(matches!(result, Err(ApplicationError::UnknownCountry(c)) if c == "India"));
    }

    #[test]
    fn test_timeline_defaults_to_data_bounds() {
        let ds = dataset();
        let months = ds.timeline(None, None);
        assert_eq!(months.first(), ds.tree().available_months().first());
        assert_eq!(months.last(), ds.tree().available_months().last());
        let clipped = ds.timeline(Some(month("February 2021")), Some(month("March 2021")));
        assert_eq!(clipped.len(), 2);
    }

    #[test]
    fn test_regions() {
        let regions = dataset().regions();
        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Asia", "Europe", "Africa"]);
        assert!(regions.iter().all(|r| r.countries > 0));
    }
}
