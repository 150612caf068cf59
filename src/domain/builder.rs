//! Streaming construction of the World → Continent → Country → Metrics tree.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::domain::entities::DailyRecord;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::metrics::MonthlyMetrics;
use crate::domain::region::{RegionNode, RegionTree};

/// Metrics of the country whose records are currently streaming in.
#[derive(Debug)]
struct CountryRun {
    /// Taken from the run's first record
    continent: String,
    country: String,
    metrics: MonthlyMetrics,
    /// Last nonzero vaccination total of this run
    vaccinations: u64,
}

impl CountryRun {
    fn start(record: &DailyRecord) -> Self {
        Self {
            continent: record.continent.clone(),
            country: record.country.clone(),
            metrics: MonthlyMetrics::new(),
            vaccinations: 0,
        }
    }

    /// Store the record under its month; later days of a month win.
    ///
    /// A zero vaccination total means "not reported" and reuses the carried value.
    fn absorb(&mut self, record: &DailyRecord) -> DomainResult<()> {
        let key = record.month_key()?;
        if record.total_vaccinations != 0 {
            self.vaccinations = record.total_vaccinations;
        }
        self.metrics
            .insert(key, record.metrics_with_vaccinations(self.vaccinations));
        Ok(())
    }
}

/// Folds an ordered record stream into a region tree.
///
/// Records of one country must be contiguous. Each time the country changes
/// the finished run is inserted as `[continent, country, metrics]` below the
/// World root.
#[derive(Debug)]
pub struct WorldTreeBuilder {
    tree: RegionTree,
    current: Option<CountryRun>,
    finished: HashSet<String>,
    records: usize,
}

impl Default for WorldTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldTreeBuilder {
    pub fn new() -> Self {
        Self {
            tree: RegionTree::new(RegionNode::World),
            current: None,
            finished: HashSet::new(),
            records: 0,
        }
    }

    /// Feed the next record of the stream.
    pub fn push(&mut self, record: DailyRecord) -> DomainResult<()> {
        let run = match self.current.take() {
            Some(run) if run.country == record.country => run,
            previous => {
                if let Some(run) = previous {
                    self.finalize(run)?;
                }
                if self.finished.contains(&record.country) {
                    return Err(DomainError::NonContiguousCountry {
                        country: record.country,
                    });
                }
                CountryRun::start(&record)
            }
        };

        self.current.insert(run).absorb(&record)?;
        self.records += 1;
        Ok(())
    }

    /// Insert the last run and return the tree.
    #[instrument(level = "debug", skip(self))]
    pub fn finish(mut self) -> DomainResult<RegionTree> {
        if let Some(run) = self.current.take() {
            self.finalize(run)?;
        }
        info!(
            countries = self.finished.len(),
            records = self.records,
            "region tree built"
        );
        Ok(self.tree)
    }

    fn finalize(&mut self, run: CountryRun) -> DomainResult<()> {
        debug!(
            continent = %run.continent,
            country = %run.country,
            months = run.metrics.len(),
            "finalize country"
        );
        self.finished.insert(run.country.clone());
        self.tree.insert_sequence([
            RegionNode::Continent(run.continent),
            RegionNode::Country(run.country),
            RegionNode::Metrics(run.metrics),
        ])
    }
}

/// Build a region tree from records grouped by country.
pub fn build<I>(records: I) -> DomainResult<RegionTree>
where
    I: IntoIterator<Item = DailyRecord>,
{
    records
        .into_iter()
        .try_fold(WorldTreeBuilder::new(), |mut builder, record| {
            builder.push(record)?;
            Ok(builder)
        })?
        .finish()
}
