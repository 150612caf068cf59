//! Monthly metric records and metric selection.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::month::MonthKey;

/// Cumulative figures of one country as of one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub total_cases: u64,
    pub total_deaths: u64,
    pub total_vaccinations: u64,
    pub population: u64,
}

/// A country's metrics keyed by month.
pub type MonthlyMetrics = BTreeMap<MonthKey, MetricsRecord>;

/// One of the cumulative counters of a [`MetricsRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cases,
    Deaths,
    Vaccinations,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cases, Metric::Deaths, Metric::Vaccinations];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Cases => "cases",
            Metric::Deaths => "deaths",
            Metric::Vaccinations => "vaccinations",
        }
    }

    /// The raw counter.
    pub fn read(&self, record: &MetricsRecord) -> u64 {
        match self {
            Metric::Cases => record.total_cases,
            Metric::Deaths => record.total_deaths,
            Metric::Vaccinations => record.total_vaccinations,
        }
    }

    /// The counter divided by population; 0 when the population is unknown.
    pub fn read_normalised(&self, record: &MetricsRecord) -> f64 {
        if record.population == 0 {
            return 0.0;
        }
        self.read(record) as f64 / record.population as f64
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownMetric(s.to_string()))
    }
}

/// A metric, optionally adjusted for population.
///
/// Textual forms are `cases`, `cases (pop. adjusted)` and, for command
/// lines, `cases-normalised`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricView {
    pub metric: Metric,
    pub normalised: bool,
}

const ADJUSTED_SUFFIXES: [&str; 4] = [
    "(pop. adjusted)",
    "(pop adjusted)",
    "-normalised",
    "-normalized",
];

impl MetricView {
    pub fn raw(metric: Metric) -> Self {
        Self {
            metric,
            normalised: false,
        }
    }

    pub fn normalised(metric: Metric) -> Self {
        Self {
            metric,
            normalised: true,
        }
    }

    /// All six views, raw ones first.
    pub fn all() -> Vec<MetricView> {
        let raw = Metric::ALL.into_iter().map(MetricView::raw);
        let adjusted = Metric::ALL.into_iter().map(MetricView::normalised);
        raw.chain(adjusted).collect()
    }

    pub fn read(&self, record: &MetricsRecord) -> f64 {
        if self.normalised {
            self.metric.read_normalised(record)
        } else {
            self.metric.read(record) as f64
        }
    }
}

impl Default for MetricView {
    fn default() -> Self {
        Self::raw(Metric::Cases)
    }
}

impl fmt::Display for MetricView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.normalised {
            write!(f, "{} (pop. adjusted)", self.metric)
        } else {
            write!(f, "{}", self.metric)
        }
    }
}

impl FromStr for MetricView {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let unknown = || DomainError::UnknownMetric(s.to_string());

        for suffix in ADJUSTED_SUFFIXES {
            if let Some(head) = lowered.strip_suffix(suffix) {
                let metric = head.parse::<Metric>().map_err(|_| unknown())?;
                return Ok(Self::normalised(metric));
            }
        }
        lowered
            .parse::<Metric>()
            .map(Self::raw)
            .map_err(|_| unknown())
    }
}

impl Serialize for MetricView {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MetricView {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
