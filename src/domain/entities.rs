//! Domain entities: input records

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainResult;
use crate::domain::metrics::MetricsRecord;
use crate::domain::month::MonthKey;

/// One day of one country's cumulative figures, as produced by the ETL step.
///
/// Field names follow the CSV header; the country column is called `location`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub iso_code: String,
    pub continent: String,
    #[serde(rename = "location")]
    pub country: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_cases: u64,
    pub total_deaths: u64,
    pub total_vaccinations: u64,
    pub population: u64,
}

impl DailyRecord {
    /// Month this record falls in.
    pub fn month_key(&self) -> DomainResult<MonthKey> {
        MonthKey::from_date(&self.date)
    }

    /// Metrics as reported, with vaccinations replaced by `vaccinations`.
    pub fn metrics_with_vaccinations(&self, vaccinations: u64) -> MetricsRecord {
        MetricsRecord {
            total_cases: self.total_cases,
            total_deaths: self.total_deaths,
            total_vaccinations: vaccinations,
            population: self.population,
        }
    }
}
