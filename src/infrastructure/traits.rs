//! I/O boundary traits for testability
//!
//! Record sources abstract where the daily records come from, allowing
//! services to be tested with in-memory data.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::DailyRecord;

/// Columns the CSV header must contain, matched by name.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "iso_code",
    "continent",
    "location",
    "date",
    "total_cases",
    "total_deaths",
    "total_vaccinations",
    "population",
];

/// A record together with the line it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedRecord {
    pub line: u64,
    pub record: DailyRecord,
}

/// Stream of records, in source order.
pub type RecordIter<'a> = Box<dyn Iterator<Item = ApplicationResult<SourcedRecord>> + 'a>;

/// Source of daily records, grouped by country.
pub trait RecordSource: Send + Sync {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    /// Open the source and stream its records.
    fn records(&self) -> ApplicationResult<RecordIter<'_>>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// CSV file written by the ETL step.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    path: PathBuf,
}

impl CsvRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for CsvRecordSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn records(&self) -> ApplicationResult<RecordIter<'_>> {
        if !self.path.is_file() {
            return Err(ApplicationError::DataFileNotFound(self.path.clone()));
        }
        let file = File::open(&self.path).with_path_context("open dataset", &self.path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(BufReader::new(file));

        let headers = reader
            .headers()
            .with_path_context("read header", &self.path)?
            .clone();
        check_columns(&headers)?;
        debug!(columns = headers.len(), "header accepted");

        let rows = reader
            .into_records()
            .map(move |row| -> ApplicationResult<SourcedRecord> {
                let row = row.map_err(|e| ApplicationError::MalformedRecord {
                    line: e.position().map(|p| p.line()).unwrap_or_default(),
                    message: e.to_string(),
                })?;
                let line = row.position().map(|p| p.line()).unwrap_or_default();
                let record = row
                    .deserialize::<DailyRecord>(Some(&headers))
                    .map_err(|e| ApplicationError::MalformedRecord {
                        line,
                        message: e.to_string(),
                    })?;
                Ok(SourcedRecord { line, record })
            });
        Ok(Box::new(rows))
    }
}

fn check_columns(headers: &StringRecord) -> ApplicationResult<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApplicationError::MalformedRecord {
            line: 1,
            message: format!("missing columns: {}", missing.join(", ")),
        })
    }
}

/// Records held in memory, e.g. handed over by an ETL step in the same process.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    records: Vec<DailyRecord>,
}

impl MemoryRecordSource {
    pub fn new(records: Vec<DailyRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for MemoryRecordSource {
    fn describe(&self) -> String {
        format!("{} in-memory records", self.records.len())
    }

    fn records(&self) -> ApplicationResult<RecordIter<'_>> {
        Ok(Box::new(self.records.iter().enumerate().map(|(i, record)| {
            Ok::<_, ApplicationError>(SourcedRecord {
                line: i as u64 + 1,
                record: record.clone(),
            })
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_csv_source_reads_records_by_header_name() {
        let file = csv_file(
            "index,iso_code,continent,location,date,total_cases,total_deaths,total_vaccinations,population\n\
             1,AFG,Asia,Afghanistan,2020-02-24,5,0,0,41128772\n\
             2,AFG,Asia,Afghanistan,2020-02-25,5,1,0,41128772\n",
        );
        let source = CsvRecordSource::new(file.path());
        let records: Vec<SourcedRecord> = source
            .records()
            .unwrap()
            .collect::<ApplicationResult<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].record.country, "Afghanistan");
        assert_eq!(records[1].record.total_deaths, 1);
        assert_eq!(records[1].record.population, 41_128_772);
    }

    #[test]
    fn test_csv_source_reports_missing_columns() {
        let file = csv_file("continent,location,date\nAsia,India,2020-01-01\n");
        let err = CsvRecordSource::new(file.path()).records().err().unwrap();
        let message = err.to_string();
        assert!(message.contains("iso_code"), "{message}");
        assert!(message.contains("population"), "{message}");
    }

    #[test]
    fn test_csv_source_reports_line_of_bad_number() {
        let file = csv_file(
            "iso_code,continent,location,date,total_cases,total_deaths,total_vaccinations,population\n\
             IND,Asia,India,2020-01-01,1,0,0,100\n\
             IND,Asia,India,2020-01-02,lots,0,0,100\n",
        );
        let results: Vec<_> = CsvRecordSource::new(file.path()).records().unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ApplicationError::MalformedRecord { line: 3, .. })
        ));
    }

    #[test]
    fn test_csv_source_missing_file() {
        let source = CsvRecordSource::new("/nonexistent/covid.csv");
        assert!(matches!(
            source.records().err(),
            Some(ApplicationError::DataFileNotFound(_))
        ));
    }

    #[test]
    fn test_memory_source_numbers_lines() {
        let source = MemoryRecordSource::new(vec![crate::util::testing::record(
            "Asia", "India", "2020-01-01", 1, 0, 0, 100,
        )]);
        let records: Vec<_> = source.records().unwrap().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap().line, 1);
    }
}
