//! Service container for dependency injection
//!
//! Wires up the dataset service with its record source.

use std::sync::Arc;

use crate::application::services::DatasetService;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::traits::{CsvRecordSource, RecordSource};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Where records are read from
    pub source: Arc<dyn RecordSource>,
}

impl ServiceContainer {
    /// Create a container reading the configured CSV file.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        let source = Arc::new(CsvRecordSource::new(settings.require_data_file()?));
        Ok(Self::with_deps(settings, source))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, source: Arc<dyn RecordSource>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, source }
    }

    /// Dataset service bound to this container's source.
    pub fn dataset_service(&self) -> DatasetService {
        DatasetService::new(Arc::clone(&self.source))
    }
}
