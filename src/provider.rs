use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::gateway::{CalendarDataProvider, ProviderError};
use crate::model::DaySnapshot;

/// Serves snapshots from `<dir>/<YYYY-MM-DD>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirProvider {
    dir: PathBuf,
}

impl JsonDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }
}

#[async_trait]
impl CalendarDataProvider for JsonDirProvider {
    async fn fetch_day(&self, date: NaiveDate) -> Result<DaySnapshot, ProviderError> {
        let path = self.path_for(date);
        debug!("reading snapshot {}", path.display());
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ProviderError(format!("{}: {e}", path.display())))?;
        let snapshot: DaySnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError(format!("{}: {e}", path.display())))?;
        if snapshot.date != date {
            return Err(ProviderError(format!(
                "{} holds {} instead of {date}",
                path.display(),
                snapshot.date
            )));
        }
        Ok(snapshot)
    }
}
