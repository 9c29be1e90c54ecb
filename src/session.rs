use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::filter::{self, FilterOptions, FilterSet};
use crate::loader::{self, LoadOutcome};
use crate::models::Dataset;

/// One user's working state: the loaded sheet (kept until the file content
/// changes) and the filters they have chosen.
pub struct Session {
    source: PathBuf,
    sheet: String,
    checksum: Option<String>,
    outcome: LoadOutcome,
    options: FilterOptions,
    today: NaiveDate,
    pub filters: FilterSet,
}

impl Session {
    pub fn open(source: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self::open_at(source, sheet, chrono::Local::now().date_naive())
    }

    /// Like [`Session::open`] with a fixed "today" for the empty-data date fallback.
    pub fn open_at(source: impl Into<PathBuf>, sheet: impl Into<String>, today: NaiveDate) -> Self {
        let mut session = Self {
            source: source.into(),
            sheet: sheet.into(),
            checksum: None,
            outcome: LoadOutcome::default(),
            options: FilterOptions::from_dataset(&Dataset::default(), today),
            today,
            filters: FilterSet::default(),
        };
        session.refresh();
        session
    }

    /// Re-read the source if its content changed since the last load.
    /// Returns `true` when the dataset was replaced.
    pub fn refresh(&mut self) -> bool {
        let checksum = loader::compute_checksum(&self.source).ok();
        if checksum.is_some() && checksum == self.checksum {
            tracing::debug!(path = %self.source.display(), "source unchanged, reusing dataset");
            return false;
        }
        self.outcome = loader::load_or_empty(&self.source, &self.sheet);
        self.checksum = if self.outcome.error.is_none() { checksum } else { None };
        self.options = FilterOptions::from_dataset(&self.outcome.dataset, self.today);
        true
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    pub fn dataset(&self) -> &Dataset {
        &self.outcome.dataset
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// The dataset under the current filters.
    pub fn filtered(&self) -> Dataset {
        filter::apply(&self.outcome.dataset, &self.filters)
    }

    /// Back to everything selected with no date or year restriction.
    pub fn reset_filters(&mut self) {
        self.filters = FilterSet::default();
    }
}
