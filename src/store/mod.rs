pub mod sqlite;

use chrono::NaiveDate;

use crate::app::Result;
use crate::domain::ListingRecord;

pub use sqlite::SqliteStore;

/// Result of persisting one listing snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same `(id, collect_date)` already exists. Not an error.
    Conflict,
}

pub trait ListingStore {
    fn exists(&self, id: &str, collect_date: NaiveDate) -> Result<bool>;
    fn insert(&self, record: &ListingRecord) -> Result<InsertOutcome>;
    fn get(&self, id: &str, collect_date: NaiveDate) -> Result<Option<ListingRecord>>;
    fn list_by_date(&self, collect_date: NaiveDate) -> Result<Vec<ListingRecord>>;
}
