use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, StayscanError};
use crate::domain::{Coordinate, ListingRecord};
use crate::store::{InsertOutcome, ListingStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = "SELECT id, collect_date, region_name, coordinate, title, rating,
        review_count, foreigner_review_count, option_list, reserved_count, collect_count
     FROM listings";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| StayscanError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            StayscanError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn format_date(date: NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    fn parse_date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
    }

    /// Parses the `"(lat, lng)"` text written by [`Coordinate`]'s `Display`.
    fn parse_coordinate(s: &str) -> Option<Coordinate> {
        let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
        let (lat, lng) = inner.split_once(',')?;
        Some(Coordinate::new(
            lat.trim().parse().ok()?,
            lng.trim().parse().ok()?,
        ))
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ListingRecord> {
        let collect_date: String = row.get(1)?;
        let coordinate: String = row.get(3)?;
        let option_list: Option<String> = row.get(8)?;

        Ok(ListingRecord {
            id: row.get(0)?,
            collect_date: Self::parse_date(&collect_date).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    format!("invalid collect_date {:?}", collect_date).into(),
                )
            })?,
            region_name: row.get(2)?,
            coordinate: Self::parse_coordinate(&coordinate)
                .unwrap_or_else(|| Coordinate::new(f64::NAN, f64::NAN)),
            title: row.get(4)?,
            rating: row.get(5)?,
            review_count: row.get(6)?,
            foreigner_review_count: row.get(7)?,
            option_list: option_list
                .and_then(|s| serde_json::from_str::<BTreeSet<String>>(&s).ok())
                .unwrap_or_default(),
            reserved_count: row.get(9)?,
            collect_count: row.get(10)?,
        })
    }

    fn insert_row(conn: &Connection, record: &ListingRecord) -> Result<InsertOutcome> {
        let option_list = serde_json::to_string(&record.option_list)?;

        let inserted = conn.execute(
            "INSERT INTO listings (id, collect_date, region_name, collect_count, coordinate, title,
                rating, review_count, foreigner_review_count, option_list, reserved_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.id,
                Self::format_date(record.collect_date),
                record.region_name,
                record.collect_count,
                record.coordinate.to_string(),
                record.title,
                record.rating,
                record.review_count,
                record.foreigner_review_count,
                option_list,
                record.reserved_count,
                Utc::now().to_rfc3339()
            ],
        );

        match inserted {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Ok(InsertOutcome::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ListingStore for SqliteStore {
    fn exists(&self, id: &str, collect_date: NaiveDate) -> Result<bool> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM listings WHERE id = ?1 AND collect_date = ?2",
            params![id, Self::format_date(collect_date)],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    fn insert(&self, record: &ListingRecord) -> Result<InsertOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        match Self::insert_row(&tx, record) {
            Ok(InsertOutcome::Inserted) => {
                tx.commit()?;
                Ok(InsertOutcome::Inserted)
            }
            Ok(InsertOutcome::Conflict) => {
                tx.rollback()?;
                Ok(InsertOutcome::Conflict)
            }
            Err(e) => {
                tx.rollback()?;
                Err(e)
            }
        }
    }

    fn get(&self, id: &str, collect_date: NaiveDate) -> Result<Option<ListingRecord>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("{} WHERE id = ?1 AND collect_date = ?2", SELECT_COLUMNS),
                params![id, Self::format_date(collect_date)],
                Self::row_to_record,
            )
            .optional()?;

        Ok(result)
    }

    fn list_by_date(&self, collect_date: NaiveDate) -> Result<Vec<ListingRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE collect_date = ?1 ORDER BY region_name, id",
            SELECT_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![Self::format_date(collect_date)], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
