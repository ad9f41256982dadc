use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::error::{Result, StayscanError};
use crate::config::Config;
use crate::store::sqlite::SqliteStore;

/// Loaded configuration plus the opened store.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
}

impl AppContext {
    /// Open the store at `db_path`, or at the configured or default path.
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path.or_else(|| config.database.path.clone()) {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        Self::ensure_parent(&db_path)?;
        let store = Arc::new(SqliteStore::new(&db_path)?);

        Ok(Self { config, store })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Ok(Self { config, store })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| StayscanError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("stayscan").join("stayscan.db"))
    }

    fn ensure_parent(db_path: &Path) -> Result<()> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
