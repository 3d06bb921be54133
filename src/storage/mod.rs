mod flush;
mod snapshot;

pub use flush::{FlushState, Flusher};
pub use snapshot::Snapshot;

use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::error::Result;
use crate::sql::schema;
use crate::sql::types::{Record, Value};

/// The table store: all tables and auto-increment counters, held in memory and persisted to a
/// single snapshot file.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    data: Snapshot,
    saves: u64,
}

impl Store {
    /// Loads the store from a snapshot file. A missing file starts empty, and an unreadable
    /// or corrupt one is logged and also starts empty. Afterwards every known table exists and
    /// every auto-increment counter covers the largest id present.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match Snapshot::read(&path) {
            Ok(Some(data)) => {
                info!("Loaded snapshot {} with {} tables", path.display(), data.tables.len());
                data
            },
            Ok(None) => {
                info!("No snapshot at {}, starting empty", path.display());
                Snapshot::default()
            },
            Err(err) => {
                error!("Failed to load snapshot {}, starting empty: {}", path.display(), err);
                Snapshot::default()
            },
        };
        let mut store = Self { path, data, saves: 0 };

        for table in schema::tables() {
            store.ensure_table(table.name);
            if let Some(field) = table.auto_id_field() {
                let ids = store.data.tables[table.name]
                    .iter()
                    .filter_map(|row| row.get(field).cloned())
                    .collect::<Vec<_>>();
                store.data.auto_ids.entry(table.name.to_string()).or_insert(0);
                for id in ids {
                    store.observe_id(table.name, &id);
                }
            }
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterates over table names and their records.
    pub fn tables(&self) -> impl Iterator<Item = (&String, &Vec<Record>)> {
        self.data.tables.iter()
    }

    /// Returns a table's records, if the table exists.
    pub fn table(&self, name: &str) -> Option<&Vec<Record>> {
        self.data.tables.get(name)
    }

    /// Returns a table's records for mutation, creating the table if missing.
    pub fn table_mut(&mut self, name: &str) -> &mut Vec<Record> {
        self.data.tables.entry(name.to_string()).or_default()
    }

    /// Creates an empty table unless it already exists.
    pub fn ensure_table(&mut self, name: &str) {
        self.table_mut(name);
    }

    /// The current value of a table's auto-increment counter.
    pub fn auto_id(&self, table: &str) -> i64 {
        self.data.auto_ids.get(table).copied().unwrap_or(0)
    }

    /// Raises a table's counter to cover an explicitly supplied id. Non-integral ids are ignored.
    pub fn observe_id(&mut self, table: &str, id: &Value) {
        let n = id.number();
        if n.is_finite() && n.fract() == 0.0 && n < i64::MAX as f64 {
            let counter = self.data.auto_ids.entry(table.to_string()).or_insert(0);
            *counter = (*counter).max(n as i64);
        }
    }

    /// Writes the snapshot file.
    pub fn save(&mut self) -> Result<()> {
        self.data.write(&self.path)?;
        self.saves += 1;
        debug!("Flushed snapshot {} (write #{})", self.path.display(), self.saves);
        Ok(())
    }

    /// Writes the snapshot file, logging failures. In-memory state is kept either way.
    pub fn persist(&mut self) {
        if let Err(err) = self.save() {
            error!("Failed to persist snapshot {}: {}", self.path.display(), err);
        }
    }

    /// The number of completed snapshot writes.
    pub fn saves(&self) -> u64 {
        self.saves
    }

    /// The size of the snapshot file on disk, or 0 if it has not been written.
    pub fn file_size(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}
