// The engine dispatches statements against the table store and schedules persistence.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use regex::Regex;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::storage::{Flusher, Store};
use super::execution::{Executor, QueryResult};
use super::parser::ast::StatementKind;
use super::parser::Parser;
use super::schema;
use super::types::{Record, Value};

/// Database options.
#[derive(Clone, Debug)]
pub struct Options {
    /// How long a write waits for further writes before the snapshot is flushed.
    pub debounce: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self { debounce: Duration::from_millis(200) }
    }
}

/// A handle to an open database. Clones share the same store.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    store: Store,
    flusher: Flusher,
}

impl Database {
    /// Opens the database backed by the given snapshot file, with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::open_with(path, Options::default())
    }

    /// Opens the database backed by the given snapshot file. A missing or corrupt file opens
    /// an empty database.
    pub fn open_with<P: AsRef<Path>>(path: P, options: Options) -> Self {
        let store = Store::load(path);
        let flusher = Flusher::new(options.debounce);
        Self { inner: Arc::new(Mutex::new(Inner { store, flusher })) }
    }

    /// Executes a statement with positional parameters ($1, $2, ...).
    ///
    /// Write statements (INSERT, UPDATE, DELETE) that cannot be parsed return
    /// `Error::Unsupported`. Any other statement that cannot be parsed is logged and returns an
    /// empty result.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let trimmed = sql.trim();
        let statement = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
        if statement.is_empty() {
            return Ok(QueryResult::empty());
        }

        let kind = StatementKind::classify(statement);
        let parsed = match Parser::new(statement).parse() {
            Ok(parsed) => parsed,
            Err(err) if kind.is_write() => {
                return Err(Error::Unsupported(format!("{} ({})", statement, err)))
            },
            Err(err) => {
                warn!("Ignoring unsupported statement {:?}: {}", statement, err);
                return Ok(QueryResult::empty());
            },
        };

        debug!("Executing {:?}", statement);
        let mutation = parsed.is_mutation();
        let mut inner = self.inner.lock();
        let result = <dyn Executor>::build(parsed).execute(&mut inner.store, params)?;
        if mutation {
            self.schedule_flush(&mut inner);
        }
        Ok(result)
    }

    /// Creates the known tables and adds any missing columns, seeding their defaults onto
    /// existing records. Safe to run on every startup.
    pub async fn init_tables(&self) -> Result<()> {
        let statements = schema::bootstrap();
        for statement in &statements {
            self.execute(statement, &[]).await?;
        }
        info!("Initialized tables with {} schema statements", statements.len());
        Ok(())
    }

    /// Returns the stored settings of a subbot, or the fallback configuration if there are
    /// none. A `:<device>` suffix on the bot id is ignored.
    pub async fn subbot_config(&self, bot_id: &str) -> Record {
        lazy_static! {
            static ref RE_DEVICE: Regex = Regex::new(r":\d+").unwrap();
        }
        let id = RE_DEVICE.replace(bot_id, "");
        match self.execute("SELECT * FROM subbots WHERE id = $1", &[Value::from(id.as_ref())]).await {
            Ok(result) => result.rows.into_iter().next().unwrap_or_else(schema::subbot_fallback),
            Err(err) => {
                error!("Failed to read subbot config for {}: {}", bot_id, err);
                schema::subbot_fallback()
            },
        }
    }

    /// Schedules a debounced flush. Outside a Tokio runtime the snapshot is written at once.
    fn schedule_flush(&self, inner: &mut Inner) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => return inner.store.persist(),
        };
        if let Some(deadline) = inner.flusher.schedule(Instant::now()) {
            let database = self.clone();
            handle.spawn(async move {
                tokio::time::sleep_until(deadline).await;
                let mut inner = database.inner.lock();
                if inner.flusher.fire() {
                    inner.store.persist();
                }
            });
        }
    }

    /// Writes the snapshot now, absorbing any pending debounced flush.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.flusher.fire();
        inner.store.save()
    }

    /// The number of snapshot writes completed since the database was opened.
    pub fn flush_count(&self) -> u64 {
        self.inner.lock().store.saves()
    }

    /// Whether a debounced flush is waiting to run.
    pub fn flush_pending(&self) -> bool {
        self.inner.lock().flusher.is_pending()
    }

    /// The backing snapshot file.
    pub fn path(&self) -> PathBuf {
        self.inner.lock().store.path().to_path_buf()
    }

    /// Table names with their row counts.
    pub fn tables(&self) -> Vec<(String, usize)> {
        self.inner.lock().store.tables().map(|(name, rows)| (name.clone(), rows.len())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    #[tokio::test]
    async fn test_execute_dispatch() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = Database::open(dir.path().join("database.json"));

        assert_eq!(db.execute("", &[]).await?, QueryResult::empty());
        assert_eq!(db.execute("DROP TABLE usuarios", &[]).await?, QueryResult::empty());
        assert_eq!(db.execute("SELECT * FROM usuarios WHERE a = b", &[]).await?, QueryResult::empty());
        assert!(!db.flush_pending());

        let result = db.execute("INSERT INTO stats (command) VALUES ($1);", &params!["ping"]).await?;
        assert_eq!(result.row_count, 1);
        assert!(db.flush_pending());

        assert!(matches!(
            db.execute("INSERT INTO stats VALUES ($1)", &params!["ping"]).await,
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            db.execute("DELETE FROM stats WHERE command = $1 OR 1=1", &params!["ping"]).await,
            Err(Error::Unsupported(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_do_not_flush() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = Database::open(dir.path().join("database.json"));
        db.execute("SELECT * FROM usuarios", &[]).await?;
        db.execute("CREATE TABLE IF NOT EXISTS extra (id TEXT)", &[]).await?;
        assert!(!db.flush_pending());
        assert!(db.tables().contains(&("extra".to_string(), 0)));
        Ok(())
    }

    #[tokio::test]
    async fn test_explicit_flush_absorbs_pending() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = Options { debounce: Duration::from_millis(20) };
        let db = Database::open_with(dir.path().join("database.json"), options);
        db.execute("INSERT INTO stats (command) VALUES ('a')", &[]).await?;
        assert!(db.flush_pending());

        db.flush()?;
        assert_eq!(db.flush_count(), 1);
        assert!(!db.flush_pending());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(db.flush_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_serving() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = Options { debounce: Duration::from_millis(20) };
        let db = Database::open_with(dir.path().join("missing").join("database.json"), options);
        db.execute("INSERT INTO stats (command) VALUES ('ping')", &[]).await?;
        assert!(db.flush().is_err());

        db.execute("INSERT INTO stats (command) VALUES ('pong')", &[]).await?;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(db.flush_count(), 0);
        assert!(!db.flush_pending());

        let result = db.execute("SELECT command FROM stats ORDER BY command", &[]).await?;
        assert_eq!(result.row_count, 2);
        assert_eq!(result.rows[0]["command"], Value::from("ping"));
        assert!(!dir.path().join("missing").exists());
        Ok(())
    }
}
