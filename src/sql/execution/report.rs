use super::{Executor, QueryResult};
use crate::error::Result;
use crate::sql::parser::ast::Report;
use crate::sql::schema;
use crate::sql::types::{Record, Value};
use crate::storage::Store;

/// The memory TTL of chats whose group has no setting.
const DEFAULT_MEMORY_TTL: i64 = 86400;

/// Answers the fixed diagnostic and report queries.
pub struct ReportExec {
    report: Report,
}

impl ReportExec {
    pub fn new(report: Report) -> Box<Self> {
        Box::new(Self { report })
    }
}

impl Executor for ReportExec {
    fn execute(self: Box<Self>, store: &mut Store, _params: &[Value]) -> Result<QueryResult> {
        let rows = match self.report {
            Report::TableSizes => table_sizes(store)?,
            Report::DatabaseSize { summed } => {
                let key = if summed { "total" } else { "pg_size_pretty" };
                vec![Record::from([(key.to_string(), Value::Text(human_size(store.file_size())))])]
            },
            Report::RegistrationFunnel { table } => {
                let rows = store.table(&table).map(Vec::as_slice).unwrap_or_default();
                let registered = rows
                    .iter()
                    .filter(|row| row.get("registered") == Some(&Value::Boolean(true)))
                    .count();
                vec![Record::from([
                    ("total".to_string(), Value::Integer(rows.len() as i64)),
                    ("registrados".to_string(), Value::Integer(registered as i64)),
                ])]
            },
            Report::ChatMemoryTtl => chat_memory_ttl(store),
        };
        Ok(QueryResult::from_rows(rows))
    }
}

/// Row counts and approximate serialized sizes of the known tables, largest first.
fn table_sizes(store: &Store) -> Result<Vec<Record>> {
    let mut entries = Vec::new();
    for table in schema::tables() {
        if let Some(rows) = store.table(table.name) {
            let bytes = serde_json::to_string(rows)?.len() as u64;
            entries.push((bytes, table.name, rows.len()));
        }
    }
    entries.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(entries
        .into_iter()
        .map(|(bytes, name, count)| {
            Record::from([
                ("tabla".to_string(), Value::from(name)),
                ("filas".to_string(), Value::Integer(count as i64)),
                ("tamaño".to_string(), Value::Text(human_size(bytes))),
            ])
        })
        .collect())
}

/// Chat memories with the memory TTL of their group, dropping chats whose TTL disables memory.
fn chat_memory_ttl(store: &Store) -> Vec<Record> {
    let groups = store.table("group_settings").map(Vec::as_slice).unwrap_or_default();
    let memories = store.table("chat_memory").map(Vec::as_slice).unwrap_or_default();
    memories
        .iter()
        .filter_map(|memory| {
            let chat_id = memory.get("chat_id").cloned().unwrap_or(Value::Null);
            let ttl = groups
                .iter()
                .find(|group| group.get("group_id").map_or(false, |id| id.same_as(&chat_id)))
                .and_then(|group| group.get("memory_ttl"))
                .filter(|ttl| !ttl.is_null())
                .cloned()
                .unwrap_or(Value::Integer(DEFAULT_MEMORY_TTL));
            if !(ttl.number() > 0.0) {
                return None;
            }
            Some(Record::from([
                ("chat_id".to_string(), chat_id),
                ("updated_at".to_string(), memory.get("updated_at").cloned().unwrap_or(Value::Null)),
                ("memory_ttl".to_string(), ttl),
            ]))
        })
        .collect()
}

/// Formats a byte count with two decimals in B, KB, MB or GB (base 1024).
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
