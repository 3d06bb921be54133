mod mutation;
mod query;
mod report;
mod schema;

use serde_derive::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::Store;
use self::mutation::{DeleteExec, InsertExec, UpdateExec};
use self::query::SelectExec;
use self::report::ReportExec;
use self::schema::{AlterTableExec, CreateTableExec, VacuumExec};

use super::parser::ast::{Projection, Statement};
use super::types::{Record, Value};

/// A statement executor.
pub trait Executor {
    /// Executes the executor, consuming it and returning a result set.
    fn execute(self: Box<Self>, store: &mut Store, params: &[Value]) -> Result<QueryResult>;
}

impl dyn Executor {
    /// Builds an executor for a parsed statement, consuming it.
    pub fn build(statement: Statement) -> Box<dyn Executor> {
        match statement {
            Statement::Vacuum => VacuumExec::new(),
            Statement::CreateTable { name } => CreateTableExec::new(name),
            Statement::AlterTable { table, column, default } => {
                AlterTableExec::new(table, column, default)
            },

            Statement::Insert { table, columns, values, on_conflict, returning } => {
                InsertExec::new(table, columns, values, on_conflict, returning)
            },
            Statement::Update { table, set, r#where, returning } => {
                UpdateExec::new(table, set, r#where, returning)
            },
            Statement::Delete { table, r#where } => DeleteExec::new(table, r#where),

            Statement::Select(select) => SelectExec::new(select),
            Statement::Report(report) => ReportExec::new(report),
        }
    }
}

/// The result of a statement: the returned rows and the number of rows affected or returned.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Record>,
    #[serde(rename = "rowCount")]
    pub row_count: usize,
}

impl QueryResult {
    /// An empty result: no rows, a row count of zero.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A result whose row count is the number of rows returned.
    pub fn from_rows(rows: Vec<Record>) -> Self {
        Self { row_count: rows.len(), rows }
    }
}

/// Applies a RETURNING projection. Missing fields project as null.
fn project(row: &Record, projection: &Projection) -> Record {
    match projection {
        Projection::All => row.clone(),
        Projection::Columns(columns) => columns
            .iter()
            .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
            .collect(),
    }
}

/// Checks whether two records hold equal values for all the given fields. Absent fields
/// count as null.
fn same_key<S: AsRef<str>>(fields: &[S], a: &Record, b: &Record) -> bool {
    fields.iter().all(|field| {
        let field = field.as_ref();
        a.get(field).unwrap_or(&Value::Null).same_as(b.get(field).unwrap_or(&Value::Null))
    })
}
