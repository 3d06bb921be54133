use log::debug;

use super::{project, same_key, Executor, QueryResult};
use crate::error::{Error, Result};
use crate::sql::parser::ast::{Condition, ConflictAction, Expression, OnConflict, Projection};
use crate::sql::schema;
use crate::sql::types::{Predicate, Record, Value};
use crate::storage::Store;

/// An INSERT executor
pub struct InsertExec {
    table: String,
    columns: Vec<String>,
    values: Vec<Expression>,
    on_conflict: Option<OnConflict>,
    returning: Option<Projection>,
}

impl InsertExec {
    /// Creates a new INSERT executor.
    pub fn new(
        table: String,
        columns: Vec<String>,
        values: Vec<Expression>,
        on_conflict: Option<OnConflict>,
        returning: Option<Projection>,
    ) -> Box<Self> {
        Box::new(Self { table, columns, values, on_conflict, returning })
    }

    /// Builds the candidate record from the column and value lists, then fills in defaults
    /// and the next auto-increment id. The counter itself only moves once the record is stored.
    fn build_row(&self, store: &Store, params: &[Value]) -> Result<Record> {
        if self.columns.len() != self.values.len() {
            return Err(Error::Value(format!(
                "INSERT into {} has {} columns but {} values",
                self.table,
                self.columns.len(),
                self.values.len()
            )));
        }
        let mut row = Record::new();
        for (column, value) in self.columns.iter().zip(&self.values) {
            row.insert(column.clone(), value.evaluate(None, params)?);
        }

        if let Some(table) = schema::lookup(&self.table) {
            table.apply_defaults(&mut row);
            if let Some(field) = table.auto_id_field() {
                if row.get(field).map_or(true, Value::is_null) {
                    row.insert(field.to_string(), Value::Integer(store.auto_id(&self.table) + 1));
                }
            }
        }
        Ok(row)
    }

    /// Finds an existing record conflicting with the candidate, by the conflict target if given,
    /// otherwise by the table's primary key. Tables without a known key never conflict.
    fn find_conflict(&self, rows: &[Record], row: &Record) -> Option<usize> {
        let target = self.on_conflict.as_ref().and_then(|c| c.target.as_ref()).filter(|t| !t.is_empty());
        match (target, schema::lookup(&self.table)) {
            (Some(target), _) => rows.iter().position(|r| same_key(target.as_slice(), r, row)),
            (None, Some(table)) => rows.iter().position(|r| same_key(table.primary_key, r, row)),
            (None, None) => None,
        }
    }
}

impl Executor for InsertExec {
    fn execute(self: Box<Self>, store: &mut Store, params: &[Value]) -> Result<QueryResult> {
        let row = self.build_row(store, params)?;
        let rows = store.table_mut(&self.table);

        let result = match self.find_conflict(rows, &row) {
            Some(index) => match self.on_conflict.as_ref().map(|c| &c.action) {
                Some(ConflictAction::Update(set)) => {
                    let updated = assign(&rows[index], set, params)?;
                    debug!("Upserted record {} in {}", index, self.table);
                    rows[index] = updated.clone();
                    updated
                },
                Some(ConflictAction::Nothing) | None => rows[index].clone(),
            },
            None => {
                rows.push(row.clone());
                let id = schema::lookup(&self.table)
                    .and_then(|table| table.auto_id_field())
                    .and_then(|field| row.get(field));
                if let Some(id) = id {
                    store.observe_id(&self.table, id);
                }
                row
            },
        };

        Ok(QueryResult::from_rows(vec![match &self.returning {
            Some(projection) => project(&result, projection),
            None => result,
        }]))
    }
}

/// An UPDATE executor
pub struct UpdateExec {
    table: String,
    set: Vec<(String, Expression)>,
    r#where: Vec<Condition>,
    returning: Option<Projection>,
}

impl UpdateExec {
    pub fn new(
        table: String,
        set: Vec<(String, Expression)>,
        r#where: Vec<Condition>,
        returning: Option<Projection>,
    ) -> Box<Self> {
        Box::new(Self { table, set, r#where, returning })
    }
}

impl Executor for UpdateExec {
    fn execute(self: Box<Self>, store: &mut Store, params: &[Value]) -> Result<QueryResult> {
        let predicate = Predicate::compile(&self.r#where, params);
        let mut updated = Vec::new();
        if let Some(rows) = store.table(&self.table) {
            // Evaluate every assignment before touching the table, so a failing
            // expression leaves it unchanged.
            let mut changes = Vec::new();
            for (index, row) in rows.iter().enumerate() {
                if predicate.matches(row) {
                    changes.push((index, assign(row, &self.set, params)?));
                }
            }
            let rows = store.table_mut(&self.table);
            for (index, row) in changes {
                rows[index] = row.clone();
                updated.push(row);
            }
        }

        let row_count = updated.len();
        let rows = match &self.returning {
            Some(projection) => updated.iter().map(|row| project(row, projection)).collect(),
            None => updated,
        };
        Ok(QueryResult { rows, row_count })
    }
}

/// A DELETE executor
pub struct DeleteExec {
    table: String,
    r#where: Vec<Condition>,
}

impl DeleteExec {
    pub fn new(table: String, r#where: Vec<Condition>) -> Box<Self> {
        Box::new(Self { table, r#where })
    }
}

impl Executor for DeleteExec {
    fn execute(self: Box<Self>, store: &mut Store, params: &[Value]) -> Result<QueryResult> {
        let predicate = Predicate::compile(&self.r#where, params);
        let rows = store.table_mut(&self.table);
        let before = rows.len();
        rows.retain(|row| !predicate.matches(row));
        Ok(QueryResult { rows: Vec::new(), row_count: before - rows.len() })
    }
}

/// Applies SET assignments in order to a copy of a record. Later assignments see the
/// results of earlier ones.
fn assign(row: &Record, set: &[(String, Expression)], params: &[Value]) -> Result<Record> {
    let mut row = row.clone();
    for (column, expression) in set {
        let value = expression.evaluate(Some(&row), params)?;
        row.insert(column.clone(), value);
    }
    Ok(row)
}
