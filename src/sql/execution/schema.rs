use log::debug;

use super::{Executor, QueryResult};
use crate::error::Result;
use crate::sql::parser::ast::Expression;
use crate::sql::types::Value;
use crate::storage::Store;

/// A VACUUM FULL executor. It changes nothing; the engine flushes after it like any mutation.
pub struct VacuumExec;

impl VacuumExec {
    pub fn new() -> Box<Self> {
        Box::new(Self)
    }
}

impl Executor for VacuumExec {
    fn execute(self: Box<Self>, _store: &mut Store, _params: &[Value]) -> Result<QueryResult> {
        Ok(QueryResult::empty())
    }
}

/// A CREATE TABLE executor. Tables carry no schema, so this only makes sure the table exists.
pub struct CreateTableExec {
    table: String,
}

impl CreateTableExec {
    pub fn new(table: String) -> Box<Self> {
        Box::new(Self { table })
    }
}

impl Executor for CreateTableExec {
    fn execute(self: Box<Self>, store: &mut Store, _params: &[Value]) -> Result<QueryResult> {
        store.ensure_table(&self.table);
        Ok(QueryResult::empty())
    }
}

/// An ALTER TABLE ADD COLUMN executor: seeds the default on every record lacking the field.
pub struct AlterTableExec {
    table: String,
    column: String,
    default: Expression,
}

impl AlterTableExec {
    pub fn new(table: String, column: String, default: Expression) -> Box<Self> {
        Box::new(Self { table, column, default })
    }
}

impl Executor for AlterTableExec {
    fn execute(self: Box<Self>, store: &mut Store, params: &[Value]) -> Result<QueryResult> {
        let default = self.default.evaluate(None, params)?;
        let mut seeded = 0;
        for row in store.table_mut(&self.table).iter_mut() {
            if !row.contains_key(&self.column) {
                row.insert(self.column.clone(), default.clone());
                seeded += 1;
            }
        }
        debug!("Seeded {}.{} on {} records", self.table, self.column, seeded);
        Ok(QueryResult::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::record;
    use super::*;
    use crate::sql::parser::ast::Literal;

    #[test]
    fn test_create_and_alter() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = Store::load(dir.path().join("database.json"));
        CreateTableExec::new("custom".into()).execute(&mut store, &[])?;
        assert_eq!(store.table("custom").map(Vec::len), Some(0));

        let rows = store.table_mut("custom");
        rows.push(record(vec![("id", 1.into())]));
        rows.push(record(vec![("id", 2.into()), ("mode", "private".into())]));

        let default = Expression::Array(vec![Literal::String("/".into()).into()]);
        AlterTableExec::new("custom".into(), "prefix".into(), default).execute(&mut store, &[])?;
        AlterTableExec::new("custom".into(), "mode".into(), Literal::String("public".into()).into())
            .execute(&mut store, &[])?;

        assert_eq!(
            store.table("custom"),
            Some(&vec![
                record(vec![("id", 1.into()), ("prefix", vec!["/"].into()), ("mode", "public".into())]),
                record(vec![("id", 2.into()), ("prefix", vec!["/"].into()), ("mode", "private".into())]),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_vacuum_is_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = Store::load(dir.path().join("database.json"));
        assert_eq!(VacuumExec::new().execute(&mut store, &[])?, QueryResult::empty());
        Ok(())
    }
}
