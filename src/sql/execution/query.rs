use std::cmp::Ordering;

use super::{Executor, QueryResult};
use crate::error::Result;
use crate::sql::parser::ast::{Direction, Select, SelectItem};
use crate::sql::types::{compare_fields, Predicate, Record, Value};
use crate::storage::Store;

/// A SELECT executor: filter, then either aggregate or sort, limit and project.
pub struct SelectExec {
    select: Select,
}

impl SelectExec {
    pub fn new(select: Select) -> Box<Self> {
        Box::new(Self { select })
    }

    /// Computes one row with a field per COUNT/SUM occurrence. Unaliased occurrences are
    /// named count, count_1, ... and sum, sum_1, ...
    fn aggregate(&self, rows: &[Record]) -> Record {
        let (mut counts, mut sums) = (0, 0);
        let mut result = Record::new();
        for item in &self.select.items {
            match item {
                SelectItem::Count { alias } => {
                    let name = alias.clone().unwrap_or_else(|| occurrence("count", counts));
                    result.insert(name, Value::Integer(rows.len() as i64));
                    counts += 1;
                },
                SelectItem::Sum { field, alias } => {
                    let name = alias.clone().unwrap_or_else(|| occurrence("sum", sums));
                    let sum: f64 = rows.iter().map(|row| number_or_zero(row.get(field))).sum();
                    result.insert(name, Value::from_number(sum));
                    sums += 1;
                },
                SelectItem::All | SelectItem::Field { .. } => {},
            }
        }
        result
    }

    /// Projects a record through the select list.
    fn project(&self, row: &Record) -> Record {
        let mut projected = Record::new();
        for item in &self.select.items {
            match item {
                SelectItem::All => projected.extend(row.iter().map(|(k, v)| (k.clone(), v.clone()))),
                // Without the aggregate path, COUNT(*) and SUM() only carry per-row placeholders.
                SelectItem::Count { alias } => {
                    projected.insert(alias.clone().unwrap_or_else(|| "count".into()), Value::Integer(1));
                },
                SelectItem::Sum { field, alias } => {
                    let name = alias.clone().unwrap_or_else(|| format!("sum_{}", field));
                    projected.insert(name, Value::from_number(number_or_zero(row.get(field))));
                },
                SelectItem::Field { name, alias } => {
                    let value = row.get(name).cloned().unwrap_or(Value::Null);
                    projected.insert(alias.clone().unwrap_or_else(|| name.clone()), value);
                },
            }
        }
        projected
    }
}

impl Executor for SelectExec {
    fn execute(self: Box<Self>, store: &mut Store, params: &[Value]) -> Result<QueryResult> {
        let predicate = Predicate::compile(&self.select.r#where, params);
        let mut rows: Vec<Record> = store
            .table(&self.select.from)
            .map(|rows| rows.iter().filter(|row| predicate.matches(row)).cloned().collect())
            .unwrap_or_default();

        if !self.select.filtered && self.select.items.iter().any(SelectItem::is_aggregate) {
            return Ok(QueryResult::from_rows(vec![self.aggregate(&rows)]));
        }

        if !self.select.order_by.is_empty() {
            rows.sort_by(|a, b| {
                self.select.order_by.iter().fold(Ordering::Equal, |ordering, (field, direction)| {
                    ordering.then_with(|| {
                        let ordering = compare_fields(a.get(field), b.get(field));
                        match direction {
                            Direction::Ascending => ordering,
                            Direction::Descending => ordering.reverse(),
                        }
                    })
                })
            });
        }
        if let Some(limit) = self.select.limit {
            rows.truncate(limit);
        }

        Ok(QueryResult::from_rows(rows.iter().map(|row| self.project(row)).collect()))
    }
}

fn occurrence(name: &str, index: usize) -> String {
    match index {
        0 => name.to_string(),
        i => format!("{}_{}", name, i),
    }
}

fn number_or_zero(value: Option<&Value>) -> f64 {
    match value.map(Value::number) {
        Some(n) if !n.is_nan() => n,
        _ => 0.0,
    }
}
