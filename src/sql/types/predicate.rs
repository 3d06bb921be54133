use chrono::Utc;

use super::expression::parameter;
use super::{Record, Value};
use crate::sql::parser::ast::{Comparison, Condition, Operand};

/// A compiled WHERE clause: the conjunction of its conditions, with parameters bound.
#[derive(Clone, Debug, Default)]
pub struct Predicate {
    tests: Vec<Test>,
}

#[derive(Clone, Debug)]
enum Test {
    Constant(bool),
    LowerEquals { field: String, value: String },
    IsNull { field: String, negated: bool },
    Compare { field: String, operator: Comparison, operand: Bound },
}

#[derive(Clone, Debug)]
enum Bound {
    Value(Value),
    /// Resolved to the current time on every evaluation.
    Now,
}

impl Predicate {
    /// Compiles parsed conditions against the statement parameters. No conditions match all rows.
    pub fn compile(conditions: &[Condition], params: &[Value]) -> Self {
        let tests = conditions
            .iter()
            .map(|condition| match condition {
                Condition::Constant(b) => Test::Constant(*b),
                Condition::LowerEquals { field, parameter: n } => Test::LowerEquals {
                    field: field.clone(),
                    value: match parameter(params, *n) {
                        Value::Null => String::new(),
                        value => value.to_string().to_lowercase(),
                    },
                },
                Condition::IsNull { field, negated } => {
                    Test::IsNull { field: field.clone(), negated: *negated }
                },
                Condition::Compare { field, operator, operand } => Test::Compare {
                    field: field.clone(),
                    operator: *operator,
                    operand: match operand {
                        Operand::Parameter(n) => Bound::Value(parameter(params, *n)),
                        Operand::Literal(literal) => Bound::Value(literal.to_value()),
                        Operand::Now => Bound::Now,
                    },
                },
            })
            .collect();
        Predicate { tests }
    }

    /// Checks whether a record satisfies every condition.
    pub fn matches(&self, row: &Record) -> bool {
        self.tests.iter().all(|test| match test {
            Test::Constant(b) => *b,
            Test::LowerEquals { field, value } => {
                let actual = row.get(field).and_then(Value::as_str).unwrap_or("");
                actual.to_lowercase().trim() == value
            },
            Test::IsNull { field, negated } => {
                row.get(field).map_or(true, Value::is_null) != *negated
            },
            Test::Compare { field, operator, operand } => {
                let actual = row.get(field).unwrap_or(&Value::Null);
                match operand {
                    Bound::Value(expected) => compare(actual, expected, *operator),
                    Bound::Now => {
                        let now = Value::Integer(Utc::now().timestamp_millis());
                        compare(actual, &now, *operator)
                    },
                }
            },
        })
    }
}

/// Compares two values. Equality is strict; ordering compares numbers, with timestamp text
/// taken as epoch milliseconds. Incomparable values never match.
fn compare(a: &Value, b: &Value, operator: Comparison) -> bool {
    let ordinals = || (a.epoch_millis(), b.epoch_millis());
    match operator {
        Comparison::Equal => a.same_as(b),
        Comparison::NotEqual => !a.same_as(b),
        Comparison::GreaterThan => matches!(ordinals(), (a, b) if a > b),
        Comparison::GreaterThanOrEqual => matches!(ordinals(), (a, b) if a >= b),
        Comparison::LessThan => matches!(ordinals(), (a, b) if a < b),
        Comparison::LessThanOrEqual => matches!(ordinals(), (a, b) if a <= b),
    }
}
