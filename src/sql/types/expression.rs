use super::{Record, Value};
use crate::error::{Error, Result};
use crate::sql::parser::ast::{Expression, Function, Literal, Operation};

impl Literal {
    /// Converts the literal into a value.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) => Value::Text(s.clone()),
        }
    }
}

impl Expression {
    /// Evaluates the expression against a record and positional parameters. Without a record
    /// (INSERT values, ALTER defaults) a bare field name resolves to its own text.
    pub fn evaluate(&self, row: Option<&Record>, params: &[Value]) -> Result<Value> {
        Ok(match self {
            Self::Parameter(n) => parameter(params, *n),
            Self::Literal(literal) => literal.to_value(),
            Self::Now => Value::now(),
            Self::Raw(text) => Value::Text(text.clone()),
            Self::Array(items) => {
                Value::List(items.iter().map(|e| e.evaluate(row, params)).collect::<Result<_>>()?)
            },
            Self::Field(name) => match row {
                Some(row) => row.get(name).cloned().unwrap_or(Value::Null),
                None => Value::Text(name.clone()),
            },

            Self::Function(Function::Coalesce, args) => {
                for arg in args {
                    let value = arg.evaluate(row, params)?;
                    if !value.is_null() {
                        return Ok(value);
                    }
                }
                Value::Null
            },
            Self::Function(Function::Greatest, args) => {
                let mut greatest: Option<Value> = None;
                for arg in args {
                    let value = arg.evaluate(row, params)?;
                    let n = numeric(&value, "GREATEST")?;
                    if greatest.as_ref().map_or(true, |g| n > g.number()) {
                        greatest = Some(match value {
                            Value::Null => Value::Integer(0),
                            Value::Text(_) => Value::from_number(n),
                            value => value,
                        });
                    }
                }
                greatest.unwrap_or(Value::Null)
            },

            Self::Operation(Operation::Add(lhs, rhs)) => {
                let lhs = lhs.evaluate(row, params)?;
                let rhs = rhs.evaluate(row, params)?;
                match (&lhs, &rhs) {
                    (Value::Integer(a), Value::Integer(b)) => match a.checked_add(*b) {
                        Some(sum) => Value::Integer(sum),
                        None => return Err(Error::Value("Integer overflow".into())),
                    },
                    _ => Value::from_number(numeric(&lhs, "add")? + numeric(&rhs, "add")?),
                }
            },
            Self::Operation(Operation::Subtract(lhs, rhs)) => {
                let lhs = lhs.evaluate(row, params)?;
                let rhs = rhs.evaluate(row, params)?;
                match (&lhs, &rhs) {
                    (Value::Integer(a), Value::Integer(b)) => match a.checked_sub(*b) {
                        Some(diff) => Value::Integer(diff),
                        None => return Err(Error::Value("Integer overflow".into())),
                    },
                    _ => Value::from_number(numeric(&lhs, "subtract")? - numeric(&rhs, "subtract")?),
                }
            },
            Self::Operation(Operation::Negate(expr)) => match expr.evaluate(row, params)? {
                Value::Integer(i) => match i.checked_neg() {
                    Some(i) => Value::Integer(i),
                    None => return Err(Error::Value("Integer overflow".into())),
                },
                value => Value::from_number(-numeric(&value, "negate")?),
            },
        })
    }
}

/// Looks up a 1-based positional parameter. Positions past the supplied list are null.
pub fn parameter(params: &[Value], n: usize) -> Value {
    n.checked_sub(1).and_then(|i| params.get(i)).cloned().unwrap_or(Value::Null)
}

/// Reads an arithmetic operand. Null counts as 0 and numeric text is accepted; anything
/// else is a type error.
fn numeric(value: &Value, op: &str) -> Result<f64> {
    match value {
        Value::Null => Ok(0.0),
        Value::Integer(_) | Value::Float(_) => Ok(value.number()),
        Value::Text(_) | Value::Timestamp(_) => match value.number() {
            n if n.is_nan() => Err(Error::Value(format!("Can't {} non-numeric value {}", op, value))),
            n => Ok(n),
        },
        value => Err(Error::Value(format!("Can't {} {}", op, value))),
    }
}
