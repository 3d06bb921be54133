/// A parsed statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// VACUUM FULL, which only flushes the store.
    Vacuum,

    CreateTable {
        name: String,
    },
    AlterTable {
        table: String,
        column: String,
        default: Expression,
    },

    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<Expression>,
        on_conflict: Option<OnConflict>,
        returning: Option<Projection>,
    },
    Update {
        table: String,
        set: Vec<(String, Expression)>,
        r#where: Vec<Condition>,
        returning: Option<Projection>,
    },
    Delete {
        table: String,
        r#where: Vec<Condition>,
    },

    Select(Select),
    Report(Report),
}

impl Statement {
    /// Whether executing the statement changes the persisted state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Statement::Vacuum
                | Statement::AlterTable { .. }
                | Statement::Insert { .. }
                | Statement::Update { .. }
                | Statement::Delete { .. }
        )
    }
}

/// The statement class, determined by the leading keywords alone. Used to decide how a
/// statement that fails to parse is handled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StatementKind {
    Vacuum,
    CreateTable,
    AlterTable,
    Insert,
    Update,
    Delete,
    Select,
    Other,
}

impl StatementKind {
    /// Classifies a trimmed statement by its case-insensitive leading keywords.
    pub fn classify(sql: &str) -> Self {
        let words = sql
            .split_whitespace()
            .take(2)
            .map(|w| w.trim_end_matches(';').to_uppercase())
            .collect::<Vec<_>>();
        match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["VACUUM", "FULL"] => Self::Vacuum,
            ["CREATE", "TABLE", ..] => Self::CreateTable,
            ["ALTER", "TABLE", ..] => Self::AlterTable,
            ["INSERT", "INTO", ..] => Self::Insert,
            ["DELETE", "FROM", ..] => Self::Delete,
            [first, ..] if first.starts_with("UPDATE") => Self::Update,
            [first, ..] if first.starts_with("SELECT") => Self::Select,
            _ => Self::Other,
        }
    }

    /// Write statements that fail to parse are raised to the caller; everything else degrades
    /// to an empty result.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

/// An ON CONFLICT clause.
#[derive(Clone, Debug, PartialEq)]
pub struct OnConflict {
    /// Conflict target columns; the table's primary key when None.
    pub target: Option<Vec<String>>,
    pub action: ConflictAction,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConflictAction {
    Nothing,
    Update(Vec<(String, Expression)>),
}

/// A RETURNING projection.
#[derive(Clone, Debug, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

/// A SELECT statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    pub items: Vec<SelectItem>,
    pub from: String,
    pub r#where: Vec<Condition>,
    pub order_by: Vec<(String, Direction)>,
    pub limit: Option<usize>,
    /// Set when an aggregate carries a FILTER (WHERE ...) clause, which disables the
    /// aggregate path.
    pub filtered: bool,
}

/// A SELECT projection item.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectItem {
    All,
    Count { alias: Option<String> },
    Sum { field: String, alias: Option<String> },
    Field { name: String, alias: Option<String> },
}

impl SelectItem {
    pub fn is_aggregate(&self) -> bool {
        matches!(self, SelectItem::Count { .. } | SelectItem::Sum { .. })
    }
}

/// Sort directions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Fixed diagnostic and report queries, recognized by their text before generic parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum Report {
    /// Row counts and approximate sizes of the known tables.
    TableSizes,
    /// Size of the backing file, keyed `total` when summed, otherwise `pg_size_pretty`.
    DatabaseSize { summed: bool },
    /// Total and registered row counts of a table.
    RegistrationFunnel { table: String },
    /// Chat memory joined with the owning group's memory TTL.
    ChatMemoryTtl,
}

/// A WHERE conjunct. The variants are listed in the order the parser tries them.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// A constant comparison such as 1=1.
    Constant(bool),
    /// LOWER(field) = $n
    LowerEquals { field: String, parameter: usize },
    /// field IS [NOT] NULL
    IsNull { field: String, negated: bool },
    /// field <op> ($n | literal | NOW())
    Compare { field: String, operator: Comparison, operand: Operand },
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Comparison {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

/// The right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Parameter(usize),
    Literal(Literal),
    Now,
}

/// Expressions
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// A 1-based positional parameter.
    Parameter(usize),
    Literal(Literal),
    /// NOW() or CURRENT_TIMESTAMP
    Now,
    Array(Vec<Expression>),
    /// A field reference, with any table qualifier stripped.
    Field(String),
    Function(Function, Vec<Expression>),
    Operation(Operation),
    /// Unrecognized expression text, evaluated as a string constant.
    Raw(String),
}

impl From<Literal> for Expression {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<Operation> for Expression {
    fn from(op: Operation) -> Self {
        Self::Operation(op)
    }
}

/// Literals
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// Built-in functions
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Function {
    Coalesce,
    Greatest,
}

/// Operations (done by operators)
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Add(Box<Expression>, Box<Expression>),
    Negate(Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
}
