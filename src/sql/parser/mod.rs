pub mod ast;
mod lexer;

use lazy_static::lazy_static;
use regex::Regex;

pub use lexer::{Keyword, Lexer, Symbol, Token};

use crate::error::{Error, Result};
use self::ast::StatementKind;

/// An SQL parser
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given string input.
    pub fn new(query: &'a str) -> Parser<'a> {
        Parser { input: query, tokens: Vec::new(), position: 0 }
    }

    /// Parses an SQL query.
    pub fn parse(&mut self) -> Result<ast::Statement> {
        if let Some(report) = self.sniff_report() {
            return Ok(ast::Statement::Report(report));
        }
        self.tokens = Lexer::new(self.input).collect::<Result<_>>()?;
        self.position = 0;
        let statement = self.parse_statement()?;
        self.next_if_token(Symbol::Semicolon.into());
        self.next_expect(None)?;
        Ok(statement)
    }

    /// Grabs the next lexer token, or throws an error if none is found.
    fn next(&mut self) -> Result<Token> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| Error::Parse("Unexpected end of input".into()))?;
        self.position += 1;
        Ok(token)
    }

    /// Grabs the next lexer token, and returns it if it was expected or otherwise throws an error.
    fn next_expect(&mut self, expected: Option<Token>) -> Result<Option<Token>> {
        match expected {
            Some(token) => {
                let actual = self.next()?;
                if actual == token {
                    Ok(Some(token))
                } else {
                    Err(Error::Parse(format!("Expected token {}, found {}", token, actual)))
                }
            },
            None => {
                if let Some(token) = self.peek() {
                    Err(Error::Parse(format!("Expected end of tokens, found {}", token)))
                } else {
                    Ok(None)
                }
            },
        }
    }

    /// Grabs the next identifier, or errors if not found.
    fn next_identifier(&mut self) -> Result<String> {
        match self.next()? {
            Token::Identifier(identifier) => Ok(identifier),
            token => Err(Error::Parse(format!("Expected identifier, found {}", token))),
        }
    }

    /// Grabs the next field name, stripping a leading table qualifier (`table.field`).
    fn next_field(&mut self) -> Result<String> {
        let mut field = self.next_identifier()?;
        while self.next_if_token(Symbol::Period.into()).is_some() {
            field = self.next_identifier()?;
        }
        Ok(field)
    }

    /// Grabs the next lexer token if it satisfies the predicate function.
    fn next_if<F>(&mut self, predicate: F) -> Option<Token>
    where
        F: Fn(&Token) -> bool,
    {
        let token = self.peek().filter(|token| predicate(token))?.clone();
        self.position += 1;
        Some(token)
    }

    /// Grabs the next operator if it satisfies the type and precedence.
    fn next_if_operator<O: Operator>(&mut self, min_prec: u8) -> Result<Option<O>> {
        if let Some(op) = self
            .peek()
            .and_then(|token| O::from(token))
            .filter(|op| op.precedence() >= min_prec)
        {
            self.next()?;
            Ok(Some(op.augment(self)?))
        } else {
            Ok(None)
        }
    }

    /// Grabs the next lexer token if it is a given token.
    fn next_if_token(&mut self, token: Token) -> Option<Token> {
        self.next_if(|t| *t == token)
    }

    /// Grabs the next lexer token if it is the given (unreserved) word.
    fn next_if_word(&mut self, word: &str) -> Option<Token> {
        self.next_if(|t| t.is_word(word))
    }

    /// Peeks the next lexer token if any.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Peeks the lexer token `offset` positions ahead of the next one.
    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    /// Recognizes the fixed report queries by their text. These use catalog functions and
    /// join syntax the grammar does not cover, so they are matched before tokenizing.
    fn sniff_report(&self) -> Option<ast::Report> {
        lazy_static! {
            static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
            static ref RE_SIZE_PRETTY: Regex = Regex::new(r"(?i)pg_size_pretty").unwrap();
            static ref RE_SIZE_SUM: Regex = Regex::new(r"(?i)SUM\(pg_total_relation_size").unwrap();
            static ref RE_COUNT_INT: Regex = Regex::new(r"(?i)count\(\*\)::int").unwrap();
            static ref RE_FROM: Regex = Regex::new(r"(?i)FROM\s+(\w+)").unwrap();
        }

        if StatementKind::classify(self.input.trim()) != StatementKind::Select {
            return None;
        }
        let normalized = RE_WHITESPACE.replace_all(self.input.trim(), " ");
        let lower = normalized.to_lowercase();

        if lower.contains("pg_stat_user_tables") {
            Some(ast::Report::TableSizes)
        } else if RE_SIZE_PRETTY.is_match(&normalized) {
            Some(ast::Report::DatabaseSize { summed: RE_SIZE_SUM.is_match(&normalized) })
        } else if RE_COUNT_INT.is_match(&normalized) && normalized.contains("FILTER") {
            RE_FROM
                .captures(&normalized)
                .map(|c| ast::Report::RegistrationFunnel { table: c[1].to_string() })
        } else if lower.contains("from chat_memory") && lower.contains("join group_settings") {
            Some(ast::Report::ChatMemoryTtl)
        } else {
            None
        }
    }

    /// Parses an SQL statement.
    fn parse_statement(&mut self) -> Result<ast::Statement> {
        match self.peek().cloned() {
            Some(token) if token.is_word("VACUUM") => self.parse_statement_vacuum(),

            Some(Token::Keyword(Keyword::Create)) => self.parse_ddl_create_table(),
            Some(Token::Keyword(Keyword::Alter)) => self.parse_ddl_alter_table(),

            Some(Token::Keyword(Keyword::Insert)) => self.parse_statement_insert(),
            Some(Token::Keyword(Keyword::Select)) => self.parse_statement_select(),
            Some(Token::Keyword(Keyword::Update)) => self.parse_statement_update(),
            Some(Token::Keyword(Keyword::Delete)) => self.parse_statement_delete(),

            Some(token) => Err(Error::Parse(format!("Unexpected token {}", token))),
            None => Err(Error::Parse("Unexpected end of input".into())),
        }
    }

    /// Parses a VACUUM FULL statement.
    fn parse_statement_vacuum(&mut self) -> Result<ast::Statement> {
        self.next()?;
        match self.next_if_word("FULL") {
            Some(_) => Ok(ast::Statement::Vacuum),
            None => Err(Error::Parse("Expected FULL after VACUUM".into())),
        }
    }

    /// Parses a CREATE TABLE IF NOT EXISTS statement. Column definitions are not recorded,
    /// so everything after the table name is skipped.
    fn parse_ddl_create_table(&mut self) -> Result<ast::Statement> {
        self.next_expect(Some(Keyword::Create.into()))?;
        self.next_expect(Some(Keyword::Table.into()))?;
        self.next_expect(Some(Keyword::If.into()))?;
        self.next_expect(Some(Keyword::Not.into()))?;
        self.next_expect(Some(Keyword::Exists.into()))?;
        let name = self.next_identifier()?;
        self.position = self.tokens.len();
        Ok(ast::Statement::CreateTable { name })
    }

    /// Parses an ALTER TABLE ... ADD COLUMN IF NOT EXISTS statement. The column type is
    /// skipped; the value after DEFAULT (if any) becomes the seeded default.
    fn parse_ddl_alter_table(&mut self) -> Result<ast::Statement> {
        self.next_expect(Some(Keyword::Alter.into()))?;
        self.next_expect(Some(Keyword::Table.into()))?;
        let table = self.next_identifier()?;
        self.next_expect(Some(Keyword::Add.into()))?;
        self.next_expect(Some(Keyword::Column.into()))?;
        self.next_expect(Some(Keyword::If.into()))?;
        self.next_expect(Some(Keyword::Not.into()))?;
        self.next_expect(Some(Keyword::Exists.into()))?;
        let column = self.next_identifier()?;

        while self.peek().map_or(false, |t| *t != Keyword::Default.into()) {
            self.next()?;
        }
        let default = match self.next_if_token(Keyword::Default.into()) {
            Some(_) => self.parse_value(|t| *t == Symbol::Semicolon.into())?,
            None => ast::Literal::Null.into(),
        };
        Ok(ast::Statement::AlterTable { table, column, default })
    }

    /// Parses an INSERT statement.
    fn parse_statement_insert(&mut self) -> Result<ast::Statement> {
        self.next_expect(Some(Keyword::Insert.into()))?;
        self.next_expect(Some(Keyword::Into.into()))?;
        let table = self.next_identifier()?;

        self.next_expect(Some(Symbol::OpenParen.into()))?;
        let columns = self.parse_column_list()?;

        self.next_expect(Some(Keyword::Values.into()))?;
        self.next_expect(Some(Symbol::OpenParen.into()))?;
        let mut values = vec![];
        loop {
            values.push(self.parse_value(|t| {
                *t == Symbol::Comma.into() || *t == Symbol::CloseParen.into()
            })?);
            match self.next()? {
                Token::Symbol(Symbol::CloseParen) => break,
                Token::Symbol(Symbol::Comma) => continue,
                token => return Err(Error::Parse(format!("Unexpected token {}", token))),
            }
        }

        let on_conflict = match self.next_if_token(Keyword::On.into()) {
            Some(_) => Some(self.parse_clause_on_conflict()?),
            None => None,
        };
        let returning = self.parse_clause_returning()?;

        Ok(ast::Statement::Insert { table, columns, values, on_conflict, returning })
    }

    /// Parses a parenthesized column list, after the opening parenthesis.
    fn parse_column_list(&mut self) -> Result<Vec<String>> {
        let mut columns = vec![];
        loop {
            columns.push(self.next_field()?);
            match self.next()? {
                Token::Symbol(Symbol::CloseParen) => break,
                Token::Symbol(Symbol::Comma) => continue,
                token => return Err(Error::Parse(format!("Unexpected token {}", token))),
            }
        }
        Ok(columns)
    }

    /// Parses an ON CONFLICT clause. The ON keyword has already been consumed.
    fn parse_clause_on_conflict(&mut self) -> Result<ast::OnConflict> {
        self.next_expect(Some(Keyword::Conflict.into()))?;
        let target = match self.next_if_token(Symbol::OpenParen.into()) {
            Some(_) => Some(self.parse_column_list()?),
            None => None,
        };
        self.next_expect(Some(Keyword::Do.into()))?;
        let action = match self.next()? {
            Token::Keyword(Keyword::Nothing) => ast::ConflictAction::Nothing,
            Token::Keyword(Keyword::Update) => {
                self.next_expect(Some(Keyword::Set.into()))?;
                ast::ConflictAction::Update(self.parse_assignments()?)
            },
            token => return Err(Error::Parse(format!("Expected NOTHING or UPDATE, found {}", token))),
        };
        Ok(ast::OnConflict { target, action })
    }

    /// Parses a RETURNING clause, if any.
    fn parse_clause_returning(&mut self) -> Result<Option<ast::Projection>> {
        if self.next_if_token(Keyword::Returning.into()).is_none() {
            return Ok(None);
        }
        if self.next_if_token(Symbol::Asterisk.into()).is_some() {
            return Ok(Some(ast::Projection::All));
        }
        let mut columns = vec![self.next_field()?];
        while self.next_if_token(Symbol::Comma.into()).is_some() {
            columns.push(self.next_field()?);
        }
        Ok(Some(ast::Projection::Columns(columns)))
    }

    /// Parses a comma-separated list of `field = expression` assignments.
    fn parse_assignments(&mut self) -> Result<Vec<(String, ast::Expression)>> {
        let mut set = vec![];
        loop {
            let column = self.next_field()?;
            self.next_expect(Some(Symbol::Equal.into()))?;
            let expression = self.parse_value(|t| {
                matches!(
                    t,
                    Token::Symbol(Symbol::Comma | Symbol::Semicolon)
                        | Token::Keyword(Keyword::Where | Keyword::Returning)
                )
            })?;
            set.push((column, expression));
            if self.next_if_token(Symbol::Comma.into()).is_none() {
                break;
            }
        }
        Ok(set)
    }

    /// Parses a SELECT statement.
    fn parse_statement_select(&mut self) -> Result<ast::Statement> {
        self.next_expect(Some(Keyword::Select.into()))?;

        let mut items = vec![];
        let mut filtered = false;
        loop {
            let (item, has_filter) = self.parse_select_item()?;
            filtered |= has_filter;
            items.push(item);
            if self.next_if_token(Symbol::Comma.into()).is_none() {
                break;
            }
        }

        self.next_expect(Some(Keyword::From.into()))?;
        let from = self.next_identifier()?;
        let r#where = self.parse_clause_where()?;

        let mut order_by = vec![];
        if self.next_if_token(Keyword::Order.into()).is_some() {
            self.next_expect(Some(Keyword::By.into()))?;
            loop {
                let field = self.next_field()?;
                let direction = match self.next_if(|t| {
                    *t == Keyword::Asc.into() || *t == Keyword::Desc.into()
                }) {
                    Some(Token::Keyword(Keyword::Desc)) => ast::Direction::Descending,
                    _ => ast::Direction::Ascending,
                };
                order_by.push((field, direction));
                if self.next_if_token(Symbol::Comma.into()).is_none() {
                    break;
                }
            }
        }

        let limit = match self.next_if_token(Keyword::Limit.into()) {
            Some(_) => match self.next()? {
                Token::Number(n) => Some(n.parse::<usize>()?),
                token => return Err(Error::Parse(format!("Expected LIMIT count, found {}", token))),
            },
            None => None,
        };

        Ok(ast::Statement::Select(ast::Select { items, from, r#where, order_by, limit, filtered }))
    }

    /// Parses a SELECT projection item, returning whether it carried a FILTER clause.
    fn parse_select_item(&mut self) -> Result<(ast::SelectItem, bool)> {
        if self.next_if_token(Symbol::Asterisk.into()).is_some() {
            return Ok((ast::SelectItem::All, false));
        }
        let is_call = self.peek_at(1) == Some(&Symbol::OpenParen.into());
        let item = match self.peek().cloned() {
            Some(token) if is_call && token.is_word("COUNT") => {
                self.position += 2;
                self.next_expect(Some(Symbol::Asterisk.into()))?;
                self.next_expect(Some(Symbol::CloseParen.into()))?;
                ast::SelectItem::Count { alias: None }
            },
            Some(token) if is_call && token.is_word("SUM") => {
                self.position += 2;
                let field = self.next_field()?;
                self.next_expect(Some(Symbol::CloseParen.into()))?;
                ast::SelectItem::Sum { field, alias: None }
            },
            _ => ast::SelectItem::Field { name: self.next_field()?, alias: None },
        };
        self.parse_cast()?;

        let mut filtered = false;
        if item.is_aggregate() && self.next_if_word("FILTER").is_some() {
            self.next_expect(Some(Symbol::OpenParen.into()))?;
            self.parse_clause_where()?;
            self.next_expect(Some(Symbol::CloseParen.into()))?;
            filtered = true;
        }

        let alias = match self.next_if_token(Keyword::As.into()) {
            Some(_) => Some(self.next_identifier()?),
            None => None,
        };
        let item = match item {
            ast::SelectItem::Count { .. } => ast::SelectItem::Count { alias },
            ast::SelectItem::Sum { field, .. } => ast::SelectItem::Sum { field, alias },
            ast::SelectItem::Field { name, .. } => ast::SelectItem::Field { name, alias },
            ast::SelectItem::All => ast::SelectItem::All,
        };
        Ok((item, filtered))
    }

    /// Parses and discards any `::type` casts.
    fn parse_cast(&mut self) -> Result<()> {
        while self.next_if_token(Symbol::Cast.into()).is_some() {
            self.next_identifier()?;
            if self.next_if_token(Symbol::OpenBracket.into()).is_some() {
                self.next_expect(Some(Symbol::CloseBracket.into()))?;
            }
        }
        Ok(())
    }

    /// Parses an UPDATE statement.
    fn parse_statement_update(&mut self) -> Result<ast::Statement> {
        self.next_expect(Some(Keyword::Update.into()))?;
        let table = self.next_identifier()?;
        self.next_expect(Some(Keyword::Set.into()))?;
        let set = self.parse_assignments()?;
        if self.peek() != Some(&Keyword::Where.into()) {
            return Err(Error::Parse("UPDATE requires a WHERE clause".into()));
        }
        let r#where = self.parse_clause_where()?;
        let returning = self.parse_clause_returning()?;
        Ok(ast::Statement::Update { table, set, r#where, returning })
    }

    /// Parses a DELETE statement.
    fn parse_statement_delete(&mut self) -> Result<ast::Statement> {
        self.next_expect(Some(Keyword::Delete.into()))?;
        self.next_expect(Some(Keyword::From.into()))?;
        let table = self.next_identifier()?;
        if self.peek() != Some(&Keyword::Where.into()) {
            return Err(Error::Parse("DELETE requires a WHERE clause".into()));
        }
        Ok(ast::Statement::Delete { table, r#where: self.parse_clause_where()? })
    }

    /// Parses a WHERE clause into its AND-joined conjuncts.
    fn parse_clause_where(&mut self) -> Result<Vec<ast::Condition>> {
        if self.next_if_token(Keyword::Where.into()).is_none() {
            return Ok(vec![]);
        }
        let mut conditions = vec![self.parse_condition()?];
        while self.next_if_token(Keyword::And.into()).is_some() {
            conditions.push(self.parse_condition()?);
        }
        Ok(conditions)
    }

    /// Parses a single WHERE conjunct. The supported shapes are tried in order and the first
    /// match wins; anything else is a parse error.
    fn parse_condition(&mut self) -> Result<ast::Condition> {
        // 1=1
        if let Some(Token::Number(lhs)) = self.peek().cloned() {
            self.next()?;
            self.next_expect(Some(Symbol::Equal.into()))?;
            return match self.next()? {
                Token::Number(rhs) => Ok(ast::Condition::Constant(lhs.parse::<f64>()? == rhs.parse::<f64>()?)),
                token => Err(Error::Parse(format!("Unsupported WHERE condition at {}", token))),
            };
        }

        // LOWER(field) = $n
        if self.peek().map_or(false, |t| t.is_word("LOWER"))
            && self.peek_at(1) == Some(&Symbol::OpenParen.into())
        {
            self.position += 2;
            let field = self.next_field()?;
            self.next_expect(Some(Symbol::CloseParen.into()))?;
            self.next_expect(Some(Symbol::Equal.into()))?;
            return match self.next()? {
                Token::Parameter(parameter) => Ok(ast::Condition::LowerEquals { field, parameter }),
                token => Err(Error::Parse(format!("Expected parameter after LOWER(), found {}", token))),
            };
        }

        let field = self.next_field()?;

        // field IS [NOT] NULL
        if self.next_if_token(Keyword::Is.into()).is_some() {
            let negated = self.next_if_token(Keyword::Not.into()).is_some();
            self.next_expect(Some(Keyword::Null.into()))?;
            return Ok(ast::Condition::IsNull { field, negated });
        }

        let operator = match self.next()? {
            Token::Symbol(Symbol::Equal) => ast::Comparison::Equal,
            Token::Symbol(Symbol::NotEqual) | Token::Symbol(Symbol::LessOrGreaterThan) => {
                ast::Comparison::NotEqual
            },
            Token::Symbol(Symbol::GreaterThan) => ast::Comparison::GreaterThan,
            Token::Symbol(Symbol::GreaterThanOrEqual) => ast::Comparison::GreaterThanOrEqual,
            Token::Symbol(Symbol::LessThan) => ast::Comparison::LessThan,
            Token::Symbol(Symbol::LessThanOrEqual) => ast::Comparison::LessThanOrEqual,
            token => {
                return Err(Error::Parse(format!(
                    "Unsupported WHERE condition on {} at {}",
                    field, token
                )))
            },
        };

        let operand = match self.next()? {
            Token::Parameter(n) => ast::Operand::Parameter(n),
            Token::String(s) => ast::Operand::Literal(ast::Literal::String(s)),
            Token::Number(n) => ast::Operand::Literal(Self::parse_number(&n, false)?),
            Token::Symbol(Symbol::Minus) => match self.next()? {
                Token::Number(n) => ast::Operand::Literal(Self::parse_number(&n, true)?),
                token => return Err(Error::Parse(format!("Expected number, found {}", token))),
            },
            Token::Keyword(Keyword::True) => ast::Operand::Literal(ast::Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => ast::Operand::Literal(ast::Literal::Boolean(false)),
            Token::Keyword(Keyword::Null) => ast::Operand::Literal(ast::Literal::Null),
            token if token.is_word("CURRENT_TIMESTAMP") => ast::Operand::Now,
            token if token.is_word("NOW") => {
                self.next_expect(Some(Symbol::OpenParen.into()))?;
                self.next_expect(Some(Symbol::CloseParen.into()))?;
                ast::Operand::Now
            },
            token => {
                return Err(Error::Parse(format!(
                    "Unsupported WHERE operand {} for {}",
                    token, field
                )))
            },
        };
        Ok(ast::Condition::Compare { field, operator, operand })
    }

    /// Parses a value expression ending at a terminator token (or the end of input). If the
    /// tokens do not form a supported expression, they are kept verbatim as raw text.
    fn parse_value(&mut self, is_terminator: fn(&Token) -> bool) -> Result<ast::Expression> {
        let start = self.position;
        if let Ok(expression) = self.parse_expression(0) {
            if self.peek().map_or(true, is_terminator) {
                return Ok(expression);
            }
        }

        self.position = start;
        let mut depth = 0usize;
        let mut raw = vec![];
        while let Some(token) = self.peek().cloned() {
            match &token {
                Token::Symbol(Symbol::OpenParen | Symbol::OpenBracket) => depth += 1,
                Token::Symbol(Symbol::CloseParen | Symbol::CloseBracket) if depth > 0 => depth -= 1,
                t if depth == 0 && is_terminator(t) => break,
                _ => {},
            }
            raw.push(token.to_string());
            self.position += 1;
        }
        match raw.is_empty() {
            true => Err(Error::Parse("Expected expression".into())),
            false => Ok(ast::Expression::Raw(raw.join(" "))),
        }
    }

    /// Parses an expression consisting of at least one atom operated on by any
    /// number of operators, using the precedence climbing algorithm.
    fn parse_expression(&mut self, min_prec: u8) -> Result<ast::Expression> {
        let mut lhs = if let Some(prefix) = self.next_if_operator::<PrefixOperator>(min_prec)? {
            prefix.build(self.parse_expression(prefix.precedence() + prefix.associativity())?)
        } else {
            self.parse_expression_atom()?
        };
        while let Some(postfix) = self.next_if_operator::<PostfixOperator>(min_prec)? {
            lhs = postfix.build(lhs)
        }
        while let Some(infix) = self.next_if_operator::<InfixOperator>(min_prec)? {
            lhs = infix.build(lhs, self.parse_expression(infix.precedence() + infix.associativity())?)
        }
        Ok(lhs)
    }

    /// Parses an expression atom
    fn parse_expression_atom(&mut self) -> Result<ast::Expression> {
        Ok(match self.next()? {
            Token::Identifier(id) if id.eq_ignore_ascii_case("ARRAY") => {
                self.next_expect(Some(Symbol::OpenBracket.into()))?;
                ast::Expression::Array(self.parse_expression_list(Symbol::CloseBracket)?)
            },
            Token::Identifier(id) if id.eq_ignore_ascii_case("CURRENT_TIMESTAMP") => ast::Expression::Now,
            Token::Identifier(id) => {
                if self.next_if_token(Symbol::OpenParen.into()).is_some() {
                    let args = self.parse_expression_list(Symbol::CloseParen)?;
                    match id.to_uppercase().as_str() {
                        "NOW" if args.is_empty() => ast::Expression::Now,
                        "COALESCE" => ast::Expression::Function(ast::Function::Coalesce, args),
                        "GREATEST" => ast::Expression::Function(ast::Function::Greatest, args),
                        _ => return Err(Error::Parse(format!("Unknown function {}", id))),
                    }
                } else {
                    let mut field = id;
                    while self.next_if_token(Symbol::Period.into()).is_some() {
                        field = self.next_identifier()?;
                    }
                    ast::Expression::Field(field)
                }
            },
            Token::Parameter(n) => ast::Expression::Parameter(n),
            Token::Number(n) => Self::parse_number(&n, false)?.into(),
            Token::Symbol(Symbol::OpenParen) => {
                let expr = self.parse_expression(0)?;
                self.next_expect(Some(Symbol::CloseParen.into()))?;
                expr
            },
            Token::String(s) => ast::Literal::String(s).into(),
            Token::Keyword(Keyword::False) => ast::Literal::Boolean(false).into(),
            Token::Keyword(Keyword::Null) => ast::Literal::Null.into(),
            Token::Keyword(Keyword::True) => ast::Literal::Boolean(true).into(),
            t => return Err(Error::Parse(format!("Expected expression atom, found {}", t))),
        })
    }

    /// Parses a comma-separated expression list up to and including the closing symbol.
    fn parse_expression_list(&mut self, close: Symbol) -> Result<Vec<ast::Expression>> {
        let mut expressions = vec![];
        while self.next_if_token(close.clone().into()).is_none() {
            if !expressions.is_empty() {
                self.next_expect(Some(Symbol::Comma.into()))?;
            }
            expressions.push(self.parse_expression(0)?);
        }
        Ok(expressions)
    }

    /// Parses a numeric literal, as an integer when it has no fraction or exponent.
    fn parse_number(n: &str, negative: bool) -> Result<ast::Literal> {
        let sign = if negative { "-" } else { "" };
        if n.chars().all(|c| c.is_ascii_digit()) {
            Ok(ast::Literal::Integer(format!("{}{}", sign, n).parse()?))
        } else {
            Ok(ast::Literal::Float(format!("{}{}", sign, n).parse()?))
        }
    }
}

/// An operator trait, to help with parsing of operators
trait Operator: Sized {
    /// Looks up the corresponding operator for a token, if one exists
    fn from(token: &Token) -> Option<Self>;
    /// Augments an operator by allowing it to parse any modifiers.
    fn augment(self, parser: &mut Parser) -> Result<Self>;
    /// Returns the operator's associativity
    fn associativity(&self) -> u8;
    /// Returns the operator's precedence
    fn precedence(&self) -> u8;
}

const ASSOC_LEFT: u8 = 1;
const ASSOC_RIGHT: u8 = 0;

/// Prefix operators
enum PrefixOperator {
    Minus,
    Plus,
}

impl PrefixOperator {
    fn build(&self, rhs: ast::Expression) -> ast::Expression {
        match (self, rhs) {
            (Self::Minus, ast::Expression::Literal(ast::Literal::Integer(i))) => {
                ast::Literal::Integer(-i).into()
            },
            (Self::Minus, ast::Expression::Literal(ast::Literal::Float(f))) => {
                ast::Literal::Float(-f).into()
            },
            (Self::Minus, rhs) => ast::Operation::Negate(Box::new(rhs)).into(),
            (Self::Plus, rhs) => rhs,
        }
    }
}

impl Operator for PrefixOperator {
    fn from(token: &Token) -> Option<Self> {
        match token {
            Token::Symbol(Symbol::Minus) => Some(Self::Minus),
            Token::Symbol(Symbol::Plus) => Some(Self::Plus),
            _ => None,
        }
    }

    fn augment(self, _parser: &mut Parser) -> Result<Self> {
        Ok(self)
    }

    fn associativity(&self) -> u8 {
        ASSOC_RIGHT
    }

    fn precedence(&self) -> u8 {
        9
    }
}

enum InfixOperator {
    Add,
    Subtract,
}

impl InfixOperator {
    fn build(&self, lhs: ast::Expression, rhs: ast::Expression) -> ast::Expression {
        let (lhs, rhs) = (Box::new(lhs), Box::new(rhs));
        match self {
            Self::Add => ast::Operation::Add(lhs, rhs),
            Self::Subtract => ast::Operation::Subtract(lhs, rhs),
        }
        .into()
    }
}

impl Operator for InfixOperator {
    fn from(token: &Token) -> Option<Self> {
        Some(match token {
            Token::Symbol(Symbol::Minus) => Self::Subtract,
            Token::Symbol(Symbol::Plus) => Self::Add,
            _ => return None,
        })
    }

    fn augment(self, _parser: &mut Parser) -> Result<Self> {
        Ok(self)
    }

    fn associativity(&self) -> u8 {
        ASSOC_LEFT
    }

    fn precedence(&self) -> u8 {
        5
    }
}

/// Postfix operators. Casts are accepted for compatibility and do not change the value.
enum PostfixOperator {
    Cast,
}

impl PostfixOperator {
    fn build(&self, lhs: ast::Expression) -> ast::Expression {
        match self {
            Self::Cast => lhs,
        }
    }
}

impl Operator for PostfixOperator {
    fn from(token: &Token) -> Option<Self> {
        match token {
            Token::Symbol(Symbol::Cast) => Some(Self::Cast),
            _ => None,
        }
    }

    fn augment(self, parser: &mut Parser) -> Result<Self> {
        parser.next_identifier()?;
        if parser.next_if_token(Symbol::OpenBracket.into()).is_some() {
            parser.next_expect(Some(Symbol::CloseBracket.into()))?;
        }
        Ok(self)
    }

    fn associativity(&self) -> u8 {
        ASSOC_LEFT
    }

    fn precedence(&self) -> u8 {
        8
    }
}
