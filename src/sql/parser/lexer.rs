use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Error, Result};

// A lexer token
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(String),
    String(String),
    Identifier(String),
    Parameter(usize),
    Keyword(Keyword),
    Symbol(Symbol),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Token::Number(n) => f.write_str(n),
            Token::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Token::Identifier(s) => f.write_str(s),
            Token::Parameter(n) => write!(f, "${}", n),
            Token::Keyword(k) => f.write_str(k.to_str()),
            Token::Symbol(s) => f.write_str(s.to_str()),
        }
    }
}

impl From<Keyword> for Token {
    fn from(keyword: Keyword) -> Self {
        Self::Keyword(keyword)
    }
}

impl From<Symbol> for Token {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl Token {
    /// Checks whether the token is an identifier matching the given name, case-insensitively.
    /// Function names and type names are lexed as identifiers, not keywords.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Identifier(id) if id.eq_ignore_ascii_case(word))
    }
}

/// Lexer keywords. Only structural words are reserved, so that common column names
/// (count, level, role, timestamp, ...) remain usable as identifiers.
#[derive(Clone, Debug, PartialEq)]
pub enum Keyword {
    Add,
    Alter,
    And,
    As,
    Asc,
    By,
    Column,
    Conflict,
    Create,
    Default,
    Delete,
    Desc,
    Do,
    Exists,
    False,
    From,
    If,
    Insert,
    Into,
    Is,
    Join,
    Limit,
    Not,
    Nothing,
    Null,
    On,
    Or,
    Order,
    Returning,
    Select,
    Set,
    Table,
    True,
    Update,
    Values,
    Where,
}

impl Keyword {
    pub fn from_str(ident: &str) -> Option<Self> {
        Some(match ident.to_uppercase().as_ref() {
            "ADD" => Self::Add,
            "ALTER" => Self::Alter,
            "AND" => Self::And,
            "AS" => Self::As,
            "ASC" => Self::Asc,
            "BY" => Self::By,
            "COLUMN" => Self::Column,
            "CONFLICT" => Self::Conflict,
            "CREATE" => Self::Create,
            "DEFAULT" => Self::Default,
            "DELETE" => Self::Delete,
            "DESC" => Self::Desc,
            "DO" => Self::Do,
            "EXISTS" => Self::Exists,
            "FALSE" => Self::False,
            "FROM" => Self::From,
            "IF" => Self::If,
            "INSERT" => Self::Insert,
            "INTO" => Self::Into,
            "IS" => Self::Is,
            "JOIN" => Self::Join,
            "LIMIT" => Self::Limit,
            "NOT" => Self::Not,
            "NOTHING" => Self::Nothing,
            "NULL" => Self::Null,
            "ON" => Self::On,
            "OR" => Self::Or,
            "ORDER" => Self::Order,
            "RETURNING" => Self::Returning,
            "SELECT" => Self::Select,
            "SET" => Self::Set,
            "TABLE" => Self::Table,
            "TRUE" => Self::True,
            "UPDATE" => Self::Update,
            "VALUES" => Self::Values,
            "WHERE" => Self::Where,
            _ => return None,
        })
    }

    pub fn to_str(&self) -> &str {
        match self {
            Self::Add => "ADD",
            Self::Alter => "ALTER",
            Self::And => "AND",
            Self::As => "AS",
            Self::Asc => "ASC",
            Self::By => "BY",
            Self::Column => "COLUMN",
            Self::Conflict => "CONFLICT",
            Self::Create => "CREATE",
            Self::Default => "DEFAULT",
            Self::Delete => "DELETE",
            Self::Desc => "DESC",
            Self::Do => "DO",
            Self::Exists => "EXISTS",
            Self::False => "FALSE",
            Self::From => "FROM",
            Self::If => "IF",
            Self::Insert => "INSERT",
            Self::Into => "INTO",
            Self::Is => "IS",
            Self::Join => "JOIN",
            Self::Limit => "LIMIT",
            Self::Not => "NOT",
            Self::Nothing => "NOTHING",
            Self::Null => "NULL",
            Self::On => "ON",
            Self::Or => "OR",
            Self::Order => "ORDER",
            Self::Returning => "RETURNING",
            Self::Select => "SELECT",
            Self::Set => "SET",
            Self::Table => "TABLE",
            Self::True => "TRUE",
            Self::Update => "UPDATE",
            Self::Values => "VALUES",
            Self::Where => "WHERE",
        }
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Lexer symbols
#[derive(Clone, Debug, PartialEq)]
pub enum Symbol {
    Period,
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    LessOrGreaterThan,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Concat,
    NotEqual,
    Cast,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    Semicolon,
}

impl Symbol {
    pub fn to_str(&self) -> &str {
        match self {
            Self::Period => ".",
            Self::Equal => "=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::LessOrGreaterThan => "<>",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Asterisk => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Concat => "||",
            Self::NotEqual => "!=",
            Self::Cast => "::",
            Self::OpenParen => "(",
            Self::CloseParen => ")",
            Self::OpenBracket => "[",
            Self::CloseBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A lexer that tokenizes an input string as an iterator.
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.scan() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => self.iter.peek().map(|c| Err(Error::Parse(format!("Unexpected character {}", c)))),
            Err(err) => Some(Err(err)),
        }
    }
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer { iter: input.chars().peekable() }
    }

    /// Consumes any whitespace characters.
    fn consume_whitespace(&mut self) {
        self.next_while(|c| c.is_whitespace());
    }

    /// Grabs the next character if it matches the given predicate.
    fn next_if<F>(&mut self, predicate: F) -> Option<char>
    where
        F: Fn(char) -> bool,
    {
        self.iter.peek().filter(|&&c| predicate(c))?;
        self.iter.next()
    }

    /// Grabs the next single-character token if the tokenizer function returns one.
    fn next_if_token<F>(&mut self, tokenizer: F) -> Option<Token>
    where
        F: Fn(char) -> Option<Token>,
    {
        let token = self.iter.peek().and_then(|&c| tokenizer(c))?;
        self.iter.next();
        Some(token)
    }

    /// Grabs the next characters that match the predicate, as a string.
    fn next_while<F>(&mut self, predicate: F) -> Option<String>
    where
        F: Fn(char) -> bool,
    {
        let mut str = String::new();
        while let Some(c) = self.next_if(&predicate) {
            str.push(c);
        }
        Some(str).filter(|s| !s.is_empty())
    }

    /// Scans the input for the next token if any, ignoring leading whitespace.
    fn scan(&mut self) -> Result<Option<Token>> {
        self.consume_whitespace();
        match self.iter.peek() {
            Some('\'') => self.scan_string(),
            Some('"') => self.scan_identifier_quoted(),
            Some('$') => self.scan_parameter(),
            Some(c) if c.is_ascii_digit() => Ok(self.scan_number()),
            Some(c) if c.is_alphabetic() || *c == '_' => Ok(self.scan_word()),
            Some(_) => self.scan_symbol(),
            None => Ok(None),
        }
    }

    /// Scans the input for the next ident or keyword token, if any.
    fn scan_word(&mut self) -> Option<Token> {
        let mut name = self.next_if(|c| c.is_alphabetic() || c == '_')?.to_string();
        while let Some(c) = self.next_if(|c| c.is_alphanumeric() || c == '_') {
            name.push(c);
        }
        Keyword::from_str(&name)
            .map(Token::Keyword)
            .or_else(|| Some(Token::Identifier(name)))
    }

    /// Scans the input for the next quoted ident, if any.
    fn scan_identifier_quoted(&mut self) -> Result<Option<Token>> {
        if self.next_if(|c| c == '"').is_none() {
            return Ok(None);
        }
        let mut identifier = String::new();
        loop {
            match self.iter.next() {
                Some('"') if self.next_if(|c| c == '"').is_some() => identifier.push('"'),
                Some('"') => break,
                Some(c) => identifier.push(c),
                None => return Err(Error::Parse("Unexpected end of quoted identifier".into())),
            }
        }
        Ok(Some(Token::Identifier(identifier)))
    }

    /// Scans the input for the next positional parameter ($1, $2, ...), if any.
    fn scan_parameter(&mut self) -> Result<Option<Token>> {
        if self.next_if(|c| c == '$').is_none() {
            return Ok(None);
        }
        match self.next_while(|c| c.is_ascii_digit()) {
            Some(n) => match n.parse::<usize>()? {
                0 => Err(Error::Parse("Parameter positions start at $1".into())),
                n => Ok(Some(Token::Parameter(n))),
            },
            None => Err(Error::Parse("Expected parameter position after $".into())),
        }
    }

    /// Scans the input for the next number token, if any.
    fn scan_number(&mut self) -> Option<Token> {
        let mut number = self.next_while(|c| c.is_ascii_digit())?;
        if let Some('.') = self.next_if(|c| c == '.') {
            number.push('.');
            number.push_str(&self.next_while(|c| c.is_ascii_digit())?);
        }
        if let Some(exp) = self.next_if(|c| c == 'e' || c == 'E') {
            number.push(exp);
            if let Some(sign) = self.next_if(|c| c == '+' || c == '-') {
                number.push(sign);
            }
            number.push_str(&self.next_while(|c| c.is_ascii_digit())?);
        }
        Some(Token::Number(number))
    }

    /// Scans the input for the next string literal, if any.
    fn scan_string(&mut self) -> Result<Option<Token>> {
        if self.next_if(|c| c == '\'').is_none() {
            return Ok(None);
        }
        let mut str = String::new();
        loop {
            match self.iter.next() {
                Some('\'') if self.next_if(|c| c == '\'').is_some() => str.push('\''),
                Some('\'') => break,
                Some(c) => str.push(c),
                None => return Err(Error::Parse("Unexpected end of string literal".into())),
            }
        }
        Ok(Some(Token::String(str)))
    }

    /// Grabs the second character of a doubled symbol (!=, ||, ::), or errors.
    fn expect_char(&mut self, first: char, second: char) -> Result<()> {
        match self.next_if(|c| c == second) {
            Some(_) => Ok(()),
            None => Err(Error::Parse(format!("Unexpected character {}", first))),
        }
    }

    /// Scans the input for the next symbol token, if any, and handle any multi-symbol tokens.
    fn scan_symbol(&mut self) -> Result<Option<Token>> {
        if self.next_if(|c| c == '!').is_some() {
            self.expect_char('!', '=')?;
            return Ok(Some(Token::Symbol(Symbol::NotEqual)));
        }
        let token = self.next_if_token(|c| match c {
            '.' => Some(Token::Symbol(Symbol::Period)),
            '=' => Some(Token::Symbol(Symbol::Equal)),
            '>' => Some(Token::Symbol(Symbol::GreaterThan)),
            '<' => Some(Token::Symbol(Symbol::LessThan)),
            '+' => Some(Token::Symbol(Symbol::Plus)),
            '-' => Some(Token::Symbol(Symbol::Minus)),
            '*' => Some(Token::Symbol(Symbol::Asterisk)),
            '/' => Some(Token::Symbol(Symbol::Slash)),
            '%' => Some(Token::Symbol(Symbol::Percent)),
            '|' => Some(Token::Symbol(Symbol::Concat)),
            ':' => Some(Token::Symbol(Symbol::Cast)),
            '(' => Some(Token::Symbol(Symbol::OpenParen)),
            ')' => Some(Token::Symbol(Symbol::CloseParen)),
            '[' => Some(Token::Symbol(Symbol::OpenBracket)),
            ']' => Some(Token::Symbol(Symbol::CloseBracket)),
            ',' => Some(Token::Symbol(Symbol::Comma)),
            ';' => Some(Token::Symbol(Symbol::Semicolon)),
            _ => None,
        });
        Ok(match token {
            Some(Token::Symbol(Symbol::GreaterThan)) if self.next_if(|c| c == '=').is_some() => {
                Some(Token::Symbol(Symbol::GreaterThanOrEqual))
            },
            Some(Token::Symbol(Symbol::LessThan)) if self.next_if(|c| c == '=').is_some() => {
                Some(Token::Symbol(Symbol::LessThanOrEqual))
            },
            Some(Token::Symbol(Symbol::LessThan)) if self.next_if(|c| c == '>').is_some() => {
                Some(Token::Symbol(Symbol::LessOrGreaterThan))
            },
            Some(Token::Symbol(Symbol::Concat)) => {
                self.expect_char('|', '|')?;
                Some(Token::Symbol(Symbol::Concat))
            },
            Some(Token::Symbol(Symbol::Cast)) => {
                self.expect_char(':', ':')?;
                Some(Token::Symbol(Symbol::Cast))
            },
            token => token,
        })
    }
}
