use serde_derive::{Deserialize, Serialize};

/// Result returning Error
pub type Result<T> = std::result::Result<T, Error>;

/// featherstore errors. All except Internal and Io are considered user-facing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Error {
    Config(String),
    Internal(String),
    Io(String),
    Parse(String),
    Serialization(String),
    Unsupported(String),
    Value(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(s) => write!(f, "Config error: {}", s),
            Error::Internal(s) => write!(f, "Internal error: {}", s),
            Error::Io(s) => write!(f, "IO error: {}", s),
            Error::Parse(s) => write!(f, "Parse error: {}", s),
            Error::Serialization(s) => write!(f, "Serialization error: {}", s),
            Error::Unsupported(s) => write!(f, "Unsupported statement: {}", s),
            Error::Value(s) => write!(f, "Value error: {}", s),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for Error {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Error::Config(err.to_string())
    }
}
