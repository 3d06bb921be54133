pub mod error;
pub mod sql;
pub mod storage;

pub use sql::engine::{Database, Options};
pub use sql::execution::QueryResult;
pub use sql::types::{Record, Value};
