pub mod engine;
pub mod execution;
pub mod parser;
pub mod schema;
pub mod types;
