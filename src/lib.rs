pub mod cli;
pub mod config;
pub mod error;
pub mod fake;
pub mod pipeline;
pub mod rds;
pub mod sink;

pub use error::CollectError;
