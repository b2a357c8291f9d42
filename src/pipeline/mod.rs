pub mod runner;

pub use runner::{run_collection, RunSummary};
