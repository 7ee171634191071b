pub mod config;
pub mod error;
pub mod graph;
pub mod math;
pub mod model;
pub mod operations;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use config::SchematizationConfig;
pub use error::{CrossroadError, Result};
pub use pipeline::{CrossroadSchematization, Schematization};
