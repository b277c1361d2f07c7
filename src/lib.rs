//! Per-bin mean, standard deviation and peak power across repeated spectrum captures.
pub mod config;
pub mod discovery;
pub mod export;
pub mod pipeline;
pub mod sweep;
pub use config::{GridConfig, RunConfig};
pub use pipeline::{run, RunSummary};
