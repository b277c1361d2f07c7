// src/sweep/mod.rs
pub mod aggregator;
pub mod error;
pub mod grid;
pub mod layout;
pub mod parser;
pub mod plot;
pub mod source;
pub mod stats;
pub use aggregator::{
    AggregateOptions, AggregateReport, Aggregator, ErrorPolicy, PassStrategy, RejectedCapture,
};
pub use error::SweepError;
pub use grid::FrequencyGrid;
pub use layout::SegmentLayout;
pub use parser::{CaptureParser, CaptureSamples, Sample};
pub use plot::{render_series_png, write_plots, PlotStyle, StatSeries};
pub use source::{CaptureSource, FileCapture, MemoryCapture};
pub use stats::{db_to_linear, linear_to_db, BinStatistics, ResultRow};
