pub mod error_handling;
pub mod export_service;
pub mod generator;
pub mod normalization;
mod trend_service;

pub use error_handling::{GenerationError, LogHelper, NormalizationError, RadarError, UserErrorFormatter};
pub use export_service::{ExportFormat, ExportService};
pub use generator::{GeneratorSettings, MockTrendGenerator, PerplexityGenerator, TrendGenerator};
pub use trend_service::TrendService;
