//! Measurement analysis: trend tracking, rule evaluation and orchestration

pub mod pipeline;
pub mod rules;
pub mod trend;

pub use pipeline::{AlertEgress, AnalysisPipeline, PipelineBuilder};
pub use rules::{RuleEngine, Thresholds};
pub use trend::{TrendSnapshot, TrendState, TrendTracker, TrendUpdate};
