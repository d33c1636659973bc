//! # Optimizer Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `asset_optimizer`: orchestratore principale (fan-out delle pipeline)
//! - `progress_tracker`: gestione progress unificata

pub mod asset_optimizer;
pub mod progress_tracker;

pub use asset_optimizer::{AggregateOutcome, AssetOptimizer, FileReport, RunReport};
pub use progress_tracker::ProgressTracker;
