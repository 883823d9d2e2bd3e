//! Spreadsheet imports
//!
//! - `config` - Import settings with validated defaults
//! - `progress` - Progress reporting contract and its channel/log implementations
//! - `orchestrator` - Decode, validate, stage and commit one file
//! - `scheduler` - Run orchestrator jobs in the background

pub mod config;
pub mod orchestrator;
pub mod progress;
pub mod scheduler;

pub use config::ImportConfig;
pub use orchestrator::ImportOrchestrator;
pub use progress::{progress_channel, ChannelProgress, ImportEvent, LogProgress, ProgressReporter};
pub use scheduler::{ImportScheduler, ImportTask};
