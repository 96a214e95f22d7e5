pub mod config;
pub mod run_simulation;
pub mod save_results;
pub mod trace;

pub use config::{Config, ConfigError};
pub use run_simulation::run_simulation;
pub use save_results::{log_summary, save_summary};
pub use trace::JsonlTraceSink;
