use std::env;
use std::path::PathBuf;

use nmea_sim::utils::logging;
use simulator::{config::DEFAULT_CONFIG_PATH, log_summary, run_simulation, save_summary, Config};

// ------------------------------------------------------------------------------------------------
// Main
// ------------------------------------------------------------------------------------------------

/// Loads the scenario file given as the first argument and runs it
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    logging::log("SIMULATOR", &format!("Loading configuration from {}", config_path.display()));
    let config = Config::load(&config_path)?;
    log_configuration(&config);

    let summary = run_simulation(&config).await?;
    log_summary(&summary);
    if let Some(path) = &config.output.summary_path {
        save_summary(&config, &summary, path)?;
    }
    Ok(())
}

/// Logs to the console unless NMEA_SIM_LOGGING says otherwise
fn setup_logging() {
    if env::var("NMEA_SIM_LOGGING").is_ok() {
        logging::init_logging();
    } else {
        logging::enable_logging();
    }
}

fn log_configuration(config: &Config) {
    logging::log("SIMULATOR", "=== Simulation Configuration ===");
    logging::log("SIMULATOR", &format!("Scenario: {}", config.scenario.name));
    match config.scenario.duration {
        Some(duration) => logging::log("SIMULATOR", &format!("Duration: {} s", duration)),
        None => logging::log("SIMULATOR", "Duration: until stopped"),
    }
    logging::log("SIMULATOR", &format!("Time factor: {}", config.clock.time_factor));
    logging::log("SIMULATOR", &format!("Tick interval: {} s", config.clock.tick_interval));
    if let Some(seed) = config.engine.seed {
        logging::log("SIMULATOR", &format!("Seed: {}", seed));
    }
    logging::log("SIMULATOR", &format!("Sinks: {}", config.sinks.len()));
    logging::log("SIMULATOR", "===============================");
}
