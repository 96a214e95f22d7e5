use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use nmea_sim::engine::{EngineHandle, RunSummary};
use nmea_sim::utils::logging;
use nmea_sim::SimulationEngine;

use crate::config::Config;
use crate::trace::JsonlTraceSink;

/// How often the progress bar samples virtual time
const PROGRESS_REFRESH: Duration = Duration::from_millis(200);

// ------------------------------------------------------------------------------------------------
// Main Simulation Function
// ------------------------------------------------------------------------------------------------

/// Runs one scenario until its duration elapses or Ctrl-C is pressed
///
/// # Arguments
///
/// * `config` - A validated configuration; the scenario, clock, sinks and trace file are built from it
///
/// # Returns
///
/// The engine's run summary once every sink has been flushed and closed
pub async fn run_simulation(config: &Config) -> anyhow::Result<RunSummary> {
    let scenario = config.build_scenario();
    logging::log(
        "SIMULATOR",
        &format!(
            "Scenario '{}': {} vessels, {} base stations, {} aids to navigation",
            scenario.name,
            scenario.vessels.len(),
            scenario.base_stations.len(),
            scenario.aids.len()
        ),
    );

    let mut engine = SimulationEngine::new(scenario, config.build_clock(), config.engine.clone());
    for sink in config.build_sinks() {
        engine.add_sink(sink)?;
    }
    if let Some(path) = &config.output.trace_path {
        let trace = JsonlTraceSink::create(path)
            .await
            .with_context(|| format!("Failed to create trace file {}", path.display()))?;
        logging::log("SIMULATOR", &format!("Writing trace events to {}", trace.path().display()));
        engine.set_trace_sink(Arc::new(trace))?;
    }

    engine.start().await.context("Failed to start the simulation engine")?;
    logging::log("SIMULATOR", "Simulation started, press Ctrl-C to stop");

    let handle = engine.handle();
    let interrupt = tokio::spawn(stop_on_ctrl_c(handle.clone()));
    let progress_bar = progress_bar(config.duration())?;
    let progress = tokio::spawn(track_progress(handle, progress_bar.clone()));

    let result = engine.wait().await;
    progress.abort();
    interrupt.abort();
    progress_bar.finish();

    let summary = result?;
    logging::log("SIMULATOR", "Simulation finished");
    Ok(summary)
}

// ------------------------------------------------------------------------------------------------
// Helpers
// ------------------------------------------------------------------------------------------------

/// A bar over the scenario duration, or a spinner for open-ended runs
fn progress_bar(duration: Option<Duration>) -> anyhow::Result<ProgressBar> {
    let progress_bar = match duration {
        Some(duration) => {
            let bar = ProgressBar::new(duration.as_secs());
            bar.set_style(ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} simulated seconds ({eta})")?
                .progress_chars("##-"));
            bar
        }
        None => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner()
                .template("[{elapsed_precise}] {spinner} {pos} simulated seconds")?);
            spinner
        }
    };
    Ok(progress_bar)
}

async fn track_progress(handle: EngineHandle, progress_bar: ProgressBar) {
    let mut ticker = interval(PROGRESS_REFRESH);
    loop {
        ticker.tick().await;
        progress_bar.set_position(handle.virtual_time().as_secs());
        progress_bar.tick();
    }
}

async fn stop_on_ctrl_c(handle: EngineHandle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            logging::log("SIMULATOR", "Ctrl-C received, stopping");
            handle.stop();
        }
        Err(e) => tracing::warn!("Could not listen for Ctrl-C: {}", e),
    }
}
