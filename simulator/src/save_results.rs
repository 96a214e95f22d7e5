use anyhow::Context;
use std::fs;
use std::path::Path;

use nmea_sim::engine::RunSummary;
use nmea_sim::utils::logging;

use crate::config::Config;

/// Prints the run statistics through the simulator log
pub fn log_summary(summary: &RunSummary) {
    logging::log("SIMULATOR", "\n=== Simulation Statistics ===");
    logging::log("SIMULATOR", &format!("Virtual time: {:.1} s", summary.virtual_time.as_secs_f64()));
    logging::log("SIMULATOR", &format!("Ticks: {}", summary.ticks));
    logging::log("SIMULATOR", &format!("Messages: {}", summary.messages));
    logging::log("SIMULATOR", &format!("Sentences: {}", summary.sentences));
    logging::log("SIMULATOR", &format!("Encoding failures: {}", summary.encoding_failures));
    logging::log("SIMULATOR", &format!("Sink errors: {}", summary.sink_errors));
    for sink in &summary.sinks {
        logging::log(
            "SIMULATOR",
            &format!(
                "  {}: sent {}, dropped {}, errors {}, disconnects {}",
                sink.name, sink.stats.sent, sink.stats.dropped, sink.stats.errors, sink.stats.disconnects
            ),
        );
    }
    logging::log("SIMULATOR", "===========================");
}

/// Saves the run parameters and summary as pretty-printed JSON
///
/// # Arguments
///
/// * `config` - The configuration the run was started with
/// * `summary` - The summary returned by the engine
/// * `path` - Destination file, parent directories are created
pub fn save_summary(config: &Config, summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create results directory {}", parent.display()))?;
    }

    let results = serde_json::json!({
        "parameters": {
            "scenario": config.scenario.name,
            "duration_secs": config.scenario.duration,
            "time_factor": config.clock.time_factor,
            "tick_interval_secs": config.clock.tick_interval,
            "seed": config.engine.seed,
            "vessels": config.vessels.len(),
            "base_stations": config.base_stations.len(),
            "aids": config.aids.len(),
        },
        "results": summary,
    });
    fs::write(path, serde_json::to_string_pretty(&results)?)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    logging::log("SIMULATOR", &format!("Summary saved to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmea_sim::engine::SinkSummary;
    use nmea_sim::output::SinkStats;
    use std::time::Duration;

    /// Tests that the saved summary carries both the run parameters and the engine counters
    #[test]
    fn test_save_summary() {
        logging::init_logging();
        logging::log("TEST", "=== Starting summary save test ===");

        let config = Config::from_toml(
            r#"
            [scenario]
            name = "harbour"
            duration = 30.0

            [[vessels]]
            mmsi = 367001234
            name = "PACIFIC TRADER"
            class = "A"
            latitude = 37.7749
            longitude = -122.4194
            speed = 15.0
            course = 90.0

            [[sinks]]
            type = "udp"
            destination = "127.0.0.1:10110"
            "#,
        )
        .unwrap();
        let summary = RunSummary {
            ticks: 31,
            messages: 12,
            sentences: 14,
            virtual_time: Duration::from_secs(30),
            sinks: vec![SinkSummary {
                name: "udp:127.0.0.1:10110".to_string(),
                stats: SinkStats { sent: 14, bytes: 700, ..Default::default() },
            }],
            ..Default::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("summary.json");
        save_summary(&config, &summary, &path).unwrap();
        log_summary(&summary);

        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["parameters"]["scenario"], "harbour");
        assert_eq!(saved["parameters"]["vessels"], 1);
        assert_eq!(saved["results"]["sentences"], 14);
        assert_eq!(saved["results"]["sinks"][0]["stats"]["sent"], 14);
        logging::log("TEST", "✓ Summary written as JSON");

        logging::log("TEST", "=== Test completed successfully ===");
    }
}
