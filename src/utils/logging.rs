use once_cell::sync::OnceCell;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;

static ENABLE_LOGGING: AtomicBool = AtomicBool::new(false);
static SUBSCRIBER: OnceCell<()> = OnceCell::new();

/// Initializes logging based on the NMEA_SIM_LOGGING environment variable.
/// - If NMEA_SIM_LOGGING=true, logging is enabled and a tracing subscriber is installed.
/// - If NMEA_SIM_LOGGING=false or not set, logging is disabled.
/// - NMEA_SIM_LOG_LEVEL selects the most verbose level shown (default: info).
/// - To enable logging in tests, run: NMEA_SIM_LOGGING=true cargo test -- --nocapture
pub fn init_logging() {
    match env::var("NMEA_SIM_LOGGING") {
        Ok(value) => match value.as_str() {
            "true" => {
                ENABLE_LOGGING.store(true, Ordering::SeqCst);
                install_subscriber();
            }
            "false" => ENABLE_LOGGING.store(false, Ordering::SeqCst),
            _ => panic!("\nError: NMEA_SIM_LOGGING environment variable must be 'true' or 'false'\n\nTo run the program, use one of:\n  NMEA_SIM_LOGGING=true cargo run\n  NMEA_SIM_LOGGING=false cargo run\n"),
        },
        Err(_) => ENABLE_LOGGING.store(false, Ordering::SeqCst),
    }
}

/// Force logging on regardless of the environment, used by the simulator binary
pub fn enable_logging() {
    ENABLE_LOGGING.store(true, Ordering::SeqCst);
    install_subscriber();
}

pub fn is_enabled() -> bool {
    ENABLE_LOGGING.load(Ordering::SeqCst)
}

fn install_subscriber() {
    SUBSCRIBER.get_or_init(|| {
        let level = env::var("NMEA_SIM_LOG_LEVEL")
            .ok()
            .and_then(|l| l.parse::<Level>().ok())
            .unwrap_or(Level::INFO);
        // Another subscriber may already be installed by the host application
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .try_init();
    });
}

pub fn log(prefix: &str, message: &str) {
    if ENABLE_LOGGING.load(Ordering::SeqCst) {
        println!("  [{}]   {}", prefix, message);
    }
}
