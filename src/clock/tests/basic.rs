use std::time::Duration;
use tokio::time;

use crate::clock::{ClockError, SimulationClock, MAX_TIME_FACTOR};
use crate::utils::logging;

/// Tests clock validation:
/// - Non-positive and non-finite time factors are rejected
/// - A zero tick interval is rejected
#[test]
fn test_clock_validation() {
    assert!(SimulationClock::new(1.0, Duration::from_secs(1)).validate().is_ok());
    assert_eq!(
        SimulationClock::new(0.0, Duration::from_secs(1)).validate(),
        Err(ClockError::InvalidTimeFactor(0.0))
    );
    assert!(SimulationClock::new(-2.0, Duration::from_secs(1)).validate().is_err());
    assert!(SimulationClock::new(f64::INFINITY, Duration::from_secs(1)).validate().is_err());
    assert_eq!(SimulationClock::new(1.0, Duration::ZERO).validate(), Err(ClockError::InvalidTickInterval));

    let mut clock = SimulationClock::default();
    assert!(clock.set_time_factor(-1.0).is_err());
    assert_eq!(clock.time_factor(), 1.0);
}

/// Tests that virtual time scales with the time factor:
/// - 10 real seconds at factor 2 gives 20 virtual seconds
/// - The real tick period is tick_interval / factor
#[tokio::test(start_paused = true)]
async fn test_time_factor_scaling() {
    logging::init_logging();
    logging::log("TEST", "=== Starting test_time_factor_scaling ===");

    let mut clock = SimulationClock::new(2.0, Duration::from_secs(1));
    assert_eq!(clock.real_tick_period(), Duration::from_millis(500));
    clock.start();

    time::advance(Duration::from_secs(10)).await;
    assert_eq!(clock.now(), Duration::from_secs(20));

    logging::log("TEST", "=== Test completed successfully ===");
}

/// Tests pause, resume and mid-run factor changes:
/// - Virtual time does not advance while paused
/// - Time accumulated before a factor change is kept
#[tokio::test(start_paused = true)]
async fn test_pause_resume_and_factor_change() {
    let mut clock = SimulationClock::new(1.0, Duration::from_secs(1));
    clock.start();

    time::advance(Duration::from_secs(5)).await;
    clock.pause();
    assert!(clock.is_paused());
    time::advance(Duration::from_secs(100)).await;
    assert_eq!(clock.now(), Duration::from_secs(5));

    clock.resume();
    time::advance(Duration::from_secs(5)).await;
    assert_eq!(clock.now(), Duration::from_secs(10));

    clock.set_time_factor(10.0).unwrap();
    time::advance(Duration::from_secs(2)).await;
    assert_eq!(clock.now(), Duration::from_secs(30));
    assert_eq!(clock.real_tick_period(), Duration::from_millis(100));

    // Changing the factor while paused takes effect on resume
    clock.pause();
    clock.set_time_factor(0.5).unwrap();
    time::advance(Duration::from_secs(50)).await;
    assert_eq!(clock.now(), Duration::from_secs(30));
    clock.resume();
    time::advance(Duration::from_secs(4)).await;
    assert_eq!(clock.now(), Duration::from_secs(32));
}

/// Tests time factors at the edge of what the clock can represent:
/// - A factor so small that the real tick period overflows `Duration` is rejected
/// - A factor above the supported maximum is rejected, also mid-run
/// - An unvalidated huge factor saturates virtual time instead of panicking
#[tokio::test(start_paused = true)]
async fn test_extreme_time_factors() {
    logging::init_logging();
    logging::log("TEST", "=== Starting test_extreme_time_factors ===");

    let tiny = SimulationClock::new(1e-20, Duration::from_secs(1));
    assert_eq!(
        tiny.validate(),
        Err(ClockError::TickPeriodOutOfRange { tick_interval: Duration::from_secs(1), time_factor: 1e-20 })
    );
    assert_eq!(tiny.real_tick_period(), Duration::MAX);
    assert_eq!(
        SimulationClock::new(1e300, Duration::from_secs(1)).validate(),
        Err(ClockError::InvalidTimeFactor(1e300))
    );
    assert!(SimulationClock::new(MAX_TIME_FACTOR, Duration::from_secs(1)).validate().is_ok());
    logging::log("TEST", "✓ Unrepresentable factors rejected by validate");

    let mut clock = SimulationClock::new(1.0, Duration::from_secs(1));
    clock.start();
    assert!(clock.set_time_factor(1e300).is_err());
    assert!(matches!(clock.set_time_factor(1e-20), Err(ClockError::TickPeriodOutOfRange { .. })));
    assert_eq!(clock.time_factor(), 1.0);
    logging::log("TEST", "✓ Unrepresentable factors rejected mid-run");

    let mut unchecked = SimulationClock::new(1e300, Duration::from_secs(1));
    unchecked.start();
    time::advance(Duration::from_secs(1)).await;
    assert_eq!(unchecked.now(), Duration::MAX);
    unchecked.pause();
    assert_eq!(unchecked.now(), Duration::MAX);
    logging::log("TEST", "✓ Virtual time saturates");

    logging::log("TEST", "=== Test completed successfully ===");
}
