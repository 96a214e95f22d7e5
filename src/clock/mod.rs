use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[cfg(test)]
mod tests;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClockError {
    #[error("Time factor must be positive and at most {max}, got {0}", max = MAX_TIME_FACTOR)]
    InvalidTimeFactor(f64),
    #[error("Tick interval must be positive")]
    InvalidTickInterval,
    #[error("Tick interval {tick_interval:?} at time factor {time_factor} has no representable real tick period")]
    TickPeriodOutOfRange { tick_interval: Duration, time_factor: f64 },
}

/// Fastest supported speed-up of virtual time
pub const MAX_TIME_FACTOR: f64 = 1_000_000.0;

/// Virtual simulation time.
///
/// Virtual time advances at `time_factor` times the rate of the runtime's monotonic clock and
/// is accumulated across pauses and factor changes. The engine reads time only from here.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    time_factor: f64,
    tick_interval: Duration,
    /// Virtual time accumulated up to `anchor`
    accumulated: Duration,
    /// Real instant virtual time has been advancing from, None while stopped or paused
    anchor: Option<Instant>,
    paused: bool,
}

impl SimulationClock {
    pub fn new(time_factor: f64, tick_interval: Duration) -> Self {
        Self {
            time_factor,
            tick_interval,
            accumulated: Duration::ZERO,
            anchor: None,
            paused: false,
        }
    }

    /// Check the configuration; called by the engine before it starts running
    pub fn validate(&self) -> Result<(), ClockError> {
        validate_time_factor(self.time_factor)?;
        if self.tick_interval.is_zero() {
            return Err(ClockError::InvalidTickInterval);
        }
        check_tick_period(self.tick_interval, self.time_factor).map(|_| ())
    }

    /// Reset virtual time to zero and start advancing
    pub fn start(&mut self) {
        self.accumulated = Duration::ZERO;
        self.anchor = Some(Instant::now());
        self.paused = false;
    }

    /// Virtual time elapsed since `start`
    pub fn now(&self) -> Duration {
        match self.anchor {
            Some(anchor) => self.accumulated.saturating_add(scale(anchor.elapsed(), self.time_factor)),
            None => self.accumulated,
        }
    }

    /// Freeze virtual time
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.accumulated = self.now();
        self.anchor = None;
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.anchor = Some(Instant::now());
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Change the speed of virtual time, keeping the time accumulated so far
    pub fn set_time_factor(&mut self, time_factor: f64) -> Result<(), ClockError> {
        validate_time_factor(time_factor)?;
        check_tick_period(self.tick_interval, time_factor)?;
        if let Some(anchor) = self.anchor {
            let now = Instant::now();
            self.accumulated = self
                .accumulated
                .saturating_add(scale(now.duration_since(anchor), self.time_factor));
            self.anchor = Some(now);
        }
        self.time_factor = time_factor;
        Ok(())
    }

    pub fn time_factor(&self) -> f64 {
        self.time_factor
    }

    /// Virtual time between ticks
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Real time between ticks, `tick_interval / time_factor`
    pub fn real_tick_period(&self) -> Duration {
        check_tick_period(self.tick_interval, self.time_factor).unwrap_or(Duration::MAX)
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(1.0, Duration::from_secs(1))
    }
}

/// Reject non-positive, non-finite and excessive time factors
pub fn validate_time_factor(time_factor: f64) -> Result<(), ClockError> {
    if time_factor.is_finite() && time_factor > 0.0 && time_factor <= MAX_TIME_FACTOR {
        Ok(())
    } else {
        Err(ClockError::InvalidTimeFactor(time_factor))
    }
}

/// `tick_interval / time_factor`, which must be a non-zero `Duration`
fn check_tick_period(tick_interval: Duration, time_factor: f64) -> Result<Duration, ClockError> {
    match Duration::try_from_secs_f64(tick_interval.as_secs_f64() / time_factor) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(ClockError::TickPeriodOutOfRange { tick_interval, time_factor }),
    }
}

/// `elapsed * factor`, saturating at `Duration::MAX`
fn scale(elapsed: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(elapsed.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}
