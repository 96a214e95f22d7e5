use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::{
    DueEntry, EncodeError, EngineConfig, EngineError, EngineState, RateTable, Scheduler, TraceEvent,
    TraceEventKind, TraceSink,
};
use crate::ais::{reports, AisEncoder, Channel};
use crate::clock::{validate_time_factor, SimulationClock};
use crate::codec::gps::{self, GpsFix};
use crate::output::{OutputSink, SinkStats};
use crate::types::{AisMessage, MessageKind, Mmsi, Scenario, VesselState};

/// Commands forwarded to the running tick loop
#[derive(Debug, Clone, Copy)]
enum Control {
    Pause,
    Resume,
    SetTimeFactor(f64),
}

/// Final statistics of one sink
#[derive(Debug, Clone, Serialize)]
pub struct SinkSummary {
    pub name: String,
    pub stats: SinkStats,
}

/// What a finished run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    /// (entity, message kind) pairs emitted
    pub messages: u64,
    pub sentences: u64,
    pub encoding_failures: u64,
    /// Sentences a sink refused to accept
    pub sink_errors: u64,
    pub virtual_time: Duration,
    pub sinks: Vec<SinkSummary>,
}

/// Cloneable handle for stopping a running engine from another task
#[derive(Debug, Clone)]
pub struct EngineHandle {
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    virtual_time_ms: Arc<AtomicU64>,
}

impl EngineHandle {
    /// Ask the tick loop to exit; `SimulationEngine::wait` then drains and returns
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Virtual time reached by the last completed tick
    pub fn virtual_time(&self) -> Duration {
        Duration::from_millis(self.virtual_time_ms.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy)]
enum EntityRef {
    Vessel(usize),
    BaseStation(usize),
    Aid(usize),
}

/// Sinks shared between the engine and its tick loop, so they can be closed even if the loop dies
type SharedSinks = Arc<Mutex<Vec<Box<dyn OutputSink>>>>;

fn lock_sinks(sinks: &SharedSinks) -> MutexGuard<'_, Vec<Box<dyn OutputSink>>> {
    sinks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the tick loop owns while running
struct EngineCore {
    scenario: Scenario,
    clock: SimulationClock,
    rates: RateTable,
    index: HashMap<Mmsi, EntityRef>,
    scheduler: Scheduler,
    encoder: AisEncoder,
    channel: Channel,
    rng: StdRng,
    sinks: SharedSinks,
    trace: Option<Arc<dyn TraceSink>>,
    summary: RunSummary,
}

/// Drives a scenario: advances vessels, encodes due messages and fans them out to the sinks.
///
/// The scenario and the clock are moved into a dedicated tick loop task on `start` and handed
/// back once the loop exits, so the engine never shares live vessel state. The sinks are shared
/// with the loop and closed by the engine however the loop ends.
pub struct SimulationEngine {
    state: EngineState,
    config: EngineConfig,
    /// Present while Idle and again once Stopped
    scenario: Option<Scenario>,
    clock: Option<SimulationClock>,
    /// Registered sinks, until `start` hands them to the tick loop
    sinks: Vec<Box<dyn OutputSink>>,
    running_sinks: Option<SharedSinks>,
    trace: Option<Arc<dyn TraceSink>>,
    handle: EngineHandle,
    control: Option<mpsc::UnboundedSender<Control>>,
    task: Option<JoinHandle<EngineCore>>,
    summary: Option<RunSummary>,
}

impl SimulationEngine {
    pub fn new(scenario: Scenario, clock: SimulationClock, config: EngineConfig) -> Self {
        Self {
            state: EngineState::Idle,
            config,
            scenario: Some(scenario),
            clock: Some(clock),
            sinks: Vec::new(),
            running_sinks: None,
            trace: None,
            handle: EngineHandle {
                stop: Arc::new(AtomicBool::new(false)),
                wake: Arc::new(Notify::new()),
                virtual_time_ms: Arc::new(AtomicU64::new(0)),
            },
            control: None,
            task: None,
            summary: None,
        }
    }

    fn expect_state(&self, expected: EngineState) -> Result<(), EngineError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EngineError::InvalidState { expected, found: self.state })
        }
    }

    /// Register a sink; only allowed before `start`
    pub fn add_sink(&mut self, sink: Box<dyn OutputSink>) -> Result<(), EngineError> {
        self.expect_state(EngineState::Idle)?;
        self.sinks.push(sink);
        Ok(())
    }

    pub fn set_trace_sink(&mut self, trace: Arc<dyn TraceSink>) -> Result<(), EngineError> {
        self.expect_state(EngineState::Idle)?;
        self.trace = Some(trace);
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// The scenario, while Idle and after the engine has stopped
    pub fn scenario(&self) -> Option<&Scenario> {
        self.scenario.as_ref()
    }

    /// Summary of the finished run
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn virtual_time(&self) -> Duration {
        self.handle.virtual_time()
    }

    fn validate(&self, scenario: &Scenario, clock: &SimulationClock) -> Result<(), EngineError> {
        clock.validate()?;
        self.config.rates.validate()?;
        if let Some(mmsi) = scenario.find_duplicate_mmsi() {
            return Err(EngineError::DuplicateMmsi(mmsi));
        }
        Ok(())
    }

    /// Start every sink, failing on the first that cannot start
    async fn start_sinks(&mut self) -> Result<(), EngineError> {
        for started in 0..self.sinks.len() {
            if let Err(source) = self.sinks[started].start().await {
                let name = self.sinks[started].name().to_string();
                tracing::error!("Sink {} failed to start: {}", name, source);
                for sink in self.sinks[..started].iter_mut() {
                    if let Err(e) = sink.close(self.config.shutdown_grace()).await {
                        tracing::warn!("Closing sink {} failed: {}", sink.name(), e);
                    }
                }
                return Err(EngineError::SinkStart { name, source });
            }
        }
        Ok(())
    }

    /// Validate the configuration, start the sinks and begin ticking
    pub async fn start(&mut self) -> Result<(), EngineError> {
        self.expect_state(EngineState::Idle)?;
        let (Some(scenario), Some(clock)) = (self.scenario.as_ref(), self.clock.as_ref()) else {
            return Err(EngineError::TaskFailed("engine has no scenario".to_string()));
        };
        self.validate(scenario, clock)?;
        self.start_sinks().await?;

        let (Some(scenario), Some(clock)) = (self.scenario.take(), self.clock.take()) else {
            return Err(EngineError::TaskFailed("engine has no scenario".to_string()));
        };
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sink_count = self.sinks.len();
        let sinks: SharedSinks = Arc::new(Mutex::new(std::mem::take(&mut self.sinks)));
        self.running_sinks = Some(sinks.clone());
        let mut core = EngineCore {
            index: index_entities(&scenario),
            scheduler: Scheduler::new(),
            scenario,
            clock,
            rates: self.config.rates.clone(),
            encoder: AisEncoder::new(),
            channel: Channel::A,
            rng,
            sinks,
            trace: self.trace.clone(),
            summary: RunSummary::default(),
        };
        core.schedule_initial();

        tracing::info!(
            "Starting scenario '{}' with {} entities, {} sinks, time factor {}",
            core.scenario.name,
            core.scenario.entity_count(),
            sink_count,
            core.clock.time_factor()
        );
        core.clock.start();

        let (sender, receiver) = mpsc::unbounded_channel();
        self.control = Some(sender);
        self.task = Some(tokio::spawn(run_loop(core, receiver, self.handle.clone())));
        self.state = EngineState::Running;
        Ok(())
    }

    fn send_control(&self, command: Control) -> Result<(), EngineError> {
        self.expect_state(EngineState::Running)?;
        let sender = self
            .control
            .as_ref()
            .ok_or_else(|| EngineError::TaskFailed("control channel closed".to_string()))?;
        sender
            .send(command)
            .map_err(|_| EngineError::TaskFailed("tick loop exited".to_string()))?;
        self.handle.wake.notify_one();
        Ok(())
    }

    pub fn pause(&self) -> Result<(), EngineError> {
        self.send_control(Control::Pause)
    }

    pub fn resume(&self) -> Result<(), EngineError> {
        self.send_control(Control::Resume)
    }

    pub fn set_time_factor(&self, time_factor: f64) -> Result<(), EngineError> {
        validate_time_factor(time_factor)?;
        self.send_control(Control::SetTimeFactor(time_factor))
    }

    /// Stop ticking, drain the sinks and return the run summary
    pub async fn stop(&mut self) -> Result<RunSummary, EngineError> {
        self.expect_state(EngineState::Running)?;
        self.handle.stop();
        self.finish().await
    }

    /// Run until the scenario duration is reached or a handle requests a stop, then drain
    /// like `stop`
    pub async fn wait(&mut self) -> Result<RunSummary, EngineError> {
        self.expect_state(EngineState::Running)?;
        self.finish().await
    }

    async fn finish(&mut self) -> Result<RunSummary, EngineError> {
        let task = self
            .task
            .take()
            .ok_or_else(|| EngineError::TaskFailed("tick loop not running".to_string()))?;
        let joined = task.await;
        self.state = EngineState::Stopping;
        self.control = None;

        let mut running = match self.running_sinks.take() {
            Some(shared) => std::mem::take(&mut *lock_sinks(&shared)),
            None => Vec::new(),
        };
        let grace = self.config.shutdown_grace();
        let mut sinks = Vec::with_capacity(running.len());
        for sink in running.iter_mut() {
            if let Err(e) = sink.close(grace).await {
                tracing::warn!("Closing sink {} failed: {}", sink.name(), e);
            }
            sinks.push(SinkSummary { name: sink.name().to_string(), stats: sink.stats() });
        }
        if let Some(trace) = &self.trace {
            trace.close().await;
        }

        let mut core = match joined {
            Ok(core) => core,
            Err(e) => {
                tracing::error!("Tick loop failed: {}", e);
                self.state = EngineState::Stopped;
                return Err(EngineError::TaskFailed(e.to_string()));
            }
        };

        let mut summary = std::mem::take(&mut core.summary);
        summary.sinks = sinks;
        tracing::info!(
            "Scenario '{}' stopped at {:?}: {} messages, {} sentences, {} encoding failures",
            core.scenario.name,
            summary.virtual_time,
            summary.messages,
            summary.sentences,
            summary.encoding_failures
        );

        core.clock.pause();
        self.scenario = Some(core.scenario);
        self.clock = Some(core.clock);
        self.summary = Some(summary.clone());
        self.state = EngineState::Stopped;
        Ok(summary)
    }
}

fn index_entities(scenario: &Scenario) -> HashMap<Mmsi, EntityRef> {
    let vessels = scenario.vessels.iter().enumerate().map(|(i, v)| (v.mmsi, EntityRef::Vessel(i)));
    let stations = scenario
        .base_stations
        .iter()
        .enumerate()
        .map(|(i, b)| (b.mmsi, EntityRef::BaseStation(i)));
    let aids = scenario.aids.iter().enumerate().map(|(i, a)| (a.mmsi, EntityRef::Aid(i)));
    vessels.chain(stations).chain(aids).collect()
}

/// The tick loop. Owns the core for the whole run and returns it when it exits.
async fn run_loop(
    mut core: EngineCore,
    mut control: mpsc::UnboundedReceiver<Control>,
    handle: EngineHandle,
) -> EngineCore {
    loop {
        if handle.is_stop_requested() {
            break;
        }

        let now = core.clock.now();
        let horizon = core.scenario.duration.map_or(now, |duration| now.min(duration));
        core.tick(horizon);
        handle.virtual_time_ms.store(horizon.as_millis() as u64, Ordering::Relaxed);
        if core.scenario.duration.map_or(false, |duration| now >= duration) {
            tracing::info!("Scenario '{}' reached its duration", core.scenario.name);
            break;
        }

        tokio::select! {
            _ = sleep(core.clock.real_tick_period()) => {}
            _ = handle.wake.notified() => {}
            Some(command) = control.recv() => core.apply(command),
        }
        // Commands sent together with a wake-up are applied before the next tick
        while let Ok(command) = control.try_recv() {
            core.apply(command);
        }
    }
    core
}

impl EngineCore {
    fn apply(&mut self, command: Control) {
        match command {
            Control::Pause => {
                self.clock.pause();
                tracing::info!("Simulation paused at {:?}", self.clock.now());
            }
            Control::Resume => {
                self.clock.resume();
                tracing::info!("Simulation resumed at {:?}", self.clock.now());
            }
            Control::SetTimeFactor(factor) => match self.clock.set_time_factor(factor) {
                Ok(()) => tracing::info!("Time factor set to {}", factor),
                Err(e) => tracing::warn!("Ignoring time factor change: {}", e),
            },
        }
    }

    /// Every pair is first due at virtual time zero
    fn schedule_initial(&mut self) {
        let mut entries = Vec::new();
        for vessel in &self.scenario.vessels {
            entries.extend(vessel.message_kinds().into_iter().map(|kind| (vessel.mmsi, kind)));
        }
        for station in &self.scenario.base_stations {
            entries.push((station.mmsi, MessageKind::BaseStationReport));
        }
        for aid in &self.scenario.aids {
            entries.push((aid.mmsi, MessageKind::AidToNavigation));
        }
        for (entity, kind) in entries {
            self.scheduler.schedule(DueEntry { due: Duration::ZERO, entity, kind });
        }
    }

    /// Process every pair due at or before `now`, in (due, entity, kind) order
    fn tick(&mut self, now: Duration) {
        self.summary.ticks += 1;
        while let Some(entry) = self.scheduler.pop_due(now) {
            self.process(entry);
        }
        self.summary.virtual_time = now;
    }

    fn utc_at(&self, due: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(due)
            .ok()
            .and_then(|offset| self.scenario.start_time.checked_add_signed(offset))
            .unwrap_or(self.scenario.start_time)
    }

    fn process(&mut self, entry: DueEntry) {
        let started = std::time::Instant::now();
        let utc = self.utc_at(entry.due);
        let result = self.generate(&entry, utc);
        let generation_duration_us = started.elapsed().as_micros() as u64;

        let (kind, sentences, error) = match result {
            Ok(sentences) => {
                for sentence in &sentences {
                    debug_assert!(crate::codec::validate(sentence), "generated invalid sentence {:?}", sentence);
                    self.dispatch(sentence);
                }
                self.summary.messages += 1;
                self.summary.sentences += sentences.len() as u64;
                self.mark_sent(&entry);
                (TraceEventKind::Emitted, sentences, None)
            }
            Err(e) => {
                tracing::warn!("Dropping {} for {}: {}", entry.kind, entry.entity, e);
                self.summary.encoding_failures += 1;
                (TraceEventKind::EncodingFailed, Vec::new(), Some(e.to_string()))
            }
        };

        if let Some(trace) = &self.trace {
            trace.record(&TraceEvent {
                timestamp: utc,
                virtual_time_ms: entry.due.as_millis() as u64,
                kind,
                entity_id: entry.entity.0,
                message_type: entry.kind.to_string(),
                sentences,
                generation_duration_us,
                error,
            });
        }

        let interval = self.interval(&entry);
        self.scheduler.schedule(DueEntry { due: entry.due.saturating_add(interval), ..entry });
    }

    /// Hand one sentence to every sink; sinks never block
    fn dispatch(&mut self, sentence: &str) {
        let sinks = lock_sinks(&self.sinks);
        for sink in sinks.iter() {
            if let Err(e) = sink.write(sentence) {
                tracing::warn!("Sink {} rejected a sentence: {}", sink.name(), e);
                self.summary.sink_errors += 1;
            }
        }
    }

    fn mark_sent(&mut self, entry: &DueEntry) {
        let last_sent = match self.index.get(&entry.entity) {
            Some(EntityRef::Vessel(i)) => &mut self.scenario.vessels[*i].last_sent,
            Some(EntityRef::BaseStation(i)) => &mut self.scenario.base_stations[*i].last_sent,
            Some(EntityRef::Aid(i)) => &mut self.scenario.aids[*i].last_sent,
            None => return,
        };
        last_sent.insert(entry.kind, entry.due);
    }

    fn interval(&self, entry: &DueEntry) -> Duration {
        let vessel = match self.index.get(&entry.entity) {
            Some(EntityRef::Vessel(i)) => self.scenario.vessels.get(*i),
            _ => None,
        };
        self.rates.interval_for(entry.kind, vessel)
    }

    /// Bring the entity up to the due time and build its sentences
    fn generate(&mut self, entry: &DueEntry, utc: DateTime<Utc>) -> Result<Vec<String>, EncodeError> {
        let messages: Vec<AisMessage> = match self.index.get(&entry.entity).copied() {
            Some(EntityRef::Vessel(i)) => {
                let vessel = &mut self.scenario.vessels[i];
                advance_vessel(vessel, entry.due, &mut self.rng);
                match entry.kind {
                    MessageKind::Gga => return Ok(vec![gps::gga(&GpsFix::new(utc, &vessel.kinematics))?]),
                    MessageKind::Rmc => return Ok(vec![gps::rmc(&GpsFix::new(utc, &vessel.kinematics))?]),
                    MessageKind::PositionReportA => vec![reports::class_a_position(vessel, utc)],
                    MessageKind::StaticVoyageData => vec![reports::static_voyage(vessel)],
                    MessageKind::PositionReportB => vec![reports::class_b_position(vessel, utc)],
                    MessageKind::ExtendedReportB => vec![reports::extended_class_b(vessel, utc)],
                    MessageKind::StaticDataB => reports::static_data_b(vessel).to_vec(),
                    MessageKind::BaseStationReport | MessageKind::AidToNavigation => Vec::new(),
                }
            }
            Some(EntityRef::BaseStation(i)) => vec![reports::base_station(&self.scenario.base_stations[i], utc)],
            Some(EntityRef::Aid(i)) => vec![reports::aid_to_navigation(&self.scenario.aids[i], utc)],
            None => Vec::new(),
        };

        let mut sentences = Vec::new();
        for message in &messages {
            sentences.extend(self.encoder.encode(message, self.channel)?);
            self.channel = self.channel.alternate();
        }
        Ok(sentences)
    }
}

/// Move the vessel forward to `due` if it is behind
fn advance_vessel<R: Rng + ?Sized>(vessel: &mut VesselState, due: Duration, rng: &mut R) {
    let elapsed = due.saturating_sub(vessel.last_update);
    if elapsed.is_zero() {
        return;
    }
    vessel.kinematics = vessel.movement.advance(&vessel.kinematics, elapsed.as_secs_f64(), rng);
    vessel.last_update = due;
}
