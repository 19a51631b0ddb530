//! Phase state machine for a speed test run.
//!
//! The orchestrator is the only owner of [`RunState`]. The event loop feeds
//! it ticks, key-derived commands and stage events from the background
//! chain; each call to [`Orchestrator::handle`] performs at most one phase
//! transition and tells the loop what to do next.

use crate::animation::AnimationFilter;
use crate::errors::DialError;
use crate::history::HistoryBuffer;
use crate::signal::{RandomSource, DOWNLOAD, UPLOAD};
use log::{debug, info, warn};
use std::fmt;
use std::time::{Duration, Instant};

/// Test phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    /// Looking up the server label
    Init,
    /// Measuring latency
    Ping,
    /// Animating the download curve
    Downloading,
    /// Animating the upload curve
    Uploading,
    /// All figures are final
    Complete,
    /// The run was halted by a fault
    Error,
}

impl TestPhase {
    /// Whether ticks drive the animation in this phase.
    pub fn is_animating(&self) -> bool {
        matches!(self, TestPhase::Downloading | TestPhase::Uploading)
    }

    /// Whether the run is over and may be restarted.
    pub fn is_finished(&self) -> bool {
        matches!(self, TestPhase::Complete | TestPhase::Error)
    }
}

impl fmt::Display for TestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestPhase::Init => "init",
            TestPhase::Ping => "ping",
            TestPhase::Downloading => "downloading",
            TestPhase::Uploading => "uploading",
            TestPhase::Complete => "complete",
            TestPhase::Error => "error",
        };
        f.write_str(name)
    }
}

/// Figures reported by the last stage of the background chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub download: f64,
    pub upload: f64,
    pub ping: f64,
    pub server: String,
}

/// Results reported by the background chain, one per stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    ServerLocated(String),
    /// Latency in milliseconds
    PingMeasured(f64),
    /// Settled download speed in Mbps
    DownloadSettled(f64),
    /// Upload baseline in Mbps
    UploadSampled(f64),
    Completed(Completion),
    /// The chain terminated abnormally
    Fault(String),
}

impl StageEvent {
    fn name(&self) -> &'static str {
        match self {
            StageEvent::ServerLocated(_) => "server location",
            StageEvent::PingMeasured(_) => "ping result",
            StageEvent::DownloadSettled(_) => "download result",
            StageEvent::UploadSampled(_) => "upload result",
            StageEvent::Completed(_) => "completion",
            StageEvent::Fault(_) => "fault",
        }
    }
}

/// Everything the event loop can deliver to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Animation frame
    Tick,
    /// Stage result tagged with the run that produced it
    Stage { run: u64, event: StageEvent },
    /// Restart key
    Restart,
    /// Quit key
    Quit,
}

/// Parameters for a fresh background chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainRequest {
    /// Run the chain reports for
    pub run: u64,
    /// Seed for the chain's own fallback and completion draws
    pub seed: u64,
}

/// What the event loop must do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Keep going
    None,
    /// Abort any running chain and spawn a new one
    Spawn(ChainRequest),
    /// Abort the running chain
    Halt,
    /// Leave the event loop
    Quit,
}

/// Error information for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    /// Error message
    pub message: String,
    /// Optional suggestion for resolution
    pub suggestion: Option<String>,
}

impl From<DialError> for ErrorInfo {
    fn from(error: DialError) -> Self {
        Self { message: error.message, suggestion: error.suggestion }
    }
}

/// State of a single run. Replaced wholesale on restart.
#[derive(Debug, Clone)]
pub struct RunState {
    pub phase: TestPhase,
    /// Download speed in Mbps
    pub download_speed: f64,
    /// Upload speed in Mbps
    pub upload_speed: f64,
    /// Latency in milliseconds
    pub ping: f64,
    pub server_label: String,
    filter: AnimationFilter,
    pub target_value: f64,
    /// Download samples for the history chart
    pub history: HistoryBuffer,
    pub start_time: Instant,
    /// Wall time of the run, set on completion
    pub duration: Option<Duration>,
    pub last_error: Option<ErrorInfo>,
    /// Seed of the download and upload curves
    pub seed: u64,
}

impl RunState {
    pub fn new(seed: u64, now: Instant) -> Self {
        Self {
            phase: TestPhase::Init,
            download_speed: 0.0,
            upload_speed: 0.0,
            ping: 0.0,
            server_label: String::new(),
            filter: AnimationFilter::at(0.0),
            target_value: 0.0,
            history: HistoryBuffer::new(),
            start_time: now,
            duration: None,
            last_error: None,
            seed,
        }
    }

    /// The smoothed value shown on the gauge.
    pub fn displayed_value(&self) -> f64 {
        self.filter.displayed()
    }

    /// Seconds since the run was created.
    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.start_time).as_secs_f64()
    }
}

/// Sequences the phases of a run.
pub struct Orchestrator {
    state: RunState,
    run: u64,
    random: Box<dyn RandomSource>,
}

impl Orchestrator {
    /// Create an orchestrator whose first run starts at `now`. Call
    /// [`Orchestrator::start`] to obtain the chain for it.
    pub fn new(mut random: Box<dyn RandomSource>, now: Instant) -> Self {
        let state = RunState::new(random.next_seed(), now);
        Self { state, run: 0, random }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Identifier of the current run.
    pub fn run(&self) -> u64 {
        self.run
    }

    /// Begin a fresh run at `now`, discarding all previous state.
    pub fn start(&mut self, now: Instant) -> ChainRequest {
        self.run += 1;
        self.state = RunState::new(self.random.next_seed(), now);
        info!("Starting run {} with seed {}", self.run, self.state.seed);

        ChainRequest { run: self.run, seed: self.random.next_seed() }
    }

    /// Apply one event.
    pub fn handle(&mut self, event: AppEvent, now: Instant) -> Command {
        match event {
            AppEvent::Quit => Command::Quit,
            AppEvent::Restart => {
                if self.state.phase.is_finished() {
                    Command::Spawn(self.start(now))
                } else {
                    debug!("Ignoring restart during {}", self.state.phase);
                    Command::None
                }
            }
            AppEvent::Tick => {
                self.tick(now);
                Command::None
            }
            AppEvent::Stage { run, event } => {
                if run != self.run {
                    debug!(
                        "Ignoring {} from stale run {} (current run {})",
                        event.name(),
                        run,
                        self.run
                    );
                    return Command::None;
                }

                match self.apply(event, now) {
                    Ok(()) => Command::None,
                    Err(error) => self.fail(error),
                }
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        let elapsed = self.state.elapsed_secs(now);
        let seed = self.state.seed;

        match self.state.phase {
            TestPhase::Downloading => {
                if let Some(target) = DOWNLOAD.target(elapsed, seed) {
                    self.state.target_value = target;
                    self.state.download_speed = target;
                    self.state.history.push(target);
                }
            }
            TestPhase::Uploading => {
                if let Some(target) = UPLOAD.target(elapsed, seed) {
                    self.state.target_value = target;
                    self.state.upload_speed = target;
                }
            }
            _ => return,
        }

        self.state.filter.step(self.state.target_value);
    }

    fn apply(
        &mut self,
        event: StageEvent,
        now: Instant,
    ) -> Result<(), DialError> {
        let phase = self.state.phase;

        if phase.is_finished() {
            debug!("Ignoring {} after the run ended ({})", event.name(), phase);
            return Ok(());
        }

        match (phase, event) {
            (_, StageEvent::Fault(message)) => {
                return Err(DialError::fault(message));
            }
            (TestPhase::Init, StageEvent::ServerLocated(label)) => {
                self.state.server_label = label;
                self.enter(TestPhase::Ping);
            }
            (TestPhase::Ping, StageEvent::PingMeasured(ms)) => {
                self.state.ping = checked(ms, "ping")?;
                self.state.target_value = 0.0;
                self.state.filter.snap_to(0.0);
                self.enter(TestPhase::Downloading);
            }
            (TestPhase::Downloading, StageEvent::DownloadSettled(mbps)) => {
                let mbps = checked(mbps, "download speed")?;
                self.state.download_speed = mbps;
                self.state.target_value = mbps;
                self.state.history.push(mbps);
            }
            (TestPhase::Downloading, StageEvent::UploadSampled(mbps)) => {
                let mbps = checked(mbps, "upload speed")?;
                self.state.upload_speed = mbps;
                self.state.target_value = mbps;
                self.enter(TestPhase::Uploading);
            }
            (TestPhase::Uploading, StageEvent::Completed(completion)) => {
                let download = checked(completion.download, "download speed")?;
                let upload = checked(completion.upload, "upload speed")?;
                let ping = checked(completion.ping, "ping")?;

                self.state.download_speed = download;
                self.state.upload_speed = upload;
                self.state.ping = ping;
                self.state.server_label = completion.server;
                self.state.duration =
                    Some(now.saturating_duration_since(self.state.start_time));

                debug!(
                    "Run {} kept {} download samples",
                    self.run,
                    self.state.history.len()
                );

                let peak = download.max(upload);
                self.state.target_value = peak;
                self.state.filter.snap_to(peak);
                self.enter(TestPhase::Complete);
            }
            (phase, event) => {
                return Err(DialError::fault(format!(
                    "unexpected {} while {}",
                    event.name(),
                    phase
                )));
            }
        }

        Ok(())
    }

    fn enter(&mut self, phase: TestPhase) {
        info!("Run {}: {} -> {}", self.run, self.state.phase, phase);
        self.state.phase = phase;
    }

    fn fail(&mut self, error: DialError) -> Command {
        warn!("Run {} halted: {}", self.run, error.message);
        self.state.last_error = Some(error.into());
        self.enter(TestPhase::Error);
        Command::Halt
    }
}

/// Stage values must be finite and non-negative.
fn checked(value: f64, what: &str) -> Result<f64, DialError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DialError::fault(format!("invalid {what}: {value}")))
    }
}
