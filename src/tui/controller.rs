//! Terminal lifecycle and the event loop.
//!
//! The TuiController owns the terminal: it enters the alternate screen,
//! runs the event loop that feeds key presses, animation ticks and stage
//! results into the orchestrator, and restores the terminal afterwards.

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::{
    cursor,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use futures::{Stream, StreamExt};
use log::{debug, info};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};

use super::renderer::render_frame;
use crate::config::SimulationConfig;
use crate::errors::DialError;
use crate::locator::Locator;
use crate::orchestrator::{AppEvent, Command, Orchestrator, RunState};
use crate::signal::RandomSource;
use crate::stages::spawn_chain;

/// Owns the terminal for the lifetime of the visualizer.
pub struct TuiController {
    /// Terminal instance, present once initialized
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    /// Raw mode is on
    initialized: bool,
}

impl TuiController {
    pub fn new() -> Self {
        Self { terminal: None, initialized: false }
    }

    /// Enter the alternate screen and hide the cursor.
    pub fn init(&mut self) -> Result<(), DialError> {
        enable_raw_mode()?;
        self.initialized = true;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        self.terminal = Some(terminal);

        Ok(())
    }

    /// Leave the alternate screen, show the cursor and leave raw mode.
    pub fn cleanup(&mut self) -> Result<(), DialError> {
        if !self.initialized {
            return Ok(());
        }

        if let Some(ref mut terminal) = self.terminal {
            execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
        }

        disable_raw_mode()?;

        self.initialized = false;
        self.terminal = None;

        Ok(())
    }

    /// Run speed tests until the user quits and return the last run.
    pub async fn run<L: Locator>(
        &mut self,
        locator: Arc<L>,
        config: SimulationConfig,
        random: Box<dyn RandomSource>,
    ) -> Result<RunState, DialError> {
        let terminal = self
            .terminal
            .as_mut()
            .ok_or_else(|| DialError::terminal("terminal is not initialized"))?;

        run_loop(terminal, EventStream::new(), locator, config, random).await
    }
}

impl Default for TuiController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TuiController {
    /// Restores the terminal if `cleanup` was skipped.
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Map a key press to an event. `q`, `Esc` and `Ctrl+C` quit, `r` restarts.
pub fn key_event(key: KeyEvent) -> Option<AppEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(AppEvent::Quit)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Quit),
        KeyCode::Char('r') => Some(AppEvent::Restart),
        _ => None,
    }
}

/// The event loop. Stage results, key presses and, while a transfer is
/// animating, frame ticks are handled one at a time; the screen is redrawn
/// after each.
pub async fn run_loop<B, S, L>(
    terminal: &mut Terminal<B>,
    mut input: S,
    locator: Arc<L>,
    config: SimulationConfig,
    random: Box<dyn RandomSource>,
) -> Result<RunState, DialError>
where
    B: Backend,
    S: Stream<Item = io::Result<Event>> + Unpin,
    L: Locator,
{
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let mut orchestrator = Orchestrator::new(random, now());
    let request = orchestrator.start(now());
    let mut chain =
        spawn_chain(Arc::clone(&locator), config, request, events_tx.clone());

    let mut ticker = interval(config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    draw(terminal, orchestrator.state())?;

    loop {
        let animating = orchestrator.state().phase.is_animating();

        let event = tokio::select! {
            maybe_input = input.next() => match maybe_input {
                Some(Ok(Event::Key(key))) => match key_event(key) {
                    Some(event) => event,
                    None => continue,
                },
                Some(Ok(Event::Resize(_, _))) => {
                    draw(terminal, orchestrator.state())?;
                    continue;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => AppEvent::Quit,
            },
            Some(event) = events_rx.recv() => event,
            _ = ticker.tick(), if animating => AppEvent::Tick,
        };

        match orchestrator.handle(event, now()) {
            Command::None => {}
            Command::Halt => {
                debug!("Stopping chain for run {}", chain.run());
                chain.abort();
            }
            Command::Spawn(request) => {
                debug!("Replacing chain for run {}", chain.run());
                chain = spawn_chain(
                    Arc::clone(&locator),
                    config,
                    request,
                    events_tx.clone(),
                );
            }
            Command::Quit => {
                info!("Quit requested during {}", orchestrator.state().phase);
                break;
            }
        }

        draw(terminal, orchestrator.state())?;
    }

    chain.abort();
    Ok(orchestrator.state().clone())
}

fn draw<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &RunState,
) -> Result<(), DialError> {
    terminal.draw(|frame| render_frame(frame, state))?;
    Ok(())
}

/// Current time on the runtime clock, so paused test time applies.
fn now() -> std::time::Instant {
    Instant::now().into_std()
}
