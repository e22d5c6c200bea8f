use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Instant;
use tokio::{
    signal,
    time::{interval, MissedTickBehavior},
};

use crate::config::AppConfig;
use crate::pipeline::{self, PlotState};
use crate::visibility::Series;
use crate::{persistence, render, serial};

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// `q`, `Esc`, or the input stream ending.
    Closed,
    /// Ctrl-C, either as a key press or as SIGINT.
    Interrupted,
}

pub struct Service {
    config: AppConfig,
}

impl Service {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<Exit> {
        let started = Instant::now();
        let started_at = Local::now();
        let config = &self.config;

        let mut source = serial::SerialLineSource::open(
            &config.serial_port,
            config.baud_rate,
            config.read_timeout(),
        )?;
        let mut sink = persistence::Persistence::create(&config.log_directory, started_at)
            .await
            .context("prepare sample log")?;

        println!("Logging from {} at {}", config.serial_port, config.baud_rate);
        println!("Saving to {}", sink.path().display());
        tracing::info!(
            port = %config.serial_port,
            baud = config.baud_rate,
            log = %sink.path().display(),
            max_points = config.max_points,
            "plotter starting"
        );

        let mut state = PlotState::new(config.max_points, started);
        let label = format!("{} @ {}", source.port_name(), config.baud_rate);
        let outcome = match TerminalGuard::enter() {
            Ok(mut terminal) => {
                self.event_loop(&mut terminal, &mut source, &mut sink, &mut state, &label)
                    .await
            }
            Err(err) => Err(err),
        };

        // The terminal guard is gone by now; release the log and the port on every path.
        let closed = sink.close().await;
        drop(source);

        tracing::info!(
            summary = %state.metrics.snapshot(),
            outcome = ?outcome.as_ref().ok(),
            "plotter stopped"
        );

        let exit = outcome?;
        closed?;
        Ok(exit)
    }

    async fn event_loop(
        &self,
        terminal: &mut TerminalGuard,
        source: &mut serial::SerialLineSource,
        sink: &mut persistence::Persistence,
        state: &mut PlotState,
        label: &str,
    ) -> Result<Exit> {
        let mut ticker = interval(self.config.render_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut events = EventStream::new();
        let interrupt = signal::ctrl_c();
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    pipeline::drain(source, sink, state).await?;
                    tick(state, &self.config, Instant::now());
                    terminal.draw(state, label)?;
                }
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) => {
                            if let Some(exit) = handle_key(key, state) {
                                return Ok(exit);
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => return Err(err).context("failed to read terminal input"),
                        None => return Ok(Exit::Closed),
                    }
                }
                _ = &mut interrupt => {
                    tracing::info!("interrupt received, requesting shutdown");
                    return Ok(Exit::Interrupted);
                }
            }
        }
    }
}

/// Render-phase bookkeeping that does not touch the terminal.
pub fn tick(state: &mut PlotState, config: &AppConfig, now: Instant) {
    state.refresh_view(config.y_margin);
    state.idle_for = state.metrics.check_idle(now, config.idle_threshold());
}

/// Applies one key press. Visibility changes are picked up by the next tick.
pub fn handle_key(key: KeyEvent, state: &mut PlotState) -> Option<Exit> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Exit::Interrupted)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(Exit::Closed),
        KeyCode::Char(c) => {
            if let Some(series) = Series::from_key(c) {
                let notice = state.visibility.toggle(series);
                tracing::info!(series = ?series, "{notice}");
                state.status = Some(notice);
            }
            None
        }
        _ => None,
    }
}

/// Raw-mode alternate screen, restored when dropped.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err).context("failed to enter alternate screen");
        }
        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(err) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                Err(err).context("failed to initialise terminal")
            }
        }
    }

    fn draw(&mut self, state: &PlotState, label: &str) -> Result<()> {
        self.terminal
            .draw(|frame| render::draw(frame, state, label))
            .context("failed to draw chart")?;
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn toggle_keys_flip_flags_and_set_status() {
        let mut state = PlotState::new(10, Instant::now());
        assert_eq!(handle_key(press('r'), &mut state), None);
        assert_eq!(handle_key(press('p'), &mut state), None);
        assert!(!state.visibility.raw);
        assert!(state.visibility.scaled);
        assert!(!state.visibility.duty);
        assert_eq!(state.status.as_deref(), Some("PWM display OFF"));
    }

    #[test]
    fn quit_and_interrupt_keys() {
        let mut state = PlotState::new(10, Instant::now());
        assert_eq!(handle_key(press('q'), &mut state), Some(Exit::Closed));
        assert_eq!(
            handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), &mut state),
            Some(Exit::Closed)
        );
        assert_eq!(
            handle_key(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                &mut state
            ),
            Some(Exit::Interrupted)
        );
        assert_eq!(handle_key(press('c'), &mut state), None);
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut state = PlotState::new(10, Instant::now());
        let mut release = press('r');
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_key(release, &mut state), None);
        assert!(state.visibility.raw);
    }
}
