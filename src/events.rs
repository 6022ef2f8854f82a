//! Event types and the main event loop driver for City Bands Finder.
//!
//! This module defines the [`Event`] enum (keyboard input, ticks, and the
//! results of background lookups) and the [`EventHandler`], which runs a
//! background task that polls crossterm for key events and emits periodic
//! [`Event::Tick`]s. The main loop in `main.rs` receives events via
//! [`EventHandler::next`]; lookup tasks report back via [`EventHandler::tx`].

use crate::bands::QueryOutcome;
use crate::location::LocationOutcome;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::error;

/// Events processed by the application event loop.
#[derive(Debug)]
pub enum Event {
    /// Periodic tick used for the loading spinner.
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// Location acquisition finished.
    LocationResolved {
        /// Request generation the lookup was issued under.
        generation: u64,
        outcome: LocationOutcome,
    },
    /// A band search finished.
    BandsLoaded {
        /// Request generation the search was issued under.
        generation: u64,
        outcome: QueryOutcome,
    },
}

/// Multiplexes terminal input, ticks and lookup results into a single stream.
///
/// The sender ([`tx`](EventHandler::tx)) is cloned into every spawned lookup
/// task, while the receiver is consumed by [`next`](EventHandler::next) in the
/// main loop. The input task stops once the handler has been dropped.
pub struct EventHandler {
    /// Sender for posting events from background tasks.
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick task.
    ///
    /// The task polls crossterm with a timeout of `tick_rate_ms`; a key press
    /// is sent as [`Event::Input`] and each elapsed interval as
    /// [`Event::Tick`]. A terminal read failure is logged and ends the task.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(CrosstermEvent::Key(key)) => {
                            if event_tx.send(Event::Input(key)).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Terminal read failed: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        error!("Terminal poll failed: {}", e);
                        break;
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    if event_tx.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event from the channel.
    ///
    /// Never returns `None` while the handler is alive, since it holds a
    /// sender itself.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Runs `lookup` in its own task and posts its result through `tx`.
///
/// A lookup that panics is reported as `fallback`, so whatever is waiting on
/// it always gets an answer.
pub fn spawn_lookup<T, F, E>(tx: mpsc::UnboundedSender<Event>, lookup: F, fallback: T, into_event: E)
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
    E: FnOnce(T) -> Event + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = match tokio::spawn(lookup).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Lookup task failed: {}", e);
                fallback
            }
        };
        let _ = tx.send(into_event(outcome));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finished_lookup_is_posted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_lookup(
            tx,
            async { QueryOutcome::Empty },
            QueryOutcome::Failed,
            |outcome| Event::BandsLoaded {
                generation: 3,
                outcome,
            },
        );

        match rx.recv().await {
            Some(Event::BandsLoaded {
                generation,
                outcome,
            }) => {
                assert_eq!(generation, 3);
                assert_eq!(outcome, QueryOutcome::Empty);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn panicking_lookup_reports_fallback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_lookup(
            tx,
            async {
                if true {
                    panic!("lookup blew up");
                }
                LocationOutcome::NotFound
            },
            LocationOutcome::NotFound,
            |outcome| Event::LocationResolved {
                generation: 7,
                outcome,
            },
        );

        match rx.recv().await {
            Some(Event::LocationResolved {
                generation,
                outcome,
            }) => {
                assert_eq!(generation, 7);
                assert_eq!(outcome, LocationOutcome::NotFound);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
