use crate::bands::{QueryOutcome, FETCH_FAILED, NO_RESULTS};
use crate::location::LocationOutcome;
use crate::models::Artist;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};


pub const LOCATION_NOT_FOUND: &str = "Could not determine your location. Enter a city to search.";

/// What an outstanding request is doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Locating,
    Searching(String),
}

/// The single source of truth for what the body of the screen shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading(Phase),
    Error(String),
    Loaded(Vec<Artist>),
}

/// Work the main loop has to start on behalf of the app.
///
/// Every effect carries the generation it was issued under; results are
/// handed back with it so stale ones can be dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AcquireLocation { generation: u64 },
    SearchBands { generation: u64, city: String },
}

#[derive(Debug, Default)]
pub struct App {
    /// Contents of the city field.
    pub city: String,
    pub status: Status,
    pub selected_index: usize,
    pub tick_count: usize,
    pub should_quit: bool,
    generation: u64,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recently issued request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, Status::Loading(_))
    }

    /// Bands currently on screen; empty unless a search succeeded.
    pub fn bands(&self) -> &[Artist] {
        match &self.status {
            Status::Loaded(bands) => bands,
            _ => &[],
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Starts automatic location acquisition.
    pub fn start_location(&mut self) -> Effect {
        let generation = self.next_generation();
        self.status = Status::Loading(Phase::Locating);
        Effect::AcquireLocation { generation }
    }

    /// Searches for the city currently in the field. Blank input is ignored.
    pub fn submit_search(&mut self) -> Option<Effect> {
        let city = self.city.trim().to_string();
        if city.is_empty() {
            debug!("Ignoring search with an empty city.");
            return None;
        }
        let generation = self.next_generation();
        self.status = Status::Loading(Phase::Searching(city.clone()));
        Some(Effect::SearchBands { generation, city })
    }

    /// Applies a finished location lookup and chains the band search.
    pub fn apply_location(&mut self, generation: u64, outcome: LocationOutcome) -> Option<Effect> {
        if generation != self.generation {
            debug!(
                "Dropping stale location result (generation {}, current {})",
                generation, self.generation
            );
            return None;
        }

        match outcome {
            LocationOutcome::Resolved { city, source } => {
                info!("Located {} via {:?}", city, source);
                if !self.city.trim().is_empty() {
                    // The user started typing while we were locating; their text wins.
                    debug!("Keeping typed city {:?} over {:?}", self.city, city);
                    self.status = Status::Idle;
                    return None;
                }
                self.city = city;
                let effect = self.submit_search();
                if effect.is_none() {
                    self.status = Status::Error(LOCATION_NOT_FOUND.to_string());
                }
                effect
            }
            LocationOutcome::NotFound => {
                self.status = Status::Error(LOCATION_NOT_FOUND.to_string());
                None
            }
        }
    }

    /// Applies a finished band search. Every outcome ends the loading state.
    pub fn apply_bands(&mut self, generation: u64, outcome: QueryOutcome) {
        if generation != self.generation {
            debug!(
                "Dropping stale band results (generation {}, current {})",
                generation, self.generation
            );
            return;
        }

        self.selected_index = 0;
        self.status = match outcome {
            QueryOutcome::Found(bands) => Status::Loaded(bands),
            QueryOutcome::Empty => Status::Error(NO_RESULTS.to_string()),
            QueryOutcome::Failed => Status::Error(FETCH_FAILED.to_string()),
        };
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Effect> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => return self.submit_search(),
            KeyCode::Backspace => {
                self.city.pop();
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.city.push(c);
            }
            KeyCode::Down => {
                let len = self.bands().len();
                if len > 0 {
                    self.selected_index = (self.selected_index + 1) % len;
                }
            }
            KeyCode::Up => {
                let len = self.bands().len();
                if len > 0 {
                    self.selected_index = self.selected_index.checked_sub(1).unwrap_or(len - 1);
                }
            }
            _ => {}
        }
        None
    }
}
