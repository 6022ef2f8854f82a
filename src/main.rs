use citybands_tui::{
    api::WebServices,
    app::{App, Effect},
    bands::{self, BandQuery, QueryOutcome},
    config::Config,
    events::{spawn_lookup, Event, EventHandler},
    location::{self, ConfiguredDevice, DeviceLocator, LocationOutcome},
    logging, ui,
};
use color_eyre::Result;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// Everything a spawned lookup needs, cheap to clone into tasks.
struct Services {
    web: WebServices,
    device: Arc<dyn DeviceLocator>,
    query: BandQuery,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging(logging::LOG_DIR)?;
    color_eyre::install()?;
    install_panic_hook();

    let config = Config::load();
    let services = Services {
        web: WebServices::from_config(&config.api)?,
        device: Arc::new(ConfiguredDevice::new(config.location.clone())),
        query: BandQuery::from_config(&config.api, &config.search),
    };

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut app = App::new();
    let mut events = EventHandler::new(config.ui.tick_rate_ms);

    let effect = app.start_location();
    dispatch(effect, &services, &events.tx);

    let result = run(&mut terminal, &mut app, &mut events, &services).await;

    restore_terminal(terminal)?;
    info!("Exiting.");
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    services: &Services,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, app))?;

        let Some(event) = events.next().await else {
            break;
        };
        match event {
            Event::Tick => app.on_tick(),
            Event::Input(key) => {
                if let Some(effect) = app.handle_key(key) {
                    dispatch(effect, services, &events.tx);
                }
            }
            Event::LocationResolved {
                generation,
                outcome,
            } => {
                if let Some(effect) = app.apply_location(generation, outcome) {
                    dispatch(effect, services, &events.tx);
                }
            }
            Event::BandsLoaded {
                generation,
                outcome,
            } => app.apply_bands(generation, outcome),
        }
    }
    Ok(())
}

/// Spawns the lookup behind `effect`; its result comes back as an [`Event`].
fn dispatch(effect: Effect, services: &Services, tx: &UnboundedSender<Event>) {
    debug!("Dispatching {:?}", effect);
    let tx = tx.clone();
    match effect {
        Effect::AcquireLocation { generation } => {
            let device = services.device.clone();
            let web = services.web.clone();
            spawn_lookup(
                tx,
                async move {
                    location::acquire_city(
                        device.as_ref(),
                        web.ip_locator.as_ref(),
                        web.geocoder.as_ref(),
                    )
                    .await
                },
                LocationOutcome::NotFound,
                move |outcome| Event::LocationResolved {
                    generation,
                    outcome,
                },
            );
        }
        Effect::SearchBands { generation, city } => {
            let directory = services.web.directory.clone();
            let query = services.query;
            spawn_lookup(
                tx,
                async move {
                    // App never issues blank searches; answer anyway so loading ends.
                    query
                        .run(directory.as_ref(), &city, bands::current_year())
                        .await
                        .unwrap_or(QueryOutcome::Empty)
                },
                QueryOutcome::Failed,
                move |outcome| Event::BandsLoaded {
                    generation,
                    outcome,
                },
            );
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    drop(terminal);
    reset_terminal()
}

/// Leaves raw mode and the alternate screen.
fn reset_terminal() -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    Ok(())
}

/// Restores the terminal before reporting a panic on the UI thread.
///
/// Lookup tasks run on runtime workers and are recovered by `spawn_lookup`,
/// so their panics leave the screen alone.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if std::thread::current().name() == Some("main") {
            reset_terminal().ok();
        }
        original_hook(panic_info);
    }));
}
