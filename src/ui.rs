//! TUI rendering for City Bands Finder.
//!
//! One screen: a title, the city search form, a body whose content is chosen
//! from [`Status`], and a footer with the key bindings.

use crate::app::{App, Phase, Status};
use crate::models::Artist;
use ratatui::{prelude::*, widgets::*};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Renders one frame of the TUI based on current application state.
///
/// # Arguments
///
/// * `f` - The ratatui frame to draw into (from `terminal.draw()`).
/// * `app` - Current application state (city field, status, selection).
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Search form
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(f.size());

    let title = Paragraph::new(" City Bands Finder ")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    render_form(f, app, chunks[1]);

    // Loading wins over error, error wins over the list.
    match &app.status {
        Status::Loading(phase) => render_loading(f, app, phase, chunks[2]),
        Status::Error(message) => render_error(f, message, chunks[2]),
        Status::Loaded(bands) => render_band_list(f, bands, app.selected_index, chunks[2]),
        Status::Idle => render_hint(f, chunks[2]),
    }

    render_footer(f, app, chunks[3]);
}

/// City field on the left, search button on the right.
fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(12)])
        .split(area);

    let input = if app.city.is_empty() {
        Paragraph::new(Span::styled(
            "Enter a city",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(app.city.as_str())
    };
    let input = input.block(
        Block::default()
            .title(" City ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(input, chunks[0]);

    let button = Paragraph::new("Search")
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(button, chunks[1]);

    // Keep the cursor inside the field's border.
    let max_x = chunks[0].x + chunks[0].width.saturating_sub(2);
    let cursor_x = (chunks[0].x + 1 + app.city.chars().count() as u16).min(max_x);
    f.set_cursor(cursor_x, chunks[0].y + 1);
}

fn render_loading(f: &mut Frame, app: &App, phase: &Phase, area: Rect) {
    let spinner = SPINNER[app.tick_count % SPINNER.len()];
    let text = match phase {
        Phase::Locating => format!("{} Locating you...", spinner),
        Phase::Searching(_) => format!("{} Loading bands...", spinner),
    };
    let p = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    f.render_widget(p, area);
}

fn render_error(f: &mut Frame, message: &str, area: Rect) {
    let p = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    f.render_widget(p, area);
}

fn render_hint(f: &mut Frame, area: Rect) {
    let p = Paragraph::new("Type a city and press Enter to find bands formed there recently.")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    f.render_widget(p, area);
}

/// One entry per band: name, then area and formation date when known.
fn render_band_list(f: &mut Frame, bands: &[Artist], selected: usize, area: Rect) {
    let items: Vec<ListItem> = bands
        .iter()
        .map(|band| {
            let mut lines = vec![Line::from(Span::styled(
                band.name.as_str(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))];
            if let Some(area_name) = band.area_name() {
                lines.push(Line::from(vec![
                    Span::styled("  Location: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(area_name),
                ]));
            }
            if let Some(begin) = band.begin() {
                lines.push(Line::from(vec![
                    Span::styled("  Formed: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(begin),
                ]));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Recently Formed Bands ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
        .highlight_style(Style::default().bg(Color::Rgb(30, 30, 60)))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" Enter search  ↑/↓ select  Esc quit")];
    if let Status::Loaded(bands) = &app.status {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            format!("{} bands", bands.len()),
            Style::default().fg(Color::Cyan),
        ));
    }
    let help = Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LOCATION_NOT_FOUND;
    use crate::bands::{QueryOutcome, FETCH_FAILED, NO_RESULTS};
    use crate::models::{Area, LifeSpan};
    use ratatui::backend::TestBackend;

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn searching(city: &str) -> App {
        let mut app = App::new();
        app.city = city.to_string();
        app.submit_search();
        app
    }

    #[test]
    fn idle_shows_placeholder_and_hint() {
        let screen = draw(&App::new());
        assert!(screen.contains("City Bands Finder"));
        assert!(screen.contains("Enter a city"));
        assert!(screen.contains("Type a city and press Enter"));
    }

    #[test]
    fn loading_hides_everything_else() {
        let app = searching("Portland");
        let screen = draw(&app);
        assert!(screen.contains("Loading bands..."));
        assert!(screen.contains("Portland"));
        assert!(!screen.contains("Recently Formed Bands"));
    }

    #[test]
    fn locating_has_its_own_message() {
        let mut app = App::new();
        app.start_location();
        assert!(draw(&app).contains("Locating you..."));
    }

    #[test]
    fn error_messages_are_shown_verbatim() {
        for (outcome, message) in [
            (QueryOutcome::Empty, NO_RESULTS),
            (QueryOutcome::Failed, FETCH_FAILED),
        ] {
            let mut app = searching("Portland");
            app.apply_bands(app.generation(), outcome);
            let screen = draw(&app);
            assert!(screen.contains(message), "missing {message:?}");
            assert!(!screen.contains("Loading bands..."));
        }
    }

    #[test]
    fn location_error_is_shown() {
        let mut app = App::new();
        app.status = Status::Error(LOCATION_NOT_FOUND.to_string());
        assert!(draw(&app).contains("Could not determine your location."));
    }

    #[test]
    fn band_entries_show_optional_fields() {
        let mut app = searching("Portland");
        let bands = vec![
            Artist {
                id: "1".into(),
                name: "Glass Harbor".into(),
                area: Some(Area {
                    name: "Portland".into(),
                }),
                life_span: Some(LifeSpan {
                    begin: Some("2016-05".into()),
                }),
            },
            Artist {
                id: "2".into(),
                name: "Quiet Tide".into(),
                area: None,
                life_span: Some(LifeSpan {
                    begin: Some("2019".into()),
                }),
            },
        ];
        app.apply_bands(app.generation(), QueryOutcome::Found(bands));

        let screen = draw(&app);
        assert!(screen.contains("Glass Harbor"));
        assert!(screen.contains("Location: Portland"));
        assert!(screen.contains("Formed: 2016-05"));
        assert!(screen.contains("Quiet Tide"));
        assert!(screen.contains("Formed: 2019"));
        assert_eq!(screen.matches("Location:").count(), 1);
        assert!(screen.contains("2 bands"));
    }
}
