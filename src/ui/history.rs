use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::history::{humanize_since, SessionRecord};
use crate::util;
use crate::App;

/// Scroll position for the history table
#[derive(Debug, Default, Clone, Copy)]
pub struct HistoryViewState {
    pub scroll_offset: usize,
}

/// Pure presenter for a single session row
pub fn present_row(record: &SessionRecord) -> Row<'static> {
    let healing_style = if record.healing_resolved > 0 {
        Style::default().fg(Color::Green)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    let miss_count = record.spawned.saturating_sub(record.resolved);
    let resolved_style = if miss_count == 0 && record.resolved > 0 {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(humanize_since(record.played_at)),
        Cell::from(util::format_time(record.duration_secs)),
        Cell::from(record.score.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{}/{}", record.resolved, record.spawned)).style(resolved_style),
        Cell::from(record.healing_resolved.to_string()).style(healing_style),
    ])
}

/// Render the Session History screen
pub fn render_history(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Session table
            Constraint::Length(3), // Instructions
        ])
        .split(area);

    let totals = app
        .game
        .history()
        .and_then(|db| db.totals().ok())
        .unwrap_or_default();
    let title_text = format!(
        "{} sessions · {} thoughts dissolved · best {}",
        totals.sessions, totals.resolved, totals.best_score
    );

    let title = Paragraph::new(title_text)
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let records = app
        .game
        .history()
        .and_then(|db| db.recent(200).ok())
        .unwrap_or_default();

    if records.is_empty() {
        let no_data = Paragraph::new("No sessions yet. Play one to start your history.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        // borders + header
        let table_height = chunks[1].height.saturating_sub(3) as usize;
        let max_scroll = records.len().saturating_sub(table_height);
        if app.history_state.scroll_offset > max_scroll {
            app.history_state.scroll_offset = max_scroll;
        }

        let header = Row::new(vec![
            Cell::from("Played"),
            Cell::from("Length"),
            Cell::from("Score"),
            Cell::from("Dissolved"),
            Cell::from("Healing"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let visible_rows: Vec<Row> = records
            .iter()
            .skip(app.history_state.scroll_offset)
            .take(table_height)
            .map(present_row)
            .collect();

        let widths = [
            Constraint::Length(20), // Played
            Constraint::Length(8),  // Length
            Constraint::Length(7),  // Score
            Constraint::Length(11), // Dissolved
            Constraint::Min(7),     // Healing
        ];

        let table = Table::new(visible_rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Sessions"))
            .column_spacing(2);

        f.render_widget(table, chunks[1]);
    }

    let instructions =
        Paragraph::new("(↑/↓) scroll  (PgUp/PgDn) page  (Home) top  (e)xport csv  (b) back")
            .alignment(Alignment::Center)
            .wrap(ratatui::widgets::Wrap { trim: true });
    f.render_widget(instructions, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    fn sample_record() -> SessionRecord {
        SessionRecord {
            played_at: Local::now(),
            duration_secs: 30,
            score: 12,
            resolved: 9,
            spawned: 11,
            healing_resolved: 2,
        }
    }

    #[test]
    fn row_renders_session_fields() {
        let backend = TestBackend::new(80, 4);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|f| {
                let widths = [
                    Constraint::Length(20),
                    Constraint::Length(8),
                    Constraint::Length(7),
                    Constraint::Length(11),
                    Constraint::Min(7),
                ];
                let table = Table::new(vec![present_row(&sample_record())], widths);
                f.render_widget(table, f.area());
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("now"));
        assert!(text.contains("00:30"));
        assert!(text.contains("12"));
        assert!(text.contains("9/11"));
    }

    #[test]
    fn perfect_session_shows_full_ratio() {
        let record = SessionRecord {
            resolved: 11,
            spawned: 11,
            ..sample_record()
        };

        let backend = TestBackend::new(80, 4);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let widths = [Constraint::Length(20); 5];
                let table = Table::new(vec![present_row(&record)], widths);
                f.render_widget(table, f.area());
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("11/11"));
    }
}
