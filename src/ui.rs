pub mod charting;
pub mod history;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Widget, Wrap,
    },
};
use webbrowser::Browser;

use crate::{
    celebration::Effects, game::Phase, highscore::RecordStatus, thought::ThoughtKind, util, App,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Seconds left at which the countdown turns urgent.
const ENDGAME_SECS: u32 = 5;

/// Indices line up with the ranges bursts are spawned with in `celebration`:
/// the first half is the spark palette, the second half the bloom palette.
const PARTICLE_COLORS: [Color; 8] = [
    Color::Magenta,
    Color::Blue,
    Color::Cyan,
    Color::White,
    Color::Green,
    Color::LightGreen,
    Color::Yellow,
    Color::LightCyan,
];

/// The clickable field under the one-line HUD. Mouse handling maps terminal
/// cells back into game coordinates through this same rect.
pub fn field_rect(area: Rect) -> Rect {
    Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let game = &self.game;

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);

        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let cyan_bold_style = Style::default().patch(bold_style).fg(Color::Cyan);

        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);

        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let dim_italic_style = Style::default()
            .patch(italic_style)
            .add_modifier(Modifier::DIM);

        let magenta_style = Style::default().fg(Color::Magenta);

        match game.phase() {
            Phase::Idle => {
                let summary_line = match game.summary() {
                    Some(s) => format!(
                        "last session: {} pts, {}/{} dissolved",
                        s.score, s.resolved, s.spawned
                    ),
                    None => String::new(),
                };
                let lines = vec![
                    Line::from(Span::styled("s a n a", cyan_bold_style)),
                    Line::from(""),
                    Line::from(Span::styled(
                        "dissolve the negative thoughts before they settle",
                        dim_italic_style,
                    )),
                    Line::from(""),
                    Line::from(format!(
                        "{} seconds · {} pace · {} phrases",
                        game.config.duration_secs, game.config.level, game.pack_name(),
                    )),
                    Line::from(vec![
                        Span::raw("best score "),
                        Span::styled(game.best().to_string(), bold_style),
                    ]),
                    Line::from(Span::styled(summary_line, dim_italic_style)),
                    Line::from(""),
                    Line::from(Span::styled(
                        "(space) begin  (↑/↓) session time  (l)evel  (h)istory",
                        italic_style,
                    )),
                    Line::from(Span::styled("(s)ound  (v)oice  (esc) quit", italic_style)),
                ];
                let box_area = util::centered_rect(64, lines.len() as u16, area);
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .render(box_area, buf);
            }
            Phase::Playing => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(1), Constraint::Min(0)])
                    .split(area);

                let hud = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(33),
                        Constraint::Percentage(34),
                        Constraint::Percentage(33),
                    ])
                    .split(chunks[0]);

                Paragraph::new(Span::styled(
                    format!(" score {}", game.score()),
                    bold_style,
                ))
                .alignment(Alignment::Left)
                .render(hud[0], buf);

                let left = game.time_left_secs();
                let timer_style = if left <= ENDGAME_SECS {
                    red_bold_style
                } else {
                    dim_bold_style
                };
                Paragraph::new(Span::styled(util::format_time(left), timer_style))
                    .alignment(Alignment::Center)
                    .render(hud[1], buf);

                Paragraph::new(Span::styled(
                    format!("best {} ", game.best()),
                    dim_bold_style,
                ))
                .alignment(Alignment::Right)
                .render(hud[2], buf);

                let field = chunks[1];
                for thought in game.thoughts() {
                    let x = field.x + thought.col;
                    let y = field.y + thought.row;
                    if x >= field.right() || y >= field.bottom() {
                        continue;
                    }
                    let mut style = match (thought.kind, thought.is_resolved()) {
                        (ThoughtKind::Negative, false) => Style::default().fg(Color::LightBlue),
                        (ThoughtKind::Healing, false) => green_bold_style,
                        (_, true) => Style::default()
                            .add_modifier(Modifier::DIM | Modifier::CROSSED_OUT),
                    };
                    if game.focused_id() == Some(thought.id) && !thought.is_resolved() {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    let label = format!("{} {}", thought.kind.icon(), thought.text);
                    buf.set_stringn(x, y, &label, thought.width as usize, style);
                }

                if let Some(banner) = game.banner() {
                    let width = field.width.saturating_sub(6).clamp(24, 56);
                    let box_area = util::centered_rect(width, 6, field);
                    Clear.render(box_area, buf);
                    let text = vec![
                        Line::from(Span::styled(banner.phrase.clone(), green_bold_style)),
                        Line::from(""),
                        Line::from(Span::styled(banner.explanation.clone(), italic_style)),
                    ];
                    Paragraph::new(text)
                        .block(
                            Block::default()
                                .borders(Borders::ALL)
                                .border_style(Style::default().fg(Color::Green))
                                .title(" a kinder voice "),
                        )
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true })
                        .render(box_area, buf);
                }
            }
            Phase::Finished => {
                let Some(summary) = game.summary() else {
                    return;
                };

                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .vertical_margin(VERTICAL_MARGIN)
                    .constraints([
                        Constraint::Min(1),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Length(1),
                    ])
                    .split(area);

                let coords: Vec<(f64, f64)> = game
                    .score_curve()
                    .iter()
                    .map(|p| (p.t as f64, p.score as f64))
                    .collect();
                let (span_secs, highest) =
                    charting::compute_chart_params(&coords, summary.duration_secs);

                let datasets = vec![Dataset::default()
                    .marker(ratatui::symbols::Marker::Braille)
                    .style(magenta_style)
                    .graph_type(GraphType::Line)
                    .data(&coords)];

                let chart = Chart::new(datasets)
                    .x_axis(
                        Axis::default()
                            .title("seconds")
                            .style(Style::default().fg(Color::Gray))
                            .bounds([0.0, span_secs])
                            .labels(vec![
                                Span::styled("0", bold_style),
                                Span::styled(charting::format_label(span_secs), bold_style),
                            ]),
                    )
                    .y_axis(
                        Axis::default()
                            .title("score")
                            .style(Style::default().fg(Color::Gray))
                            .bounds([0.0, highest])
                            .labels(vec![
                                Span::styled("0", bold_style),
                                Span::styled(charting::format_label(highest), bold_style),
                            ]),
                    );
                chart.render(chunks[0], buf);

                let stats_line = format!(
                    "{} pts   {}/{} dissolved   {} healing   {} per min",
                    summary.score,
                    summary.resolved,
                    summary.spawned,
                    summary.healing_resolved,
                    summary.pace_per_min,
                );
                Paragraph::new(Span::styled(stats_line, bold_style))
                    .alignment(Alignment::Center)
                    .render(chunks[1], buf);

                let record_line = match summary.record {
                    RecordStatus::NewBest => Span::styled(
                        "new best score!",
                        green_bold_style.patch(italic_style),
                    ),
                    RecordStatus::NotBeaten => {
                        Span::styled(format!("best {}", summary.best), dim_italic_style)
                    }
                };
                Paragraph::new(record_line)
                    .alignment(Alignment::Center)
                    .render(chunks[2], buf);

                let legend = if Browser::is_available() {
                    "(space) again / (h)istory / (t)weet / (esc)ape"
                } else {
                    "(space) again / (h)istory / (esc)ape"
                };
                Paragraph::new(Span::styled(legend, italic_style))
                    .alignment(Alignment::Center)
                    .render(chunks[4], buf);
            }
        }

        // Bursts use field coordinates while a session runs, screen
        // coordinates on the results banner.
        let origin = match game.phase() {
            Phase::Playing => field_rect(area),
            _ => area,
        };
        render_particles(&self.effects, origin, buf);
    }
}

fn render_particles(effects: &Effects, area: Rect, buf: &mut Buffer) {
    for particle in &effects.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let x = particle.x as u16;
        let y = particle.y as u16;
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = PARTICLE_COLORS[particle.color_index % PARTICLE_COLORS.len()];
        let fade = particle.fade();
        let style = if particle.is_letter() {
            // Banner letters stay readable until they are nearly gone
            if fade > 0.4 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            }
        } else if fade > 0.7 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if fade > 0.3 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(style);
        }
    }
}
