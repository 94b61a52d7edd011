pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod feedback;
pub mod game;
pub mod highscore;
pub mod history;
pub mod phrases;
pub mod thought;
pub mod ui;
pub mod util;

use crate::{
    celebration::Effects,
    config::{ConfigStore, FileConfigStore, Settings},
    feedback::TerminalFeedback,
    game::{Game, Level, Phase, MAX_DURATION_SECS, MIN_DURATION_SECS, TICK_RATE_MS},
    highscore::{Ledger, RecordStatus},
    history::HistoryDb,
    phrases::PhraseBook,
    thought::Bounds,
    ui::history::HistoryViewState,
};
use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Position, Rect},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::mpsc,
    thread,
    time::Duration,
};
use webbrowser::Browser;

/// calm click-away tui for negative thoughts, with spoken affirmations
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A calm terminal game: negative thoughts drift onto the screen and you dissolve them with a click before they settle. Healing phrases hide among them and are worth more, spoken aloud when your terminal can speak. Your best score and a full session history are kept between runs."
)]
pub struct Cli {
    /// session length in seconds
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(MIN_DURATION_SECS as i64..=MAX_DURATION_SECS as i64))]
    seconds: Option<u32>,

    /// pace the thoughts arrive at
    #[clap(short = 'd', long, value_enum)]
    level: Option<Level>,

    /// language of the built-in phrase pack
    #[clap(short = 'l', long, value_enum)]
    language: Option<SupportedLanguage>,

    /// custom phrase pack to play with (json file)
    #[clap(short = 'p', long)]
    phrases: Option<PathBuf>,

    /// swap the pack's doubts for generated sentences
    #[clap(short = 'g', long, value_name = "COUNT")]
    generated: Option<usize>,

    /// start with tones muted
    #[clap(long)]
    silent: bool,

    /// start with spoken affirmations off
    #[clap(long)]
    no_voice: bool,

    /// write session history to a csv file and exit
    #[clap(long)]
    export_history: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum SupportedLanguage {
    Spanish,
    English,
}

impl SupportedLanguage {
    fn code(&self) -> &'static str {
        match self {
            SupportedLanguage::Spanish => "es",
            SupportedLanguage::English => "en",
        }
    }
}

impl Cli {
    /// Saved settings with the command line folded in on top
    fn merged_settings(&self, saved: Settings) -> Settings {
        let mut settings = saved;
        if let Some(seconds) = self.seconds {
            settings.duration_secs = seconds;
        }
        if let Some(level) = self.level {
            settings.level = level;
        }
        if let Some(language) = self.language {
            settings.language = language.code().to_string();
        }
        if self.silent {
            settings.sound = false;
        }
        if self.no_voice {
            settings.voice = false;
        }
        settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Play,
    History,
}

pub struct App {
    pub cli: Option<Cli>,
    pub game: Game,
    pub state: AppState,
    pub history_state: HistoryViewState,
    pub effects: Effects,
    pub settings: Settings,
}

impl App {
    pub fn new(cli: Cli, settings: Settings, phrases: PhraseBook) -> Self {
        let feedback = TerminalFeedback::new(settings.sound, settings.voice);

        let game = Game::new(
            settings.game_config(),
            phrases,
            Box::new(feedback),
            Ledger::open(),
            HistoryDb::new().ok(),
        );

        Self {
            cli: Some(cli),
            game,
            state: AppState::Play,
            history_state: HistoryViewState::default(),
            effects: Effects::new(),
            settings,
        }
    }
}

/// Game coordinates cover the field under the HUD, not the whole screen.
fn field_bounds(width: u16, height: u16) -> Bounds {
    let field = ui::field_rect(Rect::new(0, 0, width, height));
    Bounds::new(field.width, field.height)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = &cli.export_history {
        let db = HistoryDb::new()?;
        let rows = db.export_csv(path)?;
        println!("wrote {} sessions to {}", rows, path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let settings = cli.merged_settings(store.load());

    let phrases = match &cli.phrases {
        Some(path) => match PhraseBook::from_file(path) {
            Ok(pack) => pack,
            Err(err) => {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, format!("could not load phrase pack: {err}"))
                    .exit();
            }
        },
        None => PhraseBook::builtin(&settings.language),
    };
    let phrases = match cli.generated {
        Some(count) => phrases.with_generated_doubts(count),
        None => phrases,
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cli, settings, phrases);
    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    store.save(&app.settings)?;

    res
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    // Always enable ticking; the field animates for most of a session
    let should_tick = true;

    let app_events = get_app_events(should_tick);

    let size = terminal.size()?;
    app.game.set_bounds(field_bounds(size.width, size.height));

    terminal.draw(|f| ui(app, f))?;

    loop {
        match app_events.recv()? {
            AppEvent::Tick => {
                let was_playing = app.game.is_playing();
                app.game.on_tick();

                if was_playing && app.game.phase() == Phase::Finished {
                    app.effects.clear();
                    let size = terminal.size().unwrap_or_default();
                    if app.game.summary().map(|s| s.record) == Some(RecordStatus::NewBest) {
                        app.effects.record_banner(size.width, size.height);
                    }
                }

                let size = terminal.size().unwrap_or_default();
                app.effects.update(size.width, size.height);

                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Resize => {
                let size = terminal.size()?;
                app.game.set_bounds(field_bounds(size.width, size.height));
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Mouse(mouse) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    let size = terminal.size()?;
                    let field = ui::field_rect(Rect::new(0, 0, size.width, size.height));
                    if field.contains(Position::new(mouse.column, mouse.row)) {
                        if let Some(zap) =
                            app.game.click(mouse.column - field.x, mouse.row - field.y)
                        {
                            app.effects.zap_burst(zap.x, zap.y, zap.kind, zap.points);
                        }
                        terminal.draw(|f| ui(app, f))?;
                    }
                }
            }
            AppEvent::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                // ctrl+c to quit
                {
                    break;
                }

                match app.state {
                    AppState::Play => match app.game.phase() {
                        Phase::Idle => match key.code {
                            KeyCode::Esc => {
                                break;
                            }
                            KeyCode::Char(' ') | KeyCode::Enter => {
                                app.effects.clear();
                                app.game.start();
                            }
                            KeyCode::Up => {
                                app.game.adjust_duration(5);
                                app.settings.duration_secs = app.game.config.duration_secs;
                            }
                            KeyCode::Down => {
                                app.game.adjust_duration(-5);
                                app.settings.duration_secs = app.game.config.duration_secs;
                            }
                            KeyCode::Char('l') => {
                                app.game.cycle_level();
                                app.settings.level = app.game.config.level;
                            }
                            KeyCode::Char('s') => {
                                app.settings.sound = !app.settings.sound;
                                app.game.set_sound(app.settings.sound);
                            }
                            KeyCode::Char('v') => {
                                app.settings.voice = !app.settings.voice;
                                app.game.set_voice(app.settings.voice);
                            }
                            KeyCode::Char('h') => {
                                app.state = AppState::History;
                            }
                            _ => {}
                        },
                        Phase::Playing => match key.code {
                            KeyCode::Esc => {
                                app.game.abort();
                                app.effects.clear();
                            }
                            KeyCode::Tab => {
                                app.game.focus_next();
                            }
                            KeyCode::BackTab => {
                                app.game.focus_prev();
                            }
                            KeyCode::Char(' ') | KeyCode::Enter => {
                                if let Some(zap) = app.game.activate_focused() {
                                    app.effects.zap_burst(zap.x, zap.y, zap.kind, zap.points);
                                }
                            }
                            _ => {}
                        },
                        Phase::Finished => match key.code {
                            KeyCode::Esc | KeyCode::Enter => {
                                app.game.acknowledge();
                                app.effects.clear();
                            }
                            KeyCode::Char(' ') => {
                                app.game.acknowledge();
                                app.effects.clear();
                                app.game.start();
                            }
                            KeyCode::Char('h') => {
                                app.state = AppState::History;
                            }
                            KeyCode::Char('t') => {
                                if Browser::is_available() {
                                    if let Some(summary) = app.game.summary() {
                                        webbrowser::open(&format!("https://twitter.com/intent/tweet?text={}%20pts%20%2F%20{}%20of%20{}%20thoughts%20dissolved%20on%20sana", summary.score, summary.resolved, summary.spawned))
                                        .unwrap_or_default();
                                    }
                                }
                            }
                            _ => {}
                        },
                    },
                    AppState::History => match key.code {
                        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                            app.state = AppState::Play;
                        }
                        KeyCode::Up => {
                            if app.history_state.scroll_offset > 0 {
                                app.history_state.scroll_offset -= 1;
                            }
                        }
                        KeyCode::Down => {
                            // Clamped against the row count in the render function
                            app.history_state.scroll_offset += 1;
                        }
                        KeyCode::PageUp => {
                            app.history_state.scroll_offset =
                                app.history_state.scroll_offset.saturating_sub(10);
                        }
                        KeyCode::PageDown => {
                            app.history_state.scroll_offset += 10;
                        }
                        KeyCode::Home => {
                            app.history_state.scroll_offset = 0;
                        }
                        KeyCode::Char('e') => {
                            if let Some(db) = app.game.history() {
                                let name = format!(
                                    "sana_history_{}.csv",
                                    Local::now().format("%Y%m%d_%H%M%S")
                                );
                                let _ = db.export_csv(&name);
                            }
                        }
                        _ => {}
                    },
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

#[derive(Clone)]
enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
}

fn get_app_events(should_tick: bool) -> mpsc::Receiver<AppEvent> {
    let (tx, rx) = mpsc::channel();

    if should_tick {
        let tick_tx = tx.clone();
        thread::spawn(move || loop {
            if tick_tx.send(AppEvent::Tick).is_err() {
                break;
            }

            thread::sleep(Duration::from_millis(TICK_RATE_MS))
        });
    }

    thread::spawn(move || loop {
        let evt = match event::read().unwrap() {
            Event::Key(key) => Some(AppEvent::Key(key)),
            Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
            Event::Resize(_, _) => Some(AppEvent::Resize),
            _ => None,
        };

        if evt.is_some() && tx.send(evt.unwrap()).is_err() {
            break;
        }
    });

    rx
}

fn ui(app: &mut App, f: &mut Frame) {
    match app.state {
        AppState::Play => {
            f.render_widget(&*app, f.area());
        }
        AppState::History => {
            ui::history::render_history(app, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::NullFeedback;
    use crate::game::GameConfig;
    use assert_matches::assert_matches;
    use clap::Parser;

    fn test_app() -> App {
        let mut game = Game::new(
            GameConfig {
                duration_secs: 15,
                level: Level::Gentle,
            },
            PhraseBook::builtin("en"),
            Box::new(NullFeedback),
            Ledger::in_memory(),
            None,
        );
        game.set_bounds(field_bounds(80, 24));

        App {
            cli: None,
            game,
            state: AppState::Play,
            history_state: HistoryViewState::default(),
            effects: Effects::new(),
            settings: Settings::default(),
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["sana"]);

        assert_eq!(cli.seconds, None);
        assert!(cli.level.is_none());
        assert!(cli.language.is_none());
        assert_eq!(cli.phrases, None);
        assert_eq!(cli.generated, None);
        assert!(!cli.silent);
        assert!(!cli.no_voice);
        assert_eq!(cli.export_history, None);
    }

    #[test]
    fn test_cli_seconds() {
        let cli = Cli::parse_from(["sana", "-s", "60"]);
        assert_eq!(cli.seconds, Some(60));

        let cli = Cli::parse_from(["sana", "--seconds", "45"]);
        assert_eq!(cli.seconds, Some(45));
    }

    #[test]
    fn test_cli_seconds_out_of_range() {
        assert!(Cli::try_parse_from(["sana", "-s", "10"]).is_err());
        assert!(Cli::try_parse_from(["sana", "-s", "121"]).is_err());
        assert!(Cli::try_parse_from(["sana", "-s", "15"]).is_ok());
        assert!(Cli::try_parse_from(["sana", "-s", "120"]).is_ok());
    }

    #[test]
    fn test_cli_level() {
        let cli = Cli::parse_from(["sana", "-d", "steady"]);
        assert_eq!(cli.level, Some(Level::Steady));

        let cli = Cli::parse_from(["sana", "--level", "intense"]);
        assert_eq!(cli.level, Some(Level::Intense));
    }

    #[test]
    fn test_cli_language() {
        let cli = Cli::parse_from(["sana", "-l", "english"]);
        assert_matches!(cli.language, Some(SupportedLanguage::English));

        let cli = Cli::parse_from(["sana", "--language", "spanish"]);
        assert_matches!(cli.language, Some(SupportedLanguage::Spanish));
    }

    #[test]
    fn test_cli_phrase_pack_path() {
        let cli = Cli::parse_from(["sana", "-p", "packs/mine.json"]);
        assert_eq!(cli.phrases, Some(PathBuf::from("packs/mine.json")));
    }

    #[test]
    fn test_cli_generated_doubts() {
        let cli = Cli::parse_from(["sana", "-g", "12"]);
        assert_eq!(cli.generated, Some(12));

        let cli = Cli::parse_from(["sana", "--generated", "3"]);
        assert_eq!(cli.generated, Some(3));
    }

    #[test]
    fn test_cli_toggles() {
        let cli = Cli::parse_from(["sana", "--silent", "--no-voice"]);
        assert!(cli.silent);
        assert!(cli.no_voice);
    }

    #[test]
    fn test_supported_language_code() {
        assert_eq!(SupportedLanguage::Spanish.code(), "es");
        assert_eq!(SupportedLanguage::English.code(), "en");
    }

    #[test]
    fn test_supported_language_display() {
        assert_eq!(SupportedLanguage::Spanish.to_string(), "Spanish");
        assert_eq!(SupportedLanguage::English.to_string(), "English");
    }

    #[test]
    fn test_merged_settings_applies_overrides() {
        let cli = Cli::parse_from([
            "sana",
            "-s",
            "90",
            "-d",
            "intense",
            "-l",
            "english",
            "--silent",
            "--no-voice",
        ]);

        let settings = cli.merged_settings(Settings::default());

        assert_eq!(settings.duration_secs, 90);
        assert_eq!(settings.level, Level::Intense);
        assert_eq!(settings.language, "en");
        assert!(!settings.sound);
        assert!(!settings.voice);
    }

    #[test]
    fn test_merged_settings_keeps_saved_values_when_unset() {
        let saved = Settings {
            duration_secs: 75,
            level: Level::Steady,
            language: "en".to_string(),
            sound: false,
            voice: true,
        };

        let cli = Cli::parse_from(["sana"]);
        let settings = cli.merged_settings(saved.clone());

        assert_eq!(settings, saved);
    }

    #[test]
    fn test_app_state_variants() {
        assert_eq!(AppState::Play, AppState::Play);
        assert_eq!(AppState::History, AppState::History);
        assert_ne!(AppState::Play, AppState::History);
    }

    #[test]
    fn test_field_bounds_excludes_hud_row() {
        assert_eq!(field_bounds(80, 24), Bounds::new(80, 23));
        assert_eq!(field_bounds(80, 0), Bounds::new(80, 0));
    }

    #[test]
    fn test_app_event_clone() {
        let key_event = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let app_event = AppEvent::Key(key_event);
        let cloned_event = app_event.clone();

        match (app_event, cloned_event) {
            (AppEvent::Key(original), AppEvent::Key(cloned)) => {
                assert_eq!(original.code, cloned.code);
                assert_eq!(original.modifiers, cloned.modifiers);
            }
            _ => panic!("Events should match"),
        }
    }

    #[test]
    fn test_get_app_events_no_tick() {
        let receiver = get_app_events(false);
        drop(receiver);
    }

    #[test]
    fn test_get_app_events_with_tick() {
        let receiver = get_app_events(true);

        let result = receiver.recv_timeout(Duration::from_millis(150));

        match result {
            Ok(AppEvent::Tick) => {}
            Ok(_) => panic!("Expected tick event, got different event type"),
            Err(_) => {
                // Timing in test runners can starve the tick thread; creating
                // the receiver without a panic is the part that matters
            }
        }

        drop(receiver);
    }

    #[test]
    fn test_tick_rate_constant() {
        assert_eq!(TICK_RATE_MS, 100);

        const _: () = assert!(TICK_RATE_MS > 0);
        const _: () = assert!(TICK_RATE_MS <= 1000);
    }

    #[test]
    fn test_ui_function_play_state() {
        use ratatui::{backend::TestBackend, Terminal};

        let mut app = test_app();
        app.game.start();

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|f| ui(&mut app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("score"));
    }

    #[test]
    fn test_ui_function_history_state() {
        use ratatui::{backend::TestBackend, Terminal};

        let mut app = test_app();
        app.state = AppState::History;

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|f| ui(&mut app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("History"));
    }

    #[test]
    fn test_history_scroll_state() {
        let mut app = test_app();
        app.state = AppState::History;

        assert_eq!(app.history_state.scroll_offset, 0);

        app.history_state.scroll_offset += 1;
        assert_eq!(app.history_state.scroll_offset, 1);

        app.history_state.scroll_offset = app.history_state.scroll_offset.saturating_sub(10);
        assert_eq!(app.history_state.scroll_offset, 0);
    }

    #[test]
    fn test_click_through_app_scores() {
        let mut app = test_app();
        app.game.start();
        let at = app
            .game
            .plant_thought("i always mess up", crate::thought::ThoughtKind::Negative);

        let zap = app.game.click(at.0, at.1);

        assert!(zap.is_some());
        assert_eq!(app.game.score(), 1);
    }

    #[test]
    fn test_zap_feeds_the_burst() {
        let mut app = test_app();
        app.game.start();
        let at = app
            .game
            .plant_thought("nothing works", crate::thought::ThoughtKind::Negative);

        if let Some(zap) = app.game.click(at.0, at.1) {
            app.effects.zap_burst(zap.x, zap.y, zap.kind, zap.points);
        }

        assert!(!app.effects.is_empty());
    }
}
