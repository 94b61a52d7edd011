//! Session state machine: timer, spawner, live thoughts, score.
//!
//! Everything advances on the shared elapsed-ms axis from [`crate::clock`],
//! one `on_tick` per `TICK_RATE_MS`, so a whole session can be driven
//! headlessly without a terminal or a wall clock.

use chrono::Local;
use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::{Countdown, Deadline};
use crate::feedback::FeedbackSink;
use crate::highscore::{Ledger, RecordStatus};
use crate::history::{HistoryDb, SessionRecord};
use crate::phrases::PhraseBook;
use crate::thought::{Bounds, Thought, ThoughtKind};
use crate::util;

pub const TICK_RATE_MS: u64 = 100;

pub const MIN_DURATION_SECS: u32 = 15;
pub const MAX_DURATION_SECS: u32 = 120;
pub const DEFAULT_DURATION_SECS: u32 = 30;

const BASE_SPAWN_INTERVAL_MS: f64 = 1800.0;
const SPAWN_FLOOR_MS: u64 = 600;
const HEALING_ODDS: f64 = 0.12;
const LIFETIME_BASE_MS: f64 = 4200.0;
const LIFETIME_FLOOR_MS: u64 = 1500;
const ZAP_LINGER_MS: u64 = 480;
const BANNER_MS: u64 = 3500;
const RESULTS_LINGER_MS: u64 = 10_000;

const NEGATIVE_TONE_HZ: u32 = 540;
const HEALING_TONE_HZ: u32 = 880;
const CHIME_TONE_HZ: u32 = 1200;
const TONE_MS: u64 = 90;
const CHIME_MS: u64 = 160;

/// Session pace. The multiplier scales points, spawn pressure, and how
/// quickly thoughts fade on their own.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Gentle,
    Steady,
    Intense,
}

impl Level {
    pub fn multiplier(&self) -> f64 {
        match self {
            Level::Gentle => 1.0,
            Level::Steady => 1.5,
            Level::Intense => 2.0,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Level::Gentle => Level::Steady,
            Level::Steady => Level::Intense,
            Level::Intense => Level::Gentle,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GameConfig {
    pub duration_secs: u32,
    pub level: Level,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            level: Level::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Playing,
    Finished,
}

/// Affirmation panel shown after dissolving a healing thought.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub phrase: String,
    pub explanation: String,
    pub until: Deadline,
}

/// What a successful dissolve produced, with the impact point for effects.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Zap {
    pub points: u32,
    pub kind: ThoughtKind,
    pub x: f64,
    pub y: f64,
}

/// One sample of the score over session time, for the results chart.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScorePoint {
    pub t: u32,
    pub score: u32,
}

/// Results of a finished session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub score: u32,
    pub resolved: u32,
    pub spawned: u32,
    pub healing_resolved: u32,
    pub duration_secs: u32,
    pub pace_per_min: u32,
    pub record: RecordStatus,
    pub best: u32,
}

pub struct Game {
    pub config: GameConfig,
    phase: Phase,
    elapsed_ms: u64,
    countdown: Countdown,
    next_spawn: Deadline,
    thoughts: Vec<Thought>,
    next_id: u64,
    bounds: Bounds,
    focused: Option<u64>,
    score: u32,
    resolved: u32,
    spawned: u32,
    healing_resolved: u32,
    score_curve: Vec<ScorePoint>,
    banner: Option<Banner>,
    results_linger: Deadline,
    summary: Option<GameSummary>,
    phrases: PhraseBook,
    feedback: Box<dyn FeedbackSink>,
    ledger: Ledger,
    history: Option<HistoryDb>,
}

impl Game {
    pub fn new(
        config: GameConfig,
        phrases: PhraseBook,
        feedback: Box<dyn FeedbackSink>,
        ledger: Ledger,
        history: Option<HistoryDb>,
    ) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            elapsed_ms: 0,
            countdown: Countdown::idle(),
            next_spawn: Deadline::idle(),
            thoughts: Vec::new(),
            next_id: 0,
            bounds: Bounds::default(),
            focused: None,
            score: 0,
            resolved: 0,
            spawned: 0,
            healing_resolved: 0,
            score_curve: Vec::new(),
            banner: None,
            results_linger: Deadline::idle(),
            summary: None,
            phrases,
            feedback,
            ledger,
            history,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best(&self) -> u32 {
        self.ledger.best()
    }

    pub fn resolved_count(&self) -> u32 {
        self.resolved
    }

    pub fn spawned_count(&self) -> u32 {
        self.spawned
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn thoughts(&self) -> &[Thought] {
        &self.thoughts
    }

    pub fn focused_id(&self) -> Option<u64> {
        self.focused
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    pub fn score_curve(&self) -> &[ScorePoint] {
        &self.score_curve
    }

    pub fn locale(&self) -> &str {
        &self.phrases.locale
    }

    pub fn pack_name(&self) -> &str {
        &self.phrases.name
    }

    pub fn history(&self) -> Option<&HistoryDb> {
        self.history.as_ref()
    }

    pub fn time_left_secs(&self) -> u32 {
        match self.phase {
            Phase::Idle => self.config.duration_secs,
            _ => self.countdown.remaining_secs(),
        }
    }

    /// Begin a session. Only valid from the idle screen.
    pub fn start(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }

        self.elapsed_ms = 0;
        self.thoughts.clear();
        self.next_id = 0;
        self.focused = None;
        self.score = 0;
        self.resolved = 0;
        self.spawned = 0;
        self.healing_resolved = 0;
        self.score_curve = vec![ScorePoint { t: 0, score: 0 }];
        self.banner = None;
        self.summary = None;
        self.results_linger = Deadline::idle();
        self.countdown = Countdown::start(self.config.duration_secs, 0);
        // First thought lands on the very first tick
        self.next_spawn = Deadline::at(0);
        self.phase = Phase::Playing;
    }

    /// Drop the current session without recording anything.
    pub fn abort(&mut self) {
        if self.phase != Phase::Playing {
            return;
        }

        self.countdown.stop();
        self.next_spawn.cancel();
        for thought in &mut self.thoughts {
            thought.expiry.cancel();
            thought.removal.cancel();
        }
        self.thoughts.clear();
        self.focused = None;
        self.banner = None;
        self.feedback.silence();
        self.phase = Phase::Idle;
    }

    /// Leave the results screen.
    pub fn acknowledge(&mut self) {
        if self.phase != Phase::Finished {
            return;
        }
        self.results_linger.cancel();
        self.phase = Phase::Idle;
    }

    /// Advance the session by one tick.
    pub fn on_tick(&mut self) {
        match self.phase {
            Phase::Idle => {}
            Phase::Playing => {
                self.elapsed_ms += TICK_RATE_MS;
                let now = self.elapsed_ms;

                if self.next_spawn.fire(now) {
                    self.spawn_thought(now);
                    self.schedule_next_spawn(now);
                }

                self.thoughts.retain_mut(|thought| {
                    !thought.expiry.fire(now) && !thought.removal.fire(now)
                });
                self.fix_focus();

                if let Some(banner) = self.banner.as_mut() {
                    if banner.until.fire(now) {
                        self.banner = None;
                    }
                }

                if self.countdown.advance(now) {
                    self.finish(now);
                }
            }
            Phase::Finished => {
                self.elapsed_ms += TICK_RATE_MS;
                if self.results_linger.fire(self.elapsed_ms) {
                    self.acknowledge();
                }
            }
        }
    }

    /// Dissolve the topmost unresolved thought under the given cell.
    pub fn click(&mut self, col: u16, row: u16) -> Option<Zap> {
        if self.phase != Phase::Playing {
            return None;
        }
        // Newest thoughts render on top, so they win overlapping hits
        let id = self
            .thoughts
            .iter()
            .rev()
            .find(|t| !t.is_resolved() && t.contains(col, row))
            .map(|t| t.id)?;
        self.resolve(id)
    }

    pub fn focus_next(&mut self) {
        self.shift_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.shift_focus(-1);
    }

    /// Dissolve the focused thought, if any.
    pub fn activate_focused(&mut self) -> Option<Zap> {
        if self.phase != Phase::Playing {
            return None;
        }
        let id = self.focused?;
        self.resolve(id)
    }

    /// Resize the playfield; live thoughts are pulled back inside.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        for thought in &mut self.thoughts {
            thought.clamp_to(bounds);
        }
    }

    /// Drops a long-lived thought into the field at a random spot.
    #[cfg(test)]
    pub fn plant_thought(&mut self, text: &str, kind: ThoughtKind) -> (u16, u16) {
        let thought = Thought::spawn(
            self.next_id,
            text.to_string(),
            kind,
            self.bounds,
            self.elapsed_ms,
            600_000,
        );
        let at = (thought.col, thought.row);
        self.next_id += 1;
        self.spawned += 1;
        self.thoughts.push(thought);
        at
    }

    pub fn adjust_duration(&mut self, delta_secs: i64) {
        if self.phase != Phase::Idle {
            return;
        }
        let secs = self.config.duration_secs as i64 + delta_secs;
        self.config.duration_secs =
            secs.clamp(MIN_DURATION_SECS as i64, MAX_DURATION_SECS as i64) as u32;
    }

    pub fn cycle_level(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        self.config.level = self.config.level.next();
    }

    pub fn set_sound(&mut self, enabled: bool) {
        self.feedback.set_sound(enabled);
    }

    pub fn set_voice(&mut self, enabled: bool) {
        self.feedback.set_voice(enabled);
    }

    fn resolve(&mut self, id: u64) -> Option<Zap> {
        let now = self.elapsed_ms;
        let (kind, text, x, y) = {
            let thought = self.thoughts.iter_mut().find(|t| t.id == id)?;
            if !thought.try_resolve() {
                return None;
            }
            thought.removal = Deadline::at(now + ZAP_LINGER_MS);
            let (x, y) = thought.center();
            (thought.kind, thought.text.clone(), x, y)
        };

        let points = (kind.base_points() as f64 * self.config.level.multiplier()).ceil() as u32;
        self.score += points;
        self.resolved += 1;
        self.score_curve.push(ScorePoint {
            t: (now / 1000) as u32,
            score: self.score,
        });

        match kind {
            ThoughtKind::Healing => {
                self.healing_resolved += 1;
                self.feedback.tone(HEALING_TONE_HZ, TONE_MS);
                self.feedback.tone(CHIME_TONE_HZ, CHIME_MS);
                let healing = self
                    .phrases
                    .healing_for(&text)
                    .cloned()
                    .unwrap_or_else(|| self.phrases.random_healing());
                self.feedback.speak(&healing.phrase, &self.phrases.locale);
                self.banner = Some(Banner {
                    phrase: healing.phrase,
                    explanation: healing.explanation,
                    until: Deadline::at(now + BANNER_MS),
                });
            }
            ThoughtKind::Negative => {
                self.feedback.tone(NEGATIVE_TONE_HZ, TONE_MS);
            }
        }

        self.fix_focus();

        Some(Zap { points, kind, x, y })
    }

    fn finish(&mut self, now: u64) {
        self.next_spawn.cancel();
        for thought in &mut self.thoughts {
            thought.expiry.cancel();
            thought.removal.cancel();
        }
        self.thoughts.clear();
        self.focused = None;
        self.banner = None;
        self.feedback.silence();

        self.score_curve.push(ScorePoint {
            t: self.config.duration_secs,
            score: self.score,
        });

        let record = self.ledger.finalize(self.score);
        self.summary = Some(GameSummary {
            score: self.score,
            resolved: self.resolved,
            spawned: self.spawned,
            healing_resolved: self.healing_resolved,
            duration_secs: self.config.duration_secs,
            pace_per_min: util::pace_per_min(self.resolved, self.config.duration_secs),
            record,
            best: self.ledger.best(),
        });

        if let Some(db) = &self.history {
            let _ = db.record_session(&SessionRecord {
                played_at: Local::now(),
                duration_secs: self.config.duration_secs,
                score: self.score,
                resolved: self.resolved,
                spawned: self.spawned,
                healing_resolved: self.healing_resolved,
            });
        }

        self.results_linger = Deadline::at(now + RESULTS_LINGER_MS);
        self.phase = Phase::Finished;
    }

    fn spawn_difficulty(&self) -> f64 {
        self.config.level.multiplier() + (self.score / 8) as f64 * 0.05
    }

    fn schedule_next_spawn(&mut self, now: u64) {
        let interval = (BASE_SPAWN_INTERVAL_MS / self.spawn_difficulty()) as u64;
        self.next_spawn = Deadline::at(now + interval.max(SPAWN_FLOOR_MS));
    }

    fn lifetime_ms(&self) -> u64 {
        let fade = LIFETIME_BASE_MS / (self.config.level.multiplier() + self.score as f64 * 0.02);
        (fade as u64).max(LIFETIME_FLOOR_MS)
    }

    fn spawn_thought(&mut self, now: u64) {
        let (text, kind) = if rand::thread_rng().gen_bool(HEALING_ODDS) {
            (self.phrases.random_healing().phrase, ThoughtKind::Healing)
        } else {
            (self.phrases.random_doubt(), ThoughtKind::Negative)
        };

        let thought = Thought::spawn(
            self.next_id,
            text,
            kind,
            self.bounds,
            now,
            self.lifetime_ms(),
        );
        self.next_id += 1;
        self.spawned += 1;
        self.thoughts.push(thought);
    }

    fn shift_focus(&mut self, step: i64) {
        let ids: Vec<u64> = self
            .thoughts
            .iter()
            .filter(|t| !t.is_resolved())
            .map(|t| t.id)
            .collect();
        if ids.is_empty() {
            self.focused = None;
            return;
        }

        let pos = self
            .focused
            .and_then(|id| ids.iter().position(|&i| i == id));
        self.focused = Some(match pos {
            Some(pos) => ids[(pos as i64 + step).rem_euclid(ids.len() as i64) as usize],
            None => ids[0],
        });
    }

    /// Keep focus on a live thought, falling back to the oldest one.
    fn fix_focus(&mut self) {
        let still_live = self.focused.map_or(false, |id| {
            self.thoughts.iter().any(|t| t.id == id && !t.is_resolved())
        });
        if !still_live {
            self.focused = self
                .thoughts
                .iter()
                .find(|t| !t.is_resolved())
                .map(|t| t.id);
        }
    }
}
