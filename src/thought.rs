use rand::Rng;
use unicode_width::UnicodeWidthStr;

use crate::clock::Deadline;

/// Play-area size in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub width: u16,
    pub height: u16,
}

impl Bounds {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThoughtKind {
    Negative,
    Healing,
}

impl ThoughtKind {
    pub fn base_points(&self) -> u32 {
        match self {
            ThoughtKind::Negative => 1,
            ThoughtKind::Healing => 2,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ThoughtKind::Negative => "💭",
            ThoughtKind::Healing => "🌿",
        }
    }
}

const EDGE_MARGIN: u16 = 1;
const MAX_BUBBLE_COLS: u16 = 36;
const MIN_BUBBLE_COLS: u16 = 8;

/// One on-screen thought bubble.
///
/// The entity carries its own render rect (one row high); the renderer only
/// reads it and mouse hit-testing runs against it. `resolved` is the single
/// guard deciding the activation-vs-expiry race, so whichever fires second
/// becomes a no-op.
#[derive(Debug, Clone)]
pub struct Thought {
    pub id: u64,
    pub text: String,
    pub kind: ThoughtKind,
    pub col: u16,
    pub row: u16,
    pub width: u16,
    pub spawned_at_ms: u64,
    pub expiry: Deadline,
    pub removal: Deadline,
    resolved: bool,
}

impl Thought {
    /// Create a thought at a random position clamped inside `bounds`.
    pub fn spawn(
        id: u64,
        text: String,
        kind: ThoughtKind,
        bounds: Bounds,
        now_ms: u64,
        lifetime_ms: u64,
    ) -> Self {
        let mut rng = rand::thread_rng();
        let width = bubble_width(&text, bounds);

        let max_col = bounds.width.saturating_sub(width + EDGE_MARGIN);
        let min_col = EDGE_MARGIN.min(max_col);
        let max_row = bounds.height.saturating_sub(1 + EDGE_MARGIN);
        let min_row = EDGE_MARGIN.min(max_row);

        Self {
            id,
            text,
            kind,
            col: rng.gen_range(min_col..=max_col),
            row: rng.gen_range(min_row..=max_row),
            width,
            spawned_at_ms: now_ms,
            expiry: Deadline::at(now_ms + lifetime_ms),
            removal: Deadline::idle(),
            resolved: false,
        }
    }

    /// First caller wins; later calls see false and must not count it again.
    pub fn try_resolve(&mut self) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        self.expiry.cancel();
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn contains(&self, col: u16, row: u16) -> bool {
        row == self.row && col >= self.col && col < self.col + self.width
    }

    /// Center of the bubble, for particle effects
    pub fn center(&self) -> (f64, f64) {
        (self.col as f64 + self.width as f64 / 2.0, self.row as f64)
    }

    /// Pull the bubble back inside `bounds` after a resize.
    pub fn clamp_to(&mut self, bounds: Bounds) {
        self.width = self.width.min(bubble_width(&self.text, bounds));
        let max_col = bounds.width.saturating_sub(self.width + EDGE_MARGIN);
        let max_row = bounds.height.saturating_sub(1 + EDGE_MARGIN);
        self.col = self.col.min(max_col);
        self.row = self.row.min(max_row);
    }
}

/// Bubble width for a text: icon plus text, capped both by a hard limit and
/// by a fraction of the play area so one bubble never dominates the board.
fn bubble_width(text: &str, bounds: Bounds) -> u16 {
    let desired = (text.width() as u16).saturating_add(3); // icon cell + gap
    let cap = MAX_BUBBLE_COLS.min((bounds.width as u32 * 36 / 100) as u16);
    desired
        .clamp(MIN_BUBBLE_COLS, cap.max(MIN_BUBBLE_COLS))
        .min(bounds.width.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_one(bounds: Bounds) -> Thought {
        Thought::spawn(
            1,
            "no es suficiente".to_string(),
            ThoughtKind::Negative,
            bounds,
            0,
            2000,
        )
    }

    #[test]
    fn spawn_stays_inside_bounds() {
        let bounds = Bounds::new(80, 24);
        for _ in 0..200 {
            let t = spawn_one(bounds);
            assert!(t.col + t.width <= bounds.width);
            assert!(t.row < bounds.height);
        }
    }

    #[test]
    fn spawn_survives_tiny_bounds() {
        for (w, h) in [(1, 1), (2, 2), (5, 3), (8, 1)] {
            let t = spawn_one(Bounds::new(w, h));
            assert!(t.row < h);
        }
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut t = spawn_one(Bounds::new(80, 24));
        assert!(!t.is_resolved());

        assert!(t.try_resolve());
        assert!(t.is_resolved());
        assert!(!t.expiry.is_pending());

        // Second resolution attempt must lose the race
        assert!(!t.try_resolve());
    }

    #[test]
    fn resolve_cancels_expiry() {
        let mut t = spawn_one(Bounds::new(80, 24));
        assert!(t.expiry.is_pending());
        t.try_resolve();
        assert!(!t.expiry.fire(u64::MAX));
    }

    #[test]
    fn hit_test_matches_rect() {
        let mut t = spawn_one(Bounds::new(80, 24));
        t.col = 10;
        t.row = 5;
        t.width = 12;

        assert!(t.contains(10, 5));
        assert!(t.contains(21, 5));
        assert!(!t.contains(22, 5));
        assert!(!t.contains(9, 5));
        assert!(!t.contains(10, 6));
    }

    #[test]
    fn clamp_pulls_bubble_back_in() {
        let mut t = spawn_one(Bounds::new(120, 40));
        t.col = 100;
        t.row = 35;

        t.clamp_to(Bounds::new(40, 12));
        assert!(t.col + t.width <= 40);
        assert!(t.row < 12);
    }

    #[test]
    fn bubble_width_caps_at_board_fraction() {
        let bounds = Bounds::new(100, 24);
        let w = bubble_width(&"x".repeat(200), bounds);
        assert_eq!(w, 36);

        let narrow = Bounds::new(50, 24);
        let w = bubble_width(&"x".repeat(200), narrow);
        assert_eq!(w, 18);
    }

    #[test]
    fn bubble_width_has_floor_for_short_text() {
        let w = bubble_width("ok", Bounds::new(80, 24));
        assert_eq!(w, MIN_BUBBLE_COLS);
    }

    #[test]
    fn kind_points_and_icons() {
        assert_eq!(ThoughtKind::Negative.base_points(), 1);
        assert_eq!(ThoughtKind::Healing.base_points(), 2);
        assert_ne!(ThoughtKind::Negative.icon(), ThoughtKind::Healing.icon());
    }
}
