use rand::seq::SliceRandom;

use crate::thought::ThoughtKind;

const GRAVITY: f64 = 15.0;
const OFF_SCREEN_BUFFER: f64 = 5.0;

const NEGATIVE_SPARKS: [char; 4] = ['✦', '✧', '∙', '·'];
const HEALING_SPARKS: [char; 4] = ['❀', '✿', '✧', '•'];

// Indices into the palette the renderer maps to real colors
const NEGATIVE_COLOR_RANGE: std::ops::Range<usize> = 0..4;
const HEALING_COLOR_RANGE: std::ops::Range<usize> = 4..8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    /// Thrown outward, pulled down by gravity
    Burst,
    /// Constant drift, no gravity
    Rise,
    /// Steers towards a target cell and stays there
    Seek,
}

/// One glyph of a visual effect
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    age: f64,
    max_age: f64,
    motion: Motion,
    target_x: f64,
    target_y: f64,
}

impl Particle {
    fn burst(x: f64, y: f64, kind: ThoughtKind) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let (sparks, colors) = match kind {
            ThoughtKind::Negative => (&NEGATIVE_SPARKS, NEGATIVE_COLOR_RANGE),
            ThoughtKind::Healing => (&HEALING_SPARKS, HEALING_COLOR_RANGE),
        };

        Self {
            x,
            y,
            vel_x: rng.gen_range(-6.0..6.0),
            vel_y: rng.gen_range(-8.0..-2.0),
            symbol: *sparks.choose(&mut rng).unwrap_or(&'✦'),
            color_index: rng.gen_range(colors),
            age: 0.0,
            max_age: rng.gen_range(0.5..1.0),
            motion: Motion::Burst,
            target_x: x,
            target_y: y,
        }
    }

    fn floater(x: f64, y: f64, symbol: char, kind: ThoughtKind) -> Self {
        let colors = match kind {
            ThoughtKind::Negative => NEGATIVE_COLOR_RANGE,
            ThoughtKind::Healing => HEALING_COLOR_RANGE,
        };

        Self {
            x,
            y,
            vel_x: 0.0,
            vel_y: -2.5,
            symbol,
            color_index: colors.start,
            age: 0.0,
            max_age: 1.2,
            motion: Motion::Rise,
            target_x: x,
            target_y: y,
        }
    }

    fn letter(x: f64, y: f64, target_x: f64, target_y: f64, symbol: char, color: usize) -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        Self {
            x,
            y,
            vel_x: target_x - x,
            vel_y: target_y - y,
            symbol,
            color_index: color,
            age: 0.0,
            max_age: rng.gen_range(3.0..5.0),
            motion: Motion::Seek,
            target_x,
            target_y,
        }
    }

    /// 1.0 when fresh, 0.0 at expiry; drives the brightness ramp.
    pub fn fade(&self) -> f64 {
        1.0 - self.age / self.max_age
    }

    pub fn is_letter(&self) -> bool {
        self.motion == Motion::Seek
    }

    fn update(&mut self, dt: f64) -> bool {
        match self.motion {
            Motion::Seek => {
                let dist_to_target =
                    ((self.target_x - self.x).powi(2) + (self.target_y - self.y).powi(2)).sqrt();
                if dist_to_target > 1.0 {
                    self.x += self.vel_x * dt;
                    self.y += self.vel_y * dt;
                    self.vel_x *= 0.95;
                    self.vel_y *= 0.95;
                } else {
                    self.x = self.target_x;
                    self.y = self.target_y;
                    self.vel_x = 0.0;
                    self.vel_y = 0.0;
                }
            }
            Motion::Rise => {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
            }
            Motion::Burst => {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_y += GRAVITY * dt;
            }
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// All live visual effects on the playfield
#[derive(Debug, Default)]
pub struct Effects {
    pub particles: Vec<Particle>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spark shower plus a rising "+N" at the point a thought dissolved.
    pub fn zap_burst(&mut self, x: f64, y: f64, kind: ThoughtKind, points: u32) {
        let count = match kind {
            ThoughtKind::Negative => 8,
            ThoughtKind::Healing => 12,
        };
        for _ in 0..count {
            self.particles.push(Particle::burst(x, y, kind));
        }

        let label = format!("+{points}");
        for (i, symbol) in label.chars().enumerate() {
            self.particles
                .push(Particle::floater(x + i as f64, y - 1.0, symbol, kind));
        }
    }

    /// Letters fly in from around the center and settle into a record banner.
    pub fn record_banner(&mut self, width: u16, height: u16) {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let center_x = width as f64 / 2.0;
        let center_y = height as f64 / 2.0;

        let words = ["NEW BEST!", "RECORD!", "BRIGHTER TODAY!"];
        let chosen = words.choose(&mut rng).unwrap_or(&"NEW BEST!");

        let char_width = 2.0;
        let text_width = (chosen.len() as f64 - 1.0) * char_width;
        let start_x = center_x - text_width / 2.0;

        for (i, ch) in chosen.chars().enumerate() {
            if ch == ' ' {
                continue;
            }
            let target_x = start_x + (i as f64 * char_width);
            let target_y = center_y - 2.0;
            let from_x = center_x + rng.gen_range(-10.0..10.0);
            let from_y = center_y + rng.gen_range(-5.0..5.0);
            let color = rng.gen_range(HEALING_COLOR_RANGE);

            self.particles
                .push(Particle::letter(from_x, from_y, target_x, target_y, ch, color));
        }

        for _ in 0..25 {
            let offset_x = rng.gen_range(-15.0..15.0);
            let offset_y = rng.gen_range(-8.0..8.0);
            self.particles.push(Particle::burst(
                center_x + offset_x,
                center_y + offset_y,
                ThoughtKind::Healing,
            ));
        }
    }

    /// Advance one animation step; stale and off-screen glyphs are dropped.
    pub fn update(&mut self, width: u16, height: u16) {
        let dt = 0.1;
        let (w, h) = (width as f64, height as f64);

        self.particles.retain_mut(|particle| {
            let still_alive = particle.update(dt);
            if particle.motion == Motion::Seek {
                return still_alive;
            }

            let off_screen = particle.y > h + OFF_SCREEN_BUFFER
                || particle.y < -OFF_SCREEN_BUFFER
                || particle.x < -OFF_SCREEN_BUFFER
                || particle.x > w + OFF_SCREEN_BUFFER;
            still_alive && !off_screen
        });
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
