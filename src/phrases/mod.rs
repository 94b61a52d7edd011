use cgisf_lib::cgisf;
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;

use include_dir::{include_dir, Dir};
use std::error::Error;
use std::fs;
use std::path::Path;

static PACK_DIR: Dir = include_dir!("src/phrases");

/// Pack used when no other choice survives.
pub const DEFAULT_PACK: &str = "es";

/// A short affirmation shown (and spoken) after each dissolved thought
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct HealingPhrase {
    pub phrase: String,
    pub explanation: String,
}

/// One language's worth of game text: the bubbles and the affirmations
#[derive(Deserialize, Clone, Debug)]
pub struct PhraseBook {
    pub name: String,
    pub locale: String,
    pub doubts: Vec<String>,
    pub healing: Vec<HealingPhrase>,
}

impl PhraseBook {
    /// Load one of the packs compiled into the binary, with an unknown
    /// name pulled back to the default pack.
    pub fn builtin(name: &str) -> Self {
        let file_name = format!("{name}.json");
        if PACK_DIR.get_file(&file_name).is_none() {
            return read_pack_from_dir(format!("{DEFAULT_PACK}.json")).unwrap();
        }
        read_pack_from_dir(file_name).unwrap()
    }

    /// Load a user-supplied pack. Callers fall back to a builtin pack on error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        let book: PhraseBook = from_str(&text)?;
        if book.doubts.is_empty() {
            return Err("phrase pack has no doubts".into());
        }
        if book.healing.is_empty() {
            return Err("phrase pack has no healing phrases".into());
        }
        Ok(book)
    }

    /// Swap the scripted doubts for generated sentences. Keeps the scripted
    /// list whenever generation comes back empty, so this never fails.
    pub fn with_generated_doubts(mut self, count: usize) -> Self {
        let generated = generated_doubts(count);
        if !generated.is_empty() {
            self.doubts = generated;
        }
        self
    }

    pub fn random_doubt(&self) -> String {
        let mut rng = rand::thread_rng();
        self.doubts
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| "...".to_string())
    }

    pub fn random_healing(&self) -> HealingPhrase {
        let mut rng = rand::thread_rng();
        self.healing
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| HealingPhrase {
                phrase: "Breathe and let go".to_string(),
                explanation: String::new(),
            })
    }

    /// The full entry behind a healing phrase shown on screen.
    pub fn healing_for(&self, phrase: &str) -> Option<&HealingPhrase> {
        self.healing.iter().find(|h| h.phrase == phrase)
    }
}

/// Generate short self-doubt-shaped sentences offline. Deduped; may return
/// fewer than `count`, or nothing at all, in which case callers keep their
/// scripted list.
pub fn generated_doubts(count: usize) -> Vec<String> {
    let rng = &mut rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut s = cgisf(
                rng.gen_range(1..3),
                rng.gen_range(1..3),
                rng.gen_range(1..5),
                rng.gen_bool(0.5),
                rng.gen_range(1..3),
                rng.gen_bool(0.5),
            );
            if s.ends_with(' ') {
                s.pop();
            }
            s
        })
        .filter(|s| !s.trim().is_empty())
        .unique()
        .collect()
}

fn read_pack_from_dir(file_name: String) -> Result<PhraseBook, Box<dyn Error>> {
    let file = PACK_DIR.get_file(file_name).expect("phrase pack not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    let book = from_str(file_as_str).expect("Unable to deserialize phrase pack json");

    Ok(book)
}
