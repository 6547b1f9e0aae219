/// Puzzle records and the static puzzle database

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TrainerError;
use crate::position::parse_solution;

pub const MIN_RATING: i32 = 300;
pub const MAX_RATING: i32 = 3500;
/// Half-width of the survival rating band.
pub const BAND_HALF_WIDTH: i32 = 75;
/// Extra width on each side when the band is empty.
pub const BAND_WIDEN: i32 = 150;

/// One row of the puzzle dump, field names as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleRecord {
    #[serde(rename = "PuzzleId", default)]
    pub id: String,
    #[serde(rename = "FEN")]
    pub fen: String,
    #[serde(rename = "Moves")]
    pub moves: String,
    #[serde(rename = "Rating", default)]
    pub rating: Option<i32>,
    #[serde(rename = "Themes", default)]
    pub themes: String,
    #[serde(rename = "Difficulty", default)]
    pub difficulty: Option<String>,
    #[serde(rename = "Position", default)]
    pub stage: Option<String>,
}

/// A puzzle ready to be played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Puzzle {
    pub id: String,
    pub fen: String,
    pub solution: Vec<String>,
    pub rating: Option<i32>,
    pub themes: Vec<String>,
}

impl Puzzle {
    pub fn from_record(record: &PuzzleRecord) -> Self {
        Self {
            id: record.id.clone(),
            fen: record.fen.clone(),
            solution: parse_solution(&record.moves),
            rating: record.rating,
            themes: record.themes.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// First three themes, capitalised, joined for display.
    pub fn theme_text(&self) -> String {
        self.themes
            .iter()
            .take(3)
            .map(|theme| {
                let mut chars = theme.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" • ")
    }
}

/// Inclusive rating band around a survival target.
pub fn rating_band(target: i32) -> (i32, i32) {
    (
        (target - BAND_HALF_WIDTH).max(MIN_RATING),
        (target + BAND_HALF_WIDTH).min(MAX_RATING),
    )
}

/// Read-only puzzle collection, loaded once per process.
#[derive(Debug, Clone, Default)]
pub struct PuzzleDatabase {
    records: Vec<PuzzleRecord>,
}

impl PuzzleDatabase {
    pub fn new(records: Vec<PuzzleRecord>) -> Self {
        Self { records }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| TrainerError::Database(format!("{}: {e}", path.display())))?;
        let records: Vec<PuzzleRecord> = serde_json::from_reader(BufReader::new(file))?;
        info!("Loaded puzzle database: {} puzzles from {}", records.len(), path.display());
        Ok(Self { records })
    }

    pub fn from_json(json: &str) -> Result<Self, TrainerError> {
        Ok(Self {
            records: serde_json::from_str(json)?,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PuzzleRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<Puzzle> {
        self.records.iter().find(|r| r.id == id).map(Puzzle::from_record)
    }

    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Puzzle> {
        self.records.choose(rng).map(Puzzle::from_record)
    }

    /// Random puzzle for a difficulty and game stage; any puzzle if none match.
    /// A `None` filter matches everything.
    pub fn random_for<R: Rng + ?Sized>(
        &self,
        difficulty: Option<&str>,
        stage: Option<&str>,
        rng: &mut R,
    ) -> Option<Puzzle> {
        let wanted = |filter: Option<&str>, value: &Option<String>| match filter {
            Some(filter) => value.as_deref() == Some(filter),
            None => true,
        };
        let filtered: Vec<&PuzzleRecord> = self
            .records
            .iter()
            .filter(|r| wanted(difficulty, &r.difficulty) && wanted(stage, &r.stage))
            .collect();
        debug!(?difficulty, ?stage, found = filtered.len(), "Filtered puzzles");

        match filtered.choose(rng) {
            Some(record) => Some(Puzzle::from_record(record)),
            None => self.random(rng),
        }
    }

    /// Random puzzle near a target rating, widening when the band is sparse.
    pub fn random_in_band<R: Rng + ?Sized>(&self, target: i32, rng: &mut R) -> Option<Puzzle> {
        let (low, high) = rating_band(target);
        let in_range = |low: i32, high: i32| -> Vec<&PuzzleRecord> {
            self.records
                .iter()
                .filter(|r| matches!(r.rating, Some(rating) if rating >= low && rating <= high))
                .collect()
        };

        let mut pool = in_range(low, high);
        if pool.is_empty() {
            pool = in_range(low - BAND_WIDEN, high + BAND_WIDEN);
        }
        debug!(target, low, high, found = pool.len(), "Rating band");

        match pool.choose(rng) {
            Some(record) => Some(Puzzle::from_record(record)),
            None => self.random(rng),
        }
    }
}
