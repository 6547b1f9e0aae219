/// Three-step hint ladder for the next solution move

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HintStep {
    FromSquare { square: String },
    ToSquare { from: String, square: String },
    Solution { from: String, to: String },
}

impl HintStep {
    pub fn message(&self) -> String {
        match self {
            HintStep::FromSquare { .. } => "Look at this square".to_string(),
            HintStep::ToSquare { .. } => "Move here".to_string(),
            HintStep::Solution { from, to } => format!("Solution: {from} to {to}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HintLadder {
    level: u8,
}

impl HintLadder {
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0;
    }

    /// Next rung for `expected` (a UCI move). The last rung resets the ladder.
    pub fn next(&mut self, expected: &str) -> Option<HintStep> {
        let from = expected.get(0..2)?.to_string();
        let to = expected.get(2..4)?.to_string();
        let step = match self.level {
            0 => {
                self.level = 1;
                HintStep::FromSquare { square: from }
            }
            1 => {
                self.level = 2;
                HintStep::ToSquare { from, square: to }
            }
            _ => {
                self.level = 0;
                HintStep::Solution { from, to }
            }
        };
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_cycles() {
        let mut ladder = HintLadder::default();
        assert_eq!(
            ladder.next("e2e4"),
            Some(HintStep::FromSquare { square: "e2".into() })
        );
        assert_eq!(
            ladder.next("e2e4"),
            Some(HintStep::ToSquare { from: "e2".into(), square: "e4".into() })
        );
        let last = ladder.next("e2e4").unwrap();
        assert_eq!(last.message(), "Solution: e2 to e4");
        assert_eq!(ladder.level(), 0);
    }

    #[test]
    fn test_reset() {
        let mut ladder = HintLadder::default();
        ladder.next("g1f3");
        ladder.reset();
        assert_eq!(ladder.level(), 0);
    }

    #[test]
    fn test_malformed_move() {
        let mut ladder = HintLadder::default();
        assert_eq!(ladder.next("e2"), None);
        assert_eq!(ladder.level(), 0);
    }
}
