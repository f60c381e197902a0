//! Face turns and the move log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layer::Level;
use crate::orientation::{LogicalFace, Orientation};

/// Turn direction. Serialised as `1` or `-1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn inverse(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            Direction::Clockwise => 1.0,
            Direction::CounterClockwise => -1.0,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = Error;

    fn try_from(value: i8) -> Result<Self> {
        match value {
            1 => Ok(Direction::Clockwise),
            -1 => Ok(Direction::CounterClockwise),
            other => Err(Error::InvalidDirection(other)),
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

/// One completed face turn.
///
/// `rotation` is the whole-cube orientation when the turn was issued. The
/// meaning of `face` depends on it, so replaying the inverse needs it too.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub face: LogicalFace,
    pub level: Level,
    pub direction: Direction,
    pub rotation: Orientation,
}

impl Move {
    /// Whether `other` undoes this move.
    pub fn is_inverse_of(&self, other: &Move) -> bool {
        self.face == other.face
            && self.level == other.level
            && self.direction == other.direction.inverse()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level.index() {
            0 => "1st",
            1 => "2nd",
            _ => "3rd",
        };
        let direction = match self.direction {
            Direction::Clockwise => "C.W.",
            Direction::CounterClockwise => "A.C.W.",
        };
        let face = self.face.to_string().to_uppercase();
        write!(f, "{level} face from {face} {direction}")
    }
}

/// Ordered record of completed turns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoveLog {
    moves: Vec<Move>,
}

impl MoveLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a move, or drops the last one if `mv` undoes it.
    ///
    /// Only the most recent entry is checked; non-adjacent inverses are kept.
    pub fn push(&mut self, mv: Move) {
        match self.moves.last() {
            Some(last) if last.is_inverse_of(&mv) => {
                self.moves.pop();
            }
            _ => self.moves.push(mv),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.moves.clear();
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Serialises the log as a JSON array of moves.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.moves)?)
    }
}

/// Parses a JSON array of moves.
pub fn moves_from_json(json: &str) -> Result<Vec<Move>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(face: LogicalFace, level: u8, direction: Direction) -> Move {
        Move {
            face,
            level: Level::new(level).unwrap(),
            direction,
            rotation: Orientation::new(0.1, 0.2),
        }
    }

    #[test]
    fn adjacent_inverse_cancels() {
        let mut log = MoveLog::new();
        log.push(mv(LogicalFace::Front, 0, Direction::Clockwise));
        log.push(mv(LogicalFace::Top, 1, Direction::Clockwise));
        log.push(mv(LogicalFace::Top, 1, Direction::CounterClockwise));
        assert_eq!(log.len(), 1);
        log.push(mv(LogicalFace::Front, 0, Direction::CounterClockwise));
        assert!(log.is_empty());
    }

    #[test]
    fn same_direction_or_other_level_does_not_cancel() {
        let mut log = MoveLog::new();
        log.push(mv(LogicalFace::Left, 2, Direction::Clockwise));
        log.push(mv(LogicalFace::Left, 2, Direction::Clockwise));
        log.push(mv(LogicalFace::Left, 1, Direction::CounterClockwise));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn non_adjacent_inverses_are_kept() {
        let mut log = MoveLog::new();
        log.push(mv(LogicalFace::Front, 0, Direction::Clockwise));
        log.push(mv(LogicalFace::Top, 0, Direction::Clockwise));
        log.push(mv(LogicalFace::Front, 0, Direction::CounterClockwise));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn display_matches_move_list() {
        let text = mv(LogicalFace::Front, 0, Direction::Clockwise).to_string();
        insta::assert_snapshot!(text, @"1st face from FRONT C.W.");
        let text = mv(LogicalFace::Left, 2, Direction::CounterClockwise).to_string();
        assert_eq!(text, "3rd face from LEFT A.C.W.");
    }

    #[test]
    fn json_uses_numeric_level_and_direction() {
        let mut log = MoveLog::new();
        log.push(mv(LogicalFace::Top, 1, Direction::CounterClockwise));
        let json = log.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["face"], "top");
        assert_eq!(value[0]["level"], 1);
        assert_eq!(value[0]["direction"], -1);

        let parsed = moves_from_json(&json).unwrap();
        assert_eq!(parsed, log.moves());
    }

    #[test]
    fn malformed_moves_are_rejected() {
        let bad_direction = r#"[{"face":"top","level":0,"direction":2,"rotation":{"x":0,"y":0}}]"#;
        assert!(moves_from_json(bad_direction).is_err());
        let bad_level = r#"[{"face":"top","level":3,"direction":1,"rotation":{"x":0,"y":0}}]"#;
        assert!(moves_from_json(bad_level).is_err());
        let bad_face = r#"[{"face":"back","level":0,"direction":1,"rotation":{"x":0,"y":0}}]"#;
        assert!(moves_from_json(bad_face).is_err());
    }
}
