use std::fmt;

/// Why the engine refused an action. The display text is what the
/// offending player sees in an `ERROR` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    OutOfBounds,
    CellOccupied,
    Suicide,
    KoViolation,
    NoColor,
    GameOver,
    AlreadyOver,
    NotOver,
    EmptyPoint,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MoveError::OutOfBounds => "out of bounds",
            MoveError::CellOccupied => "cell occupied",
            MoveError::Suicide => "suicide move",
            MoveError::KoViolation => "ko violation: position repeats an earlier board",
            MoveError::NoColor => "no stone color to place",
            MoveError::GameOver => "game is over",
            MoveError::AlreadyOver => "already over",
            MoveError::NotOver => "dead stones can only be marked once the game is over",
            MoveError::EmptyPoint => "no stone at that point",
        };
        f.write_str(text)
    }
}

impl std::error::Error for MoveError {}
