use std::fmt;
use std::str::FromStr;

/// Contents of a single board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stone {
    Empty,
    Black,
    White,
}

impl Stone {
    pub fn opponent(&self) -> Option<Stone> {
        match self {
            Stone::Black => Some(Stone::White),
            Stone::White => Some(Stone::Black),
            Stone::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Stone::Empty
    }

    /// Single character used in board snapshots.
    pub fn to_char(&self) -> char {
        match self {
            Stone::Empty => '.',
            Stone::Black => 'B',
            Stone::White => 'W',
        }
    }

    pub fn from_char(c: char) -> Option<Stone> {
        match c {
            '.' => Some(Stone::Empty),
            'B' => Some(Stone::Black),
            'W' => Some(Stone::White),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stone::Empty => "EMPTY",
            Stone::Black => "BLACK",
            Stone::White => "WHITE",
        }
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BLACK" => Ok(Stone::Black),
            "WHITE" => Ok(Stone::White),
            "EMPTY" => Ok(Stone::Empty),
            other => Err(format!("Unknown stone color '{}'", other)),
        }
    }
}

/// Board coordinate. Signed so that malformed client input such as "-1,3"
/// survives parsing and is rejected as out of bounds by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_valid(&self, board_size: usize) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as usize) < board_size && (self.y as usize) < board_size
    }

    /// Orthogonal neighbours, not filtered by board bounds.
    pub fn neighbors(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y - 1),
            Point::new(self.x + 1, self.y),
            Point::new(self.x, self.y + 1),
            Point::new(self.x - 1, self.y),
        ]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = String;

    /// Parses the `MOVE` payload grammar "x,y".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("Malformed move '{}': expected x,y", s))?;
        let x = x
            .trim()
            .parse::<i32>()
            .map_err(|e| format!("Malformed x coordinate '{}': {}", x.trim(), e))?;
        let y = y
            .trim()
            .parse::<i32>()
            .map_err(|e| format!("Malformed y coordinate '{}': {}", y.trim(), e))?;
        Ok(Point::new(x, y))
    }
}
