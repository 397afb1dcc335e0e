use std::collections::{HashSet, VecDeque};

use super::error::MoveError;
use super::handicap::handicap_points;
use super::hasher::MAX_BOARD_SIZE;
use super::stone::{Point, Stone};

pub const MIN_BOARD_SIZE: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Stone>,
    captured_by_black: u32,
    captured_by_white: u32,
    last_captured: Vec<Point>,
}

impl Board {
    pub fn new(size: usize) -> Result<Self, String> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(format!(
                "Board size {} is outside the supported range {}..={}",
                size, MIN_BOARD_SIZE, MAX_BOARD_SIZE
            ));
        }

        Ok(Self {
            size,
            cells: vec![Stone::Empty; size * size],
            captured_by_black: 0,
            captured_by_white: 0,
            last_captured: Vec::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, p: Point) -> usize {
        p.y as usize * self.size + p.x as usize
    }

    /// `None` for points off the board.
    pub fn stone_at(&self, p: Point) -> Option<Stone> {
        if !p.is_valid(self.size) {
            return None;
        }
        Some(self.cells[self.index(p)])
    }

    fn set(&mut self, p: Point, stone: Stone) {
        let index = self.index(p);
        self.cells[index] = stone;
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        let size = self.size as i32;
        (0..size).flat_map(move |y| (0..size).map(move |x| Point::new(x, y)))
    }

    pub fn neighbors(&self, p: Point) -> impl Iterator<Item = Point> + '_ {
        p.neighbors().into_iter().filter(move |n| n.is_valid(self.size))
    }

    pub fn place_stone(&mut self, p: Point, color: Stone) -> Result<(), MoveError> {
        let opponent = color.opponent().ok_or(MoveError::NoColor)?;

        match self.stone_at(p) {
            None => return Err(MoveError::OutOfBounds),
            Some(Stone::Empty) => {}
            Some(_) => return Err(MoveError::CellOccupied),
        }

        self.set(p, color);

        let mut captured: HashSet<Point> = HashSet::new();
        let adjacent: Vec<Point> = self.neighbors(p).collect();
        for neighbor in adjacent {
            if self.stone_at(neighbor) != Some(opponent) || captured.contains(&neighbor) {
                continue;
            }
            let group = self.group_of(neighbor);
            if !self.has_liberty(&group) {
                captured.extend(group);
            }
        }

        // Capturing takes priority: only a non-capturing move can be suicide.
        if captured.is_empty() {
            let own_group = self.group_of(p);
            if !self.has_liberty(&own_group) {
                self.set(p, Stone::Empty);
                return Err(MoveError::Suicide);
            }
        }

        for point in &captured {
            self.set(*point, Stone::Empty);
        }

        let count = captured.len() as u32;
        match color {
            Stone::Black => self.captured_by_black += count,
            Stone::White => self.captured_by_white += count,
            Stone::Empty => {}
        }

        let mut last_captured: Vec<Point> = captured.into_iter().collect();
        last_captured.sort();
        self.last_captured = last_captured;

        Ok(())
    }

    /// Same-colored stones 4-connected to `p`; empty for an empty or
    /// off-board point.
    pub fn group_of(&self, p: Point) -> HashSet<Point> {
        let mut group = HashSet::new();
        let color = match self.stone_at(p) {
            Some(Stone::Empty) | None => return group,
            Some(color) => color,
        };

        let mut queue = VecDeque::from([p]);
        group.insert(p);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                if self.stone_at(neighbor) == Some(color) && group.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        group
    }

    pub fn has_liberty(&self, group: &HashSet<Point>) -> bool {
        group
            .iter()
            .any(|p| self.neighbors(*p).any(|n| self.stone_at(n) == Some(Stone::Empty)))
    }

    pub fn liberties_of(&self, group: &HashSet<Point>) -> HashSet<Point> {
        group
            .iter()
            .flat_map(|p| self.neighbors(*p))
            .filter(|n| self.stone_at(*n) == Some(Stone::Empty))
            .collect()
    }

    /// Restores this board to an exact copy of `other`.
    pub fn set_state(&mut self, other: &Board) {
        self.clone_from(other);
    }

    /// Number of cells occupied by `color`. Territory is not included.
    pub fn area_controlled_by(&self, color: Stone) -> usize {
        self.cells.iter().filter(|&&cell| cell == color).count()
    }

    /// Opponent stones removed by `color` so far.
    pub fn captures_by(&self, color: Stone) -> u32 {
        match color {
            Stone::Black => self.captured_by_black,
            Stone::White => self.captured_by_white,
            Stone::Empty => 0,
        }
    }

    pub fn last_captured(&self) -> &[Point] {
        &self.last_captured
    }

    /// Lifts a stone without crediting anyone, as when clearing dead stones
    /// for scoring.
    pub fn remove_stone(&mut self, p: Point) -> Option<Stone> {
        let stone = self.stone_at(p)?;
        if stone.is_empty() {
            return None;
        }
        self.set(p, Stone::Empty);
        Some(stone)
    }

    pub fn place_handicap(&mut self, count: usize) -> Result<(), String> {
        if self.cells.iter().any(|cell| !cell.is_empty()) {
            return Err("Handicap stones can only be placed on an empty board".to_string());
        }
        for point in handicap_points(self.size, count)? {
            self.set(point, Stone::Black);
        }
        Ok(())
    }

    /// Rows in y order, each holding the cells x = 0..size.
    pub fn snapshot(&self) -> Vec<Vec<Stone>> {
        self.cells.chunks(self.size).map(|row| row.to_vec()).collect()
    }

    #[cfg(test)]
    pub(crate) fn from_rows(rows: &[&str]) -> Self {
        let mut board = Board::new(rows.len()).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                board.set(Point::new(x as i32, y as i32), Stone::from_char(c).unwrap());
            }
        }
        board
    }
}
