use std::collections::{HashSet, VecDeque};

use super::board::Board;
use super::stone::{Point, Stone};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scores {
    pub black: u32,
    pub white: u32,
}

impl Scores {
    pub fn for_color(&self, color: Stone) -> u32 {
        match color {
            Stone::Black => self.black,
            Stone::White => self.white,
            Stone::Empty => 0,
        }
    }

    fn add(&mut self, color: Stone, points: u32) {
        match color {
            Stone::Black => self.black += points,
            Stone::White => self.white += points,
            Stone::Empty => {}
        }
    }
}

/// Territory scoring. Dead stones are lifted first and count as prisoners
/// for their opponent. An empty region touching both colors is neutral and
/// scores for nobody.
pub fn territorial_scores(board: &Board, dead_stones: &HashSet<Point>) -> Scores {
    let mut scores = Scores::default();
    let mut scratch = board.clone();

    for point in dead_stones {
        if let Some(color) = scratch.remove_stone(*point)
            && let Some(opponent) = color.opponent()
        {
            scores.add(opponent, 1);
        }
    }

    let mut visited: HashSet<Point> = HashSet::new();
    for start in scratch.points() {
        if scratch.stone_at(start) != Some(Stone::Empty) || visited.contains(&start) {
            continue;
        }

        let (region_size, borders) = flood_empty_region(&scratch, start, &mut visited);
        if borders.len() == 1
            && let Some(owner) = borders.iter().next()
        {
            scores.add(*owner, region_size);
        }
    }

    scores.add(Stone::Black, board.captures_by(Stone::Black));
    scores.add(Stone::White, board.captures_by(Stone::White));
    scores
}

fn flood_empty_region(board: &Board, start: Point, visited: &mut HashSet<Point>) -> (u32, HashSet<Stone>) {
    let mut borders = HashSet::new();
    let mut size = 0;
    let mut queue = VecDeque::from([start]);
    visited.insert(start);

    while let Some(current) = queue.pop_front() {
        size += 1;
        for neighbor in board.neighbors(current) {
            match board.stone_at(neighbor) {
                Some(Stone::Empty) => {
                    if visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
                Some(color) => {
                    borders.insert(color);
                }
                None => {}
            }
        }
    }

    (size, borders)
}
