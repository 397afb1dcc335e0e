use std::collections::HashSet;

use super::board::Board;
use super::error::MoveError;
use super::hasher::hash_board;
use super::scoring::{Scores, territorial_scores};
use super::stone::{Point, Stone};

pub const BOTH_PASSED: &str = "both players passed";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Over { reason: String },
}

/// Turn order, pass/resign state machine and full position history for
/// one match.
#[derive(Clone, Debug)]
pub struct GameState {
    board: Board,
    turn: Stone,
    consecutive_passes: u32,
    status: GameStatus,
    last_move: Option<Point>,
    history: Vec<u64>,
    seen_positions: HashSet<u64>,
    dead_stones: HashSet<Point>,
    conceded_by: Option<Stone>,
}

impl GameState {
    pub fn new(board_size: usize) -> Result<Self, String> {
        Ok(Self::from_board(Board::new(board_size)?, Stone::Black))
    }

    /// Handicap game: black stones on the star points, white moves first.
    pub fn with_handicap(board_size: usize, handicap: usize) -> Result<Self, String> {
        let mut board = Board::new(board_size)?;
        board.place_handicap(handicap)?;
        Ok(Self::from_board(board, Stone::White))
    }

    fn from_board(board: Board, first_turn: Stone) -> Self {
        let initial_hash = hash_board(&board);
        Self {
            board,
            turn: first_turn,
            consecutive_passes: 0,
            status: GameStatus::InProgress,
            last_move: None,
            history: vec![initial_hash],
            seen_positions: HashSet::from([initial_hash]),
            dead_stones: HashSet::new(),
            conceded_by: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Stone {
        self.turn
    }

    pub fn status(&self) -> &GameStatus {
        &self.status
    }

    pub fn is_over(&self) -> bool {
        matches!(self.status, GameStatus::Over { .. })
    }

    pub fn over_reason(&self) -> Option<&str> {
        match &self.status {
            GameStatus::Over { reason } => Some(reason),
            GameStatus::InProgress => None,
        }
    }

    pub fn last_move(&self) -> Option<Point> {
        self.last_move
    }

    pub fn consecutive_passes(&self) -> u32 {
        self.consecutive_passes
    }

    /// Hash of every position reached so far, oldest first. Passes repeat
    /// the current hash.
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    pub fn play(&mut self, p: Point) -> Result<(), MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }

        let mut trial = self.board.clone();
        trial.place_stone(p, self.turn)?;

        let hash = hash_board(&trial);
        if self.seen_positions.contains(&hash) {
            return Err(MoveError::KoViolation);
        }

        self.board = trial;
        self.history.push(hash);
        self.seen_positions.insert(hash);
        self.last_move = Some(p);
        self.consecutive_passes = 0;
        self.flip_turn();
        Ok(())
    }

    pub fn pass(&mut self) -> Result<(), MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }

        self.consecutive_passes += 1;
        if self.consecutive_passes >= 2 {
            self.status = GameStatus::Over {
                reason: BOTH_PASSED.to_string(),
            };
        }

        self.history.push(hash_board(&self.board));
        self.last_move = None;
        self.flip_turn();
        Ok(())
    }

    /// The player to move resigns.
    pub fn resign(&mut self) -> Result<(), MoveError> {
        let resigner = self.turn;
        self.forfeit(resigner, format!("{} resigned", resigner))
    }

    /// Ends the game on behalf of `color`, whoever's turn it is.
    pub fn forfeit(&mut self, color: Stone, reason: String) -> Result<(), MoveError> {
        if self.is_over() {
            return Err(MoveError::AlreadyOver);
        }
        self.status = GameStatus::Over { reason };
        self.conceded_by = Some(color);
        Ok(())
    }

    /// Stones on the board plus prisoners taken. Used for the live score.
    pub fn score_for(&self, color: Stone) -> u32 {
        self.board.area_controlled_by(color) as u32 + self.board.captures_by(color)
    }

    pub fn winner(&self) -> Option<Stone> {
        if !self.is_over() {
            return None;
        }
        if let Some(loser) = self.conceded_by {
            return loser.opponent();
        }
        let black = self.score_for(Stone::Black);
        let white = self.score_for(Stone::White);
        match black.cmp(&white) {
            std::cmp::Ordering::Greater => Some(Stone::Black),
            std::cmp::Ordering::Less => Some(Stone::White),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn dead_stones(&self) -> &HashSet<Point> {
        &self.dead_stones
    }

    pub fn is_dead(&self, p: Point) -> bool {
        self.dead_stones.contains(&p)
    }

    /// Marks the whole group at `p` dead, or alive again if it already was.
    pub fn toggle_dead_stone(&mut self, p: Point) -> Result<(), MoveError> {
        if !self.is_over() {
            return Err(MoveError::NotOver);
        }
        match self.board.stone_at(p) {
            None => return Err(MoveError::OutOfBounds),
            Some(Stone::Empty) => return Err(MoveError::EmptyPoint),
            Some(_) => {}
        }

        let group = self.board.group_of(p);
        if self.dead_stones.contains(&p) {
            for point in &group {
                self.dead_stones.remove(point);
            }
        } else {
            self.dead_stones.extend(group);
        }
        Ok(())
    }

    /// Territory plus prisoners with the marked dead stones removed first.
    /// Komi is not included.
    pub fn calculate_territorial_scores(&self) -> Scores {
        territorial_scores(&self.board, &self.dead_stones)
    }

    fn flip_turn(&mut self) {
        if let Some(next) = self.turn.opponent() {
            self.turn = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(state: &mut GameState, x: i32, y: i32) {
        state.play(Point::new(x, y)).unwrap();
    }

    #[test]
    fn test_new_game_starts_with_black_and_one_position() {
        let state = GameState::new(9).unwrap();
        assert_eq!(state.turn(), Stone::Black);
        assert!(!state.is_over());
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.last_move(), None);
    }

    #[test]
    fn test_play_flips_turn_and_records_move() {
        let mut state = GameState::new(9).unwrap();
        play(&mut state, 4, 4);
        assert_eq!(state.turn(), Stone::White);
        assert_eq!(state.last_move(), Some(Point::new(4, 4)));
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.score_for(Stone::Black), 1);
        assert_eq!(state.score_for(Stone::White), 0);
    }

    #[test]
    fn test_rejected_move_keeps_turn() {
        let mut state = GameState::new(9).unwrap();
        play(&mut state, 4, 4);
        assert_eq!(state.play(Point::new(4, 4)), Err(MoveError::CellOccupied));
        assert_eq!(state.play(Point::new(20, 4)), Err(MoveError::OutOfBounds));
        assert_eq!(state.turn(), Stone::White);
        assert_eq!(state.history().len(), 2);
    }

    #[test]
    fn test_three_by_three_capture_scenario() {
        let mut state = GameState::new(3).unwrap();
        play(&mut state, 1, 1);
        play(&mut state, 0, 0);
        play(&mut state, 0, 1);
        play(&mut state, 2, 0);
        play(&mut state, 1, 0);

        assert_eq!(state.board().stone_at(Point::new(0, 0)), Some(Stone::Empty));
        assert_eq!(state.board().captures_by(Stone::Black), 1);
        assert!(state.score_for(Stone::Black) > state.score_for(Stone::White));
    }

    #[test]
    fn test_suicide_scenario_on_nine_by_nine() {
        let mut state = GameState::new(9).unwrap();
        // Black answers far away so White can build the eye.
        let white_moves = [(1, 0), (0, 1), (2, 1), (1, 2)];
        let black_moves = [(8, 8), (8, 7), (8, 6), (8, 5)];
        for (w, b) in white_moves.iter().zip(black_moves.iter()) {
            play(&mut state, b.0, b.1);
            play(&mut state, w.0, w.1);
        }
        let before = state.board().clone();

        assert_eq!(state.play(Point::new(1, 1)), Err(MoveError::Suicide));
        assert_eq!(state.board(), &before);
        assert_eq!(state.board().stone_at(Point::new(1, 1)), Some(Stone::Empty));
        assert_eq!(state.turn(), Stone::Black);
    }

    #[test]
    fn test_ko_recapture_is_rejected() {
        // . B W .
        // B W . W
        // . B W .
        let mut state = GameState::new(9).unwrap();
        let moves = [
            (1, 0), (2, 0),
            (0, 1), (1, 1),
            (1, 2), (3, 1),
            (8, 8), (2, 2),
        ];
        for (x, y) in moves {
            play(&mut state, x, y);
        }

        // Black takes the ko.
        play(&mut state, 2, 1);
        assert_eq!(state.board().stone_at(Point::new(1, 1)), Some(Stone::Empty));

        let before = state.board().clone();
        let history_len = state.history().len();
        assert_eq!(state.play(Point::new(1, 1)), Err(MoveError::KoViolation));
        assert_eq!(state.board(), &before);
        assert_eq!(state.history().len(), history_len);
        assert_eq!(state.turn(), Stone::White);

        // Once both sides play elsewhere the recapture no longer repeats a position.
        play(&mut state, 7, 7);
        play(&mut state, 6, 6);
        assert_eq!(state.play(Point::new(1, 1)), Ok(()));
    }

    #[test]
    fn test_two_passes_end_the_game() {
        let mut state = GameState::new(9).unwrap();
        assert_eq!(state.pass(), Ok(()));
        assert!(!state.is_over());
        assert_eq!(state.pass(), Ok(()));
        assert!(state.is_over());
        assert_eq!(state.over_reason(), Some(BOTH_PASSED));
        assert_eq!(state.history().len(), 3);
    }

    #[test]
    fn test_move_between_passes_resets_counter() {
        let mut state = GameState::new(9).unwrap();
        state.pass().unwrap();
        play(&mut state, 3, 3);
        assert_eq!(state.consecutive_passes(), 0);
        state.pass().unwrap();
        assert!(!state.is_over());
        assert_eq!(state.last_move(), None);
    }

    #[test]
    fn test_over_state_is_absorbing() {
        let mut state = GameState::new(9).unwrap();
        state.resign().unwrap();
        assert!(state.is_over());
        assert_eq!(state.over_reason(), Some("BLACK resigned"));
        assert_eq!(state.winner(), Some(Stone::White));

        assert_eq!(state.play(Point::new(0, 0)), Err(MoveError::GameOver));
        assert_eq!(state.pass(), Err(MoveError::GameOver));
        assert_eq!(state.resign(), Err(MoveError::AlreadyOver));
        assert!(state.is_over());
    }

    #[test]
    fn test_forfeit_names_the_given_color() {
        let mut state = GameState::new(9).unwrap();
        state
            .forfeit(Stone::White, "WHITE disconnected".to_string())
            .unwrap();
        assert_eq!(state.over_reason(), Some("WHITE disconnected"));
        assert_eq!(state.winner(), Some(Stone::Black));
    }

    #[test]
    fn test_winner_after_passes_uses_live_score() {
        let mut state = GameState::new(9).unwrap();
        play(&mut state, 4, 4);
        state.pass().unwrap();
        state.pass().unwrap();
        assert_eq!(state.winner(), Some(Stone::Black));
    }

    #[test]
    fn test_dead_stones_only_after_game_over() {
        let mut state = GameState::new(9).unwrap();
        play(&mut state, 4, 4);
        assert_eq!(state.toggle_dead_stone(Point::new(4, 4)), Err(MoveError::NotOver));
    }

    #[test]
    fn test_toggle_dead_stone_marks_whole_group_and_is_idempotent() {
        let mut state = GameState::new(9).unwrap();
        play(&mut state, 4, 4);
        play(&mut state, 0, 0);
        play(&mut state, 4, 5);
        state.pass().unwrap();
        state.pass().unwrap();

        state.toggle_dead_stone(Point::new(4, 5)).unwrap();
        assert!(state.is_dead(Point::new(4, 4)));
        assert!(state.is_dead(Point::new(4, 5)));
        assert!(!state.is_dead(Point::new(0, 0)));

        state.toggle_dead_stone(Point::new(4, 4)).unwrap();
        assert!(state.dead_stones().is_empty());

        assert_eq!(state.toggle_dead_stone(Point::new(1, 1)), Err(MoveError::EmptyPoint));
        assert_eq!(state.toggle_dead_stone(Point::new(9, 1)), Err(MoveError::OutOfBounds));
    }

    #[test]
    fn test_handicap_game_starts_with_white() {
        let state = GameState::with_handicap(9, 3).unwrap();
        assert_eq!(state.turn(), Stone::White);
        assert_eq!(state.board().area_controlled_by(Stone::Black), 3);
        assert!(GameState::with_handicap(9, 12).is_err());
    }
}
