mod board;
mod error;
mod game_state;
mod handicap;
mod hasher;
mod scoring;
mod stone;

pub use board::{Board, MIN_BOARD_SIZE};
pub use error::MoveError;
pub use game_state::{BOTH_PASSED, GameState, GameStatus};
pub use handicap::{MAX_HANDICAP, MIN_HANDICAP, handicap_points};
pub use hasher::{MAX_BOARD_SIZE, PositionHasher, hash_board};
pub use scoring::{Scores, territorial_scores};
pub use stone::{Point, Stone};
