use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::board::Board;
use super::stone::Stone;

/// Largest board the hash table covers.
pub const MAX_BOARD_SIZE: usize = 25;

const TABLE_SEED: u64 = 0x6F5F_7365_6B69_2019;

static POSITION_HASHER: OnceLock<PositionHasher> = OnceLock::new();

/// Zobrist-style hash of a whole board. The random table is generated once
/// from a fixed seed, so the same position hashes identically in every
/// process.
pub struct PositionHasher {
    // One pair per cell: [black, white].
    table: Vec<[u64; 2]>,
}

impl PositionHasher {
    fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let table = (0..MAX_BOARD_SIZE * MAX_BOARD_SIZE)
            .map(|_| [rng.random(), rng.random()])
            .collect();
        Self { table }
    }

    pub fn global() -> &'static PositionHasher {
        POSITION_HASHER.get_or_init(|| PositionHasher::with_seed(TABLE_SEED))
    }

    pub fn hash(&self, board: &Board) -> u64 {
        board
            .points()
            .fold(0u64, |hash, p| {
                let slot = p.y as usize * MAX_BOARD_SIZE + p.x as usize;
                match board.stone_at(p) {
                    Some(Stone::Black) => hash ^ self.table[slot][0],
                    Some(Stone::White) => hash ^ self.table[slot][1],
                    _ => hash,
                }
            })
    }
}

pub fn hash_board(board: &Board) -> u64 {
    PositionHasher::global().hash(board)
}
