use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::engine::Stone;

/// Randomness for matchmaking decisions. Seedable so tests can pin the
/// color assignment.
pub struct SessionRng {
    rng: StdRng,
    seed: u64,
}

impl SessionRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn from_random() -> Self {
        let seed: u64 = rand::rng().random();
        Self::new(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Color for the first of two paired players; the second gets the other.
    pub fn first_player_color(&mut self) -> Stone {
        if self.rng.random_bool(0.5) {
            Stone::Black
        } else {
            Stone::White
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_colors() {
        let mut a = SessionRng::new(7);
        let mut b = SessionRng::new(7);
        let first: Vec<Stone> = (0..16).map(|_| a.first_player_color()).collect();
        let second: Vec<Stone> = (0..16).map(|_| b.first_player_color()).collect();
        assert_eq!(first, second);
        assert_eq!(a.seed(), 7);
    }

    #[test]
    fn test_both_colors_occur() {
        let mut rng = SessionRng::new(1234);
        let colors: Vec<Stone> = (0..64).map(|_| rng.first_player_color()).collect();
        assert!(colors.contains(&Stone::Black));
        assert!(colors.contains(&Stone::White));
    }
}
