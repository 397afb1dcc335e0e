use std::sync::atomic::{AtomicU64, Ordering};
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "Patient", "Quiet", "Sharp", "Calm", "Bold", "Steady", "Clever", "Humble",
    "Swift", "Solid", "Nimble", "Wise", "Keen", "Gentle", "Stubborn", "Bright",
];

const NOUNS: &[&str] = &[
    "Tiger", "Crane", "Dragon", "Turtle", "Heron", "Monkey", "Snake", "Ox",
    "Fox", "Carp", "Owl", "Wolf", "Hare", "Badger", "Sparrow", "Bear",
];

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Readable peer name, unique within the process thanks to the sequence suffix.
pub fn generate_client_id() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}{}-{}", adjective, noun, sequence)
}
