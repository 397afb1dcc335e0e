pub mod config;
pub mod engine;
pub mod id_generator;
pub mod identifiers;
pub mod logger;
pub mod protocol;

pub use identifiers::*;
