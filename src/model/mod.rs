//! Pure data structures (DTOs) for the Siren wire format.

pub mod payload;

pub use payload::*;
