//! Leduc hold'em.
//!
//! Two agents, chance deals, betting rounds. Exposes either an
//! information string (parsed by `LeducEncoder`) or a tensor (passed through
//! `TensorEncoder`).

mod encoder;
mod game;

pub use encoder::LeducEncoder;
pub use game::{
    LeducConfig, LeducPoker, ObservationFormat, CALL, DECK_SIZE, FOLD, NUM_ACTIONS, RAISE,
    TENSOR_SIZE,
};
