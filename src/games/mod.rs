//! Reference games implementing the engine contract.

pub mod leduc;
pub mod tic_tac_toe;
