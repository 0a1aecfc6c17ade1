//! Interactive setup of zodiac slot, drag box and button positions.
//!
//! Clicks on the game window are captured with a global mouse hook and
//! walked through a step machine. Slots can be clicked one by one or
//! generated from a grid.

pub mod grid;
pub mod hook;
pub mod state;
pub mod wizard;

pub use grid::GridLayout;
pub use wizard::{run_setup, run_setup_session, SetupMode, SetupResult};
