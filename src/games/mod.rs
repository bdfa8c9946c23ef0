//! Game engines.
//!
//! Each engine is a plain state machine: it validates input, mutates its own
//! board and renders itself. Timers and message delivery live in
//! [`crate::session`].

pub mod memory;
pub mod password;
pub mod tictactoe;

pub use memory::{MemoryGame, MemoryPhase};
pub use password::{PasswordGame, PasswordParams, PasswordState};
pub use tictactoe::{best_move, Board, GameState, Mark, Player, TicTacToe};
