//! A Rust library comparing three flavours of Monte Carlo Tree Search
//! (MCTS) on two-player, turn-based games.
//!
//! - **Standard MCTS**: plain UCT over ground nodes.
//! - **Random-Grouping MCTS**: every batch of iterations, recently created
//!   nodes are merged at random into classes sharing statistics. This is a
//!   noise baseline.
//! - **Elastic MCTS**: nodes are merged only when an approximate MDP
//!   homomorphism holds between them, i.e. their immediate rewards and
//!   successor classes agree within the thresholds η_R and η_T.
//!
//! All three share one control loop; statistics are looked up through a
//! [`Resolution`] map that redirects a ground node to its abstract class.
//!
//! # Modules
//! - `game`: Defines the [`Game`] trait the search is generic over.
//! - `tree`: Arena tree addressed by [`NodeId`].
//! - `node`: Ground node payload and its [`Stats`].
//! - `abstraction`: [`Partition`], [`AbstractClass`] and the [`Resolution`] map.
//! - `homomorphism`: The Elastic partition refinement.
//! - `grouping`: The random partition baseline.
//! - `mcts`: The [`Mcts`] searcher.
//! - `statistics`: Per-iteration records and per-decision summaries.
//! - `config`: [`MctsConfig`], [`MatchConfig`] and [`Variant`].
//! - `ktk`, `tictactoe`: Reference games.
//! - `comparison`: Match runner pitting the three variants against the same positions.
//! - `utils`: Contains general utility functions.
//! - `test_utils`: Provides toy games for testing the search.
//!
//! # Examples
//! ```rust
//! use elastic_mcts::{Game, KillTheKing, Mcts, MctsConfig, MctsError, Variant};
//!
//! fn main() -> Result<(), MctsError> {
//!     let game = KillTheKing::new(4, 20)?;
//!     let config = MctsConfig::default()
//!         .with_iterations(100)
//!         .with_batching(20, 0)
//!         .with_seed(3);
//!     let mut mcts = Mcts::new(game, Variant::Elastic, config)?;
//!
//!     let state = game.initial_state();
//!     let result = mcts.search(&state)?;
//!     println!(
//!         "play {} ({} visits, compression {:.2})",
//!         result.action, result.visits, result.summary.compression_rate
//!     );
//!
//!     // Continue with the next game state
//!     let next = game.step(&state, &result.action);
//!     assert_eq!(game.current_player(&next), 0);
//!     Ok(())
//! }
//! ```

mod abstraction;
mod config;
mod error;
mod game;
mod homomorphism;
mod mcts;
mod node;
mod statistics;
mod tree;

pub mod comparison;
pub mod grouping;
pub mod ktk;
pub mod tictactoe;
pub mod utils;

#[doc(hidden)]
pub mod test_utils;

pub use abstraction::*;
pub use config::*;
pub use error::*;
pub use game::*;
pub use homomorphism::HomomorphismBuilder;
pub use ktk::{KillTheKing, KtkAction, KtkConfig, KtkState, UnitKind};
pub use mcts::*;
pub use node::*;
pub use statistics::*;
pub use tictactoe::TicTacToe;
pub use tree::*;
