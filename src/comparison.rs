//! Head-to-head runner comparing the three variants on one game.
//!
//! Every decision is searched by all three variants from the same state.
//! The Elastic recommendation is played, except that with a small
//! probability the played variant is drawn uniformly, which keeps the
//! visited positions varied across matches.

use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::{Game, MatchConfig, Mcts, MctsError, Player, Result, SearchSummary, Variant};

/// Offset separating the exploration stream from the searchers' seed.
const EXPLORE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// One decision of the match.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnRecord<A> {
    /// Match turn, starting at 1.
    pub turn: usize,
    pub player: Player,
    /// Summaries in [`Variant::ALL`] order.
    pub summaries: Vec<SearchSummary>,
    /// Variant whose recommendation was played.
    pub played: Variant,
    pub action: A,
    /// Legal actions of the player to move after the action.
    pub next_choices: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The game reached a terminal state.
    Terminal,
    /// The match ran out of turns first.
    TurnCap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    /// `None` for a draw.
    pub winner: Option<Player>,
    pub termination: Termination,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchReport<A> {
    pub turns: Vec<TurnRecord<A>>,
    pub plies: usize,
    pub outcome: MatchOutcome,
}

/// Plays one match from `initial` and records every decision.
///
/// The three searchers share `config.mcts`, including its seed, and persist
/// for the whole match. Each match turn is two plies; in Kill The King the
/// same player usually plays both.
///
/// # Errors
/// [`MctsError::InvalidConfiguration`] if `config` does not validate, and
/// [`MctsError::IllegalAction`] if a searcher recommends an action that is
/// not legal. Search errors are propagated.
pub fn play_match<G: Game + Clone>(game: &G, initial: G::State, config: &MatchConfig) -> Result<MatchReport<G::Action>> {
    config.validate()?;

    let mut searchers = Variant::ALL
        .iter()
        .map(|&variant| Mcts::new(game.clone(), variant, config.mcts.clone()))
        .collect::<Result<Vec<_>>>()?;
    let mut explore = match config.mcts.seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ EXPLORE_STREAM),
        None => StdRng::from_os_rng(),
    };

    let mut state = initial;
    let mut turns = Vec::new();
    let mut plies = 0;

    'turns: for turn in 1..=config.turns {
        for _ in 0..2 {
            if game.is_terminal(&state) {
                break 'turns;
            }
            let player = game.current_player(&state);

            let results = searchers
                .iter_mut()
                .map(|mcts| mcts.search(&state))
                .collect::<Result<Vec<_>>>()?;

            let played = if explore.random::<f64>() < config.explore_probability {
                Variant::ALL[explore.random_range(0..Variant::ALL.len())]
            } else {
                Variant::Elastic
            };
            let position = Variant::ALL.iter().position(|&variant| variant == played).unwrap_or(0);
            let action = results[position].action.clone();

            if !game.legal_actions(&state).contains(&action) {
                return Err(MctsError::IllegalAction {
                    action: format!("{action:?}"),
                });
            }
            state = game.step(&state, &action);
            plies += 1;

            let next_choices = game.legal_actions(&state).len();
            info!(
                "turn {turn} player {player}: {played} plays {action:?} (nodes {}), {next_choices} choices next",
                results[position].summary.ground_nodes
            );

            turns.push(TurnRecord {
                turn,
                player,
                summaries: results.into_iter().map(|result| result.summary).collect(),
                played,
                action,
                next_choices,
            });
        }
    }

    let termination = if game.is_terminal(&state) { Termination::Terminal } else { Termination::TurnCap };
    let outcome = MatchOutcome {
        winner: winner(game, &state),
        termination,
    };
    info!("match over after {plies} plies: {outcome:?}");

    Ok(MatchReport { turns, plies, outcome })
}

/// Player 0 wins when its evaluation is positive, player 1 when negative.
fn winner<G: Game>(game: &G, state: &G::State) -> Option<Player> {
    let value = game.evaluate(state, 0);
    if value > 0.0 {
        Some(0)
    } else if value < 0.0 {
        Some(1)
    } else {
        None
    }
}
