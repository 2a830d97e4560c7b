//! Runs one comparison match between Standard, Random-Grouping and Elastic MCTS.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use elastic_mcts::comparison::{play_match, MatchReport};
use elastic_mcts::{Game, KillTheKing, MatchConfig, TicTacToe};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GameKind {
    /// Kill The King
    Ktk,
    Tictactoe,
}

#[derive(Parser, Debug)]
#[command(name = "elastic-mcts")]
#[command(version, about = "Compare Standard, Random-Grouping and Elastic MCTS on one match", long_about = None)]
struct Cli {
    /// Match configuration (JSON); flags below override its values
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = GameKind::Ktk)]
    game: GameKind,

    /// Write the match report as JSON
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Iterations per decision
    #[arg(long)]
    iterations: Option<usize>,

    /// Iterations between abstraction rebuilds
    #[arg(long)]
    batch_size: Option<usize>,

    /// Lifetime iterations before the first rebuild
    #[arg(long)]
    alpha_abs: Option<usize>,

    /// Reward error threshold
    #[arg(long)]
    eta_r: Option<f64>,

    /// Transition error threshold
    #[arg(long)]
    eta_t: Option<f64>,

    #[arg(long)]
    rollout_depth: Option<usize>,

    /// Match turns
    #[arg(long)]
    turns: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    board_size: Option<usize>,

    /// Game turns before Kill The King counts living units
    #[arg(long)]
    max_turns: Option<usize>,

    /// Start Kill The King from a seeded random setup
    #[arg(long)]
    random_setup: Option<bool>,
}

impl Cli {
    fn match_config(&self) -> Result<MatchConfig> {
        let mut config = match &self.config {
            Some(path) => MatchConfig::from_json_file(path)?,
            None => MatchConfig::default(),
        };

        let mcts = &mut config.mcts;
        if let Some(iterations) = self.iterations {
            mcts.iterations = iterations;
        }
        if let Some(batch_size) = self.batch_size {
            mcts.batch_size = batch_size;
        }
        if let Some(alpha_abs) = self.alpha_abs {
            mcts.alpha_abs = alpha_abs;
        }
        if let Some(eta_r) = self.eta_r {
            mcts.eta_r = eta_r;
        }
        if let Some(eta_t) = self.eta_t {
            mcts.eta_t = eta_t;
        }
        if let Some(rollout_depth) = self.rollout_depth {
            mcts.rollout_depth = rollout_depth;
        }
        if self.seed.is_some() {
            mcts.seed = self.seed;
        }

        let ktk = &mut config.ktk;
        if let Some(board_size) = self.board_size {
            ktk.board_size = board_size;
        }
        if let Some(max_turns) = self.max_turns {
            ktk.max_turns = max_turns;
        }
        if let Some(random_setup) = self.random_setup {
            ktk.random_setup = random_setup;
        }
        if let Some(turns) = self.turns {
            config.turns = turns;
        }

        config.validate()?;
        Ok(config)
    }
}

fn run<G: Game + Clone>(game: &G, initial: G::State, config: &MatchConfig, output: Option<&PathBuf>) -> Result<()>
where
    G::Action: Serialize,
{
    let report: MatchReport<G::Action> = play_match(game, initial, config)?;

    match report.outcome.winner {
        Some(winner) => println!(
            "player {winner} wins after {} plies ({:?})",
            report.plies, report.outcome.termination
        ),
        None => println!("draw after {} plies ({:?})", report.plies, report.outcome.termination),
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("failed to write report to {}", path.display()))?;
        log::info!("report written to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.match_config()?;

    match cli.game {
        GameKind::Ktk => {
            let game = KillTheKing::from_config(&config.ktk)?;
            let initial = if config.ktk.random_setup {
                let mut rng = match config.mcts.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_os_rng(),
                };
                game.random_state(&mut rng)
            } else {
                game.initial_state()
            };
            log::info!("initial position:\n{initial}");
            run(&game, initial, &config, cli.output.as_ref())
        }
        GameKind::Tictactoe => run(&TicTacToe, TicTacToe.initial_state(), &config, cli.output.as_ref()),
    }
}
