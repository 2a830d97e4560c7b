//! Search and match configuration.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ActionPolicy, KtkConfig, MctsError, Result};

/// The three search variants under comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Plain UCT, the resolution map is always the identity.
    Standard,
    /// Candidates are grouped uniformly at random, as a noise baseline.
    RandomGrouping,
    /// Candidates are grouped by approximate MDP homomorphism refinement.
    Elastic,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Standard, Variant::RandomGrouping, Variant::Elastic];

    /// Whether this variant ever rebuilds an abstraction.
    #[inline]
    pub fn abstracts(self) -> bool {
        self != Variant::Standard
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::Standard => "standard",
            Variant::RandomGrouping => "random-grouping",
            Variant::Elastic => "elastic",
        })
    }
}

impl FromStr for Variant {
    type Err = MctsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard" => Ok(Variant::Standard),
            "random-grouping" | "random_grouping" | "random" => Ok(Variant::RandomGrouping),
            "elastic" => Ok(Variant::Elastic),
            other => Err(MctsError::invalid(format!("unknown variant '{other}'"))),
        }
    }
}

/// Configuration of one searcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Iterations run for every decision.
    pub iterations: usize,

    /// Exploration coefficient of the UCB rule.
    pub exploration: f64,

    /// Iterations between two abstraction rebuilds (B).
    pub batch_size: usize,

    /// Warm-up: no abstraction until the searcher's lifetime iteration
    /// counter exceeds this value (α_ABS).
    pub alpha_abs: usize,

    /// Reward-error threshold (η_R).
    pub eta_r: f64,

    /// Transition-error threshold (η_T), a total-variation distance.
    pub eta_t: f64,

    /// Maximum number of actions played by a rollout.
    pub rollout_depth: usize,

    /// Refinement rounds allowed before the abstraction gives up for the window.
    pub max_refinement_rounds: usize,

    /// Try priority (attack) actions first during expansion, bias rollouts
    /// towards them and keep them apart in the coarse partition.
    pub unit_ordering: bool,

    /// Probability mass a rollout puts on priority actions when any is legal.
    pub attack_bias: f64,

    /// How representative action sets of abstract classes are formed.
    pub action_policy: ActionPolicy,

    /// Seed of the searcher's random source, `None` to seed from the OS.
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            exploration: std::f64::consts::SQRT_2,
            batch_size: 20,
            alpha_abs: 160,
            eta_r: 0.1,
            eta_t: 1.0,
            rollout_depth: 20,
            max_refinement_rounds: 16,
            unit_ordering: true,
            attack_bias: 1.0,
            action_policy: ActionPolicy::Intersection,
            seed: None,
        }
    }
}

impl MctsConfig {
    /// Builder pattern: set the iteration budget.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Builder pattern: set batch size and warm-up threshold.
    pub fn with_batching(mut self, batch_size: usize, alpha_abs: usize) -> Self {
        self.batch_size = batch_size;
        self.alpha_abs = alpha_abs;
        self
    }

    /// Builder pattern: set both homomorphism thresholds.
    pub fn with_thresholds(mut self, eta_r: f64, eta_t: f64) -> Self {
        self.eta_r = eta_r;
        self.eta_t = eta_t;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_unit_ordering(mut self, unit_ordering: bool) -> Self {
        self.unit_ordering = unit_ordering;
        self
    }

    /// Checks every option independently.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(MctsError::invalid("iterations must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(MctsError::invalid("batch_size must be at least 1"));
        }
        if self.max_refinement_rounds == 0 {
            return Err(MctsError::invalid("max_refinement_rounds must be at least 1"));
        }
        if !(self.exploration.is_finite() && self.exploration >= 0.0) {
            return Err(MctsError::invalid(format!(
                "exploration must be finite and non-negative, got {}",
                self.exploration
            )));
        }
        for (name, value) in [("eta_r", self.eta_r), ("eta_t", self.eta_t)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MctsError::invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.attack_bias) {
            return Err(MctsError::invalid(format!(
                "attack_bias must lie in [0, 1], got {}",
                self.attack_bias
            )));
        }
        Ok(())
    }
}

/// Configuration of a comparison match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Settings shared by the three searchers.
    pub mcts: MctsConfig,

    /// Rules of the Kill The King board.
    pub ktk: KtkConfig,

    /// Match turns, two plies each.
    pub turns: usize,

    /// Chance to play a uniformly chosen variant's action instead of the
    /// Elastic recommendation.
    pub explore_probability: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mcts: MctsConfig::default(),
            ktk: KtkConfig::default(),
            turns: 30,
            explore_probability: 0.2,
        }
    }
}

impl MatchConfig {
    /// Loads a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MctsError::Io {
            operation: format!("read configuration {}", path.display()),
            source,
        })?;
        let config: MatchConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.mcts.validate()?;
        self.ktk.validate()?;
        if !(0.0..=1.0).contains(&self.explore_probability) {
            return Err(MctsError::invalid(format!(
                "explore_probability must lie in [0, 1], got {}",
                self.explore_probability
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.iterations, 50);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.alpha_abs, 160);
        assert!((config.exploration - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = MctsConfig::default()
            .with_iterations(10)
            .with_batching(5, 0)
            .with_thresholds(0.0, 0.0)
            .with_seed(7);

        assert_eq!(config.iterations, 10);
        assert_eq!((config.batch_size, config.alpha_abs), (5, 0));
        assert_eq!((config.eta_r, config.eta_t), (0.0, 0.0));
        assert_eq!(config.seed, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(MctsConfig::default().with_iterations(0).validate().is_err());
        assert!(MctsConfig::default().with_batching(0, 10).validate().is_err());
        assert!(MctsConfig::default().with_thresholds(-0.1, 1.0).validate().is_err());
        assert!(MctsConfig::default().with_thresholds(0.1, f64::NAN).validate().is_err());

        let config = MctsConfig {
            attack_bias: 1.5,
            ..MctsConfig::default()
        };
        assert!(matches!(config.validate(), Err(MctsError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("elastic".parse::<Variant>().unwrap(), Variant::Elastic);
        assert_eq!("random-grouping".parse::<Variant>().unwrap(), Variant::RandomGrouping);
        assert!("alphazero".parse::<Variant>().is_err());
        for variant in Variant::ALL {
            assert_eq!(variant.to_string().parse::<Variant>().unwrap(), variant);
        }
        assert!(!Variant::Standard.abstracts());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: MatchConfig = serde_json::from_str(r#"{"turns": 5, "mcts": {"eta_r": 0.3}}"#).unwrap();
        assert_eq!(config.turns, 5);
        assert_eq!(config.mcts.eta_r, 0.3);
        assert_eq!(config.mcts.iterations, 50);
        assert_eq!(config.ktk, KtkConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let error = MatchConfig::from_json_file("/nonexistent/match.json").unwrap_err();
        assert!(matches!(error, MctsError::Io { .. }));
    }
}
