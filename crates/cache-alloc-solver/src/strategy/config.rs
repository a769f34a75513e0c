// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::strategy::{
    FillStrategy,
    brute_force::{BruteForce, BruteForceConfig},
    err::ConfigurationError,
    evolution::{Evolution, EvolutionConfig},
    monte_carlo::{MonteCarlo, MonteCarloConfig},
    random::{RandomConfig, RandomFill},
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Selects one strategy and its parameters.
///
/// Serialized with a `kind` tag, e.g.
/// `{"kind": "evolution", "pool_size": 50, "max_generations": 200}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    Random(RandomConfig),
    BruteForce(BruteForceConfig),
    MonteCarlo(MonteCarloConfig),
    Evolution(EvolutionConfig),
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::Evolution(EvolutionConfig::default())
    }
}

impl StrategyConfig {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::Random(_) => "Random",
            StrategyConfig::BruteForce(_) => "BruteForce",
            StrategyConfig::MonteCarlo(_) => "MonteCarlo",
            StrategyConfig::Evolution(_) => "Evolution",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            StrategyConfig::Random(c) => c.validate(),
            StrategyConfig::BruteForce(c) => c.validate(),
            StrategyConfig::MonteCarlo(c) => c.validate(),
            StrategyConfig::Evolution(c) => c.validate(),
        }
    }

    /// Validates and instantiates the configured strategy.
    pub fn build<R: Rng + 'static>(
        &self,
    ) -> Result<Box<dyn FillStrategy<R> + Send>, ConfigurationError> {
        self.validate()?;
        let strategy: Box<dyn FillStrategy<R> + Send> = match *self {
            StrategyConfig::Random(c) => Box::new(RandomFill::new(c)),
            StrategyConfig::BruteForce(c) => Box::new(BruteForce::new(c)),
            StrategyConfig::MonteCarlo(c) => Box::new(MonteCarlo::new(c)),
            StrategyConfig::Evolution(c) => Box::new(Evolution::new(c)),
        };
        Ok(strategy)
    }
}

impl std::fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::repair::RepairOrder;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parses_tagged_variants_with_defaults() {
        let cfg: StrategyConfig =
            serde_json::from_str(r#"{"kind": "evolution", "pool_size": 50}"#).unwrap();
        match cfg {
            StrategyConfig::Evolution(e) => {
                assert_eq!(e.pool_size, 50);
                assert_eq!(e.selection, 0.5);
                assert_eq!(e.repair, RepairOrder::ValueDensity);
            }
            other => panic!("unexpected {:?}", other),
        }

        let cfg: StrategyConfig = serde_json::from_str(r#"{"kind": "random"}"#).unwrap();
        assert_eq!(cfg, StrategyConfig::Random(RandomConfig::default()));

        let cfg: StrategyConfig = serde_json::from_str(
            r#"{"kind": "brute_force", "max_candidates": 10}"#,
        )
        .unwrap();
        assert_eq!(
            cfg,
            StrategyConfig::BruteForce(BruteForceConfig::default().with_max_candidates(10))
        );
    }

    #[test]
    fn test_unknown_kind_or_field_is_rejected() {
        assert!(serde_json::from_str::<StrategyConfig>(r#"{"kind": "greedy"}"#).is_err());
        assert!(
            serde_json::from_str::<StrategyConfig>(r#"{"kind": "monte_carlo", "iters": 3}"#)
                .is_err()
        );
    }

    #[test]
    fn test_build_validates_first() {
        let bad = StrategyConfig::MonteCarlo(MonteCarloConfig::default().with_max_iterations(0));
        let err = bad.build::<ChaCha8Rng>().unwrap_err();
        assert_eq!(err.field(), "max_iterations");

        let ok = StrategyConfig::default().build::<ChaCha8Rng>().unwrap();
        assert_eq!(ok.name(), "Evolution");
        assert_eq!(StrategyConfig::default().to_string(), "Evolution");
    }
}
