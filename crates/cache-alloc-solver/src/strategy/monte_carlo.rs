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

use crate::{
    eval::score::{MAX_SCORE, Score, score},
    strategy::{
        FillStrategy, Incumbent, SearchContext,
        err::{ConfigurationError, StrategyError, check_positive, check_probability},
        random::{perturb, random_fill, full_sweep},
    },
};
use cache_alloc_model::prelude::Caching;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonteCarloConfig {
    pub max_iterations: u64,
    /// Stop as soon as the best score reaches this value.
    pub target_score: Option<Score>,
    /// Chance that a trial perturbs the incumbent instead of starting fresh.
    pub perturb_probability: f64,
    /// Share of the incumbent's placements a perturbation drops.
    pub perturb_fraction: f64,
    /// Attempts per fresh random fill. Defaults to `videos * caches`.
    pub attempts: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            target_score: None,
            perturb_probability: 0.5,
            perturb_fraction: 0.1,
            attempts: None,
        }
    }
}

impl MonteCarloConfig {
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[inline]
    pub fn with_target_score(mut self, target: Score) -> Self {
        self.target_score = Some(target);
        self
    }

    #[inline]
    pub fn with_perturb_probability(mut self, p: f64) -> Self {
        self.perturb_probability = p;
        self
    }

    #[inline]
    pub fn with_perturb_fraction(mut self, fraction: f64) -> Self {
        self.perturb_fraction = fraction;
        self
    }

    #[inline]
    pub fn with_attempts(mut self, attempts: u64) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_positive("max_iterations", self.max_iterations)?;
        check_probability("perturb_probability", self.perturb_probability)?;
        check_probability("perturb_fraction", self.perturb_fraction)?;
        if let Some(t) = self.target_score
            && t > MAX_SCORE
        {
            return Err(ConfigurationError::new(
                "target_score",
                format!("{} is above the maximum score {}", t, MAX_SCORE),
            ));
        }
        Ok(())
    }
}

/// Random restarts around the best caching found so far.
///
/// Every trial is either a fresh random fill or, with `perturb_probability`, a
/// perturbation of the incumbent. The incumbent only changes on a strictly
/// higher score, and the stop token is honoured after every trial.
#[derive(Debug, Clone, Default)]
pub struct MonteCarlo {
    config: MonteCarloConfig,
}

impl MonteCarlo {
    #[inline]
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    #[inline]
    fn reached_target(&self, best: Option<Score>) -> bool {
        let target = self.config.target_score.unwrap_or(MAX_SCORE);
        best.is_some_and(|b| b >= target)
    }
}

impl<R: Rng> FillStrategy<R> for MonteCarlo {
    fn name(&self) -> &str {
        "MonteCarlo"
    }

    #[tracing::instrument(level = "debug", name = "Monte Carlo", skip(self, ctx))]
    fn fill(&mut self, ctx: &mut SearchContext<'_, '_, R>) -> Result<Caching, StrategyError> {
        self.config.validate()?;
        let network = ctx.network();
        let attempts = self.config.attempts.unwrap_or_else(|| full_sweep(network));
        ctx.observer_mut().on_search_start("MonteCarlo");

        let mut incumbent = Incumbent::new();
        let mut perturbed = 0_u64;
        let mut iteration = 0_u64;

        while iteration < self.config.max_iterations {
            let (_, rng, observer) = ctx.parts();
            let candidate = match incumbent.caching() {
                Some(best) if rng.random_bool(self.config.perturb_probability) => {
                    perturbed += 1;
                    perturb(network, best, self.config.perturb_fraction, rng)
                }
                _ => random_fill(network, attempts, rng),
            };
            let value = score(&candidate, network)?;
            if incumbent.offer(candidate, value, iteration, observer) {
                tracing::debug!(iteration, score = value, "monte carlo improvement");
            }
            iteration += 1;

            if self.reached_target(incumbent.score()) || ctx.should_stop() {
                break;
            }
        }

        tracing::debug!(
            trials = iteration,
            perturbed,
            best = ?incumbent.score(),
            "monte carlo done"
        );
        ctx.observer_mut().on_search_end(incumbent.score());
        Ok(incumbent.into_caching(network))
    }
}
