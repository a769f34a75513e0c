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
    eval::{
        gain::GainTable,
        score::{MAX_SCORE, Score, ScoreError, score},
    },
    strategy::{
        FillStrategy, Incumbent, SearchContext,
        err::{ConfigurationError, StrategyError, check_positive, check_probability},
        random::{full_sweep, random_fill},
        repair::{RepairOrder, repair},
    },
};
use cache_alloc_model::prelude::{CacheIdentifier, Caching, Network, VideoIdentifier};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvolutionConfig {
    pub pool_size: usize,
    /// Share of the ranked population allowed to breed.
    pub selection: f64,
    /// Chance that a child is a crossover of two parents rather than a copy.
    pub crossover: f64,
    /// Chance that a child is mutated.
    pub mutation_rate: f64,
    /// Strength of a mutation, as a share of placements.
    pub mutation: f64,
    /// Share of the ranked population copied unchanged into the next generation.
    pub elitism: f64,
    pub max_generations: u64,
    /// Stop after this many generations without a strictly better best.
    pub stagnation_limit: Option<u64>,
    pub target_score: Option<Score>,
    pub repair: RepairOrder,
    /// Attempts per random fill of the initial population.
    pub attempts: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            pool_size: 200,
            selection: 0.5,
            crossover: 0.6,
            mutation_rate: 0.05,
            mutation: 0.1,
            elitism: 0.005,
            max_generations: 100,
            stagnation_limit: Some(25),
            target_score: None,
            repair: RepairOrder::default(),
            attempts: None,
        }
    }
}

impl EvolutionConfig {
    #[inline]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    #[inline]
    pub fn with_selection(mut self, selection: f64) -> Self {
        self.selection = selection;
        self
    }

    #[inline]
    pub fn with_crossover(mut self, crossover: f64) -> Self {
        self.crossover = crossover;
        self
    }

    #[inline]
    pub fn with_mutation_rate(mut self, mutation_rate: f64) -> Self {
        self.mutation_rate = mutation_rate;
        self
    }

    #[inline]
    pub fn with_mutation(mut self, mutation: f64) -> Self {
        self.mutation = mutation;
        self
    }

    #[inline]
    pub fn with_elitism(mut self, elitism: f64) -> Self {
        self.elitism = elitism;
        self
    }

    #[inline]
    pub fn with_max_generations(mut self, max_generations: u64) -> Self {
        self.max_generations = max_generations;
        self
    }

    #[inline]
    pub fn with_stagnation_limit(mut self, limit: Option<u64>) -> Self {
        self.stagnation_limit = limit;
        self
    }

    #[inline]
    pub fn with_target_score(mut self, target: Score) -> Self {
        self.target_score = Some(target);
        self
    }

    #[inline]
    pub fn with_repair(mut self, order: RepairOrder) -> Self {
        self.repair = order;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_positive("pool_size", self.pool_size as u64)?;
        check_positive("max_generations", self.max_generations)?;
        check_probability("selection", self.selection)?;
        check_probability("crossover", self.crossover)?;
        check_probability("mutation_rate", self.mutation_rate)?;
        check_probability("mutation", self.mutation)?;
        check_probability("elitism", self.elitism)?;
        if let Some(limit) = self.stagnation_limit {
            check_positive("stagnation_limit", limit)?;
        }
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

    /// Number of top-ranked individuals that may become parents (at least one).
    #[inline]
    pub fn parent_count(&self) -> usize {
        share(self.selection, self.pool_size).max(1)
    }

    #[inline]
    pub fn elite_count(&self) -> usize {
        share(self.elitism, self.pool_size)
    }
}

#[inline]
fn share(fraction: f64, of: usize) -> usize {
    ((fraction * of as f64).ceil() as usize).min(of)
}

/// Child of two parents, cache by cache. A video both parents hold is kept,
/// a video only one parent holds is kept with probability one half.
pub fn crossover<R: Rng>(a: &Caching, b: &Caching, rng: &mut R) -> Caching {
    let caches = a
        .caches()
        .iter()
        .zip(b.caches())
        .map(|(sa, sb)| {
            sa.union(sb)
                .copied()
                .filter(|v| (sa.contains(v) && sb.contains(v)) || rng.random_bool(0.5))
                .collect::<BTreeSet<VideoIdentifier>>()
        })
        .collect();
    Caching::from_sets(caches)
}

/// Drops each placement with probability `strength`, then makes
/// `ceil(strength * videos * caches)` random placements without checking
/// capacity. The result usually needs [`repair`].
pub fn mutate<R: Rng>(caching: &mut Caching, network: &Network, strength: f64, rng: &mut R) {
    for c in 0..caching.cache_count() {
        let cache = CacheIdentifier::new(c);
        let Some(set) = caching.cache(cache) else {
            continue;
        };
        let kept: BTreeSet<VideoIdentifier> = set
            .iter()
            .copied()
            .filter(|_| !rng.random_bool(strength))
            .collect();
        caching.set_cache(cache, kept);
    }

    let videos = network.video_count();
    let caches = network.cache_count().min(caching.cache_count());
    if videos == 0 || caches == 0 {
        return;
    }
    let inserts = (strength * full_sweep(network) as f64).ceil() as u64;
    for _ in 0..inserts {
        let v = rng.random_range(0..videos);
        let c = rng.random_range(0..caches);
        caching.insert(CacheIdentifier::new(c), VideoIdentifier::new(v));
    }
}

fn rank(
    population: Vec<Caching>,
    network: &Network,
) -> Result<Vec<(Caching, Score)>, ScoreError> {
    let mut scored = population
        .into_par_iter()
        .map(|c| score(&c, network).map(|s| (c, s)))
        .collect::<Result<Vec<_>, _>>()?;
    // Stable: equal scores keep their population order.
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(scored)
}

/// Genetic search over a population of cachings.
///
/// Each generation is scored in parallel and ranked. The elite share survives
/// unchanged; the rest of the next generation is bred from the top `selection`
/// share by crossover and mutation, with overfull caches repaired
/// deterministically.
#[derive(Debug, Clone, Default)]
pub struct Evolution {
    config: EvolutionConfig,
}

impl Evolution {
    #[inline]
    pub fn new(config: EvolutionConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    fn breed<R: Rng>(
        &self,
        ranked: &[(Caching, Score)],
        network: &Network,
        gains: &GainTable,
        rng: &mut R,
    ) -> Vec<Caching> {
        let cfg = &self.config;
        let pool = cfg.pool_size;
        let parents = cfg.parent_count().min(ranked.len());

        let mut next: Vec<Caching> = ranked
            .iter()
            .take(cfg.elite_count())
            .map(|(c, _)| c.clone())
            .collect();

        while next.len() < pool {
            let a = &ranked[rng.random_range(0..parents)].0;
            let mut child = if rng.random_bool(cfg.crossover) {
                let b = &ranked[rng.random_range(0..parents)].0;
                crossover(a, b, rng)
            } else {
                a.clone()
            };
            if rng.random_bool(cfg.mutation_rate) {
                mutate(&mut child, network, cfg.mutation, rng);
            }
            repair(&mut child, network, gains, cfg.repair);
            next.push(child);
        }
        next
    }
}

impl<R: Rng> FillStrategy<R> for Evolution {
    fn name(&self) -> &str {
        "Evolution"
    }

    #[tracing::instrument(level = "debug", name = "Evolution", skip(self, ctx))]
    fn fill(&mut self, ctx: &mut SearchContext<'_, '_, R>) -> Result<Caching, StrategyError> {
        self.config.validate()?;
        let network = ctx.network();
        let gains = GainTable::new(network);
        let attempts = self.config.attempts.unwrap_or_else(|| full_sweep(network));
        let target = self.config.target_score.unwrap_or(MAX_SCORE);
        ctx.observer_mut().on_search_start("Evolution");

        let mut population: Vec<Caching> = (0..self.config.pool_size)
            .map(|_| random_fill(network, attempts, ctx.rng()))
            .collect();
        let mut incumbent = Incumbent::new();
        let mut stagnant = 0_u64;

        for generation in 0..self.config.max_generations {
            let ranked = rank(population, network)?;
            let (leader, leader_score) = &ranked[0];
            if incumbent.improves(*leader_score) {
                incumbent.offer(leader.clone(), *leader_score, generation, ctx.observer_mut());
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            tracing::debug!(
                generation,
                leader = *leader_score,
                worst = ranked[ranked.len() - 1].1,
                stagnant,
                "generation ranked"
            );

            let stagnated = self
                .config
                .stagnation_limit
                .is_some_and(|limit| stagnant >= limit);
            if *leader_score >= target || stagnated || ctx.should_stop() {
                break;
            }
            population = self.breed(&ranked, network, &gains, ctx.rng());
        }

        ctx.observer_mut().on_search_end(incumbent.score());
        Ok(incumbent.into_caching(network))
    }
}
