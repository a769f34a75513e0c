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
    eval::score::score,
    strategy::{
        FillStrategy, Incumbent, SearchContext,
        err::{ConfigurationError, StrategyError, check_probability},
    },
};
use cache_alloc_model::prelude::{CacheIdentifier, Caching, Network, Size, VideoIdentifier};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RandomConfig {
    /// Number of (video, cache) picks. Defaults to `videos * caches`.
    pub attempts: Option<u64>,
}

impl RandomConfig {
    #[inline]
    pub fn with_attempts(mut self, attempts: u64) -> Self {
        self.attempts = Some(attempts);
        self
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        Ok(())
    }

    #[inline]
    pub fn attempts_for(&self, network: &Network) -> u64 {
        self.attempts.unwrap_or_else(|| full_sweep(network))
    }
}

/// One attempt per (video, cache) pair.
#[inline]
pub fn full_sweep(network: &Network) -> u64 {
    (network.video_count() as u64).saturating_mul(network.cache_count() as u64)
}

/// Per-cache used capacity, ignoring videos outside the catalogue. Sums past
/// `Size::MAX` saturate.
pub(crate) fn used_capacities(caching: &Caching, sizes: &[Size]) -> Vec<Size> {
    caching
        .caches()
        .iter()
        .map(|set| {
            set.iter()
                .filter_map(|v| sizes.get(v.get()))
                .fold(0 as Size, |acc, &size| acc.saturating_add(size))
        })
        .collect()
}

/// Tries `attempts` uniformly random placements on top of `caching` and keeps
/// those that fit. Returns the number of placements added.
pub fn random_fill_into<R: Rng>(
    network: &Network,
    caching: &mut Caching,
    attempts: u64,
    rng: &mut R,
) -> usize {
    let videos = network.video_count();
    let caches = network.cache_count().min(caching.cache_count());
    if videos == 0 || caches == 0 {
        return 0;
    }

    let sizes = network.video_sizes();
    let capacity = network.cache_capacity();
    let mut used = used_capacities(caching, sizes);
    let mut added = 0;

    for _ in 0..attempts {
        let v = rng.random_range(0..videos);
        let c = rng.random_range(0..caches);
        let (video, cache) = (VideoIdentifier::new(v), CacheIdentifier::new(c));
        if caching.contains(cache, video) {
            continue;
        }
        let Some(after) = used[c].checked_add(sizes[v]).filter(|&a| a <= capacity) else {
            continue;
        };
        caching.insert(cache, video);
        used[c] = after;
        added += 1;
    }
    added
}

pub fn random_fill<R: Rng>(network: &Network, attempts: u64, rng: &mut R) -> Caching {
    let mut caching = Caching::for_network(network);
    random_fill_into(network, &mut caching, attempts, rng);
    caching
}

/// Drops each placement of `base` with probability `fraction`, then refills
/// with `ceil(fraction * videos * caches)` random attempts.
pub fn perturb<R: Rng>(network: &Network, base: &Caching, fraction: f64, rng: &mut R) -> Caching {
    debug_assert!(check_probability("fraction", fraction).is_ok());
    let kept: Vec<BTreeSet<VideoIdentifier>> = base
        .caches()
        .iter()
        .map(|set| {
            set.iter()
                .copied()
                .filter(|_| !rng.random_bool(fraction))
                .collect()
        })
        .collect();

    let mut caching = Caching::from_sets(kept);
    let attempts = ((fraction * full_sweep(network) as f64).ceil() as u64).max(1);
    random_fill_into(network, &mut caching, attempts, rng);
    caching
}

/// Uniform random placement: a single pass of random picks.
#[derive(Debug, Clone, Default)]
pub struct RandomFill {
    config: RandomConfig,
}

impl RandomFill {
    #[inline]
    pub fn new(config: RandomConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &RandomConfig {
        &self.config
    }
}

impl<R: Rng> FillStrategy<R> for RandomFill {
    fn name(&self) -> &str {
        "Random"
    }

    #[tracing::instrument(level = "debug", name = "Random Fill", skip(self, ctx))]
    fn fill(&mut self, ctx: &mut SearchContext<'_, '_, R>) -> Result<Caching, StrategyError> {
        self.config.validate()?;
        let (network, rng, observer) = ctx.parts();
        observer.on_search_start("Random");

        let attempts = self.config.attempts_for(network);
        let caching = random_fill(network, attempts, rng);
        let value = score(&caching, network)?;

        let mut incumbent = Incumbent::new();
        incumbent.offer(caching, value, 0, observer);
        observer.on_search_end(incumbent.score());
        Ok(incumbent.into_caching(network))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        eval::score::ScoreError,
        monitor::{observer::BestTrace, stop::StopToken},
    };
    use cache_alloc_model::prelude::NetworkBuilder;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[inline]
    fn vid(n: usize) -> VideoIdentifier {
        VideoIdentifier::new(n)
    }

    fn network(sizes: &[Size], caches: usize, capacity: Size) -> Network {
        let mut b = NetworkBuilder::new(caches, capacity).with_videos(sizes.iter().copied());
        let e = b.add_endpoint(1000);
        for c in 0..caches {
            b.add_cache_latency(e, CacheIdentifier::new(c), 100 + c as u64);
        }
        for v in 0..sizes.len() {
            b.add_request(vid(v), e, 1 + v as u64);
        }
        b.build().unwrap()
    }

    #[test]
    fn test_random_fill_respects_capacity() {
        let net = network(&[30, 50, 70, 20, 90, 10], 3, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let c = random_fill(&net, 100, &mut rng);
            assert!(c.validate(net.video_sizes(), net.cache_capacity()));
            assert!(c.check(&net).is_ok());
        }
    }

    #[test]
    fn test_zero_attempts_yield_empty_caching() {
        let net = network(&[10], 2, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(random_fill(&net, 0, &mut rng).is_empty());
    }

    #[test]
    fn test_oversized_video_is_never_placed() {
        let net = network(&[101, 5], 2, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let c = random_fill(&net, 1000, &mut rng);
        assert!(c.caches().iter().all(|s| !s.contains(&vid(0))));
        assert_eq!(c.total_placements(), 2);
    }

    #[test]
    fn test_sizes_that_only_overflow_together_are_kept_apart() {
        let net = network(&[Size::MAX - 1, 5], 1, Size::MAX);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..20 {
            let c = random_fill(&net, 50, &mut rng);
            assert_eq!(c.total_placements(), 1);
            assert!(c.validate(net.video_sizes(), net.cache_capacity()));
        }
        let mut both = Caching::for_network(&net);
        both.insert(CacheIdentifier::new(0), vid(0));
        both.insert(CacheIdentifier::new(0), vid(1));
        assert_eq!(used_capacities(&both, net.video_sizes()), vec![Size::MAX]);
    }

    #[test]
    fn test_perturb_keeps_validity_and_full_fraction_rebuilds() {
        let net = network(&[30, 50, 70, 20, 90, 10], 3, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let base = random_fill(&net, 100, &mut rng);

        let same = perturb(&net, &base, 0.0, &mut rng);
        assert!(same.validate(net.video_sizes(), net.cache_capacity()));
        for (cache, set) in base.iter() {
            assert!(set.is_subset(same.cache(cache).unwrap()));
        }

        for _ in 0..20 {
            let p = perturb(&net, &base, 0.5, &mut rng);
            assert!(p.validate(net.video_sizes(), net.cache_capacity()));
        }
    }

    #[test]
    fn test_strategy_reports_single_improvement() {
        let net = network(&[30, 50, 70], 2, 100);
        let mut trace = BestTrace::new();
        let mut ctx = SearchContext::new(
            &net,
            ChaCha8Rng::seed_from_u64(5),
            StopToken::new(),
            &mut trace,
        );
        let c = RandomFill::default().fill(&mut ctx).unwrap();
        assert!(c.validate(net.video_sizes(), 100));
        drop(ctx);
        assert_eq!(trace.improvements().len(), 1);
        assert_eq!(trace.last(), Some(score(&c, &net).unwrap()));
    }

    #[test]
    fn test_strategy_propagates_empty_workload() {
        let mut b = NetworkBuilder::new(1, 10);
        b.add_video(1);
        let net = b.build().unwrap();
        let mut obs = BestTrace::new();
        let mut ctx = SearchContext::new(
            &net,
            ChaCha8Rng::seed_from_u64(0),
            StopToken::new(),
            &mut obs,
        );
        assert_eq!(
            RandomFill::default().fill(&mut ctx).unwrap_err(),
            StrategyError::Score(ScoreError::EmptyWorkload)
        );
    }
}
