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
    eval::score::{MAX_SCORE, score},
    strategy::{
        FillStrategy, Incumbent, SearchContext,
        err::{ConfigurationError, StrategyError, check_positive},
    },
};
use cache_alloc_model::prelude::{CacheIdentifier, Caching, Network, VideoIdentifier};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest catalogue for which per-cache subsets are listed at all.
pub const MAX_VIDEOS_LIMIT: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BruteForceConfig {
    pub max_videos: usize,
    pub max_candidates: u64,
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        Self {
            max_videos: 20,
            max_candidates: 1_000_000,
        }
    }
}

impl BruteForceConfig {
    #[inline]
    pub fn with_max_videos(mut self, max_videos: usize) -> Self {
        self.max_videos = max_videos;
        self
    }

    #[inline]
    pub fn with_max_candidates(mut self, max_candidates: u64) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_positive("max_candidates", self.max_candidates)?;
        if self.max_videos > MAX_VIDEOS_LIMIT {
            return Err(ConfigurationError::new(
                "max_videos",
                format!("{} exceeds the hard limit of {}", self.max_videos, MAX_VIDEOS_LIMIT),
            ));
        }
        Ok(())
    }
}

/// Every subset of the catalogue that fits in one cache, as bit masks in
/// increasing order. The empty subset always comes first.
pub fn feasible_subsets(network: &Network) -> Vec<u32> {
    let sizes = network.video_sizes();
    let capacity = network.cache_capacity();
    let n = sizes.len();
    (0..1_u32 << n)
        .filter(|&mask| {
            (0..n)
                .filter(|&v| mask & (1 << v) != 0)
                .try_fold(0_u64, |used, v| used.checked_add(sizes[v]))
                .is_some_and(|used| used <= capacity)
        })
        .collect()
}

/// Exhaustive enumeration of every valid caching.
///
/// Only usable on tiny instances: the number of candidates is
/// `feasible_subsets ^ caches`, which must stay within `max_candidates`.
#[derive(Debug, Clone, Default)]
pub struct BruteForce {
    config: BruteForceConfig,
}

impl BruteForce {
    #[inline]
    pub fn new(config: BruteForceConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &BruteForceConfig {
        &self.config
    }

    fn too_large(&self, network: &Network, candidates: Option<u64>) -> StrategyError {
        StrategyError::SearchSpaceTooLarge {
            videos: network.video_count(),
            caches: network.cache_count(),
            candidates,
            ceiling: self.config.max_candidates,
        }
    }

    /// Counts candidates, rejecting spaces above the ceiling.
    pub fn search_space(&self, network: &Network) -> Result<(Vec<u32>, u64), StrategyError> {
        if network.video_count() > self.config.max_videos {
            return Err(self.too_large(network, None));
        }
        let subsets = feasible_subsets(network);
        let caches = u32::try_from(network.cache_count()).ok();
        let candidates = caches.and_then(|k| (subsets.len() as u64).checked_pow(k));
        match candidates {
            Some(n) if n <= self.config.max_candidates => Ok((subsets, n)),
            other => Err(self.too_large(network, other)),
        }
    }
}

fn build(subsets: &[u32], digits: &[usize], cache_count: usize) -> Caching {
    let mut caching = Caching::new(cache_count);
    for (c, &d) in digits.iter().enumerate() {
        let mut mask = subsets[d];
        while mask != 0 {
            let v = mask.trailing_zeros() as usize;
            caching.insert(CacheIdentifier::new(c), VideoIdentifier::new(v));
            mask &= mask - 1;
        }
    }
    caching
}

/// Odometer increment over `digits` in base `base`. Returns `false` on wrap.
#[inline]
fn advance(digits: &mut [usize], base: usize) -> bool {
    for d in digits.iter_mut().rev() {
        *d += 1;
        if *d < base {
            return true;
        }
        *d = 0;
    }
    false
}

impl<R: Rng> FillStrategy<R> for BruteForce {
    fn name(&self) -> &str {
        "BruteForce"
    }

    #[tracing::instrument(level = "debug", name = "Brute Force", skip(self, ctx))]
    fn fill(&mut self, ctx: &mut SearchContext<'_, '_, R>) -> Result<Caching, StrategyError> {
        self.config.validate()?;
        let network = ctx.network();
        let (subsets, candidates) = self.search_space(network)?;
        tracing::debug!(
            subsets = subsets.len(),
            candidates,
            "enumerating brute force space"
        );

        ctx.observer_mut().on_search_start("BruteForce");
        let cache_count = network.cache_count();
        let mut digits = vec![0_usize; cache_count];
        let mut incumbent = Incumbent::new();
        let mut iteration = 0_u64;

        loop {
            let candidate = build(&subsets, &digits, cache_count);
            let value = score(&candidate, network)?;
            incumbent.offer(candidate, value, iteration, ctx.observer_mut());
            iteration += 1;

            if value >= MAX_SCORE || ctx.should_stop() || !advance(&mut digits, subsets.len()) {
                break;
            }
        }

        tracing::debug!(evaluated = iteration, best = ?incumbent.score(), "brute force done");
        ctx.observer_mut().on_search_end(incumbent.score());
        Ok(incumbent.into_caching(network))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{observer::BestTrace, stop::StopToken};
    use cache_alloc_model::prelude::{NetworkBuilder, NetworkLoader, Size};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const EXAMPLE: &str = "5 2 4 3 100\n50 50 80 30 110\n1000 3\n0 100\n2 200\n1 300\n500 0\n\
                           3 0 1500\n0 1 1000\n4 0 500\n1 0 1000\n";

    fn run(
        bf: &mut BruteForce,
        net: &Network,
        stop: StopToken,
    ) -> (Result<Caching, StrategyError>, BestTrace) {
        let mut trace = BestTrace::new();
        let res = {
            let mut ctx = SearchContext::new(net, ChaCha8Rng::seed_from_u64(0), stop, &mut trace);
            bf.fill(&mut ctx)
        };
        (res, trace)
    }

    fn tiny(sizes: &[Size], caches: usize) -> Network {
        let mut b = NetworkBuilder::new(caches, 100).with_videos(sizes.iter().copied());
        let e0 = b.add_endpoint(1000);
        let e1 = b.add_endpoint(800);
        for c in 0..caches {
            b.add_cache_latency(e0, CacheIdentifier::new(c), 100 * (c as u64 + 1));
            b.add_cache_latency(e1, CacheIdentifier::new(c), 700 - 100 * c as u64);
        }
        for v in 0..sizes.len() {
            b.add_request(VideoIdentifier::new(v), e0, 10 + v as u64);
            b.add_request(VideoIdentifier::new(v), e1, 40 + 5 * v as u64);
        }
        b.build().unwrap()
    }

    #[test]
    fn test_feasible_subsets_start_with_empty() {
        let net = tiny(&[60, 60, 30], 1);
        let s = feasible_subsets(&net);
        assert_eq!(s[0], 0);
        // {0,1} and {0,1,2} exceed 100.
        assert_eq!(s, vec![0b000, 0b001, 0b010, 0b100, 0b101, 0b110]);
    }

    #[test]
    fn test_odometer_visits_every_combination() {
        let mut d = vec![0, 0];
        let mut seen = 1;
        while advance(&mut d, 3) {
            seen += 1;
        }
        assert_eq!(seen, 9);
        assert_eq!(d, vec![0, 0]);
    }

    #[test]
    fn test_finds_optimum_of_example() {
        let net = NetworkLoader::new().from_str(EXAMPLE).unwrap();
        let (res, trace) = run(&mut BruteForce::default(), &net, StopToken::new());
        let best = res.unwrap();
        assert!(best.validate(net.video_sizes(), net.cache_capacity()));
        assert!(trace.is_strictly_increasing());

        let best_score = score(&best, &net).unwrap();
        assert_eq!(trace.last(), Some(best_score));
        // No random fill may beat the exhaustive optimum.
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..200 {
            let c = crate::strategy::random::random_fill(&net, 15, &mut rng);
            assert!(score(&c, &net).unwrap() <= best_score);
        }
    }

    #[test]
    fn test_matches_manual_optimum_on_one_cache() {
        // Only one of v0/v1 fits next to v2; v1 is requested far more.
        let mut b = NetworkBuilder::new(1, 100).with_videos([50, 50, 50]);
        let e = b.add_endpoint(1000);
        b.add_cache_latency(e, CacheIdentifier::new(0), 0);
        b.add_request(VideoIdentifier::new(0), e, 1)
            .add_request(VideoIdentifier::new(1), e, 5)
            .add_request(VideoIdentifier::new(2), e, 3);
        let net = b.build().unwrap();

        let (res, _) = run(&mut BruteForce::default(), &net, StopToken::new());
        let best = res.unwrap();
        let ids: Vec<usize> = best
            .cache(CacheIdentifier::new(0))
            .unwrap()
            .iter()
            .map(|v| v.get())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(score(&best, &net).unwrap(), 888);
    }

    #[test]
    fn test_rejects_space_above_ceiling() {
        let net = tiny(&[10, 10, 10, 10], 3);
        let mut bf = BruteForce::new(BruteForceConfig::default().with_max_candidates(100));
        let (res, trace) = run(&mut bf, &net, StopToken::new());
        assert_eq!(
            res.unwrap_err(),
            StrategyError::SearchSpaceTooLarge {
                videos: 4,
                caches: 3,
                candidates: Some(16 * 16 * 16),
                ceiling: 100
            }
        );
        assert!(trace.improvements().is_empty());

        let big = tiny(&[1; 21], 1);
        assert!(matches!(
            BruteForce::default().search_space(&big),
            Err(StrategyError::SearchSpaceTooLarge {
                candidates: None,
                ..
            })
        ));
    }

    #[test]
    fn test_stop_token_returns_first_candidate() {
        let net = tiny(&[10, 20, 30], 2);
        let stop = StopToken::new();
        stop.request_stop();
        let (res, trace) = run(&mut BruteForce::default(), &net, stop);
        assert!(res.unwrap().is_empty());
        assert_eq!(trace.improvements(), &[(0, 0)]);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let net = tiny(&[10], 1);
        let mut bf = BruteForce::new(BruteForceConfig::default().with_max_candidates(0));
        let (res, _) = run(&mut bf, &net, StopToken::new());
        assert!(matches!(res, Err(StrategyError::Configuration(_))));
    }
}
