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

pub mod brute_force;
pub mod config;
pub mod err;
pub mod evolution;
pub mod monte_carlo;
pub mod random;
pub mod repair;

use crate::{
    eval::score::Score,
    monitor::{observer::SearchObserver, stop::StopToken},
    strategy::err::StrategyError,
};
use cache_alloc_model::prelude::{Caching, Network};

/// Everything a strategy needs for one run on one network.
pub struct SearchContext<'n, 'o, R> {
    network: &'n Network,
    rng: R,
    stop: StopToken,
    observer: &'o mut dyn SearchObserver,
}

impl<'n, 'o, R: rand::Rng> SearchContext<'n, 'o, R> {
    #[inline]
    pub fn new(
        network: &'n Network,
        rng: R,
        stop: StopToken,
        observer: &'o mut dyn SearchObserver,
    ) -> Self {
        Self {
            network,
            rng,
            stop,
            observer,
        }
    }

    #[inline]
    pub fn network(&self) -> &'n Network {
        self.network
    }

    #[inline]
    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    #[inline]
    pub fn stop_token(&self) -> &StopToken {
        &self.stop
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.is_set()
    }

    #[inline]
    pub fn observer_mut(&mut self) -> &mut dyn SearchObserver {
        self.observer
    }

    /// Splits the context so the rng and the observer can be borrowed together.
    #[inline]
    pub(crate) fn parts(&mut self) -> (&'n Network, &mut R, &mut dyn SearchObserver) {
        (self.network, &mut self.rng, &mut *self.observer)
    }
}

impl<'n, 'o, R> std::fmt::Debug for SearchContext<'n, 'o, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("network", &self.network.to_string())
            .field("stop", &self.stop)
            .field("observer", &self.observer)
            .finish()
    }
}

/// A placement strategy.
///
/// `fill` always returns a capacity-valid caching for `ctx.network()`. When the
/// stop token is raised the best caching seen so far is returned; an empty
/// caching is a legitimate result.
pub trait FillStrategy<R: rand::Rng>: Send {
    fn name(&self) -> &str;

    fn fill(&mut self, ctx: &mut SearchContext<'_, '_, R>) -> Result<Caching, StrategyError>;
}

impl<'a, R: rand::Rng> std::fmt::Debug for dyn FillStrategy<R> + 'a {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FillStrategy {{ name: {} }}", self.name())
    }
}

impl<'a, R: rand::Rng> std::fmt::Display for dyn FillStrategy<R> + 'a {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl<'a, R: rand::Rng> std::fmt::Debug for dyn FillStrategy<R> + Send + 'a {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FillStrategy {{ name: {} }}", self.name())
    }
}

/// Best caching of a run. Only a strictly higher score replaces it, so the
/// first of several equally good candidates is kept.
#[derive(Debug, Clone, Default)]
pub(crate) struct Incumbent {
    best: Option<(Caching, Score)>,
}

impl Incumbent {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn score(&self) -> Option<Score> {
        self.best.as_ref().map(|(_, s)| *s)
    }

    #[inline]
    pub(crate) fn caching(&self) -> Option<&Caching> {
        self.best.as_ref().map(|(c, _)| c)
    }

    #[inline]
    pub(crate) fn improves(&self, score: Score) -> bool {
        self.score().is_none_or(|best| score > best)
    }

    /// Returns `true` if `candidate` became the new incumbent.
    pub(crate) fn offer(
        &mut self,
        candidate: Caching,
        score: Score,
        iteration: u64,
        observer: &mut dyn SearchObserver,
    ) -> bool {
        if !self.improves(score) {
            return false;
        }
        tracing::debug!(iteration, score, "new best");
        observer.on_new_best(iteration, score);
        self.best = Some((candidate, score));
        true
    }

    #[inline]
    pub(crate) fn into_caching(self, network: &Network) -> Caching {
        self.best
            .map(|(c, _)| c)
            .unwrap_or_else(|| Caching::for_network(network))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::observer::BestTrace;
    use cache_alloc_model::prelude::{CacheIdentifier, NetworkBuilder, VideoIdentifier};

    fn network() -> Network {
        let mut b = NetworkBuilder::new(2, 10).with_videos([1]);
        let e = b.add_endpoint(10);
        b.add_request(VideoIdentifier::new(0), e, 1);
        b.build().unwrap()
    }

    #[test]
    fn test_incumbent_keeps_first_of_equal_scores() {
        let net = network();
        let mut trace = BestTrace::new();
        let mut inc = Incumbent::new();

        let mut first = Caching::for_network(&net);
        first.insert(CacheIdentifier::new(0), VideoIdentifier::new(0));
        let mut second = Caching::for_network(&net);
        second.insert(CacheIdentifier::new(1), VideoIdentifier::new(0));

        assert!(inc.offer(first.clone(), 5, 0, &mut trace));
        assert!(!inc.offer(second.clone(), 5, 1, &mut trace));
        assert!(!inc.offer(second.clone(), 4, 2, &mut trace));
        assert_eq!(inc.caching(), Some(&first));
        assert!(inc.offer(second.clone(), 6, 3, &mut trace));
        assert_eq!(trace.improvements(), &[(0, 5), (3, 6)]);
        assert_eq!(inc.into_caching(&net), second);
    }

    #[test]
    fn test_empty_incumbent_yields_empty_caching() {
        let net = network();
        let c = Incumbent::new().into_caching(&net);
        assert!(c.is_empty());
        assert_eq!(c.cache_count(), 2);
    }
}
