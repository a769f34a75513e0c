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

use cache_alloc_model::prelude::{Caching, Endpoint, Latency, Network, VideoIdentifier};

/// Normalized objective value in `[0, MAX_SCORE]`. Higher is better.
pub type Score = u64;

pub const MAX_SCORE: Score = 1000;

const ROUNDING_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreError {
    EmptyWorkload,
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::EmptyWorkload => {
                write!(f, "Cannot score a network whose workload has no requests")
            }
        }
    }
}

impl std::error::Error for ScoreError {}

/// Score together with the raw quantities it is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScoreBreakdown {
    score: Score,
    latency_saved: u128,
    total_requests: u128,
}

impl ScoreBreakdown {
    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

    /// Sum over requests of `count * (origin - best)`, in request-milliseconds.
    #[inline]
    pub fn latency_saved(&self) -> u128 {
        self.latency_saved
    }

    #[inline]
    pub fn total_requests(&self) -> u128 {
        self.total_requests
    }

    /// Average saving per request in milliseconds.
    #[inline]
    pub fn mean_saving(&self) -> f64 {
        self.latency_saved as f64 / self.total_requests as f64
    }
}

impl std::fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "score={} saved={} requests={}",
            self.score, self.latency_saved, self.total_requests
        )
    }
}

/// Lowest latency at which `endpoint` can fetch `video` under `caching`.
///
/// Starts from the origin latency and only ever lowers it, so a video that no
/// reachable cache holds is served from the origin.
#[inline]
pub fn best_latency(caching: &Caching, endpoint: &Endpoint, video: VideoIdentifier) -> Latency {
    endpoint
        .reachable_caches()
        .filter(|&(cache, _)| caching.contains(cache, video))
        .fold(endpoint.origin_latency(), |best, (_, latency)| {
            best.min(latency)
        })
}

/// Scores `caching` against the workload of `network`.
///
/// Each request contributes the fraction of its origin latency that the best
/// reachable cache saves, weighted by its count. The weighted mean is scaled to
/// `[0, 1000]` and rounded down.
pub fn score(caching: &Caching, network: &Network) -> Result<Score, ScoreError> {
    score_breakdown(caching, network).map(|b| b.score())
}

pub fn score_breakdown(caching: &Caching, network: &Network) -> Result<ScoreBreakdown, ScoreError> {
    let mut total_requests: u128 = 0;
    let mut latency_saved: u128 = 0;
    let mut weighted_fraction = 0.0_f64;

    for r in network.requests() {
        let Some(endpoint) = network.endpoint(r.endpoint()) else {
            continue;
        };
        total_requests += u128::from(r.count());

        let base = endpoint.origin_latency();
        let best = best_latency(caching, endpoint, r.video());
        let saved = base - best;
        if saved == 0 {
            continue;
        }
        latency_saved += saved as u128 * r.count() as u128;
        weighted_fraction += r.count() as f64 * (saved as f64 / base as f64);
    }

    if total_requests == 0 {
        return Err(ScoreError::EmptyWorkload);
    }

    let scaled = weighted_fraction / total_requests as f64 * MAX_SCORE as f64;
    let score = ((scaled + ROUNDING_SLACK).floor() as Score).min(MAX_SCORE);

    Ok(ScoreBreakdown {
        score,
        latency_saved,
        total_requests,
    })
}
