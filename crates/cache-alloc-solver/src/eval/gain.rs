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

use cache_alloc_model::prelude::{CacheIdentifier, Network, Size, VideoIdentifier};

/// Upper bound on the weighted latency a single placement can save.
///
/// `gain(cache, video)` sums `count * (origin - latency)` over every request
/// for `video` whose endpoint reaches `cache` faster than the origin. The bound
/// ignores other caches that may already serve the request, which makes it
/// cheap to keep and good enough to rank placements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GainTable {
    video_count: usize,
    gains: Vec<u64>,
}

impl GainTable {
    pub fn new(network: &Network) -> Self {
        let video_count = network.video_count();
        let mut gains = vec![0_u64; video_count * network.cache_count()];

        for r in network.requests() {
            let Some(endpoint) = network.endpoint(r.endpoint()) else {
                continue;
            };
            let origin = endpoint.origin_latency();
            for (cache, latency) in endpoint.reachable_caches() {
                if latency >= origin {
                    continue;
                }
                let slot = &mut gains[cache.get() * video_count + r.video().get()];
                *slot = slot.saturating_add(r.count().saturating_mul(origin - latency));
            }
        }

        Self { video_count, gains }
    }

    #[inline]
    pub fn gain(&self, cache: CacheIdentifier, video: VideoIdentifier) -> u64 {
        self.gains
            .get(cache.get() * self.video_count + video.get())
            .copied()
            .unwrap_or(0)
    }

    #[inline]
    pub fn cache_gains(&self, cache: CacheIdentifier) -> &[u64] {
        let start = cache.get() * self.video_count;
        self.gains
            .get(start..start + self.video_count)
            .unwrap_or(&[])
    }
}

/// Compares `gain_a / size_a` with `gain_b / size_b` without dividing.
///
/// A zero-sized video has infinite density unless its gain is zero too.
#[inline]
pub fn cmp_density(gain_a: u64, size_a: Size, gain_b: u64, size_b: Size) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (size_a, size_b) {
        (0, 0) => gain_a.cmp(&gain_b),
        (0, _) if gain_a > 0 => Ordering::Greater,
        (0, _) => 0_u64.cmp(&gain_b),
        (_, 0) if gain_b > 0 => Ordering::Less,
        (_, 0) => gain_a.cmp(&0),
        _ => (gain_a as u128 * size_b as u128).cmp(&(gain_b as u128 * size_a as u128)),
    }
}
