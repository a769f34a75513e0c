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

use crate::eval::gain::{GainTable, cmp_density};
use cache_alloc_model::prelude::{CacheIdentifier, Caching, Network, Size, VideoIdentifier};
use serde::{Deserialize, Serialize};

/// Order in which videos leave an overfull cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairOrder {
    /// Lowest `gain / size` first.
    #[default]
    ValueDensity,
    /// Largest video first.
    LargestFirst,
}

impl std::fmt::Display for RepairOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepairOrder::ValueDensity => write!(f, "value_density"),
            RepairOrder::LargestFirst => write!(f, "largest_first"),
        }
    }
}

/// Removes videos from every cache over capacity until it fits again.
///
/// Videos outside the catalogue go first. Zero-sized videos are never removed.
/// Ties drop the lower video id first. Returns the number of removed
/// placements.
pub fn repair(
    caching: &mut Caching,
    network: &Network,
    gains: &GainTable,
    order: RepairOrder,
) -> usize {
    let sizes = network.video_sizes();
    let capacity = network.cache_capacity();
    let mut removed = 0;

    for c in 0..caching.cache_count() {
        let cache = CacheIdentifier::new(c);
        let Some(videos) = caching.cache(cache) else {
            continue;
        };

        let unknown: Vec<VideoIdentifier> = videos
            .iter()
            .copied()
            .filter(|v| v.get() >= sizes.len())
            .collect();
        for v in unknown {
            caching.remove(cache, v);
            removed += 1;
        }

        let capacity = u128::from(capacity);
        let mut used: u128 = caching
            .cache(cache)
            .into_iter()
            .flatten()
            .map(|v| u128::from(sizes[v.get()]))
            .sum();
        if used <= capacity {
            continue;
        }

        let mut victims: Vec<(VideoIdentifier, Size)> = caching
            .cache(cache)
            .into_iter()
            .flatten()
            .map(|&v| (v, sizes[v.get()]))
            .filter(|&(_, size)| size > 0)
            .collect();
        victims.sort_by(|&(va, sa), &(vb, sb)| {
            let primary = match order {
                RepairOrder::ValueDensity => {
                    cmp_density(gains.gain(cache, va), sa, gains.gain(cache, vb), sb)
                }
                RepairOrder::LargestFirst => sb.cmp(&sa),
            };
            primary.then_with(|| va.cmp(&vb))
        });

        for (v, size) in victims {
            if used <= capacity {
                break;
            }
            caching.remove(cache, v);
            used -= u128::from(size);
            removed += 1;
        }
    }

    removed
}
