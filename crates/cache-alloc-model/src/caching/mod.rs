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

pub mod err;
pub mod io;

use crate::{
    caching::err::{CachingValidationError, CapacityViolationError, UnknownVideoError},
    common::{CacheIdentifier, Size, VideoIdentifier},
    network::net::Network,
};
use std::collections::BTreeSet;

/// Placement of videos into caches: one duplicate-free set per cache.
///
/// A `Caching` only knows how many caches it has. Capacity is a property of the
/// [`Network`] and is checked explicitly through [`Caching::validate`] or
/// [`Caching::check`]; mutating methods never clamp.
///
/// # Panics
///
/// Methods taking a [`CacheIdentifier`] panic when the cache is out of range,
/// except for the `Option` returning lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Caching {
    caches: Vec<BTreeSet<VideoIdentifier>>,
}

impl Caching {
    #[inline]
    pub fn new(cache_count: usize) -> Self {
        Self {
            caches: vec![BTreeSet::new(); cache_count],
        }
    }

    #[inline]
    pub fn for_network(network: &Network) -> Self {
        Self::new(network.cache_count())
    }

    #[inline]
    pub fn from_sets(caches: Vec<BTreeSet<VideoIdentifier>>) -> Self {
        Self { caches }
    }

    #[inline]
    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }

    #[inline]
    pub fn caches(&self) -> &[BTreeSet<VideoIdentifier>] {
        &self.caches
    }

    #[inline]
    pub fn cache(&self, cache: CacheIdentifier) -> Option<&BTreeSet<VideoIdentifier>> {
        self.caches.get(cache.get())
    }

    #[inline]
    pub fn contains(&self, cache: CacheIdentifier, video: VideoIdentifier) -> bool {
        self.cache(cache).is_some_and(|s| s.contains(&video))
    }

    /// Returns `false` if the video was already in the cache.
    #[inline]
    pub fn insert(&mut self, cache: CacheIdentifier, video: VideoIdentifier) -> bool {
        self.caches[cache.get()].insert(video)
    }

    #[inline]
    pub fn remove(&mut self, cache: CacheIdentifier, video: VideoIdentifier) -> bool {
        self.caches[cache.get()].remove(&video)
    }

    #[inline]
    pub fn clear_cache(&mut self, cache: CacheIdentifier) {
        self.caches[cache.get()].clear();
    }

    #[inline]
    pub fn set_cache(&mut self, cache: CacheIdentifier, videos: BTreeSet<VideoIdentifier>) {
        self.caches[cache.get()] = videos;
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (CacheIdentifier, &BTreeSet<VideoIdentifier>)> {
        self.caches
            .iter()
            .enumerate()
            .map(|(i, s)| (CacheIdentifier::new(i), s))
    }

    #[inline]
    pub fn nonempty_count(&self) -> usize {
        self.caches.iter().filter(|s| !s.is_empty()).count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.caches.iter().all(BTreeSet::is_empty)
    }

    /// Number of (cache, video) pairs.
    #[inline]
    pub fn total_placements(&self) -> usize {
        self.caches.iter().map(BTreeSet::len).sum()
    }

    /// Sum of the sizes of the videos held by `cache`.
    ///
    /// `None` if the cache does not exist, holds a video outside `sizes` or
    /// the sum does not fit a [`Size`].
    pub fn used_capacity(&self, cache: CacheIdentifier, sizes: &[Size]) -> Option<Size> {
        self.cache(cache)?
            .iter()
            .try_fold(0 as Size, |acc, v| acc.checked_add(*sizes.get(v.get())?))
    }

    pub fn used_capacities(&self, sizes: &[Size]) -> Option<Vec<Size>> {
        (0..self.caches.len())
            .map(|c| self.used_capacity(CacheIdentifier::new(c), sizes))
            .collect()
    }

    /// Whether adding `video` to `cache` keeps that cache within `capacity`.
    pub fn fits(
        &self,
        cache: CacheIdentifier,
        video: VideoIdentifier,
        sizes: &[Size],
        capacity: Size,
    ) -> bool {
        let Some(size) = sizes.get(video.get()).copied() else {
            return false;
        };
        let Some(used) = self.used_capacity(cache, sizes) else {
            return false;
        };
        if self.contains(cache, video) {
            return used <= capacity;
        }
        used.checked_add(size).is_some_and(|total| total <= capacity)
    }

    /// `true` iff every cache holds only known videos and stays within `capacity`.
    pub fn validate(&self, sizes: &[Size], capacity: Size) -> bool {
        (0..self.caches.len()).all(|c| {
            self.used_capacity(CacheIdentifier::new(c), sizes)
                .is_some_and(|used| used <= capacity)
        })
    }

    /// Like [`Caching::validate`] but against a network and with the first
    /// offending cache reported.
    pub fn check(&self, network: &Network) -> Result<(), CachingValidationError> {
        if self.caches.len() != network.cache_count() {
            return Err(CachingValidationError::CacheCountMismatch {
                expected: network.cache_count(),
                found: self.caches.len(),
            });
        }

        let sizes = network.video_sizes();
        for (cache, videos) in self.iter() {
            let mut used: Size = 0;
            for &v in videos {
                let size = sizes
                    .get(v.get())
                    .ok_or(UnknownVideoError::new(cache, v))?;
                used = used.checked_add(*size).ok_or(CapacityViolationError::new(
                    cache,
                    Size::MAX,
                    network.cache_capacity(),
                ))?;
            }
            if used > network.cache_capacity() {
                return Err(
                    CapacityViolationError::new(cache, used, network.cache_capacity()).into(),
                );
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Caching {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Caching: caches={} nonempty={} placements={}",
            self.cache_count(),
            self.nonempty_count(),
            self.total_placements()
        )
    }
}
