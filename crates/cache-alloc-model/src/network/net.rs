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
    common::{CacheIdentifier, EndpointIdentifier, Latency, Size, VideoIdentifier},
    network::req::Request,
};
use fxhash::FxHashMap;

/// A client location: its latency to the origin and to each cache it can reach.
///
/// A cache without an entry is unreachable from this endpoint. A latency of
/// zero is a regular, reachable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    origin_latency: Latency,
    cache_latencies: FxHashMap<CacheIdentifier, Latency>,
}

impl Endpoint {
    #[inline]
    pub fn new(origin_latency: Latency) -> Self {
        Self {
            origin_latency,
            cache_latencies: FxHashMap::default(),
        }
    }

    #[inline]
    pub(crate) fn insert_cache_latency(
        &mut self,
        cache: CacheIdentifier,
        latency: Latency,
    ) -> Option<Latency> {
        self.cache_latencies.insert(cache, latency)
    }

    #[inline]
    pub fn origin_latency(&self) -> Latency {
        self.origin_latency
    }

    #[inline]
    pub fn cache_latency(&self, cache: CacheIdentifier) -> Option<Latency> {
        self.cache_latencies.get(&cache).copied()
    }

    #[inline]
    pub fn is_reachable(&self, cache: CacheIdentifier) -> bool {
        self.cache_latencies.contains_key(&cache)
    }

    /// Reachable caches with their latency, in no particular order.
    #[inline]
    pub fn reachable_caches(&self) -> impl Iterator<Item = (CacheIdentifier, Latency)> + '_ {
        self.cache_latencies.iter().map(|(c, l)| (*c, *l))
    }

    #[inline]
    pub fn reachable_len(&self) -> usize {
        self.cache_latencies.len()
    }
}

/// One immutable problem instance.
///
/// Built through [`crate::network::NetworkBuilder`] or
/// [`crate::network::loader::NetworkLoader`], both of which guarantee that every
/// identifier referenced by an endpoint or a request is in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    video_sizes: Vec<Size>,
    endpoints: Vec<Endpoint>,
    cache_count: usize,
    cache_capacity: Size,
    requests: Vec<Request>,
}

impl Network {
    #[inline]
    pub(crate) fn new(
        video_sizes: Vec<Size>,
        endpoints: Vec<Endpoint>,
        cache_count: usize,
        cache_capacity: Size,
        requests: Vec<Request>,
    ) -> Self {
        Self {
            video_sizes,
            endpoints,
            cache_count,
            cache_capacity,
            requests,
        }
    }

    #[inline]
    pub fn video_count(&self) -> usize {
        self.video_sizes.len()
    }

    #[inline]
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    #[inline]
    pub fn cache_count(&self) -> usize {
        self.cache_count
    }

    #[inline]
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    #[inline]
    pub fn cache_capacity(&self) -> Size {
        self.cache_capacity
    }

    #[inline]
    pub fn video_sizes(&self) -> &[Size] {
        &self.video_sizes
    }

    #[inline]
    pub fn video_size(&self, video: VideoIdentifier) -> Option<Size> {
        self.video_sizes.get(video.get()).copied()
    }

    #[inline]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    #[inline]
    pub fn endpoint(&self, endpoint: EndpointIdentifier) -> Option<&Endpoint> {
        self.endpoints.get(endpoint.get())
    }

    #[inline]
    pub fn origin_latency(&self, endpoint: EndpointIdentifier) -> Option<Latency> {
        self.endpoint(endpoint).map(Endpoint::origin_latency)
    }

    #[inline]
    pub fn cache_latency(
        &self,
        endpoint: EndpointIdentifier,
        cache: CacheIdentifier,
    ) -> Option<Latency> {
        self.endpoint(endpoint)
            .and_then(|e| e.cache_latency(cache))
    }

    #[inline]
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Sum of all request counts of the workload. Widened so that any
    /// workload of valid counts sums without overflow.
    #[inline]
    pub fn total_requests(&self) -> u128 {
        self.requests.iter().map(|r| u128::from(r.count())).sum()
    }

    #[inline]
    pub fn iter_videos(&self) -> impl Iterator<Item = VideoIdentifier> + '_ {
        (0..self.video_sizes.len()).map(VideoIdentifier::new)
    }

    #[inline]
    pub fn iter_caches(&self) -> impl Iterator<Item = CacheIdentifier> + '_ {
        (0..self.cache_count).map(CacheIdentifier::new)
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Network: videos={} endpoints={} caches={} capacity={} requests={}",
            self.video_count(),
            self.endpoint_count(),
            self.cache_count(),
            self.cache_capacity(),
            self.request_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::network::builder::NetworkBuilder;

    #[test]
    fn test_total_requests_does_not_wrap_at_u64() {
        let mut b = NetworkBuilder::new(1, 10).with_videos([1, 1]);
        let e = b.add_endpoint(100);
        b.add_request(crate::common::VideoIdentifier::new(0), e, u64::MAX)
            .add_request(crate::common::VideoIdentifier::new(1), e, u64::MAX);
        let net = b.build().unwrap();
        assert_eq!(net.total_requests(), 2 * u128::from(u64::MAX));
    }
}
