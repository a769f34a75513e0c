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
    common::{
        CacheIdentifier, EndpointIdentifier, Latency, RequestCount, Size, VideoIdentifier,
    },
    network::{
        err::NetworkError,
        net::{Endpoint, Network},
        req::Request,
    },
};

#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    cache_count: usize,
    cache_capacity: Size,
    video_sizes: Vec<Size>,
    origin_latencies: Vec<Latency>,
    cache_latencies: Vec<(EndpointIdentifier, CacheIdentifier, Latency)>,
    requests: Vec<Request>,
}

impl NetworkBuilder {
    #[inline]
    pub fn new(cache_count: usize, cache_capacity: Size) -> Self {
        Self {
            cache_count,
            cache_capacity,
            video_sizes: Vec::new(),
            origin_latencies: Vec::new(),
            cache_latencies: Vec::new(),
            requests: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacities(
        cache_count: usize,
        cache_capacity: Size,
        videos: usize,
        endpoints: usize,
        requests: usize,
    ) -> Self {
        Self {
            cache_count,
            cache_capacity,
            video_sizes: Vec::with_capacity(videos),
            origin_latencies: Vec::with_capacity(endpoints),
            cache_latencies: Vec::with_capacity(endpoints),
            requests: Vec::with_capacity(requests),
        }
    }

    #[inline]
    pub fn with_videos<I>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = Size>,
    {
        self.video_sizes.clear();
        self.video_sizes.extend(sizes);
        self
    }

    /// Appends a video and returns its identifier (its catalogue position).
    #[inline]
    pub fn add_video(&mut self, size: Size) -> VideoIdentifier {
        self.video_sizes.push(size);
        VideoIdentifier::new(self.video_sizes.len() - 1)
    }

    /// Appends an endpoint and returns its identifier.
    #[inline]
    pub fn add_endpoint(&mut self, origin_latency: Latency) -> EndpointIdentifier {
        self.origin_latencies.push(origin_latency);
        EndpointIdentifier::new(self.origin_latencies.len() - 1)
    }

    #[inline]
    pub fn add_cache_latency(
        &mut self,
        endpoint: EndpointIdentifier,
        cache: CacheIdentifier,
        latency: Latency,
    ) -> &mut Self {
        self.cache_latencies.push((endpoint, cache, latency));
        self
    }

    #[inline]
    pub fn add_request(
        &mut self,
        video: VideoIdentifier,
        endpoint: EndpointIdentifier,
        count: RequestCount,
    ) -> &mut Self {
        self.requests.push(Request::new(video, endpoint, count));
        self
    }

    pub fn build(self) -> Result<Network, NetworkError> {
        if self.cache_count == 0 {
            return Err(NetworkError::NonPositiveCacheCount);
        }
        if self.cache_capacity == 0 {
            return Err(NetworkError::NonPositiveCapacity);
        }

        let mut endpoints: Vec<Endpoint> = self
            .origin_latencies
            .iter()
            .map(|&origin| Endpoint::new(origin))
            .collect();

        for (endpoint, cache, latency) in self.cache_latencies {
            if cache.get() >= self.cache_count {
                return Err(NetworkError::UnknownCache(cache));
            }
            let ep = endpoints
                .get_mut(endpoint.get())
                .ok_or(NetworkError::UnknownEndpoint(endpoint))?;
            if ep.insert_cache_latency(cache, latency).is_some() {
                return Err(NetworkError::DuplicateCacheLatency(endpoint, cache));
            }
        }

        for r in &self.requests {
            if r.video().get() >= self.video_sizes.len() {
                return Err(NetworkError::UnknownVideo(r.video()));
            }
            if r.endpoint().get() >= endpoints.len() {
                return Err(NetworkError::UnknownEndpoint(r.endpoint()));
            }
            if r.count() == 0 {
                return Err(NetworkError::NonPositiveRequestCount(
                    r.video(),
                    r.endpoint(),
                ));
            }
        }

        Ok(Network::new(
            self.video_sizes,
            endpoints,
            self.cache_count,
            self.cache_capacity,
            self.requests,
        ))
    }
}
