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
        CacheIdentifier, EndpointIdentifier, VideoIdentifier, err::ParseErrorKind,
        scanner::LineScanner,
    },
    network::{builder::NetworkBuilder, err::NetworkLoaderError, net::Network},
};
use fxhash::FxHashSet;
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

/// Upper bound on what header counts may pre-allocate; larger inputs grow on demand.
const PREALLOC_LIMIT: usize = 1 << 16;

/// Reads instance files.
///
/// ```text
/// video_count endpoint_count request_count cache_count cache_capacity
/// size_0 size_1 ... size_{video_count-1}
/// origin_latency cache_entries        (per endpoint)
/// cache_id cache_latency              (cache_entries times)
/// video_id endpoint_id request_count  (request_count times)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkLoader {
    skip_zero_requests: bool,
}

impl NetworkLoader {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop request records with a zero count instead of rejecting the file.
    #[inline]
    pub fn skip_zero_requests(mut self, yes: bool) -> Self {
        self.skip_zero_requests = yes;
        self
    }

    pub fn from_bufread<R: BufRead>(&self, br: R) -> Result<Network, NetworkLoaderError> {
        let mut sc = LineScanner::new(br);

        let header = sc.next_exact(5)?;
        let (video_count, endpoint_count, request_count, cache_count, capacity) = (
            header[0] as usize,
            header[1] as usize,
            header[2] as usize,
            header[3] as usize,
            header[4],
        );
        if cache_count == 0 {
            return Err(sc
                .error(ParseErrorKind::NonPositive {
                    field: "cache count",
                })
                .into());
        }
        if capacity == 0 {
            return Err(sc
                .error(ParseErrorKind::NonPositive {
                    field: "cache capacity",
                })
                .into());
        }

        let sizes = if video_count == 0 {
            Vec::new()
        } else {
            sc.next_exact(video_count)?
        };

        let mut builder = NetworkBuilder::with_capacities(
            cache_count,
            capacity,
            video_count.min(PREALLOC_LIMIT),
            endpoint_count.min(PREALLOC_LIMIT),
            request_count.min(PREALLOC_LIMIT),
        )
        .with_videos(sizes);

        for _ in 0..endpoint_count {
            let rec = sc.next_exact(2)?;
            let endpoint = builder.add_endpoint(rec[0]);
            let entries = rec[1] as usize;

            let mut seen = FxHashSet::default();
            for _ in 0..entries {
                let rec = sc.next_exact(2)?;
                let cache = sc.index("cache id", rec[0], cache_count)?;
                if !seen.insert(cache) {
                    return Err(sc
                        .error(ParseErrorKind::Duplicate {
                            field: "cache id",
                            value: rec[0],
                        })
                        .into());
                }
                builder.add_cache_latency(endpoint, CacheIdentifier::new(cache), rec[1]);
            }
        }

        for _ in 0..request_count {
            let rec = sc.next_exact(3)?;
            let video = sc.index("video id", rec[0], video_count)?;
            let endpoint = sc.index("endpoint id", rec[1], endpoint_count)?;
            if rec[2] == 0 {
                if self.skip_zero_requests {
                    continue;
                }
                return Err(sc
                    .error(ParseErrorKind::NonPositive {
                        field: "request count",
                    })
                    .into());
            }
            builder.add_request(
                VideoIdentifier::new(video),
                EndpointIdentifier::new(endpoint),
                rec[2],
            );
        }

        Ok(builder.build()?)
    }

    #[inline]
    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<Network, NetworkLoaderError> {
        let file = File::open(path).map_err(NetworkLoaderError::Io)?;
        self.from_bufread(BufReader::new(file))
    }

    #[inline]
    pub fn from_reader<R: Read>(&self, r: R) -> Result<Network, NetworkLoaderError> {
        self.from_bufread(BufReader::new(r))
    }

    #[inline]
    pub fn from_str(&self, s: &str) -> Result<Network, NetworkLoaderError> {
        self.from_reader(s.as_bytes())
    }
}
