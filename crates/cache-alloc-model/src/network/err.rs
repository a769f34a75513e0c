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

use crate::common::{CacheIdentifier, EndpointIdentifier, VideoIdentifier, err::ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkError {
    NonPositiveCacheCount,
    NonPositiveCapacity,
    UnknownVideo(VideoIdentifier),
    UnknownEndpoint(EndpointIdentifier),
    UnknownCache(CacheIdentifier),
    NonPositiveRequestCount(VideoIdentifier, EndpointIdentifier),
    DuplicateCacheLatency(EndpointIdentifier, CacheIdentifier),
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::NonPositiveCacheCount => write!(f, "The cache count must be positive"),
            NetworkError::NonPositiveCapacity => write!(f, "The cache capacity must be positive"),
            NetworkError::UnknownVideo(id) => write!(f, "Unknown video {}", id),
            NetworkError::UnknownEndpoint(id) => write!(f, "Unknown endpoint {}", id),
            NetworkError::UnknownCache(id) => write!(f, "Unknown cache {}", id),
            NetworkError::NonPositiveRequestCount(v, e) => {
                write!(f, "Request for {} from {} has a zero count", v, e)
            }
            NetworkError::DuplicateCacheLatency(e, c) => {
                write!(f, "Latency from {} to {} is given twice", e, c)
            }
        }
    }
}

impl std::error::Error for NetworkError {}

#[derive(Debug)]
pub enum NetworkLoaderError {
    Io(std::io::Error),
    Parse(ParseError),
    Network(NetworkError),
}

impl std::fmt::Display for NetworkLoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkLoaderError::Io(e) => write!(f, "I/O error: {}", e),
            NetworkLoaderError::Parse(e) => write!(f, "Parse error: {}", e),
            NetworkLoaderError::Network(e) => write!(f, "Invalid network: {}", e),
        }
    }
}

impl std::error::Error for NetworkLoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetworkLoaderError::Io(e) => Some(e),
            NetworkLoaderError::Parse(e) => Some(e),
            NetworkLoaderError::Network(e) => Some(e),
        }
    }
}

impl From<ParseError> for NetworkLoaderError {
    #[inline]
    fn from(err: ParseError) -> Self {
        NetworkLoaderError::Parse(err)
    }
}

impl From<NetworkError> for NetworkLoaderError {
    #[inline]
    fn from(err: NetworkError) -> Self {
        NetworkLoaderError::Network(err)
    }
}

impl From<std::io::Error> for NetworkLoaderError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        NetworkLoaderError::Io(err)
    }
}
