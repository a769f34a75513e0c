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

use crate::{eval::score::ScoreError, strategy::err::StrategyError};
use cache_alloc_model::prelude::{
    CachingLoaderError, CachingValidationError, NetworkLoaderError, ParseError,
};

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Checkpoint I/O error: {}", e),
            StoreError::Parse(e) => write!(f, "Corrupt checkpoint: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for StoreError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<CachingLoaderError> for StoreError {
    #[inline]
    fn from(err: CachingLoaderError) -> Self {
        match err {
            CachingLoaderError::Io(e) => StoreError::Io(e),
            CachingLoaderError::Parse(e) => StoreError::Parse(e),
        }
    }
}

/// Why one instance of a batch produced no result.
#[derive(Debug)]
pub enum BatchError {
    Load(NetworkLoaderError),
    Strategy(StrategyError),
    Score(ScoreError),
    InvalidResult(CachingValidationError),
    WorkerPanicked,
    Cancelled,
    Store(StoreError),
}

impl BatchError {
    /// Short machine-friendly tag of the failure kind.
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            BatchError::Load(_) => "load",
            BatchError::Strategy(_) => "strategy",
            BatchError::Score(_) => "score",
            BatchError::InvalidResult(_) => "invalid_result",
            BatchError::WorkerPanicked => "worker_panicked",
            BatchError::Cancelled => "cancelled",
            BatchError::Store(_) => "store",
        }
    }
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::Load(e) => write!(f, "Failed to load instance: {}", e),
            BatchError::Strategy(e) => write!(f, "Strategy failed: {}", e),
            BatchError::Score(e) => write!(f, "Scoring failed: {}", e),
            BatchError::InvalidResult(e) => write!(f, "Strategy returned an invalid caching: {}", e),
            BatchError::WorkerPanicked => write!(f, "Worker thread panicked"),
            BatchError::Cancelled => write!(f, "Cancelled before it started"),
            BatchError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Load(e) => Some(e),
            BatchError::Strategy(e) => Some(e),
            BatchError::Score(e) => Some(e),
            BatchError::InvalidResult(e) => Some(e),
            BatchError::Store(e) => Some(e),
            BatchError::WorkerPanicked | BatchError::Cancelled => None,
        }
    }
}

impl From<NetworkLoaderError> for BatchError {
    #[inline]
    fn from(err: NetworkLoaderError) -> Self {
        BatchError::Load(err)
    }
}

impl From<StrategyError> for BatchError {
    #[inline]
    fn from(err: StrategyError) -> Self {
        BatchError::Strategy(err)
    }
}

impl From<ScoreError> for BatchError {
    #[inline]
    fn from(err: ScoreError) -> Self {
        BatchError::Score(err)
    }
}

impl From<CachingValidationError> for BatchError {
    #[inline]
    fn from(err: CachingValidationError) -> Self {
        BatchError::InvalidResult(err)
    }
}

impl From<StoreError> for BatchError {
    #[inline]
    fn from(err: StoreError) -> Self {
        BatchError::Store(err)
    }
}
