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

use crate::common::{CacheIdentifier, Size, VideoIdentifier, err::ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapacityViolationError {
    cache: CacheIdentifier,
    used: Size,
    capacity: Size,
}

impl CapacityViolationError {
    #[inline]
    pub fn new(cache: CacheIdentifier, used: Size, capacity: Size) -> Self {
        Self {
            cache,
            used,
            capacity,
        }
    }

    #[inline]
    pub fn cache(&self) -> CacheIdentifier {
        self.cache
    }

    #[inline]
    pub fn used(&self) -> Size {
        self.used
    }

    #[inline]
    pub fn capacity(&self) -> Size {
        self.capacity
    }
}

impl std::fmt::Display for CapacityViolationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache {} holds {} MB but its capacity is {} MB",
            self.cache, self.used, self.capacity
        )
    }
}

impl std::error::Error for CapacityViolationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownVideoError {
    cache: CacheIdentifier,
    video: VideoIdentifier,
}

impl UnknownVideoError {
    #[inline]
    pub fn new(cache: CacheIdentifier, video: VideoIdentifier) -> Self {
        Self { cache, video }
    }

    #[inline]
    pub fn cache(&self) -> CacheIdentifier {
        self.cache
    }

    #[inline]
    pub fn video(&self) -> VideoIdentifier {
        self.video
    }
}

impl std::fmt::Display for UnknownVideoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache {} holds {} which is not in the catalogue",
            self.cache, self.video
        )
    }
}

impl std::error::Error for UnknownVideoError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachingValidationError {
    CacheCountMismatch { expected: usize, found: usize },
    UnknownVideo(UnknownVideoError),
    Capacity(CapacityViolationError),
}

impl std::fmt::Display for CachingValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CachingValidationError::CacheCountMismatch { expected, found } => write!(
                f,
                "Caching has {} caches but the network has {}",
                found, expected
            ),
            CachingValidationError::UnknownVideo(e) => write!(f, "{}", e),
            CachingValidationError::Capacity(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CachingValidationError {}

impl From<UnknownVideoError> for CachingValidationError {
    #[inline]
    fn from(err: UnknownVideoError) -> Self {
        CachingValidationError::UnknownVideo(err)
    }
}

impl From<CapacityViolationError> for CachingValidationError {
    #[inline]
    fn from(err: CapacityViolationError) -> Self {
        CachingValidationError::Capacity(err)
    }
}

#[derive(Debug)]
pub enum CachingLoaderError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl std::fmt::Display for CachingLoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CachingLoaderError::Io(e) => write!(f, "I/O error: {}", e),
            CachingLoaderError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for CachingLoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CachingLoaderError::Io(e) => Some(e),
            CachingLoaderError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for CachingLoaderError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        CachingLoaderError::Io(err)
    }
}

impl From<ParseError> for CachingLoaderError {
    #[inline]
    fn from(err: ParseError) -> Self {
        CachingLoaderError::Parse(err)
    }
}
