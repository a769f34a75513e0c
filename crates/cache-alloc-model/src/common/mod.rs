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
pub(crate) mod scanner;

/// Size of a video and capacity of a cache, in megabytes.
pub type Size = u64;

/// Latency between an endpoint and the origin or a cache, in milliseconds.
pub type Latency = u64;

/// Number of aggregated requests for one (video, endpoint) pair.
pub type RequestCount = u64;

pub trait IdentifierMarkerName: Copy {
    const NAME: &'static str;
}

#[repr(transparent)]
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier<I, U>(I, core::marker::PhantomData<U>);

impl<I, U> Identifier<I, U> {
    #[inline]
    pub const fn new(id: I) -> Self {
        Self(id, core::marker::PhantomData)
    }
}

impl<U> Identifier<usize, U> {
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl<I, U> std::fmt::Display for Identifier<I, U>
where
    I: std::fmt::Display,
    U: IdentifierMarkerName,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", U::NAME, self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoIdentifierMarker;

impl IdentifierMarkerName for VideoIdentifierMarker {
    const NAME: &'static str = "VideoId";
}

pub type VideoIdentifier = Identifier<usize, VideoIdentifierMarker>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointIdentifierMarker;

impl IdentifierMarkerName for EndpointIdentifierMarker {
    const NAME: &'static str = "EndpointId";
}

pub type EndpointIdentifier = Identifier<usize, EndpointIdentifierMarker>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheIdentifierMarker;

impl IdentifierMarkerName for CacheIdentifierMarker {
    const NAME: &'static str = "CacheId";
}

pub type CacheIdentifier = Identifier<usize, CacheIdentifierMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display_uses_marker_name() {
        assert_eq!(VideoIdentifier::new(3).to_string(), "VideoId(3)");
        assert_eq!(EndpointIdentifier::new(0).to_string(), "EndpointId(0)");
        assert_eq!(CacheIdentifier::new(12).to_string(), "CacheId(12)");
    }

    #[test]
    fn test_identifier_ordering_follows_inner_value() {
        let mut ids = vec![
            VideoIdentifier::new(5),
            VideoIdentifier::new(1),
            VideoIdentifier::new(3),
        ];
        ids.sort();
        let raw: Vec<usize> = ids.into_iter().map(|id| id.get()).collect();
        assert_eq!(raw, vec![1, 3, 5]);
    }
}
