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

use crate::common::{EndpointIdentifier, RequestCount, VideoIdentifier};

/// Aggregated demand of one endpoint for one video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Request {
    video: VideoIdentifier,
    endpoint: EndpointIdentifier,
    count: RequestCount,
}

impl Request {
    #[inline]
    pub fn new(video: VideoIdentifier, endpoint: EndpointIdentifier, count: RequestCount) -> Self {
        Self {
            video,
            endpoint,
            count,
        }
    }

    #[inline]
    pub fn video(&self) -> VideoIdentifier {
        self.video
    }

    #[inline]
    pub fn endpoint(&self) -> EndpointIdentifier {
        self.endpoint
    }

    #[inline]
    pub fn count(&self) -> RequestCount {
        self.count
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Request({} from {} x{})",
            self.video, self.endpoint, self.count
        )
    }
}
