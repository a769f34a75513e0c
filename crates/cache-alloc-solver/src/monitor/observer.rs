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

use crate::eval::score::Score;
use std::fmt;

/// Observer for high-level search lifecycle events.
/// All methods have default no-op implementations.
pub trait SearchObserver: Send {
    /// A short identifier for logging and diagnostics.
    fn name(&self) -> &str {
        "SearchObserver"
    }

    fn on_search_start(&mut self, _strategy: &str) {}
    fn on_search_end(&mut self, _best: Option<Score>) {}

    /// A strictly better incumbent was found at `iteration`.
    fn on_new_best(&mut self, _iteration: u64, _score: Score) {}
}

/// Keeps every improvement in order of arrival.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BestTrace {
    improvements: Vec<(u64, Score)>,
}

impl BestTrace {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn improvements(&self) -> &[(u64, Score)] {
        &self.improvements
    }

    #[inline]
    pub fn last(&self) -> Option<Score> {
        self.improvements.last().map(|&(_, s)| s)
    }

    /// `true` if every recorded score is strictly above the previous one.
    pub fn is_strictly_increasing(&self) -> bool {
        self.improvements.windows(2).all(|w| w[0].1 < w[1].1)
    }
}

impl SearchObserver for BestTrace {
    fn name(&self) -> &str {
        "BestTrace"
    }

    fn on_new_best(&mut self, iteration: u64, score: Score) {
        self.improvements.push((iteration, score));
    }
}

impl<'a> fmt::Debug for dyn SearchObserver + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SearchObserver({})", self.name())
    }
}
