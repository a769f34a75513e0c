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

use crate::eval::score::ScoreError;

/// A tuning parameter outside its admissible range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurationError {
    field: &'static str,
    reason: String,
}

impl ConfigurationError {
    #[inline]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn field(&self) -> &'static str {
        self.field
    }

    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid `{}`: {}", self.field, self.reason)
    }
}

impl std::error::Error for ConfigurationError {}

/// Checks `0 <= value <= 1` (and rejects NaN).
pub(crate) fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigurationError::new(
            field,
            format!("{} is not a probability in [0, 1]", value),
        ));
    }
    Ok(())
}

pub(crate) fn check_positive(field: &'static str, value: u64) -> Result<(), ConfigurationError> {
    if value == 0 {
        return Err(ConfigurationError::new(field, "must be positive"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    Configuration(ConfigurationError),
    Score(ScoreError),
    SearchSpaceTooLarge {
        videos: usize,
        caches: usize,
        candidates: Option<u64>,
        ceiling: u64,
    },
}

impl std::fmt::Display for StrategyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyError::Configuration(e) => write!(f, "Configuration error: {}", e),
            StrategyError::Score(e) => write!(f, "Scoring failed: {}", e),
            StrategyError::SearchSpaceTooLarge {
                videos,
                caches,
                candidates: Some(n),
                ceiling,
            } => write!(
                f,
                "Search space of {} videos over {} caches has {} candidates, ceiling is {}",
                videos, caches, n, ceiling
            ),
            StrategyError::SearchSpaceTooLarge {
                videos,
                caches,
                candidates: None,
                ceiling,
            } => write!(
                f,
                "Search space of {} videos over {} caches exceeds the ceiling of {}",
                videos, caches, ceiling
            ),
        }
    }
}

impl std::error::Error for StrategyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StrategyError::Configuration(e) => Some(e),
            StrategyError::Score(e) => Some(e),
            StrategyError::SearchSpaceTooLarge { .. } => None,
        }
    }
}

impl From<ConfigurationError> for StrategyError {
    #[inline]
    fn from(err: ConfigurationError) -> Self {
        StrategyError::Configuration(err)
    }
}

impl From<ScoreError> for StrategyError {
    #[inline]
    fn from(err: ScoreError) -> Self {
        StrategyError::Score(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_bounds() {
        assert!(check_probability("p", 0.0).is_ok());
        assert!(check_probability("p", 1.0).is_ok());
        assert!(check_probability("p", -0.1).is_err());
        assert!(check_probability("p", 1.5).is_err());
        let err = check_probability("crossover", f64::NAN).unwrap_err();
        assert_eq!(err.field(), "crossover");
    }

    #[test]
    fn test_display_mentions_field_and_ceiling() {
        let e: StrategyError = ConfigurationError::new("pool_size", "must be positive").into();
        assert_eq!(
            e.to_string(),
            "Configuration error: Invalid `pool_size`: must be positive"
        );
        let e = StrategyError::SearchSpaceTooLarge {
            videos: 30,
            caches: 2,
            candidates: None,
            ceiling: 1_000,
        };
        assert!(e.to_string().contains("ceiling of 1000"));
    }
}
