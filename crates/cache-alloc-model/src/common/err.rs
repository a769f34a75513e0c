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

use std::num::ParseIntError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedEof,
    Io(std::io::ErrorKind),
    InvalidInteger(ParseIntError),
    FieldCount {
        expected: usize,
        found: usize,
    },
    MissingFields {
        min: usize,
        found: usize,
    },
    NonPositive {
        field: &'static str,
    },
    OutOfRange {
        field: &'static str,
        value: u64,
        bound: u64,
    },
    Duplicate {
        field: &'static str,
        value: u64,
    },
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorKind::UnexpectedEof => write!(f, "unexpected end of input"),
            ParseErrorKind::Io(kind) => write!(f, "I/O error: {}", kind),
            ParseErrorKind::InvalidInteger(e) => write!(f, "invalid integer: {}", e),
            ParseErrorKind::FieldCount { expected, found } => {
                write!(f, "expected {} fields, found {}", expected, found)
            }
            ParseErrorKind::MissingFields { min, found } => {
                write!(f, "expected at least {} fields, found {}", min, found)
            }
            ParseErrorKind::NonPositive { field } => write!(f, "{} must be positive", field),
            ParseErrorKind::OutOfRange {
                field,
                value,
                bound,
            } => write!(f, "{} {} is out of range [0, {})", field, value, bound),
            ParseErrorKind::Duplicate { field, value } => {
                write!(f, "duplicate {} {}", field, value)
            }
        }
    }
}

/// A malformed record in an instance or solution file.
///
/// `line` is 1-based and points at the offending line. For
/// [`ParseErrorKind::UnexpectedEof`] it is the line after the last one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    line: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    #[inline]
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    #[inline]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl std::error::Error for ParseError {}
