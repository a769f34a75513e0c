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

use crate::common::err::{ParseError, ParseErrorKind};
use std::io::BufRead;

/// Line-oriented reader of whitespace separated unsigned integers.
///
/// Blank lines are skipped; every other line is one record.
#[derive(Debug)]
pub(crate) struct LineScanner<R: BufRead> {
    rdr: R,
    buf: String,
    line: usize,
}

impl<R: BufRead> LineScanner<R> {
    pub(crate) fn new(rdr: R) -> Self {
        Self {
            rdr,
            buf: String::new(),
            line: 0,
        }
    }

    /// 1-based number of the last record returned.
    #[inline]
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    #[inline]
    pub(crate) fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.line, kind)
    }

    fn fill_record(&mut self) -> Result<(), ParseError> {
        loop {
            self.buf.clear();
            let n = self
                .rdr
                .read_line(&mut self.buf)
                .map_err(|e| ParseError::new(self.line + 1, ParseErrorKind::Io(e.kind())))?;
            if n == 0 {
                return Err(ParseError::new(
                    self.line + 1,
                    ParseErrorKind::UnexpectedEof,
                ));
            }
            self.line += 1;
            if !self.buf.trim().is_empty() {
                return Ok(());
            }
        }
    }

    /// Reads the next record with any number of fields (at least `min`).
    pub(crate) fn next_record(&mut self, min: usize) -> Result<Vec<u64>, ParseError> {
        self.fill_record()?;
        let line = self.line;
        let values = self
            .buf
            .split_ascii_whitespace()
            .map(|tok| {
                tok.parse::<u64>()
                    .map_err(|e| ParseError::new(line, ParseErrorKind::InvalidInteger(e)))
            })
            .collect::<Result<Vec<u64>, ParseError>>()?;

        if values.len() < min {
            return Err(self.error(ParseErrorKind::MissingFields {
                min,
                found: values.len(),
            }));
        }
        Ok(values)
    }

    /// Reads the next record and requires exactly `n` fields.
    pub(crate) fn next_exact(&mut self, n: usize) -> Result<Vec<u64>, ParseError> {
        let values = self.next_record(0)?;
        if values.len() != n {
            return Err(self.error(ParseErrorKind::FieldCount {
                expected: n,
                found: values.len(),
            }));
        }
        Ok(values)
    }

    /// Checks `value < bound` and reports the current line otherwise.
    #[inline]
    pub(crate) fn index(
        &self,
        field: &'static str,
        value: u64,
        bound: usize,
    ) -> Result<usize, ParseError> {
        let bound = bound as u64;
        if value >= bound {
            return Err(self.error(ParseErrorKind::OutOfRange {
                field,
                value,
                bound,
            }));
        }
        Ok(value as usize)
    }
}
