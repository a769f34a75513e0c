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
    caching::{Caching, err::CachingLoaderError},
    common::{CacheIdentifier, VideoIdentifier, err::ParseErrorKind, scanner::LineScanner},
    network::net::Network,
};
use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

/// Solution file text of one caching.
struct SolutionText<'a>(&'a Caching);

impl std::fmt::Display for SolutionText<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0.nonempty_count())?;
        for (cache, videos) in self.0.iter().filter(|(_, s)| !s.is_empty()) {
            write!(f, "{}", cache.get())?;
            for v in videos {
                write!(f, " {}", v.get())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Writes solution files: the number of nonempty caches, then one
/// `cache_id video_id...` line per nonempty cache. Empty caches are omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachingWriter;

impl CachingWriter {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    pub fn write<W: Write>(&self, caching: &Caching, mut w: W) -> std::io::Result<()> {
        write!(w, "{}", SolutionText(caching))?;
        w.flush()
    }

    pub fn to_path(&self, caching: &Caching, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path)?;
        self.write(caching, BufWriter::new(file))
    }

    #[inline]
    pub fn to_string(&self, caching: &Caching) -> String {
        SolutionText(caching).to_string()
    }
}

/// Reads solution files back into a [`Caching`] of a fixed cache count.
///
/// Caches missing from the file come back empty. When bound to a network via
/// [`CachingLoader::for_network`], video ids are also checked against the
/// catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachingLoader {
    cache_count: usize,
    video_count: Option<usize>,
}

impl CachingLoader {
    #[inline]
    pub fn new(cache_count: usize) -> Self {
        Self {
            cache_count,
            video_count: None,
        }
    }

    #[inline]
    pub fn for_network(network: &Network) -> Self {
        Self {
            cache_count: network.cache_count(),
            video_count: Some(network.video_count()),
        }
    }

    pub fn from_bufread<R: BufRead>(&self, br: R) -> Result<Caching, CachingLoaderError> {
        let mut sc = LineScanner::new(br);
        let declared = sc.next_exact(1)?[0];
        if declared > self.cache_count as u64 {
            return Err(sc
                .error(ParseErrorKind::OutOfRange {
                    field: "nonempty cache count",
                    value: declared,
                    bound: self.cache_count as u64 + 1,
                })
                .into());
        }

        let mut caches = vec![BTreeSet::new(); self.cache_count];
        let mut seen = vec![false; self.cache_count];
        for _ in 0..declared {
            let rec = sc.next_record(1)?;
            let cache = sc.index("cache id", rec[0], self.cache_count)?;
            if std::mem::replace(&mut seen[cache], true) {
                return Err(sc
                    .error(ParseErrorKind::Duplicate {
                        field: "cache id",
                        value: rec[0],
                    })
                    .into());
            }
            for &raw in &rec[1..] {
                let video = match self.video_count {
                    Some(n) => sc.index("video id", raw, n)?,
                    None => raw as usize,
                };
                if !caches[cache].insert(VideoIdentifier::new(video)) {
                    return Err(sc
                        .error(ParseErrorKind::Duplicate {
                            field: "video id",
                            value: raw,
                        })
                        .into());
                }
            }
        }
        Ok(Caching::from_sets(caches))
    }

    #[inline]
    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<Caching, CachingLoaderError> {
        let file = File::open(path).map_err(CachingLoaderError::Io)?;
        self.from_bufread(BufReader::new(file))
    }

    #[inline]
    pub fn from_reader<R: Read>(&self, r: R) -> Result<Caching, CachingLoaderError> {
        self.from_bufread(BufReader::new(r))
    }

    #[inline]
    pub fn from_str(&self, s: &str) -> Result<Caching, CachingLoaderError> {
        self.from_reader(s.as_bytes())
    }
}

impl From<&Caching> for CachingLoader {
    #[inline]
    fn from(caching: &Caching) -> Self {
        Self::new(caching.cache_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::err::ParseError;
    use crate::network::loader::NetworkLoader;

    #[inline]
    fn vid(n: usize) -> VideoIdentifier {
        VideoIdentifier::new(n)
    }
    #[inline]
    fn cid(n: usize) -> CacheIdentifier {
        CacheIdentifier::new(n)
    }

    fn parse_err(loader: CachingLoader, s: &str) -> ParseError {
        match loader.from_str(s) {
            Err(CachingLoaderError::Parse(e)) => e,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_writer_omits_empty_caches() {
        let mut c = Caching::new(3);
        c.insert(cid(2), vid(3));
        c.insert(cid(0), vid(1));
        c.insert(cid(0), vid(0));
        assert_eq!(CachingWriter::new().to_string(&c), "2\n0 0 1\n2 3\n");
        assert_eq!(CachingWriter::new().to_string(&Caching::new(2)), "0\n");
    }

    #[test]
    fn test_string_and_stream_output_agree() {
        let mut c = Caching::new(2);
        c.insert(cid(1), vid(7));
        c.insert(cid(1), vid(2));
        let mut buf = Vec::new();
        CachingWriter::new().write(&c, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1\n1 2 7\n");
        assert_eq!(CachingWriter::new().to_string(&c), "1\n1 2 7\n");
    }

    #[test]
    fn test_save_then_load_reproduces_sets() {
        let mut c = Caching::new(4);
        c.insert(cid(0), vid(2));
        c.insert(cid(1), vid(3));
        c.insert(cid(1), vid(1));
        c.insert(cid(3), vid(0));
        c.insert(cid(3), vid(2));

        let text = CachingWriter::new().to_string(&c);
        let back = CachingLoader::from(&c).from_str(&text).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.cache(cid(2)).map(BTreeSet::len), Some(0));
    }

    #[test]
    fn test_loader_accepts_any_video_order_and_empty_line() {
        let c = CachingLoader::new(2).from_str("2\n1 4 0 2\n0\n").unwrap();
        let ids: Vec<usize> = c.cache(cid(1)).unwrap().iter().map(|v| v.get()).collect();
        assert_eq!(ids, vec![0, 2, 4]);
        assert!(c.cache(cid(0)).unwrap().is_empty());
    }

    #[test]
    fn test_loader_rejects_bad_records() {
        let err = parse_err(CachingLoader::new(2), "1\n2 0\n");
        assert_eq!(err.line(), 2);
        assert!(matches!(
            err.kind(),
            ParseErrorKind::OutOfRange {
                field: "cache id",
                ..
            }
        ));

        let err = parse_err(CachingLoader::new(2), "2\n0 1\n0 2\n");
        assert_eq!(err.line(), 3);
        assert!(matches!(
            err.kind(),
            ParseErrorKind::Duplicate {
                field: "cache id",
                value: 0
            }
        ));

        let err = parse_err(CachingLoader::new(2), "3\n");
        assert_eq!(err.line(), 1);

        let err = parse_err(CachingLoader::new(2), "2\n0 1\n");
        assert_eq!(*err.kind(), ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_loader_bound_to_network_checks_video_ids() {
        let net = NetworkLoader::new()
            .from_str("2 1 1 1 100\n10 20\n1000 1\n0 5\n1 0 3\n")
            .unwrap();
        let loader = CachingLoader::for_network(&net);
        assert!(loader.from_str("1\n0 0 1\n").is_ok());

        let err = parse_err(loader, "1\n0 0 2\n");
        assert!(matches!(
            err.kind(),
            ParseErrorKind::OutOfRange {
                field: "video id",
                value: 2,
                bound: 2
            }
        ));
        assert!(CachingLoader::new(1).from_str("1\n0 0 2\n").is_ok());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("cache-alloc-io-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("round_trip.out");

        let mut c = Caching::new(2);
        c.insert(cid(1), vid(7));
        CachingWriter::new().to_path(&c, &path).unwrap();
        let back = CachingLoader::new(2).from_path(&path).unwrap();
        assert_eq!(back, c);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
