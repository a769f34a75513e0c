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
    batch::err::StoreError,
    eval::score::{Score, score},
};
use cache_alloc_model::prelude::{Caching, CachingLoader, CachingWriter, Network};
use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Persistent best-known caching per instance name.
pub trait CheckpointStore: Send + Sync {
    /// `Ok(None)` when nothing was saved for `name` yet.
    fn load(&self, name: &str, network: &Network) -> Result<Option<Caching>, StoreError>;

    /// Replaces the stored caching for `name`.
    fn save(&self, name: &str, caching: &Caching) -> Result<(), StoreError>;
}

impl std::fmt::Debug for dyn CheckpointStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckpointStore")
    }
}

/// Scores what `store` holds for `name`. Unreadable, invalid or unscorable
/// entries count as absent.
pub fn stored_score(store: &dyn CheckpointStore, name: &str, network: &Network) -> Option<Score> {
    let caching = match store.load(name, network) {
        Ok(Some(c)) => c,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(instance = name, error = %e, "ignoring unreadable checkpoint");
            return None;
        }
    };
    if let Err(e) = caching.check(network) {
        tracing::warn!(instance = name, error = %e, "ignoring invalid checkpoint");
        return None;
    }
    match score(&caching, network) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(instance = name, error = %e, "checkpoint cannot be scored");
            None
        }
    }
}

/// What [`persist_if_better`] did with an offered caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Written; `previous` is the score of the entry it replaced.
    Saved { previous: Option<Score> },
    /// The stored entry scores at least as high and was left alone.
    Kept { stored: Score },
}

/// Saves `caching` under `name` only when `score` is strictly higher than the
/// score of the stored entry.
pub fn persist_if_better(
    store: &dyn CheckpointStore,
    name: &str,
    network: &Network,
    caching: &Caching,
    score: Score,
) -> Result<Promotion, StoreError> {
    let previous = stored_score(store, name, network);
    if let Some(stored) = previous.filter(|&stored| score <= stored) {
        return Ok(Promotion::Kept { stored });
    }
    store.save(name, caching)?;
    tracing::info!(instance = name, previous = ?previous, score, "best promoted");
    Ok(Promotion::Saved { previous })
}

/// Keeps one `<name>.out` file per instance in a directory.
///
/// Saves go through a sibling temporary file and a rename, so a crash mid
/// write leaves the previous best intact.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Creates the directory if it does not exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.out", name))
    }
}

impl CheckpointStore for DirectoryStore {
    fn load(&self, name: &str, network: &Network) -> Result<Option<Caching>, StoreError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let caching = CachingLoader::for_network(network).from_path(&path)?;
        Ok(Some(caching))
    }

    fn save(&self, name: &str, caching: &Caching) -> Result<(), StoreError> {
        let path = self.path_for(name);
        let tmp = self.dir.join(format!("{}.out.tmp", name));
        CachingWriter::new().to_path(caching, &tmp)?;
        std::fs::rename(&tmp, &path)?;
        tracing::debug!(path = %path.display(), "checkpoint written");
        Ok(())
    }
}

/// In-process store, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Caching>>,
}

impl MemoryStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<Caching> {
        self.entries.lock().get(name).cloned()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl CheckpointStore for MemoryStore {
    fn load(&self, name: &str, _network: &Network) -> Result<Option<Caching>, StoreError> {
        Ok(self.get(name))
    }

    fn save(&self, name: &str, caching: &Caching) -> Result<(), StoreError> {
        self.entries.lock().insert(name.to_owned(), caching.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cache_alloc_model::prelude::{CacheIdentifier, NetworkLoader, VideoIdentifier};
    use std::time::{SystemTime, UNIX_EPOCH};

    const EXAMPLE: &str = "5 2 4 3 100\n50 50 80 30 110\n1000 3\n0 100\n2 200\n1 300\n500 0\n\
                           3 0 1500\n0 1 1000\n4 0 500\n1 0 1000\n";

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!(
            "cache-alloc-store-{}-{}-{}",
            tag,
            std::process::id(),
            nanos
        ))
    }

    fn sample(net: &Network) -> Caching {
        let mut c = Caching::for_network(net);
        c.insert(CacheIdentifier::new(0), VideoIdentifier::new(2));
        c.insert(CacheIdentifier::new(1), VideoIdentifier::new(1));
        c.insert(CacheIdentifier::new(1), VideoIdentifier::new(3));
        c
    }

    #[test]
    fn test_directory_store_round_trip() {
        let net = NetworkLoader::new().from_str(EXAMPLE).unwrap();
        let dir = scratch_dir("roundtrip");
        let store = DirectoryStore::open(&dir).unwrap();

        assert_eq!(store.load("example", &net).unwrap(), None);

        let caching = sample(&net);
        store.save("example", &caching).unwrap();
        assert!(store.path_for("example").exists());
        assert!(!dir.join("example.out.tmp").exists());
        assert_eq!(store.load("example", &net).unwrap(), Some(caching));

        let mut better = sample(&net);
        better.insert(CacheIdentifier::new(0), VideoIdentifier::new(0));
        store.save("example", &better).unwrap();
        assert_eq!(store.load("example", &net).unwrap(), Some(better));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_checkpoint_is_a_parse_error() {
        let net = NetworkLoader::new().from_str(EXAMPLE).unwrap();
        let dir = scratch_dir("corrupt");
        let store = DirectoryStore::open(&dir).unwrap();
        std::fs::write(store.path_for("example"), "1\n7 0\n").unwrap();

        match store.load("example", &net) {
            Err(StoreError::Parse(_)) => {}
            other => panic!("expected parse error, got {:?}", other),
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_memory_store_keeps_latest() {
        let net = NetworkLoader::new().from_str(EXAMPLE).unwrap();
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.load("a", &net).unwrap(), None);

        store.save("a", &sample(&net)).unwrap();
        store.save("a", &Caching::for_network(&net)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a"), Some(Caching::for_network(&net)));
    }

    #[test]
    fn test_weaker_result_never_replaces_stored_best() {
        let net = NetworkLoader::new().from_str(EXAMPLE).unwrap();
        let dir = scratch_dir("promote");
        let store = DirectoryStore::open(&dir).unwrap();
        let strong = sample(&net);
        let strong_score = score(&strong, &net).unwrap();
        let weak = Caching::for_network(&net);
        assert!(strong_score > 0);

        assert_eq!(
            persist_if_better(&store, "example", &net, &strong, strong_score).unwrap(),
            Promotion::Saved { previous: None }
        );
        assert_eq!(
            persist_if_better(&store, "example", &net, &weak, 0).unwrap(),
            Promotion::Kept {
                stored: strong_score
            }
        );
        assert_eq!(
            persist_if_better(&store, "example", &net, &weak, strong_score).unwrap(),
            Promotion::Kept {
                stored: strong_score
            }
        );
        assert_eq!(store.load("example", &net).unwrap(), Some(strong));
        assert_eq!(stored_score(&store, "example", &net), Some(strong_score));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unusable_stored_entry_is_replaced() {
        let net = NetworkLoader::new().from_str(EXAMPLE).unwrap();
        let store = MemoryStore::new();
        let mut overfull = Caching::for_network(&net);
        overfull.insert(CacheIdentifier::new(0), VideoIdentifier::new(4));
        store.save("example", &overfull).unwrap();
        assert_eq!(stored_score(&store, "example", &net), None);

        let empty = Caching::for_network(&net);
        assert_eq!(
            persist_if_better(&store, "example", &net, &empty, 0).unwrap(),
            Promotion::Saved { previous: None }
        );
        assert_eq!(store.get("example"), Some(empty));
    }
}
