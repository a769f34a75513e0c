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
    batch::{
        err::BatchError,
        runner::{BatchReport, BatchRunner, Instance, derive_seed},
        stats::RoundStatistics,
        store::{CheckpointStore, stored_score},
    },
    eval::score::Score,
    strategy::err::ConfigurationError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckpointConfig {
    pub max_rounds: u64,
    /// Stop once the persisted bests add up to at least this much.
    pub target_total: Option<u64>,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            target_total: None,
        }
    }
}

impl CheckpointConfig {
    #[inline]
    pub fn with_max_rounds(mut self, rounds: u64) -> Self {
        self.max_rounds = rounds;
        self
    }

    #[inline]
    pub fn with_target_total(mut self, target: u64) -> Self {
        self.target_total = Some(target);
        self
    }
}

/// Best persisted result of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestEntry {
    pub name: String,
    pub score: Option<Score>,
    /// How many rounds replaced the persisted best.
    pub improvements: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointReport {
    pub bests: Vec<BestEntry>,
    pub rounds: u64,
    pub round_totals: Vec<u64>,
    pub statistics: Option<RoundStatistics>,
    pub store_errors: u64,
    pub target_reached: bool,
}

impl CheckpointReport {
    #[inline]
    pub fn best_total(&self) -> u64 {
        best_total(&self.bests)
    }

    #[inline]
    pub fn improvements(&self) -> u64 {
        self.bests.iter().map(|b| b.improvements).sum()
    }
}

impl std::fmt::Display for CheckpointReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CheckpointReport: rounds={} best_total={} improvements={}",
            self.rounds,
            self.best_total(),
            self.improvements()
        )?;
        if let Some(s) = &self.statistics {
            write!(f, " [{}]", s)?;
        }
        Ok(())
    }
}

#[inline]
fn best_total(bests: &[BestEntry]) -> u64 {
    bests.iter().filter_map(|b| b.score).sum()
}

#[inline]
fn interrupted(report: &BatchReport) -> bool {
    report
        .failures()
        .any(|(_, e)| matches!(e, BatchError::Cancelled))
}

/// Repeats a batch and keeps the best caching of every instance in a store.
///
/// A stored caching is replaced only by a strictly higher score, so the
/// persisted bests never get worse across rounds or restarts.
#[derive(Debug, Clone)]
pub struct CheckpointRunner {
    runner: BatchRunner,
    config: CheckpointConfig,
}

impl CheckpointRunner {
    #[inline]
    pub fn new(runner: BatchRunner, config: CheckpointConfig) -> Self {
        Self { runner, config }
    }

    #[inline]
    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    fn target_reached(&self, bests: &[BestEntry]) -> bool {
        self.config
            .target_total
            .is_some_and(|t| best_total(bests) >= t)
    }

    #[tracing::instrument(level = "info", name = "Checkpoint", skip_all, fields(max_rounds = self.config.max_rounds))]
    pub fn run(
        &self,
        instances: &[Instance],
        store: &dyn CheckpointStore,
    ) -> Result<CheckpointReport, ConfigurationError> {
        self.runner.strategy().validate()?;

        let mut bests: Vec<BestEntry> = instances
            .iter()
            .map(|inst| BestEntry {
                name: inst.name().to_owned(),
                score: stored_score(store, inst.name(), inst.network()),
                improvements: 0,
            })
            .collect();
        tracing::info!(
            instances = instances.len(),
            persisted_total = best_total(&bests),
            "checkpoint run started"
        );

        let mut round_totals = Vec::new();
        let mut store_errors = 0_u64;
        let mut rounds = 0_u64;

        while rounds < self.config.max_rounds {
            if self.target_reached(&bests) || self.runner.stop_token().is_set() {
                break;
            }

            let report = self
                .runner
                .clone()
                .with_seed(derive_seed(self.runner.seed(), rounds))
                .run(instances)?;

            for (outcome, best) in report.outcomes().iter().zip(bests.iter_mut()) {
                let solved = match outcome.result() {
                    Ok(s) => s,
                    Err(BatchError::Cancelled) => continue,
                    Err(e) => {
                        tracing::warn!(instance = outcome.name(), error = %e, "round failed for instance");
                        continue;
                    }
                };
                if best.score.is_some_and(|b| solved.score() <= b) {
                    continue;
                }
                match store.save(outcome.name(), solved.caching()) {
                    Ok(()) => {
                        tracing::info!(
                            instance = outcome.name(),
                            previous = ?best.score,
                            score = solved.score(),
                            round = rounds,
                            "new best persisted"
                        );
                        best.score = Some(solved.score());
                        best.improvements += 1;
                    }
                    Err(e) => {
                        store_errors += 1;
                        tracing::warn!(instance = outcome.name(), error = %e, "failed to persist best");
                    }
                }
            }

            rounds += 1;
            if interrupted(&report) {
                tracing::info!(round = rounds, "round interrupted by stop request");
                break;
            }
            round_totals.push(report.total_score());
            tracing::info!(
                round = rounds,
                round_total = report.total_score(),
                best_total = best_total(&bests),
                "round finished"
            );
        }

        let statistics = RoundStatistics::from_totals(&round_totals);
        if let Some(s) = &statistics {
            tracing::info!(statistics = %s, "round statistics");
        }
        let target_reached = self.target_reached(&bests);
        Ok(CheckpointReport {
            bests,
            rounds,
            round_totals,
            statistics,
            store_errors,
            target_reached,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        batch::store::{DirectoryStore, MemoryStore},
        eval::score::score,
        monitor::stop::StopToken,
        strategy::{config::StrategyConfig, monte_carlo::MonteCarloConfig, random::RandomConfig},
    };
    use cache_alloc_model::prelude::{
        CacheIdentifier, Caching, Network, NetworkBuilder, NetworkLoader, VideoIdentifier,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    const EXAMPLE: &str = "5 2 4 3 100\n50 50 80 30 110\n1000 3\n0 100\n2 200\n1 300\n500 0\n\
                           3 0 1500\n0 1 1000\n4 0 500\n1 0 1000\n";

    fn single_video() -> Network {
        let mut b = NetworkBuilder::new(1, 100);
        let v = b.add_video(10);
        let e = b.add_endpoint(1000);
        b.add_cache_latency(e, CacheIdentifier::new(0), 0);
        b.add_request(v, e, 10);
        b.build().unwrap()
    }

    fn instances() -> Vec<Instance> {
        vec![
            Instance::new("example", NetworkLoader::new().from_str(EXAMPLE).unwrap()),
            Instance::new("single", single_video()),
        ]
    }

    fn runner() -> BatchRunner {
        BatchRunner::new(StrategyConfig::MonteCarlo(
            MonteCarloConfig::default().with_max_iterations(20),
        ))
        .with_seed(3)
    }

    #[test]
    fn test_rounds_persist_and_never_regress() {
        let store = MemoryStore::new();
        let nets = instances();
        let cp = CheckpointRunner::new(runner(), CheckpointConfig::default().with_max_rounds(4));
        let report = cp.run(&nets, &store).unwrap();

        assert_eq!(report.rounds, 4);
        assert_eq!(report.round_totals.len(), 4);
        assert_eq!(report.statistics.map(|s| s.rounds), Some(4));
        assert!(report.round_totals.iter().all(|&t| t <= report.best_total()));

        for (entry, inst) in report.bests.iter().zip(&nets) {
            let saved = store.get(&entry.name).unwrap();
            assert_eq!(Some(score(&saved, inst.network()).unwrap()), entry.score);
            assert!(entry.improvements >= 1);
        }
        assert_eq!(report.bests[1].score, Some(1000));

        let again = cp.run(&nets, &store).unwrap();
        for (a, b) in report.bests.iter().zip(&again.bests) {
            assert!(b.score >= a.score);
        }
    }

    #[test]
    fn test_equal_score_does_not_replace_persisted_best() {
        let store = MemoryStore::new();
        let nets = vec![Instance::new("single", single_video())];
        let mut optimal = Caching::for_network(nets[0].network());
        optimal.insert(CacheIdentifier::new(0), VideoIdentifier::new(0));
        store.save("single", &optimal).unwrap();

        let cp = CheckpointRunner::new(runner(), CheckpointConfig::default().with_max_rounds(3));
        let report = cp.run(&nets, &store).unwrap();
        assert_eq!(report.bests[0].score, Some(1000));
        assert_eq!(report.bests[0].improvements, 0);
        assert_eq!(report.rounds, 3);
    }

    #[test]
    fn test_target_total_stops_early() {
        let store = MemoryStore::new();
        let nets = vec![Instance::new("single", single_video())];
        let cp = CheckpointRunner::new(
            runner(),
            CheckpointConfig::default()
                .with_max_rounds(50)
                .with_target_total(1000),
        );

        let first = cp.run(&nets, &store).unwrap();
        assert_eq!(first.rounds, 1);
        assert!(first.target_reached);

        let second = cp.run(&nets, &store).unwrap();
        assert_eq!(second.rounds, 0);
        assert!(second.target_reached);
        assert_eq!(second.statistics, None);
    }

    #[test]
    fn test_stop_token_prevents_rounds() {
        let stop = StopToken::new();
        stop.request_stop();
        let cp = CheckpointRunner::new(
            runner().with_stop_token(stop),
            CheckpointConfig::default().with_max_rounds(5),
        );
        let report = cp.run(&instances(), &MemoryStore::new()).unwrap();
        assert_eq!(report.rounds, 0);
        assert!(report.bests.iter().all(|b| b.score.is_none()));
    }

    #[test]
    fn test_directory_store_replaces_corrupt_checkpoint() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let dir = std::env::temp_dir().join(format!(
            "cache-alloc-checkpoint-{}-{}",
            std::process::id(),
            nanos
        ));
        let store = DirectoryStore::open(&dir).unwrap();
        std::fs::write(store.path_for("example"), "garbage\n").unwrap();

        let nets = instances();
        let cp = CheckpointRunner::new(
            BatchRunner::new(StrategyConfig::Random(RandomConfig::default())),
            CheckpointConfig::default().with_max_rounds(2),
        );
        let report = cp.run(&nets, &store).unwrap();
        assert_eq!(report.store_errors, 0);

        let reloaded = store.load("example", nets[0].network()).unwrap().unwrap();
        assert_eq!(
            Some(score(&reloaded, nets[0].network()).unwrap()),
            report.bests[0].score
        );
        std::fs::remove_dir_all(&dir).ok();
    }
}
