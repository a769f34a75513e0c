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
    batch::err::BatchError,
    eval::score::{Score, ScoreBreakdown, score_breakdown},
    monitor::{observer::SearchObserver, stop::StopToken},
    strategy::{
        FillStrategy, SearchContext,
        config::StrategyConfig,
        err::{ConfigurationError, StrategyError},
    },
};
use cache_alloc_model::prelude::{Caching, Network, NetworkLoader};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::{
    panic::AssertUnwindSafe,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

/// How the instances of a batch are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    /// `max_workers == 0` uses the available parallelism.
    Concurrent { max_workers: usize },
}

impl ExecutionPolicy {
    /// Number of threads used for `jobs` instances.
    pub fn workers_for(&self, jobs: usize) -> usize {
        match *self {
            ExecutionPolicy::Sequential => 1,
            ExecutionPolicy::Concurrent { max_workers } => {
                let max = if max_workers == 0 {
                    std::thread::available_parallelism()
                        .map(|n| n.get())
                        .unwrap_or(1)
                } else {
                    max_workers
                };
                max.min(jobs).max(1)
            }
        }
    }
}

impl std::fmt::Display for ExecutionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionPolicy::Sequential => write!(f, "sequential"),
            ExecutionPolicy::Concurrent { max_workers: 0 } => write!(f, "concurrent(auto)"),
            ExecutionPolicy::Concurrent { max_workers } => {
                write!(f, "concurrent({})", max_workers)
            }
        }
    }
}

/// Seed of the `stream`-th independent generator derived from `base`.
#[inline]
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    base ^ stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// A named, loaded network.
///
/// The random stream of an instance defaults to its position in the batch.
/// Instances loaded from a list of names keep their position in that list, so
/// a sibling that fails to load does not shift anyone's seed.
#[derive(Debug, Clone)]
pub struct Instance {
    name: String,
    network: Network,
    stream: Option<u64>,
}

impl Instance {
    #[inline]
    pub fn new(name: impl Into<String>, network: Network) -> Self {
        Self {
            name: name.into(),
            network,
            stream: None,
        }
    }

    #[inline]
    pub fn with_stream(mut self, stream: u64) -> Self {
        self.stream = Some(stream);
        self
    }

    #[inline]
    pub fn stream(&self) -> Option<u64> {
        self.stream
    }

    /// Reads `<dir>/<name>.in`.
    pub fn load(dir: &Path, name: &str, loader: &NetworkLoader) -> Result<Self, BatchError> {
        let network = loader.from_path(dir.join(format!("{}.in", name)))?;
        Ok(Self::new(name, network))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn network(&self) -> &Network {
        &self.network
    }
}

/// Loads every named instance, keeping the failures as outcomes.
pub fn load_instances(
    dir: &Path,
    names: &[String],
    loader: &NetworkLoader,
) -> (Vec<Instance>, Vec<InstanceOutcome>) {
    let mut loaded = Vec::with_capacity(names.len());
    let mut failed = Vec::new();
    for (position, name) in names.iter().enumerate() {
        match Instance::load(dir, name, loader) {
            Ok(instance) => {
                let instance = instance.with_stream(position as u64);
                tracing::debug!(instance = %name, network = %instance.network(), "instance loaded");
                loaded.push(instance);
            }
            Err(e) => {
                tracing::warn!(instance = %name, error = %e, "failed to load instance");
                failed.push(InstanceOutcome::new(name.clone(), Err(e)));
            }
        }
    }
    (loaded, failed)
}

/// A successfully solved instance.
#[derive(Debug, Clone)]
pub struct Solved {
    caching: Caching,
    breakdown: ScoreBreakdown,
    strategy: String,
    elapsed: Duration,
}

impl Solved {
    #[inline]
    pub fn caching(&self) -> &Caching {
        &self.caching
    }

    #[inline]
    pub fn into_caching(self) -> Caching {
        self.caching
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.breakdown.score()
    }

    #[inline]
    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }

    #[inline]
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[derive(Debug)]
pub struct InstanceOutcome {
    name: String,
    result: Result<Solved, BatchError>,
}

impl InstanceOutcome {
    #[inline]
    pub fn new(name: impl Into<String>, result: Result<Solved, BatchError>) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn result(&self) -> &Result<Solved, BatchError> {
        &self.result
    }

    #[inline]
    pub fn score(&self) -> Option<Score> {
        self.result.as_ref().ok().map(Solved::score)
    }

    #[inline]
    pub fn into_parts(self) -> (String, Result<Solved, BatchError>) {
        (self.name, self.result)
    }
}

/// Outcomes of one batch in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<InstanceOutcome>,
    elapsed: Duration,
}

impl BatchReport {
    #[inline]
    pub fn outcomes(&self) -> &[InstanceOutcome] {
        &self.outcomes
    }

    #[inline]
    pub fn into_outcomes(self) -> Vec<InstanceOutcome> {
        self.outcomes
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn solved(&self) -> impl Iterator<Item = (&str, &Solved)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|s| (o.name(), s)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &BatchError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name(), e)))
    }

    /// Sum of the scores of the solved instances.
    pub fn total_score(&self) -> u64 {
        self.solved().map(|(_, s)| s.score()).sum()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BatchReport: instances={} solved={} total_score={} elapsed={:.2?}",
            self.outcomes.len(),
            self.solved().count(),
            self.total_score(),
            self.elapsed
        )
    }
}

type BoxedStrategy = Box<dyn FillStrategy<ChaCha8Rng> + Send>;

/// Logs improvements of one instance's search.
struct InstanceLog<'a> {
    instance: &'a str,
}

impl SearchObserver for InstanceLog<'_> {
    fn name(&self) -> &str {
        "InstanceLog"
    }

    fn on_new_best(&mut self, iteration: u64, score: Score) {
        tracing::trace!(instance = self.instance, iteration, score, "new best");
    }
}

/// Runs one strategy over a set of instances.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    strategy: StrategyConfig,
    policy: ExecutionPolicy,
    seed: u64,
    stop: StopToken,
}

impl BatchRunner {
    #[inline]
    pub fn new(strategy: StrategyConfig) -> Self {
        Self {
            strategy,
            policy: ExecutionPolicy::default(),
            seed: 0,
            stop: StopToken::new(),
        }
    }

    #[inline]
    pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[inline]
    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = stop;
        self
    }

    #[inline]
    pub fn strategy(&self) -> &StrategyConfig {
        &self.strategy
    }

    #[inline]
    pub fn policy(&self) -> ExecutionPolicy {
        self.policy
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn stop_token(&self) -> &StopToken {
        &self.stop
    }

    /// Solves every instance. A failing instance is reported in its slot and
    /// never aborts the others; only an invalid strategy configuration fails
    /// the whole batch.
    #[tracing::instrument(level = "info", name = "Batch", skip_all, fields(strategy = %self.strategy, policy = %self.policy))]
    pub fn run(&self, instances: &[Instance]) -> Result<BatchReport, ConfigurationError> {
        self.strategy.validate()?;
        Ok(self.run_with(instances, |_| self.strategy.build::<ChaCha8Rng>()))
    }

    /// Runs `instances` with strategies produced by `factory`, one per instance.
    pub(crate) fn run_with<F>(&self, instances: &[Instance], factory: F) -> BatchReport
    where
        F: Fn(&Instance) -> Result<BoxedStrategy, ConfigurationError> + Sync,
    {
        let started = Instant::now();
        tracing::info!(instances = instances.len(), seed = self.seed, "batch started");

        let outcomes = match self.policy {
            ExecutionPolicy::Sequential => instances
                .iter()
                .enumerate()
                .map(|(i, inst)| {
                    InstanceOutcome::new(inst.name(), self.solve_isolated(i, inst, &factory))
                })
                .collect(),
            ExecutionPolicy::Concurrent { .. } => self.run_concurrent(instances, &factory),
        };

        let report = BatchReport {
            outcomes,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            solved = report.solved().count(),
            failed = report.failures().count(),
            total_score = report.total_score(),
            "batch finished"
        );
        report
    }

    /// Loads `<dir>/<name>.in` for every name and solves what loaded.
    /// Outcomes follow the order of `names`.
    pub fn run_sources(
        &self,
        dir: &Path,
        names: &[String],
        loader: &NetworkLoader,
    ) -> Result<BatchReport, ConfigurationError> {
        self.strategy.validate()?;
        let (instances, failed) = load_instances(dir, names, loader);
        self.run_loaded(&instances, failed, names)
    }

    /// Solves what [`load_instances`] loaded and merges its load failures back
    /// in. Outcomes follow the order of `names`.
    pub fn run_loaded(
        &self,
        instances: &[Instance],
        failed: Vec<InstanceOutcome>,
        names: &[String],
    ) -> Result<BatchReport, ConfigurationError> {
        let mut report = self.run(instances)?;
        report.outcomes.extend(failed);
        report
            .outcomes
            .sort_by_key(|o| names.iter().position(|n| n == o.name()));
        Ok(report)
    }

    fn run_concurrent<F>(&self, instances: &[Instance], factory: &F) -> Vec<InstanceOutcome>
    where
        F: Fn(&Instance) -> Result<BoxedStrategy, ConfigurationError> + Sync,
    {
        let workers = self.policy.workers_for(instances.len());
        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<Result<Solved, BatchError>>>> =
            Mutex::new((0..instances.len()).map(|_| None).collect());

        let (next, slots_ref) = (&next, &slots);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        loop {
                            let i = next.fetch_add(1, Ordering::Relaxed);
                            let Some(inst) = instances.get(i) else {
                                break;
                            };
                            let result = self.solve_isolated(i, inst, factory);
                            slots_ref.lock()[i] = Some(result);
                        }
                    })
                })
                .collect();

            for h in handles {
                if h.join().is_err() {
                    tracing::error!("worker thread terminated abnormally");
                }
            }
        });

        instances
            .iter()
            .zip(slots.into_inner())
            .map(|(inst, slot)| {
                InstanceOutcome::new(
                    inst.name(),
                    slot.unwrap_or(Err(BatchError::WorkerPanicked)),
                )
            })
            .collect()
    }

    /// Solves one instance; a panic inside the strategy becomes
    /// [`BatchError::WorkerPanicked`] for that instance only.
    fn solve_isolated<F>(
        &self,
        index: usize,
        instance: &Instance,
        factory: &F,
    ) -> Result<Solved, BatchError>
    where
        F: Fn(&Instance) -> Result<BoxedStrategy, ConfigurationError>,
    {
        std::panic::catch_unwind(AssertUnwindSafe(|| self.solve(index, instance, factory)))
            .unwrap_or_else(|_| {
                tracing::error!(instance = instance.name(), "strategy panicked");
                Err(BatchError::WorkerPanicked)
            })
    }

    fn solve<F>(
        &self,
        index: usize,
        instance: &Instance,
        factory: &F,
    ) -> Result<Solved, BatchError>
    where
        F: Fn(&Instance) -> Result<BoxedStrategy, ConfigurationError>,
    {
        if self.stop.is_set() {
            tracing::info!(instance = instance.name(), "skipped, stop requested");
            return Err(BatchError::Cancelled);
        }
        let started = Instant::now();
        let network = instance.network();
        let mut strategy = factory(instance).map_err(StrategyError::from)?;
        let stream = instance.stream().unwrap_or(index as u64);
        let rng = ChaCha8Rng::seed_from_u64(derive_seed(self.seed, stream));

        let mut log = InstanceLog {
            instance: instance.name(),
        };
        let caching = {
            let mut ctx = SearchContext::new(network, rng, self.stop.clone(), &mut log);
            strategy.fill(&mut ctx)?
        };
        caching.check(network)?;
        let breakdown = score_breakdown(&caching, network)?;
        let elapsed = started.elapsed();

        tracing::info!(
            instance = instance.name(),
            strategy = strategy.name(),
            score = breakdown.score(),
            latency_saved = %breakdown.latency_saved(),
            elapsed = ?elapsed,
            "instance solved"
        );
        Ok(Solved {
            caching,
            breakdown,
            strategy: strategy.name().to_owned(),
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{
        brute_force::BruteForceConfig, monte_carlo::MonteCarloConfig, random::RandomConfig,
    };
    use cache_alloc_model::prelude::{CacheIdentifier, NetworkBuilder};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    const EXAMPLE: &str = "5 2 4 3 100\n50 50 80 30 110\n1000 3\n0 100\n2 200\n1 300\n500 0\n\
                           3 0 1500\n0 1 1000\n4 0 500\n1 0 1000\n";

    fn example() -> Network {
        NetworkLoader::new().from_str(EXAMPLE).unwrap()
    }

    fn single_video(latency: u64) -> Network {
        let mut b = NetworkBuilder::new(1, 100);
        let v = b.add_video(10);
        let e = b.add_endpoint(1000);
        b.add_cache_latency(e, CacheIdentifier::new(0), latency);
        b.add_request(v, e, 10);
        b.build().unwrap()
    }

    fn instances() -> Vec<Instance> {
        vec![
            Instance::new("example", example()),
            Instance::new("single", single_video(0)),
            Instance::new("half", single_video(500)),
        ]
    }

    fn monte_carlo() -> StrategyConfig {
        StrategyConfig::MonteCarlo(MonteCarloConfig::default().with_max_iterations(40))
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let dir = std::env::temp_dir().join(format!(
            "cache-alloc-runner-{}-{}-{}",
            tag,
            std::process::id(),
            nanos
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_policy_parsing_and_workers() {
        let p: ExecutionPolicy =
            serde_json::from_str(r#"{"mode": "concurrent", "max_workers": 3}"#).unwrap();
        assert_eq!(p, ExecutionPolicy::Concurrent { max_workers: 3 });
        assert_eq!(p.workers_for(10), 3);
        assert_eq!(p.workers_for(2), 2);
        assert_eq!(p.workers_for(0), 1);
        assert_eq!(ExecutionPolicy::Sequential.workers_for(8), 1);
        assert!(ExecutionPolicy::Concurrent { max_workers: 0 }.workers_for(4) >= 1);

        let p: ExecutionPolicy = serde_json::from_str(r#"{"mode": "sequential"}"#).unwrap();
        assert_eq!(p, ExecutionPolicy::Sequential);
    }

    #[test]
    fn test_derive_seed_separates_streams() {
        assert_ne!(derive_seed(7, 0), derive_seed(7, 1));
        assert_ne!(derive_seed(7, 0), 7);
        assert_eq!(derive_seed(7, 3), derive_seed(7, 3));
    }

    #[test]
    fn test_sequential_batch_scores_every_instance() {
        let report = BatchRunner::new(monte_carlo())
            .with_seed(11)
            .run(&instances())
            .unwrap();

        assert!(report.is_complete());
        let names: Vec<_> = report.outcomes().iter().map(|o| o.name()).collect();
        assert_eq!(names, ["example", "single", "half"]);
        assert_eq!(report.outcomes()[1].score(), Some(1000));
        assert_eq!(report.outcomes()[2].score(), Some(500));

        let nets = instances();
        for ((_, solved), inst) in report.solved().zip(&nets) {
            assert!(solved.caching().check(inst.network()).is_ok());
            assert_eq!(solved.strategy(), "MonteCarlo");
        }
        let sum: u64 = report.outcomes().iter().filter_map(|o| o.score()).sum();
        assert_eq!(report.total_score(), sum);
    }

    #[test]
    fn test_concurrent_matches_sequential() {
        let nets = instances();
        let seq = BatchRunner::new(monte_carlo())
            .with_seed(5)
            .run(&nets)
            .unwrap();
        let par = BatchRunner::new(monte_carlo())
            .with_seed(5)
            .with_policy(ExecutionPolicy::Concurrent { max_workers: 2 })
            .run(&nets)
            .unwrap();

        assert_eq!(seq.outcomes().len(), par.outcomes().len());
        for (a, b) in seq.outcomes().iter().zip(par.outcomes()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(
                a.result().as_ref().unwrap().caching(),
                b.result().as_ref().unwrap().caching()
            );
        }
        assert_eq!(seq.total_score(), par.total_score());
    }

    #[test]
    fn test_failing_instance_does_not_abort_batch() {
        let mut b = NetworkBuilder::new(1, 100);
        b.add_video(10);
        let quiet = b.build().unwrap();

        let nets = vec![
            Instance::new("example", example()),
            Instance::new("quiet", quiet),
        ];
        let report = BatchRunner::new(StrategyConfig::Random(RandomConfig::default()))
            .with_policy(ExecutionPolicy::Concurrent { max_workers: 2 })
            .run(&nets)
            .unwrap();

        assert!(report.outcomes()[0].result().is_ok());
        let (name, err) = report.failures().next().unwrap();
        assert_eq!(name, "quiet");
        assert_eq!(err.kind(), "strategy");
        assert!(!report.is_complete());
    }

    #[test]
    fn test_invalid_configuration_fails_whole_batch() {
        let bad = StrategyConfig::BruteForce(BruteForceConfig::default().with_max_videos(99));
        let err = BatchRunner::new(bad).run(&instances()).unwrap_err();
        assert_eq!(err.field(), "max_videos");
    }

    #[test]
    fn test_stop_before_start_cancels_everything() {
        let stop = StopToken::new();
        stop.request_stop();
        let report = BatchRunner::new(monte_carlo())
            .with_stop_token(stop)
            .run(&instances())
            .unwrap();
        assert_eq!(report.failures().count(), 3);
        assert!(report.failures().all(|(_, e)| e.kind() == "cancelled"));
        assert_eq!(report.total_score(), 0);
    }

    #[test]
    fn test_run_sources_reports_load_failures_in_order() {
        let dir = scratch_dir("sources");
        std::fs::write(dir.join("good.in"), EXAMPLE).unwrap();
        std::fs::write(dir.join("bad.in"), "1 2 3\n").unwrap();
        let names: Vec<String> = ["bad", "good", "missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = BatchRunner::new(monte_carlo())
            .run_sources(&dir, &names, &NetworkLoader::new())
            .unwrap();

        let order: Vec<_> = report.outcomes().iter().map(|o| o.name()).collect();
        assert_eq!(order, ["bad", "good", "missing"]);
        assert_eq!(report.outcomes()[0].result().as_ref().unwrap_err().kind(), "load");
        assert!(report.outcomes()[1].result().is_ok());
        assert_eq!(report.outcomes()[2].result().as_ref().unwrap_err().kind(), "load");

        std::fs::remove_dir_all(&dir).ok();
    }

    /// Fails loudly instead of returning a caching.
    struct Explosive;

    impl FillStrategy<ChaCha8Rng> for Explosive {
        fn name(&self) -> &str {
            "Explosive"
        }

        fn fill(
            &mut self,
            _ctx: &mut SearchContext<'_, '_, ChaCha8Rng>,
        ) -> Result<Caching, StrategyError> {
            panic!("strategy blew up");
        }
    }

    #[test]
    fn test_panicking_strategy_only_fails_its_instance() {
        let nets = instances();
        for policy in [
            ExecutionPolicy::Sequential,
            ExecutionPolicy::Concurrent { max_workers: 2 },
        ] {
            let runner = BatchRunner::new(monte_carlo())
                .with_seed(9)
                .with_policy(policy);
            let report = runner.run_with(&nets, |inst| {
                if inst.name() == "single" {
                    Ok(Box::new(Explosive) as BoxedStrategy)
                } else {
                    runner.strategy().build::<ChaCha8Rng>()
                }
            });

            let kinds: Vec<Option<&str>> = report
                .outcomes()
                .iter()
                .map(|o| o.result().as_ref().err().map(BatchError::kind))
                .collect();
            assert_eq!(kinds, [None, Some("worker_panicked"), None], "{}", policy);
            assert_eq!(report.outcomes()[2].score(), Some(500));
        }
    }

    #[test]
    fn test_seed_follows_name_position_when_sibling_fails_to_load() {
        let dir = scratch_dir("streams");
        std::fs::write(dir.join("good.in"), EXAMPLE).unwrap();
        let names: Vec<String> = ["first", "good"].iter().map(|s| s.to_string()).collect();
        let runner = BatchRunner::new(StrategyConfig::Random(
            RandomConfig::default().with_attempts(6),
        ))
        .with_seed(21);

        let (loaded, failed) = load_instances(&dir, &names, &NetworkLoader::new());
        assert_eq!(failed.len(), 1);
        assert_eq!(loaded[0].stream(), Some(1));

        let sibling_missing = runner
            .run_sources(&dir, &names, &NetworkLoader::new())
            .unwrap();
        std::fs::write(dir.join("first.in"), EXAMPLE).unwrap();
        let sibling_loaded = runner
            .run_sources(&dir, &names, &NetworkLoader::new())
            .unwrap();

        assert!(sibling_missing.outcomes()[0].result().is_err());
        assert!(sibling_loaded.outcomes()[0].result().is_ok());
        let a = sibling_missing.outcomes()[1].result().as_ref().unwrap();
        let b = sibling_loaded.outcomes()[1].result().as_ref().unwrap();
        assert_eq!(a.caching(), b.caching());
        assert_eq!(a.score(), b.score());

        let direct = runner
            .run(&[Instance::new("good", example()).with_stream(1)])
            .unwrap();
        assert_eq!(
            direct.outcomes()[0].result().as_ref().unwrap().caching(),
            a.caching()
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
