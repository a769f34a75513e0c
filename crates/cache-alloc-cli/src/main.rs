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

use cache_alloc_model::prelude::{
    Caching, CachingLoader, CachingLoaderError, CachingValidationError, Network, NetworkLoader,
    NetworkLoaderError,
};
use cache_alloc_solver::prelude::*;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(name = "cache-alloc", version, about = "Video cache placement solver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve every configured instance once and write `<name>.out` files.
    /// Results that beat the stored best also replace `best/<name>.out`.
    Solve(RunArgs),
    /// Run rounds and keep the best caching of every instance in `best/`.
    Checkpoint(RunArgs),
    /// Score an existing solution file.
    Score {
        /// Instance file (`.in`).
        #[arg(long)]
        instance: PathBuf,
        /// Solution file (`.out`).
        #[arg(long)]
        caching: PathBuf,
    },
    /// Print the default batch configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// JSON batch configuration. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// Solve instances concurrently with this many workers (0 = all cores).
    #[arg(long, conflicts_with = "sequential")]
    workers: Option<usize>,
    #[arg(long)]
    sequential: bool,
    /// Wall-clock limit for the whole run, in seconds.
    #[arg(long)]
    time_limit: Option<u64>,
    /// Restrict the run to these instance names.
    #[arg(long = "source")]
    sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BatchConfig {
    input_dir: PathBuf,
    /// Instance names; `<input_dir>/<name>.in` is loaded for each.
    sources: Vec<String>,
    output_dir: PathBuf,
    strategy: StrategyConfig,
    policy: ExecutionPolicy,
    seed: u64,
    checkpoint: CheckpointConfig,
    time_limit_secs: Option<u64>,
    /// Ignore requests with a zero count instead of rejecting the instance.
    skip_zero_requests: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/input"),
            sources: [
                "example",
                "kittens",
                "me_at_the_zoo",
                "trending_today",
                "videos_worth_spreading",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            output_dir: PathBuf::from("data/output"),
            strategy: StrategyConfig::default(),
            policy: ExecutionPolicy::default(),
            seed: 0,
            checkpoint: CheckpointConfig::default(),
            time_limit_secs: None,
            skip_zero_requests: false,
        }
    }
}

impl BatchConfig {
    fn load(path: &Path) -> Result<Self, CliError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    fn apply(mut self, args: &RunArgs) -> Self {
        if let Some(seed) = args.seed {
            self.seed = seed;
        }
        if let Some(max_workers) = args.workers {
            self.policy = ExecutionPolicy::Concurrent { max_workers };
        }
        if args.sequential {
            self.policy = ExecutionPolicy::Sequential;
        }
        if let Some(secs) = args.time_limit {
            self.time_limit_secs = Some(secs);
        }
        if !args.sources.is_empty() {
            self.sources = args.sources.clone();
        }
        self
    }

    fn resolve(args: &RunArgs) -> Result<Self, CliError> {
        let base = match &args.config {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        Ok(base.apply(args))
    }

    /// Best-known cachings, shared by `solve` and `checkpoint`.
    fn best_dir(&self) -> PathBuf {
        self.output_dir.join("best")
    }

    fn loader(&self) -> NetworkLoader {
        NetworkLoader::new().skip_zero_requests(self.skip_zero_requests)
    }

    fn runner(&self, stop: StopToken) -> BatchRunner {
        BatchRunner::new(self.strategy)
            .with_policy(self.policy)
            .with_seed(self.seed)
            .with_stop_token(stop)
    }

    fn watchdog(&self, stop: &StopToken) -> Option<Watchdog> {
        self.time_limit_secs
            .map(|secs| Watchdog::arm(stop.clone(), Duration::from_secs(secs)))
    }
}

#[derive(Debug)]
enum CliError {
    Io(std::io::Error),
    Config(serde_json::Error),
    Configuration(ConfigurationError),
    Load(NetworkLoaderError),
    Caching(CachingLoaderError),
    Invalid(CachingValidationError),
    Score(ScoreError),
    Store(StoreError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Config(e) => write!(f, "Invalid batch configuration: {}", e),
            CliError::Configuration(e) => write!(f, "{}", e),
            CliError::Load(e) => write!(f, "{}", e),
            CliError::Caching(e) => write!(f, "{}", e),
            CliError::Invalid(e) => write!(f, "Invalid caching: {}", e),
            CliError::Score(e) => write!(f, "{}", e),
            CliError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Config(e)
    }
}

impl From<ConfigurationError> for CliError {
    fn from(e: ConfigurationError) -> Self {
        CliError::Configuration(e)
    }
}

impl From<NetworkLoaderError> for CliError {
    fn from(e: NetworkLoaderError) -> Self {
        CliError::Load(e)
    }
}

impl From<CachingLoaderError> for CliError {
    fn from(e: CachingLoaderError) -> Self {
        CliError::Caching(e)
    }
}

impl From<CachingValidationError> for CliError {
    fn from(e: CachingValidationError) -> Self {
        CliError::Invalid(e)
    }
}

impl From<ScoreError> for CliError {
    fn from(e: ScoreError) -> Self {
        CliError::Score(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();
}

#[derive(Serialize)]
struct RunRecord {
    iteration: usize,
    instance: String,
    strategy: String,
    start_ts: DateTime<Utc>,
    end_ts: DateTime<Utc>,
    runtime_ms: Option<u128>,
    score: Option<Score>,
    latency_saved: Option<u128>,
    error: Option<String>,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)?;
    tracing::info!(path = %path.display(), "wrote {}", path.display());
    Ok(())
}

/// Writes the run output for `name` and promotes it to `bests` when it beats
/// the stored best.
fn persist_solution(
    runs: &dyn CheckpointStore,
    bests: &dyn CheckpointStore,
    name: &str,
    network: &Network,
    caching: &Caching,
    score: Score,
) -> Result<Promotion, StoreError> {
    runs.save(name, caching)?;
    persist_if_better(bests, name, network, caching, score)
}

/// Returns whether every instance was solved and persisted.
fn solve(config: &BatchConfig) -> Result<bool, CliError> {
    let stop = StopToken::new();
    let _watchdog = config.watchdog(&stop);
    let runs = DirectoryStore::open(&config.output_dir)?;
    let bests = DirectoryStore::open(config.best_dir())?;

    let start_ts = Utc::now();
    let (instances, failed) = load_instances(&config.input_dir, &config.sources, &config.loader());
    let report = config
        .runner(stop)
        .run_loaded(&instances, failed, &config.sources)?;
    let end_ts = Utc::now();

    let mut records = Vec::with_capacity(report.outcomes().len());
    let mut complete = true;
    for (i, outcome) in report.outcomes().iter().enumerate() {
        let mut record = RunRecord {
            iteration: i + 1,
            instance: outcome.name().to_owned(),
            strategy: config.strategy.name().to_owned(),
            start_ts,
            end_ts,
            runtime_ms: None,
            score: None,
            latency_saved: None,
            error: None,
        };
        match outcome.result() {
            Ok(solved) => {
                record.runtime_ms = Some(solved.elapsed().as_millis());
                record.score = Some(solved.score());
                record.latency_saved = Some(solved.breakdown().latency_saved());
                let network = instances
                    .iter()
                    .find(|inst| inst.name() == outcome.name())
                    .map(Instance::network);
                if let Some(network) = network {
                    let persisted = persist_solution(
                        &runs,
                        &bests,
                        outcome.name(),
                        network,
                        solved.caching(),
                        solved.score(),
                    );
                    if let Err(e) = persisted {
                        complete = false;
                        tracing::warn!(instance = outcome.name(), error = %e, "failed to persist solution");
                        record.error = Some(e.to_string());
                    }
                }
            }
            Err(e) => {
                complete = false;
                tracing::warn!(instance = outcome.name(), kind = e.kind(), "{}", e);
                record.error = Some(e.to_string());
            }
        }
        records.push(record);
    }

    tracing::info!("{}", report);
    write_json(&config.output_dir.join("run_records.json"), &records)?;
    Ok(complete)
}

fn checkpoint(config: &BatchConfig) -> Result<bool, CliError> {
    let stop = StopToken::new();
    let _watchdog = config.watchdog(&stop);
    let store = DirectoryStore::open(config.best_dir())?;

    let (instances, failed) = load_instances(&config.input_dir, &config.sources, &config.loader());
    let report = CheckpointRunner::new(config.runner(stop), config.checkpoint)
        .run(&instances, &store)?;

    for entry in &report.bests {
        match entry.score {
            Some(s) => tracing::info!(instance = %entry.name, score = s, "best"),
            None => tracing::warn!(instance = %entry.name, "no valid caching yet"),
        }
    }
    tracing::info!("{}", report);
    write_json(&config.output_dir.join("checkpoint_report.json"), &report)?;
    Ok(failed.is_empty() && report.store_errors == 0)
}

fn score_file(instance: &Path, caching: &Path) -> Result<(), CliError> {
    let network = NetworkLoader::new().from_path(instance)?;
    let caching = CachingLoader::for_network(&network).from_path(caching)?;
    caching.check(&network)?;
    let breakdown = score_breakdown(&caching, &network)?;
    tracing::info!(%network, %caching, "scored");
    println!("{}", breakdown);
    Ok(())
}

fn main() -> ExitCode {
    enable_tracing();
    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Solve(args) => BatchConfig::resolve(args).and_then(|c| solve(&c)),
        Command::Checkpoint(args) => BatchConfig::resolve(args).and_then(|c| checkpoint(&c)),
        Command::Score { instance, caching } => score_file(instance, caching).map(|_| true),
        Command::DefaultConfig => serde_json::to_string_pretty(&BatchConfig::default())
            .map(|s| {
                println!("{}", s);
                true
            })
            .map_err(CliError::from),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_json_values() {
        let cfg: BatchConfig = serde_json::from_str(
            r#"{
                "input_dir": "in",
                "sources": ["example"],
                "strategy": {"kind": "monte_carlo", "max_iterations": 10},
                "policy": {"mode": "concurrent", "max_workers": 4},
                "seed": 1,
                "checkpoint": {"max_rounds": 3, "target_total": 900},
                "time_limit_secs": 60
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.checkpoint.max_rounds, 3);
        assert_eq!(cfg.output_dir, PathBuf::from("data/output"));

        let args = RunArgs {
            config: None,
            seed: Some(42),
            workers: None,
            sequential: true,
            time_limit: Some(5),
            sources: vec![],
        };
        let cfg = cfg.apply(&args);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.policy, ExecutionPolicy::Sequential);
        assert_eq!(cfg.time_limit_secs, Some(5));
        assert_eq!(cfg.sources, vec!["example".to_string()]);
    }

    #[test]
    fn test_unknown_config_field_is_rejected() {
        assert!(serde_json::from_str::<BatchConfig>(r#"{"threads": 3}"#).is_err());
    }

    #[test]
    fn test_arguments_parse() {
        let cli = Cli::try_parse_from([
            "cache-alloc",
            "solve",
            "--seed",
            "7",
            "--workers",
            "0",
            "--source",
            "kittens",
            "--source",
            "example",
        ])
        .unwrap();
        match cli.command {
            Command::Solve(args) => {
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.workers, Some(0));
                assert_eq!(args.sources, ["kittens", "example"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(
            Cli::try_parse_from(["cache-alloc", "solve", "--workers", "2", "--sequential"])
                .is_err()
        );
    }

    #[test]
    fn test_bests_live_apart_from_run_outputs() {
        let cfg = BatchConfig::default();
        assert_eq!(cfg.best_dir(), PathBuf::from("data/output/best"));
        assert_ne!(cfg.best_dir(), cfg.output_dir);
    }

    #[test]
    fn test_weaker_solve_keeps_checkpoint_best() {
        use cache_alloc_model::prelude::{CacheIdentifier, VideoIdentifier};

        let network = NetworkLoader::new()
            .from_str(
                "5 2 4 3 100\n50 50 80 30 110\n1000 3\n0 100\n2 200\n1 300\n500 0\n\
                 3 0 1500\n0 1 1000\n4 0 500\n1 0 1000\n",
            )
            .unwrap();
        let mut strong = Caching::for_network(&network);
        strong.insert(CacheIdentifier::new(0), VideoIdentifier::new(2));
        strong.insert(CacheIdentifier::new(1), VideoIdentifier::new(1));
        strong.insert(CacheIdentifier::new(1), VideoIdentifier::new(3));
        let strong_score = score(&strong, &network).unwrap();
        let weak = Caching::for_network(&network);

        let runs = MemoryStore::new();
        let bests = MemoryStore::new();
        bests.save("example", &strong).unwrap();

        let promotion =
            persist_solution(&runs, &bests, "example", &network, &weak, 0).unwrap();
        assert_eq!(
            promotion,
            Promotion::Kept {
                stored: strong_score
            }
        );
        assert_eq!(runs.get("example"), Some(weak));
        assert_eq!(bests.get("example"), Some(strong.clone()));

        let promotion =
            persist_solution(&runs, &bests, "fresh", &network, &strong, strong_score).unwrap();
        assert_eq!(promotion, Promotion::Saved { previous: None });
        assert_eq!(bests.get("fresh"), Some(strong));
    }
}
