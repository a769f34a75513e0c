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

pub mod batch;
pub mod eval;
pub mod monitor;
pub mod strategy;

pub mod prelude {
    pub use crate::batch::{
        checkpoint::{BestEntry, CheckpointConfig, CheckpointReport, CheckpointRunner},
        err::{BatchError, StoreError},
        runner::{
            BatchReport, BatchRunner, ExecutionPolicy, Instance, InstanceOutcome, Solved,
            derive_seed, load_instances,
        },
        stats::RoundStatistics,
        store::{
            CheckpointStore, DirectoryStore, MemoryStore, Promotion, persist_if_better,
            stored_score,
        },
    };
    pub use crate::eval::{
        gain::GainTable,
        score::{MAX_SCORE, Score, ScoreBreakdown, ScoreError, best_latency, score, score_breakdown},
    };
    pub use crate::monitor::{
        observer::{BestTrace, SearchObserver},
        stop::{StopToken, Watchdog},
    };
    pub use crate::strategy::{
        FillStrategy, SearchContext,
        brute_force::{BruteForce, BruteForceConfig},
        config::StrategyConfig,
        err::{ConfigurationError, StrategyError},
        evolution::{Evolution, EvolutionConfig},
        monte_carlo::{MonteCarlo, MonteCarloConfig},
        random::{RandomConfig, RandomFill, random_fill},
        repair::{RepairOrder, repair},
    };
}
