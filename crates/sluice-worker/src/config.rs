//! Pool configuration.
//!
//! [`PoolConfig`] is the declarative description of a worker pool: sizing
//! bounds, a queue admission cap and a resizing strategy name. It carries no
//! behaviour. [`PoolConfig::build`] validates it and resolves the strategy
//! into a [`PoolSettings`] bundle that a pool engine can consume.

use serde::{Deserialize, Serialize};

use crate::error::{WorkerError, WorkerResult};
use crate::strategy::{resolve_strategy, Resizer, ResizingPolicy, ResizingStrategy};

/// Default pool name.
pub const DEFAULT_POOL_NAME: &str = "default";

/// Default metrics prefix.
pub const DEFAULT_PROMETHEUS_PREFIX: &str = "default";

/// Default lower worker bound.
pub const DEFAULT_MIN_WORKERS: usize = 4;

/// Default upper worker bound.
pub const DEFAULT_MAX_WORKERS: usize = 32;

/// Default resizing strategy name.
pub const DEFAULT_RESIZING_STRATEGY: &str = "balanced";

/// Default queue admission cap.
pub const DEFAULT_MAX_QUEUED_JOBS: usize = 100;

/// Worker pool configuration.
///
/// Missing fields take their defaults when deserialised.
///
/// # Example
///
/// ```rust
/// use sluice_worker::PoolConfig;
///
/// let config = PoolConfig::default()
///     .with_name("ingest")
///     .with_workers(2, 8)
///     .with_strategy("eager");
///
/// let settings = config.build().unwrap();
/// assert_eq!(settings.max_workers, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Pool name.
    pub name: String,
    /// Prefix for the pool's metric names.
    pub prometheus_prefix: String,
    /// Workers the resizer never shrinks below.
    pub min_workers: usize,
    /// Workers that may be active at the same time.
    pub max_workers: usize,
    /// Name of the resizing strategy: `eager`, `lazy` or `balanced`.
    pub resizing_strategy: String,
    /// Jobs that may wait before submissions are rejected.
    pub max_queued_jobs: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_POOL_NAME.to_string(),
            prometheus_prefix: DEFAULT_PROMETHEUS_PREFIX.to_string(),
            min_workers: DEFAULT_MIN_WORKERS,
            max_workers: DEFAULT_MAX_WORKERS,
            resizing_strategy: DEFAULT_RESIZING_STRATEGY.to_string(),
            max_queued_jobs: DEFAULT_MAX_QUEUED_JOBS,
        }
    }
}

/// Returns the default pool configuration.
#[must_use]
pub fn default_pool_config() -> PoolConfig {
    PoolConfig::default()
}

impl PoolConfig {
    /// Set the pool name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the metrics prefix.
    pub fn with_prometheus_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prometheus_prefix = prefix.into();
        self
    }

    /// Set both worker bounds.
    pub fn with_workers(mut self, min: usize, max: usize) -> Self {
        self.min_workers = min;
        self.max_workers = max;
        self
    }

    /// Set the resizing strategy name.
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.resizing_strategy = strategy.into();
        self
    }

    /// Set the queue admission cap.
    pub fn with_max_queued_jobs(mut self, max: usize) -> Self {
        self.max_queued_jobs = max;
        self
    }

    /// Checks the bounds and that the strategy name resolves.
    pub fn validate(&self) -> WorkerResult<()> {
        self.check_bounds()?;
        self.resizing_strategy
            .parse::<ResizingStrategy>()
            .map(|_| ())
    }

    fn check_bounds(&self) -> WorkerResult<()> {
        if self.min_workers > self.max_workers {
            return Err(WorkerError::invalid_config(
                "min_workers",
                format!(
                    "{} exceeds max_workers {}",
                    self.min_workers, self.max_workers
                ),
            ));
        }
        Ok(())
    }

    /// Validates the configuration and resolves its strategy.
    pub fn build(&self) -> WorkerResult<PoolSettings> {
        self.check_bounds()?;
        let resizer = resolve_strategy(&self.resizing_strategy)?;

        tracing::debug!(
            pool = %self.name,
            min_workers = self.min_workers,
            max_workers = self.max_workers,
            max_queued_jobs = self.max_queued_jobs,
            strategy = %resizer.strategy(),
            "Built pool settings"
        );

        Ok(PoolSettings {
            name: self.name.clone(),
            prometheus_prefix: self.prometheus_prefix.clone(),
            min_workers: self.min_workers,
            max_workers: self.max_workers,
            max_queued_jobs: self.max_queued_jobs,
            resizer,
        })
    }
}

/// A validated pool configuration with its strategy resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Pool name.
    pub name: String,
    /// Prefix for the pool's metric names.
    pub prometheus_prefix: String,
    /// Lower worker bound.
    pub min_workers: usize,
    /// Upper worker bound.
    pub max_workers: usize,
    /// Queue admission cap.
    pub max_queued_jobs: usize,
    /// Resolved resizing policy.
    pub resizer: ResizingPolicy,
}

impl PoolSettings {
    /// Asks the policy whether to grow from `running` workers, within this
    /// pool's bounds.
    pub fn should_grow(&self, running: usize) -> bool {
        self.resizer
            .should_grow(running, self.min_workers, self.max_workers)
    }
}
