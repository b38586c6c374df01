//! # Sluice Worker
//!
//! Configuration for a bounded background worker pool.
//!
//! This crate describes a pool; it does not run one. A [`PoolConfig`]
//! declares sizing bounds, a queue cap and a resizing strategy name, and
//! [`PoolConfig::build`] turns it into validated [`PoolSettings`] whose
//! [`ResizingPolicy`] an execution engine consults through the [`Resizer`]
//! trait.
//!
//! ## Example
//!
//! ```rust
//! use sluice_worker::{PoolConfig, ResizingStrategy};
//!
//! let settings = PoolConfig::default().build().unwrap();
//! assert_eq!(settings.resizer.strategy(), ResizingStrategy::Balanced);
//! assert_eq!(settings.min_workers, 4);
//! ```

#![doc(html_root_url = "https://docs.rs/sluice-worker/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod strategy;

pub use config::{
    default_pool_config, PoolConfig, PoolSettings, DEFAULT_MAX_QUEUED_JOBS, DEFAULT_MAX_WORKERS,
    DEFAULT_MIN_WORKERS, DEFAULT_POOL_NAME, DEFAULT_PROMETHEUS_PREFIX, DEFAULT_RESIZING_STRATEGY,
};
pub use error::{WorkerError, WorkerResult};
pub use strategy::{resolve_strategy, Resizer, ResizingPolicy, ResizingStrategy};
