//! Async building blocks for the scanner.
//!
//! - [`PriorityQueue`]: max-ordered waiting list keyed by an `f64` weight.
//! - [`AdmissionPool`]: bounds how many jobs execute at once, releasing
//!   waiting jobs by highest weight as capacity frees up.
//! - [`with_retries`]: bounded retry loop that aggregates every failure.
//! - [`join_with_policy`]: wait-for-all with either fail-fast or
//!   collect-and-continue semantics.

pub mod error;
mod join;
mod pool;
mod queue;
mod retry;
mod timed;

pub use crate::join::{FailurePolicy, Settled, join_with_policy};
pub use crate::pool::{AdmissionPool, AnalyticsSink, DEFAULT_CAPACITY, JobAnalytics, PoolStats, TracingSink};
pub use crate::queue::PriorityQueue;
pub use crate::retry::{DEFAULT_MAX_ATTEMPTS, with_retries};
pub use crate::timed::Timed;
