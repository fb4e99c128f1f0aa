//! Retry-orchestration engine wrapping a primary model with a
//! fallback-and-retry policy.
//!
//! The pieces, leaves first: the [`ledger`] records every attempt within one
//! logical request; [`rules`] resolves which model handles the next attempt;
//! [`backoff`] and [`signal`] prepare the suspension and cancellation signal
//! for that attempt; [`sticky`] lets a previous winner stay current for a
//! bounded window; [`failover`] and [`stream`] drive the non-streaming and
//! streaming attempt loops over all of it.

pub mod backoff;
pub mod config;
mod driver;
pub mod error;
pub mod failover;
pub mod ledger;
pub mod rules;
pub mod signal;
pub mod sticky;
pub mod stream;
#[cfg(test)]
pub(crate) mod testing;

pub use backoff::{retry_delay, wait_before_retry};
pub use config::{Disabled, FailoverConfig, HookFn};
pub use error::{AttemptFailure, FailoverError, Result};
pub use failover::FailoverModel;
pub use ledger::{Attempt, AttemptLedger};
pub use rules::{FallbackEntry, RetryContext, RetryDescriptor, resolve_next};
pub use signal::attempt_token;
pub use sticky::{StickyManager, StickyReset};
pub use stream::FailoverStream;
