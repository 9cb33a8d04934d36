//! Network call primitives: rate limiting, retry with backoff, pagination.
//!
//! Every outbound provider call is funneled through these. They carry no
//! provider knowledge of their own; providers and the orchestrator inject
//! the budgets and ceilings from [`crate::config`].

pub mod pagination;
pub mod rate_limit;
pub mod retry;

pub use pagination::{Page, Paginator};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
