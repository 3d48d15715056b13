//! Tests for the state backends

mod memory_rate_limiter_tests;

#[cfg(feature = "redis-cache")]
mod redis_tests;
