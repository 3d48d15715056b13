//! HTTP surface for phone OTP authentication
//!
//! Thin actix-web handlers over [`otp_core::VerificationEngine`]: request a
//! code, verify it, cancel it. Every expected outcome maps to a status code
//! and the shared [`otp_shared::ErrorResponse`] envelope.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod logging;
pub mod routes;

pub use app::{configure, AppState};
