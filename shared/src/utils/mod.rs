//! Utility helpers shared across crates

pub mod phone;
