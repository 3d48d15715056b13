//! Background maintenance of challenge and rate-limit state

mod sweeper;

pub use sweeper::{ExpirySweeper, SweepReport};
