//! Phone number normalization

mod normalizer;

pub use normalizer::{PhoneFormatError, PhoneNormalizer};
