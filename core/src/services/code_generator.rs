//! Cryptographically secure numeric code generation

use rand::rngs::OsRng;
use rand::RngCore;

use crate::domain::value_objects::OtpCode;
use crate::errors::{DomainError, DomainResult};

/// Produces fixed-width numeric codes
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> DomainResult<OtpCode>;
}

/// Draws digits from the operating system CSPRNG
///
/// Bytes at or above 250 are rejected so every digit is uniform over 0-9.
#[derive(Debug, Clone)]
pub struct OsRngCodeGenerator {
    length: usize,
}

impl OsRngCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl CodeGenerator for OsRngCodeGenerator {
    fn generate(&self) -> DomainResult<OtpCode> {
        let mut digits = String::with_capacity(self.length);
        let mut buffer = [0u8; 16];

        while digits.len() < self.length {
            OsRng
                .try_fill_bytes(&mut buffer)
                .map_err(|e| DomainError::CodeGeneration {
                    message: e.to_string(),
                })?;

            for byte in buffer.iter().copied().filter(|b| *b < 250) {
                digits.push(char::from(b'0' + byte % 10));
                if digits.len() == self.length {
                    break;
                }
            }
        }

        Ok(OtpCode::new(digits))
    }
}
