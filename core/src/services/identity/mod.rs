//! Identity assertion issuance

mod jwt;

pub use jwt::{IdentityClaims, JwtIdentityIssuer, AUTH_METHOD_OTP};
