//! Outcome and error to HTTP response mapping

pub mod error;

pub use error::{
    domain_error_response, issuance_response, json_error_handler, validation_error_response,
    verification_response,
};
