//! Mapping of engine outcomes and failures onto HTTP responses
//!
//! | Outcome                                        | Status |
//! |------------------------------------------------|--------|
//! | `InvalidFormat`, `InvalidCode`, `Expired`, `NoActiveChallenge` | 400 |
//! | `RateLimited` (with `Retry-After`), `AttemptsExhausted` | 429 |
//! | store or limiter unavailable                   | 503    |
//! | any other infrastructure failure               | 500    |

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use validator::ValidationErrors;

use otp_core::{DomainError, InputField, IssuanceOutcome, VerificationOutcome};
use otp_shared::{error_codes, ErrorResponse};

use crate::dto::{SendCodeResponse, VerifyCodeResponse};

fn rate_limited(retry_after_seconds: u64, message: &str) -> HttpResponse {
    HttpResponse::TooManyRequests()
        .insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()))
        .json(
            ErrorResponse::new(error_codes::RATE_LIMITED, message)
                .with_retry_after(retry_after_seconds),
        )
}

fn invalid_format(field: InputField) -> HttpResponse {
    let message = match field {
        InputField::Phone => "Phone number is not valid",
        InputField::Code => "Verification code must be all digits of the expected length",
    };
    HttpResponse::BadRequest().json(ErrorResponse::new(error_codes::INVALID_FORMAT, message))
}

/// Response for `request_code`
pub fn issuance_response(outcome: IssuanceOutcome) -> HttpResponse {
    match outcome {
        IssuanceOutcome::Issued { ttl_seconds, .. } => HttpResponse::Ok().json(SendCodeResponse {
            ok: true,
            ttl_seconds,
        }),
        IssuanceOutcome::InvalidFormat => invalid_format(InputField::Phone),
        IssuanceOutcome::RateLimited { retry_after_seconds } => rate_limited(
            retry_after_seconds,
            "Too many codes requested. Please wait before trying again",
        ),
    }
}

/// Response for `verify_code`
pub fn verification_response(outcome: VerificationOutcome) -> HttpResponse {
    match outcome {
        VerificationOutcome::Success(assertion) => {
            HttpResponse::Ok().json(VerifyCodeResponse {
                ok: true,
                identity_token: assertion.token,
                token_type: assertion.token_type,
                expires_in: assertion.expires_in_seconds.max(0),
            })
        }
        VerificationOutcome::InvalidCode { remaining_attempts } => HttpResponse::BadRequest()
            .json(
                ErrorResponse::new(error_codes::INVALID_CODE, "Verification code is incorrect")
                    .with_remaining_attempts(remaining_attempts),
            ),
        VerificationOutcome::Expired => HttpResponse::BadRequest().json(ErrorResponse::new(
            error_codes::CODE_EXPIRED,
            "Verification code has expired. Please request a new one",
        )),
        VerificationOutcome::NoActiveChallenge => HttpResponse::BadRequest().json(
            ErrorResponse::new(
                error_codes::NO_ACTIVE_CHALLENGE,
                "No verification code is pending for this number",
            ),
        ),
        VerificationOutcome::AttemptsExhausted => HttpResponse::TooManyRequests().json(
            ErrorResponse::new(
                error_codes::ATTEMPTS_EXHAUSTED,
                "Too many incorrect attempts. Please request a new code",
            )
            .with_remaining_attempts(0),
        ),
        VerificationOutcome::RateLimited { retry_after_seconds } => rate_limited(
            retry_after_seconds,
            "Too many verification attempts. Please wait before trying again",
        ),
        VerificationOutcome::InvalidFormat(field) => invalid_format(field),
    }
}

/// Response for an infrastructure failure
///
/// Internal detail is logged, never returned to the client.
pub fn domain_error_response(error: &DomainError) -> HttpResponse {
    if error.is_unavailable() {
        tracing::error!(error = %error, code = error.code(), "Backing state unavailable");
        HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
            error_codes::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable. Please try again shortly",
        ))
    } else {
        tracing::error!(error = %error, code = error.code(), "Request failed");
        HttpResponse::InternalServerError().json(ErrorResponse::new(
            error_codes::INTERNAL_ERROR,
            "An internal error occurred",
        ))
    }
}

/// Response for a body that failed `validator` checks
pub fn validation_error_response(errors: &ValidationErrors) -> HttpResponse {
    let fields: Vec<&str> = errors.field_errors().keys().copied().collect();
    HttpResponse::BadRequest().json(ErrorResponse::new(
        error_codes::INVALID_FORMAT,
        format!("Invalid request fields: {}", fields.join(", ")),
    ))
}

/// Render malformed JSON bodies in the standard envelope
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse::new(
        error_codes::INVALID_FORMAT,
        format!("Invalid request body: {}", err),
    ));
    InternalError::from_response(err, response).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use chrono::{TimeZone, Utc};
    use otp_core::{IdentityAssertion, PhoneKey};

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = issuance_response(IssuanceOutcome::RateLimited {
            retry_after_seconds: 42,
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "42"
        );
    }

    #[test]
    fn test_verification_status_codes() {
        let cases = [
            (VerificationOutcome::InvalidCode { remaining_attempts: 2 }, StatusCode::BAD_REQUEST),
            (VerificationOutcome::Expired, StatusCode::BAD_REQUEST),
            (VerificationOutcome::NoActiveChallenge, StatusCode::BAD_REQUEST),
            (VerificationOutcome::InvalidFormat(InputField::Code), StatusCode::BAD_REQUEST),
            (VerificationOutcome::AttemptsExhausted, StatusCode::TOO_MANY_REQUESTS),
        ];
        for (outcome, status) in cases {
            assert_eq!(verification_response(outcome).status(), status);
        }
    }

    #[actix_web::test]
    async fn test_success_reports_issuer_lifetime() {
        // Stamped long ago by a clock that is not the server's
        let assertion = IdentityAssertion {
            subject: PhoneKey::try_from("+919876543210".to_string()).unwrap(),
            token: "signed".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: Utc.timestamp_opt(0, 0).unwrap(),
            expires_in_seconds: 600,
        };

        let response = verification_response(VerificationOutcome::Success(assertion));
        assert_eq!(response.status(), StatusCode::OK);

        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["expires_in"], 600);
        assert_eq!(json["identity_token"], "signed");
    }

    #[test]
    fn test_infrastructure_errors() {
        assert_eq!(
            domain_error_response(&DomainError::store("down")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            domain_error_response(&DomainError::IdentityIssuer { message: "bad key".into() })
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
