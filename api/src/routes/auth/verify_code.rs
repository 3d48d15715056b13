use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::app::AppState;
use crate::dto::VerifyCodeRequest;
use crate::handlers::{domain_error_response, validation_error_response, verification_response};

use super::client_ip;

/// Handler for POST /api/v1/auth/verify-code
///
/// # Request Body
///
/// ```json
/// { "phone": "+919876543210", "code": "482913" }
/// ```
///
/// # Responses
///
/// - 200 `{ "ok": true, "identity_token": "...", "token_type": "Bearer", "expires_in": 600 }`
/// - 400 `INVALID_FORMAT`, `INVALID_CODE` (with `remaining_attempts`), `CODE_EXPIRED`,
///   `NO_ACTIVE_CHALLENGE`
/// - 429 `ATTEMPTS_EXHAUSTED`, or `RATE_LIMITED` with `Retry-After`
/// - 503 / 500 on infrastructure failure
pub async fn verify_code(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<VerifyCodeRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    let origin = client_ip(&req, state.trust_forwarded_for);

    match state
        .engine
        .verify_code(&request.phone, &request.code, origin)
        .await
    {
        Ok(outcome) => verification_response(outcome),
        Err(error) => domain_error_response(&error),
    }
}
