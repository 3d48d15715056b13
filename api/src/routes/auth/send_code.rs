use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use otp_shared::mask_phone_number;

use crate::app::AppState;
use crate::dto::SendCodeRequest;
use crate::handlers::{domain_error_response, issuance_response, validation_error_response};

use super::client_ip;

/// Handler for POST /api/v1/auth/send-code
///
/// # Request Body
///
/// ```json
/// { "phone": "+91 98765 43210" }
/// ```
///
/// # Responses
///
/// - 200 `{ "ok": true, "ttl_seconds": 300 }`
/// - 400 `INVALID_FORMAT`
/// - 429 `RATE_LIMITED` with `Retry-After`
/// - 503 / 500 on infrastructure failure
pub async fn send_code(
    req: HttpRequest,
    state: web::Data<AppState>,
    request: web::Json<SendCodeRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    let origin = client_ip(&req, state.trust_forwarded_for);
    tracing::debug!(
        phone = %mask_phone_number(&request.phone),
        origin = ?origin,
        "Processing send_code request"
    );

    match state.engine.request_code(&request.phone, origin).await {
        Ok(outcome) => issuance_response(outcome),
        Err(error) => domain_error_response(&error),
    }
}
