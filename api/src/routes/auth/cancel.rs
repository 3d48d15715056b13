use actix_web::{web, HttpResponse};
use validator::Validate;

use otp_core::CancelOutcome;
use otp_shared::{error_codes, ErrorResponse};

use crate::app::AppState;
use crate::dto::{CancelCodeRequest, CancelCodeResponse};
use crate::handlers::{domain_error_response, validation_error_response};

/// Handler for DELETE /api/v1/auth/code
///
/// Drops the outstanding code for a phone, e.g. when the user backs out of
/// the sign-in flow. Cancelling when nothing is pending still succeeds.
pub async fn cancel_code(
    state: web::Data<AppState>,
    request: web::Json<CancelCodeRequest>,
) -> HttpResponse {
    if let Err(errors) = request.validate() {
        return validation_error_response(&errors);
    }

    match state.engine.cancel(&request.phone).await {
        Ok(CancelOutcome::Cancelled) => HttpResponse::Ok().json(CancelCodeResponse {
            ok: true,
            cancelled: true,
        }),
        Ok(CancelOutcome::NothingToCancel) => HttpResponse::Ok().json(CancelCodeResponse {
            ok: true,
            cancelled: false,
        }),
        Ok(CancelOutcome::InvalidFormat) => HttpResponse::BadRequest().json(ErrorResponse::new(
            error_codes::INVALID_FORMAT,
            "Phone number is not valid",
        )),
        Err(error) => domain_error_response(&error),
    }
}
