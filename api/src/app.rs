//! Application state and route table

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use otp_core::VerificationEngine;
use otp_shared::config::ServerConfig;
use otp_shared::{error_codes, ErrorResponse};

use crate::handlers::json_error_handler;
use crate::routes::auth::{cancel_code, send_code, verify_code};

/// Shared state handed to every handler
pub struct AppState {
    pub engine: Arc<VerificationEngine>,
    /// Take the client address from `X-Forwarded-For`
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(engine: Arc<VerificationEngine>, server: &ServerConfig) -> Self {
        Self {
            engine,
            trust_forwarded_for: server.trust_forwarded_for,
        }
    }
}

/// Register every route; `max_payload_size` bounds JSON bodies
pub fn configure(cfg: &mut web::ServiceConfig, max_payload_size: usize) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(max_payload_size)
            .error_handler(json_error_handler),
    )
    .route("/health", web::get().to(health_check))
    .service(
        web::scope("/api/v1/auth")
            .route("/send-code", web::post().to(send_code))
            .route("/verify-code", web::post().to(verify_code))
            .route("/code", web::delete().to(cancel_code)),
    )
    .default_service(web::route().to(not_found));
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "otp-auth",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
