use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /api/v1/auth/send-code`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendCodeRequest {
    /// Phone number in any common notation: "98765 43210", "+91-98765-43210"
    #[validate(length(min = 1, max = 32))]
    pub phone: String,
}

/// Body of `POST /api/v1/auth/verify-code`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(length(min = 1, max = 32))]
    pub phone: String,

    /// Digits exactly as received; the engine checks the length
    #[validate(length(min = 1, max = 16))]
    pub code: String,
}

/// Body of `DELETE /api/v1/auth/code`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CancelCodeRequest {
    #[validate(length(min = 1, max = 32))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCodeResponse {
    pub ok: bool,
    /// Seconds until the issued code expires
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    pub ok: bool,
    pub identity_token: String,
    pub token_type: String,
    /// Seconds until the identity token expires
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelCodeResponse {
    pub ok: bool,
    /// Whether an outstanding code was dropped
    pub cancelled: bool,
}
