//! Phone verification endpoints
//!
//! - `POST   /api/v1/auth/send-code`
//! - `POST   /api/v1/auth/verify-code`
//! - `DELETE /api/v1/auth/code`

pub mod cancel;
pub mod send_code;
pub mod verify_code;

pub use cancel::cancel_code;
pub use send_code::send_code;
pub use verify_code::verify_code;

use std::net::IpAddr;

use actix_web::HttpRequest;

/// Address the request came from, used for network rate limits
///
/// With `trust_forwarded_for` the first `X-Forwarded-For` hop wins; only
/// enable that behind a proxy that overwrites the header.
pub fn client_ip(req: &HttpRequest, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|hop| hop.trim().parse().ok());
        if forwarded.is_some() {
            return forwarded;
        }
    }

    req.peer_addr().map(|addr| addr.ip())
}
