//! Request and response bodies

pub mod auth;

pub use auth::{
    CancelCodeRequest, CancelCodeResponse, SendCodeRequest, SendCodeResponse, VerifyCodeRequest,
    VerifyCodeResponse,
};
