//! Route tests against a real engine over in-memory state

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use otp_api::{configure, AppState};
use otp_core::services::verification::{
    AttemptRecord, ChallengeLookup, ChallengeReceipt, ChallengeStore, ConsumeResult,
};
use otp_core::{
    CodeGenerator, DomainError, DomainResult, JwtIdentityIssuer, ManualClock, OtpCode, PhoneKey,
    PhoneNormalizer, VerificationEngine, VerificationEngineConfig,
};
use otp_infra::{ChannelDeliveryGateway, MemoryRateLimiter, StateBackends};
use otp_shared::config::{IdentityConfig, PhoneConfig, RateLimitConfig, RateRule, ServerConfig};

const CODE: &str = "482913";

/// Always issues the same code
struct FixedCode(&'static str);

impl CodeGenerator for FixedCode {
    fn generate(&self) -> DomainResult<OtpCode> {
        Ok(OtpCode::new(self.0))
    }
}

/// Store whose backend is down
struct DownStore;

#[async_trait]
impl ChallengeStore for DownStore {
    async fn put(
        &self,
        _: &PhoneKey,
        _: OtpCode,
        _: DateTime<Utc>,
        _: Duration,
        _: u32,
    ) -> DomainResult<ChallengeReceipt> {
        Err(DomainError::store("connection refused"))
    }

    async fn try_consume(&self, _: &PhoneKey, _: DateTime<Utc>) -> DomainResult<ChallengeLookup> {
        Err(DomainError::store("connection refused"))
    }

    async fn record_failed_attempt(
        &self,
        _: &PhoneKey,
        _: Uuid,
        _: DateTime<Utc>,
    ) -> DomainResult<AttemptRecord> {
        Err(DomainError::store("connection refused"))
    }

    async fn mark_consumed(
        &self,
        _: &PhoneKey,
        _: Uuid,
        _: DateTime<Utc>,
    ) -> DomainResult<ConsumeResult> {
        Err(DomainError::store("connection refused"))
    }

    async fn invalidate(&self, _: &PhoneKey) -> DomainResult<bool> {
        Err(DomainError::store("connection refused"))
    }

    async fn purge_expired(&self, _: DateTime<Utc>) -> DomainResult<usize> {
        Ok(0)
    }
}

fn rate_config() -> RateLimitConfig {
    RateLimitConfig {
        enabled: true,
        phone: vec![RateRule::new("cooldown", 1, 60)],
        network_issue: vec![RateRule::new("network", 100, 900)],
        network_verify: vec![RateRule::new("network_verify", 2, 900)],
    }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()))
}

fn engine_with(store: Arc<dyn ChallengeStore>, clock: Arc<ManualClock>) -> Arc<VerificationEngine> {
    let rate_limit = rate_config();
    let (gateway, _receiver) = ChannelDeliveryGateway::new(16);
    let engine = VerificationEngine::new(
        Arc::new(PhoneNormalizer::new(&PhoneConfig::default()).unwrap()),
        store,
        Arc::new(MemoryRateLimiter::new(&rate_limit)),
        Arc::new(gateway),
        Arc::new(JwtIdentityIssuer::new(&IdentityConfig::new("route-test-secret"))),
        VerificationEngineConfig::default(),
    )
    .with_clock(clock)
    .with_code_generator(Arc::new(FixedCode(CODE)));
    Arc::new(engine)
}

fn memory_engine(clock: Arc<ManualClock>) -> Arc<VerificationEngine> {
    engine_with(StateBackends::in_memory(&rate_config()).store, clock)
}

fn state(engine: Arc<VerificationEngine>) -> web::Data<AppState> {
    web::Data::new(AppState::new(engine, &ServerConfig::default()))
}

macro_rules! app {
    ($engine:expr) => {
        test::init_service(
            App::new()
                .app_data(state($engine))
                .configure(|cfg| configure(cfg, 4096)),
        )
        .await
    };
}

fn peer() -> SocketAddr {
    "203.0.113.7:40000".parse().unwrap()
}

#[actix_web::test]
async fn test_send_code_success() {
    let app = app!(memory_engine(clock()));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-code")
        .peer_addr(peer())
        .set_json(json!({ "phone": "98765 43210" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["ttl_seconds"], 300);
}

#[actix_web::test]
async fn test_send_code_invalid_phone() {
    let app = app!(memory_engine(clock()));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-code")
        .set_json(json!({ "phone": "12345" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "INVALID_FORMAT");
}

#[actix_web::test]
async fn test_send_code_malformed_body_uses_envelope() {
    let app = app!(memory_engine(clock()));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-code")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"phone\":")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_FORMAT");
}

#[actix_web::test]
async fn test_send_code_rate_limited_sets_retry_after() {
    let clock = clock();
    let app = app!(memory_engine(clock.clone()));

    let send = || {
        test::TestRequest::post()
            .uri("/api/v1/auth/send-code")
            .set_json(json!({ "phone": "9876543210" }))
            .to_request()
    };

    assert_eq!(test::call_service(&app, send()).await.status(), StatusCode::OK);

    clock.advance(Duration::seconds(15));
    let resp = test::call_service(&app, send()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "45");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "RATE_LIMITED");
    assert_eq!(body["retry_after_seconds"], 45);
}

#[actix_web::test]
async fn test_verify_flow() {
    let app = app!(memory_engine(clock()));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-code")
        .set_json(json!({ "phone": "+91 98765 43210" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let wrong = test::TestRequest::post()
        .uri("/api/v1/auth/verify-code")
        .set_json(json!({ "phone": "9876543210", "code": "000000" }))
        .to_request();
    let resp = test::call_service(&app, wrong).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_CODE");
    assert_eq!(body["remaining_attempts"], 2);

    let right = test::TestRequest::post()
        .uri("/api/v1/auth/verify-code")
        .set_json(json!({ "phone": "9876543210", "code": CODE }))
        .to_request();
    let resp = test::call_service(&app, right).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["identity_token"].as_str().unwrap().split('.').count() == 3);

    let replay = test::TestRequest::post()
        .uri("/api/v1/auth/verify-code")
        .set_json(json!({ "phone": "9876543210", "code": CODE }))
        .to_request();
    let resp = test::call_service(&app, replay).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NO_ACTIVE_CHALLENGE");
}

#[actix_web::test]
async fn test_verify_attempts_exhausted() {
    let app = app!(memory_engine(clock()));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-code")
        .set_json(json!({ "phone": "9876543210" }))
        .to_request();
    test::call_service(&app, req).await;

    let mut last = StatusCode::OK;
    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/verify-code")
            .set_json(json!({ "phone": "9876543210", "code": "111111" }))
            .to_request();
        last = test::call_service(&app, req).await.status();
    }
    assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
}

#[actix_web::test]
async fn test_verify_expired() {
    let clock = clock();
    let app = app!(memory_engine(clock.clone()));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-code")
        .set_json(json!({ "phone": "9876543210" }))
        .to_request();
    test::call_service(&app, req).await;

    clock.advance(Duration::seconds(301));
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/verify-code")
        .set_json(json!({ "phone": "9876543210", "code": CODE }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CODE_EXPIRED");
}

#[actix_web::test]
async fn test_verify_malformed_code() {
    let app = app!(memory_engine(clock()));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/verify-code")
        .set_json(json!({ "phone": "9876543210", "code": "12ab" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "INVALID_FORMAT");
}

#[actix_web::test]
async fn test_verify_network_limit() {
    let app = app!(memory_engine(clock()));

    let verify = || {
        test::TestRequest::post()
            .uri("/api/v1/auth/verify-code")
            .peer_addr(peer())
            .set_json(json!({ "phone": "9876543210", "code": CODE }))
            .to_request()
    };

    // No challenge, but each call still counts against the address
    test::call_service(&app, verify()).await;
    test::call_service(&app, verify()).await;
    let resp = test::call_service(&app, verify()).await;

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
}

#[actix_web::test]
async fn test_cancel_code() {
    let app = app!(memory_engine(clock()));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-code")
        .set_json(json!({ "phone": "9876543210" }))
        .to_request();
    test::call_service(&app, req).await;

    let cancel = || {
        test::TestRequest::delete()
            .uri("/api/v1/auth/code")
            .set_json(json!({ "phone": "9876543210" }))
            .to_request()
    };

    let body: Value = test::call_and_read_body_json(&app, cancel()).await;
    assert_eq!(body["cancelled"], true);
    let body: Value = test::call_and_read_body_json(&app, cancel()).await;
    assert_eq!(body["cancelled"], false);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/verify-code")
        .set_json(json!({ "phone": "9876543210", "code": CODE }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["error"], "NO_ACTIVE_CHALLENGE");
}

#[actix_web::test]
async fn test_store_outage_is_503() {
    let app = app!(engine_with(Arc::new(DownStore), clock()));

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/send-code")
        .set_json(json!({ "phone": "9876543210" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
    assert!(!body["message"].as_str().unwrap().contains("connection refused"));
}

#[actix_web::test]
async fn test_health_and_not_found() {
    let app = app!(memory_engine(clock()));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
