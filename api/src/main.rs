use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

use otp_api::{configure, logging, AppState};
use otp_core::{
    ExpirySweeper, JwtIdentityIssuer, PhoneNormalizer, SystemClock, VerificationEngine,
    VerificationEngineConfig,
};
use otp_infra::{
    build_state_backends, create_sms_provider, spawn_delivery_worker, ChannelDeliveryGateway,
    DeliveryWorkerConfig,
};
use otp_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    logging::init_logging(&config.logging);

    info!(
        environment = %config.environment,
        backend = ?config.cache.backend,
        sms_provider = ?config.sms.provider,
        "Starting OTP authentication server"
    );
    if config.identity.is_using_default_secret() {
        warn!("Identity tokens are signed with the default secret; set AUTH__IDENTITY__SECRET");
    }

    let normalizer = Arc::new(PhoneNormalizer::new(&config.phone).context("invalid phone rules")?);
    let backends = build_state_backends(&config.cache, &config.rate_limit)
        .await
        .context("failed to initialise challenge state")?;

    let provider = create_sms_provider(&config.sms).context("failed to initialise SMS provider")?;
    let (gateway, receiver) = ChannelDeliveryGateway::new(config.sms.queue_capacity);
    let delivery_worker = spawn_delivery_worker(
        receiver,
        provider,
        DeliveryWorkerConfig::from_sms_config(&config.sms),
    );

    let engine = Arc::new(VerificationEngine::new(
        normalizer,
        backends.store.clone(),
        backends.limiter.clone(),
        Arc::new(gateway),
        Arc::new(JwtIdentityIssuer::new(&config.identity)),
        VerificationEngineConfig::from(&config.otp),
    ));

    let sweeper = config.otp.sweep_enabled.then(|| {
        Arc::new(ExpirySweeper::new(
            backends.store.clone(),
            backends.limiter.clone(),
            Arc::new(SystemClock),
            Duration::from_secs(config.otp.sweep_interval_seconds),
        ))
        .spawn()
    });

    let state = web::Data::new(AppState::new(engine, &config.server));
    let max_payload_size = config.server.max_payload_size;
    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(TracingLogger::default())
            .configure(|cfg| configure(cfg, max_payload_size))
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await?;

    info!("Server stopped; shutting down background tasks");
    if let Some(handle) = sweeper {
        handle.abort();
    }
    delivery_worker.abort();

    Ok(())
}
