use std::net::SocketAddr;

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use qf_api::{config::ApiConfig, state::ApiState};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment variables
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    qf_api::tracing::init_tracing(&config.env);

    let metrics_handle = qf_api::metrics::init_metrics()?;

    let state = ApiState::new(&config)?;

    let _job_handles = qf_api::jobs::start_background_jobs(
        state.drafts.clone(),
        config.draft_ttl()?,
        config.draft_sweep_interval(),
    );

    let cors = qf_api::middleware::cors::create_cors_layer(config.parsed_allowed_origins());

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let metrics_app = Router::new()
        .route("/metrics", get(qf_api::metrics::metrics_handler))
        .with_state(metrics_handle);

    let app = qf_api::router::router()
        .with_state(state)
        .merge(metrics_app)
        // Uploads are bounded by the document handler itself
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(trace_layer)
        .layer(middleware::from_fn(qf_api::metrics::track_metrics))
        .layer(middleware::from_fn(
            qf_api::middleware::request_id::request_id_middleware,
        ));

    let app =
        qf_api::middleware::security_headers::apply_security_headers(app, config.env.clone());

    tracing::info!(
        environment = ?config.env,
        model = %config.chat_model,
        endpoint = %config.chat_completions_url,
        "Quizforge configured"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);

    // Rate limiting keys on the peer address when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
