//! Narrator Server Entry Point

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use narrator_config::{load_settings, Settings};
use narrator_server::{create_router, init_metrics, spawn_initialization, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration first; observability settings drive tracing init
    let env = std::env::var("NARRATOR_ENV").ok();
    let config = load_settings(env.as_deref())?;

    init_tracing(&config);

    tracing::info!("Starting Narrator Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        env = env.as_deref().unwrap_or("default"),
        backend = ?config.synthesis.backend,
        model_id = %config.synthesis.model_id,
        max_chunk_length = config.synthesis.max_chunk_length,
        "Loaded configuration"
    );

    if config.observability.metrics_enabled {
        match init_metrics() {
            Ok(_) => tracing::info!("Initialized Prometheus metrics at /metrics"),
            Err(e) => tracing::warn!("Failed to initialize metrics: {}", e),
        }
    }

    let state = AppState::new(config.clone());
    tracing::info!("Initialized application state");

    // Model loads in the background; requests get 503 until it is ready
    spawn_initialization(&state);

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing, exporting to OTLP when built with `otlp` and an
/// endpoint is configured
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!(
            "narrator_server={level},narrator_pipeline={level},narrator_config={level},tower_http=info"
        )
        .into()
    });

    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    #[cfg(feature = "otlp")]
    let otel_layer = config
        .observability
        .otlp_endpoint
        .as_deref()
        .and_then(|endpoint| match otlp_tracer(endpoint) {
            Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Err(e) => {
                eprintln!(
                    "Failed to initialize OpenTelemetry: {}. Falling back to console logging.",
                    e
                );
                None
            }
        });

    #[cfg(not(feature = "otlp"))]
    let otel_layer: Option<tracing_subscriber::layer::Identity> = {
        if config.observability.otlp_endpoint.is_some() {
            eprintln!("otlp_endpoint is set but the server was built without the `otlp` feature");
        }
        None
    };

    let otel_enabled = otel_layer.is_some();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    if otel_enabled {
        tracing::info!("OpenTelemetry tracing enabled");
    }
}

/// OTLP exporter pipeline
#[cfg(feature = "otlp")]
fn otlp_tracer(
    endpoint: &str,
) -> Result<opentelemetry_sdk::trace::Tracer, opentelemetry::trace::TraceError> {
    use opentelemetry_otlp::WithExportConfig;

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(opentelemetry_sdk::trace::Config::default().with_resource(
            opentelemetry_sdk::Resource::new(vec![
                opentelemetry::KeyValue::new("service.name", "narrator"),
                opentelemetry::KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            ]),
        ))
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}
