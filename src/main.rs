use axum::http::HeaderValue;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use todo_server::{
    app_state::{AppState, SharedState},
    data_access::data_context::DataContext,
    map_routes,
    settings::Settings,
};

#[tokio::main]
async fn main() {
    init_tracing();

    // ── Settings ───────────────────────────────────────────────
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(error) => {
            tracing::error!(%error, "invalid configuration");
            std::process::exit(1);
        }
    };

    // ── Open the store ─────────────────────────────────────────
    let data_context = match DataContext::open(&settings.store_path) {
        Ok(context) => context,
        Err(error) => {
            tracing::error!(%error, path = %settings.store_path, "failed to open document store");
            std::process::exit(1);
        }
    };
    let tasks = match data_context.collection(&settings.collection_name) {
        Ok(collection) => collection,
        Err(error) => {
            tracing::error!(%error, collection = %settings.collection_name, "failed to open collection");
            std::process::exit(1);
        }
    };

    // ── Shared state ───────────────────────────────────────────
    let state: SharedState = Arc::new(AppState::new(Arc::new(tasks), settings.timeouts()));

    // ── Router ─────────────────────────────────────────────────
    let cors = match cors_layer(&settings.allowed_origin) {
        Ok(cors) => cors,
        Err(error) => {
            tracing::error!(%error, origin = %settings.allowed_origin, "invalid allowed origin");
            std::process::exit(1);
        }
    };
    let app = map_routes(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // ── Start ──────────────────────────────────────────────────
    let address = settings.bind_address();
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, %address, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(%address, collection = %settings.collection_name, "server running");

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "server error");
    }

    // Handlers hold collection handles through the state; drop it first.
    drop(state);
    data_context.close();
    tracing::info!("shutdown complete");
}

#[cfg(not(feature = "profile-console"))]
fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(feature = "profile-console")]
fn init_tracing() {
    console_subscriber::init();
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origin == "*" {
        return Ok(cors.allow_origin(Any));
    }
    Ok(cors.allow_origin(HeaderValue::from_str(allowed_origin)?))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
