mod api;
mod config;
mod content_type;
mod range;
mod resolver;
mod state;
mod stream;
mod utils;

use std::sync::Arc;

use api::api_router;
use axum::http::{header, Method};
use axum::Router;
use catalog::{Catalog, PathResolver};
use config::{config_path_from_env, load_or_create_config, resolve_media_root, resolve_path};
use content_type::ContentTypes;
use parking_lot::RwLock;
use resolver::CatalogResolver;
use state::{AppState, ImportStatus};
use stream::{media_router, MediaState};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let index_path = resolve_path(&config_path, &config.index_path);
    let catalog = Catalog::open(&index_path)?;
    let media_root = resolve_media_root(&config_path, &config.media_root);
    match &media_root {
        Some(root) if !root.exists() => warn!("Media root {:?} does not exist", root),
        Some(root) => info!("Media root {:?}", root),
        None => info!("No media root configured; stored paths are used as-is."),
    }

    let media = MediaState {
        resolver: Arc::new(CatalogResolver::new(
            catalog.clone(),
            PathResolver::new(media_root.clone()),
        )),
        content_types: Arc::new(ContentTypes::new(&config.content_types)),
        chunk_size: config.stream_chunk_size,
    };
    let bind_addr = config.listen_addr();
    let cors_allow_any = config.cors_allow_any;
    let state = AppState {
        catalog,
        config: Arc::new(config),
        media_root,
        import_status: Arc::new(RwLock::new(ImportStatus::Idle)),
    };

    let app = Router::new()
        .nest("/api/v1", api_router(state))
        .merge(media_router(media));
    let app = if cors_allow_any {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::HEAD, Method::POST])
                .allow_headers([header::RANGE, header::CONTENT_TYPE])
                .expose_headers([
                    header::ACCEPT_RANGES,
                    header::CONTENT_LENGTH,
                    header::CONTENT_RANGE,
                ]),
        )
    } else {
        app
    };
    let app = app
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
