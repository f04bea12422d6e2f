pub mod api;
pub mod attachments;
pub mod config;
pub mod error;
pub mod extract;
pub mod remote;
pub mod store;

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::attachments::{AttachmentStore, LocalBucketStore};
use crate::config::Config;
use crate::extract::{Extractor, GeminiExtractor};
use crate::remote::PgRemote;
use crate::store::{Liveness, RecordStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub attachments: Arc<dyn AttachmentStore>,
    /// `None` when no extraction key is configured
    pub extractor: Option<Arc<dyn Extractor>>,
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    // Initialize database
    let remote = PgRemote::connect_lazy(&config.database_url)?;

    // Run migrations; an unreachable database leaves the store degraded
    if let Err(e) = remote.migrate().await {
        tracing::error!("Migrations not applied: {:#}", e);
    }

    let store = Arc::new(RecordStore::new(Arc::new(remote), config.offline_fallback));
    store.load(&Liveness::new()).await;

    let extractor = config.gemini_api_key.as_ref().map(|key| {
        Arc::new(GeminiExtractor::new(key.clone(), config.gemini_model.clone()))
            as Arc<dyn Extractor>
    });
    if extractor.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; report extraction disabled");
    }

    // Create application state
    let state = AppState {
        store,
        attachments: Arc::new(LocalBucketStore::new(
            &config.attachments_root,
            config.attachments_bucket.clone(),
            &config.attachments_public_url,
        )),
        extractor,
    };

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .nest_service("/storage", ServeDir::new(&config.attachments_root))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
