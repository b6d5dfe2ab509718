pub mod handlers;
pub mod types;

use crate::{config::Config, llm::OpenAiCompatClient, Result};
use axum::{
    extract::Request,
    response::IntoResponse,
    routing::{any, post},
    Router,
};
use handlers::AppState;
use std::{convert::Infallible, net::SocketAddr, sync::Arc};
use tower::Service;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

/// Builds the application router: POST /api/chat goes to the chat handler,
/// any other method on that path gets a 405, unknown /api/ paths get a 404,
/// and everything else falls through to the asset service unmodified.
pub fn app<S>(state: AppState, assets: S) -> Router
where
    S: Service<Request, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    Router::new()
        .route(
            "/api/chat",
            post(handlers::chat).fallback(handlers::method_not_allowed),
        )
        // The catch-all does not match an empty remainder, so the bare
        // prefix path needs its own route to stay under the 404 rule.
        .route("/api/", any(handlers::not_found))
        .route("/api/*rest", any(handlers::not_found))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let llm = Arc::new(OpenAiCompatClient::new(config.llm.clone()));

    let state = AppState {
        llm,
        llm_config: config.llm,
    };

    // Frontend assets are served by tower-http; the core never touches them.
    let assets = ServeDir::new(&config.server.assets_dir);
    let app = app(state, assets);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
