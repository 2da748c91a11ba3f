//! Axum server assembly

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/projects", post(routes::create_project))
        .route("/projects/:id/execute", post(routes::execute_project))
        .route("/deliverables/:id/modify", post(routes::modify_deliverable))
        .route("/deliverables/:id/revise", post(routes::revise_deliverable))
        .route(
            "/deliverables/:id/fix-and-recheck",
            post(routes::fix_and_recheck),
        )
        .route("/deliverables/:id/approve", post(routes::approve_deliverable))
        .route("/deliverables/publish", post(routes::publish_deliverable))
        .route("/deliverables/:id/variants", post(routes::generate_variants))
        .route("/deliverables/:id/suggestions", get(routes::get_suggestions))
        .route("/deliverables/:id/history", get(routes::get_history))
        .route("/workflows/:id", get(routes::get_workflow))
        .route("/predictions/variants/rank", post(routes::rank_variants))
        .route(
            "/predictions/campaign/:id/forecast",
            post(routes::forecast_campaign),
        )
        .route("/api/health", get(routes::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(state: SharedState, addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "atelier api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
