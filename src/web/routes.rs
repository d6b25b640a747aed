use crate::app_config::AppConfig;
use crate::config::SANDBOX_ID_HEADER;
use crate::web::layout;
use crate::web::server::WebState;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Values computed once per request and handed to handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub app_config: Arc<AppConfig>,
}

/// Build all routes.
pub fn build_routes(state: WebState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let configured = Router::new()
        .route("/", get(page_handler))
        .route("/api/config", get(config_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_request_context,
        ));

    Router::new()
        .merge(configured)
        .route("/api/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Resolve the app config for this request and store it in the extensions.
async fn resolve_request_context(
    State(state): State<WebState>,
    mut req: Request,
    next: Next,
) -> Response {
    let sandbox_id = req
        .headers()
        .get(SANDBOX_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let app_config = state.resolver.resolve(sandbox_id.as_deref()).await;
    debug!(
        "Resolved app config for {} (sandbox {:?})",
        req.uri().path(),
        app_config.sandbox_id()
    );

    req.extensions_mut().insert(RequestContext {
        app_config: Arc::new(app_config),
    });
    next.run(req).await
}

// ============================================================================
// Page
// ============================================================================

async fn page_handler(
    State(state): State<WebState>,
    Extension(ctx): Extension<RequestContext>,
) -> impl IntoResponse {
    let body = layout::render_battle_page(
        &ctx.app_config,
        state.settings.battle.max_instruction_words,
    );
    Html(layout::render_document(
        &ctx.app_config,
        state.settings.dev_mode,
        &body,
    ))
}

// ============================================================================
// Config
// ============================================================================

async fn config_handler(Extension(ctx): Extension<RequestContext>) -> Json<AppConfig> {
    Json(AppConfig::clone(&ctx.app_config))
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
}

async fn health_handler(State(state): State<WebState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime: state.start_time.elapsed().as_secs(),
    })
}
