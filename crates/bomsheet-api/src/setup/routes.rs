use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use bomsheet_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the full application router. `/health` and the OpenAPI document are public;
/// every report route requires a bearer token.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = setup_cors(&state.config);

    let protected_routes = report_routes().layer(axum::middleware::from_fn_with_state(
        state.verifier.clone(),
        crate::auth::middleware::auth_middleware,
    ));

    tracing::info!(
        max_request_body_bytes = state.config.max_request_body_bytes(),
        "Request body limit configured"
    );

    public_routes()
        .merge(protected_routes)
        // The layer below is the only body limit; axum's 2 MB default would cut it short.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            state.config.max_request_body_bytes(),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

fn report_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/reports", API_PREFIX),
            get(handlers::reports::list_reports).post(handlers::reports::generate_report),
        )
        .route(
            &format!("{}/reports/{{artifact_id}}/download", API_PREFIX),
            get(handlers::reports::download_report),
        )
}

fn setup_cors(config: &Config) -> CorsLayer {
    let expose = [
        axum::http::header::CONTENT_DISPOSITION,
        axum::http::HeaderName::from_static(crate::constants::ARTIFACT_ID_HEADER),
        axum::http::HeaderName::from_static(crate::constants::WARNINGS_HEADER),
    ];

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .expose_headers(expose)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins()
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .expose_headers(expose)
    }
}
