//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the upload and listing endpoints and stitches them with
//! Leptos SSR rendering under a single Axum router. The Leptos pages live at
//! `/` and `/legacy`; their compiled assets are served from `/pkg`.

pub mod instruments;
pub mod legacy;
pub mod multipart;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, post};
use leptos::prelude::*;
use leptos_axum::{LeptosRoutes, generate_route_list};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Upload, listing, and health routes.
pub fn api_routes(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/upload_instruments", post(instruments::upload_instruments))
        .route("/instruments", get(instruments::list_instruments))
        .route("/upload-history", get(instruments::upload_history))
        .route("/upload", post(legacy::upload))
        .route("/legacy/instruments", get(legacy::list_instruments))
        .route("/legacy/upload-history", get(legacy::upload_history))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(config.upload_max_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the browser UI. An empty allow-list means any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let allow_origin = if allowed.is_empty() { AllowOrigin::from(Any) } else { AllowOrigin::list(allowed) };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// API routes plus the Leptos SSR frontend and its `/pkg` assets.
///
/// # Errors
///
/// Returns an error if the Leptos configuration cannot be loaded (missing or
/// malformed `[workspace.metadata.leptos]` section or `LEPTOS_*` variables).
pub fn app(state: AppState, config: &ServerConfig) -> Result<Router, String> {
    let conf = get_configuration(None).map_err(|e| format!("leptos configuration: {e}"))?;
    let leptos_options = conf.leptos_options;
    let routes = generate_route_list(client::app::App);

    let leptos_router = Router::new()
        .leptos_routes(&leptos_options, routes, {
            let opts = leptos_options.clone();
            move || client::app::shell(opts.clone())
        })
        .with_state(leptos_options.clone());

    // Serve Leptos static assets (WASM, CSS, JS) from the site root /pkg directory.
    let site_root_path = PathBuf::from(leptos_options.site_root.as_ref());

    Ok(api_routes(state, config)
        .merge(leptos_router)
        .nest_service("/pkg", ServeDir::new(site_root_path.join("pkg"))))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
