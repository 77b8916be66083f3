use crate::controller::{health_check_controller, oauth_controller, recipe_controller};
use crate::AppState;

use axum::http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "BackZauber Platform API"
        ),
        paths(
            health_check_controller::health_check,
            oauth_controller::github_callback,
            recipe_controller::summarize,
        ),
        components(
            schemas(
                crate::params::recipe::SummarizeParams,
                crate::params::recipe::RecipeParams,
                recipe_controller::SummaryResponse,
            )
        ),
        tags(
            (name = "backzauber_platform", description = "BackZauber Recipe Platform API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(oauth_routes(app_state.clone()))
        .merge(recipe_routes(app_state))
        .layer(cors_layer())
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn oauth_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/auth/github/callback",
            get(oauth_controller::github_callback),
        )
        .with_state(app_state)
}

fn recipe_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/recipes/summarize", post(recipe_controller::summarize))
        .with_state(app_state)
}

/// Permissive cross-origin policy for the public endpoints: they are called
/// from the frontend origin and via provider redirects, and carry no cookies.
/// Preflight OPTIONS requests are answered by this layer.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            CONTENT_TYPE,
        ])
}
