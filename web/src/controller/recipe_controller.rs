//! Controller for recipe AI operations.

use crate::params::recipe::SummarizeParams;
use crate::{AppState, Error};

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use domain::recipe_summary;
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

/// Response body carrying the generated summary
#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

/// POST /recipes/summarize
///
/// Generate a short summary of the submitted recipe via the AI gateway.
#[utoipa::path(
    post,
    path = "/recipes/summarize",
    request_body = SummarizeParams,
    responses(
        (status = 200, description = "Summary generated", body = SummaryResponse),
        (status = 402, description = "AI gateway credits exhausted"),
        (status = 429, description = "AI gateway rate limit reached"),
        (status = 500, description = "AI gateway not configured or upstream error"),
    )
)]
pub async fn summarize(
    State(app_state): State<AppState>,
    Json(params): Json<SummarizeParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST summarize recipe");

    let recipe: domain::Recipe = params.recipe.into();
    let summary = recipe_summary::summarize_recipe(&app_state.config, &recipe).await?;

    Ok(Json(SummaryResponse { summary }))
}
