use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for POST /recipes/summarize
#[derive(Debug, Deserialize, ToSchema)]
pub struct SummarizeParams {
    pub recipe: RecipeParams,
}

/// Recipe fields submitted for summarization
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeParams {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub instructions: Option<Vec<String>>,
}

impl From<RecipeParams> for domain::Recipe {
    fn from(params: RecipeParams) -> Self {
        domain::Recipe {
            title: params.title,
            description: params.description,
            ingredients: params.ingredients,
            instructions: params.instructions,
        }
    }
}
