//! Recipe summarization via the AI gateway.

use crate::error::Error;
use crate::gateway::ai_gateway::{AiGatewayClient, ChatCompletionRequest, ChatMessage};
use log::*;
use serde::Deserialize;
use service::config::Config;

/// Model used for recipe summaries.
pub const SUMMARY_MODEL: &str = "google/gemini-2.5-flash";

/// Summaries are written for the German-language frontend.
const SYSTEM_PROMPT: &str = "Du bist ein hilfreicher Koch-Assistent. Erstelle kurze, prägnante Zusammenfassungen von Rezepten auf Deutsch. Fokussiere auf die wichtigsten Schritte und Besonderheiten.";

const FALLBACK_SUMMARY: &str = "Zusammenfassung nicht verfügbar.";
const MISSING_SECTION: &str = "Nicht verfügbar";

/// Recipe fields submitted for summarization
#[derive(Debug, Clone, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub instructions: Option<Vec<String>>,
}

/// Generate a short summary of the recipe.
///
/// One completion call per request, no retries. Rate-limit and credit
/// exhaustion errors from the gateway carry their user-facing messages.
pub async fn summarize_recipe(config: &Config, recipe: &Recipe) -> Result<String, Error> {
    info!("Summarizing recipe: {}", recipe.title);

    let client = AiGatewayClient::new(config)?;

    let request = ChatCompletionRequest {
        model: SUMMARY_MODEL.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(user_prompt(recipe)),
        ],
        temperature: 0.7,
        max_tokens: 300,
    };

    let completion = client.complete(&request).await?;
    let summary = completion
        .first_content()
        .unwrap_or_else(|| FALLBACK_SUMMARY.to_string());

    info!("Summary generated successfully");
    Ok(summary)
}

fn user_prompt(recipe: &Recipe) -> String {
    let ingredients = recipe
        .ingredients
        .as_deref()
        .filter(|items| !items.is_empty())
        .map(|items| items.join(", "))
        .unwrap_or_else(|| MISSING_SECTION.to_string());
    let instructions = recipe
        .instructions
        .as_deref()
        .filter(|items| !items.is_empty())
        .map(|items| items.join(". "))
        .unwrap_or_else(|| MISSING_SECTION.to_string());

    format!(
        "Fasse dieses Rezept zusammen:\n\nTitel: {}\nBeschreibung: {}\nZutaten: {}\nAnleitung: {}",
        recipe.title, recipe.description, ingredients, instructions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use clap::Parser;

    fn test_recipe() -> Recipe {
        Recipe {
            title: "Apfelkuchen".to_string(),
            description: "Klassischer Apfelkuchen mit Zimt".to_string(),
            ingredients: Some(vec!["Äpfel".to_string(), "Mehl".to_string()]),
            instructions: Some(vec!["Teig kneten".to_string(), "Backen".to_string()]),
        }
    }

    fn test_config(base_url: &str, api_key: Option<&str>) -> Config {
        let mut argv = vec![
            "backzauber_platform_rs".to_string(),
            "--ai-gateway-base-url".to_string(),
            base_url.to_string(),
        ];
        if let Some(key) = api_key {
            argv.push("--ai-gateway-api-key".to_string());
            argv.push(key.to_string());
        }
        Config::parse_from(argv)
    }

    #[tokio::test]
    async fn test_summarize_recipe_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer ai_key_123")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "model": "google/gemini-2.5-flash",
                "messages": [
                    {
                        "role": "system",
                        "content": SYSTEM_PROMPT,
                    },
                    {
                        "role": "user",
                        "content": "Fasse dieses Rezept zusammen:\n\nTitel: Apfelkuchen\nBeschreibung: Klassischer Apfelkuchen mit Zimt\nZutaten: Äpfel, Mehl\nAnleitung: Teig kneten. Backen",
                    }
                ],
                "temperature": 0.7,
                "max_tokens": 300,
            })))
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"Ein schneller Apfelkuchen."}}]}"#,
            )
            .create_async()
            .await;

        let config = test_config(&server.url(), Some("ai_key_123"));
        let summary = summarize_recipe(&config, &test_recipe()).await.unwrap();
        assert_eq!(summary, "Ein schneller Apfelkuchen.");
    }

    #[tokio::test]
    async fn test_summarize_recipe_missing_api_key() {
        let config = test_config("http://127.0.0.1:9", None);
        let err = summarize_recipe(&config, &test_recipe()).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
    }

    #[tokio::test]
    async fn test_summarize_recipe_falls_back_when_no_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let config = test_config(&server.url(), Some("ai_key_123"));
        let summary = summarize_recipe(&config, &test_recipe()).await.unwrap();
        assert_eq!(summary, FALLBACK_SUMMARY);
    }

    #[test]
    fn test_user_prompt_marks_missing_sections() {
        let recipe = Recipe {
            title: "Brot".to_string(),
            description: "Einfaches Brot".to_string(),
            ingredients: None,
            instructions: Some(vec![]),
        };
        let prompt = user_prompt(&recipe);
        assert!(prompt.contains("Zutaten: Nicht verfügbar"));
        assert!(prompt.contains("Anleitung: Nicht verfügbar"));
    }
}
