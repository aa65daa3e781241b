//! Gemini `generateContent` client with JSON-schema constrained output.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{GenerationError, GenerationRequest, Generator};
use crate::database::{GeneratedPreview, RawSuggestion, RecipeDetails};

/// Number of previews asked for per search.
const SEARCH_RESULT_COUNT: usize = 6;

/// HTTP client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Send one prompt and parse the constrained JSON answer as `T`.
    async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: String,
        schema: Value,
    ) -> Result<T, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::NotConfigured(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                    GenerationError::RateLimited {
                        status: status.as_u16(),
                        message,
                    }
                }
                _ => GenerationError::Provider {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Malformed("empty response".to_string()));
        }

        debug!("Gemini returned {} bytes", text.len());
        serde_json::from_str(&text).map_err(|e| GenerationError::Malformed(e.to_string()))
    }
}

fn recipe_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "dishName": { "type": "STRING" },
            "englishName": { "type": "STRING", "description": "English name used to search for a photo" },
            "description": { "type": "STRING" },
            "meta": {
                "type": "OBJECT",
                "properties": {
                    "prepTime": { "type": "STRING" },
                    "cookTime": { "type": "STRING" },
                    "difficulty": { "type": "STRING" },
                    "calories": { "type": "STRING" },
                    "servings": { "type": "STRING" }
                },
                "required": ["prepTime", "cookTime", "difficulty", "calories", "servings"]
            },
            "ingredients": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "item": { "type": "STRING" },
                        "amount": { "type": "STRING" },
                        "note": { "type": "STRING" }
                    },
                    "required": ["item", "amount"]
                }
            },
            "steps": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "stepIndex": { "type": "INTEGER" },
                        "instruction": { "type": "STRING" },
                        "timer": {
                            "type": "OBJECT",
                            "properties": {
                                "hasTimer": { "type": "BOOLEAN" },
                                "durationSeconds": { "type": "INTEGER" },
                                "label": { "type": "STRING" }
                            },
                            "required": ["hasTimer", "durationSeconds", "label"]
                        },
                        "isCritical": { "type": "BOOLEAN" }
                    },
                    "required": ["stepIndex", "instruction", "timer", "isCritical"]
                }
            },
            "tips": { "type": "STRING" }
        },
        "required": ["dishName", "englishName", "description", "meta", "ingredients", "steps", "tips"]
    })
}

fn preview_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "dishName": { "type": "STRING" },
                "englishName": { "type": "STRING" },
                "description": { "type": "STRING" },
                "difficulty": { "type": "STRING" },
                "cookTime": { "type": "STRING" }
            },
            "required": ["dishName", "englishName", "description", "difficulty", "cookTime"]
        }
    })
}

fn suggestion_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "dishName": { "type": "STRING" },
                "searchQuery": { "type": "STRING", "description": "Restaurant name plus street or district" },
                "imageKeyword": { "type": "STRING", "description": "Short English keyword for a food photo" },
                "moodDescription": { "type": "STRING" },
                "suggestedActivity": { "type": "STRING" }
            },
            "required": ["dishName", "searchQuery", "imageKeyword", "moodDescription", "suggestedActivity"]
        }
    })
}

#[async_trait]
impl Generator<RecipeDetails> for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<RecipeDetails, GenerationError> {
        info!("Generating recipe for '{}'", request.subject);

        let prompt = format!(
            "You are a professional chef teaching a beginner to cook at home.\n\
             Write a detailed recipe for \"{}\".\n\
             Every step must be one clear action. When a step has a duration, set \
             timer.hasTimer = true, durationSeconds to the exact number of seconds and a short \
             label; otherwise hasTimer = false, durationSeconds = 0 and an empty label. Set \
             isCritical = true for steps that are easy to get wrong.",
            request.subject
        );

        let recipe: RecipeDetails = self.generate_json(prompt, recipe_schema()).await?;
        if recipe.steps.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(recipe)
    }
}

#[async_trait]
impl Generator<Vec<GeneratedPreview>> for GeminiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedPreview>, GenerationError> {
        info!("Generating search results for '{}'", request.subject);

        let prompt = format!(
            "Suggest {} dishes related to the keyword \"{}\". For each dish give its name, an \
             English name usable as a photo search keyword, a short description, a difficulty \
             (easy/medium/hard) and a cook time.",
            SEARCH_RESULT_COUNT, request.subject
        );

        let previews: Vec<GeneratedPreview> = self.generate_json(prompt, preview_schema()).await?;
        if previews.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(previews)
    }
}

#[async_trait]
impl Generator<Vec<RawSuggestion>> for GeminiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<RawSuggestion>, GenerationError> {
        info!("Generating dish ideas for '{}'", request.subject);

        let mut prompt = format!(
            "You are a food soulmate who understands moods. The user feels: \"{}\".\n\
             Suggest up to 8 specific, long-running, well-reviewed places and the signature \
             dish to order at each. searchQuery must name the place and its street or district \
             so it can be found on a map.",
            request.subject
        );
        if let Some(origin) = request.origin {
            prompt.push_str(&format!(
                "\nThe user is at GPS {:.6}, {:.6}.",
                origin.lat, origin.lng
            ));
        }
        if let Some(context) = &request.context {
            prompt.push_str(&format!("\nContext: {}", context));
        }

        let ideas: Vec<RawSuggestion> = self.generate_json(prompt, suggestion_schema()).await?;
        if ideas.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(ideas)
    }
}
