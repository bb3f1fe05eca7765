//! Structured category extraction through a single classification call.

use crate::hiring::categories::{Category, CategoryValues};
use crate::openai::{ChatClient, ChatRequest, OpenAiError, ResponseFormat};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const SCHEMA_NAME: &str = "resume_extraction_schema";
const SYSTEM_PROMPT: &str =
    "You extract information from resumes and return them in a structured JSON format.";

/// Errors raised while deriving categories from free text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Classification call itself failed.
    #[error("Classification request failed: {0}")]
    Request(#[from] OpenAiError),
    /// Output could not be parsed into the expected shape.
    #[error("Classification output is not valid category JSON: {0}")]
    Malformed(String),
    /// Output parsed but left a category without values.
    #[error("Classification output left category '{0}' empty")]
    EmptyCategory(Category),
}

/// Shape the classifier must produce; doc comments become schema descriptions.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct CategoryExtraction {
    /// Roles held by the individual
    roles: Vec<String>,
    /// Technical skills of the individual
    skills: Vec<String>,
    /// Seniority level
    seniority: Vec<String>,
    /// Related industries
    industry: Vec<String>,
}

impl CategoryExtraction {
    fn into_values(self) -> Result<CategoryValues, ExtractionError> {
        let mut values = CategoryValues::new();
        for (category, raw) in [
            (Category::Roles, self.roles),
            (Category::Skills, self.skills),
            (Category::Seniority, self.seniority),
            (Category::Industry, self.industry),
        ] {
            let cleaned: Vec<String> = raw
                .into_iter()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect();
            if cleaned.is_empty() {
                return Err(ExtractionError::EmptyCategory(category));
            }
            values.insert(category, cleaned);
        }
        Ok(values)
    }
}

/// JSON schema sent as the structured response format.
pub fn extraction_schema() -> Value {
    let mut schema =
        serde_json::to_value(schemars::schema_for!(CategoryExtraction)).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut schema {
        map.remove("$schema");
        map.remove("title");
    }
    schema
}

fn extraction_prompt(text: &str) -> String {
    format!(
        "Extract or predict the following information from the given resume text:\n\
         - Roles: the roles held by the individual (e.g., Software Engineer, Project Manager).\n\
         - Skills: the technical skills possessed by the individual (e.g., Java, Python, Project Management).\n\
         - Seniority: extract or predict the seniority level from experience, technologies, etc. \
         (e.g., Junior, Mid-level, Senior, or years of experience).\n\
         - Industry: the industry/industries related to the experience (e.g., IT, Finance, Healthcare).\n\
         Never leave a field empty or unknown; make a reasonable prediction when the text does not say.\n\n\
         Resume:\n{text}"
    )
}

/// Derive values for every category of the fixed set from `text`.
///
/// The classifier is asked to infer categories the text does not state, so a successful result
/// always carries a non-empty list for each category.
pub async fn extract_categories(
    chat: &dyn ChatClient,
    model: &str,
    text: &str,
) -> Result<CategoryValues, ExtractionError> {
    let request = ChatRequest::new(model, extraction_prompt(text))
        .with_system(SYSTEM_PROMPT)
        .with_response_format(ResponseFormat {
            name: SCHEMA_NAME.to_string(),
            schema: extraction_schema(),
        });

    let content = chat.complete(request).await?;
    let values = parse_extraction(&content)?;
    tracing::debug!(
        roles = values[&Category::Roles].len(),
        skills = values[&Category::Skills].len(),
        seniority = values[&Category::Seniority].len(),
        industry = values[&Category::Industry].len(),
        "Extracted categories"
    );
    Ok(values)
}

fn parse_extraction(content: &str) -> Result<CategoryValues, ExtractionError> {
    let extraction: CategoryExtraction = serde_json::from_str(strip_code_fence(content))
        .map_err(|error| ExtractionError::Malformed(error.to_string()))?;
    extraction.into_values()
}

/// Models without schema enforcement sometimes wrap JSON in a markdown fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
