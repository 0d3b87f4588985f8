//! Natural language query interpretation over an OpenAI-compatible API
//!
//! Two passes:
//! 1. Component detection: which criteria does the query mention at all?
//! 2. Extraction: a prompt listing only the detected components asks for
//!    their values as a JSON object.
//!
//! The raw object is then normalised into a [`ParsedQuery`] by
//! [`parsed_query_from_value`].

use super::QueryInterpreter;
use crate::types::{AppError, ParsedQuery, Result, TicketSize};
use crate::utils::toml_config::{env_secret, OpenAiConfig};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Components the extractor knows how to describe, in prompt order.
const COMPONENT_SCHEMA: &[(&str, &str)] = &[
    ("industry", "string - industry/sector focus (e.g. 'automotive', 'fintech')"),
    ("location", "string - geographic location (e.g. 'Germany', 'Silicon Valley')"),
    ("ticket_size", "object - investment range with min/max numbers"),
    ("company_stage", "string - startup stage (e.g. 'seed', 'series-a', 'growth')"),
    ("source_project", "string - existing project name to reference"),
    ("new_project", "string - new project name to create"),
    ("investor_type", "string - type of investor (e.g. 'VC', 'PE', 'corporate')"),
    ("requirements", "array - special requirements (e.g. ['dry powder', 'warm leads'])"),
    ("timeframe", "string - investment timeframe (e.g. 'last 12 months', 'currently active')"),
    ("portfolio_focus", "string - business model focus (e.g. 'B2B', 'B2C', 'marketplace')"),
    ("exit_strategy", "string - preferred exit (e.g. 'IPO', 'acquisition')"),
];

/// Used when detection fails or returns nothing parseable.
const FALLBACK_COMPONENTS: &[&str] = &["industry", "location"];

const DETECTION_PROMPT: &str = r#"Analyze this query and identify ALL components that are mentioned or implied.
Be generous - if something could reasonably be extracted, include it.

Possible components:
- "industry" (automotive, fintech, healthcare, venture capital, etc.)
- "location" (geographic focus)
- "ticket_size" (investment amount/range)
- "company_stage" (startup, growth, late-stage)
- "source_project" (existing project references)
- "new_project" (creating new project)
- "investor_type" (VC, PE, angel, corporate)
- "requirements" (dry powder, warm leads, etc.)
- "timeframe" (recent investments, active now)
- "portfolio_focus" (B2B, B2C, etc.)
- "exit_strategy" (IPO, acquisition focus)

If the query mentions "venture capital" or "VC", include BOTH "industry" AND "investor_type".

Example response: ["industry", "location", "ticket_size", "new_project"]

Return ONLY the JSON array, no other text."#;

/// Interpreter backed by chat completions.
pub struct OpenAiInterpreter {
    http: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    temperature: f32,
}

impl OpenAiInterpreter {
    /// Create an interpreter; the API key is read from `config.api_key_env`.
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            api_key: env_secret(&config.api_key_env),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// Override the API key (tests, embedding).
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    async fn chat(&self, api_key: &str, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": max_tokens,
            "temperature": self.temperature,
        });

        let response: Value = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response["choices"][0]["message"]["content"]
            .as_str()
            .map(|content| content.trim().to_string())
            .ok_or_else(|| AppError::Http("completion response has no message content".to_string()))
    }

    async fn detect_components(&self, api_key: &str, query: &str) -> Vec<String> {
        let content = match self
            .chat(api_key, DETECTION_PROMPT, &format!("Query: {}", query), 150)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Component detection failed, using fallback components");
                return fallback_components();
            }
        };

        let parsed = extract_json_array(&content)
            .and_then(|raw| serde_json::from_str::<Vec<Value>>(raw).ok())
            .map(|items| {
                items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect::<Vec<_>>()
            });

        match parsed {
            Some(components) => components,
            None => {
                warn!(content = %content, "Could not parse detected components, using fallback");
                fallback_components()
            }
        }
    }
}

#[async_trait]
impl QueryInterpreter for OpenAiInterpreter {
    async fn interpret(&self, query: &str) -> Result<ParsedQuery> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Interpretation("OpenAI API key is not configured".to_string())
        })?;

        let components = self.detect_components(api_key, query).await;
        let schema = build_schema(&components);
        debug!(?components, "Detected query components");

        let content = self
            .chat(api_key, &extraction_prompt(&schema), query, 400)
            .await
            .map_err(|e| AppError::Interpretation(format!("extraction request failed: {}", e)))?;

        let raw = extract_json_object(&content)
            .ok_or_else(|| AppError::Interpretation("Invalid JSON response".to_string()))?;
        let mut value: Value = serde_json::from_str(raw)
            .map_err(|e| AppError::Interpretation(format!("Invalid JSON response: {}", e)))?;

        if let Some(object) = value.as_object_mut() {
            object.insert(
                "_metadata".to_string(),
                json!({
                    "detected_components": components,
                    "extraction_schema": schema.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
                    "query_complexity": components.len(),
                }),
            );
        }

        parsed_query_from_value(&value)
    }
}

fn fallback_components() -> Vec<String> {
    FALLBACK_COMPONENTS.iter().map(|c| c.to_string()).collect()
}

/// Schema entries for the detected components that are known, in prompt order.
pub fn build_schema(components: &[String]) -> Vec<(&'static str, &'static str)> {
    COMPONENT_SCHEMA
        .iter()
        .filter(|(name, _)| components.iter().any(|c| c == name))
        .copied()
        .collect()
}

fn extraction_prompt(schema: &[(&str, &str)]) -> String {
    let fields = schema
        .iter()
        .map(|(name, description)| format!("- {}: {}", name, description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Extract the following information from the user query and return it as valid JSON:

{}

Rules:
- Only include fields that have actual values from the query
- Use null for fields mentioned but without specific values
- For ticket_size, convert amounts to numbers (e.g. "5-10M" = {{"min":5000000, "max":10000000}})
- If the query mentions "venture capital" or "VC", set industry="venture capital" and investor_type="VC"

Example format:
{{
    "industry": "venture capital",
    "location": "Netherlands",
    "investor_type": "VC"
}}

Return ONLY the JSON object, no other text."#,
        fields
    )
}

/// The outermost `{...}` span of a model reply.
pub fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// The first `[...]` span of a model reply.
pub fn extract_json_array(content: &str) -> Option<&str> {
    let start = content.find('[')?;
    let end = start + content[start..].find(']')?;
    Some(&content[start..=end])
}

/// Normalise a raw extraction object into a [`ParsedQuery`].
///
/// - An `error` entry is an interpretation failure.
/// - `ticket_size` accepts `min`/`minimum` and `max`/`maximum`, as numbers
///   or numeric strings; a ticket object with no bound is dropped.
/// - `requirements` accepts an array or a single string.
/// - Blank strings count as absent.
pub fn parsed_query_from_value(value: &Value) -> Result<ParsedQuery> {
    let object = value.as_object().ok_or_else(|| {
        AppError::Interpretation("extraction result is not a JSON object".to_string())
    })?;

    if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(AppError::Interpretation(message));
    }

    Ok(ParsedQuery {
        industry: string_field(object, "industry"),
        location: string_field(object, "location"),
        ticket_size: object.get("ticket_size").and_then(ticket_size),
        company_stage: string_field(object, "company_stage"),
        source_project: string_field(object, "source_project"),
        new_project: string_field(object, "new_project"),
        investor_type: string_field(object, "investor_type"),
        requirements: object.get("requirements").and_then(requirements),
        timeframe: string_field(object, "timeframe"),
        portfolio_focus: string_field(object, "portfolio_focus"),
        exit_strategy: string_field(object, "exit_strategy"),
        metadata: object.get("_metadata").filter(|m| !m.is_null()).cloned(),
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn ticket_size(value: &Value) -> Option<TicketSize> {
    let object = value.as_object()?;
    let bound = |short: &str, long: &str| {
        object
            .get(short)
            .and_then(number)
            .or_else(|| object.get(long).and_then(number))
    };

    let ticket = TicketSize {
        minimum: bound("min", "minimum"),
        maximum: bound("max", "maximum"),
    };
    ticket.is_bounded().then_some(ticket)
}

fn requirements(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            (!items.is_empty()).then_some(items)
        }
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalises_ticket_size_keys() {
        let value = json!({
            "industry": "fintech",
            "location": "Berlin",
            "ticket_size": {"min": 2000000, "maximum": "5000000"}
        });
        let parsed = parsed_query_from_value(&value).unwrap();

        assert_eq!(parsed.industry.as_deref(), Some("fintech"));
        assert_eq!(parsed.location.as_deref(), Some("Berlin"));
        assert_eq!(
            parsed.ticket_size,
            Some(TicketSize {
                minimum: Some(2_000_000.0),
                maximum: Some(5_000_000.0),
            })
        );
    }

    #[test]
    fn test_zero_minimum_survives_normalisation() {
        let value = json!({"ticket_size": {"min": 0, "max": null}});
        let parsed = parsed_query_from_value(&value).unwrap();
        assert_eq!(parsed.ticket_size.unwrap().minimum, Some(0.0));
    }

    #[test]
    fn test_empty_ticket_object_is_dropped() {
        let value = json!({"ticket_size": {"min": null}});
        assert!(parsed_query_from_value(&value).unwrap().ticket_size.is_none());
    }

    #[test]
    fn test_error_key_is_interpretation_failure() {
        let value = json!({"error": "Invalid JSON response", "_metadata": {}});
        let err = parsed_query_from_value(&value).unwrap_err();
        assert_eq!(err.to_string(), "Parse error: Invalid JSON response");
    }

    #[test]
    fn test_requirements_accept_string_or_array() {
        let parsed = parsed_query_from_value(&json!({"requirements": "dry powder"})).unwrap();
        assert_eq!(parsed.requirements, Some(vec!["dry powder".to_string()]));

        let parsed =
            parsed_query_from_value(&json!({"requirements": ["warm leads", " ", 3]})).unwrap();
        assert_eq!(parsed.requirements, Some(vec!["warm leads".to_string()]));
    }

    #[test]
    fn test_blank_and_null_strings_are_absent() {
        let parsed =
            parsed_query_from_value(&json!({"industry": "  ", "location": null})).unwrap();
        assert!(parsed.industry.is_none());
        assert!(parsed.location.is_none());
        assert!(!parsed.has_search_criteria());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(parsed_query_from_value(&json!(["industry"])).is_err());
    }

    #[test]
    fn test_build_schema_keeps_known_components_in_order() {
        let components = vec![
            "location".to_string(),
            "unknown".to_string(),
            "industry".to_string(),
        ];
        let names: Vec<&str> = build_schema(&components).iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["industry", "location"]);
    }

    #[test]
    fn test_extract_json_spans() {
        assert_eq!(
            extract_json_object("Sure! {\"a\": {\"b\": 1}} done"),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(extract_json_object("no json"), None);
        assert_eq!(
            extract_json_array("Here: [\"industry\", \"location\"] and [x]"),
            Some("[\"industry\", \"location\"]")
        );
        assert_eq!(extract_json_array("]["), None);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_interpretation() {
        let interpreter = OpenAiInterpreter {
            http: reqwest::Client::new(),
            api_key: None,
            api_base: "http://127.0.0.1:1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
        };
        let err = interpreter.interpret("find investors").await.unwrap_err();
        assert!(err.to_string().starts_with("Parse error"));
    }
}
