//! Apollo organization search
//!
//! Open-search reader for investor firms. Without an API key, or with
//! `enable_mock`, deterministic sample firms are generated instead so the
//! whole workflow runs offline.

use super::InvestorSource;
use crate::types::{Investor, ParsedQuery, Result};
use crate::utils::toml_config::{env_secret, ApolloConfig};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

pub const SOURCE_TAG: &str = "apollo";

/// Tokens biasing the keyword search towards investment firms.
const KEYWORD_BIAS: [&str; 7] = [
    "capital",
    "ventures",
    "partners",
    "vc",
    "investment",
    "investments",
    "equity",
];

const MOCK_LIMIT: usize = 10;

pub struct ApolloSource {
    http: reqwest::Client,
    api_key: Option<String>,
    search_url: String,
    per_page_cap: usize,
    force_mock: bool,
}

impl ApolloSource {
    pub fn new(http: reqwest::Client, config: &ApolloConfig) -> Self {
        Self {
            http,
            api_key: env_secret(&config.api_key_env),
            search_url: config.search_url(),
            per_page_cap: config.per_page_cap.max(1),
            force_mock: config.mock_enabled(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Whether results are generated locally instead of fetched.
    pub fn is_mock(&self) -> bool {
        self.force_mock || self.api_key.is_none()
    }

    /// Live organization search. Requires an API key.
    pub async fn search(&self, query: &ParsedQuery, max_results: usize) -> Result<Vec<Investor>> {
        let api_key = self.api_key.as_deref().unwrap_or_default();

        let mut keywords: Vec<&str> = KEYWORD_BIAS.to_vec();
        keywords.extend(query.industry.as_deref());
        keywords.extend(query.investor_type.as_deref());

        let mut payload = json!({
            "page": 1,
            "per_page": max_results.clamp(1, self.per_page_cap),
            "q_organization_keywords": keywords.join(" "),
        });
        if let Some(ref industry) = query.industry {
            payload["industries"] = json!([industry]);
        }
        if let Some(ref location) = query.location {
            payload["locations"] = json!([location]);
        }

        let data: Value = self
            .http
            .post(&self.search_url)
            .header("X-Api-Key", api_key)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let organizations = data
            .get("organizations")
            .and_then(Value::as_array)
            .filter(|orgs| !orgs.is_empty())
            .or_else(|| data.get("companies").and_then(Value::as_array));

        Ok(organizations
            .map(|orgs| {
                orgs.iter()
                    .filter_map(|org| investor_from_organization(org, query))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl InvestorSource for ApolloSource {
    fn name(&self) -> &str {
        SOURCE_TAG
    }

    async fn fetch(&self, query: &ParsedQuery, max_results: usize) -> Vec<Investor> {
        if self.is_mock() {
            debug!("Apollo mock mode, generating sample firms");
            return mock_investors(query, max_results);
        }

        match self.search(query, max_results).await {
            Ok(investors) => investors,
            Err(e) => {
                warn!(error = %e, "Apollo search failed, continuing without open-search data");
                Vec::new()
            }
        }
    }
}

/// Deterministic sample firms for offline runs.
pub fn mock_investors(query: &ParsedQuery, max_results: usize) -> Vec<Investor> {
    let count = max_results.clamp(1, MOCK_LIMIT);
    let industry = title_case(query.industry.as_deref().unwrap_or("General"));
    let location = title_case(query.location.as_deref().unwrap_or("Global"));
    let ticket = query.ticket_size.unwrap_or_default();

    (1..=count)
        .map(|i| {
            let slug = format!("{}-{}-vc-{}", industry, location, i)
                .to_lowercase()
                .replace(' ', "-");
            Investor {
                id: Some(format!("mock-apollo-{}", slug)),
                name: format!("{} Capital {} #{}", industry, location, i),
                website: Some(format!("https://{}.com", slug)),
                linkedin_url: Some(format!("https://www.linkedin.com/company/{}", slug)),
                investor_type: Some("VC".to_string()),
                industry_focus: query.industry.clone(),
                location: query.location.clone(),
                ticket_min: ticket.minimum,
                ticket_max: ticket.maximum,
                is_warm_lead: false,
                source: Some(SOURCE_TAG.to_string()),
            }
        })
        .collect()
}

/// Map one organization from a search response. Nameless entries are skipped.
pub fn investor_from_organization(org: &Value, query: &ParsedQuery) -> Option<Investor> {
    let text = |key: &str| {
        org.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let name = text("name").or_else(|| text("organization_name"))?;

    let id = ["id", "_id", "uuid"]
        .iter()
        .find_map(|key| match org.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| name.clone());

    let website = text("website_url")
        .or_else(|| text("website"))
        .or_else(|| text("primary_domain").map(|domain| format!("https://{}", domain)));

    let industry = match org.get("industries").and_then(Value::as_array) {
        Some(list) if !list.is_empty() => Some(
            list.iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => text("industry"),
    };

    Some(Investor {
        id: Some(id),
        name,
        website,
        linkedin_url: text("linkedin_url").or_else(|| text("linkedin")),
        investor_type: Some("VC".to_string()),
        industry_focus: industry.or_else(|| query.industry.clone()),
        location: text("primary_location")
            .or_else(|| text("location"))
            .or_else(|| query.location.clone()),
        ticket_min: None,
        ticket_max: None,
        is_warm_lead: false,
        source: Some(SOURCE_TAG.to_string()),
    })
}

/// Capitalise the first letter of every word, lowercase the rest.
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for c in input.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TicketSize;

    fn fintech_berlin() -> ParsedQuery {
        ParsedQuery {
            industry: Some("fintech".to_string()),
            location: Some("berlin".to_string()),
            ticket_size: Some(TicketSize {
                minimum: Some(2_000_000.0),
                maximum: Some(5_000_000.0),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("fintech"), "Fintech");
        assert_eq!(title_case("new YORK"), "New York");
        assert_eq!(title_case("b2b-saas"), "B2B-Saas");
    }

    #[test]
    fn test_mock_investors_are_deterministic() {
        let investors = mock_investors(&fintech_berlin(), 3);
        assert_eq!(investors.len(), 3);
        assert_eq!(investors[0].name, "Fintech Capital Berlin #1");
        assert_eq!(
            investors[0].website.as_deref(),
            Some("https://fintech-berlin-vc-1.com")
        );
        assert_eq!(investors[2].id.as_deref(), Some("mock-apollo-fintech-berlin-vc-3"));
        assert_eq!(investors[0].ticket_min, Some(2_000_000.0));
        assert!(investors.iter().all(|i| !i.is_warm_lead));
        assert_eq!(investors, mock_investors(&fintech_berlin(), 3));
    }

    #[test]
    fn test_mock_count_is_clamped() {
        assert_eq!(mock_investors(&ParsedQuery::default(), 0).len(), 1);
        assert_eq!(mock_investors(&ParsedQuery::default(), 500).len(), 10);
        assert_eq!(
            mock_investors(&ParsedQuery::default(), 1)[0].name,
            "General Capital Global #1"
        );
    }

    #[test]
    fn test_organization_mapping_fallbacks() {
        let org = json!({
            "id": 42,
            "name": "Point Nine",
            "primary_domain": "pointnine.com",
            "industries": ["venture capital", "fintech"]
        });
        let investor = investor_from_organization(&org, &fintech_berlin()).unwrap();
        assert_eq!(investor.id.as_deref(), Some("42"));
        assert_eq!(investor.website.as_deref(), Some("https://pointnine.com"));
        assert_eq!(
            investor.industry_focus.as_deref(),
            Some("venture capital, fintech")
        );
        assert_eq!(investor.location.as_deref(), Some("berlin"));
        assert_eq!(investor.ticket_min, None);
    }

    #[test]
    fn test_nameless_organization_is_skipped() {
        let org = json!({"id": "x", "website_url": "https://x.com"});
        assert!(investor_from_organization(&org, &ParsedQuery::default()).is_none());
    }

    #[test]
    fn test_missing_key_means_mock() {
        let config = ApolloConfig {
            api_key_env: "JOCKEY_TEST_APOLLO_KEY_UNSET".to_string(),
            ..ApolloConfig::default()
        };
        let source = ApolloSource::new(reqwest::Client::new(), &config);
        assert!(source.is_mock());
        assert!(!source.with_api_key("k").is_mock());
    }
}
