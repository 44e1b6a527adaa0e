//! Prompt construction for the target-company search.

use minijinja::Environment;
use once_cell::sync::Lazy;

use super::model::SearchCriteria;
use crate::error::{Result, ScoutError};

const TARGET_COMPANIES_TEMPLATE: &str = r#"Provide the top 3 target companies to buy based on the following criteria:
- Purchase Price Range: ${{ minimum_price }} to ${{ maximum_price }}
- Location: {{ location }}
- Growth Target Percentage: {{ growth_target_percent }}%
- Industry: {{ industry }}
Return the response as a JSON array of exactly 3 objects with the following structure:
{
  "company_name": "",
  "purchase_price": "",
  "location": "",
  "expected_growth": "",
  "industry": ""
}
IMPORTANT: Output ONLY valid JSON, no markdown formatting or code blocks."#;

static ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("target_companies", TARGET_COMPANIES_TEMPLATE)
        .expect("builtin template parses");
    env
});

/// Renders the target-company prompt from the current criteria.
///
/// Deterministic: the same criteria always produce the same prompt, and
/// every field value is embedded verbatim, including empty ones.
pub fn build_target_prompt(criteria: &SearchCriteria) -> Result<String> {
    let template = ENV
        .get_template("target_companies")
        .map_err(|err| ScoutError::internal(format!("prompt template missing: {err}")))?;

    template
        .render(criteria)
        .map_err(|err| ScoutError::internal(format!("prompt render failed: {err}")))
}
