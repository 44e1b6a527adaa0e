//! Search domain models.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// The five-field input record driving prompt construction.
///
/// Every field is raw text pending interpretation by the generative
/// service. Empty string is the valid "unset" value; no cross-field
/// validation is applied (a minimum above the maximum flows through
/// verbatim).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SearchCriteria {
    /// Minimum purchase price, numeric-formatted text.
    #[serde(default)]
    pub minimum_price: String,
    /// Maximum purchase price, numeric-formatted text.
    #[serde(default)]
    pub maximum_price: String,
    /// Free-text location.
    #[serde(default)]
    pub location: String,
    /// Growth target percentage, numeric-formatted text.
    #[serde(default)]
    pub growth_target_percent: String,
    /// Free-text industry.
    #[serde(default)]
    pub industry: String,
}

impl SearchCriteria {
    /// Assigns a field. Pure assignment, no validation, no side effects.
    pub fn set(&mut self, field: SearchField, value: impl Into<String>) {
        let value = value.into();
        match field {
            SearchField::MinimumPrice => self.minimum_price = value,
            SearchField::MaximumPrice => self.maximum_price = value,
            SearchField::Location => self.location = value,
            SearchField::GrowthTargetPercent => self.growth_target_percent = value,
            SearchField::Industry => self.industry = value,
        }
    }

    /// Reads a field's current value.
    pub fn get(&self, field: SearchField) -> &str {
        match field {
            SearchField::MinimumPrice => &self.minimum_price,
            SearchField::MaximumPrice => &self.maximum_price,
            SearchField::Location => &self.location,
            SearchField::GrowthTargetPercent => &self.growth_target_percent,
            SearchField::Industry => &self.industry,
        }
    }
}

/// Names of the criteria fields, for field-addressed updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    MinimumPrice,
    MaximumPrice,
    Location,
    GrowthTargetPercent,
    Industry,
}

impl SearchField {
    /// All fields, in form order.
    pub const ALL: [SearchField; 5] = [
        SearchField::MinimumPrice,
        SearchField::MaximumPrice,
        SearchField::Location,
        SearchField::GrowthTargetPercent,
        SearchField::Industry,
    ];

    /// Human-facing label for the input surface.
    pub fn label(&self) -> &'static str {
        match self {
            SearchField::MinimumPrice => "Minimum Purchase Price ($)",
            SearchField::MaximumPrice => "Maximum Purchase Price ($)",
            SearchField::Location => "Location",
            SearchField::GrowthTargetPercent => "Growth Target Percentage (%)",
            SearchField::Industry => "Industry",
        }
    }
}

impl std::str::FromStr for SearchField {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "min" | "minimum_price" => Ok(SearchField::MinimumPrice),
            "max" | "maximum_price" => Ok(SearchField::MaximumPrice),
            "location" => Ok(SearchField::Location),
            "growth" | "growth_target_percent" => Ok(SearchField::GrowthTargetPercent),
            "industry" => Ok(SearchField::Industry),
            other => Err(ScoutError::internal(format!(
                "unknown search field: {other}"
            ))),
        }
    }
}

/// One structured result record returned by the generative service.
///
/// Fields are taken as-is; a key missing from the response defaults to
/// the empty string rather than failing the whole result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCandidate {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub purchase_price: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub expected_growth: String,
    #[serde(default)]
    pub industry: String,
}

impl CompanyCandidate {
    /// Interprets a generative-service response as an ordered sequence of
    /// candidates.
    ///
    /// The response must be a JSON array of objects; order is preserved
    /// verbatim. Anything else (non-array payload, non-object element,
    /// non-string scalar in a known key) is a malformed response, never a
    /// panic.
    pub fn from_response(value: serde_json::Value) -> Result<Vec<CompanyCandidate>> {
        serde_json::from_value(value)
            .map_err(|err| ScoutError::malformed_response(format!("expected an array of candidate records: {err}")))
    }
}

/// The state machine governing one search request's progress.
///
/// Exactly one state is active at a time. Entering `InFlight` replaces
/// any prior `Resolved` results, so stale data never coexists with a
/// pending request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchLifecycle {
    #[default]
    Idle,
    InFlight,
    Resolved {
        results: Vec<CompanyCandidate>,
    },
    Failed,
}

impl SearchLifecycle {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved { .. } | Self::Failed)
    }

    /// The candidates to render. Empty unless resolved.
    pub fn results(&self) -> &[CompanyCandidate] {
        match self {
            Self::Resolved { results } => results,
            _ => &[],
        }
    }
}
