#![deny(warnings)]

//! Hand-off with external cost and price suggestion services.
//!
//! The calculators never call out themselves. A [`SuggestionClient`] talks to
//! the service; [`Advisor`] tries the configured models in order and turns the
//! first parseable response into the same cost-item and price-tier shapes the
//! form layer produces.

pub mod parse;
pub mod replay;

use hpp_core::{
    format_currency_display, format_localized_decimal, FixedCostItem, HppBreakdown,
    PriceOverrides, VariableCostItem,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub use parse::{
    parse_all_costs, parse_fixed_costs, parse_price_overrides, parse_variable_costs,
    strip_code_fences, CostSuggestion,
};
pub use replay::ReplayClient;

/// Models tried when none are configured, in order.
pub const DEFAULT_MODELS: [&str; 5] = [
    "gemini-2.0-flash-exp",
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-1.5-flash-latest",
    "gemini-1.5-pro-latest",
];

/// Environment variable holding the service key.
pub const API_KEY_ENV: &str = "HPP_AI_API_KEY";
/// Optional comma-separated model list.
pub const MODELS_ENV: &str = "HPP_AI_MODELS";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdvisorError {
    #[error("suggestion service API key is not configured")]
    MissingApiKey,
    #[error("no JSON found in response")]
    NoJsonFound,
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("response contained no usable items")]
    NoValidItems,
    #[error("model request failed: {0}")]
    Request(String),
    #[error("all models failed; last error: {0}")]
    AllModelsFailed(String),
}

/// Service key and model order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvisorConfig {
    pub api_key: Option<String>,
    pub models: Vec<String>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl AdvisorConfig {
    /// Read [`API_KEY_ENV`] and [`MODELS_ENV`].
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(MODELS_ENV).ok(),
        )
    }

    fn from_vars(api_key: Option<String>, models: Option<String>) -> Self {
        let mut cfg = Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            ..Self::default()
        };
        if let Some(list) = models {
            let parsed: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
            if !parsed.is_empty() {
                cfg.models = parsed;
            }
        }
        cfg
    }
}

/// Product the suggestions are for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInfo {
    pub name: String,
    pub category: String,
}

/// What is being asked of the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuggestionRequest {
    VariableCosts(ProductInfo),
    FixedCosts(ProductInfo),
    AllCosts(ProductInfo),
    PriceTiers {
        product: ProductInfo,
        hpp: HppBreakdown,
        target_sales_per_month: Decimal,
    },
}

impl SuggestionRequest {
    /// Short name used to file captured responses.
    pub fn kind(&self) -> &'static str {
        match self {
            SuggestionRequest::VariableCosts(_) => "variable-costs",
            SuggestionRequest::FixedCosts(_) => "fixed-costs",
            SuggestionRequest::AllCosts(_) => "all-costs",
            SuggestionRequest::PriceTiers { .. } => "price-tiers",
        }
    }

    fn product(&self) -> &ProductInfo {
        match self {
            SuggestionRequest::VariableCosts(p)
            | SuggestionRequest::FixedCosts(p)
            | SuggestionRequest::AllCosts(p) => p,
            SuggestionRequest::PriceTiers { product, .. } => product,
        }
    }

    /// Instruction text sent to the model.
    pub fn prompt(&self) -> String {
        let product = self.product();
        let mut subject = format!("\"{}\"", product.name.trim());
        if !product.category.trim().is_empty() {
            subject.push_str(&format!(" (category: {})", product.category.trim()));
        }
        match self {
            SuggestionRequest::VariableCosts(_) => format!(
                "List the variable costs of producing one unit of {subject} for a small \
                 Indonesian food business. Reply with a JSON array only, amounts in whole \
                 rupiah: [{{\"name\": \"Kopi bubuk\", \"cost\": 2500}}]"
            ),
            SuggestionRequest::FixedCosts(_) => format!(
                "List the monthly fixed costs of selling {subject} for a small Indonesian \
                 food business. Reply with a JSON array only, amounts in whole rupiah: \
                 [{{\"name\": \"Sewa tempat\", \"totalCost\": 2000000}}]"
            ),
            SuggestionRequest::AllCosts(_) => format!(
                "List the per-unit variable costs and the monthly fixed costs of {subject} \
                 for a small Indonesian food business. Reply with a JSON object only: \
                 {{\"variableCosts\": [{{\"name\": \"...\", \"cost\": 2500}}], \
                 \"fixedCosts\": [{{\"name\": \"...\", \"totalCost\": 2000000}}]}}"
            ),
            SuggestionRequest::PriceTiers {
                hpp,
                target_sales_per_month,
                ..
            } => format!(
                "Recommend selling prices for {subject}.\n\
                 - HPP: {}\n\
                 - Variable cost per unit: {}\n\
                 - Fixed cost per month: {}\n\
                 - Target sales per month: {} units\n\
                 Reply with a JSON object only, prices in whole rupiah and margins in \
                 percent: {{\"competitive\": {{\"price\": 0, \"margin\": 30, \
                 \"explanation\": \"...\"}}, \"standard\": {{..}}, \"premium\": {{..}}}}. \
                 Competitive margin 20-40%, standard 50-70%, premium 70-100%.",
                format_currency_display(hpp.hpp),
                format_currency_display(hpp.variable_cost_per_unit),
                format_currency_display(hpp.total_fixed_cost_per_month),
                format_localized_decimal(*target_sales_per_month, 0),
            ),
        }
    }
}

/// Transport to a suggestion service. Returns the raw response text.
pub trait SuggestionClient {
    fn generate(&self, model: &str, request: &SuggestionRequest) -> Result<String, AdvisorError>;

    /// Whether calls need [`AdvisorConfig::api_key`].
    fn requires_api_key(&self) -> bool {
        true
    }
}

/// Tries each configured model in turn until one yields a usable response.
pub struct Advisor<C> {
    config: AdvisorConfig,
    client: C,
}

impl<C: SuggestionClient> Advisor<C> {
    pub fn new(config: AdvisorConfig, client: C) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    fn first_success<T>(
        &self,
        request: &SuggestionRequest,
        parse: impl Fn(&str) -> Result<T, AdvisorError>,
    ) -> Result<T, AdvisorError> {
        if self.client.requires_api_key() && self.config.api_key.is_none() {
            return Err(AdvisorError::MissingApiKey);
        }
        let mut last_error: Option<AdvisorError> = None;
        for model in &self.config.models {
            match self
                .client
                .generate(model, request)
                .and_then(|text| parse(&text))
            {
                Ok(value) => {
                    info!(model = %model, "suggestion accepted");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(model = %model, %err, "model failed, trying next");
                    last_error = Some(err);
                }
            }
        }
        Err(AdvisorError::AllModelsFailed(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no models configured".to_string()),
        ))
    }

    pub fn variable_costs(&self, product: &ProductInfo) -> Result<Vec<VariableCostItem>, AdvisorError> {
        let request = SuggestionRequest::VariableCosts(product.clone());
        self.first_success(&request, parse_variable_costs)
    }

    pub fn fixed_costs(&self, product: &ProductInfo) -> Result<Vec<FixedCostItem>, AdvisorError> {
        let request = SuggestionRequest::FixedCosts(product.clone());
        self.first_success(&request, parse_fixed_costs)
    }

    pub fn all_costs(&self, product: &ProductInfo) -> Result<CostSuggestion, AdvisorError> {
        let request = SuggestionRequest::AllCosts(product.clone());
        self.first_success(&request, parse_all_costs)
    }

    /// Price tiers for a product whose HPP is already known.
    pub fn price_tiers(
        &self,
        product: &ProductInfo,
        hpp: HppBreakdown,
        target_sales_per_month: Decimal,
    ) -> Result<PriceOverrides, AdvisorError> {
        let request = SuggestionRequest::PriceTiers {
            product: product.clone(),
            hpp,
            target_sales_per_month,
        };
        self.first_success(&request, parse_price_overrides)
    }
}
