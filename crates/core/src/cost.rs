//! Token and cost accounting.
//!
//! Prices are injected through a [`PricingTable`]. A [`CostCalculator`] is
//! bound to exactly one model, and building it fails if that model has no
//! price, so per-call cost computation itself cannot fail.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::genview_core::SdkError;
use crate::genview_types::usage::{
    round_to, UsageMetadata, UsageRecord, LOCAL_DECIMALS, USD_DECIMALS,
};

pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TASK_NAME: &str = "virtual_tryon";
pub const USD_TO_KRW_RATE: f64 = 1380.0;
pub const DEFAULT_LOCAL_CURRENCY: &str = "KRW";

/// USD price per one million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPrice {
    pub input_price_per_million_tokens: f64,
    pub output_price_per_million_tokens: f64,
}

impl ModelPrice {
    pub const fn new(input: f64, output: f64) -> Self {
        Self {
            input_price_per_million_tokens: input,
            output_price_per_million_tokens: output,
        }
    }
}

pub const GEMINI_IMAGE_PRICE: ModelPrice = ModelPrice::new(0.35, 30.0);

/// Price list keyed by model identifier, plus the local-currency rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTable {
    #[serde(default)]
    pub models: HashMap<String, ModelPrice>,
    #[serde(default = "default_rate")]
    pub usd_to_local_rate: f64,
    #[serde(default = "default_currency")]
    pub local_currency: String,
}

fn default_rate() -> f64 {
    USD_TO_KRW_RATE
}

fn default_currency() -> String {
    DEFAULT_LOCAL_CURRENCY.to_string()
}

impl Default for PricingTable {
    fn default() -> Self {
        let models = HashMap::from([
            (DEFAULT_MODEL_ID.to_string(), GEMINI_IMAGE_PRICE),
            ("gemini-2.5-pro".to_string(), ModelPrice::new(1.25, 10.0)),
            ("gemini-2.5-flash".to_string(), ModelPrice::new(0.3, 2.5)),
            ("gemini-2.5-flash-lite".to_string(), ModelPrice::new(0.1, 0.4)),
            ("gemini-2.0-flash".to_string(), ModelPrice::new(0.1, 0.4)),
        ]);
        Self {
            models,
            usd_to_local_rate: USD_TO_KRW_RATE,
            local_currency: DEFAULT_LOCAL_CURRENCY.to_string(),
        }
    }
}

impl PricingTable {
    /// Parse a table from JSON such as
    /// `{"models": {"m": {"inputPricePerMillionTokens": 1, ...}}, "usdToLocalRate": 1380}`.
    pub fn from_json_str(raw: &str) -> Result<Self, SdkError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_model(mut self, model_id: impl Into<String>, price: ModelPrice) -> Self {
        self.models.insert(model_id.into(), price);
        self
    }

    /// Look up a model, ignoring ASCII case and a leading `models/` path.
    pub fn price_for(&self, model_id: &str) -> Result<ModelPrice, SdkError> {
        self.models
            .iter()
            .find(|(k, _)| same_model(k, model_id))
            .map(|(_, p)| *p)
            .ok_or_else(|| SdkError::UnknownModel {
                model_id: model_id.to_string(),
            })
    }
}

/// Model ids compare equal ignoring ASCII case and a leading `models/`.
pub fn same_model(a: &str, b: &str) -> bool {
    let bare = |id: &str| id.trim().trim_start_matches("models/").to_string();
    bare(a).eq_ignore_ascii_case(&bare(b))
}

/// Converts provider usage metadata into [`UsageRecord`]s for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct CostCalculator {
    model_name: String,
    task_name: String,
    price: ModelPrice,
    usd_to_local_rate: f64,
}

impl CostCalculator {
    pub fn new(
        pricing: &PricingTable,
        model_name: impl Into<String>,
        task_name: impl Into<String>,
    ) -> Result<Self, SdkError> {
        let model_name = model_name.into();
        let price = pricing.price_for(&model_name)?;
        if !pricing.usd_to_local_rate.is_finite() || pricing.usd_to_local_rate < 0.0 {
            return Err(SdkError::invalid_argument(format!(
                "invalid exchange rate {}",
                pricing.usd_to_local_rate
            )));
        }
        Ok(Self {
            model_name,
            task_name: task_name.into(),
            price,
            usd_to_local_rate: pricing.usd_to_local_rate,
        })
    }

    /// Calculator for the default image model and task with default prices.
    pub fn gemini_image_default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_ID.to_string(),
            task_name: DEFAULT_TASK_NAME.to_string(),
            price: GEMINI_IMAGE_PRICE,
            usd_to_local_rate: USD_TO_KRW_RATE,
        }
    }

    /// Whether this calculator prices `model_id`.
    pub fn prices(&self, model_id: &str) -> bool {
        same_model(&self.model_name, model_id)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn price(&self) -> ModelPrice {
        self.price
    }

    pub fn zero(&self) -> UsageRecord {
        UsageRecord::zero(self.model_name.clone(), self.task_name.clone())
    }

    /// Build a record from provider metadata; `None` yields a zero record.
    pub fn from_usage_metadata(&self, metadata: Option<&UsageMetadata>) -> UsageRecord {
        let Some(md) = metadata else {
            return self.zero();
        };

        let prompt_tokens = md.prompt_token_count.unwrap_or(0);
        let candidate_tokens = md.candidates_token_count.unwrap_or(0);
        let total_tokens = md.total_token_count.unwrap_or(0);

        let input_cost =
            (prompt_tokens as f64 / 1_000_000.0) * self.price.input_price_per_million_tokens;
        let output_cost =
            (candidate_tokens as f64 / 1_000_000.0) * self.price.output_price_per_million_tokens;
        let cost_usd = input_cost + output_cost;
        let cost_local = cost_usd * self.usd_to_local_rate;

        debug!(
            target: "genview::cost",
            model = %self.model_name,
            prompt_tokens,
            prompt_text_tokens = md.prompt_tokens_for("TEXT"),
            prompt_image_tokens = md.prompt_tokens_for("IMAGE"),
            candidate_tokens,
            output_image_tokens = md.candidate_tokens_for("IMAGE"),
            total_tokens,
            input_cost,
            output_cost,
            cost_usd,
            cost_local,
            "usage for generation call"
        );

        UsageRecord {
            model_name: self.model_name.clone(),
            task_name: self.task_name.clone(),
            prompt_tokens,
            candidate_tokens,
            total_tokens,
            cached_tokens: md.cached_content_token_count.unwrap_or(0),
            thought_tokens: md.thoughts_token_count.unwrap_or(0),
            cost_usd: round_to(cost_usd, USD_DECIMALS),
            cost_local: round_to(cost_local, LOCAL_DECIMALS),
        }
    }

    /// Merge records; an empty input yields this calculator's zero record.
    pub fn merge(&self, records: &[UsageRecord]) -> UsageRecord {
        if records.is_empty() {
            return self.zero();
        }
        UsageRecord::merged(records)
    }
}
