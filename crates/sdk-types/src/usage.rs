use serde::{Deserialize, Serialize};

/// Per-modality token count as reported by Gemini (`promptTokensDetails` etc.).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModalityTokenCount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u64>,
}

/// Raw `usageMetadata` object of a `generateContent` response.
///
/// Every field is optional on the wire; missing counts are read as zero.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_content_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompt_tokens_details: Vec<ModalityTokenCount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates_tokens_details: Vec<ModalityTokenCount>,
}

impl UsageMetadata {
    /// Sum of prompt tokens whose modality mentions `modality` (e.g. "IMAGE").
    pub fn prompt_tokens_for(&self, modality: &str) -> u64 {
        sum_modality(&self.prompt_tokens_details, modality)
    }

    pub fn candidate_tokens_for(&self, modality: &str) -> u64 {
        sum_modality(&self.candidates_tokens_details, modality)
    }
}

fn sum_modality(details: &[ModalityTokenCount], modality: &str) -> u64 {
    details
        .iter()
        .filter(|d| {
            d.modality
                .as_deref()
                .is_some_and(|m| m.eq_ignore_ascii_case(modality))
        })
        .map(|d| d.token_count.unwrap_or(0))
        .sum()
}

/// Token and cost accounting for one or more generation calls.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub model_name: String,
    pub task_name: String,
    pub prompt_tokens: u64,
    pub candidate_tokens: u64,
    pub total_tokens: u64,
    pub cached_tokens: u64,
    pub thought_tokens: u64,
    #[serde(rename = "costUSD")]
    pub cost_usd: f64,
    pub cost_local: f64,
}

impl UsageRecord {
    /// A record with every numeric field at zero.
    pub fn zero(model_name: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            task_name: task_name.into(),
            ..Default::default()
        }
    }

    /// Field-wise sum of `records`.
    ///
    /// Costs are summed in ascending order so the result does not depend on
    /// the order of the input. Model and task names come from the first record
    /// that carries them.
    pub fn merged<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> UsageRecord {
        let mut out = UsageRecord::default();
        let mut usd = Vec::new();
        let mut local = Vec::new();
        for r in records {
            if out.model_name.is_empty() {
                out.model_name = r.model_name.clone();
            }
            if out.task_name.is_empty() {
                out.task_name = r.task_name.clone();
            }
            out.prompt_tokens += r.prompt_tokens;
            out.candidate_tokens += r.candidate_tokens;
            out.total_tokens += r.total_tokens;
            out.cached_tokens += r.cached_tokens;
            out.thought_tokens += r.thought_tokens;
            usd.push(r.cost_usd);
            local.push(r.cost_local);
        }
        out.cost_usd = round_to(ordered_sum(usd), USD_DECIMALS);
        out.cost_local = round_to(ordered_sum(local), LOCAL_DECIMALS);
        out
    }
}

pub const USD_DECIMALS: i32 = 6;
pub const LOCAL_DECIMALS: i32 = 2;

fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

/// Round half away from zero to `places` decimal digits.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
