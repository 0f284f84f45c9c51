//! Value types shared by the normalizer, gateway and batch executor.
//!
//! Everything in here is immutable once built: calls are cloned per slot,
//! outcomes are produced once per unit of work and results once per batch.

pub mod image;
pub mod usage;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use bytes::Bytes;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::image::WirePart;
use crate::types::usage::UsageRecord;

pub const DEFAULT_ASPECT_RATIO: &str = "1:1";
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Sampling parameters forwarded to the provider with every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingParams {
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub aspect_ratio: String,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: None,
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
        }
    }
}

impl SamplingParams {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }
}

/// One content part of a call, in wire order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallPart<'a> {
    Text(&'a str),
    Image(&'a WirePart),
}

/// A single "prompt plus reference images" generation request.
///
/// The image list is shared, so cloning a call for every slot of a view does
/// not copy image bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationCall {
    prompt: String,
    images: Arc<[WirePart]>,
    sampling: SamplingParams,
}

impl GenerationCall {
    pub fn new(prompt: impl Into<String>, images: Vec<WirePart>, sampling: SamplingParams) -> Self {
        Self {
            prompt: prompt.into(),
            images: images.into(),
            sampling,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn images(&self) -> &[WirePart] {
        &self.images
    }

    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    /// Prompt first, then every image in order.
    pub fn parts(&self) -> impl Iterator<Item = CallPart<'_>> {
        std::iter::once(CallPart::Text(self.prompt.as_str()))
            .chain(self.images.iter().map(CallPart::Image))
    }
}

/// Result of one gateway call.
///
/// `image == None` marks a failed call. `usage == None` means the provider
/// never answered, which is different from a zero-cost answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceOutcome {
    pub image: Option<Bytes>,
    pub usage: Option<UsageRecord>,
}

impl InferenceOutcome {
    pub fn failed() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.image.is_some()
    }
}

/// A contiguous run of calls that belong to one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSegment {
    pub label: String,
    pub count: usize,
}

impl ViewSegment {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Images that came back for one view, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewImages {
    pub label: String,
    pub images: Vec<Bytes>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStats {
    pub label: String,
    pub requested: usize,
    pub succeeded: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<ViewStats>,
}

/// Outcome of one batch: images grouped by view plus merged accounting.
///
/// Serializes as `{"<label>": [base64...], ..., "usage": {...}, "stats": {...}}`
/// with views in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    views: Vec<ViewImages>,
    total_usage: UsageRecord,
    stats: BatchStats,
}

impl BatchResult {
    pub fn new(views: Vec<ViewImages>, total_usage: UsageRecord, stats: BatchStats) -> Self {
        Self {
            views,
            total_usage,
            stats,
        }
    }

    pub fn views(&self) -> &[ViewImages] {
        &self.views
    }

    /// Images for `label`, or `None` if the label was not part of the batch.
    pub fn images_for(&self, label: &str) -> Option<&[Bytes]> {
        self.views
            .iter()
            .find(|v| v.label == label)
            .map(|v| v.images.as_slice())
    }

    pub fn total_usage(&self) -> &UsageRecord {
        &self.total_usage
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    /// All images across views, in declaration order.
    pub fn all_images(&self) -> impl Iterator<Item = &Bytes> {
        self.views.iter().flat_map(|v| v.images.iter())
    }

    pub fn into_parts(self) -> (Vec<ViewImages>, UsageRecord, BatchStats) {
        (self.views, self.total_usage, self.stats)
    }
}

/// Keys that cannot be used as view labels because the serialized result
/// already uses them.
pub const RESERVED_RESULT_KEYS: [&str; 2] = ["usage", "stats"];

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.views.len() + 2))?;
        for view in &self.views {
            let encoded: Vec<String> = view.images.iter().map(|b| B64.encode(b)).collect();
            map.serialize_entry(&view.label, &encoded)?;
        }
        map.serialize_entry("usage", &self.total_usage)?;
        map.serialize_entry("stats", &self.stats)?;
        map.end()
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod types_tests;
