//! Building view batches from prompts and reference images.
//!
//! A view batch asks for `per_view_count` images per view. Calls for view
//! `i` occupy indices `i * per_view_count .. (i + 1) * per_view_count` of the
//! flattened call list, which is exactly how [`crate::genview_core::batch`]
//! slices the results back.

use tracing::warn;

use crate::genview_core::batch::execute_slots;
use crate::genview_core::gateway::InferenceGateway;
use crate::genview_core::image::ImageModel;
use crate::genview_core::normalize::normalize_all;
use crate::genview_core::retry::Sleeper;
use crate::genview_core::SdkError;
use crate::genview_types::image::ImageSource;
use crate::genview_types::{BatchResult, GenerationCall, SamplingParams, ViewSegment};

/// Prompt and reference images for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub label: String,
    pub prompt: String,
    pub sources: Vec<ImageSource>,
}

impl ViewRequest {
    pub fn new(
        label: impl Into<String>,
        prompt: impl Into<String>,
        sources: Vec<ImageSource>,
    ) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
            sources,
        }
    }
}

/// Everything needed to run one multi-view batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewBatchRequest {
    pub views: Vec<ViewRequest>,
    pub sampling: SamplingParams,
    pub per_view_count: usize,
    /// Longest side allowed for bitmap sources; larger bitmaps are downsampled.
    pub max_dimension: Option<u32>,
}

impl ViewBatchRequest {
    pub fn new(views: Vec<ViewRequest>, sampling: SamplingParams, per_view_count: usize) -> Self {
        Self {
            views,
            sampling,
            per_view_count,
            max_dimension: Some(crate::genview_core::normalize::DEFAULT_MAX_DIMENSION),
        }
    }

    /// One prompt and one set of images shared by every label.
    pub fn uniform(
        prompt: impl Into<String>,
        sources: Vec<ImageSource>,
        sampling: SamplingParams,
        per_view_count: usize,
        view_labels: &[&str],
    ) -> Self {
        let prompt = prompt.into();
        let views = view_labels
            .iter()
            .map(|label| ViewRequest::new(*label, prompt.clone(), sources.clone()))
            .collect();
        Self::new(views, sampling, per_view_count)
    }

    pub fn with_max_dimension(mut self, max_dimension: Option<u32>) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn segments(&self) -> Vec<ViewSegment> {
        self.views
            .iter()
            .map(|v| ViewSegment::new(v.label.clone(), self.per_view_count))
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.per_view_count * self.views.len()
    }
}

/// Equal-size segments for `labels`, in order.
pub fn segments_for(labels: &[&str], per_view_count: usize) -> Vec<ViewSegment> {
    labels
        .iter()
        .map(|label| ViewSegment::new(*label, per_view_count))
        .collect()
}

/// Normalize every view's sources, lay out `per_view_count` calls per view
/// and execute them.
///
/// A view whose files cannot be read gets only failed slots. Malformed
/// sources and invalid layouts fail the whole request before any call is
/// made.
pub async fn run_view_batch<M, S>(
    gateway: &InferenceGateway<M, S>,
    request: &ViewBatchRequest,
    max_concurrency: usize,
) -> Result<BatchResult, SdkError>
where
    M: ImageModel,
    S: Sleeper,
{
    if request.views.is_empty() {
        return Err(SdkError::invalid_argument("at least one view is required"));
    }
    if request.per_view_count == 0 {
        return Err(SdkError::invalid_argument("per_view_count must be at least 1"));
    }

    let mut slots = Vec::with_capacity(request.total_calls());
    for view in &request.views {
        match normalize_all(&view.sources, request.max_dimension).await {
            Ok(parts) => {
                let call =
                    GenerationCall::new(view.prompt.clone(), parts, request.sampling.clone());
                slots.extend(std::iter::repeat(Some(call)).take(request.per_view_count));
            }
            Err(SdkError::Io(err)) => {
                warn!(
                    target: "genview::batch",
                    view = %view.label,
                    error = %err,
                    "reference image unreadable, view will produce no images"
                );
                slots.extend(std::iter::repeat(None).take(request.per_view_count));
            }
            Err(other) => return Err(other),
        }
    }

    let segments = request.segments();
    execute_slots(gateway, slots, &segments, max_concurrency).await
}
