//! Bounded fan-out of gateway calls and positional reassembly into views.
//!
//! Calls are laid out as contiguous segments, one per view, in declaration
//! order. Every call runs as its own unit of work behind a counting
//! semaphore; all units are joined before anything is partitioned, and
//! outcomes are walked by input index, never by completion order.
//!
//! There is no mid-batch cancellation. A caller that needs a deadline has to
//! race the whole [`execute`] future against its own timeout and drop the
//! result. Provider requests already in flight are not preempted and still
//! consume quota.

use futures_util::future::join_all;
use std::collections::HashSet;
use tokio::sync::Semaphore;
use tracing::{info, info_span, Instrument};

use crate::genview_core::gateway::InferenceGateway;
use crate::genview_core::image::ImageModel;
use crate::genview_core::retry::Sleeper;
use crate::genview_core::SdkError;
use crate::genview_types::usage::UsageRecord;
use crate::genview_types::{
    BatchResult, BatchStats, GenerationCall, InferenceOutcome, ViewImages, ViewSegment,
    ViewStats, RESERVED_RESULT_KEYS,
};

/// Run `calls` with at most `max_concurrency` in flight and group the images
/// by `segments`.
///
/// Segment counts must add up to `calls.len()`; labels must be non-empty,
/// unique, and not one of [`RESERVED_RESULT_KEYS`]. Individual call
/// failures never fail the batch; they are counted in `stats.failed`.
pub async fn execute<M, S>(
    gateway: &InferenceGateway<M, S>,
    calls: Vec<GenerationCall>,
    segments: &[ViewSegment],
    max_concurrency: usize,
) -> Result<BatchResult, SdkError>
where
    M: ImageModel,
    S: Sleeper,
{
    let slots = calls.into_iter().map(Some).collect();
    execute_slots(gateway, slots, segments, max_concurrency).await
}

/// Like [`execute`], but a `None` slot is a call that could not be built and
/// is recorded as failed without reaching the provider.
pub(crate) async fn execute_slots<M, S>(
    gateway: &InferenceGateway<M, S>,
    slots: Vec<Option<GenerationCall>>,
    segments: &[ViewSegment],
    max_concurrency: usize,
) -> Result<BatchResult, SdkError>
where
    M: ImageModel,
    S: Sleeper,
{
    validate_segments(segments, slots.len())?;
    if max_concurrency == 0 {
        return Err(SdkError::invalid_argument(
            "max_concurrency must be at least 1",
        ));
    }

    let batch_id = uuid::Uuid::new_v4();
    let span = info_span!(target: "genview::batch", "batch", %batch_id);
    async move {
        info!(
            target: "genview::batch",
            calls = slots.len(),
            views = segments.len(),
            max_concurrency,
            "starting batch"
        );

        let limiter = Semaphore::new(max_concurrency.min(Semaphore::MAX_PERMITS));
        let units = slots.iter().map(|slot| run_unit(gateway, &limiter, slot.as_ref()));
        let outcomes = join_all(units).await;

        let result = assemble(outcomes, segments, gateway.cost_calculator().zero());
        info!(
            target: "genview::batch",
            requested = result.stats().requested,
            succeeded = result.stats().succeeded,
            failed = result.stats().failed,
            cost_usd = result.total_usage().cost_usd,
            "batch finished"
        );
        Ok(result)
    }
    .instrument(span)
    .await
}

async fn run_unit<M, S>(
    gateway: &InferenceGateway<M, S>,
    limiter: &Semaphore,
    call: Option<&GenerationCall>,
) -> InferenceOutcome
where
    M: ImageModel,
    S: Sleeper,
{
    let Some(call) = call else {
        return InferenceOutcome::failed();
    };
    // The semaphore is never closed, so acquire only fails if that changes.
    let Ok(_permit) = limiter.acquire().await else {
        return InferenceOutcome::failed();
    };
    gateway.call(call).await
}

/// Check segment labels and that the counts cover exactly `total` calls.
pub fn validate_segments(segments: &[ViewSegment], total: usize) -> Result<(), SdkError> {
    let mut seen = HashSet::new();
    for seg in segments {
        if seg.label.trim().is_empty() {
            return Err(SdkError::invalid_argument("view label must not be empty"));
        }
        if RESERVED_RESULT_KEYS.contains(&seg.label.as_str()) {
            return Err(SdkError::invalid_argument(format!(
                "view label '{}' is reserved",
                seg.label
            )));
        }
        if !seen.insert(seg.label.as_str()) {
            return Err(SdkError::invalid_argument(format!(
                "duplicate view label '{}'",
                seg.label
            )));
        }
    }
    let declared: usize = segments.iter().map(|s| s.count).sum();
    if declared != total {
        return Err(SdkError::invalid_argument(format!(
            "view segments cover {declared} calls but {total} were supplied"
        )));
    }
    Ok(())
}

/// Slice outcomes into views by position and merge usage.
///
/// `zero` is returned as total usage when no outcome carried a record.
pub fn assemble(
    outcomes: Vec<InferenceOutcome>,
    segments: &[ViewSegment],
    zero: UsageRecord,
) -> BatchResult {
    let requested = outcomes.len();
    let mut usage = Vec::with_capacity(requested);
    let mut views = Vec::with_capacity(segments.len());
    let mut view_stats = Vec::with_capacity(segments.len());

    let mut outcomes = outcomes.into_iter();
    for seg in segments {
        let mut images = Vec::with_capacity(seg.count);
        for outcome in outcomes.by_ref().take(seg.count) {
            if let Some(record) = outcome.usage {
                usage.push(record);
            }
            if let Some(image) = outcome.image {
                images.push(image);
            }
        }
        view_stats.push(ViewStats {
            label: seg.label.clone(),
            requested: seg.count,
            succeeded: images.len(),
        });
        views.push(ViewImages {
            label: seg.label.clone(),
            images,
        });
    }

    let succeeded: usize = view_stats.iter().map(|v| v.succeeded).sum();
    let total_usage = if usage.is_empty() {
        zero
    } else {
        UsageRecord::merged(&usage)
    };

    BatchResult::new(
        views,
        total_usage,
        BatchStats {
            requested,
            succeeded,
            failed: requested - succeeded,
            views: view_stats,
        },
    )
}
