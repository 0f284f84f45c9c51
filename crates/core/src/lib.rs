pub mod batch;
pub mod cost;
pub mod error;
pub mod gateway;
pub mod image;
pub mod normalize;
pub mod retry;
pub mod transport;
pub mod views;

pub use crate::core::batch::execute;
pub use crate::core::cost::{CostCalculator, ModelPrice, PricingTable};
pub use crate::core::error::{SdkError, TransportError};
pub use crate::core::gateway::InferenceGateway;
pub use crate::core::image::{ImageGeneration, ImageModel};
pub use crate::core::normalize::normalize;
pub use crate::core::retry::{
    is_retryable, RetryPolicy, Sleeper, TokioSleeper, MAX_RETRIES, MAX_RETRY_DELAY,
    RETRY_BACKOFF_MULTIPLIER, RETRY_DELAY,
};
pub use crate::core::views::{run_view_batch, segments_for, ViewBatchRequest, ViewRequest};

// Convenience re-exports of common types
pub use crate::genview_types::image::{Bitmap, ImageSource, PixelLayout, WirePart};
pub use crate::genview_types::usage::{UsageMetadata, UsageRecord};
pub use crate::genview_types::{
    BatchResult, BatchStats, GenerationCall, InferenceOutcome, SamplingParams, ViewSegment,
};

#[cfg(test)]
#[path = "../tests/support.rs"]
mod support;

#[cfg(test)]
#[path = "../tests/retry_tests.rs"]
mod retry_tests;

#[cfg(test)]
#[path = "../tests/cost_tests.rs"]
mod cost_tests;

#[cfg(test)]
#[path = "../tests/normalize_tests.rs"]
mod normalize_tests;

#[cfg(test)]
#[path = "../tests/gateway_tests.rs"]
mod gateway_tests;

#[cfg(test)]
#[path = "../tests/batch_tests.rs"]
mod batch_tests;
