use tracing::{debug, warn};

use crate::genview_core::cost::{CostCalculator, PricingTable};
use crate::genview_core::image::ImageModel;
use crate::genview_core::retry::{retry_with_backoff, RetryPolicy, Sleeper, TokioSleeper};
use crate::genview_core::SdkError;
use crate::genview_types::{GenerationCall, InferenceOutcome};

/// Executes single generation calls against one model with retry and cost
/// accounting.
///
/// The gateway never returns an error: retryable failures are absorbed by
/// the backoff loop and terminal ones become an outcome without an image.
pub struct InferenceGateway<M, S = TokioSleeper> {
    model: M,
    cost: CostCalculator,
    policy: RetryPolicy,
    sleeper: S,
}

impl<M: ImageModel> InferenceGateway<M> {
    /// Fails with [`SdkError::UnknownModel`] when `cost` is bound to a model
    /// other than the one `model` serves.
    pub fn new(model: M, cost: CostCalculator, policy: RetryPolicy) -> Result<Self, SdkError> {
        if !cost.prices(model.model_id()) {
            warn!(
                target: "genview::gateway",
                model = model.model_id(),
                priced_model = cost.model_name(),
                "cost calculator does not price the gateway model"
            );
            return Err(SdkError::UnknownModel {
                model_id: model.model_id().to_string(),
            });
        }
        Ok(Self {
            model,
            cost,
            policy,
            sleeper: TokioSleeper,
        })
    }

    /// Look the model's own id up in `pricing`.
    pub fn from_pricing(
        model: M,
        pricing: &PricingTable,
        task_name: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self, SdkError> {
        let cost = CostCalculator::new(pricing, model.model_id(), task_name)?;
        Self::new(model, cost, policy)
    }
}

impl<M: ImageModel, S: Sleeper> InferenceGateway<M, S> {
    /// Replace the sleeper used between attempts.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> InferenceGateway<M, S2> {
        InferenceGateway {
            model: self.model,
            cost: self.cost,
            policy: self.policy,
            sleeper,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn cost_calculator(&self) -> &CostCalculator {
        &self.cost
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one call to completion.
    pub async fn call(&self, request: &GenerationCall) -> InferenceOutcome {
        let result = retry_with_backoff(
            &self.policy,
            &self.sleeper,
            || self.model.do_generate(request),
            |attempt, delay, err: &SdkError| {
                warn!(
                    target: "genview::gateway",
                    provider = self.model.provider_name(),
                    model = self.model.model_id(),
                    attempt,
                    max_attempts = self.policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err.format_details(),
                    "retryable generation error, backing off"
                );
            },
        )
        .await;

        match result {
            Ok(generation) => {
                let usage = self.cost.from_usage_metadata(generation.usage.as_ref());
                if generation.image.is_none() {
                    warn!(
                        target: "genview::gateway",
                        model = self.model.model_id(),
                        finish_reason = generation.finish_reason.as_deref().unwrap_or("unknown"),
                        "response carried no inline image"
                    );
                } else {
                    debug!(
                        target: "genview::gateway",
                        model = self.model.model_id(),
                        mime_type = generation.mime_type.as_deref().unwrap_or(""),
                        "generation call succeeded"
                    );
                }
                InferenceOutcome {
                    image: generation.image,
                    usage: Some(usage),
                }
            }
            Err(err) => {
                warn!(
                    target: "genview::gateway",
                    provider = self.model.provider_name(),
                    model = self.model.model_id(),
                    error = %err.format_details(),
                    "generation call failed"
                );
                InferenceOutcome::failed()
            }
        }
    }
}
