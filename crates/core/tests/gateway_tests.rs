use bytes::Bytes;
use std::time::Duration;

use crate::genview_core::cost::{CostCalculator, PricingTable};
use crate::genview_core::gateway::InferenceGateway;
use crate::genview_core::image::ImageGeneration;
use crate::genview_core::retry::{
    RetryPolicy, MAX_RETRIES, RETRY_BACKOFF_MULTIPLIER, RETRY_DELAY,
};
use crate::genview_core::SdkError;
use crate::genview_core::support::{
    bad_request, gateway, image_ok, rate_limited, unavailable, ScriptedModel,
};
use crate::genview_types::{GenerationCall, SamplingParams};

fn call(prompt: &str) -> GenerationCall {
    GenerationCall::new(prompt, Vec::new(), SamplingParams::default())
}

#[tokio::test]
async fn retries_transient_errors_then_succeeds() {
    let model = ScriptedModel::new(|prompt, attempt| {
        if attempt <= 2 {
            Err(rate_limited())
        } else {
            Ok(image_ok(prompt))
        }
    });
    let (gw, sleeper) = gateway(model);

    let outcome = gw.call(&call("front")).await;

    assert_eq!(outcome.image, Some(Bytes::from_static(b"front")));
    assert!(outcome.usage.is_some());
    assert_eq!(gw.model().attempts_for("front"), 3);

    let minimum = RETRY_DELAY + RETRY_DELAY.mul_f64(RETRY_BACKOFF_MULTIPLIER);
    assert!(sleeper.total() >= minimum, "slept {:?}", sleeper.total());
    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
}

#[tokio::test]
async fn exhausted_retries_yield_failed_outcome_without_usage() {
    let model = ScriptedModel::new(|_, _| Err(unavailable()));
    let (gw, sleeper) = gateway(model);

    let outcome = gw.call(&call("back")).await;

    assert!(!outcome.is_success());
    assert!(outcome.usage.is_none());
    assert_eq!(gw.model().attempts_for("back"), MAX_RETRIES as usize);
    assert_eq!(sleeper.recorded().len(), (MAX_RETRIES - 1) as usize);
}

#[tokio::test]
async fn terminal_error_is_not_retried() {
    let model = ScriptedModel::new(|_, _| Err(bad_request()));
    let (gw, sleeper) = gateway(model);

    let outcome = gw.call(&call("side")).await;

    assert!(outcome.image.is_none());
    assert!(outcome.usage.is_none());
    assert_eq!(gw.model().attempts_for("side"), 1);
    assert!(sleeper.recorded().is_empty());
}

#[tokio::test]
async fn success_without_usage_metadata_reports_zero_usage() {
    let model = ScriptedModel::new(|prompt, _| {
        Ok(ImageGeneration {
            usage: None,
            ..image_ok(prompt)
        })
    });
    let (gw, _) = gateway(model);

    let outcome = gw.call(&call("front")).await;

    assert!(outcome.is_success());
    let usage = outcome.usage.expect("usage record");
    assert_eq!(usage, gw.cost_calculator().zero());
}

#[tokio::test]
async fn success_without_image_counts_usage_but_no_image() {
    let model = ScriptedModel::new(|prompt, _| {
        Ok(ImageGeneration {
            image: None,
            finish_reason: Some("IMAGE_SAFETY".into()),
            ..image_ok(prompt)
        })
    });
    let (gw, sleeper) = gateway(model);

    let outcome = gw.call(&call("front")).await;

    assert!(outcome.image.is_none());
    let usage = outcome.usage.expect("usage record");
    assert_eq!(usage.prompt_tokens, 1000);
    assert_eq!(usage.candidate_tokens, 1290);
    assert!(sleeper.recorded().is_empty());
}

#[test]
fn calculator_for_another_model_is_rejected() {
    let model = ScriptedModel::echo().with_model_id("gemini-3-pro-image-preview");

    let err = InferenceGateway::new(
        model,
        CostCalculator::gemini_image_default(),
        RetryPolicy::default(),
    )
    .err()
    .expect("mismatched calculator must not build a gateway");

    match err {
        SdkError::UnknownModel { model_id } => {
            assert_eq!(model_id, "gemini-3-pro-image-preview")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn calculator_matches_model_path_and_case() {
    let model = ScriptedModel::echo().with_model_id("models/Gemini-2.5-Flash-Image");
    assert!(InferenceGateway::new(
        model,
        CostCalculator::gemini_image_default(),
        RetryPolicy::default(),
    )
    .is_ok());
}

#[tokio::test]
async fn gateway_from_pricing_uses_model_id() {
    let unpriced = ScriptedModel::echo().with_model_id("gemini-3-pro-image-preview");
    let err = InferenceGateway::from_pricing(
        unpriced,
        &PricingTable::default(),
        "virtual_tryon",
        RetryPolicy::default(),
    )
    .err()
    .expect("unpriced model must fail");
    assert!(matches!(err, SdkError::UnknownModel { .. }));

    let gw = InferenceGateway::from_pricing(
        ScriptedModel::echo(),
        &PricingTable::default(),
        "virtual_tryon",
        RetryPolicy::default(),
    )
    .unwrap();
    let outcome = gw.call(&call("front")).await;
    let usage = outcome.usage.expect("usage record");
    assert_eq!(usage.model_name, "gemini-2.5-flash-image");
    assert_eq!(usage.task_name, "virtual_tryon");
}
