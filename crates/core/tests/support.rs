//! Scripted model and recording sleeper shared by the core tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::genview_core::cost::{CostCalculator, DEFAULT_MODEL_ID};
use crate::genview_core::gateway::InferenceGateway;
use crate::genview_core::image::{ImageGeneration, ImageModel};
use crate::genview_core::retry::{RetryPolicy, Sleeper};
use crate::genview_core::SdkError;
use crate::genview_types::usage::UsageMetadata;
use crate::genview_types::{GenerationCall, SamplingParams};

type Responder = dyn Fn(&str, usize) -> Result<ImageGeneration, SdkError> + Send + Sync;
type Delay = dyn Fn(&str) -> Duration + Send + Sync;

/// Answers by prompt. The responder also gets the 1-based attempt number for
/// that prompt.
pub struct ScriptedModel {
    model_id: String,
    responder: Box<Responder>,
    delay: Box<Delay>,
    attempts: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    total_calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, usize) -> Result<ImageGeneration, SdkError> + Send + Sync + 'static,
    {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            responder: Box::new(responder),
            delay: Box::new(|_| Duration::ZERO),
            attempts: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            total_calls: AtomicUsize::new(0),
        }
    }

    /// Always succeeds with the prompt as image bytes.
    pub fn echo() -> Self {
        Self::new(|prompt, _| Ok(image_ok(prompt)))
    }

    pub fn with_delay<D>(mut self, delay: D) -> Self
    where
        D: Fn(&str) -> Duration + Send + Sync + 'static,
    {
        self.delay = Box::new(delay);
        self
    }

    pub fn with_model_id(mut self, model_id: &str) -> Self {
        self.model_id = model_id.to_string();
        self
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn attempts_for(&self, prompt: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .get(prompt)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ImageModel for ScriptedModel {
    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, call: &GenerationCall) -> Result<ImageGeneration, SdkError> {
        let prompt = call.prompt();
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(prompt.to_string()).or_insert(0);
            *n += 1;
            *n
        };
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = (self.delay)(prompt);
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        (self.responder)(prompt, attempt)
    }
}

/// Records every requested delay and returns immediately.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.recorded().into_iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

pub fn usage(prompt_tokens: u64, candidate_tokens: u64) -> UsageMetadata {
    UsageMetadata {
        prompt_token_count: Some(prompt_tokens),
        candidates_token_count: Some(candidate_tokens),
        total_token_count: Some(prompt_tokens + candidate_tokens),
        ..Default::default()
    }
}

/// A generation whose image bytes are `tag`, with 1000 prompt and 1290
/// candidate tokens.
pub fn image_ok(tag: &str) -> ImageGeneration {
    ImageGeneration {
        image: Some(Bytes::copy_from_slice(tag.as_bytes())),
        mime_type: Some("image/png".to_string()),
        usage: Some(usage(1000, 1290)),
        finish_reason: Some("STOP".to_string()),
    }
}

pub fn rate_limited() -> SdkError {
    SdkError::RateLimited {
        retry_after_ms: None,
        source: None,
    }
}

pub fn unavailable() -> SdkError {
    SdkError::Upstream {
        status: 503,
        message: "The model is overloaded. Please try again later.".to_string(),
        source: None,
    }
}

pub fn bad_request() -> SdkError {
    SdkError::Upstream {
        status: 400,
        message: "Request contains an invalid argument.".to_string(),
        source: None,
    }
}

pub fn gateway(
    model: ScriptedModel,
) -> (InferenceGateway<ScriptedModel, RecordingSleeper>, RecordingSleeper) {
    let sleeper = RecordingSleeper::default();
    let gw = InferenceGateway::new(
        model,
        CostCalculator::gemini_image_default(),
        RetryPolicy::default(),
    )
    .expect("scripted model is priced")
    .with_sleeper(sleeper.clone());
    (gw, sleeper)
}

/// Calls whose prompts are `call-0`, `call-1`, ...
pub fn numbered_calls(n: usize) -> Vec<GenerationCall> {
    (0..n)
        .map(|i| GenerationCall::new(format!("call-{i}"), Vec::new(), SamplingParams::default()))
        .collect()
}
