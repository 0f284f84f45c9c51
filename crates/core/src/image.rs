use bytes::Bytes;
use std::sync::Arc;

use crate::genview_core::SdkError;
use crate::genview_types::usage::UsageMetadata;
use crate::genview_types::GenerationCall;

/// What a provider returned for one successful request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageGeneration {
    /// First inline image of the first candidate, if any.
    pub image: Option<Bytes>,
    pub mime_type: Option<String>,
    pub usage: Option<UsageMetadata>,
    /// Finish reason of the first candidate, or the prompt block reason.
    pub finish_reason: Option<String>,
}

/// A remote model that turns one [`GenerationCall`] into at most one image.
#[async_trait::async_trait]
pub trait ImageModel: Send + Sync {
    /// Provider name for logging/telemetry.
    fn provider_name(&self) -> &'static str;
    /// Provider-specific model identifier.
    fn model_id(&self) -> &str;

    async fn do_generate(&self, call: &GenerationCall) -> Result<ImageGeneration, SdkError>;
}

#[async_trait::async_trait]
impl<M: ImageModel + ?Sized> ImageModel for Arc<M> {
    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    async fn do_generate(&self, call: &GenerationCall) -> Result<ImageGeneration, SdkError> {
        (**self).do_generate(call).await
    }
}
