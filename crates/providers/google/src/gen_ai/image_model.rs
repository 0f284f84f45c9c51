use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use bytes::Bytes;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::genview_core::image::{ImageGeneration, ImageModel};
use crate::genview_core::transport::{HttpTransport, TransportConfig};
use crate::genview_core::SdkError;
use crate::genview_types::usage::UsageMetadata;
use crate::genview_types::GenerationCall;

use crate::provider_google::error::map_transport_error_to_sdk_error;
use crate::provider_google::gen_ai::request::GenerateContentRequest;
use crate::provider_google::options::SafetySetting;

pub struct GoogleGenAiImageConfig<T: HttpTransport = crate::reqwest_transport::ReqwestTransport> {
    pub provider_name: &'static str,
    pub base_url: String,
    pub headers: Vec<(String, String)>,
    pub http: T,
    pub transport_cfg: TransportConfig,
    pub query_params: Vec<(String, String)>,
    pub safety_settings: Vec<SafetySetting>,
}

/// Gemini `generateContent` used as a single-image generator.
pub struct GoogleGenAiImageModel<T: HttpTransport = crate::reqwest_transport::ReqwestTransport> {
    pub model_id: String,
    pub cfg: GoogleGenAiImageConfig<T>,
}

impl<T: HttpTransport> GoogleGenAiImageModel<T> {
    pub fn new(model_id: impl Into<String>, cfg: GoogleGenAiImageConfig<T>) -> Self {
        Self {
            model_id: model_id.into(),
            cfg,
        }
    }

    fn model_path(&self) -> String {
        let id = &self.model_id;
        if id.contains('/') {
            id.clone()
        } else {
            format!("models/{}", id)
        }
    }

    pub fn url_generate(&self) -> String {
        let mut url = format!(
            "{}/{}:generateContent",
            self.cfg.base_url.trim_end_matches('/'),
            self.model_path()
        );
        if !self.cfg.query_params.is_empty() {
            let qp: Vec<String> = self
                .cfg
                .query_params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&qp.join("&"));
        }
        url
    }

    pub fn build_request<'a>(&'a self, call: &'a GenerationCall) -> GenerateContentRequest<'a> {
        GenerateContentRequest::from_call(call, &self.cfg.safety_settings)
    }

    /// Pull the first inline image, usage and finish reason out of a response.
    pub fn parse_response(&self, resp: &JsonValue) -> ImageGeneration {
        let candidate = resp
            .get("candidates")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first());

        let inline = candidate
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .and_then(|parts| {
                parts.iter().find_map(|p| {
                    p.get("inlineData")
                        .or_else(|| p.get("inline_data"))
                        .filter(|d| d.get("data").and_then(|v| v.as_str()).is_some())
                })
            });

        let (image, mime_type) = match inline {
            Some(data) => {
                let mime = data
                    .get("mimeType")
                    .or_else(|| data.get("mime_type"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                let encoded = data.get("data").and_then(|v| v.as_str()).unwrap_or("");
                match B64.decode(encoded) {
                    Ok(bytes) => (Some(Bytes::from(bytes)), mime),
                    Err(err) => {
                        warn!(
                            target: "genview::google",
                            model = %self.model_id,
                            error = %err,
                            "inline image is not valid base64"
                        );
                        (None, mime)
                    }
                }
            }
            None => (None, None),
        };

        let finish_reason = candidate
            .and_then(|c| c.get("finishReason"))
            .and_then(|v| v.as_str())
            .or_else(|| {
                resp.get("promptFeedback")
                    .and_then(|f| f.get("blockReason"))
                    .and_then(|v| v.as_str())
            })
            .map(|s| s.to_string());

        let usage = resp
            .get("usageMetadata")
            .cloned()
            .and_then(|v| serde_json::from_value::<UsageMetadata>(v).ok());

        ImageGeneration {
            image,
            mime_type,
            usage,
            finish_reason,
        }
    }
}

#[async_trait]
impl<T: HttpTransport> ImageModel for GoogleGenAiImageModel<T> {
    fn provider_name(&self) -> &'static str {
        self.cfg.provider_name
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, call: &GenerationCall) -> Result<ImageGeneration, SdkError> {
        let body = serde_json::to_value(self.build_request(call))?;
        let url = self.url_generate();
        debug!(
            target: "genview::google",
            model = %self.model_id,
            images = call.images().len(),
            "sending generateContent request"
        );

        let resp_json = self
            .cfg
            .http
            .post_json(&url, &self.cfg.headers, &body, &self.cfg.transport_cfg)
            .await
            .map_err(map_transport_error_to_sdk_error)?;

        Ok(self.parse_response(&resp_json))
    }
}
