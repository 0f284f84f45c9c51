use std::time::Duration;

use crate::genview_core::cost::DEFAULT_MODEL_ID;
use crate::genview_core::transport::TransportConfig;
use crate::genview_core::SdkError;

use crate::provider_google::gen_ai::image_model::{GoogleGenAiImageConfig, GoogleGenAiImageModel};
use crate::provider_google::options::disabled_safety_settings;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Image generation routinely takes tens of seconds.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_GENERATIVE_AI_API_KEY"];
const BASE_URL_ENV_VAR: &str = "GENVIEW_BASE_URL";
const MODEL_ENV_VAR: &str = "GENVIEW_MODEL";

/// Everything needed to talk to the Gemini API.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleImageSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_id: String,
    pub request_timeout: Option<Duration>,
    pub query_params: Vec<(String, String)>,
}

impl Default for GoogleImageSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            query_params: Vec::new(),
        }
    }
}

impl GoogleImageSettings {
    /// Defaults overridden by `GEMINI_API_KEY` (or `GOOGLE_GENERATIVE_AI_API_KEY`),
    /// `GENVIEW_BASE_URL` and `GENVIEW_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut settings = Self {
            api_key: API_KEY_ENV_VARS.iter().find_map(|name| non_empty(*name)),
            ..Self::default()
        };
        if let Some(url) = non_empty(BASE_URL_ENV_VAR) {
            settings.base_url = url;
        }
        if let Some(model) = non_empty(MODEL_ENV_VAR) {
            settings.model_id = model;
        }
        settings
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            request_timeout: self.request_timeout,
            ..TransportConfig::default()
        }
    }
}

pub fn default_headers(api_key: &str) -> Vec<(String, String)> {
    vec![
        ("content-type".to_string(), "application/json".to_string()),
        ("accept".to_string(), "application/json".to_string()),
        ("x-goog-api-key".to_string(), api_key.to_string()),
    ]
}

/// Build the reqwest-backed Gemini image model described by `settings`.
pub fn build_google_image_model(
    settings: &GoogleImageSettings,
) -> Result<GoogleGenAiImageModel, SdkError> {
    let api_key = settings
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| SdkError::MissingCredentials {
            message: format!("set {} to a Gemini API key", API_KEY_ENV_VARS.join(" or ")),
        })?;

    let transport_cfg = settings.transport_config();
    let http = crate::reqwest_transport::ReqwestTransport::try_new(&transport_cfg)
        .map_err(SdkError::Transport)?;

    let cfg = GoogleGenAiImageConfig {
        provider_name: "google.gen-ai",
        base_url: settings.base_url.clone(),
        headers: default_headers(api_key),
        http,
        transport_cfg,
        query_params: settings.query_params.clone(),
        safety_settings: disabled_safety_settings(),
    };
    Ok(GoogleGenAiImageModel::new(settings.model_id.clone(), cfg))
}
