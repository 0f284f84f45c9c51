//! `generateContent` request body for single-image generation.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::Serialize;

use crate::genview_types::{CallPart, GenerationCall};
use crate::provider_google::options::{SafetySetting, RESPONSE_MODALITY_IMAGE};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    pub contents: [Content<'a>; 1],
    pub generation_config: GenerationConfig<'a>,
    pub safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    pub role: &'static str,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part<'a> {
    Text {
        text: &'a str,
    },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData<'a> {
    pub mime_type: &'a str,
    /// Base64 of the image bytes.
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig<'a> {
    pub response_modalities: [&'static str; 1],
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    pub image_config: ImageConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig<'a> {
    pub aspect_ratio: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    /// One user turn: the prompt, then every image in call order.
    pub fn from_call(call: &'a GenerationCall, safety_settings: &'a [SafetySetting]) -> Self {
        let parts = call
            .parts()
            .map(|part| match part {
                CallPart::Text(text) => Part::Text { text },
                CallPart::Image(img) => Part::Image {
                    inline_data: InlineData {
                        mime_type: &img.mime_type,
                        data: B64.encode(&img.data),
                    },
                },
            })
            .collect();

        let sampling = call.sampling();
        Self {
            contents: [Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: [RESPONSE_MODALITY_IMAGE],
                temperature: sampling.temperature,
                top_p: sampling.top_p,
                image_config: ImageConfig {
                    aspect_ratio: &sampling.aspect_ratio,
                },
            },
            safety_settings,
        }
    }
}
