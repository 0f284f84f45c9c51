//! Google Generative AI (Gemini) image generation provider.

pub mod error;
pub mod options;
pub mod provider;

pub mod gen_ai {
    pub mod image_model;
    pub mod request;
}

pub use crate::provider_google::gen_ai::image_model::{
    GoogleGenAiImageConfig, GoogleGenAiImageModel,
};
pub use crate::provider_google::provider::{build_google_image_model, GoogleImageSettings};

#[cfg(test)]
#[path = "../tests/image_model_tests.rs"]
mod image_model_tests;

#[cfg(test)]
#[path = "../tests/provider_tests.rs"]
mod provider_tests;
