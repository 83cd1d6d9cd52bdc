//! Incoming generation requests and their validation

use serde::{Deserialize, Serialize};

use crate::artifact::base64;
use crate::error::{AppError, Result};

fn default_number_of_images() -> u32 {
    1
}

/// First generation: prompt with optional base image and style reference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirstGenerationRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_number_of_images")]
    pub number_of_images: u32,
    #[serde(default)]
    pub color_palette: Vec<String>,
    /// Base64 image, data URL, stored image reference or http(s) URL
    pub base_image: Option<String>,
    /// Same forms as `base_image`
    pub style_reference: Option<String>,
    pub style: Option<String>,
}

/// Next generation: refine a previous image inside a mask
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextGenerationRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_number_of_images")]
    pub number_of_images: u32,
    #[serde(default)]
    pub color_palette: Vec<String>,
    #[serde(default)]
    pub init_image: String,
    pub combined_mask: Option<String>,
    pub style_reference: Option<String>,
    pub style: Option<String>,
}

/// Trimmed, non-empty prompt
pub(crate) fn validate_prompt(prompt: &str) -> Result<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::InvalidRequest("Prompt is required".to_string()));
    }
    Ok(prompt.to_string())
}

pub(crate) fn validate_count(number_of_images: u32, max_images: u32) -> Result<u32> {
    if number_of_images == 0 || number_of_images > max_images {
        return Err(AppError::InvalidRequest(format!(
            "number_of_images must be between 1 and {}",
            max_images
        )));
    }
    Ok(number_of_images)
}

/// Bare base64 payload of an optional image field; blank counts as absent
pub(crate) fn validate_image(field: &str, image: Option<&str>) -> Result<Option<String>> {
    let Some(image) = image.map(str::trim).filter(|i| !i.is_empty()) else {
        return Ok(None);
    };

    if !base64::is_valid(image) {
        return Err(AppError::InvalidRequest(format!(
            "{} must be a base64 encoded image",
            field
        )));
    }
    Ok(Some(base64::strip_data_url(image).to_string()))
}
