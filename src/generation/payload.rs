//! Render payloads for the sdapi txt2img / img2img endpoints

use serde::Serialize;
use std::collections::HashMap;

use crate::generation::style::StyledPrompt;

const SAMPLER: &str = "DPM++ 2M SDE";
const IMAGE_SIZE: u32 = 512;
const RANDOM_SEED: i64 = -1;

const CANNY_MODEL: &str = "diffusion_sd_controlnet_canny [a3cd7cd6]";
const COLOR_ADAPTER_MODEL: &str = "t2iadapter_color_sd14v1 [8522029d]";

/// One ControlNet conditioning unit
#[derive(Debug, Clone, Serialize)]
pub struct ControlNetUnit {
    pub enabled: bool,
    pub image: String,
    pub model: String,
    pub module: String,
    pub weight: f32,
    pub resize_mode: String,
    pub guidance_start: f32,
    pub guidance_end: f32,
    pub control_mode: String,
    pub pixel_perfect: bool,
}

impl ControlNetUnit {
    fn new(image: String, model: &str, module: &str, weight: f32) -> Self {
        Self {
            enabled: true,
            image,
            model: model.to_string(),
            module: module.to_string(),
            weight,
            resize_mode: "Scale to Fit (Inner Fit)".to_string(),
            guidance_start: 0.0,
            guidance_end: 1.0,
            control_mode: "ControlNet is more important".to_string(),
            pixel_perfect: true,
        }
    }

    /// Edge guidance from a base or reference image
    pub fn canny(image: String) -> Self {
        Self::new(image, CANNY_MODEL, "canny", 1.0)
    }

    /// Colour-grid guidance from a style reference
    pub fn color_adapter(image: String) -> Self {
        Self::new(image, COLOR_ADAPTER_MODEL, "t2ia_color_grid", 1.2)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlNetArgs {
    pub args: Vec<ControlNetUnit>,
}

fn controlnet_scripts(units: Vec<ControlNetUnit>) -> Option<HashMap<String, ControlNetArgs>> {
    if units.is_empty() {
        return None;
    }
    let mut scripts = HashMap::new();
    scripts.insert("controlnet".to_string(), ControlNetArgs { args: units });
    Some(scripts)
}

/// txt2img request body
#[derive(Debug, Clone, Serialize)]
pub struct Txt2ImgPayload {
    pub prompt: String,
    pub negative_prompt: String,
    pub sampler_name: String,
    pub steps: u32,
    pub cfg_scale: f32,
    pub width: u32,
    pub height: u32,
    pub n_iter: u32,
    pub seed: i64,
    pub denoising_strength: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alwayson_scripts: Option<HashMap<String, ControlNetArgs>>,
}

impl Txt2ImgPayload {
    /// Base image adds canny guidance; a style reference adds the colour adapter
    pub fn new(
        styled: StyledPrompt,
        number_of_images: u32,
        base_image: Option<String>,
        style_reference: Option<String>,
    ) -> Self {
        let mut units = Vec::new();
        if let Some(image) = base_image {
            units.push(ControlNetUnit::canny(image));
        }
        if let Some(image) = style_reference {
            units.push(ControlNetUnit::color_adapter(image));
        }

        Self {
            prompt: styled.prompt,
            negative_prompt: styled.negative_prompt,
            sampler_name: SAMPLER.to_string(),
            steps: 30,
            cfg_scale: 6.0,
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
            n_iter: number_of_images,
            seed: RANDOM_SEED,
            denoising_strength: 0.3,
            alwayson_scripts: controlnet_scripts(units),
        }
    }
}

/// img2img (inpainting) request body
#[derive(Debug, Clone, Serialize)]
pub struct Img2ImgPayload {
    pub prompt: String,
    pub negative_prompt: String,
    pub sampler_name: String,
    pub steps: u32,
    pub cfg_scale: f32,
    pub width: u32,
    pub height: u32,
    pub n_iter: u32,
    pub seed: i64,
    pub init_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,
    pub denoising_strength: f32,
    pub resize_mode: u32,
    pub mask_blur_x: u32,
    pub mask_blur_y: u32,
    pub inpainting_fill: u32,
    pub inpaint_full_res: bool,
    pub inpaint_full_res_padding: u32,
    pub mask_round: bool,
    pub include_init_images: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alwayson_scripts: Option<HashMap<String, ControlNetArgs>>,
}

impl Img2ImgPayload {
    /// Refine `init_image` inside `mask`; a style reference adds canny guidance
    pub fn new(
        styled: StyledPrompt,
        number_of_images: u32,
        init_image: String,
        mask: Option<String>,
        style_reference: Option<String>,
    ) -> Self {
        let units = style_reference
            .map(|image| vec![ControlNetUnit::canny(image)])
            .unwrap_or_default();

        Self {
            prompt: styled.prompt,
            negative_prompt: styled.negative_prompt,
            sampler_name: SAMPLER.to_string(),
            steps: 40,
            cfg_scale: 7.0,
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
            n_iter: number_of_images,
            seed: RANDOM_SEED,
            init_images: vec![init_image],
            mask,
            denoising_strength: 0.75,
            resize_mode: 0,
            mask_blur_x: 4,
            mask_blur_y: 4,
            inpainting_fill: 0,
            inpaint_full_res: false,
            inpaint_full_res_padding: 32,
            mask_round: true,
            include_init_images: true,
            alwayson_scripts: controlnet_scripts(units),
        }
    }
}
