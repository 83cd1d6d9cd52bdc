//! Generation front-end - validation, prompt styling and payload building

pub mod color;
pub mod payload;
pub mod request;
pub mod source;
pub mod style;

use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::{AppError, Result};
use crate::queue::task::TaskKind;

use color::ColorNamer;
use payload::{Img2ImgPayload, Txt2ImgPayload};
use source::ImageResolver;
use request::{validate_count, validate_image, validate_prompt, FirstGenerationRequest, NextGenerationRequest};
use style::{StyleCatalog, StyledPrompt};

/// A validated job ready for the task store
#[derive(Debug, Clone)]
pub struct PreparedJob {
    pub kind: TaskKind,
    pub parameters: serde_json::Value,
}

/// Turns user requests into render payloads
pub struct GenerationService {
    styles: StyleCatalog,
    colors: ColorNamer,
    images: ImageResolver,
    config: GenerationConfig,
}

impl GenerationService {
    pub fn new(
        styles: StyleCatalog,
        colors: ColorNamer,
        images: ImageResolver,
        config: GenerationConfig,
    ) -> Self {
        Self {
            styles,
            colors,
            images,
            config,
        }
    }

    /// Resolve a reference or URL, then require valid base64
    async fn image(&self, field: &str, image: Option<&str>) -> Result<Option<String>> {
        let resolved = self.images.resolve(field, image).await?;
        validate_image(field, resolved.as_deref())
    }

    async fn style_prompt(&self, prompt: &str, style: Option<&str>, palette: &[String]) -> StyledPrompt {
        let color_names = self.colors.describe(palette).await;
        let style = style.unwrap_or(&self.config.default_style);
        let styled = self.styles.apply(style, prompt, &color_names);
        debug!(style = %style, prompt = %styled.prompt, "Styled prompt");
        styled
    }

    /// Validate a first-generation request and build its txt2img job
    pub async fn prepare_first(&self, request: FirstGenerationRequest) -> Result<PreparedJob> {
        let prompt = validate_prompt(&request.prompt)?;
        let count = validate_count(request.number_of_images, self.config.max_images)?;
        let base_image = self.image("base_image", request.base_image.as_deref()).await?;
        let style_reference = self
            .image("style_reference", request.style_reference.as_deref())
            .await?;

        let styled = self
            .style_prompt(&prompt, request.style.as_deref(), &request.color_palette)
            .await;
        let payload = Txt2ImgPayload::new(styled, count, base_image, style_reference);

        Ok(PreparedJob {
            kind: TaskKind::TextToImage,
            parameters: serde_json::to_value(payload)?,
        })
    }

    /// Validate a next-generation request and build its img2img job
    pub async fn prepare_next(&self, request: NextGenerationRequest) -> Result<PreparedJob> {
        let prompt = validate_prompt(&request.prompt)?;
        let count = validate_count(request.number_of_images, self.config.max_images)?;
        let init_image = self
            .image("init_image", Some(&request.init_image))
            .await?
            .ok_or_else(|| AppError::InvalidRequest("init_image is required".to_string()))?;
        let mask = self.image("combined_mask", request.combined_mask.as_deref()).await?;
        let style_reference = self
            .image("style_reference", request.style_reference.as_deref())
            .await?;

        let styled = self
            .style_prompt(&prompt, request.style.as_deref(), &request.color_palette)
            .await;
        let payload = Img2ImgPayload::new(styled, count, init_image, mask, style_reference);

        Ok(PreparedJob {
            kind: TaskKind::ImageToImage,
            parameters: serde_json::to_value(payload)?,
        })
    }
}
