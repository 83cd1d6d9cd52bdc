//! Prompt style templates

/// A named prompt template; `{prompt}` marks where the user prompt goes
#[derive(Debug, Clone)]
pub struct Style {
    pub name: String,
    pub prompt: String,
    pub negative_prompt: String,
}

/// Final prompt pair sent to the render service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledPrompt {
    pub prompt: String,
    pub negative_prompt: String,
}

pub struct StyleCatalog {
    styles: Vec<Style>,
}

impl StyleCatalog {
    pub fn new(styles: Vec<Style>) -> Self {
        Self { styles }
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name == name)
    }

    /// Apply a style, inserting the colour description right after the user prompt.
    /// An unknown style keeps the prompt (plus colours) and drops the negative prompt.
    pub fn apply(&self, style_name: &str, prompt: &str, color_names: &[String]) -> StyledPrompt {
        let colors = if color_names.is_empty() {
            String::new()
        } else {
            format!(" with colors {}", color_names.join(", "))
        };
        let subject = format!("{}{}", prompt, colors);

        match self.get(style_name) {
            Some(style) => StyledPrompt {
                prompt: style.prompt.replace("{prompt}", &subject),
                negative_prompt: style.negative_prompt.clone(),
            },
            None => StyledPrompt {
                prompt: subject,
                negative_prompt: String::new(),
            },
        }
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new(vec![
            Style {
                name: "base".to_string(),
                prompt: "{prompt}".to_string(),
                negative_prompt: String::new(),
            },
            Style {
                name: "3D Model".to_string(),
                prompt: "professional 3d model of {prompt} . octane render, highly detailed, volumetric, dramatic lighting"
                    .to_string(),
                negative_prompt: "ugly, deformed, noisy, low poly, blurry, painting, person, people, face, hands, legs, feet"
                    .to_string(),
            },
        ])
    }
}
