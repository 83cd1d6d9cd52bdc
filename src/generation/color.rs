//! Hex colour to colour-name lookup via an external colour API

use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ColorConfig;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
struct ApiColor {
    name: ApiColorName,
}

#[derive(Debug, Deserialize)]
struct ApiColorName {
    value: String,
}

/// Names colours for prompts, caching answers; lookups never fail
pub struct ColorNamer {
    client: Client,
    api_url: String,
    enabled: bool,
    cache: DashMap<String, String>,
}

impl ColorNamer {
    pub fn new(config: &ColorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            enabled: config.enabled,
            cache: DashMap::new(),
        })
    }

    /// Name every colour in the palette, in order
    pub async fn describe(&self, palette: &[String]) -> Vec<String> {
        let mut names = Vec::with_capacity(palette.len());
        for hex in palette {
            names.push(self.name_for(hex).await);
        }
        names
    }

    /// Colour name for a hex code, or the hex code itself if the lookup fails
    pub async fn name_for(&self, hex: &str) -> String {
        let key = normalize_hex(hex);
        if !self.enabled || key.is_empty() {
            return hex.to_string();
        }

        if let Some(name) = self.cache.get(&key) {
            return name.clone();
        }

        match self.lookup(&key).await {
            Ok(name) => {
                debug!(hex = %key, name = %name, "Resolved colour name");
                self.cache.insert(key, name.clone());
                name
            }
            Err(e) => {
                warn!(hex = %hex, error = %e, "Error retrieving colour name");
                hex.to_string()
            }
        }
    }

    async fn lookup(&self, hex: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/id", self.api_url))
            .query(&[("hex", hex)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::BackendError(format!(
                "Colour API returned {}",
                response.status()
            )));
        }

        let color = response.json::<ApiColor>().await?;
        Ok(color.name.value)
    }
}

fn normalize_hex(hex: &str) -> String {
    hex.trim().trim_start_matches('#').to_ascii_uppercase()
}
