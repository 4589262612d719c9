use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::AestheticParameter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: String,
    /// `data:` URI holding the encoded image.
    pub src: String,
    pub prompt: String,
    pub variation: String,
    /// 0 means unrated.
    #[serde(default)]
    pub rating: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub id: String,
    pub base_prompt: String,
    pub parameter: AestheticParameter,
    pub variations: Vec<String>,
    pub images: Vec<Arc<GeneratedImage>>,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPreset {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub config: PromptConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptHistoryEntry {
    pub id: String,
    #[serde(flatten)]
    pub config: PromptConfig,
    pub timestamp: DateTime<Utc>,
}

/// The reusable part of a submission: everything except identity and results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptConfig {
    pub base_prompt: String,
    pub parameter: AestheticParameter,
    pub variations: Vec<String>,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn preset_json_is_flat_camel_case() {
        let preset = PromptPreset {
            id: "p1".to_string(),
            name: "Night".to_string(),
            config: PromptConfig {
                base_prompt: "a harbor".to_string(),
                parameter: AestheticParameter::Lighting,
                variations: vec!["Neon glow".to_string()],
                temperature: 0.25,
                seed: None,
            },
        };

        let value = serde_json::to_value(&preset).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "p1",
                "name": "Night",
                "basePrompt": "a harbor",
                "parameter": "Lighting",
                "variations": ["Neon glow"],
                "temperature": 0.25
            })
        );
    }

    #[test]
    fn missing_rating_reads_as_unrated() {
        let image: GeneratedImage = serde_json::from_value(json!({
            "id": "i1",
            "src": "data:image/jpeg;base64,AAAA",
            "prompt": "a cat, Style: Cyberpunk",
            "variation": "Cyberpunk"
        }))
        .unwrap();
        assert_eq!(image.rating, 0);
    }
}
