use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::PromptConfig;

/// The aesthetic dimension varied across one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AestheticParameter {
    #[default]
    Style,
    Lighting,
    Composition,
}

impl AestheticParameter {
    pub const ALL: [AestheticParameter; 3] = [
        AestheticParameter::Style,
        AestheticParameter::Lighting,
        AestheticParameter::Composition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AestheticParameter::Style => "Style",
            AestheticParameter::Lighting => "Lighting",
            AestheticParameter::Composition => "Composition",
        }
    }

    pub fn options(self) -> &'static [&'static str] {
        match self {
            AestheticParameter::Style => &STYLE_OPTIONS,
            AestheticParameter::Lighting => &LIGHTING_OPTIONS,
            AestheticParameter::Composition => &COMPOSITION_OPTIONS,
        }
    }

    /// Canonical spelling of `label` if it belongs to this parameter's catalog.
    pub fn canonical_option(self, label: &str) -> Option<&'static str> {
        let needle = label.trim();
        self.options()
            .iter()
            .copied()
            .find(|option| option.eq_ignore_ascii_case(needle))
    }

    pub fn allows(self, label: &str) -> bool {
        self.options().contains(&label)
    }
}

impl fmt::Display for AestheticParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown aesthetic parameter '{0}' (expected style, lighting or composition)")]
pub struct UnknownParameter(pub String);

impl FromStr for AestheticParameter {
    type Err = UnknownParameter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "style" => Ok(AestheticParameter::Style),
            "lighting" => Ok(AestheticParameter::Lighting),
            "composition" => Ok(AestheticParameter::Composition),
            _ => Err(UnknownParameter(value.trim().to_string())),
        }
    }
}

const STYLE_OPTIONS: [&str; 9] = [
    "Ukiyo-e",
    "Cyberpunk",
    "Surrealism",
    "Art Deco",
    "Impressionism",
    "Steampunk",
    "Biopunk",
    "Minimalist",
    "Vaporwave",
];

const LIGHTING_OPTIONS: [&str; 8] = [
    "Volumetric lighting",
    "Cinematic lighting",
    "Rim lighting",
    "Silhouette lighting",
    "Soft, diffused lighting",
    "Hard, dramatic lighting",
    "Neon glow",
    "Golden hour",
];

const COMPOSITION_OPTIONS: [&str; 8] = [
    "Symmetrical",
    "Asymmetrical",
    "Rule of thirds",
    "Leading lines",
    "Patterns and repetition",
    "Close-up",
    "Wide shot",
    "Dutch angle",
];

/// A built-in starter configuration shown alongside user presets.
#[derive(Debug, Clone, Copy)]
pub struct ExamplePreset {
    pub name: &'static str,
    pub base_prompt: &'static str,
    pub parameter: AestheticParameter,
    pub variations: &'static [&'static str],
    pub temperature: f64,
    pub seed: Option<i64>,
}

impl ExamplePreset {
    pub fn to_config(&self) -> PromptConfig {
        PromptConfig {
            base_prompt: self.base_prompt.to_string(),
            parameter: self.parameter,
            variations: self.variations.iter().map(|v| v.to_string()).collect(),
            temperature: self.temperature,
            seed: self.seed,
        }
    }
}

pub const EXAMPLE_PRESETS: [ExamplePreset; 3] = [
    ExamplePreset {
        name: "Cyberpunk City Lighting",
        base_prompt: "A rain-slicked neon street in a futuristic city, crowded with people holding glowing umbrellas",
        parameter: AestheticParameter::Lighting,
        variations: &[
            "Volumetric lighting",
            "Cinematic lighting",
            "Rim lighting",
            "Neon glow",
        ],
        temperature: 0.6,
        seed: Some(2049),
    },
    ExamplePreset {
        name: "Ukiyo-e Cherry Blossom",
        base_prompt: "A solitary cherry blossom tree on a misty mountain overlooking a tranquil village",
        parameter: AestheticParameter::Style,
        variations: &["Ukiyo-e", "Impressionism", "Minimalist"],
        temperature: 0.4,
        seed: None,
    },
    ExamplePreset {
        name: "Surreal Underwater Scene",
        base_prompt: "An octopus reading a glowing book in a vast, ancient underwater library",
        parameter: AestheticParameter::Composition,
        variations: &["Symmetrical", "Close-up", "Wide shot", "Dutch angle"],
        temperature: 0.8,
        seed: Some(101),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parameter_names_case_insensitively() {
        assert_eq!(
            " LIGHTING ".parse::<AestheticParameter>(),
            Ok(AestheticParameter::Lighting)
        );
        assert!("color".parse::<AestheticParameter>().is_err());
    }

    #[test]
    fn canonicalizes_catalog_labels() {
        assert_eq!(
            AestheticParameter::Style.canonical_option("ukiyo-E"),
            Some("Ukiyo-e")
        );
        assert_eq!(
            AestheticParameter::Lighting.canonical_option("soft, diffused lighting"),
            Some("Soft, diffused lighting")
        );
        assert_eq!(AestheticParameter::Style.canonical_option("Neon glow"), None);
    }

    #[test]
    fn example_presets_only_use_their_own_catalog() {
        for example in EXAMPLE_PRESETS.iter() {
            for variation in example.variations {
                assert!(
                    example.parameter.allows(variation),
                    "{} not allowed for {}",
                    variation,
                    example.parameter
                );
            }
        }
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&AestheticParameter::Composition).unwrap();
        assert_eq!(json, "\"Composition\"");
    }
}
