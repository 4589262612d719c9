use crate::catalog::AestheticParameter;
use crate::models::PromptConfig;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Enter a base prompt first")]
    EmptyBasePrompt,
    #[error("Select at least one variation")]
    NoVariations,
    #[error("'{label}' is not a {parameter} option")]
    UnknownVariation {
        label: String,
        parameter: AestheticParameter,
    },
    #[error("Temperature must be between 0.0 and 1.0 (got {0})")]
    TemperatureOutOfRange(f64),
    #[error("Preset name cannot be empty")]
    EmptyPresetName,
    #[error("Rating must be between 1 and 5 (got {0})")]
    RatingOutOfRange(u8),
    #[error("No preset with id {0}")]
    UnknownPreset(String),
    #[error("No prompt history entry with id {0}")]
    UnknownPrompt(String),
    #[error("No generation with id {0}")]
    UnknownGeneration(String),
    #[error("No example numbered {0}")]
    UnknownExample(usize),
}

/// The editable draft behind a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptForm {
    pub base_prompt: String,
    pub parameter: AestheticParameter,
    pub selected_variations: Vec<String>,
    pub temperature: f64,
    pub seed: Option<i64>,
}

impl PromptForm {
    pub fn new(default_temperature: f64) -> Self {
        PromptForm {
            base_prompt: String::new(),
            parameter: AestheticParameter::default(),
            selected_variations: Vec::new(),
            temperature: default_temperature,
            seed: None,
        }
    }

    pub fn set_base_prompt(&mut self, value: &str) {
        self.base_prompt = value.to_string();
    }

    /// Switches parameter and drops selections the new catalog does not offer.
    pub fn set_parameter(&mut self, parameter: AestheticParameter) {
        self.parameter = parameter;
        self.selected_variations
            .retain(|variation| parameter.allows(variation));
    }

    pub fn toggle_variation(&mut self, label: &str) -> Result<(), ValidationError> {
        let canonical = self.parameter.canonical_option(label).ok_or_else(|| {
            ValidationError::UnknownVariation {
                label: label.trim().to_string(),
                parameter: self.parameter,
            }
        })?;

        if let Some(index) = self
            .selected_variations
            .iter()
            .position(|selected| selected == canonical)
        {
            self.selected_variations.remove(index);
        } else {
            self.selected_variations.push(canonical.to_string());
        }
        Ok(())
    }

    pub fn set_temperature(&mut self, value: f64) -> Result<(), ValidationError> {
        check_temperature(value)?;
        self.temperature = value;
        Ok(())
    }

    pub fn set_seed(&mut self, seed: Option<i64>) {
        self.seed = seed;
    }

    pub fn load(&mut self, config: &PromptConfig) {
        self.base_prompt = config.base_prompt.clone();
        self.parameter = config.parameter;
        self.selected_variations = config
            .variations
            .iter()
            .filter(|variation| config.parameter.allows(variation))
            .cloned()
            .collect();
        if config.temperature.is_finite() && (0.0..=1.0).contains(&config.temperature) {
            self.temperature = config.temperature;
        }
        self.seed = config.seed;
    }

    pub fn validate_submission(&self) -> Result<(), ValidationError> {
        if self.base_prompt.trim().is_empty() {
            return Err(ValidationError::EmptyBasePrompt);
        }
        if self.selected_variations.is_empty() {
            return Err(ValidationError::NoVariations);
        }
        Ok(())
    }

    pub fn to_config(&self) -> PromptConfig {
        PromptConfig {
            base_prompt: self.base_prompt.clone(),
            parameter: self.parameter,
            variations: self.selected_variations.clone(),
            temperature: self.temperature,
            seed: self.seed,
        }
    }
}

impl Default for PromptForm {
    fn default() -> Self {
        PromptForm::new(0.5)
    }
}

pub fn check_temperature(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::TemperatureOutOfRange(value));
    }
    Ok(())
}

pub fn normalize_preset_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyPresetName);
    }
    Ok(trimmed.to_string())
}
