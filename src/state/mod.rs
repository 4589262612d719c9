pub mod blueprint;
pub mod collections;
pub mod context;
pub mod form;
pub mod history;
pub mod reducer;

use std::sync::Arc;

use crate::models::{GenerationResult, PromptHistoryEntry, PromptPreset};

pub use context::Capabilities;
pub use form::{PromptForm, ValidationError};
pub use history::History;
pub use reducer::{reduce, Action, BatchRequest, Effect, Transition};

/// Everything the session knows. Replaced wholesale by each reducer step.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub form: PromptForm,
    pub generations: History,
    pub presets: Vec<PromptPreset>,
    pub prompt_history: Vec<PromptHistoryEntry>,
    pub selected_generation_id: Option<String>,
    pub error: Option<String>,
    pub in_flight: usize,
}

impl AppState {
    pub fn new(
        default_temperature: f64,
        generations: History,
        presets: Vec<PromptPreset>,
        prompt_history: Vec<PromptHistoryEntry>,
    ) -> Self {
        AppState {
            form: PromptForm::new(default_temperature),
            generations,
            presets,
            prompt_history,
            selected_generation_id: None,
            error: None,
            in_flight: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn displayed_generation(&self) -> Option<&Arc<GenerationResult>> {
        history::displayed(
            &self.generations,
            self.selected_generation_id.as_deref(),
            self.error.is_some(),
        )
    }

    pub fn blueprint(&self) -> Option<String> {
        self.displayed_generation()
            .and_then(|generation| blueprint::derive_blueprint(generation))
    }
}
