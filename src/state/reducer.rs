use std::sync::Arc;

use crate::catalog::{AestheticParameter, EXAMPLE_PRESETS};
use crate::db::StoreKey;
use crate::generation::{assemble, expand, ImagePayload};
use crate::models::{PromptConfig, PromptHistoryEntry, PromptPreset};
use crate::state::collections::{find_by_id, prepend, remove_by_id};
use crate::state::context::Capabilities;
use crate::state::form::{check_temperature, normalize_preset_name, ValidationError};
use crate::state::history::{self, History, MAX_RATING};
use crate::state::AppState;

pub const GENERATION_FAILED_MESSAGE: &str = "Sorry, we couldn't generate the images. The model might be busy or there was a network issue. Please try again in a moment.";

#[derive(Debug, Clone)]
pub enum Action {
    SetBasePrompt(String),
    SetParameter(AestheticParameter),
    ToggleVariation(String),
    SetTemperature(f64),
    SetSeed(Option<i64>),
    Submit,
    GenerationSucceeded {
        request: BatchRequest,
        payloads: Vec<ImagePayload>,
    },
    GenerationFailed {
        request_id: String,
        detail: String,
    },
    /// Replaces the whole form, as when loading a preset.
    LoadConfig(PromptConfig),
    SavePreset { name: String },
    LoadPreset(String),
    DeletePreset(String),
    LoadPrompt(String),
    DeletePrompt(String),
    /// 1-based index into the built-in examples.
    LoadExample(usize),
    SelectGeneration(String),
    RateImage { image_id: String, rating: u8 },
    DismissError,
}

/// One dispatched batch. `request_id` is the id of the prompt-history entry
/// recorded for the attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub request_id: String,
    pub config: PromptConfig,
    pub prompts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Dispatch(BatchRequest),
    Persist(StoreKey),
}

#[derive(Debug)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<Effect>,
    pub rejected: Option<ValidationError>,
}

impl Transition {
    fn accept(state: AppState, effects: Vec<Effect>) -> Self {
        Transition {
            state,
            effects,
            rejected: None,
        }
    }

    fn reject(state: AppState, reason: ValidationError) -> Self {
        Transition {
            state,
            effects: Vec::new(),
            rejected: Some(reason),
        }
    }
}

pub fn reduce(mut state: AppState, action: Action, caps: &Capabilities) -> Transition {
    match action {
        Action::SetBasePrompt(value) => {
            state.form.set_base_prompt(&value);
            Transition::accept(state, Vec::new())
        }
        Action::SetParameter(parameter) => {
            state.form.set_parameter(parameter);
            Transition::accept(state, Vec::new())
        }
        Action::ToggleVariation(label) => match state.form.toggle_variation(&label) {
            Ok(()) => Transition::accept(state, Vec::new()),
            Err(reason) => Transition::reject(state, reason),
        },
        Action::SetTemperature(value) => match state.form.set_temperature(value) {
            Ok(()) => Transition::accept(state, Vec::new()),
            Err(reason) => Transition::reject(state, reason),
        },
        Action::SetSeed(seed) => {
            state.form.set_seed(seed);
            Transition::accept(state, Vec::new())
        }
        Action::Submit => submit(state, caps),
        Action::GenerationSucceeded { request, payloads } => {
            state.in_flight = state.in_flight.saturating_sub(1);
            match assemble(&request.config, payloads, caps.ids.as_ref(), caps.clock.now()) {
                Ok(result) => {
                    let result = Arc::new(result);
                    state.selected_generation_id = Some(result.id.clone());
                    state.generations = prepend(&state.generations, result);
                    Transition::accept(state, vec![Effect::Persist(StoreKey::Generations)])
                }
                Err(_) => {
                    state.error = Some(GENERATION_FAILED_MESSAGE.to_string());
                    Transition::accept(state, Vec::new())
                }
            }
        }
        Action::GenerationFailed { .. } => {
            state.in_flight = state.in_flight.saturating_sub(1);
            state.error = Some(GENERATION_FAILED_MESSAGE.to_string());
            Transition::accept(state, Vec::new())
        }
        Action::LoadConfig(config) => {
            if let Err(reason) = check_temperature(config.temperature) {
                return Transition::reject(state, reason);
            }
            state.form.load(&config);
            Transition::accept(state, Vec::new())
        }
        Action::SavePreset { name } => {
            let name = match normalize_preset_name(&name) {
                Ok(name) => name,
                Err(reason) => return Transition::reject(state, reason),
            };
            let preset = PromptPreset {
                id: caps.ids.next_id(),
                name,
                config: state.form.to_config(),
            };
            state.presets = prepend(&state.presets, preset);
            Transition::accept(state, vec![Effect::Persist(StoreKey::Presets)])
        }
        Action::LoadPreset(id) => {
            let Some(config) = find_by_id(&state.presets, &id).map(|p| p.config.clone()) else {
                return Transition::reject(state, ValidationError::UnknownPreset(id));
            };
            state.form.load(&config);
            Transition::accept(state, Vec::new())
        }
        Action::DeletePreset(id) => match remove_by_id(&state.presets, &id) {
            Some(presets) => {
                state.presets = presets;
                Transition::accept(state, vec![Effect::Persist(StoreKey::Presets)])
            }
            None => Transition::reject(state, ValidationError::UnknownPreset(id)),
        },
        Action::LoadPrompt(id) => {
            let Some(config) = find_by_id(&state.prompt_history, &id).map(|e| e.config.clone())
            else {
                return Transition::reject(state, ValidationError::UnknownPrompt(id));
            };
            state.form.load(&config);
            Transition::accept(state, Vec::new())
        }
        Action::DeletePrompt(id) => match remove_by_id(&state.prompt_history, &id) {
            Some(entries) => {
                state.prompt_history = entries;
                Transition::accept(state, vec![Effect::Persist(StoreKey::PromptHistory)])
            }
            None => Transition::reject(state, ValidationError::UnknownPrompt(id)),
        },
        Action::LoadExample(number) => {
            let Some(example) = number.checked_sub(1).and_then(|i| EXAMPLE_PRESETS.get(i)) else {
                return Transition::reject(state, ValidationError::UnknownExample(number));
            };
            state.form.load(&example.to_config());
            Transition::accept(state, Vec::new())
        }
        Action::SelectGeneration(id) => {
            if history::find_generation(&state.generations, &id).is_none() {
                return Transition::reject(state, ValidationError::UnknownGeneration(id));
            }
            state.selected_generation_id = Some(id);
            Transition::accept(state, Vec::new())
        }
        Action::RateImage { image_id, rating } => {
            if rating == 0 || rating > MAX_RATING {
                return Transition::reject(state, ValidationError::RatingOutOfRange(rating));
            }
            let rated = history::rate(&state.generations, &image_id, rating);
            if same_records(&state.generations, &rated) {
                return Transition::accept(state, Vec::new());
            }
            state.generations = rated;
            Transition::accept(state, vec![Effect::Persist(StoreKey::Generations)])
        }
        Action::DismissError => {
            state.error = None;
            Transition::accept(state, Vec::new())
        }
    }
}

fn submit(mut state: AppState, caps: &Capabilities) -> Transition {
    if let Err(reason) = state.form.validate_submission() {
        return Transition::reject(state, reason);
    }

    let config = state.form.to_config();
    let entry = PromptHistoryEntry {
        id: caps.ids.next_id(),
        config: config.clone(),
        timestamp: caps.clock.now(),
    };
    let request = BatchRequest {
        request_id: entry.id.clone(),
        prompts: expand(&config.base_prompt, config.parameter, &config.variations),
        config,
    };

    state.prompt_history = prepend(&state.prompt_history, entry);
    state.error = None;
    state.in_flight += 1;

    Transition::accept(
        state,
        vec![
            Effect::Persist(StoreKey::PromptHistory),
            Effect::Dispatch(request),
        ],
    )
}

fn same_records(before: &History, after: &History) -> bool {
    before.len() == after.len()
        && before
            .iter()
            .zip(after)
            .all(|(left, right)| Arc::ptr_eq(left, right))
}
