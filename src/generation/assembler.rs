use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::generation::client::ImagePayload;
use crate::generation::expander::prompt_for;
use crate::models::{GeneratedImage, GenerationResult, PromptConfig};
use crate::state::context::IdGenerator;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Batch returned {payloads} image(s) for {variations} variation(s)")]
pub struct AssembleError {
    pub variations: usize,
    pub payloads: usize,
}

pub fn assemble(
    config: &PromptConfig,
    payloads: Vec<ImagePayload>,
    ids: &dyn IdGenerator,
    now: DateTime<Utc>,
) -> Result<GenerationResult, AssembleError> {
    if payloads.len() != config.variations.len() {
        return Err(AssembleError {
            variations: config.variations.len(),
            payloads: payloads.len(),
        });
    }

    let images = config
        .variations
        .iter()
        .zip(payloads)
        .map(|(variation, payload)| {
            Arc::new(GeneratedImage {
                id: ids.next_id(),
                src: payload.to_data_uri(),
                prompt: prompt_for(&config.base_prompt, config.parameter, variation),
                variation: variation.clone(),
                rating: 0,
            })
        })
        .collect();

    Ok(GenerationResult {
        id: ids.next_id(),
        base_prompt: config.base_prompt.clone(),
        parameter: config.parameter,
        variations: config.variations.clone(),
        images,
        timestamp: now,
        temperature: config.temperature,
        seed: config.seed,
    })
}
