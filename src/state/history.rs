use std::sync::Arc;

use crate::models::{GeneratedImage, GenerationResult};

pub type History = Vec<Arc<GenerationResult>>;

pub const MAX_RATING: u8 = 5;

/// Applies a rating toggle to the image with `image_id`.
///
/// Re-applying an image's current rating clears it to 0. Only the generation
/// holding the image and the image itself are reallocated; every other `Arc`
/// is shared with the input so callers can detect changes by pointer. An
/// unknown id returns the history unchanged.
pub fn rate(history: &History, image_id: &str, rating: u8) -> History {
    let Some((gen_index, image_index)) = locate_image(history, image_id) else {
        return history.clone();
    };

    let generation = &history[gen_index];
    let current = &generation.images[image_index];
    let next_rating = if current.rating == rating { 0 } else { rating };

    let mut images = generation.images.clone();
    images[image_index] = Arc::new(GeneratedImage {
        rating: next_rating,
        ..current.as_ref().clone()
    });

    let mut next = history.clone();
    next[gen_index] = Arc::new(GenerationResult {
        images,
        ..generation.as_ref().clone()
    });
    next
}

fn locate_image(history: &History, image_id: &str) -> Option<(usize, usize)> {
    history.iter().enumerate().find_map(|(gen_index, generation)| {
        generation
            .images
            .iter()
            .position(|image| image.id == image_id)
            .map(|image_index| (gen_index, image_index))
    })
}

pub fn find_generation<'a>(history: &'a History, id: &str) -> Option<&'a Arc<GenerationResult>> {
    history.iter().find(|generation| generation.id == id)
}

/// The generation to show: nothing while an error is active, otherwise the
/// explicit selection if set, otherwise the newest entry.
pub fn displayed<'a>(
    history: &'a History,
    selected_id: Option<&str>,
    error_active: bool,
) -> Option<&'a Arc<GenerationResult>> {
    if error_active {
        return None;
    }
    match selected_id {
        Some(id) => find_generation(history, id),
        None => history.first(),
    }
}
