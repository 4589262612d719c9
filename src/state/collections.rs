use crate::models::{PromptHistoryEntry, PromptPreset};

pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for PromptPreset {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for PromptHistoryEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Newest first.
pub fn prepend<T: Clone>(items: &[T], item: T) -> Vec<T> {
    let mut next = Vec::with_capacity(items.len() + 1);
    next.push(item);
    next.extend_from_slice(items);
    next
}

/// Removes the entry with `id`; `None` when nothing matched.
pub fn remove_by_id<T: Identified + Clone>(items: &[T], id: &str) -> Option<Vec<T>> {
    if !items.iter().any(|item| item.id() == id) {
        return None;
    }
    Some(items.iter().filter(|item| item.id() != id).cloned().collect())
}

pub fn find_by_id<'a, T: Identified>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

/// Case-insensitive substring match over base prompts. A blank filter keeps everything.
pub fn filter_prompt_history<'a>(
    entries: &'a [PromptHistoryEntry],
    search: &str,
) -> Vec<&'a PromptHistoryEntry> {
    let needle = search.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| needle.is_empty() || entry.config.base_prompt.to_lowercase().contains(&needle))
        .collect()
}
