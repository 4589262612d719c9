use std::fmt::Write as _;

use crate::catalog::{AestheticParameter, EXAMPLE_PRESETS};
use crate::models::{GenerationResult, PromptConfig, PromptHistoryEntry, PromptPreset};
use crate::state::history::MAX_RATING;
use crate::state::{AppState, History, PromptForm};

pub const RATE_TO_BLUEPRINT: &str = "Rate your favorite images above to generate a style blueprint.";

fn format_seed(seed: Option<i64>) -> String {
    seed.map(|value| value.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING) as usize;
    let empty = MAX_RATING as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

fn summarize_config(config: &PromptConfig) -> String {
    format!(
        "{}: {} (temperature {}, seed {})",
        config.parameter,
        config.variations.join(", "),
        config.temperature,
        format_seed(config.seed)
    )
}

pub fn render_form(form: &PromptForm) -> String {
    let mut text = String::new();
    let base = if form.base_prompt.trim().is_empty() {
        "(empty)"
    } else {
        form.base_prompt.as_str()
    };
    let _ = writeln!(text, "Base prompt: {base}");
    let _ = writeln!(text, "Parameter:   {}", form.parameter);
    let selected = if form.selected_variations.is_empty() {
        "(none)".to_string()
    } else {
        form.selected_variations.join(", ")
    };
    let _ = writeln!(text, "Variations:  {selected}");
    let _ = writeln!(text, "Temperature: {}", form.temperature);
    let _ = write!(text, "Seed:        {}", format_seed(form.seed));
    text
}

pub fn render_options(form: &PromptForm) -> String {
    let mut text = String::new();
    for parameter in AestheticParameter::ALL {
        let marker = if parameter == form.parameter { " (active)" } else { "" };
        let _ = writeln!(text, "{parameter}{marker}");
        for option in parameter.options() {
            let checked = parameter == form.parameter
                && form.selected_variations.iter().any(|v| v == option);
            let _ = writeln!(text, "  [{}] {option}", if checked { "x" } else { " " });
        }
    }
    text.trim_end().to_string()
}

pub fn render_presets(presets: &[PromptPreset]) -> String {
    if presets.is_empty() {
        return "No saved presets.".to_string();
    }
    let mut text = String::new();
    for preset in presets {
        let _ = writeln!(text, "{}  {}", preset.id, preset.name);
        let _ = writeln!(text, "    {}", preset.config.base_prompt);
        let _ = writeln!(text, "    {}", summarize_config(&preset.config));
    }
    text.trim_end().to_string()
}

pub fn render_prompt_history(entries: &[&PromptHistoryEntry], filter: Option<&str>) -> String {
    if entries.is_empty() {
        return match filter {
            Some(search) => format!("No prompts found matching \"{search}\"."),
            None => "No prompt history yet.".to_string(),
        };
    }
    let mut text = String::new();
    for entry in entries {
        let _ = writeln!(
            text,
            "{}  {}",
            entry.id,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(text, "    {}", entry.config.base_prompt);
        let _ = writeln!(text, "    {}", summarize_config(&entry.config));
    }
    text.trim_end().to_string()
}

pub fn render_examples() -> String {
    let mut text = String::new();
    for (index, example) in EXAMPLE_PRESETS.iter().enumerate() {
        let _ = writeln!(text, "{}. {}", index + 1, example.name);
        let _ = writeln!(text, "    {}", example.base_prompt);
        let _ = writeln!(text, "    {}", summarize_config(&example.to_config()));
    }
    text.trim_end().to_string()
}

pub fn render_history(history: &History, displayed_id: Option<&str>) -> String {
    if history.is_empty() {
        return "No generations yet.".to_string();
    }
    let mut text = String::new();
    for generation in history {
        let marker = if Some(generation.id.as_str()) == displayed_id { "*" } else { " " };
        let rated = generation.images.iter().filter(|i| i.rating > 0).count();
        let _ = writeln!(
            text,
            "{marker} {}  {}  {} / {} ({} image(s), {} rated)",
            generation.id,
            generation.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            generation.base_prompt,
            generation.parameter,
            generation.images.len(),
            rated
        );
    }
    text.trim_end().to_string()
}

pub fn render_generation(generation: &GenerationResult) -> String {
    let mut text = String::new();
    let _ = writeln!(
        text,
        "Generation {} ({})",
        generation.id,
        generation.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(text, "{}", generation.base_prompt);
    let _ = writeln!(
        text,
        "{} varied across {} variation(s); temperature {}, seed {}",
        generation.parameter,
        generation.variations.len(),
        generation.temperature,
        format_seed(generation.seed)
    );
    for (index, image) in generation.images.iter().enumerate() {
        let mime = image
            .src
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or("unknown");
        let _ = writeln!(
            text,
            "  {}. {}  {}  {}  [{}, {} bytes encoded]",
            index + 1,
            image.id,
            stars(image.rating),
            image.variation,
            mime,
            image.src.len()
        );
    }
    text.trim_end().to_string()
}

pub fn render_status(state: &AppState) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "In-flight batches: {}", state.in_flight);
    let _ = writeln!(text, "Generations: {}", state.generations.len());
    let _ = writeln!(text, "Presets: {}", state.presets.len());
    let _ = writeln!(text, "Prompt history: {}", state.prompt_history.len());
    let shown = state
        .displayed_generation()
        .map(|generation| generation.id.clone())
        .unwrap_or_else(|| "none".to_string());
    let _ = write!(text, "Displayed generation: {shown}");
    if let Some(error) = &state.error {
        let _ = write!(text, "\nError: {error}");
    }
    text
}
