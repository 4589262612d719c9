use std::fmt::Write as _;

use crate::models::GenerationResult;

/// Summarizes the variations the user rated in `generation`.
///
/// Returns `None` until at least one image has a positive rating. Effective
/// variations are listed once each, in order of first appearance.
pub fn derive_blueprint(generation: &GenerationResult) -> Option<String> {
    let mut effective: Vec<&str> = Vec::new();
    for image in generation.images.iter().filter(|image| image.rating > 0) {
        if !effective.contains(&image.variation.as_str()) {
            effective.push(&image.variation);
        }
    }
    if effective.is_empty() {
        return None;
    }

    let mut text = String::from("--- Style Blueprint ---\n\n");
    let _ = writeln!(text, "Base Subject: {}", generation.base_prompt);
    let _ = writeln!(text, "Parameter Tested: {}", generation.parameter);
    let _ = writeln!(text, "Effective Variations: {}", effective.join(", "));
    text.push('\n');
    text.push_str("--- Parameters ---\n");
    let _ = writeln!(text, "Temperature: {}", generation.temperature);
    if let Some(seed) = generation.seed {
        let _ = writeln!(text, "Seed: {}", seed);
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::catalog::AestheticParameter;
    use crate::models::GeneratedImage;
    use chrono::Utc;

    fn generation(ratings: &[(&str, u8)], seed: Option<i64>) -> GenerationResult {
        GenerationResult {
            id: "g1".to_string(),
            base_prompt: "a cat".to_string(),
            parameter: AestheticParameter::Style,
            variations: ratings.iter().map(|(v, _)| v.to_string()).collect(),
            images: ratings
                .iter()
                .enumerate()
                .map(|(index, (variation, rating))| {
                    Arc::new(GeneratedImage {
                        id: format!("i{index}"),
                        src: String::new(),
                        prompt: format!("a cat, Style: {variation}"),
                        variation: variation.to_string(),
                        rating: *rating,
                    })
                })
                .collect(),
            timestamp: Utc::now(),
            temperature: 0.5,
            seed,
        }
    }

    #[test]
    fn nothing_until_something_is_rated() {
        let gen = generation(&[("Cyberpunk", 0), ("Ukiyo-e", 0)], None);
        assert_eq!(derive_blueprint(&gen), None);
    }

    #[test]
    fn renders_fixed_report() {
        let gen = generation(&[("Cyberpunk", 0), ("Ukiyo-e", 4)], None);
        assert_eq!(
            derive_blueprint(&gen).unwrap(),
            "--- Style Blueprint ---\n\n\
             Base Subject: a cat\n\
             Parameter Tested: Style\n\
             Effective Variations: Ukiyo-e\n\n\
             --- Parameters ---\n\
             Temperature: 0.5\n"
        );
    }

    #[test]
    fn collapses_duplicate_variations_in_first_seen_order() {
        let gen = generation(
            &[("Ukiyo-e", 2), ("Cyberpunk", 5), ("Ukiyo-e", 1), ("Biopunk", 0)],
            Some(42),
        );
        let text = derive_blueprint(&gen).unwrap();
        assert!(text.contains("Effective Variations: Ukiyo-e, Cyberpunk\n"));
        assert!(text.ends_with("Temperature: 0.5\nSeed: 42\n"));
    }
}
