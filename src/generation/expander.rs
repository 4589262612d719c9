use crate::catalog::AestheticParameter;

pub fn prompt_for(base_prompt: &str, parameter: AestheticParameter, variation: &str) -> String {
    format!("{base_prompt}, {parameter}: {variation}")
}

/// One prompt per variation, in caller order. Duplicates are kept so results
/// stay positionally aligned with the requested variations.
pub fn expand(base_prompt: &str, parameter: AestheticParameter, variations: &[String]) -> Vec<String> {
    variations
        .iter()
        .map(|variation| prompt_for(base_prompt, parameter, variation))
        .collect()
}
