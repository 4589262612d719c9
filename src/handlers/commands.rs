use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::catalog::AestheticParameter;
use crate::models::PromptConfig;
use crate::state::form::check_temperature;
use crate::state::Action;

pub const HELP_TEXT: &str = "\
Form
  prompt <text>             set the base prompt
  param <name>              style | lighting | composition
  toggle <variation>        select or deselect a variation
  temp <0..1>               set temperature
  seed <int|none>           set or clear the seed
  form                      show the current form
  options                   list variations for every parameter
  submit                    generate one image per selected variation
  generate --prompt <text> --parameter <name> --variation <label> [--variation ...]
           [--temperature <t>] [--seed <n>]
           (flag values run to the next word starting with --; runs of spaces become one)
Presets and history
  save-preset <name>        save the form as a preset
  presets | load-preset <id> | delete-preset <id>
  prompts [filter]          list past submissions (case-insensitive filter)
  load-prompt <id> | delete-prompt <id>
  examples | load-example <n>
Results
  history                   list generations, newest first
  select <id>               show a past generation
  show                      show the displayed generation
  rate <image-id> <1-5>     rate an image; repeating a rating clears it
  blueprint [path]          print the style blueprint, optionally writing it to a file
  dismiss                   clear the current error
  status | help | quit";

#[derive(Debug, Clone)]
pub enum Command {
    Apply(Action),
    Generate(PromptConfig),
    ShowForm,
    Options,
    Presets,
    Prompts(Option<String>),
    Examples,
    History,
    Show,
    Blueprint(Option<PathBuf>),
    Status,
    Help,
    Quit,
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str> {
    if rest.is_empty() {
        return Err(anyhow!("Usage: {usage}"));
    }
    Ok(rest)
}

fn optional(rest: &str) -> Option<String> {
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn parse_temperature(value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| anyhow!("Invalid temperature value: {value}"))
}

fn parse_seed(value: &str) -> Result<Option<i64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| anyhow!("Invalid seed value: {value}"))
}

fn parse_parameter(value: &str) -> Result<AestheticParameter> {
    value.parse::<AestheticParameter>().map_err(|err| anyhow!(err))
}

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_lowercase().as_str() {
        "prompt" => Command::Apply(Action::SetBasePrompt(rest.to_string())),
        "param" | "parameter" => Command::Apply(Action::SetParameter(parse_parameter(
            required(rest, "param <style|lighting|composition>")?,
        )?)),
        "toggle" => Command::Apply(Action::ToggleVariation(
            required(rest, "toggle <variation>")?.to_string(),
        )),
        "temp" | "temperature" => Command::Apply(Action::SetTemperature(parse_temperature(
            required(rest, "temp <0..1>")?,
        )?)),
        "seed" => Command::Apply(Action::SetSeed(parse_seed(rest)?)),
        "form" => Command::ShowForm,
        "options" => Command::Options,
        "submit" => Command::Apply(Action::Submit),
        "generate" => Command::Generate(parse_generate_flags(rest)?),
        "save-preset" => Command::Apply(Action::SavePreset {
            name: rest.to_string(),
        }),
        "presets" => Command::Presets,
        "load-preset" => Command::Apply(Action::LoadPreset(
            required(rest, "load-preset <id>")?.to_string(),
        )),
        "delete-preset" => Command::Apply(Action::DeletePreset(
            required(rest, "delete-preset <id>")?.to_string(),
        )),
        "prompts" => Command::Prompts(optional(rest)),
        "load-prompt" => Command::Apply(Action::LoadPrompt(
            required(rest, "load-prompt <id>")?.to_string(),
        )),
        "delete-prompt" => Command::Apply(Action::DeletePrompt(
            required(rest, "delete-prompt <id>")?.to_string(),
        )),
        "examples" => Command::Examples,
        "load-example" => {
            let value = required(rest, "load-example <n>")?;
            let number = value
                .parse::<usize>()
                .map_err(|_| anyhow!("Invalid example number: {value}"))?;
            Command::Apply(Action::LoadExample(number))
        }
        "history" => Command::History,
        "select" => Command::Apply(Action::SelectGeneration(
            required(rest, "select <generation-id>")?.to_string(),
        )),
        "show" => Command::Show,
        "rate" => {
            let usage = "rate <image-id> <1-5>";
            let mut parts = required(rest, usage)?.split_whitespace();
            let image_id = parts.next().ok_or_else(|| anyhow!("Usage: {usage}"))?;
            let value = parts.next().ok_or_else(|| anyhow!("Usage: {usage}"))?;
            if parts.next().is_some() {
                return Err(anyhow!("Usage: {usage}"));
            }
            let rating = value
                .parse::<u8>()
                .map_err(|_| anyhow!("Invalid rating value: {value}"))?;
            Command::Apply(Action::RateImage {
                image_id: image_id.to_string(),
                rating,
            })
        }
        "blueprint" => Command::Blueprint(optional(rest).map(PathBuf::from)),
        "dismiss" => Command::Apply(Action::DismissError),
        "status" => Command::Status,
        "help" | "-h" | "--help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "" => return Err(anyhow!("Type 'help' for a list of commands")),
        other => return Err(anyhow!("Unknown command: {other}\nType 'help' for a list of commands")),
    };
    Ok(command)
}

/// `--flag value words --flag value ...`; values run until the next `--flag`.
fn split_flags(rest: &str) -> Result<Vec<(String, String)>> {
    let mut flags: Vec<(String, Vec<&str>)> = Vec::new();
    for token in rest.split_whitespace() {
        if let Some(name) = token.strip_prefix("--") {
            if name.is_empty() {
                return Err(anyhow!("Empty flag name"));
            }
            flags.push((name.to_lowercase(), Vec::new()));
        } else if let Some((_, words)) = flags.last_mut() {
            words.push(token);
        } else {
            return Err(anyhow!("Unexpected value before any flag: {token}"));
        }
    }
    Ok(flags
        .into_iter()
        .map(|(name, words)| (name, words.join(" ")))
        .collect())
}

fn parse_generate_flags(rest: &str) -> Result<PromptConfig> {
    let usage = "generate --prompt <text> --parameter <name> --variation <label> [--variation ...] [--temperature <t>] [--seed <n>]";
    let mut base_prompt: Option<String> = None;
    let mut parameter: Option<AestheticParameter> = None;
    let mut labels: Vec<String> = Vec::new();
    let mut temperature: Option<f64> = None;
    let mut seed = None;

    for (name, value) in split_flags(rest)? {
        match name.as_str() {
            "prompt" => base_prompt = Some(value),
            "parameter" | "param" => parameter = Some(parse_parameter(&value)?),
            "variation" => labels.push(value),
            "temperature" | "temp" => {
                let value = parse_temperature(&value)?;
                check_temperature(value)?;
                temperature = Some(value);
            }
            "seed" => seed = parse_seed(&value)?,
            other => return Err(anyhow!("Unknown generate argument: --{other}\nUsage: {usage}")),
        }
    }

    let base_prompt = base_prompt
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("--prompt is required\nUsage: {usage}"))?;
    let parameter = parameter.ok_or_else(|| anyhow!("--parameter is required\nUsage: {usage}"))?;
    if labels.is_empty() {
        return Err(anyhow!("At least one --variation is required\nUsage: {usage}"));
    }

    let mut variations: Vec<String> = Vec::with_capacity(labels.len());
    for label in &labels {
        let canonical = parameter
            .canonical_option(label)
            .ok_or_else(|| anyhow!("'{label}' is not a {parameter} option"))?;
        variations.push(canonical.to_string());
    }

    Ok(PromptConfig {
        base_prompt,
        parameter,
        variations,
        temperature: temperature.unwrap_or(crate::config::CONFIG.default_temperature),
        seed,
    })
}
