//! Rendering of command outcomes.
//!
//! [`OutputMode`] is the value of the `--output` flag. Text mode prints
//! handler data in a line-oriented form meant for people; the structured
//! modes serialize it unchanged.

use std::io::Write;

use clap::ValueEnum;
use cmdtree::Outcome;
use serde_json::Value;
use thiserror::Error;

/// Controls how outcomes are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Plain lines: strings as-is, objects as `key: value`
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

impl OutputMode {
    /// Returns true for the modes that serialize data unchanged.
    pub fn is_structured(&self) -> bool {
        matches!(self, OutputMode::Json | OutputMode::Yaml)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders an outcome. `None` when there is nothing to print.
pub fn render(outcome: &Outcome, mode: OutputMode) -> Result<Option<String>, RenderError> {
    let Some(data) = outcome.data() else {
        return Ok(None);
    };
    let text = match mode {
        OutputMode::Text => render_text(data),
        OutputMode::Json => serde_json::to_string_pretty(data)?,
        OutputMode::Yaml => serde_yaml::to_string(data)?.trim_end().to_string(),
    };
    Ok(Some(text).filter(|text| !text.is_empty()))
}

/// Renders and writes an outcome, followed by a newline.
pub fn write_outcome<W: Write>(
    out: &mut W,
    outcome: &Outcome,
    mode: OutputMode,
) -> Result<(), RenderError> {
    if let Some(text) = render(outcome, mode)? {
        writeln!(out, "{}", text)?;
    }
    Ok(())
}

fn render_text(data: &Value) -> String {
    match data {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(fields) => fields
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| format!("{}: {}", key, render_inline(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

// Nested values stay on one line.
fn render_inline(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
