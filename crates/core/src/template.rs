//! `{{name}}` placeholder substitution for paths and SQL
//!
//! Rendering is plain substitution: no filters, conditionals or loops.
//! Whitespace inside the braces is allowed, so `{{ data_file_path }}` and
//! `{{data_file_path}}` are the same placeholder.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

/// Named substitution values
pub type TemplateVars = BTreeMap<String, String>;

/// Errors that can occur while rendering a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder has no value in the supplied variables
    #[error("Template variable '{name}' is not defined")]
    MissingVariable { name: String },
}

/// Render `template`, replacing every placeholder with its value
///
/// Fails on the first placeholder (in template order) that has no value.
pub fn render(template: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
    if let Some(name) = placeholders(template).find(|name| !vars.contains_key(*name)) {
        return Err(TemplateError::MissingVariable {
            name: name.to_string(),
        });
    }

    let rendered = PLACEHOLDER_REGEX.replace_all(template, |caps: &Captures| {
        // Presence was checked above
        vars.get(&caps[1]).cloned().unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

/// Names referenced by `template`, in order of appearance (with repeats)
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER_REGEX
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Build a [`TemplateVars`] map from name/value pairs
pub fn vars<K, V, I>(pairs: I) -> TemplateVars
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
