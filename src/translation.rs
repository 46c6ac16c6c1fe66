//! Message templates for descriptions, constraints and table texts.
//!
//! Templates use `{name}` placeholders. The built-in English templates can be overridden
//! from a YAML or JSON file mapping keys to templates.

use crate::error::Result;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("required", "Must not be null"),
    ("required_nested", "Must not be null"),
    ("length.not_empty", "Must not be empty"),
    ("length.min", "Size must be at least {min}"),
    ("length.max", "Size must be at most {max}"),
    ("length.min_max", "Size must be between {min} and {max} inclusive"),
    ("length.equal", "Size must be exactly {equal}"),
    ("range.min", "Must be at least {min}"),
    ("range.max", "Must be at most {max}"),
    ("range.min_max", "Must be at least {min} and at most {max}"),
    ("range.exclusive_min", "Must be greater than {exclusive_min}"),
    ("range.exclusive_max", "Must be less than {exclusive_max}"),
    ("email", "Must be a well-formed email address"),
    ("url", "Must be a well-formed URL"),
    ("contains", "Must contain `{pattern}`"),
    ("does_not_contain", "Must not contain `{pattern}`"),
    ("regex", "Must match the regular expression `{path}`"),
    ("must_match", "Must match `{other}`"),
    ("credit_card", "Must be a valid credit card number"),
    ("ip", "Must be a valid IP address"),
    ("ip.v4", "Must be a valid IPv4 address"),
    ("ip.v6", "Must be a valid IPv6 address"),
    ("non_control_character", "Must not contain control characters"),
    ("custom", "Must satisfy `{function}`"),
    ("custom.not_blank", "Must not be blank"),
    ("constraint.groups", "{message} (groups: {groups})"),
    ("description.deprecated", "Deprecated."),
    ("description.default_value", "Default value: {value}"),
    ("description.allowed_values", "Must be one of [{values}]"),
    ("description.only_for_types", "Only for types: {types}"),
    ("optional.groups", "{optional} (groups: {groups})"),
    ("table.no_fields", "No fields."),
];

static DEFAULT_TRANSLATIONS: Lazy<TranslationResolver> = Lazy::new(TranslationResolver::new);

/// The built-in translations, assembled once per process
pub fn default_translations() -> &'static TranslationResolver {
    &DEFAULT_TRANSLATIONS
}

/// Looks up message templates and fills in their placeholders
#[derive(Debug, Clone)]
pub struct TranslationResolver {
    messages: HashMap<String, String>,
}

impl Default for TranslationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationResolver {
    /// The built-in English templates
    pub fn new() -> Self {
        Self {
            messages: DEFAULT_MESSAGES
                .iter()
                .map(|(key, template)| (key.to_string(), template.to_string()))
                .collect(),
        }
    }

    /// Replace templates by key; unknown keys are added
    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        debug!("Applying {} translation overrides", overrides.len());
        self.messages.extend(overrides);
        self
    }

    /// Built-in templates overridden by a YAML or JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let overrides: HashMap<String, String> = serde_yaml::from_str(&content)?;
        Ok(Self::new().with_overrides(overrides))
    }

    pub fn has(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    /// The template for `key` with `{name}` placeholders replaced.
    ///
    /// An unknown key is returned as is.
    pub fn translate(&self, key: &str, args: &[(&str, &str)]) -> String {
        let Some(template) = self.messages.get(key) else {
            warn!("No translation for key {}", key);
            return key.to_string();
        };

        args.iter().fold(template.clone(), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
    }
}
