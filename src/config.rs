//! Generator configuration.
//!
//! Read from `restdocs.yaml` in the project directory, or from an explicit YAML or JSON
//! file. Command-line flags override what the file sets.

use crate::error::Result;
use crate::shape::JsonType;
use crate::translation::TranslationResolver;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the project directory
pub const DEFAULT_CONFIG_FILE: &str = "restdocs.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory holding doc sidecars; comments are read from the sources when unset
    pub sidecar_dir: Option<PathBuf>,
    /// YAML or JSON file overriding message templates
    pub translations: Option<PathBuf>,
    /// Type name (simple or qualified) -> JSON kind its serializer writes
    pub custom_serializers: HashMap<String, JsonType>,
    /// Fail when a documented field has no description
    pub strict: bool,
}

impl GeneratorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config.relative_to(path.parent().unwrap_or(Path::new(""))))
    }

    /// Load `explicit` if given, else `<project_dir>/restdocs.yaml` if present, else defaults
    pub fn load(explicit: Option<&Path>, project_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = project_dir.join(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            info!("Using configuration {}", default_path.display());
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Message templates with this configuration's overrides applied
    pub fn translation_resolver(&self) -> Result<TranslationResolver> {
        match &self.translations {
            Some(path) => TranslationResolver::from_file(path),
            None => Ok(TranslationResolver::new()),
        }
    }

    /// Resolve relative paths against the directory of the configuration file
    fn relative_to(mut self, base: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        self.sidecar_dir = self.sidecar_dir.map(resolve);
        self.translations = self.translations.map(resolve);
        self
    }
}
