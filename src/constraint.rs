//! Validation constraints of fields and handler parameters.
//!
//! Constraints are read from `#[validate(...)]` attributes using the rule names of the
//! `validator` crate. Two keys are understood inside any rule besides the rule's own
//! arguments: `message = "..."` replaces the generated text and `group = "Create, Update"`
//! limits the rule to validation groups.

use crate::attributes::{attribute_args, MetaArg};
use crate::translation::TranslationResolver;
use crate::type_resolver::{pattern_names, TypeResolver};
use log::debug;
use std::collections::BTreeMap;

/// One validation rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDescriptor {
    /// Rule name, e.g. `length` or `email`
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// Explicit message replacing the translated template
    pub message: Option<String>,
    /// Validation groups the rule is limited to, empty for all groups
    pub groups: Vec<String>,
}

impl ConstraintDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: BTreeMap::new(),
            message: None,
            groups: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_groups(mut self, groups: &[&str]) -> Self {
        self.groups = groups.iter().map(ToString::to_string).collect();
        self
    }

    /// Build a descriptor from one argument of `#[validate(...)]`
    pub fn from_meta(arg: &MetaArg) -> Self {
        let mut descriptor = Self::new(arg.name());

        match arg {
            MetaArg::Flag(_) => {}
            MetaArg::Value(name, value) => {
                descriptor
                    .attributes
                    .insert(primary_attribute(name).to_string(), value.clone());
            }
            MetaArg::List(_, children) => {
                for child in children {
                    match (child.name(), child) {
                        ("message", MetaArg::Value(_, message)) => {
                            descriptor.message = Some(message.clone());
                        }
                        ("group" | "groups", MetaArg::Value(_, groups)) => {
                            descriptor.groups = groups
                                .split(',')
                                .map(str::trim)
                                .filter(|g| !g.is_empty())
                                .map(ToString::to_string)
                                .collect();
                        }
                        (key, MetaArg::Value(_, value)) => {
                            descriptor.attributes.insert(key.to_string(), value.clone());
                        }
                        (key, _) => {
                            descriptor.attributes.insert(key.to_string(), String::new());
                        }
                    }
                }
            }
        }

        descriptor
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.attribute(key).and_then(|v| v.trim().parse().ok())
    }
}

/// Attribute name a rule's single value is stored under, as in `contains = "x"`
fn primary_attribute(rule: &str) -> &'static str {
    match rule {
        "contains" | "does_not_contain" => "pattern",
        "regex" => "path",
        "must_match" => "other",
        "custom" => "function",
        _ => "value",
    }
}

/// Source of constraint descriptors
pub trait ConstraintReader {
    fn field_constraints(&self, declaring: &str, field: &str) -> Vec<ConstraintDescriptor>;

    fn parameter_constraints(
        &self,
        declaring: &str,
        function: &str,
        parameter: &str,
    ) -> Vec<ConstraintDescriptor>;
}

/// Reads `#[validate(...)]` attributes from the parsed project
pub struct ValidatorConstraintReader<'a> {
    types: &'a TypeResolver,
}

impl<'a> ValidatorConstraintReader<'a> {
    pub fn new(types: &'a TypeResolver) -> Self {
        Self { types }
    }
}

impl ConstraintReader for ValidatorConstraintReader<'_> {
    fn field_constraints(&self, declaring: &str, field: &str) -> Vec<ConstraintDescriptor> {
        self.types
            .find_field(declaring, field)
            .map(|f| f.validate.iter().map(ConstraintDescriptor::from_meta).collect())
            .unwrap_or_default()
    }

    fn parameter_constraints(
        &self,
        declaring: &str,
        function: &str,
        parameter: &str,
    ) -> Vec<ConstraintDescriptor> {
        let Some(function_def) = self
            .types
            .find_function(&format!("{}::{}", declaring, function))
        else {
            debug!("No function {}::{} for parameter constraints", declaring, function);
            return Vec::new();
        };

        function_def
            .signature
            .inputs
            .iter()
            .filter_map(|input| match input {
                syn::FnArg::Typed(pat_type) => Some(pat_type),
                syn::FnArg::Receiver(_) => None,
            })
            .find(|pat_type| pattern_names(&pat_type.pat).iter().any(|n| n == parameter))
            .map(|pat_type| {
                attribute_args(&pat_type.attrs, "validate")
                    .iter()
                    .map(ConstraintDescriptor::from_meta)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Constraints of one field or parameter, ready for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConstraints {
    pub messages: Vec<String>,
    /// A mandatory rule applies in every group
    pub mandatory: bool,
    /// Groups of mandatory rules limited to groups
    pub required_in_groups: Vec<String>,
}

/// Turns constraint descriptors into translated messages and requiredness
pub struct ConstraintResolver<'a> {
    reader: &'a dyn ConstraintReader,
    translations: &'a TranslationResolver,
}

impl<'a> ConstraintResolver<'a> {
    pub fn new(reader: &'a dyn ConstraintReader, translations: &'a TranslationResolver) -> Self {
        Self {
            reader,
            translations,
        }
    }

    pub fn translations(&self) -> &'a TranslationResolver {
        self.translations
    }

    /// Whether a rule makes its value mandatory: `required`, `required_nested`, `length`
    /// with `min >= 1`, or a custom `not_blank` check
    pub fn is_mandatory(descriptor: &ConstraintDescriptor) -> bool {
        match descriptor.name.as_str() {
            "required" | "required_nested" => true,
            "length" => descriptor
                .number("min")
                .or_else(|| descriptor.number("equal"))
                .map(|min| min >= 1.0)
                .unwrap_or(false),
            "custom" => is_not_blank(descriptor),
            _ => false,
        }
    }

    pub fn constraint_messages(&self, declaring: &str, field: &str) -> Vec<String> {
        self.field_constraints(declaring, field).messages
    }

    pub fn parameter_messages(&self, declaring: &str, function: &str, parameter: &str) -> Vec<String> {
        self.parameter_constraints(declaring, function, parameter)
            .messages
    }

    pub fn field_constraints(&self, declaring: &str, field: &str) -> ResolvedConstraints {
        self.resolve(&self.reader.field_constraints(declaring, field))
    }

    pub fn parameter_constraints(
        &self,
        declaring: &str,
        function: &str,
        parameter: &str,
    ) -> ResolvedConstraints {
        self.resolve(
            &self
                .reader
                .parameter_constraints(declaring, function, parameter),
        )
    }

    fn resolve(&self, descriptors: &[ConstraintDescriptor]) -> ResolvedConstraints {
        let mut resolved = ResolvedConstraints::default();

        for descriptor in descriptors {
            if Self::is_mandatory(descriptor) {
                if descriptor.groups.is_empty() {
                    resolved.mandatory = true;
                } else {
                    for group in &descriptor.groups {
                        if !resolved.required_in_groups.contains(group) {
                            resolved.required_in_groups.push(group.clone());
                        }
                    }
                }
            }

            if let Some(message) = self.message(descriptor) {
                resolved.messages.push(message);
            }
        }

        resolved
    }

    /// Display text of a rule.
    ///
    /// Rules that only demand presence are shown through the optional column instead and
    /// have no message unless one is given explicitly.
    pub fn message(&self, descriptor: &ConstraintDescriptor) -> Option<String> {
        let text = match &descriptor.message {
            Some(message) => message.clone(),
            None => self.template_message(descriptor)?,
        };

        if descriptor.groups.is_empty() {
            Some(text)
        } else {
            let groups = descriptor.groups.join(", ");
            Some(self.translations.translate(
                "constraint.groups",
                &[("message", text.as_str()), ("groups", groups.as_str())],
            ))
        }
    }

    fn template_message(&self, descriptor: &ConstraintDescriptor) -> Option<String> {
        let t = |key: &str, args: &[(&str, &str)]| Some(self.translations.translate(key, args));
        let attr = |key: &str| descriptor.attribute(key).unwrap_or_default();

        match descriptor.name.as_str() {
            "required" | "required_nested" | "nested" => None,
            "length" => {
                let has = |key: &str| descriptor.attribute(key).is_some();
                if has("equal") {
                    t("length.equal", &[("equal", attr("equal"))])
                } else if has("min") && has("max") {
                    if attr("min") == attr("max") {
                        t("length.equal", &[("equal", attr("min"))])
                    } else {
                        t("length.min_max", &[("min", attr("min")), ("max", attr("max"))])
                    }
                } else if has("min") {
                    if descriptor.number("min") == Some(1.0) {
                        None
                    } else {
                        t("length.min", &[("min", attr("min"))])
                    }
                } else if has("max") {
                    t("length.max", &[("max", attr("max"))])
                } else {
                    None
                }
            }
            "range" => {
                let has = |key: &str| descriptor.attribute(key).is_some();
                if has("min") && has("max") {
                    t("range.min_max", &[("min", attr("min")), ("max", attr("max"))])
                } else if has("min") {
                    t("range.min", &[("min", attr("min"))])
                } else if has("max") {
                    t("range.max", &[("max", attr("max"))])
                } else if has("exclusive_min") {
                    t("range.exclusive_min", &[("exclusive_min", attr("exclusive_min"))])
                } else if has("exclusive_max") {
                    t("range.exclusive_max", &[("exclusive_max", attr("exclusive_max"))])
                } else {
                    None
                }
            }
            "ip" => {
                if descriptor.attribute("v4").is_some() {
                    t("ip.v4", &[])
                } else if descriptor.attribute("v6").is_some() {
                    t("ip.v6", &[])
                } else {
                    t("ip", &[])
                }
            }
            "custom" if is_not_blank(descriptor) => None,
            "custom" => t("custom", &[("function", attr("function"))]),
            "contains" | "does_not_contain" => {
                t(descriptor.name.as_str(), &[("pattern", attr("pattern"))])
            }
            "regex" => t("regex", &[("path", attr("path"))]),
            "must_match" => t("must_match", &[("other", attr("other"))]),
            name if self.translations.has(name) => t(name, &[]),
            name => {
                debug!("No message template for constraint {}", name);
                None
            }
        }
    }
}

fn is_not_blank(descriptor: &ConstraintDescriptor) -> bool {
    descriptor.name == "custom"
        && descriptor
            .attribute("function")
            .map(|function| function.trim().ends_with("not_blank"))
            .unwrap_or(false)
}
