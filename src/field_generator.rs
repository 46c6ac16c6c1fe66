//! Field documentation generator.
//!
//! Walks the serialized shape of a root type depth first and produces one [`FieldRecord`]
//! per documented path, in declaration order:
//!
//! - scalar properties produce a single record,
//! - arrays append `[]` to the path and continue with the element type,
//! - objects produce a record per property followed directly by that property's children,
//! - polymorphic enums merge the properties of all variants under one path.
//!
//! Recursion stops at types that are already being expanded further up the current chain,
//! so self-referential and mutually recursive types are documented once.

use crate::comment_resolver::CommentResolver;
use crate::constraint::ConstraintResolver;
use crate::error::Result;
use crate::field_descriptor::{describe, FieldText};
use crate::shape::{
    any_value, serializer_shape, ExpansionChain, JsonType, ObjectShape, PolymorphicShape,
    Property, Shape, ShapeResolver, Tagging, VariantPayload, VariantShape,
};
use crate::type_ref::TypeRef;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One documented field of a root type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    /// Dotted path, with `[]` marking array elements: `second.third[].fourth`
    pub path: String,
    pub json_type: JsonType,
    /// Normalised type name: `Integer`, `Decimal`, `String`, `Boolean`, `Object`, `Array`
    pub type_name: String,
    pub optional: bool,
    /// Validation groups in which the field is required although optional otherwise
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_in_groups: Vec<String>,
    pub description: String,
}

/// A record whose description parts are not assembled yet
#[derive(Debug, Clone)]
struct Entry {
    path: String,
    json_type: JsonType,
    type_name: String,
    optional: bool,
    required_in_groups: Vec<String>,
    text: FieldText,
}

/// Generates field records for root types
pub struct FieldDocumentationGenerator<'a> {
    shapes: &'a dyn ShapeResolver,
    comments: &'a dyn CommentResolver,
    constraints: ConstraintResolver<'a>,
}

impl<'a> FieldDocumentationGenerator<'a> {
    pub fn new(
        shapes: &'a dyn ShapeResolver,
        comments: &'a dyn CommentResolver,
        constraints: ConstraintResolver<'a>,
    ) -> Self {
        Self {
            shapes,
            comments,
            constraints,
        }
    }

    pub fn comments(&self) -> &'a dyn CommentResolver {
        self.comments
    }

    pub fn constraints(&self) -> &ConstraintResolver<'a> {
        &self.constraints
    }

    /// Document every field of `root`.
    ///
    /// A scalar root has no fields. Fails with `Error::FieldProcessing` when the shape of
    /// any visited type cannot be resolved.
    pub fn generate_documentation(&self, root: &TypeRef) -> Result<Vec<FieldRecord>> {
        debug!("Generating field documentation for {}", root);

        let mut ancestors = ExpansionChain::new();
        let shape = self.resolve(root, "")?;
        let mut entries = self.children(&shape, "", &mut ancestors)?;

        let mut seen = HashSet::new();
        entries.retain(|entry| {
            let first = seen.insert(entry.path.clone());
            if !first {
                warn!("Path {} of {} is documented twice, keeping the first", entry.path, root);
            }
            first
        });

        debug!("Documented {} fields of {}", entries.len(), root);
        let translations = self.constraints.translations();
        Ok(entries
            .into_iter()
            .map(|entry| FieldRecord {
                description: describe(&entry.text, translations),
                path: entry.path,
                json_type: entry.json_type,
                type_name: entry.type_name,
                optional: entry.optional,
                required_in_groups: entry.required_in_groups,
            })
            .collect())
    }

    /// Resolve the shape of a single type, e.g. for a path parameter
    pub fn resolve_shape(&self, ty: &TypeRef) -> Result<Shape> {
        self.resolve(ty, "")
    }

    fn resolve(&self, ty: &TypeRef, path: &str) -> Result<Shape> {
        self.shapes.resolve(ty).map_err(|e| e.at_path(path))
    }

    /// Entries below a value of the given shape located at `path`
    fn children(
        &self,
        shape: &Shape,
        path: &str,
        ancestors: &mut ExpansionChain,
    ) -> Result<Vec<Entry>> {
        match shape {
            Shape::Scalar(_) => Ok(Vec::new()),
            Shape::Array(element) => {
                let element_path = format!("{}[]", path);
                let element_shape = self.resolve(element, &element_path)?;
                self.children(&element_shape, &element_path, ancestors)
            }
            Shape::Object(object) => self.object_children(object, path, ancestors),
            Shape::Polymorphic(poly) => {
                if !ancestors.enter(&poly.declaring, &poly.generic_args) {
                    debug!("{} is already being expanded at {}", poly.type_id, path);
                    return Ok(Vec::new());
                }
                let result = self.variant_children(poly, path, ancestors);
                ancestors.leave();
                result
            }
        }
    }

    fn object_children(
        &self,
        object: &ObjectShape,
        path: &str,
        ancestors: &mut ExpansionChain,
    ) -> Result<Vec<Entry>> {
        if !ancestors.enter(&object.declaring, &object.generic_args) {
            debug!("{} is already being expanded at {}", object.type_id, path);
            return Ok(Vec::new());
        }
        let result = self.properties(&object.properties, path, ancestors);
        ancestors.leave();
        result
    }

    fn properties(
        &self,
        properties: &[Property],
        parent: &str,
        ancestors: &mut ExpansionChain,
    ) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();

        for property in properties {
            if property.flatten {
                let shape = self.property_shape(property, parent)?;
                match &shape {
                    Shape::Object(_) | Shape::Polymorphic(_) => {
                        entries.extend(self.children(&shape, parent, ancestors)?);
                    }
                    _ => debug!("Flattened {} has no fixed properties", property.ty),
                }
                continue;
            }

            let path = field_path(parent, &property.name);
            let shape = self.property_shape(property, &path)?;
            entries.push(self.property_entry(property, &shape, &path));

            if property.not_expanded {
                debug!("Not expanding {}", path);
                continue;
            }
            entries.extend(self.children(&shape, &path, ancestors)?);
        }

        Ok(entries)
    }

    /// A `serialize_with` function decides the shape over the property's type
    fn property_shape(&self, property: &Property, path: &str) -> Result<Shape> {
        match property.serialize_with {
            Some(serializer) => {
                serializer_shape(&property.ty, serializer).map_err(|e| e.at_path(path))
            }
            None => self.resolve(&property.ty, path),
        }
    }

    fn property_entry(&self, property: &Property, shape: &Shape, path: &str) -> Entry {
        let declaring = property.declaring.as_str();
        let field = property.field_name.as_str();

        let comment = [
            self.comments.resolve_field_comment(declaring, field),
            self.comments.resolve_method_comment(declaring, field),
            self.comments
                .resolve_method_comment(declaring, &format!("get_{}", field)),
        ]
        .into_iter()
        .find(|comment| !comment.is_empty())
        .unwrap_or_default();

        let default_value = self.comments.resolve_field_tag(declaring, field, "default");
        let constraints = self.constraints.field_constraints(declaring, field);

        let mut messages = constraints.messages;
        messages.extend(self.allowed_values_message(shape));

        let (json_type, type_name) = shape.kind();
        Entry {
            path: path.to_string(),
            json_type,
            type_name,
            optional: property.structurally_optional && !constraints.mandatory,
            required_in_groups: constraints.required_in_groups,
            text: FieldText {
                deprecation: property.deprecated.clone(),
                comment,
                constraints: messages,
                default_value: Some(default_value).filter(|v| !v.is_empty()),
                only_for_types: Vec::new(),
            },
        }
    }

    fn allowed_values_message(&self, shape: &Shape) -> Option<String> {
        match shape {
            Shape::Scalar(scalar) if !scalar.allowed_values.is_empty() => {
                Some(self.one_of(&scalar.allowed_values))
            }
            _ => None,
        }
    }

    fn one_of(&self, values: &[String]) -> String {
        let values = values.join(", ");
        self.constraints
            .translations()
            .translate("description.allowed_values", &[("values", values.as_str())])
    }

    fn variant_children(
        &self,
        poly: &PolymorphicShape,
        path: &str,
        ancestors: &mut ExpansionChain,
    ) -> Result<Vec<Entry>> {
        let names: Vec<String> = poly.variants.iter().map(|v| v.name.clone()).collect();

        match &poly.tagging {
            Tagging::External => {
                let mut entries = Vec::new();
                for variant in &poly.variants {
                    let variant_path = field_path(path, &variant.name);
                    let shape = match &variant.payload {
                        VariantPayload::Unit => continue,
                        VariantPayload::Struct(object) => Shape::Object(object.clone()),
                        VariantPayload::Newtype(ty) => self.resolve(ty, &variant_path)?,
                        VariantPayload::Tuple(_) => Shape::Array(any_value()),
                    };

                    let (json_type, type_name) = shape.kind();
                    entries.push(Entry {
                        path: variant_path.clone(),
                        json_type,
                        type_name,
                        optional: true,
                        required_in_groups: Vec::new(),
                        text: FieldText {
                            comment: self
                                .comments
                                .resolve_field_comment(&poly.declaring, &variant.ident),
                            ..FieldText::default()
                        },
                    });
                    entries.extend(self.children(&shape, &variant_path, ancestors)?);
                }
                Ok(entries)
            }
            Tagging::Internal { tag } => {
                let mut entries = vec![self.discriminator(path, tag, &names)];
                let members = self.variant_members(poly, path, ancestors)?;
                entries.extend(merge_variants(members, &names));
                Ok(entries)
            }
            Tagging::Adjacent { tag, content } => {
                let content_path = field_path(path, content);
                let has_unit = poly
                    .variants
                    .iter()
                    .any(|v| v.payload == VariantPayload::Unit);
                let structs_only = poly
                    .variants
                    .iter()
                    .all(|v| matches!(v.payload, VariantPayload::Unit | VariantPayload::Struct(_)));
                let content_type = if structs_only {
                    JsonType::Object
                } else {
                    JsonType::Any
                };

                let mut entries = vec![
                    self.discriminator(path, tag, &names),
                    Entry {
                        path: content_path.clone(),
                        json_type: content_type,
                        type_name: content_type.default_type_name().to_string(),
                        optional: has_unit,
                        required_in_groups: Vec::new(),
                        text: FieldText::default(),
                    },
                ];
                let members = self.variant_members(poly, &content_path, ancestors)?;
                entries.extend(merge_variants(members, &names));
                Ok(entries)
            }
            Tagging::Untagged => {
                let members = self.variant_members(poly, path, ancestors)?;
                Ok(merge_variants(members, &names))
            }
        }
    }

    fn discriminator(&self, path: &str, tag: &str, names: &[String]) -> Entry {
        Entry {
            path: field_path(path, tag),
            json_type: JsonType::String,
            type_name: "String".to_string(),
            optional: false,
            required_in_groups: Vec::new(),
            text: FieldText {
                constraints: vec![self.one_of(names)],
                ..FieldText::default()
            },
        }
    }

    /// Entries contributed by each variant, all located at `path`
    fn variant_members(
        &self,
        poly: &PolymorphicShape,
        path: &str,
        ancestors: &mut ExpansionChain,
    ) -> Result<Vec<(String, Vec<Entry>)>> {
        poly.variants
            .iter()
            .map(|variant| {
                let entries = self.variant_entries(variant, path, ancestors)?;
                Ok((variant.name.clone(), entries))
            })
            .collect()
    }

    fn variant_entries(
        &self,
        variant: &VariantShape,
        path: &str,
        ancestors: &mut ExpansionChain,
    ) -> Result<Vec<Entry>> {
        match &variant.payload {
            VariantPayload::Unit => Ok(Vec::new()),
            VariantPayload::Struct(object) => self.object_children(object, path, ancestors),
            VariantPayload::Newtype(ty) => {
                let shape = self.resolve(ty, path)?;
                match &shape {
                    Shape::Object(_) | Shape::Polymorphic(_) => {
                        self.children(&shape, path, ancestors)
                    }
                    _ => {
                        debug!("Variant {} carries {} without properties", variant.name, ty);
                        Ok(Vec::new())
                    }
                }
            }
            VariantPayload::Tuple(_) => {
                debug!("Tuple variant {} has no named properties", variant.name);
                Ok(Vec::new())
            }
        }
    }
}

/// `parent.name`, or `name` at the root
fn field_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn is_descendant(path: &str, parent: &str) -> bool {
    path.len() > parent.len()
        && path.starts_with(parent)
        && matches!(path.as_bytes()[parent.len()], b'.' | b'[')
}

/// Merge the entries of several variants into one list.
///
/// A path declared by several variants is kept once, at the position of its first
/// occurrence. A new path goes to the end of the subtree of its nearest merged ancestor, or
/// to the end of the list, so children stay directly below their parent. Paths not declared
/// by every variant get the names of the variants declaring them.
fn merge_variants(members: Vec<(String, Vec<Entry>)>, all_variants: &[String]) -> Vec<Entry> {
    let mut merged: Vec<(Entry, Vec<String>)> = Vec::new();

    for (variant, entries) in members {
        for entry in entries {
            if let Some(index) = merged.iter().position(|(e, _)| e.path == entry.path) {
                let (existing, owners) = &mut merged[index];
                if existing.type_name != entry.type_name || existing.json_type != entry.json_type {
                    warn!(
                        "Variants {} and {} declare {} with different types, documenting it as {}",
                        owners.join(", "),
                        variant,
                        entry.path,
                        existing.type_name
                    );
                }
                existing.optional |= entry.optional;
                owners.push(variant.clone());
                continue;
            }

            let position = merged
                .iter()
                .enumerate()
                .filter(|(_, (e, _))| is_descendant(&entry.path, &e.path))
                .max_by_key(|(_, (e, _))| e.path.len())
                .map(|(index, _)| subtree_end(&merged, index))
                .unwrap_or(merged.len());
            merged.insert(position, (entry, vec![variant.clone()]));
        }
    }

    merged
        .into_iter()
        .map(|(mut entry, owners)| {
            if owners.len() < all_variants.len() && entry.text.only_for_types.is_empty() {
                entry.text.only_for_types = owners;
            }
            entry
        })
        .collect()
}

fn subtree_end(merged: &[(Entry, Vec<String>)], index: usize) -> usize {
    let parent = &merged[index].0.path;
    let mut end = index + 1;
    while end < merged.len() && is_descendant(&merged[end].0.path, parent) {
        end += 1;
    }
    end
}
