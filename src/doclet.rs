//! Doc comment extraction.
//!
//! Reads `///` and `//!` comments from the parsed sources and produces one [`ClassDoc`] per
//! struct, enum, struct-like enum variant and module. Within a comment:
//!
//! - text before the first `#` heading is the comment itself,
//! - lines of the form `@tag value` become tags (`@default 10`, `@title Get an item`),
//! - bullets under `# Arguments` written as ``* `name` - text`` document method parameters.

use crate::attributes::doc_lines;
use crate::comment_resolver::{
    sidecar_path, ClassDoc, DocIndex, FieldDetail, FieldDoc, MethodDoc, TagValues,
};
use crate::serializer::{serialize_json, write_to_file};
use crate::type_ref::TypeRef;
use crate::type_resolver::{join_path, module_owner, walk_items, TypeResolver};
use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;

/// A parsed doc comment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocComment {
    pub comment: String,
    pub tags: BTreeMap<String, TagValues>,
    /// Parameter comments from the `# Arguments` section
    pub arguments: BTreeMap<String, String>,
}

impl DocComment {
    pub fn is_empty(&self) -> bool {
        self.comment.is_empty() && self.tags.is_empty() && self.arguments.is_empty()
    }

    fn into_field_doc(self) -> Option<FieldDoc> {
        if self.comment.is_empty() && self.tags.is_empty() {
            return None;
        }
        Some(FieldDoc::Detailed(FieldDetail {
            comment: self.comment,
            tags: self.tags,
        }))
    }

    fn into_method_doc(self) -> MethodDoc {
        MethodDoc {
            comment: self.comment,
            parameters: self.arguments,
            tags: self.tags,
        }
    }
}

#[derive(PartialEq)]
enum Section {
    Comment,
    Arguments,
    Other,
}

/// Split doc lines into comment text, tags and argument comments
pub fn parse_doc(lines: &[String]) -> DocComment {
    let mut doc = DocComment::default();
    let mut comment_lines: Vec<&str> = Vec::new();
    let mut section = Section::Comment;
    let mut in_code_block = false;
    let mut last_argument: Option<String> = None;

    for line in lines {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
        }
        if in_code_block || trimmed.starts_with("```") {
            if section == Section::Comment {
                comment_lines.push(line);
            }
            continue;
        }

        if let Some(heading) = trimmed.strip_prefix('#') {
            let heading = heading.trim_start_matches('#').trim();
            section = if heading == "Arguments" {
                Section::Arguments
            } else {
                Section::Other
            };
            last_argument = None;
            continue;
        }

        if let Some(tag) = trimmed.strip_prefix('@') {
            let (name, value) = tag.split_once(char::is_whitespace).unwrap_or((tag, ""));
            let value = value.trim().to_string();
            match doc.tags.get_mut(name) {
                Some(existing) => existing.push(value),
                None => {
                    doc.tags.insert(name.to_string(), TagValues::One(value));
                }
            }
            continue;
        }

        match section {
            Section::Comment => comment_lines.push(line),
            Section::Arguments => {
                if let Some((name, text)) = parse_argument(trimmed) {
                    doc.arguments.insert(name.clone(), text);
                    last_argument = Some(name);
                } else if let Some(name) = &last_argument {
                    if !trimmed.is_empty() {
                        if let Some(text) = doc.arguments.get_mut(name) {
                            text.push(' ');
                            text.push_str(trimmed);
                        }
                    }
                }
            }
            Section::Other => {}
        }
    }

    doc.comment = comment_lines.join("\n").trim().to_string();
    doc
}

/// ``* `name` - text`` or ``- `name`: text``
fn parse_argument(line: &str) -> Option<(String, String)> {
    let rest = line
        .strip_prefix("* ")
        .or_else(|| line.strip_prefix("- "))?
        .trim_start();
    let rest = rest.strip_prefix('`')?;
    let (name, text) = rest.split_once('`')?;
    let text = text
        .trim_start()
        .trim_start_matches(['-', ':'])
        .trim()
        .to_string();
    Some((name.to_string(), text))
}

/// Extracts doc comments from every parsed file of a project
pub struct Doclet<'a> {
    types: &'a TypeResolver,
}

impl<'a> Doclet<'a> {
    pub fn new(types: &'a TypeResolver) -> Self {
        Self { types }
    }

    /// Collect the comments of all items
    pub fn extract(&self) -> DocIndex {
        let mut classes: BTreeMap<String, ClassDoc> = BTreeMap::new();

        for parsed_file in self.types.parsed_files() {
            let module_doc = parse_doc(&doc_lines(&parsed_file.syntax_tree.attrs));
            if !module_doc.comment.is_empty() {
                let entry = classes
                    .entry(module_owner(&parsed_file.module_path))
                    .or_default();
                entry.comment = module_doc.comment;
                entry.tags.extend(module_doc.tags);
            }

            walk_items(
                &parsed_file.module_path,
                &parsed_file.syntax_tree.items,
                &mut |module_path, item| self.extract_item(module_path, item, &mut classes),
            );
        }

        let mut index = DocIndex::new();
        for (name, doc) in classes {
            if doc != ClassDoc::default() {
                index.insert(&name, doc);
            }
        }

        debug!("Extracted documentation of {} items", index.len());
        index
    }

    fn extract_item(
        &self,
        module_path: &str,
        item: &syn::Item,
        classes: &mut BTreeMap<String, ClassDoc>,
    ) {
        match item {
            syn::Item::Struct(item_struct) => {
                let class = join_path(module_path, &item_struct.ident.to_string());
                let doc = classes.entry(class).or_default();
                apply_item_doc(doc, &item_struct.attrs);
                add_field_docs(doc, &item_struct.fields);
            }
            syn::Item::Enum(item_enum) => {
                let class = join_path(module_path, &item_enum.ident.to_string());
                let doc = classes.entry(class.clone()).or_default();
                apply_item_doc(doc, &item_enum.attrs);

                let mut variant_classes = Vec::new();
                for variant in &item_enum.variants {
                    let variant_doc = parse_doc(&doc_lines(&variant.attrs));
                    if let Some(field_doc) = variant_doc.clone().into_field_doc() {
                        doc.fields.insert(variant.ident.to_string(), field_doc);
                    }

                    if matches!(variant.fields, syn::Fields::Named(_)) {
                        let variant_class = format!("{}::{}", class, variant.ident);
                        let mut variant_entry = ClassDoc {
                            comment: variant_doc.comment,
                            tags: variant_doc.tags,
                            ..ClassDoc::default()
                        };
                        add_field_docs(&mut variant_entry, &variant.fields);
                        variant_classes.push((variant_class, variant_entry));
                    }
                }
                classes.extend(variant_classes);
            }
            syn::Item::Impl(item_impl) => {
                let self_ty = TypeRef::from_syn(&item_impl.self_ty);
                let owner = self
                    .types
                    .lookup(&self_ty)
                    .map(|def| def.qualified_name.clone())
                    .unwrap_or_else(|| join_path(module_path, self_ty.name()));

                for impl_item in &item_impl.items {
                    if let syn::ImplItem::Fn(method) = impl_item {
                        let method_doc = parse_doc(&doc_lines(&method.attrs));
                        if !method_doc.is_empty() {
                            classes
                                .entry(owner.clone())
                                .or_default()
                                .methods
                                .insert(method.sig.ident.to_string(), method_doc.into_method_doc());
                        }
                    }
                }
            }
            syn::Item::Fn(item_fn) => {
                let fn_doc = parse_doc(&doc_lines(&item_fn.attrs));
                if !fn_doc.is_empty() {
                    classes
                        .entry(module_owner(module_path))
                        .or_default()
                        .methods
                        .insert(item_fn.sig.ident.to_string(), fn_doc.into_method_doc());
                }
            }
            syn::Item::Mod(item_mod) => {
                let mod_doc = parse_doc(&doc_lines(&item_mod.attrs));
                if !mod_doc.comment.is_empty() {
                    let class = join_path(module_path, &item_mod.ident.to_string());
                    classes.entry(class).or_default().comment = mod_doc.comment;
                }
            }
            _ => {}
        }
    }
}

fn apply_item_doc(doc: &mut ClassDoc, attrs: &[syn::Attribute]) {
    let item_doc = parse_doc(&doc_lines(attrs));
    doc.comment = item_doc.comment;
    doc.tags.extend(item_doc.tags);
}

fn add_field_docs(doc: &mut ClassDoc, fields: &syn::Fields) {
    if let syn::Fields::Named(named) = fields {
        for field in &named.named {
            let Some(ident) = &field.ident else { continue };
            if let Some(field_doc) = parse_doc(&doc_lines(&field.attrs)).into_field_doc() {
                doc.fields.insert(ident.to_string(), field_doc);
            }
        }
    }
}

/// Write one sidecar JSON file per item below `dir`, returning the number of files written
pub fn write_sidecars(index: &DocIndex, dir: &Path) -> Result<usize> {
    let mut written = 0;
    for (class, doc) in index.iter() {
        let path = dir.join(sidecar_path(class));
        write_to_file(&serialize_json(doc)?, &path)?;
        written += 1;
    }

    info!("Wrote {} doc sidecars to {}", written, dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment_resolver::{CommentResolver, SidecarCommentResolver};
    use crate::parser::ParsedFile;
    use tempfile::TempDir;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(ToString::to_string).collect()
    }

    fn extract(module: &str, code: &str) -> DocIndex {
        let parsed = ParsedFile::from_source(module, code).unwrap();
        let types = TypeResolver::new(vec![parsed]);
        Doclet::new(&types).extract()
    }

    #[test]
    fn test_parse_doc_sections_and_tags() {
        let doc = parse_doc(&lines(
            "Get an item.\n\nLooks it up by id.\n@title Get item\n\n# Arguments\n\n* `id` - The item id\n  in the catalog.\n* `verbose`: Include details\n\n# Errors\n\nFails when missing.",
        ));

        assert_eq!(doc.comment, "Get an item.\n\nLooks it up by id.");
        assert_eq!(doc.tags.get("title"), Some(&TagValues::One("Get item".to_string())));
        assert_eq!(doc.arguments["id"], "The item id in the catalog.");
        assert_eq!(doc.arguments["verbose"], "Include details");
        assert_eq!(doc.arguments.len(), 2);
    }

    #[test]
    fn test_parse_doc_repeated_tags_and_code_blocks() {
        let doc = parse_doc(&lines(
            "Example:\n```\n# not a heading\n@not_a_tag\n```\n@see a\n@see b\n@not_expanded",
        ));

        assert!(doc.comment.contains("# not a heading"));
        assert_eq!(
            doc.tags.get("see"),
            Some(&TagValues::Many(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(
            doc.tags.get("not_expanded"),
            Some(&TagValues::One(String::new()))
        );
    }

    #[test]
    fn test_extract_struct_fields_and_methods() {
        let index = extract(
            "models",
            r#"
            /// An item in the catalog.
            pub struct Item {
                /// Display name.
                /// @default unnamed
                pub name: String,
                pub undocumented: u32,
            }

            impl Item {
                /// The stock level.
                pub fn stock(&self) -> u32 { 0 }
                pub fn plain(&self) {}
            }
            "#,
        );

        assert_eq!(index.resolve_class_comment("models::Item"), "An item in the catalog.");
        assert_eq!(index.resolve_field_comment("models::Item", "name"), "Display name.");
        assert_eq!(index.resolve_field_tag("models::Item", "name", "default"), "unnamed");
        assert_eq!(index.resolve_field_comment("models::Item", "undocumented"), "");
        assert_eq!(index.resolve_method_comment("models::Item", "stock"), "The stock level.");
        assert!(index.get("models::Item").unwrap().methods.get("plain").is_none());
    }

    #[test]
    fn test_extract_enum_variants_functions_and_modules() {
        let index = extract(
            "api",
            r#"
            //! Catalog endpoints.

            /// A shape.
            pub enum Shape {
                /// A round shape.
                Circle {
                    /// The radius.
                    radius: f64,
                },
                /// No shape at all.
                Empty,
            }

            /// Get an item.
            ///
            /// # Arguments
            ///
            /// * `id` - The item id
            pub async fn get_item(id: u32) {}
            "#,
        );

        assert_eq!(index.resolve_class_comment("api"), "Catalog endpoints.");
        assert_eq!(index.resolve_field_comment("api::Shape", "Empty"), "No shape at all.");
        assert_eq!(index.resolve_class_comment("api::Shape::Circle"), "A round shape.");
        assert_eq!(index.resolve_field_comment("api::Shape::Circle", "radius"), "The radius.");
        assert_eq!(index.resolve_method_comment("api", "get_item"), "Get an item.");
        assert_eq!(
            index.resolve_method_parameter_comment("api", "get_item", "id"),
            "The item id"
        );
    }

    #[test]
    fn test_crate_root_functions_are_declared_on_crate() {
        let index = extract("", "/// Health check.\npub fn health() {}");
        assert_eq!(index.resolve_method_comment("crate", "health"), "Health check.");
    }

    #[test]
    fn test_write_sidecars_and_read_back() {
        let index = extract(
            "models",
            r#"
            /// An item.
            pub struct Item {
                /// The id.
                pub id: u32,
            }
            "#,
        );

        let dir = TempDir::new().unwrap();
        let written = write_sidecars(&index, dir.path()).unwrap();

        assert_eq!(written, 1);
        assert!(dir.path().join("models/Item.json").exists());

        let resolver = SidecarCommentResolver::new(dir.path());
        assert_eq!(resolver.resolve_field_comment("models::Item", "id"), "The id.");
    }
}
