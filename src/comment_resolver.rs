//! Doc comment lookup backed by JSON sidecar files.
//!
//! One sidecar per documented item lives at `<dir>/<module path>/<Item>.json`:
//!
//! ```json
//! {
//!   "comment": "An item in the catalog.",
//!   "fields": { "name": { "comment": "Display name.", "tags": { "default": "none" } } },
//!   "methods": { "get_item": { "comment": "...", "parameters": { "id": "..." }, "tags": {} } }
//! }
//! ```
//!
//! The older flat variant, where `fields` maps names to plain strings, is accepted too.
//! Missing files and missing keys resolve to empty values; lookups never fail.

use log::{debug, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Comments of one struct, enum, struct variant or module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDoc {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDoc>,
    #[serde(default)]
    pub methods: BTreeMap<String, MethodDoc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, TagValues>,
}

/// A field comment, either a plain string (flat variant) or a comment with tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldDoc {
    Plain(String),
    Detailed(FieldDetail),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDetail {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub tags: BTreeMap<String, TagValues>,
}

impl FieldDoc {
    pub fn comment(&self) -> &str {
        match self {
            FieldDoc::Plain(comment) => comment,
            FieldDoc::Detailed(detail) => &detail.comment,
        }
    }

    pub fn tag(&self, name: &str) -> Option<&TagValues> {
        match self {
            FieldDoc::Plain(_) => None,
            FieldDoc::Detailed(detail) => detail.tags.get(name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodDoc {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: BTreeMap<String, TagValues>,
}

/// A tag occurring once or several times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValues {
    One(String),
    Many(Vec<String>),
}

impl TagValues {
    pub fn values(&self) -> Vec<String> {
        match self {
            TagValues::One(value) => vec![value.clone()],
            TagValues::Many(values) => values.clone(),
        }
    }

    /// All values joined by newlines
    pub fn joined(&self) -> String {
        self.values().join("\n")
    }

    /// Add another occurrence of the tag
    pub fn push(&mut self, value: String) {
        match self {
            TagValues::One(first) => *self = TagValues::Many(vec![std::mem::take(first), value]),
            TagValues::Many(values) => values.push(value),
        }
    }
}

/// Relative sidecar location of a qualified item name.
///
/// Module segments become directories; the item and any variant name form the file name:
/// `models::item::Item` -> `models/item/Item.json`, `models::Shape::Circle` ->
/// `models/Shape.Circle.json`, module docs `api::handlers` -> `api/handlers.json`.
pub fn sidecar_path(qualified_name: &str) -> PathBuf {
    let segments: Vec<&str> = qualified_name.split("::").collect();
    let item_start = segments
        .iter()
        .position(|s| s.starts_with(|c: char| c.is_ascii_uppercase()))
        .unwrap_or(segments.len().saturating_sub(1));

    let mut path = PathBuf::new();
    for module in &segments[..item_start] {
        path.push(module);
    }
    path.push(format!("{}.json", segments[item_start..].join(".")));
    path
}

/// Resolves comments of items, fields, methods and parameters
pub trait CommentResolver {
    /// Comments of one item, `None` when it has no documentation
    fn class_doc(&self, class: &str) -> Option<Arc<ClassDoc>>;

    fn resolve_class_comment(&self, class: &str) -> String {
        self.class_doc(class)
            .map(|doc| doc.comment.clone())
            .unwrap_or_default()
    }

    fn resolve_field_comment(&self, class: &str, field: &str) -> String {
        self.class_doc(class)
            .and_then(|doc| doc.fields.get(field).map(|f| f.comment().to_string()))
            .unwrap_or_default()
    }

    fn resolve_method_comment(&self, class: &str, method: &str) -> String {
        self.class_doc(class)
            .and_then(|doc| doc.methods.get(method).map(|m| m.comment.clone()))
            .unwrap_or_default()
    }

    fn resolve_method_parameter_comment(&self, class: &str, method: &str, parameter: &str) -> String {
        self.class_doc(class)
            .and_then(|doc| {
                doc.methods
                    .get(method)
                    .and_then(|m| m.parameters.get(parameter).cloned())
            })
            .unwrap_or_default()
    }

    fn resolve_method_tag(&self, class: &str, method: &str, tag: &str) -> String {
        self.class_doc(class)
            .and_then(|doc| {
                doc.methods
                    .get(method)
                    .and_then(|m| m.tags.get(tag).map(TagValues::joined))
            })
            .unwrap_or_default()
    }

    fn resolve_class_tag(&self, class: &str, tag: &str) -> Vec<String> {
        self.class_doc(class)
            .and_then(|doc| doc.tags.get(tag).map(TagValues::values))
            .unwrap_or_default()
    }

    fn resolve_field_tag(&self, class: &str, field: &str, tag: &str) -> String {
        self.class_doc(class)
            .and_then(|doc| {
                doc.fields
                    .get(field)
                    .and_then(|f| f.tag(tag).map(TagValues::joined))
            })
            .unwrap_or_default()
    }
}

/// Loads sidecar files from a directory on first use and keeps them for the process lifetime
pub struct SidecarCommentResolver {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Option<Arc<ClassDoc>>>>,
}

impl SidecarCommentResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load(&self, class: &str) -> Option<Arc<ClassDoc>> {
        let path = self.dir.join(sidecar_path(class));

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No doc sidecar for {} at {}: {}", class, path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<ClassDoc>(&content) {
            Ok(doc) => {
                debug!("Loaded doc sidecar {}", path.display());
                Some(Arc::new(doc))
            }
            Err(e) => {
                warn!("Ignoring malformed doc sidecar {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl CommentResolver for SidecarCommentResolver {
    fn class_doc(&self, class: &str) -> Option<Arc<ClassDoc>> {
        if let Some(cached) = self.cache.read().get(class) {
            return cached.clone();
        }

        let loaded = self.load(class);
        self.cache
            .write()
            .entry(class.to_string())
            .or_insert(loaded)
            .clone()
    }
}

/// In-memory comments, as produced by the doclet
#[derive(Debug, Clone, Default)]
pub struct DocIndex {
    classes: BTreeMap<String, Arc<ClassDoc>>,
}

impl DocIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: &str, doc: ClassDoc) {
        self.classes.insert(class.to_string(), Arc::new(doc));
    }

    pub fn get(&self, class: &str) -> Option<&ClassDoc> {
        self.classes.get(class).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Items in qualified-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassDoc)> {
        self.classes
            .iter()
            .map(|(name, doc)| (name.as_str(), doc.as_ref()))
    }
}

impl CommentResolver for DocIndex {
    fn class_doc(&self, class: &str) -> Option<Arc<ClassDoc>> {
        self.classes.get(class).cloned()
    }
}
