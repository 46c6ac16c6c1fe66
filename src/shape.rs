//! Serialized shapes of types.
//!
//! The field walker never looks at type definitions directly. It asks a [`ShapeResolver`]
//! what a value of a type looks like once serialized: a scalar, an object with ordered
//! properties, an array of some element type, or a polymorphic enum with several variants.
//! [`SourceShapeResolver`] answers from the parsed project sources and serde attributes.

use crate::attributes::RenameRule;
use crate::error::{Error, Result};
use crate::type_ref::{TypeRef, ARRAY_SEGMENT, OPAQUE_SEGMENT};
use crate::type_resolver::{
    CustomSerializer, FieldStyle, PrimitiveType, SerializeFormat, StructDef, TypeDef, TypeKind,
    TypeResolver, VariantDef,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// JSON kind of a serialized value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JsonType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
    Any,
}

impl JsonType {
    /// Type name shown for values of this kind when nothing more specific is known
    pub fn default_type_name(&self) -> &'static str {
        match self {
            JsonType::String => "String",
            JsonType::Number => "Number",
            JsonType::Boolean => "Boolean",
            JsonType::Object => "Object",
            JsonType::Array => "Array",
            JsonType::Null => "Null",
            JsonType::Any => "Varies",
        }
    }
}

/// The serialized shape of a type
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Scalar(ScalarShape),
    Object(ObjectShape),
    /// Array of the given element type
    Array(TypeRef),
    Polymorphic(PolymorphicShape),
}

impl Shape {
    /// JSON kind and display type name of a value with this shape
    pub fn kind(&self) -> (JsonType, String) {
        match self {
            Shape::Scalar(scalar) => (scalar.json_type, scalar.type_name.clone()),
            Shape::Object(_) | Shape::Polymorphic(_) => (JsonType::Object, "Object".to_string()),
            Shape::Array(_) => (JsonType::Array, "Array".to_string()),
        }
    }

    fn scalar(json_type: JsonType, type_name: &str) -> Self {
        Shape::Scalar(ScalarShape {
            json_type,
            type_name: type_name.to_string(),
            allowed_values: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarShape {
    pub json_type: JsonType,
    pub type_name: String,
    /// Serialized names of a string enum, in declaration order
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectShape {
    /// Qualified name with generic arguments, e.g. `models::Page<Item>`
    pub type_id: String,
    /// Qualified name of the declaring struct or struct variant
    pub declaring: String,
    pub generic_args: Vec<TypeRef>,
    pub properties: Vec<Property>,
}

/// A serialized property of an object
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Name in the serialized form
    pub name: String,
    /// Name in the source, used for comment and constraint lookups
    pub field_name: String,
    /// Qualified name of the declaring struct or struct variant
    pub declaring: String,
    /// Property type with generic parameters substituted
    pub ty: TypeRef,
    /// `Option<T>`, `#[serde(default)]` or `skip_serializing_if`
    pub structurally_optional: bool,
    pub flatten: bool,
    pub not_expanded: bool,
    pub deprecated: Option<String>,
    /// What the field's `serialize_with` function writes, when it is part of the project
    pub serialize_with: Option<CustomSerializer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolymorphicShape {
    pub type_id: String,
    /// Qualified name of the enum
    pub declaring: String,
    pub generic_args: Vec<TypeRef>,
    pub tagging: Tagging,
    pub variants: Vec<VariantShape>,
}

/// Serde enum representations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tagging {
    /// `{"Variant": {...}}`
    External,
    /// `#[serde(tag = "type")]`
    Internal { tag: String },
    /// `#[serde(tag = "t", content = "c")]`
    Adjacent { tag: String, content: String },
    /// `#[serde(untagged)]`
    Untagged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantShape {
    /// Serialized variant name
    pub name: String,
    /// Variant name in the source
    pub ident: String,
    pub payload: VariantPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariantPayload {
    Unit,
    Struct(ObjectShape),
    Newtype(TypeRef),
    Tuple(Vec<TypeRef>),
}

/// Generic types currently being expanded, innermost last
#[derive(Debug, Default)]
pub struct ExpansionChain {
    entries: Vec<(String, Vec<TypeRef>)>,
}

impl ExpansionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `name<args>`, unless the chain already expands `name` with the same arguments
    /// or with arguments that `args` embed (`Nest<u32>` then `Nest<Vec<u32>>`). Entering
    /// either would never terminate.
    pub fn enter(&mut self, name: &str, args: &[TypeRef]) -> bool {
        let repeats = self.entries.iter().any(|(entered, previous)| {
            entered == name
                && (previous.as_slice() == args
                    || args.iter().any(|arg| {
                        previous
                            .iter()
                            .any(|prev| arg != prev && arg.contains(prev))
                    }))
        });
        if !repeats {
            self.entries.push((name.to_string(), args.to_vec()));
        }
        !repeats
    }

    /// Leave the innermost entered type
    pub fn leave(&mut self) {
        self.entries.pop();
    }
}

/// Determines the serialized shape of a type
pub trait ShapeResolver {
    /// Resolve the shape of `ty`.
    ///
    /// Failures are `Error::FieldProcessing` without a path; the caller attaches it.
    fn resolve(&self, ty: &TypeRef) -> Result<Shape>;
}

const WRAPPERS: &[&str] = &[
    "Option", "Box", "Rc", "Arc", "Cow", "RefCell", "Cell", "Mutex", "RwLock", "Reverse", "Wrapping",
];

const SEQUENCES: &[&str] = &[
    "Vec", "VecDeque", "LinkedList", "HashSet", "BTreeSet", "BinaryHeap", "IndexSet", "SmallVec",
];

const MAPS: &[&str] = &["HashMap", "BTreeMap", "IndexMap", "Map"];

const BIG_INTEGERS: &[&str] = &["BigInt", "BigUint", "U256", "I256"];

const DECIMALS: &[&str] = &["Decimal", "BigDecimal", "OrderedFloat", "NotNan"];

const STRING_LIKE: &[&str] = &[
    "DateTime", "NaiveDate", "NaiveDateTime", "NaiveTime", "Date", "Time", "OffsetDateTime",
    "PrimitiveDateTime", "Uuid", "Url", "Uri", "PathBuf", "Path", "OsString", "IpAddr",
    "Ipv4Addr", "Ipv6Addr", "SocketAddr", "Email", "SmolStr", "CompactString",
];

/// Resolves shapes from the parsed project sources
pub struct SourceShapeResolver<'a> {
    types: &'a TypeResolver,
    /// Configured custom serializers: simple or qualified type name -> JSON kind
    custom_serializers: HashMap<String, JsonType>,
}

impl<'a> SourceShapeResolver<'a> {
    pub fn new(types: &'a TypeResolver) -> Self {
        Self {
            types,
            custom_serializers: HashMap::new(),
        }
    }

    /// Document values of `type_name` as `json_type`, overriding what the sources say
    pub fn with_custom_serializer(mut self, type_name: &str, json_type: JsonType) -> Self {
        self.custom_serializers
            .insert(type_name.to_string(), json_type);
        self
    }

    pub fn with_custom_serializers(mut self, serializers: &HashMap<String, JsonType>) -> Self {
        self.custom_serializers
            .extend(serializers.iter().map(|(k, v)| (k.clone(), *v)));
        self
    }

    fn configured_serializer(&self, ty: &TypeRef) -> Option<JsonType> {
        let written = ty.significant_segments().join("::");
        self.custom_serializers
            .get(&written)
            .or_else(|| self.custom_serializers.get(ty.name()))
            .copied()
    }

    fn well_known(&self, ty: &TypeRef) -> Option<Shape> {
        let name = ty.name();

        if let Some(primitive) = TypeResolver::parse_primitive_type(name) {
            return Some(match primitive {
                PrimitiveType::String | PrimitiveType::Char => {
                    Shape::scalar(JsonType::String, "String")
                }
                PrimitiveType::Bool => Shape::scalar(JsonType::Boolean, "Boolean"),
                integer if integer.is_integer() => Shape::scalar(JsonType::Number, "Integer"),
                _ => Shape::scalar(JsonType::Number, "Decimal"),
            });
        }

        if name.starts_with("NonZero") || (name.starts_with("Atomic") && name != "AtomicBool") {
            return Some(Shape::scalar(JsonType::Number, "Integer"));
        }
        if name == "AtomicBool" {
            return Some(Shape::scalar(JsonType::Boolean, "Boolean"));
        }
        if BIG_INTEGERS.contains(&name) {
            return Some(Shape::scalar(JsonType::Number, "Integer"));
        }
        if DECIMALS.contains(&name) {
            return Some(Shape::scalar(JsonType::Number, "Decimal"));
        }

        let is_project_type = self.types.lookup(ty).is_some();
        if STRING_LIKE.contains(&name) && !is_project_type {
            return Some(Shape::scalar(JsonType::String, "String"));
        }

        if ty.is_array() || (SEQUENCES.contains(&name) && !is_project_type) {
            let element = ty.first_arg().cloned().unwrap_or_else(any_value);
            return Some(Shape::Array(element));
        }
        if ty.is_tuple() {
            if ty.args.is_empty() {
                return Some(Shape::scalar(JsonType::Null, "Null"));
            }
            return Some(Shape::Array(any_value()));
        }
        if MAPS.contains(&name) && !is_project_type {
            return Some(Shape::scalar(JsonType::Object, "Object"));
        }
        if name == "PhantomData" {
            return Some(Shape::scalar(JsonType::Null, "Null"));
        }

        let is_json_value = name == "Value"
            && (ty.segments.iter().any(|s| s == "serde_json") || !is_project_type);
        if is_json_value {
            return Some(Shape::scalar(JsonType::Any, "Varies"));
        }

        None
    }

    fn resolve_definition(
        &self,
        ty: &TypeRef,
        def: &TypeDef,
        resolving: &mut ExpansionChain,
    ) -> Result<Shape> {
        if let Some(serializer) = self.types.custom_serializer(&def.qualified_name) {
            debug!("{} uses a custom serializer: {:?}", def.name, serializer);
            return serializer_shape(ty, serializer);
        }

        if let Some(target) = &def.container.into {
            debug!("{} serializes into {}", def.name, target);
            return self.resolve_alias(ty, def, target, resolving);
        }

        let bindings = generic_bindings(def, ty);
        let type_id = type_id(&def.qualified_name, ty);

        match &def.kind {
            TypeKind::Struct(struct_def) => {
                let first_field = struct_def.fields.iter().find(|f| !f.serde_attrs.skip);
                let newtype =
                    struct_def.style == FieldStyle::Tuple && struct_def.fields.len() == 1;
                if def.container.transparent || newtype {
                    return match first_field {
                        Some(field) => self.resolve_alias(
                            ty,
                            def,
                            &field.ty.substitute(&bindings),
                            resolving,
                        ),
                        None => Ok(Shape::scalar(JsonType::Null, "Null")),
                    };
                }

                match struct_def.style {
                    FieldStyle::Unit => Ok(Shape::scalar(JsonType::Null, "Null")),
                    FieldStyle::Tuple => Ok(Shape::Array(any_value())),
                    FieldStyle::Named => {
                        Ok(Shape::Object(self.object_shape(def, ty, struct_def, None)))
                    }
                }
            }
            TypeKind::Enum(enum_def) => {
                let variants: Vec<&VariantDef> = enum_def
                    .variants
                    .iter()
                    .filter(|v| !v.serde_attrs.skip)
                    .collect();

                let unit_only = variants.iter().all(|v| v.fields.style == FieldStyle::Unit);
                if unit_only && !def.container.untagged && def.container.tag.is_none() {
                    return Ok(Shape::Scalar(ScalarShape {
                        json_type: JsonType::String,
                        type_name: "String".to_string(),
                        allowed_values: variants
                            .iter()
                            .map(|v| variant_name(v, def.container.rename_all))
                            .collect(),
                    }));
                }

                let tagging = match (&def.container.tag, &def.container.content) {
                    _ if def.container.untagged => Tagging::Untagged,
                    (Some(tag), Some(content)) => Tagging::Adjacent {
                        tag: tag.clone(),
                        content: content.clone(),
                    },
                    (Some(tag), None) => Tagging::Internal { tag: tag.clone() },
                    (None, _) => Tagging::External,
                };

                let variants = variants
                    .into_iter()
                    .map(|variant| {
                        let payload = match variant.fields.style {
                            FieldStyle::Unit => VariantPayload::Unit,
                            FieldStyle::Named => VariantPayload::Struct(self.object_shape(
                                def,
                                ty,
                                &variant.fields,
                                Some(variant),
                            )),
                            FieldStyle::Tuple if variant.fields.fields.len() == 1 => {
                                VariantPayload::Newtype(
                                    variant.fields.fields[0].ty.substitute(&bindings),
                                )
                            }
                            FieldStyle::Tuple => VariantPayload::Tuple(
                                variant
                                    .fields
                                    .fields
                                    .iter()
                                    .map(|f| f.ty.substitute(&bindings))
                                    .collect(),
                            ),
                        };
                        VariantShape {
                            name: variant_name(variant, def.container.rename_all),
                            ident: variant.name.clone(),
                            payload,
                        }
                    })
                    .collect();

                Ok(Shape::Polymorphic(PolymorphicShape {
                    type_id,
                    declaring: def.qualified_name.clone(),
                    generic_args: ty.args.clone(),
                    tagging,
                    variants,
                }))
            }
        }
    }
}

impl ShapeResolver for SourceShapeResolver<'_> {
    fn resolve(&self, ty: &TypeRef) -> Result<Shape> {
        self.resolve_within(ty, &mut ExpansionChain::new())
    }
}

impl SourceShapeResolver<'_> {
    /// `resolving` holds the types whose shape is the shape of another type
    /// (newtypes, `transparent`, `into`) currently being followed
    fn resolve_within(&self, ty: &TypeRef, resolving: &mut ExpansionChain) -> Result<Shape> {
        if WRAPPERS.contains(&ty.name()) {
            if let Some(inner) = ty.args.last() {
                return self.resolve_within(inner, resolving);
            }
        }

        if ty.name() == OPAQUE_SEGMENT {
            return Err(Error::field_processing(
                ty.to_string(),
                "the type cannot be named",
            ));
        }

        if let Some(json_type) = self.configured_serializer(ty) {
            debug!("Configured custom serializer for {}: {:?}", ty, json_type);
            return Ok(Shape::scalar(json_type, json_type.default_type_name()));
        }

        if let Some(shape) = self.well_known(ty) {
            return Ok(shape);
        }

        if let Some(def) = self.types.lookup(ty) {
            return self.resolve_definition(ty, def, resolving);
        }

        if let Some((def, variant)) = self.types.lookup_variant(ty) {
            if variant.fields.style == FieldStyle::Named {
                return Ok(Shape::Object(self.object_shape(
                    def,
                    ty,
                    &variant.fields,
                    Some(variant),
                )));
            }
        }

        let message = if ty.segments.len() == 1 && ty.args.is_empty() && ty.name().len() == 1 {
            "unresolved generic parameter"
        } else {
            "unknown type"
        };
        Err(Error::field_processing(ty.to_string(), message))
    }

    /// Shape of `target`, the type `ty` serializes as
    fn resolve_alias(
        &self,
        ty: &TypeRef,
        def: &TypeDef,
        target: &TypeRef,
        resolving: &mut ExpansionChain,
    ) -> Result<Shape> {
        if !resolving.enter(&def.qualified_name, &ty.args) {
            warn!("{} serializes as itself, documenting it as any value", ty);
            return Ok(Shape::scalar(JsonType::Any, "Varies"));
        }
        let shape = self.resolve_within(target, resolving);
        resolving.leave();
        shape
    }

    /// Object shape of a struct, or of `variant` when it is a struct variant of `def`
    fn object_shape(
        &self,
        def: &TypeDef,
        ty: &TypeRef,
        struct_def: &StructDef,
        variant: Option<&VariantDef>,
    ) -> ObjectShape {
        let bindings = generic_bindings(def, ty);
        let (type_id, declaring, rename_all, container_default) = match variant {
            Some(variant) => (
                format!("{}::{}", type_id(&def.qualified_name, ty), variant.name),
                format!("{}::{}", def.qualified_name, variant.name),
                variant.rename_all.or(def.container.rename_all_fields),
                false,
            ),
            None => (
                type_id(&def.qualified_name, ty),
                def.qualified_name.clone(),
                def.container.rename_all,
                def.container.default,
            ),
        };

        let mut properties = Vec::new();
        for field in &struct_def.fields {
            if field.serde_attrs.skip {
                debug!("Skipping {}.{} (serde skip)", declaring, field.name);
                continue;
            }

            let serialize_with = field
                .serde_attrs
                .serialize_with
                .as_deref()
                .and_then(|function| {
                    let serializer = self.types.field_serializer(function);
                    if serializer.is_none() {
                        debug!(
                            "{} is not in the project, documenting {}.{} by its type",
                            function, declaring, field.name
                        );
                    }
                    serializer
                });

            properties.push(Property {
                name: field
                    .serde_attrs
                    .rename
                    .clone()
                    .or_else(|| rename_all.map(|rule| rule.apply_to_field(&field.name)))
                    .unwrap_or_else(|| field.name.clone()),
                field_name: field.name.clone(),
                declaring: declaring.clone(),
                ty: field.ty.substitute(&bindings),
                structurally_optional: field.optional
                    || field.serde_attrs.default
                    || field.serde_attrs.skip_serializing_if
                    || container_default,
                flatten: field.serde_attrs.flatten,
                not_expanded: field.not_expanded,
                deprecated: field.deprecated.clone(),
                serialize_with,
            });
        }

        ObjectShape {
            type_id,
            declaring,
            generic_args: ty.args.clone(),
            properties,
        }
    }
}

/// `serde_json::Value`, the element type of arrays whose elements cannot be described
pub fn any_value() -> TypeRef {
    TypeRef::new("serde_json::Value")
}

/// Shape of a value of `ty` written by a hand-written serializer
pub fn serializer_shape(ty: &TypeRef, serializer: CustomSerializer) -> Result<Shape> {
    match serializer {
        CustomSerializer::Format(format) => Ok(format_shape(format)),
        CustomSerializer::Opaque => Err(Error::field_processing(
            ty.to_string(),
            "the format written by its serializer cannot be determined",
        )),
    }
}

fn format_shape(format: SerializeFormat) -> Shape {
    match format {
        SerializeFormat::String => Shape::scalar(JsonType::String, "String"),
        SerializeFormat::Integer => Shape::scalar(JsonType::Number, "Integer"),
        SerializeFormat::Decimal => Shape::scalar(JsonType::Number, "Decimal"),
        SerializeFormat::Boolean => Shape::scalar(JsonType::Boolean, "Boolean"),
        SerializeFormat::Array => Shape::scalar(JsonType::Array, "Array"),
        SerializeFormat::Object => Shape::scalar(JsonType::Object, "Object"),
        SerializeFormat::Null => Shape::scalar(JsonType::Null, "Null"),
    }
}

fn generic_bindings(def: &TypeDef, ty: &TypeRef) -> HashMap<String, TypeRef> {
    def.generics
        .iter()
        .cloned()
        .zip(ty.args.iter().cloned())
        .collect()
}

fn type_id(qualified_name: &str, ty: &TypeRef) -> String {
    if ty.args.is_empty() || ty.name() == ARRAY_SEGMENT {
        qualified_name.to_string()
    } else {
        let args: Vec<String> = ty.args.iter().map(ToString::to_string).collect();
        format!("{}<{}>", qualified_name, args.join(", "))
    }
}

fn variant_name(variant: &VariantDef, rename_all: Option<RenameRule>) -> String {
    variant
        .serde_attrs
        .rename
        .clone()
        .or_else(|| rename_all.map(|rule| rule.apply_to_variant(&variant.name)))
        .unwrap_or_else(|| variant.name.clone())
}
