use crate::attributes::{
    attribute_args, deprecation_note, doc_lines, find_arg, has_arg, MetaArg, RenameRule,
};
use crate::parser::ParsedFile;
use crate::type_ref::TypeRef;
use log::{debug, warn};
use std::collections::HashMap;
use syn::visit::Visit;

/// Owner name used for free functions declared at the crate root
pub const CRATE_ROOT: &str = "crate";

/// Type resolver - indexes the type definitions, custom serializers and functions of a project
pub struct TypeResolver {
    /// All parsed files, kept for the doc comment extraction
    parsed_files: Vec<ParsedFile>,
    /// Every struct and enum in file and declaration order
    definitions: Vec<TypeDef>,
    /// Qualified name -> index into `definitions`
    by_qualified: HashMap<String, usize>,
    /// Simple name -> indices into `definitions`
    by_name: HashMap<String, Vec<usize>>,
    /// Qualified type name -> hand-written `impl Serialize`
    serializers: HashMap<String, CustomSerializer>,
    /// Free functions and methods
    functions: Vec<FunctionDef>,
}

/// A struct or enum definition found in the sources
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// The type name
    pub name: String,
    /// Module path plus name, e.g. `models::item::Item`
    pub qualified_name: String,
    /// Generic type parameter names in declaration order
    pub generics: Vec<String>,
    /// Serde container attributes
    pub container: ContainerAttributes,
    /// The kind of type
    pub kind: TypeKind,
}

/// Type kind - struct or enum
#[derive(Debug, Clone)]
pub enum TypeKind {
    Struct(StructDef),
    Enum(EnumDef),
}

/// Fields of a struct or of a struct-like enum variant
#[derive(Debug, Clone)]
pub struct StructDef {
    pub style: FieldStyle,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStyle {
    Named,
    Tuple,
    Unit,
}

/// Field definition in a struct
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name, or its position for tuple fields
    pub name: String,
    /// Declared type of the field
    pub ty: TypeRef,
    /// Whether the field is optional (wrapped in `Option<T>`)
    pub optional: bool,
    /// Serde attributes applied to this field
    pub serde_attrs: SerdeAttributes,
    /// Arguments of `#[validate(...)]`
    pub validate: Vec<MetaArg>,
    /// `#[deprecated]` note, empty when deprecated without a note
    pub deprecated: Option<String>,
    /// Doc comment carries `@not_expanded`
    pub not_expanded: bool,
}

/// Enum definition with variants
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub variants: Vec<VariantDef>,
}

#[derive(Debug, Clone)]
pub struct VariantDef {
    pub name: String,
    pub serde_attrs: SerdeAttributes,
    /// Variant-level `rename_all`, applied to the variant's own fields
    pub rename_all: Option<RenameRule>,
    pub fields: StructDef,
}

/// Serde attributes for a field or variant
#[derive(Debug, Clone, Default)]
pub struct SerdeAttributes {
    /// Renamed field name
    pub rename: Option<String>,
    /// Whether to skip this field entirely
    pub skip: bool,
    /// Whether to flatten this field
    pub flatten: bool,
    /// `#[serde(default)]` or `#[serde(default = "...")]`
    pub default: bool,
    /// `#[serde(skip_serializing_if = "...")]`
    pub skip_serializing_if: bool,
    /// Function named by `#[serde(serialize_with = "...")]`, or `<module>::serialize` for
    /// `#[serde(with = "module")]`
    pub serialize_with: Option<String>,
}

/// Serde attributes on a struct or enum
#[derive(Debug, Clone, Default)]
pub struct ContainerAttributes {
    pub rename_all: Option<RenameRule>,
    pub rename_all_fields: Option<RenameRule>,
    pub tag: Option<String>,
    pub content: Option<String>,
    pub untagged: bool,
    pub transparent: bool,
    pub into: Option<TypeRef>,
    pub default: bool,
}

/// What a hand-written `impl Serialize` writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomSerializer {
    Format(SerializeFormat),
    /// The body does not reveal its format
    Opaque,
}

/// Serializer formats recognised in `impl Serialize` bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeFormat {
    String,
    Integer,
    Decimal,
    Boolean,
    Array,
    Object,
    Null,
}

impl SerializeFormat {
    /// Map a `Serializer` method to the format it writes
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "serialize_str" | "collect_str" | "serialize_char" => Some(SerializeFormat::String),
            "serialize_i8" | "serialize_i16" | "serialize_i32" | "serialize_i64"
            | "serialize_i128" | "serialize_u8" | "serialize_u16" | "serialize_u32"
            | "serialize_u64" | "serialize_u128" => Some(SerializeFormat::Integer),
            "serialize_f32" | "serialize_f64" => Some(SerializeFormat::Decimal),
            "serialize_bool" => Some(SerializeFormat::Boolean),
            "serialize_seq" | "serialize_tuple" | "serialize_tuple_struct" | "collect_seq"
            | "serialize_bytes" => Some(SerializeFormat::Array),
            "serialize_map" | "serialize_struct" | "collect_map" => Some(SerializeFormat::Object),
            "serialize_none" | "serialize_unit" | "serialize_unit_struct" => {
                Some(SerializeFormat::Null)
            }
            _ => None,
        }
    }
}

/// A free function or a method found in the sources
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    /// Qualified type name for methods, module path (or `crate`) for free functions
    pub declaring: String,
    pub signature: syn::Signature,
    /// Format of the first `Serializer` call in the body
    pub writes: Option<SerializeFormat>,
}

/// Primitive types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Bool,
    Char,
}

impl PrimitiveType {
    pub fn is_integer(&self) -> bool {
        !matches!(
            self,
            PrimitiveType::String
                | PrimitiveType::F32
                | PrimitiveType::F64
                | PrimitiveType::Bool
                | PrimitiveType::Char
        )
    }
}

/// Visit every item of a file, descending into inline `mod` blocks
pub fn walk_items<'a>(
    module_path: &str,
    items: &'a [syn::Item],
    visit: &mut dyn FnMut(&str, &'a syn::Item),
) {
    for item in items {
        visit(module_path, item);

        if let syn::Item::Mod(item_mod) = item {
            if let Some((_, nested)) = &item_mod.content {
                let nested_path = join_path(module_path, &item_mod.ident.to_string());
                walk_items(&nested_path, nested, visit);
            }
        }
    }
}

/// Join a module path and a name, treating an empty module path as the crate root
pub fn join_path(module_path: &str, name: &str) -> String {
    if module_path.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", module_path, name)
    }
}

/// Owner of free functions declared in a module
pub fn module_owner(module_path: &str) -> String {
    if module_path.is_empty() {
        CRATE_ROOT.to_string()
    } else {
        module_path.to_string()
    }
}

/// Names bound by a parameter pattern: `id`, `Path(id)`, `Path((a, b))`, `Json(body)`
pub fn pattern_names(pat: &syn::Pat) -> Vec<String> {
    match pat {
        syn::Pat::Ident(pat_ident) => vec![pat_ident.ident.to_string()],
        syn::Pat::TupleStruct(tuple_struct) => {
            tuple_struct.elems.iter().flat_map(pattern_names).collect()
        }
        syn::Pat::Tuple(tuple) => tuple.elems.iter().flat_map(pattern_names).collect(),
        syn::Pat::Type(pat_type) => pattern_names(&pat_type.pat),
        syn::Pat::Reference(reference) => pattern_names(&reference.pat),
        syn::Pat::Paren(paren) => pattern_names(&paren.pat),
        _ => Vec::new(),
    }
}

impl TypeResolver {
    /// Create a new TypeResolver with parsed files
    pub fn new(parsed_files: Vec<ParsedFile>) -> Self {
        debug!("Initializing TypeResolver with {} files", parsed_files.len());

        let mut definitions = Vec::new();
        for parsed_file in &parsed_files {
            walk_items(
                &parsed_file.module_path,
                &parsed_file.syntax_tree.items,
                &mut |module_path, item| match item {
                    syn::Item::Struct(item_struct) => {
                        definitions.push(Self::parse_struct_definition(module_path, item_struct));
                    }
                    syn::Item::Enum(item_enum) => {
                        definitions.push(Self::parse_enum_definition(module_path, item_enum));
                    }
                    _ => {}
                },
            );
        }

        let mut by_qualified = HashMap::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, def) in definitions.iter().enumerate() {
            if by_qualified.insert(def.qualified_name.clone(), index).is_some() {
                warn!("Duplicate type definition: {}", def.qualified_name);
            }
            by_name.entry(def.name.clone()).or_default().push(index);
        }

        let mut resolver = Self {
            parsed_files,
            definitions,
            by_qualified,
            by_name,
            serializers: HashMap::new(),
            functions: Vec::new(),
        };
        resolver.index_impls_and_functions();

        debug!(
            "Indexed {} types, {} custom serializers and {} functions",
            resolver.definitions.len(),
            resolver.serializers.len(),
            resolver.functions.len()
        );
        resolver
    }

    /// The parsed files this resolver was built from
    pub fn parsed_files(&self) -> &[ParsedFile] {
        &self.parsed_files
    }

    fn index_impls_and_functions(&mut self) {
        let mut serializers = Vec::new();
        let mut functions = Vec::new();

        for parsed_file in &self.parsed_files {
            walk_items(
                &parsed_file.module_path,
                &parsed_file.syntax_tree.items,
                &mut |module_path, item| match item {
                    syn::Item::Fn(item_fn) => functions.push(FunctionDef {
                        name: item_fn.sig.ident.to_string(),
                        declaring: module_owner(module_path),
                        signature: item_fn.sig.clone(),
                        writes: Self::body_format(&item_fn.block),
                    }),
                    syn::Item::Impl(item_impl) => {
                        let self_ty = TypeRef::from_syn(&item_impl.self_ty);
                        let owner = self
                            .lookup(&self_ty)
                            .map(|def| def.qualified_name.clone())
                            .unwrap_or_else(|| join_path(module_path, self_ty.name()));

                        if Self::implements_serialize(item_impl) {
                            let serializer = Self::detect_serialize_format(item_impl);
                            debug!("Found custom serializer for {}: {:?}", owner, serializer);
                            serializers.push((owner.clone(), serializer));
                        }

                        for impl_item in &item_impl.items {
                            if let syn::ImplItem::Fn(method) = impl_item {
                                functions.push(FunctionDef {
                                    name: method.sig.ident.to_string(),
                                    declaring: owner.clone(),
                                    signature: method.sig.clone(),
                                    writes: Self::body_format(&method.block),
                                });
                            }
                        }
                    }
                    _ => {}
                },
            );
        }

        self.serializers.extend(serializers);
        self.functions = functions;
    }

    fn implements_serialize(item_impl: &syn::ItemImpl) -> bool {
        item_impl
            .trait_
            .as_ref()
            .and_then(|(_, path, _)| path.segments.last())
            .map(|segment| segment.ident == "Serialize")
            .unwrap_or(false)
    }

    /// Find the format a hand-written `impl Serialize` writes
    fn detect_serialize_format(item_impl: &syn::ItemImpl) -> CustomSerializer {
        let mut visitor = FormatVisitor { format: None };
        visitor.visit_item_impl(item_impl);
        visitor
            .format
            .map(CustomSerializer::Format)
            .unwrap_or(CustomSerializer::Opaque)
    }

    fn body_format(block: &syn::Block) -> Option<SerializeFormat> {
        let mut visitor = FormatVisitor { format: None };
        visitor.visit_block(block);
        visitor.format
    }

    /// Format written by a `serialize_with` function, `None` when the function is not
    /// part of the project
    pub fn field_serializer(&self, function: &str) -> Option<CustomSerializer> {
        let def = self.find_function(function)?;
        Some(
            def.writes
                .map(CustomSerializer::Format)
                .unwrap_or(CustomSerializer::Opaque),
        )
    }

    /// Find a type definition by its qualified name
    pub fn find_by_qualified_name(&self, qualified_name: &str) -> Option<&TypeDef> {
        self.by_qualified
            .get(qualified_name)
            .map(|&index| &self.definitions[index])
    }

    /// Find the definition a type reference points to.
    ///
    /// Single-segment names match by simple name. Multi-segment paths must match the end
    /// of a qualified name, unless the simple name is unique in the project (re-exports
    /// make written paths differ from file-derived module paths).
    pub fn lookup(&self, ty: &TypeRef) -> Option<&TypeDef> {
        let segments = ty.significant_segments();
        let name = segments.last()?;
        let candidates = self.by_name.get(*name)?;

        if segments.len() == 1 {
            if candidates.len() > 1 {
                debug!(
                    "Type name {} is ambiguous, using {}",
                    name, self.definitions[candidates[0]].qualified_name
                );
            }
            return candidates.first().map(|&index| &self.definitions[index]);
        }

        let written = segments.join("::");
        let suffix = format!("::{}", written);
        candidates
            .iter()
            .map(|&index| &self.definitions[index])
            .find(|def| def.qualified_name == written || def.qualified_name.ends_with(&suffix))
            .or_else(|| {
                if candidates.len() == 1 {
                    Some(&self.definitions[candidates[0]])
                } else {
                    None
                }
            })
    }

    /// Find a struct-like enum variant addressed as `Enum::Variant`
    pub fn lookup_variant(&self, ty: &TypeRef) -> Option<(&TypeDef, &VariantDef)> {
        if ty.segments.len() < 2 {
            return None;
        }
        let enum_ref = TypeRef {
            segments: ty.segments[..ty.segments.len() - 1].to_vec(),
            args: ty.args.clone(),
        };
        let def = self.lookup(&enum_ref)?;
        match &def.kind {
            TypeKind::Enum(enum_def) => enum_def
                .variants
                .iter()
                .find(|variant| variant.name == ty.name())
                .map(|variant| (def, variant)),
            TypeKind::Struct(_) => None,
        }
    }

    /// Hand-written `impl Serialize` of a type, if any
    pub fn custom_serializer(&self, qualified_name: &str) -> Option<CustomSerializer> {
        self.serializers.get(qualified_name).copied()
    }

    /// Find a function by name, optionally qualified with its declaring module or type
    /// (`get_item`, `handlers::get_item`, `ItemController::get_item`)
    pub fn find_function(&self, name: &str) -> Option<&FunctionDef> {
        match name.rsplit_once("::") {
            Some((owner, function)) => self.functions.iter().find(|f| {
                f.name == function
                    && (f.declaring == owner || f.declaring.ends_with(&format!("::{}", owner)))
            }),
            None => self.functions.iter().find(|f| f.name == name),
        }
    }

    /// Find the fields of a struct or struct variant by qualified name
    pub fn find_fields(&self, declaring: &str) -> Option<&StructDef> {
        if let Some(def) = self.find_by_qualified_name(declaring) {
            return match &def.kind {
                TypeKind::Struct(struct_def) => Some(struct_def),
                TypeKind::Enum(_) => None,
            };
        }

        let (enum_name, variant_name) = declaring.rsplit_once("::")?;
        match &self.find_by_qualified_name(enum_name)?.kind {
            TypeKind::Enum(enum_def) => enum_def
                .variants
                .iter()
                .find(|variant| variant.name == variant_name)
                .map(|variant| &variant.fields),
            TypeKind::Struct(_) => None,
        }
    }

    /// Find a single field of a struct or struct variant
    pub fn find_field(&self, declaring: &str, field: &str) -> Option<&FieldDef> {
        self.find_fields(declaring)?
            .fields
            .iter()
            .find(|f| f.name == field)
    }

    /// Parse a struct definition into a TypeDef
    fn parse_struct_definition(module_path: &str, item_struct: &syn::ItemStruct) -> TypeDef {
        let name = item_struct.ident.to_string();
        debug!("Parsing struct definition: {}", name);

        TypeDef {
            qualified_name: join_path(module_path, &name),
            name,
            generics: Self::generic_names(&item_struct.generics),
            container: Self::parse_container_attributes(&item_struct.attrs),
            kind: TypeKind::Struct(Self::parse_fields(&item_struct.fields)),
        }
    }

    /// Parse an enum definition into a TypeDef
    fn parse_enum_definition(module_path: &str, item_enum: &syn::ItemEnum) -> TypeDef {
        let name = item_enum.ident.to_string();
        debug!("Parsing enum definition: {}", name);

        let variants: Vec<VariantDef> = item_enum
            .variants
            .iter()
            .map(|variant| {
                let serde_args = attribute_args(&variant.attrs, "serde");
                VariantDef {
                    name: variant.ident.to_string(),
                    serde_attrs: Self::parse_serde_attributes(&variant.attrs),
                    rename_all: Self::rename_rule(&serde_args, "rename_all"),
                    fields: Self::parse_fields(&variant.fields),
                }
            })
            .collect();

        debug!("Parsed {} variants", variants.len());

        TypeDef {
            qualified_name: join_path(module_path, &name),
            name,
            generics: Self::generic_names(&item_enum.generics),
            container: Self::parse_container_attributes(&item_enum.attrs),
            kind: TypeKind::Enum(EnumDef { variants }),
        }
    }

    fn generic_names(generics: &syn::Generics) -> Vec<String> {
        generics
            .type_params()
            .map(|param| param.ident.to_string())
            .collect()
    }

    /// Parse struct or variant fields
    fn parse_fields(fields: &syn::Fields) -> StructDef {
        let style = match fields {
            syn::Fields::Named(_) => FieldStyle::Named,
            syn::Fields::Unnamed(_) => FieldStyle::Tuple,
            syn::Fields::Unit => FieldStyle::Unit,
        };

        let fields = fields
            .iter()
            .enumerate()
            .map(|(position, field)| Self::parse_field(position, field))
            .collect();

        StructDef { style, fields }
    }

    /// Parse a single field
    fn parse_field(position: usize, field: &syn::Field) -> FieldDef {
        let name = field
            .ident
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| position.to_string());

        let ty = TypeRef::from_syn(&field.ty);
        let not_expanded = doc_lines(&field.attrs)
            .iter()
            .any(|line| line.trim() == "@not_expanded");

        FieldDef {
            name,
            optional: ty.is_option(),
            ty,
            serde_attrs: Self::parse_serde_attributes(&field.attrs),
            validate: attribute_args(&field.attrs, "validate"),
            deprecated: deprecation_note(&field.attrs),
            not_expanded,
        }
    }

    /// Parse Serde attributes from field or variant attributes
    pub fn parse_serde_attributes(attrs: &[syn::Attribute]) -> SerdeAttributes {
        let args = attribute_args(attrs, "serde");

        SerdeAttributes {
            rename: Self::serialize_name(&args, "rename"),
            skip: has_arg(&args, "skip"),
            flatten: has_arg(&args, "flatten"),
            default: has_arg(&args, "default"),
            skip_serializing_if: has_arg(&args, "skip_serializing_if"),
            serialize_with: find_arg(&args, "serialize_with")
                .and_then(MetaArg::value)
                .map(ToString::to_string)
                .or_else(|| {
                    find_arg(&args, "with")
                        .and_then(MetaArg::value)
                        .map(|module| format!("{}::serialize", module))
                }),
        }
    }

    fn parse_container_attributes(attrs: &[syn::Attribute]) -> ContainerAttributes {
        let args = attribute_args(attrs, "serde");

        ContainerAttributes {
            rename_all: Self::rename_rule(&args, "rename_all"),
            rename_all_fields: Self::rename_rule(&args, "rename_all_fields"),
            tag: Self::serialize_name(&args, "tag"),
            content: Self::serialize_name(&args, "content"),
            untagged: has_arg(&args, "untagged"),
            transparent: has_arg(&args, "transparent"),
            into: find_arg(&args, "into")
                .and_then(MetaArg::value)
                .and_then(|target| TypeRef::parse(target).ok()),
            default: has_arg(&args, "default"),
        }
    }

    /// `name = "x"` or `name(serialize = "x", deserialize = "y")`
    fn serialize_name(args: &[MetaArg], name: &str) -> Option<String> {
        let arg = find_arg(args, name)?;
        arg.value()
            .or_else(|| arg.child_value("serialize"))
            .map(ToString::to_string)
    }

    fn rename_rule(args: &[MetaArg], name: &str) -> Option<RenameRule> {
        let rule = Self::serialize_name(args, name)?;
        let parsed = RenameRule::parse(&rule);
        if parsed.is_none() {
            warn!("Unknown serde rename rule: {}", rule);
        }
        parsed
    }

    /// Parse a primitive type name
    pub fn parse_primitive_type(type_name: &str) -> Option<PrimitiveType> {
        match type_name {
            "String" | "str" => Some(PrimitiveType::String),
            "i8" => Some(PrimitiveType::I8),
            "i16" => Some(PrimitiveType::I16),
            "i32" => Some(PrimitiveType::I32),
            "i64" => Some(PrimitiveType::I64),
            "i128" => Some(PrimitiveType::I128),
            "isize" => Some(PrimitiveType::Isize),
            "u8" => Some(PrimitiveType::U8),
            "u16" => Some(PrimitiveType::U16),
            "u32" => Some(PrimitiveType::U32),
            "u64" => Some(PrimitiveType::U64),
            "u128" => Some(PrimitiveType::U128),
            "usize" => Some(PrimitiveType::Usize),
            "f32" => Some(PrimitiveType::F32),
            "f64" => Some(PrimitiveType::F64),
            "bool" => Some(PrimitiveType::Bool),
            "char" => Some(PrimitiveType::Char),
            _ => None,
        }
    }
}

/// Finds the first serializer call in an `impl Serialize` body
struct FormatVisitor {
    format: Option<SerializeFormat>,
}

impl FormatVisitor {
    fn produces_string(expr: &syn::Expr) -> bool {
        match expr {
            syn::Expr::MethodCall(call) => call.method == "to_string",
            syn::Expr::Macro(mac) => mac.mac.path.is_ident("format"),
            syn::Expr::Reference(reference) => Self::produces_string(&reference.expr),
            syn::Expr::Paren(paren) => Self::produces_string(&paren.expr),
            _ => false,
        }
    }
}

impl<'ast> Visit<'ast> for FormatVisitor {
    fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
        if self.format.is_none() {
            let method = node.method.to_string();
            self.format = SerializeFormat::from_method(&method).or_else(|| {
                if method == "serialize" && Self::produces_string(&node.receiver) {
                    Some(SerializeFormat::String)
                } else {
                    None
                }
            });
        }

        syn::visit::visit_expr_method_call(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_resolver_from_code(code: &str) -> TypeResolver {
        let parsed = ParsedFile::from_source("models", code).unwrap();
        TypeResolver::new(vec![parsed])
    }

    fn struct_fields(def: &TypeDef) -> &[FieldDef] {
        match &def.kind {
            TypeKind::Struct(struct_def) => &struct_def.fields,
            TypeKind::Enum(_) => panic!("Expected struct type"),
        }
    }

    #[test]
    fn test_primitive_types() {
        assert_eq!(TypeResolver::parse_primitive_type("u64"), Some(PrimitiveType::U64));
        assert_eq!(TypeResolver::parse_primitive_type("str"), Some(PrimitiveType::String));
        assert_eq!(TypeResolver::parse_primitive_type("Item"), None);
        assert!(PrimitiveType::Usize.is_integer());
        assert!(!PrimitiveType::F64.is_integer());
        assert!(!PrimitiveType::Char.is_integer());
    }

    #[test]
    fn test_resolve_simple_struct() {
        let resolver = create_resolver_from_code(
            r#"
            pub struct User {
                pub id: u32,
                pub name: String,
                pub email: Option<String>,
            }
            "#,
        );

        let def = resolver.lookup(&TypeRef::new("User")).unwrap();
        assert_eq!(def.qualified_name, "models::User");

        let fields = struct_fields(def);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[0].ty, TypeRef::new("u32"));
        assert!(!fields[1].optional);
        assert!(fields[2].optional);
    }

    #[test]
    fn test_serde_field_attributes() {
        let resolver = create_resolver_from_code(
            r#"
            #[derive(Serialize)]
            pub struct User {
                #[serde(rename = "userName")]
                pub name: String,
                #[serde(skip)]
                pub password: String,
                #[serde(flatten)]
                pub metadata: Metadata,
                #[serde(default, skip_serializing_if = "Vec::is_empty")]
                pub tags: Vec<String>,
                #[serde(with = "rust_decimal::serde::float")]
                pub balance: Decimal,
            }
            "#,
        );

        let fields = struct_fields(resolver.lookup(&TypeRef::new("User")).unwrap());
        assert_eq!(fields[0].serde_attrs.rename, Some("userName".to_string()));
        assert!(fields[1].serde_attrs.skip);
        assert!(fields[2].serde_attrs.flatten);
        assert!(fields[3].serde_attrs.default);
        assert!(fields[3].serde_attrs.skip_serializing_if);
        assert_eq!(
            fields[4].serde_attrs.serialize_with.as_deref(),
            Some("rust_decimal::serde::float::serialize")
        );
    }

    #[test]
    fn test_container_attributes() {
        let resolver = create_resolver_from_code(
            r#"
            #[serde(tag = "kind", content = "data", rename_all = "snake_case")]
            pub enum Event { Created { id: u32 }, Deleted(u32) }

            #[serde(into = "String")]
            pub struct Money { amount: i64 }
            "#,
        );

        let event = resolver.lookup(&TypeRef::new("Event")).unwrap();
        assert_eq!(event.container.tag.as_deref(), Some("kind"));
        assert_eq!(event.container.content.as_deref(), Some("data"));
        assert_eq!(event.container.rename_all, Some(RenameRule::Snake));

        let money = resolver.lookup(&TypeRef::new("Money")).unwrap();
        assert_eq!(money.container.into, Some(TypeRef::new("String")));
    }

    #[test]
    fn test_validate_deprecated_and_doc_tags() {
        let resolver = create_resolver_from_code(
            r#"
            pub struct Item {
                #[validate(length(min = 1))]
                pub name: String,
                #[deprecated(note = "use name")]
                pub title: String,
                /// Raw attributes.
                /// @not_expanded
                pub attributes: Attributes,
            }
            "#,
        );

        let fields = struct_fields(resolver.lookup(&TypeRef::new("Item")).unwrap());
        assert_eq!(fields[0].validate.len(), 1);
        assert_eq!(fields[1].deprecated.as_deref(), Some("use name"));
        assert!(fields[2].not_expanded);
        assert!(!fields[0].not_expanded);
    }

    #[test]
    fn test_enum_variants_and_variant_lookup() {
        let resolver = create_resolver_from_code(
            r#"
            pub enum Shape {
                #[serde(rename = "circle")]
                Circle { radius: f64 },
                Square(SquareData),
                Empty,
            }
            "#,
        );

        let (def, variant) = resolver
            .lookup_variant(&TypeRef::new("Shape::Circle"))
            .unwrap();
        assert_eq!(def.qualified_name, "models::Shape");
        assert_eq!(variant.serde_attrs.rename.as_deref(), Some("circle"));
        assert_eq!(variant.fields.style, FieldStyle::Named);

        let fields = resolver.find_fields("models::Shape::Circle").unwrap();
        assert_eq!(fields.fields[0].name, "radius");
        assert!(resolver.find_field("models::Shape::Circle", "radius").is_some());
        assert!(resolver.find_fields("models::Shape").is_none());
    }

    #[test]
    fn test_generic_parameters() {
        let resolver = create_resolver_from_code(
            "pub struct Page<'a, T: Clone> { pub content: Vec<T>, pub label: &'a str }",
        );
        let def = resolver.lookup(&TypeRef::new("Page")).unwrap();
        assert_eq!(def.generics, vec!["T".to_string()]);
    }

    #[test]
    fn test_inline_modules_and_qualified_lookup() {
        let resolver = create_resolver_from_code(
            r#"
            pub struct Item { pub id: u32 }
            pub mod admin {
                pub struct Item { pub secret: String }
            }
            "#,
        );

        let admin = resolver
            .lookup(&TypeRef::parse("crate::models::admin::Item").unwrap())
            .unwrap();
        assert_eq!(admin.qualified_name, "models::admin::Item");

        let plain = resolver.lookup(&TypeRef::new("Item")).unwrap();
        assert_eq!(plain.qualified_name, "models::Item");

        assert!(resolver.lookup(&TypeRef::parse("other::Item").unwrap()).is_none());
    }

    #[test]
    fn test_custom_serializer_detection() {
        let resolver = create_resolver_from_code(
            r#"
            pub struct Money { amount: i64, currency: String }
            impl serde::Serialize for Money {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(&format!("{} {}", self.amount, self.currency))
                }
            }

            pub struct Percent(f64);
            impl Serialize for Percent {
                fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                    self.0.to_string().serialize(s)
                }
            }

            pub struct Secret;
            impl Serialize for Secret {
                fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                    helper(s)
                }
            }
            "#,
        );

        assert_eq!(
            resolver.custom_serializer("models::Money"),
            Some(CustomSerializer::Format(SerializeFormat::String))
        );
        assert_eq!(
            resolver.custom_serializer("models::Percent"),
            Some(CustomSerializer::Format(SerializeFormat::String))
        );
        assert_eq!(
            resolver.custom_serializer("models::Secret"),
            Some(CustomSerializer::Opaque)
        );
        assert_eq!(resolver.custom_serializer("models::Unknown"), None);
    }

    #[test]
    fn test_field_serializer_functions() {
        let resolver = create_resolver_from_code(
            r#"
            fn cents_as_string<S: Serializer>(value: &i64, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&format!("{}.{:02}", value / 100, value % 100))
            }

            mod epoch {
                pub fn serialize<S: Serializer>(value: &DateTime, s: S) -> Result<S::Ok, S::Error> {
                    s.serialize_i64(value.timestamp())
                }
            }

            fn passthrough<S: Serializer>(value: &Money, s: S) -> Result<S::Ok, S::Error> {
                helper(value, s)
            }
            "#,
        );

        assert_eq!(
            resolver.field_serializer("cents_as_string"),
            Some(CustomSerializer::Format(SerializeFormat::String))
        );
        assert_eq!(
            resolver.field_serializer("epoch::serialize"),
            Some(CustomSerializer::Format(SerializeFormat::Integer))
        );
        assert_eq!(
            resolver.field_serializer("passthrough"),
            Some(CustomSerializer::Opaque)
        );
        assert_eq!(resolver.field_serializer("chrono::serde::ts_seconds::serialize"), None);
    }

    #[test]
    fn test_functions_and_methods() {
        let resolver = create_resolver_from_code(
            r#"
            pub struct Item { name: String }
            impl Item {
                pub fn name(&self) -> &str { &self.name }
            }
            pub async fn get_item(id: u32) -> Item { todo!() }
            "#,
        );

        let getter = resolver.find_function("Item::name").unwrap();
        assert_eq!(getter.declaring, "models::Item");

        let handler = resolver.find_function("get_item").unwrap();
        assert_eq!(handler.declaring, "models");
        assert!(resolver.find_function("models::get_item").is_some());
        assert!(resolver.find_function("missing").is_none());
    }

    #[test]
    fn test_pattern_names() {
        let names = |code: &str| {
            let pat = syn::parse::Parser::parse_str(syn::Pat::parse_single, code).unwrap();
            pattern_names(&pat)
        };
        assert_eq!(names("id"), vec!["id"]);
        assert_eq!(names("Path(id)"), vec!["id"]);
        assert_eq!(names("Path((shop, item))"), vec!["shop", "item"]);
        assert_eq!(names("mut body"), vec!["body"]);
        assert!(names("_").is_empty());
    }

    #[test]
    fn test_crate_root_functions() {
        let parsed = ParsedFile::from_source("", "fn health() -> &'static str { \"ok\" }").unwrap();
        let resolver = TypeResolver::new(vec![parsed]);
        assert_eq!(resolver.find_function("health").unwrap().declaring, CRATE_ROOT);
    }
}
