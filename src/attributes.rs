//! Helpers for reading attribute arguments from the syntax tree.
//!
//! `#[serde(...)]`, `#[validate(...)]` and friends all share the nested-meta grammar
//! `name`, `name = expr` and `name(...)`. [`MetaArg`] captures that grammar as a small
//! tree so callers can inspect it without writing a `syn` parser per attribute.

use log::debug;
use quote::ToTokens;

/// One argument inside an attribute list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaArg {
    /// A bare flag, e.g. `skip` or `email`
    Flag(String),
    /// A name-value pair, e.g. `rename = "userName"` (the value is unquoted)
    Value(String, String),
    /// A nested list, e.g. `length(min = 1, max = 20)`
    List(String, Vec<MetaArg>),
}

impl MetaArg {
    pub fn name(&self) -> &str {
        match self {
            MetaArg::Flag(name) | MetaArg::Value(name, _) | MetaArg::List(name, _) => name,
        }
    }

    /// The value of a name-value argument
    pub fn value(&self) -> Option<&str> {
        match self {
            MetaArg::Value(_, value) => Some(value),
            _ => None,
        }
    }

    /// Nested arguments of a list argument, empty for other kinds
    pub fn children(&self) -> &[MetaArg] {
        match self {
            MetaArg::List(_, children) => children,
            _ => &[],
        }
    }

    /// Value of the nested argument `name` inside a list argument
    pub fn child_value(&self, name: &str) -> Option<&str> {
        find_arg(self.children(), name).and_then(MetaArg::value)
    }
}

/// Find an argument by name
pub fn find_arg<'a>(args: &'a [MetaArg], name: &str) -> Option<&'a MetaArg> {
    args.iter().find(|arg| arg.name() == name)
}

/// Whether a flag or any argument called `name` is present
pub fn has_arg(args: &[MetaArg], name: &str) -> bool {
    find_arg(args, name).is_some()
}

/// Collect the arguments of every attribute called `ident` (e.g. all `#[serde(...)]`)
pub fn attribute_args(attrs: &[syn::Attribute], ident: &str) -> Vec<MetaArg> {
    let mut args = Vec::new();

    for attr in attrs {
        if !attr.path().is_ident(ident) {
            continue;
        }
        if !matches!(attr.meta, syn::Meta::List(_)) {
            continue;
        }

        let result = attr.parse_nested_meta(|meta| {
            args.push(collect_meta(&meta)?);
            Ok(())
        });

        if let Err(e) = result {
            debug!("Ignoring unparsable #[{}] arguments: {}", ident, e);
        }
    }

    args
}

fn collect_meta(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<MetaArg> {
    let name = meta
        .path
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
        .unwrap_or_default();

    if meta.input.peek(syn::Token![=]) {
        let expr: syn::Expr = meta.value()?.parse()?;
        Ok(MetaArg::Value(name, expr_to_string(&expr)))
    } else if meta.input.peek(syn::token::Paren) {
        let mut children = Vec::new();
        meta.parse_nested_meta(|inner| {
            children.push(collect_meta(&inner)?);
            Ok(())
        })?;
        Ok(MetaArg::List(name, children))
    } else {
        Ok(MetaArg::Flag(name))
    }
}

/// Render an attribute value: literals lose their quotes, other expressions keep their tokens
pub fn expr_to_string(expr: &syn::Expr) -> String {
    match expr {
        syn::Expr::Lit(lit) => match &lit.lit {
            syn::Lit::Str(s) => s.value(),
            syn::Lit::Int(i) => i.base10_digits().to_string(),
            syn::Lit::Float(f) => f.base10_digits().to_string(),
            syn::Lit::Bool(b) => b.value.to_string(),
            other => other.to_token_stream().to_string(),
        },
        syn::Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => {
            format!("-{}", expr_to_string(&unary.expr))
        }
        other => other.to_token_stream().to_string(),
    }
}

/// The `///` lines of an item, with the single leading space rustdoc adds removed
pub fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(name_value) => match &name_value.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|text| {
            if text.trim().is_empty() {
                return vec![String::new()];
            }
            text.lines()
                .map(|line| line.strip_prefix(' ').unwrap_or(line).trim_end().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// `#[deprecated]`, `#[deprecated = "..."]` or `#[deprecated(note = "...")]`.
///
/// Returns `Some("")` for a deprecation without a note.
pub fn deprecation_note(attrs: &[syn::Attribute]) -> Option<String> {
    let attr = attrs.iter().find(|attr| attr.path().is_ident("deprecated"))?;

    match &attr.meta {
        syn::Meta::Path(_) => Some(String::new()),
        syn::Meta::NameValue(name_value) => Some(expr_to_string(&name_value.value)),
        syn::Meta::List(_) => {
            let args = attribute_args(std::slice::from_ref(attr), "deprecated");
            Some(
                find_arg(&args, "note")
                    .and_then(MetaArg::value)
                    .unwrap_or_default()
                    .to_string(),
            )
        }
    }
}

/// Serde's `rename_all` rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    pub fn parse(rule: &str) -> Option<Self> {
        match rule {
            "lowercase" => Some(RenameRule::Lower),
            "UPPERCASE" => Some(RenameRule::Upper),
            "PascalCase" => Some(RenameRule::Pascal),
            "camelCase" => Some(RenameRule::Camel),
            "snake_case" => Some(RenameRule::Snake),
            "SCREAMING_SNAKE_CASE" => Some(RenameRule::ScreamingSnake),
            "kebab-case" => Some(RenameRule::Kebab),
            "SCREAMING-KEBAB-CASE" => Some(RenameRule::ScreamingKebab),
            _ => None,
        }
    }

    /// Apply to a `snake_case` field name
    pub fn apply_to_field(&self, field: &str) -> String {
        match self {
            RenameRule::Lower | RenameRule::Snake => field.to_string(),
            RenameRule::Upper | RenameRule::ScreamingSnake => field.to_ascii_uppercase(),
            RenameRule::Pascal => {
                let mut pascal = String::new();
                let mut capitalize = true;
                for ch in field.chars() {
                    if ch == '_' {
                        capitalize = true;
                    } else if capitalize {
                        pascal.push(ch.to_ascii_uppercase());
                        capitalize = false;
                    } else {
                        pascal.push(ch);
                    }
                }
                pascal
            }
            RenameRule::Camel => {
                let pascal = RenameRule::Pascal.apply_to_field(field);
                lower_first(&pascal)
            }
            RenameRule::Kebab => field.replace('_', "-"),
            RenameRule::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
        }
    }

    /// Apply to a `PascalCase` variant name
    pub fn apply_to_variant(&self, variant: &str) -> String {
        match self {
            RenameRule::Pascal => variant.to_string(),
            RenameRule::Lower => variant.to_ascii_lowercase(),
            RenameRule::Upper => variant.to_ascii_uppercase(),
            RenameRule::Camel => lower_first(variant),
            RenameRule::Snake => {
                let mut snake = String::new();
                for (i, ch) in variant.char_indices() {
                    if i > 0 && ch.is_uppercase() {
                        snake.push('_');
                    }
                    snake.push(ch.to_ascii_lowercase());
                }
                snake
            }
            RenameRule::ScreamingSnake => RenameRule::Snake
                .apply_to_variant(variant)
                .to_ascii_uppercase(),
            RenameRule::Kebab => RenameRule::Snake.apply_to_variant(variant).replace('_', "-"),
            RenameRule::ScreamingKebab => RenameRule::ScreamingSnake
                .apply_to_variant(variant)
                .replace('_', "-"),
        }
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
