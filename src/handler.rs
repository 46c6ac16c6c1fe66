//! Handler signatures.
//!
//! Reads the request and response payload types of an axum or actix-web handler from its
//! signature: `Path`, `Query`, `Json` and `Form` extractors on the way in, `Json<T>` (possibly
//! inside `Result` or a tuple) on the way out.

use crate::type_ref::{TypeRef, OPAQUE_SEGMENT};
use crate::type_resolver::{pattern_names, FunctionDef};
use log::debug;

/// Response types that never carry a JSON body
const NON_JSON_RESPONSES: &[&str] = &[
    "StatusCode",
    "Response",
    "HttpResponse",
    "Html",
    "Redirect",
    "Sse",
    "Bytes",
    "NamedFile",
];

/// One value bound by a `Path` extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathBinding {
    /// Parameter name as bound in the pattern
    pub name: String,
    pub ty: TypeRef,
}

/// Payload types of a handler function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSignature {
    /// Qualified module or type declaring the handler
    pub declaring: String,
    pub name: String,
    pub path: Vec<PathBinding>,
    pub query: Option<TypeRef>,
    pub request_body: Option<TypeRef>,
    pub response_body: Option<TypeRef>,
}

impl HandlerSignature {
    pub fn from_function(function: &FunctionDef) -> Self {
        Self::from_signature(&function.declaring, &function.signature)
    }

    /// Parse extractors and the response type from a function signature
    pub fn from_signature(declaring: &str, signature: &syn::Signature) -> Self {
        let mut handler = Self {
            declaring: declaring.to_string(),
            name: signature.ident.to_string(),
            path: Vec::new(),
            query: None,
            request_body: None,
            response_body: None,
        };

        for input in &signature.inputs {
            let syn::FnArg::Typed(pat_type) = input else {
                continue;
            };

            let ty = TypeRef::from_syn(&pat_type.ty);
            let Some(inner) = ty.first_arg().cloned() else {
                continue;
            };

            match ty.name() {
                "Path" => handler.path.extend(path_bindings(&pat_type.pat, &inner)),
                "Query" => handler.query = Some(inner),
                "Json" | "Form" => handler.request_body = Some(inner),
                other => debug!("Ignoring extractor {} of {}", other, handler.name),
            }
        }

        handler.response_body = match &signature.output {
            syn::ReturnType::Default => None,
            syn::ReturnType::Type(_, ty) => response_type(&TypeRef::from_syn(ty)),
        };

        debug!(
            "Handler {}::{}: {} path bindings, query {:?}, body {:?}, response {:?}",
            handler.declaring,
            handler.name,
            handler.path.len(),
            handler.query.as_ref().map(ToString::to_string),
            handler.request_body.as_ref().map(ToString::to_string),
            handler.response_body.as_ref().map(ToString::to_string)
        );
        handler
    }
}

/// `Path(id): Path<u32>`, `Path((a, b)): Path<(u32, String)>` or `Path(p): Path<ItemPath>`
fn path_bindings(pat: &syn::Pat, inner: &TypeRef) -> Vec<PathBinding> {
    let bound = match pat {
        syn::Pat::TupleStruct(tuple_struct) if tuple_struct.elems.len() == 1 => {
            &tuple_struct.elems[0]
        }
        other => other,
    };
    let names = pattern_names(bound);

    if inner.is_tuple() {
        return inner
            .args
            .iter()
            .enumerate()
            .map(|(index, ty)| PathBinding {
                name: names.get(index).cloned().unwrap_or_else(|| index.to_string()),
                ty: ty.clone(),
            })
            .collect();
    }

    vec![PathBinding {
        name: names.into_iter().next().unwrap_or_else(|| "path".to_string()),
        ty: inner.clone(),
    }]
}

/// The JSON body type of a handler's return type
fn response_type(ty: &TypeRef) -> Option<TypeRef> {
    match ty.name() {
        OPAQUE_SEGMENT => None,
        "Json" => ty.first_arg().cloned(),
        "Result" => ty.first_arg().and_then(response_type),
        "Option" => ty.first_arg().and_then(response_type),
        name if NON_JSON_RESPONSES.contains(&name) => None,
        _ if ty.is_tuple() => ty
            .args
            .iter()
            .find(|arg| arg.name() == "Json")
            .and_then(|json| json.first_arg().cloned()),
        _ => Some(ty.clone()),
    }
}
