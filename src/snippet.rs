//! Endpoint documentation.
//!
//! Assembles the field tables of one handler: path parameters, query parameters, request
//! fields and response fields, together with the handler's title and description.

use crate::error::{Error, Result};
use crate::field_descriptor::{assert_documented, describe, FieldTable, FieldText};
use crate::field_generator::{FieldDocumentationGenerator, FieldRecord};
use crate::handler::{HandlerSignature, PathBinding};
use crate::shape::Shape;
use crate::type_ref::TypeRef;
use crate::type_resolver::TypeResolver;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Documentation of one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDocumentation {
    /// Qualified handler name, e.g. `api::items::get_item`
    pub handler: String,
    pub title: String,
    pub description: String,
    pub path_parameters: FieldTable,
    pub query_parameters: FieldTable,
    pub request_fields: FieldTable,
    pub response_fields: FieldTable,
}

impl EndpointDocumentation {
    /// Plain-text rendering with one section per table
    pub fn to_text(&self) -> String {
        let mut sections = vec![self.title.clone()];
        if !self.description.is_empty() {
            sections.push(self.description.clone());
        }

        for (heading, table) in [
            ("Path parameters", &self.path_parameters),
            ("Query parameters", &self.query_parameters),
            ("Request fields", &self.request_fields),
            ("Response fields", &self.response_fields),
        ] {
            sections.push(format!("{}\n{}", heading, table.to_text()));
        }

        sections.join("\n\n")
    }
}

/// Builds [`EndpointDocumentation`] for handler functions
pub struct SnippetAssembler<'a> {
    types: &'a TypeResolver,
    generator: FieldDocumentationGenerator<'a>,
    strict: bool,
}

impl<'a> SnippetAssembler<'a> {
    pub fn new(types: &'a TypeResolver, generator: FieldDocumentationGenerator<'a>) -> Self {
        Self {
            types,
            generator,
            strict: false,
        }
    }

    /// Fail on fields without any description
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Document the handler `name` (`get_item` or `items::get_item`)
    pub fn document_handler(&self, name: &str) -> Result<EndpointDocumentation> {
        let function = self
            .types
            .find_function(name)
            .ok_or_else(|| Error::HandlerNotFound(name.to_string()))?;
        let handler = HandlerSignature::from_function(function);
        info!("Documenting handler {}::{}", handler.declaring, handler.name);

        let comments = self.generator.comments();
        let mut title = comments.resolve_method_tag(&handler.declaring, &handler.name, "title");
        if title.is_empty() {
            title = humanize(&handler.name);
        }
        let description = comments.resolve_method_comment(&handler.declaring, &handler.name);

        let path = self.path_parameters(&handler)?;
        let query = self.payload(handler.query.as_ref())?;
        let request = self.payload(handler.request_body.as_ref())?;
        let response = self.payload(handler.response_body.as_ref())?;

        if self.strict {
            for records in [&path, &query, &request, &response] {
                assert_documented(records)?;
            }
        }

        let translations = self.generator.constraints().translations();
        Ok(EndpointDocumentation {
            handler: format!("{}::{}", handler.declaring, handler.name),
            title,
            description,
            path_parameters: FieldTable::from_records(&path, translations),
            query_parameters: FieldTable::from_records(&query, translations),
            request_fields: FieldTable::from_records(&request, translations),
            response_fields: FieldTable::from_records(&response, translations),
        })
    }

    fn payload(&self, ty: Option<&TypeRef>) -> Result<Vec<FieldRecord>> {
        match ty {
            Some(ty) => self.generator.generate_documentation(ty),
            None => Ok(Vec::new()),
        }
    }

    /// Struct bindings contribute their fields, scalar bindings one record each
    fn path_parameters(&self, handler: &HandlerSignature) -> Result<Vec<FieldRecord>> {
        let mut records = Vec::new();

        for binding in &handler.path {
            let shape = self.generator.resolve_shape(&binding.ty)?;
            match shape {
                Shape::Object(_) | Shape::Polymorphic(_) => {
                    records.extend(self.generator.generate_documentation(&binding.ty)?);
                }
                scalar => records.push(self.scalar_parameter(handler, binding, &scalar)),
            }
        }

        debug!("{} path parameters for {}", records.len(), handler.name);
        Ok(records)
    }

    fn scalar_parameter(
        &self,
        handler: &HandlerSignature,
        binding: &PathBinding,
        shape: &Shape,
    ) -> FieldRecord {
        let comment = self.generator.comments().resolve_method_parameter_comment(
            &handler.declaring,
            &handler.name,
            &binding.name,
        );
        let constraints = self.generator.constraints().parameter_constraints(
            &handler.declaring,
            &handler.name,
            &binding.name,
        );

        let text = FieldText {
            comment,
            constraints: constraints.messages,
            ..FieldText::default()
        };
        let (json_type, type_name) = shape.kind();
        FieldRecord {
            path: binding.name.clone(),
            json_type,
            type_name,
            optional: binding.ty.is_option() && !constraints.mandatory,
            required_in_groups: constraints.required_in_groups,
            description: describe(&text, self.generator.constraints().translations()),
        }
    }
}

/// `get_item` -> `Get item`
pub fn humanize(name: &str) -> String {
    let words = name.replace('_', " ");
    let mut chars = words.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintResolver, ValidatorConstraintReader};
    use crate::doclet::Doclet;
    use crate::parser::ParsedFile;
    use crate::shape::SourceShapeResolver;
    use crate::translation::TranslationResolver;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"
        pub struct Item {
            /// Item id.
            pub id: u32,
            /// Display name.
            pub name: String,
        }

        pub struct NewItem {
            /// Display name.
            #[validate(length(min = 1, max = 50))]
            pub name: String,
        }

        pub struct ReviewPath {
            /// Item the review belongs to.
            pub item_id: u32,
            /// Review number.
            pub review: u32,
        }

        /// Returns one item.
        ///
        /// # Arguments
        ///
        /// * `id` - Id of the item
        ///
        /// @title Fetch an item
        pub async fn get_item(#[validate(range(min = 1))] Path(id): Path<u32>) -> Json<Item> {
            todo!()
        }

        pub async fn create_item(Json(body): Json<NewItem>) -> Result<(StatusCode, Json<Item>), ApiError> {
            todo!()
        }

        pub async fn get_review(Path(path): Path<ReviewPath>) -> StatusCode {
            todo!()
        }

        pub async fn list_items() -> Json<Vec<Item>> {
            todo!()
        }
    "#;

    fn document(name: &str, strict: bool) -> Result<EndpointDocumentation> {
        let parsed = ParsedFile::from_source("handlers", SOURCE).unwrap();
        let types = TypeResolver::new(vec![parsed]);
        let docs = Doclet::new(&types).extract();
        let shapes = SourceShapeResolver::new(&types);
        let reader = ValidatorConstraintReader::new(&types);
        let translations = TranslationResolver::new();
        let generator = FieldDocumentationGenerator::new(
            &shapes,
            &docs,
            ConstraintResolver::new(&reader, &translations),
        );
        SnippetAssembler::new(&types, generator)
            .strict(strict)
            .document_handler(name)
    }

    fn paths(table: &FieldTable) -> Vec<&str> {
        table.rows.iter().map(|r| r.path.as_str()).collect()
    }

    #[test]
    fn test_scalar_path_parameter_and_response() {
        let doc = document("get_item", false).unwrap();

        assert_eq!(doc.handler, "handlers::get_item");
        assert_eq!(doc.title, "Fetch an item");
        assert_eq!(doc.description, "Returns one item.");

        let id = &doc.path_parameters.rows[0];
        assert_eq!(id.path, "id");
        assert_eq!(id.type_name, "Integer");
        assert_eq!(id.optional, "false");
        assert_eq!(id.description, "Id of the item.\nMust be at least 1.");

        assert!(!doc.query_parameters.has_content);
        assert!(!doc.request_fields.has_content);
        assert_eq!(paths(&doc.response_fields), vec!["id", "name"]);
    }

    #[test]
    fn test_request_body_and_tuple_response() {
        let doc = document("handlers::create_item", false).unwrap();

        assert_eq!(doc.title, "Create item");
        assert_eq!(doc.description, "");
        assert_eq!(paths(&doc.request_fields), vec!["name"]);
        assert_eq!(
            doc.request_fields.rows[0].description,
            "Display name.\nSize must be between 1 and 50 inclusive."
        );
        assert_eq!(paths(&doc.response_fields), vec!["id", "name"]);
        assert!(!doc.path_parameters.has_content);
        assert_eq!(doc.path_parameters.no_content_message, "No fields.");
    }

    #[test]
    fn test_struct_path_parameters() {
        let doc = document("get_review", false).unwrap();

        assert_eq!(paths(&doc.path_parameters), vec!["item_id", "review"]);
        assert_eq!(
            doc.path_parameters.rows[0].description,
            "Item the review belongs to."
        );
        assert!(!doc.response_fields.has_content);
    }

    #[test]
    fn test_collection_response() {
        let doc = document("list_items", false).unwrap();
        assert_eq!(paths(&doc.response_fields), vec!["[].id", "[].name"]);
    }

    #[test]
    fn test_strict_mode_and_unknown_handler() {
        assert!(document("get_item", true).is_ok());

        match document("missing", false).unwrap_err() {
            Error::HandlerNotFound(name) => assert_eq!(name, "missing"),
            other => panic!("Unexpected error: {}", other),
        }
    }

    #[test]
    fn test_text_rendering() {
        let text = document("list_items", false).unwrap().to_text();
        assert!(text.starts_with("List items\n\nPath parameters\nNo fields."));
        assert!(text.ends_with("Response fields\n[].id | Integer | false | Item id.\n[].name | String | false | Display name."));
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("get_item"), "Get item");
        assert_eq!(humanize("list"), "List");
        assert_eq!(humanize(""), "");
    }
}
