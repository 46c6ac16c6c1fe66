//! REST Docs from Source - API field documentation from Rust web projects.
//!
//! Documents the fields of request and response payloads by reading the project's source
//! code: type definitions and serde attributes decide the serialized shape, doc comments
//! supply descriptions, and `#[validate(...)]` attributes supply constraints and
//! requiredness.
//!
//! # Architecture
//!
//! 1. [`scanner`] and [`parser`] - find and parse the project's Rust files
//! 2. [`type_resolver`] - index types, custom serializers and functions by qualified name
//! 3. [`shape`] - the serialized shape of a type ([`shape::ShapeResolver`])
//! 4. [`doclet`] and [`comment_resolver`] - doc comments, in memory or as JSON sidecars
//! 5. [`constraint`] and [`translation`] - validation rules and their messages
//! 6. [`field_generator`] - depth-first walk producing [`field_generator::FieldRecord`]s
//! 7. [`field_descriptor`] - descriptions, optional text and table rows
//! 8. [`handler`] and [`snippet`] - per-endpoint tables from handler signatures
//! 9. [`serializer`] - JSON and YAML output
//!
//! # Example Usage
//!
//! ```no_run
//! use restdocs_from_source::{
//!     constraint::{ConstraintResolver, ValidatorConstraintReader},
//!     doclet::Doclet,
//!     field_generator::FieldDocumentationGenerator,
//!     parser::AstParser,
//!     scanner::FileScanner,
//!     shape::SourceShapeResolver,
//!     translation::TranslationResolver,
//!     type_ref::TypeRef,
//!     type_resolver::TypeResolver,
//! };
//! use std::path::PathBuf;
//!
//! let scan_result = FileScanner::new(PathBuf::from("./my-project")).scan().unwrap();
//! let parsed_files: Vec<_> = AstParser::parse_files(&scan_result.files)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//!
//! let types = TypeResolver::new(parsed_files);
//! let comments = Doclet::new(&types).extract();
//! let shapes = SourceShapeResolver::new(&types);
//! let reader = ValidatorConstraintReader::new(&types);
//! let translations = TranslationResolver::new();
//!
//! let generator = FieldDocumentationGenerator::new(
//!     &shapes,
//!     &comments,
//!     ConstraintResolver::new(&reader, &translations),
//! );
//! for record in generator.generate_documentation(&TypeRef::new("Item")).unwrap() {
//!     println!("{} {} {}", record.path, record.type_name, record.description);
//! }
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod attributes;
pub mod cli;
pub mod comment_resolver;
pub mod config;
pub mod constraint;
pub mod doclet;
pub mod error;
pub mod field_descriptor;
pub mod field_generator;
pub mod handler;
pub mod parser;
pub mod scanner;
pub mod serializer;
pub mod shape;
pub mod snippet;
pub mod translation;
pub mod type_ref;
pub mod type_resolver;
