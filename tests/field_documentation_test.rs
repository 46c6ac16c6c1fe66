use pretty_assertions::assert_eq;
use restdocs_from_source::{
    comment_resolver::{CommentResolver, SidecarCommentResolver},
    constraint::{ConstraintResolver, ValidatorConstraintReader},
    doclet::{write_sidecars, Doclet},
    field_descriptor::{optional_text, FieldTable},
    field_generator::{FieldDocumentationGenerator, FieldRecord},
    parser::{AstParser, ParsedFile},
    scanner::FileScanner,
    shape::{JsonType, SourceShapeResolver},
    snippet::SnippetAssembler,
    translation::TranslationResolver,
    type_ref::TypeRef,
    type_resolver::TypeResolver,
};
use std::collections::HashMap;
use tempfile::TempDir;

/// Helper function to create a temporary test project
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn shop_project() -> TempDir {
    create_test_project(vec![
        ("src/models.rs", include_str!("fixtures/shop/models.rs")),
        ("src/api/handlers.rs", include_str!("fixtures/shop/handlers.rs")),
    ])
}

fn load_types(project: &TempDir) -> TypeResolver {
    let scan_result = FileScanner::new(project.path().to_path_buf())
        .scan()
        .expect("Failed to scan directory");
    let parsed_files: Vec<ParsedFile> = AstParser::parse_files(&scan_result.files)
        .into_iter()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(parsed_files.len(), 2, "Should parse both fixture files");

    TypeResolver::new(parsed_files)
}

fn document_with(
    types: &TypeResolver,
    comments: &dyn CommentResolver,
    translations: &TranslationResolver,
    root: &str,
) -> Vec<FieldRecord> {
    let shapes = SourceShapeResolver::new(types);
    let reader = ValidatorConstraintReader::new(types);
    let generator = FieldDocumentationGenerator::new(
        &shapes,
        comments,
        ConstraintResolver::new(&reader, translations),
    );
    generator
        .generate_documentation(&TypeRef::parse(root).unwrap())
        .unwrap_or_else(|e| panic!("Failed to document {}: {}", root, e))
}

fn document(types: &TypeResolver, root: &str) -> Vec<FieldRecord> {
    let comments = Doclet::new(types).extract();
    document_with(types, &comments, &TranslationResolver::new(), root)
}

fn rows(records: &[FieldRecord]) -> Vec<(&str, &str, bool, &str)> {
    records
        .iter()
        .map(|r| {
            (
                r.path.as_str(),
                r.type_name.as_str(),
                r.optional,
                r.description.as_str(),
            )
        })
        .collect()
}

#[test]
fn test_scalar_fields_with_constraints() {
    let project = shop_project();
    let types = load_types(&project);

    let records = document(&types, "Scalars");

    assert_eq!(
        rows(&records),
        vec![
            ("stringField", "String", false, "A text."),
            ("booleanField", "Boolean", true, "A flag."),
            ("numberField1", "Integer", false, "A whole number."),
            ("numberField2", "Decimal", true, "A fraction."),
        ]
    );
    assert_eq!(records[0].json_type, JsonType::String);
    assert_eq!(records[3].json_type, JsonType::Number);
}

#[test]
fn test_five_levels_of_nesting() {
    let project = shop_project();
    let types = load_types(&project);

    let records = document(&types, "models::FirstLevel");

    assert_eq!(
        rows(&records),
        vec![
            ("second", "Object", true, "Second level."),
            ("second.third", "Array", false, "Third level entries."),
            ("second.third[].fourth", "Object", true, "Fourth level."),
            ("second.third[].fourth.fifth", "Array", true, "Fifth level entries."),
            ("second.third[].fourth.fifth[].last", "Integer", true, "The last value."),
        ]
    );
}

#[test]
fn test_item_fields() {
    let project = shop_project();
    let types = load_types(&project);

    let records = document(&types, "Item");

    assert_eq!(
        rows(&records),
        vec![
            ("id", "Integer", false, "Unique item id."),
            ("name", "String", false, "Display name."),
            ("price", "String", false, "Unit price."),
            (
                "category",
                "String",
                false,
                "Item category.\nMust be one of [BOOK, MUSIC, HOME_OFFICE]."
            ),
            ("tags", "Array", true, "Free-form labels."),
            ("reviews", "Array", false, "Customer reviews."),
            ("reviews[].rating", "Integer", false, "Rating from 1 to 5."),
            ("reviews[].text", "String", true, "Review text."),
            ("reviews[].replies", "Array", false, "Replies to this review."),
            ("createdAt", "String", false, "Creation timestamp."),
        ]
    );
}

#[test]
fn test_request_fields_with_defaults_and_groups() {
    let project = shop_project();
    let types = load_types(&project);
    let translations = TranslationResolver::new();

    let records = document(&types, "NewItem");

    assert_eq!(
        rows(&records),
        vec![
            (
                "name",
                "String",
                false,
                "Display name.\nSize must be between 1 and 80 inclusive."
            ),
            ("price_cents", "Integer", true, "Unit price in cents.\nMust be at least 1."),
            (
                "max_units",
                "Integer",
                true,
                "Maximum number of units per order.\nDefault value: 10."
            ),
            ("sku", "String", true, "Stock keeping unit."),
        ]
    );
    assert_eq!(
        optional_text(&records[3], &translations),
        "true\nfalse (groups: Create)"
    );
}

#[test]
fn test_polymorphic_payment() {
    let project = shop_project();
    let types = load_types(&project);

    let records = document(&types, "Payment");

    assert_eq!(
        rows(&records),
        vec![
            (
                "type",
                "String",
                false,
                "Must be one of [credit_card, bank_transfer]."
            ),
            ("holder", "String", false, "Card holder name."),
            (
                "last_digits",
                "String",
                false,
                "Last four digits.\nOnly for types: credit_card."
            ),
            (
                "iban",
                "String",
                false,
                "International bank account number.\nOnly for types: bank_transfer."
            ),
        ]
    );
}

#[test]
fn test_generation_is_deterministic() {
    let project = shop_project();
    let types = load_types(&project);

    let first = document(&types, "Page<Item>");
    let second = document(&types, "Page<Item>");
    assert_eq!(first, second);

    let paths: Vec<&str> = first.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths[0], "content");
    assert_eq!(paths[1], "content[].id");
    assert_eq!(paths.last(), Some(&"total"));
}

#[test]
fn test_sidecars_give_the_same_documentation() {
    let project = shop_project();
    let types = load_types(&project);
    let sidecar_dir = TempDir::new().unwrap();

    let index = Doclet::new(&types).extract();
    let written = write_sidecars(&index, sidecar_dir.path()).unwrap();
    assert_eq!(written, index.len());
    assert!(sidecar_dir.path().join("models/Item.json").exists());
    assert!(sidecar_dir.path().join("models/Payment.CreditCard.json").exists());
    assert!(sidecar_dir.path().join("api/handlers.json").exists());

    let sidecars = SidecarCommentResolver::new(sidecar_dir.path());
    let translations = TranslationResolver::new();
    for root in ["Item", "NewItem", "Payment", "Page<Item>"] {
        assert_eq!(
            document_with(&types, &sidecars, &translations, root),
            document(&types, root),
            "documentation of {} from sidecars",
            root
        );
    }
}

#[test]
fn test_missing_comments_leave_descriptions_empty() {
    let project = shop_project();
    let types = load_types(&project);
    let empty = TempDir::new().unwrap();

    let records = document_with(
        &types,
        &SidecarCommentResolver::new(empty.path()),
        &TranslationResolver::new(),
        "NewItem",
    );

    assert_eq!(records[0].description, "Size must be between 1 and 80 inclusive.");
    assert_eq!(records[3].description, "");
}

#[test]
fn test_translation_overrides() {
    let project = shop_project();
    let types = load_types(&project);
    let comments = Doclet::new(&types).extract();
    let translations = TranslationResolver::new().with_overrides(HashMap::from([
        ("length.min_max".to_string(), "Zwischen {min} und {max} Zeichen".to_string()),
        ("table.no_fields".to_string(), "Keine Felder.".to_string()),
    ]));

    let records = document_with(&types, &comments, &translations, "NewItem");
    assert_eq!(records[0].description, "Display name.\nZwischen 1 und 80 Zeichen.");

    let empty = FieldTable::from_records(&[], &translations);
    assert_eq!(empty.to_text(), "Keine Felder.");
}

#[test]
fn test_configured_serializer_overrides_source() {
    let project = shop_project();
    let types = load_types(&project);
    let comments = Doclet::new(&types).extract();
    let shapes = SourceShapeResolver::new(&types).with_custom_serializer("Review", JsonType::String);
    let reader = ValidatorConstraintReader::new(&types);
    let translations = TranslationResolver::new();
    let generator = FieldDocumentationGenerator::new(
        &shapes,
        &comments,
        ConstraintResolver::new(&reader, &translations),
    );

    let records = generator
        .generate_documentation(&TypeRef::new("Item"))
        .unwrap();
    let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
    assert!(paths.contains(&"reviews"));
    assert!(!paths.iter().any(|p| p.starts_with("reviews[]")));
}

#[test]
fn test_endpoints_across_files() {
    let project = shop_project();
    let types = load_types(&project);
    let comments = Doclet::new(&types).extract();
    let shapes = SourceShapeResolver::new(&types);
    let reader = ValidatorConstraintReader::new(&types);
    let translations = TranslationResolver::new();
    let assembler = SnippetAssembler::new(
        &types,
        FieldDocumentationGenerator::new(
            &shapes,
            &comments,
            ConstraintResolver::new(&reader, &translations),
        ),
    );

    let get_item = assembler.document_handler("handlers::get_item").unwrap();
    assert_eq!(get_item.handler, "api::handlers::get_item");
    assert_eq!(get_item.title, "Get an item");
    assert_eq!(get_item.description, "Returns one item.");
    assert_eq!(
        get_item.path_parameters.rows[0].description,
        "Id of the item.\nMust be at least 1."
    );
    assert_eq!(get_item.response_fields.rows.len(), 10);

    let list_items = assembler.document_handler("list_items").unwrap();
    assert_eq!(list_items.title, "List items");
    let query: Vec<&str> = list_items
        .query_parameters
        .rows
        .iter()
        .map(|r| r.path.as_str())
        .collect();
    assert_eq!(query, vec!["page", "tag"]);
    assert_eq!(list_items.response_fields.rows[0].path, "content");

    let create_item = assembler.document_handler("create_item").unwrap();
    assert_eq!(create_item.request_fields.rows.len(), 4);
    assert_eq!(create_item.response_fields.rows[0].path, "id");

    let delete_item = assembler.document_handler("delete_item").unwrap();
    assert!(!delete_item.response_fields.has_content);
    assert!(!delete_item.request_fields.has_content);
    assert_eq!(delete_item.path_parameters.rows[0].description, "");

    assert!(assembler.document_handler("update_item").is_err());
}
