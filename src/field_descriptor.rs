//! Turns field records into display rows.
//!
//! Descriptions are assembled from independent parts in a fixed order: deprecation notice,
//! comment, constraint messages, default value and the variants a field belongs to. Each
//! part becomes one capitalised, dot-terminated line.

use crate::error::{Error, Result};
use crate::field_generator::FieldRecord;
use crate::translation::TranslationResolver;
use serde::{Deserialize, Serialize};

/// The textual parts collected for one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldText {
    /// Deprecation note; `Some("")` when deprecated without a note
    pub deprecation: Option<String>,
    pub comment: String,
    pub constraints: Vec<String>,
    pub default_value: Option<String>,
    /// Serialized names of the variants declaring the field, empty when all do
    pub only_for_types: Vec<String>,
}

/// Build the description text of a field
pub fn describe(text: &FieldText, translations: &TranslationResolver) -> String {
    let mut parts = Vec::new();

    if let Some(note) = &text.deprecation {
        let mut line = translations.translate("description.deprecated", &[]);
        let note = sentence(note);
        if !note.is_empty() {
            line.push(' ');
            line.push_str(&note);
        }
        parts.push(line);
    }

    parts.push(sentence(&text.comment));
    parts.extend(text.constraints.iter().map(|c| sentence(c)));

    if let Some(value) = &text.default_value {
        parts.push(sentence(
            &translations.translate("description.default_value", &[("value", value.as_str())]),
        ));
    }

    if !text.only_for_types.is_empty() {
        let types = text.only_for_types.join(", ");
        parts.push(sentence(
            &translations.translate("description.only_for_types", &[("types", types.as_str())]),
        ));
    }

    parts.retain(|part| !part.is_empty());
    parts.join("\n")
}

/// Capitalise and dot-terminate
fn sentence(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut result: String = first.to_uppercase().chain(chars).collect();
    if !result.ends_with(['.', '!', '?']) {
        result.push('.');
    }
    result
}

/// Optional column text: `true`/`false`, plus one line per validation group that makes an
/// otherwise optional field required
pub fn optional_text(record: &FieldRecord, translations: &TranslationResolver) -> String {
    let mut lines = vec![record.optional.to_string()];

    if record.optional {
        lines.extend(record.required_in_groups.iter().map(|group| {
            translations.translate("optional.groups", &[("optional", "false"), ("groups", group.as_str())])
        }));
    }

    lines.join("\n")
}

/// One row of a field table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptorRow {
    pub path: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub optional: String,
    pub description: String,
}

impl FieldDescriptorRow {
    pub fn from_record(record: &FieldRecord, translations: &TranslationResolver) -> Self {
        Self {
            path: record.path.clone(),
            type_name: record.type_name.clone(),
            optional: optional_text(record, translations),
            description: record.description.clone(),
        }
    }
}

/// Ordered rows plus the placeholder shown when there are none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTable {
    pub rows: Vec<FieldDescriptorRow>,
    pub has_content: bool,
    pub no_content_message: String,
}

impl FieldTable {
    pub fn from_records(records: &[FieldRecord], translations: &TranslationResolver) -> Self {
        let rows: Vec<FieldDescriptorRow> = records
            .iter()
            .map(|record| FieldDescriptorRow::from_record(record, translations))
            .collect();

        Self {
            has_content: !rows.is_empty(),
            rows,
            no_content_message: translations.translate("table.no_fields", &[]),
        }
    }

    /// Plain-text rendering, one row per line
    pub fn to_text(&self) -> String {
        if !self.has_content {
            return self.no_content_message.clone();
        }

        self.rows
            .iter()
            .map(|row| {
                format!(
                    "{} | {} | {} | {}",
                    row.path,
                    row.type_name,
                    row.optional.replace('\n', ", "),
                    row.description.replace('\n', " ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Fail with every path whose description is blank
pub fn assert_documented(records: &[FieldRecord]) -> Result<()> {
    let undocumented: Vec<String> = records
        .iter()
        .filter(|record| record.description.trim().is_empty())
        .map(|record| record.path.clone())
        .collect();

    if undocumented.is_empty() {
        Ok(())
    } else {
        Err(Error::UndocumentedFields(undocumented))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::JsonType;
    use pretty_assertions::assert_eq;

    fn record(path: &str, optional: bool, description: &str) -> FieldRecord {
        FieldRecord {
            path: path.to_string(),
            json_type: JsonType::String,
            type_name: "String".to_string(),
            optional,
            required_in_groups: Vec::new(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_describe_order_and_formatting() {
        let text = FieldText {
            deprecation: Some("use label instead".to_string()),
            comment: "the item name".to_string(),
            constraints: vec!["Size must be at most 20".to_string()],
            default_value: Some("unnamed".to_string()),
            only_for_types: vec!["book".to_string(), "dvd".to_string()],
        };

        assert_eq!(
            describe(&text, &TranslationResolver::new()),
            "Deprecated. Use label instead.\nThe item name.\nSize must be at most 20.\nDefault value: unnamed.\nOnly for types: book, dvd."
        );
    }

    #[test]
    fn test_describe_skips_empty_parts() {
        let translations = TranslationResolver::new();
        assert_eq!(describe(&FieldText::default(), &translations), "");

        let deprecated = FieldText {
            deprecation: Some(String::new()),
            comment: "Is it?".to_string(),
            ..FieldText::default()
        };
        assert_eq!(describe(&deprecated, &translations), "Deprecated.\nIs it?");
    }

    #[test]
    fn test_optional_text_with_groups() {
        let translations = TranslationResolver::new();
        let mut field = record("name", true, "");
        assert_eq!(optional_text(&field, &translations), "true");

        field.required_in_groups = vec!["Create".to_string(), "Update".to_string()];
        assert_eq!(
            optional_text(&field, &translations),
            "true\nfalse (groups: Create)\nfalse (groups: Update)"
        );

        field.optional = false;
        assert_eq!(optional_text(&field, &translations), "false");
    }

    #[test]
    fn test_table_rows_and_sentinel() {
        let translations = TranslationResolver::new();

        let table = FieldTable::from_records(&[record("id", false, "The id.")], &translations);
        assert!(table.has_content);
        assert_eq!(table.rows[0].optional, "false");
        assert_eq!(table.to_text(), "id | String | false | The id.");

        let empty = FieldTable::from_records(&[], &translations);
        assert!(!empty.has_content);
        assert!(empty.rows.is_empty());
        assert_eq!(empty.to_text(), "No fields.");
    }

    #[test]
    fn test_assert_documented() {
        assert!(assert_documented(&[record("id", false, "The id.")]).is_ok());

        let err = assert_documented(&[
            record("id", false, "The id."),
            record("name", false, " "),
            record("tags[]", true, ""),
        ])
        .unwrap_err();
        match err {
            Error::UndocumentedFields(paths) => assert_eq!(paths, vec!["name", "tags[]"]),
            other => panic!("Unexpected error: {}", other),
        }
    }
}
