//! Schema versioning and persistence.
//!
//! Converts between [`ProjectData`] and the versioned [`PageSchema`], checks
//! candidate documents structurally, and migrates legacy or older documents
//! into the current format.

use std::cmp::Ordering;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{project_id, PageSchema, ProjectData, SchemaMetadata};
use crate::error::{SchemaError, SchemaResult};
use crate::tree::ComponentTree;

/// Current interchange format version.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Outcome of a detailed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the document is a valid page schema.
    pub valid: bool,
    /// Every violation found, in field order.
    pub errors: Vec<String>,
}

/// Wrap a project into the versioned envelope.
#[must_use]
pub fn to_schema(project: &ProjectData, version: &str) -> PageSchema {
    PageSchema {
        version: version.to_string(),
        metadata: SchemaMetadata {
            name: project.name.clone(),
            description: project.description.clone(),
            created_at: project.created_at.clone(),
            updated_at: project.updated_at.clone(),
            version: SCHEMA_VERSION.to_string(),
        },
        components: project.components.clone(),
        canvas: project.canvas.clone(),
        theme: project.theme.clone(),
        data_sources: project.data_sources.clone(),
        settings: project.settings.clone(),
    }
}

/// Unwrap a schema into a live project.
///
/// The project id is derived from the name and the current time, so two
/// conversions of the same schema get different ids. A null theme becomes
/// `{}` and missing settings take the editor defaults.
#[must_use]
pub fn from_schema(schema: &PageSchema) -> ProjectData {
    ProjectData {
        id: project_id(&schema.metadata.name),
        name: schema.metadata.name.clone(),
        description: schema.metadata.description.clone(),
        created_at: schema.metadata.created_at.clone(),
        updated_at: schema.metadata.updated_at.clone(),
        components: schema.components.clone(),
        canvas: schema.canvas.clone(),
        theme: if schema.theme.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            schema.theme.clone()
        },
        data_sources: schema.data_sources.clone(),
        settings: Some(schema.settings.clone().unwrap_or_default()),
    }
}

/// Structural type guard for page schemas. Any violation rejects the whole
/// document.
#[must_use]
pub fn validate(candidate: &Value) -> bool {
    validate_detailed(candidate).is_empty()
}

/// Collect every structural violation of a candidate page schema.
#[must_use]
pub fn validate_detailed(candidate: &Value) -> Vec<String> {
    let Some(obj) = candidate.as_object() else {
        return vec!["Schema must be an object".to_string()];
    };
    let mut errors = Vec::new();

    if !obj
        .get("version")
        .and_then(Value::as_str)
        .is_some_and(|v| !v.is_empty())
    {
        errors.push("Missing or invalid 'version' field".to_string());
    }

    match obj.get("metadata").and_then(Value::as_object) {
        None => errors.push("Missing or invalid 'metadata' field".to_string()),
        Some(metadata) => {
            if !metadata
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|n| !n.is_empty())
            {
                errors.push("Missing or invalid 'metadata.name' field".to_string());
            }
            if !metadata.get("version").is_some_and(Value::is_string) {
                errors.push("Missing or invalid 'metadata.version' field".to_string());
            }
        }
    }

    if !obj.get("components").is_some_and(Value::is_array) {
        errors.push("Missing or invalid 'components' field (must be an array)".to_string());
    }

    match obj.get("canvas").and_then(Value::as_object) {
        None => errors.push("Missing or invalid 'canvas' field".to_string()),
        Some(canvas) => {
            let checks: [(&str, fn(&Value) -> bool); 4] = [
                ("showGrid", Value::is_boolean),
                ("snapToGrid", Value::is_boolean),
                ("viewportWidth", Value::is_number),
                ("activeDevice", Value::is_string),
            ];
            for (field, check) in checks {
                if !canvas.get(field).is_some_and(check) {
                    errors.push(format!("Missing or invalid 'canvas.{field}' field"));
                }
            }
        }
    }

    if !obj.get("theme").is_some_and(|t| !t.is_null()) {
        errors.push("Missing 'theme' field".to_string());
    }

    if !obj.get("dataSources").is_some_and(Value::is_array) {
        errors.push("Missing or invalid 'dataSources' field (must be an array)".to_string());
    }

    errors
}

/// Validate a JSON text, reporting parse failures as a single error.
#[must_use]
pub fn validate_schema_json(json: &str) -> ValidationReport {
    let errors = match serde_json::from_str::<Value>(json) {
        Ok(value) => validate_detailed(&value),
        Err(e) => vec![format!("Invalid JSON: {e}")],
    };
    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// Bring a candidate document into the current schema shape.
///
/// Valid schemas are returned as-is. Documents that look like a legacy live
/// project (`components` array, `canvas`, string `name`) are wrapped with
/// [`to_schema`].
///
/// # Errors
///
/// Returns [`SchemaError::Unrecognized`] for any other shape, and
/// [`SchemaError::Invalid`] if a recognized document has malformed fields.
pub fn migrate(candidate: Value) -> SchemaResult<PageSchema> {
    if validate(&candidate) {
        return decode(candidate);
    }
    if looks_like_project(&candidate) {
        tracing::info!("Migrating legacy project document to schema {SCHEMA_VERSION}");
        let project: ProjectData = decode(candidate)?;
        return Ok(to_schema(&project, SCHEMA_VERSION));
    }
    Err(SchemaError::Unrecognized {
        message: "Unable to recognize schema format".to_string(),
        document: candidate,
    })
}

/// Whether a candidate needs migrating to reach `target_version`.
///
/// Anything that fails validation needs migration.
#[must_use]
pub fn needs_migration(candidate: &Value, target_version: &str) -> bool {
    if !validate(candidate) {
        return true;
    }
    candidate.get("version").and_then(Value::as_str) != Some(target_version)
}

/// Migrate a JSON document and restamp it with `to_version`.
///
/// # Errors
///
/// Returns [`SchemaError::NotJson`] for unparseable input and any error from
/// [`migrate`].
pub fn migrate_version(json: &str, from_version: &str, to_version: &str) -> SchemaResult<String> {
    let candidate = parse(json)?;
    let mut schema = migrate(candidate)?;
    tracing::debug!("Restamping schema {from_version} -> {to_version}");
    schema.version = to_version.to_string();
    schema.metadata.version = to_version.to_string();
    serialize_schema(&schema, true)
}

/// Encode a schema as JSON, pretty-printed with two-space indentation when
/// `pretty` is set.
///
/// # Errors
///
/// Returns [`SchemaError::Encode`] if encoding fails.
pub fn serialize_schema(schema: &PageSchema, pretty: bool) -> SchemaResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(schema)?
    } else {
        serde_json::to_string(schema)?
    };
    Ok(json)
}

/// Decode a schema from JSON.
///
/// # Errors
///
/// Returns [`SchemaError::NotJson`] for unparseable input and
/// [`SchemaError::Invalid`] if the fields do not decode.
pub fn deserialize_schema(json: &str) -> SchemaResult<PageSchema> {
    decode(parse(json)?)
}

/// Convert a project straight to schema JSON.
///
/// # Errors
///
/// Returns [`SchemaError::Encode`] if encoding fails.
pub fn project_to_schema_json(project: &ProjectData, version: &str) -> SchemaResult<String> {
    serialize_schema(&to_schema(project, version), true)
}

/// Convert schema JSON straight to a project.
///
/// # Errors
///
/// See [`deserialize_schema`].
pub fn schema_json_to_project(json: &str) -> SchemaResult<ProjectData> {
    deserialize_schema(json).map(|schema| from_schema(&schema))
}

/// Import a user-supplied document.
///
/// Distinguishes text that is not JSON, JSON that is not a recognized
/// document, recognized documents that are malformed, and documents written
/// by a newer format version. Older versions are migrated to
/// [`SCHEMA_VERSION`]. The component tree must satisfy the tree invariants.
///
/// # Errors
///
/// Returns the matching [`SchemaError`] variant; nothing is partially
/// imported.
pub fn import_document(text: &str) -> SchemaResult<PageSchema> {
    let candidate = parse(text)?;

    let schema = if candidate.get("version").is_some() || candidate.get("metadata").is_some() {
        if let Some(found) = candidate.get("version").and_then(Value::as_str) {
            if compare_versions(found, SCHEMA_VERSION) == Ordering::Greater {
                return Err(SchemaError::UnsupportedVersion {
                    found: found.to_string(),
                    supported: SCHEMA_VERSION.to_string(),
                });
            }
        }
        let errors = validate_detailed(&candidate);
        if !errors.is_empty() {
            return Err(SchemaError::Invalid {
                errors,
                document: candidate,
            });
        }
        let mut schema: PageSchema = decode(candidate)?;
        if schema.version != SCHEMA_VERSION {
            tracing::info!(
                "Migrating schema from version {} to {SCHEMA_VERSION}",
                schema.version
            );
            schema.version = SCHEMA_VERSION.to_string();
            schema.metadata.version = SCHEMA_VERSION.to_string();
        }
        schema
    } else {
        migrate(candidate)?
    };

    ComponentTree::from_components(schema.components.clone())
        .map_err(|e| SchemaError::Tree(e.to_string()))?;
    tracing::info!(
        "Imported document '{}' with {} components",
        schema.metadata.name,
        schema.components.len()
    );
    Ok(schema)
}

/// Import a document and unwrap it into a live project.
///
/// # Errors
///
/// See [`import_document`].
pub fn import_project(text: &str) -> SchemaResult<ProjectData> {
    import_document(text).map(|schema| from_schema(&schema))
}

/// Compare dotted numeric versions. Missing or non-numeric parts count as 0.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parts = |v: &str| -> Vec<u64> {
        v.trim_start_matches('v')
            .split('.')
            .map(|p| p.parse().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parts(a), parts(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let ordering = a
            .get(i)
            .copied()
            .unwrap_or(0)
            .cmp(&b.get(i).copied().unwrap_or(0));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn looks_like_project(candidate: &Value) -> bool {
    candidate.get("components").is_some_and(Value::is_array)
        && candidate.get("canvas").is_some_and(|c| !c.is_null())
        && candidate.get("name").is_some_and(Value::is_string)
}

fn parse(text: &str) -> SchemaResult<Value> {
    serde_json::from_str(text).map_err(|e| SchemaError::NotJson(e.to_string()))
}

fn decode<T: DeserializeOwned>(document: Value) -> SchemaResult<T> {
    T::deserialize(&document).map_err(|e| SchemaError::Invalid {
        errors: vec![e.to_string()],
        document,
    })
}

impl From<&ProjectData> for PageSchema {
    fn from(project: &ProjectData) -> Self {
        to_schema(project, SCHEMA_VERSION)
    }
}

impl From<&PageSchema> for ProjectData {
    fn from(schema: &PageSchema) -> Self {
        from_schema(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::layout::Position;
    use serde_json::json;

    fn valid_schema() -> Value {
        json!({
            "version": "1.0.0",
            "metadata": {
                "name": "Landing",
                "createdAt": "2024-01-01T00:00:00.000Z",
                "updatedAt": "2024-01-01T00:00:00.000Z",
                "version": "1.0.0"
            },
            "components": [
                { "id": "c-1", "type": "container", "name": "Box", "position": { "x": 0, "y": 0 } },
                { "id": "t-1", "type": "text", "name": "Title", "parentId": "c-1" }
            ],
            "canvas": {
                "showGrid": true, "snapToGrid": false,
                "viewportWidth": 1920, "activeDevice": "desktop"
            },
            "theme": { "textColor": "#111111" },
            "dataSources": []
        })
    }

    #[test]
    fn test_validate_accepts_complete_document() {
        assert!(validate(&valid_schema()));
        assert!(!needs_migration(&valid_schema(), SCHEMA_VERSION));
        assert!(needs_migration(&valid_schema(), "2.0.0"));
    }

    #[test]
    fn test_validate_rejects_missing_viewport_width() {
        let mut doc = valid_schema();
        doc["canvas"]
            .as_object_mut()
            .expect("canvas object")
            .remove("viewportWidth");
        assert!(!validate(&doc));
        assert_eq!(
            validate_detailed(&doc),
            vec!["Missing or invalid 'canvas.viewportWidth' field".to_string()]
        );
    }

    #[test]
    fn test_validate_rejects_null_theme() {
        let mut doc = valid_schema();
        doc["theme"] = Value::Null;
        assert_eq!(validate_detailed(&doc), vec!["Missing 'theme' field".to_string()]);
    }

    #[test]
    fn test_validate_schema_json_reports_parse_error() {
        let report = validate_schema_json("{ not json");
        assert!(!report.valid);
        assert!(report.errors[0].starts_with("Invalid JSON:"));

        let report = validate_schema_json("42");
        assert_eq!(report.errors, vec!["Schema must be an object".to_string()]);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let mut project = ProjectData::new("Round Trip");
        project.components.push(
            Component::new("b-1", "button").with_position(Position::new(4.0, 8.0).expect("valid")),
        );
        project.theme = json!({ "primary": "#ff0000" });

        let back = from_schema(&to_schema(&project, SCHEMA_VERSION));
        assert_eq!(back.components, project.components);
        assert_eq!(back.canvas, project.canvas);
        assert_eq!(back.theme, project.theme);
        assert_eq!(back.data_sources, project.data_sources);
        assert_eq!(back.name, project.name);
    }

    #[test]
    fn test_migrate_legacy_project() {
        let legacy = json!({
            "name": "Old project",
            "createdAt": "2023-05-01T00:00:00.000Z",
            "updatedAt": "2023-05-01T00:00:00.000Z",
            "components": [],
            "canvas": {
                "showGrid": false, "snapToGrid": true,
                "viewportWidth": 1024, "activeDevice": "tablet"
            },
            "theme": {},
            "dataSources": []
        });
        let schema = migrate(legacy).expect("migrate");
        assert_eq!(schema.version, SCHEMA_VERSION);
        assert_eq!(schema.metadata.name, "Old project");
        assert!(schema.canvas.snap_to_grid);
    }

    #[test]
    fn test_migrate_unrecognized() {
        let result = migrate(json!({ "hello": "world" }));
        assert!(matches!(result, Err(SchemaError::Unrecognized { .. })));
    }

    #[test]
    fn test_migrate_version_restamps() {
        let json = serde_json::to_string(&valid_schema()).expect("encode");
        let migrated = migrate_version(&json, "1.0.0", "1.1.0").expect("migrate");
        let value: Value = serde_json::from_str(&migrated).expect("json");
        assert_eq!(value["version"], json!("1.1.0"));
        assert_eq!(value["metadata"]["version"], json!("1.1.0"));
    }

    #[test]
    fn test_schema_json_to_project_defaults_settings() {
        let json = serde_json::to_string(&valid_schema()).expect("encode");
        let project = schema_json_to_project(&json).expect("project");
        assert!(project.id.starts_with("landing-"));
        assert_eq!(project.settings, Some(crate::document::ProjectSettings::default()));
        assert_eq!(project.components.len(), 2);
    }

    #[test]
    fn test_import_classifies_failures() {
        assert!(matches!(import_document("<html>"), Err(SchemaError::NotJson(_))));
        assert!(matches!(
            import_document("[1, 2, 3]"),
            Err(SchemaError::Unrecognized { .. })
        ));

        let mut partial = valid_schema();
        partial.as_object_mut().expect("object").remove("dataSources");
        let text = serde_json::to_string(&partial).expect("encode");
        assert!(matches!(import_document(&text), Err(SchemaError::Invalid { .. })));

        let mut newer = valid_schema();
        newer["version"] = json!("2.0.0");
        let text = serde_json::to_string(&newer).expect("encode");
        assert!(matches!(
            import_document(&text),
            Err(SchemaError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_import_restamps_older_version() {
        let mut older = valid_schema();
        older["version"] = json!("0.9.0");
        older["metadata"]["version"] = json!("0.9.0");
        let text = serde_json::to_string(&older).expect("encode");
        let schema = import_document(&text).expect("import");
        assert_eq!(schema.version, SCHEMA_VERSION);
        assert_eq!(schema.metadata.version, SCHEMA_VERSION);
    }

    #[test]
    fn test_import_rejects_cyclic_tree() {
        let mut doc = valid_schema();
        doc["components"] = json!([
            { "id": "a", "type": "row", "parentId": "b" },
            { "id": "b", "type": "row", "parentId": "a" }
        ]);
        let text = serde_json::to_string(&doc).expect("encode");
        assert!(matches!(import_document(&text), Err(SchemaError::Tree(_))));
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("0.9.9", "1.0.0"), Ordering::Less);
    }
}
