//! Schema Integration Tests
//!
//! Tests the interchange format end to end:
//! - Project -> schema -> project preserves every field but the id
//! - Import classification of foreign input
//! - Legacy documents and older versions are brought up to date

use page_core::schema::{self, from_schema, import_document, to_schema};
use page_core::{
    create_component, DataSource, DataSourceType, Position, ProjectData, SchemaError,
    SCHEMA_VERSION,
};
use serde_json::json;

/// A project with nested components, a theme and a data source.
fn rich_project() -> ProjectData {
    let mut project = ProjectData::new("Shop front");
    project.description = Some("Spring campaign".to_string());
    project.theme = json!({ "primaryColor": "#0055ff", "textColor": "#111111" });

    let card = create_component(
        "card-group",
        Some(Position::new(40.0, 80.0).expect("position")),
        None,
        Some(&project.theme),
    );
    let mut price = create_component("text", None, Some(card.id.clone()), Some(&project.theme));
    price.data_source = Some("products".to_string());
    project.components = vec![card, price];

    project.data_sources.push(DataSource {
        id: "products".to_string(),
        name: "Products".to_string(),
        kind: DataSourceType::Api,
        data: json!([{ "sku": "A1", "price": 9.5 }]),
        config: Some(json!({ "url": "https://shop.example/api/products" })),
        status: Some("ready".to_string()),
        error: None,
    });
    project.canvas.show_grid = true;
    project.canvas.viewport_width = 768.0;
    project
}

// ============================================================================
// Round Trip Tests
// ============================================================================

#[test]
fn test_round_trip_preserves_all_but_id() {
    let project = rich_project();
    let back = from_schema(&to_schema(&project, SCHEMA_VERSION));

    assert_eq!(back.name, project.name);
    assert_eq!(back.description, project.description);
    assert_eq!(back.created_at, project.created_at);
    assert_eq!(back.updated_at, project.updated_at);
    assert_eq!(back.components, project.components);
    assert_eq!(back.canvas, project.canvas);
    assert_eq!(back.theme, project.theme);
    assert_eq!(back.data_sources, project.data_sources);
    assert_eq!(back.settings, project.settings);
}

#[test]
fn test_round_trip_through_text() {
    let project = rich_project();
    let json = schema::project_to_schema_json(&project, SCHEMA_VERSION).expect("encode");
    assert!(json.starts_with("{\n  \""));

    let report = schema::validate_schema_json(&json);
    assert!(report.valid, "{:?}", report.errors);

    let back = schema::schema_json_to_project(&json).expect("decode");
    assert_eq!(back.components, project.components);
    assert_eq!(back.data_sources, project.data_sources);
}

// ============================================================================
// Import Tests
// ============================================================================

#[test]
fn test_import_classifies_failures() {
    assert!(matches!(
        import_document("<html>"),
        Err(SchemaError::NotJson(_))
    ));
    assert!(matches!(
        import_document(r#"{"hello": "world"}"#),
        Err(SchemaError::Unrecognized { .. })
    ));

    let missing_canvas = json!({
        "version": "1.0.0",
        "metadata": { "name": "Broken", "version": "1.0.0" },
        "components": [],
        "theme": {},
        "dataSources": []
    });
    match import_document(&missing_canvas.to_string()) {
        Err(SchemaError::Invalid { errors, .. }) => {
            assert!(errors.iter().any(|e| e.contains("canvas")));
        }
        other => panic!("expected Invalid, got {other:?}"),
    }

    let mut future = to_schema(&rich_project(), "9.0.0");
    future.metadata.version = "9.0.0".to_string();
    let future_json = schema::serialize_schema(&future, false).expect("encode");
    assert!(matches!(
        import_document(&future_json),
        Err(SchemaError::UnsupportedVersion { .. })
    ));
}

#[test]
fn test_import_legacy_project_document() {
    let legacy = json!({
        "id": "old-1",
        "name": "Old page",
        "createdAt": "2023-01-01T00:00:00.000Z",
        "updatedAt": "2023-01-02T00:00:00.000Z",
        "components": [
            { "id": "c1", "type": "container", "name": "Box", "position": { "x": 0, "y": 0 } }
        ],
        "canvas": {
            "showGrid": false, "snapToGrid": false,
            "viewportWidth": 1920, "activeDevice": "desktop"
        },
        "theme": {},
        "dataSources": []
    });
    let schema = import_document(&legacy.to_string()).expect("legacy import");
    assert_eq!(schema.version, SCHEMA_VERSION);
    assert_eq!(schema.metadata.name, "Old page");
    assert_eq!(schema.components.len(), 1);
}

#[test]
fn test_import_older_version_is_restamped() {
    let mut old = to_schema(&rich_project(), "0.9.0");
    old.metadata.version = "0.9.0".to_string();
    let json = schema::serialize_schema(&old, true).expect("encode");

    let schema = import_document(&json).expect("import");
    assert_eq!(schema.version, SCHEMA_VERSION);
    assert_eq!(schema.metadata.version, SCHEMA_VERSION);
    assert_eq!(schema.components, old.components);
}

#[test]
fn test_import_rejects_dangling_parent() {
    let mut project = rich_project();
    project.components.retain(|c| c.kind != "card-group");
    let json = schema::project_to_schema_json(&project, SCHEMA_VERSION).expect("encode");
    assert!(matches!(import_document(&json), Err(SchemaError::Tree(_))));
}
