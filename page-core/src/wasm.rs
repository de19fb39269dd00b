//! WebAssembly bindings for page-core.
//!
//! Exposes the interpreted capability surface as JSON-string functions, so a
//! JavaScript host can load this module as its acceleration layer, plus a
//! [`WasmEditor`] wrapping an editing session.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::component::ComponentUpdate;
use crate::layout::{Bounds, Position};
use crate::mapping::{DataMapping, TransformRule};
use crate::{
    data, layout, mapping, schema, tree, Component, ComponentId, EditorConfig, EditorSession,
    ProjectData,
};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

/// Check whether text parses as JSON.
#[wasm_bindgen(js_name = validateJson)]
#[must_use]
pub fn validate_json(text: &str) -> bool {
    data::validate_json(text)
}

/// Re-indent JSON.
///
/// # Errors
///
/// Returns an error string if the input is not JSON.
#[wasm_bindgen(js_name = formatJson)]
pub fn format_json(text: &str, indent: usize) -> Result<String, String> {
    data::format_json(text, indent).map_err(|e| e.to_string())
}

/// Minify JSON.
///
/// # Errors
///
/// Returns an error string if the input is not JSON.
#[wasm_bindgen(js_name = minifyJson)]
pub fn minify_json(text: &str) -> Result<String, String> {
    data::minify_json(text).map_err(|e| e.to_string())
}

/// Parse CSV into a JSON array of objects.
///
/// # Errors
///
/// Returns an error string for unreadable CSV.
#[wasm_bindgen(js_name = parseCsv)]
pub fn parse_csv(text: &str) -> Result<String, String> {
    to_json(&data::parse_csv(text).map_err(|e| e.to_string())?)
}

/// Parse XML into a JSON object.
///
/// # Errors
///
/// Returns an error string for malformed XML.
#[wasm_bindgen(js_name = parseXml)]
pub fn parse_xml(text: &str) -> Result<String, String> {
    to_json(&data::parse_xml(text).map_err(|e| e.to_string())?)
}

/// Convert project JSON to schema JSON.
///
/// # Errors
///
/// Returns an error string if the project does not decode.
#[wasm_bindgen(js_name = serializeSchema)]
pub fn serialize_schema(project_json: &str) -> Result<String, String> {
    let project: ProjectData = from_json(project_json)?;
    schema::project_to_schema_json(&project, schema::SCHEMA_VERSION).map_err(|e| e.to_string())
}

/// Convert schema JSON to project JSON.
///
/// # Errors
///
/// Returns an error string for unparseable or malformed schemas.
#[wasm_bindgen(js_name = deserializeSchema)]
pub fn deserialize_schema(schema_json: &str) -> Result<String, String> {
    let project = schema::schema_json_to_project(schema_json).map_err(|e| e.to_string())?;
    to_json(&project)
}

/// Validate schema JSON, returning `{valid, errors}` as JSON.
///
/// # Errors
///
/// Returns an error string if the report cannot be encoded.
#[wasm_bindgen(js_name = validateSchema)]
pub fn validate_schema(schema_json: &str) -> Result<String, String> {
    to_json(&schema::validate_schema_json(schema_json))
}

/// Migrate and restamp schema JSON.
///
/// # Errors
///
/// Returns an error string for unrecognized documents.
#[wasm_bindgen(js_name = migrateSchema)]
pub fn migrate_schema(
    schema_json: &str,
    from_version: &str,
    to_version: &str,
) -> Result<String, String> {
    schema::migrate_version(schema_json, from_version, to_version).map_err(|e| e.to_string())
}

/// Derive mapping rules from source and target JSON.
///
/// # Errors
///
/// Returns an error string if either input is not JSON.
#[wasm_bindgen(js_name = generateMapping)]
pub fn generate_mapping(source_json: &str, target_json: &str) -> Result<String, String> {
    let source = from_json(source_json)?;
    let target = from_json(target_json)?;
    to_json(&mapping::generate_mapping(&source, &target))
}

/// Apply mapping rules to data.
///
/// # Errors
///
/// Returns an error string for malformed inputs or unwritable paths.
#[wasm_bindgen(js_name = applyMapping)]
pub fn apply_mapping(data_json: &str, mappings_json: &str) -> Result<String, String> {
    let data = from_json(data_json)?;
    let mappings: Vec<DataMapping> = from_json(mappings_json)?;
    to_json(&mapping::apply_mapping(&data, &mappings).map_err(|e| e.to_string())?)
}

/// Coerce a value according to a rule.
///
/// # Errors
///
/// Returns an error string for malformed inputs.
#[wasm_bindgen(js_name = transformData)]
pub fn transform_data(data_json: &str, rule_json: &str) -> Result<String, String> {
    let data = from_json(data_json)?;
    let rule: TransformRule = from_json(rule_json)?;
    to_json(&mapping::transform_data(&data, &rule))
}

/// Responsive layout pass over a JSON component array.
///
/// # Errors
///
/// Returns an error string if the components do not decode.
#[wasm_bindgen(js_name = calculateLayout)]
pub fn calculate_layout(components_json: &str, viewport_width: f64) -> Result<String, String> {
    let components: Vec<Component> = from_json(components_json)?;
    to_json(&tree::calculate_layout(&components, viewport_width))
}

/// Snap a point to the grid, returning `{x, y}` JSON.
///
/// # Errors
///
/// Returns an error string for a non-positive grid size.
#[wasm_bindgen(js_name = snapToGrid)]
pub fn snap_to_grid(x: f64, y: f64, grid_size: f64) -> Result<String, String> {
    if grid_size.is_nan() || grid_size <= 0.0 {
        return Err(format!("grid size must be positive, got {grid_size}"));
    }
    to_json(&layout::snap_to_grid(x, y, grid_size))
}

/// Test two JSON components for bounding-box overlap.
///
/// # Errors
///
/// Returns an error string if either component does not decode.
#[wasm_bindgen(js_name = detectCollision)]
pub fn detect_collision(a_json: &str, b_json: &str) -> Result<bool, String> {
    let a: Component = from_json(a_json)?;
    let b: Component = from_json(b_json)?;
    let (a, b): (Bounds, Bounds) = (a.bounds(), b.bounds());
    Ok(layout::detect_collision(&a, &b))
}

/// Editing session for JavaScript hosts.
#[wasm_bindgen]
pub struct WasmEditor {
    session: EditorSession,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create an editor on an empty project.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            session: EditorSession::new(name, EditorConfig::default()),
        }
    }

    /// Current components as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if the components cannot be encoded.
    #[wasm_bindgen(js_name = getComponentsJson)]
    pub fn get_components_json(&self) -> Result<String, String> {
        to_json(self.session.components())
    }

    /// Add a component, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error string for invalid positions or parents.
    #[wasm_bindgen(js_name = addComponent)]
    pub fn add_component(
        &mut self,
        kind: &str,
        x: f64,
        y: f64,
        parent_id: Option<String>,
    ) -> Result<String, String> {
        let position = Position::new(x, y).map_err(|e| e.to_string())?;
        self.session
            .add_component(kind, Some(position), parent_id.as_deref())
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    /// Apply an `{id, updates}` JSON pair.
    ///
    /// # Errors
    ///
    /// Returns an error string if the update does not decode.
    #[wasm_bindgen(js_name = applyUpdate)]
    pub fn apply_update(&mut self, update_json: &str) -> Result<(), String> {
        let update: ComponentUpdate = from_json(update_json)?;
        self.session.apply_update(&update);
        Ok(())
    }

    /// Delete a component and its descendants.
    #[wasm_bindgen(js_name = deleteComponent)]
    pub fn delete_component(&mut self, id: &str) {
        self.session.delete_component(id);
    }

    /// Group components given as a JSON id array, returning the group id.
    ///
    /// # Errors
    ///
    /// Returns an error string when fewer than two ids exist.
    #[wasm_bindgen(js_name = groupComponents)]
    pub fn group_components(&mut self, ids_json: &str, name: &str) -> Result<String, String> {
        let ids: Vec<ComponentId> = from_json(ids_json)?;
        self.session
            .group(&ids, name)
            .map(|id| id.to_string())
            .map_err(|e| e.to_string())
    }

    /// Undo the last mutation.
    pub fn undo(&mut self) {
        self.session.undo();
    }

    /// Redo the last undone mutation.
    pub fn redo(&mut self) {
        self.session.redo();
    }

    /// Whether an undo step exists.
    #[wasm_bindgen(js_name = canUndo)]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    /// Whether a redo step exists.
    #[wasm_bindgen(js_name = canRedo)]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    /// Export the document as schema JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string if encoding fails.
    #[wasm_bindgen(js_name = exportProject)]
    pub fn export_project(&self) -> Result<String, String> {
        self.session.export_project().map_err(|e| e.to_string())
    }

    /// Replace the document with an imported one.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the document is refused.
    #[wasm_bindgen(js_name = importProject)]
    pub fn import_project(&mut self, text: &str) -> Result<(), String> {
        self.session.import_project(text).map_err(|e| e.to_string())
    }
}

impl Default for WasmEditor {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_add_and_undo() {
        let mut editor = WasmEditor::default();
        let id = editor.add_component("row", 0.0, 0.0, None).expect("add");
        assert!(editor.get_components_json().expect("json").contains(&id));
        assert!(editor.can_undo());
        editor.undo();
        assert_eq!(editor.get_components_json().expect("json"), "[]");
        assert!(editor.can_redo());
    }

    #[test]
    fn test_editor_rejects_negative_position() {
        let mut editor = WasmEditor::default();
        assert!(editor.add_component("row", -5.0, 0.0, None).is_err());
    }

    #[test]
    fn test_snap_to_grid_json() {
        assert_eq!(snap_to_grid(23.0, 38.0, 10.0).expect("snap"), r#"{"x":20.0,"y":40.0}"#);
        assert!(snap_to_grid(1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_validate_schema_json_report() {
        let report = validate_schema("{}").expect("report");
        assert!(report.contains(r#""valid":false"#));
    }

    #[test]
    fn test_detect_collision_json() {
        let a = r#"{"id":"a","type":"box","position":{"x":0,"y":0}}"#;
        let b = r#"{"id":"b","type":"box","position":{"x":50,"y":50}}"#;
        assert_eq!(detect_collision(a, b), Ok(true));
    }
}
