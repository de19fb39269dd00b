//! Document shapes: the live [`ProjectData`] and the exchanged [`PageSchema`].
//!
//! The two carry the same fields; `PageSchema` adds the `version`/`metadata`
//! envelope. Component lists accept either `children` form on input and are
//! always normalized to the flat `parentId` form.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::Component;
use crate::config::DEFAULT_BASE_WIDTH;

/// Canvas view settings stored with a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSettings {
    /// Whether the grid overlay is shown.
    pub show_grid: bool,
    /// Whether moves snap to the grid.
    pub snap_to_grid: bool,
    /// Width of the editing viewport.
    pub viewport_width: f64,
    /// Active device preset (`desktop`, `tablet`, `mobile`, ...).
    pub active_device: String,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            show_grid: false,
            snap_to_grid: false,
            viewport_width: DEFAULT_BASE_WIDTH,
            active_device: "desktop".to_string(),
        }
    }
}

/// Editor panel state stored with a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    /// Selected sidebar tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tab: Option<String>,
    /// Sidebar collapsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_collapsed: Option<bool>,
    /// Right panel collapsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_panel_collapsed: Option<bool>,
    /// Left panel collapsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_panel_collapsed: Option<bool>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            active_tab: Some("components".to_string()),
            sidebar_collapsed: Some(false),
            right_panel_collapsed: Some(false),
            left_panel_collapsed: Some(false),
        }
    }
}

/// Kind of backing store for a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceType {
    /// Inline data.
    Static,
    /// HTTP endpoint.
    Api,
    /// Database query.
    Database,
    /// Uploaded file.
    File,
    /// Streaming socket.
    Websocket,
}

/// A named data source that components bind to by id.
///
/// Components hold only the id; a dangling reference means "unbound".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// Identifier referenced by `Component::data_source`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Backing store kind.
    #[serde(rename = "type")]
    pub kind: DataSourceType,
    /// Loaded data.
    #[serde(default)]
    pub data: Value,
    /// Connection configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    /// Load status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Last load error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The live, in-memory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    /// Project identifier.
    #[serde(default)]
    pub id: String,
    /// Project name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time (RFC 3339).
    #[serde(default)]
    pub created_at: String,
    /// Last modification time (RFC 3339).
    #[serde(default)]
    pub updated_at: String,
    /// Components in flat form.
    #[serde(deserialize_with = "crate::component::deserialize_flat")]
    pub components: Vec<Component>,
    /// Canvas view settings.
    #[serde(default)]
    pub canvas: CanvasSettings,
    /// Theme, passed through untouched.
    #[serde(default = "empty_object")]
    pub theme: Value,
    /// Data sources.
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    /// Editor panel state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ProjectSettings>,
}

impl ProjectData {
    /// Create an empty project stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = now_rfc3339();
        Self {
            id: project_id(&name),
            name,
            description: None,
            created_at: now.clone(),
            updated_at: now,
            components: Vec::new(),
            canvas: CanvasSettings::default(),
            theme: empty_object(),
            data_sources: Vec::new(),
            settings: Some(ProjectSettings::default()),
        }
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }

    /// Look up a data source by id.
    #[must_use]
    pub fn data_source(&self, id: &str) -> Option<&DataSource> {
        self.data_sources.iter().find(|ds| ds.id == id)
    }
}

/// Envelope metadata of a [`PageSchema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
    /// Document name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: String,
    /// Last modification time.
    #[serde(default)]
    pub updated_at: String,
    /// Format version the metadata was written with.
    pub version: String,
}

/// The versioned interchange document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSchema {
    /// Format version.
    pub version: String,
    /// Envelope metadata.
    pub metadata: SchemaMetadata,
    /// Components in flat form.
    #[serde(deserialize_with = "crate::component::deserialize_flat")]
    pub components: Vec<Component>,
    /// Canvas view settings.
    pub canvas: CanvasSettings,
    /// Theme, passed through untouched.
    pub theme: Value,
    /// Data sources.
    pub data_sources: Vec<DataSource>,
    /// Editor panel state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ProjectSettings>,
}

/// Current time as an RFC 3339 string with millisecond precision.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Derive a project id from its name: lower-cased, whitespace runs replaced by
/// `-`, suffixed with the current time in milliseconds.
#[must_use]
pub fn project_id(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("{slug}-{}", Utc::now().timestamp_millis())
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_id_slug() {
        let id = project_id("My  Landing Page");
        assert!(id.starts_with("my-landing-page-"));
        let suffix = id.trim_start_matches("my-landing-page-");
        assert!(suffix.parse::<i64>().is_ok());
    }

    #[test]
    fn test_new_project_defaults() {
        let project = ProjectData::new("Demo");
        assert_eq!(project.canvas, CanvasSettings::default());
        assert_eq!(project.created_at, project.updated_at);
        assert!(chrono::DateTime::parse_from_rfc3339(&project.created_at).is_ok());
        assert_eq!(project.theme, json!({}));
    }

    #[test]
    fn test_data_source_json_shape() {
        let ds: DataSource = serde_json::from_value(json!({
            "id": "ds-1",
            "name": "Users",
            "type": "api",
            "data": [{ "name": "Ann" }],
            "config": { "url": "https://example.com/users" }
        }))
        .expect("data source");
        assert_eq!(ds.kind, DataSourceType::Api);
        assert!(ds.status.is_none());

        let value = serde_json::to_value(&ds).expect("serialize");
        assert_eq!(value["type"], json!("api"));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_project_accepts_nested_components() {
        let project: ProjectData = serde_json::from_value(json!({
            "name": "Nested",
            "components": [
                { "id": "row-1", "type": "row", "name": "Row", "children": [
                    { "id": "t-1", "type": "text", "name": "Text" }
                ]}
            ],
            "canvas": {
                "showGrid": true, "snapToGrid": true,
                "viewportWidth": 1280, "activeDevice": "tablet"
            }
        }))
        .expect("project");
        assert_eq!(project.components.len(), 2);
        assert_eq!(project.components[1].parent_id, Some("row-1".into()));
        assert!(project.canvas.show_grid);
        assert!(project.data_sources.is_empty());
    }
}
