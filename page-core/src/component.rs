//! Components - the nodes of a page design.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::layout::{Bounds, Position};

/// Fallback edge length for components without an explicit size.
pub const DEFAULT_COMPONENT_SIZE: f64 = 100.0;

/// Unique identifier for a component.
///
/// Imported documents may carry any string id; ids minted here are
/// `"{type}-{uuid}"`, which stays unique under bulk creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Mint a fresh id for a component of the given type.
    #[must_use]
    pub fn generate(kind: &str) -> Self {
        Self(format!("{kind}-{}", Uuid::new_v4().simple()))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for ComponentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A placed widget instance.
///
/// Parent/child structure is carried only by `parent_id`; child lists are
/// derived by [`crate::ComponentTree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Unique identifier, immutable after creation.
    pub id: ComponentId,
    /// Widget type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Display label.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Canvas position; absent for components laid out by their container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Widget-specific configuration, passed through untouched.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    /// Owning component, `None` for roots.
    #[serde(default)]
    pub parent_id: Option<ComponentId>,
    /// Weak reference to a data source id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    /// Field mapping applied to the bound data source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_mapping: Option<Value>,
}

impl Component {
    /// Create a bare component with the given id and type.
    #[must_use]
    pub fn new(id: impl Into<ComponentId>, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            id: id.into(),
            name: kind.clone(),
            kind,
            position: None,
            properties: Map::new(),
            parent_id: None,
            data_source: None,
            data_mapping: None,
        }
    }

    /// Set the position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the parent.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<ComponentId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Set one property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Whether this is a root component.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Position, treating an absent one as the origin.
    #[must_use]
    pub fn position_or_origin(&self) -> Position {
        self.position.unwrap_or_default()
    }

    /// Bounding box from the position and the `width`/`height` properties.
    ///
    /// Sizes may be numbers or `"NNpx"` strings; anything else falls back to
    /// [`DEFAULT_COMPONENT_SIZE`].
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let origin = self.position_or_origin();
        Bounds::new(
            origin.x(),
            origin.y(),
            pixel_size(self.properties.get("width")),
            pixel_size(self.properties.get("height")),
        )
    }

    /// Apply a property-panel patch.
    pub fn apply_patch(&mut self, patch: &ComponentPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(position) = patch.position {
            self.position = Some(position);
        }
        if let Some(properties) = &patch.properties {
            for (key, value) in properties {
                self.properties.insert(key.clone(), value.clone());
            }
        }
        if let Some(data_source) = &patch.data_source {
            self.data_source.clone_from(data_source);
        }
        if let Some(mapping) = &patch.data_mapping {
            self.data_mapping = Some(mapping.clone());
        }
    }
}

fn pixel_size(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_COMPONENT_SIZE),
        Some(Value::String(s)) => s
            .trim_end_matches("px")
            .parse()
            .unwrap_or(DEFAULT_COMPONENT_SIZE),
        _ => DEFAULT_COMPONENT_SIZE,
    }
}

/// Partial update coming from the property panel or a drag operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPatch {
    /// New display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Properties merged over the existing ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    /// New data source binding; `Some(None)` unbinds.
    #[serde(
        default,
        deserialize_with = "present_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_source: Option<Option<String>>,
    /// New data mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_mapping: Option<Value>,
}

/// An `{id, updates}` pair as delivered by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentUpdate {
    /// Target component.
    pub id: ComponentId,
    /// Changes to apply.
    pub updates: ComponentPatch,
}

fn present_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Check the minimal shape every component must have.
#[must_use]
pub fn validate_component(component: &Component) -> bool {
    !component.id.as_str().is_empty() && !component.kind.is_empty() && !component.name.is_empty()
}

/// Create a component with a fresh id and the type's default properties.
///
/// `theme` is the document theme; only its `textColor` is consulted.
#[must_use]
pub fn create_component(
    kind: &str,
    position: Option<Position>,
    parent_id: Option<ComponentId>,
    theme: Option<&Value>,
) -> Component {
    let mut component = Component::new(ComponentId::generate(kind), kind);
    component.position = position;
    component.parent_id = parent_id;
    component.properties = default_properties(kind, theme);
    tracing::debug!("Created component {} ({kind})", component.id);
    component
}

/// Default properties for a widget type. Every type gets `visible: true`.
#[must_use]
pub fn default_properties(kind: &str, theme: Option<&Value>) -> Map<String, Value> {
    let text_color = theme
        .and_then(|t| t.get("textColor"))
        .and_then(Value::as_str)
        .unwrap_or("#000000");

    let specific = match kind {
        "text" => json!({
            "content": "Sample text",
            "fontSize": 16,
            "fontWeight": "normal",
            "color": text_color,
            "alignment": "left",
            "lineHeight": 1.5,
        }),
        "button" => json!({
            "text": "Button",
            "variant": "outline",
            "size": "default",
            "disabled": false,
            "fullWidth": false,
            "onClick": "none",
        }),
        "image" => json!({
            "src": "/placeholder.svg?height=200&width=300",
            "alt": "Sample image",
            "width": 300,
            "height": 200,
            "objectFit": "cover",
        }),
        "divider" => json!({
            "orientation": "horizontal",
            "thickness": 1,
            "color": "#e2e8f0",
            "style": "solid",
        }),
        "input" | "textarea" | "select" => json!({
            "placeholder": "Enter a value...",
            "disabled": false,
            "required": false,
            "label": kind,
            "helperText": "",
            "defaultValue": "",
        }),
        "checkbox" => json!({ "label": "Checkbox", "checked": false, "disabled": false }),
        "radio" => json!({
            "options": ["Option 1", "Option 2", "Option 3"],
            "disabled": false,
            "label": "Radio group",
        }),
        "card" => json!({
            "title": "Card title",
            "shadow": true,
            "padding": "1rem",
            "border": true,
            "rounded": true,
        }),
        "data-table" => json!({
            "title": "Data table",
            "dataSource": null,
            "columns": [],
            "pagination": true,
            "pageSize": 10,
        }),
        "bar-chart" | "line-chart" | "area-chart" | "scatter-chart" | "radar-chart"
        | "pie-chart" | "radial-bar-chart" | "treemap-chart" => json!({
            "title": kind,
            "dataSource": null,
            "legend": true,
            "width": 500,
            "height": 300,
        }),
        "grid-layout" | "card-group" => json!({
            "columns": 3,
            "gap": 2,
            "width": "100%",
            "height": "auto",
        }),
        "flex-layout" => json!({
            "direction": "row",
            "wrap": true,
            "justifyContent": "start",
            "alignItems": "center",
            "gap": 2,
            "width": "100%",
            "height": "auto",
        }),
        "split-layout" => json!({
            "direction": "horizontal",
            "splitRatio": 30,
            "minSize": 100,
            "width": "100%",
            "height": "300px",
        }),
        "responsive-container" => json!({
            "breakpoints": { "sm": 640, "md": 768, "lg": 1024, "xl": 1280 },
            "width": "100%",
            "height": "auto",
        }),
        _ => json!({}),
    };

    let mut properties = Map::new();
    properties.insert("visible".to_string(), Value::Bool(true));
    if let Value::Object(extra) = specific {
        properties.extend(extra);
    }
    properties
}

/// A component with its children embedded, as used by templates and
/// nested interchange payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    /// The component itself.
    #[serde(flatten)]
    pub component: Component,
    /// Embedded children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentNode>,
}

/// A `children` entry in an imported document: an id or an embedded node.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ChildRef {
    Id(ComponentId),
    Node(Box<WireComponent>),
}

#[derive(Debug, Clone, Deserialize)]
struct WireComponent {
    #[serde(flatten)]
    component: Component,
    #[serde(default)]
    children: Vec<ChildRef>,
}

/// Deserialize a component list that may use either `children` form,
/// producing the flat `parentId` form.
///
/// Embedded children are hoisted into the list with `parentId` set to their
/// owner. Id-list children only fill in a missing `parentId`.
///
/// # Errors
///
/// Returns the deserializer's error if any entry is not a component.
pub fn deserialize_flat<'de, D>(deserializer: D) -> Result<Vec<Component>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire = Vec::<WireComponent>::deserialize(deserializer)?;
    let mut flat = Vec::new();
    let mut id_links = Vec::new();
    for entry in wire {
        hoist(entry, None, &mut flat, &mut id_links);
    }
    for (child, owner) in id_links {
        if let Some(component) = flat.iter_mut().find(|c| c.id == child) {
            if component.parent_id.is_none() {
                component.parent_id = Some(owner);
            }
        }
    }
    Ok(flat)
}

fn hoist(
    entry: WireComponent,
    owner: Option<&ComponentId>,
    flat: &mut Vec<Component>,
    id_links: &mut Vec<(ComponentId, ComponentId)>,
) {
    let mut component = entry.component;
    if let Some(owner) = owner {
        component.parent_id = Some(owner.clone());
    }
    let id = component.id.clone();
    flat.push(component);
    for child in entry.children {
        match child {
            ChildRef::Id(child_id) => id_links.push((child_id, id.clone())),
            ChildRef::Node(node) => hoist(*node, Some(&id), flat, id_links),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: std::collections::HashSet<_> =
            (0..1000).map(|_| ComponentId::generate("button")).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.as_str().starts_with("button-")));
    }

    #[test]
    fn test_create_component_defaults() {
        let theme = json!({ "textColor": "#333333" });
        let text = create_component("text", Some(Position::ORIGIN), None, Some(&theme));
        assert_eq!(text.kind, "text");
        assert_eq!(text.name, "text");
        assert_eq!(text.properties.get("visible"), Some(&Value::Bool(true)));
        assert_eq!(text.properties.get("color"), Some(&json!("#333333")));
        assert!(validate_component(&text));

        let unknown = create_component("mystery", None, None, None);
        assert_eq!(unknown.properties.len(), 1);
    }

    #[test]
    fn test_bounds_from_properties() {
        let c = Component::new("a", "box")
            .with_position(Position::new(10.0, 20.0).expect("valid"))
            .with_property("width", json!("250px"))
            .with_property("height", json!(40));
        assert_eq!(c.bounds(), Bounds::new(10.0, 20.0, 250.0, 40.0));

        let auto = Component::new("b", "box").with_property("width", json!("100%"));
        assert_eq!(auto.bounds(), Bounds::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_apply_patch_merges_properties() {
        let mut c = Component::new("a", "text").with_property("content", json!("old"));
        let patch: ComponentPatch = serde_json::from_value(json!({
            "name": "Title",
            "properties": { "fontSize": 20 },
            "dataSource": null
        }))
        .expect("patch");
        assert_eq!(patch.data_source, Some(None));

        c.data_source = Some("ds-1".into());
        c.apply_patch(&patch);
        assert_eq!(c.name, "Title");
        assert_eq!(c.properties.get("content"), Some(&json!("old")));
        assert_eq!(c.properties.get("fontSize"), Some(&json!(20)));
        assert!(c.data_source.is_none());
    }

    #[test]
    fn test_component_json_shape() {
        let c = Component::new("btn-1", "button")
            .with_parent("row-1")
            .with_position(Position::new(5.0, 6.0).expect("valid"));
        let value = serde_json::to_value(&c).expect("serialize");
        assert_eq!(value["type"], json!("button"));
        assert_eq!(value["parentId"], json!("row-1"));
        assert_eq!(value["position"], json!({ "x": 5.0, "y": 6.0 }));
        let back: Component = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, c);
    }

    #[test]
    fn test_deserialize_flat_hoists_embedded_children() {
        #[derive(Deserialize)]
        struct Doc {
            #[serde(deserialize_with = "deserialize_flat")]
            components: Vec<Component>,
        }

        let doc: Doc = serde_json::from_value(json!({
            "components": [
                { "id": "g", "type": "container", "name": "Group", "children": [
                    { "id": "a", "type": "text", "name": "A" },
                    { "id": "b", "type": "row", "name": "B", "children": ["c"] }
                ]},
                { "id": "c", "type": "button", "name": "C" }
            ]
        }))
        .expect("deserialize");

        let ids: Vec<_> = doc.components.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["g", "a", "b", "c"]);
        let parent = |id: &str| {
            doc.components
                .iter()
                .find(|c| c.id.as_str() == id)
                .and_then(|c| c.parent_id.clone())
        };
        assert_eq!(parent("a"), Some("g".into()));
        assert_eq!(parent("b"), Some("g".into()));
        assert_eq!(parent("c"), Some("b".into()));
        assert_eq!(parent("g"), None);
    }
}
