//! # Editor Session
//!
//! An explicitly constructed editing session: one document, its undo history,
//! configuration and theme. Every mutation goes through the tree store, is
//! recorded into history, then becomes the new current snapshot.

use serde_json::Value;

use crate::component::{
    create_component, Component, ComponentId, ComponentPatch, ComponentUpdate,
};
use crate::config::EditorConfig;
use crate::document::{CanvasSettings, DataSource, ProjectData};
use crate::error::{PageResult, SchemaError};
use crate::history::{History, HistoryStatus};
use crate::layout::Position;
use crate::schema;
use crate::tree::ComponentTree;

/// A single-document editing session.
#[derive(Debug, Clone)]
pub struct EditorSession {
    config: EditorConfig,
    project: ProjectData,
    history: History<ComponentTree>,
}

impl EditorSession {
    /// Start a session on an empty project.
    ///
    /// Configuration values that fail [`EditorConfig::validate`] are replaced
    /// with their defaults; use [`Self::open`] to reject them instead.
    #[must_use]
    pub fn new(name: impl Into<String>, config: EditorConfig) -> Self {
        let config = config.sanitized();
        let mut project = ProjectData::new(name);
        project.canvas.snap_to_grid = config.snap_to_grid;
        let history = History::with_limit(ComponentTree::new(), config.history_limit);
        Self {
            config,
            project,
            history,
        }
    }

    /// Start a session on an existing project.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the project's
    /// components violate tree invariants, including the container rule.
    pub fn open(project: ProjectData, config: EditorConfig) -> PageResult<Self> {
        config.validate()?;
        let tree = ComponentTree::from_components(project.components.clone())?;
        tree.check_containers(&config)?;
        tracing::info!(
            "Opened project '{}' with {} components",
            project.name,
            tree.len()
        );
        Ok(Self {
            history: History::with_limit(tree, config.history_limit),
            config,
            project,
        })
    }

    /// Editor configuration.
    #[must_use]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current component snapshot.
    #[must_use]
    pub fn tree(&self) -> &ComponentTree {
        self.history.present()
    }

    /// Current components, for the view layer.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        self.history.present().components()
    }

    /// Document theme.
    #[must_use]
    pub const fn theme(&self) -> &Value {
        &self.project.theme
    }

    /// Replace the document theme. Not recorded in history.
    pub fn set_theme(&mut self, theme: Value) {
        self.project.theme = theme;
        self.project.touch();
    }

    /// Canvas settings.
    #[must_use]
    pub const fn canvas(&self) -> &CanvasSettings {
        &self.project.canvas
    }

    /// Replace canvas settings. Not recorded in history.
    pub fn set_canvas(&mut self, canvas: CanvasSettings) {
        self.project.canvas = canvas;
        self.project.touch();
    }

    /// Data sources.
    #[must_use]
    pub fn data_sources(&self) -> &[DataSource] {
        &self.project.data_sources
    }

    /// Add or replace a data source by id.
    pub fn upsert_data_source(&mut self, source: DataSource) {
        match self
            .project
            .data_sources
            .iter_mut()
            .find(|ds| ds.id == source.id)
        {
            Some(existing) => *existing = source,
            None => self.project.data_sources.push(source),
        }
        self.project.touch();
    }

    /// Remove a data source. Components bound to it become unbound but keep
    /// their reference.
    pub fn remove_data_source(&mut self, id: &str) -> Option<DataSource> {
        let index = self.project.data_sources.iter().position(|ds| ds.id == id)?;
        self.project.touch();
        Some(self.project.data_sources.remove(index))
    }

    /// Whether an undo step exists.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether a redo step exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo/redo state.
    #[must_use]
    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }

    /// Step back one mutation.
    pub fn undo(&mut self) {
        self.history = std::mem::take(&mut self.history).undo();
    }

    /// Step forward one mutation.
    pub fn redo(&mut self) {
        self.history = std::mem::take(&mut self.history).redo();
    }

    fn commit(&mut self, tree: ComponentTree, action: &str) {
        if tree == *self.history.present() {
            tracing::debug!("{action}: no change");
            return;
        }
        tracing::debug!("{action}: {} components", tree.len());
        self.history = std::mem::take(&mut self.history).record(tree);
        self.project.touch();
    }

    fn snapped(&self, position: Position) -> Position {
        if self.config.snap_to_grid {
            position.snap_to_grid(self.config.grid_size)
        } else {
            position
        }
    }

    /// Create a component of `kind` and add it.
    ///
    /// # Errors
    ///
    /// Rejects unknown or non-container parents.
    pub fn add_component(
        &mut self,
        kind: &str,
        position: Option<Position>,
        parent_id: Option<&str>,
    ) -> PageResult<ComponentId> {
        let position = position.map(|p| self.snapped(p));
        let component = create_component(
            kind,
            position,
            parent_id.map(ComponentId::from),
            Some(&self.project.theme),
        );
        let id = component.id.clone();
        let tree = self.tree().insert(component, &self.config)?;
        self.commit(tree, "add component");
        Ok(id)
    }

    /// Add a prebuilt component.
    ///
    /// # Errors
    ///
    /// Rejects duplicate ids and invalid parents.
    pub fn insert_component(&mut self, component: Component) -> PageResult<()> {
        let tree = self.tree().insert(component, &self.config)?;
        self.commit(tree, "insert component");
        Ok(())
    }

    /// Move a component. Unknown ids are ignored.
    pub fn move_component(&mut self, id: &str, position: Position) {
        let tree = self.tree().update_position(id, self.snapped(position));
        self.commit(tree, "move component");
    }

    /// Apply a property-panel patch. Unknown ids are ignored.
    pub fn update_component(&mut self, id: &str, patch: &ComponentPatch) {
        let patch = ComponentPatch {
            position: patch.position.map(|p| self.snapped(p)),
            ..patch.clone()
        };
        let tree = self.tree().update(id, &patch);
        self.commit(tree, "update component");
    }

    /// Apply an `{id, updates}` pair from the UI.
    pub fn apply_update(&mut self, update: &ComponentUpdate) {
        self.update_component(update.id.as_str(), &update.updates);
    }

    /// Show or hide a component.
    pub fn set_visibility(&mut self, id: &str, visible: bool) {
        let tree = self.tree().set_visibility(id, visible);
        self.commit(tree, "set visibility");
    }

    /// Delete a component and its descendants. Unknown ids are ignored.
    pub fn delete_component(&mut self, id: &str) {
        let tree = self.tree().delete_cascade(id);
        self.commit(tree, "delete component");
    }

    /// Move a component under `parent`, or to the root.
    ///
    /// # Errors
    ///
    /// Rejects cycles, unknown ids and non-container parents.
    pub fn reparent(&mut self, id: &str, parent: Option<&str>) -> PageResult<()> {
        let tree = self.tree().reparent(id, parent, &self.config)?;
        self.commit(tree, "reparent component");
        Ok(())
    }

    /// Group components into a new container.
    ///
    /// # Errors
    ///
    /// Fails when fewer than two of `ids` exist.
    pub fn group(&mut self, ids: &[ComponentId], name: &str) -> PageResult<ComponentId> {
        let grouped = self.tree().group(ids, name)?;
        let id = grouped.group.id.clone();
        self.commit(grouped.tree, "group components");
        Ok(id)
    }

    /// Snapshot the live document.
    #[must_use]
    pub fn project(&self) -> ProjectData {
        ProjectData {
            components: self.components().to_vec(),
            ..self.project.clone()
        }
    }

    /// Export the document as schema JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn export_project(&self) -> PageResult<String> {
        let json = schema::project_to_schema_json(&self.project(), schema::SCHEMA_VERSION)?;
        tracing::info!(
            "Exported '{}' ({} components, {} bytes)",
            self.project.name,
            self.components().len(),
            json.len()
        );
        Ok(json)
    }

    /// Replace the document with an imported one.
    ///
    /// The import is validated first, including the container rule; on
    /// failure the session is untouched. A successful import starts a new
    /// baseline: the undo history is cleared, since it described another
    /// document.
    ///
    /// # Errors
    ///
    /// Returns the [`SchemaError`] describing why the document was refused.
    pub fn import_project(&mut self, text: &str) -> Result<(), SchemaError> {
        let project = schema::import_project(text)?;
        let tree = ComponentTree::from_components(project.components.clone())
            .and_then(|tree| tree.check_containers(&self.config).map(|()| tree))
            .map_err(|e| SchemaError::Tree(e.to_string()))?;
        tracing::info!(
            "Imported '{}' as a new baseline ({} components)",
            project.name,
            tree.len()
        );
        self.project = project;
        self.history = History::with_limit(tree, self.config.history_limit);
        Ok(())
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new("Untitled", EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageError;
    use serde_json::json;

    fn pos(x: f64, y: f64) -> Position {
        Position::new(x, y).expect("valid position")
    }

    #[test]
    fn test_mutations_are_undoable() {
        let mut session = EditorSession::default();
        assert!(!session.can_undo());

        let row = session
            .add_component("row", Some(pos(0.0, 0.0)), None)
            .expect("add row");
        let text = session
            .add_component("text", None, Some(row.as_str()))
            .expect("add text");
        assert_eq!(session.components().len(), 2);

        session.delete_component(row.as_str());
        assert!(session.components().is_empty());

        session.undo();
        assert_eq!(session.components().len(), 2);
        assert!(session.tree().contains(text.as_str()));

        session.redo();
        assert!(session.components().is_empty());
        assert!(!session.can_redo());
    }

    #[test]
    fn test_noop_mutation_not_recorded() {
        let mut session = EditorSession::default();
        session.move_component("missing", pos(1.0, 1.0));
        session.delete_component("missing");
        assert_eq!(session.history_status(), HistoryStatus::Clean);
    }

    #[test]
    fn test_snap_applies_when_enabled() {
        let config = EditorConfig {
            snap_to_grid: true,
            grid_size: 10.0,
            ..EditorConfig::default()
        };
        let mut session = EditorSession::new("Snap", config);
        let id = session
            .add_component("button", Some(pos(14.0, 26.0)), None)
            .expect("add");
        let placed = session.tree().get(id.as_str()).and_then(|c| c.position);
        assert_eq!(placed, Some(pos(10.0, 30.0)));
    }

    #[test]
    fn test_add_into_leaf_fails_without_recording() {
        let mut session = EditorSession::default();
        let button = session.add_component("button", None, None).expect("add");
        let result = session.add_component("text", None, Some(button.as_str()));
        assert!(matches!(result, Err(PageError::NotAContainer { .. })));
        assert_eq!(session.components().len(), 1);
    }

    #[test]
    fn test_theme_flows_into_defaults() {
        let mut session = EditorSession::default();
        session.set_theme(json!({ "textColor": "#abcdef" }));
        let id = session.add_component("text", None, None).expect("add");
        let text = session.tree().get(id.as_str()).expect("exists");
        assert_eq!(text.properties.get("color"), Some(&json!("#abcdef")));
    }

    #[test]
    fn test_export_then_import() {
        let mut session = EditorSession::new("Export me", EditorConfig::default());
        session
            .add_component("container", Some(pos(5.0, 5.0)), None)
            .expect("add");
        let json = session.export_project().expect("export");

        let mut other = EditorSession::default();
        other.import_project(&json).expect("import");
        assert_eq!(other.components(), session.components());
        assert_eq!(other.project().name, "Export me");
        assert_eq!(other.history_status(), HistoryStatus::Clean);
    }

    #[test]
    fn test_undo_after_import_keeps_imported_document() {
        let mut source = EditorSession::new("Imported", EditorConfig::default());
        source.set_theme(json!({ "textColor": "#999" }));
        source.add_component("row", None, None).expect("add");
        let json = source.export_project().expect("export");

        let mut session = EditorSession::new("Original", EditorConfig::default());
        session.add_component("button", None, None).expect("add");
        session.import_project(&json).expect("import");
        assert!(!session.can_undo());

        session.undo();
        assert_eq!(session.project().name, "Imported");
        assert_eq!(session.theme(), &json!({ "textColor": "#999" }));
        assert_eq!(session.components(), source.components());
    }

    #[test]
    fn test_import_rejects_children_under_leaf() {
        let mut leafy = ProjectData::new("Leafy");
        leafy.components = vec![
            Component::new("t", "text"),
            Component::new("u", "text").with_parent("t"),
        ];
        let json = schema::project_to_schema_json(&leafy, schema::SCHEMA_VERSION)
            .expect("encode");

        let mut session = EditorSession::default();
        let result = session.import_project(&json);
        assert!(matches!(result, Err(SchemaError::Tree(_))));
        assert!(session.components().is_empty());
        assert_eq!(session.project().name, "Untitled");
    }

    #[test]
    fn test_invalid_grid_does_not_panic() {
        let config = EditorConfig {
            snap_to_grid: true,
            grid_size: 0.0,
            ..EditorConfig::default()
        };
        assert!(matches!(
            EditorSession::open(ProjectData::new("Bad"), config.clone()),
            Err(PageError::Config(_))
        ));

        let mut session = EditorSession::new("Clamped", config);
        let id = session
            .add_component("button", Some(pos(14.0, 26.0)), None)
            .expect("add");
        session.move_component(id.as_str(), pos(33.0, 47.0));
        let placed = session.tree().get(id.as_str()).and_then(|c| c.position);
        assert_eq!(placed, Some(pos(40.0, 40.0)));
    }

    #[test]
    fn test_failed_import_leaves_session_untouched() {
        let mut session = EditorSession::default();
        session.add_component("row", None, None).expect("add");
        let before = session.components().to_vec();
        assert!(matches!(
            session.import_project("not json"),
            Err(SchemaError::NotJson(_))
        ));
        assert_eq!(session.components(), before.as_slice());
    }
}
