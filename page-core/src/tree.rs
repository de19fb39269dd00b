//! Component tree store.
//!
//! A [`ComponentTree`] is an immutable snapshot of the component collection.
//! Every operation returns a new snapshot, so snapshots can be kept in the
//! undo history as-is. Navigation uses a [`TreeIndex`] built once per
//! snapshot from the `parent_id` back-references.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{Component, ComponentId, ComponentNode, ComponentPatch};
use crate::config::{EditorConfig, DEFAULT_BASE_WIDTH};
use crate::layout::Position;
use crate::{PageError, PageResult};

/// An ordered collection of components, flat, linked by `parent_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentTree {
    components: Vec<Component>,
}

/// Result of grouping components under a new container.
#[derive(Debug, Clone)]
pub struct Grouped {
    /// The tree after grouping.
    pub tree: ComponentTree,
    /// The new container.
    pub group: Component,
}

/// Lookup tables for one snapshot.
#[derive(Debug)]
pub struct TreeIndex<'a> {
    by_id: HashMap<&'a str, &'a Component>,
    children: HashMap<&'a str, Vec<&'a Component>>,
}

impl<'a> TreeIndex<'a> {
    /// Build the index for a snapshot.
    #[must_use]
    pub fn new(tree: &'a ComponentTree) -> Self {
        let mut by_id = HashMap::with_capacity(tree.components.len());
        let mut children: HashMap<&str, Vec<&Component>> = HashMap::new();
        for component in &tree.components {
            by_id.insert(component.id.as_str(), component);
            if let Some(parent) = &component.parent_id {
                children.entry(parent.as_str()).or_default().push(component);
            }
        }
        Self { by_id, children }
    }

    /// Look up a component.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a Component> {
        self.by_id.get(id).copied()
    }

    /// Direct children in document order.
    #[must_use]
    pub fn children(&self, id: &str) -> &[&'a Component] {
        self.children.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every transitive descendant, breadth first.
    #[must_use]
    pub fn descendants(&self, id: &str) -> Vec<&'a Component> {
        let mut result = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in self.children(current) {
                if seen.insert(child.id.as_str()) {
                    result.push(*child);
                    queue.push_back(child.id.as_str());
                }
            }
        }
        result
    }

    /// Ancestors from the root down to the direct parent.
    ///
    /// Stops at a missing parent or a repeated id.
    #[must_use]
    pub fn ancestors(&self, id: &str) -> Vec<&'a Component> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut current = self.get(id);
        while let Some(parent) = current
            .and_then(|c| c.parent_id.as_ref())
            .and_then(|p| self.get(p.as_str()))
        {
            if !seen.insert(parent.id.as_str()) {
                break;
            }
            chain.push(parent);
            current = Some(parent);
        }
        chain.reverse();
        chain
    }

    /// Global canvas position: the sum of the local positions up the chain.
    #[must_use]
    pub fn global_position(&self, id: &str) -> Position {
        let own = self.get(id).map(Component::position_or_origin).unwrap_or_default();
        self.ancestors(id)
            .iter()
            .fold(own, |acc, ancestor| acc.offset_by(&ancestor.position_or_origin()))
    }
}

impl ComponentTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from an imported collection, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::DuplicateId`] for repeated ids,
    /// [`PageError::DanglingParent`] for parents outside the collection and
    /// [`PageError::Cycle`] when a parent chain loops.
    pub fn from_components(components: Vec<Component>) -> PageResult<Self> {
        let tree = Self { components };
        tree.check_invariants()?;
        Ok(tree)
    }

    /// Check that every component with children has a container-capable type.
    ///
    /// [`Self::from_components`] checks only structure, since the container
    /// set is configuration; editing sessions run this check on top.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NotAContainer`] for the first offending parent.
    pub fn check_containers(&self, config: &EditorConfig) -> PageResult<()> {
        let index = self.index();
        for component in &self.components {
            if let Some(parent) = component
                .parent_id
                .as_ref()
                .and_then(|p| index.get(p.as_str()))
            {
                ensure_container(parent, config)?;
            }
        }
        Ok(())
    }

    /// Build the lookup index for this snapshot.
    #[must_use]
    pub fn index(&self) -> TreeIndex<'_> {
        TreeIndex::new(self)
    }

    /// All components in document order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Consume the tree, returning the components.
    #[must_use]
    pub fn into_components(self) -> Vec<Component> {
        self.components
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the tree is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Look up a component by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id.as_str() == id)
    }

    /// Whether a component exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Components without a parent.
    #[must_use]
    pub fn root_components(&self) -> Vec<&Component> {
        self.components.iter().filter(|c| c.is_root()).collect()
    }

    /// Direct children of a component.
    #[must_use]
    pub fn children_of(&self, id: &str) -> Vec<&Component> {
        self.components
            .iter()
            .filter(|c| c.parent_id.as_ref().is_some_and(|p| p.as_str() == id))
            .collect()
    }

    /// Whether a component has any children.
    #[must_use]
    pub fn has_children(&self, id: &str) -> bool {
        self.components
            .iter()
            .any(|c| c.parent_id.as_ref().is_some_and(|p| p.as_str() == id))
    }

    /// Components of a given widget type.
    #[must_use]
    pub fn find_by_type(&self, kind: &str) -> Vec<&Component> {
        self.components.iter().filter(|c| c.kind == kind).collect()
    }

    /// Ids of every transitive descendant.
    #[must_use]
    pub fn descendant_ids(&self, id: &str) -> Vec<ComponentId> {
        self.index()
            .descendants(id)
            .into_iter()
            .map(|c| c.id.clone())
            .collect()
    }

    /// Ancestors from the root down to the direct parent.
    #[must_use]
    pub fn ancestors(&self, id: &str) -> Vec<&Component> {
        self.index().ancestors(id)
    }

    /// Number of ancestors (0 for roots and unknown ids).
    #[must_use]
    pub fn depth(&self, id: &str) -> usize {
        self.index().ancestors(id).len()
    }

    /// Add a component.
    ///
    /// # Errors
    ///
    /// Rejects duplicate ids, unknown parents and parents whose type is not
    /// container-capable.
    pub fn insert(&self, component: Component, config: &EditorConfig) -> PageResult<Self> {
        if self.contains(component.id.as_str()) {
            return Err(PageError::DuplicateId(component.id));
        }
        if let Some(parent_id) = &component.parent_id {
            let parent = self
                .get(parent_id.as_str())
                .ok_or_else(|| PageError::ComponentNotFound(parent_id.clone()))?;
            ensure_container(parent, config)?;
        }
        let mut components = self.components.clone();
        components.push(component);
        Ok(Self { components })
    }

    /// Replace a component's position. Unknown ids leave the tree unchanged.
    #[must_use]
    pub fn update_position(&self, id: &str, position: Position) -> Self {
        self.map_component(id, |c| c.position = Some(position))
    }

    /// Apply a property-panel patch. Unknown ids leave the tree unchanged.
    #[must_use]
    pub fn update(&self, id: &str, patch: &ComponentPatch) -> Self {
        self.map_component(id, |c| c.apply_patch(patch))
    }

    /// Toggle the `visible` property.
    #[must_use]
    pub fn set_visibility(&self, id: &str, visible: bool) -> Self {
        self.map_component(id, |c| {
            c.properties
                .insert("visible".to_string(), Value::Bool(visible));
        })
    }

    /// Remove a component and all of its descendants.
    ///
    /// The full closure is computed before anything is removed. Unknown ids
    /// leave the tree unchanged.
    #[must_use]
    pub fn delete_cascade(&self, id: &str) -> Self {
        if !self.contains(id) {
            return self.clone();
        }
        let mut doomed: HashSet<ComponentId> = self.descendant_ids(id).into_iter().collect();
        doomed.insert(ComponentId::from(id));
        tracing::debug!("Cascade delete of {id} removes {} components", doomed.len());
        Self {
            components: self
                .components
                .iter()
                .filter(|c| !doomed.contains(&c.id))
                .cloned()
                .collect(),
        }
    }

    /// Move a component under a new parent, or to the root with `None`.
    ///
    /// Moving to the root converts the position to global canvas
    /// coordinates. Moving into a container places the component at the
    /// configured offset inside it.
    ///
    /// # Errors
    ///
    /// Rejects unknown ids, non-container targets and moves that would make
    /// a component its own ancestor.
    pub fn reparent(
        &self,
        id: &str,
        new_parent: Option<&str>,
        config: &EditorConfig,
    ) -> PageResult<Self> {
        let index = self.index();
        let component = index
            .get(id)
            .ok_or_else(|| PageError::ComponentNotFound(id.into()))?;

        let (parent_id, position) = match new_parent {
            None => {
                if component.is_root() {
                    return Ok(self.clone());
                }
                (None, index.global_position(id))
            }
            Some(parent_id) => {
                let parent = index
                    .get(parent_id)
                    .ok_or_else(|| PageError::ComponentNotFound(parent_id.into()))?;
                ensure_container(parent, config)?;
                if parent_id == id || index.ancestors(parent_id).iter().any(|a| a.id.as_str() == id)
                {
                    return Err(PageError::Cycle {
                        id: id.into(),
                        parent: parent_id.into(),
                    });
                }
                let (ox, oy) = config.reparent_offset;
                (
                    Some(ComponentId::from(parent_id)),
                    Position::new(ox, oy)?,
                )
            }
        };

        Ok(self.map_component(id, |c| {
            c.parent_id = parent_id;
            c.position = Some(position);
        }))
    }

    /// Group components under a new container.
    ///
    /// The container takes the first selected component's position and
    /// parent; members are re-parented onto it with positions translated into
    /// the container's local space.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidOperation`] if fewer than two of `ids`
    /// exist in the tree, and [`PageError::Cycle`] if one selected component
    /// is an ancestor of another. The tree is never partially modified.
    pub fn group(&self, ids: &[ComponentId], group_name: &str) -> PageResult<Grouped> {
        let mut members: Vec<&Component> = Vec::new();
        for id in ids {
            if let Some(component) = self.get(id.as_str()) {
                if !members.iter().any(|m| m.id == component.id) {
                    members.push(component);
                }
            }
        }
        if members.len() < 2 {
            return Err(PageError::InvalidOperation(format!(
                "grouping needs at least 2 existing components, found {}",
                members.len()
            )));
        }

        let index = self.index();
        for member in &members {
            if let Some(ancestor) = index
                .ancestors(member.id.as_str())
                .into_iter()
                .find(|a| members.iter().any(|m| m.id == a.id))
            {
                return Err(PageError::Cycle {
                    id: ancestor.id.clone(),
                    parent: member.id.clone(),
                });
            }
        }

        let first = members[0];
        let origin = first.position_or_origin();
        let mut group = Component::new(ComponentId::generate("group"), "container");
        group.name = group_name.to_string();
        group.position = Some(origin);
        group.parent_id.clone_from(&first.parent_id);
        group.properties = serde_json::json!({
            "width": "auto",
            "height": "auto",
            "padding": "10px",
            "bgColor": "rgba(0, 0, 0, 0.03)",
            "isGroup": true,
        })
        .as_object()
        .cloned()
        .unwrap_or_default();

        let member_ids: HashSet<&ComponentId> = members.iter().map(|m| &m.id).collect();
        let mut components: Vec<Component> = self
            .components
            .iter()
            .map(|c| {
                if member_ids.contains(&c.id) {
                    let mut moved = c.clone();
                    moved.position = Some(c.position_or_origin().relative_to(&origin));
                    moved.parent_id = Some(group.id.clone());
                    moved
                } else {
                    c.clone()
                }
            })
            .collect();
        components.push(group.clone());

        tracing::debug!("Grouped {} components into {}", members.len(), group.id);
        Ok(Grouped {
            tree: Self { components },
            group,
        })
    }

    /// Nest the flat collection into embedded-children form.
    #[must_use]
    pub fn build_tree(&self) -> Vec<ComponentNode> {
        let index = self.index();
        self.components
            .iter()
            .filter(|c| {
                !c.parent_id
                    .as_ref()
                    .is_some_and(|p| index.get(p.as_str()).is_some())
            })
            .map(|c| build_node(&index, c, &mut HashSet::new()))
            .collect()
    }

    /// Flatten embedded-children nodes, filling in `parent_id`.
    #[must_use]
    pub fn flatten_tree(nodes: &[ComponentNode]) -> Self {
        fn walk(node: &ComponentNode, parent: Option<&ComponentId>, out: &mut Vec<Component>) {
            let mut component = node.component.clone();
            if let Some(parent) = parent {
                component.parent_id = Some(parent.clone());
            }
            out.push(component);
            for child in &node.children {
                walk(child, Some(&node.component.id), out);
            }
        }

        let mut components = Vec::new();
        for node in nodes {
            walk(node, None, &mut components);
        }
        Self { components }
    }

    fn map_component(&self, id: &str, f: impl FnOnce(&mut Component)) -> Self {
        let mut components = self.components.clone();
        if let Some(component) = components.iter_mut().find(|c| c.id.as_str() == id) {
            f(component);
        }
        Self { components }
    }

    fn check_invariants(&self) -> PageResult<()> {
        let mut seen = HashSet::with_capacity(self.components.len());
        for component in &self.components {
            if !seen.insert(component.id.as_str()) {
                return Err(PageError::DuplicateId(component.id.clone()));
            }
        }
        let index = self.index();
        for component in &self.components {
            let mut visited: HashSet<&str> = HashSet::from([component.id.as_str()]);
            let mut current = component;
            while let Some(parent_id) = &current.parent_id {
                let parent = index.get(parent_id.as_str()).ok_or_else(|| {
                    PageError::DanglingParent {
                        id: current.id.clone(),
                        parent: parent_id.clone(),
                    }
                })?;
                if !visited.insert(parent.id.as_str()) {
                    return Err(PageError::Cycle {
                        id: component.id.clone(),
                        parent: parent_id.clone(),
                    });
                }
                current = parent;
            }
        }
        Ok(())
    }
}

impl From<ComponentTree> for Vec<Component> {
    fn from(tree: ComponentTree) -> Self {
        tree.components
    }
}

fn build_node<'a>(
    index: &TreeIndex<'a>,
    component: &'a Component,
    visiting: &mut HashSet<&'a str>,
) -> ComponentNode {
    visiting.insert(component.id.as_str());
    let mut children = Vec::new();
    for &child in index.children(component.id.as_str()) {
        if !visiting.contains(child.id.as_str()) {
            children.push(build_node(index, child, visiting));
        }
    }
    ComponentNode {
        component: component.clone(),
        children,
    }
}

fn ensure_container(parent: &Component, config: &EditorConfig) -> PageResult<()> {
    if config.is_container(&parent.kind) {
        Ok(())
    } else {
        Err(PageError::NotAContainer {
            parent: parent.id.clone(),
            kind: parent.kind.clone(),
        })
    }
}

/// Whether two components' bounding boxes overlap.
#[must_use]
pub fn detect_component_collision(a: &Component, b: &Component) -> bool {
    crate::layout::detect_collision(&a.bounds(), &b.bounds())
}

/// Responsive layout pass over a component list.
///
/// Scales each `position.x` by `viewport_width / 1920` and converts
/// percentage widths into pixel strings.
#[must_use]
pub fn calculate_layout(components: &[Component], viewport_width: f64) -> Vec<Component> {
    let ratio = viewport_width / DEFAULT_BASE_WIDTH;
    components
        .iter()
        .map(|component| {
            let mut laid_out = component.clone();
            if let Some(position) = component.position {
                laid_out.position = Position::new(position.x() * ratio, position.y()).ok();
            }
            let percent = component
                .properties
                .get("width")
                .and_then(Value::as_str)
                .and_then(|w| w.strip_suffix('%'))
                .and_then(|w| w.trim().parse::<f64>().ok());
            if let Some(percent) = percent {
                let pixels = percent / 100.0 * viewport_width;
                laid_out
                    .properties
                    .insert("width".to_string(), Value::String(format!("{pixels}px")));
            }
            laid_out
        })
        .collect()
}
