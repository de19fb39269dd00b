//! # Page Core
//!
//! Document model for a visual page builder: the component tree, its undo
//! history, canvas layout arithmetic and the versioned interchange format.
//! Compiles to WASM with the `wasm` feature.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                EditorSession                 │
//! ├──────────────────────────────────────────────┤
//! │  ComponentTree      │  History<ComponentTree>│
//! │  - CRUD, grouping   │  - record/undo/redo    │
//! │  - reparenting      │  - retention cap       │
//! ├──────────────────────────────────────────────┤
//! │  Layout             │  Schema                │
//! │  - grid, collision  │  - validate, migrate   │
//! │  - responsive scale │  - import/export       │
//! ├──────────────────────────────────────────────┤
//! │  Dispatcher: native Accelerator → fallback   │
//! └──────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod accel;
pub mod component;
pub mod config;
pub mod data;
pub mod document;
pub mod error;
pub mod history;
pub mod layout;
pub mod mapping;
pub mod schema;
pub mod session;
pub mod tree;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use accel::{Accelerator, DispatchStats, Dispatcher};
pub use component::{
    create_component, validate_component, Component, ComponentId, ComponentNode, ComponentPatch,
    ComponentUpdate,
};
pub use config::EditorConfig;
pub use document::{
    CanvasSettings, DataSource, DataSourceType, PageSchema, ProjectData, ProjectSettings,
    SchemaMetadata,
};
pub use error::{AccelError, DataError, PageError, PageResult, SchemaError, SchemaResult};
pub use history::{History, HistoryStatus};
pub use layout::{Bounds, Point, Position, ResponsiveOptions};
pub use mapping::{DataMapping, TransformKind, TransformRule};
pub use schema::{ValidationReport, SCHEMA_VERSION};
pub use session::EditorSession;
pub use tree::{ComponentTree, Grouped, TreeIndex};

/// Page core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
