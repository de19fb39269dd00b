//! Error types for document operations.

use thiserror::Error;

use crate::ComponentId;

/// Result type for tree, session and configuration operations.
pub type PageResult<T> = Result<T, PageError>;

/// Result type for import/export operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while editing the component tree.
#[derive(Debug, Error)]
pub enum PageError {
    /// Component not found in the tree.
    #[error("Component not found: {0}")]
    ComponentNotFound(ComponentId),

    /// A component with this id already exists.
    #[error("Duplicate component id: {0}")]
    DuplicateId(ComponentId),

    /// The target parent cannot hold children.
    #[error("Component {parent} of type '{kind}' cannot contain children")]
    NotAContainer {
        /// The rejected parent.
        parent: ComponentId,
        /// The parent's widget type.
        kind: String,
    },

    /// Re-parenting would make a component its own ancestor.
    #[error("Moving {id} under {parent} would create a cycle")]
    Cycle {
        /// The component being moved.
        id: ComponentId,
        /// The requested parent.
        parent: ComponentId,
    },

    /// A parent reference points outside the tree.
    #[error("Component {id} references missing parent {parent}")]
    DanglingParent {
        /// The component holding the reference.
        id: ComponentId,
        /// The missing parent.
        parent: ComponentId,
    },

    /// Coordinates outside the canvas.
    #[error("Position coordinates must be non-negative (got {x}, {y})")]
    InvalidPosition {
        /// Rejected x coordinate.
        x: f64,
        /// Rejected y coordinate.
        y: f64,
    },

    /// Invalid tree operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Invalid editor configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Document import or export failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An I/O error occurred while reading configuration or documents.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while importing, validating or migrating a page document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The input is not JSON at all.
    #[error("Document is not valid JSON: {0}")]
    NotJson(String),

    /// Valid JSON, but neither a page schema nor a legacy project document.
    #[error("Unable to recognize schema format: {message}")]
    Unrecognized {
        /// Why the document was not recognized.
        message: String,
        /// The offending document.
        document: serde_json::Value,
    },

    /// Recognized as a page schema but structurally invalid.
    #[error("Invalid page schema: {}", errors.join("; "))]
    Invalid {
        /// Every structural violation found.
        errors: Vec<String>,
        /// The offending document.
        document: serde_json::Value,
    },

    /// The document was written by a newer format version.
    #[error("Schema version {found} is newer than supported version {supported}; upgrade required")]
    UnsupportedVersion {
        /// Version found in the document.
        found: String,
        /// Highest version this build understands.
        supported: String,
    },

    /// The document's components violate tree invariants.
    #[error("Invalid component tree: {0}")]
    Tree(String),

    /// Encoding a document to JSON failed.
    #[error("Failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors reported by a native acceleration module.
///
/// These never escape the dispatcher; they only trigger the fallback path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccelError {
    /// The module does not implement this capability.
    #[error("Capability not supported: {0}")]
    Unsupported(&'static str),

    /// The native call failed.
    #[error("Native call {op} failed: {message}")]
    Failed {
        /// Capability name.
        op: &'static str,
        /// Failure description.
        message: String,
    },
}

/// Errors raised by the data parsing and mapping helpers.
#[derive(Debug, Error)]
pub enum DataError {
    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// XML parsing failed.
    #[error("XML error: {0}")]
    Xml(String),

    /// A mapping rule was malformed or could not be applied.
    #[error("Mapping error: {0}")]
    Mapping(String),
}

impl From<quick_xml::Error> for DataError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}
