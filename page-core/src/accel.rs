//! # Acceleration Dispatcher
//!
//! Routes the data, schema and layout capabilities to an optional native
//! module and falls back to the interpreted implementations in this crate.
//!
//! ```text
//! caller ──► Dispatcher ──► native Accelerator ──ok──► result
//!                 │                 │
//!                 │            err / absent
//!                 ▼                 ▼
//!            interpreted fallback ─────────► result (or fallback's error)
//! ```
//!
//! A native failure is logged and counted, never returned. Each call is an
//! independent request; no state is shared between calls.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::Component;
use crate::document::ProjectData;
use crate::error::{AccelError, DataError, SchemaResult};
use crate::layout::{Bounds, Point};
use crate::mapping::{DataMapping, TransformRule};
use crate::schema::{self, ValidationReport, SCHEMA_VERSION};
use crate::{data, layout, mapping, tree};

/// Capability surface of a native acceleration module.
///
/// Every capability defaults to [`AccelError::Unsupported`], so a module
/// implements only what it accelerates. Implementations must match the
/// interpreted results exactly.
#[async_trait]
pub trait Accelerator: Send + Sync {
    /// Module name used in logs.
    fn name(&self) -> &str {
        "native"
    }

    /// Check whether text parses as JSON.
    async fn validate_json(&self, _text: &str) -> Result<bool, AccelError> {
        Err(AccelError::Unsupported("validate_json"))
    }

    /// Re-indent JSON.
    async fn format_json(&self, _text: &str, _indent: usize) -> Result<String, AccelError> {
        Err(AccelError::Unsupported("format_json"))
    }

    /// Minify JSON.
    async fn minify_json(&self, _text: &str) -> Result<String, AccelError> {
        Err(AccelError::Unsupported("minify_json"))
    }

    /// Parse CSV into an array of objects.
    async fn parse_csv(&self, _text: &str) -> Result<Value, AccelError> {
        Err(AccelError::Unsupported("parse_csv"))
    }

    /// Parse XML into nested objects.
    async fn parse_xml(&self, _text: &str) -> Result<Value, AccelError> {
        Err(AccelError::Unsupported("parse_xml"))
    }

    /// Convert a project to schema JSON.
    async fn serialize_schema(&self, _project: &ProjectData) -> Result<String, AccelError> {
        Err(AccelError::Unsupported("serialize_schema"))
    }

    /// Convert schema JSON to a project.
    async fn deserialize_schema(&self, _json: &str) -> Result<ProjectData, AccelError> {
        Err(AccelError::Unsupported("deserialize_schema"))
    }

    /// Validate schema JSON with detailed errors.
    async fn validate_schema(&self, _json: &str) -> Result<ValidationReport, AccelError> {
        Err(AccelError::Unsupported("validate_schema"))
    }

    /// Migrate and restamp schema JSON.
    async fn migrate_schema(
        &self,
        _json: &str,
        _from_version: &str,
        _to_version: &str,
    ) -> Result<String, AccelError> {
        Err(AccelError::Unsupported("migrate_schema"))
    }

    /// Derive mapping rules.
    async fn generate_mapping(
        &self,
        _source: &Value,
        _target: &Value,
    ) -> Result<Vec<DataMapping>, AccelError> {
        Err(AccelError::Unsupported("generate_mapping"))
    }

    /// Apply mapping rules.
    async fn apply_mapping(
        &self,
        _data: &Value,
        _mappings: &[DataMapping],
    ) -> Result<Value, AccelError> {
        Err(AccelError::Unsupported("apply_mapping"))
    }

    /// Coerce a value.
    async fn transform_data(
        &self,
        _data: &Value,
        _rule: &TransformRule,
    ) -> Result<Value, AccelError> {
        Err(AccelError::Unsupported("transform_data"))
    }

    /// Responsive layout pass.
    async fn calculate_layout(
        &self,
        _components: &[Component],
        _viewport_width: f64,
    ) -> Result<Vec<Component>, AccelError> {
        Err(AccelError::Unsupported("calculate_layout"))
    }

    /// Grid snapping.
    async fn snap_to_grid(&self, _x: f64, _y: f64, _grid_size: f64) -> Result<Point, AccelError> {
        Err(AccelError::Unsupported("snap_to_grid"))
    }

    /// Rectangle overlap test.
    async fn detect_collision(&self, _a: &Bounds, _b: &Bounds) -> Result<bool, AccelError> {
        Err(AccelError::Unsupported("detect_collision"))
    }
}

/// Snapshot of dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStats {
    /// Calls answered by the native module.
    pub native_hits: u64,
    /// Calls answered by the interpreted fallback.
    pub fallbacks: u64,
    /// Native calls that failed (subset of `fallbacks`).
    pub native_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    native_hits: AtomicU64,
    fallbacks: AtomicU64,
    native_failures: AtomicU64,
}

/// Routes each capability to the native module when present, otherwise (or
/// on failure) to the interpreted implementation.
#[derive(Clone, Default)]
pub struct Dispatcher {
    native: Option<Arc<dyn Accelerator>>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("native", &self.native.as_ref().map(|n| n.name().to_string()))
            .field("stats", &self.stats())
            .finish()
    }
}

impl Dispatcher {
    /// A dispatcher that always uses the interpreted implementations.
    #[must_use]
    pub fn interpreted() -> Self {
        Self::default()
    }

    /// A dispatcher that tries `native` first.
    #[must_use]
    pub fn with_native(native: Arc<dyn Accelerator>) -> Self {
        tracing::info!("Acceleration module '{}' installed", native.name());
        Self {
            native: Some(native),
            counters: Arc::default(),
        }
    }

    /// Whether a native module is installed.
    #[must_use]
    pub fn has_native(&self) -> bool {
        self.native.is_some()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            native_hits: self.counters.native_hits.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
            native_failures: self.counters.native_failures.load(Ordering::Relaxed),
        }
    }

    async fn dispatch<'a, T, Fut>(
        &'a self,
        op: &'static str,
        call: impl FnOnce(&'a dyn Accelerator) -> Fut,
        fallback: impl FnOnce() -> T,
    ) -> T
    where
        Fut: Future<Output = Result<T, AccelError>>,
    {
        let Some(native) = self.native.as_deref() else {
            self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
            return fallback();
        };

        match call(native).await {
            Ok(value) => {
                self.counters.native_hits.fetch_add(1, Ordering::Relaxed);
                value
            }
            Err(AccelError::Unsupported(_)) => {
                tracing::debug!("{} does not accelerate {op}, using fallback", native.name());
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                fallback()
            }
            Err(e) => {
                tracing::warn!("Native {op} failed, using fallback: {e}");
                self.counters.native_failures.fetch_add(1, Ordering::Relaxed);
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                fallback()
            }
        }
    }

    /// See [`data::validate_json`].
    pub async fn validate_json(&self, text: &str) -> bool {
        self.dispatch("validate_json", |n| n.validate_json(text), || {
            data::validate_json(text)
        })
        .await
    }

    /// See [`data::format_json`].
    ///
    /// # Errors
    ///
    /// Returns the fallback's error if the input is not JSON.
    pub async fn format_json(&self, text: &str, indent: usize) -> Result<String, DataError> {
        self.dispatch(
            "format_json",
            |n| async move { n.format_json(text, indent).await.map(Ok) },
            || data::format_json(text, indent),
        )
        .await
    }

    /// See [`data::minify_json`].
    ///
    /// # Errors
    ///
    /// Returns the fallback's error if the input is not JSON.
    pub async fn minify_json(&self, text: &str) -> Result<String, DataError> {
        self.dispatch(
            "minify_json",
            |n| async move { n.minify_json(text).await.map(Ok) },
            || data::minify_json(text),
        )
        .await
    }

    /// See [`data::parse_csv`].
    ///
    /// # Errors
    ///
    /// Returns the fallback's error for unreadable CSV.
    pub async fn parse_csv(&self, text: &str) -> Result<Value, DataError> {
        self.dispatch(
            "parse_csv",
            |n| async move { n.parse_csv(text).await.map(Ok) },
            || data::parse_csv(text),
        )
        .await
    }

    /// See [`data::parse_xml`].
    ///
    /// # Errors
    ///
    /// Returns the fallback's error for malformed XML.
    pub async fn parse_xml(&self, text: &str) -> Result<Value, DataError> {
        self.dispatch(
            "parse_xml",
            |n| async move { n.parse_xml(text).await.map(Ok) },
            || data::parse_xml(text),
        )
        .await
    }

    /// Convert a project to schema JSON at [`SCHEMA_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns the fallback's error if encoding fails.
    pub async fn serialize_schema(&self, project: &ProjectData) -> SchemaResult<String> {
        self.dispatch(
            "serialize_schema",
            |n| async move { n.serialize_schema(project).await.map(Ok) },
            || schema::project_to_schema_json(project, SCHEMA_VERSION),
        )
        .await
    }

    /// Convert schema JSON to a project.
    ///
    /// # Errors
    ///
    /// Returns the fallback's error for unparseable or malformed input.
    pub async fn deserialize_schema(&self, json: &str) -> SchemaResult<ProjectData> {
        self.dispatch(
            "deserialize_schema",
            |n| async move { n.deserialize_schema(json).await.map(Ok) },
            || schema::schema_json_to_project(json),
        )
        .await
    }

    /// See [`schema::validate_schema_json`].
    pub async fn validate_schema(&self, json: &str) -> ValidationReport {
        self.dispatch("validate_schema", |n| n.validate_schema(json), || {
            schema::validate_schema_json(json)
        })
        .await
    }

    /// See [`schema::migrate_version`].
    ///
    /// # Errors
    ///
    /// Returns the fallback's error for unrecognized documents.
    pub async fn migrate_schema(
        &self,
        json: &str,
        from_version: &str,
        to_version: &str,
    ) -> SchemaResult<String> {
        self.dispatch(
            "migrate_schema",
            |n| async move {
                n.migrate_schema(json, from_version, to_version)
                    .await
                    .map(Ok)
            },
            || schema::migrate_version(json, from_version, to_version),
        )
        .await
    }

    /// See [`mapping::generate_mapping`].
    pub async fn generate_mapping(&self, source: &Value, target: &Value) -> Vec<DataMapping> {
        self.dispatch(
            "generate_mapping",
            |n| n.generate_mapping(source, target),
            || mapping::generate_mapping(source, target),
        )
        .await
    }

    /// See [`mapping::apply_mapping`].
    ///
    /// # Errors
    ///
    /// Returns the fallback's error if a target path cannot be written.
    pub async fn apply_mapping(
        &self,
        data: &Value,
        mappings: &[DataMapping],
    ) -> Result<Value, DataError> {
        self.dispatch(
            "apply_mapping",
            |n| async move { n.apply_mapping(data, mappings).await.map(Ok) },
            || mapping::apply_mapping(data, mappings),
        )
        .await
    }

    /// See [`mapping::transform_data`].
    pub async fn transform_data(&self, data: &Value, rule: &TransformRule) -> Value {
        self.dispatch(
            "transform_data",
            |n| n.transform_data(data, rule),
            || mapping::transform_data(data, rule),
        )
        .await
    }

    /// See [`tree::calculate_layout`].
    pub async fn calculate_layout(
        &self,
        components: &[Component],
        viewport_width: f64,
    ) -> Vec<Component> {
        self.dispatch(
            "calculate_layout",
            |n| n.calculate_layout(components, viewport_width),
            || tree::calculate_layout(components, viewport_width),
        )
        .await
    }

    /// See [`layout::snap_to_grid`].
    ///
    /// # Panics
    ///
    /// The fallback panics if `grid_size` is not strictly positive.
    pub async fn snap_to_grid(&self, x: f64, y: f64, grid_size: f64) -> Point {
        self.dispatch(
            "snap_to_grid",
            |n| n.snap_to_grid(x, y, grid_size),
            || layout::snap_to_grid(x, y, grid_size),
        )
        .await
    }

    /// See [`layout::detect_collision`].
    pub async fn detect_collision(&self, a: &Bounds, b: &Bounds) -> bool {
        self.dispatch(
            "detect_collision",
            |n| n.detect_collision(a, b),
            || layout::detect_collision(a, b),
        )
        .await
    }
}
