//! Frames - typed, column-oriented tables built from records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Key/value labels attached to a field.
///
/// Graph frames carry a record's dimensions here instead of as columns.
pub type Labels = BTreeMap<String, String>;

/// Column type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldType {
    Time,
    Int64,
    Float32,
    Int8,
    String,
}

/// A single cell value, used when appending rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Time(DateTime<Utc>),
    Int64(i64),
    Float32(f32),
    Int8(i8),
    String(String),
}

impl Value {
    /// The column type this value belongs in.
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Time(_) => FieldType::Time,
            Value::Int64(_) => FieldType::Int64,
            Value::Float32(_) => FieldType::Float32,
            Value::Int8(_) => FieldType::Int8,
            Value::String(_) => FieldType::String,
        }
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int8(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// Typed storage for one column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "values", rename_all = "snake_case")
)]
pub enum FieldValues {
    Time(Vec<DateTime<Utc>>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Int8(Vec<i8>),
    String(Vec<String>),
}

impl FieldValues {
    /// Create an empty column of the given type.
    pub fn empty(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Time => FieldValues::Time(Vec::new()),
            FieldType::Int64 => FieldValues::Int64(Vec::new()),
            FieldType::Float32 => FieldValues::Float32(Vec::new()),
            FieldType::Int8 => FieldValues::Int8(Vec::new()),
            FieldType::String => FieldValues::String(Vec::new()),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValues::Time(_) => FieldType::Time,
            FieldValues::Int64(_) => FieldType::Int64,
            FieldValues::Float32(_) => FieldType::Float32,
            FieldValues::Int8(_) => FieldType::Int8,
            FieldValues::String(_) => FieldType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldValues::Time(v) => v.len(),
            FieldValues::Int64(v) => v.len(),
            FieldValues::Float32(v) => v.len(),
            FieldValues::Int8(v) => v.len(),
            FieldValues::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the value at `idx`.
    pub fn get(&self, idx: usize) -> Option<Value> {
        match self {
            FieldValues::Time(v) => v.get(idx).copied().map(Value::Time),
            FieldValues::Int64(v) => v.get(idx).copied().map(Value::Int64),
            FieldValues::Float32(v) => v.get(idx).copied().map(Value::Float32),
            FieldValues::Int8(v) => v.get(idx).copied().map(Value::Int8),
            FieldValues::String(v) => v.get(idx).cloned().map(Value::String),
        }
    }

    // Callers check the type first; a mismatch here is a no-op.
    fn push(&mut self, value: Value) {
        match (self, value) {
            (FieldValues::Time(v), Value::Time(x)) => v.push(x),
            (FieldValues::Int64(v), Value::Int64(x)) => v.push(x),
            (FieldValues::Float32(v), Value::Float32(x)) => v.push(x),
            (FieldValues::Int8(v), Value::Int8(x)) => v.push(x),
            (FieldValues::String(v), Value::String(x)) => v.push(x),
            _ => {}
        }
    }
}

/// A discrete value-to-display mapping for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueMapping {
    /// The raw value, rendered as text (e.g. `"4"`).
    pub value: String,
    /// Display text for the value.
    pub text: String,
    /// Display color for the value.
    pub color: String,
}

/// Display configuration for a field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldConfig {
    pub mappings: Vec<ValueMapping>,
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "BTreeMap::is_empty"))]
    pub labels: Labels,
    pub values: FieldValues,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub config: Option<FieldConfig>,
}

impl Field {
    /// Create an empty, unlabeled field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            values: FieldValues::empty(field_type),
            config: None,
        }
    }

    /// Attach labels to the field.
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.values.field_type()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn set_config(&mut self, config: FieldConfig) {
        self.config = Some(config);
    }
}

/// How consumers should interpret a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FrameType {
    /// One series per frame, dimensions as field labels.
    TimeSeriesMulti,
    /// One flat frame, dimensions as columns.
    TimeSeriesWide,
}

/// Preferred rendering of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Visualization {
    Graph,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameMeta {
    pub frame_type: FrameType,
    pub preferred_visualization: Visualization,
}

impl FrameMeta {
    /// Metadata for a per-series graph frame.
    pub const fn graph() -> Self {
        Self {
            frame_type: FrameType::TimeSeriesMulti,
            preferred_visualization: Visualization::Graph,
        }
    }

    /// Metadata for the wide table frame.
    pub const fn table() -> Self {
        Self {
            frame_type: FrameType::TimeSeriesWide,
            preferred_visualization: Visualization::Table,
        }
    }
}

/// Errors raised when a row does not fit a frame's layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("row has {got} values but the frame has {expected} fields")]
    ColumnCount { expected: usize, got: usize },

    #[error("field `{field}` holds {expected:?} values, got {got:?}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        got: FieldType,
    },
}

/// A table of equally long, typed columns.
///
/// # Example
///
/// ```rust
/// use monwatch_types::{Field, FieldType, Frame, FrameMeta, Value};
///
/// let mut frame = Frame::new(
///     FrameMeta::table(),
///     vec![Field::new("time", FieldType::Time), Field::new("count", FieldType::Int64)],
/// );
/// assert!(frame.append_row(vec![Value::Int64(1)]).is_err());
/// assert_eq!(frame.row_count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    pub fields: Vec<Field>,
    pub meta: FrameMeta,
}

impl Frame {
    pub fn new(meta: FrameMeta, fields: Vec<Field>) -> Self {
        Self { fields, meta }
    }

    /// Append one row. The row is validated in full before any column is
    /// touched, so a rejected row leaves the frame unchanged.
    pub fn append_row(&mut self, row: Vec<Value>) -> Result<(), FrameError> {
        if row.len() != self.fields.len() {
            return Err(FrameError::ColumnCount {
                expected: self.fields.len(),
                got: row.len(),
            });
        }

        for (field, value) in self.fields.iter().zip(&row) {
            if field.field_type() != value.field_type() {
                return Err(FrameError::TypeMismatch {
                    field: field.name.clone(),
                    expected: field.field_type(),
                    got: value.field_type(),
                });
            }
        }

        for (field, value) in self.fields.iter_mut().zip(row) {
            field.values.push(value);
        }
        Ok(())
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.fields.first().map_or(0, Field::len)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Read back one row.
    pub fn row(&self, idx: usize) -> Option<Vec<Value>> {
        self.fields.iter().map(|f| f.values.get(idx)).collect()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_graph(&self) -> bool {
        self.meta.frame_type == FrameType::TimeSeriesMulti
    }
}
