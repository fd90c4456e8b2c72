//! Records returned by the monitoring API, and the contract for turning
//! them into frame rows.
//!
//! Every field is optional because the API marks them all nullable. Missing
//! values are only an error at extraction time, and only for the record
//! that lacks them.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{Field, FieldType, Frame, FrameMeta, Labels, Severity, StatusMap, Value, TIME_FIELD};

/// Errors extracting values from a single record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("invalid timestamp `{value}`: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

/// Shared extraction contract for the three record kinds.
///
/// Implementors describe their measurement and dimensions; the provided
/// methods derive the grouping key, row values and frame layouts from
/// those, so every kind shapes its frames the same way.
pub trait FrameRecord {
    /// Short name used in logs.
    const KIND: &'static str;
    /// Name of the measurement column.
    const MEASUREMENT: &'static str;
    /// Type of the measurement column.
    const MEASUREMENT_TYPE: FieldType;
    /// Dimension names, in column order.
    const DIMENSIONS: &'static [&'static str];

    /// The timestamp exactly as the API sent it.
    fn raw_timestamp(&self) -> Option<&str>;

    /// The measurement value for this record.
    fn measurement(&self, statuses: &StatusMap) -> Result<Value, RecordError>;

    /// Dimension values, in [`Self::DIMENSIONS`] order.
    fn dimension_values(&self) -> Result<Vec<&str>, RecordError>;

    /// Parse the record's RFC 3339 timestamp.
    fn timestamp(&self) -> Result<DateTime<Utc>, RecordError> {
        let raw = self
            .raw_timestamp()
            .ok_or(RecordError::MissingField("timestamp"))?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RecordError::InvalidTimestamp {
                value: raw.to_string(),
                reason: e.to_string(),
            })
    }

    /// Key identifying the series this record belongs to.
    fn grouping_key(&self) -> Result<String, RecordError> {
        Ok(grouping_key(&self.dimension_values()?))
    }

    /// Dimensions as labels, keyed by dimension name.
    fn labels(&self) -> Result<Labels, RecordError> {
        let values = self.dimension_values()?;
        Ok(Self::DIMENSIONS
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    /// Row for this record's graph frame: timestamp and measurement.
    fn graph_row_values(
        &self,
        timestamp: DateTime<Utc>,
        statuses: &StatusMap,
    ) -> Result<Vec<Value>, RecordError> {
        Ok(vec![Value::Time(timestamp), self.measurement(statuses)?])
    }

    /// Row for the wide frame: timestamp, measurement, then each dimension.
    fn table_row_values(
        &self,
        timestamp: DateTime<Utc>,
        statuses: &StatusMap,
    ) -> Result<Vec<Value>, RecordError> {
        let dimensions = self.dimension_values()?;
        let mut row = Vec::with_capacity(2 + dimensions.len());
        row.push(Value::Time(timestamp));
        row.push(self.measurement(statuses)?);
        row.extend(dimensions.into_iter().map(Value::from));
        Ok(row)
    }

    /// Empty graph frame with this record's dimensions as measurement labels.
    fn graph_table_layout(&self) -> Result<Frame, RecordError> {
        Ok(Frame::new(
            FrameMeta::graph(),
            vec![
                Field::new(TIME_FIELD, FieldType::Time),
                Field::new(Self::MEASUREMENT, Self::MEASUREMENT_TYPE).with_labels(self.labels()?),
            ],
        ))
    }

    /// Empty wide frame with one column per dimension.
    fn wide_table_layout() -> Frame
    where
        Self: Sized,
    {
        let mut fields = vec![
            Field::new(TIME_FIELD, FieldType::Time),
            Field::new(Self::MEASUREMENT, Self::MEASUREMENT_TYPE),
        ];
        fields.extend(
            Self::DIMENSIONS
                .iter()
                .map(|name| Field::new(*name, FieldType::String)),
        );
        Frame::new(FrameMeta::table(), fields)
    }
}

/// Build a grouping key from dimension values.
///
/// Values are joined with `|`; backslashes and pipes inside a value are
/// escaped, so distinct tuples never collide.
///
/// ```rust
/// use monwatch_types::grouping_key;
///
/// assert_eq!(grouping_key(&["us-east-1", "ping", "aws"]), "us-east-1|ping|aws");
/// assert_ne!(grouping_key(&["a|b", "c"]), grouping_key(&["a", "b|c"]));
/// ```
pub fn grouping_key<S: AsRef<str>>(values: &[S]) -> String {
    let mut key = String::new();
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            key.push('|');
        }
        for ch in value.as_ref().chars() {
            if ch == '\\' || ch == '|' {
                key.push('\\');
            }
            key.push(ch);
        }
    }
    key
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, RecordError> {
    value.as_deref().ok_or(RecordError::MissingField(name))
}

/// Error count for a monitor check in one instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorCount {
    pub timestamp: Option<String>,
    pub count: Option<i64>,
    pub instance: Option<String>,
    pub check: Option<String>,
    pub monitor_logical_name: Option<String>,
}

impl ErrorCount {
    pub fn new(timestamp: &str, count: i64, instance: &str, check: &str, monitor: &str) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            count: Some(count),
            instance: Some(instance.to_string()),
            check: Some(check.to_string()),
            monitor_logical_name: Some(monitor.to_string()),
        }
    }
}

impl FrameRecord for ErrorCount {
    const KIND: &'static str = "errors";
    const MEASUREMENT: &'static str = "count";
    const MEASUREMENT_TYPE: FieldType = FieldType::Int64;
    const DIMENSIONS: &'static [&'static str] = &["instance", "check", "monitor"];

    fn raw_timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    fn measurement(&self, _statuses: &StatusMap) -> Result<Value, RecordError> {
        self.count
            .map(Value::Int64)
            .ok_or(RecordError::MissingField("count"))
    }

    fn dimension_values(&self) -> Result<Vec<&str>, RecordError> {
        Ok(vec![
            required(&self.instance, "instance")?,
            required(&self.check, "check")?,
            required(&self.monitor_logical_name, "monitor_logical_name")?,
        ])
    }
}

/// Response time telemetry for a monitor check in one instance.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Telemetry {
    pub timestamp: Option<String>,
    pub value: Option<f32>,
    pub instance: Option<String>,
    pub check: Option<String>,
    pub monitor_logical_name: Option<String>,
}

impl Telemetry {
    pub fn new(timestamp: &str, value: f32, instance: &str, check: &str, monitor: &str) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            value: Some(value),
            instance: Some(instance.to_string()),
            check: Some(check.to_string()),
            monitor_logical_name: Some(monitor.to_string()),
        }
    }
}

impl FrameRecord for Telemetry {
    const KIND: &'static str = "telemetry";
    const MEASUREMENT: &'static str = "response time (ms)";
    const MEASUREMENT_TYPE: FieldType = FieldType::Float32;
    const DIMENSIONS: &'static [&'static str] = &["instance", "check", "monitor"];

    fn raw_timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    fn measurement(&self, _statuses: &StatusMap) -> Result<Value, RecordError> {
        self.value
            .map(Value::Float32)
            .ok_or(RecordError::MissingField("value"))
    }

    fn dimension_values(&self) -> Result<Vec<&str>, RecordError> {
        Ok(vec![
            required(&self.instance, "instance")?,
            required(&self.check, "check")?,
            required(&self.monitor_logical_name, "monitor_logical_name")?,
        ])
    }
}

/// A status page component changing state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusChange {
    pub timestamp: Option<String>,
    pub status: Option<String>,
    pub component: Option<String>,
    pub monitor_logical_name: Option<String>,
}

impl StatusChange {
    pub fn new(timestamp: &str, status: &str, component: &str, monitor: &str) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            status: Some(status.to_string()),
            component: Some(component.to_string()),
            monitor_logical_name: Some(monitor.to_string()),
        }
    }
}

impl FrameRecord for StatusChange {
    const KIND: &'static str = "status_changes";
    const MEASUREMENT: &'static str = "status";
    const MEASUREMENT_TYPE: FieldType = FieldType::Int8;
    const DIMENSIONS: &'static [&'static str] = &["component", "monitor"];

    fn raw_timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Silent lookup; unrecognized text is reported once, from the graph row.
    fn measurement(&self, statuses: &StatusMap) -> Result<Value, RecordError> {
        let status = required(&self.status, "status")?;
        let severity = statuses.get(status).unwrap_or(Severity::Unknown);
        Ok(Value::Int8(severity.ordinal()))
    }

    fn graph_row_values(
        &self,
        timestamp: DateTime<Utc>,
        statuses: &StatusMap,
    ) -> Result<Vec<Value>, RecordError> {
        let status = required(&self.status, "status")?;
        let severity = statuses.map_status(status);
        Ok(vec![Value::Time(timestamp), Value::Int8(severity.ordinal())])
    }

    fn dimension_values(&self) -> Result<Vec<&str>, RecordError> {
        Ok(vec![
            required(&self.component, "component")?,
            required(&self.monitor_logical_name, "monitor_logical_name")?,
        ])
    }
}
