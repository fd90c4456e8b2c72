//! Query input: the editor JSON and the requested time window.

use chrono::{DateTime, Duration, Utc};
use monwatch_adapters::PageParams;
use serde::{Deserialize, Serialize};

use crate::QueryError;

/// Absolute time window of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// The window of the given length ending now.
    pub fn last(length: Duration) -> Self {
        let to = Utc::now();
        Self { from: to - length, to }
    }

    pub fn duration(&self) -> Duration {
        self.to - self.from
    }
}

/// Filters shared by every record query.
///
/// Field names follow the query editor (`includeShared`, `fromAlerting`);
/// the all-lowercase spellings are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorQuery {
    #[serde(default)]
    pub monitors: Vec<String>,
    #[serde(default)]
    pub checks: Option<Vec<String>>,
    #[serde(default)]
    pub instances: Option<Vec<String>>,
    #[serde(default, alias = "includeshared")]
    pub include_shared: bool,
    /// The request comes from an alerting evaluation; wide frames are omitted.
    #[serde(default, alias = "fromalerting")]
    pub from_alerting: bool,
}

impl MonitorQuery {
    /// Decode and validate query JSON.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, QueryError> {
        let query = Self::deserialize(json)
            .map_err(|e| QueryError::Validation(format!("json unmarshal: {e}")))?;
        if query.monitors.iter().all(|m| m.trim().is_empty()) {
            return Err(QueryError::Validation(
                "at least one monitor is required".to_string(),
            ));
        }
        Ok(query)
    }

    /// One parameter set per stream: own data, then shared data if requested.
    pub fn page_variants(&self, range: &TimeRange) -> Vec<PageParams> {
        let own = PageParams::new(range.from, range.to, self.monitors.clone())
            .checks(self.checks.clone())
            .instances(self.instances.clone());

        if self.include_shared {
            let shared = own.clone().shared();
            vec![own, shared]
        } else {
            vec![own]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_editor_json() {
        let query = MonitorQuery::from_json(&json!({
            "refId": "A",
            "queryType": "GetMonitorErrors",
            "monitors": ["awslambda"],
            "checks": ["Check"],
            "instances": null,
            "includeShared": true,
            "fromAlerting": false
        }))
        .unwrap();

        assert_eq!(query.monitors, vec!["awslambda"]);
        assert_eq!(query.checks, Some(vec!["Check".to_string()]));
        assert_eq!(query.instances, None);
        assert!(query.include_shared);
        assert!(!query.from_alerting);
    }

    #[test]
    fn test_accepts_lowercase_flags() {
        let query = MonitorQuery::from_json(&json!({
            "monitors": ["aws"],
            "includeshared": true,
            "fromalerting": true
        }))
        .unwrap();
        assert!(query.include_shared);
        assert!(query.from_alerting);
    }

    #[test]
    fn test_rejects_missing_or_empty_monitors() {
        for json in [json!({}), json!({"monitors": []}), json!({"monitors": [""]})] {
            let err = MonitorQuery::from_json(&json).unwrap_err();
            assert!(matches!(err, QueryError::Validation(_)));
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = MonitorQuery::from_json(&json!({"monitors": "aws"})).unwrap_err();
        assert!(matches!(err, QueryError::Validation(ref m) if m.starts_with("json unmarshal")));
    }

    #[test]
    fn test_page_variants() {
        let range = TimeRange::last(Duration::hours(6));
        let mut query = MonitorQuery {
            monitors: vec!["aws".into()],
            checks: Some(vec![]),
            ..MonitorQuery::default()
        };

        let own_only = query.page_variants(&range);
        assert_eq!(own_only.len(), 1);
        assert!(!own_only[0].only_shared);
        assert_eq!(own_only[0].checks, None);

        query.include_shared = true;
        let both = query.page_variants(&range);
        assert_eq!(both.len(), 2);
        assert!(!both[0].only_shared);
        assert!(both[1].only_shared);
        assert_eq!(both[1].from, range.from);
    }

    #[test]
    fn test_time_range_duration() {
        let range = TimeRange::last(Duration::hours(100));
        assert_eq!(range.duration(), Duration::hours(100));
    }
}
