//! Option lists for query editors.
//!
//! Each list is a JSON array of `{label, value}` pairs. [`QueryEngine::call_resource`]
//! dispatches a resource path and a request URL to the matching list.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use monwatch_adapters::ApiError;

use crate::QueryEngine;

/// Build identifier reported by the `BuildHash` resource.
pub const BUILD_HASH: &str = match option_env!("MONWATCH_BUILD_HASH") {
    Some(hash) => hash,
    None => "dev",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Status and JSON body of a resource call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceResponse {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ResourceResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    fn message(status: u16, message: &str) -> Self {
        Self {
            status,
            body: Some(json!({ "message": message })),
        }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            body: None,
        }
    }
}

/// Parameters of the check and instance lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ResourceParams {
    monitors: Option<Vec<String>>,
    include_shared: bool,
}

impl ResourceParams {
    fn from_url(url: &str) -> Self {
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "monitors" if params.monitors.is_none() => {
                    params.monitors = Some(
                        value
                            .split(',')
                            .filter(|m| !m.is_empty())
                            .map(str::to_string)
                            .collect(),
                    );
                }
                "includeShared" => params.include_shared = value == "true",
                _ => {}
            }
        }
        params
    }
}

impl QueryEngine {
    /// One option per monitor: display name, logical name.
    pub async fn monitor_options(&self) -> Result<Vec<SelectOption>, ApiError> {
        let monitors = self.api.list_monitors().await?;
        let options = monitors
            .into_iter()
            .filter_map(|monitor| match (monitor.name, monitor.logical_name) {
                (Some(name), Some(logical_name)) => Some(SelectOption::new(name, logical_name)),
                _ => {
                    warn!("Skipping monitor without a name");
                    None
                }
            })
            .collect();
        Ok(options)
    }

    /// One option per check of each monitor, sorted by label.
    pub async fn check_options(
        &self,
        monitors: &[String],
        include_shared: bool,
    ) -> Result<Vec<SelectOption>, ApiError> {
        let lists = self.api.list_checks(monitors, include_shared).await?;
        let mut options = Vec::new();
        for list in lists {
            let monitor = list.monitor_logical_name.unwrap_or_default();
            for check in list.checks.unwrap_or_default() {
                match (check.name, check.logical_name) {
                    (Some(name), Some(logical_name)) => {
                        options.push(SelectOption::new(format!("{monitor}:{name}"), logical_name))
                    }
                    _ => warn!(monitor = %monitor, "Skipping check without a name"),
                }
            }
        }
        options.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(options)
    }

    /// The union of every monitor's instances, de-duplicated and sorted.
    pub async fn instance_options(
        &self,
        monitors: &[String],
        include_shared: bool,
    ) -> Result<Vec<SelectOption>, ApiError> {
        let lists = self.api.list_instances(monitors, include_shared).await?;
        let mut instances: Vec<String> = lists
            .into_iter()
            .flat_map(|list| list.instances.unwrap_or_default())
            .collect();
        instances.sort();
        instances.dedup();
        Ok(instances
            .into_iter()
            .map(|instance| SelectOption::new(instance.clone(), instance))
            .collect())
    }

    /// Answer a resource request. `url` carries the parameters in its
    /// query string (`monitors=a,b&includeShared=true`).
    pub async fn call_resource(&self, path: &str, url: &str) -> ResourceResponse {
        debug!(path, url, "Resource request");
        let params = ResourceParams::from_url(url);

        let result = match path {
            "Monitors" => self.monitor_options().await,
            "Checks" | "Instances" => {
                let Some(monitors) = params.monitors.as_deref() else {
                    return ResourceResponse::message(400, "monitors parameter is required");
                };
                if path == "Checks" {
                    self.check_options(monitors, params.include_shared).await
                } else {
                    self.instance_options(monitors, params.include_shared).await
                }
            }
            "BuildHash" => return ResourceResponse::ok(json!({ "hash": BUILD_HASH })),
            _ => return ResourceResponse::not_found(),
        };

        match result.map(serde_json::to_value) {
            Ok(Ok(body)) => ResourceResponse::ok(body),
            Ok(Err(err)) => {
                error!(path, error = %err, "Failed to encode options");
                ResourceResponse::message(500, "internal server error")
            }
            Err(err) => {
                error!(path, error = %err, "Resource list failed");
                ResourceResponse::message(500, "internal server error")
            }
        }
    }
}
