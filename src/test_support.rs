//! Scripted `MonitorApi` for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use monwatch_adapters::{
    ApiError, AuthStatus, MonitorApi, MonitorChecks, MonitorInfo, MonitorInstances, Page,
    PageParams, PageResponse,
};
use monwatch_types::{ErrorCount, StatusChange, Telemetry};

use crate::config::EngineConfig;
use crate::QueryEngine;

pub const TS: &str = "2022-12-07T18:00:00Z";

/// What the stub answers for one page call.
pub enum Step<T> {
    Page(PageResponse<T>),
    Fail(ApiError),
    /// Answered on every call and never consumed.
    Forever(Page<T>),
    /// Never answers.
    Hang,
}

impl<T> Step<T> {
    pub fn page(entries: Vec<T>, cursor: Option<&str>) -> Self {
        Step::Page(PageResponse::Page(Page {
            entries,
            next_cursor: cursor.map(str::to_string),
        }))
    }

    pub fn last(entries: Vec<T>) -> Self {
        Step::Page(PageResponse::Page(Page::last(entries)))
    }

    pub fn status(status: u16, body: &str) -> Self {
        Step::Page(PageResponse::NonSuccess {
            status,
            body: body.to_string(),
        })
    }
}

/// Steps per stream, keyed by `only_shared`.
type Script<T> = Mutex<HashMap<bool, VecDeque<Step<T>>>>;

pub struct StubApi {
    errors: Script<ErrorCount>,
    telemetry: Script<Telemetry>,
    status_changes: Script<StatusChange>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<PageParams>>,
    monitors: Vec<MonitorInfo>,
    checks: Vec<MonitorChecks>,
    instances: Vec<MonitorInstances>,
    resource_error: Option<ApiError>,
    resource_args: Mutex<Vec<(Vec<String>, bool)>>,
    auth: Result<AuthStatus, ApiError>,
}

impl Default for StubApi {
    fn default() -> Self {
        Self {
            errors: Mutex::default(),
            telemetry: Mutex::default(),
            status_changes: Mutex::default(),
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::default(),
            monitors: Vec::new(),
            checks: Vec::new(),
            instances: Vec::new(),
            resource_error: None,
            resource_args: Mutex::default(),
            auth: Ok(AuthStatus {
                code: 200,
                text: "200 OK".to_string(),
            }),
        }
    }
}

fn push<T>(script: &Script<T>, shared: bool, step: Step<T>) {
    script
        .lock()
        .unwrap()
        .entry(shared)
        .or_default()
        .push_back(step);
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(self, shared: bool, step: Step<ErrorCount>) -> Self {
        push(&self.errors, shared, step);
        self
    }

    pub fn telemetry(self, shared: bool, step: Step<Telemetry>) -> Self {
        push(&self.telemetry, shared, step);
        self
    }

    pub fn status_changes(self, shared: bool, step: Step<StatusChange>) -> Self {
        push(&self.status_changes, shared, step);
        self
    }

    /// Sleep before answering each page call.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn monitors(mut self, monitors: Vec<MonitorInfo>) -> Self {
        self.monitors = monitors;
        self
    }

    pub fn checks(mut self, checks: Vec<MonitorChecks>) -> Self {
        self.checks = checks;
        self
    }

    pub fn instances(mut self, instances: Vec<MonitorInstances>) -> Self {
        self.instances = instances;
        self
    }

    /// Fail every option list call.
    pub fn failing_resources(mut self, err: ApiError) -> Self {
        self.resource_error = Some(err);
        self
    }

    pub fn auth(mut self, code: u16, text: &str) -> Self {
        self.auth = Ok(AuthStatus {
            code,
            text: text.to_string(),
        });
        self
    }

    pub fn auth_error(mut self, err: ApiError) -> Self {
        self.auth = Err(err);
        self
    }

    /// Number of page calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Parameters of every page call, in call order.
    pub fn seen(&self) -> Vec<PageParams> {
        self.seen.lock().unwrap().clone()
    }

    /// Monitors and shared flag of every check or instance list call.
    pub fn resource_args(&self) -> Vec<(Vec<String>, bool)> {
        self.resource_args.lock().unwrap().clone()
    }

    async fn serve<T: Clone>(
        &self,
        script: &Script<T>,
        params: &PageParams,
    ) -> Result<PageResponse<T>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(params.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let step = {
            let mut script = script.lock().unwrap();
            let queue = script.entry(params.only_shared).or_default();
            match queue.front() {
                Some(Step::Forever(page)) => Some(Step::Forever(page.clone())),
                _ => queue.pop_front(),
            }
        };

        match step {
            None => Ok(PageResponse::Page(Page::last(Vec::new()))),
            Some(Step::Page(response)) => Ok(response),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Forever(page)) => Ok(PageResponse::Page(page)),
            Some(Step::Hang) => futures::future::pending().await,
        }
    }

    fn resource<T: Clone>(
        &self,
        items: &[T],
        monitors: &[String],
        include_shared: bool,
    ) -> Result<Vec<T>, ApiError> {
        self.resource_args
            .lock()
            .unwrap()
            .push((monitors.to_vec(), include_shared));
        match &self.resource_error {
            Some(err) => Err(err.clone()),
            None => Ok(items.to_vec()),
        }
    }
}

#[async_trait]
impl MonitorApi for StubApi {
    async fn fetch_errors_page(
        &self,
        params: &PageParams,
    ) -> Result<PageResponse<ErrorCount>, ApiError> {
        self.serve(&self.errors, params).await
    }

    async fn fetch_telemetry_page(
        &self,
        params: &PageParams,
    ) -> Result<PageResponse<Telemetry>, ApiError> {
        self.serve(&self.telemetry, params).await
    }

    async fn fetch_status_changes_page(
        &self,
        params: &PageParams,
    ) -> Result<PageResponse<StatusChange>, ApiError> {
        self.serve(&self.status_changes, params).await
    }

    async fn list_monitors(&self) -> Result<Vec<MonitorInfo>, ApiError> {
        match &self.resource_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.monitors.clone()),
        }
    }

    async fn list_checks(
        &self,
        monitors: &[String],
        include_shared: bool,
    ) -> Result<Vec<MonitorChecks>, ApiError> {
        self.resource(&self.checks, monitors, include_shared)
    }

    async fn list_instances(
        &self,
        monitors: &[String],
        include_shared: bool,
    ) -> Result<Vec<MonitorInstances>, ApiError> {
        self.resource(&self.instances, monitors, include_shared)
    }

    async fn verify_auth(&self) -> Result<AuthStatus, ApiError> {
        self.auth.clone()
    }
}

pub fn params() -> PageParams {
    let to = Utc::now();
    PageParams::new(to - ChronoDuration::hours(6), to, vec!["awslambda".to_string()])
}

pub fn error_count(count: i64) -> ErrorCount {
    error_count_at(TS, count)
}

pub fn error_count_at(ts: &str, count: i64) -> ErrorCount {
    ErrorCount::new(ts, count, "us-east-1", "Check", "awslambda")
}

pub fn telemetry(value: f32) -> Telemetry {
    Telemetry::new(TS, value, "us-east-1", "Check", "awslambda")
}

pub fn status_change(status: &str) -> StatusChange {
    StatusChange::new(TS, status, "api", "awslambda")
}

pub fn engine(api: StubApi) -> (QueryEngine, Arc<StubApi>) {
    engine_with(api, EngineConfig::default())
}

pub fn engine_with(api: StubApi, config: EngineConfig) -> (QueryEngine, Arc<StubApi>) {
    let api = Arc::new(api);
    (QueryEngine::new(api.clone(), config), api)
}
