//! JSON-RPC client for an Odoo server running the production planning module.
//!
//! Every call goes through `POST {url}/jsonrpc`. The session uid is obtained
//! once through `common.login` and reused for `object.execute_kw`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{ActionResult, ScheduleBackend};
use crate::error::BackendError;
use crate::model::schedule::wire_time;
use crate::model::{
    Conflict, DateRange, LineFilter, RescheduleRequest, ScheduleEntry, Workcenter,
};

const SCHEDULE_MODEL: &str = "megastock.production.schedule";
const WORKCENTER_MODEL: &str = "mrp.workcenter";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct OdooBackend {
    client: reqwest::Client,
    base_url: String,
    endpoint: String,
    database: String,
    login: String,
    password: String,
    uid: OnceCell<i64>,
    request_id: AtomicU64,
}

impl OdooBackend {
    pub fn new(
        url: &str,
        database: &str,
        login: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            endpoint: format!("{}/jsonrpc", base_url),
            base_url,
            database: database.to_string(),
            login: login.to_string(),
            password: password.to_string(),
            uid: OnceCell::new(),
            request_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, service: &str, method: &str, args: Value) -> Result<Value, BackendError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": { "service": service, "method": method, "args": args },
            "id": id,
        });

        let resp = self.client.post(&self.endpoint).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(BackendError::Http {
                status: resp.status().as_u16(),
            });
        }
        let payload: Value = resp.json().await?;
        rpc_result(payload)
    }

    async fn uid(&self) -> Result<i64, BackendError> {
        self.uid
            .get_or_try_init(|| async {
                let result = self
                    .call(
                        "common",
                        "login",
                        json!([self.database, self.login, self.password]),
                    )
                    .await?;
                match result.as_i64() {
                    Some(uid) if uid > 0 => {
                        debug!(uid, database = %self.database, "logged in");
                        Ok(uid)
                    }
                    _ => Err(BackendError::Authentication {
                        login: self.login.clone(),
                        database: self.database.clone(),
                    }),
                }
            })
            .await
            .copied()
    }

    async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value, BackendError> {
        let uid = self.uid().await?;
        debug!(model, method, "execute_kw");
        self.call(
            "object",
            "execute_kw",
            json!([self.database, uid, self.password, model, method, args, kwargs]),
        )
        .await
    }
}

/// Unwrap a JSON-RPC envelope into its `result`, turning `error` into
/// [`BackendError::Rpc`].
fn rpc_result(mut payload: Value) -> Result<Value, BackendError> {
    if let Some(error) = payload.get("error") {
        let message = error
            .pointer("/data/message")
            .or_else(|| error.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(BackendError::Rpc { message });
    }
    Ok(payload
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

/// Decode a list of records, skipping (and logging) those that do not parse.
fn decode_list<T: DeserializeOwned>(value: Value, what: &str) -> Result<Vec<T>, BackendError> {
    let Value::Array(items) = value else {
        return Err(BackendError::Decode(format!("expected a list of {}", what)));
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("skipping malformed {} record: {}", what, e);
                None
            }
        })
        .collect())
}

fn range_args(range: DateRange) -> Value {
    json!([
        range.from.format(DATE_FORMAT).to_string(),
        range.to.format(DATE_FORMAT).to_string()
    ])
}

fn workcenter_domain(line: &LineFilter) -> Value {
    match line {
        LineFilter::All => json!([]),
        LineFilter::Line(line) => json!([["production_line_type", "=", line]]),
    }
}

#[async_trait]
impl ScheduleBackend for OdooBackend {
    async fn get_gantt_data(
        &self,
        range: DateRange,
        line: LineFilter,
    ) -> Result<Vec<ScheduleEntry>, BackendError> {
        let result = self
            .execute_kw(
                SCHEDULE_MODEL,
                "get_gantt_data",
                range_args(range),
                json!({ "line_filter": line.as_str() }),
            )
            .await?;
        decode_list(result, "schedule")
    }

    async fn get_workcenters(&self, line: LineFilter) -> Result<Vec<Workcenter>, BackendError> {
        let result = self
            .execute_kw(
                WORKCENTER_MODEL,
                "search_read",
                json!([workcenter_domain(&line)]),
                json!({
                    "fields": ["name", "production_line_type", "capacity_hours", "time_efficiency"],
                    "order": "name",
                }),
            )
            .await?;
        decode_list(result, "workcenter")
    }

    async fn detect_schedule_conflicts(
        &self,
        range: DateRange,
        line: LineFilter,
    ) -> Result<Vec<Conflict>, BackendError> {
        let result = self
            .execute_kw(
                SCHEDULE_MODEL,
                "detect_schedule_conflicts",
                range_args(range),
                json!({ "line_filter": line.as_str() }),
            )
            .await?;
        // Servers without conflict detection answer with nothing.
        if result.is_null() {
            return Ok(Vec::new());
        }
        decode_list(result, "conflict")
    }

    async fn reschedule_item(
        &self,
        request: RescheduleRequest,
    ) -> Result<ActionResult, BackendError> {
        let result = self
            .execute_kw(
                SCHEDULE_MODEL,
                "reschedule_item",
                json!([request.schedule_id]),
                json!({
                    "new_workcenter_id": request.new_workcenter_id,
                    "new_start_time": wire_time::format(request.new_start),
                }),
            )
            .await?;
        Ok(ActionResult::from_value(&result))
    }

    async fn cancel_schedule(&self, schedule_id: i64) -> Result<ActionResult, BackendError> {
        let result = self
            .execute_kw(SCHEDULE_MODEL, "action_cancel", json!([[schedule_id]]), json!({}))
            .await?;
        Ok(ActionResult::from_value(&result))
    }

    fn form_url(&self, schedule_id: i64) -> Option<String> {
        Some(format!(
            "{}/web#id={}&model={}&view_type=form",
            self.base_url, schedule_id, SCHEDULE_MODEL
        ))
    }

    fn label(&self) -> String {
        format!("{} @ {}", self.database, self.base_url)
    }
}
