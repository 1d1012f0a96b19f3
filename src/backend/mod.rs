//! Access to the server that owns schedule data.

pub mod demo;
pub mod odoo;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{AppConfig, BackendConfig};
use crate::error::BackendError;
use crate::model::{Conflict, DateRange, LineFilter, RescheduleRequest, ScheduleEntry, Workcenter};

pub use demo::DemoBackend;
pub use odoo::OdooBackend;

/// Outcome of a server-side mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Interpret whatever a mutation method returned.
    ///
    /// `{success, message}` objects are read as-is; a bare boolean is the
    /// success flag; `null` and action dictionaries count as success.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(success) => Self {
                success: *success,
                message: String::new(),
            },
            Value::Object(map) if map.contains_key("success") => Self {
                success: map.get("success").map(truthy).unwrap_or(false),
                message: map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            Value::Object(map) => Self::ok(
                map.get("params")
                    .and_then(|p| p.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or_default(),
            ),
            Value::Null => Self::ok(""),
            other => Self {
                success: truthy(other),
                message: String::new(),
            },
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// The remote procedures the Gantt view depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleBackend: Send + Sync {
    /// Schedule entries in `range` for the given line.
    async fn get_gantt_data(
        &self,
        range: DateRange,
        line: LineFilter,
    ) -> Result<Vec<ScheduleEntry>, BackendError>;

    /// Workcenters shown as rows, ordered by name.
    async fn get_workcenters(&self, line: LineFilter) -> Result<Vec<Workcenter>, BackendError>;

    async fn detect_schedule_conflicts(
        &self,
        range: DateRange,
        line: LineFilter,
    ) -> Result<Vec<Conflict>, BackendError>;

    async fn reschedule_item(&self, request: RescheduleRequest)
        -> Result<ActionResult, BackendError>;

    async fn cancel_schedule(&self, schedule_id: i64) -> Result<ActionResult, BackendError>;

    /// Web client URL of a schedule's form, when the backend has one.
    fn form_url(&self, schedule_id: i64) -> Option<String>;

    /// Short description for the status bar.
    fn label(&self) -> String;
}

/// Build the backend selected in the settings.
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn ScheduleBackend>, BackendError> {
    match &config.backend {
        BackendConfig::Demo { seed_file } => {
            let today = chrono::Local::now().date_naive();
            let backend = match seed_file {
                Some(path) => DemoBackend::from_snapshot_file(path).unwrap_or_else(|e| {
                    tracing::warn!(path = %path.display(), "could not seed demo data: {}", e);
                    DemoBackend::sample(today)
                }),
                None => DemoBackend::sample(today),
            };
            Ok(Arc::new(backend))
        }
        BackendConfig::Odoo {
            url,
            database,
            login,
            password,
        } => Ok(Arc::new(OdooBackend::new(
            url,
            database,
            login,
            password,
            config.request_timeout(),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({"success": true, "message": "Moved"}), true, "Moved")]
    #[case(json!({"success": false, "message": "Workcenter busy"}), false, "Workcenter busy")]
    #[case(json!({"success": 0}), false, "")]
    #[case(json!(true), true, "")]
    #[case(json!(false), false, "")]
    #[case(json!(null), true, "")]
    #[case(json!({"type": "ir.actions.client", "params": {"message": "Cancelled"}}), true, "Cancelled")]
    fn reads_mutation_results(#[case] value: Value, #[case] success: bool, #[case] message: &str) {
        let result = ActionResult::from_value(&value);
        assert_eq!(result.success, success);
        assert_eq!(result.message, message);
    }
}
