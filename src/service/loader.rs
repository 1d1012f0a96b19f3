//! Background requests against the schedule backend.
//!
//! Requests run on the tokio runtime and report back through a channel that
//! the UI drains once per frame. Only the most recent reload is ever applied.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::notify::Notification;
use super::refresh::RefreshTimer;
use crate::backend::{ActionResult, ScheduleBackend};
use crate::error::BackendError;
use crate::model::{GanttViewState, RescheduleRequest, ScheduleQuery, ScheduleSnapshot};

/// Wakes the UI after an event has been queued.
pub type Repaint = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug)]
pub enum ServiceEvent {
    Loaded {
        seq: u64,
        result: Result<ScheduleSnapshot, BackendError>,
    },
    Rescheduled {
        request: RescheduleRequest,
        result: Result<ActionResult, BackendError>,
    },
    Cancelled {
        schedule_id: i64,
        result: Result<ActionResult, BackendError>,
    },
    RefreshTick,
}

pub struct ScheduleService {
    backend: Arc<dyn ScheduleBackend>,
    runtime: Handle,
    tx: UnboundedSender<ServiceEvent>,
    rx: UnboundedReceiver<ServiceEvent>,
    repaint: Repaint,
    next_seq: u64,
    latest_seq: Option<u64>,
    tasks: Vec<JoinHandle<()>>,
    timer: Option<RefreshTimer>,
    shut_down: bool,
}

async fn fetch_snapshot(
    backend: &dyn ScheduleBackend,
    query: ScheduleQuery,
) -> Result<ScheduleSnapshot, BackendError> {
    let ScheduleQuery { range, line } = query;
    let (entries, workcenters, conflicts) = tokio::try_join!(
        backend.get_gantt_data(range, line.clone()),
        backend.get_workcenters(line.clone()),
        backend.detect_schedule_conflicts(range, line),
    )?;
    Ok(ScheduleSnapshot {
        workcenters,
        entries,
        conflicts,
    })
}

impl ScheduleService {
    pub fn new(backend: Arc<dyn ScheduleBackend>, runtime: Handle, repaint: Repaint) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            runtime,
            tx,
            rx,
            repaint,
            next_seq: 1,
            latest_seq: None,
            tasks: Vec::new(),
            timer: None,
            shut_down: false,
        }
    }

    pub fn backend_label(&self) -> String {
        self.backend.label()
    }

    pub fn form_url(&self, schedule_id: i64) -> Option<String> {
        self.backend.form_url(schedule_id)
    }

    /// Sequence number of the reload whose response will be applied.
    #[cfg(test)]
    pub fn latest_seq(&self) -> Option<u64> {
        self.latest_seq
    }

    #[cfg(test)]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    fn spawn<F>(&mut self, fut: F)
    where
        F: Future<Output = ServiceEvent> + Send + 'static,
    {
        self.tasks.retain(|task| !task.is_finished());
        let tx = self.tx.clone();
        let repaint = Arc::clone(&self.repaint);
        self.tasks.push(self.runtime.spawn(async move {
            let event = fut.await;
            if tx.send(event).is_ok() {
                repaint();
            }
        }));
    }

    /// Fetch entries, workcenters and conflicts for `query`. Any response to
    /// an earlier reload is discarded once this one is issued.
    pub fn request_reload(&mut self, query: ScheduleQuery) -> Option<u64> {
        if self.shut_down {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_seq = Some(seq);
        debug!(seq, from = %query.range.from, to = %query.range.to, line = query.line.as_str(), "reload");

        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            ServiceEvent::Loaded {
                seq,
                result: fetch_snapshot(backend.as_ref(), query).await,
            }
        });
        Some(seq)
    }

    pub fn request_reschedule(&mut self, request: RescheduleRequest) {
        if self.shut_down {
            return;
        }
        info!(
            schedule = request.schedule_id,
            workcenter = request.new_workcenter_id,
            start = %request.new_start,
            "reschedule"
        );
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = backend.reschedule_item(request.clone()).await;
            ServiceEvent::Rescheduled { request, result }
        });
    }

    pub fn request_cancel(&mut self, schedule_id: i64) {
        if self.shut_down {
            return;
        }
        info!(schedule = schedule_id, "cancel");
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            ServiceEvent::Cancelled {
                schedule_id,
                result: backend.cancel_schedule(schedule_id).await,
            }
        });
    }

    /// Reload the range and line currently shown in `state`.
    pub fn reload_current(&mut self, state: &mut GanttViewState) {
        match state.query() {
            Ok(query) => {
                state.loading = true;
                self.request_reload(query);
            }
            Err(e) => warn!("not reloading: {}", e),
        }
    }

    /// Apply one event to the view state. Returns the notification to show,
    /// if any.
    pub fn handle_event(
        &mut self,
        event: ServiceEvent,
        state: &mut GanttViewState,
        now: NaiveDateTime,
    ) -> Option<Notification> {
        if self.shut_down {
            return None;
        }
        match event {
            ServiceEvent::Loaded { seq, result } => {
                if self.latest_seq != Some(seq) {
                    debug!(seq, latest = ?self.latest_seq, "dropping stale reload");
                    return None;
                }
                match result {
                    Ok(snapshot) => {
                        info!(
                            seq,
                            entries = snapshot.entries.len(),
                            workcenters = snapshot.workcenters.len(),
                            conflicts = snapshot.conflicts.len(),
                            "schedule loaded"
                        );
                        state.apply_snapshot(snapshot, now);
                        None
                    }
                    Err(e) => {
                        error!(seq, "reload failed: {}", e);
                        state.loading = false;
                        let message = if e.is_transient() {
                            format!("{}. Refresh to try again.", e)
                        } else {
                            e.to_string()
                        };
                        Some(Notification::error("Could not load schedule", message))
                    }
                }
            }
            ServiceEvent::Rescheduled { request, result } => match result {
                Ok(outcome) if outcome.success => {
                    self.reload_current(state);
                    Some(Notification::success(
                        "Rescheduled",
                        non_empty(outcome.message, "Schedule updated"),
                    ))
                }
                Ok(outcome) => {
                    warn!(schedule = request.schedule_id, "reschedule rejected: {}", outcome.message);
                    Some(Notification::warning(
                        "Reschedule failed",
                        non_empty(outcome.message, "The server rejected the change"),
                    ))
                }
                Err(e) => {
                    warn!(schedule = request.schedule_id, "reschedule failed: {}", e);
                    Some(Notification::warning("Reschedule failed", e.to_string()))
                }
            },
            ServiceEvent::Cancelled {
                schedule_id,
                result,
            } => match result {
                Ok(outcome) if outcome.success => {
                    self.reload_current(state);
                    Some(Notification::success(
                        "Schedule cancelled",
                        non_empty(outcome.message, "The schedule was cancelled"),
                    ))
                }
                Ok(outcome) => {
                    warn!(schedule = schedule_id, "cancel rejected: {}", outcome.message);
                    Some(Notification::warning(
                        "Cancel failed",
                        non_empty(outcome.message, "The server rejected the change"),
                    ))
                }
                Err(e) => {
                    warn!(schedule = schedule_id, "cancel failed: {}", e);
                    Some(Notification::warning("Cancel failed", e.to_string()))
                }
            },
            ServiceEvent::RefreshTick => {
                // Skip while a reload is pending or the user is dragging.
                if !state.loading && state.drag.gesture().is_none() {
                    self.reload_current(state);
                }
                None
            }
        }
    }

    /// Drain every queued event without blocking.
    pub fn poll(&mut self, state: &mut GanttViewState, now: NaiveDateTime) -> Vec<Notification> {
        let mut notifications = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            notifications.extend(self.handle_event(event, state, now));
        }
        notifications
    }

    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<ServiceEvent> {
        self.rx.recv().await
    }

    pub fn start_auto_refresh(&mut self, period: Duration) {
        if self.shut_down {
            return;
        }
        self.timer = Some(RefreshTimer::start(
            &self.runtime,
            period,
            self.tx.clone(),
            Arc::clone(&self.repaint),
        ));
    }

    pub fn stop_auto_refresh(&mut self) {
        if self.timer.take().is_some() {
            debug!("auto-refresh stopped");
        }
    }

    pub fn auto_refresh_period(&self) -> Option<Duration> {
        self.timer
            .as_ref()
            .filter(|timer| timer.is_running())
            .map(RefreshTimer::period)
    }

    /// Stop the timer, abort in-flight requests and ignore anything still
    /// queued. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.timer = None;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
        info!("schedule service stopped");
    }
}

impl Drop for ScheduleService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockScheduleBackend;
    use crate::model::{LineFilter, ScheduleEntry, ViewMode, Workcenter};
    use crate::service::notify::NotificationLevel;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn now() -> NaiveDateTime {
        today().and_hms_opt(12, 0, 0).unwrap()
    }

    fn state() -> GanttViewState {
        GanttViewState::new(ViewMode::Week, LineFilter::All, today())
    }

    fn request() -> RescheduleRequest {
        RescheduleRequest {
            schedule_id: 7,
            new_workcenter_id: 2,
            new_start: today().and_hms_opt(8, 0, 0).unwrap(),
        }
    }

    fn service(mock: MockScheduleBackend) -> ScheduleService {
        ScheduleService::new(Arc::new(mock), Handle::current(), Arc::new(|| {}))
    }

    fn expect_one_reload(mock: &mut MockScheduleBackend) {
        mock.expect_get_gantt_data()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_get_workcenters()
            .times(1)
            .returning(|_| Ok(vec![Workcenter::new(2, "Flexo", "cajas")]));
        mock.expect_detect_schedule_conflicts()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
    }

    #[tokio::test]
    async fn successful_reschedule_reloads_exactly_once() {
        let mut mock = MockScheduleBackend::new();
        mock.expect_reschedule_item()
            .times(1)
            .returning(|_| Ok(ActionResult::ok("SCH/00007 moved")));
        expect_one_reload(&mut mock);
        let mut service = service(mock);
        let mut state = state();

        service.request_reschedule(request());
        let event = service.recv().await.unwrap();
        let note = service.handle_event(event, &mut state, now()).unwrap();
        assert_eq!(note.level, NotificationLevel::Success);
        assert_eq!(note.message, "SCH/00007 moved");
        assert!(state.loading);
        assert_eq!(service.latest_seq(), Some(1));

        let loaded = service.recv().await.unwrap();
        assert!(matches!(loaded, ServiceEvent::Loaded { seq: 1, .. }));
        assert_eq!(service.handle_event(loaded, &mut state, now()), None);
        assert!(!state.loading);
        assert_eq!(state.workcenters().len(), 1);
        assert_eq!(state.last_update, Some(now()));
    }

    #[tokio::test]
    async fn rejected_reschedule_warns_without_reloading() {
        let mut mock = MockScheduleBackend::new();
        mock.expect_reschedule_item()
            .times(1)
            .returning(|_| Ok(ActionResult::failed("Workcenter busy")));
        mock.expect_get_gantt_data().never();
        let mut service = service(mock);
        let mut state = state();

        service.request_reschedule(request());
        let event = service.recv().await.unwrap();
        let note = service.handle_event(event, &mut state, now()).unwrap();
        assert_eq!(note.level, NotificationLevel::Warning);
        assert_eq!(note.message, "Workcenter busy");
        assert_eq!(service.latest_seq(), None);
        assert!(!state.loading);
        assert!(service.poll(&mut state, now()).is_empty());
    }

    #[tokio::test]
    async fn backend_error_on_reschedule_is_a_single_warning() {
        let mut mock = MockScheduleBackend::new();
        mock.expect_reschedule_item()
            .times(1)
            .returning(|r| Err(BackendError::NotFound(r.schedule_id)));
        let mut service = service(mock);
        let mut state = state();

        service.request_reschedule(request());
        let event = service.recv().await.unwrap();
        let note = service.handle_event(event, &mut state, now()).unwrap();
        assert_eq!(note.level, NotificationLevel::Warning);
        assert_eq!(note.message, "Schedule 7 not found");
        assert_eq!(service.latest_seq(), None);
    }

    #[tokio::test]
    async fn stale_reload_is_ignored() {
        let mut mock = MockScheduleBackend::new();
        mock.expect_get_gantt_data()
            .times(2)
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_get_workcenters()
            .times(2)
            .returning(|_| Ok(Vec::new()));
        mock.expect_detect_schedule_conflicts()
            .times(2)
            .returning(|_, _| Ok(Vec::new()));
        let mut service = service(mock);
        let mut state = state();
        let query = state.query().unwrap();

        let first = service.request_reload(query.clone()).unwrap();
        let second = service.request_reload(query).unwrap();
        assert!(second > first);

        let start = today().and_hms_opt(8, 0, 0).unwrap();
        let stale = ScheduleSnapshot {
            entries: vec![ScheduleEntry::new(1, 1, start, start + chrono::Duration::hours(2))],
            ..ScheduleSnapshot::default()
        };
        let note = service.handle_event(
            ServiceEvent::Loaded {
                seq: first,
                result: Ok(stale),
            },
            &mut state,
            now(),
        );
        assert_eq!(note, None);
        assert!(state.entries().is_empty());
        assert_eq!(state.last_update, None);

        let mut applied = 0;
        for _ in 0..2 {
            if let Some(ServiceEvent::Loaded { seq, result }) = service.recv().await {
                if seq == second {
                    applied += 1;
                }
                service.handle_event(ServiceEvent::Loaded { seq, result }, &mut state, now());
            }
        }
        assert_eq!(applied, 1);
        assert_eq!(state.last_update, Some(now()));
    }

    #[tokio::test]
    async fn failed_reload_keeps_last_good_data() {
        let mut mock = MockScheduleBackend::new();
        mock.expect_get_gantt_data()
            .returning(|_, _| Err(BackendError::Http { status: 502 }));
        mock.expect_get_workcenters().returning(|_| Ok(Vec::new()));
        mock.expect_detect_schedule_conflicts()
            .returning(|_, _| Ok(Vec::new()));
        let mut service = service(mock);
        let mut state = state();
        state.snapshot.workcenters.push(Workcenter::new(1, "Corrugator", "cajas"));
        state.loading = true;

        service.request_reload(state.query().unwrap());
        let event = service.recv().await.unwrap();
        let note = service.handle_event(event, &mut state, now()).unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert!(note.message.contains("502"));
        assert!(note.message.ends_with("Refresh to try again."));
        assert!(!state.loading);
        assert_eq!(state.workcenters().len(), 1);
    }

    #[tokio::test]
    async fn refresh_tick_is_skipped_while_loading() {
        let mock = MockScheduleBackend::new();
        let mut service = service(mock);
        let mut state = state();
        state.loading = true;
        service.handle_event(ServiceEvent::RefreshTick, &mut state, now());
        assert_eq!(service.latest_seq(), None);
    }

    #[tokio::test]
    async fn shutdown_turns_requests_into_no_ops() {
        let mut mock = MockScheduleBackend::new();
        mock.expect_get_gantt_data().never();
        mock.expect_reschedule_item().never();
        mock.expect_cancel_schedule().never();
        let mut service = service(mock);
        service.start_auto_refresh(Duration::from_secs(60));
        assert!(service.auto_refresh_period().is_some());

        service.shutdown();
        service.shutdown();
        assert!(service.is_shut_down());
        assert_eq!(service.auto_refresh_period(), None);

        let mut state = state();
        assert_eq!(service.request_reload(state.query().unwrap()), None);
        service.request_reschedule(request());
        service.request_cancel(7);
        service.start_auto_refresh(Duration::from_secs(60));
        assert_eq!(service.auto_refresh_period(), None);

        let note = service.handle_event(
            ServiceEvent::Loaded {
                seq: 1,
                result: Ok(ScheduleSnapshot::default()),
            },
            &mut state,
            now(),
        );
        assert_eq!(note, None);
        assert_eq!(state.last_update, None);
    }
}
