//! In-memory backend with sample data, for running without a server.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use super::{ActionResult, ScheduleBackend};
use crate::error::{BackendError, ExportError};
use crate::model::{
    Conflict, DateRange, LineFilter, RescheduleRequest, ScheduleEntry, ScheduleSnapshot,
    ScheduleState, Workcenter,
};

pub struct DemoBackend {
    data: Mutex<ScheduleSnapshot>,
}

impl DemoBackend {
    pub fn new(workcenters: Vec<Workcenter>, entries: Vec<ScheduleEntry>) -> Self {
        Self {
            data: Mutex::new(ScheduleSnapshot {
                workcenters,
                entries,
                conflicts: Vec::new(),
            }),
        }
    }

    /// Seed from a snapshot saved by the app. Stored conflicts are ignored;
    /// they are recomputed on every query.
    pub fn from_snapshot_file(path: &Path) -> Result<Self, ExportError> {
        let snapshot = crate::io::load_snapshot(path)?;
        Ok(Self::new(snapshot.workcenters, snapshot.entries))
    }

    /// A week of sample production around `today`.
    pub fn sample(today: NaiveDate) -> Self {
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let at = |day: i64, hour: i64| {
            monday.and_hms_opt(0, 0, 0).unwrap_or_default()
                + Duration::days(day)
                + Duration::hours(hour)
        };

        let mut corrugator = Workcenter::new(1, "BHS Corrugator", "cajas");
        corrugator.capacity_hours = 20.0;
        corrugator.time_efficiency = 92.0;
        let mut printer = Workcenter::new(2, "Flexo Printer 2C", "cajas");
        printer.capacity_hours = 16.0;
        printer.time_efficiency = 88.0;
        let mut die_cutter = Workcenter::new(3, "Rotary Die Cutter", "cajas");
        die_cutter.capacity_hours = 16.0;
        die_cutter.time_efficiency = 85.0;
        let mut paper_machine = Workcenter::new(4, "Paper Machine PM1", "papel_periodico");
        paper_machine.capacity_hours = 24.0;
        paper_machine.time_efficiency = 95.0;
        let mut laminator = Workcenter::new(5, "Micro Laminator", "lamina_micro");
        laminator.capacity_hours = 16.0;
        laminator.time_efficiency = 90.0;

        // (id, workcenter, start, end, state, product, quantity, operators)
        let plan: [(i64, i64, NaiveDateTime, NaiveDateTime, ScheduleState, &str, f64, &str); 13] = [
            (1, 1, at(0, 6), at(0, 14), ScheduleState::Completed, "Box RSC 40x30x25", 12_000.0, "Ana, Luis"),
            (2, 1, at(0, 14), at(1, 2), ScheduleState::InProgress, "Sheet C-flute 120x80", 30_000.0, "Pedro"),
            (3, 1, at(1, 6), at(1, 18), ScheduleState::Confirmed, "Box RSC 60x40x40", 8_000.0, "Ana"),
            (4, 1, at(2, 6), at(2, 10), ScheduleState::Scheduled, "Tray 30x20", 15_000.0, ""),
            (5, 2, at(0, 8), at(0, 16), ScheduleState::Completed, "Printed box 2C", 10_000.0, "Rosa"),
            (6, 2, at(1, 8), at(1, 20), ScheduleState::Confirmed, "Banana box", 22_000.0, "Rosa, Jorge"),
            // Overlaps entry 6 on purpose.
            (7, 2, at(1, 16), at(2, 0), ScheduleState::Scheduled, "Shrimp box", 6_000.0, "Jorge"),
            (8, 3, at(2, 6), at(2, 18), ScheduleState::Scheduled, "Die-cut display", 4_000.0, "Carla"),
            (9, 3, at(3, 6), at(3, 7), ScheduleState::Scheduled, "Sample run", 50.0, ""),
            (10, 4, at(0, 0), at(3, 0), ScheduleState::InProgress, "Newsprint 45 g/m2", 180.0, "Team A, Team B"),
            (11, 4, at(3, 0), at(5, 0), ScheduleState::Scheduled, "Newsprint 48.8 g/m2", 120.0, ""),
            (12, 5, at(2, 8), at(2, 20), ScheduleState::Scheduled, "Micro E-flute sheet", 9_000.0, "Diego"),
            (13, 5, at(4, 8), at(4, 14), ScheduleState::Confirmed, "Micro F-flute sheet", 7_500.0, "Diego"),
        ];

        let entries = plan
            .iter()
            .map(|(id, wc, start, end, state, product, quantity, operators)| {
                let mut entry = ScheduleEntry::new(*id, *wc, *start, *end);
                entry.production_name = format!("MO/{:05}", 100 + id);
                entry.state = *state;
                entry.product_name = product.to_string();
                entry.quantity = *quantity;
                entry.operators = operators
                    .split(", ")
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect();
                entry
            })
            .collect();

        Self::new(
            vec![corrugator, printer, die_cutter, paper_machine, laminator],
            entries,
        )
    }

    fn lock(&self) -> MutexGuard<'_, ScheduleSnapshot> {
        // A poisoned lock only means a panicking test; the data is still usable.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ScheduleSnapshot {
        self.lock().clone()
    }
}

fn visible_entries(
    data: &ScheduleSnapshot,
    range: DateRange,
    line: &LineFilter,
) -> Vec<ScheduleEntry> {
    let names: HashMap<i64, &Workcenter> = data
        .workcenters
        .iter()
        .filter(|wc| line.matches(&wc.production_line_type))
        .map(|wc| (wc.id, wc))
        .collect();
    let (start, end) = (range.start(), range.end());

    let mut entries: Vec<ScheduleEntry> = data
        .entries
        .iter()
        .filter(|e| e.state != ScheduleState::Cancelled)
        .filter(|e| e.start < end && e.end > start)
        .filter_map(|e| {
            let wc = names.get(&e.workcenter_id)?;
            let mut entry = e.clone();
            entry.workcenter_name = wc.name.clone();
            Some(entry)
        })
        .collect();
    entries.sort_by_key(|e| (e.start, e.id));
    entries
}

/// Pairs of runs that overlap on the same workcenter.
fn overlap_conflicts(entries: &[ScheduleEntry]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            if a.workcenter_id == b.workcenter_id && a.start < b.end && b.start < a.end {
                conflicts.push(Conflict {
                    schedule_id: a.id,
                    reason: format!("Overlaps {} on {}", b.name, b.workcenter_name),
                });
                conflicts.push(Conflict {
                    schedule_id: b.id,
                    reason: format!("Overlaps {} on {}", a.name, a.workcenter_name),
                });
            }
        }
    }
    conflicts
}

#[async_trait]
impl ScheduleBackend for DemoBackend {
    async fn get_gantt_data(
        &self,
        range: DateRange,
        line: LineFilter,
    ) -> Result<Vec<ScheduleEntry>, BackendError> {
        Ok(visible_entries(&self.lock(), range, &line))
    }

    async fn get_workcenters(&self, line: LineFilter) -> Result<Vec<Workcenter>, BackendError> {
        let mut workcenters: Vec<Workcenter> = self
            .lock()
            .workcenters
            .iter()
            .filter(|wc| line.matches(&wc.production_line_type))
            .cloned()
            .collect();
        workcenters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(workcenters)
    }

    async fn detect_schedule_conflicts(
        &self,
        range: DateRange,
        line: LineFilter,
    ) -> Result<Vec<Conflict>, BackendError> {
        Ok(overlap_conflicts(&visible_entries(&self.lock(), range, &line)))
    }

    async fn reschedule_item(
        &self,
        request: RescheduleRequest,
    ) -> Result<ActionResult, BackendError> {
        let mut data = self.lock();
        let Some(target) = data
            .workcenters
            .iter()
            .find(|wc| wc.id == request.new_workcenter_id)
            .map(|wc| wc.name.clone())
        else {
            return Ok(ActionResult::failed(format!(
                "Workcenter {} does not exist",
                request.new_workcenter_id
            )));
        };
        let Some(entry) = data.entries.iter_mut().find(|e| e.id == request.schedule_id) else {
            return Err(BackendError::NotFound(request.schedule_id));
        };
        if !entry.state.is_reschedulable() {
            return Ok(ActionResult::failed(format!(
                "{} is {} and cannot be rescheduled",
                entry.name,
                entry.state.label().to_lowercase()
            )));
        }

        let duration = entry.end - entry.start;
        entry.start = request.new_start;
        entry.end = request.new_start + duration;
        entry.workcenter_id = request.new_workcenter_id;
        debug!(schedule = entry.id, start = %entry.start, "demo reschedule");
        Ok(ActionResult::ok(format!(
            "{} moved to {} at {}",
            entry.name,
            target,
            entry.start.format("%d/%m %H:%M")
        )))
    }

    async fn cancel_schedule(&self, schedule_id: i64) -> Result<ActionResult, BackendError> {
        let mut data = self.lock();
        let Some(entry) = data.entries.iter_mut().find(|e| e.id == schedule_id) else {
            return Err(BackendError::NotFound(schedule_id));
        };
        match entry.state {
            ScheduleState::Completed | ScheduleState::Cancelled => Ok(ActionResult::failed(
                format!("{} is already {}", entry.name, entry.state.label().to_lowercase()),
            )),
            _ => {
                entry.state = ScheduleState::Cancelled;
                Ok(ActionResult::ok(format!("{} cancelled", entry.name)))
            }
        }
    }

    fn form_url(&self, _schedule_id: i64) -> Option<String> {
        None
    }

    fn label(&self) -> String {
        "Demo data".to_string()
    }
}
