use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};

use super::conflicts::ConflictIndex;
use super::drag::DragState;
use super::schedule::{LineFilter, ScheduleEntry, ScheduleSnapshot, Workcenter};
use super::timeline::{hours_between, DateRange};
use super::zoom::ViewMode;
use crate::error::TimelineError;

/// Parameters of one reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub range: DateRange,
    pub line: LineFilter,
}

/// All per-view state of the Gantt, owned by the app and passed to every
/// handler.
#[derive(Debug, Clone)]
pub struct GanttViewState {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub line_filter: LineFilter,
    pub view_mode: ViewMode,
    pub snapshot: ScheduleSnapshot,
    conflict_index: ConflictIndex,
    pub last_update: Option<NaiveDateTime>,
    pub loading: bool,
    pub drag: DragState,
    pub selected: Option<i64>,
}

impl GanttViewState {
    pub fn new(view_mode: ViewMode, line_filter: LineFilter, today: NaiveDate) -> Self {
        let range = view_mode.range_for(today);
        Self {
            date_from: range.from,
            date_to: range.to,
            line_filter,
            view_mode,
            snapshot: ScheduleSnapshot::default(),
            conflict_index: ConflictIndex::default(),
            last_update: None,
            loading: false,
            drag: DragState::Idle,
            selected: None,
        }
    }

    /// The current range, or an error if the pickers are inverted.
    pub fn range(&self) -> Result<DateRange, TimelineError> {
        DateRange::new(self.date_from, self.date_to)
    }

    pub fn query(&self) -> Result<ScheduleQuery, TimelineError> {
        Ok(ScheduleQuery {
            range: self.range()?,
            line: self.line_filter.clone(),
        })
    }

    /// Switch zoom level; the range is recomputed from `today`.
    pub fn set_view_mode(&mut self, mode: ViewMode, today: NaiveDate) {
        let range = mode.range_for(today);
        self.view_mode = mode;
        self.date_from = range.from;
        self.date_to = range.to;
    }

    /// Move the visible range by `steps` periods of the current zoom. Month
    /// view moves by calendar months, the others by the range length.
    pub fn shift(&mut self, steps: i32) {
        let range = match self.view_mode {
            ViewMode::Month => {
                let months = Months::new(steps.unsigned_abs());
                let first = self.date_from.with_day(1).and_then(|first| {
                    if steps >= 0 {
                        first.checked_add_months(months)
                    } else {
                        first.checked_sub_months(months)
                    }
                });
                match first {
                    Some(first) => ViewMode::Month.range_for(first),
                    None => return,
                }
            }
            _ => {
                let Ok(range) = self.range() else {
                    return;
                };
                let offset = Duration::days(range.days() * steps as i64);
                DateRange {
                    from: range.from + offset,
                    to: range.to + offset,
                }
            }
        };
        self.date_from = range.from;
        self.date_to = range.to;
    }

    /// Replace everything fetched by the previous reload.
    pub fn apply_snapshot(&mut self, snapshot: ScheduleSnapshot, now: NaiveDateTime) {
        self.conflict_index = ConflictIndex::new(&snapshot.conflicts);
        self.snapshot = snapshot;
        self.last_update = Some(now);
        self.loading = false;
        if let Some(id) = self.selected {
            if self.entry(id).is_none() {
                self.selected = None;
            }
        }
        if let Some(dragged) = self.drag.gesture().map(|g| g.schedule_id) {
            if self.entry(dragged).is_none() {
                self.drag.cancel();
            }
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.snapshot.entries
    }

    pub fn workcenters(&self) -> &[Workcenter] {
        &self.snapshot.workcenters
    }

    pub fn conflicts(&self) -> &ConflictIndex {
        &self.conflict_index
    }

    pub fn entry(&self, id: i64) -> Option<&ScheduleEntry> {
        self.snapshot.entries.iter().find(|e| e.id == id)
    }

    pub fn workcenter(&self, id: i64) -> Option<&Workcenter> {
        self.snapshot.workcenters.iter().find(|wc| wc.id == id)
    }

    pub fn entries_for(&self, workcenter_id: i64) -> impl Iterator<Item = &ScheduleEntry> {
        self.snapshot
            .entries
            .iter()
            .filter(move |e| e.workcenter_id == workcenter_id)
    }

    /// Scheduled hours on a workcenter that fall inside the visible range.
    pub fn load_hours(&self, workcenter_id: i64) -> f64 {
        let Ok(range) = self.range() else {
            return 0.0;
        };
        let (start, end) = (range.start(), range.end());
        self.entries_for(workcenter_id)
            .map(|e| hours_between(e.start.max(start), e.end.min(end)).max(0.0))
            .sum()
    }

    /// Capacity of a workcenter over the visible range, in hours.
    pub fn capacity_hours(&self, workcenter_id: i64) -> f64 {
        let days = self.range().map(|r| r.days()).unwrap_or(0) as f64;
        self.workcenter(workcenter_id)
            .map(|wc| wc.capacity_hours * days)
            .unwrap_or(0.0)
    }
}
