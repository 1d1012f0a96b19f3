use chrono::NaiveDateTime;
use egui::Pos2;

use super::placement::RowLayout;
use super::schedule::ScheduleEntry;
use super::timeline::TimelineViewport;

/// A reschedule the user asked for, by drag or dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescheduleRequest {
    pub schedule_id: i64,
    pub new_workcenter_id: i64,
    pub new_start: NaiveDateTime,
}

/// A drag in progress. Positions are relative to the chart origin.
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub schedule_id: i64,
    pub source_workcenter_id: i64,
    /// Distance from the bar's left edge to where it was grabbed.
    pub grab_offset_x: f32,
    pub pointer: Pos2,
}

impl DragGesture {
    /// Left edge of the bar if it were dropped now.
    pub fn ghost_left(&self) -> f32 {
        self.pointer.x - self.grab_offset_x
    }
}

/// How a drag gesture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Cancelled,
    Reschedule(RescheduleRequest),
}

/// Drag state of the chart: `Idle -> Dragging -> (drop) -> Idle`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragGesture),
}

impl DragState {
    /// Pointer went down on a bar whose left edge is at `item_left`.
    pub fn begin(&mut self, entry: &ScheduleEntry, pointer: Pos2, item_left: f32) {
        *self = DragState::Dragging(DragGesture {
            schedule_id: entry.id,
            source_workcenter_id: entry.workcenter_id,
            grab_offset_x: pointer.x - item_left,
            pointer,
        });
    }

    /// Pointer moved while dragging; ignored when idle.
    pub fn update(&mut self, pointer: Pos2) {
        if let DragState::Dragging(gesture) = self {
            gesture.pointer = pointer;
        }
    }

    pub fn gesture(&self) -> Option<&DragGesture> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(gesture) => Some(gesture),
        }
    }

    pub fn is_dragging(&self, schedule_id: i64) -> bool {
        self.gesture().is_some_and(|g| g.schedule_id == schedule_id)
    }

    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }

    /// Pointer released. Resolves the target row and new start time and
    /// returns to idle.
    ///
    /// `pointer` is `None` when the release position is unknown, which
    /// cancels the gesture like a drop outside the chart.
    pub fn finish(
        &mut self,
        pointer: Option<Pos2>,
        rows: &RowLayout,
        viewport: &TimelineViewport,
    ) -> DropOutcome {
        let DragState::Dragging(gesture) = std::mem::take(self) else {
            return DropOutcome::Cancelled;
        };
        let Some(pointer) = pointer else {
            return DropOutcome::Cancelled;
        };
        if pointer.x < 0.0 || pointer.x > viewport.total_width() {
            return DropOutcome::Cancelled;
        }
        let Some(new_workcenter_id) = rows.workcenter_at(pointer.y) else {
            return DropOutcome::Cancelled;
        };

        let drop_x = pointer.x - gesture.grab_offset_x;
        DropOutcome::Reschedule(RescheduleRequest {
            schedule_id: gesture.schedule_id,
            new_workcenter_id,
            new_start: viewport.x_to_time(drop_x),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schedule::Workcenter;
    use crate::model::timeline::DateRange;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn fixture() -> (RowLayout, TimelineViewport, ScheduleEntry) {
        let wcs = vec![
            Workcenter::new(1, "Corrugator", "cajas"),
            Workcenter::new(2, "Printer", "cajas"),
        ];
        let rows = RowLayout::new(&wcs, 40.0, 30.0);
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        )
        .unwrap();
        let viewport = TimelineViewport::new(range, 1680.0).unwrap();
        let entry = ScheduleEntry::new(7, 1, at(2, 8), at(2, 16));
        (rows, viewport, entry)
    }

    #[test]
    fn drop_on_other_row_computes_start_from_bar_left_edge() {
        let (rows, viewport, entry) = fixture();
        let mut drag = DragState::default();
        // Bar starts at x=320; grab it 15px in.
        drag.begin(&entry, Pos2::new(335.0, 50.0), 320.0);
        drag.update(Pos2::new(400.0, 60.0));
        // Move right by 100px (10h) and down into the second row.
        let outcome = drag.finish(Some(Pos2::new(435.0, 80.0)), &rows, &viewport);

        assert_eq!(
            outcome,
            DropOutcome::Reschedule(RescheduleRequest {
                schedule_id: 7,
                new_workcenter_id: 2,
                new_start: at(2, 18),
            })
        );
        assert_eq!(drag, DragState::Idle);
    }

    #[rstest]
    // Above the first row (header).
    #[case(Some(Pos2::new(400.0, 20.0)))]
    // Below the last row.
    #[case(Some(Pos2::new(400.0, 500.0)))]
    // Left of the chart.
    #[case(Some(Pos2::new(-5.0, 50.0)))]
    // Right of the chart.
    #[case(Some(Pos2::new(1700.0, 50.0)))]
    // Pointer lost.
    #[case(None)]
    fn drops_outside_rows_cancel(#[case] pointer: Option<Pos2>) {
        let (rows, viewport, entry) = fixture();
        let mut drag = DragState::default();
        drag.begin(&entry, Pos2::new(330.0, 50.0), 320.0);

        assert_eq!(drag.finish(pointer, &rows, &viewport), DropOutcome::Cancelled);
        assert_eq!(drag, DragState::Idle);
    }

    #[test]
    fn finishing_while_idle_is_a_cancel() {
        let (rows, viewport, _) = fixture();
        let mut drag = DragState::Idle;
        assert_eq!(
            drag.finish(Some(Pos2::new(100.0, 50.0)), &rows, &viewport),
            DropOutcome::Cancelled
        );
    }

    #[test]
    fn tracks_the_dragged_item() {
        let (_, _, entry) = fixture();
        let mut drag = DragState::default();
        assert!(!drag.is_dragging(7));
        drag.begin(&entry, Pos2::new(330.0, 50.0), 320.0);
        assert!(drag.is_dragging(7));
        assert!(!drag.is_dragging(8));
        drag.update(Pos2::new(360.0, 50.0));
        assert_eq!(drag.gesture().map(|g| g.ghost_left()), Some(350.0));
        drag.cancel();
        assert!(drag.gesture().is_none());
    }
}
