use super::schedule::{ScheduleEntry, Workcenter};
use super::timeline::{hours_between, TimelineViewport};

/// Narrowest bar drawn, so very short runs stay visible.
pub const DEFAULT_MIN_WIDTH_PX: f32 = 20.0;

/// Horizontal placement of one bar, relative to the chart start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemPlacement {
    pub position: f32,
    pub width: f32,
}

impl ItemPlacement {
    pub fn right(&self) -> f32 {
        self.position + self.width
    }
}

/// Place an entry on the timeline. Off-range entries are not clamped.
pub fn place_entry(
    entry: &ScheduleEntry,
    viewport: &TimelineViewport,
    min_width: f32,
) -> ItemPlacement {
    let duration = hours_between(entry.start, entry.end);
    ItemPlacement {
        position: viewport.time_to_x(entry.start),
        width: viewport.hours_to_px(duration).max(min_width),
    }
}

/// Vertical layout of the workcenter rows below the header.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub header_height: f32,
    pub row_height: f32,
    rows: Vec<i64>,
}

impl RowLayout {
    pub fn new(workcenters: &[Workcenter], header_height: f32, row_height: f32) -> Self {
        Self {
            header_height,
            row_height,
            rows: workcenters.iter().map(|wc| wc.id).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Top edge of row `index`, relative to the chart origin.
    pub fn row_top(&self, index: usize) -> f32 {
        self.header_height + index as f32 * self.row_height
    }

    pub fn content_height(&self) -> f32 {
        self.row_top(self.rows.len())
    }

    pub fn index_of(&self, workcenter_id: i64) -> Option<usize> {
        self.rows.iter().position(|id| *id == workcenter_id)
    }

    /// Resolve a y coordinate to the workcenter whose row contains it.
    pub fn workcenter_at(&self, y: f32) -> Option<i64> {
        if y < self.header_height {
            return None;
        }
        let index = ((y - self.header_height) / self.row_height).floor() as usize;
        self.rows.get(index).copied()
    }
}

/// A bar as laid out for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedItem {
    pub schedule_id: i64,
    pub row: usize,
    pub placement: ItemPlacement,
    /// Conflict tooltip, set by the highlighter.
    pub conflict: Option<String>,
}

/// Lay out every entry that has a visible row.
pub fn layout_items(
    entries: &[ScheduleEntry],
    rows: &RowLayout,
    viewport: &TimelineViewport,
    min_width: f32,
) -> Vec<RenderedItem> {
    entries
        .iter()
        .filter_map(|entry| {
            let row = rows.index_of(entry.workcenter_id)?;
            Some(RenderedItem {
                schedule_id: entry.id,
                row,
                placement: place_entry(entry, viewport, min_width),
                conflict: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::timeline::DateRange;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use rstest::rstest;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn week_viewport(width: f32) -> TimelineViewport {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        )
        .unwrap();
        TimelineViewport::new(range, width).unwrap()
    }

    #[test]
    fn eight_hour_run_at_ten_pixels_per_hour() {
        let viewport = week_viewport(1680.0);
        let entry = ScheduleEntry::new(1, 1, at(2, 8, 0), at(2, 16, 0));
        let placed = place_entry(&entry, &viewport, DEFAULT_MIN_WIDTH_PX);
        assert!((placed.position - 320.0).abs() < 1e-3);
        assert!((placed.width - 80.0).abs() < 1e-3);
    }

    #[test]
    fn zero_duration_gets_minimum_width() {
        let viewport = week_viewport(1680.0);
        let entry = ScheduleEntry::new(1, 1, at(3, 9, 0), at(3, 9, 0));
        assert_eq!(place_entry(&entry, &viewport, 20.0).width, 20.0);
        assert_eq!(place_entry(&entry, &viewport, 35.0).width, 35.0);
    }

    #[rstest]
    #[case(at(1, 0, 0), at(1, 0, 0))]
    #[case(at(1, 0, 0), at(8, 0, 0))]
    #[case(at(4, 6, 15), at(5, 22, 45))]
    #[case(at(7, 20, 0), at(8, 0, 0))]
    fn entries_inside_range_stay_inside_chart(
        #[case] start: NaiveDateTime,
        #[case] end: NaiveDateTime,
    ) {
        let viewport = week_viewport(1234.5);
        let entry = ScheduleEntry::new(1, 1, start, end);
        let placed = place_entry(&entry, &viewport, 0.0);
        assert!(placed.position >= 0.0);
        assert!(placed.right() <= viewport.total_width() + 1e-3);
    }

    #[test]
    fn entries_before_range_are_not_clamped() {
        let viewport = week_viewport(1680.0);
        let start = at(1, 0, 0) - Duration::hours(12);
        let entry = ScheduleEntry::new(1, 1, start, at(1, 6, 0));
        let placed = place_entry(&entry, &viewport, 20.0);
        assert!((placed.position + 120.0).abs() < 1e-3);
        assert!((placed.width - 180.0).abs() < 1e-3);
    }

    #[test]
    fn rows_resolve_from_y() {
        let wcs = vec![
            Workcenter::new(10, "A", "cajas"),
            Workcenter::new(20, "B", "cajas"),
        ];
        let rows = RowLayout::new(&wcs, 40.0, 30.0);
        assert_eq!(rows.workcenter_at(10.0), None);
        assert_eq!(rows.workcenter_at(40.0), Some(10));
        assert_eq!(rows.workcenter_at(69.9), Some(10));
        assert_eq!(rows.workcenter_at(70.0), Some(20));
        assert_eq!(rows.workcenter_at(100.0), None);
        assert_eq!(rows.content_height(), 100.0);
    }

    #[test]
    fn entries_without_a_row_are_skipped() {
        let viewport = week_viewport(1680.0);
        let rows = RowLayout::new(&[Workcenter::new(10, "A", "cajas")], 40.0, 30.0);
        let entries = vec![
            ScheduleEntry::new(1, 10, at(2, 8, 0), at(2, 10, 0)),
            ScheduleEntry::new(2, 99, at(2, 8, 0), at(2, 10, 0)),
        ];
        let items = layout_items(&entries, &rows, &viewport, 20.0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].schedule_id, 1);
        assert_eq!(items[0].row, 0);
    }
}
