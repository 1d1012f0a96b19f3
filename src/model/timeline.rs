use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::TimelineError;

/// One column of the chart header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day {
    pub date: NaiveDate,
    /// `DD/MM`
    pub label: String,
    /// Abbreviated weekday name, e.g. `Tue`.
    pub day_name: String,
    /// Saturday or Sunday; styling only.
    pub is_weekend: bool,
}

impl Day {
    fn new(date: NaiveDate) -> Self {
        let weekday = date.weekday().num_days_from_sunday();
        Self {
            date,
            label: date.format("%d/%m").to_string(),
            day_name: date.format("%a").to_string(),
            is_weekend: weekday == 0 || weekday == 6,
        }
    }
}

/// Build the day-by-day scale for `[from, to]`, inclusive.
///
/// An inverted range yields an empty scale.
pub fn time_scale(from: NaiveDate, to: NaiveDate) -> Vec<Day> {
    from.iter_days()
        .take_while(|date| *date <= to)
        .map(Day::new)
        .collect()
}

/// Fractional hours from `from` to `to` (negative if `to` is earlier).
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// An inclusive range of calendar dates shown on the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, TimelineError> {
        if to < from {
            return Err(TimelineError::InvertedRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    /// Number of days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Midnight at the start of `from`.
    pub fn start(&self) -> NaiveDateTime {
        self.from.and_time(NaiveTime::MIN)
    }

    /// Midnight after `to`; the chart's right edge.
    pub fn end(&self) -> NaiveDateTime {
        self.start() + Duration::days(self.days())
    }

    pub fn total_hours(&self) -> f64 {
        self.days() as f64 * 24.0
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start() && at <= self.end()
    }

    pub fn scale(&self) -> Vec<Day> {
        time_scale(self.from, self.to)
    }
}

/// Maps timestamps in a date range onto a measured pixel width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineViewport {
    pub range: DateRange,
    /// Measured width of the header, in pixels.
    pub width_px: f32,
    pixels_per_hour: f64,
}

impl TimelineViewport {
    pub fn new(range: DateRange, width_px: f32) -> Result<Self, TimelineError> {
        if !width_px.is_finite() || width_px <= 0.0 {
            return Err(TimelineError::InvalidWidth(width_px));
        }
        Ok(Self {
            range,
            width_px,
            pixels_per_hour: width_px as f64 / range.total_hours(),
        })
    }

    pub fn pixels_per_hour(&self) -> f32 {
        self.pixels_per_hour as f32
    }

    pub fn pixels_per_day(&self) -> f32 {
        (self.pixels_per_hour * 24.0) as f32
    }

    pub fn hours_to_px(&self, hours: f64) -> f32 {
        (hours * self.pixels_per_hour) as f32
    }

    /// Convert a timestamp to an x-pixel offset from the chart start.
    pub fn time_to_x(&self, at: NaiveDateTime) -> f32 {
        self.hours_to_px(hours_between(self.range.start(), at))
    }

    /// Convert an x-pixel offset back to a timestamp, rounded to the second.
    pub fn x_to_time(&self, x: f32) -> NaiveDateTime {
        let seconds = (x as f64 / self.pixels_per_hour * 3600.0).round() as i64;
        self.range.start() + Duration::seconds(seconds)
    }

    pub fn date_to_x(&self, date: NaiveDate) -> f32 {
        self.time_to_x(date.and_time(NaiveTime::MIN))
    }

    /// Total width in pixels for the visible range.
    pub fn total_width(&self) -> f32 {
        self.width_px
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_scale_matches_labels_and_weekends() {
        let scale = time_scale(date(2024, 1, 1), date(2024, 1, 7));
        let labels: Vec<_> = scale.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(
            labels,
            ["01/01", "02/01", "03/01", "04/01", "05/01", "06/01", "07/01"]
        );
        // 2024-01-06 is a Saturday, 2024-01-07 a Sunday.
        let weekends: Vec<_> = scale.iter().filter(|d| d.is_weekend).map(|d| d.date).collect();
        assert_eq!(weekends, [date(2024, 1, 6), date(2024, 1, 7)]);
        assert_eq!(scale[0].day_name, "Mon");
    }

    #[rstest]
    #[case(date(2024, 1, 1), date(2024, 1, 1))]
    #[case(date(2024, 2, 20), date(2024, 3, 5))]
    #[case(date(2023, 12, 25), date(2024, 1, 31))]
    fn scale_is_contiguous(#[case] from: NaiveDate, #[case] to: NaiveDate) {
        let scale = time_scale(from, to);
        assert_eq!(scale.len() as i64, (to - from).num_days() + 1);
        assert_eq!(scale[0].date, from);
        for pair in scale.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
    }

    #[test]
    fn inverted_range_yields_empty_scale_and_error() {
        assert!(time_scale(date(2024, 1, 7), date(2024, 1, 1)).is_empty());
        assert_eq!(
            DateRange::new(date(2024, 1, 7), date(2024, 1, 1)),
            Err(TimelineError::InvertedRange {
                from: date(2024, 1, 7),
                to: date(2024, 1, 1)
            })
        );
    }

    #[test]
    fn pixels_per_hour_divides_width_by_inclusive_hours() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 7)).unwrap();
        assert_eq!(range.total_hours(), 168.0);
        let viewport = TimelineViewport::new(range, 1680.0).unwrap();
        assert!((viewport.pixels_per_hour() - 10.0).abs() < 1e-6);
        assert!((viewport.date_to_x(date(2024, 1, 8)) - 1680.0).abs() < 1e-3);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-10.0)]
    #[case(f32::NAN)]
    fn rejects_unusable_widths(#[case] width: f32) {
        let range = DateRange::single_day(date(2024, 1, 1));
        assert!(TimelineViewport::new(range, width).is_err());
    }

    #[test]
    fn x_to_time_inverts_time_to_x() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 7)).unwrap();
        let viewport = TimelineViewport::new(range, 1680.0).unwrap();
        let at = date(2024, 1, 3).and_hms_opt(13, 30, 0).unwrap();
        let x = viewport.time_to_x(at);
        assert_eq!(viewport.x_to_time(x), at);
        assert_eq!(viewport.x_to_time(0.0), range.start());
    }
}
