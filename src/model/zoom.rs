use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::timeline::DateRange;

/// Controls which period the chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    #[default]
    Week,
    Month,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Day, ViewMode::Week, ViewMode::Month];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
        }
    }

    /// The date range this mode shows, always anchored on `today`.
    ///
    /// Weeks run Monday to Sunday.
    pub fn range_for(self, today: NaiveDate) -> DateRange {
        match self {
            ViewMode::Day => DateRange::single_day(today),
            ViewMode::Week => {
                let monday =
                    today - Duration::days(today.weekday().num_days_from_monday() as i64);
                DateRange {
                    from: monday,
                    to: monday + Duration::days(6),
                }
            }
            ViewMode::Month => {
                let first = today.with_day(1).unwrap_or(today);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(today);
                DateRange { from: first, to: last }
            }
        }
    }
}
