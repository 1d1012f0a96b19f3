use chrono::NaiveDateTime;
use egui::Color32;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a production schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleState {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Unknown,
}

impl ScheduleState {
    pub fn label(self) -> &'static str {
        match self {
            ScheduleState::Scheduled => "Scheduled",
            ScheduleState::Confirmed => "Confirmed",
            ScheduleState::InProgress => "In Progress",
            ScheduleState::Completed => "Completed",
            ScheduleState::Cancelled => "Cancelled",
            ScheduleState::Unknown => "Unknown",
        }
    }

    /// Bar colour used on the chart.
    pub fn color(self) -> Color32 {
        match self {
            ScheduleState::Scheduled => Color32::from_rgb(0x34, 0x98, 0xdb),
            ScheduleState::Confirmed => Color32::from_rgb(0xf3, 0x9c, 0x12),
            ScheduleState::InProgress => Color32::from_rgb(0x2e, 0xcc, 0x71),
            ScheduleState::Completed => Color32::from_rgb(0x27, 0xae, 0x60),
            ScheduleState::Cancelled => Color32::from_rgb(0xe7, 0x4c, 0x3c),
            ScheduleState::Unknown => Color32::from_rgb(0x95, 0xa5, 0xa6),
        }
    }

    /// Only entries that have not started yet may be moved.
    pub fn is_reschedulable(self) -> bool {
        matches!(self, ScheduleState::Scheduled | ScheduleState::Confirmed)
    }
}

impl From<&str> for ScheduleState {
    fn from(value: &str) -> Self {
        match value.trim() {
            "scheduled" => ScheduleState::Scheduled,
            "confirmed" => ScheduleState::Confirmed,
            "in_progress" => ScheduleState::InProgress,
            "completed" => ScheduleState::Completed,
            "cancelled" => ScheduleState::Cancelled,
            _ => ScheduleState::Unknown,
        }
    }
}

/// A planned production run on one workcenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub production_name: String,
    #[serde(default, deserialize_with = "lenient::id")]
    pub workcenter_id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub workcenter_name: String,
    #[serde(with = "wire_time")]
    pub start: NaiveDateTime,
    #[serde(with = "wire_time")]
    pub end: NaiveDateTime,
    #[serde(default, deserialize_with = "lenient::state")]
    pub state: ScheduleState,
    #[serde(default, deserialize_with = "lenient::string")]
    pub product_name: String,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub operators: Vec<String>,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub alerts_count: u32,
}

impl ScheduleEntry {
    pub fn new(
        id: i64,
        workcenter_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            name: format!("SCH/{:05}", id),
            production_name: String::new(),
            workcenter_id,
            workcenter_name: String::new(),
            start,
            end,
            state: ScheduleState::Scheduled,
            product_name: String::new(),
            quantity: 0.0,
            operators: Vec::new(),
            alerts_count: 0,
        }
    }

    /// Duration in fractional hours, derived from the timestamps.
    pub fn hours(&self) -> f64 {
        crate::model::timeline::hours_between(self.start, self.end)
    }

    /// Label shown on the bar and in lists.
    pub fn display_name(&self) -> &str {
        if !self.production_name.is_empty() {
            &self.production_name
        } else {
            &self.name
        }
    }

    pub fn operators_label(&self) -> String {
        if self.operators.is_empty() {
            "N/A".to_string()
        } else {
            self.operators.join(", ")
        }
    }
}

/// A schedulable production resource (one row on the chart).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workcenter {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub production_line_type: String,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub capacity_hours: f64,
    /// Efficiency as a percentage (100 = nominal).
    #[serde(default, deserialize_with = "lenient::f64")]
    pub time_efficiency: f64,
}

impl Workcenter {
    pub fn new(id: i64, name: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            production_line_type: line.into(),
            capacity_hours: 24.0,
            time_efficiency: 100.0,
        }
    }
}

/// A conflict flagged by the server for one schedule entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(deserialize_with = "lenient::id")]
    pub schedule_id: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub reason: String,
}

/// Known production line types and their display labels.
pub const PRODUCTION_LINES: &[(&str, &str)] = &[
    ("papel_periodico", "Newsprint"),
    ("cajas", "Boxes & Sheets"),
    ("lamina_micro", "Micro-corrugated Sheet"),
];

/// Restricts the view to one production line type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LineFilter {
    #[default]
    All,
    Line(String),
}

impl LineFilter {
    pub fn as_str(&self) -> &str {
        match self {
            LineFilter::All => "all",
            LineFilter::Line(line) => line,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            LineFilter::All => "All lines",
            LineFilter::Line(line) => PRODUCTION_LINES
                .iter()
                .find(|(key, _)| key == line)
                .map(|(_, label)| *label)
                .unwrap_or(line.as_str()),
        }
    }

    pub fn matches(&self, line_type: &str) -> bool {
        match self {
            LineFilter::All => true,
            LineFilter::Line(line) => line == line_type,
        }
    }

    /// Every filter option offered in the toolbar.
    pub fn options() -> Vec<LineFilter> {
        std::iter::once(LineFilter::All)
            .chain(
                PRODUCTION_LINES
                    .iter()
                    .map(|(key, _)| LineFilter::Line((*key).to_string())),
            )
            .collect()
    }
}

impl From<String> for LineFilter {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            LineFilter::All
        } else {
            LineFilter::Line(trimmed.to_string())
        }
    }
}

impl From<LineFilter> for String {
    fn from(value: LineFilter) -> Self {
        value.as_str().to_string()
    }
}

/// Everything one reload fetches from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    #[serde(default)]
    pub workcenters: Vec<Workcenter>,
    #[serde(default)]
    pub entries: Vec<ScheduleEntry>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
}

/// Timestamp format used on the wire: `YYYY-MM-DD HH:MM:SS`.
pub mod wire_time {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    const ACCEPTED: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    pub fn format(value: NaiveDateTime) -> String {
        value.format(FORMAT).to_string()
    }

    /// Parse a server timestamp, accepting both space and `T` separators.
    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        ACCEPTED
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", s)))
    }
}

/// Serde helpers that turn missing or malformed optional values into defaults.
///
/// Odoo sends `false` for empty fields and `[id, name]` pairs for relations;
/// both are accepted here.
mod lenient {
    use super::ScheduleState;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn id<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().unwrap_or_default(),
            Value::Array(items) => items.first().and_then(Value::as_i64).unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        })
    }

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Array(items) => items
                .get(1)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        })
    }

    pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0.0,
        })
    }

    pub fn u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or_default(),
            _ => 0,
        })
    }

    pub fn state<'de, D>(deserializer: D) -> Result<ScheduleState, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => ScheduleState::from(s.as_str()),
            _ => ScheduleState::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn decodes_server_payload_with_odoo_false_values() {
        let payload = json!({
            "id": 12,
            "name": "SCH/00012",
            "production_name": "MO/0042",
            "workcenter_id": [3, "Corrugator 1"],
            "workcenter_name": "Corrugator 1",
            "start": "2024-01-02T08:00:00",
            "end": "2024-01-02 16:00:00",
            "state": "in_progress",
            "product_name": false,
            "quantity": "1500",
            "operators": ["Ana", "Luis"],
            "alerts_count": false,
            "color": "#2ecc71"
        });

        let entry: ScheduleEntry = serde_json::from_value(payload).unwrap();
        assert_eq!(entry.workcenter_id, 3);
        assert_eq!(entry.start, at(2, 8));
        assert_eq!(entry.end, at(2, 16));
        assert_eq!(entry.state, ScheduleState::InProgress);
        assert_eq!(entry.product_name, "");
        assert_eq!(entry.quantity, 1500.0);
        assert_eq!(entry.alerts_count, 0);
        assert_eq!(entry.hours(), 8.0);
    }

    #[test]
    fn missing_optional_fields_default_to_empty() {
        let entry: ScheduleEntry = serde_json::from_value(json!({
            "id": 1,
            "start": "2024-01-02 08:00:00",
            "end": "2024-01-02 09:30:00"
        }))
        .unwrap();

        assert_eq!(entry.workcenter_id, 0);
        assert!(entry.operators.is_empty());
        assert_eq!(entry.operators_label(), "N/A");
        assert_eq!(entry.state, ScheduleState::Scheduled);
        assert_eq!(entry.hours(), 1.5);
    }

    #[test]
    fn unknown_state_does_not_fail_the_record() {
        let entry: ScheduleEntry = serde_json::from_value(json!({
            "id": 1,
            "start": "2024-01-02 08:00:00",
            "end": "2024-01-02 09:00:00",
            "state": "on_hold"
        }))
        .unwrap();
        assert_eq!(entry.state, ScheduleState::Unknown);
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        let result: Result<ScheduleEntry, _> = serde_json::from_value(json!({
            "id": 1,
            "start": "yesterday",
            "end": "2024-01-02 09:00:00"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn wire_time_uses_space_separated_seconds() {
        assert_eq!(wire_time::format(at(2, 8)), "2024-01-02 08:00:00");
        assert_eq!(wire_time::parse("2024-01-02T08:00:00.123"), Some(
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_milli_opt(8, 0, 0, 123)
                .unwrap()
        ));
        assert_eq!(wire_time::parse("02/01/2024"), None);
    }

    #[test]
    fn line_filter_round_trips_through_strings() {
        assert_eq!(LineFilter::from("all".to_string()), LineFilter::All);
        assert_eq!(LineFilter::from(String::new()), LineFilter::All);
        let cajas = LineFilter::from("cajas".to_string());
        assert_eq!(cajas.label(), "Boxes & Sheets");
        assert!(cajas.matches("cajas"));
        assert!(!cajas.matches("lamina_micro"));
        assert!(LineFilter::All.matches("anything"));
        assert_eq!(String::from(cajas), "cajas");
        assert_eq!(LineFilter::options().len(), PRODUCTION_LINES.len() + 1);
    }

    #[test]
    fn workcenter_accepts_false_for_numbers() {
        let wc: Workcenter = serde_json::from_value(json!({
            "id": 4,
            "name": "Die cutter",
            "production_line_type": false,
            "capacity_hours": false,
            "time_efficiency": 85.5
        }))
        .unwrap();
        assert_eq!(wc.capacity_hours, 0.0);
        assert_eq!(wc.production_line_type, "");
        assert_eq!(wc.time_efficiency, 85.5);
    }
}
