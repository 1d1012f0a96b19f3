use crate::error::ExportError;
use crate::model::ScheduleSnapshot;
use std::path::Path;

/// Save a schedule snapshot to a JSON file.
pub fn save_snapshot(snapshot: &ScheduleSnapshot, path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a schedule snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<ScheduleSnapshot, ExportError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Conflict, ScheduleEntry, Workcenter};
    use chrono::NaiveDate;

    #[test]
    fn snapshot_survives_a_save_and_load() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let mut entry = ScheduleEntry::new(5, 2, start, start + chrono::Duration::hours(6));
        entry.operators = vec!["Marta".into()];
        let snapshot = ScheduleSnapshot {
            workcenters: vec![Workcenter::new(2, "Printer", "cajas")],
            entries: vec![entry],
            conflicts: vec![Conflict {
                schedule_id: 5,
                reason: "Overlap".into(),
            }],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("week.snapshot.json");
        save_snapshot(&snapshot, &path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"2024-03-04 06:00:00\""));
        assert_eq!(load_snapshot(&path).unwrap(), snapshot);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
