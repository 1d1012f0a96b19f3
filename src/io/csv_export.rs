use crate::error::ExportError;
use crate::model::schedule::wire_time;
use crate::model::GanttViewState;
use std::path::Path;

/// Write the loaded schedule as semicolon-delimited CSV.
///
/// Columns: Reference ; Production ; Workcenter ; Product ; Quantity ;
/// Start ; End ; Hours ; State ; Conflict.
/// Returns the number of entries written.
pub fn write_csv<W: std::io::Write>(state: &GanttViewState, writer: W) -> Result<usize, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);

    wtr.write_record([
        "Reference",
        "Production",
        "Workcenter",
        "Product",
        "Quantity",
        "Start",
        "End",
        "Hours",
        "State",
        "Conflict",
    ])?;

    for entry in state.entries() {
        let workcenter = state
            .workcenter(entry.workcenter_id)
            .map(|wc| wc.name.as_str())
            .unwrap_or(entry.workcenter_name.as_str());
        let conflict = state.conflicts().tooltip(entry.id).unwrap_or_default();
        let quantity = entry.quantity.to_string();
        let start = wire_time::format(entry.start);
        let end = wire_time::format(entry.end);
        let hours = format!("{:.2}", entry.hours());
        wtr.write_record([
            entry.name.as_str(),
            entry.production_name.as_str(),
            workcenter,
            entry.product_name.as_str(),
            quantity.as_str(),
            start.as_str(),
            end.as_str(),
            hours.as_str(),
            entry.state.label(),
            conflict.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(state.entries().len())
}

/// Export the loaded schedule to a CSV file.
pub fn export_csv(state: &GanttViewState, path: &Path) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path)?;
    write_csv(state, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Conflict, LineFilter, ScheduleEntry, ScheduleSnapshot, ViewMode, Workcenter};
    use chrono::NaiveDate;

    #[test]
    fn writes_header_and_one_line_per_entry() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let mut state = GanttViewState::new(ViewMode::Week, LineFilter::All, today);
        let start = today.and_hms_opt(8, 0, 0).unwrap();
        let mut entry = ScheduleEntry::new(3, 1, start, start + chrono::Duration::minutes(90));
        entry.production_name = "MO/0003".into();
        entry.quantity = 250.0;
        state.apply_snapshot(
            ScheduleSnapshot {
                workcenters: vec![Workcenter::new(1, "Corrugator", "cajas")],
                entries: vec![entry],
                conflicts: vec![Conflict {
                    schedule_id: 3,
                    reason: "Overlap".into(),
                }],
            },
            start,
        );

        let mut buf = Vec::new();
        assert_eq!(write_csv(&state, &mut buf).unwrap(), 1);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Reference;Production;Workcenter"));
        assert_eq!(
            lines[1],
            "SCH/00003;MO/0003;Corrugator;;250;2024-01-03 08:00:00;2024-01-03 09:30:00;1.50;Scheduled;Conflict: Overlap"
        );
    }
}
