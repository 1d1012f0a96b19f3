use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use egui::{Color32, Context, RichText, Window};

use crate::app::GanttApp;
use crate::model::{RescheduleRequest, ScheduleEntry};
use crate::ui::theme;

/// Form state of the reschedule dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct RescheduleDraft {
    pub schedule_id: i64,
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
    pub workcenter_id: i64,
}

impl RescheduleDraft {
    pub fn from_entry(entry: &ScheduleEntry) -> Self {
        Self {
            schedule_id: entry.id,
            date: entry.start.date(),
            hour: entry.start.hour(),
            minute: entry.start.minute(),
            workcenter_id: entry.workcenter_id,
        }
    }

    pub fn new_start(&self) -> Option<NaiveDateTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).map(|time| self.date.and_time(time))
    }

    pub fn to_request(&self) -> Option<RescheduleRequest> {
        Some(RescheduleRequest {
            schedule_id: self.schedule_id,
            new_workcenter_id: self.workcenter_id,
            new_start: self.new_start()?,
        })
    }
}

/// Read-only details of one schedule entry.
pub fn show_detail_dialog(app: &mut GanttApp, ctx: &Context) {
    let Some(id) = app.detail else {
        return;
    };
    let Some(entry) = app.state.entry(id).cloned() else {
        app.detail = None;
        return;
    };
    let conflict = app.state.conflicts().tooltip(id);
    let can_open_form = app.can_open_form();

    let mut open = true;
    let mut close = false;
    Window::new(RichText::new(entry.display_name()).strong().size(14.0))
        .id(egui::Id::new("schedule_detail"))
        .open(&mut open)
        .resizable(false)
        .collapsible(false)
        .default_width(320.0)
        .show(ctx, |ui| {
            egui::Grid::new("detail_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    let row = |ui: &mut egui::Ui, label: &str, value: String| {
                        ui.label(RichText::new(label).color(theme::TEXT_SECONDARY));
                        ui.label(value);
                        ui.end_row();
                    };
                    row(ui, "Reference", entry.name.clone());
                    row(ui, "Production", entry.production_name.clone());
                    row(ui, "Workcenter", entry.workcenter_name.clone());
                    row(ui, "Product", entry.product_name.clone());
                    row(ui, "Quantity", format!("{}", entry.quantity));
                    row(ui, "Start", entry.start.format("%d/%m/%Y %H:%M").to_string());
                    row(ui, "End", entry.end.format("%d/%m/%Y %H:%M").to_string());
                    row(ui, "Duration", format!("{:.1}h", entry.hours()));
                    row(ui, "State", entry.state.label().to_string());
                    row(ui, "Operators", entry.operators_label());
                    row(ui, "Alerts", entry.alerts_count.to_string());
                });

            if let Some(conflict) = &conflict {
                ui.add_space(6.0);
                ui.label(RichText::new(conflict).color(theme::CONFLICT));
            }

            ui.add_space(6.0);
            ui.separator();
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(can_open_form, egui::Button::new("Edit in ERP"))
                    .clicked()
                {
                    app.open_form(id);
                }
                if ui.button("Reschedule...").clicked() {
                    app.reschedule = Some(RescheduleDraft::from_entry(&entry));
                    close = true;
                }
                if ui.button("Close").clicked() {
                    close = true;
                }
            });
        });

    if !open || close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.detail = None;
    }
}

/// Pick a new start time and workcenter for an entry.
pub fn show_reschedule_dialog(app: &mut GanttApp, ctx: &Context) {
    let Some(mut draft) = app.reschedule.clone() else {
        return;
    };
    let title = app
        .state
        .entry(draft.schedule_id)
        .map(|e| format!("Reschedule {}", e.display_name()))
        .unwrap_or_else(|| "Reschedule".to_string());
    let workcenters: Vec<(i64, String)> = app
        .state
        .workcenters()
        .iter()
        .map(|wc| (wc.id, wc.name.clone()))
        .collect();

    let mut submit = false;
    let mut close = false;
    Window::new(RichText::new(title).strong().size(14.0))
        .id(egui::Id::new("reschedule_dialog"))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::Grid::new("reschedule_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Date").color(theme::TEXT_SECONDARY));
                    ui.add(egui_extras::DatePickerButton::new(&mut draft.date).id_salt("resched_date"));
                    ui.end_row();

                    ui.label(RichText::new("Time").color(theme::TEXT_SECONDARY));
                    ui.horizontal(|ui| {
                        ui.add(egui::DragValue::new(&mut draft.hour).range(0..=23).suffix(" h"));
                        ui.add(egui::DragValue::new(&mut draft.minute).range(0..=59).suffix(" min"));
                    });
                    ui.end_row();

                    ui.label(RichText::new("Workcenter").color(theme::TEXT_SECONDARY));
                    let selected = workcenters
                        .iter()
                        .find(|(id, _)| *id == draft.workcenter_id)
                        .map(|(_, name)| name.clone())
                        .unwrap_or_default();
                    egui::ComboBox::from_id_salt("resched_wc")
                        .selected_text(selected)
                        .width(200.0)
                        .show_ui(ui, |ui| {
                            for (id, name) in &workcenters {
                                ui.selectable_value(&mut draft.workcenter_id, *id, name);
                            }
                        });
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.separator();
            ui.horizontal(|ui| {
                let apply = egui::Button::new(RichText::new("Reschedule").color(Color32::WHITE))
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_sized([100.0, 28.0], apply).clicked() {
                    submit = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    close = true;
                }
            });
        });

    if submit {
        if let Some(request) = draft.to_request() {
            app.submit_reschedule(request);
        }
        app.reschedule = None;
    } else if close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.reschedule = None;
    } else {
        app.reschedule = Some(draft);
    }
}

/// Ask before cancelling a schedule entry.
pub fn show_cancel_dialog(app: &mut GanttApp, ctx: &Context) {
    let Some(id) = app.cancel_confirm else {
        return;
    };
    let name = app
        .state
        .entry(id)
        .map(|e| e.display_name().to_string())
        .unwrap_or_else(|| format!("#{}", id));

    let mut confirm = false;
    let mut close = false;
    Window::new(RichText::new("Cancel schedule").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(format!("Cancel {}? This cannot be undone from here.", name));
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let danger = egui::Button::new(RichText::new("Cancel schedule").color(Color32::WHITE))
                    .fill(theme::CONFLICT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_sized([120.0, 28.0], danger).clicked() {
                    confirm = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Keep")).clicked() {
                    close = true;
                }
            });
        });

    if confirm {
        app.submit_cancel(id);
        app.cancel_confirm = None;
    } else if close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.cancel_confirm = None;
    }
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut GanttApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 180.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Production Gantt").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("Production schedule timeline");
                ui.label(RichText::new(app.backend_label()).color(theme::TEXT_DIM));
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}
