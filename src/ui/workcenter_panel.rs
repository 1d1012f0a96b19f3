use crate::model::GanttViewState;
use crate::ui::theme;
use egui::{Color32, RichText, Ui};

/// Actions that the side panel can request.
pub enum PanelAction {
    None,
    Select(i64),
}

/// Render the workcenter load list and the conflicts of the visible range.
pub fn show_workcenter_panel(state: &GanttViewState, ui: &mut Ui) -> PanelAction {
    let mut action = PanelAction::None;

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Workcenters")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({})", state.workcenters().len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
    });
    ui.add_space(4.0);
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if state.workcenters().is_empty() {
                ui.label(RichText::new("No workcenters for this line").color(theme::TEXT_DIM));
            }

            for (i, wc) in state.workcenters().iter().enumerate() {
                let load = state.load_hours(wc.id);
                let capacity = state.capacity_hours(wc.id);
                let ratio = if capacity > 0.0 { load / capacity } else { 0.0 };
                let runs = state.entries_for(wc.id).count();
                let conflicted = state
                    .entries_for(wc.id)
                    .filter(|e| state.conflicts().contains(e.id))
                    .count();

                let frame = egui::Frame {
                    fill: if i % 2 == 0 { theme::BG_PANEL } else { theme::BG_DARK },
                    rounding: egui::Rounding::same(4.0),
                    inner_margin: egui::Margin::symmetric(6.0, 4.0),
                    ..Default::default()
                };
                frame.show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.add(egui::Label::new(RichText::new(&wc.name).size(12.0)).truncate());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                RichText::new(format!("{} runs", runs))
                                    .size(10.0)
                                    .color(theme::TEXT_DIM),
                            );
                            if conflicted > 0 {
                                ui.label(
                                    RichText::new(format!(
                                        "{} {}",
                                        egui_phosphor::regular::WARNING,
                                        conflicted
                                    ))
                                    .size(10.0)
                                    .color(theme::CONFLICT),
                                )
                                .on_hover_text("Runs in conflict");
                            }
                        });
                    });
                    let fill = if ratio > 1.0 { theme::OVERLOAD } else { theme::ACCENT };
                    ui.add(
                        egui::ProgressBar::new(ratio.min(1.0) as f32)
                            .desired_width(ui.available_width())
                            .fill(fill)
                            .text(
                                RichText::new(format!("{:.1} / {:.0} h ({:.0}%)", load, capacity, ratio * 100.0))
                                    .size(10.0),
                            ),
                    );
                });
                ui.add_space(1.0);
            }

            ui.add_space(8.0);
            let conflicts = &state.snapshot.conflicts;
            ui.label(
                RichText::new(format!("Conflicts ({})", conflicts.len()))
                    .strong()
                    .color(if conflicts.is_empty() {
                        theme::TEXT_SECONDARY
                    } else {
                        theme::CONFLICT
                    }),
            );
            ui.separator();
            for conflict in conflicts {
                let name = state
                    .entry(conflict.schedule_id)
                    .map(|e| e.display_name().to_string())
                    .unwrap_or_else(|| format!("#{}", conflict.schedule_id));
                let selected = state.selected == Some(conflict.schedule_id);
                let text = RichText::new(format!("{}: {}", name, conflict.reason))
                    .size(11.0)
                    .color(if selected { Color32::WHITE } else { theme::TEXT_SECONDARY });
                if ui.selectable_label(selected, text).clicked() {
                    action = PanelAction::Select(conflict.schedule_id);
                }
            }
        });

    action
}
