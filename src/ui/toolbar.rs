use crate::app::GanttApp;
use crate::model::{LineFilter, ViewMode};
use crate::ui::theme;
use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

/// Render the top menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button(format!("{}  Export CSV...", icons::FILE_CSV)).clicked() {
                app.export_csv();
                ui.close_menu();
            }
            if ui.button(format!("{}  Save Snapshot...", icons::FLOPPY_DISK)).clicked() {
                app.save_snapshot();
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{}  Open Settings Folder", icons::FOLDER_OPEN)).clicked() {
                app.open_settings_folder();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            ui.label(RichText::new("Zoom").small().weak());
            for mode in ViewMode::ALL {
                if ui.radio(app.state.view_mode == mode, mode.label()).clicked() {
                    app.set_view_mode(mode);
                    ui.close_menu();
                }
            }
            ui.separator();
            if ui.button(format!("{}  Refresh        F5", icons::ARROWS_CLOCKWISE)).clicked() {
                app.reload();
                ui.close_menu();
            }
            let mut auto = app.auto_refresh_enabled();
            if ui.checkbox(&mut auto, "Auto-refresh").changed() {
                app.set_auto_refresh(auto);
            }
            ui.checkbox(&mut app.show_side_panel, "Workcenter panel");
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(app.backend_label()).size(11.0).weak());
        });
    });
}

/// Date range, production line and zoom controls.
pub fn show_filter_bar(app: &mut GanttApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        let mut range_changed = false;

        if ui
            .button(icons::CARET_LEFT)
            .on_hover_text("Previous period")
            .clicked()
        {
            app.shift_range(-1);
        }

        ui.label(RichText::new("From").color(theme::TEXT_SECONDARY));
        range_changed |= ui
            .add(egui_extras::DatePickerButton::new(&mut app.state.date_from).id_salt("filter_from"))
            .changed();
        ui.label(RichText::new("To").color(theme::TEXT_SECONDARY));
        range_changed |= ui
            .add(egui_extras::DatePickerButton::new(&mut app.state.date_to).id_salt("filter_to"))
            .changed();

        if ui
            .button(icons::CARET_RIGHT)
            .on_hover_text("Next period")
            .clicked()
        {
            app.shift_range(1);
        }

        if range_changed {
            app.on_range_changed();
        }

        ui.separator();

        let mut line = app.state.line_filter.clone();
        egui::ComboBox::from_id_salt("line_filter")
            .selected_text(line.label().to_string())
            .width(170.0)
            .show_ui(ui, |ui| {
                for option in LineFilter::options() {
                    let label = option.label().to_string();
                    ui.selectable_value(&mut line, option, label);
                }
            });
        if line != app.state.line_filter {
            app.set_line_filter(line);
        }

        ui.separator();

        for mode in ViewMode::ALL {
            if ui
                .selectable_label(app.state.view_mode == mode, mode.label())
                .clicked()
            {
                app.set_view_mode(mode);
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let refresh = ui.add_enabled(
                !app.state.loading,
                egui::Button::new(format!("{} Refresh", icons::ARROWS_CLOCKWISE)),
            );
            if refresh.clicked() {
                app.reload();
            }
            if app.state.loading {
                ui.spinner();
            }
        });
    });
}
