use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::io;
use crate::model::{DropOutcome, GanttViewState, LineFilter, RescheduleRequest, ViewMode};
use crate::service::{Notification, Repaint, ScheduleService, Toasts};
use crate::ui;
use crate::ui::dialogs::RescheduleDraft;
use crate::ui::gantt_chart::{ChartAction, ChartOptions};
use crate::ui::workcenter_panel::PanelAction;

/// Main application state.
pub struct GanttApp {
    config: AppConfig,
    config_path: PathBuf,
    // Dropped before the runtime so in-flight tasks are aborted first.
    service: ScheduleService,
    _runtime: tokio::runtime::Runtime,

    pub state: GanttViewState,
    toasts: Toasts,
    pub status_message: String,

    pub show_side_panel: bool,
    pub show_about: bool,
    pub detail: Option<i64>,
    pub reschedule: Option<RescheduleDraft>,
    pub cancel_confirm: Option<i64>,
}

impl GanttApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        config_path: PathBuf,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("schedule-io")
            .enable_all()
            .build()?;

        let backend = crate::backend::from_config(&config)?;
        let ctx = cc.egui_ctx.clone();
        let repaint: Repaint = Arc::new(move || ctx.request_repaint());
        let mut service = ScheduleService::new(backend, runtime.handle().clone(), repaint);
        info!(backend = %service.backend_label(), "schedule backend ready");

        let today = Local::now().date_naive();
        let mut state = GanttViewState::new(
            config.default_view_mode,
            config.default_line_filter.clone(),
            today,
        );
        service.reload_current(&mut state);
        if let Some(period) = config.refresh_interval() {
            service.start_auto_refresh(period);
        }

        Ok(Self {
            config,
            config_path,
            service,
            _runtime: runtime,
            state,
            toasts: Toasts::default(),
            status_message: "Loading...".to_string(),
            show_side_panel: true,
            show_about: false,
            detail: None,
            reschedule: None,
            cancel_confirm: None,
        })
    }

    fn notify(&mut self, notification: Notification) {
        self.status_message = format!("{}: {}", notification.title, notification.message);
        self.toasts.push(notification, Instant::now());
    }

    // --- Schedule queries ---

    pub fn reload(&mut self) {
        self.service.reload_current(&mut self.state);
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        zoom(&mut self.state, &mut self.service, mode, Local::now().date_naive());
    }

    pub fn set_line_filter(&mut self, line: LineFilter) {
        self.state.line_filter = line;
        self.state.selected = None;
        self.reload();
    }

    pub fn shift_range(&mut self, steps: i32) {
        self.state.shift(steps);
        self.reload();
    }

    /// Called after either date picker changed.
    pub fn on_range_changed(&mut self) {
        match self.state.range() {
            Ok(_) => self.reload(),
            Err(e) => self.notify(Notification::warning("Invalid range", e.to_string())),
        }
    }

    pub fn backend_label(&self) -> String {
        self.service.backend_label()
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.service.auto_refresh_period().is_some()
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.config.auto_refresh = enabled;
        if !enabled {
            self.service.stop_auto_refresh();
        } else if let Some(period) = self.config.refresh_interval() {
            self.service.start_auto_refresh(period);
        } else {
            self.notify(Notification::info(
                "Auto-refresh",
                "The refresh interval is zero in the settings file",
            ));
        }
    }

    // --- Schedule actions ---

    pub fn can_open_form(&self) -> bool {
        self.service.form_url(0).is_some()
    }

    pub fn open_form(&mut self, schedule_id: i64) {
        let Some(url) = self.service.form_url(schedule_id) else {
            return;
        };
        if let Err(e) = open::that(&url) {
            warn!(url = %url, "could not open browser: {}", e);
            self.notify(Notification::error("Open failed", e.to_string()));
        }
    }

    pub fn submit_reschedule(&mut self, request: RescheduleRequest) {
        self.status_message = "Rescheduling...".to_string();
        self.service.request_reschedule(request);
    }

    pub fn submit_cancel(&mut self, schedule_id: i64) {
        self.status_message = "Cancelling...".to_string();
        self.service.request_cancel(schedule_id);
    }

    fn handle_chart_action(&mut self, action: ChartAction) {
        match action {
            ChartAction::Select(id) => self.state.selected = id,
            ChartAction::Dropped(DropOutcome::Reschedule(request)) => {
                self.submit_reschedule(request)
            }
            ChartAction::Dropped(DropOutcome::Cancelled) => {}
            ChartAction::ViewDetails(id) => self.detail = Some(id),
            ChartAction::OpenForm(id) => self.open_form(id),
            ChartAction::Reschedule(id) => {
                self.reschedule = self.state.entry(id).map(RescheduleDraft::from_entry);
            }
            ChartAction::Cancel(id) => self.cancel_confirm = Some(id),
        }
    }

    // --- Files ---

    pub fn export_csv(&mut self) {
        if self.state.entries().is_empty() {
            self.status_message = "Nothing to export: no schedules in range".to_string();
            return;
        }

        let default_name = format!(
            "schedule_{}_{}.csv",
            self.state.date_from.format("%Y%m%d"),
            self.state.date_to.format("%Y%m%d")
        );
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(&default_name)
            .save_file()
        {
            match io::csv_export::export_csv(&self.state, &path) {
                Ok(count) => {
                    self.status_message = format!("Exported {} schedules to CSV", count);
                }
                Err(e) => self.notify(Notification::error("CSV export failed", e.to_string())),
            }
        }
    }

    pub fn save_snapshot(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Schedule Snapshot", &["json"])
            .set_file_name("schedule_snapshot.json")
            .save_file()
        {
            match io::save_snapshot(&self.state.snapshot, &path) {
                Ok(()) => self.status_message = "Snapshot saved".to_string(),
                Err(e) => self.notify(Notification::error("Snapshot failed", e.to_string())),
            }
        }
    }

    pub fn open_settings_folder(&mut self) {
        let Some(dir) = self.config_path.parent() else {
            return;
        };
        if let Err(e) = std::fs::create_dir_all(dir).and_then(|_| open::that(dir)) {
            self.notify(Notification::error("Open failed", e.to_string()));
        }
    }

    // --- Panels ---

    fn show_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&self.status_message).size(11.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let updated = self
                    .state
                    .last_update
                    .map(|t| t.format("%d/%m/%Y %H:%M:%S").to_string())
                    .unwrap_or_else(|| "Never".to_string());
                ui.label(
                    egui::RichText::new(format!("Last update: {}", updated))
                        .size(11.0)
                        .color(ui::theme::TEXT_SECONDARY),
                );
                ui.separator();
                let conflicts = self.state.conflicts().len();
                ui.label(
                    egui::RichText::new(format!("{} conflicts", conflicts))
                        .size(11.0)
                        .color(if conflicts > 0 {
                            ui::theme::CONFLICT
                        } else {
                            ui::theme::TEXT_SECONDARY
                        }),
                );
                ui.separator();
                ui.label(
                    egui::RichText::new(format!("{} schedules", self.state.entries().len()))
                        .size(11.0)
                        .color(ui::theme::TEXT_SECONDARY),
                );
            });
        });
    }

    fn show_toasts(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.toasts.prune(now);
        if self.toasts.is_empty() {
            return;
        }

        let mut dismiss = None;
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -(ui::theme::STATUS_BAR_HEIGHT + 12.0)])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for (i, n) in self.toasts.iter().enumerate() {
                    let color = ui::theme::notification_color(n.level);
                    egui::Frame::popup(ui.style())
                        .stroke(egui::Stroke::new(1.0, color))
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.horizontal(|ui| {
                                ui.label(egui::RichText::new(&n.title).strong().color(color));
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        if ui.small_button(egui_phosphor::regular::X).clicked() {
                                            dismiss = Some(i);
                                        }
                                    },
                                );
                            });
                            if !n.message.is_empty() {
                                ui.label(egui::RichText::new(&n.message).size(11.0));
                            }
                        });
                    ui.add_space(4.0);
                }
            });
        if let Some(i) = dismiss {
            self.toasts.dismiss(i);
        }
        // Keep frames coming so expired toasts disappear.
        ctx.request_repaint_after(std::time::Duration::from_millis(500));
    }
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let was_loading = self.state.loading;
        let notifications = self
            .service
            .poll(&mut self.state, Local::now().naive_local());
        for n in notifications {
            self.notify(n);
        }
        if was_loading && !self.state.loading && self.state.last_update.is_some() {
            self.status_message = format!("Loaded {} schedules", self.state.entries().len());
        }

        if ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            self.reload();
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });
        egui::TopBottomPanel::top("filter_bar").show(ctx, |ui| {
            ui.add_space(2.0);
            ui::toolbar::show_filter_bar(self, ui);
            ui.add_space(2.0);
        });
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .show(ctx, |ui| self.show_status_bar(ui));

        if self.show_side_panel {
            egui::SidePanel::right("workcenter_panel")
                .default_width(ui::theme::SIDE_PANEL_WIDTH)
                .resizable(true)
                .show(ctx, |ui| {
                    if let PanelAction::Select(id) =
                        ui::workcenter_panel::show_workcenter_panel(&self.state, ui)
                    {
                        self.state.selected = Some(id);
                    }
                });
        }

        let options = ChartOptions {
            min_item_width: self.config.min_item_width_px,
            min_day_width: self.config.min_day_width_px,
            can_open_form: self.can_open_form(),
        };
        let actions = egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(ui::theme::BG_DARK))
            .show(ctx, |ui| ui::gantt_chart::show_gantt_chart(&mut self.state, &options, ui))
            .inner;
        for action in actions {
            self.handle_chart_action(action);
        }

        ui::dialogs::show_detail_dialog(self, ctx);
        ui::dialogs::show_reschedule_dialog(self, ctx);
        ui::dialogs::show_cancel_dialog(self, ctx);
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
        self.show_toasts(ctx);
    }
}

impl Drop for GanttApp {
    fn drop(&mut self) {
        self.service.shutdown();
        if let Err(e) = save_preferences(
            &self.config_path,
            self.state.view_mode,
            &self.state.line_filter,
            self.config.auto_refresh,
        ) {
            warn!("could not save preferences: {}", e);
        }
    }
}

/// Recompute the range for `mode` around `today` and reload. Picking the mode
/// already shown still returns to the present period.
fn zoom(state: &mut GanttViewState, service: &mut ScheduleService, mode: ViewMode, today: NaiveDate) {
    state.set_view_mode(mode, today);
    service.reload_current(state);
}

/// Write the view preferences into the settings file, leaving every other
/// field as it is on disk.
fn save_preferences(
    path: &Path,
    view_mode: ViewMode,
    line_filter: &LineFilter,
    auto_refresh: bool,
) -> Result<(), ConfigError> {
    let mut stored = if path.exists() {
        AppConfig::load(path)?
    } else {
        AppConfig::default()
    };
    stored.default_view_mode = view_mode;
    stored.default_line_filter = line_filter.clone();
    stored.auto_refresh = auto_refresh;
    stored.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DemoBackend;
    use crate::config::BackendConfig;
    use tokio::runtime::Handle;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn choosing_the_current_zoom_returns_to_the_present_week() {
        let today = date(2024, 1, 10);
        let mut service = ScheduleService::new(
            Arc::new(DemoBackend::sample(today)),
            Handle::current(),
            Arc::new(|| {}),
        );
        let mut state = GanttViewState::new(ViewMode::Week, LineFilter::All, today);
        state.shift(3);
        assert_eq!(state.date_from, date(2024, 1, 29));

        zoom(&mut state, &mut service, ViewMode::Week, today);

        assert_eq!(state.view_mode, ViewMode::Week);
        assert_eq!(state.date_from, date(2024, 1, 8));
        assert_eq!(state.date_to, date(2024, 1, 14));
        assert!(state.loading);
        assert!(service.latest_seq().is_some());
    }

    #[tokio::test]
    async fn every_zoom_issues_a_new_reload() {
        let today = date(2024, 1, 10);
        let mut service = ScheduleService::new(
            Arc::new(DemoBackend::sample(today)),
            Handle::current(),
            Arc::new(|| {}),
        );
        let mut state = GanttViewState::new(ViewMode::Month, LineFilter::All, today);

        zoom(&mut state, &mut service, ViewMode::Month, today);
        let first = service.latest_seq();
        zoom(&mut state, &mut service, ViewMode::Month, today);

        assert!(first.is_some());
        assert_ne!(service.latest_seq(), first);
        assert_eq!(state.date_from, date(2024, 1, 1));
        assert_eq!(state.date_to, date(2024, 1, 31));
    }

    #[test]
    fn preferences_keep_the_stored_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut stored = AppConfig::default();
        stored.backend = BackendConfig::Odoo {
            url: "http://erp:8069".into(),
            database: "prod".into(),
            login: "planner".into(),
            password: String::new(),
        };
        stored.save(&path).unwrap();

        save_preferences(&path, ViewMode::Month, &LineFilter::Line("cajas".into()), false).unwrap();

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded.backend, stored.backend);
        assert_eq!(reloaded.default_view_mode, ViewMode::Month);
        assert_eq!(reloaded.default_line_filter, LineFilter::Line("cajas".into()));
        assert!(!reloaded.auto_refresh);
    }

    #[test]
    fn preferences_create_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        save_preferences(&path, ViewMode::Day, &LineFilter::All, true).unwrap();
        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded.default_view_mode, ViewMode::Day);
        assert_eq!(reloaded.backend, BackendConfig::default());
    }
}
