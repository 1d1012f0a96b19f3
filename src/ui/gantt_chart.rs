use chrono::Local;
use egui::{Align2, Color32, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use crate::model::conflicts::highlight_conflicts;
use crate::model::placement::{layout_items, RenderedItem, RowLayout};
use crate::model::{DropOutcome, GanttViewState, ScheduleEntry, TimelineViewport};
use crate::ui::theme;

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const LABEL_WIDTH: f32 = theme::LABEL_WIDTH;

/// Something the user did on the chart that the app has to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartAction {
    Select(Option<i64>),
    Dropped(DropOutcome),
    ViewDetails(i64),
    OpenForm(i64),
    Reschedule(i64),
    Cancel(i64),
}

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub min_item_width: f32,
    pub min_day_width: f32,
    /// Whether the backend has a web form to open.
    pub can_open_form: bool,
}

/// Render the Gantt chart area (central panel).
pub fn show_gantt_chart(
    state: &mut GanttViewState,
    options: &ChartOptions,
    ui: &mut Ui,
) -> Vec<ChartAction> {
    let mut actions = Vec::new();

    let range = match state.range() {
        Ok(range) => range,
        Err(e) => {
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new(e.to_string()).color(theme::TEXT_SECONDARY));
            });
            return actions;
        }
    };

    let available = ui.available_size();
    let chart_width = (available.x - LABEL_WIDTH)
        .max(range.days() as f32 * options.min_day_width)
        .max(1.0);
    let viewport = match TimelineViewport::new(range, chart_width) {
        Ok(viewport) => viewport,
        Err(e) => {
            ui.label(e.to_string());
            return actions;
        }
    };

    let rows = RowLayout::new(state.workcenters(), HEADER_HEIGHT, ROW_HEIGHT);
    let mut items = layout_items(state.entries(), &rows, &viewport, options.min_item_width);
    highlight_conflicts(&mut items, &state.snapshot.conflicts);

    if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
        state.drag.cancel();
    }

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let canvas_height = (rows.content_height() + 20.0).max(available.y);
            let (response, painter) = ui.allocate_painter(
                Vec2::new(LABEL_WIDTH + chart_width, canvas_height),
                Sense::click(),
            );
            let origin = response.rect.min;
            let chart_origin = origin + Vec2::new(LABEL_WIDTH, 0.0);
            let chart_rect = Rect::from_min_max(chart_origin, response.rect.max);
            // Pointer position in chart coordinates (x from chart start, y from canvas top).
            let to_chart = |p: Pos2| Pos2::new(p.x - chart_origin.x, p.y - origin.y);
            let chart_painter = painter.with_clip_rect(chart_rect.intersect(painter.clip_rect()));
            let mut consumed_click = false;
            let mut dropped = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);
            draw_day_columns(&chart_painter, chart_origin, &viewport, canvas_height);
            draw_rows(&painter, origin, state, &rows, LABEL_WIDTH + chart_width);
            draw_today_line(&chart_painter, chart_origin, &viewport, canvas_height);
            if rows.is_empty() {
                painter.text(
                    Pos2::new(origin.x + 10.0, origin.y + HEADER_HEIGHT + ROW_HEIGHT / 2.0),
                    Align2::LEFT_CENTER,
                    "No workcenters for this line",
                    theme::font_bar(),
                    theme::TEXT_DIM,
                );
            }

            for item in &items {
                let Some(entry) = state.snapshot.entries.iter().find(|e| e.id == item.schedule_id)
                else {
                    continue;
                };
                let bar_rect = bar_rect(chart_origin, &rows, item);
                let dragging = state.drag.is_dragging(entry.id);
                draw_bar(
                    &chart_painter,
                    bar_rect,
                    entry,
                    item,
                    state.selected == Some(entry.id),
                    dragging,
                );

                let visible = bar_rect.intersect(chart_rect);
                if !visible.is_positive() {
                    continue;
                }
                let mut bar_response = ui.interact(
                    visible,
                    ui.make_persistent_id(("schedule-bar", entry.id)),
                    Sense::click_and_drag(),
                );

                if bar_response.clicked() {
                    actions.push(ChartAction::Select(Some(entry.id)));
                    actions.push(ChartAction::ViewDetails(entry.id));
                    consumed_click = true;
                }

                if bar_response.drag_started() {
                    if let Some(pointer) = bar_response.interact_pointer_pos() {
                        state.drag.begin(entry, to_chart(pointer), item.placement.position);
                        actions.push(ChartAction::Select(Some(entry.id)));
                    }
                }
                if bar_response.dragged() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
                    if let Some(pointer) = bar_response.interact_pointer_pos() {
                        state.drag.update(to_chart(pointer));
                    }
                }
                if bar_response.drag_stopped() {
                    let pointer = bar_response
                        .interact_pointer_pos()
                        .or_else(|| ui.input(|i| i.pointer.latest_pos()))
                        .map(to_chart);
                    let outcome = state.drag.finish(pointer, &rows, &viewport);
                    actions.push(ChartAction::Dropped(outcome));
                    dropped = true;
                }

                if state.drag.gesture().is_none() {
                    if bar_response.hovered() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                    }
                    bar_response = bar_response.on_hover_ui(|ui| {
                        show_item_tooltip(ui, entry, item.conflict.as_deref());
                    });
                }

                bar_response.context_menu(|ui| {
                    if ui.button(format!("{} View details", egui_phosphor::regular::EYE)).clicked() {
                        actions.push(ChartAction::ViewDetails(entry.id));
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(
                            options.can_open_form,
                            egui::Button::new(format!(
                                "{} Edit in ERP",
                                egui_phosphor::regular::PENCIL_SIMPLE
                            )),
                        )
                        .clicked()
                    {
                        actions.push(ChartAction::OpenForm(entry.id));
                        ui.close_menu();
                    }
                    if ui
                        .button(format!("{} Reschedule...", egui_phosphor::regular::CALENDAR))
                        .clicked()
                    {
                        actions.push(ChartAction::Reschedule(entry.id));
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui
                        .button(format!("{} Cancel schedule", egui_phosphor::regular::X_CIRCLE))
                        .clicked()
                    {
                        actions.push(ChartAction::Cancel(entry.id));
                        ui.close_menu();
                    }
                });
            }

            if let Some(gesture) = state.drag.gesture() {
                let width = items
                    .iter()
                    .find(|item| item.schedule_id == gesture.schedule_id)
                    .map(|item| item.placement.width)
                    .unwrap_or(options.min_item_width);
                draw_ghost(&chart_painter, chart_origin, &rows, &viewport, gesture.ghost_left(), gesture.pointer.y, width);
            }

            // The dragged bar can vanish mid-gesture; never leave a drag dangling.
            if !dropped
                && state.drag.gesture().is_some()
                && !ui.input(|i| i.pointer.any_down())
            {
                state.drag.cancel();
            }

            if response.clicked() && !consumed_click {
                actions.push(ChartAction::Select(None));
            }
        });

    actions
}

fn bar_rect(chart_origin: Pos2, rows: &RowLayout, item: &RenderedItem) -> Rect {
    let inset = theme::BAR_INSET;
    Rect::from_min_size(
        Pos2::new(
            chart_origin.x + item.placement.position,
            chart_origin.y + rows.row_top(item.row) + inset,
        ),
        Vec2::new(item.placement.width, ROW_HEIGHT - inset * 2.0),
    )
}

fn draw_day_columns(
    painter: &egui::Painter,
    origin: Pos2,
    viewport: &TimelineViewport,
    height: f32,
) {
    let width = viewport.total_width();
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let day_width = viewport.pixels_per_day();
    let show_hours = day_width >= 240.0;
    for day in viewport.range.scale() {
        let x = origin.x + viewport.date_to_x(day.date);

        if day.is_weekend {
            painter.rect_filled(
                Rect::from_min_size(
                    Pos2::new(x, origin.y),
                    Vec2::new(day_width, height),
                ),
                0.0,
                theme::BG_WEEKEND,
            );
        }
        painter.line_segment(
            [Pos2::new(x, origin.y), Pos2::new(x, origin.y + height)],
            Stroke::new(0.5, theme::GRID_LINE),
        );

        let text_color = if day.is_weekend {
            theme::TEXT_DIM
        } else {
            theme::TEXT_SECONDARY
        };
        painter.text(
            Pos2::new(x + day_width / 2.0, origin.y + 14.0),
            Align2::CENTER_CENTER,
            &day.label,
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
        painter.text(
            Pos2::new(x + day_width / 2.0, origin.y + 31.0),
            Align2::CENTER_CENTER,
            &day.day_name,
            theme::font_sub(),
            text_color,
        );

        if show_hours {
            let hour_px = viewport.pixels_per_hour();
            for hour in (3..24).step_by(3) {
                let hx = x + hour as f32 * hour_px;
                painter.line_segment(
                    [Pos2::new(hx, origin.y + HEADER_HEIGHT), Pos2::new(hx, origin.y + height)],
                    Stroke::new(0.5, Color32::from_white_alpha(6)),
                );
                painter.text(
                    Pos2::new(hx + 2.0, origin.y + HEADER_HEIGHT - 6.0),
                    Align2::LEFT_BOTTOM,
                    format!("{:02}h", hour),
                    theme::font_small(),
                    theme::TEXT_DIM,
                );
            }
        }
    }
}

fn draw_rows(
    painter: &egui::Painter,
    origin: Pos2,
    state: &GanttViewState,
    rows: &RowLayout,
    width: f32,
) {
    // Label column header
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(LABEL_WIDTH, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.text(
        Pos2::new(origin.x + 10.0, origin.y + HEADER_HEIGHT / 2.0),
        Align2::LEFT_CENTER,
        "Workcenter",
        theme::font_header(),
        theme::TEXT_SECONDARY,
    );

    for (i, wc) in state.workcenters().iter().enumerate() {
        let y = origin.y + rows.row_top(i);
        if i % 2 == 0 {
            painter.rect_filled(
                Rect::from_min_size(Pos2::new(origin.x, y), Vec2::new(width, ROW_HEIGHT)),
                0.0,
                Color32::from_white_alpha(4),
            );
        }
        painter.line_segment(
            [
                Pos2::new(origin.x, y + ROW_HEIGHT),
                Pos2::new(origin.x + width, y + ROW_HEIGHT),
            ],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );

        let label_rect =
            Rect::from_min_size(Pos2::new(origin.x, y), Vec2::new(LABEL_WIDTH, ROW_HEIGHT));
        painter.rect_filled(label_rect, 0.0, theme::BG_LABELS);
        let clipped = painter.with_clip_rect(label_rect.shrink(2.0));
        clipped.text(
            Pos2::new(origin.x + 10.0, y + 12.0),
            Align2::LEFT_CENTER,
            &wc.name,
            theme::font_bar(),
            theme::TEXT_PRIMARY,
        );
        clipped.text(
            Pos2::new(origin.x + 10.0, y + 25.0),
            Align2::LEFT_CENTER,
            format!("{:.0}h/day · {:.0}%", wc.capacity_hours, wc.time_efficiency),
            theme::font_small(),
            theme::TEXT_DIM,
        );
    }

    painter.line_segment(
        [
            Pos2::new(origin.x + LABEL_WIDTH, origin.y),
            Pos2::new(origin.x + LABEL_WIDTH, origin.y + rows.content_height()),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
}

fn draw_today_line(
    painter: &egui::Painter,
    origin: Pos2,
    viewport: &TimelineViewport,
    height: f32,
) {
    let now = Local::now().naive_local();
    if !viewport.range.contains(now) {
        return;
    }
    let x = origin.x + viewport.time_to_x(now);

    painter.line_segment(
        [
            Pos2::new(x, origin.y + HEADER_HEIGHT),
            Pos2::new(x, origin.y + height),
        ],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, origin.y + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        Align2::CENTER_CENTER,
        "Now",
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_bar(
    painter: &egui::Painter,
    bar_rect: Rect,
    entry: &ScheduleEntry,
    item: &RenderedItem,
    is_selected: bool,
    dragging: bool,
) {
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    let mut fill = entry.state.color();
    if dragging {
        fill = fill.gamma_multiply(0.35);
    }

    painter.rect_filled(
        bar_rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );
    painter.rect_filled(bar_rect, rounding, fill);
    painter.rect_filled(
        Rect::from_min_size(
            bar_rect.min,
            Vec2::new(bar_rect.width(), (bar_rect.height() * 0.45).max(4.0)),
        ),
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );

    if item.conflict.is_some() {
        painter.rect_stroke(bar_rect.expand(1.0), rounding, Stroke::new(2.0, theme::CONFLICT));
    }
    if is_selected {
        painter.rect_stroke(
            bar_rect.expand(2.5),
            Rounding::same(theme::BAR_ROUNDING + 2.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if bar_rect.width() > 30.0 {
        let mut label = entry.display_name().to_string();
        if entry.alerts_count > 0 {
            label = format!("{} {}", egui_phosphor::regular::WARNING, label);
        }
        let galley = painter.layout_no_wrap(label, theme::font_bar(), theme::TEXT_ON_BAR);
        let clipped = painter.with_clip_rect(bar_rect.intersect(painter.clip_rect()));
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        clipped.galley(
            Pos2::new(bar_rect.left() + 6.0, text_y),
            galley,
            Color32::TRANSPARENT,
        );
    }
}

fn draw_ghost(
    painter: &egui::Painter,
    chart_origin: Pos2,
    rows: &RowLayout,
    viewport: &TimelineViewport,
    left: f32,
    pointer_y: f32,
    width: f32,
) {
    let Some(row) = rows
        .workcenter_at(pointer_y)
        .and_then(|id| rows.index_of(id))
    else {
        return;
    };
    let inset = theme::BAR_INSET;
    let rect = Rect::from_min_size(
        Pos2::new(chart_origin.x + left, chart_origin.y + rows.row_top(row) + inset),
        Vec2::new(width, ROW_HEIGHT - inset * 2.0),
    );
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    painter.rect_filled(rect, rounding, theme::GHOST_FILL);
    painter.rect_stroke(rect, rounding, Stroke::new(1.5, theme::ACCENT));

    let start = viewport.x_to_time(left);
    painter.line_segment(
        [
            Pos2::new(rect.left(), chart_origin.y + HEADER_HEIGHT),
            Pos2::new(rect.left(), rect.top()),
        ],
        Stroke::new(1.0, theme::ACCENT),
    );
    painter.text(
        Pos2::new(rect.left() + 2.0, rect.top() - 2.0),
        Align2::LEFT_BOTTOM,
        start.format("%d/%m %H:%M").to_string(),
        theme::font_small(),
        theme::TEXT_PRIMARY,
    );
}

fn show_item_tooltip(ui: &mut Ui, entry: &ScheduleEntry, conflict: Option<&str>) {
    ui.strong(entry.display_name());
    egui::Grid::new(("schedule-tip", entry.id))
        .num_columns(2)
        .spacing([10.0, 2.0])
        .show(ui, |ui| {
            let row = |ui: &mut Ui, label: &str, value: String| {
                ui.label(egui::RichText::new(label).color(theme::TEXT_SECONDARY));
                ui.label(value);
                ui.end_row();
            };
            row(ui, "Product", entry.product_name.clone());
            row(ui, "Quantity", format!("{}", entry.quantity));
            row(ui, "Start", entry.start.format("%d/%m %H:%M").to_string());
            row(ui, "End", entry.end.format("%d/%m %H:%M").to_string());
            row(ui, "Duration", format!("{:.1}h", entry.hours()));
            row(ui, "State", entry.state.label().to_string());
            row(ui, "Operators", entry.operators_label());
        });
    if let Some(conflict) = conflict {
        ui.add_space(4.0);
        ui.label(egui::RichText::new(conflict).color(theme::CONFLICT));
    }
}
