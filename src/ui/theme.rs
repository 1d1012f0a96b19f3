use egui::style::WidgetVisuals;
use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use crate::service::NotificationLevel;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_WEEKEND: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 40);
pub const BG_LABELS: Color32 = Color32::from_rgb(28, 28, 37);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const TODAY_LINE: Color32 = Color32::from_rgb(240, 75, 75);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const CONFLICT: Color32 = Color32::from_rgb(231, 76, 60);
pub const GHOST_FILL: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 70);
pub const OVERLOAD: Color32 = Color32::from_rgb(230, 126, 34);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const ROW_HEIGHT: f32 = 34.0;
pub const HEADER_HEIGHT: f32 = 44.0;
pub const LABEL_WIDTH: f32 = 170.0;
pub const BAR_ROUNDING: f32 = 5.0;
pub const BAR_INSET: f32 = 4.0; // vertical inset so bars don't touch row edges
pub const STATUS_BAR_HEIGHT: f32 = 24.0;
pub const SIDE_PANEL_WIDTH: f32 = 260.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

pub fn notification_color(level: NotificationLevel) -> Color32 {
    match level {
        NotificationLevel::Success => Color32::from_rgb(46, 204, 113),
        NotificationLevel::Info => ACCENT,
        NotificationLevel::Warning => Color32::from_rgb(243, 156, 18),
        NotificationLevel::Error => CONFLICT,
    }
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

/// Widget look for one interaction state.
fn widget(fill: Color32, stroke: Color32, text: Color32) -> WidgetVisuals {
    WidgetVisuals {
        bg_fill: fill,
        weak_bg_fill: fill,
        bg_stroke: Stroke::new(1.0, stroke),
        fg_stroke: Stroke::new(1.0, text),
        rounding: Rounding::same(3.0),
        expansion: 0.0,
    }
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.faint_bg_color = BG_LABELS;
    visuals.extreme_bg_color = BG_DARK;

    // Warnings and errors share the chart's overload and conflict colours.
    visuals.warn_fg_color = OVERLOAD;
    visuals.error_fg_color = CONFLICT;
    visuals.hyperlink_color = ACCENT;

    visuals.widgets.noninteractive = widget(BG_PANEL, GRID_LINE, TEXT_SECONDARY);
    visuals.widgets.inactive = widget(BG_HEADER, BORDER_SUBTLE, TEXT_PRIMARY);
    visuals.widgets.hovered = widget(Color32::from_rgb(44, 54, 74), BORDER_ACCENT, TEXT_PRIMARY);
    visuals.widgets.active = widget(ACCENT, BORDER_ACCENT, TEXT_ON_BAR);
    visuals.widgets.open = widget(Color32::from_rgb(40, 48, 66), ACCENT, TEXT_PRIMARY);

    visuals.selection.bg_fill = ACCENT.gamma_multiply(0.45);
    visuals.selection.stroke = Stroke::new(1.0, TEXT_ON_BAR);
    visuals.slider_trailing_fill = true;

    visuals.window_rounding = Rounding::same(6.0);
    visuals.menu_rounding = Rounding::same(4.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.striped = false;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(6.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 3.0);
    style.spacing.interact_size.y = 22.0;
    ctx.set_style(style);
}
