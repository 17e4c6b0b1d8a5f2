use egui::{Color32, Frame, Stroke, Ui};

use crate::telemetry::StatusClass;

/// Dark-theme palette shared by every screen.
pub struct UiColors;

impl UiColors {
    pub const MAIN_BG: Color32 = Color32::from_rgb(30, 30, 30);
    pub const INNER_BG: Color32 = Color32::from_rgb(25, 25, 25);
    pub const EXTREME_BG: Color32 = Color32::from_rgb(20, 20, 20);
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);
    /// Connected/online indicator - green.
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);
    /// Disconnected/offline indicator - red.
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);
    /// Warning status highlight - amber.
    pub const WARNING: Color32 = Color32::from_rgb(220, 170, 30);
    pub const ERROR_TEXT: Color32 = Color32::from_rgb(235, 110, 90);
}

pub fn status_color(class: StatusClass) -> Color32 {
    match class {
        StatusClass::Normal => UiColors::ACTIVE,
        StatusClass::Warning => UiColors::WARNING,
        StatusClass::Alert => UiColors::INACTIVE,
    }
}

/// Filled circle indicator, green when active.
pub fn state_dot(ui: &mut Ui, active: bool) {
    let color = if active {
        UiColors::ACTIVE
    } else {
        UiColors::INACTIVE
    };
    ui.colored_label(color, "\u{2B24}");
}

pub fn bordered_frame() -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, UiColors::BORDER))
        .fill(UiColors::INNER_BG)
        .inner_margin(6)
        .outer_margin(2)
}

/// Error banner with a retry button; returns true when retry was clicked.
pub fn error_banner(ui: &mut Ui, message: &str) -> bool {
    let mut retry = false;
    Frame::new()
        .stroke(Stroke::new(1.0, UiColors::INACTIVE))
        .fill(UiColors::EXTREME_BG)
        .inner_margin(8)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(UiColors::ERROR_TEXT, message);
                if ui.button("Try Again").clicked() {
                    retry = true;
                }
            });
        });
    retry
}
