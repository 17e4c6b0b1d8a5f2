use std::path::PathBuf;

use egui::{Grid, RichText, ScrollArea, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};
use tracing::{error, info};

use crate::api::Connection;
use crate::telemetry::export::{self, ExportFormat};
use crate::telemetry::projection::{self, TABLE_HEADERS};
use crate::telemetry::{BrokerSessionConfig, ViewerSession, ViewerState};

use super::common::{self, bordered_frame, status_color, UiColors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ViewMode {
    #[default]
    Table,
    Json,
    Timeline,
    Chart,
}

/// The live telemetry panel: session controls, view-mode switch, the four
/// projections of the message window and the export buttons.
pub struct ViewerView {
    session: ViewerSession,
    view_mode: ViewMode,
    export_dir: PathBuf,
    export_status: Option<String>,
}

impl ViewerView {
    pub fn new(export_dir: PathBuf) -> Self {
        Self {
            session: ViewerSession::spawn(),
            view_mode: ViewMode::default(),
            export_dir,
            export_status: None,
        }
    }

    pub fn render(&mut self, ui: &mut Ui, connection: &Connection) {
        self.session.poll();

        let state = self.session.state();
        let session_config = BrokerSessionConfig::from_connection(connection);

        ui.horizontal(|ui| {
            common::state_dot(ui, state == ViewerState::Connected);
            ui.label(match state {
                ViewerState::Connected => "Connected",
                ViewerState::Connecting => "Connecting...",
                ViewerState::Disconnected => "Disconnected",
            });
            ui.label(format!("Messages: {}", self.session.messages_received()));
            if self.session.payloads_dropped() > 0 {
                ui.small(format!("Dropped: {}", self.session.payloads_dropped()));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                for format in [ExportFormat::Text, ExportFormat::Spreadsheet, ExportFormat::Json] {
                    if ui.button(format.label()).clicked() {
                        self.export(format);
                    }
                }
                ui.separator();

                let can_stop = state == ViewerState::Connected;
                if ui.add_enabled(can_stop, egui::Button::new("Stop")).clicked() {
                    self.session.disconnect();
                }

                let can_start =
                    state == ViewerState::Disconnected && session_config.is_some();
                if ui
                    .add_enabled(can_start, egui::Button::new("Start"))
                    .clicked()
                {
                    if let Some(config) = session_config.clone() {
                        self.session.connect(config);
                    }
                }
            });
        });

        if let Some(reason) = self.session.last_error() {
            ui.colored_label(UiColors::ERROR_TEXT, reason);
        }
        if let Some(status) = &self.export_status {
            ui.small(status);
        }
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            ui.label(format!(
                "Received Data ({} messages)",
                self.session.window().len()
            ));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.selectable_value(&mut self.view_mode, ViewMode::Chart, "Chart");
                ui.selectable_value(&mut self.view_mode, ViewMode::Timeline, "Timeline");
                ui.selectable_value(&mut self.view_mode, ViewMode::Json, "JSON");
                ui.selectable_value(&mut self.view_mode, ViewMode::Table, "Table");
            });
        });

        bordered_frame().show(ui, |ui| {
            ui.set_min_height(260.0);
            ui.set_width(ui.available_width());
            match self.view_mode {
                ViewMode::Table => self.render_table(ui),
                ViewMode::Json => self.render_json(ui),
                ViewMode::Timeline => self.render_timeline(ui),
                ViewMode::Chart => self.render_chart(ui),
            }
        });
    }

    fn export(&mut self, format: ExportFormat) {
        match export::write_to(&self.export_dir, format, self.session.window()) {
            Ok(path) => {
                info!("Exported window to {}", path.display());
                self.export_status = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                error!("Export failed: {}", e);
                self.export_status = Some(e.to_string());
            }
        }
    }

    fn render_table(&self, ui: &mut Ui) {
        let rows = projection::table_rows(self.session.window());
        ScrollArea::both().id_salt("table_view").show(ui, |ui| {
            Grid::new("message_table")
                .striped(true)
                .min_col_width(80.0)
                .show(ui, |ui| {
                    for header in TABLE_HEADERS {
                        ui.strong(header);
                    }
                    ui.end_row();
                    for row in &rows {
                        ui.label(&row.arrival);
                        let [temperature, humidity, light, status, timestamp] = &row.cells;
                        ui.label(temperature);
                        ui.label(humidity);
                        ui.label(light);
                        ui.colored_label(status_color(row.status_class), status);
                        ui.label(timestamp);
                        ui.end_row();
                    }
                });
        });
    }

    fn render_json(&self, ui: &mut Ui) {
        let rendered = projection::raw_json(self.session.window());
        ScrollArea::both().id_salt("json_view").show(ui, |ui| {
            ui.label(RichText::new(rendered).monospace());
        });
    }

    fn render_timeline(&self, ui: &mut Ui) {
        ScrollArea::vertical()
            .id_salt("timeline_view")
            .show(ui, |ui| {
                for line in projection::timeline_lines(self.session.window()) {
                    ui.label(line);
                }
            });
    }

    fn render_chart(&self, ui: &mut Ui) {
        let Some(series) = projection::chart_series(self.session.window()) else {
            ui.vertical_centered(|ui| {
                ui.add_space(100.0);
                ui.label("No data to display");
            });
            return;
        };
        let temperature = Line::new(PlotPoints::from(series.temperature)).name("temperature");
        let humidity = Line::new(PlotPoints::from(series.humidity)).name("humidity");
        Plot::new("telemetry_chart")
            .legend(Legend::default())
            .height(260.0)
            .show(ui, |plot_ui| {
                plot_ui.line(temperature);
                plot_ui.line(humidity);
            });
    }
}
