use std::path::PathBuf;

use egui::{Grid, ScrollArea, Ui};
use tokio::sync::oneshot;
use tracing::debug;

use crate::api::{ApiClient, ApiError, Connection};

use super::common::{self, bordered_frame};
use super::viewer_view::ViewerView;

pub enum DetailAction {
    Back,
}

/// One connection's static configuration plus the embedded telemetry
/// viewer. The record handed over from the list renders immediately; a
/// refresh re-fetches it by id.
pub struct DetailView {
    connection: Connection,
    loading: bool,
    error: Option<String>,
    inflight: Option<oneshot::Receiver<Result<Connection, ApiError>>>,
    viewer: ViewerView,
}

impl DetailView {
    pub fn new(connection: Connection, export_dir: PathBuf) -> Self {
        Self {
            connection,
            loading: false,
            error: None,
            inflight: None,
            viewer: ViewerView::new(export_dir),
        }
    }

    pub fn begin_refresh(&mut self, api: &ApiClient) {
        if self.inflight.is_some() {
            return;
        }
        self.loading = true;
        self.error = None;
        let (tx, rx) = oneshot::channel();
        self.inflight = Some(rx);
        let api = api.clone();
        let id = self.connection.connection_id.clone();
        tokio::spawn(async move {
            let _ = tx.send(api.get_connection(&id).await);
        });
    }

    pub fn poll(&mut self) {
        let Some(rx) = &mut self.inflight else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(connection)) => {
                debug!("Refreshed connection {}", connection.connection_id);
                self.inflight = None;
                self.loading = false;
                self.connection = connection;
            }
            Ok(Err(e)) => {
                self.inflight = None;
                self.loading = false;
                self.error = Some(e.to_string());
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.inflight = None;
                self.loading = false;
                self.error = Some("Failed to load connection details".to_string());
            }
        }
    }

    pub fn render(&mut self, ui: &mut Ui, api: &ApiClient) -> Option<DetailAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            if ui.button("Back").clicked() {
                action = Some(DetailAction::Back);
            }
            ui.heading("Connection Details");
            if ui
                .add_enabled(!self.loading, egui::Button::new("Refresh"))
                .clicked()
            {
                self.begin_refresh(api);
            }
            if self.loading {
                ui.spinner();
            }
        });
        ui.add_space(6.0);

        if let Some(error) = self.error.clone() {
            if common::error_banner(ui, &error) {
                self.begin_refresh(api);
            }
        }

        ScrollArea::vertical().id_salt("detail_view").show(ui, |ui| {
            self.render_card(ui);
            ui.add_space(8.0);
            self.viewer.render(ui, &self.connection);
        });

        action
    }

    fn render_card(&self, ui: &mut Ui) {
        let connection = &self.connection;
        bordered_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.strong(&connection.connection_name);
                    if let Some(description) = &connection.connection_description {
                        ui.label(description);
                    }
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let online = connection.ping_status.unwrap_or(false);
                    ui.label(if online { "Online" } else { "Offline" });
                    common::state_dot(ui, online);
                });
            });
            ui.separator();

            Grid::new("connection_fields")
                .num_columns(2)
                .spacing([24.0, 4.0])
                .show(ui, |ui| {
                    let field = |ui: &mut Ui, label: &str, value: Option<String>| {
                        if let Some(value) = value {
                            ui.label(label);
                            ui.label(value);
                            ui.end_row();
                        }
                    };

                    field(ui, "Type", connection.typeof_connection.clone());
                    field(ui, "Protocol", connection.protocol.clone());
                    field(ui, "Host", connection.connection_url.clone());
                    field(ui, "Port", connection.port.map(|p| p.to_string()));
                    field(ui, "QoS", connection.qos.map(|q| q.to_string()));
                    field(
                        ui,
                        "Keep Alive",
                        connection.keep_alive.map(|k| format!("{k} s")),
                    );
                    field(ui, "Topic", connection.subscribe_topic.clone());
                    field(ui, "Created", connection.created_at_display());
                    if connection.has_credentials() {
                        field(ui, "Username", connection.username.clone());
                        field(
                            ui,
                            "Password",
                            Some(connection.masked_password().to_string()),
                        );
                    }
                    if !connection.response_parameters.is_empty() {
                        field(
                            ui,
                            "Response Parameters",
                            Some(connection.response_parameters.join(", ")),
                        );
                    }
                });
        });
    }
}
