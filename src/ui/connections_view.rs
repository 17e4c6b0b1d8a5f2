use egui::{ScrollArea, Sense, Ui};
use tokio::sync::oneshot;
use tracing::debug;

use crate::api::{ApiClient, ApiError, Connection};

use super::common::{self, bordered_frame};

pub enum ConnectionsAction {
    Open(Connection),
}

/// Card list of every configured connection: fetch-on-entry, manual
/// refresh, error banner with retry, empty-state text. Nothing here is
/// cached beyond the screen visit.
pub struct ConnectionsView {
    connections: Vec<Connection>,
    loading: bool,
    error: Option<String>,
    inflight: Option<oneshot::Receiver<Result<Vec<Connection>, ApiError>>>,
}

impl ConnectionsView {
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
            loading: false,
            error: None,
            inflight: None,
        }
    }

    pub fn begin_fetch(&mut self, api: &ApiClient) {
        if self.inflight.is_some() {
            return;
        }
        self.loading = true;
        self.error = None;
        let (tx, rx) = oneshot::channel();
        self.inflight = Some(rx);
        let api = api.clone();
        tokio::spawn(async move {
            let _ = tx.send(api.list_connections().await);
        });
    }

    pub fn poll(&mut self) {
        let Some(rx) = &mut self.inflight else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(connections)) => {
                debug!("Loaded {} connections", connections.len());
                self.inflight = None;
                self.loading = false;
                self.connections = connections;
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
                self.error = Some("Failed to load connections".to_string());
            }
        }
    }

    pub fn render(&mut self, ui: &mut Ui, api: &ApiClient) -> Option<ConnectionsAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.heading("Connections");
            if ui
                .add_enabled(!self.loading, egui::Button::new("Refresh"))
                .clicked()
            {
                self.begin_fetch(api);
            }
            if self.loading {
                ui.spinner();
            }
        });
        ui.add_space(6.0);

        if let Some(error) = self.error.clone() {
            if common::error_banner(ui, &error) {
                self.begin_fetch(api);
            }
            return None;
        }

        if self.loading && self.connections.is_empty() {
            ui.label("Loading connections...");
            return None;
        }

        if self.connections.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.heading("No Connections Found");
                ui.label("You don't have any IoT connections set up yet.");
            });
            return None;
        }

        ScrollArea::vertical().show(ui, |ui| {
            for connection in &self.connections {
                let response = bordered_frame()
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.vertical(|ui| {
                                ui.strong(&connection.connection_name);
                                if let Some(description) = &connection.connection_description {
                                    ui.label(description);
                                }
                                ui.horizontal(|ui| {
                                    if let Some(tag) = &connection.typeof_connection {
                                        ui.small(tag);
                                    }
                                    if let Some(protocol) = &connection.protocol {
                                        ui.small(protocol);
                                    }
                                    if let Some(url) = &connection.connection_url {
                                        ui.small(url);
                                    }
                                });
                            });
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    common::state_dot(ui, connection.ping_status.unwrap_or(false));
                                },
                            );
                        });
                    })
                    .response;

                if response.interact(Sense::click()).clicked() {
                    action = Some(ConnectionsAction::Open(connection.clone()));
                }
                ui.add_space(2.0);
            }
        });

        action
    }
}
