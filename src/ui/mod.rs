//! # User interface
//!
//! Screen-per-struct egui frontend. The app routes on the auth controller's
//! state: unauthenticated sessions only ever see the login form, and a
//! successful sign-in lands on the connection list. Each screen keeps the
//! loading/error/data triple for its own fetch and polls its background
//! work from the frame loop, so nothing in here blocks.
//!
//! Dropping the detail screen drops its viewer session, which guarantees an
//! open broker connection never outlives the screen that started it.

pub mod common;
pub mod connections_view;
pub mod detail_view;
pub mod login_view;
pub mod viewer_view;

use std::time::Duration;

use eframe::egui;

use crate::api::ApiClient;
use crate::auth::{AuthController, AuthState};
use crate::config::AppConfig;

use self::common::UiColors;
use self::connections_view::{ConnectionsAction, ConnectionsView};
use self::detail_view::{DetailAction, DetailView};
use self::login_view::LoginView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Connections,
    Detail,
}

pub struct IotViewApp {
    config: AppConfig,
    api: ApiClient,
    auth: AuthController,
    screen: Screen,
    login_view: LoginView,
    connections_view: ConnectionsView,
    detail_view: Option<DetailView>,
    was_authenticated: bool,
}

impl IotViewApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        api: ApiClient,
        auth: AuthController,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        Self {
            config,
            api,
            auth,
            screen: Screen::Connections,
            login_view: LoginView::new(),
            connections_view: ConnectionsView::new(),
            detail_view: None,
            was_authenticated: false,
        }
    }

    fn render_authenticated(&mut self, ui: &mut egui::Ui) {
        egui::TopBottomPanel::top("top_panel")
            .show_separator_line(false)
            .show_inside(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("IoT Connect");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Logout").clicked() {
                            self.auth.logout();
                        }
                    });
                });
            });

        egui::CentralPanel::default().show_inside(ui, |ui| match self.screen {
            Screen::Connections => {
                if let Some(ConnectionsAction::Open(connection)) =
                    self.connections_view.render(ui, &self.api)
                {
                    let mut detail = DetailView::new(connection, self.config.export_dir());
                    detail.begin_refresh(&self.api);
                    self.detail_view = Some(detail);
                    self.screen = Screen::Detail;
                }
            }
            Screen::Detail => {
                let action = match &mut self.detail_view {
                    Some(detail) => detail.render(ui, &self.api),
                    None => Some(DetailAction::Back),
                };
                if let Some(DetailAction::Back) = action {
                    // Dropping the view tears the broker session down.
                    self.detail_view = None;
                    self.screen = Screen::Connections;
                    self.connections_view.begin_fetch(&self.api);
                }
            }
        });

        egui::TopBottomPanel::bottom("bottom_panel")
            .show_separator_line(false)
            .show_inside(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.small(self.api.base_url());
                    common::state_dot(ui, self.auth.is_authenticated());
                });
            });
    }
}

impl eframe::App for IotViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.auth.poll();
        self.connections_view.poll();
        if let Some(detail) = &mut self.detail_view {
            detail.poll();
        }

        let frame = egui::Frame::new()
            .fill(UiColors::MAIN_BG)
            .inner_margin(8);
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            ui.ctx().request_repaint_after(Duration::from_millis(33));

            match self.auth.state() {
                AuthState::Unknown => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.spinner();
                        ui.label("Checking session...");
                    });
                }
                AuthState::Unauthenticated => {
                    if self.was_authenticated {
                        // Logged out: drop every authenticated screen.
                        self.detail_view = None;
                        self.connections_view = ConnectionsView::new();
                        self.screen = Screen::Connections;
                        self.login_view.reset();
                        self.was_authenticated = false;
                    }
                    self.login_view.render(ui, &mut self.auth);
                }
                AuthState::Authenticated => {
                    if !self.was_authenticated {
                        self.was_authenticated = true;
                        self.connections_view.begin_fetch(&self.api);
                    }
                    self.render_authenticated(ui);
                }
            }
        });
    }
}
