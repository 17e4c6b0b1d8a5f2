use egui::{TextEdit, Ui};

use crate::auth::AuthController;

use super::common::UiColors;

/// Sign-in form. Validation happens in the auth controller so the same
/// rules apply no matter how the form is driven.
#[derive(Default)]
pub struct LoginView {
    identifier: String,
    password: String,
}

impl LoginView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipes the entered secret, called when the user logs out.
    pub fn reset(&mut self) {
        self.password.clear();
    }

    pub fn render(&mut self, ui: &mut Ui, auth: &mut AuthController) {
        ui.vertical_centered(|ui| {
            ui.add_space(60.0);
            ui.heading("IoT Connect");
            ui.label("Manage all your IoT connections in one place");
            ui.add_space(20.0);

            ui.scope(|ui| {
                ui.set_max_width(320.0);

                ui.label("Email or Username");
                ui.add(
                    TextEdit::singleline(&mut self.identifier)
                        .hint_text("Enter your email or username"),
                );
                ui.add_space(8.0);

                ui.label("Password");
                ui.add(
                    TextEdit::singleline(&mut self.password)
                        .password(true)
                        .hint_text("Enter your password"),
                );
                ui.add_space(12.0);

                if let Some(error) = auth.last_error() {
                    ui.colored_label(UiColors::ERROR_TEXT, error);
                    ui.add_space(8.0);
                }

                if auth.is_busy() {
                    ui.spinner();
                } else if ui.button("Sign In").clicked() {
                    auth.begin_login(&self.identifier, &self.password);
                }
            });
        });
    }
}
