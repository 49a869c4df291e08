use crate::event::AppEvent;
use crate::generation::Dispatcher;
use crate::session::chat::{ChatSession, SubmitRejected};
use crate::session::scenario::ScenarioKey;
use crate::session::timestamp;
use crate::theme::Theme;
use crate::ui::bubble;
use eframe::egui::{self, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use tracing::{debug, warn};

const LOADING_REPAINT: Duration = Duration::from_millis(100);

pub struct ChatApp {
    rx: Receiver<AppEvent>,
    dispatcher: Dispatcher,
    session: ChatSession,
    theme: Theme,
    model_buffer: String,
    api_key_buffer: String,
    diagnostics_log: Vec<String>,
}

impl ChatApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        dispatcher: Dispatcher,
        session: ChatSession,
        startup_warnings: Vec<String>,
    ) -> Self {
        let model_buffer = session.config().model_id.clone();
        let api_key_buffer = session.config().api_key.clone();
        let mut app = Self {
            rx,
            dispatcher,
            session,
            theme: Theme::default(),
            model_buffer,
            api_key_buffer,
            diagnostics_log: Vec::new(),
        };

        for warning in startup_warnings {
            app.log_diagnostic(warning);
        }

        app
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log
            .push(format!("[{}] {}", timestamp(), message.into()));
    }

    fn submit(&mut self, quick_reply: Option<&str>) {
        let result = match quick_reply {
            Some(text) => self.session.submit_text(text),
            None => self.session.submit(),
        };

        match result {
            Ok(request) => self.dispatcher.dispatch(request),
            Err(SubmitRejected::MissingApiKey) => {
                self.log_diagnostic("submit blocked: no api key");
            }
            Err(reason) => debug!(target: "scenechat", "submit ignored: {reason:?}"),
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::GenerationFinished {
                request_id,
                outcome,
            } => {
                let failure = outcome.as_ref().err().map(ToString::to_string);
                if !self.session.complete(request_id, outcome) {
                    self.log_diagnostic(format!("dropped stale reply for request {request_id}"));
                    return;
                }
                if let Some(message) = failure {
                    self.log_diagnostic(format!("generation failed: {message}"));
                }
            }
        }
    }

    fn apply_api_key_edit(&mut self) {
        if let Err(err) = self.session.set_api_key(self.api_key_buffer.clone()) {
            warn!(target: "scenechat", "failed to persist api key: {err}");
            self.log_diagnostic(format!("failed to persist api key: {err}"));
        }
    }

    fn apply_remember_toggle(&mut self, remember: bool) {
        if let Err(err) = self.session.set_remember_key(remember) {
            warn!(target: "scenechat", "failed to update stored api key: {err}");
            self.log_diagnostic(format!("failed to update stored api key: {err}"));
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let mut selected = self.session.config().scenario;
        let mut remember = self.session.config().remember_key;
        let mut key_changed = false;
        let mut model_changed = false;
        let mut clear = false;

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.strong("scenechat");
                ui.separator();
                ui.label("Scenario");
                egui::ComboBox::from_id_salt("scenario")
                    .selected_text(selected.scenario().label)
                    .show_ui(ui, |ui| {
                        for key in ScenarioKey::ALL {
                            ui.selectable_value(&mut selected, key, key.scenario().label);
                        }
                    });
                ui.separator();
                ui.label("Model");
                model_changed = ui
                    .add(egui::TextEdit::singleline(&mut self.model_buffer).desired_width(160.0))
                    .changed();
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    clear = ui
                        .add_enabled(
                            !self.session.transcript().is_empty(),
                            egui::Button::new("Clear"),
                        )
                        .clicked();
                });
            });
            ui.horizontal(|ui| {
                ui.label("API key");
                key_changed = ui
                    .add(
                        egui::TextEdit::singleline(&mut self.api_key_buffer)
                            .password(true)
                            .hint_text("Generative Language API key")
                            .desired_width(280.0),
                    )
                    .changed();
                ui.checkbox(&mut remember, "Remember on this device");
            });
            ui.add_space(4.0);
        });

        if selected != self.session.config().scenario {
            self.session.select_scenario(selected);
        }
        if model_changed {
            self.session.set_model_id(self.model_buffer.clone());
        }
        if key_changed {
            self.apply_api_key_edit();
        }
        if remember != self.session.config().remember_key {
            self.apply_remember_toggle(remember);
        }
        if clear {
            self.session.clear_transcript();
        }
    }

    fn render_composer(&mut self, ctx: &egui::Context) {
        let mut quick_reply: Option<&'static str> = None;
        let mut send_now = false;

        egui::TopBottomPanel::bottom("composer")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.horizontal_wrapped(|ui| {
                    let scenario = self.session.config().scenario.scenario();
                    for prompt in scenario.quick_replies {
                        let button = egui::Button::new(RichText::new(*prompt).small());
                        if ui.add_enabled(!self.session.is_loading(), button).clicked() {
                            quick_reply = Some(*prompt);
                        }
                    }
                });

                self.theme.composer_frame().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let hint = if self.session.is_loading() {
                            "Waiting for response..."
                        } else {
                            "Type a message..."
                        };
                        let response = ui.add(
                            egui::TextEdit::singleline(self.session.input_mut())
                                .desired_width(ui.available_width() - 64.0)
                                .hint_text(hint),
                        );
                        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                            send_now = true;
                            response.request_focus();
                        }

                        let can_send =
                            !self.session.is_loading() && !self.session.input().trim().is_empty();
                        send_now |= ui
                            .add_enabled(can_send, egui::Button::new("Send"))
                            .clicked();
                    });
                });

                if let Some(error) = self.session.error() {
                    ui.label(RichText::new(error).color(self.theme.danger));
                }

                egui::CollapsingHeader::new("Diagnostics")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("diagnostics_log")
                            .max_height(90.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for entry in &self.diagnostics_log {
                                    ui.label(RichText::new(entry).small());
                                }
                            });
                    });
                ui.add_space(4.0);
            });

        if let Some(prompt) = quick_reply {
            self.submit(Some(prompt));
        } else if send_now {
            self.submit(None);
        }
    }

    fn render_transcript(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if self.session.transcript().is_empty() && !self.session.is_loading() {
                        ui.add_space(12.0);
                        ui.vertical_centered(|ui| {
                            ui.weak("Pick a scenario and ask something, or try a quick reply below.");
                        });
                    }

                    for message in self.session.transcript() {
                        bubble::show_message(ui, message, &self.theme);
                        ui.add_space(4.0);
                    }

                    if self.session.is_loading() {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.weak("Thinking...");
                        });
                    }
                });
        });
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.render_top_bar(ctx);
        self.render_composer(ctx);
        self.render_transcript(ctx);

        if self.session.is_loading() {
            ctx.request_repaint_after(LOADING_REPAINT);
        }
    }
}
