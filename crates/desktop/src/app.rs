//! TránsitoBot Desktop: egui app state and UI.

use eframe::egui;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use transito::api::{ApiError, ChatClient, ReplyItem, Responder};
use transito::config::ResponderMode;
use transito::conversation::{Conversation, View};
use transito::fallback::LocalResponder;
use transito::message::Message;
use transito::session::SessionStorage;
use transito::suggestions::{
    CITATION_HEADING, INPUT_PLACEHOLDER, SUBTITLE, SUGGESTIONS, SUGGESTIONS_HEADING, TITLE,
    TYPING_LABEL, TYPING_STAGES, VOICE_PLACEHOLDER, WELCOME_BODY, WELCOME_HEADING,
};

const CHAT_INPUT_ROWS: usize = 2;
const MESSAGE_MAX_WIDTH_RATIO: f32 = 0.8;

/// Time between health probes.
const PROBE_INTERVAL: Duration = Duration::from_secs(10);

const ACCENT: egui::Color32 = egui::Color32::from_rgb(37, 99, 235);

type TurnResult = Result<Vec<ReplyItem>, ApiError>;

/// Backend liveness as last seen by the health probe.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Liveness {
    Unknown,
    Up,
    Down,
    Offline,
}

pub struct TransitoApp {
    /// Transcript, welcome/conversing view, and the pending-reply flag.
    conversation: Conversation,
    /// Remote client or offline keyword responder.
    responder: Arc<dyn Responder>,
    /// Shown in the diagnostic when a turn fails.
    endpoint: String,
    /// Used for health probes; None in offline mode.
    health_client: Option<ChatClient>,
    /// Current input text.
    input: String,
    /// When Some, a chat turn is in flight; we read the result here.
    turn_receiver: Option<mpsc::Receiver<TurnResult>>,
    /// When Some, a probe is in flight; we read the result here.
    probe_receiver: Option<mpsc::Receiver<bool>>,
    /// When the last probe started; None until the first one.
    last_probe: Option<Instant>,
    liveness: Liveness,
    /// Config load error, shown under the input.
    config_error: Option<String>,
}

impl TransitoApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (config, config_error) = match transito::config::load_config(None) {
            Ok((config, _)) => (config, None),
            Err(e) => {
                log::error!("config: {:#}", e);
                (transito::config::Config::default(), Some(format!("{:#}", e)))
            }
        };

        // Fresh session on every start: no sender id survives an earlier run.
        let session = SessionStorage::new();
        session.clear();

        let (responder, health_client, liveness): (Arc<dyn Responder>, _, _) =
            if config.mode == ResponderMode::Offline {
                (Arc::new(LocalResponder), None, Liveness::Offline)
            } else {
                let client = transito::config::build_client(&config, session);
                (Arc::new(client.clone()), Some(client), Liveness::Unknown)
            };
        let endpoint = responder.endpoint();
        log::info!("desktop started, replies from {}", endpoint);

        Self {
            conversation: Conversation::new(),
            responder,
            endpoint,
            health_client,
            input: String::new(),
            turn_receiver: None,
            probe_receiver: None,
            last_probe: None,
            liveness,
            config_error,
        }
    }

    /// Start a chat turn in a background thread. Typed text, suggestion questions,
    /// and button payloads all come through here.
    fn start_turn(&mut self, text: String) {
        let text = match self.conversation.begin_turn(&text) {
            Ok(t) => t,
            Err(e) => {
                log::debug!("send ignored: {}", e);
                return;
            }
        };
        let responder = Arc::clone(&self.responder);
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(responder.reply(&text)),
                Err(e) => Err(ApiError::Connect(e.to_string())),
            };
            let _ = tx.send(result);
        });
        self.turn_receiver = Some(rx);
    }

    /// Poll for the chat turn result and clear the receiver when done. Call each frame.
    fn poll_turn(&mut self) {
        let Some(rx) = &self.turn_receiver else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => {
                Err(ApiError::Connect("chat worker stopped".to_string()))
            }
        };
        self.turn_receiver = None;
        self.conversation.complete_turn(result, &self.endpoint);
    }

    /// Start a health probe every PROBE_INTERVAL and collect its result.
    fn poll_probe(&mut self) {
        let Some(client) = &self.health_client else {
            return;
        };
        if let Some(rx) = &self.probe_receiver {
            match rx.try_recv() {
                Ok(up) => {
                    self.liveness = if up { Liveness::Up } else { Liveness::Down };
                    self.probe_receiver = None;
                }
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.liveness = Liveness::Down;
                    self.probe_receiver = None;
                }
                Err(mpsc::TryRecvError::Empty) => {}
            }
            return;
        }
        let now = Instant::now();
        if !probe_due(self.last_probe, now) {
            return;
        }
        self.last_probe = Some(now);
        let client = client.clone().with_timeout(Duration::from_secs(3));
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let up = match tokio::runtime::Runtime::new() {
                Ok(rt) => match rt.block_on(client.check_health()) {
                    Ok(h) => {
                        log::debug!("health: {} (db {})", h.status, h.database_status);
                        true
                    }
                    Err(e) => {
                        log::debug!("health probe failed: {}", e);
                        false
                    }
                },
                Err(_) => false,
            };
            let _ = tx.send(up);
        });
        self.probe_receiver = Some(rx);
    }

    fn ui_header(&self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("🚗").size(28.0));
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(TITLE).heading().strong());
                ui.label(egui::RichText::new(SUBTITLE).weak());
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let (color, text) = match self.liveness {
                    Liveness::Up => (egui::Color32::from_rgb(74, 222, 128), "en línea"),
                    Liveness::Down => (egui::Color32::from_rgb(248, 113, 113), "sin conexión"),
                    Liveness::Offline => (egui::Color32::GRAY, "modo sin conexión"),
                    Liveness::Unknown => (egui::Color32::GRAY, "comprobando…"),
                };
                ui.label(egui::RichText::new(text).small().weak());
                ui.colored_label(color, "●");
            });
        });
        ui.add_space(8.0);
    }

    /// Welcome view: greeting and suggestion chips. Returns the question of a clicked chip.
    fn ui_welcome(ui: &mut egui::Ui) -> Option<String> {
        let mut clicked = None;
        ui.vertical_centered(|ui| {
            ui.add_space(32.0);
            ui.label(egui::RichText::new("🚗").size(48.0));
            ui.add_space(12.0);
            ui.label(egui::RichText::new(WELCOME_HEADING).heading().strong());
            ui.add_space(8.0);
            ui.label(WELCOME_BODY);
            ui.add_space(24.0);
            ui.label(egui::RichText::new(SUGGESTIONS_HEADING.to_uppercase()).small().strong());
            ui.add_space(12.0);
            for s in SUGGESTIONS.iter() {
                let text = format!("{}  {}", s.icon(), s.caption());
                let button = egui::Button::new(text).min_size(egui::vec2(ui.available_width(), 40.0));
                if ui.add(button).clicked() {
                    clicked = Some(s.question.to_string());
                }
                ui.add_space(8.0);
            }
            ui.add_space(16.0);
            ui.label(
                egui::RichText::new("📄 Basado en normativa oficial   ⏱ Respuestas instantáneas")
                    .small()
                    .weak(),
            );
        });
        clicked
    }

    /// Renders one message bubble. Returns the payload of a clicked button.
    fn render_message(ui: &mut egui::Ui, m: &Message, can_send: bool) -> Option<String> {
        let mut clicked = None;
        let max_width = ui.available_width() * MESSAGE_MAX_WIDTH_RATIO;
        let layout = if m.is_bot {
            egui::Layout::left_to_right(egui::Align::Min)
        } else {
            egui::Layout::right_to_left(egui::Align::Min)
        };
        ui.with_layout(layout, |ui| {
            let frame = egui::Frame::none()
                .fill(if m.is_bot {
                    ui.style().visuals.panel_fill
                } else {
                    ACCENT
                })
                .stroke(egui::Stroke::new(
                    1.0,
                    ui.style().visuals.widgets.noninteractive.bg_stroke.color,
                ))
                .rounding(egui::Rounding::same(12.0))
                .inner_margin(egui::Margin::same(10.0));
            frame.show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.vertical(|ui| {
                    if !m.text.is_empty() {
                        if m.is_bot {
                            ui.label(&m.text);
                        } else {
                            ui.label(egui::RichText::new(&m.text).color(egui::Color32::WHITE));
                        }
                    }

                    if let Some(url) = m.image() {
                        ui.add_space(6.0);
                        ui.hyperlink_to("🖼 Imagen del bot", url);
                    }

                    let buttons = m.buttons();
                    if !buttons.is_empty() {
                        ui.add_space(8.0);
                        ui.horizontal_wrapped(|ui| {
                            for b in buttons {
                                if ui.add_enabled(can_send, egui::Button::new(&b.title)).clicked() {
                                    clicked = Some(b.payload.clone());
                                }
                            }
                        });
                    }

                    if let (true, Some(src)) = (m.is_bot, m.citation()) {
                        ui.add_space(8.0);
                        ui.separator();
                        ui.label(egui::RichText::new(format!("🔗 {}", CITATION_HEADING)).small().strong());
                        ui.label(egui::RichText::new(&src.article).small().strong());
                        ui.label(egui::RichText::new(&src.law).small().weak());
                        if !src.description.is_empty() {
                            ui.label(egui::RichText::new(&src.description).small().italics());
                        }
                    }

                    ui.add_space(4.0);
                    let time = egui::RichText::new(m.time_label()).small();
                    ui.label(if m.is_bot {
                        time.weak()
                    } else {
                        time.color(egui::Color32::from_white_alpha(180))
                    });
                });
            });
        });
        clicked
    }

    fn ui_typing(ui: &mut egui::Ui) {
        egui::Frame::none()
            .stroke(egui::Stroke::new(
                1.0,
                ui.style().visuals.widgets.noninteractive.bg_stroke.color,
            ))
            .rounding(egui::Rounding::same(12.0))
            .inner_margin(egui::Margin::same(10.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new(TYPING_LABEL).strong());
                });
                for stage in TYPING_STAGES {
                    ui.label(egui::RichText::new(format!("• {}", stage)).small().weak());
                }
            });
    }

    /// Transcript with stick-to-bottom scrolling. Returns the payload of a clicked button.
    fn ui_transcript(&self, ui: &mut egui::Ui) -> Option<String> {
        let can_send = self.conversation.can_send();
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.add_space(12.0);
                for m in self.conversation.messages() {
                    if let Some(payload) = Self::render_message(ui, m, can_send) {
                        clicked = Some(payload);
                    }
                    ui.add_space(10.0);
                }
                if self.conversation.is_awaiting() {
                    Self::ui_typing(ui);
                }
                ui.add_space(12.0);
            });
        clicked
    }

    /// Input row: text box, disabled voice placeholder, send button.
    /// Enter sends; Shift+Enter inserts a newline. Returns the text to send.
    fn ui_input(&mut self, ui: &mut egui::Ui) -> Option<String> {
        let can_send = self.conversation.can_send();
        let input_id = egui::Id::new("chat_input");
        let focused = ui.memory(|m| m.has_focus(input_id));
        let enter = can_send
            && focused
            && ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter));

        let mut send_now = enter;
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let send_width = 64.0;
            let mic_width = 32.0;
            let text_width = (ui.available_width() - send_width - mic_width - 16.0).max(80.0);
            ui.add_enabled(
                can_send,
                egui::TextEdit::multiline(&mut self.input)
                    .id(input_id)
                    .hint_text(INPUT_PLACEHOLDER)
                    .desired_rows(CHAT_INPUT_ROWS)
                    .desired_width(text_width),
            );
            ui.add_enabled(false, egui::Button::new("🎤"))
                .on_disabled_hover_text(VOICE_PLACEHOLDER);
            let has_text = !self.input.trim().is_empty();
            if ui
                .add_enabled(can_send && has_text, egui::Button::new("Enviar"))
                .on_hover_text("Enviar mensaje")
                .clicked()
            {
                send_now = true;
            }
        });
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("Presiona Enter para enviar, Shift+Enter para nueva línea")
                    .small()
                    .weak(),
            );
        });
        if let Some(ref err) = self.config_error {
            ui.colored_label(egui::Color32::RED, err);
        }
        ui.add_space(8.0);

        let text = self.input.trim().to_string();
        if send_now && !text.is_empty() {
            self.input.clear();
            Some(text)
        } else {
            None
        }
    }
}

/// Whether the next health probe should start: right away at startup, then once per interval.
fn probe_due(last: Option<Instant>, now: Instant) -> bool {
    last.map_or(true, |t| now.saturating_duration_since(t) >= PROBE_INTERVAL)
}

impl eframe::App for TransitoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_turn();
        self.poll_probe();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.ui_header(ui);
        });

        let mut outgoing = None;
        egui::TopBottomPanel::bottom("input").show(ctx, |ui| {
            outgoing = self.ui_input(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let clicked = match self.conversation.view() {
                View::Welcome => Self::ui_welcome(ui),
                View::Conversing => self.ui_transcript(ui),
            };
            if clicked.is_some() {
                outgoing = clicked;
            }
        });

        if let Some(text) = outgoing {
            self.start_turn(text);
        }

        if self.turn_receiver.is_some() || self.probe_receiver.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else if self.health_client.is_some() {
            ctx.request_repaint_after(Duration::from_secs(1));
        }
    }
}
