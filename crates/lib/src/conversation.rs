//! Interaction state for one chat session: welcome vs. conversing, and at most one
//! reply in flight.
//!
//! Typed input, suggestion chips, and message buttons all enter through
//! `begin_turn`; replies (or failures) land through `complete_turn`.

use crate::api::{ApiError, ReplyItem, Responder};
use crate::message::Message;
use crate::normalize::normalize;
use crate::suggestions::SUGGESTIONS;
use crate::transcript::Transcript;

/// Shown as a bot message when a turn fails; the endpoint is appended.
pub const ERROR_REPLY_TEXT: &str = "Lo siento, hubo un error al procesar tu consulta.";

/// Which top-level view is shown. Moves from `Welcome` to `Conversing` once, on the first send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Welcome,
    Conversing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("a reply is already pending")]
    Busy,
    #[error("message is empty")]
    Empty,
    #[error("no such button")]
    NoSuchButton,
    #[error("no such suggestion")]
    NoSuchSuggestion,
}

/// Fixed diagnostic shown when a turn fails.
pub fn error_reply_text(endpoint: &str) -> String {
    format!(
        "{} Verifica que el servidor esté ejecutándose en {}",
        ERROR_REPLY_TEXT, endpoint
    )
}

#[derive(Debug, Default)]
pub struct Conversation {
    transcript: Transcript,
    view: View,
    turn: TurnState,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn is_awaiting(&self) -> bool {
        self.turn == TurnState::AwaitingReply
    }

    /// Whether a send is currently allowed (input and send control enabled).
    pub fn can_send(&self) -> bool {
        !self.is_awaiting()
    }

    /// Start a turn: append the trimmed user message and wait for a reply.
    /// Returns the text to hand to the responder.
    pub fn begin_turn(&mut self, text: &str) -> Result<String, TurnError> {
        if self.is_awaiting() {
            return Err(TurnError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(TurnError::Empty);
        }
        self.view = View::Conversing;
        self.transcript.append(Message::user(text));
        self.turn = TurnState::AwaitingReply;
        Ok(text.to_string())
    }

    /// Finish the pending turn. Appends the normalized reply, or one diagnostic message
    /// on failure, and returns to idle. Returns the number of messages appended.
    pub fn complete_turn(
        &mut self,
        outcome: Result<Vec<ReplyItem>, ApiError>,
        endpoint: &str,
    ) -> usize {
        let appended = match outcome {
            Ok(items) => {
                let messages = normalize(items);
                let n = messages.len();
                self.transcript.extend(messages);
                n
            }
            Err(e) => {
                log::error!("chat turn failed: {}", e);
                self.transcript
                    .append(Message::bot(error_reply_text(endpoint), None, None));
                1
            }
        };
        self.turn = TurnState::Idle;
        appended
    }

    /// Run a whole turn against `responder`.
    pub async fn send(
        &mut self,
        responder: &dyn Responder,
        text: &str,
    ) -> Result<usize, TurnError> {
        let text = self.begin_turn(text)?;
        let outcome = responder.reply(&text).await;
        Ok(self.complete_turn(outcome, &responder.endpoint()))
    }

    /// Payload of button `index` on message `message_id`, to be sent as user input.
    pub fn button_payload(&self, message_id: &str, index: usize) -> Result<String, TurnError> {
        self.transcript
            .get(message_id)
            .and_then(|m| m.buttons().get(index))
            .map(|b| b.payload.clone())
            .ok_or(TurnError::NoSuchButton)
    }

    /// Question of suggestion chip `index`, to be sent as user input.
    pub fn suggestion_question(&self, index: usize) -> Result<String, TurnError> {
        SUGGESTIONS
            .get(index)
            .map(|s| s.question.to_string())
            .ok_or(TurnError::NoSuchSuggestion)
    }

    /// Press a button: sends its payload exactly as if it had been typed.
    pub async fn press_button(
        &mut self,
        responder: &dyn Responder,
        message_id: &str,
        index: usize,
    ) -> Result<usize, TurnError> {
        let payload = self.button_payload(message_id, index)?;
        self.send(responder, &payload).await
    }

    /// Pick a suggestion chip: sends its question exactly as if it had been typed.
    pub async fn choose_suggestion(
        &mut self,
        responder: &dyn Responder,
        index: usize,
    ) -> Result<usize, TurnError> {
        let question = self.suggestion_question(index)?;
        self.send(responder, &question).await
    }

    /// Drop the whole transcript and return to the welcome view.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.view = View::Welcome;
        self.turn = TurnState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::LocalResponder;
    use crate::message::MessageButton;
    use crate::normalize::EMPTY_REPLY_TEXT;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays scripted outcomes and records what it was asked.
    struct Scripted {
        outcomes: Mutex<Vec<Result<Vec<ReplyItem>, ApiError>>>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<Vec<ReplyItem>, ApiError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Responder for Scripted {
        async fn reply(&self, text: &str) -> Result<Vec<ReplyItem>, ApiError> {
            self.seen.lock().unwrap().push(text.to_string());
            self.outcomes.lock().unwrap().pop().unwrap_or(Ok(Vec::new()))
        }

        fn endpoint(&self) -> String {
            "http://localhost:8080".to_string()
        }
    }

    fn text_item(t: &str) -> ReplyItem {
        ReplyItem {
            text: Some(t.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn starts_on_welcome_and_idle() {
        let c = Conversation::new();
        assert_eq!(c.view(), View::Welcome);
        assert_eq!(c.turn(), TurnState::Idle);
        assert!(c.can_send());
    }

    #[test]
    fn begin_turn_switches_view_and_awaits() {
        let mut c = Conversation::new();
        c.begin_turn("hola").unwrap();
        assert_eq!(c.view(), View::Conversing);
        assert!(c.is_awaiting());
        assert!(!c.can_send());
        assert_eq!(c.messages().len(), 1);
        assert!(!c.messages()[0].is_bot);
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_trimmed_before_sending() {
        let responder = Scripted::new(vec![Ok(vec![text_item("ok")])]);
        let mut c = Conversation::new();
        c.send(&responder, "  hola \n").await.unwrap();
        assert_eq!(c.messages()[0].text, "hola");
        assert_eq!(*responder.seen.lock().unwrap(), vec!["hola".to_string()]);
    }

    #[test]
    fn second_send_while_awaiting_is_rejected() {
        let mut c = Conversation::new();
        c.begin_turn("uno").unwrap();
        assert_eq!(c.begin_turn("dos"), Err(TurnError::Busy));
        assert_eq!(c.messages().len(), 1);
    }

    #[test]
    fn blank_input_is_rejected_and_view_kept() {
        let mut c = Conversation::new();
        assert_eq!(c.begin_turn("   \n"), Err(TurnError::Empty));
        assert_eq!(c.view(), View::Welcome);
        assert!(c.messages().is_empty());
    }

    #[test]
    fn failure_appends_one_diagnostic_and_returns_idle() {
        let mut c = Conversation::new();
        c.begin_turn("hola").unwrap();
        let n = c.complete_turn(
            Err(ApiError::Transport {
                status: 500,
                reason: "Internal Server Error".into(),
            }),
            "http://localhost:8080",
        );
        assert_eq!(n, 1);
        assert_eq!(c.turn(), TurnState::Idle);
        let last = c.messages().last().unwrap();
        assert!(last.is_bot);
        assert!(last.text.starts_with(ERROR_REPLY_TEXT));
        assert!(last.text.ends_with("http://localhost:8080"));
        assert!(last.sources.is_none());
    }

    #[test]
    fn decode_failure_is_handled_the_same() {
        let mut c = Conversation::new();
        c.begin_turn("hola").unwrap();
        c.complete_turn(Err(ApiError::Decode("eof".into())), "x");
        assert_eq!(c.messages().len(), 2);
        assert!(c.can_send());
    }

    #[test]
    fn empty_reply_appends_fallback() {
        let mut c = Conversation::new();
        c.begin_turn("hola").unwrap();
        assert_eq!(c.complete_turn(Ok(Vec::new()), "x"), 1);
        assert_eq!(c.messages()[1].text, EMPTY_REPLY_TEXT);
    }

    #[tokio::test]
    async fn transcript_length_counts_turns_and_items() {
        let responder = Scripted::new(vec![
            Ok(vec![text_item("a"), text_item("b")]),
            Ok(Vec::new()),
            Err(ApiError::Timeout(std::time::Duration::from_secs(1))),
            Ok(vec![text_item("c"), text_item("d"), text_item("e")]),
        ]);
        let mut c = Conversation::new();
        let mut expected = 0;
        let mut last_len = 0;
        for (input, produced) in [("1", 2), ("2", 1), ("3", 1), ("4", 3)] {
            let n = c.send(&responder, input).await.unwrap();
            assert_eq!(n, produced);
            expected += 1 + produced;
            assert!(c.messages().len() >= last_len);
            last_len = c.messages().len();
            assert_eq!(last_len, expected);
        }
    }

    #[tokio::test]
    async fn button_press_equals_typing_payload() {
        let buttons = vec![
            MessageButton {
                title: "Consultar multas".into(),
                payload: "/consultar_multas".into(),
            },
            MessageButton {
                title: "Salir".into(),
                payload: "/despedida".into(),
            },
        ];
        let menu = ReplyItem {
            text: Some("¿Qué deseas hacer?".into()),
            buttons: Some(buttons),
            ..Default::default()
        };
        let responder = Scripted::new(vec![Ok(vec![menu]), Ok(vec![text_item("ok")])]);
        let mut c = Conversation::new();
        c.send(&responder, "hola").await.unwrap();
        let menu_id = c.messages()[1].id.clone();
        c.press_button(&responder, &menu_id, 0).await.unwrap();

        let pressed = &c.messages()[2];
        assert!(!pressed.is_bot);
        assert_eq!(pressed.text, "/consultar_multas");
        assert_eq!(c.messages()[3].text, "ok");
        assert_eq!(
            *responder.seen.lock().unwrap(),
            vec!["hola".to_string(), "/consultar_multas".to_string()]
        );
    }

    #[test]
    fn unknown_button_is_an_error() {
        let mut c = Conversation::new();
        c.begin_turn("hola").unwrap();
        c.complete_turn(Ok(vec![text_item("sin botones")]), "x");
        let id = c.messages()[1].id.clone();
        assert_eq!(c.button_payload(&id, 0), Err(TurnError::NoSuchButton));
        assert_eq!(c.button_payload("nope", 0), Err(TurnError::NoSuchButton));
    }

    #[tokio::test]
    async fn suggestion_leaves_welcome_with_offline_answer() {
        let mut c = Conversation::new();
        c.choose_suggestion(&LocalResponder, 0).await.unwrap();
        assert_eq!(c.view(), View::Conversing);
        assert_eq!(c.messages()[0].text, "¿Cuál es la multa por pico y placa?");
        assert_eq!(
            c.messages()[1].citation().map(|s| s.law.as_str()),
            Some("Ley 769 de 2002")
        );
        assert_eq!(
            c.choose_suggestion(&LocalResponder, 9).await,
            Err(TurnError::NoSuchSuggestion)
        );
    }

    #[test]
    fn reset_returns_to_welcome() {
        let mut c = Conversation::new();
        c.begin_turn("hola").unwrap();
        c.complete_turn(Ok(vec![text_item("x")]), "x");
        c.reset();
        assert_eq!(c.view(), View::Welcome);
        assert!(c.messages().is_empty());
    }
}
