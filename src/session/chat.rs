use crate::error::{GenerationError, StoreError};
use crate::generation::GenerationReply;
use crate::session::credentials::ApiKeyMirror;
use crate::session::scenario::ScenarioKey;
use crate::session::{Message, Role, Turn};
use tracing::{info, warn};

pub const MISSING_KEY_ERROR: &str = "please enter a valid key";
pub const EMPTY_REPLY_PLACEHOLDER: &str = "(no response)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub scenario: ScenarioKey,
    pub model_id: String,
    pub api_key: String,
    pub remember_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Sending { request_id: u64 },
}

/// Everything the generation call needs, captured at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub id: u64,
    pub model_id: String,
    pub api_key: String,
    pub turns: Vec<Turn>,
}

/// Why a submit did not leave `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    EmptyMessage,
    RequestInFlight,
    MissingApiKey,
}

pub struct ChatSession {
    transcript: Vec<Message>,
    input: String,
    config: SessionConfig,
    state: DispatchState,
    error: Option<String>,
    credentials: ApiKeyMirror,
    next_request_id: u64,
}

impl ChatSession {
    pub fn new(config: SessionConfig, credentials: ApiKeyMirror) -> Self {
        Self {
            transcript: Vec::new(),
            input: String::new(),
            config,
            state: DispatchState::Idle,
            error: None,
            credentials,
            next_request_id: 1,
        }
    }

    /// Builds a session whose API key comes from durable storage when one
    /// was remembered. A storage failure is handed back and the session
    /// starts with the key from `config`.
    pub fn restore(
        mut config: SessionConfig,
        credentials: ApiKeyMirror,
    ) -> (Self, Option<StoreError>) {
        let failure = match credentials.restore() {
            Ok(Some(key)) => {
                info!(target: "scenechat", "restored remembered api key");
                config.api_key = key;
                config.remember_key = true;
                None
            }
            Ok(None) => None,
            Err(err) => Some(err),
        };
        (Self::new(config, credentials), failure)
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state(), DispatchState::Sending { .. })
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Composer text, editable while a request is outstanding.
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_model_id(&mut self, model_id: impl Into<String>) {
        self.config.model_id = model_id.into();
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) -> Result<(), StoreError> {
        self.config.api_key = key.into();
        self.credentials
            .key_edited(&self.config.api_key, self.config.remember_key)
    }

    pub fn set_remember_key(&mut self, remember: bool) -> Result<(), StoreError> {
        self.config.remember_key = remember;
        self.credentials
            .remember_toggled(remember, &self.config.api_key)
    }

    /// Switches persona. A change appends the new scenario's prompt as a
    /// visible system message; re-selecting the active scenario does nothing.
    pub fn select_scenario(&mut self, key: ScenarioKey) -> bool {
        if key == self.config.scenario {
            return false;
        }
        info!(target: "scenechat", "scenario {} -> {}", self.config.scenario, key);
        self.config.scenario = key;
        self.transcript
            .push(Message::new(Role::System, key.scenario().system_prompt));
        true
    }

    pub fn clear_transcript(&mut self) {
        self.transcript = Vec::new();
    }

    /// Submits the composer text.
    pub fn submit(&mut self) -> Result<GenerationRequest, SubmitRejected> {
        let text = self.input.clone();
        self.submit_text(&text)
    }

    /// Submits `text` (composer content or a quick reply). On success the
    /// user message is already in the transcript and the returned request
    /// must be dispatched exactly once.
    pub fn submit_text(&mut self, text: &str) -> Result<GenerationRequest, SubmitRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitRejected::EmptyMessage);
        }
        if self.is_loading() {
            return Err(SubmitRejected::RequestInFlight);
        }
        let api_key = self.config.api_key.trim();
        if api_key.is_empty() {
            self.error = Some(MISSING_KEY_ERROR.to_string());
            return Err(SubmitRejected::MissingApiKey);
        }

        let mut turns = Vec::with_capacity(self.transcript.len() + 2);
        turns.push(Turn::new(
            Role::System,
            self.config.scenario.scenario().system_prompt,
        ));
        turns.extend(self.transcript.iter().map(Message::to_turn));
        turns.push(Turn::new(Role::User, text));

        let request = GenerationRequest {
            id: self.next_request_id,
            model_id: self.config.model_id.trim().to_string(),
            api_key: api_key.to_string(),
            turns,
        };
        self.next_request_id += 1;

        self.transcript.push(Message::new(Role::User, text));
        self.input.clear();
        self.error = None;
        self.state = DispatchState::Sending {
            request_id: request.id,
        };
        Ok(request)
    }

    /// Applies the outcome of the in-flight request. Outcomes for any other
    /// request id are ignored.
    pub fn complete(
        &mut self,
        request_id: u64,
        outcome: Result<GenerationReply, GenerationError>,
    ) -> bool {
        match self.state {
            DispatchState::Sending { request_id: pending } if pending == request_id => {}
            _ => {
                warn!(target: "scenechat", "ignoring completion for request {request_id}: not in flight");
                return false;
            }
        }

        match outcome {
            Ok(reply) => {
                let text = reply
                    .text
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| EMPTY_REPLY_PLACEHOLDER.to_string());
                self.transcript.push(Message::new(Role::Assistant, text));
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        self.state = DispatchState::Idle;
        true
    }
}
