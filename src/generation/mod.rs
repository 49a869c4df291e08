use crate::error::GenerationError;
use crate::event::AppEvent;
use crate::session::chat::GenerationRequest;
use crate::session::Turn;
use async_trait::async_trait;
use std::sync::{mpsc, Arc};
use tokio::runtime::Handle;
use tracing::{debug, error, info};

pub mod gemini;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReply {
    pub text: Option<String>,
}

/// Remote text generation. One call per submitted message; latency and
/// failure modes belong to the implementation.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        model_id: &str,
        turns: &[Turn],
    ) -> Result<GenerationReply, GenerationError>;
}

/// Runs generation calls on the tokio runtime and reports each outcome back
/// to the UI thread as an [`AppEvent`].
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn GenerationClient>,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        tx: mpsc::Sender<AppEvent>,
        runtime_handle: Handle,
    ) -> Self {
        Self {
            client,
            tx,
            runtime_handle,
        }
    }

    pub fn dispatch(&self, request: GenerationRequest) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();

        info!(target: "scenechat",
            "dispatching request {} model={} turns={}",
            request.id, request.model_id, request.turns.len()
        );

        let request_id = request.id;
        self.runtime_handle.spawn(async move {
            let call = tokio::spawn(async move {
                client
                    .generate(&request.api_key, &request.model_id, &request.turns)
                    .await
            });
            // a panicking client still has to release the session
            let outcome = match call.await {
                Ok(outcome) => outcome,
                Err(err) => Err(GenerationError::Other(format!("generation task failed: {err}"))),
            };
            match &outcome {
                Ok(reply) => debug!(target: "scenechat",
                    "request {} completed: len={}",
                    request_id,
                    reply.text.as_deref().map(str::len).unwrap_or(0)
                ),
                Err(err) => error!(target: "scenechat", "request {} failed: {err}", request_id),
            }
            let _ = tx.send(AppEvent::GenerationFinished {
                request_id,
                outcome,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{Dispatcher, GenerationClient, GenerationReply};
    use crate::error::GenerationError;
    use crate::event::AppEvent;
    use crate::session::chat::GenerationRequest;
    use crate::session::{Role, Turn};
    use async_trait::async_trait;
    use std::sync::{mpsc, Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedClient {
        calls: Mutex<Vec<(String, String, usize)>>,
        fail: bool,
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(
            &self,
            api_key: &str,
            model_id: &str,
            turns: &[Turn],
        ) -> Result<GenerationReply, GenerationError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((api_key.to_string(), model_id.to_string(), turns.len()));
            if self.fail {
                return Err(GenerationError::Other("boom".to_string()));
            }
            Ok(GenerationReply {
                text: turns.last().map(|turn| format!("echo: {}", turn.text)),
            })
        }
    }

    struct PanickingClient;

    #[async_trait]
    impl GenerationClient for PanickingClient {
        async fn generate(
            &self,
            _api_key: &str,
            _model_id: &str,
            _turns: &[Turn],
        ) -> Result<GenerationReply, GenerationError> {
            panic!("client bug");
        }
    }

    fn request(id: u64) -> GenerationRequest {
        GenerationRequest {
            id,
            model_id: "gemini-2.5-flash".to_string(),
            api_key: "AIza-test".to_string(),
            turns: vec![Turn::new(Role::System, "prompt"), Turn::new(Role::User, "hi")],
        }
    }

    async fn next_event(rx: mpsc::Receiver<AppEvent>) -> AppEvent {
        tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .expect("receiver task should join")
            .expect("dispatcher should report an outcome")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dispatch_calls_client_once_and_reports_reply() {
        let client = Arc::new(ScriptedClient::default());
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(client.clone(), tx, tokio::runtime::Handle::current());

        dispatcher.dispatch(request(4));

        let AppEvent::GenerationFinished { request_id, outcome } = next_event(rx).await;
        assert_eq!(request_id, 4);
        assert_eq!(outcome.expect("reply").text.as_deref(), Some("echo: hi"));

        let calls = client.calls.lock().expect("calls lock");
        assert_eq!(
            *calls,
            vec![("AIza-test".to_string(), "gemini-2.5-flash".to_string(), 2)]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dispatch_reports_client_fault() {
        let client = Arc::new(ScriptedClient {
            fail: true,
            ..Default::default()
        });
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(client, tx, tokio::runtime::Handle::current());

        dispatcher.dispatch(request(9));

        let AppEvent::GenerationFinished { request_id, outcome } = next_event(rx).await;
        assert_eq!(request_id, 9);
        assert_eq!(outcome, Err(GenerationError::Other("boom".to_string())));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dispatch_reports_panicking_client_as_failure() {
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(
            Arc::new(PanickingClient),
            tx,
            tokio::runtime::Handle::current(),
        );

        dispatcher.dispatch(request(11));

        let AppEvent::GenerationFinished { request_id, outcome } = next_event(rx).await;
        assert_eq!(request_id, 11);
        match outcome {
            Err(GenerationError::Other(message)) => {
                assert!(message.starts_with("generation task failed"), "{message}")
            }
            other => panic!("expected task failure, got {other:?}"),
        }
    }
}
