use std::sync::Arc;

use tracing::{info, warn};

use crate::dispatch::{Dispatcher, OperationError};
use crate::llm::LlmClient;
use crate::prompt::build_prompt;

/// One request line in, one rendered result out.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    dispatcher: Dispatcher,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, dispatcher: Dispatcher) -> Self {
        Self { llm, dispatcher }
    }

    pub async fn handle_message(&self, input: &str) -> Result<String, OperationError> {
        let prompt = build_prompt(input);
        info!(event_name = "agent.prompt.sent", input_len = input.len(), "asking backend");

        let response = match self.llm.complete(&prompt).await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "agent.backend.failed",
                    error_class = "backend_failure",
                    error = %format!("{error:#}"),
                    "backend call failed"
                );
                return Err(OperationError::Backend(error));
            }
        };
        info!(
            event_name = "agent.response.received",
            response_len = response.len(),
            "backend responded"
        );

        self.execute_response(&response).await
    }

    /// The deterministic half: no backend involved.
    pub async fn execute_response(&self, response: &str) -> Result<String, OperationError> {
        self.dispatcher.execute_text(response).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use roster_db::{InMemoryUserRepository, UserRepository};

    use super::AgentRuntime;
    use crate::dispatch::{Dispatcher, OperationError};
    use crate::llm::LlmClient;

    /// Replies with a fixed completion and records every prompt it saw.
    struct CannedLlm {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedLlm {
        fn replying(reply: Result<&str, &str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string).map_err(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().expect("prompts lock").push(prompt.to_string());
            self.reply.clone().map_err(|message| anyhow!(message))
        }
    }

    fn runtime(llm: Arc<CannedLlm>) -> (AgentRuntime, Arc<InMemoryUserRepository>) {
        let store = Arc::new(InMemoryUserRepository::new());
        (AgentRuntime::new(llm, Dispatcher::new(store.clone())), store)
    }

    #[tokio::test]
    async fn message_round_trips_through_backend_and_store() {
        let llm = CannedLlm::replying(Ok("create user named Jane Doe email jane@x.com age 30"));
        let (runtime, store) = runtime(llm.clone());

        let message = runtime
            .handle_message("Add a new person named Jane with email jane@x.com")
            .await
            .expect("handled");

        assert!(message.starts_with("User created successfully:"));
        assert_eq!(store.list().await.expect("list").len(), 1);
        let prompts = llm.prompts.lock().expect("prompts lock");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Request: Add a new person named Jane with email jane@x.com"));
    }

    #[tokio::test]
    async fn backend_failure_is_reported_without_touching_store() {
        let llm = CannedLlm::replying(Err("connection refused"));
        let (runtime, store) = runtime(llm);

        let error = runtime.handle_message("list all users").await.expect_err("backend down");

        assert!(matches!(error, OperationError::Backend(_)));
        assert_eq!(error.error_class(), "backend_failure");
        assert_eq!(error.user_message(), "generating response: connection refused");
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn unusable_backend_reply_is_unrecognized() {
        let llm = CannedLlm::replying(Ok("I am not sure what you mean."));
        let (runtime, _) = runtime(llm);

        let error = runtime.handle_message("do the thing").await.expect_err("unrecognized");
        assert_eq!(error.error_class(), "unrecognized_operation");
    }

    #[tokio::test]
    async fn execute_response_skips_backend() {
        let llm = CannedLlm::replying(Err("must not be called"));
        let (runtime, _) = runtime(llm.clone());

        let message = runtime.execute_response("list all users").await.expect("list");

        assert_eq!(message, "No users found in the database.");
        assert!(llm.prompts.lock().expect("prompts lock").is_empty());
    }
}
