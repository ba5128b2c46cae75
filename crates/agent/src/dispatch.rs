use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use roster_core::errors::DomainError;
use roster_db::{RepositoryError, UserRepository};

use crate::extract::extract_parameters;
use crate::intent::OperationRequest;
use crate::render;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("store failure: {0}")]
    Store(#[from] RepositoryError),
    #[error("text generation failed: {0:#}")]
    Backend(anyhow::Error),
}

impl OperationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(error) => error.error_class(),
            Self::Store(RepositoryError::NotFound { .. }) => "not_found",
            Self::Store(_) => "store_failure",
            Self::Backend(_) => "backend_failure",
        }
    }

    /// Line printed after `Error: ` at the interactive boundary.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(error) => format!("generating response: {error:#}"),
            other => format!("executing operation: {other}"),
        }
    }
}

/// Runs validated requests against the injected store and renders the result.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn UserRepository>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn UserRepository>) -> Self {
        Self { store }
    }

    /// Classify, extract, validate and execute a response in one call.
    pub async fn execute_text(&self, text: &str) -> Result<String, OperationError> {
        let request = match OperationRequest::parse(text) {
            Ok(request) => request,
            Err(error) => {
                warn!(
                    event_name = "agent.request.rejected",
                    error_class = error.error_class(),
                    fields = ?extract_parameters(text).field_names(),
                    "response did not yield a valid operation"
                );
                return Err(error.into());
            }
        };

        debug!(
            event_name = "agent.request.extracted",
            operation = request.kind().as_str(),
            fields = ?extract_parameters(text).field_names(),
            "extracted operation parameters"
        );
        self.execute(request).await
    }

    pub async fn execute(&self, request: OperationRequest) -> Result<String, OperationError> {
        let operation = request.kind().as_str();
        info!(event_name = "agent.dispatch.started", operation, "dispatching operation");

        let result = self.run(request).await;
        match &result {
            Ok(_) => info!(event_name = "agent.dispatch.completed", operation, "operation succeeded"),
            Err(error) => warn!(
                event_name = "agent.dispatch.failed",
                operation,
                error_class = error.error_class(),
                error = %error,
                "operation failed"
            ),
        }
        result
    }

    async fn run(&self, request: OperationRequest) -> Result<String, OperationError> {
        let message = match request {
            OperationRequest::Create(user) => render::render_created(&self.store.create(user).await?),
            OperationRequest::GetById { id: Some(id) } => {
                render::render_found(&self.store.find_by_id(id).await?)
            }
            OperationRequest::GetById { id: None } => return Err(lookup_without_key("id").into()),
            OperationRequest::GetByEmail { email: Some(email) } => {
                render::render_found(&self.store.find_by_email(&email).await?)
            }
            OperationRequest::GetByEmail { email: None } => {
                return Err(lookup_without_key("email").into())
            }
            OperationRequest::Update { id, patch } => {
                self.store.update(id, patch).await?;
                render::render_updated(id)
            }
            OperationRequest::Delete { id } => {
                self.store.delete(id).await?;
                render::render_deleted(id)
            }
            OperationRequest::ListAll => render::render_user_list(&self.store.list().await?),
        };
        Ok(message)
    }
}

// A lookup with no key behaves like a lookup that matched nothing.
fn lookup_without_key(key: &str) -> RepositoryError {
    RepositoryError::NotFound { entity: "user", key: format!("no {key} given") }
}
