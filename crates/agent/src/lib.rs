//! Natural-language front end for the user record store.
//!
//! A request line flows through a fixed pipeline:
//! 1. **Prompt** (`prompt`) - wrap the line in the instruction template
//! 2. **Backend** (`llm`) - ask the text-generation backend for an operation sentence
//! 3. **Classification** (`intent`) - map the sentence to one of six operations
//! 4. **Extraction** (`extract`) - pull record fields out of the same sentence
//! 5. **Dispatch** (`dispatch`) - validate, run against the store, render (`render`)
//!
//! The backend only ever produces text. Which operation runs and with which
//! fields is decided by the deterministic classifier and extractor, so the
//! same response always yields the same request.

pub mod dispatch;
pub mod extract;
pub mod intent;
pub mod llm;
pub mod ollama;
pub mod prompt;
pub mod render;
pub mod runtime;

pub use dispatch::{Dispatcher, OperationError};
pub use intent::{classify, OperationKind, OperationRequest};
pub use llm::{LlmClient, OllamaClient};
pub use runtime::AgentRuntime;
