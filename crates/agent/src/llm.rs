use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use roster_core::config::LlmConfig;

/// Text-generation backend. Every failure is opaque to the caller.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Non-streaming client for an Ollama server.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.into(), model: model.into() })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.base_url, &config.model, Duration::from_secs(config.timeout_secs))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    /// Readiness probe against the model listing endpoint.
    pub async fn ping(&self) -> Result<()> {
        let url = self.endpoint("api/tags");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("ollama unreachable at {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow!("ollama readiness check returned {}", response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint("api/generate");
        let request = GenerateRequest { model: &self.model, prompt, stream: false };

        debug!(
            event_name = "llm.request.sent",
            model = %self.model,
            prompt_len = prompt.len(),
            "sending prompt to ollama"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("ollama returned {status}: {body}"));
        }

        let completion: GenerateResponse =
            response.json().await.context("malformed ollama response body")?;
        Ok(completion.response)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::routing::{get, post};
    use axum::{http::StatusCode, Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::{LlmClient, OllamaClient};

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub server");
        });
        format!("http://{address}")
    }

    fn client(base_url: &str) -> OllamaClient {
        OllamaClient::new(base_url, "tinyllama", Duration::from_secs(5)).expect("client")
    }

    #[tokio::test]
    async fn complete_posts_non_streaming_request_and_returns_response_field() {
        let router = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "tinyllama");
                assert_eq!(body["stream"], false);
                let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
                Json(json!({ "response": format!("echo: {prompt}"), "done": true }))
            }),
        );
        let base_url = serve(router).await;

        let text = client(&format!("{base_url}/")).complete("list all users").await.expect("complete");
        assert_eq!(text, "echo: list all users");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
        );
        let base_url = serve(router).await;

        let error = client(&base_url).complete("hi").await.expect_err("500");
        assert!(error.to_string().contains("500"));
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let router = Router::new()
            .route("/api/generate", post(|| async { Json(json!({ "unexpected": 1 })) }));
        let base_url = serve(router).await;

        let error = client(&base_url).complete("hi").await.expect_err("bad body");
        assert!(error.to_string().contains("malformed"));
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("addr");
        drop(listener);

        let base_url = format!("http://{address}");
        assert!(client(&base_url).complete("hi").await.is_err());
        assert!(client(&base_url).ping().await.is_err());
    }

    #[tokio::test]
    async fn ping_checks_tags_endpoint() {
        let router =
            Router::new().route("/api/tags", get(|| async { Json(json!({ "models": [] })) }));
        let base_url = serve(router).await;

        client(&base_url).ping().await.expect("ping");
    }
}
