use crate::config::{DEFAULT_SYSTEM_PROMPT, RadarConfig, render_user_prompt};
use crate::domain::trend::TrendCollection;
use crate::services::error_handling::{GenerationError, LogHelper, PerformanceMonitor};
use crate::services::normalization::{extract_json_array, normalize_batch, validate_strict};
use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const TEST_SYSTEM_PROMPT: &str =
    "You are a JSON generator. Output ONLY valid JSON. Return a JSON array with exactly 1 object.";
const TEST_USER_PROMPT: &str = "Generate 1 test trend with these exact fields: label, quadrant (must be \"Technology\"), ring (must be \"0-2 Years\"), impact (must be \"High\"), summary. Return only the JSON array starting with [ and ending with ].";

/// Explicit per-request settings for a generator call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratorSettings {
    pub credential: String,
    pub system_prompt_override: Option<String>,
    pub user_prompt_override: Option<String>,
}

impl GeneratorSettings {
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            ..Self::default()
        }
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt_override.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn user_prompt(&self, domain: &str) -> String {
        render_user_prompt(self.user_prompt_override.as_deref(), domain)
    }
}

/// Turns a domain string into a normalized batch of trends.
///
/// One call, one answer: either the whole collection or a terminal error.
/// Callers that want to retry reissue the call.
#[automock]
#[async_trait]
pub trait TrendGenerator: Send + Sync {
    async fn generate(&self, domain: &str, settings: &GeneratorSettings) -> Result<TrendCollection, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Perplexity chat-completions client.
#[derive(Clone)]
pub struct PerplexityGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    timeout: Duration,
}

impl PerplexityGenerator {
    pub fn new(config: &RadarConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// Use a preconfigured HTTP client, e.g. one with proxy or TLS settings.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Send a one-trend test request and check the reply is strictly well formed.
    pub async fn verify_credential(&self, credential: &str) -> Result<(), GenerationError> {
        let content = self.complete(credential, TEST_SYSTEM_PROMPT, TEST_USER_PROMPT).await?;
        let records = extract_json_array(&content)?;
        let first = records
            .first()
            .ok_or(GenerationError::EmptyBatch { received: 0 })?;
        validate_strict(first, 0).map_err(|e| GenerationError::MalformedPayload {
            reason: e.to_string(),
        })?;
        info!("API key verified");
        Ok(())
    }

    fn build_request<'a>(&'a self, system_prompt: &'a str, user_prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// One chat completion round trip, returning the assistant's text.
    async fn complete(&self, credential: &str, system_prompt: &str, user_prompt: &str) -> Result<String, GenerationError> {
        if credential.trim().is_empty() {
            return Err(GenerationError::MissingCredential);
        }

        let request = self.build_request(system_prompt, user_prompt);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        debug!(status = status, "Trend service responded");
        let body = response.text().await.map_err(network_error)?;

        if !(200..300).contains(&status) {
            return Err(classify_status(status, &body));
        }
        parse_completion(&body)
    }
}

#[async_trait]
impl TrendGenerator for PerplexityGenerator {
    async fn generate(&self, domain: &str, settings: &GeneratorSettings) -> Result<TrendCollection, GenerationError> {
        let _monitor = PerformanceMonitor::new("generate_trends", 30_000);
        info!(domain = %domain, model = %self.model, "Requesting trends");

        let user_prompt = settings.user_prompt(domain);
        let outcome = async {
            let content = self
                .complete(&settings.credential, settings.system_prompt(), &user_prompt)
                .await?;
            let records = extract_json_array(&content)?;
            normalize_batch(&records)
        }
        .await;

        match outcome {
            Ok(trends) => {
                LogHelper::log_generation_success(domain, trends.len());
                Ok(TrendCollection::new(domain, trends))
            }
            Err(e) => {
                LogHelper::log_generation_failure(domain, &e);
                Err(e)
            }
        }
    }
}

fn network_error(error: reqwest::Error) -> GenerationError {
    let message = if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    };
    GenerationError::Network { message }
}

/// Map a non-success HTTP status to the error the caller acts on.
pub fn classify_status(status: u16, body: &str) -> GenerationError {
    match status {
        401 => GenerationError::InvalidCredential,
        403 => GenerationError::Forbidden,
        429 => GenerationError::RateLimited,
        s if s >= 500 => GenerationError::UpstreamUnavailable { status: s },
        s => GenerationError::UpstreamRejected {
            status: s,
            message: body.chars().take(200).collect(),
        },
    }
}

/// Extract the assistant message text from a chat-completions body.
pub fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| GenerationError::MalformedPayload {
        reason: format!("invalid response body: {}", e),
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| GenerationError::MalformedPayload {
            reason: "no content in response".to_string(),
        })
}
