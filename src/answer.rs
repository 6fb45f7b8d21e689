//! Answer generation over retrieved documentation context.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. Failures stay
//! distinguishable for the caller: a missing API key, upstream rate
//! limiting, and everything else map to separate error variants so the
//! boundary layer can pick the right user-visible message.

use serde::Deserialize;

use crate::{
    config::{API_KEY_ENV_VAR, Settings},
    error::{Error, Result},
};

const SYSTEM_PROMPT: &str = "You are a technical product expert. \
Answer questions using ONLY the information provided in the context below.\n\n\
Rules:\n\
1. Quote exact specifications with proper units (mAh, inches, GB, cores, Hz, nits)\n\
2. If the context doesn't contain the answer, respond: 'This information is not specified in the documentation'\n\
3. Never make assumptions, estimates, or use external knowledge\n\
4. For numerical specs, use the exact values from the context\n\
5. Keep answers concise but complete\n\n\
Format your answer clearly and professionally.";

const MAX_ANSWER_TOKENS: u32 = 400;
const ANSWER_TEMPERATURE: f64 = 0.2;

/// Client for generating grounded answers from context passages.
pub struct AnswerClient {
    model: String,
    base_url: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl AnswerClient {
    pub fn new(
        model: String,
        base_url: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            model,
            base_url,
            api_key,
            agent: ureq::agent(),
        }
    }

    /// Build a client from settings, reading the API key from the
    /// environment. A missing key produces a client that fails with
    /// [`Error::MissingApiKey`] on use rather than at construction.
    pub fn from_settings(settings: &Settings) -> Self {
        let api_key =
            std::env::var(API_KEY_ENV_VAR).ok().filter(|k| !k.is_empty());
        Self::new(
            settings.chat_model.clone(),
            settings.api_base_url.clone(),
            api_key,
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model_id(&self) -> &str {
        &self.model
    }

    /// Generate an answer to `question` grounded in `context` passages.
    pub fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::MissingApiKey(API_KEY_ENV_VAR));
        };

        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {api_key}"))
            .send_json(serde_json::json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": user_prompt(question, context) },
                ],
                "temperature": ANSWER_TEMPERATURE,
                "max_tokens": MAX_ANSWER_TOKENS,
            }))
            .map_err(map_request_error)?;

        let parsed: ChatResponse = response
            .into_json()
            .map_err(|err| Error::Answer(err.to_string()))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| {
                Error::Answer("response contained no choices".into())
            })?;

        Ok(answer)
    }
}

fn map_request_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(429, response) => Error::RateLimited {
            service: "answers",
            message: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Status(code, response) => Error::Answer(format!(
            "HTTP {code}: {}",
            response.into_string().unwrap_or_default()
        )),
        ureq::Error::Transport(transport) => {
            Error::Answer(transport.to_string())
        }
    }
}

fn user_prompt(question: &str, context: &[String]) -> String {
    format!(
        "Context:\n{}\n\nQuestion: {question}",
        context.join("\n\n")
    )
}
