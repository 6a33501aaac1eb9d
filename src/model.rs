//! Model-backed translation.
//!
//! A [`Generator`] is the external text-generation capability. It is
//! acquired once at startup; if that fails the model path stays off for the
//! whole process. Individual call failures only affect that call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::error::{HomeqlError, HomeqlResult};
use crate::schema;
use crate::statement::{Origin, Statement, TranslationCandidate};
use crate::translate::Translator;

/// External text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate continuations of `prompt`, at most `max_length` long.
    /// Callers ask for a single sequence and use only the first.
    async fn generate(&self, prompt: &str, max_length: usize) -> HomeqlResult<Vec<String>>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_length: usize,
    num_return_sequences: usize,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Text-generation endpoint speaking the
/// `{"inputs", "parameters"}` → `[{"generated_text"}]` JSON shape.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpGenerator {
    /// Probe the configured endpoint. Fails if none is configured or it
    /// cannot be reached; any HTTP response counts as reachable.
    pub async fn acquire(config: &ModelConfig) -> HomeqlResult<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| HomeqlError::Model("no model endpoint configured".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HomeqlError::Model(e.to_string()))?;

        let generator = Self {
            client,
            endpoint,
            api_token: config.api_token.clone(),
        };

        generator
            .request(reqwest::Method::GET)
            .send()
            .await
            .map_err(|e| HomeqlError::Model(format!("endpoint unreachable: {}", e)))?;

        debug!(endpoint = %generator.endpoint, "model endpoint acquired");
        Ok(generator)
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let req = self.client.request(method, &self.endpoint);
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str, max_length: usize) -> HomeqlResult<Vec<String>> {
        let body = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_length,
                num_return_sequences: 1,
            },
        };

        let response = self
            .request(reqwest::Method::POST)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HomeqlError::Model(e.to_string()))?;

        let generated: Vec<GeneratedText> = response
            .json()
            .await
            .map_err(|e| HomeqlError::Model(format!("unexpected response: {}", e)))?;

        Ok(generated.into_iter().map(|g| g.generated_text).collect())
    }
}

/// Build the generation prompt for a question.
pub fn prompt(question: &str) -> String {
    format!(
        "Convert the following natural-language question into SQL.\n\
         The database contains these tables:\n\
         {}\n\n\
         Question: {}\n\n\
         SQL:",
        schema::describe(),
        question
    )
}

/// Translator backed by a [`Generator`].
pub struct ModelTranslator {
    generator: Box<dyn Generator>,
    max_length: usize,
}

impl ModelTranslator {
    pub fn new(generator: impl Generator + 'static, max_length: usize) -> Self {
        Self {
            generator: Box::new(generator),
            max_length,
        }
    }

    /// Acquire the HTTP backend from config; `None` disables the model path.
    pub async fn acquire(config: &ModelConfig) -> Option<Self> {
        match HttpGenerator::acquire(config).await {
            Ok(generator) => Some(Self::new(generator, config.max_length)),
            Err(e) => {
                warn!("model translator unavailable, using rules: {}", e);
                None
            }
        }
    }

    /// Translate one question. `None` if the call failed or produced nothing.
    pub async fn translate(&self, question: &str) -> Option<Statement> {
        let input = prompt(question);
        let sequences = match self.generator.generate(&input, self.max_length).await {
            Ok(sequences) => sequences,
            Err(e) => {
                warn!("generation failed: {}", e);
                return None;
            }
        };

        let text = sequences.into_iter().next()?;
        let statement = Statement::new(text);
        if statement.is_empty() {
            warn!("generation returned empty text");
            return None;
        }
        Some(statement)
    }
}

#[async_trait]
impl Translator for ModelTranslator {
    fn origin(&self) -> Origin {
        Origin::Model
    }

    async fn candidate(&self, question: &str) -> Option<TranslationCandidate> {
        let statement = self.translate(question).await?;
        Some(TranslationCandidate::new(question, statement, Origin::Model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Canned {
        reply: HomeqlResult<Vec<String>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Generator for Canned {
        async fn generate(&self, prompt: &str, max_length: usize) -> HomeqlResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(prompt.contains("usage_records"));
            assert_eq!(max_length, 100);
            match &self.reply {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(HomeqlError::Model(e.to_string())),
            }
        }
    }

    fn translator(reply: HomeqlResult<Vec<String>>) -> (ModelTranslator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = Canned {
            reply,
            calls: calls.clone(),
        };
        (ModelTranslator::new(backend, 100), calls)
    }

    #[test]
    fn test_prompt_layout() {
        let p = prompt("how many devices?");
        assert!(p.contains("- devices (device_id, device_name, device_type, location)"));
        assert!(p.contains("Question: how many devices?"));
        assert!(p.ends_with("SQL:"));
    }

    #[tokio::test]
    async fn test_first_sequence_trimmed() {
        let (t, _) = translator(Ok(vec![
            "  SELECT * FROM devices;\n".to_string(),
            "ignored".to_string(),
        ]));
        let stmt = t.translate("devices").await.unwrap();
        assert_eq!(stmt.as_str(), "SELECT * FROM devices;");
    }

    #[tokio::test]
    async fn test_failure_is_per_call() {
        let (t, calls) = translator(Err(HomeqlError::Model("boom".into())));
        assert!(t.translate("a").await.is_none());
        assert!(t.translate("b").await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_output_is_no_result() {
        let (t, _) = translator(Ok(vec![]));
        assert!(t.translate("a").await.is_none());
        let (t, _) = translator(Ok(vec!["   ".to_string()]));
        assert!(t.candidate("a").await.is_none());
    }

    #[tokio::test]
    async fn test_acquire_without_endpoint() {
        let config = ModelConfig::default();
        assert!(HttpGenerator::acquire(&config).await.is_err());
        assert!(ModelTranslator::acquire(&config).await.is_none());
    }
}
