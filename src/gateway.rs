//! Content generation gateway
//!
//! Every operation runs the same pipeline: resolve the latest settings,
//! select a transport, build the prompt, call the backend once, and normalize
//! the reply into the typed record the UI renders. Nothing is retried; every
//! failure is classified, written to the `diagnostics` log target, and
//! returned to the caller.

use crate::ai::{self, Transport};
use crate::config::{BackendMode, ConfigResolver, Configuration, FileSettingsStore};
use crate::image;
use crate::models::{
    CharacterData, CompositionEvaluation, CompositionGuide, ContentRequest, GradeLevel,
    ImageCompositionData, NormalizedResult, Operation, Poem, ReadingArticle,
};
use crate::normalize::normalize;
use crate::prompts::{self, Prompt};
use crate::schema::{self, Schema};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{info, Instrument};
use uuid::Uuid;

const DIAGNOSTIC_PAYLOAD_CHARS: usize = 2000;

pub type TransportSelector =
    Box<dyn Fn(&Configuration) -> Result<Box<dyn Transport>> + Send + Sync>;

pub struct Gateway {
    resolver: ConfigResolver,
    selector: TransportSelector,
}

impl Gateway {
    /// Gateway backed by the real transports, sharing one connection pool.
    pub fn new(resolver: ConfigResolver) -> Self {
        let http_client = reqwest::Client::new();
        Self::with_selector(
            resolver,
            Box::new(move |config: &Configuration| ai::select(config, http_client.clone())),
        )
    }

    /// Settings read from a JSON file, managed key defaulting to the environment.
    pub fn from_settings_file(path: impl AsRef<Path>) -> Self {
        Self::new(ConfigResolver::from_env(Box::new(FileSettingsStore::new(
            path,
        ))))
    }

    /// Build a gateway with a custom transport selector.
    ///
    /// Primarily useful for tests and harnesses that inject mock transports.
    pub fn with_selector(resolver: ConfigResolver, selector: TransportSelector) -> Self {
        Self { resolver, selector }
    }

    pub async fn generate(&self, request: ContentRequest) -> Result<NormalizedResult> {
        match request {
            ContentRequest::Reading { grade, topic } => self
                .generate_reading(grade, &topic)
                .await
                .map(NormalizedResult::Reading),
            ContentRequest::Poetry { query } => self
                .generate_poetry(&query)
                .await
                .map(NormalizedResult::Poetry),
            ContentRequest::Character { character } => self
                .generate_character(&character)
                .await
                .map(NormalizedResult::Character),
            ContentRequest::CompositionGeneration { topic } => self
                .generate_composition_task(topic.as_deref())
                .await
                .map(NormalizedResult::Composition),
            ContentRequest::CompositionEvaluation {
                student_text,
                topic,
            } => self
                .evaluate_composition(&student_text, &topic)
                .await
                .map(NormalizedResult::Evaluation),
        }
    }

    pub async fn generate_reading(&self, grade: GradeLevel, topic: &str) -> Result<ReadingArticle> {
        let prompt = prompts::reading(grade, topic);
        self.structured(Operation::Reading, &prompt, &schema::READING, &[("topic", topic)])
            .await
    }

    pub async fn generate_poetry(&self, query: &str) -> Result<Poem> {
        let prompt = prompts::poetry(query);
        self.structured(Operation::Poetry, &prompt, &schema::POETRY, &[("query", query)])
            .await
    }

    pub async fn generate_character(&self, character: &str) -> Result<CharacterData> {
        let character = character.trim();
        let prompt = prompts::character(character);
        self.structured(
            Operation::Character,
            &prompt,
            &schema::CHARACTER,
            &[("char", character)],
        )
        .await
    }

    pub async fn evaluate_composition(
        &self,
        student_text: &str,
        topic: &str,
    ) -> Result<CompositionEvaluation> {
        let prompt = prompts::evaluation(student_text, topic);
        self.structured(
            Operation::Evaluation,
            &prompt,
            &schema::EVALUATION,
            &[("topic", topic)],
        )
        .await
    }

    /// Picture-writing task: an illustration plus observation tips, words and
    /// a sample text. Without a topic a random one is chosen; if the picture
    /// then falls back to a library scene, the scene's topic is used instead.
    pub async fn generate_composition_task(
        &self,
        topic: Option<&str>,
    ) -> Result<ImageCompositionData> {
        let operation = Operation::Composition;
        let span = request_span(operation);

        async move {
            let transport = self.transport(operation)?;
            let backend = transport.backend();

            let custom_topic = topic.map(str::trim).filter(|topic| !topic.is_empty());
            let mut topic = match custom_topic {
                Some(topic) => topic.to_string(),
                None => image::random_topic(&mut rand::thread_rng()).to_string(),
            };

            let image = image::resolve(transport.as_ref(), &topic)
                .await
                .map_err(diagnose(operation, backend, None))?;
            if !image.is_model_generated && custom_topic.is_none() {
                topic = image.topic.clone();
            }

            let attachment = (image.is_model_generated && image.url.starts_with("data:"))
                .then_some(image.url.as_str());
            let prompt = prompts::composition_guide(&topic, attachment);

            let guide: CompositionGuide = self
                .complete_and_normalize(
                    transport.as_ref(),
                    operation,
                    &prompt,
                    &schema::COMPOSITION_GUIDE,
                    &[("topic", topic.as_str())],
                )
                .await?;

            info!(
                "Composition task ready (topic: {}, generated image: {})",
                topic, image.is_model_generated
            );
            Ok(ImageCompositionData::new(image, topic, guide))
        }
        .instrument(span)
        .await
    }

    async fn structured<T: DeserializeOwned>(
        &self,
        operation: Operation,
        prompt: &Prompt,
        schema: &Schema,
        vars: &[(&str, &str)],
    ) -> Result<T> {
        let span = request_span(operation);

        async move {
            let transport = self.transport(operation)?;
            self.complete_and_normalize(transport.as_ref(), operation, prompt, schema, vars)
                .await
        }
        .instrument(span)
        .await
    }

    /// Resolve the latest settings and select a transport for one call.
    fn transport(&self, operation: Operation) -> Result<Box<dyn Transport>> {
        let config = self.resolver.resolve();
        (self.selector)(&config).map_err(diagnose(operation, config.backend_mode, None))
    }

    async fn complete_and_normalize<T: DeserializeOwned>(
        &self,
        transport: &dyn Transport,
        operation: Operation,
        prompt: &Prompt,
        schema: &Schema,
        vars: &[(&str, &str)],
    ) -> Result<T> {
        let backend = transport.backend();
        tracing::debug!(
            "Sending {} prompt ({} chars, json: {})",
            schema.name,
            prompt.instruction.chars().count(),
            prompt.json_mode()
        );

        let raw = transport
            .complete(prompt)
            .await
            .map_err(diagnose(operation, backend, None))?;

        normalize(&raw, schema, vars).map_err(diagnose(operation, backend, Some(&raw)))
    }
}

fn request_span(operation: Operation) -> tracing::Span {
    tracing::info_span!(
        "gateway",
        operation = operation.label(),
        request_id = %Uuid::new_v4()
    )
}

/// Record a failure on the diagnostic log, then hand the error back.
fn diagnose(
    operation: Operation,
    backend: BackendMode,
    raw: Option<&str>,
) -> impl FnOnce(Error) -> Error + '_ {
    move |error| {
        tracing::error!(
            target: "diagnostics",
            operation = operation.label(),
            backend = backend.as_str(),
            category = ?error.category(),
            raw = %truncate(raw.unwrap_or_default(), DIAGNOSTIC_PAYLOAD_CHARS),
            "{}",
            error
        );
        error
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}
