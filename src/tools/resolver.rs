//! Picks credentials or a loaded model for a requested tool.
//!
//! API tools follow a bring-your-own-key policy: a key supplied by the
//! caller wins over the system key for the same provider. Local models are
//! loaded on first use and shared for the rest of the process.

use super::catalog::{Provider, ToolId, ToolKind};
use super::lazy::LazyResource;
use crate::config::EngineConfig;
use secrecy::{ExposeSecret as _, SecretString};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Per-request API keys supplied by the caller, keyed by provider.
pub type UserKeys = HashMap<Provider, SecretString>;

/// A local model that has been loaded into memory.
pub trait LoadedModel: Send + Sync {
    fn model_id(&self) -> &str;
}

/// Builds local models on demand.
pub trait ModelLoader: Send + Sync {
    fn load(&self, tool: ToolId) -> anyhow::Result<Box<dyn LoadedModel>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    UnknownTool(String),
    /// Neither the caller nor the system has a key for the provider
    MissingApiKey(Provider),
    /// The local model failed to load (or failed recently)
    ModelUnavailable(ToolId),
    /// A hosted tool was asked for a local model slot
    NotLocal(ToolId),
    InvalidApiKey(Provider),
    QuotaExceeded(Provider),
    Provider { provider: Provider, message: String },
}

impl ToolError {
    /// Classify a raw failure reported by a provider SDK.
    pub fn from_provider_failure(provider: Provider, raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("api_key_invalid") || lowered.contains("invalid_api_key") {
            Self::InvalidApiKey(provider)
        } else if lowered.contains("quota_exceeded") || lowered.contains("insufficient_quota") {
            Self::QuotaExceeded(provider)
        } else {
            Self::Provider {
                provider,
                message: raw.to_owned(),
            }
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool(name) => write!(f, "Unknown tool: {name}"),
            Self::MissingApiKey(p) => write!(f, "No API key configured for {p}"),
            Self::ModelUnavailable(tool) => write!(f, "Model load failed for {tool}"),
            Self::NotLocal(tool) => write!(f, "{tool} is not a local model"),
            Self::InvalidApiKey(p) => {
                write!(f, "The {p} API key is not valid. Please check your settings.")
            }
            Self::QuotaExceeded(p) => {
                write!(f, "Your {p} quota is exhausted. Please review your billing plan.")
            }
            Self::Provider { provider, message } => write!(f, "{provider} error: {message}"),
        }
    }
}

impl std::error::Error for ToolError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    User,
    System,
}

/// Everything needed to call a hosted model.
#[derive(Debug)]
pub struct ApiCredentials {
    pub provider: Provider,
    pub model_id: &'static str,
    pub key: SecretString,
    pub source: KeySource,
}

pub enum ToolHandle {
    Api(ApiCredentials),
    Local {
        tool: ToolId,
        model: Arc<Box<dyn LoadedModel>>,
    },
}

impl fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(credentials) => f.debug_tuple("Api").field(credentials).finish(),
            Self::Local { tool, model } => f
                .debug_struct("Local")
                .field("tool", tool)
                .field("model_id", &model.model_id())
                .finish(),
        }
    }
}

type ModelSlot = LazyResource<Box<dyn LoadedModel>>;

pub struct ToolResolver {
    system_keys: HashMap<Provider, SecretString>,
    loader: Arc<dyn ModelLoader>,
    classifier: ModelSlot,
    detector: ModelSlot,
}

impl ToolResolver {
    pub fn new(loader: Arc<dyn ModelLoader>, failure_window: Duration) -> Self {
        Self {
            system_keys: HashMap::new(),
            loader,
            classifier: LazyResource::new("image_classifier", failure_window),
            detector: LazyResource::new("object_detector", failure_window),
        }
    }

    /// Resolver using the configured failure window and system keys from
    /// the provider environment variables.
    pub fn from_env(loader: Arc<dyn ModelLoader>, config: &EngineConfig) -> Self {
        let mut resolver = Self::new(loader, config.model_failure_window());
        for provider in [Provider::Google, Provider::OpenAi] {
            if let Ok(key) = std::env::var(provider.env_var())
                && !key.trim().is_empty()
            {
                debug!(%provider, "System API key found");
                resolver = resolver.with_system_key(provider, SecretString::from(key));
            }
        }
        resolver
    }

    pub fn with_system_key(mut self, provider: Provider, key: SecretString) -> Self {
        self.system_keys.insert(provider, key);
        self
    }

    /// Resolve a tool by its display name.
    pub fn resolve(&self, display_name: &str, user_keys: &UserKeys) -> Result<ToolHandle, ToolError> {
        let tool = ToolId::from_display_name(display_name)
            .ok_or_else(|| ToolError::UnknownTool(display_name.to_owned()))?;

        match tool.kind() {
            ToolKind::Api(provider) => self.api_credentials(tool, provider, user_keys),
            ToolKind::LocalModel => self.local_model(tool),
        }
    }

    fn api_credentials(
        &self,
        tool: ToolId,
        provider: Provider,
        user_keys: &UserKeys,
    ) -> Result<ToolHandle, ToolError> {
        let usable = |key: &&SecretString| !key.expose_secret().trim().is_empty();

        let (key, source) = if let Some(key) = user_keys.get(&provider).filter(usable) {
            info!(%provider, "Using caller-provided API key");
            (key, KeySource::User)
        } else if let Some(key) = self.system_keys.get(&provider).filter(usable) {
            (key, KeySource::System)
        } else {
            return Err(ToolError::MissingApiKey(provider));
        };

        Ok(ToolHandle::Api(ApiCredentials {
            provider,
            model_id: tool.model_id(),
            key: SecretString::from(key.expose_secret().to_owned()),
            source,
        }))
    }

    fn local_model(&self, tool: ToolId) -> Result<ToolHandle, ToolError> {
        let slot = match tool {
            ToolId::ImageClassifier => &self.classifier,
            ToolId::ObjectDetector => &self.detector,
            ToolId::GeminiPro | ToolId::Gpt4o => return Err(ToolError::NotLocal(tool)),
        };

        slot.get_or_try_init(|| self.loader.load(tool))
            .map(|model| ToolHandle::Local { tool, model })
            .ok_or(ToolError::ModelUnavailable(tool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubModel(&'static str);

    impl LoadedModel for StubModel {
        fn model_id(&self) -> &str {
            self.0
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ModelLoader for CountingLoader {
        fn load(&self, tool: ToolId) -> anyhow::Result<Box<dyn LoadedModel>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("not enough memory for {}", tool.model_id());
            }
            Ok(Box::new(StubModel(tool.model_id())))
        }
    }

    fn resolver(loader: Arc<CountingLoader>) -> ToolResolver {
        ToolResolver::new(loader, Duration::from_secs(60))
            .with_system_key(Provider::Google, SecretString::from("system-google".to_owned()))
    }

    fn key_of(handle: &ToolHandle) -> (&str, KeySource) {
        match handle {
            ToolHandle::Api(c) => (c.key.expose_secret(), c.source),
            ToolHandle::Local { .. } => panic!("expected API credentials"),
        }
    }

    #[test]
    fn test_user_key_wins_over_system_key() -> Result<(), ToolError> {
        let resolver = resolver(Arc::new(CountingLoader::default()));
        let mut keys = UserKeys::new();
        keys.insert(Provider::Google, SecretString::from("mine".to_owned()));

        let handle = resolver.resolve("API: Google Gemini Pro", &keys)?;
        assert_eq!(key_of(&handle), ("mine", KeySource::User));

        let handle = resolver.resolve("API: Google Gemini Pro", &UserKeys::new())?;
        assert_eq!(key_of(&handle), ("system-google", KeySource::System));
        Ok(())
    }

    #[test]
    fn test_blank_user_key_falls_back() -> Result<(), ToolError> {
        let resolver = resolver(Arc::new(CountingLoader::default()));
        let mut keys = UserKeys::new();
        keys.insert(Provider::Google, SecretString::from("  ".to_owned()));

        let handle = resolver.resolve("API: Google Gemini Pro", &keys)?;
        assert_eq!(key_of(&handle).1, KeySource::System);
        Ok(())
    }

    #[test]
    fn test_missing_key_and_unknown_tool() {
        let resolver = resolver(Arc::new(CountingLoader::default()));
        assert_eq!(
            resolver.resolve("API: OpenAI GPT-4o", &UserKeys::new()).err(),
            Some(ToolError::MissingApiKey(Provider::OpenAi))
        );
        assert_eq!(
            resolver.resolve("gpt-4o", &UserKeys::new()).err(),
            Some(ToolError::UnknownTool("gpt-4o".to_owned()))
        );
    }

    #[test]
    fn test_debug_output_hides_keys() -> Result<(), ToolError> {
        let resolver = resolver(Arc::new(CountingLoader::default()));
        let handle = resolver.resolve("API: Google Gemini Pro", &UserKeys::new())?;
        assert!(!format!("{handle:?}").contains("system-google"));
        Ok(())
    }

    #[test]
    fn test_local_model_loads_once() -> Result<(), ToolError> {
        let loader = Arc::new(CountingLoader::default());
        let resolver = resolver(Arc::clone(&loader));

        for _ in 0..3 {
            let handle = resolver.resolve("Local: Image Classifier (ViT)", &UserKeys::new())?;
            let ToolHandle::Local { model, .. } = handle else {
                panic!("expected a local model");
            };
            assert_eq!(model.model_id(), "google/vit-base-patch16-224");
        }
        resolver.resolve("Local: Object Detector (YOLOv8n)", &UserKeys::new())?;
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn test_local_slots_are_per_model() -> Result<(), ToolError> {
        let loader = Arc::new(CountingLoader::default());
        let resolver = resolver(Arc::clone(&loader));

        for tool in [ToolId::ImageClassifier, ToolId::ObjectDetector] {
            let ToolHandle::Local { model, .. } = resolver.local_model(tool)? else {
                panic!("expected a local model");
            };
            assert_eq!(model.model_id(), tool.model_id());
        }
        for tool in [ToolId::GeminiPro, ToolId::Gpt4o] {
            assert_eq!(
                resolver.local_model(tool).err(),
                Some(ToolError::NotLocal(tool))
            );
        }
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
        assert!(resolver.classifier.is_initialized() && resolver.detector.is_initialized());
        Ok(())
    }

    #[test]
    fn test_failed_load_is_unavailable() {
        let loader = Arc::new(CountingLoader {
            fail: true,
            ..CountingLoader::default()
        });
        let resolver = resolver(Arc::clone(&loader));

        for _ in 0..2 {
            assert_eq!(
                resolver
                    .resolve("Local: Object Detector (YOLOv8n)", &UserKeys::new())
                    .err(),
                Some(ToolError::ModelUnavailable(ToolId::ObjectDetector))
            );
        }
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_provider_failures_are_classified() {
        assert_eq!(
            ToolError::from_provider_failure(Provider::Google, "400 API_KEY_INVALID"),
            ToolError::InvalidApiKey(Provider::Google)
        );
        assert_eq!(
            ToolError::from_provider_failure(Provider::OpenAi, "error: quota_exceeded"),
            ToolError::QuotaExceeded(Provider::OpenAi)
        );
        let other = ToolError::from_provider_failure(Provider::OpenAi, "timeout");
        assert_eq!(other.to_string(), "openai error: timeout");
    }
}
