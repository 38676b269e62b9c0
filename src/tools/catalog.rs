//! The closed set of AI tools a user can pick.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hosted model provider reachable with an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
        }
    }

    /// Environment variable holding the system key for this provider.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::Google => "GOOGLE_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tool is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Api(Provider),
    LocalModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    GeminiPro,
    Gpt4o,
    ImageClassifier,
    ObjectDetector,
}

impl ToolId {
    pub const ALL: [Self; 4] = [
        Self::GeminiPro,
        Self::Gpt4o,
        Self::ImageClassifier,
        Self::ObjectDetector,
    ];

    /// Name shown to users; also the only accepted lookup key.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GeminiPro => "API: Google Gemini Pro",
            Self::Gpt4o => "API: OpenAI GPT-4o",
            Self::ImageClassifier => "Local: Image Classifier (ViT)",
            Self::ObjectDetector => "Local: Object Detector (YOLOv8n)",
        }
    }

    pub fn model_id(self) -> &'static str {
        match self {
            Self::GeminiPro => "models/gemini-flash-latest",
            Self::Gpt4o => "gpt-4o",
            Self::ImageClassifier => "google/vit-base-patch16-224",
            Self::ObjectDetector => "yolov8n.pt",
        }
    }

    pub fn kind(self) -> ToolKind {
        match self {
            Self::GeminiPro => ToolKind::Api(Provider::Google),
            Self::Gpt4o => ToolKind::Api(Provider::OpenAi),
            Self::ImageClassifier | Self::ObjectDetector => ToolKind::LocalModel,
        }
    }

    pub fn provider(self) -> Option<Provider> {
        match self.kind() {
            ToolKind::Api(provider) => Some(provider),
            ToolKind::LocalModel => None,
        }
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.display_name() == name)
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_lookup() {
        for tool in ToolId::ALL {
            assert_eq!(ToolId::from_display_name(tool.display_name()), Some(tool));
        }
        assert_eq!(ToolId::from_display_name("gpt-4o"), None);
        assert_eq!(ToolId::from_display_name("api: openai gpt-4o"), None);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ToolId::GeminiPro.provider(), Some(Provider::Google));
        assert_eq!(ToolId::Gpt4o.provider(), Some(Provider::OpenAi));
        assert_eq!(ToolId::ObjectDetector.kind(), ToolKind::LocalModel);
        assert_eq!(ToolId::ImageClassifier.model_id(), "google/vit-base-patch16-224");
    }

    #[test]
    fn test_provider_serialization() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&Provider::OpenAi)?, "\"openai\"");
        assert_eq!(serde_json::from_str::<Provider>("\"google\"")?, Provider::Google);
        Ok(())
    }
}
