use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod sources;
pub mod text;
pub mod validate;

pub use app_config::{
    AppConfig, Environment, FeedConfig, LinkedinConfig, LlmConfig, PipelineConfig,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use sources::{load_sources, NewsSource, SourcesFile};
pub use validate::{
    GenerationRequest, NewComment, NewEngagementMetric, NewNewsArticle, NewPost, NewTrendTopic,
    ValidationError,
};

/// Voice used when asking the language model to draft a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    Casual,
    Technical,
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Professional
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tone::Professional => write!(f, "professional"),
            Tone::Casual => write!(f, "casual"),
            Tone::Technical => write!(f, "technical"),
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "professional" => Ok(Tone::Professional),
            "casual" => Ok(Tone::Casual),
            "technical" => Ok(Tone::Technical),
            other => Err(ValidationError::new(
                "tone",
                format!("must be one of professional, casual, technical; got '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tone_round_trips_through_str() {
        for tone in [Tone::Professional, Tone::Casual, Tone::Technical] {
            assert_eq!(Tone::from_str(&tone.to_string()).unwrap(), tone);
        }
    }

    #[test]
    fn tone_rejects_unknown_value() {
        let err = Tone::from_str("sarcastic").unwrap_err();
        assert_eq!(err.field, "tone");
    }

    #[test]
    fn tone_serde_uses_lowercase() {
        let json = serde_json::to_string(&Tone::Technical).unwrap();
        assert_eq!(json, "\"technical\"");
        let back: Tone = serde_json::from_str("\"casual\"").unwrap();
        assert_eq!(back, Tone::Casual);
    }
}
