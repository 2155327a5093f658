use crate::all_minilm_l6_v2::DEFAULT_MODEL_DIR;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),

    #[error("environment variable {var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub model_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub qdrant: QdrantSettings,
    pub llm: LlmSettings,
    pub chunking: ChunkSettings,
    pub collections: CollectionSettings,
}

#[derive(Debug, Clone)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkSettings {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            size: 500,
            overlap: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSettings {
    pub default: String,
    pub nutrition: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            default: "health_schemes".to_string(),
            nutrition: "nutrition_data".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let chunking = ChunkSettings {
            size: parse_or(&get, "CHUNK_SIZE", ChunkSettings::default().size)?,
            overlap: parse_or(&get, "CHUNK_OVERLAP", ChunkSettings::default().overlap)?,
        };
        if chunking.size == 0 {
            return Err(ConfigError::Invalid {
                var: "CHUNK_SIZE",
                value: chunking.size.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if chunking.overlap >= chunking.size {
            return Err(ConfigError::Invalid {
                var: "CHUNK_OVERLAP",
                value: chunking.overlap.to_string(),
                reason: format!("must be smaller than CHUNK_SIZE ({})", chunking.size),
            });
        }

        let defaults = CollectionSettings::default();
        let max_upload_mb: usize = parse_or(&get, "MAX_UPLOAD_MB", 50)?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| ConfigError::Invalid {
                var: "MAX_UPLOAD_MB",
                value: max_upload_mb.to_string(),
                reason: "too large".to_string(),
            })?;

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            model_dir: get("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR)),
            max_upload_bytes,
            qdrant: QdrantSettings {
                url: required("QDRANT_URL")?,
                api_key: get("QDRANT_API_KEY"),
                timeout_secs: parse_or(&get, "QDRANT_TIMEOUT_SECS", 30)?,
            },
            llm: LlmSettings {
                base_url: required("E2E_NETWORKS_URL")?,
                api_key: required("LLAMA_API_KEY")?,
                model: get("LLM_MODEL").unwrap_or_else(|| "llama3_2_3b_instruct".to_string()),
                timeout_secs: parse_or(&get, "LLM_TIMEOUT_SECS", 60)?,
            },
            chunking,
            collections: CollectionSettings {
                default: get("DEFAULT_COLLECTION").unwrap_or(defaults.default),
                nutrition: get("NUTRITION_COLLECTION").unwrap_or(defaults.nutrition),
            },
        })
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
