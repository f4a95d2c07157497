//! Main settings module

use std::time::Duration;

use config::{Config, Environment, File};
use narrator_core::QualityProfile;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Speech model and pipeline configuration
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Voice discovery configuration
    #[serde(default)]
    pub voices: VoiceConfig,

    /// File upload limits
    #[serde(default)]
    pub upload: UploadConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let synthesis = &self.synthesis;

        if synthesis.model_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "synthesis.model_id".to_string(),
                message: "Model id must not be empty".to_string(),
            });
        }

        if synthesis.max_chunk_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "synthesis.max_chunk_length".to_string(),
                message: "Chunk length must be at least one character".to_string(),
            });
        }

        if synthesis.sample_rate == 0 {
            return Err(ConfigError::InvalidValue {
                field: "synthesis.sample_rate".to_string(),
                message: "Sample rate must be positive".to_string(),
            });
        }

        if synthesis.max_concurrent_requests == 0 {
            return Err(ConfigError::InvalidValue {
                field: "synthesis.max_concurrent_requests".to_string(),
                message: "At least one request must be allowed to synthesize".to_string(),
            });
        }

        if synthesis.backend == BackendKind::Remote && synthesis.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "synthesis.base_url".to_string(),
                message: "Remote backend requires a base URL".to_string(),
            });
        }

        if self.upload.max_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload.max_bytes".to_string(),
                message: "Upload limit must be positive".to_string(),
            });
        }

        if synthesis.chunk_timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "synthesis.chunk_timeout_seconds".to_string(),
                message: "Timeout must be positive; omit it to wait indefinitely".to_string(),
            });
        }

        if synthesis.default_voice.trim().is_empty() {
            tracing::warn!("synthesis.default_voice is empty; requests without a voice will be rejected");
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins, any origin when empty
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
        }
    }
}

/// Which speech model backend to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OpenAI-compatible speech server reached over HTTP
    Remote,
    /// In-process tone generator, no model files
    Simple,
}

/// Speech model and pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Backend selection
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Model identifier handed to the loader
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Base URL of the remote speech server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sample rate of audio produced by the backend
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Maximum characters per chunk
    #[serde(default = "default_max_chunk_length")]
    pub max_chunk_length: usize,

    /// Voice used when a request names none
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// Quality used when a request names none
    #[serde(default)]
    pub default_quality: QualityProfile,

    /// Deadline for a single chunk, none to wait indefinitely
    #[serde(default)]
    pub chunk_timeout_seconds: Option<u64>,

    /// Requests allowed to synthesize at once (1 = serialized backend)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// HTTP client timeout for the remote backend
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_backend() -> BackendKind {
    BackendKind::Remote
}
fn default_model_id() -> String {
    "onnx-community/Kokoro-82M-v1.0-ONNX".to_string()
}
fn default_base_url() -> String {
    "http://127.0.0.1:8880".to_string()
}
fn default_sample_rate() -> u32 {
    24000
}
fn default_max_chunk_length() -> usize {
    500
}
fn default_voice() -> String {
    "af_heart".to_string()
}
fn default_max_concurrent() -> usize {
    1
}
fn default_request_timeout() -> u64 {
    120
}

impl SynthesisConfig {
    pub fn chunk_timeout(&self) -> Option<Duration> {
        self.chunk_timeout_seconds.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model_id: default_model_id(),
            base_url: default_base_url(),
            sample_rate: default_sample_rate(),
            max_chunk_length: default_max_chunk_length(),
            default_voice: default_voice(),
            default_quality: QualityProfile::default(),
            chunk_timeout_seconds: None,
            max_concurrent_requests: default_max_concurrent(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Voice discovery configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Voice identifiers used when the model reports none
    #[serde(default)]
    pub configured: Vec<String>,
}

/// File upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable the Prometheus endpoint
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// OTLP endpoint for traces (requires the `otlp` feature)
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
            otlp_endpoint: None,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (`NARRATOR__SECTION__KEY`)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("NARRATOR")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
