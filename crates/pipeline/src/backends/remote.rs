//! Remote speech server backend
//!
//! Talks to an OpenAI-compatible Kokoro server over HTTP:
//! - `GET  /v1/models` to check the server is up at load time
//! - `GET  /v1/audio/voices` to enumerate voices
//! - `POST /v1/audio/speech` with `response_format: "pcm"` (s16le mono)

use std::sync::Arc;
use std::time::Duration;

use narrator_core::{GenerateOptions, ModelLoader, RawAudio, SpeechModel, SynthesisError};
use serde::{Deserialize, Serialize};

/// Remote backend settings
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Server root, e.g. `http://127.0.0.1:8880`
    pub base_url: String,
    /// Rate of the PCM the server returns
    pub sample_rate: u32,
    /// Per-HTTP-request timeout
    pub request_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8880".to_string(),
            sample_rate: 24000,
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
    stream: bool,
}

#[derive(Deserialize)]
struct VoiceList {
    voices: Vec<VoiceItem>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VoiceItem {
    Id(String),
    Described {
        id: Option<String>,
        name: Option<String>,
    },
}

impl VoiceItem {
    fn into_id(self) -> Option<String> {
        match self {
            VoiceItem::Id(id) => Some(id),
            VoiceItem::Described { id, name } => id.or(name),
        }
    }
}

/// Handle to a model served by a remote speech server
#[derive(Debug, Clone)]
pub struct RemoteModel {
    client: reqwest::Client,
    base_url: String,
    model_id: String,
    sample_rate: u32,
}

impl RemoteModel {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl SpeechModel for RemoteModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        text: &str,
        options: &GenerateOptions,
    ) -> Result<RawAudio, SynthesisError> {
        let body = SpeechRequest {
            model: &self.model_id,
            input: text,
            voice: &options.voice,
            speed: options.speed,
            response_format: "pcm",
            stream: false,
        };

        let res = self
            .client
            .post(self.url("/v1/audio/speech"))
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error("speech request failed", e))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SynthesisError::Backend(format!(
                "speech server returned {}: {}",
                status, body
            )));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| request_error("speech response read failed", e))?;

        let samples = decode_pcm_s16le(&bytes)?;
        Ok(RawAudio::new(samples, self.sample_rate))
    }

    async fn voices(&self) -> Result<Vec<String>, SynthesisError> {
        let res = self
            .client
            .get(self.url("/v1/audio/voices"))
            .send()
            .await
            .map_err(|e| request_error("voice list request failed", e))?;

        if !res.status().is_success() {
            return Err(SynthesisError::Backend(format!(
                "voice list returned {}",
                res.status()
            )));
        }

        let list: VoiceList = res
            .json()
            .await
            .map_err(|e| SynthesisError::Malformed(format!("voice list: {}", e)))?;

        Ok(list.voices.into_iter().filter_map(VoiceItem::into_id).collect())
    }
}

/// Connects to a remote speech server
#[derive(Debug, Clone)]
pub struct RemoteLoader {
    config: RemoteConfig,
}

impl RemoteLoader {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl ModelLoader for RemoteLoader {
    async fn from_pretrained(
        &self,
        model_id: &str,
    ) -> Result<Arc<dyn SpeechModel>, SynthesisError> {
        if self.config.sample_rate == 0 {
            return Err(SynthesisError::Load("sample rate must be positive".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .build()
            .map_err(|e| SynthesisError::Load(format!("HTTP client: {}", e)))?;

        let model = RemoteModel {
            client,
            base_url: self.config.base_url.trim_end_matches('/').to_string(),
            model_id: model_id.to_string(),
            sample_rate: self.config.sample_rate,
        };

        let res = model
            .client
            .get(model.url("/v1/models"))
            .send()
            .await
            .map_err(|e| SynthesisError::Load(format!("speech server unreachable: {}", e)))?;

        if !res.status().is_success() {
            return Err(SynthesisError::Load(format!(
                "speech server returned {} for model listing",
                res.status()
            )));
        }

        tracing::info!(
            model_id,
            base_url = %model.base_url,
            sample_rate = model.sample_rate,
            "Connected to remote speech server"
        );

        Ok(Arc::new(model))
    }
}

fn request_error(context: &str, err: reqwest::Error) -> SynthesisError {
    if err.is_timeout() {
        SynthesisError::Backend(format!("{}: request timed out", context))
    } else {
        SynthesisError::Backend(format!("{}: {}", context, err))
    }
}

/// Decode signed 16-bit little-endian PCM into floats in [-1.0, 1.0)
pub fn decode_pcm_s16le(bytes: &[u8]) -> Result<Vec<f32>, SynthesisError> {
    if bytes.len() % 2 != 0 {
        return Err(SynthesisError::Malformed(format!(
            "PCM payload has odd length {}",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect())
}
