//! Narrative insights from a remote text-generation model.
//!
//! [`InsightRequester::request_insight`] always resolves to displayable text:
//! any failure of the single remote attempt is replaced by [`FALLBACK_INSIGHT`].

use crate::config::Config;
use crate::models::AttendanceRecord;
use crate::stats::display_timestamp;
use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const FALLBACK_INSIGHT: &str =
    "Maaf, sistem AI Smart Report sedang tidak dapat menjangkau data saat ini.";

const MISSING_NOTE: &str = "Tidak ada keterangan";

#[derive(Debug)]
pub enum InsightError {
    MissingApiKey,
    Transport(String),
    Status(u16, String),
    Malformed(String),
    EmptyResponse,
}

impl fmt::Display for InsightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightError::MissingApiKey => f.write_str("no API key configured"),
            InsightError::Transport(msg) => write!(f, "request failed: {msg}"),
            InsightError::Status(code, body) => write!(f, "service returned {code}: {body}"),
            InsightError::Malformed(msg) => write!(f, "malformed response: {msg}"),
            InsightError::EmptyResponse => f.write_str("response carried no text"),
        }
    }
}

impl std::error::Error for InsightError {}

#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, InsightError>;
}

/// `generateContent` over the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Self {
        let http = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(err) => {
                warn!("insight client without {timeout:?} timeout: {err}");
                reqwest::Client::new()
            }
        };
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.gemini_base_url,
            &config.gemini_model,
            config.gemini_api_key.clone(),
            config.insight_timeout,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn headers(&self) -> Result<HeaderMap, InsightError> {
        let key = self.api_key.as_deref().ok_or(InsightError::MissingApiKey)?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let value = HeaderValue::from_str(key)
            .map_err(|e| InsightError::Transport(format!("invalid api key header: {e}")))?;
        headers.insert("x-goog-api-key", value);
        Ok(headers)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn response_text(body: &[u8]) -> Result<String, InsightError> {
    let parsed: GenerateResponse =
        serde_json::from_slice(body).map_err(|e| InsightError::Malformed(e.to_string()))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(InsightError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(name = "gemini_generate", skip_all)]
    async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
        let headers = self.headers()?;
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };
        let resp = self
            .http
            .post(self.endpoint())
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| InsightError::Transport(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| InsightError::Transport(format!("read body failed: {e}")))?;
        if !status.is_success() {
            let snippet: String = String::from_utf8_lossy(&bytes).chars().take(200).collect();
            return Err(InsightError::Status(status.as_u16(), snippet));
        }
        response_text(&bytes)
    }
}

#[derive(Serialize)]
struct RecordContext {
    nama: String,
    waktu: String,
    tipe: &'static str,
    status: &'static str,
    laporan: String,
}

pub fn build_prompt(records: &[AttendanceRecord], offset: FixedOffset) -> String {
    let context: Vec<RecordContext> = records
        .iter()
        .map(|r| RecordContext {
            nama: r.user_name.clone(),
            waktu: display_timestamp(&r.timestamp, offset),
            tipe: r.kind.label(),
            status: r.status.as_str(),
            laporan: r
                .note
                .as_deref()
                .filter(|note| !note.is_empty())
                .unwrap_or(MISSING_NOTE)
                .to_string(),
        })
        .collect();
    // Vec of plain structs always serializes.
    let data = serde_json::to_string(&context).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Anda adalah asisten AI untuk sistem \"Smart Report Mahasina\".\n\
         Analisis data laporan berikut: {data}.\n\
         Berikan laporan ringkas dalam Bahasa Indonesia:\n\
         1. Statistik tingkat kedisiplinan (Hadir vs Keterlambatan/Izin).\n\
         2. Ringkasan aktivitas menonjol dari laporan yang masuk.\n\
         3. Rekomendasi untuk meningkatkan kualitas kedisiplinan di lingkungan Mahasina.\n\
         Gunakan gaya bahasa yang formal, santun, dan profesional. Format dalam Markdown."
    )
}

#[derive(Clone)]
pub struct InsightRequester {
    generator: Arc<dyn TextGenerator>,
    offset: FixedOffset,
}

impl InsightRequester {
    pub fn new(generator: Arc<dyn TextGenerator>, offset: FixedOffset) -> Self {
        Self { generator, offset }
    }

    pub async fn request_insight(&self, records: &[AttendanceRecord]) -> String {
        let prompt = build_prompt(records, self.offset);
        match self.generator.generate(&prompt).await {
            Ok(text) => {
                info!(records = records.len(), model = self.generator.model(), "insight generated");
                text
            }
            Err(err) => {
                error!("insight request failed: {err}");
                FALLBACK_INSIGHT.to_string()
            }
        }
    }
}
