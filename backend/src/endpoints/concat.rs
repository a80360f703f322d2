use actix_web::{
    error::JsonPayloadError,
    get, post,
    web::{self, Json, JsonConfig, ServiceConfig},
    HttpRequest, HttpResponse,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::app_state::AppState;
use crate::audio::{concatenate_with_profile, AudioFormat};
use crate::error::ConcatError;
use crate::services::acquire::{acquire_segments, resolve_format, SegmentSource};
use crate::services::storage::{generate_key, normalize_key, store};

#[derive(Debug, Deserialize)]
pub struct InlineAudio {
    /// Base64 audio bytes, optionally as a `data:` URI.
    pub data: String,
    pub format: AudioFormat,
}

#[derive(Debug, Deserialize)]
pub struct ConcatRequest {
    #[serde(default)]
    pub audio_urls: Vec<String>,
    #[serde(default)]
    pub audio_data: Vec<InlineAudio>,
    pub output_key: Option<String>,
    pub output_format: Option<AudioFormat>,
    #[serde(default)]
    pub return_data: bool,
}

impl ConcatRequest {
    /// Remote sources first, then inline ones, each in request order.
    fn into_sources(self) -> Vec<SegmentSource> {
        self.audio_urls
            .into_iter()
            .map(|url| SegmentSource::Remote { url })
            .chain(
                self.audio_data
                    .into_iter()
                    .map(|inline| SegmentSource::Inline {
                        data: inline.data,
                        format: inline.format,
                    }),
            )
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ConcatResponse {
    pub success: bool,
    pub path: String,
    pub key: String,
    pub format: AudioFormat,
    pub content_type: &'static str,
    pub duration_ms: u64,
    pub size_bytes: usize,
    pub segment_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// POST /api/concat
/// Fetches or decodes every segment, joins them, stores the result under the
/// requested key and reports where it went.
#[post("/concat")]
pub async fn concat_audio(
    state: web::Data<AppState>,
    payload: Json<ConcatRequest>,
) -> Result<HttpResponse, ConcatError> {
    info!("POST /concat endpoint called");

    let request = payload.into_inner();
    let return_data = request.return_data;
    let requested_format = request.output_format;
    let requested_key = request.output_key.clone();
    let sources = request.into_sources();

    // 1) Reject before any network or buffer work
    let count = sources.len();
    info!("Request carries {} segments", count);
    if count == 0 {
        return Err(ConcatError::EmptyInput);
    }
    if count > state.config.max_segments {
        info!("Rejecting request over the segment cap of {}", state.config.max_segments);
        return Err(ConcatError::TooManySegments {
            count,
            max: state.config.max_segments,
        });
    }

    // 2) Settle format and output key
    let format = resolve_format(requested_format, &sources)?;
    let key = match requested_key {
        Some(key) => normalize_key(&key, format)?,
        None => generate_key(format),
    };
    info!("Resolved format {} and output key {}", format, key);

    // 3) Fetch / decode segments
    let segments = acquire_segments(&state.client, &sources, state.config.fetch_attempts).await?;

    // 4) Join
    let output = concatenate_with_profile(&segments, format, &state.config.profile)?;
    info!(
        "Joined {} segments into {} bytes (~{} ms)",
        count,
        output.bytes.len(),
        output.duration_ms
    );

    // 5) Persist
    let stored = store(&state.config.storage_root, &key, &output.bytes)?;

    let data = return_data.then(|| BASE64.encode(&output.bytes));
    Ok(HttpResponse::Ok().json(ConcatResponse {
        success: true,
        path: stored.public_path,
        key: stored.key,
        format,
        content_type: format.content_type(),
        duration_ms: output.duration_ms,
        size_bytes: output.bytes.len(),
        segment_count: count,
        data,
    }))
}

/// GET /api/health
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "max_segments": state.config.max_segments,
    }))
}

/// JSON extractor settings for the API scope: bodies up to `limit` bytes,
/// and parse failures answered with the usual `{ "success": false }` body.
pub fn json_config(limit: usize) -> JsonConfig {
    JsonConfig::default()
        .limit(limit)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            info!("Rejecting request body: {}", err);
            ConcatError::from(err).into()
        })
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(concat_audio).service(health);
}
