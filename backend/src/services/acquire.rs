use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use futures::future::try_join_all;
use reqwest::Client;
use tracing::info;

use crate::audio::AudioFormat;
use crate::error::ConcatError;
use crate::services::fetch::fetch_segment;

/// Where one segment's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentSource {
    Remote { url: String },
    Inline { data: String, format: AudioFormat },
}

/// Pick the format for a batch: explicit override first, then the inline
/// tags, then the first URL's extension, then mp3.
///
/// Inline tags must agree with each other and with the override, if one is
/// given; otherwise the batch is rejected. Remote bodies are never inspected.
pub fn resolve_format(
    requested: Option<AudioFormat>,
    sources: &[SegmentSource],
) -> Result<AudioFormat, ConcatError> {
    let mut inline_tags = sources.iter().filter_map(|source| match source {
        SegmentSource::Inline { format, .. } => Some(*format),
        SegmentSource::Remote { .. } => None,
    });

    let inline_format = match inline_tags.next() {
        Some(first) if inline_tags.all(|tag| tag == first) => Some(first),
        Some(_) => return Err(ConcatError::MixedFormats),
        None => None,
    };

    if let (Some(requested), Some(inline)) = (requested, inline_format) {
        if requested != inline {
            return Err(ConcatError::MixedFormats);
        }
    }

    let remote_format = sources.iter().find_map(|source| match source {
        SegmentSource::Remote { url } => AudioFormat::from_location(url),
        SegmentSource::Inline { .. } => None,
    });

    Ok(requested
        .or(inline_format)
        .or(remote_format)
        .unwrap_or(AudioFormat::Mp3))
}

/// Decode base64 audio, accepting an optional `data:<mime>;base64,` prefix.
pub fn decode_inline(data: &str, index: usize) -> Result<Vec<u8>, ConcatError> {
    let payload = match data.split_once(";base64,") {
        Some((scheme, rest)) if scheme.starts_with("data:") => rest,
        _ => data,
    };

    BASE64
        .decode(payload.trim())
        .map_err(|e| ConcatError::Decode {
            index,
            reason: e.to_string(),
        })
}

async fn acquire_one(
    client: &Client,
    index: usize,
    source: &SegmentSource,
    attempts: u32,
) -> Result<Vec<u8>, ConcatError> {
    match source {
        SegmentSource::Remote { url } => {
            let bytes = fetch_segment(client, url, attempts)
                .await
                .map_err(|reason| ConcatError::Fetch {
                    index,
                    url: url.clone(),
                    reason,
                })?;
            info!("Segment #{}: fetched {} bytes", index, bytes.len());
            Ok(bytes)
        }
        SegmentSource::Inline { data, .. } => decode_inline(data, index),
    }
}

/// Resolve every source to bytes. Remote fetches run concurrently; the
/// returned buffers are in the same order as `sources`. The first failure
/// aborts the whole batch.
pub async fn acquire_segments(
    client: &Client,
    sources: &[SegmentSource],
    attempts: u32,
) -> Result<Vec<Vec<u8>>, ConcatError> {
    if sources.is_empty() {
        return Err(ConcatError::EmptyInput);
    }

    try_join_all(
        sources
            .iter()
            .enumerate()
            .map(|(index, source)| acquire_one(client, index, source, attempts)),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_segment_server;

    fn inline(bytes: &[u8], format: AudioFormat) -> SegmentSource {
        SegmentSource::Inline {
            data: BASE64.encode(bytes),
            format,
        }
    }

    fn remote(url: &str) -> SegmentSource {
        SegmentSource::Remote {
            url: url.to_string(),
        }
    }

    #[test]
    fn inline_round_trip() {
        let original: Vec<u8> = vec![0, 1, 2, 250, 251, 255, b'R', b'I', b'F', b'F'];
        let encoded = BASE64.encode(&original);
        assert_eq!(decode_inline(&encoded, 0).unwrap(), original);
    }

    #[test]
    fn inline_accepts_data_uri() {
        let uri = format!("data:audio/wav;base64,{}", BASE64.encode(b"hello"));
        assert_eq!(decode_inline(&uri, 0).unwrap(), b"hello".to_vec());
    }

    #[test]
    fn bad_base64_names_the_segment() {
        let err = decode_inline("not base64!!", 7).unwrap_err();
        assert!(matches!(err, ConcatError::Decode { index: 7, .. }));
    }

    #[test]
    fn format_resolution_order() {
        let wav = inline(b"x", AudioFormat::Wav);
        let url = remote("https://cdn.example.com/a.wav");
        let bare = remote("https://cdn.example.com/a");

        assert_eq!(
            resolve_format(Some(AudioFormat::Wav), &[wav.clone()]).unwrap(),
            AudioFormat::Wav
        );
        assert_eq!(
            resolve_format(Some(AudioFormat::Mp3), &[url.clone()]).unwrap(),
            AudioFormat::Mp3
        );
        assert_eq!(resolve_format(None, &[wav]).unwrap(), AudioFormat::Wav);
        assert_eq!(resolve_format(None, &[url]).unwrap(), AudioFormat::Wav);
        assert_eq!(resolve_format(None, &[bare]).unwrap(), AudioFormat::Mp3);
    }

    #[test]
    fn mixed_inline_tags_are_rejected() {
        let sources = [inline(b"a", AudioFormat::Wav), inline(b"b", AudioFormat::Mp3)];
        assert!(matches!(
            resolve_format(Some(AudioFormat::Wav), &sources),
            Err(ConcatError::MixedFormats)
        ));
    }

    #[test]
    fn override_contradicting_inline_tags_is_rejected() {
        let sources = [inline(b"a", AudioFormat::Mp3), inline(b"b", AudioFormat::Mp3)];
        assert!(matches!(
            resolve_format(Some(AudioFormat::Wav), &sources),
            Err(ConcatError::MixedFormats)
        ));
    }

    #[actix_web::test]
    async fn empty_sources_are_rejected() {
        let err = acquire_segments(&Client::new(), &[], 1).await.unwrap_err();
        assert!(matches!(err, ConcatError::EmptyInput));
    }

    #[actix_web::test]
    async fn mixed_sources_keep_request_order() {
        let server = spawn_segment_server(vec![("one", vec![1; 3]), ("two", vec![2; 5])]);
        let sources = [
            remote(&server.url("one")),
            inline(&[3; 2], AudioFormat::Mp3),
            remote(&server.url("two")),
        ];

        let buffers = acquire_segments(&Client::new(), &sources, 1).await.unwrap();
        assert_eq!(buffers, vec![vec![1; 3], vec![3; 2], vec![2; 5]]);
    }

    #[actix_web::test]
    async fn failed_fetch_fails_the_batch() {
        let server = spawn_segment_server(vec![("one", vec![1; 3])]);
        let sources = [remote(&server.url("one")), remote(&server.url("gone"))];

        let err = acquire_segments(&Client::new(), &sources, 1).await.unwrap_err();
        match err {
            ConcatError::Fetch { index, url, .. } => {
                assert_eq!(index, 1);
                assert!(url.ends_with("/gone"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
