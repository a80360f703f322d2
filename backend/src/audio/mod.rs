pub mod duration;
pub mod mp3;
pub mod riff;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConcatError;
use duration::EstimationProfile;

/// Container format shared by every segment of one concat call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Chunked RIFF/WAVE container holding raw PCM.
    #[serde(alias = "wave", alias = "pcm-container")]
    Wav,
    /// Stream of self-delimiting MPEG audio frames.
    #[serde(alias = "mpeg", alias = "frame-based")]
    Mp3,
}

impl AudioFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    /// Guess the format from the extension of a URL or path, ignoring any
    /// query string or fragment.
    pub fn from_location(location: &str) -> Option<Self> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or(location);
        let file_name = path.rsplit('/').next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        ext.parse().ok()
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" | "wave" | "pcm-container" => Ok(AudioFormat::Wav),
            "mp3" | "mpeg" | "frame-based" => Ok(AudioFormat::Mp3),
            other => Err(format!("unsupported audio format: {other}")),
        }
    }
}

/// Result of joining segments: the playable file plus its estimated length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatOutput {
    pub bytes: Vec<u8>,
    pub duration_ms: u64,
    pub format: AudioFormat,
}

/// Join `segments` in order into a single file of the given format, using the
/// default duration profile.
pub fn concatenate<S: AsRef<[u8]>>(
    segments: &[S],
    format: AudioFormat,
) -> Result<ConcatOutput, ConcatError> {
    concatenate_with_profile(segments, format, &EstimationProfile::default())
}

pub fn concatenate_with_profile<S: AsRef<[u8]>>(
    segments: &[S],
    format: AudioFormat,
    profile: &EstimationProfile,
) -> Result<ConcatOutput, ConcatError> {
    if segments.is_empty() {
        return Err(ConcatError::EmptyInput);
    }

    let (bytes, duration_ms) = match format {
        AudioFormat::Wav => {
            let joined = riff::concat_wav(segments)?;
            let ms = profile.pcm_duration_ms(joined.data_len);
            (joined.bytes, ms)
        }
        AudioFormat::Mp3 => {
            let bytes = mp3::concat_mp3(segments);
            let ms = profile.frame_duration_ms(bytes.len() as u64);
            (bytes, ms)
        }
    };

    debug!(
        "Concatenated {} {} segments into {} bytes (~{} ms)",
        segments.len(),
        format,
        bytes.len(),
        duration_ms
    );

    Ok(ConcatOutput {
        bytes,
        duration_ms,
        format,
    })
}
