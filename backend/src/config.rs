use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use shuttle_runtime::SecretStore;
use tracing::warn;

use crate::audio::duration::EstimationProfile;

pub const DEFAULT_MAX_SEGMENTS: usize = 100;
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;
pub const DEFAULT_STORAGE_ROOT: &str = "./user_files";
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 2;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, read from the Shuttle secret store.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Requests with more segments than this are rejected before any fetch.
    pub max_segments: usize,
    /// Largest JSON request body accepted; inline segments count towards it.
    pub max_body_bytes: usize,
    /// Directory outputs are written to and served from under `/user_files`.
    pub storage_root: PathBuf,
    pub fetch_attempts: u32,
    pub fetch_timeout: Duration,
    pub profile: EstimationProfile,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_segments: DEFAULT_MAX_SEGMENTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            profile: EstimationProfile::default(),
        }
    }
}

impl AppConfig {
    pub fn from_secrets(secrets: &SecretStore) -> Self {
        Self::from_lookup(|key| secrets.get(key))
    }

    /// Build the config from any key/value source. Missing keys keep their
    /// defaults; unparseable or zero values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let profile = defaults.profile;

        Self {
            max_segments: positive(&lookup, "MAX_SEGMENTS", defaults.max_segments),
            max_body_bytes: positive(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes),
            storage_root: lookup("STORAGE_ROOT")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_root),
            fetch_attempts: positive(&lookup, "FETCH_ATTEMPTS", defaults.fetch_attempts),
            fetch_timeout: Duration::from_secs(positive(
                &lookup,
                "FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
            profile: EstimationProfile {
                pcm_sample_rate: positive(&lookup, "PCM_SAMPLE_RATE", profile.pcm_sample_rate),
                pcm_bytes_per_sample: positive(
                    &lookup,
                    "PCM_BYTES_PER_SAMPLE",
                    profile.pcm_bytes_per_sample,
                ),
                pcm_channels: positive(&lookup, "PCM_CHANNELS", profile.pcm_channels),
                frame_bitrate_bps: positive(
                    &lookup,
                    "FRAME_BITRATE_BPS",
                    profile.frame_bitrate_bps,
                ),
            },
        }
    }
}

fn positive<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            warn!("Ignoring invalid value {raw:?} for {key}, using default");
            default
        }
    }
}
