//! Duration estimates from byte counts.
//!
//! No decoding happens here: WAV durations assume a fixed PCM profile and
//! MP3 durations assume a constant bitrate. Anything encoded differently gets
//! a wrong estimate, so callers should treat the value as approximate.

pub const DEFAULT_PCM_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_PCM_BYTES_PER_SAMPLE: u32 = 2;
pub const DEFAULT_PCM_CHANNELS: u32 = 1;
pub const DEFAULT_FRAME_BITRATE_BPS: u32 = 128_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimationProfile {
    pub pcm_sample_rate: u32,
    pub pcm_bytes_per_sample: u32,
    pub pcm_channels: u32,
    pub frame_bitrate_bps: u32,
}

impl Default for EstimationProfile {
    fn default() -> Self {
        Self {
            pcm_sample_rate: DEFAULT_PCM_SAMPLE_RATE,
            pcm_bytes_per_sample: DEFAULT_PCM_BYTES_PER_SAMPLE,
            pcm_channels: DEFAULT_PCM_CHANNELS,
            frame_bitrate_bps: DEFAULT_FRAME_BITRATE_BPS,
        }
    }
}

impl EstimationProfile {
    pub fn pcm_bytes_per_second(&self) -> u64 {
        u64::from(self.pcm_sample_rate)
            * u64::from(self.pcm_bytes_per_sample)
            * u64::from(self.pcm_channels)
    }

    /// Milliseconds of raw PCM in `data_bytes`, rounded down.
    pub fn pcm_duration_ms(&self, data_bytes: u64) -> u64 {
        duration_ms(data_bytes, 1000, self.pcm_bytes_per_second())
    }

    /// Milliseconds of constant-bitrate audio in `total_bytes`, rounded down.
    /// Works in bits so bitrates that are not a multiple of 8 stay exact.
    pub fn frame_duration_ms(&self, total_bytes: u64) -> u64 {
        duration_ms(total_bytes, 8 * 1000, u64::from(self.frame_bitrate_bps))
    }
}

/// `floor(units * scale / per_second)`; zero when the rate is zero.
fn duration_ms(units: u64, scale: u64, per_second: u64) -> u64 {
    if per_second == 0 {
        return 0;
    }
    // u128 keeps the product exact for any buffer we could hold.
    (u128::from(units) * u128::from(scale) / u128::from(per_second)) as u64
}
