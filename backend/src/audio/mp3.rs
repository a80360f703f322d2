/// Naive MP3 concatenation:
/// Copies the raw bytes of each segment into one buffer in order,
/// without decoding or re-encoding.
///
/// # Caveat
/// This doesn't validate MP3 frames or remove ID3 tags. Players skip
/// a stray mid-stream tag, but it still counts towards the byte-based
/// duration estimate.
pub fn concat_mp3<S: AsRef<[u8]>>(segments: &[S]) -> Vec<u8> {
    let total: usize = segments.iter().map(|s| s.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total);

    for segment in segments {
        out.extend_from_slice(segment.as_ref());
    }

    out
}
