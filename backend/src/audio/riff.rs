//! WAV (RIFF) concatenation.
//!
//! A WAV file is a 12-byte `RIFF....WAVE` header followed by tagged chunks,
//! each an ASCII id and a little-endian `u32` length. Joining keeps the first
//! file's header and everything before its `data` payload, rewrites the two
//! size fields, then appends the `data` payload of every segment.

use tracing::debug;

use crate::error::ConcatError;

/// Size of the outer `RIFF <size> WAVE` header.
pub const RIFF_HEADER_LEN: usize = 12;
/// Size of a chunk header: 4-byte id plus 4-byte length.
pub const CHUNK_HEADER_LEN: usize = 8;
pub const DATA_CHUNK_ID: [u8; 4] = *b"data";

/// One chunk header found while walking a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: [u8; 4],
    pub size: u32,
    /// Offset of the 8-byte header itself.
    pub offset: usize,
}

impl ChunkHeader {
    pub fn payload_start(&self) -> usize {
        self.offset + CHUNK_HEADER_LEN
    }
}

/// The walk reached a position where a full chunk header no longer fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub offset: usize,
}

/// Iterator over the chunk headers of a RIFF buffer, starting after the
/// outer header. Yields a single `Err(OutOfBounds)` once the next header
/// would not fit, then stops.
pub struct ChunkWalker<'a> {
    buf: &'a [u8],
    pos: Option<usize>,
}

impl<'a> ChunkWalker<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: Some(RIFF_HEADER_LEN),
        }
    }
}

impl Iterator for ChunkWalker<'_> {
    type Item = Result<ChunkHeader, OutOfBounds>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.pos?;

        let header = offset
            .checked_add(CHUNK_HEADER_LEN)
            .and_then(|end| self.buf.get(offset..end));
        let Some(header) = header else {
            self.pos = None;
            return Some(Err(OutOfBounds { offset }));
        };

        let id = [header[0], header[1], header[2], header[3]];
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        // Overflow here means the next header is unreachable anyway.
        self.pos = (offset + CHUNK_HEADER_LEN).checked_add(size as usize);

        Some(Ok(ChunkHeader { id, size, offset }))
    }
}

/// Where a segment's `data` payload starts and how long its header says it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataChunk {
    pub payload_start: usize,
    pub declared_len: u32,
}

/// Walk `buf` until the first `data` chunk. `segment` is only used for errors.
pub fn find_data_chunk(buf: &[u8], segment: usize) -> Result<DataChunk, ConcatError> {
    if buf.len() < RIFF_HEADER_LEN {
        return Err(ConcatError::TruncatedHeader { segment });
    }

    for chunk in ChunkWalker::new(buf) {
        match chunk {
            Ok(header) if header.id == DATA_CHUNK_ID => {
                return Ok(DataChunk {
                    payload_start: header.payload_start(),
                    declared_len: header.size,
                });
            }
            Ok(_) => continue,
            Err(OutOfBounds { offset }) => {
                debug!("Segment #{segment}: chunk walk stopped at offset {offset}");
                break;
            }
        }
    }

    Err(ConcatError::MissingDataChunk { segment })
}

/// A joined WAV file together with its total `data` byte count.
#[derive(Debug)]
pub struct JoinedWav {
    pub bytes: Vec<u8>,
    pub data_len: u64,
}

/// Join WAV segments. Each segment is walked on its own, so header layouts
/// may differ between segments; only the first one's header survives.
pub fn concat_wav<S: AsRef<[u8]>>(segments: &[S]) -> Result<JoinedWav, ConcatError> {
    let Some(first) = segments.first() else {
        return Err(ConcatError::EmptyInput);
    };
    let first: &[u8] = first.as_ref();

    let mut payload_starts = Vec::with_capacity(segments.len());
    let mut data_len: usize = 0;
    for (index, segment) in segments.iter().enumerate() {
        let buf = segment.as_ref();
        let chunk = find_data_chunk(buf, index)?;
        let taken = buf.len() - chunk.payload_start;
        if taken as u64 != u64::from(chunk.declared_len) {
            debug!(
                "Segment #{index}: data chunk declares {} bytes, taking {taken}",
                chunk.declared_len
            );
        }
        data_len = data_len
            .checked_add(taken)
            .ok_or(ConcatError::OutputTooLarge)?;
        payload_starts.push(chunk.payload_start);
    }

    let prefix_len = payload_starts[0];
    let output_len = prefix_len
        .checked_add(data_len)
        .ok_or(ConcatError::OutputTooLarge)?;
    let riff_size = u32::try_from(output_len - 8).map_err(|_| ConcatError::OutputTooLarge)?;
    let data_size = u32::try_from(data_len).map_err(|_| ConcatError::OutputTooLarge)?;

    let mut out = Vec::with_capacity(output_len);
    out.extend_from_slice(&first[..prefix_len]);
    out[4..8].copy_from_slice(&riff_size.to_le_bytes());
    out[prefix_len - 4..prefix_len].copy_from_slice(&data_size.to_le_bytes());

    for (segment, start) in segments.iter().zip(payload_starts) {
        out.extend_from_slice(&segment.as_ref()[start..]);
    }

    Ok(JoinedWav {
        bytes: out,
        data_len: data_len as u64,
    })
}
