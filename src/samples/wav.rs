// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The subset of RIFF/WAVE needed to pull raw PCM out of a slice.

/// Extension of the slice files, matched case-insensitively.
pub const WAV_EXTENSION: &str = ".wav";

/// Smallest file that can hold a canonical WAV header.
const WAV_HEADER_MIN: usize = 44;

/// Length of a chunk header (4-byte id, u32 size).
const CHUNK_HEADER: usize = 8;

/// Smallest valid `fmt ` chunk payload.
const FMT_CHUNK_MIN: usize = 16;

/// WAVE_FORMAT_PCM.
const FORMAT_PCM: u16 = 1;

/// Reasons a slice is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("is too small to be a WAV file.")]
    TooSmall,

    #[error("is not a valid WAV file.")]
    NotRiff,

    #[error("has an invalid fmt chunk.")]
    BadFmtChunk,

    #[error("is not PCM format (format={0}).")]
    NotPcm(u16),

    #[error("is missing its fmt/data chunks.")]
    MissingChunks,

    #[error("is not mono ({0} channels). Generic PCM DAC requires mono.")]
    NotMono(u16),

    #[error("has unsupported bit depth {0} (need 8 or 16).")]
    UnsupportedBitDepth(u16),
}

/// Format description and PCM payload of a parsed slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavData {
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub pcm: Vec<u8>,
}

struct Fmt {
    channels: u16,
    sample_rate: u32,
    bit_depth: u16,
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Parses a whole WAV file held in memory.
///
/// Chunks are walked from the end of the RIFF header; odd-sized chunks are
/// followed by a pad byte. A `data` chunk that claims more bytes than the
/// file holds is clamped to what is actually there.
pub fn parse_wav(data: &[u8]) -> Result<WavData, FormatError> {
    if data.len() < WAV_HEADER_MIN {
        return Err(FormatError::TooSmall);
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(FormatError::NotRiff);
    }

    let mut fmt: Option<Fmt> = None;
    let mut pcm: Option<&[u8]> = None;
    let mut offset = 12;

    while offset + CHUNK_HEADER <= data.len() {
        let chunk_id = &data[offset..offset + 4];
        let chunk_size = read_u32(data, offset + 4) as usize;
        let body = offset + CHUNK_HEADER;

        if chunk_id == b"fmt " {
            if chunk_size < FMT_CHUNK_MIN || chunk_size > data.len() - body {
                return Err(FormatError::BadFmtChunk);
            }
            let audio_format = read_u16(data, body);
            if audio_format != FORMAT_PCM {
                return Err(FormatError::NotPcm(audio_format));
            }
            fmt = Some(Fmt {
                channels: read_u16(data, body + 2),
                sample_rate: read_u32(data, body + 4),
                bit_depth: read_u16(data, body + 14),
            });
        } else if chunk_id == b"data" {
            let len = chunk_size.min(data.len() - body);
            pcm = Some(&data[body..body + len]);
        }

        offset = body.saturating_add(chunk_size);
        if chunk_size % 2 != 0 {
            offset = offset.saturating_add(1);
        }
    }

    let (fmt, pcm) = match (fmt, pcm) {
        (Some(fmt), Some(pcm)) if !pcm.is_empty() => (fmt, pcm),
        _ => return Err(FormatError::MissingChunks),
    };

    if fmt.channels != 1 {
        return Err(FormatError::NotMono(fmt.channels));
    }
    if fmt.bit_depth != 8 && fmt.bit_depth != 16 {
        return Err(FormatError::UnsupportedBitDepth(fmt.bit_depth));
    }

    Ok(WavData {
        channels: fmt.channels,
        sample_rate: fmt.sample_rate,
        bit_depth: fmt.bit_depth,
        pcm: pcm.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a canonical 44-byte-header WAV around `pcm`.
    fn wav_bytes(format: u16, channels: u16, rate: u32, bits: u16, pcm: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + pcm.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&format.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        let block_align = channels * bits / 8;
        out.extend_from_slice(&(rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
        out.extend_from_slice(pcm);
        out
    }

    #[test]
    fn test_parse_mono_16bit() {
        let pcm = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let wav = parse_wav(&wav_bytes(1, 1, 44100, 16, &pcm)).unwrap();
        assert_eq!(wav.channels, 1);
        assert_eq!(wav.sample_rate, 44100);
        assert_eq!(wav.bit_depth, 16);
        assert_eq!(wav.pcm, pcm);
    }

    #[test]
    fn test_too_small() {
        assert_eq!(parse_wav(b"RIFF"), Err(FormatError::TooSmall));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = wav_bytes(1, 1, 8000, 8, &[0x80; 4]);
        bytes[8..12].copy_from_slice(b"AVI ");
        assert_eq!(parse_wav(&bytes), Err(FormatError::NotRiff));
    }

    #[test]
    fn test_rejects_non_pcm() {
        let bytes = wav_bytes(3, 1, 44100, 16, &[0; 8]);
        assert_eq!(parse_wav(&bytes), Err(FormatError::NotPcm(3)));
    }

    #[test]
    fn test_rejects_stereo() {
        let bytes = wav_bytes(1, 2, 44100, 16, &[0; 8]);
        assert_eq!(parse_wav(&bytes), Err(FormatError::NotMono(2)));
    }

    #[test]
    fn test_rejects_24bit() {
        let bytes = wav_bytes(1, 1, 44100, 24, &[0; 9]);
        assert_eq!(parse_wav(&bytes), Err(FormatError::UnsupportedBitDepth(24)));
    }

    #[test]
    fn test_fmt_chunk_overruns_file() {
        let mut bytes = wav_bytes(1, 1, 44100, 16, &[0; 8]);
        bytes[16..20].copy_from_slice(&1000u32.to_le_bytes());
        assert_eq!(parse_wav(&bytes), Err(FormatError::BadFmtChunk));
    }

    #[test]
    fn test_missing_data_chunk() {
        let mut bytes = wav_bytes(1, 1, 44100, 16, &[0; 8]);
        bytes[36..40].copy_from_slice(b"junk");
        assert_eq!(parse_wav(&bytes), Err(FormatError::MissingChunks));
    }

    #[test]
    fn test_truncated_data_is_clamped() {
        let mut bytes = wav_bytes(1, 1, 22050, 8, &[0x7F; 10]);
        bytes[40..44].copy_from_slice(&1000u32.to_le_bytes());
        let wav = parse_wav(&bytes).unwrap();
        assert_eq!(wav.pcm.len(), 10);
    }

    #[test]
    fn test_skips_odd_sized_chunk() {
        let pcm = [0x10, 0x20];
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 0]); // 3 bytes + pad
        let canonical = wav_bytes(1, 1, 8000, 8, &pcm);
        bytes.extend_from_slice(&canonical[12..]);

        let wav = parse_wav(&bytes).unwrap();
        assert_eq!(wav.bit_depth, 8);
        assert_eq!(wav.pcm, pcm);
    }
}
