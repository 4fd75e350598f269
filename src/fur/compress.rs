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

//! Whole-buffer zlib compression.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

/// The compression stream reported a failure. No output is written when
/// this happens.
#[derive(Debug, thiserror::Error)]
#[error("zlib compress failed: {0}")]
pub struct CompressionError(#[from] std::io::Error);

/// Upper bound of the zlib stream for `len` input bytes, used to size the
/// staging buffer up front.
pub fn compress_bound(len: usize) -> usize {
    len + (len >> 12) + (len >> 14) + (len >> 25) + 13
}

/// Compresses `data` into a zlib stream at the default level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(compress_bound(data.len())),
        Compression::default(),
    );
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
