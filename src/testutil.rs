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

//! Fixture helpers shared by the unit tests.

use std::error::Error;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Writes a mono integer WAV. 8-bit files take the low byte of each sample.
pub fn write_mono_wav(
    path: &Path,
    sample_rate: u32,
    bits_per_sample: u16,
    samples: &[i16],
) -> Result<(), Box<dyn Error>> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample,
            sample_format: SampleFormat::Int,
        },
    )?;

    for &sample in samples {
        match bits_per_sample {
            8 => writer.write_sample(sample as i8)?,
            16 => writer.write_sample(sample)?,
            _ => return Err("Unsupported bit depth".into()),
        }
    }
    writer.finalize()?;

    Ok(())
}

/// Writes an interleaved 16-bit stereo WAV.
pub fn write_stereo_wav(
    path: &Path,
    sample_rate: u32,
    samples: &[i16],
) -> Result<(), Box<dyn Error>> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    )?;

    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}
