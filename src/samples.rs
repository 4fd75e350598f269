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

//! WAV slice discovery and loading.
//!
//! This module provides:
//! - Directory scanning with deterministic, byte-wise name ordering
//! - A minimal RIFF/WAVE reader that keeps PCM bytes untouched
//! - Validation of the mono, 8/16-bit constraint the PCM DAC imposes

mod loader;
mod wav;

pub use loader::{load_directory, scan_directory, PendingSample, SampleRecord, Scan};
pub use wav::{parse_wav, FormatError, WavData, WAV_EXTENSION};

/// Most slices a `.fur` module can hold: one per sample map entry.
pub const MAX_FUR_SAMPLES: usize = 120;

/// Most slices the text export accepts.
pub const MAX_TEXT_SAMPLES: usize = 256;
