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

//! Fixed layout of a Furnace 0.6.8.1 module (format version 228) driving a
//! single Generic PCM DAC.
//!
//! The two byte tables were taken from a reference module saved by Furnace
//! itself. Only the fields named by the `*_OFFSET` constants vary between
//! generated files.

/// File magic.
pub const MAGIC: &[u8; 16] = b"-Furnace module-";

/// Format version written to the file header and every instrument.
pub const FORMAT_VERSION: u16 = 228;

/// Header field holding the absolute offset of the INFO block.
pub const HEADER_INFO_POINTER_OFFSET: usize = 20;

/// Zero padding between the header and the INFO block.
pub const HEADER_PADDING: usize = 8;

/// Where the INFO block starts in every generated file.
pub const INFO_OFFSET: usize = 32;

// Block tags.
pub const TAG_INFO: &[u8; 4] = b"INFO";
pub const TAG_ASSET_DIRECTORY: &[u8; 4] = b"ADIR";
pub const TAG_INSTRUMENT: &[u8; 4] = b"INS2";
pub const TAG_SAMPLE: &[u8; 4] = b"SMP2";
pub const TAG_PATTERN: &[u8; 4] = b"PATN";

// =============================================================================
// INFO block
// =============================================================================

/// Chip id of the Generic PCM DAC.
pub const SYSTEM_PCM_DAC: u8 = 0xC0;

/// Chip slots in the INFO head.
pub const CHIP_SLOTS: usize = 32;

/// Default volume for every chip slot.
pub const CHIP_VOLUME: u8 = 0x40;

/// Zeroed run after the chip pannings (chip flag pointers and reserved).
pub const INFO_RESERVED_LEN: usize = 132;

/// Row highlight intervals.
pub const HIGHLIGHT_A: u8 = 4;
pub const HIGHLIGHT_B: u8 = 16;

/// Offsets of the variable INFO head fields, relative to the payload start.
pub const INFO_SPEED1_OFFSET: usize = 0x01;
pub const INFO_SPEED2_OFFSET: usize = 0x02;
pub const INFO_TICK_RATE_OFFSET: usize = 0x04;
pub const INFO_PATTERN_LEN_OFFSET: usize = 0x08;
pub const INFO_ORDERS_LEN_OFFSET: usize = 0x0A;
pub const INFO_INSTRUMENT_COUNT_OFFSET: usize = 0x0E;
pub const INFO_WAVETABLE_COUNT_OFFSET: usize = 0x10;
pub const INFO_SAMPLE_COUNT_OFFSET: usize = 0x12;
pub const INFO_PATTERN_COUNT_OFFSET: usize = 0x14;
pub const INFO_SYSTEMS_OFFSET: usize = 0x18;
pub const INFO_CONFIG_FLAGS_OFFSET: usize = 0xFC;

/// Length of the fixed INFO head; the pointer tables start here.
pub const INFO_HEAD_LEN: usize = 0x112;

/// Tuning, compatibility and linear pitch flags that close the INFO head.
pub const CONFIG_FLAGS: [u8; 22] = [
    0xDC, 0x43, 0x00, 0x02, 0x02, 0x01, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01,
];

/// Pointer table roles, in the order their tables follow the INFO head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerRole {
    Instrument = 0,
    Sample = 1,
    Pattern = 2,
}

/// Section written after the order table: effect column counts, speed
/// flags, virtual tempo, the chip name and channel setup, and the pointers
/// to the three asset directories.
pub const TRAILER: [u8; 260] = [
    0x01, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
    0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0x04, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x47, 0x65, 0x6E, 0x65, 0x72, 0x69, 0x63, 0x20, 0x50, 0x43, 0x4D, 0x20, 0x44, 0x41, 0x43, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x22, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0xD0,
    0xFF, 0x01, 0x00, 0xD0, 0xFF, 0x02, 0x00, 0xD0, 0xFF, 0x03, 0x00, 0xD0, 0xFF, 0x04, 0x00, 0xD0,
    0xFF, 0x05, 0x00, 0xD0, 0xFF, 0x06, 0x00, 0xD0, 0xFF, 0x07, 0x00, 0xD0, 0xFF, 0x08, 0x00, 0xD0,
    0xFF, 0x09, 0x00, 0xD0, 0xFF, 0x0A, 0x00, 0xD0, 0xFF, 0x0B, 0x00, 0xD0, 0xFF, 0x0C, 0x00, 0xD0,
    0xFF, 0x0D, 0x00, 0xD0, 0xFF, 0x0E, 0x00, 0xD0, 0xFF, 0x0F, 0x00, 0xD0, 0xFF, 0x00, 0x00, 0xE0,
    0xFF, 0x01, 0x00, 0xE0, 0xFF, 0x02, 0x00, 0xE0, 0xFF, 0x03, 0x00, 0xE0, 0xFF, 0x04, 0x00, 0xE0,
    0xFF, 0x05, 0x00, 0xE0, 0xFF, 0x06, 0x00, 0xE0, 0xFF, 0x07, 0x00, 0xE0, 0xFF, 0x08, 0x00, 0xE0,
    0xFF, 0x09, 0x00, 0xE0, 0xFF, 0x0A, 0x00, 0xE0, 0xFF, 0x0B, 0x00, 0xE0, 0xFF, 0x0C, 0x00, 0xE0,
    0xFF, 0x0D, 0x00, 0xE0, 0xFF, 0x0E, 0x00, 0xE0, 0xFF, 0x0F, 0x00, 0xE0, 0xFF, 0x01, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x04, 0x06, 0x06, 0x06, 0x06, 0x06, 0x06, 0x06, 0x06,
    0x06, 0x06, 0x06, 0x06, 0x06, 0x06, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00,
];

/// Trailer patch points.
pub const TRAILER_TEMPO_NUMERATOR_OFFSET: usize = 0x26;
pub const TRAILER_TEMPO_DENOMINATOR_OFFSET: usize = 0x28;
pub const TRAILER_INSTRUMENT_DIRECTORY_OFFSET: usize = 0xF8;
pub const TRAILER_WAVETABLE_DIRECTORY_OFFSET: usize = 0xFC;
pub const TRAILER_SAMPLE_DIRECTORY_OFFSET: usize = 0x100;

/// Length of an INFO payload for `count` slices.
pub const fn info_payload_len(count: usize) -> usize {
    INFO_HEAD_LEN + 3 * 4 * count + count + TRAILER.len()
}

// =============================================================================
// Instruments
// =============================================================================

/// Instrument type: sample.
pub const INSTRUMENT_TYPE_SAMPLE: u16 = 4;

/// Entries in the note-to-sample map and the note/velocity table.
pub const NOTE_MAP_ENTRIES: usize = 120;

/// Sample map header: note map enabled, fixed frequency off, sample-map mode.
pub const SAMPLE_MAP_HEADER: [u8; 4] = [0x00, 0x00, 0x01, 0x1F];

/// Note every sample map entry plays: C-4, the sample's natural pitch.
pub const NATURAL_PITCH_NOTE: u16 = 48;

/// Sample map feature length: header plus `(note, sample)` u16 pairs.
pub const SAMPLE_MAP_LEN: u16 = (SAMPLE_MAP_HEADER.len() + NOTE_MAP_ENTRIES * 4) as u16;

/// Note/velocity table entry.
pub const NOTE_ENTRY: [u8; 2] = [0x0F, 0xFF];

/// Note/velocity feature length: enable flag plus one entry per note.
pub const NOTE_TABLE_LEN: u16 = (1 + NOTE_MAP_ENTRIES * NOTE_ENTRY.len()) as u16;

// =============================================================================
// Samples
// =============================================================================

/// Loop start/end for a sample without a loop.
pub const NO_LOOP: i32 = -1;

/// Reserved sample fields, filled with [`SAMPLE_RESERVED_FILL`].
pub const SAMPLE_RESERVED_LEN: usize = 16;
pub const SAMPLE_RESERVED_FILL: u8 = 0xFF;

// =============================================================================
// Patterns
// =============================================================================

/// Row-data mask: note and instrument present.
pub const ROW_NOTE_AND_INSTRUMENT: u8 = 0x03;

/// Pattern note that plays the mapped sample unshifted (C-0 in pattern units).
pub const PATTERN_TRIGGER_NOTE: u8 = 60;

/// Ends a pattern's row data.
pub const ROW_END: u8 = 0xFF;

/// PATN payload: subsong, channel, index, then the one-event row data.
pub const PATTERN_PAYLOAD_LEN: u32 = 9;
