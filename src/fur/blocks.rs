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

//! Block encoders.
//!
//! Each encoder appends one block at the end of the buffer and returns the
//! offset of its tag. Pointers to other blocks are left as zeroed
//! placeholders; their locations are returned so the encoder can patch
//! them once the targets exist.

use super::buffer::OutputBuffer;
use super::layout::*;
use crate::samples::SampleRecord;
use crate::tempo::VirtualTempo;

/// Song-level values stored in the INFO block.
#[derive(Debug, Clone, Copy)]
pub struct SongInfo {
    /// Number of slices; also the instrument, sample, pattern and order count.
    pub count: usize,
    pub pattern_rows: u16,
    pub tempo: VirtualTempo,
}

/// Placeholder locations inside a written INFO block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoSlots {
    /// Offset of the INFO tag.
    pub start: usize,
    /// First instrument pointer; sample and pattern tables follow.
    pub pointer_table: usize,
    /// Start of the trailer section.
    pub trailer: usize,
    /// Entries per pointer table.
    pub count: usize,
}

impl InfoSlots {
    /// Slot holding the pointer to the `index`th block of `role`.
    pub fn pointer_slot(&self, role: PointerRole, index: usize) -> usize {
        self.pointer_table + 4 * self.count * role as usize + 4 * index
    }
}

/// Writes the file header and padding. Returns the INFO pointer slot.
pub fn write_header(buf: &mut OutputBuffer) -> usize {
    buf.write_bytes(MAGIC);
    buf.write_u16(FORMAT_VERSION);
    buf.write_u16(0);
    let info_pointer = buf.reserve(4);
    buf.write_zeros(HEADER_PADDING);
    info_pointer
}

/// Writes the INFO block: song head, pointer tables, order list and trailer.
pub fn write_info(buf: &mut OutputBuffer, info: &SongInfo) -> InfoSlots {
    let count = info.count as u16;
    let block = buf.begin_block(TAG_INFO);

    buf.write_u8(0); // time base
    buf.write_u8(info.tempo.speed);
    buf.write_u8(info.tempo.speed);
    buf.write_u8(1); // arpeggio speed
    buf.write_f32(f32::from(info.tempo.tick_rate));
    buf.write_u16(info.pattern_rows);
    buf.write_u16(count); // orders
    buf.write_u8(HIGHLIGHT_A);
    buf.write_u8(HIGHLIGHT_B);
    buf.write_u16(count); // instruments
    buf.write_u16(0); // wavetables
    buf.write_u16(count); // samples
    buf.write_u16(count); // patterns
    buf.write_u16(0);

    buf.write_u8(SYSTEM_PCM_DAC);
    buf.write_zeros(CHIP_SLOTS - 1);
    buf.write_fill(CHIP_VOLUME, CHIP_SLOTS);
    buf.write_zeros(CHIP_SLOTS); // pannings
    buf.write_zeros(INFO_RESERVED_LEN);
    buf.write_bytes(&CONFIG_FLAGS);

    let pointer_table = buf.reserve(3 * 4 * info.count);

    for order in 0..info.count {
        buf.write_u8(order as u8);
    }

    let trailer = buf.len();
    buf.write_bytes(&TRAILER);
    buf.patch_u16(
        trailer + TRAILER_TEMPO_NUMERATOR_OFFSET,
        info.tempo.numerator,
    );
    buf.patch_u16(
        trailer + TRAILER_TEMPO_DENOMINATOR_OFFSET,
        info.tempo.denominator,
    );

    let start = buf.end_block(block);
    InfoSlots {
        start,
        pointer_table,
        trailer,
        count: info.count,
    }
}

/// Writes an asset directory listing `count` assets in a single group.
///
/// The group starts at asset 0 and lists the remaining members explicitly.
/// An empty directory has no groups.
pub fn write_directory(buf: &mut OutputBuffer, count: usize) -> usize {
    let block = buf.begin_block(TAG_ASSET_DIRECTORY);
    if count == 0 {
        buf.write_u32(0);
    } else {
        buf.write_u32(1);
        buf.write_u8(0);
        buf.write_u8(count as u8);
        buf.write_u16(0);
        for member in 1..count {
            buf.write_u8(member as u8);
        }
    }
    buf.end_block(block)
}

/// Writes a sample instrument that plays `sample_index` at its natural pitch
/// on every note.
pub fn write_instrument(buf: &mut OutputBuffer, name: &str, sample_index: u16) -> usize {
    let block = buf.begin_block(TAG_INSTRUMENT);

    buf.write_u16(FORMAT_VERSION);
    buf.write_u16(INSTRUMENT_TYPE_SAMPLE);

    buf.write_bytes(b"NA");
    buf.write_u16((name.len() + 1) as u16);
    buf.write_str(name);

    buf.write_bytes(b"SM");
    buf.write_u16(SAMPLE_MAP_LEN);
    buf.write_bytes(&SAMPLE_MAP_HEADER);
    for _ in 0..NOTE_MAP_ENTRIES {
        buf.write_u16(NATURAL_PITCH_NOTE);
        buf.write_u16(sample_index);
    }

    buf.write_bytes(b"NE");
    buf.write_u16(NOTE_TABLE_LEN);
    buf.write_u8(1);
    for _ in 0..NOTE_MAP_ENTRIES {
        buf.write_bytes(&NOTE_ENTRY);
    }

    buf.write_bytes(b"EN");
    buf.end_block(block)
}

/// Writes a sample header followed by its PCM bytes, verbatim.
pub fn write_sample(buf: &mut OutputBuffer, sample: &SampleRecord) -> usize {
    let block = buf.begin_block(TAG_SAMPLE);

    buf.write_str(sample.name());
    buf.write_u32(sample.sample_count() as u32);
    buf.write_u32(sample.sample_rate()); // compat rate
    buf.write_u32(sample.sample_rate()); // C-4 rate
    buf.write_u8(sample.bit_depth() as u8);
    buf.write_u8(0); // loop mode
    buf.write_u8(1); // BRR emphasis
    buf.write_u8(0); // DPCM mode
    buf.write_i32(NO_LOOP);
    buf.write_i32(NO_LOOP);
    buf.write_fill(SAMPLE_RESERVED_FILL, SAMPLE_RESERVED_LEN);
    buf.write_bytes(sample.pcm());

    buf.end_block(block)
}

/// Writes pattern `index` of channel 0: row 0 triggers instrument `index`.
pub fn write_pattern(buf: &mut OutputBuffer, index: u8) -> usize {
    let block = buf.begin_block(TAG_PATTERN);

    buf.write_u8(0); // subsong
    buf.write_u8(0); // channel
    buf.write_u16(u16::from(index));

    buf.write_u8(0); // row
    buf.write_u8(ROW_NOTE_AND_INSTRUMENT);
    buf.write_u8(PATTERN_TRIGGER_NOTE);
    buf.write_u8(index);
    buf.write_u8(ROW_END);

    buf.end_block(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_header() {
        let mut buf = OutputBuffer::with_capacity(64);
        let slot = write_header(&mut buf);
        assert_eq!(slot, HEADER_INFO_POINTER_OFFSET);
        assert_eq!(buf.len(), INFO_OFFSET);
        assert_eq!(&buf.as_slice()[..16], MAGIC);
        assert_eq!(read_u16(buf.as_slice(), 16), 228);
    }

    #[test]
    fn test_info_layout() {
        let mut buf = OutputBuffer::with_capacity(64);
        let info = SongInfo {
            count: 3,
            pattern_rows: 128,
            tempo: VirtualTempo::new(139.0, 4),
        };
        let slots = write_info(&mut buf, &info);
        let bytes = buf.as_slice();
        let payload = 8;

        assert_eq!(slots.start, 0);
        assert_eq!(&bytes[..4], TAG_INFO);
        assert_eq!(read_u32(bytes, 4) as usize, info_payload_len(3));
        assert_eq!(bytes.len(), payload + info_payload_len(3));

        assert_eq!(bytes[payload + INFO_SPEED1_OFFSET], 4);
        assert_eq!(bytes[payload + INFO_SPEED2_OFFSET], 4);
        assert_eq!(
            &bytes[payload + INFO_TICK_RATE_OFFSET..payload + INFO_TICK_RATE_OFFSET + 4],
            &60.0f32.to_le_bytes()
        );
        assert_eq!(read_u16(bytes, payload + INFO_PATTERN_LEN_OFFSET), 128);
        assert_eq!(read_u16(bytes, payload + INFO_ORDERS_LEN_OFFSET), 3);
        assert_eq!(read_u16(bytes, payload + INFO_INSTRUMENT_COUNT_OFFSET), 3);
        assert_eq!(read_u16(bytes, payload + INFO_WAVETABLE_COUNT_OFFSET), 0);
        assert_eq!(read_u16(bytes, payload + INFO_SAMPLE_COUNT_OFFSET), 3);
        assert_eq!(read_u16(bytes, payload + INFO_PATTERN_COUNT_OFFSET), 3);
        assert_eq!(bytes[payload + INFO_SYSTEMS_OFFSET], SYSTEM_PCM_DAC);
        assert_eq!(
            &bytes[payload + INFO_CONFIG_FLAGS_OFFSET..payload + INFO_HEAD_LEN],
            &CONFIG_FLAGS
        );

        assert_eq!(slots.pointer_table, payload + INFO_HEAD_LEN);
        assert!(bytes[slots.pointer_table..slots.pointer_table + 36]
            .iter()
            .all(|&b| b == 0));
        assert_eq!(&bytes[slots.trailer - 3..slots.trailer], &[0, 1, 2]);

        assert_eq!(read_u16(bytes, slots.trailer + TRAILER_TEMPO_NUMERATOR_OFFSET), 139);
        assert_eq!(read_u16(bytes, slots.trailer + TRAILER_TEMPO_DENOMINATOR_OFFSET), 225);
    }

    #[test]
    fn test_pointer_slots() {
        let slots = InfoSlots {
            start: 32,
            pointer_table: 100,
            trailer: 500,
            count: 5,
        };
        assert_eq!(slots.pointer_slot(PointerRole::Instrument, 0), 100);
        assert_eq!(slots.pointer_slot(PointerRole::Instrument, 4), 116);
        assert_eq!(slots.pointer_slot(PointerRole::Sample, 0), 120);
        assert_eq!(slots.pointer_slot(PointerRole::Pattern, 2), 148);
    }

    #[test]
    fn test_directory() {
        let mut buf = OutputBuffer::with_capacity(64);
        write_directory(&mut buf, 4);
        assert_eq!(
            buf.as_slice(),
            &[b'A', b'D', b'I', b'R', 11, 0, 0, 0, 1, 0, 0, 0, 0, 4, 0, 0, 1, 2, 3]
        );

        let mut buf = OutputBuffer::with_capacity(64);
        write_directory(&mut buf, 1);
        assert_eq!(read_u32(buf.as_slice(), 4), 8);

        let mut buf = OutputBuffer::with_capacity(64);
        write_directory(&mut buf, 0);
        assert_eq!(buf.as_slice(), b"ADIR\x04\0\0\0\0\0\0\0");
    }

    #[test]
    fn test_instrument() {
        let mut buf = OutputBuffer::with_capacity(64);
        buf.write_zeros(5);
        let start = write_instrument(&mut buf, "kick", 7);
        let bytes = buf.as_slice();

        assert_eq!(start, 5);
        assert_eq!(&bytes[5..9], TAG_INSTRUMENT);
        let payload = 13;
        assert_eq!(read_u32(bytes, 9) as usize, bytes.len() - payload);
        assert_eq!(read_u16(bytes, payload), FORMAT_VERSION);
        assert_eq!(read_u16(bytes, payload + 2), INSTRUMENT_TYPE_SAMPLE);
        assert_eq!(&bytes[payload + 4..payload + 6], b"NA");
        assert_eq!(read_u16(bytes, payload + 6), 5);
        assert_eq!(&bytes[payload + 8..payload + 13], b"kick\0");

        let map = payload + 13;
        assert_eq!(&bytes[map..map + 2], b"SM");
        assert_eq!(read_u16(bytes, map + 2), 484);
        let entries = map + 8;
        for i in 0..NOTE_MAP_ENTRIES {
            assert_eq!(read_u16(bytes, entries + i * 4), 48);
            assert_eq!(read_u16(bytes, entries + i * 4 + 2), 7);
        }

        let notes = map + 4 + 484;
        assert_eq!(&bytes[notes..notes + 2], b"NE");
        assert_eq!(read_u16(bytes, notes + 2), 241);
        assert_eq!(bytes[notes + 4], 1);
        assert_eq!(&bytes[notes + 5..notes + 7], &[0x0F, 0xFF]);
        assert_eq!(&bytes[bytes.len() - 2..], b"EN");
        assert_eq!(bytes.len(), notes + 4 + 241 + 2);
    }

    #[test]
    fn test_sample() {
        let record = SampleRecord::new("snare.wav", 44100, 16, vec![1, 2, 3, 4]);
        let mut buf = OutputBuffer::with_capacity(64);
        write_sample(&mut buf, &record);
        let bytes = buf.as_slice();

        assert_eq!(&bytes[..4], TAG_SAMPLE);
        assert_eq!(read_u32(bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..14], b"snare\0");
        assert_eq!(read_u32(bytes, 14), 2);
        assert_eq!(read_u32(bytes, 18), 44100);
        assert_eq!(read_u32(bytes, 22), 44100);
        assert_eq!(&bytes[26..30], &[16, 0, 1, 0]);
        assert_eq!(&bytes[30..38], &[0xFF; 8]);
        assert_eq!(&bytes[38..54], &[0xFF; 16]);
        assert_eq!(&bytes[54..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_pattern() {
        let mut buf = OutputBuffer::with_capacity(64);
        write_pattern(&mut buf, 5);
        assert_eq!(
            buf.as_slice(),
            &[b'P', b'A', b'T', b'N', 9, 0, 0, 0, 0, 0, 5, 0, 0, 0x03, 60, 5, 0xFF]
        );
        assert_eq!(PATTERN_PAYLOAD_LEN as usize, buf.len() - 8);
    }
}
