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

//! Module assembly and pointer resolution.
//!
//! Blocks are written strictly in file order. Every block that some earlier
//! placeholder refers to is recorded in a [`BlockOffset`] table as it is
//! written; once the last block is down the table is consumed to patch
//! every placeholder exactly once.

use tracing::{debug, info};

use super::blocks::{
    write_directory, write_header, write_info, write_instrument, write_pattern, write_sample,
    InfoSlots, SongInfo,
};
use super::buffer::OutputBuffer;
use super::layout::{
    PointerRole, TRAILER_INSTRUMENT_DIRECTORY_OFFSET, TRAILER_SAMPLE_DIRECTORY_OFFSET,
    TRAILER_WAVETABLE_DIRECTORY_OFFSET,
};
use crate::samples::SampleRecord;
use crate::tempo::VirtualTempo;

/// Kinds of block that are the target of a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Info,
    InstrumentDirectory,
    WavetableDirectory,
    SampleDirectory,
    Instrument,
    Sample,
    Pattern,
}

/// Where a block ended up in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOffset {
    pub kind: BlockKind,
    pub index: usize,
    pub offset: usize,
}

/// Progress notifications emitted while encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeEvent {
    /// About to write this many instruments.
    Instruments(usize),
    /// About to write this many samples.
    Samples(usize),
    /// Sample `number` (1-based) of `total` was written.
    SampleWritten {
        number: usize,
        total: usize,
        bytes: usize,
    },
}

/// Song parameters that are not derived from the slices.
#[derive(Debug, Clone, Copy)]
pub struct ModuleParams {
    pub pattern_rows: u16,
    pub tempo: VirtualTempo,
}

/// Builds the uncompressed module for `samples`, in order.
///
/// Each slice becomes instrument, sample, pattern and order `i`. The PCM of
/// a slice is released as soon as its sample block is written.
pub fn encode_module<F>(samples: Vec<SampleRecord>, params: ModuleParams, mut on_event: F) -> Vec<u8>
where
    F: FnMut(EncodeEvent),
{
    let count = samples.len();
    let mut buf = OutputBuffer::default();
    let mut offsets: Vec<BlockOffset> = Vec::with_capacity(4 + 3 * count);
    let mut record = |kind: BlockKind, index: usize, offset: usize| {
        offsets.push(BlockOffset {
            kind,
            index,
            offset,
        })
    };

    let info_pointer = write_header(&mut buf);

    let slots = write_info(
        &mut buf,
        &SongInfo {
            count,
            pattern_rows: params.pattern_rows,
            tempo: params.tempo,
        },
    );
    record(BlockKind::Info, 0, slots.start);

    record(
        BlockKind::InstrumentDirectory,
        0,
        write_directory(&mut buf, count),
    );
    record(BlockKind::WavetableDirectory, 0, write_directory(&mut buf, 0));
    record(BlockKind::SampleDirectory, 0, write_directory(&mut buf, count));

    on_event(EncodeEvent::Instruments(count));
    for (index, sample) in samples.iter().enumerate() {
        let offset = write_instrument(&mut buf, sample.name(), index as u16);
        record(BlockKind::Instrument, index, offset);
    }
    debug!(count, end = buf.len(), "Instruments written");

    on_event(EncodeEvent::Samples(count));
    for (index, sample) in samples.into_iter().enumerate() {
        let offset = write_sample(&mut buf, &sample);
        record(BlockKind::Sample, index, offset);
        on_event(EncodeEvent::SampleWritten {
            number: index + 1,
            total: count,
            bytes: sample.pcm().len(),
        });
    }

    for index in 0..count {
        let offset = write_pattern(&mut buf, index as u8);
        record(BlockKind::Pattern, index, offset);
    }

    resolve_pointers(&mut buf, info_pointer, &slots, offsets);

    info!(
        instruments = count,
        samples = count,
        patterns = count,
        bytes = buf.len(),
        "Module assembled"
    );
    buf.into_inner()
}

/// Patches every placeholder with the offset of the block it refers to.
///
/// Runs once, after all blocks have been written; `offsets` only ever holds
/// blocks that already exist.
pub fn resolve_pointers(
    buf: &mut OutputBuffer,
    info_pointer: usize,
    slots: &InfoSlots,
    offsets: Vec<BlockOffset>,
) {
    debug_assert_eq!(offsets.len(), 4 + 3 * slots.count);

    for BlockOffset {
        kind,
        index,
        offset,
    } in offsets
    {
        let slot = match kind {
            BlockKind::Info => info_pointer,
            BlockKind::InstrumentDirectory => slots.trailer + TRAILER_INSTRUMENT_DIRECTORY_OFFSET,
            BlockKind::WavetableDirectory => slots.trailer + TRAILER_WAVETABLE_DIRECTORY_OFFSET,
            BlockKind::SampleDirectory => slots.trailer + TRAILER_SAMPLE_DIRECTORY_OFFSET,
            BlockKind::Instrument => slots.pointer_slot(PointerRole::Instrument, index),
            BlockKind::Sample => slots.pointer_slot(PointerRole::Sample, index),
            BlockKind::Pattern => slots.pointer_slot(PointerRole::Pattern, index),
        };
        buf.patch_u32(slot, offset as u32);
    }
}
