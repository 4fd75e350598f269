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

//! Furnace text export.
//!
//! Renders the same kit as the binary writer in the Markdown-like text
//! format Furnace 0.6.8.1 produces from "export text". Unlike the binary
//! module, the kit is a single instrument and each pattern plays slice `i`
//! through note `i` of that instrument.

use std::io::{self, Write};

use crate::samples::SampleRecord;
use crate::tempo::VirtualTempo;

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// Bytes per hex dump line.
const HEX_DUMP_WIDTH: usize = 16;

/// Note name for a chromatic index, starting at C-0.
pub fn note_name(index: usize) -> String {
    format!("{}{}", NOTE_NAMES[index % 12], index / 12)
}

/// Song parameters shown in the export.
#[derive(Debug, Clone, Copy)]
pub struct TextParams<'a> {
    pub kit_name: &'a str,
    pub pattern_rows: u16,
    pub tempo: VirtualTempo,
}

/// Writes the export. `on_sample` is called with the 1-based number of each
/// sample section once it has been written.
pub fn write_text_export<W, F>(
    out: &mut W,
    samples: &[SampleRecord],
    params: &TextParams<'_>,
    mut on_sample: F,
) -> io::Result<()>
where
    W: Write,
    F: FnMut(usize, usize),
{
    let count = samples.len();

    write!(out, "# Furnace Text Export\n\n")?;
    write!(out, "generated by Furnace 0.6.8.1 (228)\n\n")?;

    write!(out, "# Song Information\n\n")?;
    writeln!(out, "- name: ")?;
    writeln!(out, "- author: ")?;
    writeln!(out, "- album: ")?;
    writeln!(out, "- system: Generic PCM DAC")?;
    write!(out, "- tuning: 440\n\n")?;
    writeln!(out, "- instruments: 1")?;
    writeln!(out, "- wavetables: 0")?;
    write!(out, "- samples: {}\n\n", count)?;

    write!(out, "# Sound Chips\n\n")?;
    writeln!(out, "- Generic PCM DAC")?;
    writeln!(out, "  - id: 56")?;
    writeln!(out, "  - volume: 1")?;
    writeln!(out, "  - panning: 0")?;
    write!(out, "  - front/rear: 0\n\n")?;

    write!(out, "# Instruments\n\n")?;
    write!(out, "## 00: {}\n\n", params.kit_name)?;
    write!(out, "- type: 4\n\n\n")?;

    write!(out, "# Wavetables\n\n\n")?;

    write!(out, "# Samples\n\n")?;
    for (index, sample) in samples.iter().enumerate() {
        write_sample_section(out, index, sample)?;
        on_sample(index + 1, count);
    }

    write!(out, "# Subsongs\n\n")?;
    write!(out, "## 0: \n\n")?;
    writeln!(out, "- tick rate: {}", params.tempo.tick_rate)?;
    writeln!(out, "- speeds: {}", params.tempo.speed)?;
    writeln!(out, "- virtual tempo: {}", params.tempo)?;
    writeln!(out, "- time base: 0")?;
    write!(out, "- pattern length: {}\n\n", params.pattern_rows)?;

    writeln!(out, "orders:")?;
    writeln!(out, "```")?;
    for order in 0..count {
        writeln!(out, "{:02X} | {:02X}", order, order)?;
    }
    write!(out, "```\n\n")?;

    write!(out, "## Patterns\n\n")?;
    for order in 0..count {
        writeln!(out, "----- ORDER {:02X}", order)?;
        writeln!(out, "00 |{} 00 .. ....", note_name(order))?;
        for row in 1..params.pattern_rows {
            writeln!(out, "{:02X} |... .. .. ....", row)?;
        }
    }

    Ok(())
}

fn write_sample_section<W: Write>(out: &mut W, index: usize, sample: &SampleRecord) -> io::Result<()> {
    write!(out, "## {:02X}: {}\n\n", index, sample.name())?;
    writeln!(out, "- format: {}", sample.bit_depth())?;
    writeln!(out, "- data length: {}", sample.pcm().len())?;
    writeln!(out, "- samples: {}", sample.sample_count())?;
    writeln!(out, "- rate: {}", sample.sample_rate())?;
    writeln!(out, "- compat rate: {}", sample.sample_rate())?;
    writeln!(out, "- loop: no")?;
    writeln!(out, "- BRR emphasis: yes")?;
    writeln!(out, "- no BRR filters: no")?;
    write!(out, "- dither: no\n\n")?;

    writeln!(out, "```")?;
    write_hex_dump(out, sample.pcm())?;
    write!(out, "```\n\n\n")
}

/// Offset-prefixed hex dump, 16 bytes per line.
fn write_hex_dump<W: Write>(out: &mut W, data: &[u8]) -> io::Result<()> {
    for (line, chunk) in data.chunks(HEX_DUMP_WIDTH).enumerate() {
        write!(out, "{:08X}:", line * HEX_DUMP_WIDTH)?;
        for byte in chunk {
            write!(out, " {:02X}", byte)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
