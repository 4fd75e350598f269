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

//! Inspection of written modules.
//!
//! [`parse_module`] walks a decompressed module image block by block and
//! collects what it finds into a [`ModuleSummary`]. [`check_module`] then
//! compares the summary against the layout the encoder promises: pointer
//! slots naming the right blocks, declared sizes matching the parsed
//! content, identity orders and one-to-one instrument sample maps.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use tracing::debug;

use crate::error::Error;
use crate::fur::layout::*;
use crate::tempo::TICK_RATE;

/// Failures that stop a module from being parsed at all.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("zlib decompress failed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("missing Furnace module magic")]
    BadMagic,

    #[error("unexpected end of data at offset {offset:#X} (needed {needed} bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("expected {expected} block at offset {offset:#X}, found {found:?}")]
    UnexpectedBlock {
        offset: usize,
        expected: &'static str,
        found: String,
    },
}

/// Little-endian reader bounded to a slice.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], pos: usize) -> Reader<'a> {
        Reader { data, pos }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], InspectError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(InspectError::Truncated {
                offset: self.pos,
                needed: n,
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, InspectError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, InspectError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, InspectError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> Result<i32, InspectError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// NUL-terminated string; the terminator is consumed.
    fn cstr(&mut self) -> Result<String, InspectError> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(InspectError::Truncated {
                offset: self.pos,
                needed: rest.len() + 1,
            })?;
        let text = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += len + 1;
        Ok(text)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn le_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// A block header found while walking the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSummary {
    pub tag: [u8; 4],
    pub offset: usize,
    pub size: u32,
}

impl BlockSummary {
    pub fn tag_name(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }

    fn payload_start(&self) -> usize {
        self.offset + 8
    }

    fn end(&self) -> usize {
        self.payload_start() + self.size as usize
    }
}

/// Song fields and pointer tables from the INFO block.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoSummary {
    pub speed: u8,
    pub tick_rate: f32,
    pub pattern_rows: u16,
    pub order_count: u16,
    pub instrument_count: u16,
    pub wavetable_count: u16,
    pub sample_count: u16,
    pub pattern_count: u16,
    pub system: u8,
    pub instrument_pointers: Vec<u32>,
    pub sample_pointers: Vec<u32>,
    pub pattern_pointers: Vec<u32>,
    pub orders: Vec<u8>,
    pub tempo_numerator: u16,
    pub tempo_denominator: u16,
    /// Instrument, wavetable and sample directory pointers.
    pub directory_pointers: [u32; 3],
    /// Payload bytes left over after the trailer.
    pub leftover: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySummary {
    pub offset: usize,
    pub groups: Vec<Vec<u8>>,
    pub leftover: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSummary {
    pub offset: usize,
    pub version: u16,
    pub kind: u16,
    pub name: String,
    /// `(note, sample)` pairs of the sample map.
    pub sample_map: Vec<(u16, u16)>,
    pub leftover: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSummary {
    pub offset: usize,
    pub name: String,
    pub sample_count: u32,
    pub rate: u32,
    pub bit_depth: u8,
    pub loop_start: i32,
    pub loop_end: i32,
    pub data_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSummary {
    pub offset: usize,
    pub index: u16,
    pub note: Option<u8>,
    pub instrument: Option<u8>,
    pub leftover: usize,
}

/// Everything read from a module image.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleSummary {
    pub version: u16,
    pub info_pointer: u32,
    pub info: InfoSummary,
    pub blocks: Vec<BlockSummary>,
    pub directories: Vec<DirectorySummary>,
    pub instruments: Vec<InstrumentSummary>,
    pub samples: Vec<SampleSummary>,
    pub patterns: Vec<PatternSummary>,
}

/// Inflates a compressed module.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, InspectError> {
    let mut image = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut image)
        .map_err(InspectError::Decompress)?;
    Ok(image)
}

/// Reads, inflates and parses the module at `path`.
pub fn inspect_file(path: &Path) -> Result<ModuleSummary, Error> {
    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    decompress(&data)
        .and_then(|image| parse_module(&image))
        .map_err(|source| Error::Inspect {
            path: path.to_path_buf(),
            source,
        })
}

/// Parses an uncompressed module image.
pub fn parse_module(data: &[u8]) -> Result<ModuleSummary, InspectError> {
    let mut reader = Reader::new(data, 0);
    if reader.take(MAGIC.len())? != MAGIC {
        return Err(InspectError::BadMagic);
    }
    let version = reader.u16()?;
    reader.take(2)?;
    let info_pointer = reader.u32()?;

    let blocks = walk_blocks(data, info_pointer as usize)?;
    let info_block = match blocks.first() {
        Some(block) if &block.tag == TAG_INFO => block,
        other => {
            return Err(InspectError::UnexpectedBlock {
                offset: info_pointer as usize,
                expected: "INFO",
                found: other.map(BlockSummary::tag_name).unwrap_or_default(),
            })
        }
    };
    let info = parse_info(data, info_block)?;

    let mut directories = Vec::new();
    let mut instruments = Vec::new();
    let mut samples = Vec::new();
    let mut patterns = Vec::new();
    for block in &blocks[1..] {
        match &block.tag {
            TAG_ASSET_DIRECTORY => directories.push(parse_directory(data, block)?),
            TAG_INSTRUMENT => instruments.push(parse_instrument(data, block)?),
            TAG_SAMPLE => samples.push(parse_sample(data, block)?),
            TAG_PATTERN => patterns.push(parse_pattern(data, block)?),
            _ => debug!(tag = %block.tag_name(), offset = block.offset, "Skipping unknown block"),
        }
    }

    Ok(ModuleSummary {
        version,
        info_pointer,
        info,
        blocks,
        directories,
        instruments,
        samples,
        patterns,
    })
}

/// Follows declared block sizes from `start` to the end of the image.
fn walk_blocks(data: &[u8], start: usize) -> Result<Vec<BlockSummary>, InspectError> {
    let mut reader = Reader::new(data, start);
    let mut blocks = Vec::new();
    while reader.remaining() > 0 {
        let offset = reader.pos;
        let tag = reader.take(4)?;
        let size = reader.u32()?;
        reader.take(size as usize)?;
        blocks.push(BlockSummary {
            tag: [tag[0], tag[1], tag[2], tag[3]],
            offset,
            size,
        });
    }
    Ok(blocks)
}

fn block_reader<'a>(data: &'a [u8], block: &BlockSummary) -> Reader<'a> {
    Reader::new(&data[..block.end()], block.payload_start())
}

fn parse_info(data: &[u8], block: &BlockSummary) -> Result<InfoSummary, InspectError> {
    let mut reader = block_reader(data, block);
    let head = reader.take(INFO_HEAD_LEN)?;

    let instrument_count = le_u16(head, INFO_INSTRUMENT_COUNT_OFFSET);
    let sample_count = le_u16(head, INFO_SAMPLE_COUNT_OFFSET);
    let pattern_count = le_u16(head, INFO_PATTERN_COUNT_OFFSET);
    let order_count = le_u16(head, INFO_ORDERS_LEN_OFFSET);

    let mut table = |count: u16| -> Result<Vec<u32>, InspectError> {
        (0..count).map(|_| reader.u32()).collect()
    };
    let instrument_pointers = table(instrument_count)?;
    let sample_pointers = table(sample_count)?;
    let pattern_pointers = table(pattern_count)?;

    let orders = reader.take(order_count as usize)?.to_vec();
    let trailer = reader.take(TRAILER.len())?;

    Ok(InfoSummary {
        speed: head[INFO_SPEED1_OFFSET],
        tick_rate: f32::from_bits(le_u32(head, INFO_TICK_RATE_OFFSET)),
        pattern_rows: le_u16(head, INFO_PATTERN_LEN_OFFSET),
        order_count,
        instrument_count,
        wavetable_count: le_u16(head, INFO_WAVETABLE_COUNT_OFFSET),
        sample_count,
        pattern_count,
        system: head[INFO_SYSTEMS_OFFSET],
        instrument_pointers,
        sample_pointers,
        pattern_pointers,
        orders,
        tempo_numerator: le_u16(trailer, TRAILER_TEMPO_NUMERATOR_OFFSET),
        tempo_denominator: le_u16(trailer, TRAILER_TEMPO_DENOMINATOR_OFFSET),
        directory_pointers: [
            le_u32(trailer, TRAILER_INSTRUMENT_DIRECTORY_OFFSET),
            le_u32(trailer, TRAILER_WAVETABLE_DIRECTORY_OFFSET),
            le_u32(trailer, TRAILER_SAMPLE_DIRECTORY_OFFSET),
        ],
        leftover: reader.remaining(),
    })
}

fn parse_directory(data: &[u8], block: &BlockSummary) -> Result<DirectorySummary, InspectError> {
    let mut reader = block_reader(data, block);
    let group_count = reader.u32()?;
    let mut groups = Vec::new();
    for _ in 0..group_count {
        reader.cstr()?; // group name
        let members = reader.u16()?;
        groups.push(reader.take(members as usize)?.to_vec());
    }
    Ok(DirectorySummary {
        offset: block.offset,
        groups,
        leftover: reader.remaining(),
    })
}

fn parse_instrument(data: &[u8], block: &BlockSummary) -> Result<InstrumentSummary, InspectError> {
    let mut reader = block_reader(data, block);
    let version = reader.u16()?;
    let kind = reader.u16()?;

    let mut name = String::new();
    let mut sample_map = Vec::new();
    loop {
        let code = reader.take(2)?;
        if code == b"EN" {
            break;
        }
        let len = reader.u16()?;
        let feature = reader.take(len as usize)?;
        match code {
            b"NA" => {
                let text = feature.strip_suffix(&[0]).unwrap_or(feature);
                name = String::from_utf8_lossy(text).into_owned();
            }
            b"SM" if feature.len() >= SAMPLE_MAP_HEADER.len() => {
                sample_map = feature[SAMPLE_MAP_HEADER.len()..]
                    .chunks_exact(4)
                    .map(|entry| (le_u16(entry, 0), le_u16(entry, 2)))
                    .collect();
            }
            _ => {}
        }
    }

    Ok(InstrumentSummary {
        offset: block.offset,
        version,
        kind,
        name,
        sample_map,
        leftover: reader.remaining(),
    })
}

fn parse_sample(data: &[u8], block: &BlockSummary) -> Result<SampleSummary, InspectError> {
    let mut reader = block_reader(data, block);
    let name = reader.cstr()?;
    let sample_count = reader.u32()?;
    reader.u32()?; // compat rate
    let rate = reader.u32()?;
    let bit_depth = reader.u8()?;
    reader.take(3)?; // loop mode, BRR emphasis, DPCM mode
    let loop_start = reader.i32()?;
    let loop_end = reader.i32()?;
    reader.take(SAMPLE_RESERVED_LEN)?;

    Ok(SampleSummary {
        offset: block.offset,
        name,
        sample_count,
        rate,
        bit_depth,
        loop_start,
        loop_end,
        data_len: reader.remaining(),
    })
}

fn parse_pattern(data: &[u8], block: &BlockSummary) -> Result<PatternSummary, InspectError> {
    let mut reader = block_reader(data, block);
    reader.u8()?; // subsong
    reader.u8()?; // channel
    let index = reader.u16()?;

    let mut note = None;
    let mut instrument = None;
    loop {
        let row = reader.u8()?;
        if row == ROW_END {
            break;
        }
        let mask = reader.u8()?;
        if mask & 0x01 != 0 {
            note = Some(reader.u8()?);
        }
        if mask & 0x02 != 0 {
            instrument = Some(reader.u8()?);
        }
    }

    Ok(PatternSummary {
        offset: block.offset,
        index,
        note,
        instrument,
        leftover: reader.remaining(),
    })
}

/// Severity level for an inspection issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single issue found in a module.
#[derive(Debug, Clone)]
pub struct Issue {
    pub severity: Severity,
    pub category: &'static str,
    pub message: String,
}

/// Result of checking a module.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub issues: Vec<Issue>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues.iter().filter(move |i| i.category == category)
    }

    fn error(&mut self, category: &'static str, message: String) {
        self.issues.push(Issue {
            severity: Severity::Error,
            category,
            message,
        });
    }

    fn warning(&mut self, category: &'static str, message: String) {
        self.issues.push(Issue {
            severity: Severity::Warning,
            category,
            message,
        });
    }
}

/// Checks a parsed module against the layout the encoder writes.
pub fn check_module(module: &ModuleSummary) -> VerificationReport {
    let mut report = VerificationReport::default();
    check_header(module, &mut report);
    check_counts(module, &mut report);
    check_pointers(module, &mut report);
    check_sizes(module, &mut report);
    check_orders(module, &mut report);
    check_tempo(module, &mut report);
    check_directories(module, &mut report);
    check_instruments(module, &mut report);
    check_patterns(module, &mut report);
    report
}

fn check_header(module: &ModuleSummary, report: &mut VerificationReport) {
    if module.version != FORMAT_VERSION {
        report.error(
            "header",
            format!("format version {} (expected {})", module.version, FORMAT_VERSION),
        );
    }
    if module.info_pointer as usize != INFO_OFFSET {
        report.error(
            "header",
            format!("INFO block at {:#X} (expected {:#X})", module.info_pointer, INFO_OFFSET),
        );
    }
    if module.info.system != SYSTEM_PCM_DAC {
        report.error(
            "header",
            format!("first chip is {:#04X}, not Generic PCM DAC", module.info.system),
        );
    }
}

fn check_counts(module: &ModuleSummary, report: &mut VerificationReport) {
    let info = &module.info;
    let declared = [
        ("instrument", info.instrument_count, module.instruments.len()),
        ("sample", info.sample_count, module.samples.len()),
        ("pattern", info.pattern_count, module.patterns.len()),
    ];
    for (what, count, found) in declared {
        if count != info.order_count {
            report.error(
                "counts",
                format!("{} count {} differs from order count {}", what, count, info.order_count),
            );
        }
        if count as usize != found {
            report.error(
                "counts",
                format!("INFO declares {} {} blocks, found {}", count, what, found),
            );
        }
    }
    if info.wavetable_count != 0 {
        report.error(
            "counts",
            format!("wavetable count is {}", info.wavetable_count),
        );
    }
    if module.directories.len() != 3 {
        report.error(
            "counts",
            format!("found {} asset directories (expected 3)", module.directories.len()),
        );
    }
}

fn check_table(
    report: &mut VerificationReport,
    what: &str,
    pointers: &[u32],
    offsets: impl Iterator<Item = usize>,
) {
    let offsets: Vec<usize> = offsets.collect();
    for (index, &pointer) in pointers.iter().enumerate() {
        match offsets.get(index) {
            Some(&offset) if offset == pointer as usize => {}
            Some(&offset) => report.error(
                "pointers",
                format!(
                    "{} pointer {} is {:#X}, block is at {:#X}",
                    what, index, pointer, offset
                ),
            ),
            None => report.error(
                "pointers",
                format!("{} pointer {} ({:#X}) has no block", what, index, pointer),
            ),
        }
    }
}

fn check_pointers(module: &ModuleSummary, report: &mut VerificationReport) {
    let info = &module.info;
    check_table(
        report,
        "instrument",
        &info.instrument_pointers,
        module.instruments.iter().map(|b| b.offset),
    );
    check_table(
        report,
        "sample",
        &info.sample_pointers,
        module.samples.iter().map(|b| b.offset),
    );
    check_table(
        report,
        "pattern",
        &info.pattern_pointers,
        module.patterns.iter().map(|b| b.offset),
    );
    check_table(
        report,
        "directory",
        &info.directory_pointers,
        module.directories.iter().map(|b| b.offset),
    );
}

fn check_sizes(module: &ModuleSummary, report: &mut VerificationReport) {
    let mut leftover = |what: &str, offset: usize, bytes: usize| {
        if bytes != 0 {
            report.error(
                "sizes",
                format!("{} block at {:#X} has {} unparsed bytes", what, offset, bytes),
            );
        }
    };
    leftover("INFO", module.info_pointer as usize, module.info.leftover);
    for dir in &module.directories {
        leftover("ADIR", dir.offset, dir.leftover);
    }
    for ins in &module.instruments {
        leftover("INS2", ins.offset, ins.leftover);
    }
    for pat in &module.patterns {
        leftover("PATN", pat.offset, pat.leftover);
    }

    for sample in &module.samples {
        let expected = sample.sample_count as usize * usize::from(sample.bit_depth / 8);
        if sample.data_len != expected {
            report.error(
                "sizes",
                format!(
                    "sample '{}' holds {} data bytes, {} frames of {}-bit need {}",
                    sample.name, sample.data_len, sample.sample_count, sample.bit_depth, expected
                ),
            );
        }
        if sample.loop_start != NO_LOOP || sample.loop_end != NO_LOOP {
            report.warning(
                "sizes",
                format!("sample '{}' has a loop", sample.name),
            );
        }
    }
}

fn check_orders(module: &ModuleSummary, report: &mut VerificationReport) {
    for (index, &order) in module.info.orders.iter().enumerate() {
        if order as usize != index {
            report.error(
                "orders",
                format!("order {} plays pattern {}", index, order),
            );
        }
    }
}

fn check_tempo(module: &ModuleSummary, report: &mut VerificationReport) {
    let info = &module.info;
    if info.tempo_denominator == 0 {
        report.error("tempo", "virtual tempo denominator is 0".to_string());
    }
    if info.speed == 0 {
        report.error("tempo", "speed is 0".to_string());
    }
    if info.tick_rate != f32::from(TICK_RATE) {
        report.warning(
            "tempo",
            format!("tick rate is {} (expected {})", info.tick_rate, TICK_RATE),
        );
    }
}

fn check_directories(module: &ModuleSummary, report: &mut VerificationReport) {
    let expected = [
        ("instrument", module.info.instrument_count as usize),
        ("wavetable", 0),
        ("sample", module.info.sample_count as usize),
    ];
    for ((what, count), dir) in expected.iter().zip(&module.directories) {
        let members: Vec<u8> = dir.groups.iter().flatten().copied().collect();
        let identity = members.iter().enumerate().all(|(i, &m)| m as usize == i);
        if members.len() != *count || !identity {
            report.error(
                "directories",
                format!("{} directory lists {:?}", what, members),
            );
        }
    }
}

fn check_instruments(module: &ModuleSummary, report: &mut VerificationReport) {
    for (index, ins) in module.instruments.iter().enumerate() {
        if ins.kind != INSTRUMENT_TYPE_SAMPLE {
            report.error(
                "instruments",
                format!("instrument {} has type {}", index, ins.kind),
            );
        }
        if ins.sample_map.len() != NOTE_MAP_ENTRIES {
            report.error(
                "instruments",
                format!(
                    "instrument {} maps {} notes (expected {})",
                    index,
                    ins.sample_map.len(),
                    NOTE_MAP_ENTRIES
                ),
            );
        }
        let stray = ins
            .sample_map
            .iter()
            .filter(|&&(note, sample)| note != NATURAL_PITCH_NOTE || sample as usize != index)
            .count();
        if stray > 0 {
            report.error(
                "instruments",
                format!("instrument {} has {} entries not playing sample {}", index, stray, index),
            );
        }
        if let Some(sample) = module.samples.get(index) {
            if sample.name != ins.name {
                report.warning(
                    "instruments",
                    format!(
                        "instrument {} is named '{}', sample is '{}'",
                        index, ins.name, sample.name
                    ),
                );
            }
        }
    }
}

fn check_patterns(module: &ModuleSummary, report: &mut VerificationReport) {
    for (index, pat) in module.patterns.iter().enumerate() {
        let expected = (
            index,
            Some(PATTERN_TRIGGER_NOTE),
            Some(index as u8),
        );
        if (pat.index as usize, pat.note, pat.instrument) != expected {
            report.error(
                "patterns",
                format!(
                    "pattern {} is index {} with note {:?} and instrument {:?}",
                    index, pat.index, pat.note, pat.instrument
                ),
            );
        }
    }
}

/// Prints a verification report grouped by category.
pub fn print_report(report: &VerificationReport, path: &Path) {
    if report.is_clean() {
        println!("\u{2705} '{}' passed verification.", path.display());
        return;
    }

    let mut by_category: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
    for issue in &report.issues {
        by_category.entry(issue.category).or_default().push(issue);
    }

    let icon = if report.has_errors() {
        "\u{274c}"
    } else {
        "\u{26a0}\u{fe0f} "
    };
    println!("{} {}", icon, path.display());
    for (category, issues) in &by_category {
        for issue in issues {
            let severity_icon = match issue.severity {
                Severity::Warning => "\u{26a0}\u{fe0f} ",
                Severity::Error => "\u{274c}",
            };
            println!("   {} [{}] {}", severity_icon, category, issue.message);
        }
    }

    println!(
        "\nSummary: {} issue(s) found in {} categor{}.",
        report.issues.len(),
        by_category.len(),
        if by_category.len() == 1 { "y" } else { "ies" }
    );
}
