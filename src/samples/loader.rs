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

//! Slice discovery and loading.
//!
//! Loading happens in two steps so progress can be reported per file: a scan
//! that only collects names, then a load that reads and validates each file.
//! The whole PCM payload of every slice is kept in memory until its sample
//! block has been written.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::wav::{parse_wav, WAV_EXTENSION};
use crate::error::Error;

/// A loaded slice, ready to be encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct SampleRecord {
    /// The on-disk file name. Determines ordering.
    file_name: String,
    /// The file name without its extension.
    name: String,
    /// Raw PCM bytes, untouched.
    pcm: Vec<u8>,
    /// Number of frames.
    sample_count: usize,
    sample_rate: u32,
    bit_depth: u16,
}

impl SampleRecord {
    /// Creates a record from a mono PCM payload.
    pub fn new(file_name: &str, sample_rate: u32, bit_depth: u16, pcm: Vec<u8>) -> SampleRecord {
        let bytes_per_sample = usize::from(bit_depth / 8).max(1);
        SampleRecord {
            file_name: file_name.to_string(),
            name: strip_extension(file_name).to_string(),
            sample_count: pcm.len() / bytes_per_sample,
            pcm,
            sample_rate,
            bit_depth,
        }
    }

    /// Gets the on-disk file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Gets the display name used for the sample and its instrument.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the raw PCM bytes.
    pub fn pcm(&self) -> &[u8] {
        &self.pcm
    }

    /// Gets the number of frames.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Gets the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Gets the bit depth (8 or 16).
    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }
}

impl std::fmt::Debug for SampleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleRecord")
            .field("file_name", &self.file_name)
            .field("sample_count", &self.sample_count)
            .field("sample_rate", &self.sample_rate)
            .field("bit_depth", &self.bit_depth)
            .field("pcm_bytes", &self.pcm.len())
            .finish()
    }
}

/// A slice found by the scan that has not been read yet.
#[derive(Debug, Clone)]
pub struct PendingSample {
    file_name: String,
    path: PathBuf,
}

impl PendingSample {
    /// Gets the on-disk file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Reads and validates the slice.
    pub fn load(self) -> Result<SampleRecord, Error> {
        let bytes = fs::read(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let wav = parse_wav(&bytes).map_err(|kind| Error::Format {
            path: self.path.clone(),
            kind,
        })?;

        let record = SampleRecord::new(&self.file_name, wav.sample_rate, wav.bit_depth, wav.pcm);
        debug!(
            path = ?self.path,
            frames = record.sample_count,
            sample_rate = record.sample_rate,
            bit_depth = record.bit_depth,
            "Slice loaded"
        );
        Ok(record)
    }
}

/// The outcome of scanning a slice directory.
#[derive(Debug)]
pub struct Scan {
    /// Slices to load, in encoding order.
    pub pending: Vec<PendingSample>,
    /// How many matching files were dropped for exceeding the limit.
    pub dropped: usize,
    /// `.wav` entries skipped because their names are not UTF-8.
    pub unreadable: usize,
}

/// Lists the `.wav` files in `dir`, sorted by name and capped at `max`.
///
/// Files past the cap are dropped with a warning. Finding no slices at all
/// is an error.
pub fn scan_directory(dir: &Path, max: usize) -> Result<Scan, Error> {
    let mut pending = Vec::new();
    let mut unreadable = 0;
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();

        let os_name = entry.file_name();
        let Some(file_name) = os_name.to_str().map(str::to_string) else {
            if is_slice_name(&os_name.to_string_lossy()) {
                warn!(path = ?path, "Skipping .wav file with a non UTF-8 name");
                unreadable += 1;
            }
            continue;
        };
        if !is_slice_name(&file_name) || !path.is_file() {
            continue;
        }

        pending.push(PendingSample { file_name, path });
    }

    if pending.is_empty() {
        return Err(Error::NoSamples(dir.to_path_buf()));
    }

    pending.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    let dropped = pending.len().saturating_sub(max);
    if dropped > 0 {
        warn!(
            max,
            dropped, "Maximum {} samples reached, skipping remaining files", max
        );
        pending.truncate(max);
    }

    info!(dir = ?dir, count = pending.len(), "Scanned slice directory");
    Ok(Scan {
        pending,
        dropped,
        unreadable,
    })
}

/// Scans and loads every slice in `dir`.
pub fn load_directory(dir: &Path, max: usize) -> Result<Vec<SampleRecord>, Error> {
    scan_directory(dir, max)?
        .pending
        .into_iter()
        .map(PendingSample::load)
        .collect()
}

/// Matches `<something>.wav`, extension case-insensitive.
fn is_slice_name(file_name: &str) -> bool {
    let bytes = file_name.as_bytes();
    let ext = WAV_EXTENSION.as_bytes();
    bytes.len() > ext.len() && bytes[bytes.len() - ext.len()..].eq_ignore_ascii_case(ext)
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::FormatError;
    use crate::testutil::{write_mono_wav, write_stereo_wav};

    #[test]
    fn test_is_slice_name() {
        assert!(is_slice_name("00.wav"));
        assert!(is_slice_name("kick.WAV"));
        assert!(is_slice_name("a.Wav"));
        assert!(!is_slice_name(".wav"));
        assert!(!is_slice_name("00.wave"));
        assert!(!is_slice_name("00.mp3"));
        assert!(!is_slice_name("wav"));
    }

    #[test]
    fn test_record_name_and_count() {
        let record = SampleRecord::new("snare.take2.wav", 44100, 16, vec![0; 10]);
        assert_eq!(record.name(), "snare.take2");
        assert_eq!(record.sample_count(), 5);

        let record = SampleRecord::new("hat.wav", 22050, 8, vec![0; 10]);
        assert_eq!(record.sample_count(), 10);
    }

    #[test]
    fn test_scan_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.wav", "A.WAV", "a.wav", "10.wav", "02.wav"] {
            write_mono_wav(&dir.path().join(name), 44100, 16, &[0, 1, 2]).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "not audio").unwrap();
        std::fs::create_dir(dir.path().join("folder.wav")).unwrap();

        let scan = scan_directory(dir.path(), 120).unwrap();
        let names: Vec<&str> = scan.pending.iter().map(|p| p.file_name()).collect();
        assert_eq!(names, vec!["02.wav", "10.wav", "A.WAV", "a.wav", "b.wav"]);
        assert_eq!(scan.dropped, 0);
    }

    #[test]
    fn test_scan_truncates_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        for i in (0..6).rev() {
            write_mono_wav(&dir.path().join(format!("{:02}.wav", i)), 8000, 8, &[0]).unwrap();
        }

        let scan = scan_directory(dir.path(), 4).unwrap();
        let names: Vec<&str> = scan.pending.iter().map(|p| p.file_name()).collect();
        assert_eq!(names, vec!["00.wav", "01.wav", "02.wav", "03.wav"]);
        assert_eq!(scan.dropped, 2);
    }

    #[test]
    fn test_scan_empty_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "nothing here").unwrap();
        assert!(matches!(
            scan_directory(dir.path(), 120),
            Err(Error::NoSamples(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_counts_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join(OsStr::from_bytes(b"kick\xFF.wav"));
        write_mono_wav(&bad, 44100, 16, &[0]).unwrap();
        write_mono_wav(&dir.path().join("snare.wav"), 44100, 16, &[0]).unwrap();

        let scan = scan_directory(dir.path(), 120).unwrap();
        assert_eq!(scan.pending.len(), 1);
        assert_eq!(scan.unreadable, 1);

        std::fs::remove_file(dir.path().join("snare.wav")).unwrap();
        assert!(matches!(
            scan_directory(dir.path(), 120),
            Err(Error::NoSamples(_))
        ));
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            scan_directory(&missing, 120),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_mono_wav(&dir.path().join("01.wav"), 44100, 16, &[1, -1, 2, -2]).unwrap();
        write_mono_wav(&dir.path().join("00.wav"), 22050, 8, &[10, 20, 30]).unwrap();

        let records = load_directory(dir.path(), 120).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name(), "00");
        assert_eq!(records[0].bit_depth(), 8);
        assert_eq!(records[0].sample_rate(), 22050);
        assert_eq!(records[0].sample_count(), 3);
        assert_eq!(records[0].pcm().len(), 3);

        assert_eq!(records[1].name(), "01");
        assert_eq!(records[1].bit_depth(), 16);
        assert_eq!(records[1].sample_count(), 4);
        assert_eq!(records[1].pcm(), &[1, 0, 0xFF, 0xFF, 2, 0, 0xFE, 0xFF]);
    }

    #[test]
    fn test_load_rejects_stereo() {
        let dir = tempfile::tempdir().unwrap();
        write_mono_wav(&dir.path().join("00.wav"), 44100, 16, &[0, 0]).unwrap();
        write_stereo_wav(&dir.path().join("01.wav"), 44100, &[0, 0, 0, 0]).unwrap();

        match load_directory(dir.path(), 120) {
            Err(Error::Format { path, kind }) => {
                assert!(path.ends_with("01.wav"));
                assert_eq!(kind, FormatError::NotMono(2));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }
}
