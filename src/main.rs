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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{crate_version, Parser};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use slicefur::config::Settings;
use slicefur::fur::{compress, encode_module, write_module, EncodeEvent, ModuleParams};
use slicefur::samples::{scan_directory, SampleRecord, MAX_FUR_SAMPLES, MAX_TEXT_SAMPLES};
use slicefur::tempo::VirtualTempo;
use slicefur::text::{write_text_export, TextParams};
use slicefur::verify::{check_module, inspect_file, print_report};
use slicefur::Error;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Packs a directory of mono WAV slices into a Furnace module."
)]
struct Cli {
    /// Directory holding the .wav slices.
    input_dir: PathBuf,
    /// Song tempo in beats per minute.
    bpm: f64,
    /// Pattern rows per beat; also the song speed.
    #[arg(value_parser = clap::value_parser!(u8).range(1..))]
    rows_per_beat: u8,
    /// Rows in each pattern.
    #[arg(value_parser = clap::value_parser!(u16).range(1..=256))]
    pattern_rows: u16,
    /// Where to write the module.
    output_file: PathBuf,
    /// Write a Furnace text export instead of a .fur module.
    #[arg(long)]
    text: bool,
    /// Instrument name used by the text export.
    #[arg(long)]
    kit_name: Option<String>,
    /// Optional settings file (YAML or TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Re-read the written module and check its structure.
    #[arg(long)]
    verify: bool,
}

/// The virtual tempo numerator is a u16.
const BPM_LIMIT: f64 = 65536.0;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if is_informational(err.kind()) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
            let _ = err.print();
            return code;
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Help and version requests end the run successfully.
fn is_informational(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn validate_bpm(bpm: f64) -> Result<(), Error> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(Error::Argument(format!(
            "BPM must be a positive number, got {}",
            bpm
        )));
    }
    if bpm >= BPM_LIMIT {
        return Err(Error::Argument(format!(
            "BPM must be below {}, got {}",
            BPM_LIMIT, bpm
        )));
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Error> {
    validate_bpm(cli.bpm)?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(kit_name) = cli.kit_name.clone() {
        settings.set_kit_name(kit_name);
    }
    if cli.verify {
        settings.enable_verify();
    }

    let tempo = VirtualTempo::new(cli.bpm, cli.rows_per_beat);
    if tempo.denominator == 0 {
        warn!(
            rows_per_beat = cli.rows_per_beat,
            "Virtual tempo denominator rounds to 0; Furnace will not play this song"
        );
    }

    if cli.text {
        let limit = settings.sample_limit(MAX_TEXT_SAMPLES)?;
        let samples = read_samples(&cli.input_dir, limit)?;
        write_text(&cli, &settings, &samples, tempo)
    } else {
        let limit = settings.sample_limit(MAX_FUR_SAMPLES)?;
        let samples = read_samples(&cli.input_dir, limit)?;
        write_fur(&cli, &settings, samples, tempo)
    }
}

/// Loads the slices in name order, printing one line per file.
fn read_samples(dir: &Path, limit: usize) -> Result<Vec<SampleRecord>, Error> {
    let scan = scan_directory(dir, limit)?;
    println!(
        "Reading {} WAV files from '{}'...",
        scan.pending.len(),
        dir.display()
    );

    let mut samples = Vec::with_capacity(scan.pending.len());
    for (index, pending) in scan.pending.into_iter().enumerate() {
        let sample = pending.load()?;
        println!(
            "  [{:02X}] {} ({} samples, {} Hz, {}-bit)",
            index,
            sample.file_name(),
            sample.sample_count(),
            sample.sample_rate(),
            sample.bit_depth()
        );
        samples.push(sample);
    }
    Ok(samples)
}

fn write_fur(
    cli: &Cli,
    settings: &Settings,
    samples: Vec<SampleRecord>,
    tempo: VirtualTempo,
) -> Result<(), Error> {
    let count = samples.len();
    println!("Virtual tempo: {} (BPM={:.1})", tempo, cli.bpm);

    let image = encode_module(
        samples,
        ModuleParams {
            pattern_rows: cli.pattern_rows,
            tempo,
        },
        |event| match event {
            EncodeEvent::Instruments(n) => println!("Writing {} instruments...", n),
            EncodeEvent::Samples(n) => println!("Writing {} samples...", n),
            EncodeEvent::SampleWritten {
                number,
                total,
                bytes,
            } => println!("  Sample {}/{} written ({} bytes).", number, total, bytes),
        },
    );
    println!("Uncompressed size: {} bytes", image.len());

    let compressed = compress(&image)?;
    drop(image);
    println!("Compressed size: {} bytes", compressed.len());

    write_module(&cli.output_file, &compressed)?;
    println!(
        "Furnace .fur file written to: {}",
        cli.output_file.display()
    );
    println!(
        "  {} instruments, {} samples, {} orders, speed={}, virtual tempo={}",
        count, count, count, tempo.speed, tempo
    );

    if settings.verify() {
        let module = inspect_file(&cli.output_file)?;
        let report = check_module(&module);
        print_report(&report, &cli.output_file);
        if report.has_errors() {
            return Err(Error::Verification(cli.output_file.clone()));
        }
    }
    Ok(())
}

fn write_text(
    cli: &Cli,
    settings: &Settings,
    samples: &[SampleRecord],
    tempo: VirtualTempo,
) -> Result<(), Error> {
    let path = &cli.output_file;
    println!("Generating Furnace text export...");

    let file = File::create(path).map_err(|e| Error::write(path, e))?;
    let mut out = BufWriter::new(file);
    write_text_export(
        &mut out,
        samples,
        &TextParams {
            kit_name: settings.kit_name(),
            pattern_rows: cli.pattern_rows,
            tempo,
        },
        |number, total| println!("  Sample {}/{} written.", number, total),
    )
    .and_then(|()| out.flush())
    .map_err(|e| Error::write(path, e))?;

    if settings.verify() {
        warn!("--verify only applies to .fur output");
    }

    println!("Furnace text export written to: {}", path.display());
    println!(
        "  {} samples, {} orders, BPM={}, virtual tempo={}",
        samples.len(),
        samples.len(),
        tempo.numerator,
        tempo
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use hound::{SampleFormat, WavSpec, WavWriter};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("slicefur").chain(args.iter().copied()))
    }

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let mut writer = WavWriter::create(
            path,
            WavSpec {
                channels,
                sample_rate: 44100,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
        )
        .unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_help_and_version_are_informational() {
        for flag in ["-h", "--help", "--version"] {
            let err = parse(&[flag]).err().unwrap();
            assert!(is_informational(err.kind()), "{}", flag);
        }
    }

    #[test]
    fn test_missing_arguments_fail() {
        let err = parse(&["slices", "120", "4"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(!is_informational(err.kind()));
    }

    #[test]
    fn test_row_bounds() {
        for args in [
            ["slices", "120", "0", "64", "out.fur"],
            ["slices", "120", "256", "64", "out.fur"],
            ["slices", "120", "4", "0", "out.fur"],
            ["slices", "120", "4", "257", "out.fur"],
        ] {
            let err = parse(&args).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::ValueValidation, "{:?}", args);
        }

        let cli = parse(&["slices", "120", "255", "256", "out.fur"]).unwrap();
        assert_eq!(cli.rows_per_beat, 255);
        assert_eq!(cli.pattern_rows, 256);
    }

    #[test]
    fn test_flags() {
        let cli = parse(&[
            "slices", "139.5", "4", "128", "out.txt", "--text", "--kit-name", "Breaks",
        ])
        .unwrap();
        assert!(cli.text);
        assert!(!cli.verify);
        assert_eq!(cli.kit_name.as_deref(), Some("Breaks"));
        assert_eq!(cli.bpm, 139.5);
    }

    #[test]
    fn test_validate_bpm() {
        for bpm in [0.0, -1.0, f64::NAN, f64::INFINITY, 65536.0, 1e9] {
            assert!(
                matches!(validate_bpm(bpm), Err(Error::Argument(_))),
                "{}",
                bpm
            );
        }
        for bpm in [0.5, 120.0, 65535.9] {
            assert!(validate_bpm(bpm).is_ok(), "{}", bpm);
        }
    }

    #[test]
    fn test_bad_bpm_is_rejected_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let output = dir.path().join("out.fur");

        for bpm in ["0", "nan", "inf"] {
            let cli = parse(&[
                missing.to_str().unwrap(),
                bpm,
                "4",
                "64",
                output.to_str().unwrap(),
            ])
            .unwrap();
            assert!(matches!(run(cli), Err(Error::Argument(_))), "{}", bpm);
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_run_writes_verified_module() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("00.wav"), 1, &[0, 100, -100]);
        write_wav(&dir.path().join("01.wav"), 1, &[7, 7]);
        let output = dir.path().join("kit.fur");

        let cli = parse(&[
            dir.path().to_str().unwrap(),
            "139",
            "4",
            "128",
            output.to_str().unwrap(),
            "--verify",
        ])
        .unwrap();
        run(cli).unwrap();

        let module = inspect_file(&output).unwrap();
        assert_eq!(module.samples.len(), 2);
        assert!(check_module(&module).is_clean());
    }

    #[test]
    fn test_text_export_rejects_stereo_slices() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("00.wav"), 1, &[0, 1]);
        write_wav(&dir.path().join("01.wav"), 2, &[0, 1, 2, 3]);
        let output = dir.path().join("kit.txt");

        let cli = parse(&[
            dir.path().to_str().unwrap(),
            "120",
            "4",
            "64",
            output.to_str().unwrap(),
            "--text",
        ])
        .unwrap();
        match run(cli) {
            Err(Error::Format { path, .. }) => assert!(path.ends_with("01.wav")),
            other => panic!("expected format error, got {:?}", other),
        }
        assert!(!output.exists());
    }
}
