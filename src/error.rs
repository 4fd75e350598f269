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
use std::path::PathBuf;

use crate::config::error::ConfigError;
use crate::fur::CompressionError;
use crate::samples::FormatError;
use crate::verify::InspectError;

/// Every way a run can fail. All of these are terminal; the binary reports
/// them on stderr and exits with status 1.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Argument(String),

    #[error("Cannot open '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' {kind}", .path.display())]
    Format { path: PathBuf, kind: FormatError },

    #[error("No .wav files found in '{}'.", .0.display())]
    NoSamples(PathBuf),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("'{}' failed verification.", .0.display())]
    Verification(PathBuf),

    #[error("Cannot inspect '{}': {source}", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: InspectError,
    },
}

impl Error {
    /// Wraps a read-side I/O failure with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps a failure creating or writing an output file.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}
