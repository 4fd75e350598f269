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

//! Furnace module (`.fur`) writer.
//!
//! This module provides:
//! - The growable buffer the module image is assembled in
//! - One encoder per block kind
//! - Pointer resolution over the finished image
//! - zlib compression and the final file write

mod blocks;
mod buffer;
mod compress;
mod encoder;
pub mod layout;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Error;

pub use buffer::{OutputBuffer, INITIAL_CAPACITY};
pub use compress::{compress, compress_bound, CompressionError};
pub use encoder::{encode_module, BlockKind, BlockOffset, EncodeEvent, ModuleParams};

/// Writes the compressed module to `path`, replacing any existing file.
///
/// The write is not atomic; a failure can leave a partial file behind.
pub fn write_module(path: &Path, data: &[u8]) -> Result<(), Error> {
    let mut file = File::create(path).map_err(|e| Error::write(path, e))?;
    file.write_all(data).map_err(|e| Error::write(path, e))?;
    file.flush().map_err(|e| Error::write(path, e))?;

    info!(path = ?path, bytes = data.len(), "Module written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_module() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fur");
        write_module(&path, &[1, 2, 3]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);

        write_module(&path, &[9]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![9]);
    }

    #[test]
    fn test_write_module_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.fur");
        let err = write_module(&path, &[1]).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert!(err.to_string().starts_with("Cannot create '"));
    }
}
