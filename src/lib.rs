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

//! Packs directories of mono WAV slices into Furnace tracker modules.
//!
//! The pipeline is strictly sequential: [`samples`] scans and loads the
//! slices, [`tempo`] derives the virtual tempo, [`fur`] assembles the module
//! in memory, resolves its block pointers and compresses it, and
//! [`verify`] can walk a finished module back. [`text`] renders the same
//! data as a Furnace text export instead.

pub mod config;
pub mod error;
pub mod fur;
pub mod samples;
pub mod tempo;
pub mod text;
pub mod verify;

#[cfg(test)]
mod testutil;

pub use error::Error;
